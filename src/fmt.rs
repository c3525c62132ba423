/// Format a float as a soles amount with thousands separators: S/ 1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let grouped = grouped(val.abs(), 2);
    if negative {
        format!("-S/ {grouped}")
    } else {
        format!("S/ {grouped}")
    }
}

/// Format a quantity or unit price, trimmed to at most `decimals` places.
pub fn number(val: f64, decimals: usize) -> String {
    let s = grouped(val.abs(), decimals);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if val < 0.0 {
        format!("-{s}")
    } else {
        s
    }
}

fn grouped(abs: f64, decimals: usize) -> String {
    let fixed = format!("{abs:.decimals$}");
    let (int_part, dec_part) = match fixed.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (fixed.as_str(), None),
    };

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();
    match dec_part {
        Some(d) => format!("{with_commas}.{d}"),
        None => with_commas,
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
