use serde::{Deserialize, Serialize};

use super::{BudgetItem, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Materials,
    Labor,
    Equipment,
    Freight,
    Other,
}

pub const ALL_CATEGORIES: &[CostCategory] = &[
    CostCategory::Materials,
    CostCategory::Labor,
    CostCategory::Equipment,
    CostCategory::Freight,
    CostCategory::Other,
];

// Checked in order; the first matching prefix wins.
const PREFIX_RULES: &[(&str, CostCategory)] = &[
    ("301", CostCategory::Equipment),
    ("203", CostCategory::Freight),
    ("1", CostCategory::Labor),
];

const MATERIAL_PREFIXES: &[&str] = &[
    "02", "03", "04", "05", "21", "22", "24", "26", "27", "28", "29", "30", "31", "32", "33", "34",
    "37", "38", "39", "40", "41", "42", "43", "44", "45", "46", "48", "49", "50", "51", "53", "54",
    "55", "56", "57", "59", "60", "61", "62", "64", "65", "66", "68", "69", "70", "71", "72", "73",
    "77", "78", "79", "80",
];

impl CostCategory {
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            return Self::Other;
        }
        if let Some((_, category)) = PREFIX_RULES.iter().find(|(p, _)| code.starts_with(p)) {
            return *category;
        }
        if MATERIAL_PREFIXES.iter().any(|p| code.starts_with(p)) {
            return Self::Materials;
        }
        Self::Other
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Materials => "Materials",
            Self::Labor => "Labor",
            Self::Equipment => "Equipment",
            Self::Freight => "Freight",
            Self::Other => "Other",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Labor => "labor",
            Self::Equipment => "equipment",
            Self::Freight => "freight",
            Self::Other => "other",
        }
    }

    pub fn from_key(key: &str) -> Self {
        ALL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.key() == key)
            .unwrap_or(Self::Other)
    }
}

/// Tag every leaf with its category. Groups stay `Other`.
pub fn classify(items: &mut [BudgetItem]) {
    for item in items.iter_mut() {
        item.category = if item.level == Level::Leaf {
            CostCategory::from_code(&item.code)
        } else {
            CostCategory::Other
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: CostCategory,
    pub total: f64,
    pub count: usize,
    pub pct: f64,
}

/// Leaf totals per category, largest first, for charting.
pub fn category_totals(items: &[BudgetItem]) -> Vec<CategoryTotal> {
    let leaves: Vec<&BudgetItem> = items.iter().filter(|i| i.level == Level::Leaf).collect();
    let grand: f64 = leaves.iter().map(|i| i.total).sum();

    let mut totals: Vec<CategoryTotal> = ALL_CATEGORIES
        .iter()
        .filter_map(|&category| {
            let members: Vec<&&BudgetItem> = leaves.iter().filter(|i| i.category == category).collect();
            if members.is_empty() {
                return None;
            }
            let total: f64 = members.iter().map(|i| i.total).sum();
            Some(CategoryTotal {
                category,
                total,
                count: members.len(),
                pct: if grand != 0.0 { total / grand * 100.0 } else { 0.0 },
            })
        })
        .collect();
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}
