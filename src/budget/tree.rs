use std::collections::HashMap;

use super::{BudgetItem, Level};

/// Iterate the ancestors of `idx`, nearest first.
pub fn ancestors(items: &[BudgetItem], idx: usize) -> impl Iterator<Item = usize> + '_ {
    std::iter::successors(items[idx].parent, move |&p| items[p].parent)
}

/// Direct children of `idx`, in sheet order.
pub fn children(items: &[BudgetItem], idx: usize) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.parent == Some(idx))
        .map(|(i, _)| i)
        .collect()
}

/// Index of the top of `idx`'s chain if that chain ends at a level-0 row.
pub fn root_group(items: &[BudgetItem], idx: usize) -> Option<usize> {
    let top = ancestors(items, idx).last().unwrap_or(idx);
    (items[top].level == Level::Group).then_some(top)
}

/// Roll leaf totals up into every ancestor group.
///
/// Groups that received at least one leaf get their total overwritten by the
/// sum; groups with no leaf descendants keep the value read from the sheet.
pub fn aggregate(items: &mut [BudgetItem]) {
    let mut sums: HashMap<usize, f64> = HashMap::new();
    for idx in 0..items.len() {
        if items[idx].level != Level::Leaf {
            continue;
        }
        let total = items[idx].total;
        for ancestor in ancestors(items, idx) {
            *sums.entry(ancestor).or_default() += total;
        }
    }
    for (idx, sum) in sums {
        items[idx].total = sum;
    }
}

/// Sum of the leaf totals, which is also the budget's grand total.
pub fn grand_total(items: &[BudgetItem]) -> f64 {
    items
        .iter()
        .filter(|i| i.level == Level::Leaf)
        .map(|i| i.total)
        .sum()
}

/// Group descriptions that appear on more than one group row, with the
/// offending sheet rows.
pub fn duplicate_group_descriptions(items: &[BudgetItem]) -> Vec<(String, Vec<usize>)> {
    let mut seen: Vec<(String, Vec<usize>)> = Vec::new();
    for item in items.iter().filter(|i| i.level.is_group()) {
        let key = item.description.trim().to_uppercase();
        if key.is_empty() {
            continue;
        }
        match seen.iter_mut().find(|(k, _)| *k == key) {
            Some((_, rows)) => rows.push(item.row),
            None => seen.push((key, vec![item.row])),
        }
    }
    seen.retain(|(_, rows)| rows.len() > 1);
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::CostCategory;

    fn item(code: &str, level: Level, parent: Option<usize>, total: f64) -> BudgetItem {
        BudgetItem {
            code: code.to_string(),
            description: format!("desc {code}"),
            unit: None,
            quantity: None,
            unit_price: None,
            total,
            category: CostCategory::Other,
            level,
            parent,
            row: 0,
        }
    }

    fn two_by_two() -> Vec<BudgetItem> {
        vec![
            item("01", Level::Group, None, 0.0),
            item("01.01", Level::Subgroup, Some(0), 0.0),
            item("01.01.01", Level::Leaf, Some(1), 100.0),
            item("01.01.02", Level::Leaf, Some(1), 250.5),
            item("01.02", Level::Subgroup, Some(0), 0.0),
            item("01.02.01", Level::Leaf, Some(4), 40.25),
            item("01.02.02", Level::Leaf, Some(4), 9.25),
        ]
    }

    #[test]
    fn test_aggregation_sums_all_generations() {
        let mut items = two_by_two();
        aggregate(&mut items);
        assert_eq!(items[0].total, 100.0 + 250.5 + 40.25 + 9.25);
        assert_eq!(items[1].total, 350.5);
        assert_eq!(items[4].total, 49.5);
        assert_eq!(items[2].total, 100.0);
    }

    #[test]
    fn test_aggregation_overwrites_sheet_group_totals() {
        let mut items = two_by_two();
        items[0].total = 1.0;
        items[1].total = 999.0;
        aggregate(&mut items);
        assert_eq!(items[1].total, 350.5);
        assert_eq!(items[0].total, 400.0);
    }

    #[test]
    fn test_group_without_leaves_keeps_value() {
        let mut items = vec![
            item("01", Level::Group, None, 75.0),
            item("02", Level::Group, None, 0.0),
            item("02.01", Level::Leaf, Some(1), 10.0),
        ];
        aggregate(&mut items);
        assert_eq!(items[0].total, 75.0);
        assert_eq!(items[1].total, 10.0);
    }

    #[test]
    fn test_same_description_groups_stay_separate() {
        let mut items = vec![
            item("01", Level::Group, None, 0.0),
            item("01.01", Level::Leaf, Some(0), 10.0),
            item("02", Level::Group, None, 0.0),
            item("02.01", Level::Leaf, Some(2), 5.0),
        ];
        items[2].description = items[0].description.clone();
        aggregate(&mut items);
        assert_eq!(items[0].total, 10.0);
        assert_eq!(items[2].total, 5.0);
        assert_eq!(duplicate_group_descriptions(&items).len(), 1);
    }

    #[test]
    fn test_ancestors_and_root() {
        let items = two_by_two();
        assert_eq!(ancestors(&items, 6).collect::<Vec<_>>(), vec![4, 0]);
        assert_eq!(root_group(&items, 6), Some(0));
        assert_eq!(root_group(&items, 0), Some(0));
        assert_eq!(children(&items, 0), vec![1, 4]);
    }

    #[test]
    fn test_root_group_missing_for_orphans() {
        let items = vec![
            item("01.01", Level::Subgroup, None, 0.0),
            item("01.01.01", Level::Leaf, Some(0), 3.0),
        ];
        assert_eq!(root_group(&items, 1), None);
    }

    #[test]
    fn test_grand_total() {
        let items = two_by_two();
        assert_eq!(grand_total(&items), 400.0);
    }
}
