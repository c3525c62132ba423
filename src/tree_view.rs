use std::collections::HashMap;

use crate::budget::{BudgetItem, Level};

/// Expand/collapse state for a rendered budget tree.
///
/// Only group flags are stored; row visibility is derived from them on
/// every render, so toggling a group never touches its descendants.
#[derive(Debug, Clone, Default)]
pub struct TreeViewState {
    expanded: HashMap<usize, bool>,
}

impl TreeViewState {
    /// Every group and subgroup starts expanded.
    pub fn new(items: &[BudgetItem]) -> Self {
        let expanded = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.level.is_group())
            .map(|(idx, _)| (idx, true))
            .collect();
        Self { expanded }
    }

    pub fn is_expanded(&self, idx: usize) -> bool {
        self.expanded.get(&idx).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, idx: usize) {
        if let Some(flag) = self.expanded.get_mut(&idx) {
            *flag = !*flag;
        }
    }

    pub fn set_expanded(&mut self, idx: usize, expanded: bool) {
        if let Some(flag) = self.expanded.get_mut(&idx) {
            *flag = expanded;
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.values_mut().for_each(|f| *f = false);
    }

    pub fn expand_all(&mut self) {
        self.expanded.values_mut().for_each(|f| *f = true);
    }

    pub fn is_visible(&self, items: &[BudgetItem], idx: usize) -> bool {
        let item = &items[idx];
        let parent_open = |p: Option<usize>| p.map_or(true, |p| self.is_expanded(p));
        match item.level {
            Level::Group => true,
            Level::Subgroup => parent_open(item.parent),
            Level::Leaf => {
                let grandparent = item.parent.and_then(|p| items[p].parent);
                parent_open(item.parent) && parent_open(grandparent)
            }
        }
    }

    pub fn visible_indices(&self, items: &[BudgetItem]) -> Vec<usize> {
        (0..items.len()).filter(|&i| self.is_visible(items, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::CostCategory;

    fn item(level: Level, parent: Option<usize>) -> BudgetItem {
        BudgetItem {
            code: String::new(),
            description: String::new(),
            unit: None,
            quantity: None,
            unit_price: None,
            total: 0.0,
            category: CostCategory::Other,
            level,
            parent,
            row: 0,
        }
    }

    fn sample() -> Vec<BudgetItem> {
        vec![
            item(Level::Group, None),       // 0
            item(Level::Subgroup, Some(0)), // 1
            item(Level::Leaf, Some(1)),     // 2
            item(Level::Leaf, Some(0)),     // 3
            item(Level::Group, None),       // 4
            item(Level::Leaf, Some(4)),     // 5
        ]
    }

    #[test]
    fn test_everything_starts_visible() {
        let items = sample();
        let state = TreeViewState::new(&items);
        assert_eq!(state.visible_indices(&items), vec![0, 1, 2, 3, 4, 5]);
        assert!(state.is_expanded(0));
        assert!(state.is_expanded(1));
        assert!(!state.is_expanded(2));
    }

    #[test]
    fn test_collapsing_group_hides_grandchildren() {
        let items = sample();
        let mut state = TreeViewState::new(&items);
        state.toggle(0);
        assert_eq!(state.visible_indices(&items), vec![0, 4, 5]);
        // subgroup flag untouched
        assert!(state.is_expanded(1));
        state.toggle(0);
        assert_eq!(state.visible_indices(&items).len(), 6);
    }

    #[test]
    fn test_collapsing_subgroup_hides_only_its_leaves() {
        let items = sample();
        let mut state = TreeViewState::new(&items);
        state.toggle(1);
        assert_eq!(state.visible_indices(&items), vec![0, 1, 3, 4, 5]);
    }

    #[test]
    fn test_toggle_ignores_leaves() {
        let items = sample();
        let mut state = TreeViewState::new(&items);
        state.toggle(2);
        assert!(!state.is_expanded(2));
        assert_eq!(state.visible_indices(&items).len(), 6);
    }

    #[test]
    fn test_collapse_and_expand_all() {
        let items = sample();
        let mut state = TreeViewState::new(&items);
        state.collapse_all();
        assert_eq!(state.visible_indices(&items), vec![0, 4]);
        state.expand_all();
        assert_eq!(state.visible_indices(&items).len(), 6);
    }
}
