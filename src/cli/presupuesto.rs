use std::io::IsTerminal;

use comfy_table::{Cell, CellAlignment, Table};
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::Span;
use ratatui::widgets::{Cell as TuiCell, Paragraph, Row, Table as TuiTable, TableState};
use ratatui::Frame;

use crate::budget::tree::{children, grand_total, root_group};
use crate::budget::BudgetItem;
use crate::error::Result;
use crate::fmt::{money, number};
use crate::settings::load_settings;
use crate::tree_view::TreeViewState;
use crate::tui::{
    level_style, money_span, run_view, wrap_text, View, ViewAction, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE,
};

pub fn run(convenio: i64, text: bool, collapse: &[String]) -> Result<()> {
    let settings = load_settings();
    let conn = super::open_db(&settings)?;
    let items = super::saved_budget(&conn, convenio)?;

    let mut state = TreeViewState::new(&items);
    for code in apply_collapse(&items, &mut state, collapse) {
        tracing::warn!(%code, "no group with this code to collapse");
    }

    if text || !std::io::stdout().is_terminal() {
        println!("{}", budget_table(&items, Some(&state)));
        println!("Grand total: {}", money(grand_total(&items)));
        Ok(())
    } else {
        let mut view = BudgetTreeView::new(format!("Presupuesto, convenio {convenio}"), items, state);
        run_view(&mut view)
    }
}

/// Collapse every group whose code is listed. Returns the codes that
/// matched no group.
pub(crate) fn apply_collapse(items: &[BudgetItem], state: &mut TreeViewState, codes: &[String]) -> Vec<String> {
    let mut unknown = Vec::new();
    for code in codes {
        let mut found = false;
        for (idx, item) in items.iter().enumerate() {
            if item.level.is_group() && item.code == code.trim() {
                state.set_expanded(idx, false);
                found = true;
            }
        }
        if !found {
            unknown.push(code.clone());
        }
    }
    unknown
}

fn tree_label(item: &BudgetItem, state: Option<&TreeViewState>, idx: usize) -> String {
    let indent = "  ".repeat(item.level.depth() as usize);
    let marker = match (item.level.is_group(), state) {
        (true, Some(s)) if s.is_expanded(idx) => "\u{25be} ",
        (true, Some(_)) => "\u{25b8} ",
        _ => "",
    };
    format!("{indent}{marker}{}", item.description)
}

/// Indented text table of the rows visible under `state`, or of every row
/// when no state is given.
pub(crate) fn budget_table(items: &[BudgetItem], state: Option<&TreeViewState>) -> String {
    let visible: Vec<usize> = match state {
        Some(s) => s.visible_indices(items),
        None => (0..items.len()).collect(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Code", "Description", "Unit", "Qty", "Unit price", "Total"]);
    for idx in visible {
        let item = &items[idx];
        table.add_row(vec![
            Cell::new(&item.code),
            Cell::new(tree_label(item, state, idx)),
            Cell::new(item.unit.as_deref().unwrap_or("")),
            Cell::new(item.quantity.map(|q| number(q, 4)).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
            Cell::new(item.unit_price.map(|p| number(p, 4)).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
            Cell::new(money(item.total)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

// ---------------------------------------------------------------------------
// Interactive tree
// ---------------------------------------------------------------------------

pub(crate) struct BudgetTreeView {
    title: String,
    items: Vec<BudgetItem>,
    state: TreeViewState,
    visible: Vec<usize>,
    table_state: TableState,
}

impl BudgetTreeView {
    pub(crate) fn new(title: String, items: Vec<BudgetItem>, state: TreeViewState) -> Self {
        let visible = state.visible_indices(&items);
        let mut table_state = TableState::default();
        if !visible.is_empty() {
            table_state.select(Some(0));
        }
        Self {
            title,
            items,
            state,
            visible,
            table_state,
        }
    }

    fn selected_item(&self) -> Option<usize> {
        self.table_state
            .selected()
            .and_then(|pos| self.visible.get(pos).copied())
    }

    /// Recompute visible rows and keep the cursor on `keep` when it is still shown.
    fn refresh(&mut self, keep: Option<usize>) {
        self.visible = self.state.visible_indices(&self.items);
        let pos = keep
            .and_then(|idx| self.visible.iter().position(|&v| v == idx))
            .or_else(|| (!self.visible.is_empty()).then_some(0));
        self.table_state.select(pos);
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let cur = self.table_state.selected().unwrap_or(0) as isize;
        let last = self.visible.len() as isize - 1;
        self.table_state.select(Some((cur + delta).clamp(0, last) as usize));
    }

    fn toggle_selected(&mut self) {
        if let Some(idx) = self.selected_item() {
            if self.items[idx].level.is_group() {
                self.state.toggle(idx);
                self.refresh(Some(idx));
            }
        }
    }

    /// Collapse the selected group, or jump to the parent of anything else.
    fn collapse_or_parent(&mut self) {
        let Some(idx) = self.selected_item() else { return };
        if self.items[idx].level.is_group() && self.state.is_expanded(idx) {
            self.state.set_expanded(idx, false);
            self.refresh(Some(idx));
        } else if let Some(parent) = self.items[idx].parent {
            self.refresh(Some(parent));
        }
    }

    /// Expand the selected group, or step into it when already open.
    fn expand_selected(&mut self) {
        let Some(idx) = self.selected_item() else { return };
        if !self.items[idx].level.is_group() {
            return;
        }
        if self.state.is_expanded(idx) {
            let first = children(&self.items, idx).first().copied();
            self.refresh(first.or(Some(idx)));
        } else {
            self.state.set_expanded(idx, true);
            self.refresh(Some(idx));
        }
    }
}

impl View for BudgetTreeView {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep_area, table_area, detail_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(
                " {}  |  {}",
                self.title,
                money(grand_total(&self.items))
            ))
            .style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let rows: Vec<Row> = self
            .visible
            .iter()
            .map(|&idx| {
                let item = &self.items[idx];
                Row::new(vec![
                    TuiCell::from(item.code.clone()),
                    TuiCell::from(tree_label(item, Some(&self.state), idx)),
                    TuiCell::from(item.unit.clone().unwrap_or_default()),
                    TuiCell::from(item.quantity.map(|q| number(q, 4)).unwrap_or_default()),
                    TuiCell::from(item.unit_price.map(|p| number(p, 4)).unwrap_or_default()),
                    TuiCell::from(money_span(item.total, item.level)),
                ])
                .style(level_style(item.level))
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(18),
        ];
        let header = Row::new(vec!["Code", "Description", "Unit", "Qty", "Unit price", "Total"])
            .style(HEADER_STYLE)
            .bottom_margin(1);
        let table = TuiTable::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        if let Some(idx) = self.selected_item() {
            let item = &self.items[idx];
            let width = detail_area.width.saturating_sub(2) as usize;
            let (wrapped, _) = wrap_text(&format!("{} {}", item.code, item.description), width);
            frame.render_widget(Paragraph::new(format!(" {wrapped}")), detail_area);
        }

        let pos = self.table_state.selected().map_or(0, |p| p + 1);
        frame.render_widget(
            Paragraph::new(vec![ratatui::text::Line::from(vec![
                Span::styled(
                    format!(
                        " \u{2191}/\u{2193}=move  Enter/Space=toggle  \u{2190}/\u{2192}=collapse/expand  c/e=all  q/Esc=close  row {pos}/{}",
                        self.visible.len()
                    ),
                    FOOTER_STYLE,
                ),
            ])]),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-10),
            KeyCode::PageDown => self.move_cursor(10),
            KeyCode::Home => self.move_cursor(isize::MIN / 2),
            KeyCode::End => self.move_cursor(isize::MAX / 2),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Left | KeyCode::Char('h') => self.collapse_or_parent(),
            KeyCode::Right | KeyCode::Char('l') => self.expand_selected(),
            KeyCode::Char('c') => {
                let keep = self.selected_item().and_then(|idx| root_group(&self.items, idx));
                self.state.collapse_all();
                self.refresh(keep);
            }
            KeyCode::Char('e') => {
                let keep = self.selected_item();
                self.state.expand_all();
                self.refresh(keep);
            }
            _ => {}
        }
        ViewAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::tree::aggregate;
    use crate::budget::{CostCategory, Level};

    fn item(code: &str, level: Level, parent: Option<usize>, total: f64) -> BudgetItem {
        let leaf = level == Level::Leaf;
        BudgetItem {
            code: code.to_string(),
            description: format!("Partida {code}"),
            unit: leaf.then(|| "m3".to_string()),
            quantity: leaf.then_some(1.0),
            unit_price: leaf.then_some(total),
            total,
            category: CostCategory::Other,
            level,
            parent,
            row: 0,
        }
    }

    fn sample() -> Vec<BudgetItem> {
        let mut items = vec![
            item("01", Level::Group, None, 0.0),
            item("01.01", Level::Subgroup, Some(0), 0.0),
            item("01.01.01", Level::Leaf, Some(1), 100.0),
            item("01.01.02", Level::Leaf, Some(1), 50.0),
            item("02", Level::Group, None, 0.0),
            item("02.01", Level::Leaf, Some(4), 25.0),
        ];
        aggregate(&mut items);
        items
    }

    fn view() -> BudgetTreeView {
        let items = sample();
        let state = TreeViewState::new(&items);
        BudgetTreeView::new("t".into(), items, state)
    }

    #[test]
    fn test_apply_collapse_reports_unknown_codes() {
        let items = sample();
        let mut state = TreeViewState::new(&items);
        let unknown = apply_collapse(&items, &mut state, &["01.01".into(), "99".into(), "02.01".into()]);
        assert_eq!(unknown, vec!["99", "02.01"]);
        assert!(!state.is_expanded(1));
        assert_eq!(state.visible_indices(&items), vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_budget_table_hides_collapsed_rows() {
        let items = sample();
        let mut state = TreeViewState::new(&items);
        apply_collapse(&items, &mut state, &["01".into()]);
        let text = budget_table(&items, Some(&state));
        assert!(text.contains("\u{25b8} Partida 01"));
        assert!(!text.contains("Partida 01.01.01"));
        assert!(text.contains("Partida 02.01"));
        assert!(text.contains("S/ 150.00"));
    }

    #[test]
    fn test_budget_table_without_state_shows_everything() {
        let text = budget_table(&sample(), None);
        assert!(text.contains("Partida 01.01.02"));
        assert!(!text.contains('\u{25be}'));
    }

    #[test]
    fn test_enter_toggles_selected_group() {
        let mut v = view();
        assert_eq!(v.visible.len(), 6);
        v.handle_key(KeyCode::Enter);
        assert_eq!(v.visible, vec![0, 4, 5]);
        assert_eq!(v.selected_item(), Some(0));
        v.handle_key(KeyCode::Char(' '));
        assert_eq!(v.visible.len(), 6);
    }

    #[test]
    fn test_toggle_on_leaf_is_noop() {
        let mut v = view();
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Down);
        assert_eq!(v.selected_item(), Some(2));
        v.handle_key(KeyCode::Enter);
        assert_eq!(v.visible.len(), 6);
    }

    #[test]
    fn test_left_on_leaf_jumps_to_parent_then_collapses() {
        let mut v = view();
        v.handle_key(KeyCode::End);
        assert_eq!(v.selected_item(), Some(5));
        v.handle_key(KeyCode::Left);
        assert_eq!(v.selected_item(), Some(4));
        v.handle_key(KeyCode::Left);
        assert_eq!(v.visible, vec![0, 1, 2, 3, 4]);
        v.handle_key(KeyCode::Right);
        assert_eq!(v.visible.len(), 6);
        assert_eq!(v.selected_item(), Some(4));
        v.handle_key(KeyCode::Right);
        assert_eq!(v.selected_item(), Some(5));
    }

    #[test]
    fn test_collapse_all_keeps_cursor_on_root() {
        let mut v = view();
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Char('c'));
        assert_eq!(v.visible, vec![0, 4]);
        assert_eq!(v.selected_item(), Some(0));
        v.handle_key(KeyCode::Char('e'));
        assert_eq!(v.selected_item(), Some(0));
        assert!(matches!(v.handle_key(KeyCode::Char('q')), ViewAction::Close));
    }
}
