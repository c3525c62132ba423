use std::collections::HashMap;

use rusqlite::{params, Connection};

use crate::budget::{BudgetItem, CostCategory, Level};
use crate::error::Result;
use crate::models::{SavedBudget, StoredFile};

// ---------------------------------------------------------------------------
// Budget rows
// ---------------------------------------------------------------------------

/// Replace the stored budget of `convenio_id` with `items` in one transaction.
///
/// Group rows go in first, parent before child, so each gets a generated id
/// before anything references it; leaf rows follow pointing at their group.
/// Any failure rolls the whole batch back and leaves the previous budget.
pub fn save_budget(conn: &mut Connection, convenio_id: i64, items: &[BudgetItem]) -> Result<SavedBudget> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM budget_items WHERE convenio_id = ?1", [convenio_id])?;
    tx.execute("DELETE FROM budget_groups WHERE convenio_id = ?1", [convenio_id])?;

    let mut ids: Vec<Option<i64>> = vec![None; items.len()];
    let mut saved = SavedBudget { groups: 0, items: 0 };
    {
        let mut stmt = tx.prepare(
            "INSERT INTO budget_groups (convenio_id, parent_id, position, level, code, description, total, source_row) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (idx, item) in items.iter().enumerate().filter(|(_, i)| i.level.is_group()) {
            let parent_id = item.parent.and_then(|p| ids[p]);
            stmt.execute(params![
                convenio_id,
                parent_id,
                idx as i64,
                item.level.depth(),
                item.code,
                item.description,
                item.total,
                item.row as i64,
            ])?;
            ids[idx] = Some(tx.last_insert_rowid());
            saved.groups += 1;
        }
    }
    {
        let mut stmt = tx.prepare(
            "INSERT INTO budget_items (convenio_id, group_id, position, code, description, unit, quantity, unit_price, total, cost_category, source_row) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for (idx, item) in items.iter().enumerate().filter(|(_, i)| i.level == Level::Leaf) {
            let group_id = item.parent.and_then(|p| ids[p]);
            stmt.execute(params![
                convenio_id,
                group_id,
                idx as i64,
                item.code,
                item.description,
                item.unit,
                item.quantity,
                item.unit_price,
                item.total,
                item.category.key(),
                item.row as i64,
            ])?;
            saved.items += 1;
        }
    }
    tx.commit()?;
    tracing::info!(convenio_id, groups = saved.groups, items = saved.items, "budget committed");
    Ok(saved)
}

/// Load the stored budget of `convenio_id` back into sheet order with
/// arena parent indices.
pub fn load_budget(conn: &Connection, convenio_id: i64) -> Result<Vec<BudgetItem>> {
    // (position, own group id, parent group id, item)
    let mut rows: Vec<(i64, Option<i64>, Option<i64>, BudgetItem)> = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT id, parent_id, position, level, code, description, total, source_row \
         FROM budget_groups WHERE convenio_id = ?1",
    )?;
    let groups = stmt.query_map([convenio_id], |row| {
        let level: u8 = row.get(3)?;
        let source_row: Option<i64> = row.get(7)?;
        Ok((
            row.get::<_, i64>(2)?,
            Some(row.get::<_, i64>(0)?),
            row.get::<_, Option<i64>>(1)?,
            BudgetItem {
                code: row.get(4)?,
                description: row.get(5)?,
                unit: None,
                quantity: None,
                unit_price: None,
                total: row.get(6)?,
                category: CostCategory::Other,
                level: Level::from_depth(level.min(1)),
                parent: None,
                row: source_row.unwrap_or(0) as usize,
            },
        ))
    })?;
    for g in groups {
        rows.push(g?);
    }

    let mut stmt = conn.prepare(
        "SELECT group_id, position, code, description, unit, quantity, unit_price, total, cost_category, source_row \
         FROM budget_items WHERE convenio_id = ?1",
    )?;
    let leaves = stmt.query_map([convenio_id], |row| {
        let category: String = row.get(8)?;
        let source_row: Option<i64> = row.get(9)?;
        Ok((
            row.get::<_, i64>(1)?,
            None::<i64>,
            row.get::<_, Option<i64>>(0)?,
            BudgetItem {
                code: row.get(2)?,
                description: row.get(3)?,
                unit: row.get(4)?,
                quantity: row.get(5)?,
                unit_price: row.get(6)?,
                total: row.get(7)?,
                category: CostCategory::from_key(&category),
                level: Level::Leaf,
                parent: None,
                row: source_row.unwrap_or(0) as usize,
            },
        ))
    })?;
    for l in leaves {
        rows.push(l?);
    }

    rows.sort_by_key(|(position, ..)| *position);

    let mut index_of: HashMap<i64, usize> = HashMap::new();
    let mut items = Vec::with_capacity(rows.len());
    for (idx, (_, own_id, parent_id, mut item)) in rows.into_iter().enumerate() {
        item.parent = parent_id.and_then(|id| index_of.get(&id).copied());
        if let Some(id) = own_id {
            index_of.insert(id, idx);
        }
        items.push(item);
    }
    Ok(items)
}

pub fn has_budget(conn: &Connection, convenio_id: i64) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM budget_groups WHERE convenio_id = ?1 LIMIT 1")?;
    Ok(stmt.exists([convenio_id])?)
}

// ---------------------------------------------------------------------------
// Expediente files
// ---------------------------------------------------------------------------

pub struct NewFile<'a> {
    pub convenio_id: i64,
    pub category: &'a str,
    pub filename: &'a str,
    pub stored_path: &'a str,
    pub size_bytes: u64,
    pub checksum: &'a str,
}

pub fn record_file(conn: &Connection, file: &NewFile) -> Result<i64> {
    conn.execute(
        "INSERT INTO expediente_files (convenio_id, category, filename, stored_path, size_bytes, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            file.convenio_id,
            file.category,
            file.filename,
            file.stored_path,
            file.size_bytes as i64,
            file.checksum,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_files(conn: &Connection, convenio_id: i64) -> Result<Vec<StoredFile>> {
    let mut stmt = conn.prepare(
        "SELECT id, convenio_id, category, filename, stored_path, size_bytes, checksum, uploaded_at \
         FROM expediente_files WHERE convenio_id = ?1 ORDER BY category, uploaded_at, id",
    )?;
    let rows = stmt.query_map([convenio_id], |row| {
        Ok(StoredFile {
            id: row.get(0)?,
            convenio_id: row.get(1)?,
            category: row.get(2)?,
            filename: row.get(3)?,
            stored_path: row.get(4)?,
            size_bytes: row.get(5)?,
            checksum: row.get(6)?,
            uploaded_at: row.get(7)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}
