// sections table access.
//
// Plain row CRUD plus the ordering primitives the mutator composes:
// sibling listings, max-order lookups, and compare-and-swap updates
// keyed on the order_index the caller last observed.

use rusqlite::{params, Connection};
use uuid::Uuid;

use trellis_common::types::Section;

use super::{order_from_column, timestamp_from_column, uuid_from_column};

const SECTION_COLUMNS: &str = "id, template_id, parent_id, order_index, title, created_at";

/// CRUD and ordering primitives for `sections`.
pub struct SectionStore;

impl SectionStore {
    pub fn insert(conn: &Connection, section: &Section) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO sections (id, template_id, parent_id, order_index, title, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                section.id.to_string(),
                section.template_id.to_string(),
                section.parent_id.map(|id| id.to_string()),
                i64::from(section.order_index),
                section.title,
                section.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Section>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections WHERE id = ?1"
        ))?;

        let mut rows = stmt.query_map(params![id.to_string()], row_to_section)?;
        rows.next().transpose()
    }

    /// All sections of a template, flat, for tree building.
    pub fn list_by_template(conn: &Connection, template_id: Uuid) -> rusqlite::Result<Vec<Section>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections \
             WHERE template_id = ?1 \
             ORDER BY order_index ASC, id ASC"
        ))?;

        let rows = stmt.query_map(params![template_id.to_string()], row_to_section)?;
        rows.collect()
    }

    /// One sibling group, sorted by order_index ascending.
    ///
    /// `parent_id = None` selects the root-level group. The `IS ?2`
    /// comparison is null-safe in sqlite.
    pub fn list_siblings(
        conn: &Connection,
        template_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> rusqlite::Result<Vec<Section>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections \
             WHERE template_id = ?1 AND parent_id IS ?2 \
             ORDER BY order_index ASC, id ASC"
        ))?;

        let rows = stmt.query_map(
            params![template_id.to_string(), parent_id.map(|id| id.to_string())],
            row_to_section,
        )?;
        rows.collect()
    }

    /// Highest order_index in a sibling group, `None` when empty.
    pub fn max_sibling_order(
        conn: &Connection,
        template_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> rusqlite::Result<Option<u32>> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(order_index) FROM sections \
             WHERE template_id = ?1 AND parent_id IS ?2",
            params![template_id.to_string(), parent_id.map(|id| id.to_string())],
            |row| row.get(0),
        )?;
        max.map(|value| order_from_column(0, value)).transpose()
    }

    pub fn has_children(conn: &Connection, id: Uuid) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM sections WHERE parent_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn update_title(conn: &Connection, id: Uuid, title: &str) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "UPDATE sections SET title = ?1 WHERE id = ?2",
            params![title, id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Compare-and-swap reorder within the current parent.
    ///
    /// The update only lands if the row still carries `expected_order`;
    /// a false return means the sibling group changed concurrently.
    pub fn set_order_index(
        conn: &Connection,
        id: Uuid,
        new_order: u32,
        expected_order: u32,
    ) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "UPDATE sections SET order_index = ?1 \
             WHERE id = ?2 AND order_index = ?3",
            params![i64::from(new_order), id.to_string(), i64::from(expected_order)],
        )?;
        Ok(changed > 0)
    }

    /// Compare-and-swap reparent + reorder in one update.
    pub fn set_parent_and_order(
        conn: &Connection,
        id: Uuid,
        new_parent_id: Option<Uuid>,
        new_order: u32,
        expected_order: u32,
    ) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "UPDATE sections SET parent_id = ?1, order_index = ?2 \
             WHERE id = ?3 AND order_index = ?4",
            params![
                new_parent_id.map(|parent| parent.to_string()),
                i64::from(new_order),
                id.to_string(),
                i64::from(expected_order),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(conn: &Connection, id: Uuid) -> rusqlite::Result<bool> {
        let changed =
            conn.execute("DELETE FROM sections WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }
}

fn row_to_section(row: &rusqlite::Row<'_>) -> rusqlite::Result<Section> {
    let id: String = row.get(0)?;
    let template_id: String = row.get(1)?;
    let parent_id: Option<String> = row.get(2)?;
    let order_index: i64 = row.get(3)?;
    let created_at: String = row.get(5)?;

    Ok(Section {
        id: uuid_from_column(0, &id)?,
        template_id: uuid_from_column(1, &template_id)?,
        parent_id: parent_id.as_deref().map(|value| uuid_from_column(2, value)).transpose()?,
        order_index: order_from_column(3, order_index)?,
        title: row.get(4)?,
        created_at: timestamp_from_column(5, &created_at)?,
    })
}
