// mappings table access: content-generation links between sections.
//
// Mappings are display-ordered per target section. They are not part of
// the tree invariants; the mutator cascades them away when a referenced
// section is deleted.

use rusqlite::{params, Connection};
use uuid::Uuid;

use trellis_common::types::Mapping;

use super::{order_from_column, timestamp_from_column, uuid_from_column};

const MAPPING_COLUMNS: &str =
    "id, source_section_id, target_section_id, instruction, order_index, created_at";

/// CRUD operations for `mappings`.
pub struct MappingStore;

impl MappingStore {
    pub fn insert(conn: &Connection, mapping: &Mapping) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO mappings \
             (id, source_section_id, target_section_id, instruction, order_index, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                mapping.id.to_string(),
                mapping.source_section_id.to_string(),
                mapping.target_section_id.to_string(),
                mapping.instruction,
                i64::from(mapping.order_index),
                mapping.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Mapping>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {MAPPING_COLUMNS} FROM mappings WHERE id = ?1"))?;

        let mut rows = stmt.query_map(params![id.to_string()], row_to_mapping)?;
        rows.next().transpose()
    }

    /// Edit an existing mapping in place. Returns false when missing.
    pub fn update(
        conn: &Connection,
        id: Uuid,
        source_section_id: Uuid,
        instruction: &str,
        order_index: u32,
    ) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "UPDATE mappings \
             SET source_section_id = ?1, instruction = ?2, order_index = ?3 \
             WHERE id = ?4",
            params![
                source_section_id.to_string(),
                instruction,
                i64::from(order_index),
                id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Mappings pointing at one target section, display order.
    pub fn list_for_target(conn: &Connection, target_section_id: Uuid) -> rusqlite::Result<Vec<Mapping>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {MAPPING_COLUMNS} FROM mappings \
             WHERE target_section_id = ?1 \
             ORDER BY order_index ASC, id ASC"
        ))?;

        let rows = stmt.query_map(params![target_section_id.to_string()], row_to_mapping)?;
        rows.collect()
    }

    /// Mappings targeting any section of a template.
    pub fn list_for_template(conn: &Connection, template_id: Uuid) -> rusqlite::Result<Vec<Mapping>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT m.{} FROM mappings m \
             JOIN sections s ON s.id = m.target_section_id \
             WHERE s.template_id = ?1 \
             ORDER BY m.target_section_id ASC, m.order_index ASC, m.id ASC",
            MAPPING_COLUMNS.replace(", ", ", m.")
        ))?;

        let rows = stmt.query_map(params![template_id.to_string()], row_to_mapping)?;
        rows.collect()
    }

    pub fn max_order_for_target(
        conn: &Connection,
        target_section_id: Uuid,
    ) -> rusqlite::Result<Option<u32>> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(order_index) FROM mappings WHERE target_section_id = ?1",
            params![target_section_id.to_string()],
            |row| row.get(0),
        )?;
        max.map(|value| order_from_column(0, value)).transpose()
    }

    pub fn delete(conn: &Connection, id: Uuid) -> rusqlite::Result<bool> {
        let changed =
            conn.execute("DELETE FROM mappings WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    /// Remove every mapping referencing a section as source or target.
    /// Returns the number of rows removed.
    pub fn delete_for_section(conn: &Connection, section_id: Uuid) -> rusqlite::Result<usize> {
        let changed = conn.execute(
            "DELETE FROM mappings WHERE source_section_id = ?1 OR target_section_id = ?1",
            params![section_id.to_string()],
        )?;
        Ok(changed)
    }
}

fn row_to_mapping(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mapping> {
    let id: String = row.get(0)?;
    let source: String = row.get(1)?;
    let target: String = row.get(2)?;
    let order_index: i64 = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(Mapping {
        id: uuid_from_column(0, &id)?,
        source_section_id: uuid_from_column(1, &source)?,
        target_section_id: uuid_from_column(2, &target)?,
        instruction: row.get(3)?,
        order_index: order_from_column(4, order_index)?,
        created_at: timestamp_from_column(5, &created_at)?,
    })
}
