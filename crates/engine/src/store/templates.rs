// templates table access: create, read, list, activate.

use rusqlite::{params, Connection};
use uuid::Uuid;

use trellis_common::types::Template;

use super::{timestamp_from_column, uuid_from_column};

/// CRUD operations for `templates`.
pub struct TemplateStore;

impl TemplateStore {
    pub fn insert(conn: &Connection, template: &Template) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO templates (id, name, version, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                template.id.to_string(),
                template.name,
                template.version,
                template.is_active,
                template.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Template>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, version, is_active, created_at \
             FROM templates \
             WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map(params![id.to_string()], row_to_template)?;
        rows.next().transpose()
    }

    /// List all templates, name ascending then newest version first.
    pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Template>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, version, is_active, created_at \
             FROM templates \
             ORDER BY name ASC, version DESC",
        )?;

        let rows = stmt.query_map([], row_to_template)?;
        rows.collect()
    }

    /// Flip the active flag. Returns false when the template is missing.
    pub fn set_active(conn: &Connection, id: Uuid, is_active: bool) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "UPDATE templates SET is_active = ?1 WHERE id = ?2",
            params![is_active, id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<Template> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(4)?;

    Ok(Template {
        id: uuid_from_column(0, &id)?,
        name: row.get(1)?,
        version: row.get(2)?,
        is_active: row.get(3)?,
        created_at: timestamp_from_column(4, &created_at)?,
    })
}
