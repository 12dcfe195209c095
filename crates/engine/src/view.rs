// Read side: derived structure views over the flat rows.
//
// The tree is recomputed from `sections` on every call. Nothing here
// caches, and nothing here writes.

use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use trellis_common::tree::{build_tree, SectionNode};
use trellis_common::types::{Mapping, Template};

use crate::error::StructureError;
use crate::store::mappings::MappingStore;
use crate::store::sections::SectionStore;
use crate::store::templates::TemplateStore;

/// Search results are capped; the picker UI never needs more.
const SEARCH_LIMIT: u32 = 50;

/// A template with its derived section tree and the mappings targeting
/// its sections.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateStructure {
    pub template: Template,
    pub tree: Vec<SectionNode>,
    pub mappings: Vec<Mapping>,
}

/// A section matched by title search, with enough context to present
/// it as a mapping source candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionHit {
    pub id: Uuid,
    pub title: String,
    pub template_id: Uuid,
    pub template_name: String,
}

/// Load one template's full structure: flat rows in, tree out.
pub fn template_structure(
    conn: &Connection,
    template_id: Uuid,
) -> Result<TemplateStructure, StructureError> {
    let template = TemplateStore::get(conn, template_id)?
        .ok_or(StructureError::TemplateNotFound(template_id))?;

    let sections = SectionStore::list_by_template(conn, template_id)?;
    let tree = build_tree(&sections);
    let mappings = MappingStore::list_for_template(conn, template_id)?;

    Ok(TemplateStructure { template, tree, mappings })
}

/// Case-insensitive title substring search across every template except
/// `exclude_template`. Capped at 50 hits, title ascending.
pub fn search_sections(
    conn: &Connection,
    exclude_template: Uuid,
    query: &str,
) -> Result<Vec<SectionHit>, StructureError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT s.id, s.title, t.id, t.name \
         FROM sections s \
         JOIN templates t ON t.id = s.template_id \
         WHERE s.template_id != ?1 \
           AND s.title LIKE ?2 ESCAPE '\\' COLLATE NOCASE \
         ORDER BY s.title ASC, s.id ASC \
         LIMIT ?3",
    )?;

    let pattern = format!("%{}%", escape_like(query));
    let rows = stmt.query_map(
        params![exclude_template.to_string(), pattern, SEARCH_LIMIT],
        |row| {
            let id: String = row.get(0)?;
            let template_id: String = row.get(2)?;
            Ok(SectionHit {
                id: crate::store::uuid_from_column(0, &id)?,
                title: row.get(1)?,
                template_id: crate::store::uuid_from_column(2, &template_id)?,
                template_name: row.get(3)?,
            })
        },
    )?;

    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::{escape_like, search_sections, template_structure};
    use crate::auth::AllowAll;
    use crate::error::StructureError;
    use crate::mutator::{MappingDraft, StructureMutator};
    use crate::store::db::StructureDb;
    use crate::store::templates::TemplateStore;
    use trellis_common::types::Template;

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn open_db() -> (StructureDb, PathBuf) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should work")
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("trellis-view-{nanos}-{seq}.db"));
        let db = StructureDb::open(&path).expect("structure db should open");
        (db, path)
    }

    fn cleanup(path: &PathBuf) {
        let s = path.display().to_string();
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(format!("{s}-wal"));
        let _ = std::fs::remove_file(format!("{s}-shm"));
    }

    fn seed_template(db: &StructureDb, name: &str) -> Uuid {
        let template = Template {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version: 1,
            is_active: true,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp"),
        };
        TemplateStore::insert(db.connection(), &template).unwrap();
        template.id
    }

    #[test]
    fn structure_view_derives_numbers_from_ranks() {
        let (mut db, path) = open_db();
        let template_id = seed_template(&db, "CSR");
        let mutator = StructureMutator::new(&AllowAll);

        let intro =
            mutator.insert_section(db.connection_mut(), template_id, None, "Introduction").unwrap();
        let methods =
            mutator.insert_section(db.connection_mut(), template_id, None, "Methods").unwrap();
        let design = mutator
            .insert_section(db.connection_mut(), template_id, Some(methods.id), "Design")
            .unwrap();

        let view = template_structure(db.connection(), template_id).unwrap();
        assert_eq!(view.template.id, template_id);
        assert_eq!(view.tree.len(), 2);
        assert_eq!((view.tree[0].id, view.tree[0].number.as_str()), (intro.id, "1"));
        assert_eq!((view.tree[1].id, view.tree[1].number.as_str()), (methods.id, "2"));
        assert_eq!(view.tree[1].children[0].number, "2.1");
        assert_eq!(view.tree[1].children[0].id, design.id);

        drop(db);
        cleanup(&path);
    }

    #[test]
    fn structure_view_includes_template_mappings() {
        let (mut db, path) = open_db();
        let template_id = seed_template(&db, "CSR");
        let mutator = StructureMutator::new(&AllowAll);

        let source =
            mutator.insert_section(db.connection_mut(), template_id, None, "Source").unwrap();
        let target =
            mutator.insert_section(db.connection_mut(), template_id, None, "Target").unwrap();
        let mapping = mutator
            .save_mapping(
                db.connection_mut(),
                MappingDraft {
                    id: None,
                    target_section_id: target.id,
                    source_section_id: source.id,
                    instruction: "summarize".into(),
                    order_index: None,
                },
            )
            .unwrap();

        let view = template_structure(db.connection(), template_id).unwrap();
        assert_eq!(view.mappings.len(), 1);
        assert_eq!(view.mappings[0].id, mapping.id);

        drop(db);
        cleanup(&path);
    }

    #[test]
    fn structure_view_reports_missing_template() {
        let (db, path) = open_db();
        let missing = Uuid::new_v4();
        let error = template_structure(db.connection(), missing)
            .expect_err("missing template must be reported");
        assert!(matches!(error, StructureError::TemplateNotFound(id) if id == missing));

        drop(db);
        cleanup(&path);
    }

    #[test]
    fn search_excludes_own_template_and_ignores_case() {
        let (mut db, path) = open_db();
        let own = seed_template(&db, "CSR");
        let other = seed_template(&db, "Protocol");
        let mutator = StructureMutator::new(&AllowAll);

        mutator.insert_section(db.connection_mut(), own, None, "Safety Summary").unwrap();
        let hit =
            mutator.insert_section(db.connection_mut(), other, None, "Safety Narrative").unwrap();

        let hits = search_sections(db.connection(), own, "safety").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, hit.id);
        assert_eq!(hits[0].template_name, "Protocol");

        drop(db);
        cleanup(&path);
    }

    #[test]
    fn search_blank_query_returns_nothing() {
        let (db, path) = open_db();
        let hits = search_sections(db.connection(), Uuid::new_v4(), "   ").unwrap();
        assert!(hits.is_empty());

        drop(db);
        cleanup(&path);
    }

    #[test]
    fn like_wildcards_in_queries_match_literally() {
        let (mut db, path) = open_db();
        let own = seed_template(&db, "CSR");
        let other = seed_template(&db, "Protocol");
        let mutator = StructureMutator::new(&AllowAll);

        let literal = mutator
            .insert_section(db.connection_mut(), other, None, "Dose 100% Completion")
            .unwrap();
        mutator.insert_section(db.connection_mut(), other, None, "Dose 100 Completion").unwrap();

        let hits = search_sections(db.connection(), own, "100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, literal.id);

        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");

        drop(db);
        cleanup(&path);
    }
}
