// End-to-end structural operation sequences against a real sqlite file.
//
// These exercise the invariants the unit tests only touch per-module:
// sibling groups stay dense and gapless after arbitrary operation
// chains, derived numbers follow ranks, boundary failures write
// nothing, and indent/outdent round-trip.

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use trellis_common::types::{Section, Template};
use trellis_engine::auth::{AllowAll, DenyAll};
use trellis_engine::error::StructureError;
use trellis_engine::mutator::{MappingDraft, StructureMutator};
use trellis_engine::store::db::StructureDb;
use trellis_engine::store::sections::SectionStore;
use trellis_engine::store::templates::TemplateStore;
use trellis_engine::view::template_structure;

struct Harness {
    db: StructureDb,
    template_id: Uuid,
    _dir: TempDir,
}

fn harness() -> Harness {
    let dir = TempDir::new().expect("temp dir should be created");
    let db = StructureDb::open(dir.path().join("structure.db")).expect("structure db should open");

    let template = Template {
        id: Uuid::new_v4(),
        name: "Clinical Study Report".into(),
        version: 1,
        is_active: true,
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp"),
    };
    TemplateStore::insert(db.connection(), &template).expect("template insert should succeed");

    Harness { db, template_id: template.id, _dir: dir }
}

fn add(h: &mut Harness, parent: Option<Uuid>, title: &str) -> Section {
    StructureMutator::new(&AllowAll)
        .insert_section(h.db.connection_mut(), h.template_id, parent, title)
        .expect("insert should succeed")
}

/// Assert a sibling group holds exactly 0..n-1 in listing order.
fn assert_gapless(h: &Harness, parent: Option<Uuid>, expected_ids: &[Uuid]) {
    let siblings = SectionStore::list_siblings(h.db.connection(), h.template_id, parent)
        .expect("sibling query should succeed");
    let ids: Vec<Uuid> = siblings.iter().map(|s| s.id).collect();
    assert_eq!(ids, expected_ids, "sibling order mismatch");
    for (rank, section) in siblings.iter().enumerate() {
        assert_eq!(
            section.order_index as usize, rank,
            "group must be dense and gapless, section `{}` is off",
            section.title
        );
    }
}

fn numbers(h: &Harness) -> Vec<(String, String)> {
    let view =
        template_structure(h.db.connection(), h.template_id).expect("view should succeed");
    let mut out = Vec::new();
    fn walk(nodes: &[trellis_common::tree::SectionNode], out: &mut Vec<(String, String)>) {
        for node in nodes {
            out.push((node.number.clone(), node.title.clone()));
            walk(&node.children, out);
        }
    }
    walk(&view.tree, &mut out);
    out
}

#[test]
fn sibling_groups_stay_gapless_across_operation_chains() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    let a = add(&mut h, None, "A");
    let b = add(&mut h, None, "B");
    let c = add(&mut h, None, "C");
    let d = add(&mut h, None, "D");
    assert_gapless(&h, None, &[a.id, b.id, c.id, d.id]);

    mutator.move_up(h.db.connection_mut(), c.id).unwrap();
    assert_gapless(&h, None, &[a.id, c.id, b.id, d.id]);

    mutator.delete_section(h.db.connection_mut(), a.id).unwrap();
    assert_gapless(&h, None, &[c.id, b.id, d.id]);

    mutator.indent(h.db.connection_mut(), b.id).unwrap();
    assert_gapless(&h, None, &[c.id, d.id]);
    assert_gapless(&h, Some(c.id), &[b.id]);

    mutator.move_down(h.db.connection_mut(), c.id).unwrap();
    assert_gapless(&h, None, &[d.id, c.id]);
    assert_gapless(&h, Some(c.id), &[b.id]);
}

#[test]
fn derived_numbers_track_insert_and_move_up() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    add(&mut h, None, "Introduction");
    let methods = add(&mut h, None, "Methods");
    add(&mut h, Some(methods.id), "Design");
    let results = add(&mut h, None, "Results");

    assert_eq!(
        numbers(&h),
        vec![
            ("1".to_string(), "Introduction".to_string()),
            ("2".to_string(), "Methods".to_string()),
            ("2.1".to_string(), "Design".to_string()),
            ("3".to_string(), "Results".to_string()),
        ]
    );

    mutator.move_up(h.db.connection_mut(), results.id).unwrap();

    assert_eq!(
        numbers(&h),
        vec![
            ("1".to_string(), "Introduction".to_string()),
            ("2".to_string(), "Results".to_string()),
            ("3".to_string(), "Methods".to_string()),
            ("3.1".to_string(), "Design".to_string()),
        ]
    );
}

#[test]
fn boundary_failures_leave_every_row_unchanged() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    let a = add(&mut h, None, "A");
    let b = add(&mut h, None, "B");
    let child = add(&mut h, Some(a.id), "A1");

    let before = SectionStore::list_by_template(h.db.connection(), h.template_id).unwrap();

    for error in [
        mutator.move_up(h.db.connection_mut(), a.id).unwrap_err(),
        mutator.move_down(h.db.connection_mut(), b.id).unwrap_err(),
        mutator.indent(h.db.connection_mut(), a.id).unwrap_err(),
        mutator.indent(h.db.connection_mut(), child.id).unwrap_err(),
        mutator.outdent(h.db.connection_mut(), a.id).unwrap_err(),
    ] {
        assert!(matches!(error, StructureError::Boundary { .. }), "got {error:?}");
    }

    let after = SectionStore::list_by_template(h.db.connection(), h.template_id).unwrap();
    assert_eq!(before, after);
}

#[test]
fn indent_appends_under_preceding_sibling() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    let a = add(&mut h, None, "A");
    let existing_child = add(&mut h, Some(a.id), "A1");
    let b = add(&mut h, None, "B");
    let c = add(&mut h, None, "C");

    mutator.indent(h.db.connection_mut(), b.id).unwrap();

    // B lands after A's existing children, C closes the root gap.
    assert_gapless(&h, None, &[a.id, c.id]);
    assert_gapless(&h, Some(a.id), &[existing_child.id, b.id]);

    let moved = SectionStore::get(h.db.connection(), b.id).unwrap().unwrap();
    assert_eq!(moved.parent_id, Some(a.id));
    assert_eq!(moved.order_index, 1);
}

#[test]
fn outdent_lands_directly_after_former_parent() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    let a = add(&mut h, None, "A");
    let b = add(&mut h, None, "B");
    let a1 = add(&mut h, Some(a.id), "A1");
    let a2 = add(&mut h, Some(a.id), "A2");

    mutator.outdent(h.db.connection_mut(), a1.id).unwrap();

    // A1 slots between A and B; A's remaining child compacts to rank 0.
    assert_gapless(&h, None, &[a.id, a1.id, b.id]);
    assert_gapless(&h, Some(a.id), &[a2.id]);
}

#[test]
fn indent_then_outdent_restores_the_original_shape() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    let a = add(&mut h, None, "A");
    let b = add(&mut h, None, "B");
    let c = add(&mut h, None, "C");

    // B indents under A with no prior children, then outdents straight
    // back to its old slot.
    mutator.indent(h.db.connection_mut(), b.id).unwrap();
    assert_gapless(&h, None, &[a.id, c.id]);
    assert_gapless(&h, Some(a.id), &[b.id]);

    mutator.outdent(h.db.connection_mut(), b.id).unwrap();
    assert_gapless(&h, None, &[a.id, b.id, c.id]);

    let restored = SectionStore::get(h.db.connection(), b.id).unwrap().unwrap();
    assert_eq!(restored.parent_id, None);
    assert_eq!(restored.order_index, 1);
}

#[test]
fn delete_guard_and_cascade_interact_correctly() {
    let mut h = harness();
    let mutator = StructureMutator::new(&AllowAll);

    let parent = add(&mut h, None, "Parent");
    let child = add(&mut h, Some(parent.id), "Child");
    let other = add(&mut h, None, "Other");

    mutator
        .save_mapping(
            h.db.connection_mut(),
            MappingDraft {
                id: None,
                target_section_id: other.id,
                source_section_id: child.id,
                instruction: "pull the narrative".into(),
                order_index: None,
            },
        )
        .unwrap();

    let error = mutator.delete_section(h.db.connection_mut(), parent.id).unwrap_err();
    assert!(matches!(error, StructureError::HasChildren(id) if id == parent.id));

    mutator.delete_section(h.db.connection_mut(), child.id).unwrap();
    let remaining: i64 = h
        .db
        .connection()
        .query_row("SELECT COUNT(*) FROM mappings", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0, "mappings referencing the section must cascade");

    // Guard lifted once the child is gone.
    mutator.delete_section(h.db.connection_mut(), parent.id).unwrap();
    assert_gapless(&h, None, &[other.id]);
}

#[test]
fn denied_gate_blocks_every_mutation_without_writes() {
    let mut h = harness();
    let allow = StructureMutator::new(&AllowAll);
    let deny = StructureMutator::new(&DenyAll);

    let a = add(&mut h, None, "A");
    let b = add(&mut h, None, "B");
    let before = SectionStore::list_by_template(h.db.connection(), h.template_id).unwrap();

    let template_id = h.template_id;
    let conn = h.db.connection_mut();
    for error in [
        deny.insert_section(conn, template_id, None, "C").map(|_| ()).unwrap_err(),
        deny.rename_section(conn, a.id, "Renamed").map(|_| ()).unwrap_err(),
        deny.delete_section(conn, b.id).unwrap_err(),
        deny.move_down(conn, a.id).unwrap_err(),
        deny.indent(conn, b.id).unwrap_err(),
        deny.save_mapping(
            conn,
            MappingDraft {
                id: None,
                target_section_id: a.id,
                source_section_id: b.id,
                instruction: "x".into(),
                order_index: None,
            },
        )
        .map(|_| ())
        .unwrap_err(),
    ] {
        assert!(matches!(error, StructureError::AccessDenied(_)), "got {error:?}");
    }

    let after = SectionStore::list_by_template(h.db.connection(), h.template_id).unwrap();
    assert_eq!(before, after);

    // The permissive gate still works on the same rows.
    allow.rename_section(h.db.connection_mut(), a.id, "Renamed").unwrap();
}

#[test]
fn deep_chain_numbers_follow_every_level() {
    let mut h = harness();

    let a = add(&mut h, None, "A");
    let b = add(&mut h, Some(a.id), "B");
    let c = add(&mut h, Some(b.id), "C");
    add(&mut h, Some(c.id), "D");

    assert_eq!(
        numbers(&h),
        vec![
            ("1".to_string(), "A".to_string()),
            ("1.1".to_string(), "B".to_string()),
            ("1.1.1".to_string(), "C".to_string()),
            ("1.1.1.1".to_string(), "D".to_string()),
        ]
    );
}
