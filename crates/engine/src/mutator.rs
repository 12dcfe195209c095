// Structural mutations over a template's section tree.
//
// Each operation is a single IMMEDIATE transaction: validate → compute
// the new ordering → write → commit. Validation failures return before
// any write. Every repositioning update carries a compare-and-swap
// guard on the order_index observed at the start of the transaction; a
// missed guard aborts the whole operation with `Conflict` and rolls
// back.
//
// The gapless invariant is maintained unconditionally: delete, indent
// and outdent all compact the vacated sibling group in the same
// transaction, so every `(template_id, parent_id)` group always holds
// exactly `{0, .., n-1}`.

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use trellis_common::title::normalize_title;
use trellis_common::types::{Mapping, Section};

use crate::auth::AccessGate;
use crate::error::StructureError;
use crate::store::mappings::MappingStore;
use crate::store::sections::SectionStore;
use crate::store::templates::TemplateStore;

/// Parent chains longer than this are treated as corrupt (cycle).
const MAX_ANCESTOR_HOPS: usize = 128;

/// Fields for creating or editing a mapping. `id = None` inserts a new
/// mapping appended at the end of the target's display list.
#[derive(Debug, Clone)]
pub struct MappingDraft {
    pub id: Option<Uuid>,
    pub target_section_id: Uuid,
    pub source_section_id: Uuid,
    pub instruction: String,
    pub order_index: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
enum Shift {
    Up,
    Down,
}

/// Applies structural operations behind an authorization gate.
pub struct StructureMutator<'g> {
    gate: &'g dyn AccessGate,
}

impl<'g> StructureMutator<'g> {
    pub fn new(gate: &'g dyn AccessGate) -> Self {
        Self { gate }
    }

    /// Append a new section at the end of its sibling group.
    ///
    /// Never renumbers existing siblings: the new row takes
    /// `max(order_index) + 1`, or 0 in an empty group.
    pub fn insert_section(
        &self,
        conn: &mut Connection,
        template_id: Uuid,
        parent_id: Option<Uuid>,
        title: &str,
    ) -> Result<Section, StructureError> {
        let title = normalize_title(title)?;
        let tx = begin(conn)?;

        self.check_gate(template_id)?;
        if TemplateStore::get(&tx, template_id)?.is_none() {
            return Err(StructureError::TemplateNotFound(template_id));
        }
        if let Some(parent_id) = parent_id {
            let parent = SectionStore::get(&tx, parent_id)?
                .ok_or(StructureError::SectionNotFound(parent_id))?;
            if parent.template_id != template_id {
                return Err(StructureError::Validation(format!(
                    "parent section `{parent_id}` belongs to a different template"
                )));
            }
        }

        let order_index =
            SectionStore::max_sibling_order(&tx, template_id, parent_id)?.map_or(0, |max| max + 1);
        let section = Section {
            id: Uuid::new_v4(),
            template_id,
            parent_id,
            order_index,
            title,
            created_at: Utc::now(),
        };
        SectionStore::insert(&tx, &section)?;
        tx.commit()?;

        debug!(section_id = %section.id, order_index, "inserted section at end of sibling group");
        Ok(section)
    }

    /// Title-only edit; ordering and hierarchy are untouched.
    pub fn rename_section(
        &self,
        conn: &mut Connection,
        id: Uuid,
        title: &str,
    ) -> Result<Section, StructureError> {
        let title = normalize_title(title)?;
        let tx = begin(conn)?;

        let mut section =
            SectionStore::get(&tx, id)?.ok_or(StructureError::SectionNotFound(id))?;
        self.check_gate(section.template_id)?;

        SectionStore::update_title(&tx, id, &title)?;
        tx.commit()?;

        section.title = title;
        Ok(section)
    }

    /// Remove a childless section, cascade its mappings, and compact the
    /// vacated sibling group back to a dense `{0, .., n-1}`.
    pub fn delete_section(&self, conn: &mut Connection, id: Uuid) -> Result<(), StructureError> {
        let tx = begin(conn)?;

        let target = SectionStore::get(&tx, id)?.ok_or(StructureError::SectionNotFound(id))?;
        self.check_gate(target.template_id)?;
        if SectionStore::has_children(&tx, id)? {
            return Err(StructureError::HasChildren(id));
        }

        let cascaded = MappingStore::delete_for_section(&tx, id)?;
        SectionStore::delete(&tx, id)?;
        compact_after_removal(&tx, target.template_id, target.parent_id, target.order_index)?;
        tx.commit()?;

        debug!(section_id = %id, cascaded_mappings = cascaded, "deleted section");
        Ok(())
    }

    /// Swap the section with its previous sibling.
    pub fn move_up(&self, conn: &mut Connection, id: Uuid) -> Result<(), StructureError> {
        self.swap_with_neighbor(conn, id, Shift::Up)
    }

    /// Swap the section with its next sibling.
    pub fn move_down(&self, conn: &mut Connection, id: Uuid) -> Result<(), StructureError> {
        self.swap_with_neighbor(conn, id, Shift::Down)
    }

    fn swap_with_neighbor(
        &self,
        conn: &mut Connection,
        id: Uuid,
        shift: Shift,
    ) -> Result<(), StructureError> {
        let tx = begin(conn)?;

        let target = SectionStore::get(&tx, id)?.ok_or(StructureError::SectionNotFound(id))?;
        self.check_gate(target.template_id)?;

        let siblings = SectionStore::list_siblings(&tx, target.template_id, target.parent_id)?;
        let index =
            siblings.iter().position(|s| s.id == id).ok_or(StructureError::Conflict)?;
        let neighbor = match shift {
            Shift::Up => {
                if index == 0 {
                    return Err(StructureError::Boundary {
                        id,
                        position: "already the first sibling",
                    });
                }
                &siblings[index - 1]
            }
            Shift::Down => {
                if index + 1 == siblings.len() {
                    return Err(StructureError::Boundary {
                        id,
                        position: "already the last sibling",
                    });
                }
                &siblings[index + 1]
            }
        };

        if !SectionStore::set_order_index(&tx, id, neighbor.order_index, target.order_index)? {
            return Err(StructureError::Conflict);
        }
        if !SectionStore::set_order_index(&tx, neighbor.id, target.order_index, neighbor.order_index)?
        {
            return Err(StructureError::Conflict);
        }
        tx.commit()?;

        debug!(
            section_id = %id,
            neighbor_id = %neighbor.id,
            "swapped order with adjacent sibling"
        );
        Ok(())
    }

    /// Reparent the section under its immediately preceding sibling,
    /// appended at the end of that sibling's children. The origin group
    /// is compacted to close the vacated slot.
    pub fn indent(&self, conn: &mut Connection, id: Uuid) -> Result<(), StructureError> {
        let tx = begin(conn)?;

        let target = SectionStore::get(&tx, id)?.ok_or(StructureError::SectionNotFound(id))?;
        self.check_gate(target.template_id)?;

        let siblings = SectionStore::list_siblings(&tx, target.template_id, target.parent_id)?;
        let index =
            siblings.iter().position(|s| s.id == id).ok_or(StructureError::Conflict)?;
        if index == 0 {
            return Err(StructureError::Boundary { id, position: "already the first sibling" });
        }
        let new_parent = &siblings[index - 1];

        // A preceding sibling can only be a descendant of the target if
        // the stored relation is already cyclic; refuse rather than
        // extend the cycle.
        if ancestor_chain_contains(&tx, Some(new_parent.id), id)? {
            return Err(StructureError::Validation(format!(
                "reparenting `{id}` under `{}` would create a cycle",
                new_parent.id
            )));
        }

        let new_order = SectionStore::max_sibling_order(&tx, target.template_id, Some(new_parent.id))?
            .map_or(0, |max| max + 1);
        if !SectionStore::set_parent_and_order(
            &tx,
            id,
            Some(new_parent.id),
            new_order,
            target.order_index,
        )? {
            return Err(StructureError::Conflict);
        }

        for sibling in &siblings[index + 1..] {
            if !SectionStore::set_order_index(&tx, sibling.id, sibling.order_index - 1, sibling.order_index)?
            {
                return Err(StructureError::Conflict);
            }
        }
        tx.commit()?;

        debug!(
            section_id = %id,
            new_parent_id = %new_parent.id,
            new_order,
            "indented section under preceding sibling"
        );
        Ok(())
    }

    /// Move the section one level up, re-inserted immediately after its
    /// former parent among that parent's siblings. The destination group
    /// shifts right to make room; the origin group is compacted.
    pub fn outdent(&self, conn: &mut Connection, id: Uuid) -> Result<(), StructureError> {
        let tx = begin(conn)?;

        let target = SectionStore::get(&tx, id)?.ok_or(StructureError::SectionNotFound(id))?;
        self.check_gate(target.template_id)?;

        let Some(parent_id) = target.parent_id else {
            return Err(StructureError::Boundary { id, position: "already root-level" });
        };
        let parent = SectionStore::get(&tx, parent_id)?
            .ok_or(StructureError::SectionNotFound(parent_id))?;
        let grandparent_id = parent.parent_id;

        let destination = SectionStore::list_siblings(&tx, target.template_id, grandparent_id)?;
        if !destination.iter().any(|s| s.id == parent.id) {
            return Err(StructureError::Conflict);
        }
        let new_order = parent.order_index + 1;

        // Shift the tail right, highest slot first.
        for sibling in destination.iter().rev().filter(|s| s.order_index >= new_order) {
            if !SectionStore::set_order_index(&tx, sibling.id, sibling.order_index + 1, sibling.order_index)?
            {
                return Err(StructureError::Conflict);
            }
        }

        if !SectionStore::set_parent_and_order(&tx, id, grandparent_id, new_order, target.order_index)?
        {
            return Err(StructureError::Conflict);
        }

        compact_after_removal(&tx, target.template_id, Some(parent.id), target.order_index)?;
        tx.commit()?;

        debug!(
            section_id = %id,
            former_parent_id = %parent.id,
            new_order,
            "outdented section next to former parent"
        );
        Ok(())
    }

    /// Create or edit a mapping. New mappings append at the end of the
    /// target section's display list.
    pub fn save_mapping(
        &self,
        conn: &mut Connection,
        draft: MappingDraft,
    ) -> Result<Mapping, StructureError> {
        let tx = begin(conn)?;

        let target = SectionStore::get(&tx, draft.target_section_id)?
            .ok_or(StructureError::SectionNotFound(draft.target_section_id))?;
        self.check_gate(target.template_id)?;
        if SectionStore::get(&tx, draft.source_section_id)?.is_none() {
            return Err(StructureError::SectionNotFound(draft.source_section_id));
        }

        let mapping = match draft.id {
            Some(id) => {
                let existing = MappingStore::get(&tx, id)?
                    .ok_or(StructureError::MappingNotFound(id))?;
                let order_index = draft.order_index.unwrap_or(existing.order_index);
                MappingStore::update(&tx, id, draft.source_section_id, &draft.instruction, order_index)?;
                Mapping {
                    id,
                    source_section_id: draft.source_section_id,
                    target_section_id: existing.target_section_id,
                    instruction: draft.instruction,
                    order_index,
                    created_at: existing.created_at,
                }
            }
            None => {
                let order_index = match draft.order_index {
                    Some(order) => order,
                    None => MappingStore::max_order_for_target(&tx, draft.target_section_id)?
                        .map_or(0, |max| max + 1),
                };
                let mapping = Mapping {
                    id: Uuid::new_v4(),
                    source_section_id: draft.source_section_id,
                    target_section_id: draft.target_section_id,
                    instruction: draft.instruction,
                    order_index,
                    created_at: Utc::now(),
                };
                MappingStore::insert(&tx, &mapping)?;
                mapping
            }
        };
        tx.commit()?;

        Ok(mapping)
    }

    pub fn delete_mapping(&self, conn: &mut Connection, id: Uuid) -> Result<(), StructureError> {
        let tx = begin(conn)?;

        let mapping =
            MappingStore::get(&tx, id)?.ok_or(StructureError::MappingNotFound(id))?;
        let target = SectionStore::get(&tx, mapping.target_section_id)?
            .ok_or(StructureError::SectionNotFound(mapping.target_section_id))?;
        self.check_gate(target.template_id)?;

        MappingStore::delete(&tx, id)?;
        tx.commit()?;
        Ok(())
    }

    fn check_gate(&self, template_id: Uuid) -> Result<(), StructureError> {
        if self.gate.allow_structural_edit(template_id) {
            Ok(())
        } else {
            Err(StructureError::AccessDenied(template_id))
        }
    }
}

fn begin(conn: &mut Connection) -> Result<Transaction<'_>, StructureError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Close the slot left by removing a row at `removed_order` from the
/// given sibling group: every later sibling steps down by one.
fn compact_after_removal(
    tx: &Transaction<'_>,
    template_id: Uuid,
    parent_id: Option<Uuid>,
    removed_order: u32,
) -> Result<(), StructureError> {
    let siblings = SectionStore::list_siblings(tx, template_id, parent_id)?;
    for sibling in siblings.iter().filter(|s| s.order_index > removed_order) {
        if !SectionStore::set_order_index(tx, sibling.id, sibling.order_index - 1, sibling.order_index)?
        {
            return Err(StructureError::Conflict);
        }
    }
    Ok(())
}

/// Walk the parent chain from `start`; true if it reaches `needle`.
fn ancestor_chain_contains(
    tx: &Transaction<'_>,
    start: Option<Uuid>,
    needle: Uuid,
) -> Result<bool, StructureError> {
    let mut cursor = start;
    let mut hops = 0usize;
    while let Some(id) = cursor {
        if id == needle {
            return Ok(true);
        }
        hops += 1;
        if hops > MAX_ANCESTOR_HOPS {
            return Err(StructureError::Validation(
                "parent chain exceeds maximum depth; stored hierarchy may be cyclic".into(),
            ));
        }
        cursor = SectionStore::get(tx, id)?.and_then(|section| section.parent_id);
    }
    Ok(false)
}
