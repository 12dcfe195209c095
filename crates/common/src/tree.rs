// Flat section rows → numbered forest.
//
// The tree is a pure projection of the persisted rows: it is rebuilt on
// every read and never patched in place. Dotted section numbers are
// derived from 1-based sibling rank and are never stored.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::types::Section;

/// A section with its derived number and nested children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionNode {
    pub id: Uuid,
    pub title: String,
    /// Dotted display number, e.g. "2.3.1".
    pub number: String,
    pub order_index: u32,
    #[serde(default)]
    pub children: Vec<SectionNode>,
}

/// Build the numbered forest for a template's flat section rows.
///
/// Rows are grouped by `parent_id` and each group is stably sorted by
/// `order_index`; the 1-based rank within the sorted group becomes the
/// last component of the node's number. Sections whose `parent_id`
/// references a missing row are dropped (together with their subtree)
/// and logged as a data-integrity warning — they never surface as
/// roots. Multiple roots are legal and returned in order.
pub fn build_tree(sections: &[Section]) -> Vec<SectionNode> {
    let known: HashSet<Uuid> = sections.iter().map(|section| section.id).collect();

    let mut groups: HashMap<Option<Uuid>, Vec<&Section>> = HashMap::new();
    for section in sections {
        if let Some(parent_id) = section.parent_id {
            if !known.contains(&parent_id) {
                warn!(
                    section_id = %section.id,
                    parent_id = %parent_id,
                    "dropping section with orphaned parent reference"
                );
                continue;
            }
        }
        groups.entry(section.parent_id).or_default().push(section);
    }

    for group in groups.values_mut() {
        group.sort_by_key(|section| section.order_index);
    }

    attach_children(&groups, None, "")
}

fn attach_children(
    groups: &HashMap<Option<Uuid>, Vec<&Section>>,
    parent_id: Option<Uuid>,
    parent_number: &str,
) -> Vec<SectionNode> {
    let Some(siblings) = groups.get(&parent_id) else {
        return Vec::new();
    };

    siblings
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let rank = index + 1;
            let number = if parent_number.is_empty() {
                rank.to_string()
            } else {
                format!("{parent_number}.{rank}")
            };
            let children = attach_children(groups, Some(section.id), &number);
            SectionNode {
                id: section.id,
                title: section.title.clone(),
                number,
                order_index: section.order_index,
                children,
            }
        })
        .collect()
}
