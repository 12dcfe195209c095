// Core domain types shared across all Trellis crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document template: the owner of one section tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub version: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A node in a template's hierarchical structure.
///
/// `order_index` is the zero-based rank among siblings sharing the same
/// `(template_id, parent_id)` group and is kept dense: the group's
/// values are always exactly `{0, .., n-1}`. The dotted section number
/// ("2.3.1") is never stored; it is derived from sibling rank on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub id: Uuid,
    pub template_id: Uuid,
    /// Parent section in the same template; `None` means root-level.
    pub parent_id: Option<Uuid>,
    pub order_index: u32,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A content-generation link from a source section to a target section.
///
/// The source may live in a different template. `order_index` orders
/// mappings sharing the same target for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mapping {
    pub id: Uuid,
    pub source_section_id: Uuid,
    pub target_section_id: Uuid,
    pub instruction: String,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
}
