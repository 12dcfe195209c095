// Authorization gate consulted before any structural mutation.
//
// The engine treats authorization as an upstream collaborator: a plain
// boolean gate. Denial short-circuits the operation with zero writes.

use uuid::Uuid;

pub trait AccessGate {
    /// May the caller apply structural edits to this template's tree?
    fn allow_structural_edit(&self, template_id: Uuid) -> bool;
}

/// Gate that permits everything. Default for single-user deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn allow_structural_edit(&self, _template_id: Uuid) -> bool {
        true
    }
}

/// Gate that denies everything. Used for read-only deployments and in
/// tests asserting the write-free short circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AccessGate for DenyAll {
    fn allow_structural_edit(&self, _template_id: Uuid) -> bool {
        false
    }
}
