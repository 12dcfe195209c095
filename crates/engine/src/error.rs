// Typed error taxonomy for structural operations.
//
// Every failure a caller can branch on gets its own variant; underlying
// storage failures are wrapped unchanged in `Persistence`. The engine
// never retries on its own — retry policy belongs to the caller.

use thiserror::Error;
use trellis_common::title::TitleError;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StructureError {
    /// Malformed input rejected before any write.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("template `{0}` not found")]
    TemplateNotFound(Uuid),

    #[error("section `{0}` not found")]
    SectionNotFound(Uuid),

    #[error("mapping `{0}` not found")]
    MappingNotFound(Uuid),

    /// The operation has no valid target position (already first, last,
    /// or root-level). Raised before any write; state is untouched.
    #[error("section `{id}` is {position}")]
    Boundary { id: Uuid, position: &'static str },

    #[error("section `{0}` has child sections and cannot be deleted")]
    HasChildren(Uuid),

    /// A compare-and-swap precondition failed mid-transaction: the
    /// sibling group changed under us. The transaction is rolled back.
    #[error("sibling order changed concurrently; re-fetch and retry")]
    Conflict,

    #[error("structural edit denied for template `{0}`")]
    AccessDenied(Uuid),

    #[error(transparent)]
    Persistence(#[from] rusqlite::Error),
}

impl From<TitleError> for StructureError {
    fn from(error: TitleError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl StructureError {
    /// Stable machine-readable code for CLI/stderr output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::SectionNotFound(_) => "SECTION_NOT_FOUND",
            Self::MappingNotFound(_) => "MAPPING_NOT_FOUND",
            Self::Boundary { .. } => "BOUNDARY",
            Self::HasChildren(_) => "HAS_CHILDREN",
            Self::Conflict => "CONFLICT",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::Persistence(_) => "PERSISTENCE",
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::StructureError;
    use trellis_common::title::TitleError;

    #[test]
    fn title_errors_become_validation() {
        let error = StructureError::from(TitleError::Empty);
        assert_eq!(error.code(), "VALIDATION_FAILED");
        assert!(error.to_string().contains("title is empty"));
    }

    #[test]
    fn codes_are_distinct_per_taxonomy_case() {
        let id = Uuid::nil();
        let cases = [
            StructureError::Validation("bad".into()).code(),
            StructureError::TemplateNotFound(id).code(),
            StructureError::SectionNotFound(id).code(),
            StructureError::MappingNotFound(id).code(),
            StructureError::Boundary { id, position: "already the first sibling" }.code(),
            StructureError::HasChildren(id).code(),
            StructureError::Conflict.code(),
            StructureError::AccessDenied(id).code(),
        ];
        let unique: std::collections::HashSet<_> = cases.iter().collect();
        assert_eq!(unique.len(), cases.len());
    }
}
