//! Entity kinds served by the classifier.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// List-page entity kind. Each kind resolves to one rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Work item with a due date.
    Task,
    /// Digital signature certificate held in custody.
    DscCertificate,
    /// Client document with an optional expiry.
    Document,
    /// Statutory or compliance due date.
    DueDate,
}

/// Stable string id for task records.
pub const ENTITY_KIND_TASK: &str = "task";
/// Stable string id for DSC certificate records.
pub const ENTITY_KIND_DSC_CERTIFICATE: &str = "dsc_certificate";
/// Stable string id for document records.
pub const ENTITY_KIND_DOCUMENT: &str = "document";
/// Stable string id for due-date records.
pub const ENTITY_KIND_DUE_DATE: &str = "due_date";

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Task,
        EntityKind::DscCertificate,
        EntityKind::Document,
        EntityKind::DueDate,
    ];

    /// Stable string id used in configuration and CLI flags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => ENTITY_KIND_TASK,
            Self::DscCertificate => ENTITY_KIND_DSC_CERTIFICATE,
            Self::Document => ENTITY_KIND_DOCUMENT,
            Self::DueDate => ENTITY_KIND_DUE_DATE,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one entity kind from its stable string id.
pub fn parse_entity_kind(value: &str) -> Result<EntityKind, EntityKindError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(EntityKindError::Empty);
    }

    match normalized {
        ENTITY_KIND_TASK => Ok(EntityKind::Task),
        ENTITY_KIND_DSC_CERTIFICATE => Ok(EntityKind::DscCertificate),
        ENTITY_KIND_DOCUMENT => Ok(EntityKind::Document),
        ENTITY_KIND_DUE_DATE => Ok(EntityKind::DueDate),
        other => Err(EntityKindError::Unknown(other.to_string())),
    }
}

/// Entity kind parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKindError {
    Empty,
    Unknown(String),
}

impl Display for EntityKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "entity kind must not be empty"),
            Self::Unknown(value) => write!(
                f,
                "unknown entity kind `{value}`; expected task|dsc_certificate|document|due_date"
            ),
        }
    }
}

impl Error for EntityKindError {}

#[cfg(test)]
mod tests {
    use super::{parse_entity_kind, EntityKind, EntityKindError};

    #[test]
    fn parses_every_kind_from_its_own_id() {
        for kind in EntityKind::ALL {
            assert_eq!(parse_entity_kind(kind.as_str()), Ok(kind));
        }
        assert_eq!(parse_entity_kind("  task "), Ok(EntityKind::Task));
    }

    #[test]
    fn rejects_unknown_and_empty_kinds() {
        assert_eq!(parse_entity_kind(" "), Err(EntityKindError::Empty));
        assert_eq!(
            parse_entity_kind("payroll"),
            Err(EntityKindError::Unknown("payroll".to_string()))
        );
        assert_eq!(
            parse_entity_kind("Task"),
            Err(EntityKindError::Unknown("Task".to_string()))
        );
    }

    #[test]
    fn serde_uses_snake_case_ids() {
        let json = serde_json::to_string(&EntityKind::DscCertificate).expect("serialize kind");
        assert_eq!(json, "\"dsc_certificate\"");
        let decoded: EntityKind = serde_json::from_str("\"due_date\"").expect("deserialize kind");
        assert_eq!(decoded, EntityKind::DueDate);
    }
}
