//! The fixed set of schema change kinds and their severities.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Dangerous,
    Breaking,
}

/// Every kind of change the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    // =========================================================================
    // Breaking
    // =========================================================================
    TypeRemoved,
    TypeKindChanged,
    TypeRemovedFromUnion,
    ValueRemovedFromEnum,
    RequiredInputFieldAdded,
    ImplementedInterfaceRemoved,
    InterfaceFieldMissing,
    FieldRemoved,
    FieldChangedKind,
    RequiredArgAdded,
    ArgRemoved,
    ArgChangedKind,
    DirectiveRemoved,
    DirectiveArgRemoved,
    RequiredDirectiveArgAdded,
    DirectiveRepeatableRemoved,
    DirectiveLocationRemoved,

    // =========================================================================
    // Dangerous
    // =========================================================================
    ValueAddedToEnum,
    InterfaceAddedToObject,
    TypeAddedToUnion,
    OptionalInputFieldAdded,
    OptionalArgAdded,
    ArgDefaultValueChanged,
    FieldDeprecationAdded,
}

impl ChangeKind {
    pub fn severity(self) -> Severity {
        match self {
            ChangeKind::TypeRemoved
            | ChangeKind::TypeKindChanged
            | ChangeKind::TypeRemovedFromUnion
            | ChangeKind::ValueRemovedFromEnum
            | ChangeKind::RequiredInputFieldAdded
            | ChangeKind::ImplementedInterfaceRemoved
            | ChangeKind::InterfaceFieldMissing
            | ChangeKind::FieldRemoved
            | ChangeKind::FieldChangedKind
            | ChangeKind::RequiredArgAdded
            | ChangeKind::ArgRemoved
            | ChangeKind::ArgChangedKind
            | ChangeKind::DirectiveRemoved
            | ChangeKind::DirectiveArgRemoved
            | ChangeKind::RequiredDirectiveArgAdded
            | ChangeKind::DirectiveRepeatableRemoved
            | ChangeKind::DirectiveLocationRemoved => Severity::Breaking,
            ChangeKind::ValueAddedToEnum
            | ChangeKind::InterfaceAddedToObject
            | ChangeKind::TypeAddedToUnion
            | ChangeKind::OptionalInputFieldAdded
            | ChangeKind::OptionalArgAdded
            | ChangeKind::ArgDefaultValueChanged
            | ChangeKind::FieldDeprecationAdded => Severity::Dangerous,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::TypeRemoved => "TYPE_REMOVED",
            ChangeKind::TypeKindChanged => "TYPE_KIND_CHANGED",
            ChangeKind::TypeRemovedFromUnion => "TYPE_REMOVED_FROM_UNION",
            ChangeKind::ValueRemovedFromEnum => "VALUE_REMOVED_FROM_ENUM",
            ChangeKind::RequiredInputFieldAdded => "REQUIRED_INPUT_FIELD_ADDED",
            ChangeKind::ImplementedInterfaceRemoved => "IMPLEMENTED_INTERFACE_REMOVED",
            ChangeKind::InterfaceFieldMissing => "INTERFACE_FIELD_MISSING",
            ChangeKind::FieldRemoved => "FIELD_REMOVED",
            ChangeKind::FieldChangedKind => "FIELD_CHANGED_KIND",
            ChangeKind::RequiredArgAdded => "REQUIRED_ARG_ADDED",
            ChangeKind::ArgRemoved => "ARG_REMOVED",
            ChangeKind::ArgChangedKind => "ARG_CHANGED_KIND",
            ChangeKind::DirectiveRemoved => "DIRECTIVE_REMOVED",
            ChangeKind::DirectiveArgRemoved => "DIRECTIVE_ARG_REMOVED",
            ChangeKind::RequiredDirectiveArgAdded => "REQUIRED_DIRECTIVE_ARG_ADDED",
            ChangeKind::DirectiveRepeatableRemoved => "DIRECTIVE_REPEATABLE_REMOVED",
            ChangeKind::DirectiveLocationRemoved => "DIRECTIVE_LOCATION_REMOVED",
            ChangeKind::ValueAddedToEnum => "VALUE_ADDED_TO_ENUM",
            ChangeKind::InterfaceAddedToObject => "INTERFACE_ADDED_TO_OBJECT",
            ChangeKind::TypeAddedToUnion => "TYPE_ADDED_TO_UNION",
            ChangeKind::OptionalInputFieldAdded => "OPTIONAL_INPUT_FIELD_ADDED",
            ChangeKind::OptionalArgAdded => "OPTIONAL_ARG_ADDED",
            ChangeKind::ArgDefaultValueChanged => "ARG_DEFAULT_VALUE_CHANGED",
            ChangeKind::FieldDeprecationAdded => "FIELD_DEPRECATION_ADDED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected difference between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub description: String,
    pub severity: Severity,
}

impl ChangeRecord {
    pub fn new(kind: ChangeKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            severity: kind.severity(),
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.severity == Severity::Breaking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_kind() {
        assert!(ChangeRecord::new(ChangeKind::FieldRemoved, "Query.a was removed.").is_breaking());
        assert!(!ChangeRecord::new(ChangeKind::ValueAddedToEnum, "B was added to enum type E.").is_breaking());
    }

    #[test]
    fn test_serialized_kind_matches_display() {
        let record = ChangeRecord::new(ChangeKind::ArgDefaultValueChanged, "x");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "ARG_DEFAULT_VALUE_CHANGED");
        assert_eq!(json["kind"], record.kind.to_string());
        assert_eq!(json["severity"], "DANGEROUS");
    }
}
