//! Structural comparison of two schemas into dangerous and breaking changes.
//!
//! Traversal order is fixed: types in old-schema order (per type: fields with
//! their arguments, then enum values or union members, then implemented
//! interfaces), followed by directive definitions in old-schema order.

use indexmap::IndexMap;

use crate::changes::{ChangeKind, ChangeRecord, Severity};
use crate::schema::{is_standard_scalar, FieldDef, InputValue, Schema, TypeBody, TypeDef, TypeRef, Value};

/// Compares `old` against `new`, returning `(dangerous, breaking)` changes.
pub fn classify(old: &Schema, new: &Schema) -> (Vec<ChangeRecord>, Vec<ChangeRecord>) {
    find_schema_changes(old, new)
        .into_iter()
        .partition(|change| change.severity == Severity::Dangerous)
}

pub fn find_breaking_changes(old: &Schema, new: &Schema) -> Vec<ChangeRecord> {
    classify(old, new).1
}

pub fn find_dangerous_changes(old: &Schema, new: &Schema) -> Vec<ChangeRecord> {
    classify(old, new).0
}

/// Every change of either severity, in traversal order.
pub fn find_schema_changes(old: &Schema, new: &Schema) -> Vec<ChangeRecord> {
    let mut changes = Changes::default();
    for old_type in old.types.values() {
        match new.get_type(&old_type.name) {
            None => changes.type_removed(old_type),
            Some(new_type) if new_type.kind() != old_type.kind() => changes.push(
                ChangeKind::TypeKindChanged,
                format!(
                    "{} changed from {} to {}.",
                    old_type.name,
                    old_type.kind().article_name(),
                    new_type.kind().article_name()
                ),
            ),
            Some(new_type) => changes.type_members(old, new, old_type, new_type),
        }
    }
    changes.directives(old, new);
    changes.0
}

#[derive(Default)]
struct Changes(Vec<ChangeRecord>);

impl Changes {
    fn push(&mut self, kind: ChangeKind, description: String) {
        self.0.push(ChangeRecord::new(kind, description));
    }

    fn type_removed(&mut self, ty: &TypeDef) {
        let description = if is_standard_scalar(&ty.name) {
            format!("Standard scalar {} was removed because it is not referenced anymore.", ty.name)
        } else {
            format!("{} was removed.", ty.name)
        };
        self.push(ChangeKind::TypeRemoved, description);
    }

    fn type_members(&mut self, old_schema: &Schema, new_schema: &Schema, old: &TypeDef, new: &TypeDef) {
        match (&old.body, &new.body) {
            (
                TypeBody::Object {
                    interfaces: old_interfaces,
                    fields: old_fields,
                }
                | TypeBody::Interface {
                    interfaces: old_interfaces,
                    fields: old_fields,
                },
                TypeBody::Object {
                    interfaces: new_interfaces,
                    fields: new_fields,
                }
                | TypeBody::Interface {
                    interfaces: new_interfaces,
                    fields: new_fields,
                },
            ) => {
                self.output_fields(&old.name, old_fields, new_fields);
                self.interfaces(&old.name, old_interfaces, new_interfaces);
                self.interface_fields(old_schema, new_schema, old, new);
            }
            (TypeBody::InputObject { fields: old_fields }, TypeBody::InputObject { fields: new_fields }) => {
                self.input_fields(&old.name, old_fields, new_fields);
            }
            (TypeBody::Enum { values: old_values }, TypeBody::Enum { values: new_values }) => {
                for name in old_values.keys().filter(|v| !new_values.contains_key(*v)) {
                    self.push(
                        ChangeKind::ValueRemovedFromEnum,
                        format!("{name} was removed from enum type {}.", old.name),
                    );
                }
                for name in new_values.keys().filter(|v| !old_values.contains_key(*v)) {
                    self.push(
                        ChangeKind::ValueAddedToEnum,
                        format!("{name} was added to enum type {}.", old.name),
                    );
                }
            }
            (TypeBody::Union { members: old_members }, TypeBody::Union { members: new_members }) => {
                for member in old_members.iter().filter(|m| !new_members.contains(*m)) {
                    self.push(
                        ChangeKind::TypeRemovedFromUnion,
                        format!("{member} was removed from union type {}.", old.name),
                    );
                }
                for member in new_members.iter().filter(|m| !old_members.contains(*m)) {
                    self.push(
                        ChangeKind::TypeAddedToUnion,
                        format!("{member} was added to union type {}.", old.name),
                    );
                }
            }
            _ => {}
        }
    }

    fn output_fields(&mut self, type_name: &str, old: &IndexMap<String, FieldDef>, new: &IndexMap<String, FieldDef>) {
        for old_field in old.values() {
            let Some(new_field) = new.get(&old_field.name) else {
                self.push(
                    ChangeKind::FieldRemoved,
                    format!("{type_name}.{} was removed.", old_field.name),
                );
                continue;
            };

            if !is_safe_output_change(&old_field.ty, &new_field.ty) {
                self.push(
                    ChangeKind::FieldChangedKind,
                    format!(
                        "{type_name}.{} changed type from {} to {}.",
                        old_field.name, old_field.ty, new_field.ty
                    ),
                );
            }
            if !old_field.is_deprecated() && new_field.is_deprecated() {
                self.push(
                    ChangeKind::FieldDeprecationAdded,
                    format!("{type_name}.{} was deprecated.", old_field.name),
                );
            }
            self.field_args(type_name, &old_field.name, &old_field.args, &new_field.args);
        }
    }

    fn field_args(
        &mut self,
        type_name: &str,
        field_name: &str,
        old: &IndexMap<String, InputValue>,
        new: &IndexMap<String, InputValue>,
    ) {
        for old_arg in old.values() {
            let Some(new_arg) = new.get(&old_arg.name) else {
                self.push(
                    ChangeKind::ArgRemoved,
                    format!("{type_name}.{field_name} arg {} was removed.", old_arg.name),
                );
                continue;
            };

            if !is_safe_input_change(&old_arg.ty, &new_arg.ty) {
                self.push(
                    ChangeKind::ArgChangedKind,
                    format!(
                        "{type_name}.{field_name} arg {} has changed type from {} to {}.",
                        old_arg.name, old_arg.ty, new_arg.ty
                    ),
                );
            } else if let Some(old_default) = &old_arg.default_value {
                match &new_arg.default_value {
                    None => self.push(
                        ChangeKind::ArgDefaultValueChanged,
                        format!("{type_name}.{field_name} arg {} defaultValue was removed.", old_arg.name),
                    ),
                    Some(new_default) => {
                        let (old_default, new_default) = (canonical_value(old_default), canonical_value(new_default));
                        if old_default != new_default {
                            self.push(
                                ChangeKind::ArgDefaultValueChanged,
                                format!(
                                    "{type_name}.{field_name} arg {} has changed defaultValue from {old_default} to {new_default}.",
                                    old_arg.name
                                ),
                            );
                        }
                    }
                }
            }
        }

        for new_arg in new.values().filter(|a| !old.contains_key(&a.name)) {
            if new_arg.is_required() {
                self.push(
                    ChangeKind::RequiredArgAdded,
                    format!("A required arg {} on {type_name}.{field_name} was added.", new_arg.name),
                );
            } else {
                self.push(
                    ChangeKind::OptionalArgAdded,
                    format!("An optional arg {} on {type_name}.{field_name} was added.", new_arg.name),
                );
            }
        }
    }

    fn input_fields(&mut self, type_name: &str, old: &IndexMap<String, InputValue>, new: &IndexMap<String, InputValue>) {
        for old_field in old.values() {
            match new.get(&old_field.name) {
                None => self.push(
                    ChangeKind::FieldRemoved,
                    format!("{type_name}.{} was removed.", old_field.name),
                ),
                Some(new_field) if !is_safe_input_change(&old_field.ty, &new_field.ty) => self.push(
                    ChangeKind::FieldChangedKind,
                    format!(
                        "{type_name}.{} changed type from {} to {}.",
                        old_field.name, old_field.ty, new_field.ty
                    ),
                ),
                Some(_) => {}
            }
        }

        for new_field in new.values().filter(|f| !old.contains_key(&f.name)) {
            if new_field.is_required() {
                self.push(
                    ChangeKind::RequiredInputFieldAdded,
                    format!("A required field {} on input type {type_name} was added.", new_field.name),
                );
            } else {
                self.push(
                    ChangeKind::OptionalInputFieldAdded,
                    format!("An optional field {} on input type {type_name} was added.", new_field.name),
                );
            }
        }
    }

    fn interfaces(&mut self, type_name: &str, old: &[String], new: &[String]) {
        for interface in old.iter().filter(|i| !new.contains(*i)) {
            self.push(
                ChangeKind::ImplementedInterfaceRemoved,
                format!("{type_name} no longer implements interface {interface}."),
            );
        }
        for interface in new.iter().filter(|i| !old.contains(*i)) {
            self.push(
                ChangeKind::InterfaceAddedToObject,
                format!("{interface} added to interfaces implemented by {type_name}."),
            );
        }
    }

    /// Fields an interface requires but the implementer lacks, unless the
    /// old schema already had the same gap.
    fn interface_fields(&mut self, old_schema: &Schema, new_schema: &Schema, old: &TypeDef, new: &TypeDef) {
        let empty = IndexMap::new();
        let new_fields = new.fields().unwrap_or(&empty);
        let old_fields = old.fields().unwrap_or(&empty);

        for interface in new.interfaces() {
            let Some(required) = new_schema.get_type(interface).and_then(TypeDef::fields) else {
                continue;
            };
            let old_required = old
                .interfaces()
                .contains(interface)
                .then(|| old_schema.get_type(interface).and_then(TypeDef::fields))
                .flatten();

            for field in required.keys().filter(|f| !new_fields.contains_key(*f)) {
                let gap_existed = old_required.is_some_and(|r| r.contains_key(field)) && !old_fields.contains_key(field);
                if gap_existed {
                    continue;
                }
                self.push(
                    ChangeKind::InterfaceFieldMissing,
                    format!("{} is missing field {field} required by interface {interface}.", new.name),
                );
            }
        }
    }

    fn directives(&mut self, old: &Schema, new: &Schema) {
        for old_directive in old.directive_defs.values() {
            let Some(new_directive) = new.directive_defs.get(&old_directive.name) else {
                self.push(ChangeKind::DirectiveRemoved, format!("{} was removed.", old_directive.name));
                continue;
            };

            for arg in old_directive.args.keys().filter(|a| !new_directive.args.contains_key(*a)) {
                self.push(
                    ChangeKind::DirectiveArgRemoved,
                    format!("{arg} was removed from {}.", old_directive.name),
                );
            }
            for arg in new_directive
                .args
                .values()
                .filter(|a| !old_directive.args.contains_key(&a.name) && a.is_required())
            {
                self.push(
                    ChangeKind::RequiredDirectiveArgAdded,
                    format!("A required arg {} on directive {} was added.", arg.name, old_directive.name),
                );
            }
            if old_directive.repeatable && !new_directive.repeatable {
                self.push(
                    ChangeKind::DirectiveRepeatableRemoved,
                    format!("Repeatable flag was removed from {}.", old_directive.name),
                );
            }
            for location in old_directive
                .locations
                .iter()
                .filter(|l| !new_directive.locations.contains(*l))
            {
                self.push(
                    ChangeKind::DirectiveLocationRemoved,
                    format!("{location} was removed from {}.", old_directive.name),
                );
            }
        }
    }
}

/// Output positions may tighten nullability; anything else must keep the
/// same wrapper chain around the same named type.
pub fn is_safe_output_change(old: &TypeRef, new: &TypeRef) -> bool {
    match (old, new) {
        (TypeRef::Named(old_name), TypeRef::Named(new_name)) => old_name == new_name,
        (TypeRef::List(old_inner), TypeRef::List(new_inner)) => is_safe_output_change(old_inner, new_inner),
        (TypeRef::NonNull(old_inner), TypeRef::NonNull(new_inner)) => is_safe_output_change(old_inner, new_inner),
        (TypeRef::Named(_) | TypeRef::List(_), TypeRef::NonNull(new_inner)) => is_safe_output_change(old, new_inner),
        _ => false,
    }
}

/// Input positions (arguments, input fields) may loosen nullability only.
pub fn is_safe_input_change(old: &TypeRef, new: &TypeRef) -> bool {
    match (old, new) {
        (TypeRef::Named(old_name), TypeRef::Named(new_name)) => old_name == new_name,
        (TypeRef::List(old_inner), TypeRef::List(new_inner)) => is_safe_input_change(old_inner, new_inner),
        (TypeRef::NonNull(old_inner), TypeRef::NonNull(new_inner)) => is_safe_input_change(old_inner, new_inner),
        (TypeRef::NonNull(old_inner), _) => is_safe_input_change(old_inner, new),
        _ => false,
    }
}

/// Object fields sorted by name so default values compare independently of
/// how they were written.
fn canonical_value(value: &Value) -> String {
    fn sorted(value: &Value) -> Value {
        match value {
            Value::List(items) => Value::List(items.iter().map(sorted).collect()),
            Value::Object(fields) => {
                let mut fields: Vec<(String, Value)> =
                    fields.iter().map(|(name, v)| (name.clone(), sorted(v))).collect();
                fields.sort_by(|a, b| a.0.cmp(&b.0));
                Value::Object(fields)
            }
            other => other.clone(),
        }
    }
    sorted(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sdl::parse_schema;

    fn changes(old: &str, new: &str) -> (Vec<ChangeRecord>, Vec<ChangeRecord>) {
        classify(&parse_schema("old", old).unwrap(), &parse_schema("new", new).unwrap())
    }

    fn kinds(records: &[ChangeRecord]) -> Vec<ChangeKind> {
        records.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_identical_schemas() {
        let sdl = "type Query { a(x: Int = 1): String } enum E { A } union U = Query";
        let (dangerous, breaking) = changes(sdl, sdl);
        assert!(dangerous.is_empty());
        assert!(breaking.is_empty());
    }

    #[test]
    fn test_enum_value_added() {
        let (dangerous, breaking) = changes(
            "type Query { test: TestEnum } enum TestEnum { FIRST_VALUE }",
            "type Query { test: TestEnum } enum TestEnum { FIRST_VALUE SECOND_VALUE }",
        );
        assert!(breaking.is_empty());
        assert_eq!(dangerous.len(), 1);
        assert_eq!(dangerous[0].kind, ChangeKind::ValueAddedToEnum);
        assert_eq!(dangerous[0].severity, Severity::Dangerous);
        assert_eq!(dangerous[0].description, "SECOND_VALUE was added to enum type TestEnum.");
    }

    #[test]
    fn test_field_changed_kind() {
        let (dangerous, breaking) = changes("type Query { test: String }", "type Query { test: Int }");
        assert!(dangerous.is_empty());
        assert_eq!(breaking.len(), 1);
        assert_eq!(breaking[0].kind, ChangeKind::FieldChangedKind);
        assert_eq!(breaking[0].description, "Query.test changed type from String to Int.");
    }

    #[test]
    fn test_output_nullability() {
        let (_, breaking) = changes("type Query { a: String b: [Int] }", "type Query { a: String! b: [Int!]! }");
        assert!(breaking.is_empty());

        let (_, breaking) = changes("type Query { a: String! }", "type Query { a: String }");
        assert_eq!(kinds(&breaking), vec![ChangeKind::FieldChangedKind]);

        let (_, breaking) = changes("type Query { a: [String] }", "type Query { a: String }");
        assert_eq!(kinds(&breaking), vec![ChangeKind::FieldChangedKind]);
    }

    #[test]
    fn test_type_removed_and_kind_changed() {
        let (_, breaking) = changes(
            "type Query { a: Int } type Gone { x: Int } type Shape { x: Int }",
            "type Query { a: Int } interface Shape { x: Int }",
        );
        assert_eq!(kinds(&breaking), vec![ChangeKind::TypeRemoved, ChangeKind::TypeKindChanged]);
        assert_eq!(breaking[0].description, "Gone was removed.");
        assert_eq!(breaking[1].description, "Shape changed from an Object type to an Interface type.");
    }

    #[test]
    fn test_added_type_is_not_reported() {
        let (dangerous, breaking) = changes("type Query { a: Int }", "type Query { a: Int } type Extra { b: Int }");
        assert!(dangerous.is_empty());
        assert!(breaking.is_empty());
    }

    #[test]
    fn test_standard_scalar_no_longer_referenced() {
        let (_, breaking) = changes("type Query { a: Int b: Float }", "type Query { a: Int }");
        assert_eq!(kinds(&breaking), vec![ChangeKind::FieldRemoved, ChangeKind::TypeRemoved]);
        assert_eq!(
            breaking[1].description,
            "Standard scalar Float was removed because it is not referenced anymore."
        );
    }

    #[test]
    fn test_declared_standard_scalar_removed() {
        let (_, breaking) = changes("scalar ID type Query { a: Int }", "type Query { a: Int }");
        assert_eq!(kinds(&breaking), vec![ChangeKind::TypeRemoved]);
        assert_eq!(
            breaking[0].description,
            "Standard scalar ID was removed because it is not referenced anymore."
        );

        let (dangerous, breaking) = changes("scalar ID type Query { a: Int }", "scalar ID type Query { a: Int }");
        assert!(dangerous.is_empty());
        assert!(breaking.is_empty());
    }

    #[test]
    fn test_argument_changes() {
        let (dangerous, breaking) = changes(
            "type Query { f(a: Int, b: String = \"x\", c: ID!, gone: Int): Int }",
            "type Query { f(a: Int!, b: String = \"y\", c: ID, req: Int!, opt: Int): Int }",
        );
        assert_eq!(
            kinds(&breaking),
            vec![ChangeKind::ArgChangedKind, ChangeKind::ArgRemoved, ChangeKind::RequiredArgAdded]
        );
        assert_eq!(breaking[0].description, "Query.f arg a has changed type from Int to Int!.");
        assert_eq!(breaking[2].description, "A required arg req on Query.f was added.");
        assert_eq!(
            kinds(&dangerous),
            vec![ChangeKind::ArgDefaultValueChanged, ChangeKind::OptionalArgAdded]
        );
        assert_eq!(
            dangerous[0].description,
            "Query.f arg b has changed defaultValue from \"x\" to \"y\"."
        );
    }

    #[test]
    fn test_default_value_object_order_ignored() {
        let (dangerous, _) = changes(
            "type Query { f(i: In = {a: 1, b: 2}): Int } input In { a: Int b: Int }",
            "type Query { f(i: In = {b: 2, a: 1}): Int } input In { a: Int b: Int }",
        );
        assert!(dangerous.is_empty());
    }

    #[test]
    fn test_default_value_removed() {
        let (dangerous, _) = changes("type Query { f(a: Int = 1): Int }", "type Query { f(a: Int): Int }");
        assert_eq!(dangerous[0].description, "Query.f arg a defaultValue was removed.");
    }

    #[test]
    fn test_field_deprecation_added() {
        let (dangerous, breaking) = changes(
            "type Query { a: Int }",
            "type Query { a: Int @deprecated(reason: \"use b\") }",
        );
        assert!(breaking.is_empty());
        assert_eq!(kinds(&dangerous), vec![ChangeKind::FieldDeprecationAdded]);

        let (dangerous, breaking) = changes("type Query { a: Int @deprecated }", "type Query { a: Int }");
        assert!(dangerous.is_empty());
        assert!(breaking.is_empty());
    }

    #[test]
    fn test_union_changes() {
        let (dangerous, breaking) = changes(
            "type Query { u: U } union U = A | B type A { x: Int } type B { x: Int } type C { x: Int }",
            "type Query { u: U } union U = A | C type A { x: Int } type B { x: Int } type C { x: Int }",
        );
        assert_eq!(breaking[0].description, "B was removed from union type U.");
        assert_eq!(dangerous[0].description, "C was added to union type U.");
    }

    #[test]
    fn test_input_object_changes() {
        let (dangerous, breaking) = changes(
            "type Query { f(i: In): Int } input In { a: Int b: Int! }",
            "type Query { f(i: In): Int } input In { a: Int! b: Int c: Int! d: Int e: Int! = 1 }",
        );
        assert_eq!(kinds(&breaking), vec![ChangeKind::FieldChangedKind, ChangeKind::RequiredInputFieldAdded]);
        assert_eq!(breaking[1].description, "A required field c on input type In was added.");
        assert_eq!(
            kinds(&dangerous),
            vec![ChangeKind::OptionalInputFieldAdded, ChangeKind::OptionalInputFieldAdded]
        );
    }

    #[test]
    fn test_interface_changes() {
        let (dangerous, breaking) = changes(
            "type Query { a: A } interface Node { id: ID } interface Named { name: String } type A implements Node { id: ID }",
            "type Query { a: A } interface Node { id: ID } interface Named { name: String } type A implements Named { id: ID }",
        );
        assert_eq!(
            kinds(&breaking),
            vec![ChangeKind::ImplementedInterfaceRemoved, ChangeKind::InterfaceFieldMissing]
        );
        assert_eq!(breaking[0].description, "A no longer implements interface Node.");
        assert_eq!(breaking[1].description, "A is missing field name required by interface Named.");
        assert_eq!(dangerous[0].description, "Named added to interfaces implemented by A.");
    }

    #[test]
    fn test_interface_gap_already_present() {
        let sdl = "type Query { a: A } interface Node { id: ID } type A implements Node { x: Int }";
        let (_, breaking) = changes(sdl, sdl);
        assert!(breaking.is_empty());
    }

    #[test]
    fn test_directive_changes() {
        let (_, breaking) = changes(
            "type Query { a: Int } directive @a(x: Int) repeatable on FIELD | OBJECT directive @gone on FIELD",
            "type Query { a: Int } directive @a(y: Int!) on FIELD",
        );
        assert_eq!(
            kinds(&breaking),
            vec![
                ChangeKind::DirectiveArgRemoved,
                ChangeKind::RequiredDirectiveArgAdded,
                ChangeKind::DirectiveRepeatableRemoved,
                ChangeKind::DirectiveLocationRemoved,
                ChangeKind::DirectiveRemoved,
            ]
        );
        assert_eq!(breaking[4].description, "gone was removed.");
    }

    #[test]
    fn test_input_nullability() {
        assert!(is_safe_input_change(
            &TypeRef::non_null(TypeRef::named("Int")),
            &TypeRef::named("Int")
        ));
        assert!(!is_safe_input_change(
            &TypeRef::named("Int"),
            &TypeRef::non_null(TypeRef::named("Int"))
        ));
        assert!(!is_safe_input_change(
            &TypeRef::list(TypeRef::named("Int")),
            &TypeRef::named("Int")
        ));
    }
}
