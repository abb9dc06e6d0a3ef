//! Lexicographic ordering of schema members.

use indexmap::IndexMap;

use crate::schema::{DirectiveUsage, InputValue, Schema, TypeBody, TypeDef};

/// Returns a copy of `schema` with types, directive definitions and every
/// member list inside them sorted by name (ordinal comparison).
///
/// Root operation types keep their roles. Directive usages are sorted with a
/// stable sort, so repeated usages of one directive keep their relative order.
pub fn sort_schema(schema: &Schema) -> Schema {
    let mut sorted = schema.clone();

    sorted.directives.sort_by(|a, b| a.name.cmp(&b.name));
    sorted.types.sort_keys();
    for ty in sorted.types.values_mut() {
        sort_type(ty);
    }

    sorted.directive_defs.sort_keys();
    for directive in sorted.directive_defs.values_mut() {
        sort_input_values(&mut directive.args);
    }

    sorted
}

fn sort_type(ty: &mut TypeDef) {
    sort_usages(&mut ty.directives);
    match &mut ty.body {
        TypeBody::Scalar => {}
        TypeBody::Object { interfaces, fields } | TypeBody::Interface { interfaces, fields } => {
            interfaces.sort();
            fields.sort_keys();
            for field in fields.values_mut() {
                sort_usages(&mut field.directives);
                sort_input_values(&mut field.args);
            }
        }
        TypeBody::Union { members } => members.sort(),
        TypeBody::Enum { values } => {
            values.sort_keys();
            for value in values.values_mut() {
                sort_usages(&mut value.directives);
            }
        }
        TypeBody::InputObject { fields } => sort_input_values(fields),
    }
}

fn sort_input_values(values: &mut IndexMap<String, InputValue>) {
    values.sort_keys();
    for value in values.values_mut() {
        sort_usages(&mut value.directives);
    }
}

fn sort_usages(usages: &mut [DirectiveUsage]) {
    usages.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sdl::parse_schema;

    #[test]
    fn test_sort_members() {
        let schema = parse_schema(
            "inline",
            r#"
            type Query { zeta(b: Int, a: Int): Letter alpha: String }
            enum Letter { C A B }
            union Any = Query | Bag
            type Bag { x: Int }
            "#,
        )
        .unwrap();

        let sorted = sort_schema(&schema);
        let type_names: Vec<_> = sorted.types.keys().cloned().collect();
        let mut expected = type_names.clone();
        expected.sort();
        assert_eq!(type_names, expected);

        let query = sorted.get_type("Query").unwrap().fields().unwrap();
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
        assert_eq!(query["zeta"].args.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        match &sorted.get_type("Letter").unwrap().body {
            TypeBody::Enum { values } => assert_eq!(values.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]),
            other => panic!("unexpected body {other:?}"),
        }
        match &sorted.get_type("Any").unwrap().body {
            TypeBody::Union { members } => assert_eq!(members, &vec!["Bag".to_string(), "Query".to_string()]),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_input_untouched() {
        let schema = parse_schema("inline", "type Query { b: Int a: Int }").unwrap();
        let before = schema.clone();
        let _ = sort_schema(&schema);
        assert_eq!(schema, before);
    }
}
