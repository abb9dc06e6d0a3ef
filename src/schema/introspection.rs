//! The introspection query and the conversion of its result into a [`Schema`].

use apollo_parser::{ast, Parser};
use indexmap::IndexMap;
use serde::Deserialize;

use super::{
    is_introspection_type, DirectiveDef, EnumValueDef, FieldDef, InputValue, Schema, TypeBody,
    TypeDef, TypeRef, Value,
};
use crate::error::ResolutionError;

pub const OPERATION_NAME: &str = "IntrospectionQuery";

/// Which optional parts of the type system the introspection query asks for.
///
/// Everything is off by default: descriptions are left out of remote schemas,
/// and `specifiedByURL` or `__schema { description }` are only requested on
/// demand since older servers reject them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntrospectionOptions {
    /// Type, field, argument, enum value and directive descriptions.
    pub descriptions: bool,
    pub schema_description: bool,
    pub specified_by_url: bool,
    /// Deprecated arguments and input fields, with their deprecation state.
    pub input_value_deprecation: bool,
}

/// Builds the standard introspection query.
pub fn introspection_query(options: &IntrospectionOptions) -> String {
    let when = |on: bool, text: &'static str| if on { text } else { "" };
    let description = when(options.descriptions, "description");
    let schema_description = when(options.schema_description, "description");
    let specified_by_url = when(options.specified_by_url, "specifiedByURL");
    let include_deprecated = when(options.input_value_deprecation, "(includeDeprecated: true)");
    let is_deprecated = when(options.input_value_deprecation, "isDeprecated");
    let deprecation_reason = when(options.input_value_deprecation, "deprecationReason");

    let query = format!(
        r#"query IntrospectionQuery {{
  __schema {{
    {schema_description}
    queryType {{ name }}
    mutationType {{ name }}
    subscriptionType {{ name }}
    types {{
      ...FullType
    }}
    directives {{
      name
      {description}
      isRepeatable
      locations
      args{include_deprecated} {{
        ...InputValue
      }}
    }}
  }}
}}

fragment FullType on __Type {{
  kind
  name
  {description}
  {specified_by_url}
  fields(includeDeprecated: true) {{
    name
    {description}
    args{include_deprecated} {{
      ...InputValue
    }}
    type {{
      ...TypeRef
    }}
    isDeprecated
    deprecationReason
  }}
  inputFields{include_deprecated} {{
    ...InputValue
  }}
  interfaces {{
    ...TypeRef
  }}
  enumValues(includeDeprecated: true) {{
    name
    {description}
    isDeprecated
    deprecationReason
  }}
  possibleTypes {{
    ...TypeRef
  }}
}}

fragment InputValue on __InputValue {{
  name
  {description}
  type {{ ...TypeRef }}
  defaultValue
  {is_deprecated}
  {deprecation_reason}
}}

fragment TypeRef on __Type {{
  kind
  name
  ofType {{
    kind
    name
    ofType {{
      kind
      name
      ofType {{
        kind
        name
        ofType {{
          kind
          name
          ofType {{
            kind
            name
            ofType {{
              kind
              name
              ofType {{
                kind
                name
                ofType {{
                  kind
                  name
                }}
              }}
            }}
          }}
        }}
      }}
    }}
  }}
}}
"#
    );

    let mut out: String = query
        .lines()
        .filter(|line| !line.trim().is_empty() || line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// A GraphQL response carrying an introspection result.
#[derive(Debug, Deserialize)]
pub struct IntrospectionResponse {
    pub data: Option<IntrospectionData>,
    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct IntrospectionData {
    #[serde(rename = "__schema")]
    pub schema: IntrospectionSchema,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    #[serde(default)]
    pub description: Option<String>,
    pub query_type: Option<NamedRef>,
    #[serde(default)]
    pub mutation_type: Option<NamedRef>,
    #[serde(default)]
    pub subscription_type: Option<NamedRef>,
    pub types: Vec<FullType>,
    #[serde(default)]
    pub directives: Vec<IntrospectionDirective>,
}

#[derive(Debug, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntrospectionKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: IntrospectionKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "specifiedByURL", alias = "specifiedByUrl")]
    pub specified_by_url: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<IntrospectionField>>,
    #[serde(default)]
    pub input_fields: Option<Vec<IntrospectionInputValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<IntrospectionTypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<IntrospectionEnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<IntrospectionTypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionField {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub ty: IntrospectionTypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionInputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: IntrospectionTypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionEnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionDirective {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_repeatable: bool,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub args: Vec<IntrospectionInputValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionTypeRef {
    pub kind: IntrospectionKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<IntrospectionTypeRef>>,
}

/// Parses an introspection result given either as a full GraphQL response
/// (`{"data": {"__schema": ...}}`) or as the bare data object.
pub fn parse_introspection_json(location: &str, json: &str) -> Result<Schema, ResolutionError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| invalid(location, e.to_string()))?;

    let data = if value.get("__schema").is_some() {
        serde_json::from_value::<IntrospectionData>(value).map_err(|e| invalid(location, e.to_string()))?
    } else {
        let response = serde_json::from_value::<IntrospectionResponse>(value)
            .map_err(|e| invalid(location, e.to_string()))?;
        match response.data {
            Some(data) => data,
            None => return Err(invalid(location, response_errors(&response.errors))),
        }
    };

    build_client_schema(location, data.schema)
}

fn response_errors(errors: &[ResponseError]) -> String {
    if errors.is_empty() {
        "response has no data".to_owned()
    } else {
        errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
    }
}

fn invalid(location: &str, message: String) -> ResolutionError {
    ResolutionError::InvalidIntrospection {
        location: location.to_owned(),
        message,
    }
}

/// Converts an introspection result into a [`Schema`], skipping the
/// introspection types themselves.
pub fn build_client_schema(location: &str, raw: IntrospectionSchema) -> Result<Schema, ResolutionError> {
    let mut schema = Schema {
        description: raw.description,
        query_type: raw.query_type.map(|r| r.name),
        mutation_type: raw.mutation_type.map(|r| r.name),
        subscription_type: raw.subscription_type.map(|r| r.name),
        ..Schema::default()
    };

    for full in raw.types {
        if is_introspection_type(&full.name) {
            continue;
        }
        let ty = convert_type(location, full)?;
        schema.types.insert(ty.name.clone(), ty);
    }

    for directive in raw.directives {
        let def = DirectiveDef {
            name: directive.name,
            description: directive.description,
            args: input_values(location, directive.args)?,
            repeatable: directive.is_repeatable,
            locations: directive.locations,
        };
        schema.directive_defs.insert(def.name.clone(), def);
    }

    schema.add_specified_directives();
    schema.settle_standard_scalars();

    if let Some(missing) = schema
        .referenced_type_names()
        .into_iter()
        .find(|name| !schema.types.contains_key(name))
    {
        return Err(invalid(location, format!("missing type definition for {missing}")));
    }
    Ok(schema)
}

fn convert_type(location: &str, full: FullType) -> Result<TypeDef, ResolutionError> {
    let body = match full.kind {
        IntrospectionKind::Scalar => TypeBody::Scalar,
        IntrospectionKind::Object => TypeBody::Object {
            interfaces: named_refs(location, full.interfaces)?,
            fields: fields(location, full.fields)?,
        },
        IntrospectionKind::Interface => TypeBody::Interface {
            interfaces: named_refs(location, full.interfaces)?,
            fields: fields(location, full.fields)?,
        },
        IntrospectionKind::Union => TypeBody::Union {
            members: named_refs(location, full.possible_types)?,
        },
        IntrospectionKind::Enum => TypeBody::Enum {
            values: full
                .enum_values
                .unwrap_or_default()
                .into_iter()
                .map(|value| {
                    let def = EnumValueDef {
                        name: value.name,
                        description: value.description,
                        deprecation: deprecation(value.is_deprecated, value.deprecation_reason),
                        directives: Vec::new(),
                    };
                    (def.name.clone(), def)
                })
                .collect(),
        },
        IntrospectionKind::InputObject => TypeBody::InputObject {
            fields: input_values(location, full.input_fields.unwrap_or_default())?,
        },
        IntrospectionKind::List | IntrospectionKind::NonNull => {
            return Err(invalid(location, format!("{} is a wrapping type", full.name)));
        }
    };

    Ok(TypeDef {
        name: full.name,
        description: full.description,
        directives: Vec::new(),
        specified_by_url: full.specified_by_url,
        body,
    })
}

fn fields(location: &str, raw: Option<Vec<IntrospectionField>>) -> Result<IndexMap<String, FieldDef>, ResolutionError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|field| {
            let def = FieldDef {
                name: field.name,
                description: field.description,
                ty: type_ref(location, field.ty)?,
                args: input_values(location, field.args)?,
                deprecation: deprecation(field.is_deprecated, field.deprecation_reason),
                directives: Vec::new(),
            };
            Ok((def.name.clone(), def))
        })
        .collect()
}

fn input_values(
    location: &str,
    raw: Vec<IntrospectionInputValue>,
) -> Result<IndexMap<String, InputValue>, ResolutionError> {
    raw.into_iter()
        .map(|value| {
            let default_value = value
                .default_value
                .as_deref()
                .map(|raw| parse_default_value(location, raw))
                .transpose()?;
            let def = InputValue {
                name: value.name,
                description: value.description,
                ty: type_ref(location, value.ty)?,
                default_value,
                deprecation: deprecation(value.is_deprecated, value.deprecation_reason),
                directives: Vec::new(),
            };
            Ok((def.name.clone(), def))
        })
        .collect()
}

fn named_refs(location: &str, raw: Option<Vec<IntrospectionTypeRef>>) -> Result<Vec<String>, ResolutionError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|r| {
            r.name
                .ok_or_else(|| invalid(location, "named type reference without a name".to_owned()))
        })
        .collect()
}

fn type_ref(location: &str, raw: IntrospectionTypeRef) -> Result<TypeRef, ResolutionError> {
    match raw.kind {
        IntrospectionKind::List | IntrospectionKind::NonNull => {
            let inner = raw
                .of_type
                .ok_or_else(|| invalid(location, "wrapping type without ofType".to_owned()))?;
            let inner = type_ref(location, *inner)?;
            Ok(match raw.kind {
                IntrospectionKind::List => TypeRef::list(inner),
                _ => TypeRef::non_null(inner),
            })
        }
        _ => raw
            .name
            .map(TypeRef::Named)
            .ok_or_else(|| invalid(location, "named type reference without a name".to_owned())),
    }
}

fn deprecation(is_deprecated: bool, reason: Option<String>) -> Option<String> {
    is_deprecated.then(|| reason.unwrap_or_else(|| super::DEFAULT_DEPRECATION_REASON.to_owned()))
}

/// Default values arrive printed as GraphQL literals; parse them back by
/// wrapping them in a directive usage.
fn parse_default_value(location: &str, raw: &str) -> Result<Value, ResolutionError> {
    let document = format!("scalar DefaultValue @value(of: {raw})");
    let tree = Parser::new(&document).parse();
    let bad_literal = || invalid(location, format!("invalid default value literal {raw}"));
    if tree.errors().next().is_some() {
        return Err(bad_literal());
    }

    tree.document()
        .definitions()
        .find_map(|definition| match definition {
            ast::Definition::ScalarTypeDefinition(def) => super::sdl::directive_usages(def.directives())
                .into_iter()
                .next()
                .and_then(|usage| usage.arguments.into_iter().next())
                .map(|(_, value)| value),
            _ => None,
        })
        .ok_or_else(bad_literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
      "data": {
        "__schema": {
          "queryType": { "name": "Query" },
          "mutationType": null,
          "subscriptionType": null,
          "types": [
            {
              "kind": "OBJECT",
              "name": "Query",
              "description": null,
              "fields": [
                {
                  "name": "items",
                  "description": null,
                  "args": [
                    {
                      "name": "first",
                      "description": null,
                      "type": { "kind": "SCALAR", "name": "Int", "ofType": null },
                      "defaultValue": "10"
                    },
                    {
                      "name": "filter",
                      "description": null,
                      "type": { "kind": "INPUT_OBJECT", "name": "Filter", "ofType": null },
                      "defaultValue": "{tags: [\"a\"], color: RED}"
                    }
                  ],
                  "type": {
                    "kind": "NON_NULL",
                    "name": null,
                    "ofType": {
                      "kind": "LIST",
                      "name": null,
                      "ofType": { "kind": "SCALAR", "name": "String", "ofType": null }
                    }
                  },
                  "isDeprecated": true,
                  "deprecationReason": "use search"
                }
              ],
              "inputFields": null,
              "interfaces": [],
              "enumValues": null,
              "possibleTypes": null
            },
            {
              "kind": "INPUT_OBJECT",
              "name": "Filter",
              "inputFields": [
                {
                  "name": "tags",
                  "type": { "kind": "LIST", "name": null, "ofType": { "kind": "SCALAR", "name": "String", "ofType": null } },
                  "defaultValue": null
                },
                {
                  "name": "color",
                  "type": { "kind": "ENUM", "name": "Color", "ofType": null },
                  "defaultValue": null
                }
              ]
            },
            {
              "kind": "ENUM",
              "name": "Color",
              "enumValues": [
                { "name": "RED", "isDeprecated": false, "deprecationReason": null }
              ]
            },
            { "kind": "SCALAR", "name": "Int" },
            { "kind": "SCALAR", "name": "String" },
            { "kind": "SCALAR", "name": "Boolean" },
            { "kind": "OBJECT", "name": "__Schema", "fields": [] }
          ],
          "directives": []
        }
      }
    }"#;

    #[test]
    fn test_build_client_schema() {
        let schema = parse_introspection_json("remote", RESPONSE).unwrap();
        assert_eq!(schema.query_type.as_deref(), Some("Query"));
        assert!(!schema.types.contains_key("__Schema"));

        let items = &schema.get_type("Query").unwrap().fields().unwrap()["items"];
        assert_eq!(items.ty.to_string(), "[String]!");
        assert_eq!(items.deprecation.as_deref(), Some("use search"));
        assert_eq!(items.args["first"].default_value, Some(Value::Int("10".into())));
        assert_eq!(
            items.args["filter"].default_value.as_ref().unwrap().to_string(),
            r#"{tags: ["a"], color: RED}"#
        );
        assert!(schema.directive_defs.contains_key("deprecated"));
    }

    #[test]
    fn test_bare_schema_object() {
        let value: serde_json::Value = serde_json::from_str(RESPONSE).unwrap();
        let bare = value["data"].to_string();
        let schema = parse_introspection_json("file.json", &bare).unwrap();
        assert!(schema.types.contains_key("Filter"));
    }

    #[test]
    fn test_invalid_payload() {
        let err = parse_introspection_json("remote", r#"{"invalid": "response"}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidIntrospection { .. }));
    }

    #[test]
    fn test_query_input_value_deprecation() {
        assert!(!introspection_query(&IntrospectionOptions::default()).contains("includeDeprecated: true) {\n    ...InputValue"));
        let query = introspection_query(&IntrospectionOptions {
            input_value_deprecation: true,
            ..Default::default()
        });
        assert!(query.contains("args(includeDeprecated: true)"));
        assert!(query.contains("inputFields(includeDeprecated: true)"));
    }

    #[test]
    fn test_default_query_leaves_out_optional_parts() {
        let query = introspection_query(&IntrospectionOptions::default());
        assert!(!query.contains("description"));
        assert!(!query.contains("specifiedByURL"));
        assert!(!query.contains("isDeprecated\n  deprecationReason\n}"));
        assert!(query.contains("isRepeatable"));
        assert!(query.starts_with("query IntrospectionQuery {\n  __schema {\n    queryType { name }\n"));

        let query = introspection_query(&IntrospectionOptions {
            descriptions: true,
            schema_description: true,
            specified_by_url: true,
            ..Default::default()
        });
        assert!(query.contains("  __schema {\n    description\n    queryType"));
        assert!(query.contains("  specifiedByURL\n"));
    }
}
