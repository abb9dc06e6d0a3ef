//! Building a [`Schema`] from SDL documents.
//!
//! Several documents (one per matched file) merge into one type system:
//! repeated definitions of the same type and `extend` blocks contribute their
//! members to the first definition.

use apollo_parser::{ast, ast::AstNode, Parser};
use indexmap::IndexMap;

use super::{
    DirectiveDef, DirectiveUsage, EnumValueDef, FieldDef, InputValue, Schema, TypeBody, TypeDef,
    TypeRef, Value, DEFAULT_DEPRECATION_REASON,
};
use crate::error::ResolutionError;

/// One SDL source and the name it is reported under.
#[derive(Debug, Clone)]
pub struct SdlSource {
    pub location: String,
    pub text: String,
}

impl SdlSource {
    pub fn new(location: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            text: text.into(),
        }
    }
}

/// Parses a single SDL document.
pub fn parse_schema(location: &str, text: &str) -> Result<Schema, ResolutionError> {
    build_schema(&[SdlSource::new(location, text)])
}

/// Parses and merges SDL documents into one schema.
///
/// Fails on syntax errors, on conflicting kinds for one type name, on
/// references to undefined types, and when no document defines anything.
pub fn build_schema(sources: &[SdlSource]) -> Result<Schema, ResolutionError> {
    let mut builder = SchemaBuilder::default();
    for source in sources {
        builder.add_document(source)?;
    }
    builder.finish(sources)
}

#[derive(Default)]
struct SchemaBuilder {
    schema: Schema,
    /// Extensions are applied after every document has been read.
    extensions: Vec<(String, ast::Definition)>,
    definitions: usize,
}

impl SchemaBuilder {
    fn add_document(&mut self, source: &SdlSource) -> Result<(), ResolutionError> {
        let tree = Parser::new(&source.text).parse();
        if let Some(err) = tree.errors().next() {
            return Err(ResolutionError::Syntax {
                location: source.location.clone(),
                message: format!("{} at offset {}", err.message(), err.index()),
            });
        }

        for definition in tree.document().definitions() {
            match &definition {
                ast::Definition::SchemaDefinition(def) => {
                    self.definitions += 1;
                    self.schema.description = description(def.description()).or(self.schema.description.take());
                    self.schema.directives.extend(directive_usages(def.directives()));
                    self.set_root_types(def.root_operation_type_definitions());
                }
                ast::Definition::DirectiveDefinition(def) => {
                    self.definitions += 1;
                    let directive = directive_definition(def);
                    self.schema
                        .directive_defs
                        .entry(directive.name.clone())
                        .or_insert(directive);
                }
                ast::Definition::OperationDefinition(_) | ast::Definition::FragmentDefinition(_) => {
                    tracing::debug!(location = %source.location, "ignoring executable definition");
                }
                ast::Definition::SchemaExtension(_)
                | ast::Definition::ScalarTypeExtension(_)
                | ast::Definition::ObjectTypeExtension(_)
                | ast::Definition::InterfaceTypeExtension(_)
                | ast::Definition::UnionTypeExtension(_)
                | ast::Definition::EnumTypeExtension(_)
                | ast::Definition::InputObjectTypeExtension(_) => {
                    self.definitions += 1;
                    self.extensions.push((source.location.clone(), definition.clone()));
                }
                other => {
                    let Some(ty) = type_definition(other) else {
                        continue;
                    };
                    self.definitions += 1;
                    self.merge_type(&source.location, ty)?;
                }
            }
        }
        Ok(())
    }

    fn set_root_types(&mut self, roots: impl Iterator<Item = ast::RootOperationTypeDefinition>) {
        for root in roots {
            let (Some(op), Some(name)) = (root.operation_type(), root.named_type().and_then(|n| named_type(&n))) else {
                continue;
            };
            match source_text(&op).as_str() {
                "query" => self.schema.query_type = Some(name),
                "mutation" => self.schema.mutation_type = Some(name),
                "subscription" => self.schema.subscription_type = Some(name),
                _ => {}
            }
        }
    }

    fn merge_type(&mut self, location: &str, ty: TypeDef) -> Result<(), ResolutionError> {
        match self.schema.types.get_mut(&ty.name) {
            None => {
                self.schema.types.insert(ty.name.clone(), ty);
                Ok(())
            }
            Some(existing) if existing.kind() == ty.kind() => {
                merge_into(existing, ty);
                Ok(())
            }
            Some(_) => Err(ResolutionError::ConflictingDefinition {
                location: location.to_owned(),
                type_name: ty.name,
            }),
        }
    }

    fn apply_extensions(&mut self) -> Result<(), ResolutionError> {
        for (location, extension) in std::mem::take(&mut self.extensions) {
            if let ast::Definition::SchemaExtension(ext) = &extension {
                self.schema.directives.extend(directive_usages(ext.directives()));
                self.set_root_types(ext.root_operation_type_definitions());
                continue;
            }
            let Some(ty) = type_extension(&extension) else {
                continue;
            };
            if !self.schema.types.contains_key(&ty.name) {
                return Err(ResolutionError::UnknownType {
                    location,
                    type_name: ty.name,
                });
            }
            self.merge_type(&location, ty)?;
        }
        Ok(())
    }

    fn finish(mut self, sources: &[SdlSource]) -> Result<Schema, ResolutionError> {
        let location = sources
            .iter()
            .map(|s| s.location.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if self.definitions == 0 {
            return Err(ResolutionError::NoTypeDefinitions { pointer: location });
        }

        self.apply_extensions()?;

        let mut schema = self.schema;
        schema.add_specified_directives();
        schema.infer_root_types();
        schema.settle_standard_scalars();

        if let Some(missing) = schema
            .referenced_type_names()
            .into_iter()
            .find(|name| !schema.types.contains_key(name))
        {
            return Err(ResolutionError::UnknownType {
                location,
                type_name: missing,
            });
        }
        Ok(schema)
    }
}

/// Appends members of `other` that `existing` does not already have.
fn merge_into(existing: &mut TypeDef, other: TypeDef) {
    if existing.description.is_none() {
        existing.description = other.description;
    }
    if existing.specified_by_url.is_none() {
        existing.specified_by_url = other.specified_by_url;
    }
    existing.directives.extend(other.directives);

    match (&mut existing.body, other.body) {
        (
            TypeBody::Object { interfaces, fields } | TypeBody::Interface { interfaces, fields },
            TypeBody::Object {
                interfaces: more_interfaces,
                fields: more_fields,
            }
            | TypeBody::Interface {
                interfaces: more_interfaces,
                fields: more_fields,
            },
        ) => {
            for interface in more_interfaces {
                if !interfaces.contains(&interface) {
                    interfaces.push(interface);
                }
            }
            for (name, field) in more_fields {
                fields.entry(name).or_insert(field);
            }
        }
        (TypeBody::Union { members }, TypeBody::Union { members: more }) => {
            for member in more {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
        (TypeBody::Enum { values }, TypeBody::Enum { values: more }) => {
            for (name, value) in more {
                values.entry(name).or_insert(value);
            }
        }
        (TypeBody::InputObject { fields }, TypeBody::InputObject { fields: more }) => {
            for (name, field) in more {
                fields.entry(name).or_insert(field);
            }
        }
        _ => {}
    }
}

fn type_definition(definition: &ast::Definition) -> Option<TypeDef> {
    let ty = match definition {
        ast::Definition::ScalarTypeDefinition(def) => {
            let (directives, specified_by_url) = split_specified_by(directive_usages(def.directives()));
            TypeDef {
                name: name(def.name())?,
                description: description(def.description()),
                directives,
                specified_by_url,
                body: TypeBody::Scalar,
            }
        }
        ast::Definition::ObjectTypeDefinition(def) => TypeDef {
            name: name(def.name())?,
            description: description(def.description()),
            directives: directive_usages(def.directives()),
            specified_by_url: None,
            body: TypeBody::Object {
                interfaces: implements(def.implements_interfaces()),
                fields: fields(def.fields_definition()),
            },
        },
        ast::Definition::InterfaceTypeDefinition(def) => TypeDef {
            name: name(def.name())?,
            description: description(def.description()),
            directives: directive_usages(def.directives()),
            specified_by_url: None,
            body: TypeBody::Interface {
                interfaces: implements(def.implements_interfaces()),
                fields: fields(def.fields_definition()),
            },
        },
        ast::Definition::UnionTypeDefinition(def) => TypeDef {
            name: name(def.name())?,
            description: description(def.description()),
            directives: directive_usages(def.directives()),
            specified_by_url: None,
            body: TypeBody::Union {
                members: union_members(def.union_member_types()),
            },
        },
        ast::Definition::EnumTypeDefinition(def) => TypeDef {
            name: name(def.name())?,
            description: description(def.description()),
            directives: directive_usages(def.directives()),
            specified_by_url: None,
            body: TypeBody::Enum {
                values: enum_values(def.enum_values_definition()),
            },
        },
        ast::Definition::InputObjectTypeDefinition(def) => TypeDef {
            name: name(def.name())?,
            description: description(def.description()),
            directives: directive_usages(def.directives()),
            specified_by_url: None,
            body: TypeBody::InputObject {
                fields: input_fields(def.input_fields_definition()),
            },
        },
        _ => return None,
    };
    Some(ty)
}

fn type_extension(definition: &ast::Definition) -> Option<TypeDef> {
    let ty = match definition {
        ast::Definition::ScalarTypeExtension(ext) => {
            let (directives, specified_by_url) = split_specified_by(directive_usages(ext.directives()));
            TypeDef {
                directives,
                specified_by_url,
                ..TypeDef::new(name(ext.name())?, TypeBody::Scalar)
            }
        }
        ast::Definition::ObjectTypeExtension(ext) => TypeDef {
            directives: directive_usages(ext.directives()),
            ..TypeDef::new(
                name(ext.name())?,
                TypeBody::Object {
                    interfaces: implements(ext.implements_interfaces()),
                    fields: fields(ext.fields_definition()),
                },
            )
        },
        ast::Definition::InterfaceTypeExtension(ext) => TypeDef {
            directives: directive_usages(ext.directives()),
            ..TypeDef::new(
                name(ext.name())?,
                TypeBody::Interface {
                    interfaces: implements(ext.implements_interfaces()),
                    fields: fields(ext.fields_definition()),
                },
            )
        },
        ast::Definition::UnionTypeExtension(ext) => TypeDef {
            directives: directive_usages(ext.directives()),
            ..TypeDef::new(
                name(ext.name())?,
                TypeBody::Union {
                    members: union_members(ext.union_member_types()),
                },
            )
        },
        ast::Definition::EnumTypeExtension(ext) => TypeDef {
            directives: directive_usages(ext.directives()),
            ..TypeDef::new(
                name(ext.name())?,
                TypeBody::Enum {
                    values: enum_values(ext.enum_values_definition()),
                },
            )
        },
        ast::Definition::InputObjectTypeExtension(ext) => TypeDef {
            directives: directive_usages(ext.directives()),
            ..TypeDef::new(
                name(ext.name())?,
                TypeBody::InputObject {
                    fields: input_fields(ext.input_fields_definition()),
                },
            )
        },
        _ => return None,
    };
    Some(ty)
}

fn directive_definition(def: &ast::DirectiveDefinition) -> DirectiveDef {
    DirectiveDef {
        name: name(def.name()).unwrap_or_default(),
        description: description(def.description()),
        args: def
            .arguments_definition()
            .map(|args| input_values(args.input_value_definitions()))
            .unwrap_or_default(),
        repeatable: def.repeatable_token().is_some(),
        locations: def
            .directive_locations()
            .map(|locations| {
                locations
                    .directive_locations()
                    .map(|l| source_text(&l).trim_start_matches('|').trim().to_owned())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn fields(def: Option<ast::FieldsDefinition>) -> IndexMap<String, FieldDef> {
    let Some(def) = def else {
        return IndexMap::new();
    };
    def.field_definitions()
        .filter_map(|field| {
            let (directives, deprecation) = split_deprecation(directive_usages(field.directives()));
            let field = FieldDef {
                name: name(field.name())?,
                description: description(field.description()),
                ty: type_ref(field.ty()?)?,
                args: field
                    .arguments_definition()
                    .map(|args| input_values(args.input_value_definitions()))
                    .unwrap_or_default(),
                deprecation,
                directives,
            };
            Some((field.name.clone(), field))
        })
        .collect()
}

fn input_fields(def: Option<ast::InputFieldsDefinition>) -> IndexMap<String, InputValue> {
    def.map(|def| input_values(def.input_value_definitions()))
        .unwrap_or_default()
}

fn input_values(values: impl Iterator<Item = ast::InputValueDefinition>) -> IndexMap<String, InputValue> {
    values
        .filter_map(|value| {
            let (directives, deprecation) = split_deprecation(directive_usages(value.directives()));
            let input = InputValue {
                name: name(value.name())?,
                description: description(value.description()),
                ty: type_ref(value.ty()?)?,
                default_value: value.default_value().and_then(|d| d.value()).map(const_value),
                deprecation,
                directives,
            };
            Some((input.name.clone(), input))
        })
        .collect()
}

fn enum_values(def: Option<ast::EnumValuesDefinition>) -> IndexMap<String, EnumValueDef> {
    let Some(def) = def else {
        return IndexMap::new();
    };
    def.enum_value_definitions()
        .filter_map(|value| {
            let (directives, deprecation) = split_deprecation(directive_usages(value.directives()));
            let value = EnumValueDef {
                name: name(value.enum_value()?.name())?,
                description: description(value.description()),
                deprecation,
                directives,
            };
            Some((value.name.clone(), value))
        })
        .collect()
}

fn implements(def: Option<ast::ImplementsInterfaces>) -> Vec<String> {
    def.map(|def| def.named_types().filter_map(|n| named_type(&n)).collect())
        .unwrap_or_default()
}

fn union_members(def: Option<ast::UnionMemberTypes>) -> Vec<String> {
    def.map(|def| def.named_types().filter_map(|n| named_type(&n)).collect())
        .unwrap_or_default()
}

pub(crate) fn directive_usages(directives: Option<ast::Directives>) -> Vec<DirectiveUsage> {
    let Some(directives) = directives else {
        return Vec::new();
    };
    directives
        .directives()
        .filter_map(|directive| {
            Some(DirectiveUsage {
                name: name(directive.name())?,
                arguments: directive
                    .arguments()
                    .map(|args| {
                        args.arguments()
                            .filter_map(|arg| Some((name(arg.name())?, const_value(arg.value()?))))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Pulls `@deprecated` out of a directive list, returning its reason.
fn split_deprecation(directives: Vec<DirectiveUsage>) -> (Vec<DirectiveUsage>, Option<String>) {
    let (deprecated, rest): (Vec<_>, Vec<_>) = directives.into_iter().partition(|d| d.name == "deprecated");
    let reason = deprecated.into_iter().next().map(|d| {
        d.arguments
            .into_iter()
            .find_map(|(name, value)| match value {
                Value::String(reason) if name == "reason" => Some(reason),
                _ => None,
            })
            .unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_owned())
    });
    (rest, reason)
}

/// Pulls `@specifiedBy(url:)` out of a scalar's directive list.
fn split_specified_by(directives: Vec<DirectiveUsage>) -> (Vec<DirectiveUsage>, Option<String>) {
    let (specified, rest): (Vec<_>, Vec<_>) = directives.into_iter().partition(|d| d.name == "specifiedBy");
    let url = specified.into_iter().next().and_then(|d| {
        d.arguments.into_iter().find_map(|(name, value)| match value {
            Value::String(url) if name == "url" => Some(url),
            _ => None,
        })
    });
    (rest, url)
}

fn type_ref(ty: ast::Type) -> Option<TypeRef> {
    match ty {
        ast::Type::NamedType(named) => named_type(&named).map(TypeRef::Named),
        ast::Type::ListType(list) => Some(TypeRef::list(type_ref(list.ty()?)?)),
        ast::Type::NonNullType(non_null) => {
            let inner = if let Some(named) = non_null.named_type() {
                TypeRef::Named(named_type(&named)?)
            } else {
                TypeRef::list(type_ref(non_null.list_type()?.ty()?)?)
            };
            Some(TypeRef::non_null(inner))
        }
    }
}

pub(crate) fn const_value(value: ast::Value) -> Value {
    match value {
        ast::Value::Variable(var) => Value::Variable(name(var.name()).unwrap_or_default()),
        ast::Value::StringValue(s) => Value::String(String::from(s)),
        ast::Value::FloatValue(f) => Value::Float(source_text(&f)),
        ast::Value::IntValue(i) => Value::Int(source_text(&i)),
        ast::Value::BooleanValue(b) => Value::Boolean(b.true_token().is_some()),
        ast::Value::NullValue(_) => Value::Null,
        ast::Value::EnumValue(e) => Value::Enum(name(e.name()).unwrap_or_default()),
        ast::Value::ListValue(list) => Value::List(list.values().map(const_value).collect()),
        ast::Value::ObjectValue(object) => Value::Object(
            object
                .object_fields()
                .filter_map(|field| Some((name(field.name())?, const_value(field.value()?))))
                .collect(),
        ),
    }
}

fn name(name: Option<ast::Name>) -> Option<String> {
    name.map(|n| n.text().to_string())
}

fn named_type(named: &ast::NamedType) -> Option<String> {
    name(named.name())
}

fn description(description: Option<ast::Description>) -> Option<String> {
    let value = description?.string_value()?;
    let raw = source_text(&value);
    match raw.strip_prefix("\"\"\"").and_then(|rest| rest.strip_suffix("\"\"\"")) {
        Some(block) => Some(block_string_value(&block.replace("\\\"\"\"", "\"\"\""))),
        None => Some(String::from(value)),
    }
}

/// Source text of a node without surrounding trivia.
fn source_text<N: AstNode>(node: &N) -> String {
    node.syntax().text().to_string().trim().to_owned()
}

/// Strips the common indentation of a block string and its blank edge lines.
///
/// Only spaces and tabs count as indentation. The first line is kept as is.
fn block_string_value(raw: &str) -> String {
    let leading = |line: &str| line.chars().take_while(|c| *c == ' ' || *c == '\t').count();
    let blank = |line: &str| leading(line) == line.len();

    let lines: Vec<&str> = raw.lines().collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !blank(line))
        .map(|line| leading(line))
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i == 0 { line } else { &line[leading(line).min(indent)..] })
        .collect();
    while out.first().is_some_and(|line| blank(line)) {
        out.remove(0);
    }
    while out.last().is_some_and(|line| blank(line)) {
        out.pop();
    }
    out.join("\n")
}
