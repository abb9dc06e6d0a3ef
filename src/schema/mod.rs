//! In-memory GraphQL type system.
//!
//! A [`Schema`] owns every named definition in name-keyed maps. Types refer to
//! each other by name only, so self-referencing and mutually recursive types
//! need no shared ownership: follow a [`TypeRef`] with [`Schema::get_type`].

use std::fmt;

use indexmap::IndexMap;

pub mod introspection;
pub mod sdl;

/// Reason used by `@deprecated` when none is given.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub const STANDARD_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

pub const SPECIFIED_DIRECTIVES: [&str; 4] = ["include", "skip", "deprecated", "specifiedBy"];

pub fn is_standard_scalar(name: &str) -> bool {
    STANDARD_SCALARS.contains(&name)
}

pub fn is_specified_directive(name: &str) -> bool {
    SPECIFIED_DIRECTIVES.contains(&name)
}

pub fn is_introspection_type(name: &str) -> bool {
    name.starts_with("__")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub description: Option<String>,
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    /// Directive usages on the `schema` definition itself.
    pub directives: Vec<DirectiveUsage>,
    pub types: IndexMap<String, TypeDef>,
    pub directive_defs: IndexMap<String, DirectiveDef>,
}

impl Schema {
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// True when the schema defines nothing beyond the implicit built-ins.
    pub fn is_empty(&self) -> bool {
        self.types.keys().all(|name| is_standard_scalar(name))
            && self.directive_defs.keys().all(|name| is_specified_directive(name))
    }

    /// Root operation types as `(operation, type name)` pairs.
    pub fn root_operations(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("query", self.query_type.as_deref()),
            ("mutation", self.mutation_type.as_deref()),
            ("subscription", self.subscription_type.as_deref()),
        ]
        .into_iter()
        .filter_map(|(op, name)| name.map(|name| (op, name)))
    }

    /// Whether every root type carries its conventional name, in which case the
    /// `schema { ... }` block can be left implicit.
    pub fn has_conventional_roots(&self) -> bool {
        self.root_operations().all(|(op, name)| match op {
            "query" => name == "Query",
            "mutation" => name == "Mutation",
            _ => name == "Subscription",
        })
    }

    /// Falls back to the conventionally named root types when no `schema`
    /// definition named them.
    pub(crate) fn infer_root_types(&mut self) {
        if self.query_type.is_none() && self.mutation_type.is_none() && self.subscription_type.is_none() {
            let present = |name: &str| self.types.contains_key(name).then(|| name.to_owned());
            self.query_type = present("Query");
            self.mutation_type = present("Mutation");
            self.subscription_type = present("Subscription");
        }
    }

    /// Adds the specified directives that the schema does not redefine, and
    /// the standard scalars their arguments need.
    pub(crate) fn add_specified_directives(&mut self) {
        for directive in specified_directive_defs() {
            if !self.directive_defs.contains_key(&directive.name) {
                self.directive_defs.insert(directive.name.clone(), directive);
            }
        }
    }

    /// Adds the standard scalars that something references but the schema
    /// does not declare. Declared ones stay even when nothing uses them.
    pub(crate) fn settle_standard_scalars(&mut self) {
        let referenced = self.referenced_type_names();
        for scalar in STANDARD_SCALARS {
            if referenced.iter().any(|name| name == scalar) {
                self.types
                    .entry(scalar.to_owned())
                    .or_insert_with(|| TypeDef::new(scalar, TypeBody::Scalar));
            }
        }
    }

    /// Every named type reachable through a field, argument, input field,
    /// interface, union member, root operation or directive argument.
    pub fn referenced_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_owned());
            }
        };

        for (_, root) in self.root_operations() {
            push(root);
        }
        for ty in self.types.values() {
            match &ty.body {
                TypeBody::Scalar => {}
                TypeBody::Object { interfaces, fields } | TypeBody::Interface { interfaces, fields } => {
                    interfaces.iter().for_each(|i| push(i));
                    for field in fields.values() {
                        push(field.ty.named_type());
                        field.args.values().for_each(|arg| push(arg.ty.named_type()));
                    }
                }
                TypeBody::Union { members } => members.iter().for_each(|m| push(m)),
                TypeBody::Enum { .. } => {}
                TypeBody::InputObject { fields } => {
                    fields.values().for_each(|f| push(f.ty.named_type()));
                }
            }
        }
        for directive in self.directive_defs.values() {
            directive.args.values().for_each(|arg| push(arg.ty.named_type()));
        }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    /// Phrase used in change descriptions, e.g. "an Object type".
    pub fn article_name(self) -> &'static str {
        match self {
            TypeKind::Scalar => "a Scalar type",
            TypeKind::Object => "an Object type",
            TypeKind::Interface => "an Interface type",
            TypeKind::Union => "a Union type",
            TypeKind::Enum => "an Enum type",
            TypeKind::InputObject => "an Input type",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "type",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::InputObject => "input",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveUsage>,
    /// Only meaningful for scalars.
    pub specified_by_url: Option<String>,
    pub body: TypeBody,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, body: TypeBody) -> Self {
        Self {
            name: name.into(),
            description: None,
            directives: Vec::new(),
            specified_by_url: None,
            body,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self.body {
            TypeBody::Scalar => TypeKind::Scalar,
            TypeBody::Object { .. } => TypeKind::Object,
            TypeBody::Interface { .. } => TypeKind::Interface,
            TypeBody::Union { .. } => TypeKind::Union,
            TypeBody::Enum { .. } => TypeKind::Enum,
            TypeBody::InputObject { .. } => TypeKind::InputObject,
        }
    }

    /// Output fields of an object or interface type.
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match &self.body {
            TypeBody::Object { fields, .. } | TypeBody::Interface { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn interfaces(&self) -> &[String] {
        match &self.body {
            TypeBody::Object { interfaces, .. } | TypeBody::Interface { interfaces, .. } => interfaces,
            _ => &[],
        }
    }
}

/// Kind-specific members of a type definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Scalar,
    Object {
        interfaces: Vec<String>,
        fields: IndexMap<String, FieldDef>,
    },
    Interface {
        interfaces: Vec<String>,
        fields: IndexMap<String, FieldDef>,
    },
    Union {
        members: Vec<String>,
    },
    Enum {
        values: IndexMap<String, EnumValueDef>,
    },
    InputObject {
        fields: IndexMap<String, InputValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub args: IndexMap<String, InputValue>,
    pub deprecation: Option<String>,
    pub directives: Vec<DirectiveUsage>,
}

impl FieldDef {
    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }
}

/// An argument of a field or directive, or a field of an input object.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
    pub deprecation: Option<String>,
    pub directives: Vec<DirectiveUsage>,
}

impl InputValue {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
            deprecation: None,
            directives: Vec::new(),
        }
    }

    /// Non-null without a default: callers must supply it.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub directives: Vec<DirectiveUsage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDef {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, InputValue>,
    pub repeatable: bool,
    pub locations: Vec<String>,
}

/// A directive applied to a schema element, with its arguments in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveUsage {
    pub name: String,
    pub arguments: Vec<(String, Value)>,
}

/// A type reference with its list and non-null wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A constant GraphQL value, as used in defaults and directive arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Kept as written so large and signed literals survive untouched.
    Int(String),
    Float(String),
    String(String),
    Boolean(bool),
    Enum(String),
    Variable(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(raw) | Value::Float(raw) | Value::Enum(raw) => f.write_str(raw),
            Value::String(s) => f.write_str(&print_string(s)),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Variable(name) => write!(f, "${name}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Quotes and escapes a string the way GraphQL string literals are printed.
pub fn print_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn specified_directive_defs() -> Vec<DirectiveDef> {
    let directive = |name: &str, args: Vec<InputValue>, locations: &[&str]| DirectiveDef {
        name: name.to_owned(),
        description: None,
        args: args.into_iter().map(|arg| (arg.name.clone(), arg)).collect(),
        repeatable: false,
        locations: locations.iter().map(|l| (*l).to_owned()).collect(),
    };
    let required_boolean = || InputValue::new("if", TypeRef::non_null(TypeRef::named("Boolean")));

    let mut reason = InputValue::new("reason", TypeRef::named("String"));
    reason.default_value = Some(Value::String(DEFAULT_DEPRECATION_REASON.to_owned()));

    vec![
        directive(
            "include",
            vec![required_boolean()],
            &["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
        ),
        directive(
            "skip",
            vec![required_boolean()],
            &["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
        ),
        directive(
            "deprecated",
            vec![reason],
            &["FIELD_DEFINITION", "ARGUMENT_DEFINITION", "INPUT_FIELD_DEFINITION", "ENUM_VALUE"],
        ),
        directive(
            "specifiedBy",
            vec![InputValue::new("url", TypeRef::non_null(TypeRef::named("String")))],
            &["SCALAR"],
        ),
    ]
}
