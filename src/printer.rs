//! Canonical SDL rendering.
//!
//! Output is a pure function of the schema's contents and member order, so
//! two equal schemas print to identical text. Built-in scalars and the
//! specified directives are implicit and not printed.

use std::fmt::Write;

use crate::schema::{
    is_specified_directive, is_standard_scalar, print_string, DirectiveDef, DirectiveUsage, FieldDef,
    InputValue, Schema, TypeBody, TypeDef, Value, DEFAULT_DEPRECATION_REASON,
};

/// Prints `schema` as SDL, including directive definitions and usages.
pub fn print_schema(schema: &Schema) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(block) = print_schema_definition(schema) {
        blocks.push(block);
    }
    blocks.extend(
        schema
            .directive_defs
            .values()
            .filter(|d| !is_specified_directive(&d.name))
            .map(print_directive_def),
    );
    blocks.extend(
        schema
            .types
            .values()
            .filter(|t| !is_standard_scalar(&t.name))
            .map(print_type),
    );

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn print_schema_definition(schema: &Schema) -> Option<String> {
    if schema.has_conventional_roots() && schema.directives.is_empty() && schema.description.is_none() {
        return None;
    }
    let mut out = description(schema.description.as_deref(), "");
    out.push_str("schema");
    out.push_str(&usages(&schema.directives));
    out.push_str(" {\n");
    for (op, name) in schema.root_operations() {
        let _ = writeln!(out, "  {op}: {name}");
    }
    out.push('}');
    Some(out)
}

pub fn print_type(ty: &TypeDef) -> String {
    let mut out = description(ty.description.as_deref(), "");
    let directives = usages(&ty.directives);

    match &ty.body {
        TypeBody::Scalar => {
            let _ = write!(out, "scalar {}{}", ty.name, directives);
            if let Some(url) = &ty.specified_by_url {
                let _ = write!(out, " @specifiedBy(url: {})", print_string(url));
            }
        }
        TypeBody::Object { interfaces, fields } | TypeBody::Interface { interfaces, fields } => {
            let _ = write!(out, "{} {}", ty.kind().keyword(), ty.name);
            if !interfaces.is_empty() {
                let _ = write!(out, " implements {}", interfaces.join(" & "));
            }
            out.push_str(&directives);
            out.push_str(&block(fields.values().map(print_field)));
        }
        TypeBody::Union { members } => {
            let _ = write!(out, "union {}{}", ty.name, directives);
            if !members.is_empty() {
                let _ = write!(out, " = {}", members.join(" | "));
            }
        }
        TypeBody::Enum { values } => {
            let _ = write!(out, "enum {}{}", ty.name, directives);
            out.push_str(&block(values.values().map(|value| {
                format!(
                    "{}{}{}{}",
                    description(value.description.as_deref(), "  "),
                    value.name,
                    usages(&value.directives),
                    deprecated(value.deprecation.as_deref()),
                )
            })));
        }
        TypeBody::InputObject { fields } => {
            let _ = write!(out, "input {}{}", ty.name, directives);
            out.push_str(&block(
                fields.values().map(|f| format!("{}{}", description(f.description.as_deref(), "  "), input_value(f))),
            ));
        }
    }
    out
}

fn print_field(field: &FieldDef) -> String {
    format!(
        "{}{}{}: {}{}{}",
        description(field.description.as_deref(), "  "),
        field.name,
        arguments(field.args.values(), "  "),
        field.ty,
        usages(&field.directives),
        deprecated(field.deprecation.as_deref()),
    )
}

fn print_directive_def(directive: &DirectiveDef) -> String {
    format!(
        "{}directive @{}{}{} on {}",
        description(directive.description.as_deref(), ""),
        directive.name,
        arguments(directive.args.values(), ""),
        if directive.repeatable { " repeatable" } else { "" },
        directive.locations.join(" | "),
    )
}

fn input_value(value: &InputValue) -> String {
    let mut out = format!("{}: {}", value.name, value.ty);
    if let Some(default) = &value.default_value {
        let _ = write!(out, " = {default}");
    }
    out.push_str(&usages(&value.directives));
    out.push_str(&deprecated(value.deprecation.as_deref()));
    out
}

/// Arguments go on one line unless one of them carries a description.
fn arguments<'a>(args: impl ExactSizeIterator<Item = &'a InputValue>, indent: &str) -> String {
    if args.len() == 0 {
        return String::new();
    }
    let args: Vec<&InputValue> = args.collect();
    if args.iter().all(|a| a.description.is_none()) {
        let inline: Vec<String> = args.iter().map(|a| input_value(a)).collect();
        return format!("({})", inline.join(", "));
    }

    let inner = format!("{indent}  ");
    let lines: Vec<String> = args
        .iter()
        .map(|a| match description(a.description.as_deref(), &inner) {
            prefix if prefix.is_empty() => format!("{inner}{}", input_value(a)),
            prefix => format!("{prefix}{}", input_value(a)),
        })
        .collect();
    format!("(\n{}\n{indent})", lines.join("\n"))
}

fn block(lines: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        return String::new();
    }
    let body: Vec<String> = lines.into_iter().map(|l| indent_first(&l)).collect();
    format!(" {{\n{}\n}}", body.join("\n"))
}

/// Members are indented by two spaces; descriptions already carry theirs, so
/// only a line that does not start with the indent gets it.
fn indent_first(line: &str) -> String {
    if line.starts_with("  ") {
        line.to_owned()
    } else {
        format!("  {line}")
    }
}

fn usages(usages: &[DirectiveUsage]) -> String {
    usages.iter().map(|u| format!(" {}", usage(u))).collect()
}

fn usage(usage: &DirectiveUsage) -> String {
    if usage.arguments.is_empty() {
        return format!("@{}", usage.name);
    }
    let args: Vec<String> = usage
        .arguments
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    format!("@{}({})", usage.name, args.join(", "))
}

fn deprecated(reason: Option<&str>) -> String {
    match reason {
        None => String::new(),
        Some(DEFAULT_DEPRECATION_REASON) => " @deprecated".to_owned(),
        Some(reason) => format!(" @deprecated(reason: {})", Value::String(reason.to_owned())),
    }
}

/// Renders a description as a block string, followed by a newline and `indent`.
fn description(description: Option<&str>, indent: &str) -> String {
    let Some(text) = description else {
        return String::new();
    };
    let escaped = text.replace("\"\"\"", "\\\"\"\"");
    if !escaped.contains('\n') && !escaped.ends_with('"') && !escaped.ends_with('\\') {
        return format!("{indent}\"\"\"{escaped}\"\"\"\n{indent}");
    }
    let body: Vec<String> = escaped
        .lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{indent}{line}") })
        .collect();
    format!("{indent}\"\"\"\n{}\n{indent}\"\"\"\n{indent}", body.join("\n"))
}
