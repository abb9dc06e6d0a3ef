//! Error types.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Which of the two compared schemas an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Failures while obtaining a schema from a location.
#[derive(Error, Diagnostic, Debug)]
pub enum ResolutionError {
    #[error("Unable to find any GraphQL type definitions for the following pointers: {pointer}")]
    #[diagnostic(
        code(graphql_schema_diff::resolve::no_type_definitions),
        help("Check that the path exists and that a glob matches at least one SDL file")
    )]
    NoTypeDefinitions { pointer: String },

    #[error("Failed to read file '{}': {message}", path.display())]
    #[diagnostic(code(graphql_schema_diff::resolve::io))]
    Io { path: PathBuf, message: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    #[diagnostic(code(graphql_schema_diff::resolve::invalid_glob))]
    InvalidGlob { pattern: String, message: String },

    #[error("Syntax error in {location}: {message}")]
    #[diagnostic(code(graphql_schema_diff::parse::syntax_error))]
    Syntax { location: String, message: String },

    #[error("Unknown type '{type_name}' referenced in {location}")]
    #[diagnostic(code(graphql_schema_diff::parse::unknown_type))]
    UnknownType { location: String, type_name: String },

    #[error("Type '{type_name}' is defined with different kinds in {location}")]
    #[diagnostic(code(graphql_schema_diff::parse::conflicting_definition))]
    ConflictingDefinition { location: String, type_name: String },

    #[error("Unable to download schema from remote: {url} ({reason})")]
    #[diagnostic(
        code(graphql_schema_diff::resolve::remote_download),
        help("The endpoint must answer the introspection query with a 2xx status")
    )]
    RemoteDownload { url: String, reason: String },

    #[error("Unable to download schema from remote: invalid introspection result from {location}: {message}")]
    #[diagnostic(code(graphql_schema_diff::resolve::invalid_introspection))]
    InvalidIntrospection { location: String, message: String },
}

impl ResolutionError {
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by a schema comparison.
#[derive(Error, Diagnostic, Debug)]
pub enum DiffError {
    #[error("Failed to resolve {side} schema '{location}'")]
    #[diagnostic(code(graphql_schema_diff::diff::resolution))]
    Resolution {
        side: Side,
        location: String,
        #[source]
        #[diagnostic_source]
        source: ResolutionError,
    },

    #[error("Schemas not defined: the {side} schema '{location}' is empty")]
    #[diagnostic(code(graphql_schema_diff::diff::validation))]
    Validation { side: Side, location: String },
}

impl DiffError {
    /// The underlying resolution failure, if any.
    pub fn resolution_error(&self) -> Option<&ResolutionError> {
        match self {
            DiffError::Resolution { source, .. } => Some(source),
            DiffError::Validation { .. } => None,
        }
    }
}
