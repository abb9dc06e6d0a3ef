//! Comparison of two schema locations.

use serde::Serialize;
use tracing::debug;

use crate::changes::ChangeRecord;
use crate::classify::classify;
use crate::error::{DiffError, Side};
use crate::normalize::sort_schema;
use crate::printer::print_schema;
use crate::resolver::{merge_headers, Headers, Loader, ResolveOptions, SchemaResolver};
use crate::schema::introspection::IntrospectionOptions;
use crate::schema::Schema;
use crate::text_diff::{unified_diff, unified_diff_colored};

/// Per-side resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    pub headers: Headers,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Sent to both sides.
    pub headers: Headers,
    pub left_schema: SchemaOptions,
    pub right_schema: SchemaOptions,
    /// Sort types and members by name before printing and comparing.
    pub sort_schema: bool,
    /// Optional parts of the remote introspection query.
    pub introspection: IntrospectionOptions,
}

impl DiffOptions {
    /// What the resolver of `side` is handed.
    pub fn resolve_options(&self, side: Side) -> ResolveOptions {
        let side_options = match side {
            Side::Left => &self.left_schema,
            Side::Right => &self.right_schema,
        };
        ResolveOptions {
            headers: merge_headers(&self.headers, &side_options.headers),
            introspection: self.introspection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    /// Unified diff with ANSI colors.
    pub diff: String,
    pub diff_plain: String,
    pub dangerous_changes: Vec<ChangeRecord>,
    pub breaking_changes: Vec<ChangeRecord>,
}

impl DiffResult {
    pub fn has_dangerous_changes(&self) -> bool {
        !self.dangerous_changes.is_empty()
    }

    pub fn has_breaking_changes(&self) -> bool {
        !self.breaking_changes.is_empty()
    }
}

/// Compares the schemas at two locations with the default [`Loader`].
///
/// Returns `Ok(None)` when both print to the same SDL.
pub async fn compare(left: &str, right: &str, options: &DiffOptions) -> Result<Option<DiffResult>, DiffError> {
    compare_with(&Loader::new(), left, right, options).await
}

/// Compares the schemas at two locations using `resolver`.
///
/// Both sides resolve concurrently and both are awaited before any error is
/// reported; when both fail, the left error wins.
pub async fn compare_with<R>(
    resolver: &R,
    left: &str,
    right: &str,
    options: &DiffOptions,
) -> Result<Option<DiffResult>, DiffError>
where
    R: SchemaResolver + ?Sized,
{
    let left_options = options.resolve_options(Side::Left);
    let right_options = options.resolve_options(Side::Right);

    let (left_schema, right_schema) = tokio::join!(
        resolver.resolve(left, &left_options),
        resolver.resolve(right, &right_options),
    );
    let left_schema = checked(Side::Left, left, left_schema)?;
    let right_schema = checked(Side::Right, right, right_schema)?;

    Ok(compare_schemas(&left_schema, &right_schema, [left, right], options.sort_schema))
}

/// The synchronous half of a comparison, over already resolved schemas.
pub fn compare_schemas(left: &Schema, right: &Schema, labels: [&str; 2], sort: bool) -> Option<DiffResult> {
    let sorted;
    let (left, right) = if sort {
        debug!("sorting schemas");
        sorted = (sort_schema(left), sort_schema(right));
        (&sorted.0, &sorted.1)
    } else {
        (left, right)
    };

    let left_sdl = print_schema(left);
    let right_sdl = print_schema(right);
    if left_sdl == right_sdl {
        debug!("schemas print identically");
        return None;
    }

    let (dangerous_changes, breaking_changes) = classify(left, right);
    debug!(
        dangerous = dangerous_changes.len(),
        breaking = breaking_changes.len(),
        "classified schema changes"
    );

    Some(DiffResult {
        diff: unified_diff_colored(&left_sdl, &right_sdl, labels),
        diff_plain: unified_diff(&left_sdl, &right_sdl, labels),
        dangerous_changes,
        breaking_changes,
    })
}

fn checked(
    side: Side,
    location: &str,
    resolved: Result<Schema, crate::error::ResolutionError>,
) -> Result<Schema, DiffError> {
    let schema = resolved.map_err(|source| DiffError::Resolution {
        side,
        location: location.to_owned(),
        source,
    })?;
    if schema.is_empty() {
        return Err(DiffError::Validation {
            side,
            location: location.to_owned(),
        });
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sdl::parse_schema;

    const SORTED: &str = "type Query { a: Int b: String } enum E { X Y }";
    const UNSORTED: &str = "enum E { Y X } type Query { b: String a: Int }";

    #[test]
    fn test_same_schema_has_no_diff() {
        let schema = parse_schema("a", SORTED).unwrap();
        assert!(compare_schemas(&schema, &schema, ["a", "a"], false).is_none());
        assert!(compare_schemas(&schema, &schema, ["a", "a"], true).is_none());
    }

    #[test]
    fn test_sorting_hides_member_order() {
        let sorted = parse_schema("sorted", SORTED).unwrap();
        let unsorted = parse_schema("unsorted", UNSORTED).unwrap();

        let result = compare_schemas(&sorted, &unsorted, ["sorted", "unsorted"], false).unwrap();
        assert!(result.dangerous_changes.is_empty());
        assert!(result.breaking_changes.is_empty());
        assert!(result.diff_plain.starts_with("--- sorted\tremoved\n+++ unsorted\tadded\n"));

        assert!(compare_schemas(&sorted, &unsorted, ["sorted", "unsorted"], true).is_none());
    }

    #[test]
    fn test_resolve_options_merge() {
        let mut options = DiffOptions::default();
        options.headers.insert("Global".into(), "merged".into());
        options.headers.insert("Test".into(), "global".into());
        options.left_schema.headers.insert("Test".into(), "left".into());
        options.introspection.input_value_deprecation = true;

        let left = options.resolve_options(Side::Left);
        assert_eq!(left.headers["Test"], "left");
        assert_eq!(left.headers["Global"], "merged");
        assert!(left.introspection.input_value_deprecation);
        assert!(!left.introspection.descriptions);

        let right = options.resolve_options(Side::Right);
        assert_eq!(right.headers["Test"], "global");
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        let err = checked(Side::Right, "nowhere", Ok(Schema::default())).unwrap_err();
        assert!(matches!(err, DiffError::Validation { side: Side::Right, .. }));
    }
}
