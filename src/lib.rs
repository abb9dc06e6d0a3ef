//! Diff two GraphQL schemas.
//!
//! Both sides are resolved from a URL (introspection), an SDL file, a local
//! introspection JSON file or a glob of SDL files. The schemas are printed to
//! canonical SDL, optionally sorted first, and compared: identical output
//! means no changes, otherwise a unified text diff is produced together with
//! the lists of dangerous and breaking changes.
//!
//! ```no_run
//! # async fn run() -> Result<(), graphql_schema_diff::DiffError> {
//! use graphql_schema_diff::{compare, DiffOptions};
//!
//! let options = DiffOptions { sort_schema: true, ..Default::default() };
//! if let Some(result) = compare("old.graphql", "https://example.com/graphql", &options).await? {
//!     for change in &result.breaking_changes {
//!         println!("{}", change.description);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod changes;
pub mod classify;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod printer;
pub mod resolver;
pub mod schema;
pub mod text_diff;

pub use changes::{ChangeKind, ChangeRecord, Severity};
pub use classify::{classify, find_breaking_changes, find_dangerous_changes};
pub use diff::{compare, compare_schemas, compare_with, DiffOptions, DiffResult, SchemaOptions};
pub use error::{DiffError, ResolutionError, Side};
pub use normalize::sort_schema;
pub use printer::print_schema;
pub use resolver::{Headers, Loader, ResolveOptions, SchemaResolver};
pub use schema::introspection::IntrospectionOptions;
pub use schema::Schema;
