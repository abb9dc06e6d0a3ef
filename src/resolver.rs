//! Turning a location string into a [`Schema`].
//!
//! Locations starting with `http://` or `https://` are introspected over
//! HTTP. Anything else is a local path: `.json` files hold an introspection
//! result, other files hold SDL, and glob patterns merge every matched file
//! into one schema.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ResolutionError;
use crate::schema::introspection::{
    introspection_query, parse_introspection_json, IntrospectionOptions, OPERATION_NAME,
};
use crate::schema::sdl::{build_schema, SdlSource};
use crate::schema::Schema;

pub type Headers = BTreeMap<String, String>;

/// What a resolver receives alongside the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub headers: Headers,
    /// What remote endpoints are asked for beyond the bare type system.
    pub introspection: IntrospectionOptions,
}

/// Global headers overlaid with side-specific ones; the side wins on collision.
pub fn merge_headers(global: &Headers, side: &Headers) -> Headers {
    let mut merged = global.clone();
    merged.extend(side.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[async_trait]
pub trait SchemaResolver: Send + Sync {
    async fn resolve(&self, location: &str, options: &ResolveOptions) -> Result<Schema, ResolutionError>;
}

/// The default resolver for URLs, files and globs.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    client: reqwest::Client,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn resolve_remote(&self, url: &str, options: &ResolveOptions) -> Result<Schema, ResolutionError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct IntrospectionRequest<'a> {
            query: String,
            variables: BTreeMap<String, String>,
            operation_name: &'a str,
        }

        info!(url, "fetching schema by introspection");
        let body = IntrospectionRequest {
            query: introspection_query(&options.introspection),
            variables: BTreeMap::new(),
            operation_name: OPERATION_NAME,
        };

        let mut request = self.client.post(url).json(&body);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let download_error = |reason: String| ResolutionError::RemoteDownload {
            url: url.to_owned(),
            reason,
        };

        let response = request.send().await.map_err(|e| download_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "introspection request failed");
            return Err(download_error(format!("HTTP status {status}")));
        }

        let text = response.text().await.map_err(|e| download_error(e.to_string()))?;
        parse_introspection_json(url, &text)
    }

    async fn resolve_local(&self, location: &str) -> Result<Schema, ResolutionError> {
        let paths = if is_glob(location) {
            expand_glob(location)?
        } else if Path::new(location).is_file() {
            vec![PathBuf::from(location)]
        } else {
            Vec::new()
        };

        if paths.is_empty() {
            return Err(ResolutionError::NoTypeDefinitions {
                pointer: location.to_owned(),
            });
        }

        if let [path] = paths.as_slice() {
            if path.extension().is_some_and(|ext| ext == "json") {
                let text = read(path).await?;
                return parse_introspection_json(&path.display().to_string(), &text);
            }
        }

        let mut sources = Vec::with_capacity(paths.len());
        for path in &paths {
            sources.push(SdlSource::new(path.display().to_string(), read(path).await?));
        }
        debug!(location, files = sources.len(), "parsing local SDL");
        build_schema(&sources)
    }
}

#[async_trait]
impl SchemaResolver for Loader {
    async fn resolve(&self, location: &str, options: &ResolveOptions) -> Result<Schema, ResolutionError> {
        if is_url(location) {
            self.resolve_remote(location, options).await
        } else {
            self.resolve_local(location).await
        }
    }
}

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

pub fn is_glob(location: &str) -> bool {
    location.contains(&['*', '?', '['][..])
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, ResolutionError> {
    let entries = glob::glob(pattern).map_err(|e| ResolutionError::InvalidGlob {
        pattern: pattern.to_owned(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ResolutionError::io(e.path(), e.error().to_string()))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

async fn read(path: &Path) -> Result<String, ResolutionError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ResolutionError::io(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_merge_headers_side_wins() {
        let merged = merge_headers(
            &headers(&[("Global", "merged"), ("Test", "global")]),
            &headers(&[("Test", "left")]),
        );
        assert_eq!(merged, headers(&[("Global", "merged"), ("Test", "left")]));
    }

    #[test]
    fn test_location_kinds() {
        assert!(is_url("https://example.com/graphql"));
        assert!(!is_url("schema.graphql"));
        assert!(is_glob("schemas/**/*.graphql"));
        assert!(!is_glob("schemas/schema.graphql"));
    }

    #[tokio::test]
    async fn test_missing_path() {
        let err = Loader::new()
            .resolve("/definitely/not/here.graphql", &ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoTypeDefinitions { .. }));
    }

    #[tokio::test]
    async fn test_directory_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.graphql"), "type Query { a: String }").unwrap();

        let location = dir.path().display().to_string();
        let err = Loader::new()
            .resolve(&location, &ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NoTypeDefinitions { pointer } if pointer == location));
    }

    #[tokio::test]
    async fn test_glob_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.graphql"), "type Query { a: String }").unwrap();
        std::fs::write(dir.path().join("b.graphql"), "extend type Query { b: Int }").unwrap();

        let pattern = format!("{}/*.graphql", dir.path().display());
        let schema = Loader::new()
            .resolve(&pattern, &ResolveOptions::default())
            .await
            .unwrap();
        let fields = schema.get_type("Query").unwrap().fields().unwrap();
        assert!(fields.contains_key("a"));
        assert!(fields.contains_key("b"));
    }

    #[tokio::test]
    async fn test_glob_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/**/*.invalidgql", dir.path().display());
        let err = Loader::new()
            .resolve(&pattern, &ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Unable to find any GraphQL type definitions for the following pointers"));
    }
}
