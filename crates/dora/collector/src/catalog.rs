//! Service discovery against the catalog API.

use crate::error::FetchError;
use async_trait::async_trait;
use dora_types::{CatalogService, RepoCoordinate};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const PROJECT_SLUG_ANNOTATION: &str = "github.com/project-slug";
const SOURCE_LOCATION_ANNOTATION: &str = "backstage.io/source-location";

/// Read-only view of the service catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List catalog components of type `service`, with their repository
    /// identity where one can be resolved.
    async fn services(&self) -> Result<Vec<CatalogService>, FetchError>;
}

/// Catalog client speaking the Backstage REST API.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Entity {
    metadata: EntityMetadata,
}

#[derive(Debug, Deserialize)]
struct EntityMetadata {
    name: String,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

impl HttpCatalog {
    /// Create a catalog client for the given API base URL.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn services(&self) -> Result<Vec<CatalogService>, FetchError> {
        let url = format!("{}/entities", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("filter", "kind=component,spec.type=service")])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let entities: Vec<Entity> = response.json().await?;
        Ok(entities
            .into_iter()
            .map(|entity| CatalogService {
                repo: repo_from_annotations(&entity.metadata.annotations),
                name: entity.metadata.name,
            })
            .collect())
    }
}

/// Resolve a repository coordinate from catalog annotations.
///
/// Prefers the standard project-slug annotation, falling back to the
/// `github.com/<owner>/<repo>` segment of the source location.
fn repo_from_annotations(annotations: &HashMap<String, String>) -> Option<RepoCoordinate> {
    if let Some(slug) = annotations.get(PROJECT_SLUG_ANNOTATION) {
        if let Ok(repo) = slug.parse() {
            return Some(repo);
        }
    }

    let location = annotations.get(SOURCE_LOCATION_ANNOTATION)?;
    let rest = location.split("github.com/").nth(1)?;
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?.trim_end_matches(".git");
    format!("{owner}/{name}").parse().ok()
}
