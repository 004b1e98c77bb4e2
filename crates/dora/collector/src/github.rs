//! GitHub REST and GraphQL clients.
//!
//! Deployments come from the GraphQL API, newest first, paged by cursor
//! and stopped early once a page reaches events older than the watermark.
//! Pull requests and issues come from the page-numbered REST API. Each
//! fetch is restartable per call and returns whatever it gathered when a
//! page fails, leaving recovery to the next scheduled cycle.

use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dora_types::{
    DeploymentConclusion, DeploymentRecord, IssueRecord, PullRequestRecord, RepoCoordinate,
};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const PAGE_SIZE: usize = 100;
const REST_PAGE_DELAY: Duration = Duration::from_millis(100);
const GRAPHQL_PAGE_DELAY: Duration = Duration::from_millis(200);
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(10);

const DEPLOYMENTS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $environments: [String!]!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    deployments(environments: $environments, first: 100, after: $cursor, orderBy: {field: CREATED_AT, direction: DESC}) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        createdAt
        statuses(first: 1) {
          nodes {
            state
          }
        }
      }
    }
  }
}
"#;

/// Read-only access to the source-hosting provider.
///
/// Each operation covers events at or after `since`; implementations may
/// return partial results when the remote fails mid-pagination.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Production deployments created since `since`.
    async fn deployments(
        &self,
        repo: &RepoCoordinate,
        since: DateTime<Utc>,
    ) -> Result<Vec<DeploymentRecord>, FetchError>;

    /// Pull requests against the default branch merged after `since`.
    async fn merged_pulls(
        &self,
        repo: &RepoCoordinate,
        since: DateTime<Utc>,
    ) -> Result<Vec<PullRequestRecord>, FetchError>;

    /// Failure-labeled issues closed after `since`.
    async fn failure_issues(
        &self,
        repo: &RepoCoordinate,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, FetchError>;
}

/// GitHub API settings.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Bearer credential; requests go unauthenticated when empty.
    pub token: String,
    /// REST API base URL.
    pub api_base: String,
    /// GraphQL endpoint URL.
    pub graphql_url: String,
    /// Deployment environment names counted as production.
    pub production_environments: Vec<String>,
    /// Issue label marking failure/incident issues.
    pub failure_issue_label: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            production_environments: vec![
                "prd".to_string(),
                "prod".to_string(),
                "production".to_string(),
            ],
            failure_issue_label: "bug".to_string(),
        }
    }
}

/// GitHub client implementing [`SourceHost`].
pub struct GitHubClient {
    client: reqwest::Client,
    config: GitHubConfig,
}

#[derive(Debug, Deserialize)]
struct RestPull {
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RestIssue {
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<GraphQlData>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    deployments: Option<DeploymentConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentConnection {
    page_info: PageInfo,
    nodes: Vec<DeploymentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentNode {
    created_at: DateTime<Utc>,
    statuses: StatusConnection,
}

#[derive(Debug, Deserialize)]
struct StatusConnection {
    nodes: Vec<StatusNode>,
}

#[derive(Debug, Deserialize)]
struct StatusNode {
    state: String,
}

impl GitHubClient {
    /// Create a client with the given settings.
    pub fn new(config: GitHubConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("dora-scorecard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github.v3+json");
        if !self.config.token.is_empty() {
            request = request.bearer_auth(&self.config.token);
        }

        let response = request.send().await?;

        if response.status() == StatusCode::FORBIDDEN {
            tokio::time::sleep(RATE_LIMIT_PAUSE).await;
            return Err(FetchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .post(&self.config.graphql_url)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Walk numbered REST pages, keeping items that pass `keep`.
    ///
    /// Stops on the first short page. A page error keeps the results
    /// gathered so far.
    async fn rest_paged<T, F>(&self, base_url: &str, keep: F) -> Vec<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut page = 1u32;
        let mut results = Vec::new();

        loop {
            let separator = if base_url.contains('?') { '&' } else { '?' };
            let url = format!("{base_url}{separator}per_page={PAGE_SIZE}&page={page}");

            let batch: Vec<T> = match self.get_json(&url).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::warn!(page, error = %err, "rest fetch failed; keeping partial results");
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }
            let short_page = batch.len() < PAGE_SIZE;
            results.extend(batch.into_iter().filter(|item| keep(item)));
            if short_page {
                break;
            }

            page += 1;
            tokio::time::sleep(REST_PAGE_DELAY).await;
        }

        results
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn deployments(
        &self,
        repo: &RepoCoordinate,
        since: DateTime<Utc>,
    ) -> Result<Vec<DeploymentRecord>, FetchError> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let variables = serde_json::json!({
                "owner": repo.owner,
                "repo": repo.name,
                "environments": self.config.production_environments,
                "cursor": cursor,
            });

            let envelope: GraphQlEnvelope =
                match self.graphql(DEPLOYMENTS_QUERY, variables).await {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        tracing::warn!(repo = %repo, error = %err, "graphql fetch failed; keeping partial results");
                        break;
                    }
                };

            let Some(connection) = envelope
                .data
                .and_then(|d| d.repository)
                .and_then(|r| r.deployments)
            else {
                break;
            };

            let mut reached_watermark = false;
            for node in connection.nodes {
                if node.created_at < since {
                    reached_watermark = true;
                    break;
                }
                let state = node.statuses.nodes.first().map(|s| s.state.as_str());
                results.push(DeploymentRecord {
                    created_at: node.created_at,
                    conclusion: DeploymentConclusion::from_status_state(state),
                });
            }

            if reached_watermark || !connection.page_info.has_next_page {
                break;
            }
            cursor = connection.page_info.end_cursor;
            tokio::time::sleep(GRAPHQL_PAGE_DELAY).await;
        }

        Ok(results)
    }

    async fn merged_pulls(
        &self,
        repo: &RepoCoordinate,
        since: DateTime<Utc>,
    ) -> Result<Vec<PullRequestRecord>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/pulls?state=closed&base=main",
            self.config.api_base, repo.owner, repo.name
        );
        let pulls = self
            .rest_paged::<RestPull, _>(&url, |pr| pr.merged_at.is_some_and(|m| m > since))
            .await;

        Ok(pulls
            .into_iter()
            .map(|pr| PullRequestRecord {
                created_at: pr.created_at,
                merged_at: pr.merged_at,
            })
            .collect())
    }

    async fn failure_issues(
        &self,
        repo: &RepoCoordinate,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueRecord>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/issues?labels={}&state=closed",
            self.config.api_base, repo.owner, repo.name, self.config.failure_issue_label
        );
        let issues = self
            .rest_paged::<RestIssue, _>(&url, |issue| issue.closed_at.is_some_and(|c| c > since))
            .await;

        Ok(issues
            .into_iter()
            .map(|issue| IssueRecord {
                created_at: issue.created_at,
                closed_at: issue.closed_at,
            })
            .collect())
    }
}
