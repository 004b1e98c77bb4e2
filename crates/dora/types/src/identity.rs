//! Service identity: catalog name and source repository coordinate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A GitHub repository coordinate, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

/// Error parsing an `owner/name` repository slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository slug '{0}'; expected owner/name")]
pub struct RepoParseError(pub String);

impl FromStr for RepoCoordinate {
    type Err = RepoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(RepoParseError(s.to_string())),
        }
    }
}

impl fmt::Display for RepoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A catalog component eligible for metric collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogService {
    /// Catalog component name.
    pub name: String,
    /// Repository identity resolved from catalog annotations, if any.
    pub repo: Option<RepoCoordinate>,
}

/// The durable row key for a service: `component:default/<name>`, lower-cased.
pub fn entity_ref(service: &str) -> String {
    format!("component:default/{service}").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo: RepoCoordinate = "acme/orders".parse().unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "orders");
        assert_eq!(repo.to_string(), "acme/orders");
    }

    #[test]
    fn rejects_malformed_slugs() {
        assert!("acme".parse::<RepoCoordinate>().is_err());
        assert!("/orders".parse::<RepoCoordinate>().is_err());
        assert!("acme/".parse::<RepoCoordinate>().is_err());
        assert!("acme/group/orders".parse::<RepoCoordinate>().is_err());
    }

    #[test]
    fn entity_ref_is_lowercased() {
        assert_eq!(entity_ref("Order-Service"), "component:default/order-service");
    }
}
