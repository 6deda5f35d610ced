//! Remote project registry.
//!
//! # Wire format
//!
//! ```text
//! GET {base}/        → {"chains": [{"chain_name": "..."}, ...]}
//! GET {base}/{name}  → {"chain": {"chain_name", "daemon_name",
//!                        "codebase": {"git_repo", "recommended_version"}}}
//! ```
//!
//! Absent detail fields decode as empty strings so that incomplete entries
//! surface later as missing metadata rather than as decode failures.

use std::time::Duration;

use serde::Deserialize;

use crate::error::RegistryError;
use crate::types::{ProjectDescriptor, ProjectName};

/// Default public registry endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "https://chains.cosmos.directory/";

// ---------------------------------------------------------------------------
// 1. Client seam
// ---------------------------------------------------------------------------

/// Read-only view of the registry. No retries: each call is one request.
pub trait RegistryClient {
    /// Every project name the registry knows about, in response order.
    fn fetch_all_project_names(&self) -> Result<Vec<ProjectName>, RegistryError>;

    /// Metadata for a single project.
    fn fetch_project_detail(&self, name: &ProjectName)
        -> Result<ProjectDescriptor, RegistryError>;
}

// ---------------------------------------------------------------------------
// 2. Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AllChainsResponse {
    chains: Vec<ChainEntry>,
}

#[derive(Debug, Deserialize)]
struct ChainEntry {
    chain_name: String,
}

#[derive(Debug, Deserialize)]
struct SingleChainResponse {
    chain: ChainDetail,
}

#[derive(Debug, Deserialize)]
struct ChainDetail {
    #[serde(default)]
    chain_name: String,
    #[serde(default)]
    daemon_name: String,
    #[serde(default)]
    codebase: CodebaseDetail,
}

#[derive(Debug, Default, Deserialize)]
struct CodebaseDetail {
    #[serde(default)]
    git_repo: String,
    #[serde(default)]
    recommended_version: String,
}

/// Decode a full-listing payload.
pub fn parse_project_list(url: &str, body: &str) -> Result<Vec<ProjectName>, RegistryError> {
    let parsed: AllChainsResponse = serde_json::from_str(body).map_err(|e| decode_err(url, e))?;
    Ok(parsed
        .chains
        .into_iter()
        .map(|c| ProjectName::from(c.chain_name))
        .collect())
}

/// Decode a single-project payload. The requested name is kept as identity
/// even if the payload spells it differently.
pub fn parse_project_detail(
    url: &str,
    requested: &ProjectName,
    body: &str,
) -> Result<ProjectDescriptor, RegistryError> {
    let parsed: SingleChainResponse =
        serde_json::from_str(body).map_err(|e| decode_err(url, e))?;
    let chain = parsed.chain;
    if !chain.chain_name.is_empty() && chain.chain_name != requested.0 {
        tracing::debug!(
            requested = %requested,
            reported = %chain.chain_name,
            "registry reported a different chain name"
        );
    }
    Ok(ProjectDescriptor {
        name: requested.clone(),
        daemon_name: chain.daemon_name,
        git_repo: chain.codebase.git_repo,
        recommended_version: chain.codebase.recommended_version,
    })
}

// ---------------------------------------------------------------------------
// 3. Blocking HTTP client
// ---------------------------------------------------------------------------

/// [`RegistryClient`] over plain HTTP(S) using a blocking `ureq` agent.
pub struct HttpRegistry {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpRegistry {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{name}` regardless of whether `base` ends with a slash.
    pub fn detail_url(&self, name: &ProjectName) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name.0)
    }

    fn get_text(&self, url: &str) -> Result<String, RegistryError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => RegistryError::Network {
                url: url.to_string(),
                detail: format!("status code {code}"),
            },
            other => RegistryError::Network {
                url: url.to_string(),
                detail: other.to_string(),
            },
        })?;
        response.into_string().map_err(|e| RegistryError::Network {
            url: url.to_string(),
            detail: format!("failed to read body: {e}"),
        })
    }
}

impl RegistryClient for HttpRegistry {
    fn fetch_all_project_names(&self) -> Result<Vec<ProjectName>, RegistryError> {
        tracing::debug!(url = %self.base_url, "fetching project list");
        let body = self.get_text(&self.base_url)?;
        parse_project_list(&self.base_url, &body)
    }

    fn fetch_project_detail(
        &self,
        name: &ProjectName,
    ) -> Result<ProjectDescriptor, RegistryError> {
        let url = self.detail_url(name);
        tracing::debug!(url = %url, "fetching project detail");
        let body = self.get_text(&url)?;
        parse_project_detail(&url, name, &body)
    }
}

fn decode_err(url: &str, e: serde_json::Error) -> RegistryError {
    RegistryError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://registry.test/";

    #[test]
    fn parses_listing_in_response_order() {
        let body = r#"{"chains":[{"chain_name":"osmosis"},{"chain_name":"akash","extra":1}]}"#;
        let names = parse_project_list(URL, body).expect("parse");
        assert_eq!(
            names,
            vec![ProjectName::from("osmosis"), ProjectName::from("akash")]
        );
    }

    #[test]
    fn malformed_listing_is_decode_error() {
        let err = parse_project_list(URL, "{\"chains\": 3}").unwrap_err();
        assert!(matches!(err, RegistryError::Decode { .. }), "got: {err}");
        assert!(err.to_string().contains(URL));
    }

    #[test]
    fn parses_detail() {
        let body = r#"{"chain":{"chain_name":"akash","daemon_name":"akash",
            "codebase":{"git_repo":"https://github.com/ovrclk/akash","recommended_version":"v0.16.3"}}}"#;
        let d = parse_project_detail(URL, &ProjectName::from("akash"), body).expect("parse");
        assert_eq!(d.name, ProjectName::from("akash"));
        assert_eq!(d.daemon_name, "akash");
        assert_eq!(d.git_repo, "https://github.com/ovrclk/akash");
        assert_eq!(d.recommended_version, "v0.16.3");
    }

    #[test]
    fn absent_detail_fields_decode_as_empty() {
        let body = r#"{"chain":{"chain_name":"bare"}}"#;
        let d = parse_project_detail(URL, &ProjectName::from("bare"), body).expect("parse");
        assert!(d.git_repo.is_empty());
        assert!(d.daemon_name.is_empty());
        assert!(d.missing_field().is_some());
    }

    #[test]
    fn detail_without_chain_object_is_decode_error() {
        let err = parse_project_detail(URL, &ProjectName::from("x"), "[]").unwrap_err();
        assert!(matches!(err, RegistryError::Decode { .. }));
    }

    #[test]
    fn detail_url_handles_trailing_slash() {
        let with = HttpRegistry::new("https://r.test/", Duration::from_secs(1));
        let without = HttpRegistry::new("https://r.test", Duration::from_secs(1));
        let name = ProjectName::from("juno");
        assert_eq!(with.detail_url(&name), "https://r.test/juno");
        assert_eq!(without.detail_url(&name), "https://r.test/juno");
    }
}
