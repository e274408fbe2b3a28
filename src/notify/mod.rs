//! GitHub commit-status notification
//!
//! A notification sink, not build logic: the build command posts a
//! pending status before iterating and a terminal status afterwards.
//! Every failure on this path is logged and swallowed by the caller; a
//! broken notifier must never change a build's outcome.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::config::NotifyConfig;
use crate::error::NotifyError;

/// PR context saved next to the manifest by the preparation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrInfo {
    pub owner: String,
    pub repo: String,
    pub sha: String,
    pub pr_number: u64,
}

impl PrInfo {
    /// Read the PR context from the build directory, if present.
    ///
    /// A missing file is the normal "no notification" case and yields
    /// `Ok(None)`; an unreadable or malformed file is an error the
    /// caller is expected to log and ignore.
    pub fn load(build_dir: &Path) -> Result<Option<Self>, NotifyError> {
        let path = build_dir.join(defaults::PR_INFO_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| NotifyError::IoError {
            path: path.clone(),
            error: e.to_string(),
        })?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| NotifyError::ParseError {
                path,
                error: e.to_string(),
            })
    }
}

/// Terminal states a commit status can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Pending,
    Success,
    Failure,
}

impl BuildState {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildState::Pending => "pending",
            BuildState::Success => "success",
            BuildState::Failure => "failure",
        }
    }
}

/// Source of the bearer credential used by the notifier.
///
/// The static-token impl covers the current contract; the seam admits
/// richer providers without touching the notifier.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Result<String, NotifyError>;
}

/// A fixed token, typically from the environment.
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Result<String, NotifyError> {
        Ok(self.0.clone())
    }
}

/// Posts commit statuses for one repository/commit.
pub struct StatusNotifier {
    client: reqwest::Client,
    api_root: String,
    build_url: Option<String>,
    agent: String,
    credentials: Box<dyn TokenProvider>,
}

impl StatusNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_root: config.api_root,
            build_url: config.build_url,
            agent: config.agent,
            credentials: Box::new(StaticToken(config.token)),
        }
    }

    /// Replace the credential source.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Box<dyn TokenProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Label of the machine running the build.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Post one status to the commit named by `pr`.
    pub async fn post_status(
        &self,
        pr: &PrInfo,
        state: BuildState,
        description: &str,
    ) -> Result<(), NotifyError> {
        let token = self.credentials.token()?;
        let url = format!(
            "{}/repos/{}/{}/statuses/{}",
            self.api_root, pr.owner, pr.repo, pr.sha
        );

        let mut body = serde_json::json!({
            "state": state.as_str(),
            "description": description,
            "context": format!("stackforge ({})", self.agent),
        });
        if let Some(build_url) = &self.build_url {
            body["target_url"] = serde_json::Value::String(build_url.clone());
        }

        tracing::debug!(state = state.as_str(), %url, "posting commit status");
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "stackforge")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pr() -> PrInfo {
        PrInfo {
            owner: "octo".to_string(),
            repo: "stack".to_string(),
            sha: "abc123".to_string(),
            pr_number: 41,
        }
    }

    fn notifier(api_root: String) -> StatusNotifier {
        StatusNotifier::new(NotifyConfig {
            token: "sekrit".to_string(),
            build_url: Some("https://ci.example.org/run/7".to_string()),
            agent: "worker-3".to_string(),
            api_root,
        })
    }

    #[tokio::test]
    async fn test_post_status_hits_commit_status_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/stack/statuses/abc123"))
            .and(header("Authorization", "token sekrit"))
            .and(body_partial_json(serde_json::json!({
                "state": "pending",
                "description": "Build started on worker-3",
                "context": "stackforge (worker-3)",
                "target_url": "https://ci.example.org/run/7",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        notifier(server.uri())
            .post_status(&pr(), BuildState::Pending, "Build started on worker-3")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_status_omits_target_url_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/stack/statuses/abc123"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let config = NotifyConfig {
            token: "sekrit".to_string(),
            build_url: None,
            agent: "worker-3".to_string(),
            api_root: server.uri(),
        };
        StatusNotifier::new(config)
            .post_status(&pr(), BuildState::Success, "Build succeeded on worker-3")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("target_url").is_none());
        assert_eq!(body["state"], "success");
    }

    #[tokio::test]
    async fn test_post_status_surfaces_unexpected_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("no such sha"))
            .mount(&server)
            .await;

        let result = notifier(server.uri())
            .post_status(&pr(), BuildState::Failure, "Build failed on worker-3")
            .await;
        match result {
            Err(NotifyError::UnexpectedStatus { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "no such sha");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_pr_info_absent_file_disables_notification() {
        let temp = TempDir::new().unwrap();
        assert_eq!(PrInfo::load(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_pr_info_round_trips() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("pr_info.json"),
            r#"{"owner":"octo","repo":"stack","sha":"abc123","pr_number":41}"#,
        )
        .unwrap();
        assert_eq!(PrInfo::load(temp.path()).unwrap(), Some(pr()));
    }

    #[test]
    fn test_pr_info_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("pr_info.json"), "{not json").unwrap();
        assert!(matches!(
            PrInfo::load(temp.path()),
            Err(NotifyError::ParseError { .. })
        ));
    }

    #[test]
    fn test_build_state_names() {
        assert_eq!(BuildState::Pending.as_str(), "pending");
        assert_eq!(BuildState::Success.as_str(), "success");
        assert_eq!(BuildState::Failure.as_str(), "failure");
    }
}
