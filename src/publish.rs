//! Publish service: commits the current data files to a GitHub repository.
//!
//! Uses the git data API so all three files land in one commit: resolve the
//! branch head, create blobs for players/matches/meta, build a tree on top
//! of the head commit, commit it, and fast-forward the branch ref.

use crate::models::{Match, Player};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum PublishError {
    Http(reqwest::Error),
    Json(serde_json::Error),
    /// GitHub rejected a request.
    Api {
        status: u16,
        body: String,
    },
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Http(e) => write!(f, "publish request failed: {}", e),
            PublishError::Json(e) => write!(f, "failed to encode data files: {}", e),
            PublishError::Api { status, body } => {
                write!(f, "GitHub API error {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for PublishError {}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        PublishError::Http(e)
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(e: serde_json::Error) -> Self {
        PublishError::Json(e)
    }
}

/// Target repository and credentials.
#[derive(Clone, Debug)]
pub struct PublishConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl PublishConfig {
    /// Build from `GITHUB_TOKEN` / `GITHUB_OWNER` / `GITHUB_REPO` /
    /// `GITHUB_BRANCH` (branch defaults to `main`); `None` when any required
    /// variable is unset.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            token: std::env::var("GITHUB_TOKEN").ok()?,
            owner: std::env::var("GITHUB_OWNER").ok()?,
            repo: std::env::var("GITHUB_REPO").ok()?,
            branch: std::env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string()),
        })
    }
}

/// Result of a successful publish.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub sha: String,
    pub url: String,
    pub message: String,
    pub committed_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ShaObject {
    sha: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: ShaObject,
}

#[derive(Deserialize)]
struct CommitResponse {
    tree: ShaObject,
}

#[derive(Serialize)]
struct TreeEntry {
    path: &'static str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    sha: String,
}

pub struct Publisher {
    config: PublishConfig,
    client: reqwest::Client,
}

impl Publisher {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Commit the full snapshot as `data/players.json`, `data/matches.json`,
    /// and `data/meta.json` with the given change description.
    pub async fn publish(
        &self,
        players: &[Player],
        matches: &[Match],
        message: &str,
    ) -> Result<PublishReceipt, PublishError> {
        let c = &self.config;
        log::info!("Publishing to {}/{} ({})", c.owner, c.repo, c.branch);

        let head: RefResponse = self
            .get(&format!("git/ref/heads/{}", c.branch))
            .await?;
        let head_sha = head.object.sha;
        let base: CommitResponse = self.get(&format!("git/commits/{}", head_sha)).await?;

        let now = Utc::now();
        let meta = serde_json::json!({ "updated": now.to_rfc3339() });
        let players_sha = self
            .create_blob(serde_json::to_string_pretty(players)?)
            .await?;
        let matches_sha = self
            .create_blob(serde_json::to_string_pretty(matches)?)
            .await?;
        let meta_sha = self
            .create_blob(serde_json::to_string_pretty(&meta)?)
            .await?;

        let tree: ShaObject = self
            .post(
                "git/trees",
                &serde_json::json!({
                    "base_tree": base.tree.sha,
                    "tree": [
                        tree_entry("data/players.json", players_sha),
                        tree_entry("data/matches.json", matches_sha),
                        tree_entry("data/meta.json", meta_sha),
                    ],
                }),
            )
            .await?;

        let full_message = format!("{}\n\nPublished via admin panel", message);
        let commit: ShaObject = self
            .post(
                "git/commits",
                &serde_json::json!({
                    "message": full_message,
                    "tree": tree.sha,
                    "parents": [head_sha],
                }),
            )
            .await?;

        let _: RefResponse = self
            .patch(
                &format!("git/refs/heads/{}", c.branch),
                &serde_json::json!({ "sha": commit.sha }),
            )
            .await?;

        log::info!("Published commit {}", commit.sha);
        Ok(PublishReceipt {
            url: format!(
                "https://github.com/{}/{}/commit/{}",
                c.owner, c.repo, commit.sha
            ),
            sha: commit.sha,
            message: message.to_string(),
            committed_at: now,
        })
    }

    async fn create_blob(&self, content: String) -> Result<String, PublishError> {
        let blob: ShaObject = self
            .post(
                "git/blobs",
                &serde_json::json!({ "content": content, "encoding": "utf-8" }),
            )
            .await?;
        Ok(blob.sha)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/{}",
            self.config.owner, self.config.repo, path
        )
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PublishError> {
        let req = self.client.get(self.url(path));
        self.send(req).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, PublishError> {
        let req = self.client.post(self.url(path)).json(body);
        self.send(req).await
    }

    async fn patch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, PublishError> {
        let req = self.client.patch(self.url(path)).json(body);
        self.send(req).await
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, PublishError> {
        let resp = req
            .bearer_auth(&self.config.token)
            .header(reqwest::header::USER_AGENT, "pool-ladder-web")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}

fn tree_entry(path: &'static str, sha: String) -> TreeEntry {
    TreeEntry {
        path,
        mode: "100644",
        kind: "blob",
        sha,
    }
}
