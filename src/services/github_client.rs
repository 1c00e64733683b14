//! GitHub API client.
//!
//! Provides HTTP client for the GitHub REST API with authentication and
//! `Link`-header pagination.

use crate::error::AppError;
use crate::models::{PullRequest, PullRequestRef};
use crate::services::api::{DocumentStore, PullRequestApi, ReviewSearch};
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// GitHub API client configuration.
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Base URL of the API (e.g., `https://api.github.com`).
    pub base_url: String,

    /// Token for authentication.
    pub token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// GitHub API client.
///
/// Constructed once per run and shared by reference.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubClientConfig,
}

/// GitHub user from API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

/// GitHub pull request from API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubPullRequest {
    pub number: u64,
    pub user: GitHubUser,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub requested_reviewers: Vec<GitHubUser>,
}

/// GitHub pull request review from API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubReview {
    pub id: u64,
    /// Absent when the reviewing account was deleted.
    pub user: Option<GitHubUser>,
    pub state: String,
}

/// File attached to a gist.
#[derive(Debug, Clone, Deserialize)]
pub struct GistFile {
    pub filename: Option<String>,
    pub raw_url: Option<String>,
    #[serde(default)]
    pub truncated: bool,
    pub content: Option<String>,
}

/// GitHub gist from API.
#[derive(Debug, Clone, Deserialize)]
pub struct Gist {
    pub id: String,
    /// Files keyed by file name, iterated in name order.
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

/// Response from the issue search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
}

/// Body of the request-reviewers call.
#[derive(Debug, Clone, Serialize)]
struct RequestReviewersBody<'a> {
    reviewers: &'a [String],
}

impl GitHubClient {
    /// Create a new GitHub client.
    pub fn new(config: GitHubClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        let token_value = header::HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| AppError::authentication("Invalid token format"))?;
        headers.insert(header::AUTHORIZATION, token_value);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Extract the `rel="next"` target from a `Link` header.
    fn parse_next_link(response: &Response) -> Option<String> {
        response
            .headers()
            .get(header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link)
    }

    /// Handle API response errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))
        } else {
            Err(Self::error_from_response(response, endpoint).await)
        }
    }

    /// Build an error from a non-success response.
    async fn error_from_response(response: Response, endpoint: &str) -> AppError {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return AppError::authentication("GitHub token is invalid or expired");
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        // GitHub returns errors as {"message": "...", "documentation_url": "..."}
        let body_message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(String::from));

        let message = match (status, body_message) {
            (_, Some(msg)) => msg,
            (StatusCode::FORBIDDEN, None) => "Access denied".to_string(),
            (StatusCode::NOT_FOUND, None) => "Resource not found".to_string(),
            (StatusCode::TOO_MANY_REQUESTS, None) => "Rate limit exceeded".to_string(),
            _ => format!("Request failed ({}): {}", status_code, body),
        };

        AppError::github_api_full(message, status_code, endpoint)
    }

    /// Fetch all pages of a list endpoint.
    pub async fn get_all_pages<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<T>, AppError> {
        let mut all_data = Vec::new();
        let mut next = Some(self.api_url(endpoint));
        let mut first = true;

        while let Some(url) = next {
            let mut request = self.client.get(&url);
            // Follow-up URLs from the Link header already carry their query.
            if first {
                request = request.query(&[("per_page", "100")]);
                first = false;
            }

            let response = request.send().await?;
            next = Self::parse_next_link(&response);
            let data = self.handle_response::<Vec<T>>(response, endpoint).await?;

            all_data.extend(data);
        }

        Ok(all_data)
    }

    /// Get a gist by ID.
    pub async fn get_gist(&self, gist_id: &str) -> Result<Gist, AppError> {
        let endpoint = format!("/gists/{}", urlencoding::encode(gist_id));
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// Fetch the raw content behind a gist file's `raw_url`.
    pub async fn get_raw(&self, raw_url: &str) -> Result<String, AppError> {
        let response = self.client.get(raw_url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, raw_url).await);
        }

        response
            .text()
            .await
            .map_err(|e| AppError::internal(format!("Failed to read raw content: {}", e)))
    }

    /// Count issues and pull requests matching a search expression.
    pub async fn search_issue_count(&self, query: &str) -> Result<SearchResult, AppError> {
        let endpoint = "/search/issues";
        let url = self.api_url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("per_page", "1")])
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    /// Get a single pull request.
    pub async fn get_pull_request(
        &self,
        pr: &PullRequestRef,
    ) -> Result<GitHubPullRequest, AppError> {
        let endpoint = format!("/repos/{}/{}/pulls/{}", pr.owner, pr.repo, pr.number);
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// List submitted reviews on a pull request.
    pub async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<GitHubReview>, AppError> {
        let endpoint = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            pr.owner, pr.repo, pr.number
        );
        self.get_all_pages(&endpoint).await
    }

    /// Request reviews from the given users.
    pub async fn request_reviewers(
        &self,
        pr: &PullRequestRef,
        usernames: &[String],
    ) -> Result<(), AppError> {
        let endpoint = format!(
            "/repos/{}/{}/pulls/{}/requested_reviewers",
            pr.owner, pr.repo, pr.number
        );
        let url = self.api_url(&endpoint);

        let response = self
            .client
            .post(&url)
            .json(&RequestReviewersBody {
                reviewers: usernames,
            })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response, &endpoint).await)
        }
    }
}

/// Find the `rel="next"` URL in a `Link` header value.
fn next_link(header_value: &str) -> Option<String> {
    header_value.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

#[async_trait]
impl DocumentStore for GitHubClient {
    async fn first_document(&self, document_id: &str) -> Result<String, AppError> {
        let gist = self.get_gist(document_id).await?;

        let (name, file) = gist.files.into_iter().next().ok_or_else(|| {
            AppError::config_fetch_for("gist has no files attached", document_id)
        })?;

        match (file.truncated, file.content, file.raw_url) {
            (false, Some(content), _) => Ok(content),
            (_, _, Some(raw_url)) => {
                log::debug!("[config] gist file '{}' is truncated, fetching raw", name);
                self.get_raw(&raw_url).await
            }
            _ => Err(AppError::config_fetch_for(
                format!("gist file '{}' has no content", name),
                document_id,
            )),
        }
    }
}

#[async_trait]
impl ReviewSearch for GitHubClient {
    async fn count(&self, query: &str) -> Result<u64, AppError> {
        let result = self.search_issue_count(query).await?;
        if result.incomplete_results {
            log::warn!("[load] search results incomplete for '{}'", query);
        }
        Ok(result.total_count)
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequest, AppError> {
        let details = self.get_pull_request(pr).await?;
        let reviews = self.list_reviews(pr).await?;

        let mut reviewers: Vec<String> = Vec::new();
        for login in reviews.into_iter().filter_map(|r| r.user.map(|u| u.login)) {
            if !reviewers.contains(&login) {
                reviewers.push(login);
            }
        }

        Ok(PullRequest {
            author: details.user.login,
            draft: details.draft,
            requested_reviewers: details
                .requested_reviewers
                .into_iter()
                .map(|u| u.login)
                .collect(),
            reviewers,
        })
    }

    async fn request_reviewers(
        &self,
        pr: &PullRequestRef,
        usernames: &[String],
    ) -> Result<(), AppError> {
        GitHubClient::request_reviewers(self, pr, usernames).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_construction() {
        let client = GitHubClient::new(GitHubClientConfig {
            base_url: "https://github.example.com/api/v3/".to_string(),
            token: "test-token".to_string(),
            timeout_secs: 30,
        })
        .unwrap();

        assert_eq!(
            client.api_url("/search/issues"),
            "https://github.example.com/api/v3/search/issues"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let err = GitHubClient::new(GitHubClientConfig {
            token: "bad\ntoken".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Authentication { .. }));
    }

    #[test]
    fn test_next_link_parsing() {
        let header = r#"<https://api.github.com/repositories/1/pulls/2/reviews?page=2>; rel="next", <https://api.github.com/repositories/1/pulls/2/reviews?page=5>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/pulls/2/reviews?page=2")
        );

        let last_page = r#"<https://api.github.com/x?page=1>; rel="prev", <https://api.github.com/x?page=1>; rel="first""#;
        assert_eq!(next_link(last_page), None);
    }

    #[test]
    fn test_gist_files_iterate_in_name_order() {
        let gist: Gist = serde_json::from_str(
            r#"{"id": "abc", "files": {
                "z.yml": {"filename": "z.yml", "content": "z", "truncated": false},
                "a.yml": {"filename": "a.yml", "content": "a", "truncated": false}
            }}"#,
        )
        .unwrap();

        let first = gist.files.keys().next().unwrap();
        assert_eq!(first, "a.yml");
    }

    #[test]
    fn test_pull_request_deserialization() {
        let pr: GitHubPullRequest = serde_json::from_str(
            r#"{"number": 7, "user": {"login": "bob", "id": 1},
                "draft": true, "requested_reviewers": [{"login": "carol"}]}"#,
        )
        .unwrap();
        assert_eq!(pr.user.login, "bob");
        assert!(pr.draft);
        assert_eq!(pr.requested_reviewers[0].login, "carol");
    }
}
