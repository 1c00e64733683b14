//! Reviewer roster loading.
//!
//! The roster is read once per run, either from the remote document store or
//! from a local file, and parsed by the same validating parser.

use crate::error::AppError;
use crate::models::ReviewerConfig;
use crate::services::api::DocumentStore;
use crate::services::retry::RetryPolicy;
use std::path::Path;

/// Where the roster document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Remote document identifier (a gist id).
    Remote(String),
    /// Local file path.
    File(std::path::PathBuf),
}

impl ConfigSource {
    /// Pick the source from CLI options; exactly one must be given.
    pub fn from_options(
        document_id: Option<String>,
        file: Option<std::path::PathBuf>,
    ) -> Result<Self, AppError> {
        match (document_id, file) {
            (Some(id), None) if !id.trim().is_empty() => Ok(Self::Remote(id)),
            (None, Some(path)) => Ok(Self::File(path)),
            (Some(_), Some(_)) => Err(AppError::invalid_input(
                "pass either a config gist or a config file, not both",
            )),
            _ => Err(AppError::invalid_input_field(
                "a config gist id or config file is required",
                "config-gist",
            )),
        }
    }
}

/// Fetch and parse the roster from `source`.
pub async fn load_config(
    store: &dyn DocumentStore,
    source: &ConfigSource,
    retry: &RetryPolicy,
) -> Result<ReviewerConfig, AppError> {
    match source {
        ConfigSource::Remote(id) => fetch_config(store, id, retry).await,
        ConfigSource::File(path) => read_config_file(path).await,
    }
}

/// Fetch the first document attached to `document_id` and parse it.
pub async fn fetch_config(
    store: &dyn DocumentStore,
    document_id: &str,
    retry: &RetryPolicy,
) -> Result<ReviewerConfig, AppError> {
    log::info!("[config] fetching roster document {}", document_id);

    let content = retry
        .run("config fetch", move || store.first_document(document_id))
        .await
        .map_err(|e| match e {
            AppError::ConfigFetch { .. } | AppError::Authentication { .. } => e,
            other => AppError::config_fetch_for(other.to_string(), document_id),
        })?;

    let config = ReviewerConfig::parse(&content)?;
    log_summary(&config);
    Ok(config)
}

/// Read and parse a roster file from disk.
pub async fn read_config_file(path: &Path) -> Result<ReviewerConfig, AppError> {
    log::info!("[config] reading roster file {}", path.display());

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::config_fetch_for(format!("Failed to read file: {}", e), path.display().to_string())
    })?;

    let config = ReviewerConfig::parse(&content)?;
    log_summary(&config);
    Ok(config)
}

fn log_summary(config: &ReviewerConfig) {
    log::info!(
        "[config] {} team(s), {} mentorship group(s), {} mentor pair(s)",
        config.teams.len(),
        config.mentorship_groups.len(),
        config.mentors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyStore {
        failures_left: AtomicU32,
        content: &'static str,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn first_document(&self, _document_id: &str) -> Result<String, AppError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::github_api_full("Service Unavailable", 503, "/gists/x"));
            }
            Ok(self.content.to_string())
        }
    }

    #[test]
    fn test_source_selection() {
        assert_eq!(
            ConfigSource::from_options(Some("abc".into()), None).unwrap(),
            ConfigSource::Remote("abc".into())
        );
        assert!(matches!(
            ConfigSource::from_options(None, Some("roster.yml".into())).unwrap(),
            ConfigSource::File(_)
        ));
        assert!(ConfigSource::from_options(None, None).is_err());
        assert!(ConfigSource::from_options(Some(" ".into()), None).is_err());
        assert!(ConfigSource::from_options(Some("abc".into()), Some("r.yml".into())).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_transient_failures() {
        let store = FlakyStore {
            failures_left: AtomicU32::new(2),
            content: "teams:\n  core: [a, b]\n",
        };
        let config = fetch_config(&store, "x", &RetryPolicy::default()).await.unwrap();
        assert_eq!(config.teams[0].members, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_is_config_fetch_error() {
        let store = FlakyStore {
            failures_left: AtomicU32::new(10),
            content: "",
        };
        let err = fetch_config(&store, "x", &RetryPolicy::default())
            .await
            .unwrap_err();
        match err {
            AppError::ConfigFetch { document_id, .. } => assert_eq!(document_id.as_deref(), Some("x")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_document_is_config_parse_error() {
        let store = FlakyStore {
            failures_left: AtomicU32::new(0),
            content: "teams: [oops",
        };
        let err = fetch_config(&store, "x", &RetryPolicy::none()).await.unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }));
    }

    #[tokio::test]
    async fn test_read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.yml");
        std::fs::write(&path, "mentors:\n  bob: alice\n").unwrap();

        let config = read_config_file(&path).await.unwrap();
        assert_eq!(config.mentor_of("bob"), Some("alice"));

        let err = read_config_file(&dir.path().join("missing.yml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigFetch { .. }));
    }
}
