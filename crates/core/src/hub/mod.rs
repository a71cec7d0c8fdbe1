//! Remote model index client (HuggingFace-compatible hub API).

pub mod files;
pub mod http;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::HubConfig;
use crate::error::{IndexError, SetupError};
use crate::models::CandidateFile;

pub use files::{ShardPosition, TreeEntry};
pub use http::{HttpBackend, ReqwestBackend};

/// Format marker prepended to search terms.
pub const SEARCH_PREFIX: &str = "GGUF";
/// A prefixed search with this many hits or fewer triggers a broader one.
const FALLBACK_THRESHOLD: usize = 3;
const FALLBACK_LIMIT: usize = 6;

/// What the model manager needs from a model hub.
#[async_trait]
pub trait ModelIndex: Send + Sync {
    /// Repository ids matching `term`, most relevant first.
    async fn search_models(&self, term: &str, limit: usize) -> Result<Vec<String>, IndexError>;

    /// Selectable model files of a repository. Never returns an empty list.
    async fn list_files(&self, repo_id: &str) -> Result<Vec<CandidateFile>, IndexError>;

    /// Direct download URL of a file in a repository.
    fn download_url(&self, repo_id: &str, path: &str) -> String;
}

/// Search entries carry `id`; older mirrors only send `modelId`.
#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Option<String>,
    #[serde(rename = "modelId")]
    model_id: Option<String>,
}

impl SearchHit {
    fn into_id(self) -> Option<String> {
        self.id.or(self.model_id)
    }
}

pub struct HubClient<B = ReqwestBackend> {
    base: Url,
    backend: B,
}

impl HubClient<ReqwestBackend> {
    pub fn new(config: &HubConfig) -> Result<Self, SetupError> {
        let backend = ReqwestBackend::new(config)?;
        Self::with_backend(&config.endpoint, backend)
    }
}

impl<B: HttpBackend> HubClient<B> {
    pub fn with_backend(endpoint: &str, backend: B) -> Result<Self, SetupError> {
        let base = Url::parse(endpoint.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SetupError::Endpoint(endpoint.to_string()))?;
        Ok(Self { base, backend })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn url_with_segments<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn search_url(&self, query: &str, limit: usize) -> Url {
        let mut url = self.url_with_segments(["api", "models"]);
        url.query_pairs_mut()
            .append_pair("search", query)
            .append_pair("limit", &limit.to_string());
        url
    }

    pub fn tree_url(&self, repo_id: &str) -> Url {
        let segments = ["api", "models"]
            .into_iter()
            .chain(repo_id.split('/'))
            .chain(["tree", "main"]);
        let mut url = self.url_with_segments(segments);
        url.query_pairs_mut().append_pair("recursive", "true");
        url
    }

    pub fn resolve_url(&self, repo_id: &str, path: &str) -> Url {
        let segments = repo_id
            .split('/')
            .chain(["resolve", "main"])
            .chain(path.split('/'));
        self.url_with_segments(segments)
    }

    async fn search_ids(&self, term: &str, query: &str, limit: usize) -> Result<Vec<String>, IndexError> {
        let url = self.search_url(query, limit);
        let hits: Vec<SearchHit> =
            self.backend
                .get_json(&url)
                .await
                .map_err(|source| IndexError::Search {
                    term: term.to_string(),
                    source,
                })?;
        Ok(hits.into_iter().filter_map(SearchHit::into_id).collect())
    }
}

#[async_trait]
impl<B: HttpBackend> ModelIndex for HubClient<B> {
    async fn search_models(&self, term: &str, limit: usize) -> Result<Vec<String>, IndexError> {
        let term = term.trim();
        let prefixed = format!("{SEARCH_PREFIX} {term}");
        let mut ids = self.search_ids(term, &prefixed, limit).await?;

        if ids.len() <= FALLBACK_THRESHOLD {
            tracing::debug!(found = ids.len(), "few prefixed results, broadening search");
            let broader = match self.search_ids(term, term, FALLBACK_LIMIT).await {
                Ok(broader) => broader,
                // Nothing to fall back on: report the failure.
                Err(e) if ids.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "broadened search failed, keeping prefixed results");
                    Vec::new()
                }
            };
            for id in broader {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    async fn list_files(&self, repo_id: &str) -> Result<Vec<CandidateFile>, IndexError> {
        let url = self.tree_url(repo_id);
        let entries: Vec<TreeEntry> =
            self.backend
                .get_json(&url)
                .await
                .map_err(|source| IndexError::ListFiles {
                    repo_id: repo_id.to_string(),
                    source,
                })?;

        let candidates = files::model_candidates(entries);
        if candidates.is_empty() {
            return Err(IndexError::NoFiles {
                repo_id: repo_id.to_string(),
                url: url.to_string(),
            });
        }
        Ok(candidates)
    }

    fn download_url(&self, repo_id: &str, path: &str) -> String {
        self.resolve_url(repo_id, path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::http::testing::{CannedResponse, FakeBackend};
    use super::*;
    use crate::error::HttpError;
    use serde_json::json;

    const HUB: &str = "https://huggingface.co";

    fn client(backend: FakeBackend) -> HubClient<FakeBackend> {
        HubClient::with_backend(HUB, backend).unwrap()
    }

    fn hits(ids: &[&str]) -> serde_json::Value {
        json!(ids.iter().map(|id| json!({"id": id, "downloads": 10})).collect::<Vec<_>>())
    }

    #[test]
    fn test_urls() {
        let client = client(FakeBackend::new());

        assert_eq!(
            client.search_url("GGUF tiny llama", 20).as_str(),
            "https://huggingface.co/api/models?search=GGUF+tiny+llama&limit=20"
        );
        assert_eq!(
            client.tree_url("TheBloke/Llama-2-7B-GGUF").as_str(),
            "https://huggingface.co/api/models/TheBloke/Llama-2-7B-GGUF/tree/main?recursive=true"
        );
        assert_eq!(
            client.download_url("org/tinyllama-gguf", "Q4/a-q4_k.gguf"),
            "https://huggingface.co/org/tinyllama-gguf/resolve/main/Q4/a-q4_k.gguf"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_and_prefix() {
        let client = HubClient::with_backend("http://mirror.local/hf/", FakeBackend::new()).unwrap();
        assert_eq!(
            client.download_url("o/m", "m.gguf"),
            "http://mirror.local/hf/o/m/resolve/main/m.gguf"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = HubClient::with_backend("not a url", FakeBackend::new());
        assert!(matches!(result, Err(SetupError::Endpoint(_))));
    }

    #[tokio::test]
    async fn test_search_many_results_single_request() {
        let backend = FakeBackend::new().with_json(
            "search=GGUF",
            hits(&["a/one-GGUF", "b/two-GGUF", "c/three-GGUF", "d/four-GGUF"]),
        );
        let client = client(backend);

        let ids = client.search_models("llama", 20).await.unwrap();

        assert_eq!(ids, vec!["a/one-GGUF", "b/two-GGUF", "c/three-GGUF", "d/four-GGUF"]);
        assert_eq!(client.backend().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_search_broadens_and_dedups() {
        let backend = FakeBackend::new()
            .with_json("search=GGUF", hits(&["org/tinyllama-gguf", "org2/tiny-chat"]))
            .with_json(
                "search=tinyllama",
                hits(&["org2/tiny-chat", "org3/TinyLlama-1.1B", "org/tinyllama-gguf"]),
            );
        let client = client(backend);

        let ids = client.search_models("tinyllama", 20).await.unwrap();

        assert_eq!(
            ids,
            vec!["org/tinyllama-gguf", "org2/tiny-chat", "org3/TinyLlama-1.1B"]
        );
        let requests = client.backend().requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].ends_with("search=tinyllama&limit=6"));
    }

    #[tokio::test]
    async fn test_search_accepts_model_id_field() {
        let backend = FakeBackend::new().with_json(
            "search=",
            json!([
                {"modelId": "old/mirror-GGUF"},
                {"id": "new/api-GGUF", "modelId": "new/api-GGUF"},
                {"downloads": 3}
            ]),
        );
        let client = client(backend);

        let ids = client.search_models("mirror", 20).await.unwrap();

        assert_eq!(ids, vec!["old/mirror-GGUF", "new/api-GGUF"]);
    }

    #[tokio::test]
    async fn test_broadened_search_failure_keeps_first_results() {
        let backend = FakeBackend::new()
            .with_json("search=GGUF", hits(&["org/tinyllama-gguf"]))
            .with_response("search=tinyllama", CannedResponse::Status(503));
        let client = client(backend);

        let ids = client.search_models("tinyllama", 20).await.unwrap();

        assert_eq!(ids, vec!["org/tinyllama-gguf"]);
        assert_eq!(client.backend().requests().len(), 2);
    }

    #[tokio::test]
    async fn test_broadened_search_failure_without_results_is_error() {
        let backend = FakeBackend::new()
            .with_json("search=GGUF", hits(&[]))
            .with_response("search=tinyllama", CannedResponse::Status(503));
        let client = client(backend);

        let err = client.search_models("tinyllama", 20).await.unwrap_err();

        assert!(matches!(err, IndexError::Search { .. }));
        assert!(err.url().ends_with("search=tinyllama&limit=6"));
    }

    #[tokio::test]
    async fn test_search_failure_is_search_error() {
        let backend = FakeBackend::new().with_response("api/models", CannedResponse::Status(503));
        let client = client(backend);

        let err = client.search_models("llama", 20).await.unwrap_err();

        match err {
            IndexError::Search { term, source } => {
                assert_eq!(term, "llama");
                assert!(matches!(source, HttpError::Status { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_files() {
        let backend = FakeBackend::new().with_json(
            "tree/main",
            json!([
                {"type": "file", "path": "README.md", "size": 1000},
                {"type": "directory", "path": "Q8_0", "size": 0},
                {"type": "file", "path": "a-q4_k.gguf", "size": 1_288_490_189_u64},
                {"type": "file", "path": "Q8_0/a-q8-00001-of-00002.gguf", "size": 1_073_741_824_u64},
                {"type": "file", "path": "Q8_0/a-q8-00002-of-00002.gguf", "size": 1_073_741_824_u64}
            ]),
        );
        let client = client(backend);

        let files = client.list_files("org/tinyllama-gguf").await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "a-q4_k.gguf");
        assert_eq!(files[0].size_gb, 1.2);
        assert_eq!(files[1].path, "Q8_0/a-q8-00001-of-00002.gguf");
    }

    #[tokio::test]
    async fn test_list_files_none_is_distinct() {
        let backend = FakeBackend::new().with_json(
            "tree/main",
            json!([{"type": "file", "path": "model.safetensors", "size": 10}]),
        );
        let client = client(backend);

        let err = client.list_files("org/safetensors-only").await.unwrap_err();

        assert!(matches!(err, IndexError::NoFiles { .. }));
        assert!(err.url().contains("org/safetensors-only/tree/main"));
    }

    #[tokio::test]
    async fn test_list_files_request_failure() {
        let client = client(FakeBackend::new());

        let err = client.list_files("org/missing").await.unwrap_err();

        assert!(matches!(err, IndexError::ListFiles { .. }));
    }
}
