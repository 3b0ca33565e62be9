use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::Deserialize;

use crate::config::EnrichmentConfig;
use crate::models::EncyclopediaSummary;

/// Fixed suffixes appended to the label, in order, to steer away from
/// disambiguation pages (e.g. "Loggerhead" the place vs the turtle).
const ALT_QUERY_SUFFIXES: [&str; 3] = ["sea turtle", "animal", "species"];

/// Client for the encyclopedia search index and REST page-summary endpoint.
#[derive(Clone)]
pub struct WikiClient {
    client: Client,
    api_url: String,
    rest_url: String,
    user_agent: String,
}

impl WikiClient {
    pub fn new(config: &EnrichmentConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.wiki_api_url.clone(),
            rest_url: config.wiki_rest_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Best-effort lookup of the article summary for a canonical label.
    /// Never fails: an empty or "Unknown" label, or any network error,
    /// yields an empty-prose summary the pipeline treats as valid input.
    pub async fn resolve(&self, label: &str) -> EncyclopediaSummary {
        if label.trim().is_empty() || label == "Unknown" {
            return EncyclopediaSummary::default();
        }

        // The search index picks the best page title; when it has no hit
        // (or is down) the label itself is tried as a title.
        let title = match self.search_title(label).await {
            Ok(Some(title)) => title,
            Ok(None) => label.to_string(),
            Err(err) => {
                tracing::debug!(label, error = %err, "encyclopedia search failed");
                label.to_string()
            }
        };

        let mut summary = match self.page_summary(&title).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(label, error = %err, "encyclopedia summary fetch failed");
                return EncyclopediaSummary::default();
            }
        };

        if summary.is_disambiguation {
            for suffix in ALT_QUERY_SUFFIXES {
                let term = format!("{label} {suffix}");
                let alt_title = match self.search_title(&term).await {
                    Ok(Some(title)) => title,
                    _ => continue,
                };
                let alt = match self.page_summary(&alt_title).await {
                    Ok(alt) => alt,
                    Err(_) => continue,
                };
                if !alt.is_disambiguation && !alt.extract.trim().is_empty() {
                    summary = alt;
                    break;
                }
            }
        }

        summary
    }

    async fn search_title(&self, query: &str) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct SearchResp {
            query: Option<SearchQuery>,
        }

        #[derive(Deserialize)]
        struct SearchQuery {
            search: Vec<SearchHit>,
        }

        #[derive(Deserialize)]
        struct SearchHit {
            title: String,
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("format", "json"),
            ])
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("failed to call encyclopedia search endpoint")?
            .error_for_status()
            .context("encyclopedia search returned non-success status")?
            .json::<SearchResp>()
            .await
            .context("failed to decode encyclopedia search response")?;

        Ok(response
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title))
    }

    async fn page_summary(&self, title: &str) -> Result<EncyclopediaSummary> {
        #[derive(Deserialize)]
        struct SummaryResp {
            #[serde(rename = "type")]
            page_type: Option<String>,
            title: Option<String>,
            extract: Option<String>,
            wikibase_item: Option<String>,
        }

        let url = format!(
            "{}/page/summary/{}",
            self.rest_url,
            urlencoding::encode(title)
        );
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("failed to call encyclopedia summary endpoint")?
            .error_for_status()
            .context("encyclopedia summary returned non-success status")?
            .json::<SummaryResp>()
            .await
            .context("failed to decode encyclopedia summary response")?;

        Ok(EncyclopediaSummary {
            title: response.title.unwrap_or_default(),
            extract: response.extract.unwrap_or_default(),
            is_disambiguation: response.page_type.as_deref() == Some("disambiguation"),
            entity_id: response.wikibase_item,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn test_client(server_url: &str) -> WikiClient {
        WikiClient::new(&EnrichmentConfig {
            wiki_api_url: format!("{server_url}/w/api.php"),
            wiki_rest_url: format!("{server_url}/api/rest_v1"),
            wikidata_base_url: server_url.to_string(),
            user_agent: "ecolens-test/0.1".to_string(),
        })
    }

    fn search_body(title: &str) -> String {
        json!({"query": {"search": [{"title": title}]}}).to_string()
    }

    #[tokio::test]
    async fn empty_and_unknown_labels_resolve_without_network() {
        // No server: any request would fail, so an empty result proves the
        // short-circuit.
        let client = test_client("http://127.0.0.1:9");
        assert!(client.resolve("").await.extract.is_empty());
        assert!(client.resolve("Unknown").await.extract.is_empty());
    }

    #[tokio::test]
    async fn network_failure_yields_empty_summary_not_error() {
        let server = mockito::Server::new_async().await;
        // No mocks registered: every path answers 501.
        let client = test_client(&server.url());
        let summary = client.resolve("loggerhead").await;
        assert!(summary.extract.is_empty());
        assert!(summary.entity_id.is_none());
    }

    #[tokio::test]
    async fn disambiguation_is_retried_with_alternate_terms() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("list".to_string(), "search".to_string()),
                Matcher::UrlEncoded("srsearch".to_string(), "loggerhead".to_string()),
            ]))
            .with_status(200)
            .with_body(search_body("Loggerhead"))
            .create_async()
            .await;

        let _disambig = server
            .mock("GET", "/api/rest_v1/page/summary/Loggerhead")
            .with_status(200)
            .with_body(
                json!({
                    "type": "disambiguation",
                    "title": "Loggerhead",
                    "extract": "Loggerhead may refer to:"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let _alt_search = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("list".to_string(), "search".to_string()),
                Matcher::UrlEncoded(
                    "srsearch".to_string(),
                    "loggerhead sea turtle".to_string(),
                ),
            ]))
            .with_status(200)
            .with_body(search_body("Loggerhead sea turtle"))
            .create_async()
            .await;

        let _alt_summary = server
            .mock("GET", "/api/rest_v1/page/summary/Loggerhead%20sea%20turtle")
            .with_status(200)
            .with_body(
                json!({
                    "type": "standard",
                    "title": "Loggerhead sea turtle",
                    "extract": "The loggerhead sea turtle (Caretta caretta) is a \
                                species of oceanic turtle.",
                    "wikibase_item": "Q223847"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let summary = client.resolve("loggerhead").await;

        assert!(!summary.is_disambiguation);
        assert_eq!(summary.title, "Loggerhead sea turtle");
        assert!(summary.extract.contains("Caretta caretta"));
        assert_eq!(summary.entity_id.as_deref(), Some("Q223847"));
    }

    #[tokio::test]
    async fn disambiguation_kept_when_all_alternates_fail() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded(
                "srsearch".to_string(),
                "loggerhead".to_string(),
            ))
            .with_status(200)
            .with_body(search_body("Loggerhead"))
            .create_async()
            .await;

        let _disambig = server
            .mock("GET", "/api/rest_v1/page/summary/Loggerhead")
            .with_status(200)
            .with_body(
                json!({
                    "type": "disambiguation",
                    "title": "Loggerhead",
                    "extract": "Loggerhead may refer to:"
                })
                .to_string(),
            )
            .create_async()
            .await;

        // Alternate searches fall through to 501 and are skipped.
        let client = test_client(&server.url());
        let summary = client.resolve("loggerhead").await;

        assert!(summary.is_disambiguation);
        assert_eq!(summary.title, "Loggerhead");
    }

    #[tokio::test]
    async fn label_without_search_hit_is_tried_as_title() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded(
                "srsearch".to_string(),
                "red fox".to_string(),
            ))
            .with_status(200)
            .with_body(json!({"query": {"search": []}}).to_string())
            .create_async()
            .await;

        let _summary = server
            .mock("GET", "/api/rest_v1/page/summary/red%20fox")
            .with_status(200)
            .with_body(
                json!({
                    "type": "standard",
                    "title": "Red fox",
                    "extract": "The red fox (Vulpes vulpes) is the largest of the true foxes."
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let summary = client.resolve("red fox").await;
        assert_eq!(summary.title, "Red fox");
    }
}
