use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde_json::Value;

use crate::config::EnrichmentConfig;

/// Linked-data property holding an entity's conservation status.
const STATUS_PROPERTY: &str = "P141";

/// Client for the linked-data store, used only as a fallback source for
/// conservation status when the article prose carried none.
#[derive(Clone)]
pub struct WikidataClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl WikidataClient {
    pub fn new(config: &EnrichmentConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.wikidata_base_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Resolves the English label of the entity's conservation-status claim.
    /// Returns "" on any fetch failure or missing claim; never errors.
    pub async fn conservation_status(&self, entity_id: &str) -> String {
        match self.fetch_status(entity_id).await {
            Ok(Some(label)) => label,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::warn!(entity_id, error = %err, "linked-data status lookup failed");
                String::new()
            }
        }
    }

    async fn fetch_status(&self, entity_id: &str) -> Result<Option<String>> {
        let entity = self.fetch_json(&format!(
            "{}/wiki/Special:EntityData/{}.json",
            self.base_url,
            urlencoding::encode(entity_id)
        ))
        .await
        .context("failed to fetch linked-data entity")?;

        let status_id = entity
            .pointer(&format!(
                "/entities/{entity_id}/claims/{STATUS_PROPERTY}/0/mainsnak/datavalue/value/id"
            ))
            .and_then(Value::as_str);

        let status_id = match status_id {
            Some(id) => id.to_string(),
            None => return Ok(None),
        };

        let status = self
            .fetch_json(&format!(
                "{}/w/api.php?action=wbgetentities&ids={}&languages=en&format=json",
                self.base_url,
                urlencoding::encode(&status_id)
            ))
            .await
            .context("failed to fetch linked-data status entity")?;

        Ok(status
            .pointer(&format!("/entities/{status_id}/labels/en/value"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let value = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("non-success status")?
            .json::<Value>()
            .await
            .context("response was not valid JSON")?;
        Ok(value)
    }
}
