use std::env;

use crate::error::{IdentifyError, Result};

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(IdentifyError::UpstreamConfiguration(
                "ECOLENS_CLASSIFIER_API_KEY is not set".to_string(),
            ));
        }
        if self.model_id.trim().is_empty() {
            return Err(IdentifyError::UpstreamConfiguration(
                "ECOLENS_CLASSIFIER_MODEL_ID is not set; choose a supported \
                 image-classification model (e.g. facebook/deit-base-distilled-patch16-224)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct VisionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl VisionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(IdentifyError::UpstreamConfiguration(
                "ECOLENS_VISION_API_KEY is not set".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(IdentifyError::UpstreamConfiguration(
                "ECOLENS_VISION_MODEL is not set".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct EnrichmentConfig {
    pub wiki_api_url: String,
    pub wiki_rest_url: String,
    pub wikidata_base_url: String,
    pub user_agent: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub vision: VisionConfig,
    pub enrichment: EnrichmentConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            classifier: ClassifierConfig {
                base_url: env::var("ECOLENS_CLASSIFIER_BASE_URL").unwrap_or_else(|_| {
                    "https://router.huggingface.co/hf-inference".to_string()
                }),
                api_key: env::var("ECOLENS_CLASSIFIER_API_KEY").unwrap_or_default(),
                model_id: env::var("ECOLENS_CLASSIFIER_MODEL_ID").unwrap_or_default(),
            },
            vision: VisionConfig {
                base_url: env::var("ECOLENS_VISION_BASE_URL")
                    .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
                api_key: env::var("ECOLENS_VISION_API_KEY").unwrap_or_default(),
                model: env::var("ECOLENS_VISION_MODEL")
                    .unwrap_or_else(|_| "llama-3.2-11b-vision-preview".to_string()),
                max_tokens: env::var("ECOLENS_VISION_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1_024),
                temperature: env::var("ECOLENS_VISION_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.7),
            },
            enrichment: EnrichmentConfig {
                wiki_api_url: env::var("ECOLENS_WIKI_API_URL")
                    .unwrap_or_else(|_| "https://en.wikipedia.org/w/api.php".to_string()),
                wiki_rest_url: env::var("ECOLENS_WIKI_REST_URL")
                    .unwrap_or_else(|_| "https://en.wikipedia.org/api/rest_v1".to_string()),
                wikidata_base_url: env::var("ECOLENS_WIKIDATA_BASE_URL")
                    .unwrap_or_else(|_| "https://www.wikidata.org".to_string()),
                user_agent: env::var("ECOLENS_USER_AGENT").unwrap_or_else(|_| {
                    "ecolens-species-id/0.1 (https://en.wikipedia.org/wiki/User:Example)"
                        .to_string()
                }),
            },
        }
    }
}
