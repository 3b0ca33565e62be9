use crate::classifier::{clean_label, confidence_from_score, ClassifierClient};
use crate::config::AppConfig;
use crate::error::Result;
use crate::extract::{
    extract_conservation_status, extract_habitat, extract_scientific_name, extract_threats,
};
use crate::infer::{infer_generic_threats, infer_population_estimate, infer_population_trend};
use crate::models::{EncyclopediaSummary, SpeciesProfile};
use crate::wiki::WikiClient;
use crate::wikidata::WikidataClient;

/// The enrichment pipeline: classify → normalize → resolve encyclopedia →
/// extract structured fields → (linked-data status fallback) → infer
/// population and threats → assemble the profile.
///
/// Classifier failures are hard failures of the request. Enrichment
/// failures never propagate; they ship a profile with empty optional
/// fields instead.
#[derive(Clone)]
pub struct IdentifyService {
    classifier: ClassifierClient,
    wiki: WikiClient,
    wikidata: WikidataClient,
}

impl IdentifyService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            classifier: ClassifierClient::new(config.classifier.clone())?,
            wiki: WikiClient::new(&config.enrichment),
            wikidata: WikidataClient::new(&config.enrichment),
        })
    }

    pub async fn identify(&self, image: &[u8], content_type: &str) -> Result<SpeciesProfile> {
        let raw = self.classifier.classify(image, content_type).await?;
        let label = clean_label(&raw.label);
        let confidence = confidence_from_score(raw.score);
        tracing::info!(label, confidence, "classifier prediction");

        let summary = self.wiki.resolve(&label).await;
        Ok(self.build_profile(&label, confidence, summary).await)
    }

    async fn build_profile(
        &self,
        label: &str,
        confidence: u8,
        summary: EncyclopediaSummary,
    ) -> SpeciesProfile {
        let prose = summary.extract.trim();
        if prose.is_empty() {
            // Degraded enrichment: the profile ships with blank optional
            // fields rather than an error.
            let description = if label == "Unknown" {
                "Unable to identify from image".to_string()
            } else {
                format!(
                    "Top prediction from image classifier model \"{}\": {label}.",
                    self.classifier.model_id()
                )
            };
            return SpeciesProfile {
                common_name: label.to_string(),
                description,
                confidence,
                ..SpeciesProfile::default()
            };
        }

        let habitat = extract_habitat(prose);
        let mut status = extract_conservation_status(prose);
        let mut threats = extract_threats(prose);
        let scientific_name = extract_scientific_name(prose);

        if status.is_empty() {
            if let Some(entity_id) = summary.entity_id.as_deref() {
                let linked = self.wikidata.conservation_status(entity_id).await;
                if !linked.is_empty() {
                    // Map the linked-data label through the same closed
                    // vocabulary as the prose extractor; keep it verbatim
                    // only when it does not map.
                    let mapped = extract_conservation_status(&linked);
                    status = if mapped.is_empty() { linked } else { mapped };
                }
            }
        }

        if threats.is_empty() {
            threats = infer_generic_threats(&habitat, &status);
        }

        let common_name = if summary.title.trim().is_empty() {
            label.to_string()
        } else {
            summary.title.clone()
        };

        SpeciesProfile {
            common_name,
            scientific_name,
            description: prose.to_string(),
            habitat,
            population_summary: infer_population_trend(&status).to_string(),
            population_estimate: infer_population_estimate(&status).to_string(),
            conservation_status: status,
            threats,
            confidence,
        }
    }
}
