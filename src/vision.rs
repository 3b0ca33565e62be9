use base64::Engine;
use regex::Regex;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::classifier::sanitize_error_body;
use crate::config::VisionConfig;
use crate::error::{IdentifyError, Result};
use crate::extract::push_unique;
use crate::models::SpeciesProfile;

const IDENTIFICATION_PROMPT: &str = "You are an expert wildlife biologist and species identifier. \
Analyze the provided image and identify the species present.\n\n\
Return ONLY a valid JSON object (no markdown, no code blocks) with the following structure:\n\
{\n\
  \"species_name\": \"Common name of the species\",\n\
  \"scientific_name\": \"Scientific binomial name\",\n\
  \"description\": \"A 2-3 sentence description of the species\",\n\
  \"habitat\": \"Primary habitats where this species is found\",\n\
  \"conservation_status\": \"Least Concern / Vulnerable / Endangered / Critically Endangered\",\n\
  \"population_trend\": \"Increasing / Stable / Decreasing / Unknown\",\n\
  \"estimated_population\": \"Estimated global population or 'Unknown'\",\n\
  \"threats\": [\"Threat 1\", \"Threat 2\", \"Threat 3\"],\n\
  \"confidence\": 85\n\
}\n\n\
Important:\n\
- If you cannot identify a species, return confidence: 0\n\
- If the image doesn't contain a living organism, return confidence: 0 with species_name: \"Not Identifiable\"\n\
- Threats should be an array of 2-4 main threats to the species\n\
- Return ONLY the JSON object, nothing else";

/// Alternate identification path: a hosted multimodal LLM given the image
/// and a JSON-contract prompt, answering with a complete profile in one
/// round trip. Targets an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url,
            api_key: config.api_key,
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub async fn identify(&self, image: &[u8], content_type: &str) -> Result<SpeciesProfile> {
        let media_type = if content_type.trim().is_empty() {
            sniff_media_type(image)
        } else {
            content_type
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image_url",
                        "image_url": {"url": format!("data:{media_type};base64,{encoded}")}
                    },
                    {"type": "text", "text": IDENTIFICATION_PROMPT}
                ]
            }]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| IdentifyError::UpstreamUnavailable {
                status: None,
                message: format!("vision endpoint unreachable: {err}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = sanitize_error_body(&body);
            return Err(if status.is_server_error() {
                IdentifyError::UpstreamUnavailable {
                    status: Some(status.as_u16()),
                    message,
                }
            } else {
                IdentifyError::UpstreamRejected {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let data = response
            .json::<Value>()
            .await
            .map_err(|err| IdentifyError::UpstreamRejected {
                status: status.as_u16(),
                message: format!("failed to decode vision response: {err}"),
            })?;

        let content = data
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| IdentifyError::UpstreamRejected {
                status: status.as_u16(),
                message: "no content in vision response".to_string(),
            })?;

        parse_vision_reply(content)
    }
}

/// Parses the model's JSON reply into a profile. Models routinely wrap the
/// JSON in markdown code fences despite the prompt; strip them first.
pub fn parse_vision_reply(content: &str) -> Result<SpeciesProfile> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct VisionReply {
        species_name: String,
        scientific_name: String,
        description: String,
        habitat: String,
        conservation_status: String,
        population_trend: String,
        estimated_population: String,
        threats: Vec<String>,
        confidence: f64,
    }

    let cleaned = strip_code_fences(content);
    let reply: VisionReply =
        serde_json::from_str(&cleaned).map_err(|err| IdentifyError::UpstreamRejected {
            status: 200,
            message: format!("could not parse vision model reply as JSON: {err}"),
        })?;

    let mut threats = Vec::new();
    for threat in reply.threats {
        push_unique(&mut threats, threat);
    }

    Ok(SpeciesProfile {
        common_name: reply.species_name,
        scientific_name: reply.scientific_name,
        description: reply.description,
        habitat: reply.habitat,
        conservation_status: reply.conservation_status,
        threats,
        population_summary: reply.population_trend,
        population_estimate: reply.estimated_population,
        confidence: reply.confidence.round().clamp(0.0, 100.0) as u8,
    })
}

fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let re = Regex::new(r"(?s)^```[a-zA-Z]*\n?(.*?)\n?```$")
        .unwrap_or_else(|_| Regex::new("^$").unwrap());
    match re.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Detects the image format from its magic bytes; used when the caller
/// supplies no content type. Defaults to JPEG when nothing matches.
pub fn sniff_media_type(bytes: &[u8]) -> &'static str {
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xD8 {
        return "image/jpeg";
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png";
    }
    if bytes.starts_with(b"GIF") {
        return "image/gif";
    }
    if bytes.starts_with(b"RIFF") {
        return "image/webp";
    }
    "image/jpeg"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_detected_from_magic_bytes() {
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(
            sniff_media_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            "image/png"
        );
        assert_eq!(sniff_media_type(b"GIF89a"), "image/gif");
        assert_eq!(sniff_media_type(b"RIFF....WEBP"), "image/webp");
        assert_eq!(sniff_media_type(b"plain text"), "image/jpeg");
        assert_eq!(sniff_media_type(&[]), "image/jpeg");
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn reply_parses_with_fences_and_clamped_confidence() {
        let content = "```json\n{\n  \"species_name\": \"Loggerhead sea turtle\",\n  \
                       \"scientific_name\": \"Caretta caretta\",\n  \
                       \"description\": \"A large oceanic turtle.\",\n  \
                       \"habitat\": \"Coastal waters\",\n  \
                       \"conservation_status\": \"Vulnerable\",\n  \
                       \"population_trend\": \"Decreasing\",\n  \
                       \"estimated_population\": \"Unknown\",\n  \
                       \"threats\": [\"Bycatch\", \"Bycatch\", \"Pollution\"],\n  \
                       \"confidence\": 150\n}\n```";
        let profile = parse_vision_reply(content).unwrap();
        assert_eq!(profile.common_name, "Loggerhead sea turtle");
        assert_eq!(profile.scientific_name, "Caretta caretta");
        assert_eq!(profile.threats, vec!["Bycatch", "Pollution"]);
        assert_eq!(profile.confidence, 100);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let profile = parse_vision_reply("{\"species_name\": \"Red fox\"}").unwrap();
        assert_eq!(profile.common_name, "Red fox");
        assert!(profile.scientific_name.is_empty());
        assert!(profile.threats.is_empty());
        assert_eq!(profile.confidence, 0);
    }

    #[test]
    fn unparsable_reply_is_a_hard_rejection() {
        let err = parse_vision_reply("I think this is a turtle.").unwrap_err();
        assert!(matches!(err, IdentifyError::UpstreamRejected { .. }));
    }

    #[tokio::test]
    async fn identify_round_trip_against_mock_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let reply = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"species_name\": \"Red fox\", \"scientific_name\": \
                                \"Vulpes vulpes\", \"confidence\": 91}"
                }
            }]
        });
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply.to_string())
            .create_async()
            .await;

        let client = VisionClient::new(crate::config::VisionConfig {
            base_url: server.url(),
            api_key: "test-key".to_string(),
            model: "test-vision".to_string(),
            max_tokens: 256,
            temperature: 0.2,
        })
        .unwrap();

        let profile = client.identify(&[0xFF, 0xD8, 0xFF], "").await.unwrap();
        assert_eq!(profile.common_name, "Red fox");
        assert_eq!(profile.confidence, 91);
    }
}
