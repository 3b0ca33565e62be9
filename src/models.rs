use serde::{Deserialize, Serialize};

/// Top prediction from the upstream image classifier, before any cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClassification {
    pub label: String,
    pub score: f64,
}

/// One encyclopedia page summary, as returned by the resolver. An empty
/// `extract` means the lookup failed soft; downstream stages must treat it
/// as valid input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncyclopediaSummary {
    pub title: String,
    pub extract: String,
    pub is_disambiguation: bool,
    /// Opaque linked-data id (e.g. "Q223847"), used only as a fallback key
    /// for the conservation-status lookup. Never interpreted locally.
    pub entity_id: Option<String>,
}

/// The pipeline's output contract. Built fresh per identification request
/// and discarded after return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub common_name: String,
    /// "" when no binomial was confidently extracted.
    pub scientific_name: String,
    pub description: String,
    /// "" when no habitat-bearing sentence was found.
    pub habitat: String,
    /// When non-empty, one of the closed IUCN-style vocabulary, or the
    /// verbatim linked-data label when that lookup bypassed the mapping.
    pub conservation_status: String,
    /// Deduplicated, insertion order preserved.
    pub threats: Vec<String>,
    /// Qualitative trend derived from conservation status; "" when unknown.
    pub population_summary: String,
    /// Coarse numeric-range phrase derived from conservation status.
    pub population_estimate: String,
    /// Always clamped to 0..=100.
    pub confidence: u8,
}
