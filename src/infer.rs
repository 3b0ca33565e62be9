use regex::Regex;

use crate::extract::push_unique;

/// Coarse qualitative population trend derived from conservation status.
/// Substring match, most severe first.
pub fn infer_population_trend(status: &str) -> &'static str {
    let s = status.to_lowercase();

    if s.contains("critically endangered") {
        "Severely reduced and rapidly decreasing"
    } else if s.contains("endangered") {
        "Very small and decreasing"
    } else if s.contains("vulnerable") {
        "Decreasing"
    } else if s.contains("near threatened") {
        "Slightly declining or at risk of decline"
    } else if s.contains("least concern") {
        "Stable or increasing"
    } else {
        ""
    }
}

/// Same input as the trend, different granularity: a rough numeric-range
/// phrase rather than a direction.
pub fn infer_population_estimate(status: &str) -> &'static str {
    let s = status.to_lowercase();

    if s.contains("critically endangered") {
        "Likely fewer than 10,000 mature individuals"
    } else if s.contains("endangered") {
        "Likely fewer than 25,000 mature individuals"
    } else if s.contains("vulnerable") {
        "On the order of tens of thousands of individuals"
    } else if s.contains("near threatened") {
        "On the order of tens to hundreds of thousands of individuals"
    } else if s.contains("least concern") {
        "Likely more than 100,000 individuals"
    } else {
        ""
    }
}

/// Synthesizes generic threats from status and habitat text when the prose
/// named none, so the profile is not left empty. Union of all matching
/// categories, insertion order as listed, deduplicated.
pub fn infer_generic_threats(habitat: &str, status: &str) -> Vec<String> {
    let mut threats = Vec::new();
    let h = habitat.to_lowercase();
    let s = status.to_lowercase();

    let at_risk = ["critically endangered", "endangered", "vulnerable", "near threatened"]
        .iter()
        .any(|level| s.contains(level));
    if at_risk {
        push_unique(&mut threats, "Habitat loss and degradation".to_string());
        push_unique(&mut threats, "Human disturbance and development".to_string());
    }

    let marine_re = Regex::new(r"sea|ocean|marine|coastal|beach|shore")
        .unwrap_or_else(|_| Regex::new("^$").unwrap());
    if marine_re.is_match(&h) {
        push_unique(&mut threats, "Bycatch in fishing gear".to_string());
        push_unique(&mut threats, "Pollution and marine debris".to_string());
        push_unique(
            &mut threats,
            "Climate change and rising sea levels".to_string(),
        );
    }

    let freshwater_re = Regex::new(r"river|lake|freshwater|wetland")
        .unwrap_or_else(|_| Regex::new("^$").unwrap());
    if freshwater_re.is_match(&h) {
        push_unique(&mut threats, "Water pollution".to_string());
        push_unique(&mut threats, "Habitat fragmentation and dams".to_string());
    }

    let forest_re = Regex::new(r"forest|grassland|savanna|woodland")
        .unwrap_or_else(|_| Regex::new("^$").unwrap());
    if forest_re.is_match(&h) {
        push_unique(&mut threats, "Deforestation and land conversion".to_string());
    }

    threats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_is_ordered_most_severe_first() {
        assert_eq!(
            infer_population_trend("Critically Endangered"),
            "Severely reduced and rapidly decreasing"
        );
        assert_eq!(infer_population_trend("Endangered"), "Very small and decreasing");
        assert_eq!(infer_population_trend("Vulnerable"), "Decreasing");
        assert_eq!(
            infer_population_trend("Near Threatened"),
            "Slightly declining or at risk of decline"
        );
        assert_eq!(infer_population_trend("Least Concern"), "Stable or increasing");
        assert_eq!(infer_population_trend(""), "");
        assert_eq!(infer_population_trend("Extinct in the Wild"), "");
    }

    #[test]
    fn estimate_tracks_status_granularity() {
        assert_eq!(
            infer_population_estimate("Critically Endangered"),
            "Likely fewer than 10,000 mature individuals"
        );
        assert_eq!(
            infer_population_estimate("least concern"),
            "Likely more than 100,000 individuals"
        );
        assert_eq!(infer_population_estimate("Data Deficient"), "");
    }

    #[test]
    fn coastal_least_concern_gets_marine_threats_only() {
        let threats = infer_generic_threats("coastal waters and estuaries", "Least Concern");
        assert!(threats.contains(&"Bycatch in fishing gear".to_string()));
        assert!(threats.contains(&"Pollution and marine debris".to_string()));
        assert!(!threats.contains(&"Deforestation and land conversion".to_string()));
        // Least Concern is not an at-risk status.
        assert!(!threats.contains(&"Habitat loss and degradation".to_string()));
    }

    #[test]
    fn at_risk_status_adds_broad_pressures_first() {
        let threats = infer_generic_threats("tropical forest canopy", "Endangered");
        assert_eq!(threats[0], "Habitat loss and degradation");
        assert_eq!(threats[1], "Human disturbance and development");
        assert!(threats.contains(&"Deforestation and land conversion".to_string()));
    }

    #[test]
    fn categories_union_without_duplicates() {
        let threats =
            infer_generic_threats("wetlands near the sea and coastal forest", "Vulnerable");
        let mut deduped = threats.clone();
        deduped.dedup();
        assert_eq!(threats, deduped);
        assert!(threats.contains(&"Water pollution".to_string()));
        assert!(threats.contains(&"Bycatch in fishing gear".to_string()));
        assert!(threats.contains(&"Deforestation and land conversion".to_string()));
    }

    #[test]
    fn no_signal_means_no_generic_threats() {
        assert!(infer_generic_threats("", "").is_empty());
        assert!(infer_generic_threats("underground burrows", "Data Deficient").is_empty());
    }
}
