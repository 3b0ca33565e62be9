use regex::Regex;

/// Explicit habitat phrasings, checked in priority order across sentences.
const HABITAT_PHRASES: [&str; 7] = [
    "habitat",
    "found in",
    "native to",
    "occurs in",
    "distributed in",
    "lives in",
    "inhabits",
];

/// Fallback environment keywords when no explicit habitat phrasing exists.
const ENVIRONMENT_KEYWORDS: [&str; 15] = [
    "ocean",
    "sea",
    "marine",
    "coastal",
    "river",
    "lake",
    "freshwater",
    "wetland",
    "forest",
    "grassland",
    "savanna",
    "desert",
    "tropical",
    "temperate",
    "montane",
];

/// Closed vocabulary, most severe first. "critically endangered" must come
/// before "endangered" to avoid the substring false-positive.
const STATUS_PHRASES: [(&str, &str); 6] = [
    ("critically endangered", "Critically Endangered"),
    ("endangered", "Endangered"),
    ("vulnerable", "Vulnerable"),
    ("near threatened", "Near Threatened"),
    ("least concern", "Least Concern"),
    ("data deficient", "Data Deficient"),
];

const IUCN_CODES: [(&str, &str); 5] = [
    ("CR", "Critically Endangered"),
    ("EN", "Endangered"),
    ("VU", "Vulnerable"),
    ("NT", "Near Threatened"),
    ("LC", "Least Concern"),
];

const THREAT_KEYWORDS: [(&str, &str); 5] = [
    ("habitat loss", "Habitat loss"),
    ("poaching", "Poaching"),
    ("climate change", "Climate change"),
    ("deforestation", "Deforestation"),
    ("illegal hunting", "Illegal hunting"),
];

/// Splits prose into sentences at sentence-ending punctuation followed by
/// whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(j, next)) = iter.peek() {
                if next.is_whitespace() {
                    sentences.push(text[start..=i].trim());
                    start = j;
                }
            }
        }
    }

    if start < text.len() {
        sentences.push(text[start..].trim());
    }

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// First sentence matching an explicit habitat phrase, in priority order;
/// else the first sentence mentioning a common environment keyword.
pub fn extract_habitat(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let sentences = split_sentences(text);

    for phrase in HABITAT_PHRASES {
        if let Some(sentence) = sentences
            .iter()
            .find(|s| s.to_lowercase().contains(phrase))
        {
            return sentence.to_string();
        }
    }

    for sentence in &sentences {
        let lower = sentence.to_lowercase();
        if ENVIRONMENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return sentence.to_string();
        }
    }

    String::new()
}

/// Returns one of the six closed-vocabulary statuses, or "" when the prose
/// carries no recognizable status. Also understands IUCN two-letter codes
/// phrased as "<code> on the IUCN Red List".
pub fn extract_conservation_status(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    for (phrase, status) in STATUS_PHRASES {
        let pattern = format!(r"(?i)\b{}\b", phrase.replace(' ', r"\s+"));
        let re = Regex::new(&pattern).unwrap_or_else(|_| Regex::new("^$").unwrap());
        if re.is_match(text) {
            return status.to_string();
        }
    }

    let iucn_re = Regex::new(r"(?i)\b(CR|EN|VU|NT|LC)\s+on the IUCN Red List")
        .unwrap_or_else(|_| Regex::new("^$").unwrap());
    if let Some(caps) = iucn_re.captures(text) {
        let code = caps[1].to_uppercase();
        for (abbrev, status) in IUCN_CODES {
            if code == abbrev {
                return status.to_string();
            }
        }
    }

    String::new()
}

/// Canonical threat phrases mentioned in the prose, deduplicated, in scan
/// order (not source order).
pub fn extract_threats(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut threats = Vec::new();

    for (needle, canonical) in THREAT_KEYWORDS {
        if lower.contains(needle) {
            push_unique(&mut threats, canonical.to_string());
        }
    }

    threats
}

/// Looks for a parenthesized capitalized binomial in the first sentence,
/// e.g. "(Caretta caretta)", then falls back to the first capitalized
/// binomial anywhere in the prose.
pub fn extract_scientific_name(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let first_sentence = split_sentences(text).into_iter().next().unwrap_or(text);

    let paren_re =
        Regex::new(r"\(([A-Z][a-z]+ [a-z]+)\)").unwrap_or_else(|_| Regex::new("^$").unwrap());
    if let Some(caps) = paren_re.captures(first_sentence) {
        return caps[1].to_string();
    }

    let binomial_re =
        Regex::new(r"\b([A-Z][a-z]+ [a-z]+)\b").unwrap_or_else(|_| Regex::new("^$").unwrap());
    if let Some(caps) = binomial_re.captures(text) {
        return caps[1].to_string();
    }

    String::new()
}

pub(crate) fn push_unique(target: &mut Vec<String>, value: String) {
    if target.iter().any(|existing| existing == &value) {
        return;
    }
    target.push(value);
}
