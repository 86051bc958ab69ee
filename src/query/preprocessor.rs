//! C3: deterministic query preprocessing (§4.3).

use regex::Regex;

use crate::config::PreprocessorConfig;
use crate::types::PreprocessingResult;

use super::tables::{
    ABBREVIATIONS, CONCEPT_TABLE, FILENAME_PATTERNS, IMPLEMENTATION_PHRASES,
    IMPLEMENTATION_SIGNATURE, LANGUAGE_PATTERNS,
};

/// Insertion-ordered, deduplicated variant accumulator.
struct VariantSet {
    order: Vec<String>,
}

impl VariantSet {
    fn new(seed: &str) -> Self {
        Self {
            order: vec![seed.to_string()],
        }
    }

    fn add(&mut self, variant: String) {
        if !self.order.iter().any(|v| v == &variant) {
            self.order.push(variant);
        }
    }

    fn into_vec(self, max_variants: usize) -> Vec<String> {
        self.order.into_iter().take(max_variants).collect()
    }
}

fn camel_case_boundary_regex() -> &'static Regex {
    static RE: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
    &RE
}

fn whole_word_regex(key: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(key))).unwrap()
}

fn basename_without_extension(matched: &str) -> String {
    let file = matched.rsplit('/').next().unwrap_or(matched);
    match file.rfind('.') {
        Some(idx) => file[..idx].to_string(),
        None => file.to_string(),
    }
}

/// Run the ordered preprocessing rules on `query`, producing a bounded set
/// of search variants and detected pattern tags. Never fails: an empty or
/// whitespace-only query yields `expanded_terms == [""]`.
pub fn preprocess(query: &str, config: &PreprocessorConfig) -> PreprocessingResult {
    let trimmed = query.trim().to_string();
    let mut variants = VariantSet::new(&trimmed);
    let mut patterns: Vec<String> = Vec::new();
    let mut fired: Vec<&'static str> = Vec::new();

    // Rule 1: abbreviation expansion.
    if config.abbreviation_expansion && !trimmed.is_empty() {
        let mut expanded = trimmed.clone();
        let mut changed = false;
        for (key, value) in ABBREVIATIONS {
            let re = whole_word_regex(key);
            if re.is_match(&expanded) {
                expanded = re.replace_all(&expanded, *value).to_string();
                changed = true;
            }
        }
        if changed && expanded != trimmed {
            variants.add(expanded);
            fired.push("abbreviation_expansion");
        }
    }

    // Rule 2: conceptual mapping.
    if config.conceptual_mapping && !trimmed.is_empty() {
        let lower = trimmed.to_lowercase();
        for (concept, terms) in CONCEPT_TABLE {
            if lower.contains(concept) {
                for term in *terms {
                    variants.add(term.to_string());
                }
                variants.add(concept.to_string());
                fired.push("conceptual_mapping");
            }
        }
    }

    // Rule 3: case splitting.
    if config.case_splitting && !trimmed.is_empty() {
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        for (i, term) in tokens.iter().enumerate() {
            if camel_case_boundary_regex().is_match(term) {
                let split_term = camel_case_boundary_regex().replace_all(term, "$1 $2").to_string();
                variants.add(rebuild_with_replacement(&tokens, i, &split_term));
                fired.push("case_splitting");
            }
            if term.contains('_') && !term.starts_with('_') {
                let split_term = term.replace('_', " ");
                variants.add(rebuild_with_replacement(&tokens, i, &split_term));
                fired.push("case_splitting");
            }
        }
    }

    // Rule 4: language detection.
    if config.language_detection && !trimmed.is_empty() {
        for (name, re) in LANGUAGE_PATTERNS.iter() {
            if re.is_match(&trimmed) {
                patterns.push(format!("language:{name}"));
                variants.add(format!("{trimmed} {name}"));
                fired.push("language_detection");
            }
        }
    }

    // Rule 5: filename detection.
    if config.filename_detection && !trimmed.is_empty() {
        for re in FILENAME_PATTERNS.iter() {
            let matches: Vec<&str> = re.find_iter(&trimmed).map(|m| m.as_str()).collect();
            if matches.is_empty() {
                continue;
            }
            for m in matches {
                patterns.push(format!("filename:{m}"));
                variants.add(format!("{trimmed} {}", basename_without_extension(m)));
                fired.push("filename_detection");
            }
            break;
        }
    }

    // Rule 6: implementation focus.
    if config.implementation_focus && !trimmed.is_empty() {
        let lower = trimmed.to_lowercase();
        if IMPLEMENTATION_PHRASES.iter().any(|p| lower.contains(p)) {
            variants.add(format!("{trimmed} function class method implementation"));
            fired.push("implementation_focus");
        }
        if IMPLEMENTATION_SIGNATURE.is_match(&trimmed) {
            variants.add(format!("{trimmed} implementation definition"));
            fired.push("implementation_focus");
        }
    }

    let reasoning = if fired.is_empty() {
        "no preprocessing rule matched; using the normalised query only".to_string()
    } else {
        fired.dedup();
        format!("rules applied: {}", fired.join(", "))
    };

    PreprocessingResult {
        original_query: query.to_string(),
        normalized_query: trimmed,
        expanded_terms: variants.into_vec(config.max_variants),
        detected_patterns: patterns,
        reasoning,
    }
}

fn rebuild_with_replacement(tokens: &[&str], index: usize, replacement: &str) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| if i == index { replacement.to_string() } else { t.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}
