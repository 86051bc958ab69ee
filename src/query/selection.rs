//! Variant selection used by the retriever (§4.3 "Variant selection").

use crate::types::PreprocessingResult;

use super::tables::{DOMAIN_KEYWORDS, STRUCTURAL_KEYWORDS};

fn contains_filename(variant: &str, result: &PreprocessingResult) -> bool {
    result.detected_patterns.iter().any(|p| {
        p.strip_prefix("filename:")
            .map(|name| variant.contains(name) || variant.contains(&basename(name)))
            .unwrap_or(false)
    })
}

fn basename(matched: &str) -> String {
    let file = matched.rsplit('/').next().unwrap_or(matched);
    match file.rfind('.') {
        Some(idx) => file[..idx].to_string(),
        None => file.to_string(),
    }
}

fn contains_detected_language(variant: &str, result: &PreprocessingResult) -> bool {
    result.detected_patterns.iter().any(|p| {
        p.strip_prefix("language:")
            .map(|lang| variant.to_lowercase().contains(lang))
            .unwrap_or(false)
    })
}

fn contains_any(variant: &str, keywords: &[&str]) -> bool {
    let lower = variant.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Priority order (a)-(f) for picking a single best variant.
fn priority_pick<'a>(result: &'a PreprocessingResult, exclude: &[&str]) -> Option<&'a str> {
    let original = result.normalized_query.as_str();
    let candidates: Vec<&str> = result
        .expanded_terms
        .iter()
        .map(|s| s.as_str())
        .filter(|v| !exclude.contains(v))
        .collect();

    // (a) first variant containing any detected filename.
    if let Some(v) = candidates.iter().find(|v| contains_filename(v, result)) {
        return Some(v);
    }
    // (b) first variant containing a detected language, differing from original.
    if let Some(v) = candidates
        .iter()
        .find(|v| contains_detected_language(v, result) && **v != original)
    {
        return Some(v);
    }
    // (c) first variant containing a structural keyword, differing from original.
    if let Some(v) = candidates
        .iter()
        .find(|v| contains_any(v, STRUCTURAL_KEYWORDS) && **v != original)
    {
        return Some(v);
    }
    // (d) first variant containing a domain keyword, differing from original.
    if let Some(v) = candidates
        .iter()
        .find(|v| contains_any(v, DOMAIN_KEYWORDS) && **v != original)
    {
        return Some(v);
    }
    // (e) longest variant, if longer than original.
    if let Some(v) = candidates.iter().max_by_key(|v| v.len()) {
        if v.len() > original.len() {
            return Some(v);
        }
    }
    None
}

/// Select the single best variant for a single-query search.
pub fn select_single(result: &PreprocessingResult) -> String {
    priority_pick(result, &[]).map(str::to_string).unwrap_or_else(|| result.normalized_query.clone())
}

/// Select up to `n` distinct variants for multi-query retrieval. Runs
/// priorities (a)-(d) once each, then fills with the longest remaining
/// variants, never emitting duplicates. Falls back to `[normalized_query]`
/// if nothing qualifies.
pub fn select_multi(result: &PreprocessingResult, n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }

    let original = result.normalized_query.as_str();
    let mut picked: Vec<String> = Vec::new();
    let mut excluded: Vec<&str> = Vec::new();

    loop {
        if picked.len() >= n || picked.len() >= 4 {
            break;
        }
        match priority_pick(result, &excluded) {
            Some(v) => {
                picked.push(v.to_string());
                excluded.push(v);
            }
            None => break,
        }
        if picked.len() >= 4 {
            break;
        }
    }

    if picked.len() < n {
        let mut remaining: Vec<&str> = result
            .expanded_terms
            .iter()
            .map(|s| s.as_str())
            .filter(|v| !picked.iter().any(|p| p == v))
            .collect();
        remaining.sort_by_key(|v| std::cmp::Reverse(v.len()));
        for v in remaining {
            if picked.len() >= n {
                break;
            }
            picked.push(v.to_string());
        }
    }

    if picked.is_empty() {
        return vec![original.to_string()];
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(expanded_terms: Vec<&str>, patterns: Vec<&str>) -> PreprocessingResult {
        PreprocessingResult {
            original_query: "q".to_string(),
            normalized_query: "q".to_string(),
            expanded_terms: expanded_terms.into_iter().map(String::from).collect(),
            detected_patterns: patterns.into_iter().map(String::from).collect(),
            reasoning: String::new(),
        }
    }

    #[test]
    fn no_qualifying_variant_returns_normalized_query() {
        let result = result_with(vec!["q"], vec![]);
        assert_eq!(select_single(&result), "q");
    }

    #[test]
    fn filename_variant_wins_top_priority() {
        let result = result_with(vec!["q", "q rust", "q main"], vec!["filename:main.rs", "language:rust"]);
        assert_eq!(select_single(&result), "q main");
    }

    #[test]
    fn language_variant_wins_when_no_filename() {
        let result = result_with(vec!["q", "q rust"], vec!["language:rust"]);
        assert_eq!(select_single(&result), "q rust");
    }

    #[test]
    fn longest_variant_wins_as_last_resort() {
        let result = result_with(vec!["q", "q much longer variant text"], vec![]);
        assert_eq!(select_single(&result), "q much longer variant text");
    }

    #[test]
    fn multi_query_produces_distinct_variants_up_to_n() {
        let result = result_with(
            vec!["q", "q rust", "q function", "q database", "q extra"],
            vec!["language:rust"],
        );
        let picked = select_multi(&result, 3);
        assert!(picked.len() <= 3);
        let unique: std::collections::HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), picked.len());
    }

    #[test]
    fn multi_query_falls_back_to_normalized_query_when_nothing_qualifies() {
        let result = result_with(vec!["q"], vec![]);
        assert_eq!(select_multi(&result, 3), vec!["q".to_string()]);
    }
}
