//! C5: pseudo-relevance feedback query expansion (§4.5), RM3-style.

use std::sync::Mutex;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PRFConfig;
use crate::error::{RetrievalErr, Result};
use crate::tfidf::Corpus;
use crate::types::{ExpansionTerm, ExpansionTermSource, PRFResult, SearchResult};

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static UNDERSCORE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_-]+").unwrap());
static LETTER_THEN_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z])([0-9])").unwrap());
static DIGIT_THEN_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9])([A-Za-z])").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NOISE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^[a-z]$").unwrap(),
        Regex::new(r"^\d+[a-z]?$").unwrap(),
        Regex::new(r"^x{2,}$").unwrap(),
        Regex::new(r"^[xyz]\d*$").unwrap(),
    ]
});

fn preprocess_doc(content: &str, code_tokens: bool) -> String {
    let mut s = content.to_string();
    if code_tokens {
        s = CAMEL_BOUNDARY.replace_all(&s, "$1 $2").to_string();
        s = UNDERSCORE_DASH.replace_all(&s, " ").to_string();
        s = LETTER_THEN_DIGIT.replace_all(&s, "$1 $2").to_string();
        s = DIGIT_THEN_LETTER.replace_all(&s, "$1 $2").to_string();
    }
    s = NON_WORD.replace_all(&s, " ").to_string();
    s = WHITESPACE.replace_all(&s, " ").to_string();
    s.trim().to_lowercase()
}

fn is_noise(term: &str) -> bool {
    NOISE_PATTERNS.iter().any(|re| re.is_match(term))
}

#[derive(Debug, Default)]
struct StatsInner {
    total_queries: u64,
    total_processing_time_ms: u64,
    successful_expansions: u64,
}

/// Summary counters exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PRFStats {
    pub total_queries: u64,
    pub avg_processing_time_ms: f64,
    pub success_rate: f64,
}

/// RM3-style pseudo-relevance-feedback query expander.
pub struct PRFEngine {
    config: PRFConfig,
    stats: Mutex<StatsInner>,
}

impl PRFEngine {
    pub fn new(config: PRFConfig) -> Self {
        Self {
            config,
            stats: Mutex::new(StatsInner::default()),
        }
    }

    pub fn reset_stats(&self) {
        *self.stats.lock().unwrap() = StatsInner::default();
    }

    pub fn stats(&self) -> PRFStats {
        let s = self.stats.lock().unwrap();
        let avg = if s.total_queries > 0 {
            s.total_processing_time_ms as f64 / s.total_queries as f64
        } else {
            0.0
        };
        let rate = if s.total_queries > 0 {
            s.successful_expansions as f64 / s.total_queries as f64
        } else {
            0.0
        };
        PRFStats {
            total_queries: s.total_queries,
            avg_processing_time_ms: avg,
            success_rate: rate,
        }
    }

    /// Expand `original_query` using the top results of a first-pass
    /// retrieval. Only fails with `InvalidArgument` on an empty query;
    /// every other failure mode degrades internally and is recorded in
    /// the returned result's `reasoning`.
    pub fn expand(&self, original_query: &str, results: &[SearchResult]) -> Result<PRFResult> {
        if original_query.trim().is_empty() {
            return Err(RetrievalErr::invalid_argument("PRF original_query must not be empty"));
        }

        let start = Instant::now();
        let result = self.expand_inner(original_query, results, start);

        let mut stats = self.stats.lock().unwrap();
        stats.total_queries += 1;
        stats.total_processing_time_ms += result.processing_time_ms;
        if result.expanded_query != original_query {
            stats.successful_expansions += 1;
        }

        Ok(result)
    }

    fn expand_inner(&self, original_query: &str, results: &[SearchResult], start: Instant) -> PRFResult {
        let elapsed = || start.elapsed().as_millis() as u64;

        if results.is_empty() {
            return PRFResult {
                original_query: original_query.to_string(),
                expanded_query: original_query.to_string(),
                expansion_terms: Vec::new(),
                documents_analyzed: 0,
                reasoning: "No search results provided".to_string(),
                processing_time_ms: elapsed(),
            };
        }

        let required = self.config.top_k.min(3);
        if results.len() < required {
            return PRFResult {
                original_query: original_query.to_string(),
                expanded_query: original_query.to_string(),
                expansion_terms: Vec::new(),
                documents_analyzed: 0,
                reasoning: format!("Insufficient documents: {} < {} required", results.len(), required),
                processing_time_ms: elapsed(),
            };
        }

        // Step 2: select pseudo-relevant documents.
        let selected: Vec<&SearchResult> = results.iter().take(self.config.top_k).collect();

        // Step 3: preprocess.
        let preprocessed: Vec<String> = selected
            .iter()
            .map(|r| preprocess_doc(&r.content, self.config.code_tokens))
            .collect();
        let documents_analyzed = preprocessed.len();

        // Step 4: score via TF-IDF.
        let corpus = Corpus::create_corpus(&preprocessed);
        let mut candidates: std::collections::HashMap<String, (f64, u32, u32)> = std::collections::HashMap::new();
        for doc_idx in 0..corpus.len() {
            let tokens = corpus.doc_tokens(doc_idx).to_vec();
            let unique: std::collections::HashSet<&String> = tokens.iter().collect();
            for term in unique {
                let occurrences = tokens.iter().filter(|t| *t == term).count() as u32;
                let tfidf = corpus.tfidf(term, doc_idx);
                let entry = candidates.entry(term.clone()).or_insert((0.0, 0, 0));
                entry.0 = entry.0.max(tfidf);
                entry.1 += occurrences;
                entry.2 += 1;
            }
        }

        // Step 5: filter.
        let original_lower = original_query.to_lowercase();
        let mut survivors: Vec<(String, f64, u32, u32)> = candidates
            .into_iter()
            .filter(|(term, (_, freq, _))| {
                term.len() >= self.config.min_term_length
                    && *freq >= self.config.min_term_freq
                    && !self.config.stop_words.contains(term)
                    && !original_lower.contains(term.as_str())
                    && !term.chars().all(|c| c.is_ascii_digit())
                    && term.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
                    && !is_noise(term)
            })
            .map(|(term, (score, freq, doc_count))| (term, score, freq, doc_count))
            .collect();

        // Step 6: sort and truncate.
        survivors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        survivors.truncate(self.config.expansion_terms);

        let expansion_terms: Vec<ExpansionTerm> = survivors
            .iter()
            .map(|(term, score, freq, doc_count)| ExpansionTerm {
                term: term.clone(),
                score: *score as f32,
                frequency: *freq,
                document_count: *doc_count,
                source: ExpansionTermSource::Tfidf,
            })
            .collect();

        // Step 7: build expanded query.
        let terms_text: Vec<&str> = expansion_terms.iter().map(|t| t.term.as_str()).collect();
        let expanded_query = if terms_text.is_empty() {
            original_query.to_string()
        } else {
            let w = self.config.original_weight;
            if (1.0 - w) > 0.5 {
                format!("{} {}", terms_text.join(" "), original_query)
            } else {
                format!("{} {}", original_query, terms_text.join(" "))
            }
        };

        // Step 8: reasoning.
        let top_three: Vec<&str> = terms_text.iter().take(3).copied().collect();
        let avg_score = if expansion_terms.is_empty() {
            0.0
        } else {
            expansion_terms.iter().map(|t| t.score as f64).sum::<f64>() / expansion_terms.len() as f64
        };
        let mut reasoning = format!(
            "analyzed {documents_analyzed} documents, extracted {} candidate terms, top terms: [{}], avg retained score: {avg_score:.4}",
            expansion_terms.len(),
            top_three.join(", "),
        );
        if self.config.code_tokens {
            reasoning.push_str("; code-aware tokenisation enabled");
        }

        PRFResult {
            original_query: original_query.to_string(),
            expanded_query,
            expansion_terms,
            documents_analyzed,
            reasoning,
            processing_time_ms: elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> SearchResult {
        SearchResult {
            content: content.to_string(),
            relative_path: "f.rs".to_string(),
            start_line: 1,
            end_line: 1,
            language: "rust".to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn empty_query_is_rejected() {
        let engine = PRFEngine::new(PRFConfig::default());
        let err = engine.expand("", &[doc("try catch")]).unwrap_err();
        assert!(matches!(err, RetrievalErr::InvalidArgument(_)));
    }

    #[test]
    fn empty_results_echo_original_query() {
        let engine = PRFEngine::new(PRFConfig::default());
        let result = engine.expand("error handling", &[]).unwrap();
        assert_eq!(result.expanded_query, "error handling");
        assert_eq!(result.documents_analyzed, 0);
        assert_eq!(result.reasoning, "No search results provided");
    }

    // Boundary scenario 5 (spec §8).
    #[test]
    fn insufficient_documents_keeps_original_query() {
        let engine = PRFEngine::new(PRFConfig::default());
        let result = engine.expand("x", &[doc("one document only")]).unwrap();
        assert_eq!(result.expanded_query, "x");
        assert!(result.reasoning.contains("Insufficient documents"));
    }

    // Boundary scenario 4 (spec §8).
    #[test]
    fn expands_on_short_error_handling_corpus() {
        let engine = PRFEngine::new(PRFConfig::default());
        let docs = vec![
            doc("try { riskyOperation(); } catch (e) { handleError(e); }"),
            doc("throw new CustomException(\"something failed\");"),
            doc("if (error) { logError(error); }"),
        ];
        let result = engine.expand("error handling", &docs).unwrap();
        assert_eq!(result.documents_analyzed, 3);
        assert_ne!(result.expanded_query, "error handling");
        let term_words: Vec<String> = result.expansion_terms.iter().map(|t| t.term.clone()).collect();
        let expected = ["try", "catch", "throw", "exception", "error"];
        assert!(term_words.iter().any(|t| expected.contains(&t.as_str())));
    }

    #[test]
    fn expansion_terms_respect_min_length_and_stop_words() {
        let engine = PRFEngine::new(PRFConfig::default());
        let docs = vec![
            doc("a an is are the connection pool database"),
            doc("connection pool database client"),
            doc("database connection pool manager"),
        ];
        let result = engine.expand("database connection", &docs).unwrap();
        for term in &result.expansion_terms {
            assert!(term.term.len() >= 3);
            assert!(!["a", "an", "is", "are", "the"].contains(&term.term.as_str()));
        }
    }

    #[test]
    fn stats_accumulate_across_calls() {
        let engine = PRFEngine::new(PRFConfig::default());
        let _ = engine.expand("error handling", &[doc("try"), doc("catch"), doc("throw")]);
        let _ = engine.expand("x", &[doc("one")]);
        let stats = engine.stats();
        assert_eq!(stats.total_queries, 2);
    }

    #[test]
    fn original_weight_controls_term_ordering() {
        let mut cfg = PRFConfig::default();
        cfg.original_weight = 0.2; // 1 - 0.2 = 0.8 > 0.5 -> terms first
        let engine = PRFEngine::new(cfg);
        let docs = vec![
            doc("try catch exception error handling pattern"),
            doc("catch block exception handler pattern"),
            doc("exception error try catch pattern"),
        ];
        let result = engine.expand("error handling", &docs).unwrap();
        if let Some(first_term) = result.expansion_terms.first() {
            assert!(result.expanded_query.starts_with(&first_term.term));
        }
    }
}
