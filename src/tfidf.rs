//! C4: TF-IDF scorer over a small, query-scoped corpus (§4.4).
//!
//! Stateless between queries; a fresh [`Corpus`] is built per PRF call.
//! The smoothing terms in `tf`/`idf` are deliberate and must be reproduced
//! exactly for test-vector parity with the source design.

use std::collections::HashMap;

/// A tokenized corpus of documents, case-insensitive.
pub struct Corpus {
    docs: Vec<Vec<String>>,
    /// Number of documents containing each term (lowercased).
    doc_freq: HashMap<String, usize>,
}

/// Tokenize on whitespace, lowercasing every token.
fn tokenize(doc: &str) -> Vec<String> {
    doc.split_whitespace().map(|t| t.to_lowercase()).collect()
}

impl Corpus {
    /// Build a corpus from an ordered list of raw document strings.
    pub fn create_corpus(docs: &[String]) -> Self {
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in &tokenized {
            let mut seen = std::collections::HashSet::new();
            for term in doc {
                if seen.insert(term.clone()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }
        Self { docs: tokenized, doc_freq }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn doc_tokens(&self, index: usize) -> &[String] {
        &self.docs[index]
    }

    /// `tf(term, doc) = occurrences / (doc_len + 1)`.
    pub fn tf(&self, term: &str, doc_index: usize) -> f64 {
        let term = term.to_lowercase();
        let doc = &self.docs[doc_index];
        let occurrences = doc.iter().filter(|t| **t == term).count();
        occurrences as f64 / (doc.len() as f64 + 1.0)
    }

    /// `idf(term) = log(N / (df + 1)) + 1`.
    pub fn idf(&self, term: &str) -> f64 {
        let term = term.to_lowercase();
        let df = *self.doc_freq.get(&term).unwrap_or(&0);
        let n = self.docs.len() as f64;
        (n / (df as f64 + 1.0)).ln() + 1.0
    }

    pub fn tfidf(&self, term: &str, doc_index: usize) -> f64 {
        self.tf(term, doc_index) * self.idf(term)
    }

    /// All distinct lowercased tokens across every document.
    pub fn vocabulary(&self) -> Vec<String> {
        self.doc_freq.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tf_uses_length_plus_one_denominator() {
        let corpus = Corpus::create_corpus(&["error error catch".to_string()]);
        // 2 occurrences of "error" in a 3-token doc: 2 / (3 + 1) = 0.5
        assert!((corpus.tf("error", 0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn idf_matches_smoothed_formula() {
        let corpus = Corpus::create_corpus(&["a b".to_string(), "a".to_string(), "c".to_string()]);
        // term "a": df=2, N=3 -> ln(3/3)+1 = 1.0
        assert!((corpus.idf("a") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn idf_is_case_insensitive() {
        let corpus = Corpus::create_corpus(&["Error".to_string(), "error".to_string()]);
        assert!((corpus.idf("ERROR") - corpus.idf("error")).abs() < 1e-9);
    }

    #[test]
    fn unseen_term_has_zero_tf_and_positive_idf() {
        let corpus = Corpus::create_corpus(&["a b c".to_string()]);
        assert_eq!(corpus.tf("zzz", 0), 0.0);
        assert!(corpus.idf("zzz") > 0.0);
    }

    #[test]
    fn vocabulary_is_distinct_and_lowercased() {
        let corpus = Corpus::create_corpus(&["Error Error".to_string()]);
        assert_eq!(corpus.vocabulary(), vec!["error".to_string()]);
    }
}
