use std::collections::{HashMap, HashSet};

pub type TermVector = HashMap<String, f64>;

/// Document-frequency corpus built incrementally from candidate texts
///
/// Documents are keyed by an id so the same record seen on repeated
/// searches is only counted once. Re-adding an id with different terms
/// replaces that document's contribution.
#[derive(Debug, Default, Clone)]
pub struct TfIdfCorpus {
    documents: HashMap<String, HashSet<String>>,
    document_frequency: HashMap<String, usize>,
}

impl TfIdfCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a document; returns false if the id was already
    /// known with the same terms
    pub fn add_document(&mut self, id: &str, tokens: &[String]) -> bool {
        let terms: HashSet<String> = tokens.iter().cloned().collect();
        if self.documents.get(id) == Some(&terms) {
            return false;
        }
        self.remove_document(id);
        for term in &terms {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
        self.documents.insert(id.to_string(), terms);
        true
    }

    /// Drop a document and its term counts; returns false if unknown
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(terms) = self.documents.remove(id) else {
            return false;
        };
        for term in terms {
            if let Some(df) = self.document_frequency.get_mut(&term) {
                *df -= 1;
                if *df == 0 {
                    self.document_frequency.remove(&term);
                }
            }
        }
        true
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// ln(N / df), zero for unseen terms or an empty corpus
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.document_count();
        match self.document_frequency.get(term) {
            Some(&df) if df > 0 && n > 0 => (n as f64 / df as f64).ln(),
            _ => 0.0,
        }
    }

    /// tf-idf weights of the given tokens against this corpus
    pub fn weigh(&self, tokens: &[String]) -> TermVector {
        term_frequencies(tokens)
            .into_iter()
            .map(|(term, tf)| {
                let idf = self.idf(&term);
                (term, tf * idf)
            })
            .collect()
    }

    /// Cosine of tf-idf vectors, falling back to raw tf vectors when
    /// either weighted vector is all zeros
    pub fn similarity(&self, a: &[String], b: &[String]) -> f64 {
        let weighted_a = self.weigh(a);
        let weighted_b = self.weigh(b);
        if norm(&weighted_a) == 0.0 || norm(&weighted_b) == 0.0 {
            return cosine_similarity(&term_frequencies(a), &term_frequencies(b));
        }
        cosine_similarity(&weighted_a, &weighted_b)
    }
}

/// Term counts divided by the document length
pub fn term_frequencies(tokens: &[String]) -> TermVector {
    let mut counts = TermVector::new();
    if tokens.is_empty() {
        return counts;
    }
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0.0) += 1.0;
    }
    let total = tokens.len() as f64;
    counts.values_mut().for_each(|v| *v /= total);
    counts
}

fn norm(vector: &TermVector) -> f64 {
    vector.values().map(|v| v * v).sum::<f64>().sqrt()
}

/// Cosine similarity of two sparse vectors; 0.0 if either has zero norm
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, weight)| large.get(term).map(|other| weight * other))
        .sum();
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}
