use crate::vectorizer::{DocumentVector, Vocabulary};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Ingestion position of the document.
    pub doc_id: DocId,
    pub weight: f64, // tf-idf weight, not normalized
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermStatistics {
    pub term: String,
    pub document_frequency: usize,
    pub min_weight: f64,
    pub max_weight: f64,
    pub avg_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingListLength {
    pub term: String,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStatistics {
    pub total_terms: usize,
    pub total_postings: usize,
    pub avg_postings_per_term: f64,
    pub longest_posting_list: Option<PostingListLength>,
    pub shortest_posting_list: Option<PostingListLength>,
}

/// Term → posting list, derived from fitted document vectors.
///
/// Posting lists are ordered by weight descending; equal weights keep document
/// ingestion order. Primary ranking does not go through this index, it serves
/// term-level lookups, OR queries and statistics.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<Posting>>,
    num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// `documents` must be in ingestion order; their positions become doc ids.
    pub fn build(documents: &[DocumentVector], vocabulary: &Vocabulary) -> Self {
        let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for (pos, doc) in documents.iter().enumerate() {
            for (&term_id, &weight) in &doc.weights {
                if let Some(term) = vocabulary.term(term_id) {
                    postings
                        .entry(term.to_string())
                        .or_default()
                        .push(Posting { doc_id: pos as DocId, weight });
                }
            }
        }
        // sort_by is stable, so ties stay in ingestion order
        for list in postings.values_mut() {
            list.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        }
        tracing::info!(num_terms = postings.len(), num_docs = documents.len(), "inverted index built");
        Self { postings, num_docs: documents.len() as u32 }
    }

    pub fn num_docs(&self) -> u32 { self.num_docs }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ { self.postings.keys().map(String::as_str) }

    /// Posting list for `term`, empty when the term is unknown.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn documents_containing(&self, term: &str) -> Vec<DocId> {
        self.postings(term).iter().map(|p| p.doc_id).collect()
    }

    pub fn top_k_for_term(&self, term: &str, k: usize) -> &[Posting] {
        let list = self.postings(term);
        &list[..k.min(list.len())]
    }

    /// Documents containing at least one of `terms`.
    pub fn candidates<S: AsRef<str>>(&self, terms: &[S]) -> BTreeSet<DocId> {
        terms.iter().flat_map(|t| self.postings(t.as_ref())).map(|p| p.doc_id).collect()
    }

    /// OR query: a document scores the sum of its weights for every query term
    /// it contains. Highest score first, ties by ingestion order, at most `k`.
    pub fn or_query<S: AsRef<str>>(&self, terms: &[S], k: usize) -> Vec<(DocId, f64)> {
        let mut scores: BTreeMap<DocId, f64> = BTreeMap::new();
        for term in terms {
            for p in self.postings(term.as_ref()) {
                *scores.entry(p.doc_id).or_insert(0.0) += p.weight;
            }
        }
        let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    pub fn term_statistics(&self, term: &str) -> Option<TermStatistics> {
        let list = self.postings.get(term).filter(|l| !l.is_empty())?;
        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for p in list {
            min = min.min(p.weight);
            max = max.max(p.weight);
            sum += p.weight;
        }
        Some(TermStatistics {
            term: term.to_string(),
            document_frequency: list.len(),
            min_weight: min,
            max_weight: max,
            avg_weight: sum / list.len() as f64,
        })
    }

    pub fn index_statistics(&self) -> IndexStatistics {
        let total_terms = self.postings.len();
        let total_postings: usize = self.postings.values().map(Vec::len).sum();
        let mut longest: Option<(&str, usize)> = None;
        let mut shortest: Option<(&str, usize)> = None;
        // terms come in lexicographic order; strict comparisons keep the first on ties
        for (term, list) in &self.postings {
            let len = list.len();
            if longest.map_or(true, |(_, l)| len > l) {
                longest = Some((term.as_str(), len));
            }
            if shortest.map_or(true, |(_, l)| len < l) {
                shortest = Some((term.as_str(), len));
            }
        }
        let to_entry = |(term, length): (&str, usize)| PostingListLength { term: term.to_string(), length };
        IndexStatistics {
            total_terms,
            total_postings,
            avg_postings_per_term: if total_terms > 0 { total_postings as f64 / total_terms as f64 } else { 0.0 },
            longest_posting_list: longest.map(to_entry),
            shortest_posting_list: shortest.map(to_entry),
        }
    }

    /// Check that the index only refers to known terms and documents.
    pub fn validate(&self, vocabulary: &Vocabulary, num_docs: usize) -> Result<(), String> {
        if self.num_docs as usize != num_docs {
            return Err(format!("index covers {} documents, vectors cover {num_docs}", self.num_docs));
        }
        for (term, list) in &self.postings {
            if vocabulary.id(term).is_none() {
                return Err(format!("term {term:?} is not in the vocabulary"));
            }
            if let Some(p) = list.iter().find(|p| p.doc_id as usize >= num_docs) {
                return Err(format!("term {term:?} points at unknown document {}", p.doc_id));
            }
        }
        Ok(())
    }
}
