//! TF-IDF vectorizer.
//!
//! `TF(t, d) = count(t, d) / len(d)`, `IDF(t) = log10(N / df(t))` with no
//! smoothing, weight = `TF × IDF`. A term present in every document gets an IDF
//! of exactly 0. Its zero weights are still stored, so every term a document
//! contains has an entry in that document's vector.

use crate::error::{Error, Result};
use crate::{DocId, TermId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// term id → weight. Ordered so that sums over it are reproducible.
pub type SparseVector = BTreeMap<TermId, f64>;

/// A preprocessed corpus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub tokens: Vec<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { id: id.into(), tokens: tokens.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVector {
    pub doc_id: String,
    pub weights: SparseVector,
    /// L2 norm of `weights`.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryVector {
    pub weights: SparseVector,
    pub magnitude: f64,
}

impl QueryVector {
    pub fn is_empty(&self) -> bool { self.weights.is_empty() }
}

/// Bijective term ↔ id mapping. Ids follow the lexicographic order of terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, TermId>", try_from = "BTreeMap<String, TermId>")]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    /// Sort and deduplicate `terms`, then number them from 0.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = terms.into_iter().map(|t| t.as_ref().to_string()).collect();
        let terms: Vec<String> = sorted.into_iter().collect();
        let ids = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
        Self { terms, ids }
    }

    pub fn id(&self, term: &str) -> Option<TermId> { self.ids.get(term).copied() }

    pub fn term(&self, id: TermId) -> Option<&str> { self.terms.get(id as usize).map(String::as_str) }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &str)> + '_ {
        self.terms.iter().enumerate().map(|(i, t)| (i as TermId, t.as_str()))
    }
}

impl From<Vocabulary> for BTreeMap<String, TermId> {
    fn from(vocab: Vocabulary) -> Self { vocab.ids.into_iter().collect() }
}

impl TryFrom<BTreeMap<String, TermId>> for Vocabulary {
    type Error = String;

    fn try_from(map: BTreeMap<String, TermId>) -> std::result::Result<Self, Self::Error> {
        let mut terms = vec![None; map.len()];
        for (term, &id) in &map {
            let slot = terms
                .get_mut(id as usize)
                .ok_or_else(|| format!("term id {id} for {term:?} is outside 0..{}", map.len()))?;
            if slot.is_some() {
                return Err(format!("term id {id} assigned twice"));
            }
            *slot = Some(term.clone());
        }
        // every slot is filled: ids are unique and in range, and there are exactly len of them
        let terms: Vec<String> = terms.into_iter().flatten().collect();
        if terms.windows(2).any(|w| w[0] >= w[1]) {
            return Err("term ids are not in lexicographic term order".to_string());
        }
        let ids = map.into_iter().collect();
        Ok(Self { terms, ids })
    }
}

/// IDF for a term seen in `df` of `num_docs` documents. 0 when `df` is 0.
pub fn idf_value(num_docs: usize, df: u32) -> f64 {
    if df == 0 {
        return 0.0;
    }
    (num_docs as f64 / df as f64).log10()
}

/// Owned form of the persisted vector artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorBundle {
    pub df: Vec<u32>,
    pub idf: Vec<f64>,
    pub documents: Vec<DocumentVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermInfo {
    pub term: String,
    pub term_id: TermId,
    pub idf: f64,
    pub document_frequency: u32,
}

/// Fitted vocabulary, df/IDF tables and document vectors. Immutable once built.
#[derive(Debug, Clone)]
pub struct TfIdfModel {
    vocabulary: Vocabulary,
    df: Vec<u32>,
    idf: Vec<f64>,
    documents: Vec<DocumentVector>,
    positions: HashMap<String, DocId>,
}

impl TfIdfModel {
    /// Fit on `documents`; their order is the ingestion order used for every
    /// later tie-break.
    pub fn fit(documents: &[Document]) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::InvalidCorpus("corpus contains no documents".to_string()));
        }
        let positions = index_positions(documents.iter().map(|d| d.id.as_str()))
            .map_err(Error::InvalidCorpus)?;

        let counts: Vec<BTreeMap<&str, u32>> =
            documents.par_iter().map(|d| count_terms(&d.tokens)).collect();

        let vocabulary = Vocabulary::from_terms(counts.iter().flat_map(|c| c.keys().copied()));
        let mut df = vec![0u32; vocabulary.len()];
        for doc_counts in &counts {
            for term in doc_counts.keys() {
                if let Some(id) = vocabulary.id(term) {
                    df[id as usize] += 1;
                }
            }
        }
        let n = documents.len();
        let idf: Vec<f64> = df.iter().map(|&d| idf_value(n, d)).collect();

        let vectors: Vec<DocumentVector> = documents
            .par_iter()
            .zip(&counts)
            .map(|(doc, doc_counts)| {
                let (weights, magnitude) = weigh(doc_counts, doc.tokens.len(), &vocabulary, &idf);
                DocumentVector { doc_id: doc.id.clone(), weights, magnitude }
            })
            .collect();

        tracing::info!(num_docs = n, num_terms = vocabulary.len(), "tf-idf model fitted");
        Ok(Self { vocabulary, df, idf, documents: vectors, positions })
    }

    /// Reassemble a model from persisted parts, checking that they agree.
    pub fn from_parts(vocabulary: Vocabulary, bundle: VectorBundle) -> std::result::Result<Self, String> {
        let VectorBundle { df, idf, documents } = bundle;
        let v = vocabulary.len();
        if df.len() != v || idf.len() != v {
            return Err(format!(
                "df/idf tables have {}/{} entries for a vocabulary of {v}",
                df.len(),
                idf.len()
            ));
        }
        if documents.is_empty() {
            return Err("no document vectors".to_string());
        }
        if let Some(bad) = idf.iter().find(|x| !x.is_finite() || **x < 0.0) {
            return Err(format!("invalid idf value {bad}"));
        }
        for doc in &documents {
            if let Some(&tid) = doc.weights.keys().find(|&&tid| tid as usize >= v) {
                return Err(format!("document {} references unknown term id {tid}", doc.doc_id));
            }
            if !doc.magnitude.is_finite() || doc.magnitude < 0.0 {
                return Err(format!("document {} has invalid magnitude", doc.doc_id));
            }
        }
        let positions = index_positions(documents.iter().map(|d| d.doc_id.as_str()))?;
        Ok(Self { vocabulary, df, idf, documents, positions })
    }

    /// Vectorize query terms with the query length as TF denominator.
    /// Out-of-vocabulary terms are dropped silently.
    pub fn transform_query<S: AsRef<str>>(&self, tokens: &[S]) -> QueryVector {
        let counts = count_terms(tokens);
        let (weights, magnitude) = weigh(&counts, tokens.len(), &self.vocabulary, &self.idf);
        QueryVector { weights, magnitude }
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn documents(&self) -> &[DocumentVector] { &self.documents }

    pub fn num_documents(&self) -> usize { self.documents.len() }

    /// Document frequencies indexed by term id.
    pub fn df_table(&self) -> &[u32] { &self.df }

    /// IDF values indexed by term id.
    pub fn idf_table(&self) -> &[f64] { &self.idf }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.id(term).map(|id| self.idf[id as usize])
    }

    pub fn document_frequency(&self, term: &str) -> Option<u32> {
        self.vocabulary.id(term).map(|id| self.df[id as usize])
    }

    /// Ingestion position of a document.
    pub fn position(&self, doc_id: &str) -> Option<DocId> { self.positions.get(doc_id).copied() }

    pub fn document(&self, doc_id: &str) -> Option<&DocumentVector> {
        self.position(doc_id).map(|p| &self.documents[p as usize])
    }

    pub fn term_info(&self, term: &str) -> Option<TermInfo> {
        let id = self.vocabulary.id(term)?;
        Some(TermInfo {
            term: term.to_string(),
            term_id: id,
            idf: self.idf[id as usize],
            document_frequency: self.df[id as usize],
        })
    }

    /// Highest-weighted terms of a document; equal weights keep term id order.
    pub fn top_terms(&self, doc_id: &str, k: usize) -> Vec<(String, f64)> {
        let Some(doc) = self.document(doc_id) else {
            return Vec::new();
        };
        let mut ranked: Vec<(TermId, f64)> = doc.weights.iter().map(|(&t, &w)| (t, w)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(k)
            .filter_map(|(t, w)| self.vocabulary.term(t).map(|term| (term.to_string(), w)))
            .collect()
    }
}

fn count_terms<S: AsRef<str>>(tokens: &[S]) -> BTreeMap<&str, u32> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_ref()).or_insert(0) += 1;
    }
    counts
}

fn weigh(counts: &BTreeMap<&str, u32>, length: usize, vocabulary: &Vocabulary, idf: &[f64]) -> (SparseVector, f64) {
    let mut weights = SparseVector::new();
    if length == 0 {
        return (weights, 0.0);
    }
    let mut sum_sq = 0.0;
    for (term, &count) in counts {
        let Some(id) = vocabulary.id(term) else { continue };
        let weight = (count as f64 / length as f64) * idf[id as usize];
        sum_sq += weight * weight;
        weights.insert(id, weight);
    }
    (weights, sum_sq.sqrt())
}

fn index_positions<'a>(ids: impl Iterator<Item = &'a str>) -> std::result::Result<HashMap<String, DocId>, String> {
    let mut positions = HashMap::new();
    for (pos, id) in ids.enumerate() {
        if positions.insert(id.to_string(), pos as DocId).is_some() {
            return Err(format!("duplicate document id {id}"));
        }
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("DOC001", ["demam", "sakit", "kepala", "reda", "nyeri"]),
            Document::new("DOC002", ["batuk", "dahak", "reda", "tenggorok"]),
            Document::new("DOC003", ["maag", "asam", "lambung", "nyeri", "perut"]),
            Document::new("DOC004", ["demam", "panas", "reda", "badan"]),
            Document::new("DOC005", ["batuk", "kering", "reda", "tenggorok", "gatal"]),
        ]
    }

    #[test]
    fn vocabulary_is_sorted_and_consecutive() {
        let model = TfIdfModel::fit(&corpus()).unwrap();
        let vocab = model.vocabulary();
        assert_eq!(vocab.len(), 16);
        assert_eq!(vocab.id("asam"), Some(0));
        assert_eq!(vocab.term(0), Some("asam"));
        let terms: Vec<&str> = vocab.iter().map(|(_, t)| t).collect();
        let mut sorted = terms.clone();
        sorted.sort();
        assert_eq!(terms, sorted);
    }

    #[test]
    fn idf_values() {
        let model = TfIdfModel::fit(&corpus()).unwrap();
        assert!((model.idf("reda").unwrap() - 0.0969).abs() < 1e-4);
        assert!((model.idf("demam").unwrap() - 0.3979).abs() < 1e-4);
        assert!((model.idf("sakit").unwrap() - 5f64.log10()).abs() < 1e-12);
        assert_eq!(model.document_frequency("reda"), Some(4));
        assert_eq!(model.idf("unknown"), None);
    }

    #[test]
    fn idf_zero_for_universal_term() {
        let docs = vec![Document::new("a", ["obat", "demam"]), Document::new("b", ["obat", "batuk"])];
        let model = TfIdfModel::fit(&docs).unwrap();
        assert_eq!(model.idf("obat"), Some(0.0));
        // zero weight is still stored so the posting list length matches df
        let tid = model.vocabulary().id("obat").unwrap();
        assert_eq!(model.document("a").unwrap().weights.get(&tid), Some(&0.0));
        let q = model.transform_query(&["obat"]);
        assert!(!q.is_empty());
        assert_eq!(q.magnitude, 0.0);
    }

    #[test]
    fn idf_decreases_with_df() {
        let mut last = f64::INFINITY;
        for df in 1..=10 {
            let v = idf_value(10, df);
            assert!(v < last);
            assert!(v >= 0.0);
            last = v;
        }
        assert_eq!(idf_value(10, 10), 0.0);
    }

    #[test]
    fn document_weights_and_magnitude() {
        let model = TfIdfModel::fit(&corpus()).unwrap();
        let doc = model.document("DOC004").unwrap();
        let demam = model.vocabulary().id("demam").unwrap();
        let expected = 0.25 * (5.0f64 / 2.0).log10();
        assert!((doc.weights[&demam] - expected).abs() < 1e-12);
        let norm: f64 = doc.weights.values().map(|w| w * w).sum::<f64>().sqrt();
        assert!((doc.magnitude - norm).abs() < 1e-12);
    }

    #[test]
    fn repeated_terms_raise_tf() {
        let docs = vec![Document::new("a", ["nyeri", "nyeri", "otot"]), Document::new("b", ["batuk"])];
        let model = TfIdfModel::fit(&docs).unwrap();
        let nyeri = model.vocabulary().id("nyeri").unwrap();
        let w = model.document("a").unwrap().weights[&nyeri];
        assert!((w - (2.0 / 3.0) * 2f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn query_drops_oov_terms() {
        let model = TfIdfModel::fit(&corpus()).unwrap();
        let q = model.transform_query(&["demam", "zzz"]);
        assert_eq!(q.weights.len(), 1);
        let demam = model.vocabulary().id("demam").unwrap();
        // denominator is the full query length, OOV included
        assert!((q.weights[&demam] - 0.5 * model.idf("demam").unwrap()).abs() < 1e-12);

        let empty = model.transform_query(&["zzz", "yyy"]);
        assert!(empty.is_empty());
        assert_eq!(empty.magnitude, 0.0);
        assert!(model.transform_query::<&str>(&[]).is_empty());
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert!(matches!(TfIdfModel::fit(&[]), Err(Error::InvalidCorpus(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let docs = vec![Document::new("a", ["x"]), Document::new("a", ["y"])];
        assert!(matches!(TfIdfModel::fit(&docs), Err(Error::InvalidCorpus(_))));
    }

    #[test]
    fn empty_document_has_zero_magnitude() {
        let docs = vec![Document::new("a", Vec::<String>::new()), Document::new("b", ["batuk"])];
        let model = TfIdfModel::fit(&docs).unwrap();
        let a = model.document("a").unwrap();
        assert!(a.weights.is_empty());
        assert_eq!(a.magnitude, 0.0);
    }

    #[test]
    fn refit_is_deterministic() {
        let a = TfIdfModel::fit(&corpus()).unwrap();
        let b = TfIdfModel::fit(&corpus()).unwrap();
        assert_eq!(a.vocabulary(), b.vocabulary());
        assert_eq!(a.documents(), b.documents());
    }

    #[test]
    fn top_terms_and_term_info() {
        let model = TfIdfModel::fit(&corpus()).unwrap();
        let top = model.top_terms("DOC001", 2);
        assert_eq!(top.len(), 2);
        // kepala and sakit share the highest weight; lower term id first
        assert_eq!(top[0].0, "kepala");
        assert_eq!(top[1].0, "sakit");
        assert!(model.top_terms("nope", 3).is_empty());

        let info = model.term_info("batuk").unwrap();
        assert_eq!(info.document_frequency, 2);
        assert_eq!(info.term_id, model.vocabulary().id("batuk").unwrap());
        assert!(model.term_info("zzz").is_none());
    }

    #[test]
    fn vocabulary_map_round_trip_validates() {
        let vocab = Vocabulary::from_terms(["b", "a", "c", "a"]);
        let map: BTreeMap<String, TermId> = vocab.clone().into();
        assert_eq!(Vocabulary::try_from(map).unwrap(), vocab);

        let mut gap = BTreeMap::new();
        gap.insert("a".to_string(), 0);
        gap.insert("b".to_string(), 2);
        assert!(Vocabulary::try_from(gap).is_err());

        let mut unordered = BTreeMap::new();
        unordered.insert("a".to_string(), 1);
        unordered.insert("b".to_string(), 0);
        assert!(Vocabulary::try_from(unordered).is_err());
    }

    #[test]
    fn from_parts_rejects_unknown_term_ids() {
        let model = TfIdfModel::fit(&corpus()).unwrap();
        let mut documents = model.documents().to_vec();
        documents[0].weights.insert(999, 0.5);
        let bundle = VectorBundle { df: model.df_table().to_vec(), idf: model.idf_table().to_vec(), documents };
        assert!(TfIdfModel::from_parts(model.vocabulary().clone(), bundle).is_err());
    }
}
