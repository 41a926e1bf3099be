use crate::error::Result;
use crate::index::{IndexStatistics, InvertedIndex, TermStatistics};
use crate::metadata::{Catalog, DrugRecord, SearchFilter};
use crate::persist::{load_index, load_metadata, IndexPaths};
use crate::similarity::cosine_similarity;
use crate::tokenizer::Preprocessor;
use crate::vectorizer::{Document, TfIdfModel};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

/// Sort raw `(id, text)` pairs by id, preprocess them in parallel, then fit
/// the model and derive its index. Every build path goes through here so the
/// ingestion order is always id order.
pub fn fit_corpus<I, S, T>(corpus: I, preprocessor: &Preprocessor) -> Result<(TfIdfModel, InvertedIndex)>
where
    I: IntoIterator<Item = (S, T)>,
    S: Into<String>,
    T: AsRef<str> + Sync,
{
    let mut raw: Vec<(String, T)> = corpus.into_iter().map(|(id, text)| (id.into(), text)).collect();
    raw.sort_by(|a, b| a.0.cmp(&b.0));
    let documents: Vec<Document> = raw
        .par_iter()
        .map(|(id, text)| Document { id: id.clone(), tokens: preprocessor.preprocess(text.as_ref()) })
        .collect();
    let empty = documents.iter().filter(|d| d.tokens.is_empty()).count();
    if empty > 0 {
        tracing::warn!(empty, "documents without any term after preprocessing");
    }
    let model = TfIdfModel::fit(&documents)?;
    let index = InvertedIndex::build(model.documents(), model.vocabulary());
    Ok((model, index))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
    pub record: Option<DrugRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Query terms after preprocessing, including ones missing from the vocabulary.
    pub query_tokens: Vec<String>,
}

/// Immutable search handle: built or loaded once, then shared by reference
/// (typically in an `Arc`) across any number of concurrent queries.
#[derive(Debug)]
pub struct SearchEngine {
    preprocessor: Preprocessor,
    model: TfIdfModel,
    index: InvertedIndex,
    catalog: Catalog,
}

impl SearchEngine {
    pub fn new(preprocessor: Preprocessor, model: TfIdfModel, index: InvertedIndex, catalog: Catalog) -> Self {
        Self { preprocessor, model, index, catalog }
    }

    /// Build in memory from raw `(id, text)` pairs. Documents are ingested in
    /// id order regardless of input order.
    pub fn build<I, S, T>(corpus: I, catalog: Catalog, preprocessor: Preprocessor) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str> + Sync,
    {
        let (model, index) = fit_corpus(corpus, &preprocessor)?;
        Ok(Self::new(preprocessor, model, index, catalog))
    }

    /// Load persisted artifacts from `index_dir` and the drug catalog. Queries
    /// are preprocessed with the configuration recorded at build time.
    pub fn open(index_dir: impl AsRef<Path>, metadata_file: impl AsRef<Path>) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        let (model, index, meta) = load_index(&paths)?;
        let catalog = load_metadata(metadata_file.as_ref())?;
        let missing = model.documents().iter().filter(|d| catalog.get(&d.doc_id).is_none()).count();
        if missing > 0 {
            tracing::warn!(missing, "documents without a catalog record");
        }
        tracing::info!(
            num_docs = model.num_documents(),
            num_terms = model.vocabulary().len(),
            records = catalog.len(),
            "search engine loaded"
        );
        Ok(Self::new(Preprocessor::from_config(meta.preprocess), model, index, catalog))
    }

    /// Rank every document by cosine similarity to `query`, then apply
    /// `filter` and keep at most `top_k` hits.
    ///
    /// Never fails: a query without usable terms, without vocabulary hits or
    /// whose matches are all filtered out yields an empty hit list.
    pub fn search(&self, query: &str, top_k: usize, filter: &SearchFilter) -> SearchResults {
        let query_tokens = self.preprocessor.preprocess(query);
        if query_tokens.is_empty() {
            return SearchResults::default();
        }
        let qvec = self.model.transform_query(&query_tokens);
        if qvec.is_empty() {
            return SearchResults { hits: Vec::new(), query_tokens };
        }

        let mut scored: Vec<(usize, f64)> = self
            .model
            .documents()
            .iter()
            .enumerate()
            .filter_map(|(pos, doc)| {
                let score = cosine_similarity(&qvec.weights, &doc.weights, qvec.magnitude, doc.magnitude);
                (score > 0.0).then_some((pos, score))
            })
            .collect();
        // stable: equal scores keep ingestion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let documents = self.model.documents();
        let hits: Vec<SearchHit> = scored
            .into_iter()
            .filter_map(|(pos, score)| {
                let doc_id = &documents[pos].doc_id;
                let record = self.catalog.get(doc_id);
                filter.admits(record).then(|| SearchHit { doc_id: doc_id.clone(), score, record: record.cloned() })
            })
            .take(top_k)
            .collect();

        tracing::debug!(query, tokens = query_tokens.len(), hits = hits.len(), "search");
        SearchResults { hits, query_tokens }
    }

    pub fn preprocess(&self, text: &str) -> Vec<String> { self.preprocessor.preprocess(text) }

    pub fn preprocessor(&self) -> &Preprocessor { &self.preprocessor }

    pub fn model(&self) -> &TfIdfModel { &self.model }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn catalog(&self) -> &Catalog { &self.catalog }

    pub fn document_details(&self, doc_id: &str) -> Option<&DrugRecord> { self.catalog.get(doc_id) }

    pub fn top_terms_in_doc(&self, doc_id: &str, k: usize) -> Vec<(String, f64)> { self.model.top_terms(doc_id, k) }

    pub fn term_statistics(&self, term: &str) -> Option<TermStatistics> { self.index.term_statistics(term) }

    pub fn index_statistics(&self) -> IndexStatistics { self.index.index_statistics() }
}
