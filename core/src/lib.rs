//! Indexing and ranking core of the drug catalog search engine.
//!
//! Build path: raw text → [`Preprocessor`] → [`TfIdfModel::fit`] →
//! [`InvertedIndex::build`]. Query path: [`SearchEngine::search`].

pub mod config;
pub mod error;
pub mod index;
pub mod linguistic;
pub mod metadata;
pub mod persist;
pub mod search;
pub mod similarity;
pub mod tokenizer;
pub mod vectorizer;

pub type TermId = u32;
/// Position of a document in ingestion order.
pub type DocId = u32;

pub use config::{LinguisticKind, PreprocessConfig};
pub use error::{Error, Result};
pub use index::{IndexStatistics, InvertedIndex, Posting, TermStatistics};
pub use linguistic::{IndonesianLinguistic, Linguistic, NoopLinguistic, SnowballLinguistic};
pub use metadata::{Catalog, DrugRecord, Prescription, SearchFilter};
pub use search::{fit_corpus, SearchEngine, SearchHit, SearchResults};
pub use tokenizer::Preprocessor;
pub use vectorizer::{Document, DocumentVector, QueryVector, SparseVector, TfIdfModel, Vocabulary};
