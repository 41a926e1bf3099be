use crate::config::PreprocessConfig;
use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::metadata::{Catalog, DrugRecord};
use crate::vectorizer::{DocumentVector, TfIdfModel, VectorBundle, Vocabulary};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.json") }
    pub fn vectors(&self) -> PathBuf { self.root.join("vectors.bin") }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

// Borrowed twin of `VectorBundle`; serializes to the same bytes.
#[derive(Serialize)]
struct VectorBundleRef<'a> {
    df: &'a [u32],
    idf: &'a [f64],
    documents: &'a [DocumentVector],
}

fn write_bytes(artifact: &'static str, path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir).map_err(|e| Error::save(artifact, dir, e))?;
    }
    let mut f = File::create(path).map_err(|e| Error::save(artifact, path, e))?;
    f.write_all(bytes).map_err(|e| Error::save(artifact, path, e))?;
    Ok(())
}

fn read_bytes(artifact: &'static str, path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).map_err(|e| Error::load(artifact, path, e))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(|e| Error::load(artifact, path, e))?;
    Ok(buf)
}

pub fn save_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> {
    let path = paths.vocabulary();
    let json = serde_json::to_vec_pretty(vocabulary).map_err(|e| Error::save("vocabulary", &path, e))?;
    write_bytes("vocabulary", &path, &json)
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    let path = paths.vocabulary();
    let buf = read_bytes("vocabulary", &path)?;
    serde_json::from_slice(&buf).map_err(|e| Error::load("vocabulary", &path, e))
}

pub fn save_vectors(paths: &IndexPaths, model: &TfIdfModel) -> Result<()> {
    let path = paths.vectors();
    let bundle = VectorBundleRef { df: model.df_table(), idf: model.idf_table(), documents: model.documents() };
    let bytes = bincode::serialize(&bundle).map_err(|e| Error::save("vectors", &path, e))?;
    write_bytes("vectors", &path, &bytes)
}

pub fn load_vectors(paths: &IndexPaths) -> Result<VectorBundle> {
    let path = paths.vectors();
    let buf = read_bytes("vectors", &path)?;
    bincode::deserialize(&buf).map_err(|e| Error::load("vectors", &path, e))
}

pub fn save_inverted_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    let path = paths.inverted_index();
    let bytes = bincode::serialize(index).map_err(|e| Error::save("inverted index", &path, e))?;
    write_bytes("inverted index", &path, &bytes)
}

pub fn load_inverted_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let path = paths.inverted_index();
    let buf = read_bytes("inverted index", &path)?;
    bincode::deserialize(&buf).map_err(|e| Error::load("inverted index", &path, e))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let path = paths.meta();
    let json = serde_json::to_vec_pretty(meta).map_err(|e| Error::save("meta", &path, e))?;
    write_bytes("meta", &path, &json)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let buf = read_bytes("meta", &path)?;
    let meta: MetaFile = serde_json::from_slice(&buf).map_err(|e| Error::load("meta", &path, e))?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::load("meta", &path, format!("unsupported index version {}", meta.version)));
    }
    Ok(meta)
}

/// Drug catalog: a JSON array of records.
pub fn load_metadata(path: &Path) -> Result<Catalog> {
    let buf = read_bytes("metadata", path)?;
    let records: Vec<DrugRecord> = serde_json::from_slice(&buf).map_err(|e| Error::load("metadata", path, e))?;
    Catalog::from_records(records).map_err(|e| Error::load("metadata", path, e))
}

/// Persist every build artifact of a fitted model and its index.
pub fn save_index(paths: &IndexPaths, model: &TfIdfModel, index: &InvertedIndex, meta: &MetaFile) -> Result<()> {
    save_vocabulary(paths, model.vocabulary())?;
    save_vectors(paths, model)?;
    save_inverted_index(paths, index)?;
    save_meta(paths, meta)?;
    tracing::info!(root = %paths.root.display(), "index artifacts written");
    Ok(())
}

/// Load and cross-check the persisted model and index.
pub fn load_index(paths: &IndexPaths) -> Result<(TfIdfModel, InvertedIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    let vocabulary = load_vocabulary(paths)?;
    let bundle = load_vectors(paths)?;
    let model = TfIdfModel::from_parts(vocabulary, bundle).map_err(|e| Error::load("vectors", paths.vectors(), e))?;
    let index = load_inverted_index(paths)?;
    index
        .validate(model.vocabulary(), model.num_documents())
        .map_err(|e| Error::load("inverted index", paths.inverted_index(), e))?;
    if meta.num_docs as usize != model.num_documents() {
        return Err(Error::load(
            "meta",
            paths.meta(),
            format!("meta lists {} documents, vectors hold {}", meta.num_docs, model.num_documents()),
        ));
    }
    Ok((model, index, meta))
}
