use obat_core::persist::{load_index, load_meta, save_index, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use obat_core::{Error, InvertedIndex, PreprocessConfig, SearchEngine, SearchFilter, TfIdfModel};
use obat_core::{Document, Preprocessor};
use std::fs;
use tempfile::tempdir;

fn build(dir: &std::path::Path) -> (TfIdfModel, InvertedIndex) {
    let pre = Preprocessor::default();
    let docs = vec![
        Document::new("OBT001", pre.preprocess("Paracetamol meredakan demam dan sakit kepala")),
        Document::new("OBT002", pre.preprocess("Obat batuk berdahak")),
        Document::new("OBT003", pre.preprocess("Antasida untuk maag dan nyeri lambung")),
    ];
    let model = TfIdfModel::fit(&docs).unwrap();
    let index = InvertedIndex::build(model.documents(), model.vocabulary());
    let meta = MetaFile {
        num_docs: model.num_documents() as u32,
        num_terms: model.vocabulary().len() as u32,
        created_at: "2024-01-01T00:00:00Z".into(),
        version: FORMAT_VERSION,
        preprocess: PreprocessConfig::default(),
    };
    save_index(&IndexPaths::new(dir), &model, &index, &meta).unwrap();
    (model, index)
}

fn write_catalog(path: &std::path::Path) {
    let json = serde_json::json!([
        {"id": "OBT001", "nama_obat": "Paracetamol", "indikasi": "Demam dan sakit kepala",
         "harga_min": 5000, "harga_max": 15000, "perlu_resep": "Tidak"},
        {"id": "OBT002", "nama_obat": "OBH", "harga_min": 12000, "harga_max": 25000, "perlu_resep": "Tidak"},
        {"id": "OBT003", "nama_obat": "Antasida", "harga_min": 8000, "harga_max": 20000, "perlu_resep": "Ya"}
    ]);
    fs::write(path, serde_json::to_vec(&json).unwrap()).unwrap();
}

#[test]
fn artifacts_round_trip() {
    let dir = tempdir().unwrap();
    let (model, index) = build(dir.path());
    let (loaded_model, loaded_index, meta) = load_index(&IndexPaths::new(dir.path())).unwrap();
    assert_eq!(loaded_model.vocabulary(), model.vocabulary());
    assert_eq!(loaded_model.documents(), model.documents());
    assert_eq!(loaded_model.idf_table(), model.idf_table());
    assert_eq!(loaded_index, index);
    assert_eq!(meta.num_docs, 3);
}

#[test]
fn opened_engine_matches_built_engine() {
    let dir = tempdir().unwrap();
    build(dir.path());
    let catalog = dir.path().join("obat_metadata.json");
    write_catalog(&catalog);
    let engine = SearchEngine::open(dir.path(), &catalog).unwrap();
    let res = engine.search("demam", 5, &SearchFilter::default());
    assert_eq!(res.hits.len(), 1);
    assert_eq!(res.hits[0].doc_id, "OBT001");
    assert_eq!(res.hits[0].record.as_ref().unwrap().nama_obat, "Paracetamol");
}

#[test]
fn inconsistent_artifacts_fail_at_load() {
    let dir = tempdir().unwrap();
    build(dir.path());
    let paths = IndexPaths::new(dir.path());
    let mut meta = load_meta(&paths).unwrap();
    meta.num_docs = 99;
    save_meta(&paths, &meta).unwrap();
    assert!(matches!(load_index(&paths), Err(Error::Load { artifact: "meta", .. })));

    fs::write(paths.vocabulary(), r#"{"demam": 0, "batuk": 5}"#).unwrap();
    assert!(matches!(load_index(&paths), Err(Error::Load { artifact: "vocabulary", .. })));
}

#[test]
fn missing_catalog_fails_open() {
    let dir = tempdir().unwrap();
    build(dir.path());
    let err = SearchEngine::open(dir.path(), dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, Error::Load { artifact: "metadata", .. }));
}
