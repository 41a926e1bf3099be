use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use obat_core::persist::{load_index, save_index, IndexPaths, MetaFile, FORMAT_VERSION};
use obat_core::{fit_corpus, LinguisticKind, PreprocessConfig, Preprocessor};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    body: String,
}

#[derive(Parser)]
#[command(name = "obat-indexer")]
#[command(about = "Build and inspect the drug catalog TF-IDF index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from .txt, .json or .jsonl files
    Build {
        /// Corpus path (file or directory)
        #[arg(long)]
        corpus: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = false)]
        no_stemming: bool,
        #[arg(long, default_value_t = false)]
        no_stopwords: bool,
        /// indonesian, english or none
        #[arg(long, default_value = "indonesian")]
        linguistic: LinguisticKind,
    },
    /// Print statistics of a built index
    Stats {
        #[arg(long)]
        index: PathBuf,
        /// How many terms to list by document frequency
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, output, no_stemming, no_stopwords, linguistic } => {
            let config = PreprocessConfig { stemming: !no_stemming, stopwords: !no_stopwords, linguistic };
            build_index(&corpus, &output, config)
        }
        Commands::Stats { index, top } => print_stats(&index, top),
    }
}

fn build_index(corpus: &Path, output: &Path, config: PreprocessConfig) -> Result<()> {
    let raw = read_corpus(corpus)?;
    if raw.is_empty() {
        bail!("no documents found under {}", corpus.display());
    }
    tracing::info!(num_docs = raw.len(), "ingested documents");

    let preprocessor = Preprocessor::from_config(config);
    let (model, index) = fit_corpus(raw.into_iter().map(|doc| (doc.id, doc.body)), &preprocessor)?;

    let out_paths = IndexPaths::new(output);
    let meta = MetaFile {
        num_docs: model.num_documents() as u32,
        num_terms: model.vocabulary().len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
        preprocess: config,
    };
    save_index(&out_paths, &model, &index, &meta)?;

    let stats = index.index_statistics();
    tracing::info!(
        output = %output.display(),
        num_docs = meta.num_docs,
        num_terms = stats.total_terms,
        total_postings = stats.total_postings,
        avg_postings_per_term = stats.avg_postings_per_term,
        "index build complete"
    );
    Ok(())
}

fn print_stats(index_dir: &Path, top: usize) -> Result<()> {
    let (model, index, meta) = load_index(&IndexPaths::new(index_dir))?;
    let stats = index.index_statistics();
    println!("created_at:            {}", meta.created_at);
    println!("documents:             {}", model.num_documents());
    println!("terms:                 {}", stats.total_terms);
    println!("postings:              {}", stats.total_postings);
    println!("avg postings per term: {:.2}", stats.avg_postings_per_term);
    if let Some(l) = &stats.longest_posting_list {
        println!("longest posting list:  {} ({})", l.term, l.length);
    }
    if let Some(s) = &stats.shortest_posting_list {
        println!("shortest posting list: {} ({})", s.term, s.length);
    }

    let mut by_df: Vec<(&str, u32)> =
        model.vocabulary().iter().map(|(id, term)| (term, model.df_table()[id as usize])).collect();
    by_df.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    println!("top {} terms by document frequency:", top.min(by_df.len()));
    for (term, df) in by_df.into_iter().take(top) {
        let idf = model.idf(term).unwrap_or_default();
        println!("  {term:<20} df={df:<6} idf={idf:.4}");
    }
    Ok(())
}

fn read_corpus(input_path: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && corpus_extension(p).is_some() {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("corpus path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        match corpus_extension(&file) {
            Some("txt") => docs.push(read_txt(&file)?),
            Some("jsonl") => read_jsonl(&file, &mut docs)?,
            Some("json") => read_json(&file, &mut docs)?,
            _ => tracing::warn!(file = %file.display(), "skipping file with unknown extension"),
        }
    }
    Ok(docs)
}

fn corpus_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str()).filter(|ext| matches!(*ext, "txt" | "json" | "jsonl"))
}

fn read_txt(file: &Path) -> Result<InputDoc> {
    let id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("file name of {} is not valid UTF-8", file.display()))?
        .to_string();
    let body = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(InputDoc { id, body })
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc =
            serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), n + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).with_context(|| format!("record in {}", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            docs.push(serde_json::from_value(json).with_context(|| format!("record in {}", file.display()))?)
        }
        _ => tracing::warn!(file = %file.display(), "skipping json that is neither an object nor an array"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_corpus(dir: &Path) {
        fs::write(dir.join("OBT003.txt"), "Antasida untuk maag").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/OBT001.txt"), "Paracetamol meredakan demam").unwrap();
        fs::write(
            dir.join("batch.json"),
            r#"[{"id": "OBT005", "body": "Obat batuk berdahak"}, {"id": "OBT002", "body": "Ibuprofen meredakan nyeri"}]"#,
        )
        .unwrap();
        fs::write(dir.join("single.json"), r#"{"id": "OBT006", "body": "Salep gatal kulit"}"#).unwrap();
        fs::write(dir.join("extra.jsonl"), "{\"id\": \"OBT004\", \"body\": \"Vitamin daya tahan\"}\n\n   \n").unwrap();
        fs::write(dir.join("notes.md"), "ignored").unwrap();
    }

    #[test]
    fn reads_every_supported_format() {
        let dir = tempdir().unwrap();
        write_corpus(dir.path());
        let mut docs = read_corpus(dir.path()).unwrap();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["OBT001", "OBT002", "OBT003", "OBT004", "OBT005", "OBT006"]);
        assert_eq!(docs[0].body, "Paracetamol meredakan demam");
        assert_eq!(docs[2].body, "Antasida untuk maag");
        assert_eq!(docs[5].body, "Salep gatal kulit");
    }

    #[test]
    fn ingestion_follows_id_order() {
        let dir = tempdir().unwrap();
        write_corpus(dir.path());
        let docs = read_corpus(dir.path()).unwrap();
        let (model, _) = fit_corpus(docs.into_iter().map(|d| (d.id, d.body)), &Preprocessor::default()).unwrap();
        let ids: Vec<&str> = model.documents().iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["OBT001", "OBT002", "OBT003", "OBT004", "OBT005", "OBT006"]);
    }

    #[test]
    fn single_file_corpus() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("one.jsonl");
        fs::write(&file, "{\"id\": \"b\", \"body\": \"batuk\"}\n{\"id\": \"a\", \"body\": \"demam\"}\n").unwrap();
        let docs = read_corpus(&file).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "b");
    }

    #[test]
    fn bad_input_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(read_corpus(&dir.path().join("missing")).is_err());

        fs::write(dir.path().join("broken.jsonl"), "{\"id\": \"a\"}\n").unwrap();
        let err = read_corpus(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("broken.jsonl:1"));
    }

    #[test]
    fn malformed_single_object_names_its_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("single.json");
        fs::write(&file, r#"{"id": "OBT001"}"#).unwrap();
        let err = read_corpus(&file).unwrap_err();
        assert!(format!("{err:#}").contains("record in"));
        assert!(format!("{err:#}").contains("single.json"));
    }

    #[test]
    fn empty_corpus_fails_build() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let err = build_index(dir.path(), out.path(), PreprocessConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no documents"));
    }

    #[test]
    fn build_writes_loadable_artifacts() {
        let dir = tempdir().unwrap();
        write_corpus(dir.path());
        let out = tempdir().unwrap();
        let config = PreprocessConfig { stemming: false, ..Default::default() };
        build_index(dir.path(), out.path(), config).unwrap();
        let (model, index, meta) = load_index(&IndexPaths::new(out.path())).unwrap();
        assert_eq!(model.num_documents(), 6);
        assert_eq!(meta.preprocess, config);
        assert!(!meta.created_at.is_empty());
        // stemming off keeps the inflected form
        assert_eq!(index.documents_containing("meredakan"), vec![0, 1]);
    }
}
