use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use obat_core::{DrugRecord, Prescription, SearchEngine, SearchFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const SNIPPET_CHARS: usize = 200;
const DOC_TOP_TERMS: usize = 10;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// "Ya" or "Tidak"
    pub resep: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub query_tokens: Vec<String>,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
    #[serde(flatten)]
    pub record: Option<DrugRecord>,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

/// Load the index and catalog, then wire the router around them.
pub fn build_app(index_dir: impl AsRef<std::path::Path>, metadata_file: impl AsRef<std::path::Path>) -> Result<Router> {
    let engine = SearchEngine::open(index_dir, metadata_file)?;
    Ok(router(Arc::new(engine)))
}

pub fn router(engine: Arc<SearchEngine>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/terms/:term", get(term_handler))
        .route("/stats", get(stats_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let prescription = match params.resep.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<Prescription>().map_err(|e| (StatusCode::BAD_REQUEST, e))?),
        None => None,
    };
    let filter = SearchFilter { prescription, min_price: params.min_price, max_price: params.max_price };
    let k = params.k.clamp(1, MAX_K);

    let found = state.engine.search(&params.q, k, &filter);
    let raw_terms: Vec<&str> = params.q.split_whitespace().collect();
    let results: Vec<SearchHit> = found
        .hits
        .into_iter()
        .map(|hit| {
            let snippet = hit.record.as_ref().and_then(|r| snippet(&r.indikasi, &raw_terms));
            SearchHit { doc_id: hit.doc_id, score: hit.score, record: hit.record, snippet }
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::info!(query = %params.q, hits = results.len(), took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse {
        query: params.q,
        query_tokens: found.query_tokens,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state.engine.document_details(&doc_id);
    if record.is_none() && state.engine.model().document(&doc_id).is_none() {
        return Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found")));
    }
    let top_terms: Vec<TermWeight> = state
        .engine
        .top_terms_in_doc(&doc_id, DOC_TOP_TERMS)
        .into_iter()
        .map(|(term, weight)| TermWeight { term, weight })
        .collect();
    Ok(Json(serde_json::json!({
        "doc_id": doc_id,
        "record": record,
        "top_terms": top_terms,
    })))
}

pub async fn term_handler(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(info) = state.engine.model().term_info(&term) else {
        return Err((StatusCode::NOT_FOUND, format!("term {term} not in vocabulary")));
    };
    let statistics = state.engine.term_statistics(&term);
    Ok(Json(serde_json::json!({ "info": info, "statistics": statistics })))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let engine = &state.engine;
    Json(serde_json::json!({
        "num_docs": engine.model().num_documents(),
        "num_records": engine.catalog().len(),
        "index": engine.index_statistics(),
    }))
}

/// The first `SNIPPET_CHARS` characters of `text` with every raw query word
/// wrapped in `<em>`, matched case-insensitively.
fn snippet(text: &str, raw_terms: &[&str]) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let cut: String = text.chars().take(SNIPPET_CHARS).collect();
    Some(highlight_terms(&cut, raw_terms))
}

fn highlight_terms(snippet: &str, terms: &[&str]) -> String {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return snippet.to_string();
    }
    // one alternation so a match is never wrapped twice; whole words only
    let pattern = format!(r"\b(?:{})\b", alternatives.join("|"));
    let pat = match regex::RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(pat) => pat,
        Err(e) => {
            tracing::warn!(error = %e, "highlight pattern rejected");
            return snippet.to_string();
        }
    };
    pat.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_case_insensitively() {
        assert_eq!(highlight_terms("Demam dan sakit kepala", &["demam", "KEPALA"]), "<em>Demam</em> dan sakit <em>kepala</em>");
        assert_eq!(highlight_terms("tanpa kecocokan", &["batuk"]), "tanpa kecocokan");
        assert_eq!(highlight_terms("a+b (c)", &["a+b", "(c)"]), "<em>a+b</em> (<em>c</em>)");
    }

    #[test]
    fn highlights_whole_words_only() {
        assert_eq!(highlight_terms("asam dan asamnya", &["asam"]), "<em>asam</em> dan asamnya");
        assert_eq!(highlight_terms("Demam, nyeri.", &["demam,", "nyeri"]), "<em>Demam</em>, <em>nyeri</em>.");
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "demam ".repeat(100);
        let s = snippet(&long, &[]).unwrap();
        assert_eq!(s.chars().count(), SNIPPET_CHARS);
        assert!(snippet("   ", &["demam"]).is_none());
    }
}
