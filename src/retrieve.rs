//! TF-IDF lexical retriever for quick-chat context selection.
//!
//! Given a query and a topic, ranks the topic's stored transcripts by
//! cosine similarity in a TF-IDF vector space built over the transcripts
//! plus the lower-cased query (appended as the last "document").
//!
//! # Algorithm
//!
//! 1. Fetch all topic transcripts with non-empty text.
//! 2. Zero documents → [`RetrievedContext::NoTranscripts`] (not an error).
//! 3. `count <= max_context` → every document as an excerpt, unranked,
//!    no vectorization.
//! 4. Otherwise vectorize: unigrams + bigrams, vocabulary capped at
//!    `max_vocab` terms, smoothed idf, L2-normalized rows. No stop-word
//!    removal — the corpus is language-mixed and general stop lists are
//!    unreliable for it.
//! 5. Rank by cosine similarity, keep the top `max_context` above the
//!    `min_similarity` floor.
//! 6. Nothing above the floor → raw top `max_context` regardless of score.
//! 7. Vectorization failure (degenerate vocabulary) → first `max_context`
//!    documents unranked.
//!
//! The retriever never returns an empty excerpt list when at least one
//! topic-matching transcript exists.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::config::RetrievalConfig;
use crate::models::{Excerpt, TranscriptRecord};
use crate::store::TranscriptStore;

/// Context selected for one chat query.
#[derive(Debug, Clone)]
pub enum RetrievedContext {
    /// Nothing stored for the topic; a sentinel, not an error.
    NoTranscripts,
    /// Ranked excerpts, best first.
    Excerpts(Vec<Excerpt>),
}

impl RetrievedContext {
    /// Render as prompt context: `"{title}\n{window}..."` blocks in rank
    /// order, separated by blank lines.
    pub fn render(&self) -> String {
        match self {
            RetrievedContext::NoTranscripts => {
                "No transcripts stored for this topic.".to_string()
            }
            RetrievedContext::Excerpts(excerpts) => excerpts
                .iter()
                .map(|e| format!("{}\n{}...", e.title, e.text_window))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    pub fn excerpts(&self) -> &[Excerpt] {
        match self {
            RetrievedContext::NoTranscripts => &[],
            RetrievedContext::Excerpts(e) => e,
        }
    }
}

/// Select the most relevant transcript excerpts for a chat query.
pub async fn find_relevant_context(
    store: &dyn TranscriptStore,
    query: &str,
    topic: &str,
    params: &RetrievalConfig,
) -> Result<RetrievedContext> {
    let records = store.by_topic(topic).await?;

    if records.is_empty() {
        return Ok(RetrievedContext::NoTranscripts);
    }

    // Few documents: return them all, no ranking needed.
    if records.len() <= params.max_context {
        let excerpts = records
            .iter()
            .map(|r| make_excerpt(r, 0.0, params.excerpt_chars))
            .collect();
        return Ok(RetrievedContext::Excerpts(excerpts));
    }

    let ranked = match rank_by_similarity(&records, query, params) {
        Ok(ranked) => ranked,
        // Degenerate corpus (e.g. punctuation-only text): fall back to the
        // first documents unranked rather than failing the chat turn.
        Err(_) => (0..params.max_context).map(|i| (i, 0.0)).collect(),
    };

    let excerpts = ranked
        .iter()
        .map(|&(idx, sim)| make_excerpt(&records[idx], sim, params.excerpt_chars))
        .collect();

    Ok(RetrievedContext::Excerpts(excerpts))
}

/// Rank documents against the query, returning `(index, similarity)` pairs,
/// best first, at most `max_context` entries, never empty.
fn rank_by_similarity(
    records: &[TranscriptRecord],
    query: &str,
    params: &RetrievalConfig,
) -> Result<Vec<(usize, f64)>> {
    let mut texts: Vec<String> = records.iter().map(|r| r.text().to_string()).collect();
    texts.push(query.to_lowercase());

    let mut vectors = tfidf_vectors(&texts, params.max_vocab)?;
    let query_vec = match vectors.pop() {
        Some(v) => v,
        None => bail!("vectorization produced no rows"),
    };
    let doc_vecs = vectors;

    let mut scored: Vec<(usize, f64)> = doc_vecs
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine_similarity(&query_vec, v)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(params.max_context);

    let above_floor: Vec<(usize, f64)> = scored
        .iter()
        .copied()
        .filter(|&(_, sim)| sim > params.min_similarity)
        .collect();

    // Nothing cleared the floor: keep the raw top results anyway.
    if above_floor.is_empty() {
        return Ok(scored);
    }

    Ok(above_floor)
}

fn make_excerpt(record: &TranscriptRecord, relevance: f64, window: usize) -> Excerpt {
    Excerpt {
        title: record.title.clone(),
        text_window: truncate_chars(record.text(), window),
        relevance,
    }
}

/// Truncate to at most `max_chars` characters, respecting UTF-8 boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// ============ TF-IDF vectorization ============

/// Lowercased alphanumeric word tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// Unigrams plus adjacent-word bigrams.
fn terms_of(text: &str) -> Vec<String> {
    let words = tokenize(text);
    let mut terms = words.clone();
    for pair in words.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}

/// The `max_vocab` most frequent terms across the corpus, ties broken
/// lexicographically for determinism.
fn build_vocabulary(docs_terms: &[Vec<String>], max_vocab: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for doc in docs_terms {
        for term in doc {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked.truncate(max_vocab);
    ranked.into_iter().map(|(t, _)| t.to_string()).collect()
}

/// Build L2-normalized TF-IDF row vectors for every text in the corpus.
///
/// Weighting: `tf × (ln((1+n)/(1+df)) + 1)` (smoothed idf). Fails when the
/// corpus yields an empty vocabulary.
pub fn tfidf_vectors(texts: &[String], max_vocab: usize) -> Result<Vec<Vec<f64>>> {
    let docs_terms: Vec<Vec<String>> = texts.iter().map(|t| terms_of(t)).collect();
    let vocabulary = build_vocabulary(&docs_terms, max_vocab);

    if vocabulary.is_empty() {
        bail!("degenerate vocabulary: no indexable terms in corpus");
    }

    let index: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let n_docs = docs_terms.len();

    // Document frequency per vocabulary term.
    let mut df = vec![0usize; vocabulary.len()];
    for doc in &docs_terms {
        let mut seen = vec![false; vocabulary.len()];
        for term in doc {
            if let Some(&i) = index.get(term.as_str()) {
                if !seen[i] {
                    seen[i] = true;
                    df[i] += 1;
                }
            }
        }
    }

    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1.0 + n_docs as f64) / (1.0 + d as f64)).ln() + 1.0)
        .collect();

    let mut vectors = Vec::with_capacity(n_docs);
    for doc in &docs_terms {
        let mut row = vec![0.0f64; vocabulary.len()];
        for term in doc {
            if let Some(&i) = index.get(term.as_str()) {
                row[i] += 1.0;
            }
        }
        for (i, value) in row.iter_mut().enumerate() {
            *value *= idf[i];
        }

        let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > f64::EPSILON {
            for value in row.iter_mut() {
                *value /= norm;
            }
        }
        vectors.push(row);
    }

    Ok(vectors)
}

/// Cosine similarity between two vectors. `0.0` for mismatched lengths or
/// zero-magnitude inputs.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }

    dot / denom
}
