//! Research-gap identification.
//!
//! After the first analysis pass, one completion call looks across the
//! successful analyses and names sub-topics the corpus covers poorly. The
//! model is asked for a rigid two-line format per gap:
//!
//! ```text
//! LABEL: <short sub-topic>
//! REASON: <one-sentence rationale>
//! ```
//!
//! [`parse_gaps`] is deliberately permissive: models drift from formats, so
//! the parser scans line-by-line, emits a gap whenever it has collected both
//! halves, and returns an empty list (never an error) for unparseable text.
//! Gap identification failing — at the call or the parse — degrades the run
//! to zero gaps; it never aborts research.

use crate::completion::{CompletionRequest, TextCompletion};
use crate::config::ResearchConfig;
use crate::models::{DocumentAnalysis, ResearchGap};
use crate::retrieve::truncate_chars;

/// At most this many gaps are acted on per run; each gap triggers a focused
/// search, so the cap bounds quota spend.
pub const MAX_GAPS: usize = 5;

/// Ask the model which sub-topics the current analyses leave uncovered.
///
/// Returns an empty list when the call fails or the reply does not parse.
pub async fn identify_gaps(
    completion: &dyn TextCompletion,
    topic: &str,
    query: &str,
    analyses: &[DocumentAnalysis],
    params: &ResearchConfig,
) -> Vec<ResearchGap> {
    let digest = analyses
        .iter()
        .filter_map(|a| {
            a.content()
                .map(|c| format!("{}:\n{}", a.title, truncate_chars(c, params.gap_context_chars)))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    if digest.is_empty() {
        return Vec::new();
    }

    let request = CompletionRequest {
        system: "You audit research coverage and name what is missing.".to_string(),
        user: format!(
            "Topic: {topic}\n\
             Research question: {query}\n\n\
             Analyses gathered so far:\n\n{digest}\n\n\
             Identify up to {max} sub-topics the question needs that these \
             analyses cover poorly or not at all. For each, reply with \
             exactly two lines:\n\
             LABEL: <short sub-topic, a few words>\n\
             REASON: <one sentence on why it matters>",
            topic = topic,
            query = query,
            digest = digest,
            max = MAX_GAPS,
        ),
        max_tokens: 600,
        temperature: 0.3,
    };

    match completion.complete(&request).await {
        Ok(text) => parse_gaps(&text),
        Err(_) => Vec::new(),
    }
}

/// Parse `LABEL:`/`REASON:` pairs out of free-form model output.
///
/// A gap is emitted once both halves have been seen; a `LABEL:` line starts
/// a new pair (flushing nothing — an unpaired label is discarded when the
/// next label arrives). Prefix matching is case-insensitive and tolerates
/// list markers (`-`, `*`, `1.`). At most [`MAX_GAPS`] gaps are returned.
pub fn parse_gaps(text: &str) -> Vec<ResearchGap> {
    let mut gaps: Vec<ResearchGap> = Vec::new();
    let mut label: Option<String> = None;
    let mut rationale: Option<String> = None;

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(['-', '*', '•'])
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['.', ')'])
            .trim();

        if let Some(rest) = strip_prefix_ci(line, "LABEL:") {
            // New pair begins; any half-finished pair is dropped.
            label = Some(rest.trim().to_string());
            rationale = None;
        } else if let Some(rest) = strip_prefix_ci(line, "REASON:") {
            rationale = Some(rest.trim().to_string());
        }

        if let (Some(l), Some(r)) = (&label, &rationale) {
            if !l.is_empty() && !r.is_empty() {
                gaps.push(ResearchGap {
                    label: l.clone(),
                    rationale: r.clone(),
                });
            }
            label = None;
            rationale = None;

            if gaps.len() == MAX_GAPS {
                break;
            }
        }
    }

    gaps
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    match line.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&line[prefix.len()..]),
        _ => None,
    }
}
