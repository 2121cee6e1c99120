//! Per-document analysis stage of the research pipeline.
//!
//! Each transcript is analyzed independently against the research question.
//! Two modes exist:
//!
//! - **Full-document**: one completion call over a bounded sample of the
//!   transcript. The default.
//! - **Token-optimized**: transcripts estimated above the configured token
//!   budget are split into sentence-aligned chunks, each chunk analyzed with
//!   a small call, and the per-chunk findings consolidated with one final
//!   call. Chunks the model marks as irrelevant are dropped before
//!   consolidation.
//!
//! A completion failure never aborts the run: it becomes
//! [`AnalysisOutcome::Failure`] and the document is skipped downstream.

use crate::chunk::{chunk_transcript, estimate_tokens};
use crate::completion::{CompletionError, CompletionRequest, TextCompletion};
use crate::config::ResearchConfig;
use crate::models::{AnalysisOutcome, Chunk, DocumentAnalysis, TranscriptRecord};
use crate::retrieve::truncate_chars;

/// Sentinel the chunk prompt asks the model to emit when a fragment has
/// nothing relevant to the research question. Matched case-insensitively
/// as a substring, since models decorate their refusals.
pub const CHUNK_SENTINEL: &str = "NO RELEVANT CONTENT";

/// Analyzes transcripts against a research question, one document at a time.
pub struct DocumentAnalyzer<'a> {
    completion: &'a dyn TextCompletion,
    params: &'a ResearchConfig,
}

impl<'a> DocumentAnalyzer<'a> {
    pub fn new(completion: &'a dyn TextCompletion, params: &'a ResearchConfig) -> Self {
        Self { completion, params }
    }

    /// Analyze one transcript, choosing the mode by the caller's flag.
    ///
    /// With `token_optimized` set, transcripts estimated above the token
    /// budget take the chunked path; everything else takes one call.
    pub async fn analyze(
        &self,
        record: &TranscriptRecord,
        query: &str,
        token_optimized: bool,
    ) -> DocumentAnalysis {
        let outcome = if token_optimized
            && estimate_tokens(record.text()) >= self.params.chunk_token_budget
        {
            self.analyze_chunked(record, query).await
        } else {
            self.analyze_full(record, query).await
        };

        DocumentAnalysis {
            video_id: record.video_id.clone(),
            title: record.title.clone(),
            outcome,
        }
    }

    /// Single-call analysis over a bounded sample of the transcript.
    async fn analyze_full(&self, record: &TranscriptRecord, query: &str) -> AnalysisOutcome {
        let sample = truncate_chars(record.text(), self.params.sample_chars);

        let request = CompletionRequest {
            system: "You are a research analyst. Extract structured, specific findings \
                     from source material. Be concrete; avoid generic statements."
                .to_string(),
            user: format!(
                "Research question: {query}\n\n\
                 Source: {title}\n\
                 Transcript sample:\n{sample}\n\n\
                 Provide:\n\
                 1. 3-5 key insights relevant to the question\n\
                 2. Specific data, numbers, or facts mentioned\n\
                 3. Notable perspectives or arguments\n\
                 4. Concrete examples or cases\n\
                 5. A relevance rating from 1 to 10 for this source",
                query = query,
                title = record.title,
                sample = sample,
            ),
            max_tokens: 800,
            temperature: 0.3,
        };

        match self.completion.complete(&request).await {
            Ok(text) => AnalysisOutcome::Success(text),
            Err(e) => AnalysisOutcome::Failure(e.to_string()),
        }
    }

    /// Chunk the transcript, analyze each chunk, consolidate the findings.
    async fn analyze_chunked(&self, record: &TranscriptRecord, query: &str) -> AnalysisOutcome {
        let chunks = chunk_transcript(&record.title, record.text(), self.params.chunk_chars);

        let mut findings: Vec<String> = Vec::new();
        let mut last_error: Option<CompletionError> = None;

        for chunk in &chunks {
            match self.analyze_chunk(chunk, query).await {
                Ok(Some(text)) => findings.push(text),
                Ok(None) => {} // irrelevant fragment, dropped
                Err(e) => last_error = Some(e),
            }
        }

        if findings.is_empty() {
            return match last_error {
                Some(e) => AnalysisOutcome::Failure(e.to_string()),
                None => AnalysisOutcome::Failure(format!(
                    "no chunk of \"{}\" was relevant to the question",
                    record.title
                )),
            };
        }

        // One relevant chunk needs no consolidation call.
        if findings.len() == 1 {
            return AnalysisOutcome::Success(findings.pop().unwrap_or_default());
        }

        self.consolidate(&record.title, query, &findings).await
    }

    /// Small, cold call over one chunk. `Ok(None)` when the model marked
    /// the fragment irrelevant.
    async fn analyze_chunk(
        &self,
        chunk: &Chunk,
        query: &str,
    ) -> Result<Option<String>, CompletionError> {
        let request = CompletionRequest {
            system: "You extract findings from transcript fragments. Be terse.".to_string(),
            user: format!(
                "Research question: {query}\n\n\
                 Fragment {index} of \"{title}\":\n{text}\n\n\
                 List 2-3 findings relevant to the question. If this fragment \
                 contains nothing relevant, reply exactly: {sentinel}",
                query = query,
                index = chunk.index + 1,
                title = chunk.parent_title,
                text = chunk.text,
                sentinel = CHUNK_SENTINEL,
            ),
            max_tokens: 300,
            temperature: 0.2,
        };

        let text = self.completion.complete(&request).await?;
        if text.to_uppercase().contains(CHUNK_SENTINEL) {
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Fold per-chunk findings into one document-level analysis.
    async fn consolidate(
        &self,
        title: &str,
        query: &str,
        findings: &[String],
    ) -> AnalysisOutcome {
        let numbered = findings
            .iter()
            .enumerate()
            .map(|(i, f)| format!("Fragment {}:\n{}", i + 1, f))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = CompletionRequest {
            system: "You consolidate fragment-level findings into one coherent analysis."
                .to_string(),
            user: format!(
                "Research question: {query}\n\n\
                 Findings from fragments of \"{title}\":\n\n{numbered}\n\n\
                 Merge these into a single analysis: key insights, specific data, \
                 notable perspectives. Remove duplicates.",
                query = query,
                title = title,
                numbered = numbered,
            ),
            max_tokens: 500,
            temperature: 0.3,
        };

        match self.completion.complete(&request).await {
            Ok(text) => AnalysisOutcome::Success(text),
            Err(e) => AnalysisOutcome::Failure(e.to_string()),
        }
    }
}
