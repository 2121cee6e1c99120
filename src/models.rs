//! Core data types used throughout Tubesage.
//!
//! These types represent the transcripts, excerpts, chunks, and analyses
//! that flow through the ingestion, retrieval, and research pipelines.

use chrono::{DateTime, Utc};

/// A video returned by a [`VideoSource`](crate::source::VideoSource) search,
/// before its transcript has been fetched.
#[derive(Debug, Clone)]
pub struct VideoHit {
    pub video_id: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A stored transcript, keyed by the upstream video id.
///
/// `transcript` is `None` when the video had no fetchable captions; such
/// records are a valid terminal state and are excluded from retrieval.
/// Records are append-only: created on successful fetch, never mutated.
#[derive(Debug, Clone)]
pub struct TranscriptRecord {
    pub video_id: String,
    pub title: String,
    pub topic: String,
    pub transcript: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TranscriptRecord {
    /// The transcript text, or `""` when absent.
    pub fn text(&self) -> &str {
        self.transcript.as_deref().unwrap_or("")
    }
}

/// A bounded-length retrieved text window, derived per query.
#[derive(Debug, Clone)]
pub struct Excerpt {
    pub title: String,
    /// Prefix of the transcript, truncated to the configured window.
    pub text_window: String,
    /// Cosine similarity against the query, or 0.0 when unranked.
    pub relevance: f64,
}

/// A sentence-aligned segment of one transcript, sized for a per-call
/// token budget. Ordered by `index`; analyzed independently.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub parent_title: String,
    pub index: usize,
    pub text: String,
    pub estimated_tokens: usize,
}

/// Outcome of analyzing one document (or one consolidated set of chunks).
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Success(String),
    Failure(String),
}

/// Structured insights extracted from a single transcript against a
/// research question.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub video_id: String,
    pub title: String,
    pub outcome: AnalysisOutcome,
}

impl DocumentAnalysis {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AnalysisOutcome::Success(_))
    }

    /// The analysis text for successful outcomes.
    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            AnalysisOutcome::Success(text) => Some(text),
            AnalysisOutcome::Failure(_) => None,
        }
    }
}

/// A sub-topic identified as under-covered by the current analyses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchGap {
    /// Short label, at most a few words.
    pub label: String,
    /// One-sentence rationale.
    pub rationale: String,
}

/// Terminal output of a successful research run.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    /// Number of analyses that succeeded (including focused follow-ups).
    pub analyzed: usize,
    /// Number of transcripts found for the topic.
    pub total: usize,
    /// The synthesized deliverable.
    pub final_text: String,
    /// Gaps identified mid-run (possibly empty).
    pub gaps: Vec<ResearchGap>,
}

/// The deliverable shape requested from the synthesizer.
///
/// A closed enumeration with an explicit default: unrecognized tokens fall
/// back to [`OutputType::Summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    Script,
    #[default]
    Summary,
    Analysis,
    Article,
}

impl OutputType {
    /// Parse an output-type token. Accepts both English names and the
    /// Portuguese tokens the corpus historically used.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "script" => OutputType::Script,
            "summary" | "resumo" => OutputType::Summary,
            "analysis" | "análise" | "analise" => OutputType::Analysis,
            "article" | "artigo" => OutputType::Article,
            _ => OutputType::Summary,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputType::Script => "script",
            OutputType::Summary => "summary",
            OutputType::Analysis => "analysis",
            OutputType::Article => "article",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_type_known_tokens() {
        assert_eq!(OutputType::parse("script"), OutputType::Script);
        assert_eq!(OutputType::parse("summary"), OutputType::Summary);
        assert_eq!(OutputType::parse("analysis"), OutputType::Analysis);
        assert_eq!(OutputType::parse("article"), OutputType::Article);
    }

    #[test]
    fn test_output_type_portuguese_tokens() {
        assert_eq!(OutputType::parse("resumo"), OutputType::Summary);
        assert_eq!(OutputType::parse("análise"), OutputType::Analysis);
        assert_eq!(OutputType::parse("artigo"), OutputType::Article);
    }

    #[test]
    fn test_output_type_unknown_falls_back_to_summary() {
        assert_eq!(OutputType::parse("podcast"), OutputType::Summary);
        assert_eq!(OutputType::parse(""), OutputType::Summary);
    }

    #[test]
    fn test_output_type_case_insensitive() {
        assert_eq!(OutputType::parse("  SCRIPT "), OutputType::Script);
    }

    #[test]
    fn test_record_text_absent_transcript() {
        let rec = TranscriptRecord {
            video_id: "v1".into(),
            title: "t".into(),
            topic: "x".into(),
            transcript: None,
            published_at: None,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(rec.text(), "");
    }
}
