//! Deep-research orchestration.
//!
//! [`Researcher::conduct`] runs the full pipeline over one topic:
//!
//! 1. Load all stored transcripts for the topic; none → fail fast with
//!    [`ResearchError::NoDataForTopic`] before any completion call.
//! 2. Analyze each transcript against the research question (chunked when
//!    the run is token-optimized and the transcript is large).
//! 3. Every analysis failed → [`ResearchError::NoSuccessfulAnalyses`].
//! 4. Identify coverage gaps; let the [`GapSelector`] pick which to deepen.
//! 5. For each selected gap, run a focused search (`"{topic} {label}"`),
//!    ingest the new transcripts, and analyze them against a narrowed
//!    question. Deepening failures degrade; they never abort the run.
//! 6. Synthesize the deliverable: progressive batching when
//!    token-optimized, one direct call otherwise.

use thiserror::Error;

use crate::analyze::DocumentAnalyzer;
use crate::completion::TextCompletion;
use crate::config::{ResearchConfig, VideosConfig};
use crate::gaps::identify_gaps;
use crate::ingest::fetch_topic;
use crate::models::{DocumentAnalysis, OutputType, ResearchGap, ResearchReport};
use crate::source::VideoSource;
use crate::store::TranscriptStore;
use crate::synthesize::Synthesizer;

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("no transcripts stored for topic '{0}'; run fetch first")]
    NoDataForTopic(String),
    #[error("every document analysis failed; nothing to synthesize")]
    NoSuccessfulAnalyses,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Decides which identified gaps are worth a focused follow-up search.
pub trait GapSelector: Send + Sync {
    fn select(&self, gaps: &[ResearchGap]) -> Vec<ResearchGap>;
}

/// Deepen every identified gap.
pub struct SelectAll;

impl GapSelector for SelectAll {
    fn select(&self, gaps: &[ResearchGap]) -> Vec<ResearchGap> {
        gaps.to_vec()
    }
}

/// Deepen no gaps; gaps are still reported.
pub struct SelectNone;

impl GapSelector for SelectNone {
    fn select(&self, _gaps: &[ResearchGap]) -> Vec<ResearchGap> {
        Vec::new()
    }
}

/// Deepen only gaps whose label matches one of the given labels
/// (case-insensitive).
pub struct SelectByLabel(pub Vec<String>);

impl GapSelector for SelectByLabel {
    fn select(&self, gaps: &[ResearchGap]) -> Vec<ResearchGap> {
        gaps.iter()
            .filter(|g| {
                self.0
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(&g.label))
            })
            .cloned()
            .collect()
    }
}

/// One research run's parameters.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub topic: String,
    pub query: String,
    pub output_type: OutputType,
    /// Chunk large transcripts and synthesize in batches.
    pub token_optimized: bool,
}

/// The research pipeline, wired to its capabilities.
pub struct Researcher<'a> {
    store: &'a dyn TranscriptStore,
    source: &'a dyn VideoSource,
    completion: &'a dyn TextCompletion,
    research: &'a ResearchConfig,
    videos: &'a VideosConfig,
}

impl<'a> Researcher<'a> {
    pub fn new(
        store: &'a dyn TranscriptStore,
        source: &'a dyn VideoSource,
        completion: &'a dyn TextCompletion,
        research: &'a ResearchConfig,
        videos: &'a VideosConfig,
    ) -> Self {
        Self {
            store,
            source,
            completion,
            research,
            videos,
        }
    }

    /// Run the full pipeline. See the module docs for the stage sequence.
    pub async fn conduct(
        &self,
        request: &ResearchRequest,
        selector: &dyn GapSelector,
    ) -> Result<ResearchReport, ResearchError> {
        let records = self.store.by_topic(&request.topic).await?;
        if records.is_empty() {
            return Err(ResearchError::NoDataForTopic(request.topic.clone()));
        }
        let total = records.len();

        let analyzer = DocumentAnalyzer::new(self.completion, self.research);
        let mut analyses: Vec<DocumentAnalysis> = Vec::with_capacity(total);
        for record in &records {
            analyses.push(
                analyzer
                    .analyze(record, &request.query, request.token_optimized)
                    .await,
            );
        }

        if !analyses.iter().any(|a| a.is_success()) {
            return Err(ResearchError::NoSuccessfulAnalyses);
        }

        let gaps = identify_gaps(
            self.completion,
            &request.topic,
            &request.query,
            &analyses,
            self.research,
        )
        .await;

        for gap in selector.select(&gaps) {
            self.deepen(request, &gap, &analyzer, &mut analyses).await;
        }

        let synthesizer = Synthesizer::new(self.completion, self.research);
        let synthesized = if request.token_optimized {
            synthesizer
                .progressive(&request.topic, &request.query, request.output_type, &analyses)
                .await
        } else {
            synthesizer
                .direct(&request.topic, &request.query, request.output_type, &analyses)
                .await
        };

        // Only missing data and a fully failed analysis pass are fatal; a
        // failed synthesis call still yields a report.
        let final_text = synthesized
            .unwrap_or_else(|e| format!("[synthesis failed: {}] {} analyses were gathered", e,
                analyses.iter().filter(|a| a.is_success()).count()));

        Ok(ResearchReport {
            analyzed: analyses.iter().filter(|a| a.is_success()).count(),
            total,
            final_text,
            gaps,
        })
    }

    /// Focused follow-up for one gap: search, ingest, analyze. Failures
    /// leave `analyses` untouched.
    async fn deepen(
        &self,
        request: &ResearchRequest,
        gap: &ResearchGap,
        analyzer: &DocumentAnalyzer<'_>,
        analyses: &mut Vec<DocumentAnalysis>,
    ) {
        let focused_query = format!("{} {}", request.topic, gap.label);

        let outcome = match fetch_topic(
            self.store,
            self.source,
            &request.topic,
            &focused_query,
            self.videos.focused_max_results,
        )
        .await
        {
            Ok(o) => o,
            Err(_) => return,
        };

        let narrowed = format!("{} - focus on {}", request.query, gap.label);
        for record in outcome.with_transcripts() {
            analyses.push(
                analyzer
                    .analyze(record, &narrowed, request.token_optimized)
                    .await,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisOutcome, DocumentAnalysis};

    fn gap(label: &str) -> ResearchGap {
        ResearchGap {
            label: label.to_string(),
            rationale: "r".to_string(),
        }
    }

    #[test]
    fn test_select_all_keeps_everything() {
        let gaps = vec![gap("a"), gap("b")];
        assert_eq!(SelectAll.select(&gaps).len(), 2);
    }

    #[test]
    fn test_select_none_drops_everything() {
        let gaps = vec![gap("a"), gap("b")];
        assert!(SelectNone.select(&gaps).is_empty());
    }

    #[test]
    fn test_select_by_label_case_insensitive() {
        let gaps = vec![gap("Pricing History"), gap("benchmarks"), gap("security")];
        let selected =
            SelectByLabel(vec!["pricing history".into(), "SECURITY".into()]).select(&gaps);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].label, "Pricing History");
        assert_eq!(selected[1].label, "security");
    }

    #[test]
    fn test_report_counts_only_successes() {
        let analyses = vec![
            DocumentAnalysis {
                video_id: "v1".into(),
                title: "A".into(),
                outcome: AnalysisOutcome::Success("x".into()),
            },
            DocumentAnalysis {
                video_id: "v2".into(),
                title: "B".into(),
                outcome: AnalysisOutcome::Failure("e".into()),
            },
        ];
        assert_eq!(analyses.iter().filter(|a| a.is_success()).count(), 1);
    }
}
