//! Final synthesis stage: fold per-document analyses into one deliverable.
//!
//! Two strategies share the same output templates:
//!
//! - **Direct**: every successful analysis goes into a single completion
//!   call. Simple, but the prompt grows linearly with the corpus.
//! - **Progressive**: analyses are folded in batches first, then the batch
//!   summaries feed one final call. Used by token-optimized runs. A failed
//!   batch is recorded inline rather than aborting, so one bad call cannot
//!   lose the rest of the corpus.

use crate::completion::{CompletionError, CompletionRequest, TextCompletion};
use crate::config::ResearchConfig;
use crate::models::{DocumentAnalysis, OutputType};

/// Produces the final research deliverable from document analyses.
pub struct Synthesizer<'a> {
    completion: &'a dyn TextCompletion,
    params: &'a ResearchConfig,
}

/// Section instructions for each deliverable shape.
fn template(output: OutputType) -> &'static str {
    match output {
        OutputType::Script => {
            "Write a video script with three marked sections:\n\
             INTRODUCTION - a hook that names the topic and why it matters now\n\
             DEVELOPMENT - the main findings in spoken, conversational language, \
             with concrete numbers and examples woven in\n\
             CONCLUSION - a takeaway and a closing line\n\
             Write for the ear, not the page: short sentences, direct address."
        }
        OutputType::Summary => {
            "Write an executive summary:\n\
             - one opening paragraph stating the overall picture\n\
             - 5-8 bullet points with the key findings, each carrying a \
             specific fact or number where available\n\
             - one closing paragraph on what remains uncertain"
        }
        OutputType::Analysis => {
            "Write a deep analysis:\n\
             - compare and contrast the perspectives across sources\n\
             - call out agreements, contradictions, and outliers explicitly\n\
             - discuss implications and second-order effects\n\
             - end with open questions the sources leave unanswered"
        }
        OutputType::Article => {
            "Write an article:\n\
             - a headline\n\
             - a one-paragraph lede summarizing the story\n\
             - body sections with subheadings, quoting specific data from \
             the sources\n\
             - a closing paragraph with outlook"
        }
    }
}

impl<'a> Synthesizer<'a> {
    pub fn new(completion: &'a dyn TextCompletion, params: &'a ResearchConfig) -> Self {
        Self { completion, params }
    }

    /// Single-call synthesis over all successful analyses.
    pub async fn direct(
        &self,
        topic: &str,
        query: &str,
        output: OutputType,
        analyses: &[DocumentAnalysis],
    ) -> Result<String, CompletionError> {
        let corpus = analyses
            .iter()
            .filter_map(|a| a.content().map(|c| format!("Source: {}\n{}", a.title, c)))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let request = CompletionRequest {
            system: "You synthesize research findings into polished deliverables."
                .to_string(),
            user: format!(
                "Topic: {topic}\n\
                 Research question: {query}\n\n\
                 Analyses of {count} sources:\n\n{corpus}\n\n{template}",
                topic = topic,
                query = query,
                count = analyses.iter().filter(|a| a.is_success()).count(),
                corpus = corpus,
                template = template(output),
            ),
            max_tokens: 2000,
            temperature: 0.4,
        };

        self.completion.complete(&request).await
    }

    /// Batched synthesis: fold analyses `batch_size` at a time, then fold
    /// the batch summaries into the deliverable.
    pub async fn progressive(
        &self,
        topic: &str,
        query: &str,
        output: OutputType,
        analyses: &[DocumentAnalysis],
    ) -> Result<String, CompletionError> {
        let successful: Vec<&DocumentAnalysis> =
            analyses.iter().filter(|a| a.is_success()).collect();

        let mut batch_summaries: Vec<String> = Vec::new();
        for (n, batch) in successful.chunks(self.params.batch_size).enumerate() {
            match self.fold_batch(query, batch).await {
                Ok(summary) => batch_summaries.push(summary),
                // Record the loss and keep going.
                Err(e) => batch_summaries.push(format!("[batch {} failed: {}]", n + 1, e)),
            }
        }

        let stitched = batch_summaries
            .iter()
            .enumerate()
            .map(|(i, s)| format!("Batch {}:\n{}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = CompletionRequest {
            system: "You synthesize research findings into polished deliverables."
                .to_string(),
            user: format!(
                "Topic: {topic}\n\
                 Research question: {query}\n\n\
                 Progressive summaries of {count} sources:\n\n{stitched}\n\n{template}",
                topic = topic,
                query = query,
                count = successful.len(),
                stitched = stitched,
                template = template(output),
            ),
            max_tokens: 1500,
            temperature: 0.4,
        };

        self.completion.complete(&request).await
    }

    async fn fold_batch(
        &self,
        query: &str,
        batch: &[&DocumentAnalysis],
    ) -> Result<String, CompletionError> {
        let sources = batch
            .iter()
            .filter_map(|a| a.content().map(|c| format!("Source: {}\n{}", a.title, c)))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = CompletionRequest {
            system: "You compress research analyses without losing specifics.".to_string(),
            user: format!(
                "Research question: {query}\n\n{sources}\n\n\
                 Summarize across these sources: key insights, specific data \
                 and numbers, concrete examples, and recurring patterns.",
                query = query,
                sources = sources,
            ),
            max_tokens: 600,
            temperature: 0.3,
        };

        self.completion.complete(&request).await
    }
}
