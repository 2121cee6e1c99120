//! Quick-chat: answer one question from stored transcripts.
//!
//! The cheap path next to deep research: TF-IDF retrieval picks a handful
//! of transcript excerpts, and a single completion call answers from them.
//! A completion failure degrades to a notice plus the raw context, so the
//! user still sees what was retrieved.

use anyhow::Result;

use crate::completion::{CompletionRequest, TextCompletion};
use crate::config::RetrievalConfig;
use crate::retrieve::{find_relevant_context, RetrievedContext};
use crate::store::TranscriptStore;

/// Answer `question` about `topic` from stored transcripts.
pub async fn answer(
    store: &dyn TranscriptStore,
    completion: &dyn TextCompletion,
    topic: &str,
    question: &str,
    params: &RetrievalConfig,
) -> Result<String> {
    let context = find_relevant_context(store, question, topic, params).await?;

    if matches!(context, RetrievedContext::NoTranscripts) {
        return Ok(format!(
            "No transcripts stored for topic '{}'. Run fetch first.",
            topic
        ));
    }

    let rendered = context.render();
    let request = CompletionRequest {
        system: "You answer questions from the provided video transcripts. \
                 When the transcripts do not cover the question, say so \
                 rather than guessing."
            .to_string(),
        user: format!(
            "Transcript excerpts:\n\n{rendered}\n\nQuestion: {question}",
            rendered = rendered,
            question = question,
        ),
        max_tokens: 1000,
        temperature: 0.7,
    };

    match completion.complete(&request).await {
        Ok(reply) => Ok(reply),
        // Keep the retrieved context useful even when the model is down.
        Err(e) => Ok(format!(
            "The model is unavailable ({}). Retrieved context:\n\n{}",
            e, rendered
        )),
    }
}

/// CLI entry point for `tsg chat`.
pub async fn run_chat(
    store: &dyn TranscriptStore,
    completion: &dyn TextCompletion,
    topic: &str,
    question: &str,
    params: &RetrievalConfig,
) -> Result<()> {
    let reply = answer(store, completion, topic, question, params).await?;
    println!("{}", reply);
    Ok(())
}
