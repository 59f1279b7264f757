//! Tree-summarize response synthesis.
//!
//! Retrieved chunks are packed into prompts that fit the model's context
//! window. Each packed prompt is answered independently (concurrently), and
//! the partial answers are packed and answered again until a single prompt
//! remains.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::error::IndexError;
use crate::llm::LlmClient;
use crate::splitter::count_units;

/// Returned when there is nothing to answer from.
pub const EMPTY_RESPONSE: &str = "Empty Response";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Smallest context budget a prompt is ever packed to.
const MIN_PACK_UNITS: usize = 32;

fn summary_prompt(question: &str, context: &str) -> String {
    format!(
        "Context information from multiple sources is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the information from multiple sources and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: "
    )
}

/// Hierarchical answer synthesis over an arbitrary number of text chunks.
#[derive(Clone)]
pub struct TreeSummarize {
    llm: Arc<dyn LlmClient>,
    context_window_units: usize,
}

impl std::fmt::Debug for TreeSummarize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSummarize")
            .field("context_window_units", &self.context_window_units)
            .finish()
    }
}

impl TreeSummarize {
    pub fn new(llm: Arc<dyn LlmClient>, context_window_units: usize) -> Self {
        Self {
            llm,
            context_window_units,
        }
    }

    /// Answer `question` from `chunks`.
    ///
    /// Returns [`EMPTY_RESPONSE`] without calling the model when `chunks` is
    /// empty.
    pub async fn synthesize(&self, question: &str, chunks: Vec<String>) -> Result<String, IndexError> {
        let mut texts: Vec<String> = chunks
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        if texts.is_empty() {
            return Ok(EMPTY_RESPONSE.to_string());
        }

        let budget = self.context_budget(question);
        let mut level = 0usize;

        loop {
            let groups = pack(&texts, budget);
            if groups.len() == 1 {
                debug!(level, "Synthesizing final answer");
                return self.llm.complete(&summary_prompt(question, &groups[0])).await;
            }

            debug!(level, prompts = groups.len(), "Summarizing partial answers");
            let prompts: Vec<String> = groups
                .iter()
                .map(|context| summary_prompt(question, context))
                .collect();
            let answers = try_join_all(prompts.iter().map(|p| self.llm.complete(p))).await?;

            // Halving the budget guarantees at least two answers per prompt
            // at the next level.
            texts = answers
                .iter()
                .map(|a| truncate_units(a, budget / 2))
                .filter(|a| !a.is_empty())
                .collect();
            if texts.is_empty() {
                return Ok(EMPTY_RESPONSE.to_string());
            }
            level += 1;
        }
    }

    /// Units left for context once the template and question are in place.
    fn context_budget(&self, question: &str) -> usize {
        let overhead = count_units(&summary_prompt(question, ""));
        self.context_window_units
            .saturating_sub(overhead)
            .max(MIN_PACK_UNITS)
    }
}

/// Greedily pack texts into contexts of at most `budget` units.
fn pack(texts: &[String], budget: usize) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_units = 0;

    for text in texts {
        let text = truncate_units(text, budget);
        let units = count_units(&text);
        if current_units + units > budget && !current.is_empty() {
            groups.push(current.join(CONTEXT_SEPARATOR));
            current.clear();
            current_units = 0;
        }
        current.push(text);
        current_units += units;
    }
    if !current.is_empty() {
        groups.push(current.join(CONTEXT_SEPARATOR));
    }
    groups
}

fn truncate_units(text: &str, max_units: usize) -> String {
    if count_units(text) <= max_units {
        return text.trim().to_string();
    }
    text.split_whitespace()
        .take(max_units)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLlm {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        async fn complete(&self, prompt: &str) -> Result<String, IndexError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(format!("answer{}", n))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, IndexError> {
            Err(IndexError::Llm("quota exceeded".to_string()))
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_empty_chunks_skip_llm() {
        let llm = Arc::new(RecordingLlm::default());
        let synth = TreeSummarize::new(llm.clone(), 2048);
        let answer = synth.synthesize("anything?", Vec::new()).await.unwrap();
        assert_eq!(answer, EMPTY_RESPONSE);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_prompt_when_chunks_fit() {
        let llm = Arc::new(RecordingLlm::default());
        let synth = TreeSummarize::new(llm.clone(), 2048);
        let answer = synth
            .synthesize(
                "Who founded Snowflake?",
                vec![
                    "Snowflake was founded in 2012.".to_string(),
                    "Its founders came from Oracle.".to_string(),
                ],
            )
            .await
            .unwrap();

        assert_eq!(answer, "answer1");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Snowflake was founded in 2012.\n\nIts founders came from Oracle."));
        assert!(prompts[0].contains("Query: Who founded Snowflake?"));
        assert!(prompts[0].ends_with("Answer: "));
    }

    #[tokio::test]
    async fn test_oversized_context_is_summarized_in_levels() {
        let llm = Arc::new(RecordingLlm::default());
        let synth = TreeSummarize::new(llm.clone(), 200);
        let chunks = (0..6).map(|_| words(100)).collect();

        let answer = synth.synthesize("Summarize", chunks).await.unwrap();

        // Six first-level prompts, then one combining prompt.
        assert_eq!(llm.calls.load(Ordering::SeqCst), 7);
        assert_eq!(answer, "answer7");
        let prompts = llm.prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        for i in 1..=6 {
            assert!(last.contains(&format!("answer{}", i)));
        }
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let synth = TreeSummarize::new(Arc::new(FailingLlm), 2048);
        let err = synth
            .synthesize("q", vec!["some context".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Llm(_)));
    }

    #[test]
    fn test_pack_respects_budget() {
        let texts: Vec<String> = (0..5).map(|_| words(10)).collect();
        let groups = pack(&texts, 25);
        assert_eq!(groups.len(), 3);
        for group in &groups {
            assert!(count_units(group) <= 25);
        }
    }

    #[test]
    fn test_pack_truncates_single_oversized_text() {
        let groups = pack(&[words(50)], 20);
        assert_eq!(groups.len(), 1);
        assert_eq!(count_units(&groups[0]), 20);
    }
}
