//! Prompt templates for grounded question answering

use crate::storage::SearchResult;

/// Prompt builder for retrieval-grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts into a single context block
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the question-answering prompt over document context
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            "Use the following document content to answer:\n\n{context}\n\nQuestion: {question}\nAnswer:"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn context_joins_chunks_in_result_order() {
        let results = vec![
            SearchResult {
                chunk: Chunk::new("a.txt", 0, "first".into()),
                distance: 0.1,
            },
            SearchResult {
                chunk: Chunk::new("a.txt", 1, "second".into()),
                distance: 0.2,
            },
        ];
        assert_eq!(PromptBuilder::build_context(&results), "first\n\nsecond");
    }

    #[test]
    fn qa_prompt_contains_context_and_question() {
        let prompt = PromptBuilder::build_qa_prompt("why?", "because facts");
        assert!(prompt.contains("because facts"));
        assert!(prompt.ends_with("Question: why?\nAnswer:"));
    }
}
