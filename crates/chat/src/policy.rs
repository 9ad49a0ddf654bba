//! System prompts and fixed answer decorations.

use pathway_core::ToolVariant;
use pathway_knowledge::DOCUMENT_SEARCH_FAILED;

/// Appended verbatim whenever a question or answer touches a sensitive
/// topic. Never paraphrased by the model.
pub const SAFETY_DISCLAIMER: &str = "Please note: I can't guarantee outcomes or give individual \
     advice. For decisions about your specific case, contact the official authority or a \
     registered adviser.";

/// Marks answers grounded in web results rather than the policy corpus.
pub const EXTERNAL_SOURCE_MARKER: &str = "(Source: web search)";

const SHARED_RULES: &str = "You are a helpful assistant answering questions about policies and \
     procedures.\n\
     \n\
     Rules:\n\
     - Answer policy questions ONLY from the retrieved document passages provided to you. \
     Do not invent policy details.\n\
     - When document passages are provided, base your answer on them and keep it concise.\n\
     - Never fabricate sources, fees, deadlines, or requirements.\n\
     - If the passages do not contain the answer, say so plainly.";

/// Build the system prompt for the configured tool variant.
pub fn system_policy(variant: ToolVariant) -> String {
    match variant {
        ToolVariant::Search => format!(
            "{}\n\
             - For questions about current status or time-sensitive information, use the \
             web_search tool instead of the document corpus.\n\
             - If document_retriever returns {}, try web_search before giving up.",
            SHARED_RULES, DOCUMENT_SEARCH_FAILED
        ),
        ToolVariant::Escalation => format!(
            "{}\n\
             - You cannot answer questions about current status or individual cases; those \
             are forwarded to the human support team outside this conversation.\n\
             - If document_retriever returns {}, do not guess an answer.",
            SHARED_RULES, DOCUMENT_SEARCH_FAILED
        ),
    }
}

/// Append a `Sources:` line naming the documents an answer drew on.
pub fn with_citations(answer: &str, sources: &[String]) -> String {
    if sources.is_empty() {
        return answer.to_string();
    }
    format!("{}\n\nSources: {}", answer.trim_end(), sources.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_get_distinct_prompts() {
        let search = system_policy(ToolVariant::Search);
        let escalation = system_policy(ToolVariant::Escalation);
        assert!(search.contains("web_search"));
        assert!(!escalation.contains("web_search"));
        assert!(escalation.contains("support team"));
        assert!(search.contains(DOCUMENT_SEARCH_FAILED));
    }

    #[test]
    fn test_with_citations() {
        let cited = with_citations("The fee is 100.", &["fees.md".to_string()]);
        assert_eq!(cited, "The fee is 100.\n\nSources: fees.md");

        let uncited = with_citations("Hello.", &[]);
        assert_eq!(uncited, "Hello.");
    }
}
