//! Query routing: decide whether a question is answerable from the static
//! policy corpus or needs a live path (web search or escalation).

use async_trait::async_trait;
use pathway_core::{AppResult, ToolVariant};
use pathway_llm::{ChatMessage, LlmClient, with_retry};
use std::sync::Arc;

/// The two kinds of question the assistant distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Static policy content: rules, requirements, fees, procedures.
    Policy,
    /// Current status, personal cases, anything time-sensitive.
    Live,
}

/// What to do with the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePlan {
    /// Answer from the document corpus.
    Corpus,
    /// Collect an email and forward to support (variant B live path).
    Escalate,
    /// Search the web (variant A live path).
    WebSearch,
}

/// Classifies a question as policy or live.
#[async_trait]
pub trait QueryClassifier: Send + Sync {
    async fn classify(&self, question: &str) -> AppResult<RouteKind>;
}

const CLASSIFIER_PROMPT: &str = "You classify user questions for a policy assistant.\n\
     Reply with exactly one word.\n\
     POLICY - the question asks about rules, requirements, procedures, fees, \
     or anything answerable from static policy documents.\n\
     LIVE - the question asks about current status, a specific person's case, \
     or anything that changes over time.";

/// LLM-backed classifier.
pub struct LlmClassifier {
    client: Arc<dyn LlmClient>,
    max_retries: u32,
}

impl LlmClassifier {
    pub fn new(client: Arc<dyn LlmClient>, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
        }
    }
}

#[async_trait]
impl QueryClassifier for LlmClassifier {
    async fn classify(&self, question: &str) -> AppResult<RouteKind> {
        let history = vec![ChatMessage::user(question)];
        let reply = with_retry("query classification", self.max_retries, || {
            self.client
                .complete_with_tools(CLASSIFIER_PROMPT, &history, &[])
        })
        .await?;

        let verdict = reply.content.to_uppercase();
        let kind = if verdict.contains("LIVE") {
            RouteKind::Live
        } else {
            RouteKind::Policy
        };
        tracing::debug!("Classified {:?}: {}", kind, question);
        Ok(kind)
    }
}

/// Offline fallback classifier driven by marker phrases.
pub struct KeywordClassifier {
    live_markers: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            live_markers: [
                "right now",
                "currently",
                "status",
                "down",
                "today",
                "latest",
                "my case",
                "my application",
                "is there an update",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryClassifier for KeywordClassifier {
    async fn classify(&self, question: &str) -> AppResult<RouteKind> {
        let lower = question.to_lowercase();
        if self
            .live_markers
            .iter()
            .any(|m| contains_phrase(&lower, m))
        {
            Ok(RouteKind::Live)
        } else {
            Ok(RouteKind::Policy)
        }
    }
}

/// Whole-word phrase match: `"down"` matches "is it down?" but not
/// "download".
fn contains_phrase(text: &str, phrase: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = text[from..].find(phrase) {
        let begin = from + pos;
        let end = begin + phrase.len();
        let clear_before = text[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let clear_after = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if clear_before && clear_after {
            return true;
        }
        from = begin + 1;
    }
    false
}

/// Maps a classification to a plan for the configured tool variant.
///
/// Classifier failures degrade to the corpus path: a mis-routed policy
/// answer is recoverable, an unnecessary escalation is not.
pub struct Router {
    classifier: Arc<dyn QueryClassifier>,
    variant: ToolVariant,
}

impl Router {
    pub fn new(classifier: Arc<dyn QueryClassifier>, variant: ToolVariant) -> Self {
        Self {
            classifier,
            variant,
        }
    }

    pub async fn plan(&self, question: &str) -> RoutePlan {
        let kind = match self.classifier.classify(question).await {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("Classification failed ({}); defaulting to corpus", e);
                RouteKind::Policy
            }
        };

        match (kind, self.variant) {
            (RouteKind::Policy, _) => RoutePlan::Corpus,
            (RouteKind::Live, ToolVariant::Escalation) => RoutePlan::Escalate,
            (RouteKind::Live, ToolVariant::Search) => RoutePlan::WebSearch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::AppError;

    struct FailingClassifier;

    #[async_trait]
    impl QueryClassifier for FailingClassifier {
        async fn classify(&self, _question: &str) -> AppResult<RouteKind> {
            Err(AppError::Llm("classifier offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_keyword_classifier_routes() {
        let classifier = KeywordClassifier::new();
        assert_eq!(
            classifier.classify("What documents do I need?").await.unwrap(),
            RouteKind::Policy
        );
        assert_eq!(
            classifier
                .classify("Is the portal down right now?")
                .await
                .unwrap(),
            RouteKind::Live
        );
    }

    #[tokio::test]
    async fn test_markers_match_whole_words_only() {
        let classifier = KeywordClassifier::new();
        assert_eq!(
            classifier
                .classify("Where can I download the application form?")
                .await
                .unwrap(),
            RouteKind::Policy
        );
        assert_eq!(
            classifier
                .classify("Does the statusbar show my fees?")
                .await
                .unwrap(),
            RouteKind::Policy
        );
        assert_eq!(
            classifier.classify("Is the portal down?").await.unwrap(),
            RouteKind::Live
        );
    }

    #[tokio::test]
    async fn test_live_question_plans_by_variant() {
        let classifier: Arc<dyn QueryClassifier> = Arc::new(KeywordClassifier::new());

        let escalating = Router::new(classifier.clone(), ToolVariant::Escalation);
        assert_eq!(
            escalating.plan("what is the status of my case").await,
            RoutePlan::Escalate
        );

        let searching = Router::new(classifier, ToolVariant::Search);
        assert_eq!(
            searching.plan("what is the status of my case").await,
            RoutePlan::WebSearch
        );
    }

    #[tokio::test]
    async fn test_classifier_failure_degrades_to_corpus() {
        let router = Router::new(Arc::new(FailingClassifier), ToolVariant::Escalation);
        assert_eq!(router.plan("anything").await, RoutePlan::Corpus);
    }
}
