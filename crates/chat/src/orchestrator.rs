//! Conversation orchestrator.
//!
//! One orchestrator per session. Each user message runs through a fixed
//! pipeline: escalation continuation check, query routing, then either a
//! single corpus retrieval feeding a bounded tool-calling loop, the web
//! search path, or the escalation workflow. Post-processing attaches
//! citations, the external-source marker and the safety disclaimer.

use crate::escalation::{extract_email_candidate, EscalationPhase, EscalationState};
use crate::mail::MailDispatcher;
use crate::policy::{system_policy, with_citations, EXTERNAL_SOURCE_MARKER, SAFETY_DISCLAIMER};
use crate::router::{QueryClassifier, RoutePlan, Router};
use crate::session::ConversationSession;
use crate::tools::{DocumentRetrieverTool, Tool, ToolRegistry, WebSearchTool, DOCUMENT_RETRIEVER_TOOL};
use crate::web_search::SearchProvider;
use pathway_core::{AppConfig, ToolVariant};
use pathway_knowledge::{Retriever, DOCUMENT_SEARCH_FAILED};
use pathway_llm::{with_retry, ChatMessage, LlmClient};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fallback reply when the model or its tools cannot produce an answer.
pub const DEGRADED_SERVICE_MESSAGE: &str = "I'm having trouble completing that request right \
     now. Please try again in a moment.";

enum LoopOutcome {
    Answer(String),
    ForceEscalate,
    Exhausted,
}

pub struct Orchestrator {
    session: ConversationSession,
    escalation: EscalationState,
    llm: Arc<dyn LlmClient>,
    retriever: Arc<Retriever>,
    tools: ToolRegistry,
    router: Router,
    mailer: Arc<dyn MailDispatcher>,
    search: Option<Arc<dyn SearchProvider>>,
    variant: ToolVariant,
    system_prompt: String,
    max_iterations: u32,
    max_retries: u32,
    sensitive_keywords: Vec<String>,
    support_address: String,
}

impl Orchestrator {
    pub fn new(
        config: &AppConfig,
        llm: Arc<dyn LlmClient>,
        retriever: Arc<Retriever>,
        classifier: Arc<dyn QueryClassifier>,
        mailer: Arc<dyn MailDispatcher>,
        search: Option<Arc<dyn SearchProvider>>,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(DocumentRetrieverTool::new(retriever.clone())));
        if config.tool_variant == ToolVariant::Search {
            if let Some(provider) = &search {
                tools.register(Arc::new(WebSearchTool::new(provider.clone())));
            }
        }

        Self {
            session: ConversationSession::new(),
            escalation: EscalationState::new(),
            llm,
            retriever,
            tools,
            router: Router::new(classifier, config.tool_variant),
            mailer,
            search,
            variant: config.tool_variant,
            system_prompt: system_policy(config.tool_variant),
            max_iterations: config.max_orchestration_iterations,
            max_retries: config.network.max_retries,
            sensitive_keywords: config.sensitive_keywords.clone(),
            support_address: config.mail.support_address.clone(),
        }
    }

    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    pub fn escalation_phase(&self) -> EscalationPhase {
        self.escalation.phase()
    }

    /// Process one user message and produce the assistant reply.
    ///
    /// Both the user message and the reply are recorded in the session
    /// before returning, so the next turn sees the full history.
    pub async fn handle_message(&mut self, user_text: &str) -> String {
        self.session.push_user(user_text);

        let mut reply = self.reply_for(user_text).await;

        if self.touches_sensitive_topic(user_text, &reply) {
            reply = format!("{}\n\n{}", reply.trim_end(), SAFETY_DISCLAIMER);
        }

        self.session.push_assistant(&reply);
        reply
    }

    async fn reply_for(&mut self, user_text: &str) -> String {
        // An in-flight escalation consumes the message as an email candidate
        if self.escalation.phase() == EscalationPhase::AwaitingEmail {
            let candidate = extract_email_candidate(user_text).unwrap_or(user_text);
            return self
                .escalation
                .supply_email(candidate, self.mailer.as_ref(), &self.support_address)
                .await;
        }

        match self.router.plan(user_text).await {
            RoutePlan::Escalate => self.begin_escalation(user_text),
            RoutePlan::WebSearch => self.answer_from_web(user_text).await,
            RoutePlan::Corpus => self.answer_from_corpus(user_text).await,
        }
    }

    /// Start collecting an email. A previously completed escalation gets a
    /// fresh workflow so the new question is the one forwarded.
    fn begin_escalation(&mut self, question: &str) -> String {
        if self.escalation.phase() == EscalationPhase::Sent {
            self.escalation = EscalationState::new();
        }
        self.escalation.trigger(question).to_string()
    }

    async fn answer_from_corpus(&mut self, question: &str) -> String {
        let retrieved = self.retriever.retrieve(question).await;

        if retrieved.is_sentinel() {
            info!("Corpus has no answer; taking the live path");
            return match self.variant {
                ToolVariant::Escalation => self.begin_escalation(question),
                ToolVariant::Search => self.answer_from_web(question).await,
            };
        }

        match self.run_tool_loop(&retrieved.text).await {
            LoopOutcome::Answer(text) => with_citations(&text, &retrieved.sources),
            LoopOutcome::ForceEscalate => self.begin_escalation(question),
            LoopOutcome::Exhausted => DEGRADED_SERVICE_MESSAGE.to_string(),
        }
    }

    async fn answer_from_web(&mut self, question: &str) -> String {
        let Some(provider) = self.search.clone() else {
            warn!("Web search path taken without a search provider");
            return DEGRADED_SERVICE_MESSAGE.to_string();
        };

        let results = match provider.search(question).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Web search unavailable: {}", e);
                return DEGRADED_SERVICE_MESSAGE.to_string();
            }
        };

        let seed = format!("Web search results:\n\n{}", results);
        match self.run_tool_loop(&seed).await {
            LoopOutcome::Answer(text) => {
                format!("{}\n\n{}", text.trim_end(), EXTERNAL_SOURCE_MARKER)
            }
            LoopOutcome::ForceEscalate => self.begin_escalation(question),
            LoopOutcome::Exhausted => DEGRADED_SERVICE_MESSAGE.to_string(),
        }
    }

    /// Bounded tool-calling loop.
    ///
    /// The pre-executed retrieval (or search) output is injected as a tool
    /// message, then the model may call further tools until it produces a
    /// final text reply or the iteration cap is hit. Tool failures
    /// become textual tool outputs, never loop aborts.
    async fn run_tool_loop(&self, seed_output: &str) -> LoopOutcome {
        let mut history = self.session.to_chat_messages();
        history.push(ChatMessage::tool(seed_output));
        let schemas = self.tools.schemas();

        for iteration in 0..self.max_iterations {
            let reply = match with_retry("chat completion", self.max_retries, || {
                self.llm
                    .complete_with_tools(&self.system_prompt, &history, &schemas)
            })
            .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Chat completion failed: {}", e);
                    return LoopOutcome::Exhausted;
                }
            };

            if reply.is_final() {
                debug!("Final answer after {} iteration(s)", iteration + 1);
                return LoopOutcome::Answer(reply.content);
            }

            history.push(ChatMessage::assistant_with_calls(
                reply.content.clone(),
                reply.tool_calls.clone(),
            ));

            for call in &reply.tool_calls {
                let output = match self.tools.get(&call.name) {
                    Some(tool) => match tool.execute(&call.arguments).await {
                        Ok(output) => output,
                        Err(e) => {
                            warn!("Tool {} failed: {}", call.name, e);
                            format!("Tool error: {}", e)
                        }
                    },
                    None => {
                        warn!("Model requested unknown tool: {}", call.name);
                        format!("Tool not found: {}", call.name)
                    }
                };

                // A mid-loop retrieval miss under variant B short-circuits
                // straight to escalation
                if self.variant == ToolVariant::Escalation
                    && call.name == DOCUMENT_RETRIEVER_TOOL
                    && output == DOCUMENT_SEARCH_FAILED
                {
                    return LoopOutcome::ForceEscalate;
                }

                history.push(ChatMessage::tool(output));
            }
        }

        warn!(
            "Tool loop exhausted after {} iterations without a final answer",
            self.max_iterations
        );
        LoopOutcome::Exhausted
    }

    fn touches_sensitive_topic(&self, question: &str, answer: &str) -> bool {
        if answer.contains(SAFETY_DISCLAIMER) {
            return false;
        }
        let question = question.to_lowercase();
        let answer = answer.to_lowercase();
        self.sensitive_keywords
            .iter()
            .any(|k| question.contains(k.as_str()) || answer.contains(k.as_str()))
    }
}
