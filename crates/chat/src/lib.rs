//! Conversational layer: sessions, routing, tool calling, escalation.

pub mod context;
pub mod escalation;
pub mod mail;
pub mod orchestrator;
pub mod policy;
pub mod router;
pub mod session;
pub mod tools;
pub mod web_search;

pub use context::AppContext;
pub use escalation::{EscalationPhase, EscalationState};
pub use orchestrator::{Orchestrator, DEGRADED_SERVICE_MESSAGE};
pub use router::{KeywordClassifier, LlmClassifier, QueryClassifier, RouteKind, RoutePlan, Router};
pub use session::ConversationSession;
