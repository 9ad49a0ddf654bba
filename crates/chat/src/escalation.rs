//! Escalation workflow: collect an email address, then hand the question
//! to the support team.
//!
//! The workflow is a forward-only state machine per conversation:
//! `Idle -> AwaitingEmail -> Sent`. A failed dispatch keeps the workflow
//! in `AwaitingEmail` so the user can retry or correct the address. Once
//! `Sent`, a later escalation in the same conversation starts from a
//! fresh state.

use crate::mail::MailDispatcher;
use tracing::{info, warn};

/// Maximum characters of the original question carried into the subject.
const SUBJECT_PREFIX_CHARS: usize = 50;

pub const EMAIL_PROMPT: &str = "I can't answer that from the documents I have, but I can forward \
     your question to the support team. What email address should they reply to?";

pub const EMAIL_REASK: &str = "That doesn't look like a valid email address. Could you \
     double-check it? For example: name@example.com";

pub const DISPATCH_FAILURE: &str = "I couldn't reach the support mailbox just now. Please send \
     your email address again and I'll retry.";

const ALREADY_SENT: &str = "Your question has already been forwarded to the support team. \
     They'll be in touch by email.";

/// Where the workflow stands for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationPhase {
    Idle,
    AwaitingEmail,
    Sent,
}

#[derive(Debug)]
pub struct EscalationState {
    phase: EscalationPhase,
    original_question: Option<String>,
    collected_email: Option<String>,
}

impl EscalationState {
    pub fn new() -> Self {
        Self {
            phase: EscalationPhase::Idle,
            original_question: None,
            collected_email: None,
        }
    }

    pub fn phase(&self) -> EscalationPhase {
        self.phase
    }

    pub fn collected_email(&self) -> Option<&str> {
        self.collected_email.as_deref()
    }

    /// Begin collecting an email for `question`.
    ///
    /// Idempotent: triggering while already collecting (or after dispatch)
    /// does not overwrite the stored question or re-send anything.
    pub fn trigger(&mut self, question: &str) -> &'static str {
        match self.phase {
            EscalationPhase::Idle => {
                info!("Escalating question to support: {}", question);
                self.original_question = Some(question.to_string());
                self.phase = EscalationPhase::AwaitingEmail;
                EMAIL_PROMPT
            }
            EscalationPhase::AwaitingEmail => EMAIL_PROMPT,
            EscalationPhase::Sent => ALREADY_SENT,
        }
    }

    /// Accept an email candidate and, if valid, dispatch the ticket.
    ///
    /// Only meaningful in `AwaitingEmail`. An invalid candidate re-asks
    /// without changing state; a dispatch failure also stays in
    /// `AwaitingEmail` so the next message can retry.
    pub async fn supply_email(
        &mut self,
        candidate: &str,
        mailer: &dyn MailDispatcher,
        support_address: &str,
    ) -> String {
        if self.phase != EscalationPhase::AwaitingEmail {
            warn!("supply_email called outside AwaitingEmail; ignoring");
            return ALREADY_SENT.to_string();
        }

        let email = candidate.trim();
        if !is_valid_email(email) {
            return EMAIL_REASK.to_string();
        }
        // Captured as soon as it validates; a later retry may overwrite it
        self.collected_email = Some(email.to_string());

        let question = self.original_question.as_deref().unwrap_or_default();
        let subject = ticket_subject(question);
        let body = format!(
            "A user question could not be answered from the policy corpus.\n\n\
             Question:\n{}\n\nReply to: {}\n",
            question, email
        );

        match mailer.send(support_address, &subject, &body).await {
            Ok(()) => {
                info!("Support ticket dispatched for {}", email);
                self.phase = EscalationPhase::Sent;
                format!(
                    "Done! I've sent your question to the support team. \
                     They'll reply to {}.",
                    email
                )
            }
            Err(e) => {
                warn!("Support ticket dispatch failed: {}", e);
                DISPATCH_FAILURE.to_string()
            }
        }
    }
}

impl Default for EscalationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Subject line: fixed prefix plus a bounded slice of the question.
fn ticket_subject(question: &str) -> String {
    let prefix: String = question.chars().take(SUBJECT_PREFIX_CHARS).collect();
    format!("Support inquiry: {}", prefix)
}

/// Shape-only validation: local part, one `@`, dotted domain, no spaces.
/// Deliverability is the mail server's problem.
pub fn is_valid_email(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = candidate.splitn(2, '@');
    let (local, domain) = match (parts.next(), parts.next()) {
        (Some(l), Some(d)) => (l, d),
        _ => return false,
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') && domain.len() >= 3
}

/// Pull the first email-looking token out of a chat message, stripping
/// trailing punctuation ("my email is a@b.com." -> "a@b.com").
pub fn extract_email_candidate(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|token| token.contains('@'))
        .map(|token| token.trim_end_matches(['.', ',', ';', '!', '?']))
}
