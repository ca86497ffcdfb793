// The follow-up question flow.
//
// A session is either `Idle` or waiting for a yes/no answer to one offered
// action. Idle turns resolve a phone record and ask the language model for a
// review, then offer one of four actions at random. Answers to an offered
// action are resolved locally, without calling the model.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants;
use crate::llm_interaction::LanguageModelGateway;
use crate::phone::PhoneRecord;
use crate::provider::{LookupError, PhoneRecordProvider};
use crate::sentiment::{Sentiment, SentimentClassifier};
use crate::transcript::{ChatTranscript, Turn};

const AFFIRMATIONS: &[&str] = &["yes", "yeah", "sure", "ok", "of course"];

pub const DECLINE_REPLY: &str = "Alright, skipping that step.";
pub const PROS_CONS_REPLY: &str = "Pros:\n- Great performance\n- Good camera\n- Reliable brand\n\n\
Cons:\n- Slightly high price\n- Average battery life";

const RESALE_FACTOR_MIN: f64 = 0.3;
const RESALE_FACTOR_MAX: f64 = 0.7;

/// An action that can be offered again after the IMEI has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpTopic {
    Resale,
    Compare,
    ProsCons,
}

impl FollowUpTopic {
    pub const ALL: [FollowUpTopic; 3] = [
        FollowUpTopic::Resale,
        FollowUpTopic::Compare,
        FollowUpTopic::ProsCons,
    ];

    pub fn prompt(self) -> &'static str {
        match self {
            FollowUpTopic::Resale => "Would you like me to tell you its resale value?",
            FollowUpTopic::Compare => "Would you like to compare it with a similar model?",
            FollowUpTopic::ProsCons => "Do you want to know its top 3 pros and cons?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "topic")]
pub enum PendingAction {
    ShowImei,
    Compare,
    Resale,
    ProsCons,
    /// Offered after the IMEI; resolves as the carried topic.
    FollowUp(FollowUpTopic),
}

impl PendingAction {
    /// Actions offered after a fresh record.
    pub const OPENERS: [PendingAction; 4] = [
        PendingAction::ShowImei,
        PendingAction::Compare,
        PendingAction::Resale,
        PendingAction::ProsCons,
    ];

    pub fn prompt(self) -> &'static str {
        match self {
            PendingAction::ShowImei => "Would you like me to show its IMEI number?",
            PendingAction::Compare => "Would you like me to compare it with a similar model?",
            PendingAction::Resale => "Do you want to know its resale value?",
            PendingAction::ProsCons => "Would you like me to tell you its top pros and cons?",
            PendingAction::FollowUp(topic) => topic.prompt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingConfirmation {
        action: PendingAction,
        record: PhoneRecord,
    },
}

/// Everything one user's conversation owns.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    transcript: ChatTranscript,
    state: ConversationState,
    current_phone: Option<PhoneRecord>,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Session {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_rng(StdRng::seed_from_u64(seed)),
            None => Self::default(),
        }
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: ChatTranscript::new(constants::SYSTEM_PROMPT),
            state: ConversationState::Idle,
            current_phone: None,
            rng,
        }
    }

    /// Resumes a session that has already offered `action` for `record`.
    pub fn awaiting(mut self, action: PendingAction, record: PhoneRecord) -> Self {
        self.current_phone = Some(record.clone());
        self.state = ConversationState::AwaitingConfirmation { action, record };
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn pending(&self) -> Option<PendingAction> {
        match &self.state {
            ConversationState::Idle => None,
            ConversationState::AwaitingConfirmation { action, .. } => Some(*action),
        }
    }

    pub fn current_phone(&self) -> Option<&PhoneRecord> {
        self.current_phone.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub sentiment: Sentiment,
    /// Set when the language model could not be reached; `text` then carries a warning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_fault: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnOutcome {
    Replied(Reply),
    NotFound { query: String },
}

/// Handles chat turns. Holds only shared, read-only collaborators; all
/// per-user state lives in the [`Session`] passed to each turn.
pub struct ChatEngine {
    provider: Arc<dyn PhoneRecordProvider>,
    gateway: Arc<dyn LanguageModelGateway>,
    classifier: Arc<SentimentClassifier>,
}

impl ChatEngine {
    pub fn new(
        provider: Arc<dyn PhoneRecordProvider>,
        gateway: Arc<dyn LanguageModelGateway>,
        classifier: Arc<SentimentClassifier>,
    ) -> Self {
        Self {
            provider,
            gateway,
            classifier,
        }
    }

    pub fn provider(&self) -> &Arc<dyn PhoneRecordProvider> {
        &self.provider
    }

    pub fn classifier(&self) -> &Arc<SentimentClassifier> {
        &self.classifier
    }

    pub async fn handle_turn(&self, session: &mut Session, input: &str) -> TurnOutcome {
        let pending = std::mem::replace(&mut session.state, ConversationState::Idle);
        match pending {
            ConversationState::Idle => self.start_topic(session, input).await,
            ConversationState::AwaitingConfirmation { action, record } => {
                session.transcript.push_user(input);
                let (text, next) = if is_affirmative(input) {
                    info!(session = %session.id, ?action, "Follow-up accepted");
                    self.resolve_action(session, action, record)
                } else {
                    info!(session = %session.id, ?action, "Follow-up declined");
                    (DECLINE_REPLY.to_string(), ConversationState::Idle)
                };
                session.state = next;
                TurnOutcome::Replied(self.finish(session, text, None))
            }
        }
    }

    async fn start_topic(&self, session: &mut Session, input: &str) -> TurnOutcome {
        let record = match self.provider.resolve(input, &mut session.rng) {
            Ok(record) => record,
            Err(LookupError::NotFound { query }) => {
                info!(session = %session.id, %query, provider = self.provider.name(), "No phone found");
                return TurnOutcome::NotFound { query };
            }
        };
        debug!(session = %session.id, ?record, "Resolved phone record");

        session.transcript.push_user(input);
        let prompt = format!(
            "{}\n\nHere are the phone details:\n{}\nGive a friendly review and ask one realistic follow-up question.",
            input,
            record.details()
        );
        let mut messages = session.transcript.turns().to_vec();
        messages.push(Turn::user(prompt));

        let (review, fault) = match self.gateway.send(&messages).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(session = %session.id, error = %e, "Language model call failed");
                (e.warning_text(), Some(e.to_string()))
            }
        };

        let action = *PendingAction::OPENERS
            .choose(&mut session.rng)
            .unwrap_or(&PendingAction::ShowImei);
        info!(session = %session.id, ?action, model = %record.model, "Offering follow-up");

        let text = format!("{}\n\n{}", review, action.prompt());
        session.current_phone = Some(record.clone());
        session.state = ConversationState::AwaitingConfirmation { action, record };
        TurnOutcome::Replied(self.finish(session, text, fault))
    }

    fn resolve_action(
        &self,
        session: &mut Session,
        action: PendingAction,
        record: PhoneRecord,
    ) -> (String, ConversationState) {
        let text = match action {
            PendingAction::ShowImei => {
                let topic = *FollowUpTopic::ALL
                    .choose(&mut session.rng)
                    .unwrap_or(&FollowUpTopic::Resale);
                let text = format!(
                    "The IMEI number for {} {} {} is **{}**.\n\n{}",
                    record.make,
                    record.series,
                    record.model,
                    record.imei,
                    topic.prompt()
                );
                let next = ConversationState::AwaitingConfirmation {
                    action: PendingAction::FollowUp(topic),
                    record,
                };
                return (text, next);
            }
            PendingAction::Compare | PendingAction::FollowUp(FollowUpTopic::Compare) => {
                self.compare_reply(&mut session.rng)
            }
            PendingAction::Resale | PendingAction::FollowUp(FollowUpTopic::Resale) => {
                resale_reply(&record, &mut session.rng)
            }
            PendingAction::ProsCons | PendingAction::FollowUp(FollowUpTopic::ProsCons) => {
                PROS_CONS_REPLY.to_string()
            }
        };
        (text, ConversationState::Idle)
    }

    fn compare_reply(&self, rng: &mut StdRng) -> String {
        let series = self.provider.series();
        match series.choose(rng) {
            Some(other) => format!(
                "This model is comparable to the **{}** series in performance and pricing.",
                other
            ),
            None => "I don't have another series to compare it with right now.".to_string(),
        }
    }

    fn finish(&self, session: &mut Session, text: String, gateway_fault: Option<String>) -> Reply {
        session.transcript.push_assistant(text.clone());
        let sentiment = self.classifier.classify(&text);
        Reply {
            text,
            sentiment,
            gateway_fault,
        }
    }
}

fn resale_reply(record: &PhoneRecord, rng: &mut StdRng) -> String {
    let factor = rng.gen_range(RESALE_FACTOR_MIN..=RESALE_FACTOR_MAX);
    format!(
        "The estimated resale value is around {}.",
        record.price.scaled(factor)
    )
}

pub fn is_affirmative(input: &str) -> bool {
    let lowered = input.to_lowercase();
    AFFIRMATIONS.iter().any(|word| lowered.contains(word))
}
