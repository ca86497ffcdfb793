use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Append-only chat log. The first turn is always the system instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTranscript {
    turns: Vec<Turn>,
}

impl ChatTranscript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, system_prompt)],
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.append(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.append(Turn::assistant(content));
    }

    /// Every turn, system instruction included. This is the model context.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns shown to the user.
    pub fn conversation(&self) -> &[Turn] {
        &self.turns[1..]
    }

    pub fn last(&self) -> Option<&Turn> {
        self.conversation().last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True once anything beyond the system instruction has been recorded.
    pub fn has_conversation(&self) -> bool {
        self.turns.len() > 1
    }
}
