// Configuration constants, loaded from the environment (or .env) where it makes sense.

use std::env;

lazy_static::lazy_static! {
    pub static ref OLLAMA_URL: String = env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
    pub static ref CHAT_MODEL: String = env::var("PHONECHAT_MODEL").unwrap_or_else(|_| "mistral".to_string());
    pub static ref TEMPLATES_DIR: String = env::var("PHONECHAT_TEMPLATES").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("PHONECHAT_STATIC").unwrap_or_else(|_| "static".to_string());
}

pub const DEFAULT_CATALOG_PATH: &str = "mobile_phones.csv";
pub const DEFAULT_PORT: u16 = 8501;

/// First turn of every transcript.
pub const SYSTEM_PROMPT: &str = "You are a friendly and intelligent mobile expert chatbot. \
When a user mentions a mobile model, respond naturally and give useful information. \
After providing info, ask a logical follow-up question, like showing IMEI, comparing models, \
discussing resale value, or asking if the user wants pros and cons.";

/// Every user-visible gateway warning starts with this marker.
pub const WARNING_MARKER: &str = "⚠️";
