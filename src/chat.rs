// Terminal chat: the same conversation flow as the web UI, one line per turn.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::conversation::{ChatEngine, Session, TurnOutcome};

const QUIT_COMMAND: &str = "/quit";

pub async fn run_chat<R, W>(engine: &ChatEngine, session: &mut Session, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!(session = %session.id(), "Starting terminal chat");
    writeln!(out, "Chat about mobile phones. Type {} or press Ctrl-D to leave.", QUIT_COMMAND)?;

    let mut lines = input.lines();
    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == QUIT_COMMAND {
            break;
        }

        match engine.handle_turn(session, line).await {
            TurnOutcome::Replied(reply) => {
                writeln!(out, "Bot: {}", reply.text)?;
                writeln!(out, "📊 Sentiment of AI Response: {}", reply.sentiment)?;
            }
            TurnOutcome::NotFound { query } => {
                writeln!(out, "❌ Sorry, no data found for '{}'.", query)?;
            }
        }
    }

    info!(session = %session.id(), turns = session.transcript().conversation().len(), "Chat session finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_interaction::{GatewayError, LanguageModelGateway};
    use crate::provider::SeriesTableProvider;
    use crate::sentiment::SentimentClassifier;
    use crate::transcript::Turn;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Fixed;

    #[async_trait]
    impl LanguageModelGateway for Fixed {
        async fn send(&self, _messages: &[Turn]) -> Result<String, GatewayError> {
            Ok("Great choice.".to_string())
        }
    }

    #[tokio::test]
    async fn test_chat_until_quit() {
        let engine = ChatEngine::new(
            Arc::new(SeriesTableProvider),
            Arc::new(Fixed),
            Arc::new(SentimentClassifier::default()),
        );
        let mut session = Session::new(Some(1));
        let input: &[u8] = b"iphone 14\n\nno\n/quit\nignored\n";
        let mut out = Vec::new();

        run_chat(&engine, &mut session, input, &mut out).await.unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Bot: Great choice."));
        assert!(printed.contains("Bot: Alright, skipping that step."));
        assert!(printed.contains("📊 Sentiment of AI Response:"));
        assert!(!printed.contains("ignored"));
        assert_eq!(session.transcript().conversation().len(), 4);
    }

    #[tokio::test]
    async fn test_chat_ends_on_eof() {
        let engine = ChatEngine::new(
            Arc::new(SeriesTableProvider),
            Arc::new(Fixed),
            Arc::new(SentimentClassifier::default()),
        );
        let mut session = Session::new(Some(2));
        let input: &[u8] = b"";
        let mut out = Vec::new();
        run_chat(&engine, &mut session, input, &mut out).await.unwrap();
        assert!(!session.transcript().has_conversation());
    }
}
