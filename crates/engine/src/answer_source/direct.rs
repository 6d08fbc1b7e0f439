//! Direct answer source over a conversational service.

use super::{AnswerSource, SourceMode};
use inquest_core::{AppError, AppResult};
use inquest_llm::{ConversationClient, ConversationMessage};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;
use uuid::Uuid;

struct ChatState {
    session_id: String,
    /// Ask the service to drop prior turns on the next message
    first_message: bool,
}

/// Forwards questions to one remote conversation handle.
pub struct DirectSource {
    client: Arc<dyn ConversationClient>,
    framing: String,
    state: Mutex<ChatState>,
}

impl DirectSource {
    /// A fresh handle with the first-message flag armed.
    pub fn new(client: Arc<dyn ConversationClient>, framing: impl Into<String>) -> Self {
        Self {
            client,
            framing: framing.into(),
            state: Mutex::new(ChatState {
                session_id: Uuid::new_v4().to_string(),
                first_message: true,
            }),
        }
    }

    fn state(&self) -> AppResult<MutexGuard<'_, ChatState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Other("Direct source lock poisoned".to_string()))
    }

    /// Current remote conversation handle.
    pub fn session_id(&self) -> AppResult<String> {
        Ok(self.state()?.session_id.clone())
    }
}

#[async_trait::async_trait]
impl AnswerSource for DirectSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Direct
    }

    #[instrument(skip(self, question), fields(provider = self.client.provider_name()))]
    async fn ask(&self, question: &str) -> AppResult<String> {
        let message = {
            let state = self.state()?;
            ConversationMessage {
                content: question.to_string(),
                session_id: state.session_id.clone(),
                reset_context: state.first_message,
                system: Some(self.framing.clone()),
            }
        };

        tracing::debug!(
            session_id = %message.session_id,
            reset_context = message.reset_context,
            "Sending question to conversation service"
        );
        let reply = self.client.send(&message).await?;

        // A reset_chat during the call issued a new handle; its flag stays armed
        let mut state = self.state()?;
        if state.session_id == message.session_id {
            state.first_message = false;
        }

        Ok(reply.trim().to_string())
    }

    async fn reset_chat(&self) -> AppResult<()> {
        let mut state = self.state()?;
        state.session_id = Uuid::new_v4().to_string();
        state.first_message = true;
        tracing::debug!(session_id = %state.session_id, "Issued new conversation handle");
        Ok(())
    }
}
