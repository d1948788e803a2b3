//! One chat turn, end to end.
//!
//! moderation → retrieval → context → system prompt → model → reply block
//! → delivery plan → (background) history write.

use campus_assist_core::action::{self, FileRequest};
use campus_assist_core::context;
use campus_assist_core::delivery::DeliveryKind;
use campus_assist_core::resolve::MatchStage;
use campus_assist_core::retrieve;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::assistant::Assistant;
use crate::deliver;
use crate::error::AssistError;
use crate::history::TurnRecord;
use crate::llm::{ChatRequest, ChatTurn, Role};
use crate::prompt::{self, PromptInput, UserProfile, Weather};

/// A prior message as sent by clients: either `{role, content}` or the
/// older `{role, parts: [{text}]}` shape.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub parts: Vec<HistoryPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPart {
    #[serde(default)]
    pub text: String,
}

impl HistoryMessage {
    pub fn text(&self) -> String {
        match &self.content {
            Some(content) => content.clone(),
            None => self
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub weather: Option<Weather>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ChatInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            user: None,
            weather: None,
            conversation_id: None,
        }
    }
}

/// A file the model asked to hand over, and how it would be delivered.
#[derive(Debug, Clone, Serialize)]
pub struct FileOffer {
    /// Name exactly as the model wrote it.
    pub filename: String,
    /// Stored name it resolved to, if any.
    pub resolved: Option<String>,
    pub stage: Option<MatchStage>,
    pub delivery: DeliveryKind,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    pub file: Option<FileOffer>,
    /// Filenames that grounded this turn, in context order.
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Turn client history plus the new message into an alternating sequence
/// that starts with the user: empty turns are dropped, leading assistant
/// turns are dropped, and consecutive turns of one role are merged.
pub fn normalize_history(history: &[HistoryMessage], message: &str) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = Vec::with_capacity(history.len() + 1);
    let incoming = history
        .iter()
        .map(|m| (m.role, m.text()))
        .chain(std::iter::once((Role::User, message.to_string())));

    for (role, text) in incoming {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if turns.is_empty() && role == Role::Assistant {
            continue;
        }
        match turns.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(text);
            }
            _ => turns.push(ChatTurn {
                role,
                content: text.to_string(),
            }),
        }
    }
    turns
}

impl Assistant {
    /// One turn for a long-lived host. The history write runs detached and
    /// may finish after the reply is returned.
    pub async fn chat(&self, input: ChatInput) -> Result<ChatOutcome, AssistError> {
        let (outcome, _pending) = self.answer(input).await?;
        Ok(outcome)
    }

    /// One turn for a short-lived host: returns only after the history
    /// write has finished. A failed write is still only logged.
    pub async fn chat_to_completion(&self, input: ChatInput) -> Result<ChatOutcome, AssistError> {
        let (outcome, pending) = self.answer(input).await?;
        if let Some(handle) = pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "History task did not complete");
            }
        }
        Ok(outcome)
    }

    async fn answer(
        &self,
        input: ChatInput,
    ) -> Result<(ChatOutcome, Option<JoinHandle<()>>), AssistError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(AssistError::Validation("message must not be empty".to_string()));
        }

        if let Some(term) = self.moderator.check(message) {
            warn!(term, "Message blocked by moderation");
            return Err(AssistError::Blocked(
                "Mesajınız uygunsuz ifadeler içerdiği için işlenemedi.".to_string(),
            ));
        }

        let selected = retrieve::retrieve(self.corpus.as_ref(), message).await?;
        let grounding = context::assemble(&selected);
        let documents: Vec<String> = selected.iter().map(|d| d.filename().to_string()).collect();
        info!(documents = documents.len(), "Grounding assembled");

        let system = prompt::build_system_prompt(&PromptInput {
            now: self.now(),
            user: input.user.as_ref(),
            weather: input.weather.as_ref(),
            context: &grounding,
        });
        let request = ChatRequest {
            system,
            messages: normalize_history(&input.history, message),
        };

        let raw_reply = self.model.complete(&request).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "Model call failed");
            AssistError::UpstreamFailure(e.to_string())
        })?;

        let (reply, block) = action::extract_action(&raw_reply);
        let file = match block.and_then(|b| b.into_file_request()) {
            Some(request) => Some(self.offer(request).await),
            None => None,
        };

        let conversation_id = match (&self.history, input.conversation_id) {
            (Some(_), None) => Some(Uuid::new_v4().to_string()),
            (_, id) => id,
        };

        let pending = match (&self.history, &conversation_id) {
            (Some(log), Some(id)) => Some(log.spawn_record(TurnRecord {
                conversation_id: id.clone(),
                user_id: input.user.as_ref().and_then(|u| u.id.clone()),
                user_message: message.to_string(),
                reply: reply.clone(),
            })),
            _ => None,
        };

        let outcome = ChatOutcome {
            reply,
            file,
            documents,
            conversation_id,
        };
        Ok((outcome, pending))
    }

    async fn offer(&self, request: FileRequest) -> FileOffer {
        let plan = deliver::plan_request(self.files.as_ref(), &request).await;
        let (resolved, stage) = match &plan {
            campus_assist_core::delivery::DeliveryPlan::Serve { name, stage, .. } => {
                (Some(name.clone()), Some(*stage))
            }
            _ => (None, None),
        };
        info!(requested = %request.filename, delivery = ?plan.kind(), "File offer prepared");
        FileOffer {
            filename: request.filename,
            resolved,
            stage,
            delivery: plan.kind(),
            data: request.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Role, text: &str) -> HistoryMessage {
        HistoryMessage {
            role,
            content: Some(text.to_string()),
            parts: Vec::new(),
        }
    }

    #[test]
    fn history_drops_leading_assistant_and_empty_turns() {
        let history = vec![
            message(Role::Assistant, "Merhaba, nasıl yardımcı olabilirim?"),
            message(Role::User, "  "),
            message(Role::User, "Staj formu lazım"),
            message(Role::Assistant, "Hangi bölüm?"),
        ];
        let turns = normalize_history(&history, "Veterinerlik");
        assert_eq!(
            turns,
            vec![
                ChatTurn::user("Staj formu lazım"),
                ChatTurn::assistant("Hangi bölüm?"),
                ChatTurn::user("Veterinerlik"),
            ]
        );
    }

    #[test]
    fn history_merges_consecutive_roles() {
        let history = vec![message(Role::User, "Merhaba")];
        let turns = normalize_history(&history, "Ders programı?");
        assert_eq!(turns, vec![ChatTurn::user("Merhaba\n\nDers programı?")]);
    }

    #[test]
    fn legacy_parts_shape_is_accepted() {
        let parsed: HistoryMessage = serde_json::from_value(serde_json::json!({
            "role": "model",
            "parts": [{"text": "Buyurun"}]
        }))
        .unwrap();
        assert_eq!(parsed.role, Role::Assistant);
        assert_eq!(parsed.text(), "Buyurun");
    }
}
