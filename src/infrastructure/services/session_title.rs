//! Session title generation

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::chat::{
    ChatHistoryRepository, ChatRole, ChatSessionRepository, DEFAULT_SESSION_TITLE,
};
use crate::domain::completion::{CompletionProvider, PromptMessage};
use crate::domain::ids::ProjectId;
use crate::domain::DomainError;

/// Longest title kept before truncation
const MAX_TITLE_LENGTH: usize = 50;

/// Characters of each message quoted into the title prompt
const PROMPT_EXCERPT_LENGTH: usize = 200;

/// Outcome of a project-wide retitling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetitleReport {
    /// Sessions that received a generated title
    pub retitled: usize,
    /// Sessions skipped for lack of a first exchange
    pub skipped: usize,
    /// Sessions where the title update failed
    pub failed: usize,
}

/// Generates concise session titles from the first user/assistant exchange.
///
/// Title generation is a secondary effect: any failure degrades to the
/// default title instead of propagating.
#[derive(Debug)]
pub struct SessionTitleService {
    completion: Arc<dyn CompletionProvider>,
    sessions: Arc<dyn ChatSessionRepository>,
    history: Arc<dyn ChatHistoryRepository>,
}

impl SessionTitleService {
    /// Create a new session title service
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        sessions: Arc<dyn ChatSessionRepository>,
        history: Arc<dyn ChatHistoryRepository>,
    ) -> Self {
        Self {
            completion,
            sessions,
            history,
        }
    }

    /// Generate a title from the opening exchange. Returns the default title
    /// when generation fails or produces nothing usable.
    pub async fn generate_title(&self, user_message: &str, assistant_reply: &str) -> String {
        let prompt = format!(
            "Based on the following conversation, create a concise, descriptive title \
             (max 6 words) that captures the main topic or purpose of the chat:\n\n\
             User: {}...\n\
             AI: {}...\n\n\
             Requirements:\n\
             - Maximum 6 words\n\
             - Descriptive and clear\n\
             - No quotes or special characters\n\
             - Capitalize appropriately\n\n\
             Title:",
            excerpt(user_message, PROMPT_EXCERPT_LENGTH),
            excerpt(assistant_reply, PROMPT_EXCERPT_LENGTH),
        );

        let messages = vec![
            PromptMessage::system(
                "You are a helpful assistant that creates concise chat titles. \
                 Always respond with just the title, nothing else.",
            ),
            PromptMessage::user(prompt),
        ];

        match self.completion.complete(messages).await {
            Ok(raw) => {
                let title = clean_title(&raw);
                if title.is_empty() {
                    DEFAULT_SESSION_TITLE.to_string()
                } else {
                    title
                }
            }
            Err(err) => {
                warn!(%err, "failed to generate session title");
                DEFAULT_SESSION_TITLE.to_string()
            }
        }
    }

    /// Retitle every session of a project still carrying the default title.
    /// With `dry_run` the generated titles are discarded.
    pub async fn retitle_project(
        &self,
        project_id: &ProjectId,
        dry_run: bool,
    ) -> Result<RetitleReport, DomainError> {
        let sessions = self
            .sessions
            .list_with_title(project_id, DEFAULT_SESSION_TITLE)
            .await?;

        info!(
            project = %project_id,
            count = sessions.len(),
            dry_run,
            "retitling sessions"
        );

        let mut report = RetitleReport::default();

        for session in sessions {
            let messages = self.history.list_for_session(&session.id).await?;

            let first_user = messages.iter().find(|m| m.role == ChatRole::User);
            let first_assistant = messages.iter().find(|m| m.role == ChatRole::Assistant);

            let (user, assistant) = match (first_user, first_assistant) {
                (Some(u), Some(a)) => (u, a),
                _ => {
                    report.skipped += 1;
                    continue;
                }
            };

            let title = self.generate_title(&user.content, &assistant.content).await;

            if title == DEFAULT_SESSION_TITLE {
                report.skipped += 1;
                continue;
            }

            if dry_run {
                report.retitled += 1;
                continue;
            }

            match self.sessions.update_title(&session.id, &title).await {
                Ok(()) => report.retitled += 1,
                Err(err) => {
                    warn!(session = %session.id, %err, "failed to update session title");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn clean_title(raw: &str) -> String {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().count() > MAX_TITLE_LENGTH {
        let truncated: String = cleaned.chars().take(MAX_TITLE_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        cleaned.to_string()
    }
}
