//! Customer help chat.
//!
//! The hosted language model is reached through [`HelpModel`]; this module
//! only shapes the request and keeps the running conversation.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpPart {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HelpRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpMessage {
    pub role: HelpRole,
    pub content: Vec<HelpPart>,
}

impl HelpMessage {
    #[must_use]
    pub fn text(role: HelpRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![HelpPart { text: text.into() }],
        }
    }
}

/// Wire shape of one help call: prior turns plus the new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub history: Vec<HelpMessage>,
    pub message: String,
}

#[async_trait]
pub trait HelpModel: Send + Sync {
    async fn reply(&self, request: &HelpRequest) -> Result<String>;
}

/// Running help conversation for one visitor.
#[derive(Debug, Clone, Default)]
pub struct HelpConversation {
    history: Vec<HelpMessage>,
}

impl HelpConversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> &[HelpMessage] {
        &self.history
    }

    /// Sends `message` with the conversation so far. Both turns are appended
    /// only when the model answers.
    pub async fn ask<M>(&mut self, model: &M, message: &str) -> Result<String>
    where
        M: HelpModel + ?Sized,
    {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Help {
                message: "message is empty".to_string(),
            });
        }

        let request = HelpRequest {
            history: self.history.clone(),
            message: message.to_string(),
        };
        let answer = model.reply(&request).await.inspect_err(|e| {
            warn!("Help model call failed: {}", e);
        })?;
        debug!("Help reply of {} chars", answer.len());

        self.history.push(HelpMessage::text(HelpRole::User, message));
        self.history
            .push(HelpMessage::text(HelpRole::Model, answer.clone()));
        Ok(answer)
    }
}
