//! Telegram client using teloxide.

use std::fmt;
use std::future::Future;

use teloxide::prelude::*;
use teloxide::types::{InputPollOption, MessageId, PollType, ReplyParameters};
use tracing::{info, warn};

use crate::quiz::QuizQuestion;

/// A failed send to Telegram.
#[derive(Debug, Clone)]
pub struct DeliveryError(pub String);

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "delivery failed: {}", self.0)
    }
}

impl std::error::Error for DeliveryError {}

/// The outbound half of the chat platform, as the daily jobs see it.
pub trait ChatClient: Send + Sync {
    /// Returns the sent message id.
    fn send_message(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<i64, DeliveryError>> + Send;

    /// Sends a quiz-type poll with the question's zero-based correct option.
    fn send_quiz_poll(
        &self,
        chat_id: i64,
        quiz: &QuizQuestion,
    ) -> impl Future<Output = Result<i64, DeliveryError>> + Send;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Reply to a specific message in a chat.
    pub async fn reply(&self, chat_id: i64, reply_to: i64, text: &str) -> Result<i64, DeliveryError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(reply_to as i32)))
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to reply: {e}");
                warn!("{}", msg);
                DeliveryError(msg)
            })
    }
}

impl ChatClient for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, DeliveryError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                DeliveryError(msg)
            })
    }

    async fn send_quiz_poll(&self, chat_id: i64, quiz: &QuizQuestion) -> Result<i64, DeliveryError> {
        info!("📊 Sending quiz poll to chat {}: {}", chat_id, quiz.question);

        let options = quiz.options.iter().map(|o| InputPollOption::new(o.clone()));

        self.bot
            .send_poll(ChatId(chat_id), quiz.question.clone(), options)
            .type_(PollType::Quiz)
            .correct_option_id(quiz.correct_index)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send poll: {e}");
                warn!("{}", msg);
                DeliveryError(msg)
            })
    }
}
