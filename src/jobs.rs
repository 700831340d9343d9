//! The three daily jobs. Each is a plain async function over the daily-state
//! handle it owns and the collaborator traits, so it runs the same under the
//! scheduler and in tests.

use std::fmt;

use rand::Rng;
use tracing::{info, warn};

use crate::content::{Catalog, GrammarTopic, VocabularyEntry};
use crate::daily::{DailyReader, GrammarWriter, WordsWriter};
use crate::generator::{GenerationError, PhraseGenerator};
use crate::quiz::{extract_quiz, quiz_prompt};
use crate::telegram::{ChatClient, DeliveryError};

#[derive(Debug)]
pub enum JobError {
    Delivery(DeliveryError),
    Generation(GenerationError),
    /// Catalog has nothing to draw from.
    NoContent(&'static str),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Delivery(e) => write!(f, "{e}"),
            JobError::Generation(e) => write!(f, "generation failed: {e}"),
            JobError::NoContent(what) => write!(f, "catalog has no {what}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobError::Delivery(e) => Some(e),
            JobError::Generation(e) => Some(e),
            JobError::NoContent(_) => None,
        }
    }
}

impl From<DeliveryError> for JobError {
    fn from(e: DeliveryError) -> Self {
        JobError::Delivery(e)
    }
}

impl From<GenerationError> for JobError {
    fn from(e: GenerationError) -> Self {
        JobError::Generation(e)
    }
}

/// What the evening job did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    /// Words or grammar missing for today.
    Skipped,
    Sent { sent: usize, failed: usize },
}

pub fn words_message(words: &[VocabularyEntry]) -> String {
    let mut msg = format!("📚 Bu günün {} yeni sözü:", words.len());
    for w in words {
        msg.push('\n');
        msg.push_str(&format!("{} — {}", w.source, w.target));
    }
    msg
}

pub fn grammar_message(topic: &GrammarTopic) -> String {
    format!("📝 Günorta qrammatika mövzusu:\n{}\n{}", topic.source, topic.target)
}

/// Morning: pick today's words, remember them, post them.
pub async fn morning_words<C, R>(
    catalog: &Catalog,
    state: &WordsWriter,
    chat: &C,
    chat_id: i64,
    count: usize,
    rng: &mut R,
) -> Result<(), JobError>
where
    C: ChatClient,
    R: Rng + Send,
{
    let words = catalog.sample_words(count, rng);
    let msg = words_message(&words);
    state.set_words(words);

    chat.send_message(chat_id, &msg).await?;
    info!("📚 Posted {} words", count);
    Ok(())
}

/// Midday: pick today's grammar topic, remember it, post it.
pub async fn midday_grammar<C, R>(
    catalog: &Catalog,
    state: &GrammarWriter,
    chat: &C,
    chat_id: i64,
    rng: &mut R,
) -> Result<(), JobError>
where
    C: ChatClient,
    R: Rng + Send,
{
    let topic = catalog
        .random_grammar_topic(rng)
        .cloned()
        .ok_or(JobError::NoContent("grammar topics"))?;
    let msg = grammar_message(&topic);
    info!("📝 Grammar topic: {}", topic.source);
    state.set_grammar(topic);

    chat.send_message(chat_id, &msg).await?;
    Ok(())
}

/// Evening: turn today's words and grammar into quiz polls.
///
/// Each poll is sent independently; a failed send is logged and counted.
pub async fn evening_quiz<G, C>(
    state: &DailyReader,
    generator: &G,
    chat: &C,
    chat_id: i64,
    question_count: usize,
) -> Result<QuizOutcome, JobError>
where
    G: PhraseGenerator,
    C: ChatClient,
{
    let words = state.words();
    let Some(grammar) = state.grammar().filter(|_| !words.is_empty()) else {
        warn!("No daily content for the quiz (words: {}), skipping", words.len());
        return Ok(QuizOutcome::Skipped);
    };

    let prompt = quiz_prompt(&words, &grammar, question_count);
    let completion = generator.generate(&prompt).await?;
    let questions = extract_quiz(&completion);
    if questions.len() != question_count {
        warn!("Expected {} quiz questions, extracted {}", question_count, questions.len());
    }

    let mut sent = 0;
    let mut failed = 0;
    for quiz in &questions {
        match chat.send_quiz_poll(chat_id, quiz).await {
            Ok(_) => sent += 1,
            Err(e) => {
                warn!("Poll not sent ({}): {}", quiz.question, e);
                failed += 1;
            }
        }
    }

    info!("📊 Quiz done: {} sent, {} failed", sent, failed);
    Ok(QuizOutcome::Sent { sent, failed })
}
