//! Answers messages that mention the bot: a spelling/grammar correction in
//! Azerbaijani followed by a Persian translation with explanation.

use tracing::info;

use crate::generator::{GenerationError, PhraseGenerator};

pub const GREETING: &str = "Salam! Mən Az ↔ Fa AI köməkçisiyəm. Mənə mention edin və sual verin.";
pub const ASK_FOR_QUESTION: &str = "Sualınızı yazın, mən cavab verim.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mention {
    NotMentioned,
    /// Only the handle, nothing to answer.
    Empty,
    Question(String),
}

/// Detect `@bot_username` in `text` and strip every occurrence of it.
pub fn parse_mention(text: &str, bot_username: &str) -> Mention {
    let handle = format!("@{}", bot_username.trim_start_matches('@'));
    if !text.contains(&handle) {
        return Mention::NotMentioned;
    }

    let question = text.replace(&handle, "");
    let question = question.trim();
    if question.is_empty() {
        Mention::Empty
    } else {
        Mention::Question(question.to_string())
    }
}

pub fn correction_prompt(question: &str) -> String {
    format!("Səhv yazılmış mətni düzəlt və düzgün Az dili versiyasını göstər: {question}")
}

pub fn translation_prompt(question: &str) -> String {
    format!("{question} cümləsini Fars dilinə tərcümə et və izah et.")
}

/// Correction first, then translation; both answers go into one reply.
pub async fn answer<G: PhraseGenerator>(question: &str, generator: &G) -> Result<String, GenerationError> {
    let correction = generator.generate(&correction_prompt(question)).await?;
    let translation = generator.generate(&translation_prompt(question)).await?;
    Ok(format!("✅ Düzəliş: {correction}\n\n📝 Farsca izah: {translation}"))
}

/// Reply for an inbound message, or `None` when the bot was not mentioned.
pub async fn handle_mention<G: PhraseGenerator>(
    text: &str,
    bot_username: &str,
    generator: &G,
) -> Result<Option<String>, GenerationError> {
    match parse_mention(text, bot_username) {
        Mention::NotMentioned => Ok(None),
        Mention::Empty => Ok(Some(ASK_FOR_QUESTION.to_string())),
        Mention::Question(question) => {
            info!("💬 Mention question: {}", question.chars().take(100).collect::<String>());
            answer(&question, generator).await.map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    impl PhraseGenerator for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("cavab{}", prompts.len()))
        }
    }

    #[test]
    fn test_parse_mention() {
        assert_eq!(parse_mention("salam hamıya", "sozbot"), Mention::NotMentioned);
        assert_eq!(parse_mention("  @sozbot  ", "sozbot"), Mention::Empty);
        assert_eq!(
            parse_mention("@sozbot men kitab oxuyuram", "sozbot"),
            Mention::Question("men kitab oxuyuram".into())
        );
        assert_eq!(
            parse_mention("salam @sozbot necəsən @sozbot", "@sozbot"),
            Mention::Question("salam  necəsən".into())
        );
    }

    #[tokio::test]
    async fn test_handle_only_asks_for_question() {
        let generator = Recorder::default();
        let reply = handle_mention(" \n@sozbot\t ", "sozbot", &generator).await.unwrap();
        assert_eq!(reply.as_deref(), Some(ASK_FOR_QUESTION));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_mentioned_is_ignored() {
        let generator = Recorder::default();
        let reply = handle_mention("sadəcə söhbət", "sozbot", &generator).await.unwrap();
        assert!(reply.is_none());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_correction_then_translation() {
        let generator = Recorder::default();
        let reply = handle_mention("@sozbot men evə gedirem", "sozbot", &generator)
            .await
            .unwrap()
            .unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], correction_prompt("men evə gedirem"));
        assert_eq!(prompts[1], translation_prompt("men evə gedirem"));
        assert_eq!(reply, "✅ Düzəliş: cavab1\n\n📝 Farsca izah: cavab2");
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        struct Down;
        impl PhraseGenerator for Down {
            async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
                Err(GenerationError::Http("connection refused".into()))
            }
        }

        let result = handle_mention("@sozbot salam", "sozbot", &Down).await;
        assert!(matches!(result, Err(GenerationError::Http(_))));
    }
}
