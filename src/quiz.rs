//! Quiz prompt and extraction of quiz blocks from generated text.
//!
//! Expected block shape:
//!
//! ```text
//! Sual 1: <question, may span lines>
//! Variantlar: <opt> <opt> <opt> <opt>
//! Düzgün: <A|B|C|D>...
//! ```
//!
//! Options are split on whitespace, so an option containing a space turns
//! into several tokens and the block fails the four-option check. That is
//! the accepted limitation of this template.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::content::{GrammarTopic, VocabularyEntry};

pub const OPTION_COUNT: usize = 4;

/// One quiz poll's worth of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: [String; OPTION_COUNT],
    /// Zero-based, always in `0..4`.
    pub correct_index: u8,
}

/// Why a block was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Header found but the Variantlar/Düzgün lines are missing or out of order.
    Malformed,
    OptionCount(usize),
    AnswerLetter(Option<char>),
}

static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Sual\s*\d+\s*:").unwrap());

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^Sual\s*\d+\s*:\s*(?P<question>.*?)\s*\n\s*Variantlar\s*:(?P<options>[^\n]*)\n\s*Düzgün\s*:[ \t]*(?P<answer>[^\n]*)",
    )
    .unwrap()
});

/// Extract every well-formed block, in source order. Bad blocks are logged
/// and skipped without affecting their neighbours.
pub fn extract_quiz(text: &str) -> Vec<QuizQuestion> {
    let starts: Vec<usize> = HEADER.find_iter(text).map(|m| m.start()).collect();
    let mut questions = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = &text[start..end];
        match parse_block(block) {
            Ok(q) => questions.push(q),
            Err(reason) => {
                warn!("Dropping quiz block #{}: {:?}", i + 1, reason);
                debug!("Dropped block text: {:?}", block);
            }
        }
    }

    questions
}

/// Parse a single block starting at its `Sual N:` header.
pub fn parse_block(block: &str) -> Result<QuizQuestion, Rejection> {
    let caps = BLOCK.captures(block).ok_or(Rejection::Malformed)?;

    let question = caps["question"].trim().to_string();
    if question.is_empty() {
        return Err(Rejection::Malformed);
    }

    let tokens: Vec<String> = caps["options"].split_whitespace().map(str::to_string).collect();
    let options: [String; OPTION_COUNT] = tokens
        .try_into()
        .map_err(|t: Vec<String>| Rejection::OptionCount(t.len()))?;

    let letter = caps["answer"].chars().next();
    let correct_index = letter.and_then(letter_index).ok_or(Rejection::AnswerLetter(letter))?;

    Ok(QuizQuestion { question, options, correct_index })
}

fn letter_index(c: char) -> Option<u8> {
    match c {
        'A' => Some(0),
        'B' => Some(1),
        'C' => Some(2),
        'D' => Some(3),
        _ => None,
    }
}

/// Prompt asking for `count` questions in the block format above.
pub fn quiz_prompt(words: &[VocabularyEntry], grammar: &GrammarTopic, count: usize) -> String {
    let word_list = words
        .iter()
        .map(|w| format!("{} ({})", w.source, w.target))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Bu günün sözləri: {word_list}\n\
         Bu günün qrammatika mövzusu: {} ({})\n\n\
         Bu sözlər və qrammatika mövzusu əsasında Azərbaycan dilində {count} test sualı hazırla. \
         Hər sualın 4 variantı olsun. Hər variant boşluqsuz, tək sözdən ibarət olsun və variantlar \
         bir sətirdə boşluqla ayrılsın. Cavabı dəqiq bu formatda yaz, başqa heç nə əlavə etmə:\n\n\
         Sual 1: <sual mətni>\n\
         Variantlar: <variant1> <variant2> <variant3> <variant4>\n\
         Düzgün: <A, B, C və ya D>",
        grammar.source, grammar.target
    )
}
