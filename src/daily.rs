//! Today's selected content, handed from the morning and midday jobs to the
//! evening quiz.
//!
//! Each job gets only the handle it needs: the morning job can set words, the
//! midday job can set grammar, the evening job can only read. The jobs fire
//! at disjoint times, so the mutex is never contended in practice.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::content::{GrammarTopic, VocabularyEntry};

#[derive(Debug, Default)]
struct Selection {
    words: Vec<VocabularyEntry>,
    grammar: Option<GrammarTopic>,
}

#[derive(Debug, Default)]
pub struct DailyState {
    inner: Mutex<Selection>,
}

impl DailyState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Split into the per-job handles.
    pub fn handles(self: &Arc<Self>) -> (WordsWriter, GrammarWriter, DailyReader) {
        (
            WordsWriter { state: self.clone() },
            GrammarWriter { state: self.clone() },
            DailyReader { state: self.clone() },
        )
    }

    fn lock(&self) -> MutexGuard<'_, Selection> {
        // A panic while holding the guard cannot leave a half-written
        // selection, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Morning job's view: overwrites today's words.
#[derive(Debug, Clone)]
pub struct WordsWriter {
    state: Arc<DailyState>,
}

impl WordsWriter {
    pub fn set_words(&self, words: Vec<VocabularyEntry>) {
        self.state.lock().words = words;
    }
}

/// Midday job's view: overwrites today's grammar topic.
#[derive(Debug, Clone)]
pub struct GrammarWriter {
    state: Arc<DailyState>,
}

impl GrammarWriter {
    pub fn set_grammar(&self, topic: GrammarTopic) {
        self.state.lock().grammar = Some(topic);
    }
}

/// Evening job's view: read-only.
#[derive(Debug, Clone)]
pub struct DailyReader {
    state: Arc<DailyState>,
}

impl DailyReader {
    pub fn words(&self) -> Vec<VocabularyEntry> {
        self.state.lock().words.clone()
    }

    pub fn grammar(&self) -> Option<GrammarTopic> {
        self.state.lock().grammar.clone()
    }
}
