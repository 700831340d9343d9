//! Vocabulary and grammar catalog.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// A word pair: Azerbaijani term and its Persian counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub source: String,
    pub target: String,
}

/// A grammar topic title in both languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarTopic {
    pub source: String,
    pub target: String,
}

impl VocabularyEntry {
    pub fn new(source: &str, target: &str) -> Self {
        Self { source: source.to_string(), target: target.to_string() }
    }
}

impl GrammarTopic {
    pub fn new(source: &str, target: &str) -> Self {
        Self { source: source.to_string(), target: target.to_string() }
    }
}

#[derive(Debug)]
pub enum CatalogError {
    ReadFile { path: PathBuf, source: std::io::Error },
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Catalog cannot serve what the config asks for.
    Capacity(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read catalog '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse catalog '{}': {}", path.display(), source)
            }
            Self::Capacity(msg) => write!(f, "catalog too small: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Capacity(_) => None,
        }
    }
}

/// Static content the daily jobs draw from. Never mutated after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub words: Vec<VocabularyEntry>,
    pub grammar: Vec<GrammarTopic>,
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CatalogError::ReadFile { path: path.clone(), source: e })?;
        serde_json::from_str(&content).map_err(|e| CatalogError::ParseJson { path, source: e })
    }

    /// Check once at startup that `n` words per day can be drawn without repeats.
    pub fn ensure_word_capacity(&self, n: usize) -> Result<(), CatalogError> {
        if n == 0 {
            return Err(CatalogError::Capacity("words per day must be at least 1".into()));
        }
        if n > self.words.len() {
            return Err(CatalogError::Capacity(format!(
                "{} words per day requested but catalog has {}",
                n,
                self.words.len()
            )));
        }
        if self.grammar.is_empty() {
            return Err(CatalogError::Capacity("no grammar topics".into()));
        }
        Ok(())
    }

    /// `n` distinct entries in random order. Callers validate `n` up front
    /// with [`Catalog::ensure_word_capacity`]; a larger `n` yields the whole catalog.
    pub fn sample_words<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<VocabularyEntry> {
        self.words.choose_multiple(rng, n).cloned().collect()
    }

    pub fn random_grammar_topic<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&GrammarTopic> {
        self.grammar.choose(rng)
    }

    pub fn builtin() -> Self {
        let words = BUILTIN_WORDS
            .iter()
            .map(|(az, fa)| VocabularyEntry::new(az, fa))
            .collect();
        let grammar = BUILTIN_GRAMMAR
            .iter()
            .map(|(az, fa)| GrammarTopic::new(az, fa))
            .collect();
        Self { words, grammar }
    }
}

const BUILTIN_WORDS: &[(&str, &str)] = &[
    ("Salam", "سلام"),
    ("Necəsən?", "حالت چطور است؟"),
    ("Yaxşıyam", "خوبم"),
    ("Ev", "خانه"),
    ("Məktəb", "مدرسه"),
    ("Kitab", "کتاب"),
    ("Qələm", "قلم"),
    ("Maşın", "ماشین"),
    ("Dost", "دوست"),
    ("Sevgi", "عشق"),
    ("Su", "آب"),
    ("Çörək", "نان"),
    ("Ata", "پدر"),
    ("Ana", "مادر"),
    ("Qardaş", "برادر"),
    ("Bacı", "خواهر"),
    ("Şəhər", "شهر"),
    ("Yol", "راه"),
    ("Gün", "روز"),
    ("Gecə", "شب"),
    ("Səhər", "صبح"),
    ("Axşam", "عصر"),
    ("Dəniz", "دریا"),
    ("Dağ", "کوه"),
    ("Gül", "گل"),
    ("Ağac", "درخت"),
    ("Pul", "پول"),
    ("İş", "کار"),
    ("Sağol", "خداحافظ"),
    ("Təşəkkür edirəm", "متشکرم"),
    ("Bəli", "بله"),
    ("Xeyr", "نه"),
];

const BUILTIN_GRAMMAR: &[(&str, &str)] = &[
    ("Fars dilində feillərin cəm forması", "صرف فعل‌ها در حالت جمع"),
    ("Fars dilində sifətlərin istifadəsi", "کاربرد صفت‌ها در زبان فارسی"),
    ("Fars dilində sual cümlələri", "جمله‌های پرسشی در زبان فارسی"),
    ("İzafət tərkibi", "ساخت اضافه"),
    ("Şəxs əvəzlikləri", "ضمیرهای شخصی"),
    ("Keçmiş zaman feilləri", "فعل‌های زمان گذشته"),
    ("İndiki zaman feilləri", "فعل‌های زمان حال"),
    ("İnkar cümlələri", "جمله‌های منفی"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample_words_distinct_and_from_catalog() {
        let catalog = Catalog::builtin();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = catalog.sample_words(10, &mut rng);
            assert_eq!(picked.len(), 10);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), 10, "duplicates for seed {seed}");
            assert!(picked.iter().all(|w| catalog.words.contains(w)));
        }
    }

    #[test]
    fn test_sample_whole_catalog() {
        let catalog = Catalog {
            words: (0..10).map(|i| VocabularyEntry::new(&i.to_string(), "x")).collect(),
            grammar: vec![GrammarTopic::new("a", "b")],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let picked: HashSet<_> = catalog.sample_words(10, &mut rng).into_iter().collect();
        let all: HashSet<_> = catalog.words.iter().cloned().collect();
        assert_eq!(picked, all);
    }

    #[test]
    fn test_random_grammar_topic() {
        let catalog = Catalog::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let topic = catalog.random_grammar_topic(&mut rng).unwrap();
        assert!(catalog.grammar.contains(topic));

        let empty = Catalog { words: vec![], grammar: vec![] };
        assert!(empty.random_grammar_topic(&mut rng).is_none());
    }

    #[test]
    fn test_builtin_keeps_original_words() {
        let catalog = Catalog::builtin();
        assert!(catalog.words.len() >= 30);
        assert!(catalog.grammar.len() >= 6);
        for az in ["Salam", "Necəsən?", "Kitab", "Sevgi"] {
            assert!(catalog.words.iter().any(|w| w.source == az));
        }
    }

    #[test]
    fn test_capacity_checks() {
        let catalog = Catalog::builtin();
        assert!(catalog.ensure_word_capacity(10).is_ok());
        assert!(catalog.ensure_word_capacity(catalog.words.len()).is_ok());
        assert!(matches!(
            catalog.ensure_word_capacity(catalog.words.len() + 1),
            Err(CatalogError::Capacity(_))
        ));
        assert!(matches!(catalog.ensure_word_capacity(0), Err(CatalogError::Capacity(_))));

        let no_grammar = Catalog { words: catalog.words.clone(), grammar: vec![] };
        assert!(no_grammar.ensure_word_capacity(10).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            r#"{
                "words": [{"source": "Alma", "target": "سیب"}],
                "grammar": [{"source": "Say", "target": "عدد"}]
            }"#
            .as_bytes(),
        )
        .unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.words, vec![VocabularyEntry::new("Alma", "سیب")]);
        assert_eq!(catalog.grammar[0].source, "Say");
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Catalog::load("/nonexistent/catalog.json"),
            Err(CatalogError::ReadFile { .. })
        ));
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(Catalog::load(file.path()), Err(CatalogError::ParseJson { .. })));
    }
}
