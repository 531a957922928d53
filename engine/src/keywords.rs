//! Keyword extraction for free-text instructions and questions.

use std::sync::OnceLock;

use regex::Regex;

/// Function words and generic task vocabulary ignored by the agent.
pub const AGENT_STOP_WORDS: &[&str] = &[
    "o", "a", "os", "as", "um", "uma", "de", "da", "do", "em", "no", "na", "que", "como", "qual",
    "quais", "por", "para", "com", "sem", "se", "é", "são", "arquivo", "arquivos", "código",
    "adicionar", "remover", "modificar", "the", "and", "for", "with", "without", "from", "this",
    "that", "file", "files", "code", "add", "remove", "change", "modify",
];

/// The agent list plus the conversational words questions tend to carry.
pub const ANALYZER_STOP_WORDS: &[&str] = &[
    "o", "a", "os", "as", "um", "uma", "de", "da", "do", "em", "no", "na", "que", "como", "qual",
    "quais", "por", "para", "com", "sem", "se", "é", "são", "foi", "ser", "estar", "ter", "pode",
    "deve", "quero", "preciso", "meu", "minha", "esse", "essa", "isso", "código", "arquivo",
    "the", "and", "for", "with", "this", "that", "file", "code", "what", "where", "how", "why",
    "does", "should", "can", "there", "any",
];

static NON_WORD: OnceLock<Regex> = OnceLock::new();

fn non_word() -> &'static Regex {
    NON_WORD.get_or_init(|| {
        Regex::new(r"[^a-z0-9_\sáàâãéêíóôõúç]").expect("valid keyword separator regex")
    })
}

/// Lowercased tokens longer than two characters that are not stop words.
///
/// Punctuation becomes whitespace, so `auth.js` yields `auth`.
#[must_use]
pub fn extract_keywords(text: &str, stop_words: &[&str]) -> Vec<String> {
    let lowered = text.to_lowercase();
    non_word()
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !stop_words.contains(word))
        .map(str::to_string)
        .collect()
}
