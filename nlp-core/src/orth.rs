//! # Atributos Ortográficos
//!
//! Funções puras que inspecionam os caracteres de uma forma de palavra:
//! a "forma" abstrata ([`word_shape`]) e o conjunto de flags booleanas
//! ([`LexFlags`]) guardado em cada entrada do lexicon.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags lexicais calculadas por inspeção de caracteres.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LexFlags: u32 {
        const IS_ALPHA = 1 << 0;
        const IS_ASCII = 1 << 1;
        const IS_DIGIT = 1 << 2;
        const IS_LOWER = 1 << 3;
        const IS_UPPER = 1 << 4;
        /// Primeira letra maiúscula, demais minúsculas ("London").
        const IS_TITLE = 1 << 5;
        const IS_PUNCT = 1 << 6;
        const IS_SPACE = 1 << 7;
        const IS_BRACKET = 1 << 8;
        const IS_QUOTE = 1 << 9;
        /// Parece número: "10", "3.14", "1,000", "ten".
        const LIKE_NUM = 1 << 10;
        const LIKE_URL = 1 << 11;
        /// Entrada sintetizada na primeira busca (fora do vocabulário carregado).
        const IS_OOV = 1 << 12;
    }
}

const BRACKETS: &[char] = &['(', ')', '[', ']', '{', '}', '<', '>'];
const QUOTES: &[char] = &['"', '\'', '`', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}', '\u{ab}', '\u{bb}'];
const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "hundred", "thousand", "million", "billion",
];
const URL_SUFFIXES: &[&str] = &[".com", ".org", ".net", ".edu", ".gov", ".io", ".br"];

/// Forma abstrata de uma palavra.
///
/// Maiúsculas viram `X`, minúsculas `x`, dígitos `d`; outros caracteres são
/// mantidos. Sequências do mesmo símbolo são truncadas em 4 repetições.
///
/// ```
/// use nlp_core::orth::word_shape;
/// assert_eq!(word_shape("Apple"), "Xxxxx");
/// assert_eq!(word_shape("1999"), "dddd");
/// assert_eq!(word_shape("Mississippi"), "Xxxxx");
/// assert_eq!(word_shape("C3-PO"), "Xd-XX");
/// ```
pub fn word_shape(s: &str) -> String {
    let mut shape = String::with_capacity(s.len());
    let mut last = None;
    let mut seq = 0;
    for c in s.chars() {
        let shape_char = if c.is_alphabetic() {
            if c.is_uppercase() {
                'X'
            } else {
                'x'
            }
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };
        if Some(shape_char) == last {
            seq += 1;
        } else {
            seq = 0;
            last = Some(shape_char);
        }
        if seq < 4 {
            shape.push(shape_char);
        }
    }
    shape
}

/// Calcula as flags de uma forma de palavra.
pub fn get_flags(s: &str) -> LexFlags {
    let mut flags = LexFlags::empty();
    if s.is_empty() {
        return flags;
    }
    if s.chars().all(char::is_alphabetic) {
        flags |= LexFlags::IS_ALPHA;
    }
    if s.is_ascii() {
        flags |= LexFlags::IS_ASCII;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        flags |= LexFlags::IS_DIGIT;
    }
    let has_cased = s.chars().any(|c| c.is_lowercase() || c.is_uppercase());
    if has_cased && !s.chars().any(char::is_uppercase) {
        flags |= LexFlags::IS_LOWER;
    }
    if has_cased && !s.chars().any(char::is_lowercase) {
        flags |= LexFlags::IS_UPPER;
    }
    if is_title(s) {
        flags |= LexFlags::IS_TITLE;
    }
    if s.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        flags |= LexFlags::IS_PUNCT;
    }
    if s.chars().all(char::is_whitespace) {
        flags |= LexFlags::IS_SPACE;
    }
    if s.chars().all(|c| BRACKETS.contains(&c)) {
        flags |= LexFlags::IS_BRACKET;
    }
    if s.chars().all(|c| QUOTES.contains(&c)) {
        flags |= LexFlags::IS_QUOTE;
    }
    if like_num(s) {
        flags |= LexFlags::LIKE_NUM;
    }
    if like_url(s) {
        flags |= LexFlags::LIKE_URL;
    }
    flags
}

fn is_title(s: &str) -> bool {
    let mut chars = s.chars().filter(|c| c.is_alphabetic());
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| !c.is_uppercase()),
        _ => false,
    }
}

fn like_num(s: &str) -> bool {
    let stripped = s.trim_start_matches(['+', '-', '~']);
    if !stripped.is_empty()
        && stripped.chars().any(|c| c.is_ascii_digit())
        && stripped.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return true;
    }
    // Frações simples: "1/2"
    if let Some((num, den)) = stripped.split_once('/') {
        if !num.is_empty()
            && !den.is_empty()
            && num.chars().all(|c| c.is_ascii_digit())
            && den.chars().all(|c| c.is_ascii_digit())
        {
            return true;
        }
    }
    NUMBER_WORDS.contains(&s.to_lowercase().as_str())
}

fn like_url(s: &str) -> bool {
    if s.len() < 4 {
        return false;
    }
    let lower = s.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || URL_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix) && lower.len() > suffix.len())
}
