//! # Engenharia de Features
//!
//! Cada decisão dos estágios (tag de um token, próxima transição do parser,
//! próxima tag BILOU) é tomada a partir de um vetor esparso de features
//! binárias. Este módulo define o vetor e os *templates* compartilhados.
//!
//! ## Templates de token
//!
//! Para uma posição e um nome de slot (ex: `w`, `s0`, `b1`), [`token_features`]
//! emite atributos lexicais prontos no [`crate::lexicon::Lexeme`]:
//!
//! - forma minúscula, sufixos de 3, 2 e 1 caracteres, prefixo, forma
//!   abstrata (`shape`)
//! - flags: título, maiúsculas, dígito, pontuação, parece número
//! - tag já atribuída, quando existe
//!
//! Os templates de contexto (janela de palavras, tags anteriores, pilha do
//! parser) são montados por cada estágio com as mesmas chaves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::doc::Doc;
use crate::orth::LexFlags;

/// Vetor esparso de features.
///
/// Um mapa esparso (`HashMap<String, f64>`) porque o espaço de features é
/// aberto ("w=abacaxi", "suf=axi"), mas cada decisão ativa só algumas dezenas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Features ativas. Ex: `{"bias": 1.0, "w=brasil": 1.0}`.
    pub features: HashMap<String, f64>,
}

impl FeatureVector {
    /// Vetor com a feature `bias` já ativa.
    pub fn new() -> Self {
        let mut fv = Self::default();
        fv.insert("bias", 1.0);
        fv
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.features.insert(key.into(), value);
    }

    /// Atalho para features binárias.
    pub fn set(&mut self, key: impl Into<String>) {
        self.insert(key, 1.0);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.features.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Atributos lexicais do token `i` sob o nome de slot `slot`.
///
/// Posições fora do buffer viram a feature `{slot}=<none>`.
pub fn token_features(fv: &mut FeatureVector, doc: &Doc, i: Option<usize>, slot: &str) {
    let Some(token) = i.and_then(|i| doc.get(i)) else {
        fv.set(format!("{slot}=<none>"));
        return;
    };
    let lex = token.lexeme();
    fv.set(format!("{slot}w={}", lex.lower));
    fv.set(format!("{slot}suf={}", lex.suffix.to_lowercase()));
    let tail: Vec<char> = lex.lower.chars().rev().take(2).collect();
    if let (true, [last, prev]) = (lex.length > 3, tail.as_slice()) {
        fv.set(format!("{slot}suf2={prev}{last}"));
        fv.set(format!("{slot}suf1={last}"));
    }
    fv.set(format!("{slot}pre={}", lex.prefix));
    fv.set(format!("{slot}shape={}", lex.shape));
    for (flag, name) in [
        (LexFlags::IS_TITLE, "title"),
        (LexFlags::IS_UPPER, "upper"),
        (LexFlags::IS_DIGIT, "digit"),
        (LexFlags::IS_PUNCT, "punct"),
        (LexFlags::LIKE_NUM, "num"),
    ] {
        if lex.check(flag) {
            fv.set(format!("{slot}is_{name}"));
        }
    }
    if let Some(tag) = token.tag() {
        fv.set(format!("{slot}t={tag}"));
    }
}

/// Somente a forma minúscula do token `i` (usada nas janelas de contexto).
pub fn word_feature(fv: &mut FeatureVector, doc: &Doc, i: Option<usize>, slot: &str) {
    match i.and_then(|i| doc.get(i)) {
        Some(token) => fv.set(format!("{slot}={}", token.lower())),
        None => fv.set(format!("{slot}=<none>")),
    }
}

/// Índice `i + offset`, se estiver dentro de `0..len`.
pub fn offset(i: usize, offset: isize, len: usize) -> Option<usize> {
    let j = i.checked_add_signed(offset)?;
    (j < len).then_some(j)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lang;
    use crate::lexicon::Lexicon;
    use crate::strings::StringStore;
    use crate::tokenizer::Tokenizer;

    fn segment(text: &str) -> Doc {
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        Tokenizer::new(lexicon, &lang::english_rules())
            .unwrap()
            .segment(text)
    }

    #[test]
    fn test_bias_is_always_on() {
        let fv = FeatureVector::new();
        assert!(fv.contains("bias"));
        assert_eq!(fv.len(), 1);
    }

    #[test]
    fn test_token_features() {
        let doc = segment("London calling");
        let mut fv = FeatureVector::new();
        token_features(&mut fv, &doc, Some(0), "");
        assert!(fv.contains("w=london"));
        assert!(fv.contains("suf=don"));
        assert!(fv.contains("suf2=on"));
        assert!(fv.contains("suf1=n"));
        assert!(fv.contains("shape=Xxxxx"));
        assert!(fv.contains("is_title"));
        assert!(!fv.contains("is_punct"));
    }

    #[test]
    fn test_missing_position() {
        let doc = segment("alone");
        let mut fv = FeatureVector::new();
        token_features(&mut fv, &doc, offset(0, -1, doc.len()), "p1");
        word_feature(&mut fv, &doc, offset(0, 2, doc.len()), "n2");
        assert!(fv.contains("p1=<none>"));
        assert!(fv.contains("n2=<none>"));
    }

    #[test]
    fn test_offset_bounds() {
        assert_eq!(offset(0, -1, 3), None);
        assert_eq!(offset(1, -1, 3), Some(0));
        assert_eq!(offset(1, 2, 3), None);
    }
}
