//! # Tokenizador Dirigido por Regras
//!
//! Divide o texto bruto em tokens apoiados no [`Lexicon`]. Cada token preserva
//! os offsets de byte do texto original, de modo que `&text[start..end]`
//! devolve exatamente o token.
//!
//! ## Algoritmo
//!
//! 1. O texto é cortado nos espaços em branco, gerando *chunks*.
//! 2. Se o chunk inteiro está na tabela de exceções ("don't", "Dr."), as peças
//!    da exceção são emitidas e o chunk termina aí.
//! 3. Caso contrário, de fora para dentro: tenta uma exceção no resíduo,
//!    depois arranca um prefixo (ex: `(`), depois um sufixo (ex: `.`),
//!    repetindo até nada mais casar.
//! 4. O resíduo que sobrou é quebrado pela regex de *infixos* (ex: hífen em
//!    "well-known"). O infixo também vira um token.
//!
//! ```rust
//! use std::sync::Arc;
//! use nlp_core::lexicon::Lexicon;
//! use nlp_core::strings::StringStore;
//! use nlp_core::tokenizer::Tokenizer;
//! use nlp_core::lang;
//!
//! let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
//! let tokenizer = Tokenizer::new(lexicon, &lang::english_rules()).unwrap();
//! let doc = tokenizer.segment("(I don't know.)");
//! let texts: Vec<&str> = doc.iter().map(|t| t.text()).collect();
//! assert_eq!(texts, ["(", "I", "do", "n't", "know", ".", ")"]);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::Doc;
use crate::error::{NlpError, Result};
use crate::lexicon::Lexicon;
use crate::strings::Symbol;

/// Uma peça de uma exceção de tokenização.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionPiece {
    /// Texto da peça. A concatenação das peças deve reproduzir o chunk.
    pub orth: String,
    /// Forma normalizada opcional (ex: "n't" → "not").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<String>,
}

impl ExceptionPiece {
    pub fn new(orth: impl Into<String>) -> Self {
        Self {
            orth: orth.into(),
            norm: None,
        }
    }

    pub fn with_norm(orth: impl Into<String>, norm: impl Into<String>) -> Self {
        Self {
            orth: orth.into(),
            norm: Some(norm.into()),
        }
    }
}

/// Dados de regra do tokenizador: exceções e as três regexes.
///
/// Um padrão ausente (`None`) desliga a etapa correspondente.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenizerRules {
    #[serde(default)]
    pub exceptions: BTreeMap<String, Vec<ExceptionPiece>>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub infix: Option<String>,
}

impl TokenizerRules {
    /// Registra uma exceção (substitui uma anterior com a mesma chave).
    pub fn add_exception(&mut self, chunk: impl Into<String>, pieces: Vec<ExceptionPiece>) {
        self.exceptions.insert(chunk.into(), pieces);
    }
}

#[derive(Debug, Clone)]
struct CompiledPiece {
    len: usize,
    norm: Option<Symbol>,
}

/// Trecho do texto destinado a virar um token.
struct Piece {
    start: usize,
    end: usize,
    norm: Option<Symbol>,
}

/// O tokenizador compilado.
///
/// Regexes e exceções são validadas em [`Tokenizer::new`]; depois disso
/// [`Tokenizer::segment`] nunca falha.
pub struct Tokenizer {
    lexicon: Arc<Lexicon>,
    exceptions: HashMap<String, Vec<CompiledPiece>>,
    prefix: Option<Regex>,
    suffix: Option<Regex>,
    infix: Option<Regex>,
}

impl Tokenizer {
    pub fn new(lexicon: Arc<Lexicon>, rules: &TokenizerRules) -> Result<Self> {
        let prefix = compile("prefix", rules.prefix.as_deref(), |p| format!("^(?:{p})"))?;
        let suffix = compile("suffix", rules.suffix.as_deref(), |p| format!("(?:{p})$"))?;
        let infix = compile("infix", rules.infix.as_deref(), |p| p.to_string())?;

        let strings = lexicon.strings();
        let mut exceptions = HashMap::with_capacity(rules.exceptions.len());
        for (chunk, pieces) in &rules.exceptions {
            let rebuilt: String = pieces.iter().map(|p| p.orth.as_str()).collect();
            // Chaves com espaço nunca casam: o texto é cortado em espaços antes.
            let spaced = chunk.chars().any(char::is_whitespace);
            let empty = pieces.is_empty() || pieces.iter().any(|p| p.orth.is_empty());
            if spaced || empty || rebuilt != *chunk {
                return Err(NlpError::InvalidException {
                    chunk: chunk.clone(),
                    pieces: pieces.iter().map(|p| p.orth.clone()).collect(),
                });
            }
            let compiled = pieces
                .iter()
                .map(|p| CompiledPiece {
                    len: p.orth.len(),
                    norm: p.norm.as_deref().map(|n| strings.intern(n)),
                })
                .collect();
            exceptions.insert(chunk.clone(), compiled);
        }

        Ok(Self {
            lexicon,
            exceptions,
            prefix,
            suffix,
            infix,
        })
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    /// Segmenta `text` em um novo [`Doc`].
    pub fn segment(&self, text: &str) -> Doc {
        let mut pieces = Vec::new();
        for (offset, chunk) in whitespace_chunks(text) {
            self.split_chunk(chunk, offset, &mut pieces);
        }

        let mut doc = Doc::new(text, Arc::clone(self.lexicon.strings()));
        for piece in pieces {
            let lex = self.lexicon.lookup(&text[piece.start..piece.end]);
            doc.push_token(lex, piece.start, piece.end, piece.norm);
        }
        debug!(tokens = doc.len(), bytes = text.len(), "texto segmentado");
        doc
    }

    fn split_chunk(&self, chunk: &str, offset: usize, out: &mut Vec<Piece>) {
        if let Some(special) = self.exceptions.get(chunk) {
            push_exception(special, offset, out);
            return;
        }

        let mut start = 0;
        let mut end = chunk.len();
        let mut prefixes = Vec::new();
        let mut suffixes = Vec::new();
        let mut special = None;

        while start < end {
            let rest = &chunk[start..end];
            if let Some(exc) = self.exceptions.get(rest) {
                special = Some(exc);
                break;
            }
            if let Some(len) = match_len(self.prefix.as_ref(), rest) {
                prefixes.push((start, start + len));
                start += len;
                continue;
            }
            if let Some(len) = match_len(self.suffix.as_ref(), rest) {
                suffixes.push((end - len, end));
                end -= len;
                continue;
            }
            break;
        }

        for (s, e) in prefixes {
            out.push(Piece { start: offset + s, end: offset + e, norm: None });
        }
        if let Some(exc) = special {
            push_exception(exc, offset + start, out);
        } else if start < end {
            self.split_infixes(&chunk[start..end], offset + start, out);
        }
        for (s, e) in suffixes.into_iter().rev() {
            out.push(Piece { start: offset + s, end: offset + e, norm: None });
        }
    }

    fn split_infixes(&self, core: &str, offset: usize, out: &mut Vec<Piece>) {
        let mut last = 0;
        if let Some(infix) = &self.infix {
            for m in infix.find_iter(core) {
                // Infixo só conta no interior do resíduo
                if m.start() == m.end() || m.start() == 0 || m.end() == core.len() || m.start() < last {
                    continue;
                }
                if m.start() > last {
                    out.push(Piece { start: offset + last, end: offset + m.start(), norm: None });
                }
                out.push(Piece { start: offset + m.start(), end: offset + m.end(), norm: None });
                last = m.end();
            }
        }
        out.push(Piece { start: offset + last, end: offset + core.len(), norm: None });
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("exceptions", &self.exceptions.len())
            .field("prefix", &self.prefix.as_ref().map(Regex::as_str))
            .field("suffix", &self.suffix.as_ref().map(Regex::as_str))
            .field("infix", &self.infix.as_ref().map(Regex::as_str))
            .finish()
    }
}

fn compile(
    rule: &'static str,
    pattern: Option<&str>,
    wrap: impl Fn(&str) -> String,
) -> Result<Option<Regex>> {
    match pattern {
        None => Ok(None),
        Some(p) if p.is_empty() => Ok(None),
        Some(p) => Regex::new(&wrap(p))
            .map(Some)
            .map_err(|source| NlpError::InvalidPattern { rule, source }),
    }
}

/// Tamanho do match não-vazio de uma regex ancorada.
fn match_len(re: Option<&Regex>, s: &str) -> Option<usize> {
    let m = re?.find(s)?;
    (m.end() > m.start()).then(|| m.end() - m.start())
}

fn push_exception(pieces: &[CompiledPiece], mut offset: usize, out: &mut Vec<Piece>) {
    for piece in pieces {
        out.push(Piece { start: offset, end: offset + piece.len, norm: piece.norm });
        offset += piece.len;
    }
}

/// Chunks separados por espaço em branco, com o offset de byte de cada um.
fn whitespace_chunks(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut start = None;
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || loop {
        match chars.next() {
            Some((i, c)) if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    return Some((s, &text[s..i]));
                }
            }
            Some((i, _)) => {
                if start.is_none() {
                    start = Some(i);
                }
            }
            None => return start.take().map(|s| (s, &text[s..])),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lang;
    use crate::strings::StringStore;

    fn tokenizer(rules: &TokenizerRules) -> Tokenizer {
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        Tokenizer::new(lexicon, rules).unwrap()
    }

    fn texts(doc: &Doc) -> Vec<String> {
        doc.iter().map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn test_whitespace_chunks_offsets() {
        let chunks: Vec<(usize, &str)> = whitespace_chunks("  ab \tc\nd ").collect();
        assert_eq!(chunks, vec![(2, "ab"), (6, "c"), (8, "d")]);
    }

    #[test]
    fn test_segment_sentence() {
        let tok = tokenizer(&lang::english_rules());
        let doc = tok.segment("This is a sentence.");
        assert_eq!(texts(&doc), ["This", "is", "a", "sentence", "."]);
    }

    #[test]
    fn test_hyphen_infix_keeps_spans() {
        let tok = tokenizer(&lang::english_rules());
        let text = "a well-known fact";
        let doc = tok.segment(text);
        assert_eq!(texts(&doc), ["a", "well", "-", "known", "fact"]);
        let (first, last) = (doc.token(1).span(), doc.token(3).span());
        assert_eq!(&text[first.0..last.1], "well-known");
        let rebuilt: String = (1..=3).map(|i| doc.token(i).text()).collect();
        assert_eq!(rebuilt, "well-known");
    }

    #[test]
    fn test_infix_at_edges_is_not_split() {
        let tok = tokenizer(&lang::english_rules());
        let doc = tok.segment("-well");
        assert_eq!(texts(&doc), ["-well"]);
    }

    #[test]
    fn test_exceptions_inside_punctuation() {
        let tok = tokenizer(&lang::english_rules());
        let doc = tok.segment("\"Don't!\"");
        assert_eq!(texts(&doc), ["\"", "Do", "n't", "!", "\""]);
        assert_eq!(doc.token(2).norm(), "not");
    }

    #[test]
    fn test_abbreviation_exception() {
        let tok = tokenizer(&lang::english_rules());
        let doc = tok.segment("Mr. Smith left.");
        assert_eq!(texts(&doc), ["Mr.", "Smith", "left", "."]);
    }

    #[test]
    fn test_offsets_map_back_to_text() {
        let tok = tokenizer(&lang::english_rules());
        let text = "  (Hello),  world...  ";
        let doc = tok.segment(text);
        for token in doc.iter() {
            let (s, e) = token.span();
            assert_eq!(&text[s..e], token.text());
        }
        assert_eq!(texts(&doc), ["(", "Hello", ")", ",", "world", "..."]);
    }

    #[test]
    fn test_punctuation_only_chunk() {
        let tok = tokenizer(&lang::english_rules());
        let doc = tok.segment("... !");
        assert_eq!(texts(&doc), ["...", "!"]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        let tok = tokenizer(&lang::english_rules());
        assert!(tok.segment("").is_empty());
        assert!(tok.segment(" \n\t ").is_empty());
    }

    #[test]
    fn test_blank_rules_split_on_whitespace_only() {
        let tok = tokenizer(&TokenizerRules::default());
        let doc = tok.segment("Hello, world.");
        assert_eq!(texts(&doc), ["Hello,", "world."]);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let tok = tokenizer(&lang::english_rules());
        let text = "It's 5 o'clock -- isn't it? (Yes.)";
        let a = tok.segment(text);
        let b = tok.segment(text);
        let spans_a: Vec<_> = a.iter().map(|t| t.span()).collect();
        let spans_b: Vec<_> = b.iter().map(|t| t.span()).collect();
        assert_eq!(spans_a, spans_b);
    }

    #[test]
    fn test_portuguese_clitic_and_abbreviation() {
        let tok = tokenizer(&lang::portuguese_rules());
        let doc = tok.segment("Dr. Silva curou-se.");
        assert_eq!(texts(&doc), ["Dr.", "Silva", "curou", "-", "se", "."]);
    }

    #[test]
    fn test_malformed_regex_is_configuration_error() {
        let rules = TokenizerRules {
            prefix: Some("([".to_string()),
            ..TokenizerRules::default()
        };
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        let err = Tokenizer::new(lexicon, &rules).unwrap_err();
        assert!(matches!(err, NlpError::InvalidPattern { rule: "prefix", .. }));
    }

    #[test]
    fn test_exception_must_rebuild_chunk() {
        let mut rules = TokenizerRules::default();
        rules.add_exception("gonna", vec![ExceptionPiece::new("going"), ExceptionPiece::new("to")]);
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        let err = Tokenizer::new(lexicon, &rules).unwrap_err();
        assert!(matches!(err, NlpError::InvalidException { .. }));
    }

    #[test]
    fn test_exception_with_whitespace_is_rejected() {
        let mut rules = TokenizerRules::default();
        rules.add_exception(
            "New York",
            vec![ExceptionPiece::new("New "), ExceptionPiece::new("York")],
        );
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        let err = Tokenizer::new(lexicon, &rules).unwrap_err();
        assert!(matches!(err, NlpError::InvalidException { ref chunk, .. } if chunk == "New York"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
