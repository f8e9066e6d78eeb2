//! # Doc — o Buffer de Tokens
//!
//! Um [`Doc`] é criado pelo tokenizador e depois **anotado no lugar** por cada
//! estágio do pipeline: o tagger preenche `tag`/`pos`/`lemma`, o parser
//! preenche `head`/`dep` e o reconhecedor de entidades preenche `ent`.
//!
//! ## Regras
//!
//! - Os índices dos tokens são estáveis e contíguos (`0..len`).
//! - Depois da tokenização só os slots de anotação mudam, sempre por setters
//!   que validam os índices.
//! - Um head definido é `< len` ou igual ao próprio índice (raiz).
//!
//! ## Visões derivadas
//!
//! - [`Doc::sents`]: frases como [`Span`]s, ladrilhando o buffer.
//! - [`Doc::entities`]: entidades BILOU convertidas em [`EntitySpan`]s.
//! - [`Doc::to_view`]: estrutura serializável para a camada web.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NlpError, Result};
use crate::lexicon::Lexeme;
use crate::strings::{StringStore, Symbol};
use crate::tagger::Pos;

/// Tag BILOU de entidade aplicada a um token.
///
/// - `Begin`: primeiro token de uma entidade com vários tokens
/// - `In`: token interno
/// - `Last`: último token
/// - `Unit`: entidade de um token só
/// - `Outside`: fora de entidade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Begin(Symbol),
    In(Symbol),
    Last(Symbol),
    Unit(Symbol),
    Outside,
}

impl EntityTag {
    /// Tipo da entidade (None para `Outside`).
    pub fn entity_type(&self) -> Option<Symbol> {
        match self {
            EntityTag::Begin(t) | EntityTag::In(t) | EntityTag::Last(t) | EntityTag::Unit(t) => {
                Some(*t)
            }
            EntityTag::Outside => None,
        }
    }

    /// Rótulo textual: "B-PERSON", "L-GPE", "O"...
    pub fn label(&self, strings: &StringStore) -> String {
        let (prefix, ty) = match self {
            EntityTag::Begin(t) => ("B", *t),
            EntityTag::In(t) => ("I", *t),
            EntityTag::Last(t) => ("L", *t),
            EntityTag::Unit(t) => ("U", *t),
            EntityTag::Outside => return "O".to_string(),
        };
        format!("{prefix}-{}", strings.resolve(ty))
    }

    /// Parseia um rótulo, internando o tipo.
    pub fn from_label(label: &str, strings: &StringStore) -> Option<Self> {
        if label == "O" {
            return Some(EntityTag::Outside);
        }
        let (prefix, ty) = label.split_once('-')?;
        if ty.is_empty() {
            return None;
        }
        let ty = strings.intern(ty);
        match prefix {
            "B" => Some(EntityTag::Begin(ty)),
            "I" => Some(EntityTag::In(ty)),
            "L" => Some(EntityTag::Last(ty)),
            "U" => Some(EntityTag::Unit(ty)),
            _ => None,
        }
    }
}

/// Um token e seus slots de anotação.
#[derive(Debug, Clone)]
pub struct Token {
    lex: Arc<Lexeme>,
    start: usize,
    end: usize,
    norm: Symbol,
    tag: Option<Symbol>,
    pos: Option<Pos>,
    lemma: Option<Symbol>,
    head: Option<usize>,
    dep: Option<Symbol>,
    ent: Option<EntityTag>,
}

/// O buffer de tokens de um texto.
#[derive(Debug, Clone)]
pub struct Doc {
    text: String,
    tokens: Vec<Token>,
    strings: Arc<StringStore>,
}

impl Doc {
    pub(crate) fn new(text: &str, strings: Arc<StringStore>) -> Self {
        Self {
            text: text.to_string(),
            tokens: Vec::new(),
            strings,
        }
    }

    pub(crate) fn push_token(
        &mut self,
        lex: Arc<Lexeme>,
        start: usize,
        end: usize,
        norm: Option<Symbol>,
    ) {
        let norm = norm.unwrap_or_else(|| self.strings.intern(&lex.norm));
        self.tokens.push(Token {
            lex,
            start,
            end,
            norm,
            tag: None,
            pos: None,
            lemma: None,
            head: None,
            dep: None,
            ent: None,
        });
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn strings(&self) -> &Arc<StringStore> {
        &self.strings
    }

    /// Acesso a um token. Entra em pânico fora de `0..len`, como indexar um slice.
    pub fn token(&self, i: usize) -> TokenRef<'_> {
        TokenRef {
            doc: self,
            index: i,
            token: &self.tokens[i],
        }
    }

    pub fn get(&self, i: usize) -> Option<TokenRef<'_>> {
        self.tokens.get(i).map(|token| TokenRef {
            doc: self,
            index: i,
            token,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TokenRef<'_>> + '_ {
        (0..self.len()).map(move |i| self.token(i))
    }

    // === Setters (validados) ===

    pub fn set_tag(&mut self, i: usize, tag: Symbol, pos: Option<Pos>) -> Result<()> {
        let token = self.slot(i)?;
        token.tag = Some(tag);
        token.pos = pos;
        Ok(())
    }

    pub fn set_lemma(&mut self, i: usize, lemma: Symbol) -> Result<()> {
        self.slot(i)?.lemma = Some(lemma);
        Ok(())
    }

    /// Define head e rótulo de dependência. `head == i` marca a raiz.
    pub fn set_head(&mut self, i: usize, head: usize, dep: Symbol) -> Result<()> {
        let len = self.len();
        if head >= len {
            return Err(NlpError::HeadOutOfRange { token: i, head, len });
        }
        let token = self.slot(i)?;
        token.head = Some(head);
        token.dep = Some(dep);
        Ok(())
    }

    pub fn set_ent(&mut self, i: usize, ent: EntityTag) -> Result<()> {
        self.slot(i)?.ent = Some(ent);
        Ok(())
    }

    fn slot(&mut self, i: usize) -> Result<&mut Token> {
        let len = self.tokens.len();
        self.tokens
            .get_mut(i)
            .ok_or(NlpError::TokenOutOfRange { index: i, len })
    }

    // === Estado das anotações ===

    pub fn is_tagged(&self) -> bool {
        !self.is_empty() && self.tokens.iter().all(|t| t.tag.is_some())
    }

    pub fn is_parsed(&self) -> bool {
        !self.is_empty() && self.tokens.iter().all(|t| t.head.is_some())
    }

    pub fn has_entities(&self) -> bool {
        !self.is_empty() && self.tokens.iter().all(|t| t.ent.is_some())
    }

    /// Dependentes diretos do token `i`, em ordem.
    pub fn children(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(j, t)| *j != i && t.head == Some(i))
            .map(|(j, _)| j)
    }

    /// Trecho `[start, end)` de tokens.
    pub fn span(&self, start: usize, end: usize) -> Span<'_> {
        let end = end.min(self.len());
        Span {
            doc: self,
            start: start.min(end),
            end,
        }
    }

    /// Iterador de frases. Cada chamada recomeça do início.
    pub fn sents(&self) -> Sents<'_> {
        Sents { doc: self, next: 0 }
    }

    /// Converte as tags BILOU em entidades.
    ///
    /// Uma entidade começa em `B`/`U` e termina no `L` do mesmo tipo. Sequências
    /// quebradas (ex: `B-X` seguido de `O`) são descartadas.
    ///
    /// # Exemplo
    /// `[U-PERSON, O, B-GPE, L-GPE]` → `[PERSON(0..1), GPE(2..4)]`
    pub fn entities(&self) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < self.len() {
            match self.tokens[i].ent {
                Some(EntityTag::Unit(ty)) => {
                    spans.push(self.entity_span(i, i + 1, ty));
                    i += 1;
                }
                Some(EntityTag::Begin(ty)) => {
                    let mut j = i + 1;
                    while j < self.len() && self.tokens[j].ent == Some(EntityTag::In(ty)) {
                        j += 1;
                    }
                    if j < self.len() && self.tokens[j].ent == Some(EntityTag::Last(ty)) {
                        spans.push(self.entity_span(i, j + 1, ty));
                        i = j + 1;
                    } else {
                        i = j;
                    }
                }
                _ => i += 1,
            }
        }
        spans
    }

    fn entity_span(&self, start: usize, end: usize, ty: Symbol) -> EntitySpan {
        let start_byte = self.tokens[start].start;
        let end_byte = self.tokens[end - 1].end;
        EntitySpan {
            text: self.text[start_byte..end_byte].to_string(),
            label: self.strings.resolve(ty).to_string(),
            start_token: start,
            end_token: end,
            start: start_byte,
            end: end_byte,
        }
    }

    /// Visão serializável do documento inteiro.
    pub fn to_view(&self) -> DocView {
        DocView {
            text: self.text.clone(),
            tokens: self.iter().map(|t| t.to_view()).collect(),
            sents: self
                .sents()
                .map(|s| SentView {
                    start: s.start(),
                    end: s.end(),
                    text: s.text().to_string(),
                })
                .collect(),
            entities: self.entities(),
        }
    }
}

/// Visão somente-leitura de um token dentro do seu [`Doc`].
#[derive(Clone, Copy)]
pub struct TokenRef<'a> {
    doc: &'a Doc,
    index: usize,
    token: &'a Token,
}

impl<'a> TokenRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Texto exato do token no texto original.
    pub fn text(&self) -> &'a str {
        &self.doc.text[self.token.start..self.token.end]
    }

    /// Offsets de byte `[start, end)`.
    pub fn span(&self) -> (usize, usize) {
        (self.token.start, self.token.end)
    }

    pub fn lexeme(&self) -> &'a Arc<Lexeme> {
        &self.token.lex
    }

    pub fn lower(&self) -> &'a str {
        &self.token.lex.lower
    }

    pub fn shape(&self) -> &'a str {
        &self.token.lex.shape
    }

    pub fn norm(&self) -> &'a str {
        self.doc.strings.resolve(self.token.norm)
    }

    pub fn tag(&self) -> Option<&'a str> {
        self.token.tag.map(|t| self.doc.strings.resolve(t))
    }

    pub fn tag_symbol(&self) -> Option<Symbol> {
        self.token.tag
    }

    pub fn pos(&self) -> Option<Pos> {
        self.token.pos
    }

    pub fn lemma(&self) -> Option<&'a str> {
        self.token.lemma.map(|l| self.doc.strings.resolve(l))
    }

    pub fn head(&self) -> Option<usize> {
        self.token.head
    }

    pub fn dep(&self) -> Option<&'a str> {
        self.token.dep.map(|d| self.doc.strings.resolve(d))
    }

    pub fn ent(&self) -> Option<EntityTag> {
        self.token.ent
    }

    pub fn ent_label(&self) -> Option<String> {
        self.token.ent.map(|e| e.label(&self.doc.strings))
    }

    pub fn is_root(&self) -> bool {
        self.token.head == Some(self.index)
    }

    fn to_view(&self) -> TokenView {
        TokenView {
            text: self.text().to_string(),
            start: self.token.start,
            end: self.token.end,
            lower: self.lower().to_string(),
            norm: self.norm().to_string(),
            shape: self.shape().to_string(),
            tag: self.tag().map(str::to_string),
            pos: self.pos(),
            lemma: self.lemma().map(str::to_string),
            head: self.head(),
            dep: self.dep().map(str::to_string),
            ent: self.ent_label(),
        }
    }
}

impl std::fmt::Debug for TokenRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRef")
            .field("index", &self.index)
            .field("text", &self.text())
            .field("tag", &self.tag())
            .field("head", &self.head())
            .field("dep", &self.dep())
            .finish()
    }
}

/// Trecho contíguo de tokens `[start, end)`.
#[derive(Clone, Copy)]
pub struct Span<'a> {
    doc: &'a Doc,
    start: usize,
    end: usize,
}

impl<'a> Span<'a> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Texto original do primeiro ao último token.
    pub fn text(&self) -> &'a str {
        if self.is_empty() {
            return "";
        }
        let start = self.doc.tokens[self.start].start;
        let end = self.doc.tokens[self.end - 1].end;
        &self.doc.text[start..end]
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenRef<'a>> + 'a {
        let doc = self.doc;
        (self.start..self.end).map(move |i| doc.token(i))
    }

    /// Primeiro token do trecho cujo head está fora dele (ou é ele mesmo).
    pub fn root(&self) -> Option<usize> {
        (self.start..self.end).find(|&i| match self.doc.tokens[i].head {
            Some(h) => h == i || h < self.start || h >= self.end,
            None => false,
        })
    }
}

impl std::fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Span({}..{}, {:?})", self.start, self.end, self.text())
    }
}

/// Iterador sobre as frases de um [`Doc`].
///
/// Uma frase termina depois de pontuação final (`.`, `!`, `?`, `…` ou um
/// token com tag `.`), estendida sobre aspas e parênteses de fechamento
/// logo a seguir.
///
/// Abreviações que o tokenizador mantém inteiras ("U.S.", "etc.") não são
/// pontuação final: em "I live in the U.S. He left." não há quebra depois de
/// "U.S.", e as duas orações ficam numa frase só.
pub struct Sents<'a> {
    doc: &'a Doc,
    next: usize,
}

impl<'a> Iterator for Sents<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.doc;
        let n = doc.len();
        if self.next >= n {
            return None;
        }
        let start = self.next;
        let mut end = n;
        if let Some(i) = (start..n).find(|&i| is_sentence_final(doc, i)) {
            end = i + 1;
            while end < n && (is_sentence_final(doc, end) || is_closing(doc, end)) {
                end += 1;
            }
        }
        self.next = end;
        Some(Span { doc, start, end })
    }
}

fn is_sentence_final(doc: &Doc, i: usize) -> bool {
    let token = doc.token(i);
    if token.tag() == Some(".") {
        return true;
    }
    let text = token.text();
    !text.is_empty() && text.chars().all(|c| matches!(c, '.' | '!' | '?' | '…'))
}

fn is_closing(doc: &Doc, i: usize) -> bool {
    matches!(
        doc.token(i).text(),
        "\"" | "'" | "”" | "’" | "»" | ")" | "]" | "}" | "''"
    )
}

/// Uma entidade reconstruída a partir das tags BILOU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    /// Tipo da entidade (ex: "PERSON", "GPE")
    pub label: String,
    /// Índice do primeiro token
    pub start_token: usize,
    /// Índice após o último token (exclusivo)
    pub end_token: usize,
    /// Posição de byte inicial no texto original
    pub start: usize,
    /// Posição de byte final no texto original
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenView {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub lower: String,
    pub norm: String,
    pub shape: String,
    pub tag: Option<String>,
    pub pos: Option<Pos>,
    pub lemma: Option<String>,
    pub head: Option<usize>,
    pub dep: Option<String>,
    pub ent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentView {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Documento anotado em formato serializável.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocView {
    pub text: String,
    pub tokens: Vec<TokenView>,
    pub sents: Vec<SentView>,
    pub entities: Vec<EntitySpan>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang;
    use crate::lexicon::Lexicon;
    use crate::tokenizer::Tokenizer;

    fn segment(text: &str) -> Doc {
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        Tokenizer::new(lexicon, &lang::english_rules())
            .unwrap()
            .segment(text)
    }

    #[test]
    fn test_fresh_doc_has_no_annotations() {
        let doc = segment("A fresh doc");
        assert!(!doc.is_tagged());
        assert!(!doc.is_parsed());
        assert!(doc.iter().all(|t| t.tag().is_none() && t.head().is_none()));
    }

    #[test]
    fn test_sents_tile_the_buffer() {
        let doc = segment("This is a sentence. This is another sentence. And a third.");
        let sents: Vec<Span> = doc.sents().collect();
        assert_eq!(sents.len(), 3);
        assert_eq!((sents[0].start(), sents[0].end()), (0, 5));
        assert_eq!(sents.iter().map(|s| s.len()).sum::<usize>(), doc.len());
        assert_eq!(sents[1].text(), "This is another sentence.");
    }

    #[test]
    fn test_sents_restartable() {
        let doc = segment("One. Two.");
        assert_eq!(doc.sents().count(), 2);
        assert_eq!(doc.sents().count(), 2);
    }

    #[test]
    fn test_sents_absorb_closing_quote() {
        let doc = segment("He said \"stop!\" Then he left");
        let sents: Vec<Span> = doc.sents().collect();
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[0].text(), "He said \"stop!\"");
        assert_eq!(sents[1].text(), "Then he left");
    }

    #[test]
    fn test_abbreviation_does_not_end_sentence() {
        let doc = segment("I live in the U.S. He left.");
        assert_eq!(doc.token(4).text(), "U.S.");
        let sents: Vec<Span> = doc.sents().collect();
        assert_eq!(sents.len(), 1);
        assert_eq!(sents[0].end(), doc.len());

        let doc = segment("I live in the U.S. . He left.");
        assert_eq!(doc.sents().count(), 2);
    }

    #[test]
    fn test_sents_of_empty_doc() {
        let doc = segment("");
        assert_eq!(doc.sents().count(), 0);
    }

    #[test]
    fn test_set_head_validates_range() {
        let mut doc = segment("two words");
        let dep = doc.strings().intern("dep");
        assert!(doc.set_head(0, 1, dep).is_ok());
        let err = doc.set_head(1, 7, dep).unwrap_err();
        assert!(matches!(err, NlpError::HeadOutOfRange { head: 7, .. }));
        assert_eq!(doc.token(1).head(), None);
    }

    #[test]
    fn test_children_and_root() {
        let mut doc = segment("the red cat");
        let s = Arc::clone(doc.strings());
        doc.set_head(0, 2, s.intern("det")).unwrap();
        doc.set_head(1, 2, s.intern("amod")).unwrap();
        doc.set_head(2, 2, s.intern("ROOT")).unwrap();
        assert_eq!(doc.children(2).collect::<Vec<_>>(), vec![0, 1]);
        assert!(doc.token(2).is_root());
        assert_eq!(doc.span(0, 3).root(), Some(2));
        assert!(doc.is_parsed());
    }

    #[test]
    fn test_entities_from_bilou() {
        let mut doc = segment("Ada met John Smith yesterday");
        let s = Arc::clone(doc.strings());
        let person = s.intern("PERSON");
        doc.set_ent(0, EntityTag::Unit(person)).unwrap();
        doc.set_ent(1, EntityTag::Outside).unwrap();
        doc.set_ent(2, EntityTag::Begin(person)).unwrap();
        doc.set_ent(3, EntityTag::Last(person)).unwrap();
        doc.set_ent(4, EntityTag::Outside).unwrap();
        let ents = doc.entities();
        assert_eq!(ents.len(), 2);
        assert_eq!(ents[0].text, "Ada");
        assert_eq!(ents[1].text, "John Smith");
        assert_eq!((ents[1].start_token, ents[1].end_token), (2, 4));
        assert_eq!(ents[1].label, "PERSON");
    }

    #[test]
    fn test_broken_entity_is_dropped() {
        let mut doc = segment("New York");
        let gpe = doc.strings().intern("GPE");
        doc.set_ent(0, EntityTag::Begin(gpe)).unwrap();
        doc.set_ent(1, EntityTag::Outside).unwrap();
        assert!(doc.entities().is_empty());
    }

    #[test]
    fn test_entity_label_roundtrip() {
        let strings = StringStore::new();
        let tag = EntityTag::from_label("L-ORG", &strings).unwrap();
        assert_eq!(tag.label(&strings), "L-ORG");
        assert_eq!(EntityTag::from_label("O", &strings), Some(EntityTag::Outside));
        assert_eq!(EntityTag::from_label("X-ORG", &strings), None);
        assert_eq!(EntityTag::from_label("B-", &strings), None);
    }

    #[test]
    fn test_view_serializes() {
        let doc = segment("Hello world.");
        let view = doc.to_view();
        assert_eq!(view.tokens.len(), 3);
        assert_eq!(view.sents.len(), 1);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"text\":\"Hello\""));
    }
}
