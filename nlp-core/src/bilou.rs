//! # Reconhecimento de Entidades BILOU
//!
//! Sistema de transição que percorre o buffer uma vez, atribuindo a cada token
//! uma tag **BILOU**:
//!
//! - `B-T`: Begin, primeiro token de uma entidade do tipo T
//! - `I-T`: In, token interno
//! - `L-T`: Last, último token
//! - `U-T`: Unit, entidade de um token só
//! - `O`: Outside
//!
//! Ao contrário do esquema BIO, o fim da entidade é explícito, então
//! sequências inválidas são impossíveis por construção:
//!
//! | Entidade aberta? | Ações legais           |
//! |------------------|------------------------|
//! | não              | `O`, `B-T`, `U-T`      |
//! | sim, tipo T      | `I-T`, `L-T`           |
//!
//! No último token, `B-T` é gravado como `U-T` e `I-T` como `L-T`: o estado
//! nunca chega ao fim do buffer com entidade aberta.

use crate::doc::{Doc, EntityTag};
use crate::error::{NlpError, Result};
use crate::features::{offset, token_features, word_feature, FeatureVector};
use crate::scorer::Class;
use crate::strings::{StringStore, Symbol};
use crate::transition::TransitionSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BilouAction {
    Begin(Symbol),
    In(Symbol),
    Last(Symbol),
    Unit(Symbol),
    Out,
}

impl BilouAction {
    fn tag(&self) -> EntityTag {
        match *self {
            BilouAction::Begin(t) => EntityTag::Begin(t),
            BilouAction::In(t) => EntityTag::In(t),
            BilouAction::Last(t) => EntityTag::Last(t),
            BilouAction::Unit(t) => EntityTag::Unit(t),
            BilouAction::Out => EntityTag::Outside,
        }
    }
}

impl Class for BilouAction {
    fn class_name(&self, strings: &StringStore) -> String {
        self.tag().label(strings)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BilouState {
    cursor: usize,
    open: Option<Symbol>,
    tags: Vec<Option<EntityTag>>,
}

impl BilouState {
    pub fn new(n: usize) -> Self {
        Self {
            cursor: 0,
            open: None,
            tags: vec![None; n],
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Tipo da entidade aberta, se houver.
    pub fn open(&self) -> Option<Symbol> {
        self.open
    }

    pub fn tags(&self) -> &[Option<EntityTag>] {
        &self.tags
    }

    fn is_last_token(&self) -> bool {
        self.cursor + 1 == self.tags.len()
    }
}

/// O sistema BILOU com seus tipos de entidade.
#[derive(Debug, Clone)]
pub struct Bilou {
    types: Vec<Symbol>,
}

impl Bilou {
    /// Tipos na ordem dada (ordem de desempate); duplicatas são ignoradas.
    pub fn new(strings: &StringStore, types: &[String]) -> Self {
        let mut syms: Vec<Symbol> = Vec::with_capacity(types.len());
        for ty in types {
            let sym = strings.intern(ty);
            if !syms.contains(&sym) {
                syms.push(sym);
            }
        }
        Self { types: syms }
    }

    pub fn types(&self) -> &[Symbol] {
        &self.types
    }

    fn check(&self, state: &BilouState, action: BilouAction) -> std::result::Result<(), &'static str> {
        if state.cursor >= state.tags.len() {
            return Err("buffer esgotado");
        }
        match (action, state.open) {
            (BilouAction::Begin(t) | BilouAction::Unit(t), None) if self.types.contains(&t) => Ok(()),
            (BilouAction::Begin(_) | BilouAction::Unit(_), None) => Err("tipo de entidade desconhecido"),
            (BilouAction::Out, None) => Ok(()),
            (BilouAction::In(t) | BilouAction::Last(t), Some(open)) if t == open => Ok(()),
            (BilouAction::In(_) | BilouAction::Last(_), Some(_)) => Err("tipo de entidade diferente do aberto"),
            (BilouAction::In(_) | BilouAction::Last(_), None) => Err("nenhuma entidade aberta"),
            (_, Some(_)) => Err("há uma entidade aberta"),
        }
    }
}

impl TransitionSystem for Bilou {
    type State = BilouState;
    type Action = BilouAction;

    fn name(&self) -> &'static str {
        "bilou"
    }

    fn init(&self, doc: &Doc) -> BilouState {
        BilouState::new(doc.len())
    }

    fn legal_actions(&self, state: &BilouState) -> Vec<BilouAction> {
        if state.cursor >= state.tags.len() {
            return Vec::new();
        }
        match state.open {
            None => std::iter::once(BilouAction::Out)
                .chain(self.types.iter().map(|&t| BilouAction::Begin(t)))
                .chain(self.types.iter().map(|&t| BilouAction::Unit(t)))
                .collect(),
            Some(t) => vec![BilouAction::In(t), BilouAction::Last(t)],
        }
    }

    fn is_legal(&self, state: &BilouState, action: BilouAction) -> bool {
        self.check(state, action).is_ok()
    }

    fn apply(&self, state: &mut BilouState, action: BilouAction) -> Result<()> {
        self.check(state, action)
            .map_err(|reason| NlpError::invalid_transition(self.name(), action, reason))?;
        let last = state.is_last_token();
        let (tag, open) = match action {
            BilouAction::Begin(t) if last => (EntityTag::Unit(t), None),
            BilouAction::Begin(t) => (EntityTag::Begin(t), Some(t)),
            BilouAction::In(t) if last => (EntityTag::Last(t), None),
            BilouAction::In(t) => (EntityTag::In(t), Some(t)),
            other => (other.tag(), None),
        };
        state.tags[state.cursor] = Some(tag);
        state.open = open;
        state.cursor += 1;
        Ok(())
    }

    fn is_terminal(&self, state: &BilouState) -> bool {
        state.cursor >= state.tags.len() && state.open.is_none()
    }

    fn features(&self, state: &BilouState, doc: &Doc) -> FeatureVector {
        let n = doc.len();
        let i = state.cursor;
        let mut fv = FeatureVector::new();
        token_features(&mut fv, doc, Some(i), "");
        token_features(&mut fv, doc, offset(i, 1, n), "n1");
        word_feature(&mut fv, doc, offset(i, -1, n), "w-1");
        word_feature(&mut fv, doc, offset(i, 2, n), "w+2");

        let prev = offset(i, -1, n).and_then(|j| state.tags[j]);
        let strings = doc.strings();
        match prev {
            Some(tag) => fv.set(format!("p1ent={}", tag.label(strings))),
            None => fv.set("p1ent=<none>"),
        }
        if let Some(open) = state.open {
            fv.set(format!("open={}", strings.resolve(open)));
        }
        fv
    }

    fn finish(&self, state: BilouState, doc: &mut Doc) -> Result<()> {
        for (i, tag) in state.tags.into_iter().enumerate() {
            doc.set_ent(i, tag.unwrap_or(EntityTag::Outside))?;
        }
        Ok(())
    }
}

/// Confere se uma sequência de tags é BILOU válida.
pub fn is_valid_sequence(tags: &[EntityTag]) -> bool {
    let mut open: Option<Symbol> = None;
    for tag in tags {
        open = match (*tag, open) {
            (EntityTag::Outside, None) => None,
            (EntityTag::Unit(_), None) => None,
            (EntityTag::Begin(t), None) => Some(t),
            (EntityTag::In(t), Some(o)) if t == o => Some(t),
            (EntityTag::Last(t), Some(o)) if t == o => None,
            _ => return false,
        };
    }
    open.is_none()
}
