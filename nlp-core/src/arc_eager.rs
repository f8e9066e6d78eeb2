//! # Parser de Dependências Arc-Eager
//!
//! Sistema de transição que constrói a árvore de dependências com uma pilha e
//! um cursor sobre o buffer. Na base da pilha fica a sentinela da raiz.
//!
//! | Ação        | Pré-condição                              | Efeito                                   |
//! |-------------|-------------------------------------------|------------------------------------------|
//! | SHIFT       | cursor < n                                | empilha o cursor, avança                 |
//! | RIGHT-ARC l | cursor < n                                | head(cursor) = topo, empilha, avança     |
//! | LEFT-ARC l  | cursor < n, topo é token sem head         | head(topo) = cursor, desempilha          |
//! | REDUCE      | topo é token com head (ou cursor == n)    | desempilha                               |
//!
//! RIGHT-ARC com a sentinela no topo liga o token à raiz. Terminal: cursor
//! no fim e só a sentinela na pilha. No fim, todo token sem head é ligado à
//! raiz (`head = ele mesmo`) e todo token raiz recebe o rótulo `ROOT`.

use crate::doc::Doc;
use crate::error::{NlpError, Result};
use crate::features::{token_features, word_feature, FeatureVector};
use crate::scorer::Class;
use crate::strings::{StringStore, Symbol};
use crate::transition::TransitionSystem;

pub const ROOT_LABEL: &str = "ROOT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcAction {
    Shift,
    Right(Symbol),
    Left(Symbol),
    Reduce,
}

impl Class for ArcAction {
    fn class_name(&self, strings: &StringStore) -> String {
        match self {
            ArcAction::Shift => "S".to_string(),
            ArcAction::Right(l) => format!("R-{}", strings.resolve(*l)),
            ArcAction::Left(l) => format!("L-{}", strings.resolve(*l)),
            ArcAction::Reduce => "D".to_string(),
        }
    }
}

/// Elemento da pilha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Root,
    Token(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcEagerState {
    stack: Vec<Node>,
    cursor: usize,
    heads: Vec<Option<usize>>,
    labels: Vec<Option<Symbol>>,
}

impl ArcEagerState {
    pub fn new(n: usize) -> Self {
        Self {
            stack: vec![Node::Root],
            cursor: 0,
            heads: vec![None; n],
            labels: vec![None; n],
        }
    }

    pub fn stack(&self) -> &[Node] {
        &self.stack
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Head atribuído até agora (`Some(i)` para o próprio `i` = raiz).
    pub fn head(&self, i: usize) -> Option<usize> {
        self.heads.get(i).copied().flatten()
    }

    fn top(&self) -> Option<Node> {
        self.stack.last().copied()
    }

    fn top_token(&self) -> Option<usize> {
        match self.top() {
            Some(Node::Token(t)) => Some(t),
            _ => None,
        }
    }

    fn second_token(&self) -> Option<usize> {
        match self.stack.len().checked_sub(2).map(|i| self.stack[i]) {
            Some(Node::Token(t)) => Some(t),
            _ => None,
        }
    }

    fn buffer_left(&self) -> bool {
        self.cursor < self.heads.len()
    }
}

/// O sistema arc-eager com seu conjunto de rótulos.
#[derive(Debug, Clone)]
pub struct ArcEager {
    labels: Vec<Symbol>,
    root_label: Symbol,
}

impl ArcEager {
    /// Rótulos na ordem dada (é a ordem de desempate); duplicatas são ignoradas.
    pub fn new(strings: &StringStore, labels: &[String]) -> Self {
        let mut syms: Vec<Symbol> = Vec::with_capacity(labels.len());
        for label in labels {
            let sym = strings.intern(label);
            if !syms.contains(&sym) {
                syms.push(sym);
            }
        }
        Self {
            labels: syms,
            root_label: strings.intern(ROOT_LABEL),
        }
    }

    pub fn labels(&self) -> &[Symbol] {
        &self.labels
    }

    fn check(&self, state: &ArcEagerState, action: ArcAction) -> std::result::Result<(), &'static str> {
        if let ArcAction::Right(l) | ArcAction::Left(l) = action {
            if !self.labels.contains(&l) {
                return Err("rótulo desconhecido");
            }
        }
        match action {
            ArcAction::Shift | ArcAction::Right(_) | ArcAction::Left(_) if !state.buffer_left() => {
                Err("buffer esgotado")
            }
            // A sentinela nunca sai da pilha
            ArcAction::Shift | ArcAction::Right(_) => Ok(()),
            ArcAction::Left(_) => match state.top_token() {
                None => Err("topo da pilha não é um token"),
                Some(t) if state.heads[t].is_some() => Err("topo da pilha já tem head"),
                Some(_) => Ok(()),
            },
            ArcAction::Reduce => match state.top_token() {
                None => Err("topo da pilha não é um token"),
                Some(t) if state.heads[t].is_none() && state.buffer_left() => {
                    Err("topo da pilha sem head")
                }
                Some(_) => Ok(()),
            },
        }
    }
}

impl TransitionSystem for ArcEager {
    type State = ArcEagerState;
    type Action = ArcAction;

    fn name(&self) -> &'static str {
        "arc-eager"
    }

    fn init(&self, doc: &Doc) -> ArcEagerState {
        ArcEagerState::new(doc.len())
    }

    fn legal_actions(&self, state: &ArcEagerState) -> Vec<ArcAction> {
        let mut legal = Vec::with_capacity(2 * self.labels.len() + 2);
        let candidates = std::iter::once(ArcAction::Shift)
            .chain(self.labels.iter().map(|&l| ArcAction::Right(l)))
            .chain(self.labels.iter().map(|&l| ArcAction::Left(l)))
            .chain(std::iter::once(ArcAction::Reduce));
        for action in candidates {
            if self.check(state, action).is_ok() {
                legal.push(action);
            }
        }
        legal
    }

    fn is_legal(&self, state: &ArcEagerState, action: ArcAction) -> bool {
        self.check(state, action).is_ok()
    }

    fn apply(&self, state: &mut ArcEagerState, action: ArcAction) -> Result<()> {
        self.check(state, action)
            .map_err(|reason| NlpError::invalid_transition(self.name(), action, reason))?;
        match action {
            ArcAction::Shift => {
                state.stack.push(Node::Token(state.cursor));
                state.cursor += 1;
            }
            ArcAction::Right(label) => {
                let b0 = state.cursor;
                state.heads[b0] = Some(match state.top() {
                    Some(Node::Token(t)) => t,
                    _ => b0,
                });
                state.labels[b0] = Some(label);
                state.stack.push(Node::Token(b0));
                state.cursor += 1;
            }
            ArcAction::Left(label) => {
                if let Some(Node::Token(s0)) = state.stack.pop() {
                    state.heads[s0] = Some(state.cursor);
                    state.labels[s0] = Some(label);
                }
            }
            ArcAction::Reduce => {
                state.stack.pop();
            }
        }
        Ok(())
    }

    fn is_terminal(&self, state: &ArcEagerState) -> bool {
        !state.buffer_left() && state.stack == [Node::Root]
    }

    fn features(&self, state: &ArcEagerState, doc: &Doc) -> FeatureVector {
        let mut fv = FeatureVector::new();
        let s0 = state.top_token();
        let b0 = state.buffer_left().then_some(state.cursor);
        let b1 = b0.map(|b| b + 1).filter(|&b| b < state.len());

        if state.top() == Some(Node::Root) {
            fv.set("s0=<root>");
        } else {
            token_features(&mut fv, doc, s0, "s0");
        }
        token_features(&mut fv, doc, b0, "b0");
        word_feature(&mut fv, doc, b1, "b1w");
        word_feature(&mut fv, doc, state.second_token(), "s1w");

        let tag = |i: Option<usize>| {
            i.and_then(|i| doc.token(i).tag())
                .unwrap_or("<none>")
                .to_string()
        };
        let (s0t, b0t) = (tag(s0), tag(b0));
        fv.set(format!("s0t={s0t}|b0t={b0t}"));
        fv.set(format!("s0t={s0t}|b0t={b0t}|b1t={}", tag(b1)));
        fv.set(format!("s1t={}|s0t={s0t}|b0t={b0t}", tag(state.second_token())));
        if let Some(prev) = b0.and_then(|b| b.checked_sub(1)) {
            fv.set(format!("b-1t={}", tag(Some(prev))));
        }
        if let Some(s0) = s0 {
            fv.set(format!("s0h={}", state.heads[s0].is_some()));
            if let Some(b0) = b0 {
                fv.set(format!("dist={}", (b0 - s0).min(5)));
            }
        }
        fv
    }

    fn finish(&self, state: ArcEagerState, doc: &mut Doc) -> Result<()> {
        for i in 0..state.len() {
            let head = state.heads[i].unwrap_or(i);
            let label = if head == i {
                self.root_label
            } else {
                state.labels[i].unwrap_or(self.root_label)
            };
            doc.set_head(i, head, label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lexicon::Lexicon;
    use crate::tokenizer::{Tokenizer, TokenizerRules};

    fn setup(text: &str) -> (ArcEager, Doc) {
        let strings = Arc::new(StringStore::new());
        let lexicon = Arc::new(Lexicon::new(Arc::clone(&strings)));
        let doc = Tokenizer::new(lexicon, &TokenizerRules::default())
            .unwrap()
            .segment(text);
        let labels: Vec<String> = ["nsubj", "dobj"].iter().map(|s| s.to_string()).collect();
        (ArcEager::new(&strings, &labels), doc)
    }

    #[test]
    fn test_initial_legal_actions() {
        let (system, doc) = setup("she saw him");
        let state = system.init(&doc);
        let legal = system.legal_actions(&state);
        // SHIFT, RIGHT x2; sentinela no topo bloqueia LEFT e REDUCE
        assert_eq!(legal.len(), 3);
        assert_eq!(legal[0], ArcAction::Shift);
        assert!(matches!(legal[1], ArcAction::Right(_)));
    }

    #[test]
    fn test_full_derivation() {
        let (system, mut doc) = setup("she saw him");
        let nsubj = system.labels()[0];
        let dobj = system.labels()[1];
        let mut state = system.init(&doc);
        for action in [
            ArcAction::Shift,
            ArcAction::Left(nsubj),
            ArcAction::Right(nsubj),
            ArcAction::Right(dobj),
            ArcAction::Reduce,
            ArcAction::Reduce,
        ] {
            system.apply(&mut state, action).unwrap();
        }
        assert!(system.is_terminal(&state));
        system.finish(state, &mut doc).unwrap();
        assert_eq!(doc.token(0).head(), Some(1));
        assert_eq!(doc.token(0).dep(), Some("nsubj"));
        assert!(doc.token(1).is_root());
        assert_eq!(doc.token(1).dep(), Some("ROOT"));
        assert_eq!(doc.token(2).head(), Some(1));
        assert_eq!(doc.token(2).dep(), Some("dobj"));
    }

    #[test]
    fn test_illegal_actions_rejected() {
        let (system, doc) = setup("a");
        let mut state = system.init(&doc);
        let err = system.apply(&mut state, ArcAction::Reduce).unwrap_err();
        assert!(matches!(err, NlpError::InvalidTransition { system: "arc-eager", .. }));
        let nsubj = system.labels()[0];
        assert!(!system.is_legal(&state, ArcAction::Left(nsubj)));
        // estado intacto depois da rejeição
        assert_eq!(state.stack(), &[Node::Root]);
    }

    #[test]
    fn test_headless_token_reduced_at_end() {
        let (system, mut doc) = setup("a b");
        let mut state = system.init(&doc);
        system.apply(&mut state, ArcAction::Shift).unwrap();
        system.apply(&mut state, ArcAction::Shift).unwrap();
        assert!(!system.is_terminal(&state));
        assert_eq!(system.legal_actions(&state), vec![ArcAction::Reduce]);
        system.apply(&mut state, ArcAction::Reduce).unwrap();
        system.apply(&mut state, ArcAction::Reduce).unwrap();
        assert!(system.is_terminal(&state));
        system.finish(state, &mut doc).unwrap();
        assert!(doc.token(0).is_root());
        assert!(doc.token(1).is_root());
    }

    #[test]
    fn test_left_needs_headless_top() {
        let (system, doc) = setup("a b c");
        let nsubj = system.labels()[0];
        let mut state = system.init(&doc);
        system.apply(&mut state, ArcAction::Right(nsubj)).unwrap();
        assert_eq!(state.head(0), Some(0));
        assert!(!system.is_legal(&state, ArcAction::Left(nsubj)));
        assert!(system.is_legal(&state, ArcAction::Reduce));
    }

    #[test]
    fn test_action_names() {
        let strings = StringStore::new();
        let det = strings.intern("det");
        assert_eq!(ArcAction::Shift.class_name(&strings), "S");
        assert_eq!(ArcAction::Left(det).class_name(&strings), "L-det");
        assert_eq!(ArcAction::Right(det).class_name(&strings), "R-det");
        assert_eq!(ArcAction::Reduce.class_name(&strings), "D");
    }

    #[test]
    fn test_empty_doc_is_terminal() {
        let (system, doc) = setup("");
        assert!(system.is_terminal(&system.init(&doc)));
    }
}
