//! # Sistemas de Transição e Decodificação Gulosa
//!
//! Parser de dependências e reconhecedor de entidades são o **mesmo motor**:
//! um estado, um conjunto de ações legais em cada estado e um scorer que
//! escolhe a próxima ação. Só o sistema de transição muda.
//!
//! ## O laço guloso
//!
//! ```text
//! estado = init(doc)
//! enquanto !terminal(estado):
//!     legais = legal_actions(estado)      // em ordem de precedência
//!     ranking = scorer.rank(features, legais)
//!     ação = maior pontuação (empate → a que vem antes em `legais`)
//!     apply(estado, ação)
//! finish(estado, doc)
//! ```
//!
//! Sem backtracking, sem beam: uma ação por passo.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::doc::Doc;
use crate::error::{NlpError, Result};
use crate::features::FeatureVector;
use crate::scorer::{Class, Scorer};

/// Um sistema de transição sobre um [`Doc`].
///
/// O estado é função pura da sequência de ações aplicadas.
pub trait TransitionSystem: Send + Sync {
    type State;
    type Action: Class;

    /// Nome usado em logs e erros.
    fn name(&self) -> &'static str;

    fn init(&self, doc: &Doc) -> Self::State;

    /// Ações legais, na ordem de precedência usada para desempate.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    fn is_legal(&self, state: &Self::State, action: Self::Action) -> bool;

    /// Aplica a ação. Ações ilegais são rejeitadas com `InvalidTransition`.
    fn apply(&self, state: &mut Self::State, action: Self::Action) -> Result<()>;

    fn is_terminal(&self, state: &Self::State) -> bool;

    fn features(&self, state: &Self::State, doc: &Doc) -> FeatureVector;

    /// Grava as anotações do estado final no documento.
    fn finish(&self, state: Self::State, doc: &mut Doc) -> Result<()>;
}

/// Estatísticas de uma decodificação.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    pub steps: usize,
    /// O laço parou porque o estado não tinha ações legais.
    pub stopped_early: bool,
}

/// Executa o laço guloso de `system` sobre `doc`.
pub fn greedy_decode<S>(system: &S, scorer: &dyn Scorer<S::Action>, doc: &mut Doc) -> Result<DecodeStats>
where
    S: TransitionSystem + ?Sized,
{
    let mut state = system.init(doc);
    let mut stats = DecodeStats::default();

    while !system.is_terminal(&state) {
        let legal = system.legal_actions(&state);
        if legal.is_empty() {
            warn!(system = system.name(), step = stats.steps, "nenhuma ação legal, decodificação interrompida");
            stats.stopped_early = true;
            break;
        }
        let fv = system.features(&state, doc);
        let action = choose(system.name(), &legal, scorer.rank(&fv, &legal))?;
        system.apply(&mut state, action)?;
        stats.steps += 1;
    }

    system.finish(state, doc)?;
    debug!(system = system.name(), steps = stats.steps, "decodificação concluída");
    Ok(stats)
}

/// Maior pontuação; empate vai para a ação que vem antes em `legal`.
pub(crate) fn choose<A: Class>(system: &'static str, legal: &[A], ranked: Vec<(A, f64)>) -> Result<A> {
    let mut best: Option<(usize, f64)> = None;
    for (action, score) in ranked {
        let Some(idx) = legal.iter().position(|a| *a == action) else {
            return Err(NlpError::invalid_transition(
                system,
                action,
                "scorer devolveu uma ação fora do conjunto legal",
            ));
        };
        let better = match best {
            None => true,
            Some((best_idx, best_score)) => score > best_score || (score == best_score && idx < best_idx),
        };
        if better {
            best = Some((idx, score));
        }
    }
    match best {
        Some((idx, _)) => Ok(legal[idx]),
        None => Err(NlpError::invalid_transition(system, "<none>", "scorer não devolveu candidatos")),
    }
}

/// Um sistema de transição com seu scorer.
pub struct Parser<S: TransitionSystem> {
    system: S,
    scorer: Box<dyn Scorer<S::Action>>,
}

impl<S: TransitionSystem> Parser<S> {
    pub fn new(system: S, scorer: Box<dyn Scorer<S::Action>>) -> Self {
        Self { system, scorer }
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn parse(&self, doc: &mut Doc) -> Result<DecodeStats> {
        greedy_decode(&self.system, self.scorer.as_ref(), doc)
    }
}

impl<S: TransitionSystem> std::fmt::Debug for Parser<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser").field("system", &self.system.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lexicon::Lexicon;
    use crate::strings::StringStore;
    use crate::tokenizer::{Tokenizer, TokenizerRules};

    /// Sistema de brinquedo: avança um token por passo, marcando o lema.
    struct Walker {
        dead_end_at: Option<usize>,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Step {
        Mark,
        Skip,
    }

    impl Class for Step {
        fn class_name(&self, _strings: &StringStore) -> String {
            format!("{self:?}")
        }
    }

    struct WalkState {
        cursor: usize,
        n: usize,
        marked: Vec<usize>,
    }

    impl TransitionSystem for Walker {
        type State = WalkState;
        type Action = Step;

        fn name(&self) -> &'static str {
            "walker"
        }

        fn init(&self, doc: &Doc) -> WalkState {
            WalkState { cursor: 0, n: doc.len(), marked: Vec::new() }
        }

        fn legal_actions(&self, state: &WalkState) -> Vec<Step> {
            if state.cursor >= state.n || Some(state.cursor) == self.dead_end_at {
                return Vec::new();
            }
            vec![Step::Skip, Step::Mark]
        }

        fn is_legal(&self, state: &WalkState, action: Step) -> bool {
            self.legal_actions(state).contains(&action)
        }

        fn apply(&self, state: &mut WalkState, action: Step) -> Result<()> {
            if !self.is_legal(state, action) {
                return Err(NlpError::invalid_transition(self.name(), action, "ação ilegal"));
            }
            if action == Step::Mark {
                state.marked.push(state.cursor);
            }
            state.cursor += 1;
            Ok(())
        }

        fn is_terminal(&self, state: &WalkState) -> bool {
            state.cursor == state.n
        }

        fn features(&self, state: &WalkState, doc: &Doc) -> FeatureVector {
            let mut fv = FeatureVector::new();
            fv.set(format!("w={}", doc.token(state.cursor).lower()));
            fv
        }

        fn finish(&self, state: WalkState, doc: &mut Doc) -> Result<()> {
            let mark = doc.strings().intern("marked");
            for i in state.marked {
                doc.set_lemma(i, mark)?;
            }
            Ok(())
        }
    }

    struct Fixed(Vec<(Step, f64)>);

    impl Scorer<Step> for Fixed {
        fn rank(&self, _features: &FeatureVector, _legal: &[Step]) -> Vec<(Step, f64)> {
            self.0.clone()
        }
    }

    fn doc(text: &str) -> Doc {
        let lexicon = Arc::new(Lexicon::new(Arc::new(StringStore::new())));
        Tokenizer::new(lexicon, &TokenizerRules::default()).unwrap().segment(text)
    }

    #[test]
    fn test_decoder_picks_highest() {
        let mut d = doc("a b c");
        let scorer = Fixed(vec![(Step::Mark, 1.0), (Step::Skip, 0.0)]);
        let stats = greedy_decode(&Walker { dead_end_at: None }, &scorer, &mut d).unwrap();
        assert_eq!(stats.steps, 3);
        assert!(!stats.stopped_early);
        assert!(d.iter().all(|t| t.lemma() == Some("marked")));
    }

    #[test]
    fn test_tie_goes_to_first_legal() {
        let mut d = doc("a b");
        let scorer = Fixed(vec![(Step::Mark, 0.5), (Step::Skip, 0.5)]);
        greedy_decode(&Walker { dead_end_at: None }, &scorer, &mut d).unwrap();
        assert!(d.iter().all(|t| t.lemma().is_none()));
    }

    #[test]
    fn test_defensive_stop() {
        let mut d = doc("a b c");
        let scorer = Fixed(vec![(Step::Mark, 1.0)]);
        let stats = greedy_decode(&Walker { dead_end_at: Some(1) }, &scorer, &mut d).unwrap();
        assert!(stats.stopped_early);
        assert_eq!(stats.steps, 1);
        assert_eq!(d.token(0).lemma(), Some("marked"));
    }

    #[test]
    fn test_choose_rejects_action_outside_legal() {
        let err = choose("walker", &[Step::Skip], vec![(Step::Mark, 9.0)]).unwrap_err();
        assert!(matches!(err, NlpError::InvalidTransition { system: "walker", .. }));
    }

    #[test]
    fn test_empty_doc_is_terminal() {
        let mut d = doc("");
        let parser = Parser::new(Walker { dead_end_at: None }, Box::new(Fixed(Vec::new())));
        let stats = parser.parse(&mut d).unwrap();
        assert_eq!(stats.steps, 0);
    }
}
