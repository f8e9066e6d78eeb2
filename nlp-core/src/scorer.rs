//! # Scorers
//!
//! Os estágios não sabem como um modelo calcula pontuações: eles montam um
//! [`FeatureVector`], passam a lista de classes legais e recebem cada classe
//! com sua pontuação. Essa é a capacidade opaca [`Scorer::rank`].
//!
//! [`LinearModel`] é a implementação embutida: um modelo linear esparso,
//! o mesmo formato de pesos `(feature, classe) → peso` de um perceptron.
//!
//! $$ \text{score}(c) = \sum_i w_{i,c} \cdot f_i $$

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::features::FeatureVector;
use crate::strings::StringStore;

/// Uma classe que um scorer sabe pontuar (tag, transição, ação BILOU).
pub trait Class: Copy + PartialEq + Debug + Send + Sync {
    /// Nome estável da classe, usado como chave de pesos.
    fn class_name(&self, strings: &StringStore) -> String;
}

/// Capacidade de pontuar as classes legais de uma decisão.
pub trait Scorer<A>: Send + Sync {
    /// Retorna as classes de `legal` com suas pontuações, da maior para a menor.
    /// Empates mantêm a ordem de `legal`.
    fn rank(&self, features: &FeatureVector, legal: &[A]) -> Vec<(A, f64)>;
}

/// Modelo linear esparso: feature → (classe → peso).
pub struct LinearModel {
    weights: HashMap<String, HashMap<String, f64>>,
    strings: Arc<StringStore>,
}

impl LinearModel {
    pub fn new(strings: Arc<StringStore>) -> Self {
        Self {
            weights: HashMap::new(),
            strings,
        }
    }

    /// Soma `weight` ao peso de `(feature, class)`.
    pub fn add_weight(&mut self, feature: &str, class: &str, weight: f64) {
        *self
            .weights
            .entry(feature.to_string())
            .or_default()
            .entry(class.to_string())
            .or_insert(0.0) += weight;
    }

    /// Constrói a partir de uma tabela `(feature, classe, peso)`.
    pub fn from_table(strings: Arc<StringStore>, table: &[(&str, &str, f64)]) -> Self {
        let mut model = Self::new(strings);
        for (feature, class, weight) in table {
            model.add_weight(feature, class, *weight);
        }
        model
    }

    pub fn weight(&self, feature: &str, class: &str) -> f64 {
        self.weights
            .get(feature)
            .and_then(|by_class| by_class.get(class))
            .copied()
            .unwrap_or(0.0)
    }

    /// Pontuação de uma classe pelo nome.
    pub fn score(&self, features: &FeatureVector, class: &str) -> f64 {
        features
            .iter()
            .map(|(name, value)| value * self.weight(name, class))
            .sum()
    }

    /// Número de features com algum peso.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl std::fmt::Debug for LinearModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearModel")
            .field("features", &self.weights.len())
            .finish()
    }
}

impl<A: Class> Scorer<A> for LinearModel {
    fn rank(&self, features: &FeatureVector, legal: &[A]) -> Vec<(A, f64)> {
        let mut scored: Vec<(A, f64)> = legal
            .iter()
            .map(|class| (*class, self.score(features, &class.class_name(&self.strings))))
            .collect();
        // sort_by é estável: empates ficam na ordem de `legal`
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Coin {
        Heads,
        Tails,
    }

    impl Class for Coin {
        fn class_name(&self, _strings: &StringStore) -> String {
            format!("{self:?}")
        }
    }

    fn model() -> LinearModel {
        LinearModel::from_table(
            Arc::new(StringStore::new()),
            &[("lucky", "Tails", 2.0), ("bias", "Heads", 0.5)],
        )
    }

    #[test]
    fn test_rank_orders_by_score() {
        let mut fv = FeatureVector::new();
        fv.set("lucky");
        let ranked = model().rank(&fv, &[Coin::Heads, Coin::Tails]);
        assert_eq!(ranked[0], (Coin::Tails, 2.0));
        assert_eq!(ranked[1], (Coin::Heads, 0.5));
    }

    #[test]
    fn test_rank_stays_within_legal() {
        let mut fv = FeatureVector::new();
        fv.set("lucky");
        let ranked = model().rank(&fv, &[Coin::Heads]);
        assert_eq!(ranked, vec![(Coin::Heads, 0.5)]);
    }

    #[test]
    fn test_ties_keep_legal_order() {
        let empty = LinearModel::new(Arc::new(StringStore::new()));
        let fv = FeatureVector::new();
        let ranked = empty.rank(&fv, &[Coin::Tails, Coin::Heads]);
        assert_eq!(ranked[0].0, Coin::Tails);
        assert_eq!(ranked[1].0, Coin::Heads);
    }

    #[test]
    fn test_weights_accumulate() {
        let mut m = model();
        m.add_weight("lucky", "Tails", 1.0);
        assert_eq!(m.weight("lucky", "Tails"), 3.0);
        assert_eq!(m.weight("unknown", "Tails"), 0.0);
        assert_eq!(m.len(), 2);
    }
}
