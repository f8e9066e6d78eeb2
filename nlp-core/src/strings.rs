//! # Tabela de Strings (Interner)
//!
//! Toda string que vira identificador no pipeline (formas de palavras, tags,
//! rótulos de dependência, tipos de entidade) passa por um [`StringStore`].
//! O id de uma string é estável durante toda a vida do processo.
//!
//! A tabela é construída uma vez e **injetada** (via `Arc`) nos componentes que
//! precisam dela: lexicon, tokenizer, tag sets. Não existe instância global.

use lasso::{Key, Spur, ThreadedRodeo};

/// Identificador interno de uma string.
pub type Symbol = Spur;

/// Interner thread-safe baseado em `lasso::ThreadedRodeo`.
#[derive(Debug, Default)]
pub struct StringStore {
    rodeo: ThreadedRodeo,
}

impl StringStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retorna o símbolo da string, inserindo-a se necessário.
    pub fn intern(&self, s: &str) -> Symbol {
        self.rodeo.get_or_intern(s)
    }

    /// Busca sem inserir.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.rodeo.get(s)
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.rodeo.resolve(&sym)
    }

    pub fn contains(&self, s: &str) -> bool {
        self.rodeo.contains(s)
    }

    /// Id numérico do símbolo (denso, começando em 0).
    pub fn id(&self, sym: Symbol) -> usize {
        sym.into_usize()
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let store = StringStore::new();
        let a = store.intern("sentence");
        let b = store.intern("sentence");
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve(a), "sentence");
    }

    #[test]
    fn test_get_does_not_insert() {
        let store = StringStore::new();
        assert!(store.get("NN").is_none());
        assert!(!store.contains("NN"));
        let nn = store.intern("NN");
        assert_eq!(store.get("NN"), Some(nn));
    }

    #[test]
    fn test_ids_are_dense() {
        let store = StringStore::new();
        let a = store.intern("a");
        let b = store.intern("b");
        assert_eq!(store.id(a), 0);
        assert_eq!(store.id(b), 1);
    }
}
