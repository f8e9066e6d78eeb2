//! # Lexicon — Vocabulário Compartilhado
//!
//! O lexicon mapeia cada forma de palavra para uma entrada ([`Lexeme`]) com
//! atributos lexicais pré-calculados: minúsculas, forma abstrata, prefixo,
//! sufixo, flags, cluster, probabilidade. Tokens **referenciam** a entrada
//! (via `Arc`), eles não copiam esses atributos.
//!
//! ## Ciclo de vida
//!
//! - Entradas são criadas sob demanda na primeira busca feita pelo tokenizador,
//!   ou carregadas em lote na inicialização ([`Lexicon::extend`]).
//! - Nunca são removidas. O mapa só cresce.
//! - Depois de criadas são imutáveis, exceto pelo preenchimento tardio de flags
//!   e vetores, que **substitui** a entrada compartilhada (copy-on-write):
//!   tokens já criados continuam vendo a versão antiga.
//!
//! ## Concorrência
//!
//! Leituras usam um `RwLock` em modo compartilhado. A inserção de uma entrada
//! nova pega o lock exclusivo e confere de novo se outra thread já inseriu.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::orth::{get_flags, word_shape, LexFlags};
use crate::strings::{StringStore, Symbol};

/// Atributos brutos de uma forma de palavra, antes de virar [`Lexeme`].
///
/// É o formato aceito no carregamento em lote e o retorno de um [`LexPropsFn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexProps {
    pub orth: String,
    pub lower: String,
    pub norm: String,
    pub shape: String,
    pub prefix: String,
    pub suffix: String,
    pub length: usize,
    pub flags: LexFlags,
    #[serde(default)]
    pub cluster: u32,
    #[serde(default)]
    pub prob: f32,
    #[serde(default)]
    pub sentiment: f32,
}

/// Função de extração de atributos usada para formas desconhecidas.
pub type LexPropsFn = Arc<dyn Fn(&str) -> LexProps + Send + Sync>;

/// Atributos padrão: tudo que dá para calcular olhando os caracteres.
///
/// Prefixo é o primeiro grafema e sufixo os três últimos; `cluster`, `prob` e
/// `sentiment` ficam zerados.
pub fn default_lex_props(s: &str) -> LexProps {
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    let prefix = graphemes.first().copied().unwrap_or_default().to_string();
    let suffix = graphemes[graphemes.len().saturating_sub(3)..].concat();
    LexProps {
        orth: s.to_string(),
        lower: s.to_lowercase(),
        norm: s.to_string(),
        shape: word_shape(s),
        prefix,
        suffix,
        length: s.chars().count(),
        flags: get_flags(s),
        cluster: 0,
        prob: 0.0,
        sentiment: 0.0,
    }
}

/// Uma entrada do lexicon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lexeme {
    /// Id denso atribuído na primeira inserção.
    pub id: u32,
    #[serde(skip)]
    pub orth_sym: Symbol,
    pub orth: String,
    pub lower: String,
    pub norm: String,
    pub shape: String,
    pub prefix: String,
    pub suffix: String,
    pub length: usize,
    pub flags: LexFlags,
    pub cluster: u32,
    pub prob: f32,
    pub sentiment: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl Lexeme {
    pub fn check(&self, flag: LexFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_punct(&self) -> bool {
        self.check(LexFlags::IS_PUNCT)
    }

    pub fn is_title(&self) -> bool {
        self.check(LexFlags::IS_TITLE)
    }
}

#[derive(Default)]
struct LexiconInner {
    by_orth: HashMap<Symbol, Arc<Lexeme>>,
    entries: Vec<Arc<Lexeme>>,
}

/// O vocabulário compartilhado.
pub struct Lexicon {
    strings: Arc<StringStore>,
    props: LexPropsFn,
    inner: RwLock<LexiconInner>,
}

impl Lexicon {
    /// Lexicon vazio com a extração de atributos padrão.
    pub fn new(strings: Arc<StringStore>) -> Self {
        Self::with_props(strings, Arc::new(default_lex_props))
    }

    pub fn with_props(strings: Arc<StringStore>, props: LexPropsFn) -> Self {
        Self {
            strings,
            props,
            inner: RwLock::new(LexiconInner::default()),
        }
    }

    pub fn strings(&self) -> &Arc<StringStore> {
        &self.strings
    }

    /// Busca a entrada de `form`, criando-a se ainda não existe.
    ///
    /// Nunca falha: formas desconhecidas recebem atributos sintetizados e a
    /// flag `IS_OOV`.
    pub fn lookup(&self, form: &str) -> Arc<Lexeme> {
        let sym = self.strings.intern(form);
        if let Some(lex) = self.read().by_orth.get(&sym) {
            return Arc::clone(lex);
        }
        let mut props = (self.props)(form);
        props.flags |= LexFlags::IS_OOV;
        self.insert_with_symbol(sym, props)
    }

    /// Id estável de `form` (insere se necessário).
    pub fn id_for(&self, form: &str) -> u32 {
        self.lookup(form).id
    }

    /// Busca sem inserir.
    pub fn get(&self, form: &str) -> Option<Arc<Lexeme>> {
        let sym = self.strings.get(form)?;
        self.read().by_orth.get(&sym).cloned()
    }

    /// Entrada pelo id numérico.
    pub fn by_id(&self, id: u32) -> Option<Arc<Lexeme>> {
        self.read().entries.get(id as usize).cloned()
    }

    /// Insere atributos carregados externamente.
    ///
    /// Se a forma já existe, a entrada existente é mantida e retornada.
    pub fn insert(&self, props: LexProps) -> Arc<Lexeme> {
        let sym = self.strings.intern(&props.orth);
        self.insert_with_symbol(sym, props)
    }

    /// Carregamento em lote.
    pub fn extend<I: IntoIterator<Item = LexProps>>(&self, entries: I) {
        for props in entries {
            self.insert(props);
        }
    }

    /// Preenche o vetor denso de uma forma. Retorna `false` se ela não existe.
    pub fn set_vector(&self, form: &str, vector: Vec<f32>) -> bool {
        self.replace(form, |lex| lex.vector = Some(vector))
    }

    /// Acrescenta flags a uma forma existente.
    pub fn set_flags(&self, form: &str, flags: LexFlags) -> bool {
        self.replace(form, |lex| lex.flags |= flags)
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_with_symbol(&self, sym: Symbol, props: LexProps) -> Arc<Lexeme> {
        let mut inner = self.write();
        // Outra thread pode ter inserido entre o read e o write
        if let Some(lex) = inner.by_orth.get(&sym) {
            return Arc::clone(lex);
        }
        let lex = Arc::new(Lexeme {
            id: inner.entries.len() as u32,
            orth_sym: sym,
            orth: props.orth,
            lower: props.lower,
            norm: props.norm,
            shape: props.shape,
            prefix: props.prefix,
            suffix: props.suffix,
            length: props.length,
            flags: props.flags,
            cluster: props.cluster,
            prob: props.prob,
            sentiment: props.sentiment,
            vector: None,
        });
        inner.by_orth.insert(sym, Arc::clone(&lex));
        inner.entries.push(Arc::clone(&lex));
        lex
    }

    fn replace(&self, form: &str, update: impl FnOnce(&mut Lexeme)) -> bool {
        let Some(sym) = self.strings.get(form) else {
            return false;
        };
        let mut inner = self.write();
        let Some(current) = inner.by_orth.get(&sym) else {
            return false;
        };
        let mut updated = Lexeme::clone(current);
        update(&mut updated);
        let id = updated.id as usize;
        let updated = Arc::new(updated);
        inner.entries[id] = Arc::clone(&updated);
        inner.by_orth.insert(sym, updated);
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LexiconInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LexiconInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon").field("len", &self.len()).finish()
    }
}
