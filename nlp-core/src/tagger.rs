//! # Tagger Gramatical (POS)
//!
//! Atribui a cada token uma tag fina (tag set do Penn Treebank: `NN`, `VBZ`,
//! `DT`…) da esquerda para a direita, em uma única passada gulosa.
//!
//! ## Decisão por token
//!
//! 1. Monta features do token (forma, sufixo, prefixo, shape, flags), das
//!    duas tags já atribuídas à esquerda e das duas palavras de cada lado.
//! 2. Pede ao [`Scorer`] a pontuação de cada tag do tag set.
//! 3. Fica com a maior; empates vão para a tag que vem antes no tag set
//!    (ordenado por nome).
//!
//! Depois da tag, o token recebe a classe gramatical grossa ([`Pos`]) pelo
//! *tag map* e o lema pelo [`Lemmatizer`].
//!
//! | Tag | Pos   | Exemplo       |
//! |-----|-------|---------------|
//! | NN  | NOUN  | sentence      |
//! | NNP | PROPN | London        |
//! | VBZ | VERB  | is            |
//! | DT  | DET   | the           |
//! | .   | PUNCT | .             |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::Doc;
use crate::error::Result;
use crate::features::{offset, token_features, word_feature, FeatureVector};
use crate::scorer::{Class, Scorer};
use crate::strings::{StringStore, Symbol};
use crate::transition::choose;

/// Classe gramatical grossa, derivada da tag fina.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Conj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sym,
    Verb,
    X,
}

impl Pos {
    pub fn name(&self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adp => "ADP",
            Pos::Adv => "ADV",
            Pos::Conj => "CONJ",
            Pos::Det => "DET",
            Pos::Intj => "INTJ",
            Pos::Noun => "NOUN",
            Pos::Num => "NUM",
            Pos::Part => "PART",
            Pos::Pron => "PRON",
            Pos::Propn => "PROPN",
            Pos::Punct => "PUNCT",
            Pos::Sym => "SYM",
            Pos::Verb => "VERB",
            Pos::X => "X",
        }
    }

    /// Tag map do Penn Treebank.
    pub fn from_ptb(tag: &str) -> Pos {
        match tag {
            "JJ" | "JJR" | "JJS" => Pos::Adj,
            "IN" => Pos::Adp,
            "RB" | "RBR" | "RBS" | "WRB" => Pos::Adv,
            "CC" => Pos::Conj,
            "DT" | "PDT" | "WDT" => Pos::Det,
            "UH" => Pos::Intj,
            "NN" | "NNS" => Pos::Noun,
            "NNP" | "NNPS" => Pos::Propn,
            "CD" => Pos::Num,
            "POS" | "RP" | "TO" => Pos::Part,
            "PRP" | "PRP$" | "WP" | "WP$" | "EX" => Pos::Pron,
            "." | "," | ":" | "``" | "''" | "-LRB-" | "-RRB-" | "HYPH" | "NFP" => Pos::Punct,
            "$" | "#" | "SYM" => Pos::Sym,
            "MD" | "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => Pos::Verb,
            _ => Pos::X,
        }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uma tag do tag set, como classe pontuável.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagClass(pub Symbol);

impl Class for TagClass {
    fn class_name(&self, strings: &StringStore) -> String {
        strings.resolve(self.0).to_string()
    }
}

/// Calcula o lema de uma palavra já etiquetada.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, word: &str, tag: &str, pos: Pos) -> String;
}

/// Lematizador por regras de sufixo, com uma tabela de irregulares.
#[derive(Debug, Clone)]
pub struct SuffixLemmatizer {
    irregular: HashMap<String, String>,
}

const NOUN_RULES: &[(&str, &str)] =
    &[("ies", "y"), ("ches", "ch"), ("shes", "sh"), ("sses", "ss"), ("xes", "x"), ("s", "")];
const VERB_RULES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("ied", "y"),
    ("ying", "y"),
    ("ing", ""),
    ("ed", ""),
    ("es", ""),
    ("s", ""),
];
const ADJ_RULES: &[(&str, &str)] = &[("iest", "y"), ("ier", "y"), ("est", ""), ("er", "")];

const IRREGULAR: &[(&str, &str)] = &[
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("am", "be"),
    ("'m", "be"),
    ("'re", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("'ve", "have"),
    ("does", "do"),
    ("did", "do"),
    ("went", "go"),
    ("gone", "go"),
    ("said", "say"),
    ("made", "make"),
    ("took", "take"),
    ("saw", "see"),
    ("seen", "see"),
    ("better", "good"),
    ("best", "good"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("n't", "not"),
    ("ca", "can"),
    ("wo", "will"),
];

impl SuffixLemmatizer {
    pub fn english() -> Self {
        Self {
            irregular: IRREGULAR
                .iter()
                .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
                .collect(),
        }
    }
}

impl Default for SuffixLemmatizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Lemmatizer for SuffixLemmatizer {
    fn lemmatize(&self, word: &str, _tag: &str, pos: Pos) -> String {
        if pos == Pos::Propn {
            return word.to_string();
        }
        let lower = word.to_lowercase();
        if let Some(lemma) = self.irregular.get(&lower) {
            return lemma.clone();
        }
        let rules = match pos {
            Pos::Noun => NOUN_RULES,
            Pos::Verb => VERB_RULES,
            Pos::Adj => ADJ_RULES,
            _ => return lower,
        };
        for (suffix, replacement) in rules {
            if let Some(stem) = lower.strip_suffix(suffix) {
                // Radical curto demais: "is", "as", "red"
                if stem.chars().count() >= 2 {
                    return format!("{stem}{replacement}");
                }
            }
        }
        lower
    }
}

/// Lema = forma minúscula (nomes próprios ficam como estão).
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseLemmatizer;

impl Lemmatizer for LowercaseLemmatizer {
    fn lemmatize(&self, word: &str, _tag: &str, pos: Pos) -> String {
        if pos == Pos::Propn {
            word.to_string()
        } else {
            word.to_lowercase()
        }
    }
}

/// O tagger: tag set, tag map, scorer e lematizador.
pub struct Tagger {
    classes: Vec<TagClass>,
    tag_map: HashMap<Symbol, Pos>,
    scorer: Box<dyn Scorer<TagClass>>,
    lemmatizer: Box<dyn Lemmatizer>,
}

impl Tagger {
    /// Cria o tagger. O tag set é ordenado por nome (ordem de desempate) e
    /// cada tag recebe sua classe grossa por [`Pos::from_ptb`].
    pub fn new(
        strings: &StringStore,
        tag_names: &[String],
        scorer: Box<dyn Scorer<TagClass>>,
        lemmatizer: Box<dyn Lemmatizer>,
    ) -> Self {
        let mut names: Vec<&str> = tag_names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        let classes: Vec<TagClass> = names.iter().map(|n| TagClass(strings.intern(n))).collect();
        let tag_map = names
            .iter()
            .zip(&classes)
            .map(|(name, class)| (class.0, Pos::from_ptb(name)))
            .collect();
        Self {
            classes,
            tag_map,
            scorer,
            lemmatizer,
        }
    }

    pub fn tag_names(&self, strings: &StringStore) -> Vec<String> {
        self.classes
            .iter()
            .map(|c| strings.resolve(c.0).to_string())
            .collect()
    }

    /// Etiqueta o documento inteiro.
    pub fn tag(&self, doc: &mut Doc) -> Result<()> {
        if self.classes.is_empty() {
            return Ok(());
        }
        let strings = std::sync::Arc::clone(doc.strings());
        for i in 0..doc.len() {
            let fv = self.features(doc, i);
            let class = self.best(&fv)?;
            let pos = self.tag_map.get(&class.0).copied().unwrap_or(Pos::X);
            doc.set_tag(i, class.0, Some(pos))?;

            let token = doc.token(i);
            let lemma = self
                .lemmatizer
                .lemmatize(token.text(), strings.resolve(class.0), pos);
            doc.set_lemma(i, strings.intern(&lemma))?;
        }
        debug!(tokens = doc.len(), "tagger concluído");
        Ok(())
    }

    /// Features do token `i`. As tags à esquerda já estão no `doc`.
    pub fn features(&self, doc: &Doc, i: usize) -> FeatureVector {
        let n = doc.len();
        let mut fv = FeatureVector::new();
        token_features(&mut fv, doc, Some(i), "");

        let t1 = offset(i, -1, n).and_then(|j| doc.token(j).tag());
        let t2 = offset(i, -2, n).and_then(|j| doc.token(j).tag());
        fv.set(format!("t-1={}", t1.unwrap_or("<none>")));
        fv.set(format!(
            "t-2,t-1={}|{}",
            t2.unwrap_or("<none>"),
            t1.unwrap_or("<none>")
        ));
        if let Some(t1) = t1 {
            fv.set(format!("t-1,w={t1}|{}", doc.token(i).lower()));
        }

        word_feature(&mut fv, doc, offset(i, -1, n), "w-1");
        word_feature(&mut fv, doc, offset(i, -2, n), "w-2");
        word_feature(&mut fv, doc, offset(i, 1, n), "w+1");
        word_feature(&mut fv, doc, offset(i, 2, n), "w+2");
        if let Some(next) = offset(i, 1, n) {
            fv.set(format!("suf+1={}", doc.token(next).lexeme().suffix.to_lowercase()));
        }
        fv
    }

    fn best(&self, fv: &FeatureVector) -> Result<TagClass> {
        choose("tagger", &self.classes, self.scorer.rank(fv, &self.classes))
    }
}

impl std::fmt::Debug for Tagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tagger")
            .field("tags", &self.classes.len())
            .finish()
    }
}
