//! # Modelos Heurísticos Embutidos
//!
//! Pesos escritos à mão para os três estágios, no formato de
//! [`LinearModel`]. Em um sistema real eles seriam treinados (perceptron
//! médio sobre um treebank); aqui codificamos os padrões mais fortes da
//! língua para que o pipeline funcione de ponta a ponta sem arquivos.
//!
//! - **Tagger**: palavras funcionais, sufixos (`-ly` → RB, `-ing` → VBG),
//!   capitalização (NNP), dígitos (CD), pontuação.
//! - **Parser**: combinações de tags `s0t|b0t` (ex: `DT` antes de `NN` →
//!   LEFT-ARC det).
//! - **Entidades**: sequências de NNP, títulos ("Mr.", "Dr."), um pequeno
//!   gazetteer de lugares, anos (`dddd`) e meses.

use std::sync::Arc;

use crate::arc_eager::ArcEager;
use crate::bilou::Bilou;
use crate::config::{Language, PipelineConfig};
use crate::scorer::LinearModel;
use crate::strings::StringStore;
use crate::tagger::{Lemmatizer, LowercaseLemmatizer, SuffixLemmatizer, Tagger};
use crate::transition::Parser;

/// Tag set do Penn Treebank.
pub const PTB_TAGS: &[&str] = &[
    ".", ",", ":", "``", "''", "-LRB-", "-RRB-", "$", "#", "CC", "CD", "DT", "EX", "HYPH", "IN",
    "JJ", "JJR", "JJS", "MD", "NFP", "NN", "NNP", "NNPS", "NNS", "PDT", "POS", "PRP", "PRP$", "RB",
    "RBR", "RBS", "RP", "SYM", "TO", "UH", "VB", "VBD", "VBG", "VBN", "VBP", "VBZ", "WDT", "WP",
    "WP$", "WRB",
];

/// Rótulos de dependência (a raiz usa `ROOT`, fora desta lista).
pub const DEP_LABELS: &[&str] = &[
    "nsubj", "dobj", "det", "amod", "advmod", "aux", "neg", "prep", "pobj", "punct", "cc", "conj",
    "compound", "poss", "attr", "acomp", "nummod", "case", "dep",
];

pub const EN_ENTITY_TYPES: &[&str] = &["PERSON", "ORG", "GPE", "DATE", "CARDINAL"];

/// As categorias do corpus PT-BR.
pub const PT_ENTITY_TYPES: &[&str] = &["PER", "ORG", "LOC", "MISC"];

// =====================================================================
// TAGGER
// =====================================================================

const EN_FUNCTION_WORDS: &[(&str, &[&str])] = &[
    ("DT", &["the", "a", "an", "this", "that", "these", "those", "every", "some", "another", "each", "any", "no"]),
    ("IN", &["of", "in", "on", "at", "by", "for", "with", "from", "about", "into", "over", "after", "before", "under", "between", "through", "during", "without", "than", "because", "if", "while"]),
    ("CC", &["and", "or", "but", "nor", "yet"]),
    ("PRP", &["i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them"]),
    ("PRP$", &["my", "your", "his", "its", "our", "their"]),
    ("VBZ", &["is", "has", "does", "'s"]),
    ("VBP", &["are", "am", "have", "do", "'re", "'m", "'ve"]),
    ("VBD", &["was", "were", "had", "did", "said", "went", "made", "saw", "took", "sat"]),
    ("VBN", &["been", "gone", "seen"]),
    ("VB", &["be"]),
    ("MD", &["will", "would", "can", "could", "should", "may", "might", "must", "shall", "ca", "wo", "'ll", "'d"]),
    ("RB", &["not", "n't", "very", "also", "too", "just", "never", "always", "often", "now", "then", "again", "here"]),
    ("TO", &["to"]),
    ("WDT", &["which"]),
    ("WP", &["who", "what", "whom"]),
    ("WRB", &["when", "where", "why", "how"]),
    ("EX", &["there"]),
    ("UH", &["yes", "oh", "hello", "hi", "wow"]),
    ("CD", &["one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "hundred", "thousand", "million"]),
];

const PT_FUNCTION_WORDS: &[(&str, &[&str])] = &[
    ("DT", &["o", "a", "os", "as", "um", "uma", "uns", "umas", "este", "esta", "esse", "essa", "aquele", "aquela"]),
    ("IN", &["de", "em", "para", "por", "com", "sem", "sobre", "entre", "até", "do", "da", "dos", "das", "no", "na", "nos", "nas", "ao", "pelo", "pela"]),
    ("CC", &["e", "ou", "mas", "nem"]),
    ("PRP", &["eu", "tu", "ele", "ela", "nós", "eles", "elas", "você", "vocês", "se", "me", "lhe"]),
    ("PRP$", &["meu", "minha", "seu", "sua", "nosso", "nossa"]),
    ("VBZ", &["é", "tem", "está", "vai", "faz"]),
    ("VBP", &["são", "têm", "estão", "vão"]),
    ("VBD", &["foi", "era", "teve", "disse", "fez", "curou"]),
    ("RB", &["não", "muito", "também", "já", "sempre", "nunca", "aqui", "hoje", "ontem"]),
    ("WP", &["que", "quem"]),
    ("WRB", &["quando", "onde", "como"]),
    ("CD", &["dois", "três", "quatro", "cinco", "dez", "cem", "mil"]),
];

const PUNCT_TAGS: &[(&str, &str)] = &[
    (".", "."), ("!", "."), ("?", "."), ("…", ":"), ("...", ":"), (",", ","), (";", ":"), (":", ":"),
    ("--", ":"), ("-", "HYPH"), ("(", "-LRB-"), ("[", "-LRB-"), ("{", "-LRB-"), (")", "-RRB-"),
    ("]", "-RRB-"), ("}", "-RRB-"), ("\"", "``"), ("“", "``"), ("”", "''"), ("'", "''"),
    ("$", "$"), ("€", "$"), ("£", "$"), ("#", "#"), ("%", "NN"),
];

/// Pesos do tagger.
///
/// # Intuições
/// - Palavras funcionais são quase determinísticas (+4.0).
/// - Sem outra evidência, o token é substantivo (`bias` → NN).
/// - Depois de `DT` vem substantivo ou adjetivo; depois de `MD`/`TO`, verbo.
pub fn build_tagger_model(language: Language, strings: Arc<StringStore>) -> LinearModel {
    let mut model = LinearModel::new(strings);

    let function_words = match language {
        Language::English => EN_FUNCTION_WORDS,
        Language::Portuguese => PT_FUNCTION_WORDS,
    };
    for (tag, words) in function_words {
        for word in *words {
            model.add_weight(&format!("w={word}"), tag, 4.0);
        }
    }
    for (punct, tag) in PUNCT_TAGS {
        model.add_weight(&format!("w={punct}"), tag, 5.0);
    }
    // Pontuação desconhecida
    model.add_weight("is_punct", "NFP", 0.8);

    // --- Padrão e capitalização ---
    model.add_weight("bias", "NN", 0.5);
    model.add_weight("is_title", "NNP", 1.2);
    model.add_weight("is_upper", "NNP", 0.8);
    model.add_weight("w-1=<none>", "NNP", -0.6);
    model.add_weight("t-1=NNP", "NNP", 0.4);
    model.add_weight("is_digit", "CD", 3.0);
    model.add_weight("is_num", "CD", 2.5);

    // --- Contexto de tags ---
    model.add_weight("t-1=DT", "NN", 1.2);
    model.add_weight("t-1=DT", "JJ", 0.6);
    model.add_weight("t-1=PRP$", "NN", 1.2);
    model.add_weight("t-1=JJ", "NN", 1.0);
    model.add_weight("t-1=MD", "VB", 2.0);
    model.add_weight("t-1=TO", "VB", 1.8);
    model.add_weight("t-1=IN", "NN", 0.5);
    model.add_weight("t-1=IN", "NNP", 0.4);
    model.add_weight("t-1=PRP", "VBD", 0.9);
    model.add_weight("t-1=PRP", "VBP", 0.7);
    model.add_weight("t-1=NNP", "VBD", 0.5);
    model.add_weight("t-1=NN", "VBZ", 0.3);
    model.add_weight("t-1=NNS", "VBP", 0.4);

    match language {
        Language::English => {
            model.add_weight("suf=ing", "VBG", 2.5);
            model.add_weight("suf2=ed", "VBD", 1.5);
            model.add_weight("suf2=ed", "VBN", 1.0);
            model.add_weight("suf2=ly", "RB", 2.5);
            model.add_weight("suf1=s", "NNS", 0.9);
            model.add_weight("suf1=s", "VBZ", 0.4);
            model.add_weight("suf=ous", "JJ", 1.8);
            model.add_weight("suf=ful", "JJ", 1.8);
            model.add_weight("suf=ive", "JJ", 1.4);
            model.add_weight("suf=ble", "JJ", 1.4);
            model.add_weight("suf=ish", "JJ", 1.2);
            model.add_weight("suf2=al", "JJ", 0.9);
            model.add_weight("suf=est", "JJS", 1.2);
            model.add_weight("suf=ion", "NN", 0.8);
            model.add_weight("suf=ity", "NN", 0.8);
            model.add_weight("w='s", "POS", 1.0);
        }
        Language::Portuguese => {
            model.add_weight("suf=ndo", "VBG", 2.5);
            model.add_weight("suf2=ou", "VBD", 1.5);
            model.add_weight("suf=nte", "JJ", 0.8);
            model.add_weight("suf=oso", "JJ", 1.5);
            model.add_weight("suf=osa", "JJ", 1.5);
            model.add_weight("suf1=s", "NNS", 0.7);
            model.add_weight("suf=ção", "NN", 1.0);
        }
    }
    model
}

pub fn build_tagger(config: &PipelineConfig, strings: Arc<StringStore>) -> Tagger {
    let lemmatizer: Box<dyn Lemmatizer> = match config.language {
        Language::English => Box::new(SuffixLemmatizer::english()),
        Language::Portuguese => Box::new(LowercaseLemmatizer),
    };
    let model = build_tagger_model(config.language, Arc::clone(&strings));
    Tagger::new(&strings, &config.tag_names, Box::new(model), lemmatizer)
}

// =====================================================================
// PARSER
// =====================================================================

const NOMINALS: &[&str] = &["NN", "NNS", "NNP", "NNPS", "PRP"];
const VERBS: &[&str] = &["VB", "VBD", "VBP", "VBZ", "VBG", "VBN"];

/// Pesos do parser arc-eager.
///
/// As classes são `S` (shift), `D` (reduce), `L-rótulo` e `R-rótulo`.
/// Sem evidência, SHIFT vence pela precedência.
pub fn build_parser_model(strings: Arc<StringStore>) -> LinearModel {
    let mut model = LinearModel::new(strings);
    let pair = |s0: &str, b0: &str| format!("s0t={s0}|b0t={b0}");

    // --- Dependentes à esquerda do núcleo nominal ---
    for noun in ["NN", "NNS", "NNP", "NNPS"] {
        model.add_weight(&pair("DT", noun), "L-det", 3.0);
        model.add_weight(&pair("PRP$", noun), "L-poss", 3.0);
        model.add_weight(&pair("JJ", noun), "L-amod", 3.0);
        model.add_weight(&pair("CD", noun), "L-nummod", 2.5);
        model.add_weight(&pair("NN", noun), "L-compound", 2.0);
        model.add_weight(&pair("NNP", noun), "L-compound", 2.0);
    }
    // Determinante espera o adjetivo passar
    model.add_weight(&pair("DT", "JJ"), "S", 2.0);
    model.add_weight(&pair("PRP$", "JJ"), "S", 2.0);

    // --- Sujeito e auxiliares ---
    let subjects = NOMINALS.iter().chain(&["DT", "EX", "WP"]).copied();
    for subj in subjects {
        for &verb in VERBS.iter().chain(&["MD"]) {
            model.add_weight(&pair(subj, verb), "L-nsubj", 3.0);
        }
    }
    for aux in ["MD", "VBZ", "VBP", "VBD"] {
        model.add_weight(&pair(aux, "VB"), "L-aux", 3.5);
        model.add_weight(&pair(aux, "VBG"), "L-aux", 3.0);
        model.add_weight(&pair(aux, "VBN"), "L-aux", 3.0);
    }
    for &verb in VERBS.iter().chain(&["MD"]) {
        model.add_weight(&pair("RB", verb), "L-advmod", 2.0);
    }
    model.add_weight(&pair("TO", "VB"), "L-aux", 3.0);

    // --- Raiz: verbo com a sentinela no topo ---
    for &verb in VERBS.iter().chain(&["MD"]) {
        model.add_weight(&pair("<none>", verb), "R-dep", 2.5);
    }

    // --- Dependentes à direita do verbo ---
    for &verb in VERBS {
        model.add_weight(&pair(verb, "DT"), "S", 2.0);
        model.add_weight(&pair(verb, "PRP$"), "S", 2.0);
        model.add_weight(&pair(verb, "JJ"), "R-acomp", 1.5);
        model.add_weight(&pair(verb, "RB"), "R-advmod", 2.0);
        model.add_weight(&pair(verb, "IN"), "R-prep", 2.0);
        model.add_weight(&pair(verb, "."), "R-punct", 3.0);
        model.add_weight(&pair(verb, ","), "R-punct", 2.0);
        for &noun in NOMINALS {
            model.add_weight(&pair(verb, noun), "R-dobj", 2.5);
        }
    }
    for copula in ["VBZ", "VBD", "VBP"] {
        for noun in ["NN", "NNS"] {
            model.add_weight(&pair(copula, noun), "R-attr", 0.2);
        }
    }
    model.add_weight(&pair("MD", "RB"), "R-neg", 1.0);

    // --- Preposições ---
    for &noun in NOMINALS {
        model.add_weight(&pair("IN", noun), "R-pobj", 2.5);
        model.add_weight(&pair(noun, "IN"), "R-prep", 1.8);
    }
    model.add_weight(&pair("IN", "DT"), "S", 2.0);
    model.add_weight(&pair("IN", "JJ"), "S", 1.5);

    // --- Coordenação ---
    model.add_weight("b0t=CC", "R-cc", 1.0);
    model.add_weight("s0t=CC", "D", 0.8);

    // --- Limpeza ---
    // Token já ligado cede lugar quando a evidência acaba
    model.add_weight("s0h=true", "D", 0.5);
    // Pontuação fraca para quem sobrar na pilha
    model.add_weight("b0t=.", "R-punct", 0.3);
    // Após fim de frase, esvazia a pilha antes da próxima
    model.add_weight("b-1t=.", "D", 3.0);
    model
}

pub fn build_parser(config: &PipelineConfig, strings: Arc<StringStore>) -> Parser<ArcEager> {
    let system = ArcEager::new(&strings, &config.dep_labels);
    Parser::new(system, Box::new(build_parser_model(strings)))
}

// =====================================================================
// ENTIDADES
// =====================================================================

const EN_PLACES: &[&str] = &[
    "london", "paris", "berlin", "tokyo", "rome", "madrid", "boston", "chicago", "brazil", "france",
    "germany", "china", "japan", "india", "england", "america", "canada", "mexico", "spain", "italy",
];

const EN_MONTHS: &[&str] = &[
    "january", "february", "march", "april", "june", "july", "august", "september", "october",
    "november", "december", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    "sunday",
];

const EN_TITLES: &[&str] = &["mr.", "mrs.", "ms.", "dr.", "prof.", "sen.", "gov."];

const EN_ORG_MARKERS: &[&str] = &["inc.", "corp.", "ltd.", "co.", "university", "company"];

const PT_PLACES: &[&str] = &[
    "brasil", "paulo", "rio", "janeiro", "brasília", "bahia", "minas", "amazônia", "portugal",
    "lisboa", "recife", "salvador", "curitiba", "manaus",
];

const PT_TITLES: &[&str] = &["dr.", "dra.", "sr.", "sra.", "prof.", "profa.", "presidente", "ministro"];

const PT_ORG_MARKERS: &[&str] = &["ltda.", "s.a.", "universidade", "banco", "petrobras", "embraer"];

struct EntityPlan {
    person: &'static str,
    org: &'static str,
    place: &'static str,
    places: &'static [&'static str],
    titles: &'static [&'static str],
    org_markers: &'static [&'static str],
}

/// Pesos do reconhecedor BILOU.
///
/// # Intuições
/// - `O` é o padrão (`bias` → O +1.0).
/// - Um `NNP` isolado vira `U-*`; seguido de outro `NNP`, abre `B-*`.
/// - Com entidade aberta, o próximo `NNP` mantém `I-*`; senão fecha com `L-*`.
pub fn build_entity_model(language: Language, strings: Arc<StringStore>) -> LinearModel {
    let mut model = LinearModel::new(strings);
    let plan = match language {
        Language::English => EntityPlan {
            person: "PERSON",
            org: "ORG",
            place: "GPE",
            places: EN_PLACES,
            titles: EN_TITLES,
            org_markers: EN_ORG_MARKERS,
        },
        Language::Portuguese => EntityPlan {
            person: "PER",
            org: "ORG",
            place: "LOC",
            places: PT_PLACES,
            titles: PT_TITLES,
            org_markers: PT_ORG_MARKERS,
        },
    };
    let (per, org, loc) = (plan.person, plan.org, plan.place);

    model.add_weight("bias", "O", 1.0);

    // --- Nomes próprios ---
    model.add_weight("t=NNP", &format!("U-{per}"), 1.3);
    model.add_weight("t=NNP", &format!("B-{per}"), 0.9);
    model.add_weight("n1t=NNP", &format!("B-{per}"), 1.0);
    model.add_weight("n1t=NNP", &format!("U-{per}"), -1.0);
    model.add_weight("t=NNPS", &format!("U-{org}"), 1.2);

    // Entidade aberta: continua enquanto vier NNP, senão fecha
    for ty in [per, org, loc] {
        model.add_weight("n1t=NNP", &format!("I-{ty}"), 1.0);
        model.add_weight("bias", &format!("L-{ty}"), 0.5);
    }

    // --- Títulos de pessoa ---
    for title in plan.titles {
        model.add_weight(&format!("w-1={title}"), &format!("U-{per}"), 2.0);
        model.add_weight(&format!("w-1={title}"), &format!("B-{per}"), 2.0);
    }

    // --- Gazetteer de lugares ---
    for place in plan.places {
        model.add_weight(&format!("w={place}"), &format!("U-{loc}"), 3.0);
        model.add_weight(&format!("w={place}"), &format!("B-{loc}"), 2.2);
        model.add_weight(&format!("w={place}"), &format!("L-{loc}"), 2.0);
        model.add_weight(&format!("n1w={place}"), &format!("B-{loc}"), 1.5);
    }

    // --- Organizações ---
    for marker in plan.org_markers {
        model.add_weight(&format!("w={marker}"), &format!("L-{org}"), 3.0);
        model.add_weight(&format!("w={marker}"), &format!("U-{org}"), 2.5);
        model.add_weight(&format!("n1w={marker}"), &format!("B-{org}"), 2.5);
        model.add_weight(&format!("n1w={marker}"), &format!("I-{org}"), 2.5);
    }
    model.add_weight("is_upper", &format!("U-{org}"), 1.5);
    // Uma letra maiúscula sozinha ("I", "A") não é sigla.
    model.add_weight("shape=X", &format!("U-{org}"), -1.5);

    // --- Datas e números (só inglês tem os tipos) ---
    if language == Language::English {
        model.add_weight("shape=dddd", "U-DATE", 4.0);
        for month in EN_MONTHS {
            model.add_weight(&format!("w={month}"), "U-DATE", 3.0);
        }
        model.add_weight("is_digit", "U-CARDINAL", 1.5);
        model.add_weight("is_num", "U-CARDINAL", 1.5);
        model.add_weight("t=CD", "U-CARDINAL", 0.5);
    }
    model
}

pub fn build_entity(config: &PipelineConfig, strings: Arc<StringStore>) -> Parser<Bilou> {
    let system = Bilou::new(&strings, &config.entity_types);
    Parser::new(system, Box::new(build_entity_model(config.language, strings)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set_is_complete() {
        for tag in EN_FUNCTION_WORDS.iter().map(|(t, _)| *t) {
            assert!(PTB_TAGS.contains(&tag), "{tag} fora do tag set");
        }
        for (_, tag) in PUNCT_TAGS {
            assert!(PTB_TAGS.contains(tag), "{tag} fora do tag set");
        }
    }

    #[test]
    fn test_tagger_weights() {
        let model = build_tagger_model(Language::English, Arc::new(StringStore::new()));
        assert_eq!(model.weight("w=the", "DT"), 4.0);
        assert_eq!(model.weight("w=.", "."), 5.0);
        assert!(model.weight("suf2=ly", "RB") > 0.0);
    }

    #[test]
    fn test_parser_labels_are_known() {
        let model = build_parser_model(Arc::new(StringStore::new()));
        assert_eq!(model.weight("s0t=DT|b0t=NN", "L-det"), 3.0);
        assert!(DEP_LABELS.contains(&"det"));
        assert!(DEP_LABELS.contains(&"nsubj"));
    }

    #[test]
    fn test_portuguese_entity_types() {
        let model = build_entity_model(Language::Portuguese, Arc::new(StringStore::new()));
        assert_eq!(model.weight("w=brasil", "U-LOC"), 3.0);
        assert_eq!(model.weight("shape=dddd", "U-DATE"), 0.0);
    }
}
