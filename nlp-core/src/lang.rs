//! # Regras de Tokenização por Idioma
//!
//! Conjuntos de regras prontos para [`crate::tokenizer::Tokenizer`].
//!
//! - **Inglês**: contrações ("don't" → "do" + "n't"), abreviações ("Mr.",
//!   "U.S."), emoticons e pontuação.
//! - **Português**: abreviações de tratamento e pronomes clíticos com hífen
//!   ("curou-se" → "curou" + "-" + "se").
//!
//! Variantes com maiúscula inicial e com apóstrofo tipográfico (’) são
//! geradas automaticamente a partir da forma base.

use crate::tokenizer::{ExceptionPiece, TokenizerRules};

const PREFIX: &str = r#"\.\.\.|…|[\[({<"'`“‘«$£€¥#&*¿¡]"#;

const SUFFIX_PUNCT: &str = r#"\.\.\.|…|[\])}>"'”’»,;:!?.%°]"#;

const EN_SUFFIX_CLITICS: &str = r"'s|'S|’s|’S|n't|N'T|n’t|'re|'ve|'ll|'m|'d";

const INFIX: &str = r"\.\.+|…|--+|[-–—~/]";

/// Contrações do inglês: (chunk, [(peça, norma)]).
const EN_CONTRACTIONS: &[(&str, &[(&str, Option<&str>)])] = &[
    ("don't", &[("do", None), ("n't", Some("not"))]),
    ("doesn't", &[("does", None), ("n't", Some("not"))]),
    ("didn't", &[("did", None), ("n't", Some("not"))]),
    ("isn't", &[("is", None), ("n't", Some("not"))]),
    ("aren't", &[("are", None), ("n't", Some("not"))]),
    ("wasn't", &[("was", None), ("n't", Some("not"))]),
    ("weren't", &[("were", None), ("n't", Some("not"))]),
    ("haven't", &[("have", None), ("n't", Some("not"))]),
    ("hasn't", &[("has", None), ("n't", Some("not"))]),
    ("hadn't", &[("had", None), ("n't", Some("not"))]),
    ("couldn't", &[("could", None), ("n't", Some("not"))]),
    ("shouldn't", &[("should", None), ("n't", Some("not"))]),
    ("wouldn't", &[("would", None), ("n't", Some("not"))]),
    ("can't", &[("ca", Some("can")), ("n't", Some("not"))]),
    ("won't", &[("wo", Some("will")), ("n't", Some("not"))]),
    ("ain't", &[("ai", Some("am")), ("n't", Some("not"))]),
    ("cannot", &[("can", None), ("not", None)]),
    ("i'm", &[("i", None), ("'m", Some("am"))]),
    ("i've", &[("i", None), ("'ve", Some("have"))]),
    ("i'll", &[("i", None), ("'ll", Some("will"))]),
    ("i'd", &[("i", None), ("'d", Some("would"))]),
    ("you're", &[("you", None), ("'re", Some("are"))]),
    ("we're", &[("we", None), ("'re", Some("are"))]),
    ("they're", &[("they", None), ("'re", Some("are"))]),
    ("you've", &[("you", None), ("'ve", Some("have"))]),
    ("we've", &[("we", None), ("'ve", Some("have"))]),
    ("they've", &[("they", None), ("'ve", Some("have"))]),
    ("it's", &[("it", None), ("'s", Some("is"))]),
    ("that's", &[("that", None), ("'s", Some("is"))]),
    ("let's", &[("let", None), ("'s", Some("us"))]),
    ("gonna", &[("gon", Some("going")), ("na", Some("to"))]),
    ("gotta", &[("got", None), ("ta", Some("to"))]),
    ("wanna", &[("wan", Some("want")), ("na", Some("to"))]),
];

const EN_ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "St.", "Jr.", "Sr.", "Prof.", "Gen.", "Gov.", "Sen.", "Rep.",
    "Inc.", "Ltd.", "Co.", "Corp.", "vs.", "etc.", "e.g.", "i.e.", "U.S.", "U.K.", "a.m.", "p.m.",
    "Jan.", "Feb.", "Mar.", "Apr.", "Jun.", "Jul.", "Aug.", "Sep.", "Sept.", "Oct.", "Nov.", "Dec.",
    "Mt.", "No.", "approx.",
];

const EMOTICONS: &[&str] = &[":)", ":-)", ":(", ":-(", ";)", ";-)", ":D", ":P", "<3", "xD"];

/// Abreviações de tratamento e de uso comum em português.
const PT_ABBREVIATIONS: &[&str] = &[
    "Dr.", "Dra.", "Sr.", "Sra.", "Srta.", "Prof.", "Profa.", "Eng.", "Exmo.", "Exma.", "Av.",
    "R.", "Ltda.", "S.A.", "etc.", "p.ex.", "pág.", "nº.", "tel.", "V.Exa.",
];

/// Regras do inglês.
pub fn english_rules() -> TokenizerRules {
    let mut rules = TokenizerRules {
        prefix: Some(PREFIX.to_string()),
        suffix: Some(format!("{EN_SUFFIX_CLITICS}|{SUFFIX_PUNCT}")),
        infix: Some(INFIX.to_string()),
        ..TokenizerRules::default()
    };
    for (chunk, pieces) in EN_CONTRACTIONS {
        let pieces: Vec<ExceptionPiece> = pieces
            .iter()
            .map(|(orth, norm)| match norm {
                Some(norm) => ExceptionPiece::with_norm(*orth, *norm),
                None => ExceptionPiece::new(*orth),
            })
            .collect();
        add_with_variants(&mut rules, chunk, pieces);
    }
    for word in EN_ABBREVIATIONS.iter().chain(EMOTICONS) {
        rules.add_exception(*word, vec![ExceptionPiece::new(*word)]);
    }
    rules
}

/// Regras do português.
pub fn portuguese_rules() -> TokenizerRules {
    let mut rules = TokenizerRules {
        prefix: Some(PREFIX.to_string()),
        suffix: Some(SUFFIX_PUNCT.to_string()),
        infix: Some(INFIX.to_string()),
        ..TokenizerRules::default()
    };
    for word in PT_ABBREVIATIONS.iter().chain(EMOTICONS) {
        rules.add_exception(*word, vec![ExceptionPiece::new(*word)]);
    }
    rules
}

/// Registra a exceção base, a versão com inicial maiúscula e as versões com ’.
fn add_with_variants(rules: &mut TokenizerRules, chunk: &str, pieces: Vec<ExceptionPiece>) {
    let mut variants = vec![(chunk.to_string(), pieces.clone())];

    let mut titled = pieces.clone();
    if let Some(first) = titled.first_mut() {
        first.orth = capitalize(&first.orth);
    }
    let titled_chunk: String = titled.iter().map(|p| p.orth.as_str()).collect();
    if titled_chunk != chunk {
        variants.push((titled_chunk, titled));
    }

    let typographic: Vec<_> = variants
        .iter()
        .filter(|(c, _)| c.contains('\''))
        .map(|(c, ps)| {
            let ps = ps
                .iter()
                .map(|p| ExceptionPiece {
                    orth: p.orth.replace('\'', "’"),
                    norm: p.norm.clone(),
                })
                .collect();
            (c.replace('\'', "’"), ps)
        })
        .collect();
    variants.extend(typographic);

    for (chunk, pieces) in variants {
        rules.add_exception(chunk, pieces);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
