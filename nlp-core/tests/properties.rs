//! Propriedades do pipeline verificadas com proptest.

use std::sync::OnceLock;

use nlp_core::bilou::is_valid_sequence;
use nlp_core::{Doc, Pipeline, ProcessOptions};
use proptest::prelude::*;

fn english() -> &'static Pipeline {
    static PIPELINE: OnceLock<Pipeline> = OnceLock::new();
    PIPELINE.get_or_init(|| Pipeline::english().unwrap())
}

const WORDS: &[&str] = &[
    "the", "a", "cat", "dog", "sat", "on", "mat", "John", "Smith", "lives", "in", "London", "Mr.",
    "is", "very", "quickly", "running", "2024", "don't", "well-known", "and", "it", "was", ".",
    ",", "!", "?", "(", ")", "\"", "U.S.", "New", "York", "...", "e-mail", "$5", "they're",
];

fn sentence_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 0..30).prop_map(|words| words.join(" "))
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![sentence_text(), "\\PC{0,80}", "[a-z.,!?'\\- ]{0,60}"]
}

fn check_spans(text: &str, doc: &Doc) -> Result<(), TestCaseError> {
    let mut last_end = 0;
    for token in doc.iter() {
        let (start, end) = token.span();
        prop_assert!(start < end, "empty token at {}", token.index());
        prop_assert!(start >= last_end, "overlap at {}", token.index());
        prop_assert_eq!(&text[start..end], token.text());
        last_end = end;
    }
    let covered: String = doc.iter().map(|t| t.text()).collect();
    let expected: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    prop_assert_eq!(covered, expected);
    Ok(())
}

proptest! {
    #[test]
    fn prop_spans_cover_non_whitespace(text in any_text()) {
        let doc = english().process(&text, ProcessOptions::tokenize_only()).unwrap();
        check_spans(&text, &doc)?;
    }

    #[test]
    fn prop_segmentation_is_deterministic(text in any_text()) {
        let tokenizer = english().tokenizer();
        let first: Vec<_> = tokenizer.segment(&text).iter().map(|t| t.span()).collect();
        let second: Vec<_> = tokenizer.segment(&text).iter().map(|t| t.span()).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_annotation_is_deterministic(text in sentence_text()) {
        let first = english().process(&text, ProcessOptions::default()).unwrap();
        let second = english().process(&text, ProcessOptions::default()).unwrap();
        prop_assert_eq!(first.to_view(), second.to_view());
    }

    #[test]
    fn prop_heads_form_a_forest(text in sentence_text()) {
        let doc = english().process(&text, ProcessOptions::default()).unwrap();
        let n = doc.len();
        for token in doc.iter() {
            let head = token.head();
            prop_assert!(head.is_some(), "token {} without head", token.index());
            let head = head.unwrap_or_default();
            prop_assert!(head < n);
            prop_assert_eq!(token.is_root(), head == token.index());

            // Subindo pelos heads, a raiz aparece em no máximo n passos.
            let mut current = token.index();
            let mut steps = 0;
            while doc.token(current).head() != Some(current) {
                current = doc.token(current).head().unwrap_or(current);
                steps += 1;
                prop_assert!(steps <= n, "cycle through token {}", token.index());
            }
        }
    }

    #[test]
    fn prop_entity_tags_are_valid_bilou(text in sentence_text()) {
        let doc = english().process(&text, ProcessOptions::default()).unwrap();
        let tags: Vec<_> = doc.iter().filter_map(|t| t.ent()).collect();
        prop_assert_eq!(tags.len(), doc.len());
        prop_assert!(is_valid_sequence(&tags), "{:?}", tags);
        for entity in doc.entities() {
            prop_assert!(entity.start_token < entity.end_token);
            prop_assert_eq!(&text[entity.start..entity.end], entity.text.as_str());
        }
    }

    #[test]
    fn prop_sentences_tile_the_buffer(text in any_text()) {
        let doc = english().process(&text, ProcessOptions::default()).unwrap();
        let mut next = 0;
        for sent in doc.sents() {
            prop_assert_eq!(sent.start(), next);
            prop_assert!(!sent.is_empty());
            next = sent.end();
        }
        prop_assert_eq!(next, doc.len());
        prop_assert_eq!(doc.sents().map(|s| s.len()).sum::<usize>(), doc.len());
    }

    #[test]
    fn prop_lexicon_lookup_is_idempotent(word in "\\PC{1,12}") {
        let lexicon = english().lexicon();
        let first = lexicon.lookup(&word);
        let second = lexicon.lookup(&word);
        prop_assert!(std::sync::Arc::ptr_eq(&first, &second));
        prop_assert_eq!(lexicon.id_for(&word), first.id);
    }
}
