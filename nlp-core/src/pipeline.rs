//! # Pipeline — Orquestrador dos Estágios
//!
//! O pipeline coordena os estágios sobre um único [`Doc`] por texto:
//!
//! ```text
//! texto ─▶ Tokenizer ─▶ Doc ─▶ Tagger ─▶ Parser (arc-eager) ─▶ Entidades (BILOU) ─▶ Doc anotado
//! ```
//!
//! Cada estágio anotador é um [`LazyStage`]: o modelo só é construído quando
//! um texto realmente precisa dele.
//!
//! ## Argumentos
//!
//! [`ProcessOptions`] decide quais estágios rodam. `parse` e `entity` aceitam
//! três valores ([`StageMode`]):
//!
//! | valor    | sem `tag`                   | sem modelo        |
//! |----------|-----------------------------|-------------------|
//! | `true`   | `ArgumentIncompatibility`   | `ModelNotFound`   |
//! | `false`  | não roda                    | não roda          |
//! | `"auto"` | não roda                    | não roda          |
//!
//! Os erros de argumento aparecem **antes** de qualquer estágio rodar: um
//! pedido inválido nunca devolve documento parcialmente anotado.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arc_eager::ArcEager;
use crate::bilou::Bilou;
use crate::config::{Language, PipelineConfig};
use crate::doc::Doc;
use crate::error::{NlpError, Result, Stage};
use crate::lazy::LazyStage;
use crate::lexicon::{LexPropsFn, Lexicon};
use crate::model;
use crate::strings::StringStore;
use crate::tagger::Tagger;
use crate::tokenizer::{Tokenizer, TokenizerRules};
use crate::transition::Parser;

/// Modo de um estágio opcional.
///
/// Em JSON: `true`, `false` ou `"auto"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StageModeRepr", into = "StageModeRepr")]
pub enum StageMode {
    /// Roda; falha se não for possível.
    On,
    Off,
    /// Roda se `tag` estiver ligado e o modelo existir.
    #[default]
    Auto,
}

impl From<bool> for StageMode {
    fn from(on: bool) -> Self {
        if on {
            StageMode::On
        } else {
            StageMode::Off
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StageModeRepr {
    Flag(bool),
    Keyword(Keyword),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Keyword {
    Auto,
}

impl From<StageModeRepr> for StageMode {
    fn from(repr: StageModeRepr) -> Self {
        match repr {
            StageModeRepr::Flag(on) => StageMode::from(on),
            StageModeRepr::Keyword(Keyword::Auto) => StageMode::Auto,
        }
    }
}

impl From<StageMode> for StageModeRepr {
    fn from(mode: StageMode) -> Self {
        match mode {
            StageMode::On => StageModeRepr::Flag(true),
            StageMode::Off => StageModeRepr::Flag(false),
            StageMode::Auto => StageModeRepr::Keyword(Keyword::Auto),
        }
    }
}

/// Quais estágios rodar em [`Pipeline::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    pub tag: bool,
    pub parse: StageMode,
    pub entity: StageMode,
    pub merge_multiword: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            tag: true,
            parse: StageMode::Auto,
            entity: StageMode::Auto,
            merge_multiword: false,
        }
    }
}

impl ProcessOptions {
    /// Só tokenização.
    pub fn tokenize_only() -> Self {
        Self {
            tag: false,
            parse: StageMode::Off,
            entity: StageMode::Off,
            merge_multiword: false,
        }
    }

    pub fn with_tag(mut self, tag: bool) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_parse(mut self, parse: impl Into<StageMode>) -> Self {
        self.parse = parse.into();
        self
    }

    pub fn with_entity(mut self, entity: impl Into<StageMode>) -> Self {
        self.entity = entity.into();
        self
    }

    pub fn with_merge_multiword(mut self, merge: bool) -> Self {
        self.merge_multiword = merge;
        self
    }
}

/// Une expressões de várias palavras ("New York") depois dos estágios.
///
/// Recebe o documento anotado e devolve o documento final, que pode ter
/// menos tokens.
pub trait MultiwordMerger: Send + Sync {
    fn merge(&self, doc: Doc) -> Result<Doc>;
}

/// Estágios que vão rodar, já validados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plan {
    tag: bool,
    parse: bool,
    entity: bool,
    merge: bool,
}

/// O pipeline completo. `Send + Sync`: um pipeline atende várias threads,
/// cada texto com seu próprio [`Doc`].
pub struct Pipeline {
    strings: Arc<StringStore>,
    tokenizer: Tokenizer,
    tagger: LazyStage<Tagger>,
    parser: LazyStage<Parser<ArcEager>>,
    entity: LazyStage<Parser<Bilou>>,
    merger: Option<Box<dyn MultiwordMerger>>,
}

impl Pipeline {
    /// Inglês com os modelos heurísticos embutidos.
    pub fn english() -> Result<Self> {
        Self::from_config(PipelineConfig::english())
    }

    /// Português com os modelos heurísticos embutidos.
    pub fn portuguese() -> Result<Self> {
        Self::from_config(PipelineConfig::portuguese())
    }

    /// Só o tokenizador: nenhum estágio anotador tem modelo.
    pub fn blank(config: PipelineConfig) -> Result<Self> {
        PipelineBuilder::new(Arc::new(StringStore::new()), config.tokenizer).build()
    }

    /// Monta o pipeline a partir de uma configuração. Cada conjunto de
    /// rótulos não vazio registra o modelo embutido daquele estágio.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let strings = Arc::new(StringStore::new());
        let config = Arc::new(config);
        let mut builder = PipelineBuilder::new(Arc::clone(&strings), config.tokenizer.clone());

        if config.has_tagger() {
            let (config, strings) = (Arc::clone(&config), Arc::clone(&strings));
            builder = builder.tagger(move || model::build_tagger(&config, Arc::clone(&strings)));
        }
        if config.has_parser() {
            let (config, strings) = (Arc::clone(&config), Arc::clone(&strings));
            builder = builder.parser(move || model::build_parser(&config, Arc::clone(&strings)));
        }
        if config.has_entity() {
            let (config, strings) = (Arc::clone(&config), Arc::clone(&strings));
            builder = builder.entity(move || model::build_entity(&config, Arc::clone(&strings)));
        }
        debug!(language = config.language.name(), "pipeline configurado");
        builder.build()
    }

    pub fn for_language(language: Language) -> Result<Self> {
        match language {
            Language::English => Self::english(),
            Language::Portuguese => Self::portuguese(),
        }
    }

    pub fn strings(&self) -> &Arc<StringStore> {
        &self.strings
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        self.tokenizer.lexicon()
    }

    pub fn has_tagger(&self) -> bool {
        self.tagger.is_present()
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_present()
    }

    pub fn has_entity(&self) -> bool {
        self.entity.is_present()
    }

    /// Nomes do tag set (vazio sem tagger). Carrega o tagger se preciso.
    pub fn tag_names(&self) -> Vec<String> {
        self.tagger
            .get()
            .map(|tagger| tagger.tag_names(&self.strings))
            .unwrap_or_default()
    }

    /// Tokeniza e anota `text`.
    #[instrument(skip_all, fields(bytes = text.len()))]
    pub fn process(&self, text: &str, options: ProcessOptions) -> Result<Doc> {
        let plan = self.plan(&options)?;
        let mut doc = self.tokenizer.segment(text);
        debug!(tokens = doc.len(), "tokenização concluída");

        if plan.tag {
            if let Some(tagger) = self.tagger.get() {
                tagger.tag(&mut doc)?;
            }
        }
        if plan.parse {
            let parser = self.parser.get().ok_or(NlpError::ModelNotFound { stage: Stage::Parser })?;
            let stats = parser.parse(&mut doc)?;
            debug!(steps = stats.steps, "parser concluído");
        }
        if plan.entity {
            let entity = self.entity.get().ok_or(NlpError::ModelNotFound { stage: Stage::Entity })?;
            let stats = entity.parse(&mut doc)?;
            debug!(steps = stats.steps, entities = doc.entities().len(), "entidades concluídas");
        }
        if plan.merge {
            if let Some(merger) = &self.merger {
                doc = merger.merge(doc)?;
            }
        }
        Ok(doc)
    }

    /// Como [`Pipeline::process`], para bytes que deveriam ser UTF-8.
    pub fn process_bytes(&self, bytes: &[u8], options: ProcessOptions) -> Result<Doc> {
        let text = std::str::from_utf8(bytes).map_err(|e| NlpError::MalformedInput(e.to_string()))?;
        self.process(text, options)
    }

    /// Processa vários textos em paralelo (rayon). O resultado segue a ordem
    /// da entrada; a falha de um texto não afeta os outros.
    pub fn process_batch<S>(&self, texts: &[S], options: ProcessOptions) -> Vec<Result<Doc>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.process(text.as_ref(), options))
            .collect()
    }

    fn plan(&self, options: &ProcessOptions) -> Result<Plan> {
        for (stage, mode) in [(Stage::Parser, options.parse), (Stage::Entity, options.entity)] {
            if mode == StageMode::On && !options.tag {
                return Err(NlpError::ArgumentIncompatibility { stage });
            }
        }
        let parse = self.resolve(Stage::Parser, options.parse, options.tag)?;
        let entity = self.resolve(Stage::Entity, options.entity, options.tag)?;
        Ok(Plan {
            tag: options.tag,
            parse,
            entity,
            merge: options.merge_multiword,
        })
    }

    fn resolve(&self, stage: Stage, mode: StageMode, tag: bool) -> Result<bool> {
        let present = match stage {
            Stage::Tagger => self.has_tagger(),
            Stage::Parser => self.has_parser(),
            Stage::Entity => self.has_entity(),
        };
        match mode {
            StageMode::Off => Ok(false),
            StageMode::Auto => Ok(tag && present),
            StageMode::On if present => Ok(true),
            StageMode::On => Err(NlpError::ModelNotFound { stage }),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("tokenizer", &self.tokenizer)
            .field("tagger", &self.tagger)
            .field("parser", &self.parser)
            .field("entity", &self.entity)
            .field("merger", &self.merger.is_some())
            .finish()
    }
}

/// Montagem de um [`Pipeline`] com modelos próprios.
///
/// ```rust
/// use std::sync::Arc;
/// use nlp_core::{PipelineBuilder, PipelineConfig, StringStore};
///
/// let strings = Arc::new(StringStore::new());
/// let config = PipelineConfig::english();
/// let tagger_strings = Arc::clone(&strings);
/// let pipeline = PipelineBuilder::new(strings, config.tokenizer.clone())
///     .tagger(move || nlp_core::model::build_tagger(&config, Arc::clone(&tagger_strings)))
///     .build()
///     .unwrap();
/// assert!(pipeline.has_tagger());
/// assert!(!pipeline.has_parser());
/// ```
pub struct PipelineBuilder {
    strings: Arc<StringStore>,
    rules: TokenizerRules,
    lex_props: Option<LexPropsFn>,
    tagger: LazyStage<Tagger>,
    parser: LazyStage<Parser<ArcEager>>,
    entity: LazyStage<Parser<Bilou>>,
    merger: Option<Box<dyn MultiwordMerger>>,
}

impl PipelineBuilder {
    pub fn new(strings: Arc<StringStore>, rules: TokenizerRules) -> Self {
        Self {
            strings,
            rules,
            lex_props: None,
            tagger: LazyStage::absent("tagger"),
            parser: LazyStage::absent("parser"),
            entity: LazyStage::absent("entity"),
            merger: None,
        }
    }

    pub fn strings(&self) -> &Arc<StringStore> {
        &self.strings
    }

    /// Função de atributos lexicais para palavras novas.
    pub fn lex_props(mut self, props: LexPropsFn) -> Self {
        self.lex_props = Some(props);
        self
    }

    pub fn tagger(mut self, constructor: impl Fn() -> Tagger + Send + Sync + 'static) -> Self {
        self.tagger = LazyStage::new("tagger", constructor);
        self
    }

    pub fn parser(mut self, constructor: impl Fn() -> Parser<ArcEager> + Send + Sync + 'static) -> Self {
        self.parser = LazyStage::new("parser", constructor);
        self
    }

    pub fn entity(mut self, constructor: impl Fn() -> Parser<Bilou> + Send + Sync + 'static) -> Self {
        self.entity = LazyStage::new("entity", constructor);
        self
    }

    pub fn merger(mut self, merger: impl MultiwordMerger + 'static) -> Self {
        self.merger = Some(Box::new(merger));
        self
    }

    /// Compila as regras do tokenizador. Regex inválida ou exceção mal
    /// formada falham aqui.
    pub fn build(self) -> Result<Pipeline> {
        let lexicon = match self.lex_props {
            Some(props) => Lexicon::with_props(Arc::clone(&self.strings), props),
            None => Lexicon::new(Arc::clone(&self.strings)),
        };
        let tokenizer = Tokenizer::new(Arc::new(lexicon), &self.rules)?;
        Ok(Pipeline {
            strings: self.strings,
            tokenizer,
            tagger: self.tagger,
            parser: self.parser,
            entity: self.entity,
            merger: self.merger,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::doc::EntityTag;
    use crate::error::ErrorKind;

    fn english() -> Pipeline {
        Pipeline::english().unwrap()
    }

    #[test]
    fn test_stage_mode_json() {
        assert_eq!(serde_json::to_string(&StageMode::On).unwrap(), "true");
        assert_eq!(serde_json::to_string(&StageMode::Auto).unwrap(), "\"auto\"");
        let mode: StageMode = serde_json::from_str("false").unwrap();
        assert_eq!(mode, StageMode::Off);
        assert!(serde_json::from_str::<StageMode>("\"sometimes\"").is_err());
    }

    #[test]
    fn test_options_json_defaults() {
        let opts: ProcessOptions = serde_json::from_str(r#"{"parse": true}"#).unwrap();
        assert!(opts.tag);
        assert_eq!(opts.parse, StageMode::On);
        assert_eq!(opts.entity, StageMode::Auto);
        assert!(!opts.merge_multiword);
    }

    #[test]
    fn test_full_annotation() {
        let doc = english()
            .process("This is a sentence.", ProcessOptions::default())
            .unwrap();
        assert_eq!(doc.len(), 5);
        assert!(doc.is_tagged());
        assert!(doc.is_parsed());
        assert!(doc.has_entities());
        assert_eq!(doc.token(0).tag(), Some("DT"));
        assert_eq!(doc.token(1).tag(), Some("VBZ"));
        assert_eq!(doc.token(4).tag(), Some("."));
    }

    #[test]
    fn test_single_capital_is_not_an_entity() {
        let doc = english()
            .process("I live here.", ProcessOptions::default())
            .unwrap();
        assert_eq!(doc.token(0).tag(), Some("PRP"));
        assert_eq!(doc.token(0).ent(), Some(EntityTag::Outside));
        assert!(doc.entities().is_empty());
    }

    #[test]
    fn test_stages_are_lazy() {
        let pipeline = english();
        assert!(pipeline.has_parser());
        pipeline
            .process("Hello world", ProcessOptions::tokenize_only())
            .unwrap();
        assert!(!pipeline.tagger.is_loaded());
        assert!(!pipeline.parser.is_loaded());
        pipeline
            .process("Hello world", ProcessOptions::default().with_parse(false).with_entity(false))
            .unwrap();
        assert!(pipeline.tagger.is_loaded());
        assert!(!pipeline.parser.is_loaded());
    }

    #[test]
    fn test_parse_without_tag_is_incompatible() {
        let err = english()
            .process("Some text", ProcessOptions::default().with_tag(false).with_parse(true))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentIncompatibility);

        let err = english()
            .process("Some text", ProcessOptions::default().with_tag(false).with_entity(true))
            .unwrap_err();
        assert!(matches!(err, NlpError::ArgumentIncompatibility { stage: Stage::Entity }));
    }

    #[test]
    fn test_argument_error_comes_before_missing_model() {
        let blank = Pipeline::blank(PipelineConfig::tokenizer_only(Language::English)).unwrap();
        let err = blank
            .process("x", ProcessOptions::default().with_tag(false).with_parse(true))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentIncompatibility);
    }

    #[test]
    fn test_explicit_stage_without_model() {
        let blank = Pipeline::blank(PipelineConfig::tokenizer_only(Language::English)).unwrap();
        let err = blank
            .process("Some text", ProcessOptions::default().with_parse(true))
            .unwrap_err();
        assert!(matches!(err, NlpError::ModelNotFound { stage: Stage::Parser }));
    }

    #[test]
    fn test_entity_without_model() {
        let mut config = PipelineConfig::english();
        config.entity_types.clear();
        let pipeline = Pipeline::from_config(config).unwrap();
        assert!(!pipeline.has_entity());
        let err = pipeline
            .process("Mr. Smith lives in London.", ProcessOptions::default().with_entity(true))
            .unwrap_err();
        assert!(matches!(err, NlpError::ModelNotFound { stage: Stage::Entity }));

        let doc = pipeline
            .process("Mr. Smith lives in London.", ProcessOptions::default())
            .unwrap();
        assert!(doc.is_parsed());
        assert!(!doc.has_entities());
    }

    #[test]
    fn test_auto_skips_missing_models() {
        let blank = Pipeline::blank(PipelineConfig::tokenizer_only(Language::English)).unwrap();
        let doc = blank.process("Some text here.", ProcessOptions::default()).unwrap();
        assert_eq!(doc.len(), 4);
        assert!(!doc.is_tagged());
        assert!(!doc.is_parsed());
        assert!(blank.tag_names().is_empty());
    }

    #[test]
    fn test_auto_needs_tag() {
        let doc = english()
            .process("Some text here.", ProcessOptions::default().with_tag(false))
            .unwrap();
        assert!(!doc.is_tagged());
        assert!(!doc.is_parsed());
        assert!(!doc.has_entities());
    }

    #[test]
    fn test_malformed_bytes() {
        let err = english()
            .process_bytes(&[0x66, 0xff, 0xfe], ProcessOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        let doc = english()
            .process_bytes("olá mundo".as_bytes(), ProcessOptions::tokenize_only())
            .unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_batch_keeps_order() {
        let texts = ["One two.", "Three.", "Four five six."];
        let docs = english().process_batch(&texts, ProcessOptions::default());
        let lens: Vec<usize> = docs.into_iter().map(|d| d.unwrap().len()).collect();
        assert_eq!(lens, vec![3, 2, 4]);
    }

    #[test]
    fn test_tag_names_are_sorted() {
        let names = english().tag_names();
        assert!(names.contains(&"NNP".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    struct CountingMerger(Arc<AtomicUsize>);

    impl MultiwordMerger for CountingMerger {
        fn merge(&self, doc: Doc) -> Result<Doc> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(doc)
        }
    }

    #[test]
    fn test_merger_runs_only_when_asked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = PipelineConfig::tokenizer_only(Language::English);
        let pipeline = PipelineBuilder::new(Arc::new(StringStore::new()), config.tokenizer)
            .merger(CountingMerger(Arc::clone(&calls)))
            .build()
            .unwrap();
        pipeline.process("New York", ProcessOptions::default()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        pipeline
            .process("New York", ProcessOptions::default().with_merge_multiword(true))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_rules_fail_at_build() {
        let mut config = PipelineConfig::tokenizer_only(Language::English);
        config.tokenizer.infix = Some("([".to_string());
        let err = Pipeline::blank(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_portuguese_pipeline() {
        let pipeline = Pipeline::portuguese().unwrap();
        let doc = pipeline
            .process("O menino curou-se ontem.", ProcessOptions::default())
            .unwrap();
        let texts: Vec<&str> = doc.iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["O", "menino", "curou", "-", "se", "ontem", "."]);
        assert_eq!(doc.token(0).tag(), Some("DT"));
    }
}
