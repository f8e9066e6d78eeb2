//! # Configuração do Pipeline
//!
//! Tudo que define um pipeline sem ser modelo treinado: regras do tokenizador,
//! tag set, rótulos de dependência e tipos de entidade. Serializa em JSON.
//!
//! ```json
//! {
//!   "language": "english",
//!   "tokenizer": { "exceptions": {}, "prefix": "[(\"]", "suffix": "[).,]", "infix": "-" },
//!   "tag_names": ["DT", "NN", "VBZ", "."],
//!   "dep_labels": ["det", "nsubj"],
//!   "entity_types": ["PERSON"]
//! }
//! ```
//!
//! Um conjunto de rótulos vazio significa "sem modelo" para aquele estágio.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lang;
use crate::model;
use crate::tokenizer::TokenizerRules;

/// Idioma dos modelos heurísticos embutidos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Portuguese,
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Portuguese => "portuguese",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tokenizer: TokenizerRules,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub dep_labels: Vec<String>,
    #[serde(default)]
    pub entity_types: Vec<String>,
}

impl PipelineConfig {
    /// Inglês completo: tokenizador, tagger, parser e entidades.
    pub fn english() -> Self {
        Self {
            language: Language::English,
            tokenizer: lang::english_rules(),
            tag_names: to_strings(model::PTB_TAGS),
            dep_labels: to_strings(model::DEP_LABELS),
            entity_types: to_strings(model::EN_ENTITY_TYPES),
        }
    }

    /// Português: tokenizador, tagger, parser e as categorias PER/ORG/LOC/MISC.
    pub fn portuguese() -> Self {
        Self {
            language: Language::Portuguese,
            tokenizer: lang::portuguese_rules(),
            tag_names: to_strings(model::PTB_TAGS),
            dep_labels: to_strings(model::DEP_LABELS),
            entity_types: to_strings(model::PT_ENTITY_TYPES),
        }
    }

    /// Só o tokenizador, com as regras do idioma.
    pub fn tokenizer_only(language: Language) -> Self {
        let tokenizer = match language {
            Language::English => lang::english_rules(),
            Language::Portuguese => lang::portuguese_rules(),
        };
        Self {
            language,
            tokenizer,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(serde_json::Error::io)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn has_tagger(&self) -> bool {
        !self.tag_names.is_empty()
    }

    pub fn has_parser(&self) -> bool {
        !self.dep_labels.is_empty()
    }

    pub fn has_entity(&self) -> bool {
        !self.entity_types.is_empty()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
