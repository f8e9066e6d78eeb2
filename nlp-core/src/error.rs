//! # Erros do Pipeline
//!
//! Todos os erros do crate passam por [`NlpError`]. As variantes se dividem em
//! dois grupos:
//!
//! - **Erros do chamador**: combinação de argumentos inválida
//!   ([`NlpError::ArgumentIncompatibility`]), estágio pedido sem modelo
//!   ([`NlpError::ModelNotFound`]) e entrada que não é texto
//!   ([`NlpError::MalformedInput`]).
//! - **Erros de configuração**: regex inválida, exceção de tokenização que não
//!   reconstrói o chunk original, JSON malformado. Aparecem na construção do
//!   pipeline, nunca durante a segmentação.
//!
//! [`NlpError::InvalidTransition`] é especial: indica um defeito no sistema de
//! transições ou no scorer. Aborta apenas o documento atual.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Estágio anotador do pipeline (usado nas mensagens de erro e nos logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Tagger,
    Parser,
    Entity,
}

impl Stage {
    /// Nome do argumento correspondente em [`crate::ProcessOptions`].
    pub fn option_name(&self) -> &'static str {
        match self {
            Stage::Tagger => "tag",
            Stage::Parser => "parse",
            Stage::Entity => "entity",
        }
    }

    fn purpose(&self) -> &'static str {
        match self {
            Stage::Tagger => "a etiquetagem",
            Stage::Parser => "a análise sintática",
            Stage::Entity => "o reconhecimento de entidades",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_name())
    }
}

/// Categoria de um [`NlpError`], para quem precisa decidir o tratamento
/// (ex: o servidor web escolhendo o status HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ArgumentIncompatibility,
    ModelNotFound,
    InvalidTransition,
    MalformedInput,
    Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum NlpError {
    /// Combinação de estágios logicamente impossível (ex: `parse=true` com `tag=false`).
    #[error(
        "argumentos incompatíveis: tag=false, {stage}=true; {} precisa das tags gramaticais",
        stage.purpose()
    )]
    ArgumentIncompatibility { stage: Stage },

    /// Estágio pedido explicitamente (`=true`) sem modelo registrado.
    #[error("recebido {stage}=true, mas o modelo de {stage} não foi encontrado")]
    ModelNotFound { stage: Stage },

    /// Ação fora do conjunto legal. Defeito interno, não recuperável pelo chamador.
    #[error("transição inválida `{action}` em {system}: {reason}")]
    InvalidTransition {
        system: &'static str,
        action: String,
        reason: String,
    },

    #[error("entrada malformada: {0}")]
    MalformedInput(String),

    #[error("padrão de {rule} inválido: {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("exceção de tokenização inválida para `{chunk}`: as peças {pieces:?} não o reconstroem")]
    InvalidException { chunk: String, pieces: Vec<String> },

    #[error("configuração inválida: {0}")]
    Config(#[from] serde_json::Error),

    #[error("head {head} fora do intervalo para o token {token} num buffer de {len} tokens")]
    HeadOutOfRange { token: usize, head: usize, len: usize },

    #[error("índice de token {index} fora do intervalo num buffer de {len} tokens")]
    TokenOutOfRange { index: usize, len: usize },
}

impl NlpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NlpError::ArgumentIncompatibility { .. } => ErrorKind::ArgumentIncompatibility,
            NlpError::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            NlpError::InvalidTransition { .. }
            | NlpError::HeadOutOfRange { .. }
            | NlpError::TokenOutOfRange { .. } => ErrorKind::InvalidTransition,
            NlpError::MalformedInput(_) => ErrorKind::MalformedInput,
            NlpError::InvalidPattern { .. }
            | NlpError::InvalidException { .. }
            | NlpError::Config(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn invalid_transition(
        system: &'static str,
        action: impl fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        NlpError::InvalidTransition {
            system,
            action: format!("{action:?}"),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NlpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_message_names_stage() {
        let err = NlpError::ArgumentIncompatibility { stage: Stage::Parser };
        let msg = err.to_string();
        assert!(msg.contains("parse=true"));
        assert!(msg.contains("a análise sintática"));
    }

    #[test]
    fn test_model_message_names_option() {
        let err = NlpError::ModelNotFound { stage: Stage::Entity };
        assert_eq!(
            err.to_string(),
            "recebido entity=true, mas o modelo de entity não foi encontrado"
        );
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        let arg = NlpError::ArgumentIncompatibility { stage: Stage::Entity };
        let missing = NlpError::ModelNotFound { stage: Stage::Entity };
        assert_eq!(arg.kind(), ErrorKind::ArgumentIncompatibility);
        assert_eq!(missing.kind(), ErrorKind::ModelNotFound);
        assert_ne!(arg.kind(), missing.kind());
    }
}
