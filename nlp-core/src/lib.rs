//! # nlp-core — Motor de Anotação Linguística
//!
//! Este crate transforma texto bruto em tokens anotados: atributos lexicais,
//! classes gramaticais, árvore de dependências e entidades nomeadas.
//!
//! ## Arquitetura do Sistema
//!
//! Um único buffer de tokens ([`Doc`]) atravessa uma cadeia de preditores
//! gulosos, e cada estágio anota o buffer no lugar:
//!
//! 1.  **Tokenização** ([`tokenizer`]): regras de prefixo, sufixo, infixo e
//!     exceções, consultando o [`lexicon`] compartilhado.
//! 2.  **Tagging** ([`tagger`]): uma tag por token, da esquerda para a direita.
//! 3.  **Parsing** ([`arc_eager`]): árvore de dependências por transições.
//! 4.  **Entidades** ([`bilou`]): tags BILOU pelo mesmo motor de transições.
//!
//! Parser e reconhecedor de entidades compartilham o laço guloso de
//! [`transition`]; só o sistema de transição muda.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use nlp_core::{Pipeline, ProcessOptions};
//!
//! // 1. Pipeline inglês com os modelos embutidos
//! let pipeline = Pipeline::english().unwrap();
//!
//! // 2. Anota o texto (tag, parse e entidades em modo "auto")
//! let doc = pipeline
//!     .process("This is a sentence. This is another one.", ProcessOptions::default())
//!     .unwrap();
//!
//! // 3. Percorre frases e tokens
//! for sent in doc.sents() {
//!     for token in sent.tokens() {
//!         println!("{} {:?} -> {:?}", token.text(), token.tag(), token.head());
//!     }
//! }
//! assert_eq!(doc.sents().count(), 2);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: orquestrador, argumentos e carregamento preguiçoso.
//! - [`doc`]: o buffer de tokens e suas visões (frases, entidades).
//! - [`config`]: configuração em JSON.
//! - [`model`]: pesos heurísticos embutidos.

pub mod arc_eager;
pub mod bilou;
pub mod config;
pub mod doc;
pub mod error;
pub mod features;
pub mod lang;
pub mod lazy;
pub mod lexicon;
pub mod model;
pub mod orth;
pub mod pipeline;
pub mod scorer;
pub mod strings;
pub mod tagger;
pub mod tokenizer;
pub mod transition;

pub use config::{Language, PipelineConfig};
pub use doc::{Doc, DocView, EntitySpan, EntityTag, Span, TokenRef};
pub use error::{ErrorKind, NlpError, Result, Stage};
pub use lexicon::{Lexeme, Lexicon};
pub use pipeline::{MultiwordMerger, Pipeline, PipelineBuilder, ProcessOptions, StageMode};
pub use strings::{StringStore, Symbol};
pub use tagger::{Pos, Tagger};
pub use tokenizer::{ExceptionPiece, Tokenizer, TokenizerRules};
pub use transition::{DecodeStats, Parser, TransitionSystem};
