//! # Estágios Preguiçosos
//!
//! Carregar um modelo é caro. Um [`LazyStage`] guarda só o *construtor* até a
//! primeira vez que o estágio é usado; depois guarda o valor construído.
//!
//! - `is_present()`: existe construtor (ou seja, existe modelo).
//! - `is_loaded()`: o construtor já rodou.
//! - `get()`: constrói na primeira chamada (uma vez só, mesmo com várias
//!   threads) e devolve a referência.

use std::sync::OnceLock;

use tracing::info;

type Constructor<T> = Box<dyn Fn() -> T + Send + Sync>;

pub struct LazyStage<T> {
    name: &'static str,
    cell: OnceLock<T>,
    constructor: Option<Constructor<T>>,
}

impl<T> LazyStage<T> {
    pub fn new(name: &'static str, constructor: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
            constructor: Some(Box::new(constructor)),
        }
    }

    /// Estágio sem modelo.
    pub fn absent(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
            constructor: None,
        }
    }

    /// Estágio já construído.
    pub fn loaded(name: &'static str, value: T) -> Self {
        Self {
            name,
            cell: OnceLock::from(value),
            constructor: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_present(&self) -> bool {
        self.constructor.is_some() || self.cell.get().is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// O estágio, construído sob demanda. `None` se não há modelo.
    pub fn get(&self) -> Option<&T> {
        if let Some(value) = self.cell.get() {
            return Some(value);
        }
        let constructor = self.constructor.as_ref()?;
        Some(self.cell.get_or_init(|| {
            info!(stage = self.name, "carregando estágio");
            constructor()
        }))
    }
}

impl<T> std::fmt::Debug for LazyStage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyStage")
            .field("name", &self.name)
            .field("present", &self.is_present())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
