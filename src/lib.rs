mod bulk_loader;
mod catalog;
mod config;
mod error;
mod inference;
mod loader;
pub mod logger;
mod tuple;

pub use tuple::{Field, Tuple};

pub mod prelude {
    pub use super::bulk_loader::{load_all, BulkLoader, DatasetOutcome, FailurePolicy, LoadReport};
    pub use super::catalog::prelude::*;
    pub use super::config::{LoadOpt, LoaderConfig, ENV_PREFIX};
    pub use super::error::{DatasetError, LoadError, Stage};
    pub use super::inference::{InferencePolicy, TypedTable, DEFAULT_NULL_TOKENS};
    pub use super::loader::prelude::*;
    pub use super::{Field, Tuple};
}
