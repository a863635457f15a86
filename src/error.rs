use std::{fmt, path::PathBuf};

#[derive(Debug)]
pub enum LoadError {
    Config(String),
    InvalidDataset(String),
    Io { path: PathBuf, error: std::io::Error },
    Csv(csv::Error),
    Encoding(String),
    Schema(String),
    Conversion(String),
    UnsupportedScheme(String),
    Database(sqlx::Error),
    Verification(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            LoadError::InvalidDataset(name) => write!(f, "invalid dataset identifier {:?}", name),
            LoadError::Io { path, error } => write!(f, "{}: {}", path.display(), error),
            LoadError::Csv(e) => write!(f, "{}", e),
            LoadError::Encoding(msg) => write!(f, "encoding error: {}", msg),
            LoadError::Schema(msg) => write!(f, "schema error: {}", msg),
            LoadError::Conversion(msg) => write!(f, "conversion error: {}", msg),
            LoadError::UnsupportedScheme(url) => {
                write!(f, "unsupported database url scheme in {:?}", url)
            }
            LoadError::Database(e) => write!(f, "database error: {}", e),
            LoadError::Verification(msg) => write!(f, "verification failed: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { error, .. } => Some(error),
            LoadError::Csv(e) => Some(e),
            LoadError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> LoadError {
        LoadError::Csv(err)
    }
}

impl From<sqlx::Error> for LoadError {
    fn from(err: sqlx::Error) -> LoadError {
        LoadError::Database(err)
    }
}

impl From<figment::Error> for LoadError {
    fn from(err: figment::Error) -> LoadError {
        LoadError::Config(err.to_string())
    }
}

/// Step of a single dataset load at which a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Read,
    Infer,
    Write,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Read => write!(f, "read"),
            Stage::Infer => write!(f, "infer"),
            Stage::Write => write!(f, "write"),
            Stage::Verify => write!(f, "verify"),
        }
    }
}

#[derive(Debug)]
pub struct DatasetError {
    pub dataset: String,
    pub stage: Stage,
    pub error: LoadError,
}

impl DatasetError {
    pub fn new(dataset: &str, stage: Stage, error: LoadError) -> Self {
        DatasetError {
            dataset: dataset.to_string(),
            stage,
            error,
        }
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "dataset `{}`: {} failed: {}",
            self.dataset, self.stage, self.error
        )
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
