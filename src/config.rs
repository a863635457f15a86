//! Loader parameters.
//!
//! Values are layered, lowest precedence first: built-in defaults, an
//! optional TOML file, `BULK_LOAD_*` environment variables, command-line
//! flags.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    catalog::{DataType, DEFAULT_DATASETS},
    error::LoadError,
    inference::DEFAULT_NULL_TOKENS,
    loader::prelude::DEFAULT_CHUNK_SIZE,
};

pub const ENV_PREFIX: &str = "BULK_LOAD_";
pub const DEFAULT_DATA_DIR: &str = "dataset";
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/paintings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory holding `<dataset>.csv` files.
    pub data_dir: PathBuf,
    pub database_url: String,
    /// Datasets in load order. Each is also the destination table name.
    #[serde(deserialize_with = "string_or_list")]
    pub datasets: Vec<String>,
    pub delimiter: char,
    /// WHATWG encoding label. Strict UTF-8 when unset.
    pub encoding: Option<String>,
    pub chunk_size: usize,
    pub infer_types: bool,
    #[serde(deserialize_with = "string_or_list")]
    pub null_tokens: Vec<String>,
    /// `"<table>.<column>"` -> forced type.
    pub column_types: BTreeMap<String, DataType>,
    /// Attempt every dataset instead of stopping at the first failure.
    pub keep_going: bool,
    /// Compare each written table with its source after loading.
    pub verify: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            datasets: DEFAULT_DATASETS.iter().map(|d| d.to_string()).collect(),
            delimiter: ',',
            encoding: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            infer_types: true,
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
            column_types: BTreeMap::new(),
            keep_going: false,
            verify: false,
        }
    }
}

impl LoaderConfig {
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(LoaderConfig::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Defaults, then `config_file`, then the environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self, LoadError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(LoadError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
        }
        let config: LoaderConfig = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if !self.delimiter.is_ascii() {
            return Err(LoadError::Config(format!(
                "delimiter {:?} is not a single ASCII character",
                self.delimiter
            )));
        }
        if self.chunk_size == 0 {
            return Err(LoadError::Config("chunk_size must be positive".to_string()));
        }
        if self.datasets.is_empty() {
            return Err(LoadError::Config("no datasets to load".to_string()));
        }
        for key in self.column_types.keys() {
            match key.split_once('.') {
                Some((table, column)) if !table.is_empty() && !column.is_empty() => {}
                _ => {
                    return Err(LoadError::Config(format!(
                        "column type key {:?} is not of the form table.column",
                        key
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }
}

/// Accepts a list, or a comma separated string as environment variables carry.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::List(items) => items,
        StringOrList::Joined(joined) => joined
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    })
}

fn parse_column_type(s: &str) -> Result<(String, DataType), String> {
    let (column, data_type) = s
        .split_once('=')
        .ok_or_else(|| format!("expected table.column=type, got {:?}", s))?;
    Ok((column.trim().to_string(), data_type.trim().parse()?))
}

#[derive(Debug, Parser)]
#[clap(
    name = "bulk_load",
    about = "Load a directory of CSV files into database tables, replacing existing tables."
)]
pub struct LoadOpt {
    /// TOML file with loader settings.
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Directory holding <dataset>.csv files.
    #[clap(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,
    /// Target database, e.g. postgresql://user@localhost/paintings or sqlite://paintings.db
    #[clap(short = 'u', long = "database-url")]
    pub database_url: Option<String>,
    /// Comma separated datasets, in load order.
    #[clap(long = "datasets", value_delimiter = ',')]
    pub datasets: Option<Vec<String>>,
    #[clap(long = "delimiter")]
    pub delimiter: Option<char>,
    /// Encoding label of the input files, e.g. windows-1252.
    #[clap(long = "encoding")]
    pub encoding: Option<String>,
    /// Maximum rows per INSERT statement.
    #[clap(long = "chunk-size")]
    pub chunk_size: Option<usize>,
    /// Force a column type: table.column=int|float|bool|text. Repeatable.
    #[clap(long = "column-type", value_parser = parse_column_type)]
    pub column_types: Vec<(String, DataType)>,
    /// Load every column as text.
    #[clap(long = "no-infer")]
    pub no_infer: bool,
    /// Keep loading after a dataset fails.
    #[clap(long = "keep-going")]
    pub keep_going: bool,
    /// Check column names and row counts after each load.
    #[clap(long = "verify")]
    pub verify: bool,
}

impl LoadOpt {
    /// Build the effective configuration with these flags on top.
    pub fn resolve(&self) -> Result<LoaderConfig, LoadError> {
        let mut config = LoaderConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut LoaderConfig) {
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(datasets) = &self.datasets {
            config.datasets = datasets.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = Some(encoding.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        for (column, data_type) in &self.column_types {
            config.column_types.insert(column.clone(), *data_type);
        }
        if self.no_infer {
            config.infer_types = false;
        }
        if self.keep_going {
            config.keep_going = true;
        }
        if self.verify {
            config.verify = true;
        }
    }
}
