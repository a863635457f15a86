use std::fmt;

use crate::{
    catalog::{Catalog, Dataset},
    config::LoaderConfig,
    error::{DatasetError, LoadError, Stage},
    inference::{InferencePolicy, TypedTable},
    loader::prelude::{CsvSource, SqlTableWriter, TableWriter},
    log_error, log_info, log_warn,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing dataset. Later datasets are not touched.
    Abort,
    /// Attempt every dataset and report all failures at the end.
    Continue,
}

#[derive(Debug)]
pub enum DatasetOutcome {
    Loaded { rows: u64, columns: usize },
    Failed(DatasetError),
    /// Never attempted because an earlier dataset aborted the run.
    Skipped,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    outcomes: Vec<(String, DatasetOutcome)>,
}

impl LoadReport {
    pub fn outcomes(&self) -> &[(String, DatasetOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, dataset: &str) -> Option<&DatasetOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == dataset)
            .map(|(_, outcome)| outcome)
    }

    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, o)| matches!(o, DatasetOutcome::Loaded { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &DatasetError> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            DatasetOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }

    pub fn first_failure(&self) -> Option<&DatasetError> {
        self.failures().next()
    }

    pub fn loaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DatasetOutcome::Loaded { .. }))
            .count()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, outcome) in &self.outcomes {
            match outcome {
                DatasetOutcome::Loaded { rows, columns } => {
                    writeln!(f, "{:<16} loaded   {} rows, {} columns", name, rows, columns)?
                }
                DatasetOutcome::Failed(e) => {
                    writeln!(f, "{:<16} failed   {}: {}", name, e.stage, e.error)?
                }
                DatasetOutcome::Skipped => writeln!(f, "{:<16} skipped", name)?,
            }
        }
        write!(
            f,
            "{} of {} datasets loaded",
            self.loaded(),
            self.outcomes.len()
        )
    }
}

/// Everything a run needs besides the writer, checked up front.
struct LoadSettings {
    catalog: Catalog,
    source: CsvSource,
    policy: InferencePolicy,
    failure_policy: FailurePolicy,
    verify: bool,
}

impl LoadSettings {
    fn from_config(config: &LoaderConfig) -> Result<Self, LoadError> {
        config.validate()?;
        let catalog = Catalog::new(&config.data_dir, &config.datasets)?;
        let mut source = CsvSource::new().with_delimiter(config.delimiter_byte());
        if let Some(label) = &config.encoding {
            source = source.with_encoding(label)?;
        }
        let mut policy = InferencePolicy::new()
            .with_null_tokens(config.null_tokens.as_slice())
            .with_overrides(&config.column_types);
        if !config.infer_types {
            policy = policy.disabled();
        }
        let failure_policy = if config.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        };
        Ok(LoadSettings {
            catalog,
            source,
            policy,
            failure_policy,
            verify: config.verify,
        })
    }
}

/// Loads every dataset of a catalog, one after another, over one writer.
pub struct BulkLoader<W: TableWriter> {
    catalog: Catalog,
    source: CsvSource,
    policy: InferencePolicy,
    writer: W,
    failure_policy: FailurePolicy,
    verify: bool,
}

impl<W: TableWriter> BulkLoader<W> {
    pub fn new(catalog: Catalog, writer: W) -> Self {
        BulkLoader {
            catalog,
            source: CsvSource::new(),
            policy: InferencePolicy::new(),
            writer,
            failure_policy: FailurePolicy::Abort,
            verify: false,
        }
    }

    pub fn from_config(config: &LoaderConfig, writer: W) -> Result<Self, LoadError> {
        Ok(Self::from_settings(LoadSettings::from_config(config)?, writer))
    }

    fn from_settings(settings: LoadSettings, writer: W) -> Self {
        BulkLoader::new(settings.catalog, writer)
            .with_source(settings.source)
            .with_policy(settings.policy)
            .with_failure_policy(settings.failure_policy)
            .with_verify(settings.verify)
    }

    pub fn with_source(mut self, source: CsvSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_policy(mut self, policy: InferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    pub async fn run(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        let datasets = self.catalog.datasets().to_vec();
        let mut aborted = false;
        for dataset in datasets {
            if aborted {
                report
                    .outcomes
                    .push((dataset.name().to_string(), DatasetOutcome::Skipped));
                continue;
            }
            let outcome = match self.load_dataset(&dataset).await {
                Ok(table) => DatasetOutcome::Loaded {
                    rows: table.num_rows() as u64,
                    columns: table.schema().len(),
                },
                Err(e) => {
                    log_error!("{}", e);
                    if self.failure_policy == FailurePolicy::Abort {
                        aborted = true;
                    }
                    DatasetOutcome::Failed(e)
                }
            };
            report.outcomes.push((dataset.name().to_string(), outcome));
        }
        if aborted {
            log_warn!("Run aborted after {} datasets", report.loaded());
        }
        report
    }

    /// Read, type and write one dataset. Returns the table that was written.
    pub async fn load_dataset(&mut self, dataset: &Dataset) -> Result<TypedTable, DatasetError> {
        let name = dataset.name();
        let path = self.catalog.source_path(dataset);
        log_info!("Loading {} from {}", name, path.display());

        let raw = self
            .source
            .read_path(&path)
            .map_err(|e| DatasetError::new(name, Stage::Read, e))?;
        let table = self
            .policy
            .to_typed(dataset.table_name(), &raw)
            .map_err(|e| DatasetError::new(name, Stage::Infer, e))?;
        log_info!("{} {}", name, table.schema());

        let written = self
            .writer
            .replace_table(&table)
            .await
            .map_err(|e| DatasetError::new(name, Stage::Write, e))?;
        if written != table.num_rows() as u64 {
            return Err(DatasetError::new(
                name,
                Stage::Write,
                LoadError::Verification(format!(
                    "wrote {} rows, expected {}",
                    written,
                    table.num_rows()
                )),
            ));
        }

        if self.verify {
            self.verify_table(&table)
                .await
                .map_err(|e| DatasetError::new(name, Stage::Verify, e))?;
        }
        Ok(table)
    }

    async fn verify_table(&mut self, table: &TypedTable) -> Result<(), LoadError> {
        let columns = self.writer.table_columns(table.name()).await?;
        let expected = table.schema().column_names();
        if columns != expected {
            return Err(LoadError::Verification(format!(
                "columns {:?} do not match header {:?}",
                columns, expected
            )));
        }
        let rows = self.writer.row_count(table.name()).await?;
        if rows != table.num_rows() as u64 {
            return Err(LoadError::Verification(format!(
                "table has {} rows, source has {}",
                rows,
                table.num_rows()
            )));
        }
        Ok(())
    }
}

/// Connect to `config.database_url` and load every configured dataset.
pub async fn load_all(config: &LoaderConfig) -> Result<LoadReport, LoadError> {
    // Options, identifiers and the encoding label are checked before connecting.
    let settings = LoadSettings::from_config(config)?;
    let writer = SqlTableWriter::connect(&config.database_url)
        .await?
        .with_chunk_size(config.chunk_size);
    let mut loader = BulkLoader::from_settings(settings, writer);
    let report = loader.run().await;
    if let Err(e) = loader.into_writer().close().await {
        log_warn!("Failed to close connection after loading: {}", e);
    }
    Ok(report)
}
