mod csv_source;
mod dialect;
mod sql_writer;

use async_trait::async_trait;

use crate::{error::LoadError, inference::TypedTable};

pub mod prelude {
    pub use super::csv_source::{CsvSource, RawTable};
    pub use super::dialect::Dialect;
    pub use super::sql_writer::{SqlTableWriter, DEFAULT_CHUNK_SIZE};
    pub use super::TableWriter;
}

/// Destination of typed tables.
#[async_trait]
pub trait TableWriter: Send {
    /// Drop any table named `table.name()` and recreate it with exactly the
    /// rows and columns of `table`. Returns the number of rows written.
    async fn replace_table(&mut self, table: &TypedTable) -> Result<u64, LoadError>;

    async fn table_exists(&mut self, name: &str) -> Result<bool, LoadError>;

    /// Column names in table order.
    async fn table_columns(&mut self, name: &str) -> Result<Vec<String>, LoadError>;

    async fn row_count(&mut self, name: &str) -> Result<u64, LoadError>;
}
