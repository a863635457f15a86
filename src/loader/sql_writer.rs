use async_trait::async_trait;
use sqlx::{any::install_default_drivers, Any, AnyConnection, Connection};

use super::{dialect::Dialect, TableWriter};
use crate::{error::LoadError, inference::TypedTable, log_debug, log_info, tuple::Field};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Writes tables over a single connection. The engine is chosen by the
/// url scheme (`postgres://`, `postgresql://`, `sqlite:`).
pub struct SqlTableWriter {
    conn: AnyConnection,
    dialect: Dialect,
    chunk_size: usize,
}

impl SqlTableWriter {
    pub async fn connect(url: &str) -> Result<Self, LoadError> {
        // Reject unknown schemes before touching the network.
        let dialect = Dialect::from_url(url)?;
        install_default_drivers();
        let conn = AnyConnection::connect(url).await?;
        log_info!("Connected to {:?} database", dialect);
        Ok(SqlTableWriter {
            conn,
            dialect,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn connection(&mut self) -> &mut AnyConnection {
        &mut self.conn
    }

    pub async fn close(self) -> Result<(), LoadError> {
        self.conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl TableWriter for SqlTableWriter {
    async fn replace_table(&mut self, table: &TypedTable) -> Result<u64, LoadError> {
        let name = table.name();
        let schema = table.schema();
        let drop_sql = self.dialect.drop_table_sql(name);
        let create_sql = self.dialect.create_table_sql(name, schema);
        let rows_per_statement = self
            .dialect
            .rows_per_statement(schema.len(), self.chunk_size);

        // Dropped on error without commit, which rolls everything back.
        let mut tx = self.conn.begin().await?;
        log_debug!("{}", drop_sql);
        sqlx::query::<Any>(&drop_sql)
            .persistent(false)
            .execute(&mut *tx)
            .await?;
        log_debug!("{}", create_sql);
        sqlx::query::<Any>(&create_sql)
            .persistent(false)
            .execute(&mut *tx)
            .await?;

        let mut written = 0;
        for chunk in table.tuples().chunks(rows_per_statement) {
            let insert_sql = self.dialect.insert_sql(name, schema, chunk.len());
            let mut query = sqlx::query::<Any>(&insert_sql).persistent(false);
            for tuple in chunk {
                for field in tuple.fields() {
                    query = match field {
                        Field::Boolean(val) => query.bind(*val),
                        Field::Int(val) => query.bind(*val),
                        Field::Float(val) => query.bind(*val),
                        Field::String(val) => query.bind(val.as_deref()),
                    };
                }
            }
            written += query.execute(&mut *tx).await?.rows_affected();
            log_debug!("Inserted {} rows into {}", written, name);
        }
        tx.commit().await?;
        log_info!("Replaced table {} with {} rows", name, written);
        Ok(written)
    }

    async fn table_exists(&mut self, name: &str) -> Result<bool, LoadError> {
        let sql = self.dialect.table_exists_sql();
        let count = sqlx::query_scalar::<Any, i64>(&sql)
            .bind(name)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn table_columns(&mut self, name: &str) -> Result<Vec<String>, LoadError> {
        let sql = self.dialect.table_columns_sql();
        let columns = sqlx::query_scalar::<Any, String>(&sql)
            .bind(name)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(columns)
    }

    async fn row_count(&mut self, name: &str) -> Result<u64, LoadError> {
        let sql = self.dialect.row_count_sql(name);
        let count = sqlx::query_scalar::<Any, i64>(&sql)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count.max(0) as u64)
    }
}
