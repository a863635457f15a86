use crate::{
    catalog::{DataType, Schema},
    error::LoadError,
};

/// SQL flavour of the target database, picked from the connection url scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, LoadError> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| LoadError::UnsupportedScheme(url.to_string()))?;
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(LoadError::UnsupportedScheme(url.to_string())),
        }
    }

    /// Upper bound on bind parameters in one statement.
    pub fn max_bind_params(&self) -> usize {
        match self {
            Dialect::Postgres => 65535,
            Dialect::Sqlite => 999,
        }
    }

    pub fn column_type(&self, data_type: &DataType) -> &'static str {
        match (self, data_type) {
            (Dialect::Postgres, DataType::Boolean) => "BOOLEAN",
            (Dialect::Postgres, DataType::Int) => "BIGINT",
            (Dialect::Postgres, DataType::Float) => "DOUBLE PRECISION",
            (Dialect::Postgres, DataType::String) => "TEXT",
            (Dialect::Sqlite, DataType::Boolean) => "INTEGER",
            (Dialect::Sqlite, DataType::Int) => "INTEGER",
            (Dialect::Sqlite, DataType::Float) => "REAL",
            (Dialect::Sqlite, DataType::String) => "TEXT",
        }
    }

    pub fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// 1-based placeholder for the n-th bound parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
        }
    }

    pub fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ident(table))
    }

    pub fn create_table_sql(&self, table: &str, schema: &Schema) -> String {
        let columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|col| {
                let mut def = format!(
                    "{} {}",
                    self.quote_ident(col.name()),
                    self.column_type(col.data_type())
                );
                if !col.is_nullable() {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        format!(
            "CREATE TABLE {} ({})",
            self.quote_ident(table),
            columns.join(", ")
        )
    }

    pub fn insert_sql(&self, table: &str, schema: &Schema, num_rows: usize) -> String {
        let columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|col| self.quote_ident(col.name()))
            .collect();
        let width = schema.len();
        let rows: Vec<String> = (0..num_rows)
            .map(|row| {
                let params: Vec<String> = (0..width)
                    .map(|col| self.placeholder(row * width + col + 1))
                    .collect();
                format!("({})", params.join(", "))
            })
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.quote_ident(table),
            columns.join(", "),
            rows.join(", ")
        )
    }

    /// Rows per INSERT for a table of `width` columns, capped by the bind limit.
    pub fn rows_per_statement(&self, width: usize, chunk_size: usize) -> usize {
        let by_params = self.max_bind_params() / width.max(1);
        chunk_size.min(by_params).max(1)
    }

    pub fn table_exists_sql(&self) -> String {
        match self {
            Dialect::Postgres => "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name::text = $1"
                .to_string(),
            Dialect::Sqlite => {
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1".to_string()
            }
        }
    }

    pub fn table_columns_sql(&self) -> String {
        match self {
            Dialect::Postgres => "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name::text = $1 \
                 ORDER BY ordinal_position"
                .to_string(),
            Dialect::Sqlite => "SELECT name FROM pragma_table_info(?1) ORDER BY cid".to_string(),
        }
    }

    pub fn row_count_sql(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote_ident(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnDef;
    use rstest::rstest;

    fn museum_schema() -> Schema {
        Schema::new(vec![
            ColumnDef::new("museum_id", DataType::Int, false),
            ColumnDef::new("name", DataType::String, false),
            ColumnDef::new("phone", DataType::String, true),
        ])
    }

    #[rstest]
    #[case("postgresql://loader@localhost/paintings", Dialect::Postgres)]
    #[case("postgres://localhost/paintings", Dialect::Postgres)]
    #[case("sqlite::memory:", Dialect::Sqlite)]
    #[case("sqlite://paintings.db?mode=rwc", Dialect::Sqlite)]
    fn test_from_url(#[case] url: &str, #[case] expected: Dialect) {
        assert_eq!(Dialect::from_url(url).unwrap(), expected);
    }

    #[rstest]
    #[case("mysql://localhost/paintings")]
    #[case("paintings.db")]
    fn test_from_url_unsupported(#[case] url: &str) {
        assert!(matches!(
            Dialect::from_url(url),
            Err(LoadError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            Dialect::Postgres.create_table_sql("museum", &museum_schema()),
            "CREATE TABLE \"museum\" (\"museum_id\" BIGINT NOT NULL, \"name\" TEXT NOT NULL, \"phone\" TEXT)"
        );
        assert_eq!(
            Dialect::Sqlite.create_table_sql("museum", &museum_schema()),
            "CREATE TABLE \"museum\" (\"museum_id\" INTEGER NOT NULL, \"name\" TEXT NOT NULL, \"phone\" TEXT)"
        );
    }

    #[rstest]
    #[case(Dialect::Postgres, "CREATE TABLE \"work\" (\"on_display\" BOOLEAN)")]
    #[case(Dialect::Sqlite, "CREATE TABLE \"work\" (\"on_display\" INTEGER)")]
    fn test_create_table_sql_boolean(#[case] dialect: Dialect, #[case] expected: &str) {
        let schema = Schema::new(vec![ColumnDef::new("on_display", DataType::Boolean, true)]);
        assert_eq!(dialect.create_table_sql("work", &schema), expected);
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            Dialect::Postgres.insert_sql("museum", &museum_schema(), 2),
            "INSERT INTO \"museum\" (\"museum_id\", \"name\", \"phone\") VALUES ($1, $2, $3), ($4, $5, $6)"
        );
        assert_eq!(
            Dialect::Sqlite.insert_sql("museum", &museum_schema(), 1),
            "INSERT INTO \"museum\" (\"museum_id\", \"name\", \"phone\") VALUES (?1, ?2, ?3)"
        );
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(Dialect::Sqlite.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_rows_per_statement() {
        assert_eq!(Dialect::Sqlite.rows_per_statement(3, 1000), 333);
        assert_eq!(Dialect::Postgres.rows_per_statement(3, 1000), 1000);
        assert_eq!(Dialect::Sqlite.rows_per_statement(2000, 1000), 1);
        assert_eq!(Dialect::Sqlite.rows_per_statement(3, 0), 1);
    }
}
