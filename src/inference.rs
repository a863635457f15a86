//! Turning parsed text into typed rows.
//!
//! This step sits between reading a file and writing a table so the typing
//! policy is explicit: a column is the narrowest of `Int`, `Float`,
//! `Boolean` that every non-null value parses as, otherwise `String`.
//! Per-column overrides always win.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    catalog::{ColumnDef, DataType, Schema, SchemaRef},
    error::LoadError,
    loader::prelude::RawTable,
    tuple::{parse_bool, Field, Tuple},
};

pub const DEFAULT_NULL_TOKENS: [&str; 6] = ["NA", "N/A", "NULL", "null", "NaN", "nan"];

#[derive(Debug, Clone)]
pub struct TypedTable {
    name: String,
    schema: SchemaRef,
    tuples: Vec<Tuple>,
}

impl TypedTable {
    pub fn new(name: &str, schema: SchemaRef, tuples: Vec<Tuple>) -> Self {
        TypedTable {
            name: name.to_string(),
            schema,
            tuples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn num_rows(&self) -> usize {
        self.tuples.len()
    }
}

#[derive(Debug, Clone)]
pub struct InferencePolicy {
    enabled: bool,
    null_tokens: Vec<String>,
    // "<table>.<column>" -> type
    overrides: BTreeMap<String, DataType>,
}

impl Default for InferencePolicy {
    fn default() -> Self {
        InferencePolicy {
            enabled: true,
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
            overrides: BTreeMap::new(),
        }
    }
}

impl InferencePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every column becomes `String` unless overridden.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_null_tokens<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        self.null_tokens = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn with_override(mut self, table: &str, column: &str, data_type: DataType) -> Self {
        self.overrides
            .insert(format!("{}.{}", table, column), data_type);
        self
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, DataType>) -> Self {
        self.overrides
            .extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        self
    }

    fn is_null<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if raw.is_empty() || self.null_tokens.iter().any(|t| t == raw) {
            None
        } else {
            Some(raw)
        }
    }

    fn override_for(&self, table: &str, column: &str) -> Option<DataType> {
        self.overrides.get(&format!("{}.{}", table, column)).copied()
    }

    fn check_overrides(&self, table: &str, raw: &RawTable) -> Result<(), LoadError> {
        let prefix = format!("{}.", table);
        for key in self.overrides.keys() {
            if let Some(column) = key.strip_prefix(&prefix) {
                if !raw.headers().iter().any(|h| h == column) {
                    return Err(LoadError::Schema(format!(
                        "type override for unknown column {:?}",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn infer_column<'a, I>(&self, values: I) -> (DataType, bool)
    where
        I: Iterator<Item = &'a str>,
    {
        let mut nullable = false;
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;
        let mut seen_value = false;
        for raw in values {
            let Some(raw) = self.is_null(raw) else {
                nullable = true;
                continue;
            };
            seen_value = true;
            if all_int && raw.parse::<i64>().is_err() {
                all_int = false;
            }
            if all_float && raw.parse::<f64>().is_err() {
                all_float = false;
            }
            if all_bool && parse_bool(raw).is_none() {
                all_bool = false;
            }
        }
        let data_type = if !self.enabled || !seen_value {
            DataType::String
        } else if all_int {
            DataType::Int
        } else if all_float {
            DataType::Float
        } else if all_bool {
            DataType::Boolean
        } else {
            DataType::String
        };
        (data_type, nullable)
    }

    pub fn infer_schema(&self, table: &str, raw: &RawTable) -> Result<Schema, LoadError> {
        self.check_overrides(table, raw)?;
        let columns = raw
            .headers()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values = raw.records().iter().map(move |rec| rec.get(i).unwrap_or(""));
                let (inferred, nullable) = self.infer_column(values);
                let data_type = self.override_for(table, name).unwrap_or(inferred);
                ColumnDef::new(name, data_type, nullable)
            })
            .collect();
        Ok(Schema::new(columns))
    }

    /// Infer the schema, then convert every record under it.
    pub fn to_typed(&self, table: &str, raw: &RawTable) -> Result<TypedTable, LoadError> {
        let schema = Arc::new(self.infer_schema(table, raw)?);
        let mut tuples = Vec::with_capacity(raw.num_rows());
        for (row_idx, rec) in raw.records().iter().enumerate() {
            let mut tuple = Tuple::with_capacity(schema.len());
            for (i, col_def) in schema.columns().iter().enumerate() {
                let value = self.is_null(rec.get(i).unwrap_or(""));
                let field = Field::from_str(col_def.data_type(), value).map_err(|e| {
                    LoadError::Conversion(format!(
                        "row {}, column {:?} ({}): {}",
                        row_idx + 1,
                        col_def.name(),
                        col_def.data_type(),
                        e
                    ))
                })?;
                tuple.push(field);
            }
            tuples.push(tuple);
        }
        Ok(TypedTable::new(table, schema, tuples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::prelude::CsvSource;
    use rstest::rstest;

    fn raw(data: &str) -> RawTable {
        CsvSource::new().read_str(data).unwrap()
    }

    #[rstest]
    #[case::int(&["1", "2", "-3"], DataType::Int, false)]
    #[case::float(&["1", "2.5", "1e3"], DataType::Float, false)]
    #[case::boolean(&["true", "False", "TRUE"], DataType::Boolean, false)]
    #[case::string(&["1", "two", "3"], DataType::String, false)]
    #[case::nullable_int(&["1", "", "NA"], DataType::Int, true)]
    #[case::all_null(&["", "NULL"], DataType::String, true)]
    #[case::padded(&[" 1", "2"], DataType::String, false)]
    fn test_infer_column(
        #[case] values: &[&str],
        #[case] expected: DataType,
        #[case] nullable: bool,
    ) {
        let policy = InferencePolicy::new();
        assert_eq!(
            policy.infer_column(values.iter().copied()),
            (expected, nullable)
        );
    }

    #[test]
    fn test_to_typed() {
        let data = "size_id,width,height,label\n20,20,,\"20\"\" Long Edge\"\n2016,20,16,\"20\"\" x 16\"\"(51 cm x 41 cm)\"\n";
        let table = InferencePolicy::new()
            .to_typed("canvas_size", &raw(data))
            .unwrap();
        let schema = table.schema();
        assert_eq!(schema.column_names(), vec!["size_id", "width", "height", "label"]);
        assert_eq!(schema.get_column(0).data_type(), &DataType::Int);
        assert!(!schema.get_column(0).is_nullable());
        assert_eq!(schema.get_column(2).data_type(), &DataType::Int);
        assert!(schema.get_column(2).is_nullable());
        assert_eq!(schema.get_column(3).data_type(), &DataType::String);

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.tuples()[0].get(2), &Field::Int(None));
        assert_eq!(table.tuples()[1].get(0).as_int(), Some(2016));
        assert_eq!(
            table.tuples()[1].get(3).as_string(),
            Some("20\" x 16\"(51 cm x 41 cm)")
        );
    }

    #[test]
    fn test_override_wins() {
        let data = "work_id,name\n1,Study\n2,Nude\n";
        let table = InferencePolicy::new()
            .with_override("work", "work_id", DataType::String)
            .to_typed("work", &raw(data))
            .unwrap();
        assert_eq!(table.schema().get_column(0).data_type(), &DataType::String);
        assert_eq!(table.tuples()[0].get(0).as_string(), Some("1"));
    }

    #[test]
    fn test_override_for_other_table_is_ignored() {
        let data = "work_id,name\n1,Study\n";
        let table = InferencePolicy::new()
            .with_override("museum", "city", DataType::String)
            .to_typed("work", &raw(data))
            .unwrap();
        assert_eq!(table.schema().get_column(0).data_type(), &DataType::Int);
    }

    #[test]
    fn test_override_unknown_column() {
        let res = InferencePolicy::new()
            .with_override("work", "missing", DataType::Int)
            .to_typed("work", &raw("work_id\n1\n"));
        assert!(matches!(res, Err(LoadError::Schema(_))));
    }

    #[test]
    fn test_override_conversion_error() {
        let res = InferencePolicy::new()
            .with_override("museum", "postal", DataType::Int)
            .to_typed("museum", &raw("museum_id,postal\n1,75001\n2,W1C 1AA\n"));
        match res {
            Err(LoadError::Conversion(msg)) => {
                assert!(msg.contains("row 2"));
                assert!(msg.contains("postal"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_disabled_inference() {
        let table = InferencePolicy::new()
            .disabled()
            .to_typed("subject", &raw("work_id,subject\n1,Portraits\n"))
            .unwrap();
        for col in table.schema().columns() {
            assert_eq!(col.data_type(), &DataType::String);
        }
    }

    #[test]
    fn test_custom_null_tokens() {
        let policy = InferencePolicy::new().with_null_tokens(&["-"]);
        assert_eq!(
            policy.infer_column(["1", "-"].iter().copied()),
            (DataType::Int, true)
        );
        // "NA" is an ordinary string once the token list is replaced.
        assert_eq!(
            policy.infer_column(["1", "NA"].iter().copied()),
            (DataType::String, false)
        );
    }
}
