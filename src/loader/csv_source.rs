use std::{collections::HashSet, path::Path};

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::Encoding;

use crate::{error::LoadError, log_debug};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header and records exactly as parsed. No typing has happened yet.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, records: Vec<StringRecord>) -> Self {
        RawTable { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    pub fn num_rows(&self) -> usize {
        self.records.len()
    }
}

/// Reads delimited text files with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    delimiter: u8,
    encoding: Option<&'static Encoding>,
}

impl Default for CsvSource {
    fn default() -> Self {
        CsvSource {
            delimiter: b',',
            encoding: None,
        }
    }
}

impl CsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode input with a WHATWG encoding label (e.g. `windows-1252`)
    /// instead of strict UTF-8.
    pub fn with_encoding(mut self, label: &str) -> Result<Self, LoadError> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| LoadError::Config(format!("unknown encoding label {:?}", label)))?;
        self.encoding = Some(encoding);
        Ok(self)
    }

    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<RawTable, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|error| LoadError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        log_debug!("Read {} bytes from {}", bytes.len(), path.display());
        let text = self.decode(&bytes)?;
        self.read_str(&text)
    }

    pub fn read_str(&self, text: &str) -> Result<RawTable, LoadError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = rdr.headers()?;
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(LoadError::Schema("missing header row".to_string()));
        }
        // Unnamed columns (e.g. an exported index) get a positional name.
        let headers: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if h.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    h.to_string()
                }
            })
            .collect();
        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(LoadError::Schema(format!(
                    "duplicate column name {:?} in header",
                    header
                )));
            }
        }

        let mut records = Vec::new();
        for result in rdr.records() {
            records.push(result?);
        }
        Ok(RawTable::new(headers, records))
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, LoadError> {
        match self.encoding {
            None => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| {
                    LoadError::Encoding(format!(
                        "invalid UTF-8 at byte {}; set an encoding label",
                        e.utf8_error().valid_up_to()
                    ))
                })
            }
            Some(encoding) => {
                let (text, actual, had_errors) = encoding.decode(bytes);
                if had_errors {
                    return Err(LoadError::Encoding(format!(
                        "input is not valid {}",
                        actual.name()
                    )));
                }
                Ok(text.into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_str_keeps_order() {
        let data = "museum_id,day,open,close\n8,Sunday,11:00:AM,05:00:PM\n8,Monday,11:00:AM,05:00:PM\n";
        let table = CsvSource::new().read_str(data).unwrap();
        assert_eq!(table.headers(), &["museum_id", "day", "open", "close"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(&table.records()[1][1], "Monday");
    }

    #[test]
    fn test_header_only() {
        let table = CsvSource::new().read_str("a,b\n").unwrap();
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.num_rows(), 0);
    }

    #[test]
    fn test_ragged_record_is_error() {
        let data = "a,b\n1,2\n3\n";
        let res = CsvSource::new().read_str(data);
        assert!(matches!(res, Err(LoadError::Csv(_))));
    }

    #[test]
    fn test_duplicate_header_is_error() {
        let res = CsvSource::new().read_str("id,id\n1,2\n");
        assert!(matches!(res, Err(LoadError::Schema(_))));
    }

    #[test]
    fn test_unnamed_header_gets_positional_name() {
        let table = CsvSource::new()
            .read_str(",full_name\n0,Claude Monet\n")
            .unwrap();
        assert_eq!(table.headers(), ["Unnamed: 0", "full_name"]);
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_unnamed_header_clash_is_error() {
        let res = CsvSource::new().read_str(",Unnamed: 0\n1,2\n");
        assert!(matches!(res, Err(LoadError::Schema(_))));
    }

    #[test]
    fn test_empty_input_is_error() {
        let res = CsvSource::new().read_str("");
        assert!(matches!(res, Err(LoadError::Schema(_))));
    }

    #[test]
    fn test_custom_delimiter() {
        let table = CsvSource::new()
            .with_delimiter(b'|')
            .read_str("a|b\n1|x,y\n")
            .unwrap();
        assert_eq!(&table.records()[0][1], "x,y");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = CsvSource::new().read_path(dir.path().join("canvas_size.csv"));
        assert!(matches!(res, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"\xEF\xBB\xBFwork_id,subject\n1,Portraits\n")
            .unwrap();
        let table = CsvSource::new().read_path(&path).unwrap();
        assert_eq!(table.headers()[0], "work_id");
    }

    #[test]
    fn test_latin1_requires_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artist.csv");
        // "Gérôme" in windows-1252
        std::fs::write(&path, b"artist_id,last_name\n1,G\xE9r\xF4me\n").unwrap();

        let res = CsvSource::new().read_path(&path);
        assert!(matches!(res, Err(LoadError::Encoding(_))));

        let table = CsvSource::new()
            .with_encoding("windows-1252")
            .unwrap()
            .read_path(&path)
            .unwrap();
        assert_eq!(&table.records()[0][1], "Gérôme");
    }

    #[test]
    fn test_unknown_encoding_label() {
        assert!(matches!(
            CsvSource::new().with_encoding("klingon"),
            Err(LoadError::Config(_))
        ));
    }
}
