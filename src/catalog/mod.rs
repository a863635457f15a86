mod schema;

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;

pub use schema::{ColumnDef, DataType, Schema, SchemaRef};

use crate::error::LoadError;

pub mod prelude {
    pub use super::*;
}

/// Datasets of the paintings case study, in load order.
pub const DEFAULT_DATASETS: [&str; 8] = [
    "artist",
    "canvas_size",
    "image_link",
    "museum_hours",
    "museum",
    "product_size",
    "subject",
    "work",
];

pub const CSV_EXTENSION: &str = "csv";

fn identifier_regex() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// A dataset identifier. Names both the source file and the destination table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dataset {
    name: String,
}

impl Dataset {
    pub fn new(name: &str) -> Result<Self, LoadError> {
        if !identifier_regex().is_match(name) {
            return Err(LoadError::InvalidDataset(name.to_string()));
        }
        Ok(Dataset {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// `<base_dir>/<name>.csv`
    pub fn source_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(format!("{}.{}", self.name, CSV_EXTENSION))
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered set of datasets rooted at one directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    base_dir: PathBuf,
    datasets: Vec<Dataset>,
}

impl Catalog {
    pub fn new<S: AsRef<str>>(base_dir: &Path, names: &[S]) -> Result<Self, LoadError> {
        let mut datasets: Vec<Dataset> = Vec::with_capacity(names.len());
        for name in names {
            let dataset = Dataset::new(name.as_ref())?;
            if datasets.contains(&dataset) {
                return Err(LoadError::Config(format!(
                    "dataset {:?} listed more than once",
                    dataset.name()
                )));
            }
            datasets.push(dataset);
        }
        Ok(Catalog {
            base_dir: base_dir.to_path_buf(),
            datasets,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn source_path(&self, dataset: &Dataset) -> PathBuf {
        dataset.source_path(&self.base_dir)
    }

    pub fn get_dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_source_path() {
        let catalog = Catalog::new(Path::new("/data/paintings"), &DEFAULT_DATASETS).unwrap();
        let museum = catalog.get_dataset("museum_hours").unwrap();
        assert_eq!(
            catalog.source_path(museum),
            PathBuf::from("/data/paintings/museum_hours.csv")
        );
        assert_eq!(museum.table_name(), "museum_hours");
    }

    #[test]
    fn test_default_order_is_kept() {
        let catalog = Catalog::new(Path::new("."), &DEFAULT_DATASETS).unwrap();
        let names: Vec<&str> = catalog.datasets().iter().map(|d| d.name()).collect();
        assert_eq!(names, DEFAULT_DATASETS.to_vec());
    }

    #[rstest]
    #[case("")]
    #[case("1artist")]
    #[case("artist; drop table work")]
    #[case("../etc/passwd")]
    #[case("museum-hours")]
    fn test_invalid_identifiers(#[case] name: &str) {
        assert!(matches!(
            Dataset::new(name),
            Err(LoadError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_duplicate_dataset_rejected() {
        let res = Catalog::new(Path::new("."), &["artist", "work", "artist"]);
        assert!(matches!(res, Err(LoadError::Config(_))));
    }
}
