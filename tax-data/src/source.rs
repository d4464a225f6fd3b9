//! Where dataset documents come from.
//!
//! A [`DatasetSource`] hands back the raw text of one document for one tax
//! year. It knows nothing about the document's schema; parsing and
//! validation happen in [`crate::DatasetLoader`].
//!
//! | Source              | Backing                                        |
//! |---------------------|------------------------------------------------|
//! | [`DirectorySource`] | `<root>/<year>/<document>.json` on disk        |
//! | [`EmbeddedSource`]  | documents compiled into the binary             |
//! | [`MemorySource`]    | documents supplied programmatically            |

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// The four documents making up a tax year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetDocument {
    Federal,
    Provinces,
    Payroll,
    Dividends,
}

impl DatasetDocument {
    pub const ALL: [DatasetDocument; 4] = [
        Self::Federal,
        Self::Provinces,
        Self::Payroll,
        Self::Dividends,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Federal => "federal",
            Self::Provinces => "provinces",
            Self::Payroll => "payroll",
            Self::Dividends => "dividends",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Federal => "federal.json",
            Self::Provinces => "provinces.json",
            Self::Payroll => "payroll.json",
            Self::Dividends => "dividends.json",
        }
    }
}

impl fmt::Display for DatasetDocument {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} has no {document} document for {year}")]
    NotFound {
        source_name: String,
        year: i32,
        document: DatasetDocument,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One way of obtaining dataset documents.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Human-readable description, recorded with every loaded dataset.
    fn name(&self) -> String;

    /// Raw contents of `document` for `year`.
    async fn fetch(
        &self,
        year: i32,
        document: DatasetDocument,
    ) -> Result<String, SourceError>;
}

/// Reads `<root>/<year>/<document>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(
        &self,
        year: i32,
        document: DatasetDocument,
    ) -> PathBuf {
        self.root.join(year.to_string()).join(document.file_name())
    }
}

#[async_trait]
impl DatasetSource for DirectorySource {
    fn name(&self) -> String {
        format!("directory {}", self.root.display())
    }

    async fn fetch(
        &self,
        year: i32,
        document: DatasetDocument,
    ) -> Result<String, SourceError> {
        let path = self.path_for(year, document);
        debug!(path = %path.display(), "reading dataset document");

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(SourceError::NotFound {
                source_name: self.name(),
                year,
                document,
            }),
            Err(source) => Err(SourceError::Io { path, source }),
        }
    }
}

const EMBEDDED: &[(i32, DatasetDocument, &str)] = &[
    (
        2024,
        DatasetDocument::Federal,
        include_str!("../data/2024/federal.json"),
    ),
    (
        2024,
        DatasetDocument::Provinces,
        include_str!("../data/2024/provinces.json"),
    ),
    (
        2024,
        DatasetDocument::Payroll,
        include_str!("../data/2024/payroll.json"),
    ),
    (
        2024,
        DatasetDocument::Dividends,
        include_str!("../data/2024/dividends.json"),
    ),
];

/// Documents bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl EmbeddedSource {
    /// Most recent tax year shipped with the crate.
    pub const LATEST_YEAR: i32 = 2024;

    /// Every tax year with at least one bundled document, ascending.
    pub fn years() -> Vec<i32> {
        let mut years: Vec<i32> = EMBEDDED.iter().map(|(year, _, _)| *year).collect();
        years.dedup();
        years
    }

    pub fn document(
        year: i32,
        document: DatasetDocument,
    ) -> Option<&'static str> {
        EMBEDDED
            .iter()
            .find(|(y, d, _)| *y == year && *d == document)
            .map(|(_, _, contents)| *contents)
    }
}

#[async_trait]
impl DatasetSource for EmbeddedSource {
    fn name(&self) -> String {
        "embedded".to_string()
    }

    async fn fetch(
        &self,
        year: i32,
        document: DatasetDocument,
    ) -> Result<String, SourceError> {
        Self::document(year, document)
            .map(str::to_string)
            .ok_or_else(|| SourceError::NotFound {
                source_name: self.name(),
                year,
                document,
            })
    }
}

/// Documents held in memory, for tests and for callers that fetch the
/// documents themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<(i32, DatasetDocument), String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        year: i32,
        document: DatasetDocument,
        contents: impl Into<String>,
    ) {
        self.documents.insert((year, document), contents.into());
    }

    pub fn with_document(
        mut self,
        year: i32,
        document: DatasetDocument,
        contents: impl Into<String>,
    ) -> Self {
        self.insert(year, document, contents);
        self
    }
}

#[async_trait]
impl DatasetSource for MemorySource {
    fn name(&self) -> String {
        "memory".to_string()
    }

    async fn fetch(
        &self,
        year: i32,
        document: DatasetDocument,
    ) -> Result<String, SourceError> {
        self.documents
            .get(&(year, document))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                source_name: self.name(),
                year,
                document,
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // =========================================================================
    // DirectorySource tests
    // =========================================================================

    #[tokio::test]
    async fn directory_source_reads_year_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2024")).unwrap();
        std::fs::write(dir.path().join("2024").join("payroll.json"), "{}").unwrap();
        let source = DirectorySource::new(dir.path());

        let contents = source.fetch(2024, DatasetDocument::Payroll).await.unwrap();

        assert_eq!(contents, "{}");
    }

    #[tokio::test]
    async fn directory_source_reports_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());

        let err = source.fetch(2024, DatasetDocument::Federal).await.unwrap_err();

        assert!(matches!(
            err,
            SourceError::NotFound {
                year: 2024,
                document: DatasetDocument::Federal,
                ..
            }
        ));
    }

    // =========================================================================
    // EmbeddedSource tests
    // =========================================================================

    #[test]
    fn embedded_source_ships_every_document_for_latest_year() {
        for document in DatasetDocument::ALL {
            assert!(
                EmbeddedSource::document(EmbeddedSource::LATEST_YEAR, document).is_some(),
                "missing {document}"
            );
        }
        assert_eq!(EmbeddedSource::years(), vec![EmbeddedSource::LATEST_YEAR]);
    }

    #[tokio::test]
    async fn embedded_source_rejects_unknown_year() {
        let err = EmbeddedSource.fetch(1999, DatasetDocument::Payroll).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "embedded has no payroll document for 1999"
        );
    }

    // =========================================================================
    // MemorySource tests
    // =========================================================================

    #[tokio::test]
    async fn memory_source_returns_inserted_documents() {
        let source = MemorySource::new().with_document(2024, DatasetDocument::Dividends, "{}");

        assert_eq!(
            source.fetch(2024, DatasetDocument::Dividends).await.unwrap(),
            "{}"
        );
        assert!(source.fetch(2025, DatasetDocument::Dividends).await.is_err());
    }
}
