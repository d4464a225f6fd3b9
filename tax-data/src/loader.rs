use serde::de::DeserializeOwned;
use tax_core::{RawDataset, TaxYearDataset, ValidationError};
use thiserror::Error;
use tracing::debug;

use crate::source::{DatasetDocument, DatasetSource, SourceError};

/// Errors that can occur when loading a tax-year dataset.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{document} document for {year} does not match its schema: {source}")]
    Parse {
        year: i32,
        document: DatasetDocument,
        #[source]
        source: serde_json::Error,
    },

    #[error("dataset for {year} failed validation: {source}")]
    Validation {
        year: i32,
        #[source]
        source: ValidationError,
    },
}

/// Fetches the four documents of a tax year from a [`DatasetSource`],
/// parses them and validates the result.
///
/// Nothing fetched is exposed until every document has parsed and the
/// combined dataset has passed validation.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Parse one document's JSON text into its raw type.
    pub fn parse_document<T: DeserializeOwned>(
        year: i32,
        document: DatasetDocument,
        contents: &str,
    ) -> Result<T, LoaderError> {
        serde_json::from_str(contents).map_err(|source| LoaderError::Parse {
            year,
            document,
            source,
        })
    }

    /// Fetch and parse all four documents concurrently, without validating.
    pub async fn fetch_raw(
        year: i32,
        source: &dyn DatasetSource,
    ) -> Result<RawDataset, LoaderError> {
        let (federal, provinces, payroll, dividends) = tokio::try_join!(
            fetch_document(source, year, DatasetDocument::Federal),
            fetch_document(source, year, DatasetDocument::Provinces),
            fetch_document(source, year, DatasetDocument::Payroll),
            fetch_document(source, year, DatasetDocument::Dividends),
        )?;

        Ok(RawDataset {
            federal,
            provinces,
            payroll,
            dividends,
        })
    }

    /// Fetch, parse and validate the dataset for `year`.
    pub async fn load(
        year: i32,
        source: &dyn DatasetSource,
    ) -> Result<TaxYearDataset, LoaderError> {
        let raw = Self::fetch_raw(year, source).await?;
        let dataset = TaxYearDataset::from_raw(year, raw)
            .map_err(|source| LoaderError::Validation { year, source })?;

        debug!(
            year,
            source = %source.name(),
            jurisdictions = dataset.provinces().len(),
            "dataset validated"
        );

        Ok(dataset)
    }
}

async fn fetch_document<T: DeserializeOwned>(
    source: &dyn DatasetSource,
    year: i32,
    document: DatasetDocument,
) -> Result<T, LoaderError> {
    let contents = source.fetch(year, document).await?;
    DatasetLoader::parse_document(year, document, &contents)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tax_core::Jurisdiction;
    use tax_core::dataset::raw::RawPayroll;

    use super::*;
    use crate::source::{EmbeddedSource, MemorySource};

    fn embedded_memory_source() -> MemorySource {
        let mut source = MemorySource::new();
        for document in DatasetDocument::ALL {
            let contents = EmbeddedSource::document(2024, document).unwrap();
            source.insert(2024, document, contents);
        }
        source
    }

    // =========================================================================
    // parse_document tests
    // =========================================================================

    #[test]
    fn parse_document_names_the_document() {
        let err = DatasetLoader::parse_document::<RawPayroll>(
            2024,
            DatasetDocument::Payroll,
            r#"{ "cpp": {} }"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            LoaderError::Parse {
                document: DatasetDocument::Payroll,
                ..
            }
        ));
        assert!(err.to_string().starts_with("payroll document for 2024"));
    }

    #[test]
    fn parse_document_rejects_unknown_fields() {
        let contents = EmbeddedSource::document(2024, DatasetDocument::Payroll)
            .unwrap()
            .replacen("\"cpp\"", "\"cppTypo\": {}, \"cpp\"", 1);

        let result =
            DatasetLoader::parse_document::<RawPayroll>(2024, DatasetDocument::Payroll, &contents);

        assert!(result.is_err());
    }

    // =========================================================================
    // load tests
    // =========================================================================

    #[tokio::test]
    async fn load_embedded_dataset() {
        let dataset = DatasetLoader::load(2024, &EmbeddedSource).await.unwrap();

        assert_eq!(dataset.year(), 2024);
        assert_eq!(dataset.provinces().len(), 8);
        assert!(dataset.provinces().contains_key(&Jurisdiction::NB));
        assert!(dataset.provinces().contains_key(&Jurisdiction::QC));
    }

    #[tokio::test]
    async fn load_reports_missing_document() {
        let source = MemorySource::new()
            .with_document(
                2024,
                DatasetDocument::Federal,
                EmbeddedSource::document(2024, DatasetDocument::Federal).unwrap(),
            )
            .with_document(
                2024,
                DatasetDocument::Provinces,
                EmbeddedSource::document(2024, DatasetDocument::Provinces).unwrap(),
            );

        let err = DatasetLoader::load(2024, &source).await.unwrap_err();

        assert!(matches!(err, LoaderError::Source(SourceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn load_wraps_validation_errors() {
        let provinces = EmbeddedSource::document(2024, DatasetDocument::Provinces)
            .unwrap()
            .replacen("\"rate\": 0.0505", "\"rate\": 1.5", 1);
        let source = embedded_memory_source().with_document(
            2024,
            DatasetDocument::Provinces,
            provinces,
        );

        let err = DatasetLoader::load(2024, &source).await.unwrap_err();

        let LoaderError::Validation { year, source } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(year, 2024);
        assert_eq!(source.path(), "provinces.ON.brackets[0].rate");
    }

    #[tokio::test]
    async fn load_rejects_document_for_another_year() {
        let payroll = EmbeddedSource::document(2024, DatasetDocument::Payroll)
            .unwrap()
            .replacen("\"year\": 2024", "\"year\": 2023", 1);
        let source =
            embedded_memory_source().with_document(2024, DatasetDocument::Payroll, payroll);

        let err = DatasetLoader::load(2024, &source).await.unwrap_err();

        assert!(matches!(
            err,
            LoaderError::Validation {
                source: ValidationError::YearMismatch { .. },
                ..
            }
        ));
    }
}
