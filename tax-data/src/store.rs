use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tax_core::dataset::{DividendSchema, FederalRules, PayrollRules, ProvincialRules};
use tax_core::{Jurisdiction, PersonalTaxInput, TaxError, TaxResult, TaxYearDataset};
use tracing::info;

use crate::loader::{DatasetLoader, LoaderError};
use crate::source::DatasetSource;

/// What was loaded for a tax year, and from where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub year: i32,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub jurisdictions: Vec<Jurisdiction>,
}

#[derive(Debug, Clone)]
struct Entry {
    dataset: Arc<TaxYearDataset>,
    info: DatasetInfo,
}

/// Validated datasets keyed by tax year.
///
/// Accessors fail with [`TaxError::DatasetNotLoaded`] for a year that has
/// not been loaded. Reloading a year replaces the previous dataset;
/// calculations already holding the old `Arc` keep using it.
#[derive(Debug, Default)]
pub struct DatasetStore {
    entries: RwLock<HashMap<i32, Entry>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load, validate and store the dataset for `year`.
    ///
    /// On failure the store is left unchanged.
    pub async fn load(
        &self,
        year: i32,
        source: &dyn DatasetSource,
    ) -> Result<DatasetInfo, LoaderError> {
        let dataset = DatasetLoader::load(year, source).await?;
        Ok(self.insert(dataset, source.name()))
    }

    /// Store an already validated dataset under its own year.
    pub fn insert(
        &self,
        dataset: TaxYearDataset,
        source: impl Into<String>,
    ) -> DatasetInfo {
        let info = DatasetInfo {
            year: dataset.year(),
            source: source.into(),
            loaded_at: Utc::now(),
            jurisdictions: dataset.provinces().keys().copied().collect(),
        };

        info!(
            year = info.year,
            source = %info.source,
            jurisdictions = info.jurisdictions.len(),
            "dataset loaded"
        );

        let entry = Entry {
            dataset: Arc::new(dataset),
            info: info.clone(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.year, entry);

        info
    }

    /// Years currently loaded, ascending.
    pub fn loaded_years(&self) -> Vec<i32> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut years: Vec<i32> = entries.keys().copied().collect();
        years.sort_unstable();
        years
    }

    pub fn info(
        &self,
        year: i32,
    ) -> Result<DatasetInfo, TaxError> {
        self.entry(year).map(|entry| entry.info)
    }

    pub fn dataset(
        &self,
        year: i32,
    ) -> Result<Arc<TaxYearDataset>, TaxError> {
        self.entry(year).map(|entry| entry.dataset)
    }

    pub fn federal(
        &self,
        year: i32,
    ) -> Result<FederalRules, TaxError> {
        Ok(self.dataset(year)?.federal().clone())
    }

    pub fn provinces(
        &self,
        year: i32,
    ) -> Result<BTreeMap<Jurisdiction, ProvincialRules>, TaxError> {
        Ok(self.dataset(year)?.provinces().clone())
    }

    /// Rules for one province, by any registered spelling.
    pub fn province(
        &self,
        year: i32,
        key: &str,
    ) -> Result<ProvincialRules, TaxError> {
        self.dataset(year)?.province(key).cloned()
    }

    pub fn payroll(
        &self,
        year: i32,
    ) -> Result<PayrollRules, TaxError> {
        Ok(self.dataset(year)?.payroll().clone())
    }

    pub fn dividends(
        &self,
        year: i32,
    ) -> Result<DividendSchema, TaxError> {
        Ok(self.dataset(year)?.dividends().clone())
    }

    /// Run the engine for `input`.
    ///
    /// With `dataset_override` the stored datasets are not consulted at all;
    /// otherwise the dataset loaded for `input.year` is used.
    pub fn calculate(
        &self,
        input: &PersonalTaxInput,
        dataset_override: Option<&TaxYearDataset>,
    ) -> Result<TaxResult, TaxError> {
        match dataset_override {
            Some(dataset) => tax_core::calculate(input, dataset),
            None => {
                let dataset = self.dataset(input.year)?;
                tax_core::calculate(input, &dataset)
            }
        }
    }

    fn entry(
        &self,
        year: i32,
    ) -> Result<Entry, TaxError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&year)
            .cloned()
            .ok_or(TaxError::DatasetNotLoaded { year })
    }
}

/// Process-wide store for binaries and other non-test callers. Tests should
/// construct their own [`DatasetStore`] or pass a dataset override.
pub fn shared_store() -> &'static DatasetStore {
    static STORE: OnceLock<DatasetStore> = OnceLock::new();
    STORE.get_or_init(DatasetStore::new)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::source::{DatasetDocument, EmbeddedSource, MemorySource};

    fn employee(province: &str) -> PersonalTaxInput {
        PersonalTaxInput {
            year: 2024,
            province: province.to_string(),
            employment_income: dec!(75000),
            ..Default::default()
        }
    }

    // =========================================================================
    // accessor tests
    // =========================================================================

    #[test]
    fn accessors_fail_before_load() {
        let store = DatasetStore::new();
        let not_loaded = TaxError::DatasetNotLoaded { year: 2024 };

        assert_eq!(store.dataset(2024).unwrap_err(), not_loaded);
        assert_eq!(store.federal(2024).unwrap_err(), not_loaded);
        assert_eq!(store.provinces(2024).unwrap_err(), not_loaded);
        assert_eq!(store.province(2024, "ON").unwrap_err(), not_loaded);
        assert_eq!(store.payroll(2024).unwrap_err(), not_loaded);
        assert_eq!(store.dividends(2024).unwrap_err(), not_loaded);
        assert_eq!(store.info(2024).unwrap_err(), not_loaded);
    }

    #[test]
    fn calculate_fails_before_load() {
        let store = DatasetStore::new();

        assert_eq!(
            store.calculate(&employee("ON"), None),
            Err(TaxError::DatasetNotLoaded { year: 2024 })
        );
    }

    #[tokio::test]
    async fn load_records_info_and_serves_accessors() {
        let store = DatasetStore::new();

        let info = store.load(2024, &EmbeddedSource).await.unwrap();

        assert_eq!(info.year, 2024);
        assert_eq!(info.source, "embedded");
        assert_eq!(info.jurisdictions.len(), 8);
        assert_eq!(store.loaded_years(), vec![2024]);
        assert_eq!(store.info(2024).unwrap(), info);
        assert_eq!(
            store.province(2024, "Nouveau-Brunswick").unwrap_err(),
            TaxError::UnknownJurisdiction("Nouveau-Brunswick".to_string())
        );
        assert_eq!(
            store.province(2024, "new brunswick").unwrap().jurisdiction,
            Jurisdiction::NB
        );
        assert_eq!(store.payroll(2024).unwrap().cpp.max_contribution, dec!(3867.50));
    }

    #[tokio::test]
    async fn failed_load_leaves_store_unchanged() {
        let store = DatasetStore::new();
        let source = MemorySource::new().with_document(2024, DatasetDocument::Federal, "{}");

        assert!(store.load(2024, &source).await.is_err());

        assert!(store.loaded_years().is_empty());
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[tokio::test]
    async fn override_matches_stored_dataset() {
        let store = DatasetStore::new();
        store.load(2024, &EmbeddedSource).await.unwrap();
        let dataset = DatasetLoader::load(2024, &EmbeddedSource).await.unwrap();

        let stored = store.calculate(&employee("ON"), None).unwrap();
        let overridden = store.calculate(&employee("ON"), Some(&dataset)).unwrap();

        assert_eq!(stored, overridden);
    }

    #[tokio::test]
    async fn override_bypasses_empty_store() {
        let store = DatasetStore::new();
        let dataset = DatasetLoader::load(2024, &EmbeddedSource).await.unwrap();

        let result = store.calculate(&employee("SK"), Some(&dataset)).unwrap();

        assert!(result.totals.income_tax > rust_decimal::Decimal::ZERO);
        assert!(store.loaded_years().is_empty());
    }

    #[test]
    fn shared_store_is_a_single_instance() {
        assert!(std::ptr::eq(shared_store(), shared_store()));
    }
}
