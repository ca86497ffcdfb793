// Record resolution strategies: synthesize from the series table, or look up in a catalog.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;

use crate::catalog::Catalog;
use crate::phone::{self, Condition, Imei, PhoneRecord, Price};

/// Series name to brand. Order matters: the first series found in a query wins.
pub const SERIES_TABLE: &[(&str, &str)] = &[
    ("iPhone", "Apple"),
    ("Galaxy S", "Samsung"),
    ("Galaxy Note", "Samsung"),
    ("OnePlus", "OnePlus"),
    ("Redmi Note", "Xiaomi"),
    ("V", "Vivo"),
    ("Realme", "Realme"),
    ("Oppo", "Oppo"),
    ("Motorola", "Motorola"),
    ("Poco", "Poco"),
    ("Nothing", "Nothing"),
];

const FALLBACK_MODEL: &str = "Standard";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no phone found matching '{query}'")]
    NotFound { query: String },
}

pub trait PhoneRecordProvider: Send + Sync {
    fn resolve(&self, query: &str, rng: &mut dyn RngCore) -> Result<PhoneRecord, LookupError>;

    /// Series a record can be compared against.
    fn series(&self) -> Vec<&str>;

    fn name(&self) -> &'static str;
}

/// Synthesizes a record for any query. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeriesTableProvider;

impl PhoneRecordProvider for SeriesTableProvider {
    fn resolve(&self, query: &str, rng: &mut dyn RngCore) -> Result<PhoneRecord, LookupError> {
        let lowered = query.trim().to_lowercase();
        let matched = SERIES_TABLE
            .iter()
            .find(|(series, _)| lowered.contains(&series.to_lowercase()));
        let (series, make) = match matched {
            Some(entry) => *entry,
            None => {
                let picked = *SERIES_TABLE.choose(rng).unwrap_or(&SERIES_TABLE[0]);
                debug!(query, series = picked.0, "No series matched, picked one at random");
                picked
            }
        };

        let model = title_case(strip_series(&lowered, &series.to_lowercase()).trim());
        let model = if model.is_empty() {
            FALLBACK_MODEL.to_string()
        } else {
            model
        };
        let launch_year = phone::random_launch_year(rng);
        let purchased_year = phone::random_purchased_year(rng, launch_year);

        Ok(PhoneRecord {
            make: make.to_string(),
            series: series.to_string(),
            model,
            launch_year,
            purchased_year: Some(purchased_year),
            condition: Condition::random(rng),
            price: Price::random(rng),
            imei: Imei::random(rng),
        })
    }

    fn series(&self) -> Vec<&str> {
        SERIES_TABLE.iter().map(|(series, _)| *series).collect()
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

/// Exact, case-insensitive model lookup in a preloaded catalog.
#[derive(Debug, Clone)]
pub struct CatalogProvider {
    catalog: Arc<Catalog>,
}

impl CatalogProvider {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl PhoneRecordProvider for CatalogProvider {
    fn resolve(&self, query: &str, rng: &mut dyn RngCore) -> Result<PhoneRecord, LookupError> {
        let hits = self.catalog.find(query);
        let row = hits.choose(rng).ok_or_else(|| LookupError::NotFound {
            query: query.trim().to_string(),
        })?;
        debug!(query, matches = hits.len(), model = %row.model, "Catalog hit");

        Ok(PhoneRecord {
            make: row.brand.clone(),
            series: row.series.clone(),
            model: row.model.clone(),
            launch_year: row.launch_year,
            purchased_year: None,
            condition: Condition::random(rng),
            price: row.price,
            imei: Imei::random(rng),
        })
    }

    fn series(&self) -> Vec<&str> {
        self.catalog.series()
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

/// Removes the first occurrence of `series` that stands as its own word. A
/// trailing digit still counts as a boundary, so "v27" loses its "v".
fn strip_series(query: &str, series: &str) -> String {
    for (idx, _) in query.match_indices(series) {
        let end = idx + series.len();
        let before = query[..idx].chars().next_back();
        let after = query[end..].chars().next();
        if !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphabetic) {
            return format!("{}{}", &query[..idx], &query[end..]);
        }
    }
    query.to_string()
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("galaxy s 23 ultra"), "Galaxy S 23 Ultra");
        assert_eq!(title_case("15 pro"), "15 Pro");
        assert_eq!(title_case("x2t"), "X2T");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_strip_series_respects_word_boundaries() {
        assert_eq!(strip_series("vivo v27", "v"), "vivo 27");
        assert_eq!(strip_series("vivo", "v"), "vivo");
        assert_eq!(strip_series("iphone15", "iphone"), "15");
        assert_eq!(strip_series("poco poco f5", "poco"), " poco f5");
    }

    #[test]
    fn test_one_letter_series_only_strips_its_own_word() {
        let mut rng = StdRng::seed_from_u64(7);
        let record = SeriesTableProvider.resolve("vivo v27", &mut rng).unwrap();
        assert_eq!(record.make, "Vivo");
        assert_eq!(record.series, "V");
        assert_eq!(record.model, "Vivo 27");
    }

    #[test]
    fn test_iphone_maps_to_apple() {
        let mut rng = StdRng::seed_from_u64(1);
        let record = SeriesTableProvider.resolve("iPhone 15", &mut rng).unwrap();
        assert_eq!(record.series, "iPhone");
        assert_eq!(record.make, "Apple");
        assert_eq!(record.model, "15");
    }

    #[test]
    fn test_first_table_entry_wins() {
        let mut rng = StdRng::seed_from_u64(2);
        // both "redmi note" and "v" match; table order decides
        let record = SeriesTableProvider.resolve("Redmi Note V2", &mut rng).unwrap();
        assert_eq!(record.series, "Redmi Note");
        assert_eq!(record.make, "Xiaomi");
    }

    #[test]
    fn test_bare_series_gets_standard_model() {
        let mut rng = StdRng::seed_from_u64(3);
        let record = SeriesTableProvider.resolve("  ONEPLUS ", &mut rng).unwrap();
        assert_eq!(record.series, "OnePlus");
        assert_eq!(record.model, "Standard");
    }

    #[test]
    fn test_unknown_query_still_resolves() {
        let mut rng = StdRng::seed_from_u64(4);
        let record = SeriesTableProvider.resolve("zzz 42", &mut rng).unwrap();
        assert!(SERIES_TABLE.iter().any(|(series, make)| {
            record.series == *series && record.make == *make
        }));
        assert_eq!(record.model, "Zzz 42");
    }

    #[test]
    fn test_table_records_hold_invariants() {
        let queries = ["", "iphone", "Pixel 8", "galaxy note 20", "nothing phone 2", "🙂", "poco f5"];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for query in queries {
                let record = SeriesTableProvider.resolve(query, &mut rng).unwrap();
                assert_eq!(record.imei.as_str().len(), 15);
                assert!(record.imei.as_str().chars().all(|c| c.is_ascii_digit()));
                assert!(Condition::ALL.contains(&record.condition));
                let purchased = record.purchased_year.unwrap();
                assert!(phone::MIN_LAUNCH_YEAR <= record.launch_year);
                assert!(record.launch_year <= purchased && purchased <= phone::MAX_YEAR);
                assert!((phone::MIN_PRICE..=phone::MAX_PRICE).contains(&record.price.rupees()));
            }
        }
    }

    fn catalog() -> Arc<Catalog> {
        let row = |model: &str, year: u16, price: u64| CatalogRow {
            brand: "Samsung".into(),
            series: "Galaxy S".into(),
            model: model.into(),
            launch_year: year,
            price: Price(price),
        };
        Arc::new(Catalog::from_rows(vec![
            row("Galaxy S 23", 2023, 74_999),
            row("galaxy s 23", 2024, 70_000),
            row("Galaxy S 10", 2019, 20_000),
        ]))
    }

    #[test]
    fn test_catalog_lookup_keeps_row_fields() {
        let provider = CatalogProvider::new(catalog());
        let mut rng = StdRng::seed_from_u64(5);
        let record = provider.resolve("GALAXY S 10", &mut rng).unwrap();
        assert_eq!(record.model, "Galaxy S 10");
        assert_eq!(record.launch_year, 2019);
        assert_eq!(record.price, Price(20_000));
        assert_eq!(record.purchased_year, None);
        assert_eq!(record.imei.as_str().len(), 15);
    }

    #[test]
    fn test_catalog_duplicates_pick_one_of_them() {
        let provider = CatalogProvider::new(catalog());
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = provider.resolve("galaxy s 23", &mut rng).unwrap();
            assert!(record.price == Price(74_999) || record.price == Price(70_000));
        }
    }

    #[test]
    fn test_catalog_miss_is_not_found() {
        let provider = CatalogProvider::new(catalog());
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(
            provider.resolve("Nonexistent Model 9999", &mut rng),
            Err(LookupError::NotFound {
                query: "Nonexistent Model 9999".into()
            })
        );
        assert_eq!(provider.series(), vec!["Galaxy S"]);
    }
}
