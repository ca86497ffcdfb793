// The CSV phone catalog: loading, lookup by model and generation of a fictitious one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::phone::{self, Price};

pub const COLUMNS: [&str; 5] = ["Brand", "Series", "Model", "Launch_Year", "Price"];

/// Brands and their series used when generating a catalog.
const BRAND_SERIES: &[(&str, &[&str])] = &[
    ("Apple", &["iPhone"]),
    ("Samsung", &["Galaxy S", "Galaxy Note"]),
    ("OnePlus", &["OnePlus"]),
    ("Xiaomi", &["Redmi Note", "Mi"]),
    ("Realme", &["Realme"]),
    ("Vivo", &["V"]),
    ("Oppo", &["Oppo"]),
    ("Motorola", &["Moto"]),
    ("Poco", &["Poco"]),
    ("Nothing", &["Nothing"]),
];

const MODELS_PER_SERIES: u32 = 20;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("catalog line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub brand: String,
    pub series: String,
    pub model: String,
    pub launch_year: u16,
    pub price: Price,
}

#[derive(Debug, Default)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
    // lowercase model -> row indices
    by_model: HashMap<String, Vec<usize>>,
}

impl Catalog {
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let mut by_model: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            by_model.entry(row.model.to_lowercase()).or_default().push(idx);
        }
        Self { rows, by_model }
    }

    #[instrument]
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&content)?;
        info!(rows = catalog.len(), path = %path.display(), "Loaded phone catalog");
        Ok(catalog)
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        // Spreadsheet exports often start with a byte-order mark
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let header = match lines.next() {
            Some((_, line)) => split_csv_line(line),
            None => return Err(CatalogError::MissingColumn(COLUMNS[0])),
        };
        let mut positions = [0usize; 5];
        for (slot, column) in positions.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h.trim() == column)
                .ok_or(CatalogError::MissingColumn(column))?;
        }
        let [brand_col, series_col, model_col, year_col, price_col] = positions;

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let fields = split_csv_line(line);
            let year_raw = field(&fields, year_col, line_no)?;
            let launch_year = year_raw.parse::<u16>().map_err(|_| CatalogError::InvalidRow {
                line: line_no,
                reason: format!("invalid launch year '{}'", year_raw),
            })?;
            let price = field(&fields, price_col, line_no)?.parse::<Price>().map_err(|e| CatalogError::InvalidRow {
                line: line_no,
                reason: e.to_string(),
            })?;
            rows.push(CatalogRow {
                brand: field(&fields, brand_col, line_no)?.to_string(),
                series: field(&fields, series_col, line_no)?.to_string(),
                model: field(&fields, model_col, line_no)?.to_string(),
                launch_year,
                price,
            });
        }
        debug!(rows = rows.len(), "Parsed catalog");
        Ok(Self::from_rows(rows))
    }

    /// Rows whose model equals `model`, ignoring case and surrounding whitespace.
    pub fn find(&self, model: &str) -> Vec<&CatalogRow> {
        self.by_model
            .get(&model.trim().to_lowercase())
            .map(|idxs| idxs.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }

    /// Distinct series in first-seen order.
    pub fn series(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.series.as_str()) {
                seen.push(row.series.as_str());
            }
        }
        seen
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut out = COLUMNS.join(",");
        out.push('\n');
        for row in &self.rows {
            let fields = [
                escape_csv_field(&row.brand),
                escape_csv_field(&row.series),
                escape_csv_field(&row.model),
                row.launch_year.to_string(),
                escape_csv_field(&row.price.to_string()),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

/// Builds a fictitious catalog: twenty numbered models per series.
pub fn generate(rng: &mut dyn RngCore) -> Catalog {
    let mut rows = Vec::new();
    for (brand, series_list) in BRAND_SERIES {
        for series in series_list.iter() {
            for i in 1..=MODELS_PER_SERIES {
                rows.push(CatalogRow {
                    brand: brand.to_string(),
                    series: series.to_string(),
                    model: format!("{} {}", series, i),
                    launch_year: phone::random_launch_year(rng),
                    price: Price::random(rng),
                });
            }
        }
    }
    Catalog::from_rows(rows)
}

fn field(fields: &[String], idx: usize, line: usize) -> Result<&str, CatalogError> {
    fields
        .get(idx)
        .map(|s| s.trim())
        .ok_or_else(|| CatalogError::InvalidRow {
            line,
            reason: format!("expected at least {} fields, found {}", idx + 1, fields.len()),
        })
}

fn escape_csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => result.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    result.push(current);
    result
}
