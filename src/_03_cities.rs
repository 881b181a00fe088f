use std::collections::HashSet;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::_02_records::{CityReference, SweepError};

/// Derive the URL-path slug the booking site expects from a city display
/// name: lowercase, accents folded to ASCII, `" - "` collapsed to `-`
/// (city/region separator), remaining spaces to `_`.
///
/// "Joao Pessoa - PB" -> "joao_pessoa-pb".
pub fn derive_slug(display_name: &str) -> String {
    deunicode::deunicode(&display_name.to_lowercase())
        .replace(" - ", "-")
        .replace(' ', "_")
}

/// One row of the reference dataset.
#[derive(Debug, Deserialize)]
struct CityRow {
    display_name: String,
    region_code: String,
}

/// Lookup table from display names to canonical slugs. Built either from the
/// reference dataset (preferred: the slug then matches what the site serves
/// regardless of caller typos) or literally from the caller-supplied names.
#[derive(Debug, Default)]
pub struct CityIndex {
    cities: Vec<CityReference>,
}

impl CityIndex {
    /// Literal mode: every queried name is its own reference.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cities = names
            .into_iter()
            .map(|name| CityReference {
                display_name: name.as_ref().to_string(),
                canonical_slug: derive_slug(name.as_ref()),
            })
            .collect();
        let index = Self { cities };
        index.warn_on_duplicates();
        index
    }

    /// Dataset mode: CSV rows of `display_name,region_code`.
    pub fn from_csv_path(path: &Path) -> Result<Self, SweepError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, SweepError> {
        let mut cities = Vec::new();
        for row in reader.deserialize() {
            let row: CityRow = row?;
            let display_name = format!("{} - {}", row.display_name.trim(), row.region_code.trim());
            cities.push(CityReference {
                canonical_slug: derive_slug(&display_name),
                display_name,
            });
        }
        let index = Self { cities };
        index.warn_on_duplicates();
        Ok(index)
    }

    /// Case-insensitive lookup. First match wins when the dataset carries
    /// duplicate display names (upstream data-quality gap, surfaced at build
    /// time by `warn_on_duplicates`).
    pub fn resolve(&self, display_name: &str) -> Option<&CityReference> {
        let wanted = display_name.to_lowercase();
        self.cities
            .iter()
            .find(|city| city.display_name.to_lowercase() == wanted)
    }

    fn warn_on_duplicates(&self) {
        let mut seen = HashSet::new();
        for city in &self.cities {
            if !seen.insert(city.display_name.to_lowercase()) {
                warn!(
                    "duplicate display name in city index: {} (first entry wins)",
                    city.display_name
                );
            }
        }
    }
}
