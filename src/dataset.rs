use std::{collections::HashMap, path::Path};

use crate::loader::{self, AdminRegionIndex, LoadError, RawCityRecord};
use crate::models::{DataConfig, DEFAULT_MIN_POPULATION, SUPPORTED_COUNTRIES};

/// A city held for the lifetime of the process. Created once at
/// initialization, immutable thereafter; restart to reload.
#[derive(Debug, Clone)]
pub struct City {
    /// Display name, possibly disambiguated with the finer admin region,
    /// eg: "Fairwood (King County), WA, United States".
    pub name: String,
    pub ascii_name: String,
    pub alt_names: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub population: i64,

    /// Folded name variants (base name + ascii + alternates) baked in at
    /// build time so queries never re-fold candidate text.
    pub search_keys: Vec<String>,
}

/// The immutable, deduplicated city collection queried at runtime.
#[derive(Debug, Default)]
pub struct Dataset {
    cities: Vec<City>,
}

impl Dataset {
    /// Build the dataset from the two source tables. One-shot and blocking;
    /// any load error is fatal and no partial data is kept.
    pub fn initialize(config: &DataConfig) -> Result<Dataset, LoadError> {
        let regions = loader::load_admin_regions(Path::new(&config.admin_regions))?;
        let records = loader::load_cities(Path::new(&config.cities))?;

        let min_population = if config.min_population > 0 {
            config.min_population
        } else {
            DEFAULT_MIN_POPULATION
        };

        let total = records.len();

        // Inclusion filters, in order: supported country, then population.
        let records: Vec<RawCityRecord> = records
            .into_iter()
            .filter(|r| SUPPORTED_COUNTRIES.contains(&r.country.as_str()))
            .filter(|r| r.population >= min_population)
            .collect();

        let cities = disambiguate(records, &regions);

        log::info!(
            "dataset ready: {} cities ({} raw records, min population {})",
            cities.len(),
            total,
            min_population
        );

        Ok(Dataset { cities })
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// Resolve display names for records that collide on (name, admin1, country).
/// Colliding records are renamed with their finer admin region when that
/// makes them unique; records that stay indistinguishable are dropped so the
/// dataset never emits two identical display names.
fn disambiguate(records: Vec<RawCityRecord>, regions: &AdminRegionIndex) -> Vec<City> {
    // Group record indexes by the colliding key, preserving input order.
    let mut groups: HashMap<(String, String, String), Vec<usize>> = HashMap::new();
    for (i, r) in records.iter().enumerate() {
        groups
            .entry((r.name.clone(), r.admin1.clone(), r.country.clone()))
            .or_default()
            .push(i);
    }

    // Decide a display name (or a drop) per record.
    let mut names: Vec<Option<String>> = vec![None; records.len()];

    for indexes in groups.values() {
        if indexes.len() == 1 {
            let r = &records[indexes[0]];
            names[indexes[0]] = Some(display_name(r, None));
            continue;
        }

        // Count finer-region names within the group; only members with a
        // unique, resolvable region name can be told apart.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for &i in indexes {
            let r = &records[i];
            if let Some(region) = regions.get(&r.country, &r.admin1, &r.admin2) {
                *counts.entry(region).or_insert(0) += 1;
            }
        }

        for &i in indexes {
            let r = &records[i];
            match regions.get(&r.country, &r.admin1, &r.admin2) {
                Some(region) if counts.get(region) == Some(&1) => {
                    names[i] = Some(display_name(r, Some(region)));
                }
                _ => {
                    log::warn!(
                        "dropping ambiguous city '{}' ({}.{}.{})",
                        r.name,
                        r.country,
                        r.admin1,
                        r.admin2
                    );
                }
            }
        }
    }

    records
        .into_iter()
        .zip(names)
        .filter_map(|(r, name)| name.map(|name| build_city(r, name)))
        .collect()
}

fn build_city(r: RawCityRecord, name: String) -> City {
    let mut search_keys = Vec::with_capacity(2 + r.alt_names.len());
    search_keys.push(fold(&r.name));
    let ascii = fold(&r.ascii_name);
    if !ascii.is_empty() && !search_keys.contains(&ascii) {
        search_keys.push(ascii);
    }
    for alt in &r.alt_names {
        let key = fold(alt);
        if !key.is_empty() && !search_keys.contains(&key) {
            search_keys.push(key);
        }
    }

    City {
        name,
        ascii_name: r.ascii_name,
        alt_names: r.alt_names,
        latitude: r.latitude,
        longitude: r.longitude,
        country: r.country,
        population: r.population,
        search_keys,
    }
}

fn display_name(r: &RawCityRecord, region: Option<&str>) -> String {
    let admin1 = admin1_label(&r.country, &r.admin1);
    let country = country_name(&r.country);
    match region {
        Some(region) => format!("{} ({}), {}, {}", r.name, region, admin1, country),
        None => format!("{}, {}, {}", r.name, admin1, country),
    }
}

/// Fold text for matching: strip diacritics, lowercase, normalize spacing.
pub fn fold(s: &str) -> String {
    deunicode::deunicode(s)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn country_name(code: &str) -> &'static str {
    match code {
        "CA" => "Canada",
        "US" => "United States",
        _ => "",
    }
}

/// US admin1 codes are postal abbreviations already; Canadian ones are
/// numeric in the source data and map to province/territory abbreviations.
fn admin1_label<'a>(country: &str, admin1: &'a str) -> &'a str {
    if country != "CA" {
        return admin1;
    }
    match admin1 {
        "01" => "AB",
        "02" => "BC",
        "03" => "MB",
        "04" => "NB",
        "05" => "NL",
        "07" => "NS",
        "08" => "ON",
        "09" => "PE",
        "10" => "QC",
        "11" => "SK",
        "12" => "YT",
        "13" => "NT",
        "14" => "NU",
        other => other,
    }
}
