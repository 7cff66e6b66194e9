use std::{collections::HashMap, path::Path};

/// Columns the city table must carry. Everything else in a row is ignored.
const REQUIRED_COLUMNS: [&str; 9] = [
    "name", "ascii", "alt_name", "lat", "long", "country", "admin1", "admin2", "population",
];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

/// One row of the raw city table, typed and validated at parse time.
/// Consumed once by the dataset builder; carries no business rules.
#[derive(Debug, Clone)]
pub struct RawCityRecord {
    pub name: String,
    pub ascii_name: String,
    pub alt_names: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub admin1: String,
    pub admin2: String,
    pub population: i64,
}

/// Read-only map from (country, admin1, admin2) codes to a human readable
/// region name (eg: a county). Used solely to disambiguate display names.
#[derive(Debug, Default)]
pub struct AdminRegionIndex {
    regions: HashMap<String, String>,
}

impl AdminRegionIndex {
    pub fn get(&self, country: &str, admin1: &str, admin2: &str) -> Option<&str> {
        self.regions
            .get(&format!("{}.{}.{}", country, admin1, admin2))
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Load the admin region code table. No header; the first column is a
/// dotted COUNTRY.ADMIN1.ADMIN2 code and the second the region name.
pub fn load_admin_regions(path: &Path) -> Result<AdminRegionIndex, LoadError> {
    let file = std::fs::File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(file);

    let mut regions = HashMap::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let line = i + 1;

        let code = record.get(0).unwrap_or("").trim();
        let name = record.get(1).unwrap_or("").trim();

        if code.split('.').count() != 3 {
            return Err(LoadError::Validation(format!(
                "line {}: region code '{}' should have the form COUNTRY.ADMIN1.ADMIN2",
                line, code
            )));
        }
        if name.is_empty() {
            return Err(LoadError::Validation(format!(
                "line {}: missing region name",
                line
            )));
        }

        regions.insert(code.to_string(), name.to_string());
    }

    Ok(AdminRegionIndex { regions })
}

/// Load the raw city table. Tab-delimited with a header row; a missing
/// required column or an unparseable numeric field aborts the load.
pub fn load_cities(path: &Path) -> Result<Vec<RawCityRecord>, LoadError> {
    let file = std::fs::File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(file);

    // Map required column names to their positions from the header row.
    let headers = reader.headers()?.clone();
    let mut cols: HashMap<&str, usize> = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        cols.insert(h.trim(), i);
    }
    for name in REQUIRED_COLUMNS {
        if !cols.contains_key(name) {
            return Err(LoadError::Validation(format!(
                "city table is missing the '{}' column",
                name
            )));
        }
    }

    let mut out = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let line = i + 2; // 1-based, after the header.

        let get = |name: &str| {
            cols.get(name)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let name = get("name");
        if name.is_empty() {
            return Err(LoadError::Validation(format!(
                "line {}: empty city name",
                line
            )));
        }

        out.push(RawCityRecord {
            name,
            ascii_name: get("ascii"),
            alt_names: split_alt_names(&get("alt_name")),
            latitude: parse_f64(&get("lat"), line, "lat")?,
            longitude: parse_f64(&get("long"), line, "long")?,
            country: get("country"),
            admin1: get("admin1"),
            admin2: get("admin2"),
            population: parse_population(&get("population"), line)?,
        });
    }

    Ok(out)
}

fn parse_f64(s: &str, line: usize, col: &str) -> Result<f64, LoadError> {
    s.parse::<f64>().map_err(|_| {
        LoadError::Validation(format!("line {}: invalid number '{}' in '{}'", line, s, col))
    })
}

/// Empty population is common in the source data; it parses as 0 so the
/// population filter drops the row.
fn parse_population(s: &str, line: usize) -> Result<i64, LoadError> {
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<i64>().map_err(|_| {
        LoadError::Validation(format!(
            "line {}: invalid number '{}' in 'population'",
            line, s
        ))
    })
}

fn split_alt_names(s: &str) -> Vec<String> {
    s.split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
    }

    #[test]
    fn test_load_admin_regions() {
        let idx = load_admin_regions(&fixture("admin2_codes.tsv")).unwrap();
        assert_eq!(idx.get("US", "WA", "033"), Some("King County"));
        assert_eq!(idx.get("US", "WA", "063"), Some("Spokane County"));
        assert_eq!(idx.get("US", "WA", "000"), None);
        assert!(idx.len() >= 2);
    }

    #[test]
    fn test_load_cities() {
        let rows = load_cities(&fixture("cities_canada-usa.tsv")).unwrap();
        assert!(!rows.is_empty());

        let ny = rows
            .iter()
            .find(|r| r.name == "New York City")
            .expect("New York City row");
        assert_eq!(ny.country, "US");
        assert_eq!(ny.admin1, "NY");
        assert!((ny.latitude - 40.71427).abs() < 1e-6);
        assert!((ny.longitude - -74.00597).abs() < 1e-6);
        assert!(ny.population > 1_000_000);

        let mtl = rows
            .iter()
            .find(|r| r.name == "Montréal")
            .expect("Montréal row");
        assert_eq!(mtl.ascii_name, "Montreal");
        assert!(mtl.alt_names.iter().any(|a| a == "Montreal"));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        // No 'population' column.
        writeln!(f, "id\tname\tascii\talt_name\tlat\tlong\tcountry\tadmin1\tadmin2").unwrap();
        writeln!(f, "1\tFoo\tFoo\t\t10.0\t20.0\tUS\tNY\t061").unwrap();

        let err = load_cities(f.path()).unwrap_err();
        match err {
            LoadError::Validation(msg) => assert!(msg.contains("population")),
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "id\tname\tascii\talt_name\tlat\tlong\tcountry\tadmin1\tadmin2\tpopulation"
        )
        .unwrap();
        writeln!(f, "1\tFoo\tFoo\t\tnot-a-number\t20.0\tUS\tNY\t061\t9999").unwrap();

        let err = load_cities(f.path()).unwrap_err();
        match err {
            LoadError::Validation(msg) => {
                assert!(msg.contains("line 2"));
                assert!(msg.contains("lat"));
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_fatal() {
        assert!(load_cities(Path::new("/nonexistent/cities.tsv")).is_err());
    }

    #[test]
    fn test_bad_region_code_is_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "US.WA\tKing County").unwrap();

        let err = load_admin_regions(f.path()).unwrap_err();
        assert!(matches!(err, LoadError::Validation(_)));
    }
}
