use serde::{Deserialize, Serialize};

/// Countries included in the dataset. Everything else is dropped at load time.
pub const SUPPORTED_COUNTRIES: [&str; 2] = ["CA", "US"];

/// Default population cutoff when the config leaves it unset.
pub const DEFAULT_MIN_POPULATION: i64 = 5000;

/// A single scored city suggestion returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub score: f64,
}

/// Suggestions response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResults {
    pub suggestions: Vec<Suggestion>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataConfig {
    /// Tab-delimited admin region code table (code, name).
    #[serde(default)]
    pub admin_regions: String,

    /// Tab-delimited city table with a header row.
    #[serde(default)]
    pub cities: String,

    /// Cities below this population are excluded.
    #[serde(default)]
    pub min_population: i64,
}
