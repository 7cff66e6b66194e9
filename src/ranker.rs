use std::{cmp::Ordering, sync::Arc};

use crate::dataset::{fold, City, Dataset};
use crate::models::Suggestion;

/// Weight of the textual score vs the proximity boost when a location is
/// supplied. Proximity only refines ranking among textually relevant
/// candidates; a textual gap above GEO_WEIGHT can never be inverted.
const TEXT_WEIGHT: f64 = 0.8;
const GEO_WEIGHT: f64 = 0.2;

/// Distance (km) at which the proximity boost decays to 1/e.
const PROXIMITY_DECAY_KM: f64 = 1000.0;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, thiserror::Error)]
pub enum RankError {
    #[error("ranking failed: {0}")]
    Internal(String),
}

/// Scoring abstraction consumed by the HTTP boundary. Injectable so failure
/// scenarios are driven by substituting an implementation.
pub trait Ranker: Send + Sync {
    /// Score every candidate against the query and return the sorted,
    /// filtered list. The location, when present, has already been
    /// range-checked by the caller.
    fn suggest(
        &self,
        query: &str,
        location: Option<(f64, f64)>,
    ) -> Result<Vec<Suggestion>, RankError>;
}

/// Production ranker: a linear scan over the shared immutable dataset.
/// Queries are pure and lock-free; the dataset is small enough that a full
/// scan per query is fine.
pub struct ScanRanker {
    dataset: Arc<Dataset>,
}

impl ScanRanker {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }
}

impl Ranker for ScanRanker {
    fn suggest(
        &self,
        query: &str,
        location: Option<(f64, f64)>,
    ) -> Result<Vec<Suggestion>, RankError> {
        let q = fold(query);
        let q_tokens = tokenize(&q);
        if q.is_empty() || q_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut out: Vec<Suggestion> = Vec::new();

        for city in self.dataset.cities() {
            let text = text_score(&q, &q_tokens, city);
            if text <= 0.0 {
                continue;
            }

            let score = match location {
                Some((lat, lon)) => {
                    let d = haversine_km(lat, lon, city.latitude, city.longitude);
                    TEXT_WEIGHT * text + GEO_WEIGHT * (-d / PROXIMITY_DECAY_KM).exp()
                }
                None => text,
            };

            out.push(Suggestion {
                name: city.name.clone(),
                latitude: city.latitude,
                longitude: city.longitude,
                score,
            });
        }

        // Best first; ties break on name so results are deterministic.
        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(out)
    }
}

/// Textual relevance in [0, 1]: the best tier reached by any of the
/// candidate's folded search keys.
///
/// Tier ranges are disjoint by construction: an exact match (1.0) always
/// beats a whole-string prefix match (0.5..=0.9), which always beats a
/// per-token prefix match (0.2..=0.45).
fn text_score(q: &str, q_tokens: &[&str], city: &City) -> f64 {
    let mut best = 0.0f64;

    for key in &city.search_keys {
        if key == q {
            return 1.0;
        }

        if key.starts_with(q) {
            let coverage = q.chars().count() as f64 / key.chars().count() as f64;
            best = best.max(0.5 + 0.4 * coverage);
            continue;
        }

        // Multi-word names: every query token must prefix some key token
        // ("york" matches "new york city", ranked below "york" itself).
        let key_tokens = tokenize(key);
        if q_tokens
            .iter()
            .all(|qt| key_tokens.iter().any(|kt| kt.starts_with(qt)))
        {
            let q_len: usize = q_tokens.iter().map(|t| t.chars().count()).sum();
            let k_len: usize = key_tokens.iter().map(|t| t.chars().count()).sum();
            let coverage = q_len as f64 / k_len.max(1) as f64;
            best = best.max(0.2 + 0.25 * coverage.min(1.0));
        }
    }

    best
}

/// Split folded text into word tokens on anything non-alphanumeric.
fn tokenize(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Great-circle distance between two coordinates, in kilometers.
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataConfig;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn ranker() -> ScanRanker {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");
        let config = DataConfig {
            admin_regions: root.join("admin2_codes.tsv").to_string_lossy().to_string(),
            cities: root
                .join("cities_canada-usa.tsv")
                .to_string_lossy()
                .to_string(),
            min_population: 0,
        };
        ScanRanker::new(Arc::new(Dataset::initialize(&config).unwrap()))
    }

    #[test]
    fn test_matches_any_word_of_multi_word_names() {
        let results = ranker().suggest("York", None).unwrap();
        assert!(results
            .iter()
            .any(|s| s.name == "New York City, NY, United States"));
    }

    #[test]
    fn test_exact_match_beats_partial_match() {
        let results = ranker().suggest("York", None).unwrap();
        let york = results
            .iter()
            .find(|s| s.name.starts_with("York,"))
            .expect("York");
        let new_york = results
            .iter()
            .find(|s| s.name.starts_with("New York City"))
            .expect("New York City");
        assert!(york.score > new_york.score);
    }

    #[test]
    fn test_location_improves_score() {
        let r = ranker();
        // New York City is at 40.71427, -74.00597.
        let afar = r.suggest("New York City", Some((0.0, 0.0))).unwrap();
        let near = r.suggest("New York City", Some((40.0, -74.0))).unwrap();
        assert_eq!(afar.len(), 1);
        assert_eq!(near.len(), 1);
        assert!(near[0].score > afar[0].score);
    }

    #[test]
    fn test_scores_within_unit_range() {
        let r = ranker();
        for query in ["spring", "new", "montreal", "york"] {
            for location in [None, Some((45.0, -73.0))] {
                let results = r.suggest(query, location).unwrap();
                assert!(!results.is_empty(), "no results for '{}'", query);
                for s in results {
                    assert!(s.score > 0.0 && s.score <= 1.0, "score {}", s.score);
                }
            }
        }
    }

    #[test]
    fn test_no_overlap_yields_empty() {
        let q = "SomeRandomCityInTheMiddleOfNowhere";
        assert!(ranker().suggest(q, None).unwrap().is_empty());
        // Geography alone never surfaces a candidate.
        assert!(ranker()
            .suggest(q, Some((45.0, -73.0)))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_diacritic_insensitive_match() {
        let results = ranker().suggest("Montreal", None).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().any(|s| s.name.contains("Montréal")));
    }

    #[test]
    fn test_punctuation_only_query_yields_empty() {
        assert!(ranker().suggest("...", None).unwrap().is_empty());
    }

    #[test]
    fn test_ties_break_on_name() {
        let results = ranker().suggest("Spring", None).unwrap();
        let pairs: Vec<_> = results.windows(2).collect();
        for w in pairs {
            if (w[0].score - w[1].score).abs() < f64::EPSILON {
                assert!(w[0].name < w[1].name);
            }
        }
    }

    #[test]
    fn test_haversine() {
        // Montréal to New York City is roughly 533 km.
        let d = haversine_km(45.50884, -73.58781, 40.71427, -74.00597);
        assert_relative_eq!(d, 533.0, max_relative = 0.01);
        assert_relative_eq!(haversine_km(40.0, -74.0, 40.0, -74.0), 0.0);
    }
}
