use std::path::{Path, PathBuf};

use crate::models::Config;

const SAMPLE_CONFIG: &str = include_str!("../config.sample.toml");

/// Initialize logger.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            use std::io::Write;
            let level = if record.level() != log::Level::Info {
                format!("[{}] ", record.level())
            } else {
                String::new()
            };
            writeln!(
                buf,
                "{} {}:{} {}{}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                level,
                record.args()
            )
        })
        .init();
}

/// Load and merge one or more config files.
pub fn init_config(paths: &[PathBuf]) -> Config {
    let mut config: Option<Config> = None;

    for path in paths {
        log::info!("loading config: {}", path.display());
        match read_config(path) {
            Ok(c) => {
                if let Some(ref mut existing) = config {
                    // Merge configs.
                    merge_config(existing, c);
                } else {
                    config = Some(c);
                }
            }
            Err(e) => {
                log::error!("error loading config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    config.unwrap_or_else(|| {
        log::error!("no config files specified");
        std::process::exit(1);
    })
}

/// Load configuration from TOML file.
fn read_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&content)?;
    Ok(cfg)
}

/// Generate sample config file.
pub fn generate_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err("config file already exists".into());
    }
    std::fs::write(path, SAMPLE_CONFIG)?;
    Ok(())
}

/// Merge the given src config into the dest config struct.
fn merge_config(dest: &mut Config, src: Config) {
    // Merge app config.
    if !src.app.address.is_empty() {
        dest.app.address = src.app.address;
    }

    // Merge data config.
    if !src.data.admin_regions.is_empty() {
        dest.data.admin_regions = src.data.admin_regions;
    }
    if !src.data.cities.is_empty() {
        dest.data.cities = src.data.cities;
    }
    if src.data.min_population > 0 {
        dest.data.min_population = src.data.min_population;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_and_merge_config() {
        let mut base = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            base,
            "[app]\naddress = \"0.0.0.0:2345\"\n\n[data]\nadmin_regions = \"a.tsv\"\ncities = \"b.tsv\"\nmin_population = 5000"
        )
        .unwrap();

        let mut overlay = tempfile::NamedTempFile::new().unwrap();
        writeln!(overlay, "[data]\ncities = \"c.tsv\"").unwrap();

        let mut config = read_config(base.path()).unwrap();
        merge_config(&mut config, read_config(overlay.path()).unwrap());

        assert_eq!(config.app.address, "0.0.0.0:2345");
        assert_eq!(config.data.admin_regions, "a.tsv");
        assert_eq!(config.data.cities, "c.tsv");
        assert_eq!(config.data.min_population, 5000);
    }

    #[test]
    fn test_generate_config_refuses_overwrite() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(generate_config(f.path()).is_err());
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert!(!config.app.address.is_empty());
        assert_eq!(config.data.min_population, 5000);
    }
}
