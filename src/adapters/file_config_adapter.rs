//! INI file configuration adapter.

use crate::domain::error::TrendcastError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendcastError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TrendcastError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
path = /srv/market
symbol = 2330.TW

[forecast]
horizon = 7
model = polynomial
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("/srv/market".to_string())
        );
        assert_eq!(
            adapter.get_string("data", "symbol"),
            Some("2330.TW".to_string())
        );
        assert_eq!(
            adapter.get_string("forecast", "model"),
            Some("polynomial".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]\npath = x\n").unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[forecast]\nhorizon = 5\ndegree = abc\n").unwrap();
        assert_eq!(adapter.get_int("forecast", "horizon", 7), 5);
        assert_eq!(adapter.get_int("forecast", "missing", 42), 42);
        assert_eq!(adapter.get_int("forecast", "degree", 3), 3);
    }

    #[test]
    fn get_usize_rejects_negative_values() {
        let adapter =
            FileConfigAdapter::from_string("[forecast]\nhorizon = -4\nband_window = 30\n")
                .unwrap();
        assert_eq!(adapter.get_usize("forecast", "horizon", 7), 7);
        assert_eq!(adapter.get_usize("forecast", "band_window", 20), 30);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(
            "[calibration]\nthreshold_pct = 2.5\n[forecast]\nweight_floor = nope\n",
        )
        .unwrap();
        assert_eq!(adapter.get_double("calibration", "threshold_pct", 5.0), 2.5);
        assert_eq!(adapter.get_double("calibration", "missing", 9.9), 9.9);
        assert_eq!(adapter.get_double("forecast", "weight_floor", 0.1), 0.1);
    }

    #[test]
    fn get_bool_parses_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[forecast]\na = true\nb = yes\nc = 1\nd = off\ne = no\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("forecast", "a", false));
        assert!(adapter.get_bool("forecast", "b", false));
        assert!(adapter.get_bool("forecast", "c", false));
        assert!(!adapter.get_bool("forecast", "d", true));
        assert!(!adapter.get_bool("forecast", "e", true));
        assert!(adapter.get_bool("forecast", "f", true));
        assert!(!adapter.get_bool("forecast", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\npath = /tmp/bars\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("/tmp/bars".to_string())
        );
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/trendcast.ini").unwrap_err();
        assert!(matches!(err, TrendcastError::ConfigParse { .. }));
        assert_eq!(err.exit_status(), 2);
    }
}
