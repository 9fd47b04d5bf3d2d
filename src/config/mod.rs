use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::model::{MonthSlot, ScanWindow};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_airport_code, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_required_field, validate_url, Validate,
};

pub const DEFAULT_ENDPOINT: &str = "https://www.alaskaair.com/search/calendar";

// The award calendar only renders for a desktop browser profile
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardsConfig {
    pub pipeline: PipelineInfo,
    pub search: SearchConfig,
    pub window: WindowConfig,
    pub airports: Vec<AirportConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Fixture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub destination: String,
    pub source: Option<SourceKind>,
    pub endpoint: Option<String>,
    pub fixture_dir: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub politeness_delay_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub debug_capture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub months: Vec<MonthSlot>,
}

/// One origin airport and the points ceiling for its routes. Array order in
/// the TOML file is output row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportConfig {
    pub code: String,
    pub max_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub filename: Option<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl AwardsConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` placeholders with environment values; unset
    /// variables are left as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_airport_code("search.destination", &self.search.destination)?;

        match self.source_kind() {
            SourceKind::Http => validate_url("search.endpoint", self.endpoint())?,
            SourceKind::Fixture => {
                let dir = validate_required_field("search.fixture_dir", &self.search.fixture_dir)?;
                validate_path("search.fixture_dir", dir)?;
            }
        }

        if self.airports.is_empty() {
            return Err(EtlError::ConfigValidationError {
                field: "airports".to_string(),
                message: "At least one origin airport is required".to_string(),
            });
        }
        for (index, airport) in self.airports.iter().enumerate() {
            let field = format!("airports[{}].code", index);
            validate_airport_code(&field, &airport.code)?;
            validate_positive_number(
                &format!("airports[{}].max_points", index),
                airport.max_points as usize,
                1,
            )?;
            if airport.code == self.search.destination {
                return Err(EtlError::InvalidConfigValueError {
                    field,
                    value: airport.code.clone(),
                    reason: "Origin airport cannot equal the destination".to_string(),
                });
            }
            if self.airports[..index].iter().any(|a| a.code == airport.code) {
                return Err(EtlError::InvalidConfigValueError {
                    field,
                    value: airport.code.clone(),
                    reason: "Duplicate airport code".to_string(),
                });
            }
        }

        if self.window.months.is_empty() {
            return Err(EtlError::ConfigValidationError {
                field: "window.months".to_string(),
                message: "The scan window must contain at least one month".to_string(),
            });
        }
        for (index, slot) in self.window.months.iter().enumerate() {
            validate_range(
                &format!("window.months[{}].month", index),
                slot.month,
                1,
                12,
            )?;
        }

        validate_path("load.output_path", &self.load.output_path)?;
        if let Some(compression) = &self.load.compression {
            if compression.enabled {
                validate_non_empty_string("load.compression.filename", &compression.filename)?;
            }
        }

        Ok(())
    }

    pub fn destination(&self) -> &str {
        &self.search.destination
    }

    pub fn source_kind(&self) -> SourceKind {
        self.search.source.unwrap_or(SourceKind::Http)
    }

    pub fn endpoint(&self) -> &str {
        self.search.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn fixture_dir(&self) -> Option<&str> {
        self.search.fixture_dir.as_deref()
    }

    pub fn user_agent(&self) -> &str {
        self.search
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_seconds.unwrap_or(60))
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.search.politeness_delay_ms.unwrap_or(1000))
    }

    pub fn debug_capture(&self) -> Option<&str> {
        self.search.debug_capture.as_deref()
    }

    pub fn scan_window(&self) -> Result<ScanWindow> {
        ScanWindow::new(self.window.months.clone())
    }

    pub fn airports(&self) -> &[AirportConfig] {
        &self.airports
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }

    pub fn output_filename(&self) -> String {
        match &self.load.filename {
            Some(name) => name.clone(),
            None => format!("award_calendar_{}.csv", self.search.destination),
        }
    }

    /// Zip bundle filename, when compression is switched on.
    pub fn compression_filename(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for AwardsConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC_CONFIG: &str = r#"
[pipeline]
name = "award-scan"
description = "Award calendar scan"
version = "1.0.0"

[search]
destination = "PHX"

[window]
months = [{ year = 2026, month = 3 }, { year = 2026, month = 4 }]

[[airports]]
code = "DEN"
max_points = 4500

[[airports]]
code = "AUS"
max_points = 7500

[load]
output_path = "./output"
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = AwardsConfig::from_toml_str(BASIC_CONFIG).unwrap();

        assert_eq!(config.destination(), "PHX");
        assert_eq!(config.source_kind(), SourceKind::Http);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.airports().len(), 2);
        assert_eq!(config.airports()[0].code, "DEN");
        assert_eq!(config.airports()[0].max_points, 4500);
        assert_eq!(config.output_filename(), "award_calendar_PHX.csv");
        assert_eq!(config.scan_window().unwrap().len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_airport_order_is_preserved() {
        let config = AwardsConfig::from_toml_str(BASIC_CONFIG).unwrap();
        let codes: Vec<&str> = config.airports().iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["DEN", "AUS"]);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_AWARD_OUTPUT", "/tmp/awards");

        let toml_content = BASIC_CONFIG.replace("./output", "${TEST_AWARD_OUTPUT}");
        let config = AwardsConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.output_path(), "/tmp/awards");

        std::env::remove_var("TEST_AWARD_OUTPUT");
    }

    #[test]
    fn test_invalid_destination_rejected() {
        let toml_content = BASIC_CONFIG.replace("\"PHX\"", "\"Phoenix\"");
        let config = AwardsConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_month_rejected() {
        let toml_content = BASIC_CONFIG.replace("month = 4", "month = 13");
        let config = AwardsConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_airport_rejected() {
        let toml_content = BASIC_CONFIG.replace("\"AUS\"", "\"DEN\"");
        let config = AwardsConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixture_source_requires_directory() {
        let toml_content = BASIC_CONFIG.replace(
            "destination = \"PHX\"",
            "destination = \"PHX\"\nsource = \"fixture\"",
        );
        let config = AwardsConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = toml_content.replace(
            "source = \"fixture\"",
            "source = \"fixture\"\nfixture_dir = \"./fixtures\"",
        );
        let config = AwardsConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC_CONFIG.as_bytes()).unwrap();

        let config = AwardsConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "award-scan");
    }
}
