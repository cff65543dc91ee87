use std::{collections::HashMap, fs};

use serde::Deserialize;
use time::Date;

use crate::{
    analytics::{ReadingValidationRule, StatusFilter, YDomain},
    transform::{MAX_READING_DATE, MIN_READING_DATE},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Csv,
    Dat,
    Ndjson,
    Pgwire,
}

/// Dates are quoted strings (`from = "2024-01-01"`), not TOML date literals.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: Option<String>,
    #[serde(default)]
    pub meter_ids: Vec<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl SourceConfig {
    /// Inclusive range, open ends falling back to the validation window.
    pub fn date_range(&self) -> (Date, Date) {
        (
            self.from.unwrap_or(MIN_READING_DATE),
            self.to.unwrap_or(MAX_READING_DATE),
        )
    }

    /// The range to enforce on file sources, `None` when neither end is set.
    pub fn requested_range(&self) -> Option<(Date, Date)> {
        (self.from.is_some() || self.to.is_some()).then(|| self.date_range())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestDbConfig {
    pub uri: String,
    pub max_connections: u32,
}

fn default_unit() -> String {
    "kWh".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub output_path: Option<String>,
    #[serde(default = "default_unit")]
    pub default_unit: String,
    #[serde(default)]
    pub include_pending: bool,
    #[serde(default)]
    pub include_chart: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            default_unit: default_unit(),
            include_pending: false,
            include_chart: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default)]
    pub y_domain: YDomain,
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeterConfig {
    pub id: String,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub questdb: Option<QuestDbConfig>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    pub validation: Option<ReadingValidationRule>,
    #[serde(default)]
    pub meters: Vec<MeterConfig>,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path =
            env::var("ANALYTICS_CONFIG").unwrap_or_else(|_| "analytics-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {path}: {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn status_filter(&self) -> StatusFilter {
        StatusFilter {
            include_pending: self.report.include_pending,
        }
    }

    /// Units from `[[meters]]`, which take precedence over units discovered elsewhere.
    pub fn meter_units(&self) -> HashMap<String, String> {
        self.meters
            .iter()
            .map(|m| (m.id.clone(), m.unit.clone()))
            .collect()
    }
}
