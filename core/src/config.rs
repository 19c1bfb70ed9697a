use crate::types::Tick;
use serde::{Deserialize, Serialize};

/// Text of the clock edit dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogTextConfig {
    pub title: String,
    pub description: String,
    pub up_placeholder: String,
    pub down_placeholder: String,
}

impl Default for DialogTextConfig {
    fn default() -> Self {
        Self {
            title: "Logic Clock".into(),
            description: "Enter the number of tenths of a second you want the signal \
                          to be up (true) or down (false)"
                .into(),
            up_placeholder: "UP period".into(),
            down_placeholder: "DOWN period".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulated seconds per tick.
    pub tick_seconds: f64,
    /// Ticks between automatic snapshots. 0 disables them.
    pub snapshot_interval: Tick,
    #[serde(default)]
    pub dialog: DialogTextConfig,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/clock/clock_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;

        if !(config.tick_seconds.is_finite() && config.tick_seconds > 0.0) {
            anyhow::bail!("{path}: tick_seconds must be positive, got {}", config.tick_seconds);
        }
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// Ticks are a tenth of a second so test timelines read in periods.
    pub fn default_test() -> Self {
        Self {
            tick_seconds: 0.1,
            snapshot_interval: 0,
            dialog: DialogTextConfig::default(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 1.0 / 60.0,
            snapshot_interval: 3600,
            dialog: DialogTextConfig::default(),
        }
    }
}
