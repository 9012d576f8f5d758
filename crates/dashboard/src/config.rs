use std::env;
use std::time::Duration;

use foundation::GeoPoint;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Immutable engine configuration, handed to every component at construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    /// View center used until (or instead of) a device position.
    pub fallback_center: GeoPoint,
    pub fallback_zoom: f64,
    pub max_zoom: f64,
    /// Zoom used when the list asks the map to show one spot.
    pub spot_zoom: f64,
    /// Zoom of the static spot detail view.
    pub detail_zoom: f64,
    #[serde(rename = "flyDurationMs", deserialize_with = "millis")]
    pub fly_duration: Duration,
    #[serde(rename = "geolocationTimeoutMs", deserialize_with = "millis")]
    pub geolocation_timeout: Duration,
    /// Quiet interval before a reverse-geocode lookup is issued.
    #[serde(rename = "httpDebounceMs", deserialize_with = "millis")]
    pub http_debounce: Duration,
    /// Quiet interval absorbing pan/zoom/scroll bursts before a layout change.
    #[serde(rename = "interactionDebounceMs", deserialize_with = "millis")]
    pub interaction_debounce: Duration,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            fallback_center: GeoPoint::new(46.879966, -121.726909),
            fallback_zoom: 13.0,
            max_zoom: 20.0,
            spot_zoom: 18.0,
            detail_zoom: 16.0,
            fly_duration: Duration::from_secs(1),
            geolocation_timeout: Duration::from_secs(10),
            http_debounce: Duration::from_millis(400),
            interaction_debounce: Duration::from_millis(80),
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

impl DashboardConfig {
    /// Defaults overridden by `SPOTTED_*` environment variables.
    ///
    /// Unparseable values fall back to the default for that field; the
    /// combined result is validated like a JSON config.
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let config = Self {
            fallback_center: GeoPoint::new(
                env_var_f64("SPOTTED_FALLBACK_LAT", d.fallback_center.latitude),
                env_var_f64("SPOTTED_FALLBACK_LNG", d.fallback_center.longitude),
            ),
            fallback_zoom: env_var_f64("SPOTTED_FALLBACK_ZOOM", d.fallback_zoom),
            max_zoom: env_var_f64("SPOTTED_MAX_ZOOM", d.max_zoom),
            spot_zoom: env_var_f64("SPOTTED_SPOT_ZOOM", d.spot_zoom),
            detail_zoom: env_var_f64("SPOTTED_DETAIL_ZOOM", d.detail_zoom),
            fly_duration: env_var_millis("SPOTTED_FLY_DURATION_MS", d.fly_duration),
            geolocation_timeout: env_var_millis(
                "SPOTTED_GEOLOCATION_TIMEOUT_MS",
                d.geolocation_timeout,
            ),
            http_debounce: env_var_millis("SPOTTED_HTTP_DEBOUNCE_MS", d.http_debounce),
            interaction_debounce: env_var_millis(
                "SPOTTED_INTERACTION_DEBOUNCE_MS",
                d.interaction_debounce,
            ),
            viewport_width: env_var_f64("SPOTTED_VIEWPORT_WIDTH", d.viewport_width),
            viewport_height: env_var_f64("SPOTTED_VIEWPORT_HEIGHT", d.viewport_height),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fallback_center.is_finite() {
            return Err(ConfigError::Invalid("fallback center must be finite".into()));
        }
        if self.fallback_zoom > self.max_zoom || self.spot_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "zoom levels must not exceed max zoom {}",
                self.max_zoom
            )));
        }
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return Err(ConfigError::Invalid("viewport must be non-empty".into()));
        }
        Ok(())
    }
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
