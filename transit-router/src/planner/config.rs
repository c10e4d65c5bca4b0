//! Query-time configuration for the router.

use serde::{Deserialize, Serialize};

use crate::domain::NightWindow;
use crate::network::PolicyError;
use crate::stations::DEFAULT_SEARCH_WINDOW_DEG;

/// Configuration parameters for route queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Hours served by the night network.
    pub night_window: NightWindow,

    /// Half-width in degrees of the window searched for the nearest stop
    /// before falling back to a full scan.
    pub search_window_deg: f64,
}

impl RouterConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(night_window: NightWindow, search_window_deg: f64) -> Self {
        Self {
            night_window,
            search_window_deg,
        }
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let NightWindow {
            start_hour,
            end_hour,
        } = self.night_window;
        if start_hour > 23 || end_hour > 23 {
            return Err(PolicyError::NightWindow {
                start_hour,
                end_hour,
            });
        }
        if !self.search_window_deg.is_finite() || self.search_window_deg <= 0.0 {
            return Err(PolicyError::NotPositive {
                name: "search_window_deg",
                value: self.search_window_deg,
            });
        }
        Ok(())
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            night_window: NightWindow::default(),
            search_window_deg: DEFAULT_SEARCH_WINDOW_DEG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RouterConfig::default();

        assert_eq!(config.night_window, NightWindow::new(23, 5));
        assert_eq!(config.search_window_deg, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_config() {
        let config = RouterConfig::new(NightWindow::new(0, 4), 0.05);

        assert!(config.night_window.contains(3));
        assert!(!config.night_window.contains(23));
        assert_eq!(config.search_window_deg, 0.05);
    }

    #[test]
    fn invalid_config() {
        assert_eq!(
            RouterConfig::new(NightWindow::new(24, 5), 0.02).validate(),
            Err(PolicyError::NightWindow {
                start_hour: 24,
                end_hour: 5
            })
        );
        assert!(RouterConfig::new(NightWindow::default(), 0.0).validate().is_err());
        assert!(RouterConfig::new(NightWindow::default(), f64::NAN).validate().is_err());
    }
}
