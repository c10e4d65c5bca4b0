//! Build-time policy: edge costs and line classification.
//!
//! All thresholds and penalties are configuration. The defaults reproduce
//! the behaviour the router was tuned against.

use serde::{Deserialize, Serialize};

use crate::domain::{Line, LineMode, normalize_line_name};
use crate::walkable::TransferPolicy;

/// A policy or router setting that cannot be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("{name} must be a non-negative number, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("metro travel weight ({metro}) must be below bus travel weight ({bus})")]
    MetroNotCheaper { metro: f64, bus: f64 },

    #[error("night window hours must be 0-23, got {start_hour}-{end_hour}")]
    NightWindow { start_hour: u32, end_hour: u32 },
}

/// Costs for one vehicle mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeCosts {
    /// Algorithmic weight of riding one hop.
    pub travel_weight: f64,
    /// Real minutes of riding one hop.
    pub travel_minutes: f64,
    /// Algorithmic penalty for boarding.
    pub board_weight: f64,
    /// Expected wait, in minutes.
    pub board_minutes: f64,
}

/// Edge costs for every edge kind the builder creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPolicy {
    pub metro: ModeCosts,
    pub bus: ModeCosts,
    pub alight_weight: f64,
    pub alight_minutes: f64,
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            metro: ModeCosts {
                travel_weight: 0.5,
                travel_minutes: 2.5,
                board_weight: 5.0,
                board_minutes: 5.0,
            },
            bus: ModeCosts {
                travel_weight: 2.0,
                travel_minutes: 4.0,
                board_weight: 15.0,
                board_minutes: 10.0,
            },
            alight_weight: 0.0,
            alight_minutes: 0.5,
        }
    }
}

impl CostPolicy {
    /// Costs for a mode.
    pub fn for_mode(&self, mode: LineMode) -> &ModeCosts {
        match mode {
            LineMode::Metro => &self.metro,
            LineMode::Bus => &self.bus,
        }
    }

    /// Check that the policy is usable.
    ///
    /// Every cost must be finite and non-negative, and riding the metro
    /// must weigh strictly less than riding a bus.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let all = [
            ("metro.travel_weight", self.metro.travel_weight),
            ("metro.travel_minutes", self.metro.travel_minutes),
            ("metro.board_weight", self.metro.board_weight),
            ("metro.board_minutes", self.metro.board_minutes),
            ("bus.travel_weight", self.bus.travel_weight),
            ("bus.travel_minutes", self.bus.travel_minutes),
            ("bus.board_weight", self.bus.board_weight),
            ("bus.board_minutes", self.bus.board_minutes),
            ("alight_weight", self.alight_weight),
            ("alight_minutes", self.alight_minutes),
        ];
        for (name, value) in all {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::Negative { name, value });
            }
        }
        if self.metro.travel_weight >= self.bus.travel_weight {
            return Err(PolicyError::MetroNotCheaper {
                metro: self.metro.travel_weight,
                bus: self.bus.travel_weight,
            });
        }
        Ok(())
    }
}

/// Rules for classifying lines by their short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePolicy {
    /// Short-name prefixes of metro lines.
    pub metro_prefixes: Vec<String>,
    /// Metro lines named explicitly.
    pub metro_lines: Vec<String>,
    /// Short-name prefixes of night-only lines.
    pub night_prefixes: Vec<String>,
    /// Lines that run through the night as well as by day.
    pub all_night_lines: Vec<String>,
}

impl Default for LinePolicy {
    fn default() -> Self {
        Self {
            metro_prefixes: vec!["M".into()],
            metro_lines: ["M1", "M2", "M3", "M4", "M5"].map(String::from).to_vec(),
            night_prefixes: vec!["N".into()],
            all_night_lines: vec!["783".into()],
        }
    }
}

impl LinePolicy {
    /// Classify a route short name into a [`Line`].
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::LineMode;
    /// use transit_router::network::LinePolicy;
    ///
    /// let policy = LinePolicy::default();
    /// assert_eq!(policy.classify("m2").mode, LineMode::Metro);
    /// assert!(policy.classify("N101").night_only);
    /// assert!(policy.classify("783").all_night);
    /// assert_eq!(policy.classify("104").mode, LineMode::Bus);
    /// ```
    pub fn classify(&self, short_name: &str) -> Line {
        let name = normalize_line_name(short_name);
        let metro = has_prefix(&name, &self.metro_prefixes) || listed(&name, &self.metro_lines);
        Line {
            mode: if metro { LineMode::Metro } else { LineMode::Bus },
            night_only: has_prefix(&name, &self.night_prefixes),
            all_night: listed(&name, &self.all_night_lines),
            name,
        }
    }
}

fn has_prefix(name: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .map(|p| normalize_line_name(p))
        .any(|p| !p.is_empty() && name.starts_with(&p))
}

fn listed(name: &str, lines: &[String]) -> bool {
    lines.iter().any(|l| normalize_line_name(l) == name)
}

/// Everything the graph builder needs besides the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildPolicy {
    pub costs: CostPolicy,
    pub lines: LinePolicy,
    pub transfers: TransferPolicy,
}

impl BuildPolicy {
    /// Check every part of the policy.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.costs.validate()?;
        self.transfers.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_costs_are_valid() {
        assert!(CostPolicy::default().validate().is_ok());
        assert!(BuildPolicy::default().validate().is_ok());
    }

    #[test]
    fn metro_travel_must_be_cheaper_than_bus() {
        let mut costs = CostPolicy::default();
        costs.metro.travel_weight = costs.bus.travel_weight;
        assert_eq!(
            costs.validate(),
            Err(PolicyError::MetroNotCheaper { metro: 2.0, bus: 2.0 })
        );
    }

    #[test]
    fn negative_costs_are_rejected() {
        let mut costs = CostPolicy::default();
        costs.alight_minutes = -1.0;
        assert_eq!(
            costs.validate(),
            Err(PolicyError::Negative {
                name: "alight_minutes",
                value: -1.0
            })
        );

        let mut costs = CostPolicy::default();
        costs.bus.board_weight = f64::NAN;
        assert!(costs.validate().is_err());
    }

    #[test]
    fn classify_lines() {
        let policy = LinePolicy::default();

        let metro = policy.classify(" M4 ");
        assert_eq!(metro.name, "M4");
        assert_eq!(metro.mode, LineMode::Metro);
        assert!(metro.day_eligible());
        assert!(!metro.night_eligible());

        let night = policy.classify("n109");
        assert_eq!(night.name, "N109");
        assert_eq!(night.mode, LineMode::Bus);
        assert!(night.night_only);
        assert!(!night.day_eligible());

        let all_night = policy.classify("783");
        assert!(all_night.all_night);
        assert!(all_night.day_eligible());
        assert!(all_night.night_eligible());

        let plain = policy.classify("336");
        assert_eq!(plain.mode, LineMode::Bus);
        assert!(!plain.night_eligible());
    }

    #[test]
    fn metro_allow_list_without_prefix() {
        let policy = LinePolicy {
            metro_prefixes: vec![],
            metro_lines: vec!["Red".into()],
            ..LinePolicy::default()
        };
        assert_eq!(policy.classify("RED").mode, LineMode::Metro);
        assert_eq!(policy.classify("M2").mode, LineMode::Bus);
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: BuildPolicy = toml::from_str(
            r#"
            [costs.metro]
            travel_weight = 0.25
            travel_minutes = 2.0
            board_weight = 4.0
            board_minutes = 4.0

            [lines]
            all_night_lines = ["783", "N/A"]
            "#,
        )
        .unwrap();
        assert_eq!(policy.costs.metro.travel_weight, 0.25);
        assert_eq!(policy.costs.bus, CostPolicy::default().bus);
        assert_eq!(policy.lines.night_prefixes, vec!["N".to_string()]);
        assert_eq!(policy.lines.all_night_lines.len(), 2);
    }
}
