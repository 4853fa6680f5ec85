use std::env;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub const LEAGUE_AVG_GOALS: f64 = 1.4;
pub const MIN_H2H_MATCHES: usize = 3;
pub const HOME_ADVANTAGE: f64 = 1.15;
pub const AWAY_FACTOR: f64 = 0.95;
pub const BASE_MAX_GOALS: u32 = 10;
pub const MAX_GOALS_CAP: u32 = 20;
pub const MASS_THRESHOLD: f64 = 0.999;
pub const TOP_SCORES: usize = 3;
/// Hard ceiling on either grid bound, whatever the configuration says.
pub const MAX_GRID_GOALS: u32 = 64;

/// Tunable constants of the prediction engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Goals per match substituted when a team's own sample is too thin.
    pub league_avg_goals: f64,
    /// Attributable matches needed before a raw average is trusted.
    pub min_h2h_matches: usize,
    pub home_advantage: f64,
    pub away_factor: f64,
    /// Goal range of the fixed outcome grid (0..=base_max_goals).
    pub base_max_goals: u32,
    /// Largest goal range the adaptive score grid may grow to.
    pub max_goals_cap: u32,
    /// Probability mass the adaptive grid must capture.
    pub mass_threshold: f64,
    pub top_scores: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            league_avg_goals: LEAGUE_AVG_GOALS,
            min_h2h_matches: MIN_H2H_MATCHES,
            home_advantage: HOME_ADVANTAGE,
            away_factor: AWAY_FACTOR,
            base_max_goals: BASE_MAX_GOALS,
            max_goals_cap: MAX_GOALS_CAP,
            mass_threshold: MASS_THRESHOLD,
            top_scores: TOP_SCORES,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with any `H2H_*` environment variables that parse.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse("H2H_LEAGUE_AVG_GOALS") {
            self.league_avg_goals = v;
        }
        if let Some(v) = env_parse("H2H_MIN_MATCHES") {
            self.min_h2h_matches = v;
        }
        if let Some(v) = env_parse("H2H_HOME_ADVANTAGE") {
            self.home_advantage = v;
        }
        if let Some(v) = env_parse("H2H_AWAY_FACTOR") {
            self.away_factor = v;
        }
        if let Some(v) = env_parse("H2H_BASE_MAX_GOALS") {
            self.base_max_goals = v;
        }
        if let Some(v) = env_parse("H2H_MAX_GOALS_CAP") {
            self.max_goals_cap = v;
        }
        if let Some(v) = env_parse("H2H_MASS_THRESHOLD") {
            self.mass_threshold = v;
        }
        if let Some(v) = env_parse("H2H_TOP_SCORES") {
            self.top_scores = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("league_avg_goals", self.league_avg_goals),
            ("home_advantage", self.home_advantage),
            ("away_factor", self.away_factor),
        ] {
            if !v.is_finite() || v < 0.0 {
                bail!("{name} must be a finite non-negative number, got {v}");
            }
        }
        if self.max_goals_cap > MAX_GRID_GOALS {
            bail!(
                "max_goals_cap ({}) exceeds the grid ceiling of {MAX_GRID_GOALS}",
                self.max_goals_cap
            );
        }
        if self.max_goals_cap < self.base_max_goals {
            bail!(
                "max_goals_cap ({}) is below base_max_goals ({})",
                self.max_goals_cap,
                self.base_max_goals
            );
        }
        if !(self.mass_threshold > 0.0 && self.mass_threshold <= 1.0) {
            bail!(
                "mass_threshold must be in (0, 1], got {}",
                self.mass_threshold
            );
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            trimmed.parse::<T>().ok()
        }
    })
}
