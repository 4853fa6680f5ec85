use tracing::debug;

use crate::attribution::{MatchBasis, Side, attribute};
use crate::config::EngineConfig;
use crate::h2h::{HistoricalMatch, TeamDescriptor};

/// One team's goal record over the matches attributable to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamGoalSummary {
    pub matches: usize,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Matches attributed only through name containment.
    pub soft_matches: usize,
    /// Average the model uses: the raw average, or the league default.
    pub avg_for: f64,
    pub used_fallback: bool,
}

impl TeamGoalSummary {
    pub fn raw_avg_for(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.goals_for as f64 / self.matches as f64
        }
    }

    pub fn raw_avg_against(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.goals_against as f64 / self.matches as f64
        }
    }
}

pub fn summarize_team(
    team: &TeamDescriptor,
    matches: &[HistoricalMatch],
    cfg: &EngineConfig,
) -> TeamGoalSummary {
    let mut n = 0usize;
    let mut goals_for = 0u32;
    let mut goals_against = 0u32;
    let mut soft_matches = 0usize;

    for m in matches {
        let Some(role) = attribute(team, m) else {
            continue;
        };
        let (gf, ga) = match role.side {
            Side::Home => (m.home_goals, m.away_goals),
            Side::Away => (m.away_goals, m.home_goals),
        };
        goals_for = goals_for.saturating_add(gf);
        goals_against = goals_against.saturating_add(ga);
        if role.basis == MatchBasis::SoftName {
            soft_matches += 1;
        }
        n += 1;
    }

    let mut out = TeamGoalSummary {
        matches: n,
        goals_for,
        goals_against,
        soft_matches,
        avg_for: 0.0,
        used_fallback: false,
    };

    let raw = out.raw_avg_for();
    if n < cfg.min_h2h_matches || raw <= 0.0 {
        debug!(
            team = %team.name,
            matches = n,
            raw_avg = raw,
            "falling back to league average goals"
        );
        out.avg_for = cfg.league_avg_goals;
        out.used_fallback = true;
    } else {
        out.avg_for = raw;
    }
    out
}

/// Shrinks each average toward the league default, weighting by how many
/// matches each side has on record, then applies the venue multipliers.
pub fn blend_lambdas(
    home: &TeamDescriptor,
    home_avg: f64,
    away: &TeamDescriptor,
    away_avg: f64,
    cfg: &EngineConfig,
) -> (f64, f64) {
    let w_home = home.sample_weight();
    let w_away = away.sample_weight();
    let denom = (w_home + w_away).max(1.0);
    let league = cfg.league_avg_goals;

    let lambda_home = (home_avg * w_home + league * w_away) / denom;
    let lambda_away = (away_avg * w_away + league * w_home) / denom;

    (
        lambda_home * cfg.home_advantage,
        lambda_away * cfg.away_factor,
    )
}
