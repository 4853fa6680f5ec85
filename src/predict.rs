use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{EngineConfig, MAX_GRID_GOALS};
use crate::grid::{FixedGridSummary, ScoreGrid, btts_prob};
use crate::h2h::{HistoricalMatch, TeamDescriptor};
use crate::lambda::{blend_lambdas, summarize_team};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectScore {
    /// "home-away", e.g. "2-1".
    pub score: String,
    /// Percent, one decimal.
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predictions {
    pub team_a_win: u8,
    pub draw: u8,
    pub team_b_win: u8,
    pub btts: u8,
    pub over15: u8,
    pub over25: u8,
    pub over35: u8,
    pub lambda_a: f64,
    pub lambda_b: f64,
    pub used_fallback: bool,
    pub is_limited_data: bool,
    pub correct_scores: Vec<CorrectScore>,
    /// Matches tied to a team only by name containment.
    pub soft_matches: usize,
    /// The score grid hit its size cap before capturing enough mass.
    pub precision_warning: bool,
}

/// Predicts `team_a` (home) against `team_b` (away) from a shared match list.
///
/// Pure: no state survives the call, so concurrent use is fine. Sparse or
/// malformed input degrades to league averages rather than failing.
pub fn predict_match(
    team_a: &TeamDescriptor,
    team_b: &TeamDescriptor,
    matches: &[HistoricalMatch],
    cfg: &EngineConfig,
) -> Predictions {
    let sum_a = summarize_team(team_a, matches, cfg);
    let sum_b = summarize_team(team_b, matches, cfg);

    let (lambda_a, lambda_b) =
        blend_lambdas(team_a, sum_a.avg_for, team_b, sum_b.avg_for, cfg);
    let lambda_a = sanitize_lambda(lambda_a, cfg.league_avg_goals * cfg.home_advantage, "home");
    let lambda_b = sanitize_lambda(lambda_b, cfg.league_avg_goals * cfg.away_factor, "away");

    let fixed = FixedGridSummary::compute(
        lambda_a,
        lambda_b,
        cfg.base_max_goals.min(MAX_GRID_GOALS),
    );
    let (p_a, _, p_b) = fixed.outcome_shares();
    let (team_a_win, draw, team_b_win) = outcome_percents(p_a, p_b);

    let grid = ScoreGrid::adaptive(lambda_a, lambda_b, cfg);
    let correct_scores = grid
        .top_scores(cfg.top_scores)
        .into_iter()
        .map(|(h, a, p)| CorrectScore {
            score: format!("{h}-{a}"),
            probability: round_to(p * 100.0, 1),
        })
        .collect();

    let used_fallback = sum_a.used_fallback || sum_b.used_fallback;

    Predictions {
        team_a_win,
        draw,
        team_b_win,
        btts: percent(btts_prob(lambda_a, lambda_b)),
        over15: percent(fixed.over_15),
        over25: percent(fixed.over_25),
        over35: percent(grid.over_share(3)),
        lambda_a: round_to(lambda_a, 2),
        lambda_b: round_to(lambda_b, 2),
        used_fallback,
        is_limited_data: matches.len() < cfg.min_h2h_matches || used_fallback,
        correct_scores,
        soft_matches: sum_a.soft_matches + sum_b.soft_matches,
        precision_warning: !grid.meets(cfg.mass_threshold),
    }
}

fn sanitize_lambda(raw: f64, fallback: f64, side: &str) -> f64 {
    if !raw.is_finite() {
        warn!(side, raw, fallback, "non-finite lambda replaced");
        return fallback;
    }
    if raw < 0.0 {
        warn!(side, raw, "negative lambda clamped to zero");
        return 0.0;
    }
    raw
}

fn percent(p: f64) -> u8 {
    (p * 100.0).round().clamp(0.0, 100.0) as u8
}

// Rounds home and away, then lets draw absorb the rounding residue so the
// three always add up to exactly 100.
fn outcome_percents(home: f64, away: f64) -> (u8, u8, u8) {
    let mut h = (home * 100.0).round().clamp(0.0, 100.0) as i32;
    let mut a = (away * 100.0).round().clamp(0.0, 100.0) as i32;
    let mut d = 100 - h - a;
    if d < 0 {
        if h >= a {
            h += d;
        } else {
            a += d;
        }
        d = 0;
    }
    (h as u8, d as u8, a as u8)
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_percents_always_sum_to_100() {
        for &(h, a) in &[
            (1.0 / 3.0, 1.0 / 3.0),
            (0.505, 0.495),
            (0.455, 0.455),
            (0.0, 0.0),
        ] {
            let (x, y, z) = outcome_percents(h, a);
            assert_eq!(x as u32 + y as u32 + z as u32, 100, "{h}/{a}");
        }
        assert_eq!(outcome_percents(1.0 / 3.0, 1.0 / 3.0), (33, 34, 33));
    }

    #[test]
    fn sanitize_handles_nan_and_negative() {
        assert_eq!(sanitize_lambda(f64::NAN, 1.61, "home"), 1.61);
        assert_eq!(sanitize_lambda(f64::INFINITY, 1.33, "away"), 1.33);
        assert_eq!(sanitize_lambda(-0.4, 1.61, "home"), 0.0);
        assert_eq!(sanitize_lambda(2.2, 1.61, "home"), 2.2);
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_to(1.8249, 2), 1.82);
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(percent(0.996), 100);
        assert_eq!(percent(-0.1), 0);
    }

    #[test]
    fn empty_history_uses_league_defaults() {
        let a = TeamDescriptor::new(None, "Home", 0);
        let b = TeamDescriptor::new(None, "Away", 0);
        let p = predict_match(&a, &b, &[], &EngineConfig::default());
        assert!(p.used_fallback);
        assert!(p.is_limited_data);
        assert_eq!(p.lambda_a, 1.61);
        assert_eq!(p.lambda_b, 1.33);
        assert_eq!(p.correct_scores.len(), 3);
        assert!(!p.precision_warning);
    }
}
