use tracing::warn;

use crate::config::{EngineConfig, MAX_GRID_GOALS};

/// P(X = goals) for X ~ Poisson(lambda).
pub fn poisson_pmf(goals: u32, lambda: f64) -> f64 {
    let numer = lambda.powi(goals as i32) * (-lambda).exp();
    let denom = (1..=goals).fold(1.0_f64, |acc, k| acc * k as f64);
    numer / denom
}

fn pmf_table(lambda: f64, max_goals: u32) -> Vec<f64> {
    (0..=max_goals).map(|k| poisson_pmf(k, lambda)).collect()
}

/// Probability both sides score at least once, assuming independence.
pub fn btts_prob(lambda_home: f64, lambda_away: f64) -> f64 {
    (1.0 - (-lambda_home).exp()) * (1.0 - (-lambda_away).exp())
}

/// Outcome and low-total sums over the fixed `0..=max_goals` grid.
/// Raw, so they only cover the mass the grid captures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGridSummary {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
    /// 1 - P(0-0) - P(1-0) - P(0-1).
    pub over_15: f64,
    /// 1 - P(total <= 2).
    pub over_25: f64,
}

impl FixedGridSummary {
    pub fn compute(lambda_home: f64, lambda_away: f64, max_goals: u32) -> Self {
        let pmf_h = pmf_table(lambda_home, max_goals);
        let pmf_a = pmf_table(lambda_away, max_goals);

        let mut home = 0.0;
        let mut draw = 0.0;
        let mut away = 0.0;
        let mut upto_1 = 0.0;
        let mut upto_2 = 0.0;

        for (h, p_h) in pmf_h.iter().enumerate() {
            for (a, p_a) in pmf_a.iter().enumerate() {
                let p = p_h * p_a;
                if h > a {
                    home += p;
                } else if h < a {
                    away += p;
                } else {
                    draw += p;
                }
                let total = h + a;
                if total <= 1 {
                    upto_1 += p;
                }
                if total <= 2 {
                    upto_2 += p;
                }
            }
        }

        Self {
            home,
            draw,
            away,
            over_15: 1.0 - upto_1,
            over_25: 1.0 - upto_2,
        }
    }

    /// Home/draw/away rescaled to sum to one.
    pub fn outcome_shares(&self) -> (f64, f64, f64) {
        let sum = self.home + self.draw + self.away;
        if sum > 0.0 {
            (self.home / sum, self.draw / sum, self.away / sum)
        } else {
            (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
        }
    }
}

/// Joint scoreline probabilities, grown until they capture enough mass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGrid {
    max_goals: u32,
    // Row-major: index = home * (max_goals + 1) + away.
    cells: Vec<f64>,
    total: f64,
}

impl ScoreGrid {
    pub fn build(lambda_home: f64, lambda_away: f64, max_goals: u32) -> Self {
        let pmf_h = pmf_table(lambda_home, max_goals);
        let pmf_a = pmf_table(lambda_away, max_goals);
        let mut cells = Vec::with_capacity(pmf_h.len() * pmf_a.len());
        for p_h in &pmf_h {
            for p_a in &pmf_a {
                cells.push(p_h * p_a);
            }
        }
        let total = cells.iter().sum();
        Self {
            max_goals,
            cells,
            total,
        }
    }

    /// Starts at `base_max_goals` and widens one goal at a time until the
    /// captured mass reaches `mass_threshold` or the cap is hit. Both bounds
    /// are held to `MAX_GRID_GOALS` even for unvalidated configs.
    pub fn adaptive(lambda_home: f64, lambda_away: f64, cfg: &EngineConfig) -> Self {
        let base = cfg.base_max_goals.min(MAX_GRID_GOALS);
        let cap = cfg.max_goals_cap.clamp(base, MAX_GRID_GOALS);
        let mut grid = Self::build(lambda_home, lambda_away, base);
        while grid.total < cfg.mass_threshold && grid.max_goals < cap {
            grid = Self::build(lambda_home, lambda_away, grid.max_goals + 1);
        }
        if !grid.meets(cfg.mass_threshold) {
            warn!(
                lambda_home,
                lambda_away,
                max_goals = grid.max_goals,
                mass = grid.total,
                "score grid capped below mass threshold"
            );
        }
        grid
    }

    pub fn max_goals(&self) -> u32 {
        self.max_goals
    }

    /// Probability mass captured by the truncated grid.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.total >= threshold
    }

    pub fn prob(&self, home: u32, away: u32) -> f64 {
        if home > self.max_goals || away > self.max_goals {
            return 0.0;
        }
        let width = self.max_goals as usize + 1;
        self.cells[home as usize * width + away as usize]
    }

    fn normalized(&self, p: f64) -> f64 {
        if self.total > 0.0 { p / self.total } else { 0.0 }
    }

    /// Share of the captured mass with more than `max_total` goals.
    pub fn over_share(&self, max_total: u32) -> f64 {
        let mut under = 0.0;
        for h in 0..=self.max_goals.min(max_total) {
            for a in 0..=(max_total - h).min(self.max_goals) {
                under += self.prob(h, a);
            }
        }
        (1.0 - self.normalized(under)).clamp(0.0, 1.0)
    }

    /// Most likely scorelines as `(home, away, normalized probability)`,
    /// highest first. Ties keep grid order (home goals, then away goals).
    pub fn top_scores(&self, n: usize) -> Vec<(u32, u32, f64)> {
        let width = self.max_goals + 1;
        let mut ranked: Vec<(u32, u32, f64)> = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let i = i as u32;
                (i / width, i % width, self.normalized(*p))
            })
            .collect();
        ranked.sort_by(|x, y| y.2.total_cmp(&x.2));
        ranked.truncate(n);
        ranked
    }
}
