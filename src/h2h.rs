use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EngineConfig;

/// Opaque team identifier. Upstream feeds send both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct TeamId(String);

impl TeamId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// Numbers and non-blank strings; anything else is no id at all.
    pub fn from_value(v: &Value) -> Option<Self> {
        let id = match v {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self(i.to_string())
                } else if let Some(u) = n.as_u64() {
                    Self(u.to_string())
                } else {
                    let f = n.as_f64()?;
                    if f.is_finite() && f.fract() == 0.0 {
                        Self((f as i64).to_string())
                    } else {
                        Self(f.to_string())
                    }
                }
            }
            Value::String(s) => Self::new(s.as_str()),
            _ => return None,
        };
        if id.is_empty() { None } else { Some(id) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for TeamId {
    type Error = String;

    fn try_from(v: Value) -> std::result::Result<Self, Self::Error> {
        Self::from_value(&v).ok_or_else(|| format!("not a team id: {v}"))
    }
}

impl From<u32> for TeamId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A team as supplied by the caller. Deserialization never rejects a
/// descriptor: odd ids, names or counts degrade to "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDescriptor", rename_all = "camelCase")]
pub struct TeamDescriptor {
    pub id: Option<TeamId>,
    pub name: String,
    /// Matches this team played across the whole dataset, not just H2H.
    pub matches_involved: u32,
}

impl TeamDescriptor {
    pub fn new(id: Option<TeamId>, name: impl Into<String>, matches_involved: u32) -> Self {
        Self {
            id,
            name: name.into(),
            matches_involved,
        }
    }

    /// Confidence weight used when blending; never zero.
    pub fn sample_weight(&self) -> f64 {
        self.matches_involved.max(1) as f64
    }

    pub(crate) fn usable_id(&self) -> Option<&TeamId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default, rename = "matchesInvolved", alias = "matches_involved")]
    matches_involved: Option<Value>,
}

impl From<RawDescriptor> for TeamDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        let name = match raw.name {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Self {
            id: raw.id.as_ref().and_then(TeamId::from_value),
            name,
            matches_involved: raw
                .matches_involved
                .as_ref()
                .and_then(count_from_value)
                .unwrap_or(0),
        }
    }
}

/// Canonical match record the engine works on. Every accepted input shape is
/// folded into this at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMatch", rename_all = "camelCase")]
pub struct HistoricalMatch {
    pub home_team: String,
    pub away_team: String,
    pub home_team_id: Option<TeamId>,
    pub away_team_id: Option<TeamId>,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl HistoricalMatch {
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u32,
        away_goals: u32,
    ) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_team_id: None,
            away_team_id: None,
            home_goals,
            away_goals,
        }
    }

    pub fn with_ids(mut self, home: impl Into<TeamId>, away: impl Into<TeamId>) -> Self {
        self.home_team_id = Some(home.into());
        self.away_team_id = Some(away.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default, rename = "homeTeam", alias = "home_team")]
    home_team: Option<String>,
    #[serde(default, rename = "awayTeam", alias = "away_team")]
    away_team: Option<String>,
    #[serde(default, rename = "homeTeamId", alias = "home_team_id")]
    home_team_id: Option<Value>,
    #[serde(default, rename = "awayTeamId", alias = "away_team_id")]
    away_team_id: Option<Value>,
    #[serde(default, rename = "homeGoals")]
    home_goals: Option<Value>,
    #[serde(default, rename = "awayGoals")]
    away_goals: Option<Value>,
    #[serde(default)]
    home_score: Option<Value>,
    #[serde(default)]
    away_score: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
}

impl From<RawMatch> for HistoricalMatch {
    fn from(raw: RawMatch) -> Self {
        let (result_home, result_away) = raw
            .result
            .as_ref()
            .and_then(Value::as_str)
            .map(parse_result)
            .unwrap_or((None, None));

        let home_goals = raw
            .home_goals
            .as_ref()
            .and_then(count_from_value)
            .or_else(|| raw.home_score.as_ref().and_then(count_from_value))
            .or(result_home)
            .unwrap_or(0);
        let away_goals = raw
            .away_goals
            .as_ref()
            .and_then(count_from_value)
            .or_else(|| raw.away_score.as_ref().and_then(count_from_value))
            .or(result_away)
            .unwrap_or(0);

        Self {
            home_team: raw.home_team.unwrap_or_default(),
            away_team: raw.away_team.unwrap_or_default(),
            home_team_id: raw.home_team_id.as_ref().and_then(TeamId::from_value),
            away_team_id: raw.away_team_id.as_ref().and_then(TeamId::from_value),
            home_goals,
            away_goals,
        }
    }
}

/// Everything one prediction needs: both teams, their shared history and
/// optional engine overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionCase {
    pub team_a: TeamDescriptor,
    pub team_b: TeamDescriptor,
    #[serde(default)]
    pub matches: Vec<HistoricalMatch>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
}

pub fn parse_case_json(raw: &str) -> Result<PredictionCase> {
    serde_json::from_str::<PredictionCase>(raw.trim()).context("invalid case json")
}

/// Parses a JSON array of match records. `null` and blank input are empty.
pub fn parse_matches_json(raw: &str) -> Result<Vec<HistoricalMatch>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<HistoricalMatch>>(trimmed).context("invalid h2h matches json")
}

fn count_from_value(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .map(|g| g.min(u32::MAX as u64) as u32)
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u32)
            }),
        Value::String(s) => parse_goal_cell(s),
        _ => None,
    }
}

// Leading digits only, so "2 (aet)" still reads as 2.
fn parse_goal_cell(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok()
}

fn parse_result(raw: &str) -> (Option<u32>, Option<u32>) {
    let Some((home, away)) = raw.split_once(['-', ':']) else {
        return (None, None);
    };
    (parse_goal_cell(home), parse_goal_cell(away))
}
