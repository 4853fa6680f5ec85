use crate::h2h::{HistoricalMatch, TeamDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

/// How a team was tied to a match, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBasis {
    Id,
    ExactName,
    /// One name contains the other ("Darmstadt" vs "SV Darmstadt 98").
    /// Ambiguous when a league has similarly named clubs.
    SoftName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub side: Side,
    pub basis: MatchBasis,
}

impl Role {
    fn new(side: Side, basis: MatchBasis) -> Self {
        Self { side, basis }
    }
}

/// Decides whether `team` played in `m`, and on which side.
///
/// Id beats exact name beats containment; within each tier home is checked
/// before away. Returns `None` when nothing matches, which drops the match
/// from that team's goal tallies.
pub fn attribute(team: &TeamDescriptor, m: &HistoricalMatch) -> Option<Role> {
    if let Some(id) = team.usable_id() {
        let home_id = m.home_team_id.as_ref();
        let away_id = m.away_team_id.as_ref();
        if home_id == Some(id) {
            return Some(Role::new(Side::Home, MatchBasis::Id));
        }
        if away_id == Some(id) {
            return Some(Role::new(Side::Away, MatchBasis::Id));
        }
        // Both sides identified and neither is us: names can't overrule that.
        if home_id.is_some() && away_id.is_some() {
            return None;
        }
    }

    let name = normalize_name(&team.name);
    if name.is_empty() {
        return None;
    }
    let home = normalize_name(&m.home_team);
    let away = normalize_name(&m.away_team);

    if !home.is_empty() && home == name {
        return Some(Role::new(Side::Home, MatchBasis::ExactName));
    }
    if !away.is_empty() && away == name {
        return Some(Role::new(Side::Away, MatchBasis::ExactName));
    }

    if soft_contains(&home, &name) {
        return Some(Role::new(Side::Home, MatchBasis::SoftName));
    }
    if soft_contains(&away, &name) {
        return Some(Role::new(Side::Away, MatchBasis::SoftName));
    }
    None
}

fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn soft_contains(candidate: &str, name: &str) -> bool {
    !candidate.is_empty() && (candidate.contains(name) || name.contains(candidate))
}
