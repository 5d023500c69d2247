use crate::core::scoring::ScoreMatrix;
use crate::models::{ProfileId, Team};
use thiserror::Error;

/// Smallest and largest allowed team
pub const MIN_TEAM_SIZE: usize = 2;
pub const MAX_TEAM_SIZE: usize = 3;

/// Internal consistency defects detected while freezing teams
///
/// These indicate a bug in the formation stages, not bad input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Profile {profile} is not in any team")]
    MissingProfile { profile: ProfileId },

    #[error("Profile {profile} appears in more than one team slot")]
    DuplicateMember { profile: ProfileId },

    #[error("Team {team} references unknown profile {profile}")]
    UnknownProfile { team: usize, profile: ProfileId },

    #[error("Team {team} has {size} members (expected 2 or 3)")]
    TeamSize { team: usize, size: usize },
}

/// Check that teams partition `0..profile_count` exactly
pub fn validate_partition(teams: &[Vec<ProfileId>], profile_count: usize) -> Result<(), InvariantViolation> {
    let mut seen = vec![false; profile_count];

    for (team, members) in teams.iter().enumerate() {
        if members.len() < MIN_TEAM_SIZE || members.len() > MAX_TEAM_SIZE {
            return Err(InvariantViolation::TeamSize {
                team,
                size: members.len(),
            });
        }
        for &profile in members {
            let Some(slot) = seen.get_mut(profile) else {
                return Err(InvariantViolation::UnknownProfile { team, profile });
            };
            if *slot {
                return Err(InvariantViolation::DuplicateMember { profile });
            }
            *slot = true;
        }
    }

    match seen.iter().position(|&placed| !placed) {
        Some(profile) => Err(InvariantViolation::MissingProfile { profile }),
        None => Ok(()),
    }
}

/// Score, validate and freeze the formed teams
///
/// Nothing is emitted unless the whole set passes validation.
pub fn assemble_teams(
    teams: Vec<Vec<ProfileId>>,
    profile_count: usize,
    matrix: &ScoreMatrix,
) -> Result<Vec<Team>, InvariantViolation> {
    validate_partition(&teams, profile_count)?;

    Ok(teams
        .into_iter()
        .map(|members| {
            let score = matrix.group_score(&members);
            Team::new(members, score)
        })
        .collect())
}
