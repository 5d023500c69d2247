use crate::core::{
    assembler::{assemble_teams, InvariantViolation},
    leftovers::handle_leftovers,
    profile::{ProfileBuilder, ProfileOptions, ValidationError},
    resolver::resolve_role_slots,
    roles::assign_roles,
    scoring::{check_weights, ScoreMatrix},
};
use crate::models::{FormTeamsResponse, ProfileId, RawRecord, ScoringWeights, Team, UserProfile};
use thiserror::Error;
use uuid::Uuid;

/// Errors that abort a formation run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormationError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Internal consistency error: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl FormationError {
    /// Caused by the submitted records
    pub fn is_validation(&self) -> bool {
        matches!(self, FormationError::Validation(_))
    }

    /// Caused by a bug in the formation stages
    pub fn is_defect(&self) -> bool {
        matches!(self, FormationError::Invariant(_))
    }
}

/// Result of a formation run
#[derive(Debug, Clone)]
pub struct Formation {
    pub run_id: Uuid,
    pub profiles: Vec<UserProfile>,
    pub teams: Vec<Team>,
}

impl Formation {
    /// Index of the team holding a profile
    pub fn team_of(&self, profile: ProfileId) -> Option<usize> {
        self.teams.iter().position(|team| team.contains(profile))
    }

    /// Team index for a profile looked up by email
    pub fn team_of_email(&self, email: &str) -> Option<usize> {
        let email = email.trim().to_lowercase();
        self.profiles
            .iter()
            .position(|p| p.email == email)
            .and_then(|id| self.team_of(id))
    }

    pub fn to_response(&self) -> FormTeamsResponse {
        FormTeamsResponse::new(self.run_id, &self.profiles, &self.teams)
    }
}

/// Team formation pipeline
///
/// # Pipeline Stages
/// 1. Profile building (normalization + term vectors)
/// 2. Pairwise scoring into a dense matrix
/// 3. Role partitioning and skeleton seeding
/// 4. Greedy role-slot resolution
/// 5. Leftover resolution and team spawning
/// 6. Validation and scoring of the final teams
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    options: ProfileOptions,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, options: ProfileOptions) -> Self {
        Self { weights, options }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            options: ProfileOptions::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn options(&self) -> &ProfileOptions {
        &self.options
    }

    /// Form teams from raw survey records
    ///
    /// Validation errors abort the run before any scoring happens; no
    /// partial team set is ever returned.
    pub fn form_teams(&self, records: &[RawRecord]) -> Result<Formation, FormationError> {
        let mut builder = ProfileBuilder::new(self.options.clone());
        let profiles = builder.build_all(records)?;

        tracing::info!(
            "Built {} profiles from {} records ({} vocabulary terms)",
            profiles.len(),
            records.len(),
            builder.vocabulary().len()
        );

        self.form_teams_from_profiles(profiles)
    }

    /// Form teams from already-built profiles
    ///
    /// Profile ids are positions in `profiles`; ties resolve to the lowest id.
    /// Weights that are negative or not finite fail the run before scoring.
    pub fn form_teams_from_profiles(&self, profiles: Vec<UserProfile>) -> Result<Formation, FormationError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("form_teams", %run_id);
        let _guard = span.enter();

        check_weights(&self.weights)?;

        if profiles.len() == 1 {
            return Err(ValidationError::InsufficientProfiles { count: 1 }.into());
        }

        // Scoring completes fully before any pool is touched
        let matrix = ScoreMatrix::build(&profiles, &self.weights);

        let mut assignment = assign_roles(&profiles, &matrix);
        let filled = resolve_role_slots(&mut assignment.skeletons, &mut assignment.pools, &matrix);
        tracing::debug!("Role pass filled {} slots", filled);

        let teams = handle_leftovers(assignment.skeletons, &mut assignment.pools, &matrix);
        let teams = assemble_teams(teams, profiles.len(), &matrix)?;

        tracing::info!("Formed {} teams from {} profiles", teams.len(), profiles.len());

        Ok(Formation {
            run_id,
            profiles,
            teams,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
