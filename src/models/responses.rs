use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::models::domain::{Role, Team, UserProfile};

/// Member entry in a rendered team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "classYear")]
    pub class_year: String,
    pub role: Role,
    #[serde(rename = "hasIdea")]
    pub has_idea: bool,
    #[serde(rename = "ideaStage")]
    pub idea_stage: String,
    #[serde(rename = "submittedAt")]
    pub submitted_at: Option<NaiveDateTime>,
}

/// Team entry handed to the rendering step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    #[serde(rename = "teamNumber")]
    pub team_number: usize,
    pub members: Vec<TeamMember>,
    #[serde(rename = "teamScore")]
    pub team_score: f64,
}

/// Response for a team formation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTeamsResponse {
    #[serde(rename = "runId")]
    pub run_id: uuid::Uuid,
    #[serde(rename = "totalProfiles")]
    pub total_profiles: usize,
    pub teams: Vec<TeamSummary>,
}

impl FormTeamsResponse {
    pub fn new(run_id: uuid::Uuid, profiles: &[UserProfile], teams: &[Team]) -> Self {
        let teams = teams
            .iter()
            .enumerate()
            .map(|(i, team)| TeamSummary {
                team_number: i + 1,
                members: team
                    .members()
                    .iter()
                    .map(|&id| {
                        let profile = &profiles[id];
                        TeamMember {
                            email: profile.email.clone(),
                            full_name: profile.full_name.clone(),
                            class_year: profile.class_year.clone(),
                            role: profile.role,
                            has_idea: profile.has_idea,
                            idea_stage: profile.idea_stage.clone(),
                            submitted_at: profile.submitted_at,
                        }
                    })
                    .collect(),
                team_score: team.team_score(),
            })
            .collect();

        Self {
            run_id,
            total_profiles: profiles.len(),
            teams,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
