use serde::{Deserialize, Serialize};
use validator::Validate;

/// One survey response, keyed by the form's column names
///
/// Column presence is checked by the ingestion step; optional answers
/// default to empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RawRecord {
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[validate(length(min = 1))]
    #[serde(rename = "Email Address", default)]
    pub email: String,
    #[serde(rename = "Full Name", default)]
    pub full_name: String,
    #[serde(rename = "Class Year", default)]
    pub class_year: String,
    #[serde(rename = "Major", default)]
    pub major: String,
    #[serde(rename = "Additional Major 1", default)]
    pub additional_major_1: String,
    #[serde(rename = "Additional Major 2", default)]
    pub additional_major_2: String,
    #[serde(rename = "Domains of Interest", default)]
    pub domains_of_interest: String,
    #[serde(rename = "Do you have an idea (big or small)?", default)]
    pub has_idea: String,
    #[serde(rename = "What is your idea?", default)]
    pub idea: String,
    #[serde(rename = "What stage are you at?", default)]
    pub idea_stage: String,
    #[serde(rename = "What role are you interested in taking on a team?", default)]
    pub desired_role: String,
    #[serde(rename = "What are your goals for the Lab?", default)]
    pub goals: String,
    #[serde(rename = "Provide any additional information about yourself.", default)]
    pub additional_info: String,
    #[serde(rename = "Do you already have a team?", default)]
    pub has_team: String,
}

impl RawRecord {
    /// Copy with every field trimmed
    pub fn trimmed(&self) -> Self {
        let t = |s: &String| s.trim().to_string();
        Self {
            timestamp: t(&self.timestamp),
            email: t(&self.email),
            full_name: t(&self.full_name),
            class_year: t(&self.class_year),
            major: t(&self.major),
            additional_major_1: t(&self.additional_major_1),
            additional_major_2: t(&self.additional_major_2),
            domains_of_interest: t(&self.domains_of_interest),
            has_idea: t(&self.has_idea),
            idea: t(&self.idea),
            idea_stage: t(&self.idea_stage),
            desired_role: t(&self.desired_role),
            goals: t(&self.goals),
            additional_info: t(&self.additional_info),
            has_team: t(&self.has_team),
        }
    }

    /// Whether the respondent said they already have a team
    ///
    /// Only an explicit "yes" excludes a record; blank or other answers
    /// are still matched.
    pub fn already_teamed(&self) -> bool {
        self.has_team.trim().to_lowercase().starts_with("yes")
    }
}
