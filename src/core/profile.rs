use crate::models::{DomainVector, RawRecord, Role, TermId, UserProfile};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use validator::Validate;

/// Input validation failures; any of these aborts the run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Record at row {row} has no email address")]
    MissingIdentity { row: usize },

    #[error("Duplicate email {email} at row {duplicate_row} (first seen at row {first_row})")]
    DuplicateEmail {
        email: String,
        first_row: usize,
        duplicate_row: usize,
    },

    #[error("Cannot form a team from {count} profile(s); at least 2 are required")]
    InsufficientProfiles { count: usize },

    #[error("Scoring weight {name} must be a finite, non-negative number")]
    InvalidWeight { name: &'static str },
}

/// What to do when an email appears twice in one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    KeepFirst,
    KeepLast,
}

/// Synonym table mapping free-text role answers onto [`Role`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoleSynonyms {
    #[serde(default = "default_engineer_synonyms")]
    pub engineer: Vec<String>,
    #[serde(default = "default_finance_synonyms")]
    pub finance: Vec<String>,
    #[serde(default = "default_other_synonyms")]
    pub other: Vec<String>,
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_engineer_synonyms() -> Vec<String> {
    to_strings(&["engineer", "engineering", "developer", "software", "technical", "cto"])
}

fn default_finance_synonyms() -> Vec<String> {
    to_strings(&["finance", "financial", "accounting", "cfo"])
}

fn default_other_synonyms() -> Vec<String> {
    to_strings(&["business strategy", "business", "marketing", "design", "product"])
}

impl Default for RoleSynonyms {
    fn default() -> Self {
        Self {
            engineer: default_engineer_synonyms(),
            finance: default_finance_synonyms(),
            other: default_other_synonyms(),
        }
    }
}

impl RoleSynonyms {
    fn normalized(&self) -> Self {
        fn clean(list: &[String]) -> Vec<String> {
            list.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        }
        Self {
            engineer: clean(&self.engineer),
            finance: clean(&self.finance),
            other: clean(&self.other),
        }
    }

    /// Map a role answer onto the closed role set
    ///
    /// Terms are checked in answer order; the first term containing a
    /// synonym as whole words decides. Unrecognized or empty answers fall
    /// back to [`Role::Other`].
    pub fn resolve(&self, answer: &str, delimiter: &str) -> Role {
        let table = [
            (Role::Engineer, &self.engineer),
            (Role::Finance, &self.finance),
            (Role::Other, &self.other),
        ];

        for term in split_terms(answer, delimiter) {
            let padded = format!(" {} ", term);
            for (role, synonyms) in table.iter() {
                if synonyms.iter().any(|syn| padded.contains(&format!(" {} ", syn))) {
                    return *role;
                }
            }
        }

        Role::Other
    }
}

/// Options controlling how raw records become profiles
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOptions {
    pub delimiter: String,
    pub duplicate_policy: DuplicatePolicy,
    pub skip_existing_teams: bool,
    pub roles: RoleSynonyms,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            skip_existing_teams: true,
            roles: RoleSynonyms::default(),
        }
    }
}

/// Run-wide term dictionary
///
/// Terms get dense ids in first-seen order, so identical input yields
/// identical ids across runs.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.ids.len() as TermId;
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Lowercased, trimmed, delimiter-separated tags with inner whitespace collapsed
pub fn split_terms(text: &str, delimiter: &str) -> Vec<String> {
    let lowered = text.trim().to_lowercase();
    let pieces: Vec<&str> = if delimiter.is_empty() {
        vec![lowered.as_str()]
    } else {
        lowered.split(delimiter).collect()
    };

    pieces
        .into_iter()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Alphanumeric words of at least two characters
pub fn tokenize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<chrono::NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%m/%d/%Y %H:%M:%S")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

fn is_yes(answer: &str) -> bool {
    answer.trim().to_lowercase().starts_with("yes")
}

/// Turns raw survey records into [`UserProfile`]s over a shared vocabulary
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    options: ProfileOptions,
    vocabulary: Vocabulary,
}

impl ProfileBuilder {
    pub fn new(options: ProfileOptions) -> Self {
        let roles = options.roles.normalized();
        Self {
            options: ProfileOptions { roles, ..options },
            vocabulary: Vocabulary::new(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Build one profile from a record at `row`
    pub fn build(&mut self, row: usize, record: &RawRecord) -> Result<UserProfile, ValidationError> {
        let (record, email) = Self::identity(row, record)?;
        Ok(self.profile_from(row, &record, email))
    }

    /// Build profiles for a whole batch, applying the duplicate-email policy
    ///
    /// Profiles come back in input order, so a profile's index in the
    /// returned vector increases with its original row.
    pub fn build_all(&mut self, records: &[RawRecord]) -> Result<Vec<UserProfile>, ValidationError> {
        let mut slots: Vec<Option<UserProfile>> = Vec::with_capacity(records.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row, raw) in records.iter().enumerate() {
            if self.options.skip_existing_teams && raw.already_teamed() {
                tracing::debug!("Skipping row {}: respondent already has a team", row);
                continue;
            }

            let (record, email) = Self::identity(row, raw)?;

            if let Some(&slot) = seen.get(&email) {
                let first_row = slots[slot].as_ref().map(|p| p.row).unwrap_or(row);
                match self.options.duplicate_policy {
                    DuplicatePolicy::Reject => {
                        return Err(ValidationError::DuplicateEmail {
                            email,
                            first_row,
                            duplicate_row: row,
                        });
                    }
                    DuplicatePolicy::KeepFirst => {
                        tracing::warn!("Dropping duplicate email {} at row {} (keeping row {})", email, row, first_row);
                        continue;
                    }
                    DuplicatePolicy::KeepLast => {
                        tracing::warn!("Replacing row {} with duplicate email {} from row {}", first_row, email, row);
                        slots[slot] = None;
                    }
                }
            }

            let profile = self.profile_from(row, &record, email.clone());
            seen.insert(email, slots.len());
            slots.push(Some(profile));
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn identity(row: usize, record: &RawRecord) -> Result<(RawRecord, String), ValidationError> {
        let record = record.trimmed();
        if record.validate().is_err() {
            return Err(ValidationError::MissingIdentity { row });
        }
        let email = record.email.to_lowercase();
        Ok((record, email))
    }

    fn profile_from(&mut self, row: usize, record: &RawRecord, email: String) -> UserProfile {
        let delimiter = self.options.delimiter.clone();

        let majors: Vec<String> = [
            &record.major,
            &record.additional_major_1,
            &record.additional_major_2,
        ]
        .iter()
        .flat_map(|m| split_terms(m, &delimiter))
        .collect();

        let interests = split_terms(&record.domains_of_interest, &delimiter);
        let goals = split_terms(&record.goals, &delimiter);

        let mut idea_words = tokenize_words(&record.idea);
        idea_words.extend(tokenize_words(&record.additional_info));

        let role = self.options.roles.resolve(&record.desired_role, &delimiter);

        UserProfile {
            row,
            email,
            full_name: record.full_name.clone(),
            class_year: record.class_year.clone(),
            submitted_at: parse_timestamp(&record.timestamp),
            role,
            has_idea: is_yes(&record.has_idea),
            idea_stage: record.idea_stage.clone(),
            major: self.vectorize(&majors),
            interests: self.vectorize(&interests),
            idea: self.vectorize(&idea_words),
            goals: self.vectorize(&goals),
        }
    }

    fn vectorize(&mut self, terms: &[String]) -> DomainVector {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in terms {
            *counts.entry(self.vocabulary.intern(term)).or_insert(0) += 1;
        }
        DomainVector::from_counts(&counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str, role: &str) -> RawRecord {
        RawRecord {
            email: email.to_string(),
            full_name: format!("Student {}", email),
            major: "Computer Science".to_string(),
            domains_of_interest: "Technology, Healthcare".to_string(),
            desired_role: role.to_string(),
            goals: "Build relationships".to_string(),
            idea: "An app for tracking campus shuttles".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_terms_normalizes() {
        let terms = split_terms("  Social   Impact ,Technology,, Arts ", ",");
        assert_eq!(terms, vec!["social impact", "technology", "arts"]);
    }

    #[test]
    fn test_tokenize_words() {
        let words = tokenize_words("A tool: AI-driven tutoring!");
        assert_eq!(words, vec!["tool", "ai", "driven", "tutoring"]);
    }

    #[test]
    fn test_role_resolution() {
        let roles = RoleSynonyms::default().normalized();
        assert_eq!(roles.resolve("Engineering", ","), Role::Engineer);
        assert_eq!(roles.resolve("Financial", ","), Role::Finance);
        assert_eq!(roles.resolve("Business Strategy, Engineering", ","), Role::Other);
        assert_eq!(roles.resolve("", ","), Role::Other);
        assert_eq!(roles.resolve("astronaut", ","), Role::Other);
        assert_eq!(roles.resolve("Director", ","), Role::Other);
        assert_eq!(roles.resolve("Software Engineer", ","), Role::Engineer);
    }

    #[test]
    fn test_build_profile() {
        let mut builder = ProfileBuilder::new(ProfileOptions::default());
        let profile = builder.build(4, &record(" Ada@Example.edu ", "Engineering")).unwrap();

        assert_eq!(profile.row, 4);
        assert_eq!(profile.email, "ada@example.edu");
        assert_eq!(profile.role, Role::Engineer);
        assert_eq!(profile.interests.len(), 2);
        assert_eq!(profile.major.len(), 1);
        assert!(profile.idea.len() >= 5);

        let tech = builder.vocabulary().get("technology").unwrap();
        assert_eq!(profile.interests.weight(tech), 1.0);
    }

    #[test]
    fn test_missing_email_rejected() {
        let mut builder = ProfileBuilder::new(ProfileOptions::default());
        let err = builder.build(2, &record("  ", "Engineering")).unwrap_err();
        assert_eq!(err, ValidationError::MissingIdentity { row: 2 });
    }

    #[test]
    fn test_duplicate_email_policies() {
        let records = vec![
            record("a@x.edu", "Engineering"),
            record("b@x.edu", "Financial"),
            record("A@x.edu", "Financial"),
        ];

        let mut reject = ProfileBuilder::new(ProfileOptions::default());
        assert_eq!(
            reject.build_all(&records).unwrap_err(),
            ValidationError::DuplicateEmail {
                email: "a@x.edu".to_string(),
                first_row: 0,
                duplicate_row: 2,
            }
        );

        let mut keep_first = ProfileBuilder::new(ProfileOptions {
            duplicate_policy: DuplicatePolicy::KeepFirst,
            ..Default::default()
        });
        let profiles = keep_first.build_all(&records).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].role, Role::Engineer);

        let mut keep_last = ProfileBuilder::new(ProfileOptions {
            duplicate_policy: DuplicatePolicy::KeepLast,
            ..Default::default()
        });
        let profiles = keep_last.build_all(&records).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].email, "b@x.edu");
        assert_eq!(profiles[1].row, 2);
        assert_eq!(profiles[1].role, Role::Finance);
    }

    #[test]
    fn test_skip_existing_teams() {
        let mut teamed = record("c@x.edu", "Engineering");
        teamed.has_team = "Yes".to_string();
        let records = vec![record("a@x.edu", "Engineering"), teamed];

        let mut builder = ProfileBuilder::new(ProfileOptions::default());
        assert_eq!(builder.build_all(&records).unwrap().len(), 1);

        let mut keep_all = ProfileBuilder::new(ProfileOptions {
            skip_existing_teams: false,
            ..Default::default()
        });
        assert_eq!(keep_all.build_all(&records).unwrap().len(), 2);
    }

    #[test]
    fn test_timestamp_parsing() {
        let parsed = parse_timestamp("9/14/2024 10:21:33").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "2024-09-14");
        assert!(parse_timestamp("2024-09-14T10:21:33Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
