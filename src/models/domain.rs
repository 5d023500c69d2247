use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a profile in the run's profile store
pub type ProfileId = usize;

/// Dense identifier of a vocabulary term, shared across all profiles of a run
pub type TermId = u32;

/// Role a student wants to take on inside a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Engineer,
    Finance,
    #[default]
    Other,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Engineer => "engineer",
            Role::Finance => "finance",
            Role::Other => "other",
        };
        f.write_str(label)
    }
}

/// Profile categories compared by cosine similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Major,
    Interests,
    Idea,
    Goals,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Major,
        Category::Interests,
        Category::Idea,
        Category::Goals,
    ];
}

/// Sparse term-frequency vector for one category of a profile
///
/// Entries are sorted by term id, which keeps dot products a linear merge
/// and makes iteration order independent of hashing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainVector {
    entries: Vec<(TermId, f64)>,
    norm: f64,
}

impl DomainVector {
    /// Build a vector from raw term counts
    pub fn from_counts(counts: &BTreeMap<TermId, u32>) -> Self {
        let entries: Vec<(TermId, f64)> = counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&term, &count)| (term, count as f64))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();

        Self { entries, norm }
    }

    /// Euclidean magnitude
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Weight of a single term (0 when absent)
    pub fn weight(&self, term: TermId) -> f64 {
        self.entries
            .binary_search_by_key(&term, |(t, _)| *t)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product over the shared vocabulary
    pub fn dot(&self, other: &DomainVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.entries.len() && j < other.entries.len() {
            let (ta, wa) = self.entries[i];
            let (tb, wb) = other.entries[j];
            match ta.cmp(&tb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }

    /// Number of terms present in both vectors
    pub fn shared_terms(&self, other: &DomainVector) -> usize {
        let (mut i, mut j) = (0, 0);
        let mut shared = 0;

        while i < self.entries.len() && j < other.entries.len() {
            match self.entries[i].0.cmp(&other.entries[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }

        shared
    }
}

/// Normalized student profile
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// Position of the source record in the input
    pub row: usize,
    pub email: String,
    pub full_name: String,
    pub class_year: String,
    pub submitted_at: Option<chrono::NaiveDateTime>,
    pub role: Role,
    pub has_idea: bool,
    pub idea_stage: String,
    pub major: DomainVector,
    pub interests: DomainVector,
    pub idea: DomainVector,
    pub goals: DomainVector,
}

impl UserProfile {
    pub fn vector(&self, category: Category) -> &DomainVector {
        match category {
            Category::Major => &self.major,
            Category::Interests => &self.interests,
            Category::Idea => &self.idea,
            Category::Goals => &self.goals,
        }
    }
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub major: f64,
    pub interests: f64,
    pub idea: f64,
    pub goals: f64,
    /// Bonus per identical explicit interest/goal tag
    pub tag_bonus: f64,
    /// Maximum number of shared tags rewarded
    pub max_bonus_tags: u32,
}

impl ScoringWeights {
    pub fn weight(&self, category: Category) -> f64 {
        match category {
            Category::Major => self.major,
            Category::Interests => self.interests,
            Category::Idea => self.idea,
            Category::Goals => self.goals,
        }
    }

    /// Upper bound of the shared-tag bonus
    pub fn max_bonus(&self) -> f64 {
        self.tag_bonus * self.max_bonus_tags as f64
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            major: 0.25,
            interests: 0.30,
            idea: 0.20,
            goals: 0.25,
            tag_bonus: 0.05,
            max_bonus_tags: 3,
        }
    }
}

/// Role requirement of an unfilled slot in a team skeleton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotNeed {
    NeedsEngineer,
    NeedsFinance,
    Open,
}

impl SlotNeed {
    /// Role pool a slot draws from; `None` for any-role slots
    pub fn role(&self) -> Option<Role> {
        match self {
            SlotNeed::NeedsEngineer => Some(Role::Engineer),
            SlotNeed::NeedsFinance => Some(Role::Finance),
            SlotNeed::Open => None,
        }
    }
}

/// Team under construction
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSkeleton {
    pub members: Vec<ProfileId>,
    /// Unfilled slots in resolution order
    pub open_slots: Vec<SlotNeed>,
}

impl TeamSkeleton {
    pub fn anchored(anchor: ProfileId, open_slots: Vec<SlotNeed>) -> Self {
        Self {
            members: vec![anchor],
            open_slots,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.open_slots.is_empty()
    }
}

/// Final team, frozen by the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    members: Vec<ProfileId>,
    team_score: f64,
}

impl Team {
    pub(crate) fn new(members: Vec<ProfileId>, team_score: f64) -> Self {
        Self { members, team_score }
    }

    pub fn members(&self) -> &[ProfileId] {
        &self.members
    }

    pub fn team_score(&self) -> f64 {
        self.team_score
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ProfileId) -> bool {
        self.members.contains(&id)
    }
}
