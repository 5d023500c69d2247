use crate::core::profile::ValidationError;
use crate::core::similarity::cosine_similarity;
use crate::models::{Category, ProfileId, ScoringWeights, UserProfile};
use rayon::prelude::*;

/// Two scores closer than this are treated as a tie
pub const TIE_EPSILON: f64 = 1e-9;

/// Cohort size above which the dense matrix is logged as a scaling concern
pub const MATRIX_WARN_PROFILES: usize = 2_000;

/// Breakdown of a pair's compatibility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub major: f64,
    pub interests: f64,
    pub idea: f64,
    pub goals: f64,
    /// Identical explicit interest/goal tags
    pub shared_tags: usize,
    pub bonus: f64,
    pub composite: f64,
}

impl PairScore {
    pub fn similarity(&self, category: Category) -> f64 {
        match category {
            Category::Major => self.major,
            Category::Interests => self.interests,
            Category::Idea => self.idea,
            Category::Goals => self.goals,
        }
    }
}

/// Reject weights that would let NaN or negative scores into the matrix
pub fn check_weights(weights: &ScoringWeights) -> Result<(), ValidationError> {
    let named = [
        ("major", weights.major),
        ("interests", weights.interests),
        ("idea", weights.idea),
        ("goals", weights.goals),
        ("tag_bonus", weights.tag_bonus),
    ];

    match named.iter().find(|(_, value)| !value.is_finite() || *value < 0.0) {
        Some(&(name, _)) => Err(ValidationError::InvalidWeight { name }),
        None => Ok(()),
    }
}

/// Score a single pair of profiles
///
/// composite = sum(weight_c * cosine_c) + min(shared_tags, max_tags) * tag_bonus
pub fn score_pair(a: &UserProfile, b: &UserProfile, weights: &ScoringWeights) -> PairScore {
    let major = cosine_similarity(&a.major, &b.major);
    let interests = cosine_similarity(&a.interests, &b.interests);
    let idea = cosine_similarity(&a.idea, &b.idea);
    let goals = cosine_similarity(&a.goals, &b.goals);

    let shared_tags = a.interests.shared_terms(&b.interests) + a.goals.shared_terms(&b.goals);
    let rewarded = shared_tags.min(weights.max_bonus_tags as usize);
    let bonus = rewarded as f64 * weights.tag_bonus;

    let mut pair = PairScore {
        major,
        interests,
        idea,
        goals,
        shared_tags,
        bonus,
        composite: 0.0,
    };
    pair.composite = Category::ALL
        .iter()
        .map(|&category| weights.weight(category) * pair.similarity(category))
        .sum::<f64>()
        + bonus;
    pair
}

/// Dense symmetric matrix of pairwise composite scores
///
/// Stored row-major in a flat `n * n` buffer, so memory grows with the
/// square of the cohort (8 bytes per cell). The diagonal holds 0 and is
/// never consulted by the assignment stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    size: usize,
    scores: Vec<f64>,
}

impl ScoreMatrix {
    /// Score every unordered pair of profiles
    ///
    /// Rows are computed in parallel; the matrix is only returned once all
    /// of them are written, so later stages always see the complete table.
    pub fn build(profiles: &[UserProfile], weights: &ScoringWeights) -> Self {
        let size = profiles.len();
        if size > MATRIX_WARN_PROFILES {
            tracing::warn!(
                "Scoring {} profiles: dense matrix needs ~{} MB",
                size,
                (size * size * std::mem::size_of::<f64>()) / (1024 * 1024)
            );
        }

        let upper: Vec<Vec<f64>> = (0..size)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..size)
                    .map(|j| score_pair(&profiles[i], &profiles[j], weights).composite)
                    .collect()
            })
            .collect();

        let mut scores = vec![0.0; size * size];
        for (i, row) in upper.iter().enumerate() {
            for (offset, &score) in row.iter().enumerate() {
                let j = i + 1 + offset;
                scores[i * size + j] = score;
                scores[j * size + i] = score;
            }
        }

        tracing::debug!("Built {}x{} score matrix", size, size);

        Self { size, scores }
    }

    /// Build from precomputed values (row-major); the upper triangle wins
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let size = rows.len();
        let mut scores = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let value = rows[i].get(j).copied().unwrap_or(0.0);
                scores[i * size + j] = value;
                scores[j * size + i] = value;
            }
        }
        Self { size, scores }
    }

    /// Number of profiles covered
    pub fn size(&self) -> usize {
        self.size
    }

    /// Composite score of a pair; 0 on the diagonal
    #[inline]
    pub fn score(&self, i: ProfileId, j: ProfileId) -> f64 {
        self.scores[i * self.size + j]
    }

    /// Sum of scores between `candidate` and every member
    #[inline]
    pub fn aggregate(&self, candidate: ProfileId, members: &[ProfileId]) -> f64 {
        members
            .iter()
            .filter(|&&m| m != candidate)
            .map(|&m| self.score(candidate, m))
            .sum()
    }

    /// Sum of all pairwise scores inside a group
    pub fn group_score(&self, members: &[ProfileId]) -> f64 {
        let mut total = 0.0;
        for (k, &a) in members.iter().enumerate() {
            for &b in &members[k + 1..] {
                total += self.score(a, b);
            }
        }
        total
    }
}
