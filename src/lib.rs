//! Teamforge - role-balanced team formation for student project cohorts
//!
//! Turns survey responses into three-person teams: profiles are scored
//! pairwise across several interest categories, partitioned by desired role,
//! and assembled greedily so each team gets an engineer and a finance lead
//! where the cohort allows it.
//!
//! The assignment is a deterministic greedy heuristic, not a global optimum:
//! identical input (including row order) always produces identical teams.

pub mod config;
pub mod core;
pub mod models;

// Re-export commonly used types
pub use core::{cosine_similarity, Formation, FormationError, Matcher, ScoreMatrix};
pub use models::{FormTeamsResponse, RawRecord, Role, ScoringWeights, Team, UserProfile};
