// Core algorithm exports
pub mod assembler;
pub mod leftovers;
pub mod matcher;
pub mod profile;
pub mod resolver;
pub mod roles;
pub mod scoring;
pub mod similarity;

pub use assembler::{assemble_teams, validate_partition, InvariantViolation};
pub use leftovers::{fill_open_slots, handle_leftovers, spawn_teams};
pub use matcher::{Formation, FormationError, Matcher};
pub use profile::{DuplicatePolicy, ProfileBuilder, ProfileOptions, RoleSynonyms, ValidationError, Vocabulary};
pub use resolver::{best_fit, resolve_role_slots};
pub use roles::{assign_roles, expected_team_count, Pools, RoleAssignment};
pub use scoring::{check_weights, score_pair, PairScore, ScoreMatrix};
pub use similarity::cosine_similarity;
