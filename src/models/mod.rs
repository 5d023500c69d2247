// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Category, DomainVector, ProfileId, Role, ScoringWeights, SlotNeed, Team, TeamSkeleton, TermId, UserProfile};
pub use requests::RawRecord;
pub use responses::{ErrorResponse, FormTeamsResponse, TeamMember, TeamSummary};
