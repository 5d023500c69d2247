use crate::core::resolver::best_fit;
use crate::core::scoring::{ScoreMatrix, TIE_EPSILON};
use crate::models::{ProfileId, Role, SlotNeed, TeamSkeleton, UserProfile};
use std::collections::BTreeSet;

/// Working sets of unassigned profile ids
///
/// Ids live in exactly one pool at a time and leave it for good once
/// assigned. `BTreeSet` keeps iteration in ascending id order, which is
/// what every tie-break relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pools {
    pub engineer: BTreeSet<ProfileId>,
    pub finance: BTreeSet<ProfileId>,
    pub other: BTreeSet<ProfileId>,
    pub leftover: BTreeSet<ProfileId>,
}

impl Pools {
    /// Split all profiles by role preference
    pub fn partition(profiles: &[UserProfile]) -> Self {
        let mut pools = Self::default();
        for (id, profile) in profiles.iter().enumerate() {
            pools.pool_mut(profile.role).insert(id);
        }
        pools
    }

    pub fn pool_mut(&mut self, role: Role) -> &mut BTreeSet<ProfileId> {
        match role {
            Role::Engineer => &mut self.engineer,
            Role::Finance => &mut self.finance,
            Role::Other => &mut self.other,
        }
    }

    /// Move every profile still in a role pool into the leftover pool
    pub fn merge_into_leftover(&mut self) {
        let engineer = std::mem::take(&mut self.engineer);
        let finance = std::mem::take(&mut self.finance);
        let other = std::mem::take(&mut self.other);
        self.leftover.extend(engineer);
        self.leftover.extend(finance);
        self.leftover.extend(other);
    }

    /// Profiles not yet placed in any team
    pub fn unassigned(&self) -> usize {
        self.engineer.len() + self.finance.len() + self.other.len() + self.leftover.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unassigned() == 0
    }
}

/// Output of role assignment: skeletons in anchor order plus the remaining pools
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAssignment {
    pub skeletons: Vec<TeamSkeleton>,
    pub pools: Pools,
}

/// Number of teams a run of `total` profiles ends with
///
/// `floor(total / 3)` anchored teams, plus one spawned pair when the cohort
/// does not divide evenly. Fewer than two profiles cannot form a team.
pub fn expected_team_count(total: usize) -> usize {
    match total {
        0 | 1 => 0,
        2 => 1,
        _ => total / 3 + usize::from(total % 3 != 0),
    }
}

/// Slots for the roles an anchor does not already cover
fn slots_for(anchor_role: Role) -> Vec<SlotNeed> {
    match anchor_role {
        Role::Other => vec![SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance],
        Role::Engineer => vec![SlotNeed::NeedsFinance, SlotNeed::Open],
        Role::Finance => vec![SlotNeed::NeedsEngineer, SlotNeed::Open],
    }
}

/// Pick the next anchor: `Other` first, then the larger of the two role pools
fn take_anchor(pools: &mut Pools) -> Option<(ProfileId, Role)> {
    if let Some(id) = pools.other.pop_first() {
        return Some((id, Role::Other));
    }

    let role = if pools.engineer.len() >= pools.finance.len() {
        Role::Engineer
    } else {
        Role::Finance
    };
    pools.pool_mut(role).pop_first().map(|id| (id, role))
}

/// Keep a scarce role's slots on the skeletons its candidates fit best
///
/// Applies only when fewer candidates remain than skeletons asking for the
/// role. Each round pairs the best-fitting (skeleton, candidate) against the
/// skeleton's anchor; ties go to the earlier skeleton, then the lower id.
/// Skeletons left without a candidate get the slot re-tagged as open.
fn ration_role_slots(
    skeletons: &mut [TeamSkeleton],
    need: SlotNeed,
    pool: &BTreeSet<ProfileId>,
    matrix: &ScoreMatrix,
) {
    let mut waiting: Vec<usize> = skeletons
        .iter()
        .enumerate()
        .filter(|(_, s)| s.open_slots.contains(&need))
        .map(|(team, _)| team)
        .collect();
    if waiting.len() <= pool.len() {
        return;
    }

    let mut candidates = pool.clone();
    while !candidates.is_empty() {
        let mut best: Option<(usize, ProfileId, f64)> = None;
        for &team in &waiting {
            if let Some((pick, score)) = best_fit(candidates.iter(), &skeletons[team].members, matrix) {
                match best {
                    Some((_, _, current)) if score <= current + TIE_EPSILON => {}
                    _ => best = Some((team, pick, score)),
                }
            }
        }
        let Some((team, pick, score)) = best else {
            break;
        };

        candidates.remove(&pick);
        waiting.retain(|&t| t != team);
        tracing::debug!("Skeleton {}: keeps {:?} slot for {} (aggregate {:.4})", team, need, pick, score);
    }

    for team in waiting {
        for slot in skeletons[team].open_slots.iter_mut().filter(|s| **s == need) {
            *slot = SlotNeed::Open;
        }
    }
}

/// Drop one slot so a cohort of `3N + 1` never strands a single profile
///
/// Prefers an open slot on the latest skeleton that has one; otherwise the
/// last skeleton loses its last slot.
fn drop_surplus_slot(skeletons: &mut [TeamSkeleton]) {
    let open = skeletons
        .iter()
        .rposition(|s| s.open_slots.contains(&SlotNeed::Open));

    if let Some(team) = open {
        let slots = &mut skeletons[team].open_slots;
        if let Some(pos) = slots.iter().rposition(|s| *s == SlotNeed::Open) {
            slots.remove(pos);
        }
    } else if let Some(last) = skeletons.last_mut() {
        last.open_slots.pop();
    }
}

/// Partition profiles and seed one skeleton per anchor
///
/// Seeds `floor(n / 3)` skeletons. When a role pool holds fewer candidates
/// than the skeletons asking for that role, the slots stay with the
/// skeletons those candidates fit best and the rest become open. When
/// `n mod 3 == 1` one slot is dropped so the leftover stage is left with a
/// pair rather than a lone profile.
pub fn assign_roles(profiles: &[UserProfile], matrix: &ScoreMatrix) -> RoleAssignment {
    let total = profiles.len();
    let anchor_count = total / 3;
    let mut pools = Pools::partition(profiles);

    let mut skeletons: Vec<TeamSkeleton> = Vec::with_capacity(anchor_count);
    while skeletons.len() < anchor_count {
        let Some((anchor, role)) = take_anchor(&mut pools) else {
            break;
        };
        skeletons.push(TeamSkeleton::anchored(anchor, slots_for(role)));
    }

    ration_role_slots(&mut skeletons, SlotNeed::NeedsEngineer, &pools.engineer, matrix);
    ration_role_slots(&mut skeletons, SlotNeed::NeedsFinance, &pools.finance, matrix);

    if total % 3 == 1 {
        drop_surplus_slot(&mut skeletons);
    }

    tracing::info!(
        "Seeded {} skeletons (pools: {} engineer, {} finance, {} other)",
        skeletons.len(),
        pools.engineer.len(),
        pools.finance.len(),
        pools.other.len()
    );

    RoleAssignment { skeletons, pools }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DomainVector, ScoringWeights};

    fn profile(row: usize, role: Role) -> UserProfile {
        UserProfile {
            row,
            email: format!("user{}@x.edu", row),
            full_name: format!("User {}", row),
            class_year: "2026".to_string(),
            submitted_at: None,
            role,
            has_idea: false,
            idea_stage: String::new(),
            major: DomainVector::default(),
            interests: DomainVector::default(),
            idea: DomainVector::default(),
            goals: DomainVector::default(),
        }
    }

    fn roster(roles: &[Role]) -> Vec<UserProfile> {
        roles.iter().enumerate().map(|(i, &r)| profile(i, r)).collect()
    }

    fn assign(profiles: &[UserProfile]) -> RoleAssignment {
        let matrix = ScoreMatrix::build(profiles, &ScoringWeights::default());
        assign_roles(profiles, &matrix)
    }

    fn matrix_with(size: usize, pairs: &[(usize, usize, f64)]) -> ScoreMatrix {
        let mut rows = vec![vec![0.0; size]; size];
        for &(i, j, score) in pairs {
            rows[i][j] = score;
            rows[j][i] = score;
        }
        ScoreMatrix::from_rows(&rows)
    }

    #[test]
    fn test_expected_team_count() {
        assert_eq!(expected_team_count(0), 0);
        assert_eq!(expected_team_count(2), 1);
        assert_eq!(expected_team_count(3), 1);
        assert_eq!(expected_team_count(4), 2);
        assert_eq!(expected_team_count(5), 2);
        assert_eq!(expected_team_count(7), 3);
        assert_eq!(expected_team_count(9), 3);
    }

    #[test]
    fn test_anchors_prefer_other() {
        use Role::*;
        let profiles = roster(&[Engineer, Other, Finance, Other, Engineer, Finance]);
        let assignment = assign(&profiles);

        assert_eq!(assignment.skeletons.len(), 2);
        assert_eq!(assignment.skeletons[0].members, vec![1]);
        assert_eq!(assignment.skeletons[1].members, vec![3]);
        assert_eq!(
            assignment.skeletons[0].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance]
        );
        assert!(assignment.pools.other.is_empty());
        assert_eq!(assignment.pools.unassigned(), 4);
    }

    #[test]
    fn test_anchor_fallback_uses_larger_pool() {
        use Role::*;
        let profiles = roster(&[Finance, Engineer, Engineer, Finance, Engineer, Finance]);
        let assignment = assign(&profiles);

        // Engineer pool (3) >= Finance (3): first anchor is the lowest engineer,
        // then finance is larger
        assert_eq!(assignment.skeletons[0].members, vec![1]);
        assert_eq!(assignment.skeletons[1].members, vec![0]);
        assert_eq!(
            assignment.skeletons[0].open_slots,
            vec![SlotNeed::NeedsFinance, SlotNeed::Open]
        );
        assert_eq!(
            assignment.skeletons[1].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::Open]
        );
    }

    #[test]
    fn test_short_pool_slots_become_open() {
        use Role::*;
        let profiles = roster(&[Other, Engineer, Finance, Other, Other, Other, Other]);
        let assignment = assign(&profiles);

        assert_eq!(assignment.skeletons.len(), 2);
        assert_eq!(
            assignment.skeletons[0].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance]
        );
        // Zero scores: the lone engineer and finance slots stay with the
        // first skeleton, and the second loses one of its open slots
        assert_eq!(assignment.skeletons[1].open_slots, vec![SlotNeed::Open]);
    }

    #[test]
    fn test_scarce_finance_slot_follows_best_fit() {
        use Role::*;
        let profiles = roster(&[Other, Other, Engineer, Engineer, Finance, Other, Other]);
        let matrix = matrix_with(7, &[(4, 1, 0.35)]);

        let assignment = assign_roles(&profiles, &matrix);

        assert_eq!(assignment.skeletons[0].members, vec![0]);
        assert_eq!(assignment.skeletons[1].members, vec![1]);
        // The single finance profile fits the second anchor; the first
        // skeleton's open slot is the one dropped for the 3N + 1 cohort
        assert_eq!(assignment.skeletons[0].open_slots, vec![SlotNeed::NeedsEngineer]);
        assert_eq!(
            assignment.skeletons[1].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance]
        );
    }

    #[test]
    fn test_scarce_slot_tie_goes_to_earlier_skeleton() {
        use Role::*;
        let profiles = roster(&[Other, Other, Engineer, Engineer, Finance, Other]);
        let matrix = matrix_with(6, &[(4, 0, 0.2), (4, 1, 0.2)]);

        let assignment = assign_roles(&profiles, &matrix);

        assert_eq!(
            assignment.skeletons[0].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance]
        );
        assert_eq!(
            assignment.skeletons[1].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::Open]
        );
    }

    #[test]
    fn test_fully_supplied_cohort_drops_last_slot() {
        use Role::*;
        let profiles = roster(&[Other, Engineer, Finance, Other, Engineer, Finance, Other]);
        let assignment = assign(&profiles);

        assert_eq!(
            assignment.skeletons[0].open_slots,
            vec![SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance]
        );
        assert_eq!(assignment.skeletons[1].open_slots, vec![SlotNeed::NeedsEngineer]);
    }

    #[test]
    fn test_missing_role_pool_opens_all_slots() {
        use Role::*;
        let profiles = roster(&[Other, Other, Other, Other, Other, Other]);
        let assignment = assign(&profiles);

        for skeleton in &assignment.skeletons {
            assert!(skeleton.open_slots.iter().all(|s| *s == SlotNeed::Open));
            assert_eq!(skeleton.open_slots.len(), 2);
        }
    }

    #[test]
    fn test_small_roster_has_no_skeletons() {
        let profiles = roster(&[Role::Engineer, Role::Finance]);
        let assignment = assign(&profiles);

        assert!(assignment.skeletons.is_empty());
        assert_eq!(assignment.pools.unassigned(), 2);
    }

    #[test]
    fn test_merge_into_leftover() {
        let mut pools = Pools::partition(&roster(&[Role::Engineer, Role::Other, Role::Finance]));
        pools.merge_into_leftover();

        assert!(pools.engineer.is_empty() && pools.finance.is_empty() && pools.other.is_empty());
        assert_eq!(pools.leftover.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
