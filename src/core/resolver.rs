use crate::core::roles::Pools;
use crate::core::scoring::{ScoreMatrix, TIE_EPSILON};
use crate::models::{ProfileId, SlotNeed, TeamSkeleton};

/// Candidate with the highest aggregate score against `members`
///
/// Candidates must be yielded in ascending id order; a later candidate only
/// wins when it beats the current best by more than [`TIE_EPSILON`], so ties
/// resolve to the lowest id.
pub fn best_fit<'a, I>(candidates: I, members: &[ProfileId], matrix: &ScoreMatrix) -> Option<(ProfileId, f64)>
where
    I: IntoIterator<Item = &'a ProfileId>,
{
    let mut best: Option<(ProfileId, f64)> = None;
    for &candidate in candidates {
        let score = matrix.aggregate(candidate, members);
        match best {
            Some((_, current)) if score <= current + TIE_EPSILON => {}
            _ => best = Some((candidate, score)),
        }
    }
    best
}

/// Fill role-specific slots from their role pools
///
/// Skeletons are visited in creation order; within a skeleton the engineer
/// slot is filled before the finance slot. Each pick is removed from its pool
/// before the next one is made. A slot whose pool is empty stays open for the
/// leftover stage.
///
/// # Returns
/// Number of slots filled
pub fn resolve_role_slots(
    skeletons: &mut [TeamSkeleton],
    pools: &mut Pools,
    matrix: &ScoreMatrix,
) -> usize {
    let mut filled = 0;

    for (team, skeleton) in skeletons.iter_mut().enumerate() {
        for need in [SlotNeed::NeedsEngineer, SlotNeed::NeedsFinance] {
            let Some(role) = need.role() else {
                continue;
            };

            while let Some(pos) = skeleton.open_slots.iter().position(|s| *s == need) {
                let pool = pools.pool_mut(role);
                let Some((pick, score)) = best_fit(pool.iter(), &skeleton.members, matrix) else {
                    tracing::debug!("Skeleton {}: {} pool empty, slot left open", team, role);
                    break;
                };

                pool.remove(&pick);
                skeleton.members.push(pick);
                skeleton.open_slots.remove(pos);
                filled += 1;

                tracing::debug!("Skeleton {}: assigned {} {} (aggregate {:.4})", team, role, pick, score);
            }
        }
    }

    filled
}
