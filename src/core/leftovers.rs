use crate::core::resolver::best_fit;
use crate::core::roles::Pools;
use crate::core::scoring::{ScoreMatrix, TIE_EPSILON};
use crate::models::{ProfileId, TeamSkeleton};
use std::collections::BTreeSet;

/// Fill every remaining slot, any role, from the leftover pool
///
/// Skeletons are visited in creation order. Once the pool runs dry the
/// remaining slots stay unfilled and those teams end with fewer members.
pub fn fill_open_slots(
    skeletons: &mut [TeamSkeleton],
    leftover: &mut BTreeSet<ProfileId>,
    matrix: &ScoreMatrix,
) -> usize {
    let mut filled = 0;

    for (team, skeleton) in skeletons.iter_mut().enumerate() {
        while !skeleton.open_slots.is_empty() {
            let Some((pick, score)) = best_fit(leftover.iter(), &skeleton.members, matrix) else {
                tracing::debug!(
                    "Skeleton {}: leftover pool exhausted with {} slot(s) open",
                    team,
                    skeleton.open_slots.len()
                );
                break;
            };

            leftover.remove(&pick);
            skeleton.members.push(pick);
            skeleton.open_slots.remove(0);
            filled += 1;

            tracing::debug!("Skeleton {}: filled open slot with {} (aggregate {:.4})", team, pick, score);
        }
    }

    filled
}

/// Highest-scoring pair in the pool; ties go to the lexicographically lowest ids
fn best_pair(pool: &BTreeSet<ProfileId>, matrix: &ScoreMatrix) -> Option<(ProfileId, ProfileId)> {
    let ids: Vec<ProfileId> = pool.iter().copied().collect();
    let mut best: Option<(ProfileId, ProfileId, f64)> = None;

    for (k, &a) in ids.iter().enumerate() {
        for &b in &ids[k + 1..] {
            let score = matrix.score(a, b);
            match best {
                Some((_, _, current)) if score <= current + TIE_EPSILON => {}
                _ => best = Some((a, b, score)),
            }
        }
    }

    best.map(|(a, b, _)| (a, b))
}

/// Form new teams from profiles still in the pool
///
/// Repeatedly takes the best remaining pair, then extends it with the
/// profile that fits the pair best, unless doing so would strand a single
/// profile. The pool is drained down to at most one profile.
pub fn spawn_teams(leftover: &mut BTreeSet<ProfileId>, matrix: &ScoreMatrix) -> Vec<Vec<ProfileId>> {
    let mut spawned = Vec::new();

    while leftover.len() >= 2 {
        let Some((a, b)) = best_pair(leftover, matrix) else {
            break;
        };
        leftover.remove(&a);
        leftover.remove(&b);
        let mut team = vec![a, b];

        let remaining = leftover.len();
        if remaining == 1 || remaining >= 3 {
            if let Some((c, _)) = best_fit(leftover.iter(), &team, matrix) {
                leftover.remove(&c);
                team.push(c);
            }
        }

        tracing::debug!("Spawned team {:?} (score {:.4})", team, matrix.group_score(&team));
        spawned.push(team);
    }

    spawned
}

/// Resolve everything the role pass left behind
///
/// Merges the role pools into the leftover pool, fills open slots, then
/// spawns new teams. A single profile that cannot form a team of its own
/// joins the best-fitting two-member team.
///
/// # Returns
/// Member lists: skeletons first (creation order), then spawned teams
pub fn handle_leftovers(
    mut skeletons: Vec<TeamSkeleton>,
    pools: &mut Pools,
    matrix: &ScoreMatrix,
) -> Vec<Vec<ProfileId>> {
    pools.merge_into_leftover();

    let leftover_before = pools.leftover.len();
    let filled = fill_open_slots(&mut skeletons, &mut pools.leftover, matrix);
    let spawned = spawn_teams(&mut pools.leftover, matrix);

    tracing::info!(
        "Leftover pass: {} profiles, {} open slots filled, {} teams spawned",
        leftover_before,
        filled,
        spawned.len()
    );

    let mut teams: Vec<Vec<ProfileId>> = skeletons.into_iter().map(|s| s.members).collect();
    teams.extend(spawned);

    if let Some(lone) = pools.leftover.pop_first() {
        let target = teams
            .iter()
            .enumerate()
            .filter(|(_, members)| members.len() == 2)
            .fold(None, |best: Option<(usize, f64)>, (index, members)| {
                let score = matrix.aggregate(lone, members);
                match best {
                    Some((_, current)) if score <= current + TIE_EPSILON => best,
                    _ => Some((index, score)),
                }
            });

        match target {
            Some((index, _)) => {
                tracing::warn!("Profile {} could not form a team; joining team {}", lone, index);
                teams[index].push(lone);
            }
            None => {
                tracing::warn!("Profile {} could not be placed in any team", lone);
                teams.push(vec![lone]);
            }
        }
    }

    teams
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotNeed;

    fn set(ids: &[ProfileId]) -> BTreeSet<ProfileId> {
        ids.iter().copied().collect()
    }

    fn uniform(size: usize, value: f64) -> ScoreMatrix {
        ScoreMatrix::from_rows(&vec![vec![value; size]; size])
    }

    #[test]
    fn test_fill_open_slots_any_role() {
        let matrix = ScoreMatrix::from_rows(&[
            vec![0.0, 0.2, 0.1, 0.8],
            vec![0.2, 0.0, 0.0, 0.0],
            vec![0.1, 0.0, 0.0, 0.0],
            vec![0.8, 0.0, 0.0, 0.0],
        ]);
        let mut skeletons = vec![TeamSkeleton::anchored(0, vec![SlotNeed::NeedsFinance, SlotNeed::Open])];
        let mut leftover = set(&[1, 2, 3]);

        let filled = fill_open_slots(&mut skeletons, &mut leftover, &matrix);

        assert_eq!(filled, 2);
        assert_eq!(skeletons[0].members, vec![0, 3, 1]);
        assert_eq!(leftover, set(&[2]));
    }

    #[test]
    fn test_exhausted_pool_leaves_two_member_team() {
        let matrix = uniform(3, 0.5);
        let mut skeletons = vec![TeamSkeleton::anchored(0, vec![SlotNeed::Open, SlotNeed::Open])];
        let mut leftover = set(&[1]);

        fill_open_slots(&mut skeletons, &mut leftover, &matrix);

        assert_eq!(skeletons[0].members, vec![0, 1]);
        assert_eq!(skeletons[0].open_slots.len(), 1);
    }

    #[test]
    fn test_spawn_picks_global_best_pair() {
        let matrix = ScoreMatrix::from_rows(&[
            vec![0.0, 0.1, 0.2, 0.3, 0.0],
            vec![0.1, 0.0, 0.1, 0.9, 0.0],
            vec![0.2, 0.1, 0.0, 0.2, 0.0],
            vec![0.3, 0.9, 0.2, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ]);
        let mut leftover = set(&[0, 1, 2, 3, 4]);

        let teams = spawn_teams(&mut leftover, &matrix);

        // Best pair (1, 3); third member 0 (0.1 + 0.3); then (2, 4) as a pair
        assert_eq!(teams, vec![vec![1, 3, 0], vec![2, 4]]);
        assert!(leftover.is_empty());
    }

    #[test]
    fn test_spawn_four_makes_two_pairs() {
        let mut leftover = set(&[0, 1, 2, 3]);
        let teams = spawn_teams(&mut leftover, &uniform(4, 0.5));

        // All ties: lowest ids first
        assert_eq!(teams, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_spawn_three_makes_one_team() {
        let mut leftover = set(&[4, 7, 9]);
        let teams = spawn_teams(&mut leftover, &uniform(10, 0.5));
        assert_eq!(teams, vec![vec![4, 7, 9]]);
    }

    #[test]
    fn test_handle_leftovers_merges_pools() {
        let matrix = uniform(6, 0.5);
        let skeletons = vec![TeamSkeleton::anchored(0, vec![SlotNeed::NeedsFinance])];
        let mut pools = Pools {
            engineer: set(&[1, 2]),
            other: set(&[3]),
            ..Default::default()
        };

        let teams = handle_leftovers(skeletons, &mut pools, &matrix);

        assert_eq!(teams, vec![vec![0, 1], vec![2, 3]]);
        assert!(pools.is_empty());
    }

    #[test]
    fn test_lone_profile_joins_pair() {
        let matrix = ScoreMatrix::from_rows(&[
            vec![0.0, 0.0, 0.0, 0.0, 0.1],
            vec![0.0, 0.0, 0.0, 0.0, 0.1],
            vec![0.0, 0.0, 0.0, 0.0, 0.4],
            vec![0.0, 0.0, 0.0, 0.0, 0.4],
            vec![0.1, 0.1, 0.4, 0.4, 0.0],
        ]);
        let mut skeletons = vec![
            TeamSkeleton::anchored(0, vec![]),
            TeamSkeleton::anchored(2, vec![]),
        ];
        skeletons[0].members.push(1);
        skeletons[1].members.push(3);
        let mut pools = Pools {
            leftover: set(&[4]),
            ..Default::default()
        };

        let teams = handle_leftovers(skeletons, &mut pools, &matrix);

        assert_eq!(teams, vec![vec![0, 1], vec![2, 3, 4]]);
    }
}
