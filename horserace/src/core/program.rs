use crate::core::horse::Horse;
use rand::seq::SliceRandom;
use rand::Rng;

/// The horses assigned to one round of the program.
pub type RoundLineup = Vec<Horse>;

/// pick_random_horses draws `count` distinct horses from the roster, uniformly at random.
pub fn pick_random_horses<R: Rng + ?Sized>(
    roster: &[Horse],
    count: usize,
    rng: &mut R,
) -> RoundLineup {
    let mut lineup = roster.to_vec();
    lineup.shuffle(rng);
    lineup.truncate(count);
    lineup
}

/// build_program_table draws an independent lineup for every round. The same horse may run in
/// several rounds, never twice in one round.
pub fn build_program_table<R: Rng + ?Sized>(
    roster: &[Horse],
    no_rounds: usize,
    lineup_size: usize,
    rng: &mut R,
) -> Vec<RoundLineup> {
    (0..no_rounds)
        .map(|_| pick_random_horses(roster, lineup_size, &mut *rng))
        .collect()
}

/// load_in_race_set copies a lineup into a fresh in-race set with the round progress reset.
pub fn load_in_race_set(lineup: &[Horse]) -> Vec<Horse> {
    lineup.iter().map(Horse::reset_for_round).collect()
}

/// sync_lineup writes the final race outcome of every horse back into its (id-matched) lineup
/// entry. Identity and condition are left untouched.
pub fn sync_lineup(lineup: &mut [Horse], in_race_set: &[Horse]) {
    for horse in lineup.iter_mut() {
        if let Some(raced) = in_race_set.iter().find(|h| h.id == horse.id) {
            horse.elapsed = raced.elapsed;
            horse.speed = raced.speed;
            horse.time = raced.time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::horse::generate_horses;
    use crate::pre::read_sim_pars::EnginePars;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn every_round_gets_distinct_horses_from_the_roster() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let roster = generate_horses(&EnginePars::default(), &mut rng);
        let program = build_program_table(&roster, 6, 10, &mut rng);

        assert_eq!(program.len(), 6);
        for lineup in program.iter() {
            assert_eq!(lineup.len(), 10);
            let ids: HashSet<u32> = lineup.iter().map(|h| h.id).collect();
            assert_eq!(ids.len(), 10);
            for horse in lineup.iter() {
                assert!(roster.contains(horse));
            }
        }
    }

    #[test]
    fn lineups_are_drawn_independently() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let roster = generate_horses(&EnginePars::default(), &mut rng);
        let program = build_program_table(&roster, 50, 10, &mut rng);

        let first: Vec<u32> = program[0].iter().map(|h| h.id).collect();
        assert!(program
            .iter()
            .skip(1)
            .any(|lineup| lineup.iter().map(|h| h.id).collect::<Vec<u32>>() != first));
    }

    #[test]
    fn lineup_may_cover_the_whole_roster() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let roster = generate_horses(&EnginePars::default(), &mut rng);
        let lineup = pick_random_horses(&roster, roster.len(), &mut rng);

        let ids: HashSet<u32> = lineup.iter().map(|h| h.id).collect();
        assert_eq!(ids.len(), roster.len());
    }

    #[test]
    fn in_race_set_is_an_independent_copy() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let roster = generate_horses(&EnginePars::default(), &mut rng);
        let lineup = pick_random_horses(&roster, 10, &mut rng);

        let mut in_race = load_in_race_set(&lineup);
        assert_eq!(in_race, lineup);

        in_race[0].elapsed = 500.0;
        in_race[0].finished = true;
        assert_eq!(lineup[0].elapsed, 0.0);
        assert!(!lineup[0].finished);
    }

    #[test]
    fn sync_copies_outcome_by_id() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let roster = generate_horses(&EnginePars::default(), &mut rng);
        let mut lineup = pick_random_horses(&roster, 10, &mut rng);

        let mut in_race = load_in_race_set(&lineup);
        in_race.reverse();
        for (i, horse) in in_race.iter_mut().enumerate() {
            horse.elapsed = 1400.0 + i as f64;
            horse.speed = 50.0 + i as f64;
            horse.time = 15.0 + i as f64;
            horse.finished = true;
        }

        sync_lineup(&mut lineup, &in_race);

        for horse in lineup.iter() {
            let raced = in_race.iter().find(|h| h.id == horse.id).unwrap();
            assert_eq!(horse.elapsed, raced.elapsed);
            assert_eq!(horse.speed, raced.speed);
            assert_eq!(horse.time, raced.time);
            // finished is not part of the write-back
            assert!(!horse.finished);
        }
    }
}
