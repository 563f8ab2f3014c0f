use balance::replay_buffer::{ExperienceReplay, Transition};
use balance::schedule::Schedule;
use ndarray::array;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn transition(id: usize) -> Transition {
    Transition {
        state: array![id as f32],
        action: 0,
        reward: id as f32,
        next_state: array![id as f32 + 1.0],
        done: false,
    }
}

proptest! {
    #[test]
    fn test_buffer_holds_last_n(capacity in 1usize..64, appended in 0usize..200) {
        let mut buffer = ExperienceReplay::new(capacity).unwrap();
        for id in 0..appended {
            buffer.append(transition(id));
        }

        let kept = appended.min(capacity);
        prop_assert_eq!(buffer.len(), kept);
        let mut rewards: Vec<usize> = buffer.iter().map(|t| t.reward as usize).collect();
        rewards.sort_unstable();
        let expected: Vec<usize> = (appended - kept..appended).collect();
        prop_assert_eq!(rewards, expected);
    }

    #[test]
    fn test_sample_rows_come_from_buffer(appended in 1usize..100, batch in 1usize..32, seed in any::<u64>()) {
        let mut buffer = ExperienceReplay::new(50).unwrap();
        for id in 0..appended {
            buffer.append(transition(id));
        }
        let mut rng = StdRng::seed_from_u64(seed);

        match buffer.sample(batch, &mut rng) {
            Ok(sampled) => {
                prop_assert!(batch <= buffer.len());
                prop_assert_eq!(sampled.len(), batch);
                for row in 0..batch {
                    prop_assert_eq!(sampled.next_states[[row, 0]], sampled.states[[row, 0]] + 1.0);
                    prop_assert_eq!(sampled.rewards[row], sampled.states[[row, 0]]);
                }
            }
            Err(_) => prop_assert!(batch > buffer.len()),
        }
    }

    #[test]
    fn test_epsilon_stays_in_bounds(
        lower in 0.0f32..0.5,
        upper in 0.5f32..=1.0,
        fraction in 0.0f32..=1.0,
        total in 1usize..500,
        epoch in 0usize..1000,
    ) {
        let schedule = Schedule::epsilon(upper, lower, fraction, total).unwrap();
        let value = schedule.value_at(epoch);
        prop_assert!(value >= lower - 1e-6 && value <= upper + 1e-6);

        let decay_epochs = (fraction as f64 * total as f64).floor() as usize;
        prop_assert_eq!(schedule.value_at(decay_epochs), lower);
        if epoch >= decay_epochs {
            prop_assert_eq!(value, lower);
        }
    }

    #[test]
    fn test_learning_rate_never_below_floor(
        initial in 1e-4f32..1.0,
        decay in 0.5f32..=1.0,
        floor_fraction in 0.0f32..=1.0,
        epoch in 0usize..100_000,
    ) {
        let floor = initial * floor_fraction;
        let schedule = Schedule::learning_rate(initial, decay, floor).unwrap();
        let value = schedule.value_at(epoch);
        prop_assert!(value >= floor);
        prop_assert!(value <= initial);
    }
}
