//! Property tests for move planning and step scheduling.

use filament_router::motion::{Direction, MotionPhase, MovePlan, MoveScheduler, Tick};
use proptest::prelude::*;

fn ramp_steps(speed: f32, acceleration: f32) -> u32 {
    (speed * speed / (2.0 * acceleration)) as u32
}

proptest! {
    #[test]
    fn phases_add_up_to_the_move(
        steps in -200_000i32..200_000,
        speed in 1.0f32..10_000.0,
        acceleration in 200.0f32..15_000.0,
    ) {
        prop_assume!(steps != 0);
        let plan = MovePlan::new(steps, speed, acceleration).unwrap();

        prop_assert_eq!(plan.total_steps, steps.unsigned_abs());
        prop_assert_eq!(
            plan.accel_steps + plan.cruise_steps + plan.decel_steps,
            steps.unsigned_abs()
        );
        prop_assert_eq!(plan.direction, Direction::from_steps(steps));
    }

    #[test]
    fn short_moves_are_symmetric_triangles(
        steps in 1u32..20_000,
        speed in 100.0f32..10_000.0,
        acceleration in 200.0f32..15_000.0,
    ) {
        prop_assume!(2 * ramp_steps(speed, acceleration) as u64 >= steps as u64);
        let plan = MovePlan::new(steps as i32, speed, acceleration).unwrap();

        prop_assert!(plan.is_triangular());
        prop_assert_eq!(plan.cruise_steps, 0);
        prop_assert!(plan.decel_steps - plan.accel_steps <= 1);
        prop_assert!(plan.cruise_rate <= speed);
    }

    #[test]
    fn long_moves_cruise_at_max_speed(
        steps in 1u32..200_000,
        speed in 100.0f32..10_000.0,
        acceleration in 200.0f32..15_000.0,
    ) {
        let ramp = ramp_steps(speed, acceleration);
        prop_assume!((2 * ramp as u64) < steps as u64);
        let plan = MovePlan::new(steps as i32, speed, acceleration).unwrap();

        prop_assert_eq!(plan.accel_steps, ramp);
        prop_assert_eq!(plan.decel_steps, ramp);
        prop_assert_eq!(plan.phase_at(ramp), MotionPhase::Cruising);
        prop_assert_eq!(plan.cruise_rate, speed);
    }

    #[test]
    fn intervals_never_beat_the_cruise_rate(
        steps in 1i32..5_000,
        speed in 100.0f32..10_000.0,
        acceleration in 200.0f32..15_000.0,
    ) {
        let plan = MovePlan::new(steps, speed, acceleration).unwrap();
        let shortest = (1_000_000.0 / plan.cruise_rate) as u32;

        for step in 0..plan.total_steps {
            prop_assert!(plan.interval_at(step) >= shortest.max(1));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn scheduler_pulses_every_planned_step(
        steps in -400i32..400,
        speed in 500.0f32..10_000.0,
        acceleration in 1_000.0f32..15_000.0,
    ) {
        prop_assume!(steps != 0);
        let plan = MovePlan::new(steps, speed, acceleration).unwrap();
        let mut scheduler = MoveScheduler::new(plan, false);

        let mut pulses = 0u32;
        loop {
            match scheduler.tick(50, || false) {
                Tick::StepPulse => {
                    pulses += 1;
                    if scheduler.is_complete() {
                        break;
                    }
                }
                Tick::Idle => {}
                Tick::Done(_) => break,
            }
        }

        prop_assert_eq!(pulses, steps.unsigned_abs());
        prop_assert_eq!(scheduler.steps_remaining(), 0);
    }
}
