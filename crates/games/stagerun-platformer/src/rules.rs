//! Win and loss rules, evaluated once per tick after collision.

use serde::{Deserialize, Serialize};
use stagerun_core::sim_trait::DeathCause;

use crate::collision::{CollisionOutcome, CollisionResults};
use crate::scoring::final_score;
use crate::state::{RunOutcome, SimState};

/// A terminal transition produced by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunTransition {
    Died { cause: DeathCause, death_count: u32 },
    Won { score: u32 },
}

fn lethal_cause(results: &CollisionResults) -> Option<DeathCause> {
    match results.dominant() {
        CollisionOutcome::Hole => Some(DeathCause::Hole),
        CollisionOutcome::Boundary => Some(DeathCause::Boundary),
        CollisionOutcome::Spike => Some(DeathCause::Spike),
        CollisionOutcome::Ceiling => Some(DeathCause::Ceiling),
        CollisionOutcome::Goal | CollisionOutcome::None => None,
    }
}

fn refresh_time_remaining(state: &mut SimState, now_ms: f64) {
    let elapsed_secs = ((now_ms - state.game_start_time) / 1000.0) as f32;
    state.time_remaining = (state.time_limit - elapsed_secs).max(0.0);
}

fn die(state: &mut SimState, cause: DeathCause) -> RunTransition {
    state.game_over = true;
    state.death_count += 1;
    state.outcome = Some(RunOutcome::Death(cause));
    RunTransition::Died {
        cause,
        death_count: state.death_count,
    }
}

fn win(state: &mut SimState) -> RunTransition {
    let score = final_score(state.time_remaining);
    state.game_over = true;
    state.final_score = score;
    state.outcome = Some(RunOutcome::Victory { score });
    RunTransition::Won { score }
}

fn accepts_transition(state: &SimState) -> bool {
    state.game_running && !state.game_over
}

/// Evaluate the tick's collisions and the clock.
///
/// Order: lethal collisions, then timeout, then goal. A tick that reports
/// both a lethal collision and the goal is a death.
pub fn apply_rules(state: &mut SimState, now_ms: f64) -> Option<RunTransition> {
    if !accepts_transition(state) {
        return None;
    }
    if let Some(cause) = lethal_cause(&state.collision_results) {
        return Some(die(state, cause));
    }
    refresh_time_remaining(state, now_ms);
    if state.time_remaining <= 0.0 {
        return Some(die(state, DeathCause::Timeout));
    }
    if state.collision_results.goal_collision {
        return Some(win(state));
    }
    None
}

/// Kill the player outside the per-tick scan. No-op once the run is over.
pub fn trigger_player_death(state: &mut SimState) -> Option<RunTransition> {
    if !accepts_transition(state) {
        return None;
    }
    Some(die(state, DeathCause::Forced))
}

/// Award the goal outside the per-tick scan. No-op once the run is over.
pub fn trigger_goal_reached(state: &mut SimState, now_ms: f64) -> Option<RunTransition> {
    if !accepts_transition(state) {
        return None;
    }
    refresh_time_remaining(state, now_ms);
    Some(win(state))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::PlatformerConfig;
    use crate::stage::StageData;

    fn running(time_limit: f32, start_ms: f64) -> SimState {
        let stage = StageData {
            time_limit: Some(time_limit),
            ..StageData::fallback()
        };
        let mut state = SimState::new(Arc::new(stage), &PlatformerConfig::default());
        state.game_running = true;
        state.game_start_time = start_ms;
        state
    }

    #[test]
    fn clock_counts_down_then_kills() {
        let mut state = running(10.0, 1000.0);
        assert_eq!(apply_rules(&mut state, 4000.0), None);
        assert_eq!(state.time_remaining, 7.0);
        assert!(!state.game_over);

        let t = apply_rules(&mut state, 16000.0);
        assert_eq!(
            t,
            Some(RunTransition::Died {
                cause: DeathCause::Timeout,
                death_count: 1
            })
        );
        assert_eq!(state.time_remaining, 0.0);
        assert!(state.game_over);
    }

    #[test]
    fn goal_scores_remaining_seconds_rounded_up() {
        let mut state = running(10.0, 0.0);
        state.collision_results.goal_collision = true;
        let t = apply_rules(&mut state, 2700.0);
        assert_eq!(t, Some(RunTransition::Won { score: 8 }));
        assert_eq!(state.final_score, 8);
        assert_eq!(state.death_count, 0);
        assert_eq!(state.outcome, Some(RunOutcome::Victory { score: 8 }));
    }

    #[test]
    fn lethal_collision_beats_goal() {
        let mut state = running(10.0, 0.0);
        state.collision_results.hole_collision = true;
        state.collision_results.goal_collision = true;
        let t = apply_rules(&mut state, 1000.0);
        assert!(matches!(
            t,
            Some(RunTransition::Died {
                cause: DeathCause::Hole,
                ..
            })
        ));
        assert_eq!(state.final_score, 0);
    }

    #[test]
    fn lethal_collision_beats_timeout() {
        let mut state = running(1.0, 0.0);
        state.collision_results.spike_collision = true;
        let t = apply_rules(&mut state, 5000.0);
        assert!(matches!(
            t,
            Some(RunTransition::Died {
                cause: DeathCause::Spike,
                ..
            })
        ));
    }

    #[test]
    fn over_is_terminal() {
        let mut state = running(10.0, 0.0);
        state.collision_results.boundary_collision = true;
        assert!(apply_rules(&mut state, 100.0).is_some());
        let snapshot = (state.death_count, state.time_remaining, state.outcome);

        state.collision_results.goal_collision = true;
        assert_eq!(apply_rules(&mut state, 200.0), None);
        assert_eq!(trigger_player_death(&mut state), None);
        assert_eq!(trigger_goal_reached(&mut state, 300.0), None);
        assert_eq!(
            (state.death_count, state.time_remaining, state.outcome),
            snapshot
        );
    }

    #[test]
    fn idle_run_ignores_rules() {
        let mut state = running(10.0, 0.0);
        state.game_running = false;
        state.collision_results.hole_collision = true;
        assert_eq!(apply_rules(&mut state, 100.0), None);
        assert_eq!(state.death_count, 0);
    }

    #[test]
    fn forced_death_and_goal() {
        let mut state = running(10.0, 0.0);
        assert_eq!(
            trigger_player_death(&mut state),
            Some(RunTransition::Died {
                cause: DeathCause::Forced,
                death_count: 1
            })
        );

        let mut state = running(10.0, 0.0);
        assert_eq!(
            trigger_goal_reached(&mut state, 500.0),
            Some(RunTransition::Won { score: 10 })
        );
    }

    // ================================================================
    // Property-based tests (proptest)
    // ================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn death_count_never_decreases(
                ticks in proptest::collection::vec(
                    (any::<bool>(), any::<bool>(), any::<bool>(), 0.0f64..2000.0),
                    1..40,
                ),
            ) {
                let mut state = running(30.0, 0.0);
                let mut now = 0.0;
                let mut last_deaths = 0;
                for (hole, goal, restart, step) in ticks {
                    now += step;
                    state.collision_results.hole_collision = hole;
                    state.collision_results.goal_collision = goal;
                    apply_rules(&mut state, now);
                    prop_assert!(state.death_count >= last_deaths);
                    prop_assert!(state.death_count <= last_deaths + 1);
                    prop_assert!(state.time_remaining >= 0.0);
                    last_deaths = state.death_count;
                    if restart && state.game_over {
                        state.game_over = false;
                        state.outcome = None;
                        state.game_start_time = now;
                    }
                }
            }
        }
    }
}
