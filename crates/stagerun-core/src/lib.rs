pub mod clock;
pub mod effect;
pub mod sim_trait;

/// Nominal frame duration (60 Hz) in milliseconds. Per-frame tuning values
/// are expressed against this.
pub const NOMINAL_FRAME_MS: f32 = 16.67;

/// Normalize a frame duration against the nominal 60 Hz frame.
///
/// Negative and non-finite inputs map to zero so a misbehaving driver cannot
/// run the simulation backwards.
#[inline]
pub fn dt_factor(delta_ms: f32) -> f32 {
    if delta_ms.is_finite() && delta_ms > 0.0 {
        delta_ms / NOMINAL_FRAME_MS
    } else {
        0.0
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::sim_trait::{SimEvent, Simulation};

    /// One nominal 60 Hz frame.
    pub const FRAME_60HZ_MS: f32 = crate::NOMINAL_FRAME_MS;

    /// Run N ticks of `delta_ms`, returning all accumulated events.
    pub fn run_ticks(sim: &mut dyn Simulation, n: usize, delta_ms: f32) -> Vec<SimEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(sim.update(delta_ms));
        }
        all_events
    }

    /// Run ticks until the simulation reports it is over or `max_ticks` pass.
    /// Returns the number of ticks executed.
    pub fn run_until_over(sim: &mut dyn Simulation, max_ticks: usize, delta_ms: f32) -> usize {
        for i in 0..max_ticks {
            if sim.is_over() {
                return i;
            }
            sim.update(delta_ms);
        }
        max_ticks
    }

    // ================================================================
    // Simulation Contract Tests
    // ================================================================
    // Every Simulation implementation calls these from its own tests with a
    // concrete instance in the documented starting condition.

    /// Once over, update() must not change the observable state.
    pub fn contract_no_op_after_over(sim: &mut dyn Simulation) {
        assert!(sim.is_over(), "contract requires a finished run");
        let before = sim.snapshot_json();
        let events = run_ticks(sim, 5, FRAME_60HZ_MS);
        let after = sim.snapshot_json();
        assert!(events.is_empty(), "no events may fire after the run is over");
        assert_eq!(before, after, "state must not change after the run is over");
    }

    /// reset() must bring a finished run back to a live one.
    pub fn contract_reset_restores_running(sim: &mut dyn Simulation) {
        sim.reset();
        assert!(!sim.is_over(), "reset() must clear the terminal state");
    }

    /// pause() must freeze the state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(sim: &mut dyn Simulation) {
        sim.pause();
        let before = sim.snapshot_json();
        sim.update(FRAME_60HZ_MS * 4.0);
        let during_pause = sim.snapshot_json();
        assert_eq!(before, during_pause, "state must not change while paused");

        sim.resume();
        sim.update(FRAME_60HZ_MS * 4.0);
        let after_resume = sim.snapshot_json();
        assert_ne!(during_pause, after_resume, "state must change after resume");
    }
}
