use serde::{Deserialize, Serialize};

/// Core trait implemented by every frame-driven simulation.
///
/// The driver (render loop, headless runner) owns timing and input capture;
/// the simulation only advances its own state when `update` is called.
pub trait Simulation {
    /// Static description used by drivers for logging and window titles.
    fn metadata(&self) -> SimMetadata;

    /// Advance by one frame of `delta_ms` milliseconds. This is the only
    /// per-frame entry point; it always runs to completion.
    fn update(&mut self, delta_ms: f32) -> Vec<SimEvent>;

    /// Whether the current run has reached its terminal state.
    fn is_over(&self) -> bool;

    /// Rebuild the run state from scratch. Must be called between ticks.
    fn reset(&mut self);

    /// Called when the driver wants to freeze the simulation.
    fn pause(&mut self);

    /// Called when the driver resumes after `pause`.
    fn resume(&mut self);

    /// Serialize the read-only state for external observers.
    fn snapshot_json(&self) -> String;
}

/// Static information about a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimMetadata {
    pub name: String,
    pub description: String,
    /// Nominal frame rate the simulation's tuning is expressed against.
    pub nominal_hz: f32,
}

/// Why a run ended in death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Hole,
    Boundary,
    Spike,
    Ceiling,
    Timeout,
    /// Requested directly by a caller outside the per-tick scan.
    Forced,
}

/// Events emitted by a simulation during update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    RunStarted,
    RunRestarted,
    PlayerDied { cause: DeathCause, death_count: u32 },
    GoalReached { score: u32 },
    PlatformBroken { id: u32 },
    PlatformRegenerated { id: u32 },
    CeilingTriggered { id: u32 },
}

impl SimEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PlayerDied { .. } | Self::GoalReached { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events() {
        assert!(
            SimEvent::PlayerDied {
                cause: DeathCause::Hole,
                death_count: 1
            }
            .is_terminal()
        );
        assert!(SimEvent::GoalReached { score: 8 }.is_terminal());
        assert!(!SimEvent::PlatformBroken { id: 3 }.is_terminal());
        assert!(!SimEvent::RunStarted.is_terminal());
    }

    #[test]
    fn event_json_roundtrip() {
        let ev = SimEvent::PlayerDied {
            cause: DeathCause::Timeout,
            death_count: 2,
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }
}
