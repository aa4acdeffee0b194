use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stagerun_core::sim_trait::DeathCause;

use crate::collision::CollisionResults;
use crate::config::{PlatformerConfig, ViewportConfig};
use crate::physics::Player;
use crate::stage::{Bounds, GeometrySnapshot, StageData};

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Death(DeathCause),
    Victory { score: u32 },
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Stage loaded, waiting for a start signal.
    Idle,
    Running,
    Over(RunOutcome),
}

/// Horizontal scroll offset of the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
}

impl Camera {
    /// Keep the player at `camera_lead` of the view width, clamped to the
    /// playfield.
    pub fn follow(&mut self, player: &Player, bounds: &Bounds, viewport: &ViewportConfig) {
        let max_x = (bounds.right - viewport.width).max(bounds.left);
        self.x = (player.x - viewport.width * viewport.camera_lead).clamp(bounds.left, max_x);
    }
}

/// Everything a renderer or test needs to observe about a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimState {
    pub player: Player,
    pub camera: Camera,
    pub geometry: GeometrySnapshot,
    pub collision_results: CollisionResults,
    pub game_running: bool,
    pub game_over: bool,
    pub outcome: Option<RunOutcome>,
    /// Seconds.
    pub time_limit: f32,
    /// Seconds, never negative.
    pub time_remaining: f32,
    /// Wall-clock ms at which the current run started.
    pub game_start_time: f64,
    pub final_score: u32,
    /// Deaths across restarts of the same stage.
    pub death_count: u32,
}

impl SimState {
    /// Fresh, idle state for `stage`.
    pub fn new(stage: Arc<StageData>, config: &PlatformerConfig) -> Self {
        let radius = config.physics.player_radius;
        let spawn = stage.spawn_or_default(radius);
        let time_limit = stage.time_limit_or(config.rules.default_time_limit_secs);
        let geometry = GeometrySnapshot::from_stage(stage, config);
        let player = Player::new(spawn.x, spawn.y, radius);
        let mut camera = Camera::default();
        camera.follow(&player, &geometry.bounds, &config.viewport);
        Self {
            player,
            camera,
            geometry,
            collision_results: CollisionResults::default(),
            game_running: false,
            game_over: false,
            outcome: None,
            time_limit,
            time_remaining: time_limit,
            game_start_time: 0.0,
            final_score: 0,
            death_count: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        match (self.game_running, self.game_over, self.outcome) {
            (_, true, Some(outcome)) => RunPhase::Over(outcome),
            (true, false, _) => RunPhase::Running,
            _ => RunPhase::Idle,
        }
    }
}
