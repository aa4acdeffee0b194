pub mod collision;
pub mod config;
pub mod kinematics;
pub mod physics;
pub mod rules;
pub mod scoring;
pub mod stage;
pub mod stage_gen;
pub mod state;

use std::sync::Arc;

use stagerun_core::clock::Clock;
use stagerun_core::sim_trait::{SimEvent, SimMetadata, Simulation};

use collision::{CollisionChecker, StageCollider};
use config::PlatformerConfig;
use physics::{PlatformerInput, integrate_player};
use rules::{RunTransition, apply_rules};
use stage::StageData;
use state::{RunPhase, SimState};

/// One player's attempt sequence on a single stage.
pub struct PlatformerRun {
    stage: Arc<StageData>,
    config: PlatformerConfig,
    clock: Box<dyn Clock>,
    collider: Box<dyn CollisionChecker>,
    state: SimState,
    pending_input: PlatformerInput,
    /// Wall-clock ms at which the run was paused.
    paused_at: Option<f64>,
}

impl PlatformerRun {
    pub fn new(stage: StageData, config: PlatformerConfig, clock: impl Clock + 'static) -> Self {
        let stage = Arc::new(stage);
        let state = SimState::new(Arc::clone(&stage), &config);
        Self {
            stage,
            config,
            clock: Box::new(clock),
            collider: Box::new(StageCollider),
            state,
            pending_input: PlatformerInput::default(),
            paused_at: None,
        }
    }

    /// Swap the collision strategy.
    pub fn with_collider(mut self, collider: impl CollisionChecker + 'static) -> Self {
        self.collider = Box::new(collider);
        self
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn stage(&self) -> &StageData {
        &self.stage
    }

    pub fn config(&self) -> &PlatformerConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    /// Merge the latest input. Held flags take the newest value; `start` and
    /// `restart` stay set until a tick consumes them.
    pub fn set_input(&mut self, input: PlatformerInput) {
        self.pending_input.left = input.left;
        self.pending_input.right = input.right;
        self.pending_input.jump = input.jump;
        if input.start {
            self.pending_input.start = true;
        }
        if input.restart {
            self.pending_input.restart = true;
        }
    }

    /// Rebuild the run between ticks, keeping the death count.
    pub fn restart(&mut self) {
        let death_count = self.state.death_count;
        self.state = SimState::new(Arc::clone(&self.stage), &self.config);
        self.state.death_count = death_count;
        self.begin();
        tracing::info!(stage = self.stage.id, death_count, "run restarted");
    }

    /// Replace the stage. All run state, including the death count, is discarded.
    pub fn load_stage(&mut self, stage: StageData) {
        tracing::info!(stage = stage.id, name = %stage.name, "stage loaded");
        self.stage = Arc::new(stage);
        self.state = SimState::new(Arc::clone(&self.stage), &self.config);
        self.pending_input = PlatformerInput::default();
    }

    /// Kill the player immediately. Returns the resulting event, if any.
    pub fn trigger_player_death(&mut self) -> Option<SimEvent> {
        let transition = rules::trigger_player_death(&mut self.state)?;
        Some(self.finish(transition))
    }

    /// Award the goal immediately. Returns the resulting event, if any.
    pub fn trigger_goal_reached(&mut self) -> Option<SimEvent> {
        let now = self.clock.now_ms();
        let transition = rules::trigger_goal_reached(&mut self.state, now)?;
        Some(self.finish(transition))
    }

    fn begin(&mut self) {
        self.state.game_running = true;
        self.state.game_over = false;
        self.state.game_start_time = self.clock.now_ms();
        self.state.time_remaining = self.state.time_limit;
    }

    fn finish(&mut self, transition: RunTransition) -> SimEvent {
        match transition {
            RunTransition::Died { cause, death_count } => {
                tracing::info!(?cause, death_count, "player died");
                SimEvent::PlayerDied { cause, death_count }
            },
            RunTransition::Won { score } => {
                tracing::info!(score, deaths = self.state.death_count, "goal reached");
                SimEvent::GoalReached { score }
            },
        }
    }

    /// Consume pending `start` / `restart` edges.
    fn consume_reset_signals(&mut self, events: &mut Vec<SimEvent>) {
        let (start, restart) = (self.pending_input.start, self.pending_input.restart);
        self.pending_input.start = false;
        self.pending_input.restart = false;
        if !start && !restart {
            return;
        }
        match self.state.phase() {
            RunPhase::Idle => {
                self.begin();
                tracing::info!(stage = self.stage.id, "run started");
                events.push(SimEvent::RunStarted);
            },
            RunPhase::Over(_) => {
                self.restart();
                events.push(SimEvent::RunRestarted);
            },
            RunPhase::Running if restart => {
                self.restart();
                events.push(SimEvent::RunRestarted);
            },
            RunPhase::Running => {},
        }
    }

    fn tick(&mut self, delta_ms: f32, events: &mut Vec<SimEvent>) {
        let input = self.pending_input;

        let (geometry, geometry_events) =
            kinematics::advance_geometry(&self.state.geometry, &self.state.player, delta_ms);
        self.state.geometry = geometry;
        events.extend(geometry_events);

        integrate_player(
            &mut self.state.player,
            &input,
            self.state.geometry.gravity.direction,
            delta_ms,
            &self.config.physics,
        );

        let report = self
            .collider
            .resolve(&mut self.state.player, &self.state.geometry);
        self.state.collision_results = report.results;
        if !report.stomped.is_empty() {
            let (geometry, stomp_events) =
                kinematics::register_stomps(&self.state.geometry, &report.stomped);
            self.state.geometry = geometry;
            events.extend(stomp_events);
        }

        self.state.camera.follow(
            &self.state.player,
            &self.state.geometry.bounds,
            &self.config.viewport,
        );

        let now = self.clock.now_ms();
        if let Some(transition) = apply_rules(&mut self.state, now) {
            events.push(self.finish(transition));
        }
    }
}

impl Simulation for PlatformerRun {
    fn metadata(&self) -> SimMetadata {
        SimMetadata {
            name: "Stage Run".to_string(),
            description: "Single-player side-scrolling platformer against the clock".to_string(),
            nominal_hz: 1000.0 / stagerun_core::NOMINAL_FRAME_MS,
        }
    }

    fn update(&mut self, delta_ms: f32) -> Vec<SimEvent> {
        if self.paused_at.is_some() {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.consume_reset_signals(&mut events);
        if self.state.game_running && !self.state.game_over {
            self.tick(delta_ms, &mut events);
        }
        events
    }

    fn is_over(&self) -> bool {
        self.state.game_over
    }

    fn reset(&mut self) {
        self.restart();
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.clock.now_ms());
        }
    }

    /// Paused time is not charged against the countdown.
    fn resume(&mut self) {
        let Some(paused_at) = self.paused_at.take() else {
            return;
        };
        if self.state.game_running && !self.state.game_over {
            self.state.game_start_time += (self.clock.now_ms() - paused_at).max(0.0);
        }
    }

    fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_default()
    }
}
