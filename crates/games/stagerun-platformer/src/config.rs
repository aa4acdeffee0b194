use serde::{Deserialize, Serialize};

/// Gravity acceleration (px per nominal frame squared, along gravity direction).
pub const GRAVITY: f32 = 0.6;
/// Initial vertical velocity of a jump (negative = against gravity).
pub const JUMP_FORCE: f32 = -12.0;
/// Maximum horizontal speed (px per nominal frame).
pub const MOVE_SPEED: f32 = 4.0;
/// Multiplier applied to every position update.
pub const GAME_SPEED: f32 = 2.0;
/// Player radius in px.
pub const PLAYER_RADIUS: f32 = 10.0;
/// Seconds on the clock when the stage does not declare a limit.
pub const DEFAULT_TIME_LIMIT_SECS: f32 = 60.0;

/// Configurable player physics, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformerPhysicsConfig {
    pub gravity: f32,
    pub jump_force: f32,
    pub move_speed: f32,
    /// Floor for |vx| once the player has given a directional input.
    pub min_move_speed: f32,
    /// Fraction of the gap to the target speed closed per nominal frame.
    pub horizontal_response: f32,
    pub max_fall_speed: f32,
    pub game_speed: f32,
    pub player_radius: f32,
}

impl Default for PlatformerPhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_force: JUMP_FORCE,
            move_speed: MOVE_SPEED,
            min_move_speed: 0.5,
            horizontal_response: 0.25,
            max_fall_speed: 15.0,
            game_speed: GAME_SPEED,
            player_radius: PLAYER_RADIUS,
        }
    }
}

/// Run rules that are not part of the stage description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Used when a stage omits `timeLimit`.
    pub default_time_limit_secs: f32,
    /// Lower edge of the playfield when the stage declares no bounds.
    pub fall_line_y: f32,
    /// Horizontal slack added around the stage geometry for derived bounds.
    pub bounds_margin: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            fall_line_y: 600.0,
            bounds_margin: 200.0,
        }
    }
}

/// Visible area, used for camera framing only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    /// Horizontal position of the player within the view, as a fraction.
    pub camera_lead: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            camera_lead: 0.3,
        }
    }
}

/// Top-level platformer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PlatformerConfig {
    pub physics: PlatformerPhysicsConfig,
    pub rules: RulesConfig,
    pub viewport: ViewportConfig,
}

impl PlatformerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("STAGERUN_PLATFORMER_CONFIG")
            .unwrap_or_else(|_| "config/platformer.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_or_default(&content, &path),
            Err(_) => PlatformerConfig::default(),
        }
    }

    fn from_toml_or_default(content: &str, origin: &str) -> Self {
        match toml::from_str::<PlatformerConfig>(content) {
            Ok(cfg) => {
                tracing::debug!("Loaded platformer config from {origin}");
                cfg
            },
            Err(e) => {
                tracing::warn!("Failed to parse {origin}: {e}, using defaults");
                PlatformerConfig::default()
            },
        }
    }
}
