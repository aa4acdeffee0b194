//! Stage geometry: the immutable description a loader hands to the core,
//! plus the per-tick snapshot that carries the dynamic elements.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{PlatformerConfig, RulesConfig};
use crate::kinematics::GravityField;

const DEGENERATE_SPAN: f32 = 1e-4;

/// A line segment the player can stand on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Platform {
    pub fn left(&self) -> f32 {
        self.x1.min(self.x2)
    }

    pub fn right(&self) -> f32 {
        self.x1.max(self.x2)
    }

    /// Whether `x` lies within the segment's horizontal extent.
    pub fn spans(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }

    /// Height of the walking surface at `x` (interpolated for slopes).
    pub fn surface_y_at(&self, x: f32) -> f32 {
        let dx = self.x2 - self.x1;
        if dx.abs() < DEGENERATE_SPAN {
            return self.y1.min(self.y2);
        }
        let t = ((x - self.x1) / dx).clamp(0.0, 1.0);
        self.y1 + (self.y2 - self.y1) * t
    }

    /// Shortest distance from a point to the segment.
    pub fn distance_to(&self, px: f32, py: f32) -> f32 {
        let dx = self.x2 - self.x1;
        let dy = self.y2 - self.y1;
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq < DEGENERATE_SPAN {
            0.0
        } else {
            (((px - self.x1) * dx + (py - self.y1) * dy) / len_sq).clamp(0.0, 1.0)
        };
        let cx = self.x1 + t * dx;
        let cy = self.y1 + t * dy;
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }
}

/// A platform sliding horizontally between `start_x` and `end_x`.
///
/// `x1` is the tracked coordinate; `x2 - x1` never changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingPlatform {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub start_x: f32,
    pub end_x: f32,
    /// px per nominal frame.
    pub speed: f32,
    #[serde(default = "default_direction")]
    pub direction: f32,
}

impl MovingPlatform {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn segment(&self) -> Platform {
        Platform {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        }
    }
}

/// A zone that changes the gravity direction while the player touches it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GravityFlipPlatform {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// `+1` pulls down, `-1` pulls up.
    pub gravity_direction: f32,
    /// Seconds the flip lingers after leaving the zone; 0 = permanent.
    #[serde(default)]
    pub effect_duration: f32,
}

impl GravityFlipPlatform {
    pub fn segment(&self) -> Platform {
        Platform {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        }
    }

    pub fn touches(&self, x: f32, y: f32, radius: f32) -> bool {
        self.segment().distance_to(x, y) <= radius
    }
}

/// Axis-aligned rectangle (spikes, goal, falling ceilings).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Circle-vs-rectangle overlap via the closest point on the rectangle.
    pub fn overlaps_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        let nearest_x = cx.clamp(self.x, self.right());
        let nearest_y = cy.clamp(self.y, self.bottom());
        let dx = cx - nearest_x;
        let dy = cy - nearest_y;
        dx * dx + dy * dy < radius * radius
    }
}

pub type Spike = Rect;
pub type Goal = Rect;

/// Axis a moving spike oscillates along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A spike oscillating between `start` and `end` along `axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingSpike {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub axis: Axis,
    pub start: f32,
    pub end: f32,
    pub speed: f32,
    #[serde(default = "default_direction")]
    pub direction: f32,
}

impl MovingSpike {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// The coordinate that moves.
    pub fn position(&self) -> f32 {
        match self.axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    pub fn set_position(&mut self, pos: f32) {
        match self.axis {
            Axis::Horizontal => self.x = pos,
            Axis::Vertical => self.y = pos,
        }
    }
}

/// A gap `[x1, x2]` in the ground where falling out is a hole death.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub x1: f32,
    pub x2: f32,
}

impl Hole {
    pub fn contains(&self, x: f32) -> bool {
        x >= self.x1.min(self.x2) && x <= self.x1.max(self.x2)
    }
}

/// A platform that gives way after `max_hits` stomps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakablePlatform {
    pub id: u32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    #[serde(default = "default_max_hits")]
    pub max_hits: u32,
    /// Seconds until a broken platform restores itself; 0 = never.
    #[serde(default)]
    pub regenerate_after: f32,
    #[serde(default)]
    pub current_hits: u32,
    #[serde(default)]
    pub broken: bool,
    /// Seconds since the platform broke.
    #[serde(default)]
    pub broken_elapsed: f32,
}

impl BreakablePlatform {
    pub fn segment(&self) -> Platform {
        Platform {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        }
    }

    /// Register one stomp. Returns `true` if this hit broke the platform.
    pub fn register_hit(&mut self) -> bool {
        if self.broken {
            return false;
        }
        let max_hits = self.max_hits.max(1);
        self.current_hits = (self.current_hits + 1).min(max_hits);
        if self.current_hits >= max_hits {
            self.broken = true;
            self.broken_elapsed = 0.0;
            return true;
        }
        false
    }

    pub fn regenerate(&mut self) {
        self.current_hits = 0;
        self.broken = false;
        self.broken_elapsed = 0.0;
    }
}

/// A block that drops once the player walks under its trigger zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallingCeiling {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub trigger_x: f32,
    pub trigger_width: f32,
    /// px per nominal frame.
    pub fall_speed: f32,
    pub stop_y: f32,
    #[serde(default)]
    pub activated: bool,
}

impl FallingCeiling {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn in_trigger_zone(&self, x: f32) -> bool {
        x >= self.trigger_x && x <= self.trigger_x + self.trigger_width
    }

    /// Still moving and therefore lethal on contact.
    pub fn is_falling(&self) -> bool {
        self.activated && self.y < self.stop_y
    }
}

/// Playfield edges. Leaving them (other than through a hole) is a death.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub x: f32,
    pub y: f32,
}

/// Text placed in the stage; carried for renderers only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageText {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// A validated stage description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageData {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Seconds; absent means the configured default.
    #[serde(default)]
    pub time_limit: Option<f32>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub spawn: Option<Spawn>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub moving_platforms: Vec<MovingPlatform>,
    #[serde(default)]
    pub gravity_flip_platforms: Vec<GravityFlipPlatform>,
    #[serde(default)]
    pub holes: Vec<Hole>,
    #[serde(default)]
    pub spikes: Vec<Spike>,
    #[serde(default)]
    pub moving_spikes: Vec<MovingSpike>,
    #[serde(default)]
    pub breakable_platforms: Vec<BreakablePlatform>,
    #[serde(default)]
    pub falling_ceilings: Vec<FallingCeiling>,
    pub goal: Goal,
    #[serde(default)]
    pub start_text: Option<StageText>,
    #[serde(default)]
    pub goal_text: Option<StageText>,
}

/// Failure to obtain a stage description.
#[derive(Debug)]
pub enum StageError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(m) => write!(f, "stage read failed: {m}"),
            Self::Parse(m) => write!(f, "stage parse failed: {m}"),
        }
    }
}

impl std::error::Error for StageError {}

impl StageData {
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        serde_json::from_str(json).map_err(|e| StageError::Parse(e.to_string()))
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self, StageError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StageError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Parse a stage, substituting the built-in fallback stage on failure.
    pub fn load_or_fallback(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!("{e}, using fallback stage");
                Self::fallback()
            },
        }
    }

    /// A minimal stage that is always clearable: flat ground, goal at the end.
    pub fn fallback() -> Self {
        Self {
            id: 0,
            name: "Fallback".to_string(),
            description: "Built-in stage used when loading fails".to_string(),
            time_limit: None,
            bounds: None,
            spawn: None,
            platforms: vec![Platform {
                x1: 0.0,
                y1: 500.0,
                x2: 1000.0,
                y2: 500.0,
            }],
            moving_platforms: Vec::new(),
            gravity_flip_platforms: Vec::new(),
            holes: Vec::new(),
            spikes: Vec::new(),
            moving_spikes: Vec::new(),
            breakable_platforms: Vec::new(),
            falling_ceilings: Vec::new(),
            goal: Rect {
                x: 900.0,
                y: 450.0,
                width: 40.0,
                height: 50.0,
            },
            start_text: None,
            goal_text: None,
        }
    }

    pub fn time_limit_or(&self, default_secs: f32) -> f32 {
        self.time_limit.unwrap_or(default_secs)
    }

    /// Declared bounds, or bounds derived from the geometry's extent.
    pub fn bounds_or_derived(&self, rules: &RulesConfig, viewport_height: f32) -> Bounds {
        if let Some(bounds) = self.bounds {
            return bounds;
        }
        let mut min_x = self.goal.x;
        let mut max_x = self.goal.right();
        let mut extend = |lo: f32, hi: f32| {
            min_x = min_x.min(lo);
            max_x = max_x.max(hi);
        };
        for p in &self.platforms {
            extend(p.left(), p.right());
        }
        for p in &self.moving_platforms {
            extend(p.start_x, p.end_x + p.width().abs());
        }
        for p in &self.breakable_platforms {
            let seg = p.segment();
            extend(seg.left(), seg.right());
        }
        for p in &self.gravity_flip_platforms {
            let seg = p.segment();
            extend(seg.left(), seg.right());
        }
        Bounds {
            left: min_x - rules.bounds_margin,
            right: max_x + rules.bounds_margin,
            top: -viewport_height,
            bottom: rules.fall_line_y,
        }
    }

    /// Declared spawn, or a point resting on the first platform.
    pub fn spawn_or_default(&self, radius: f32) -> Spawn {
        if let Some(spawn) = self.spawn {
            return spawn;
        }
        match self.platforms.first() {
            Some(p) => {
                let x = (p.left() + 50.0).min(p.right());
                Spawn {
                    x,
                    y: p.surface_y_at(x) - radius,
                }
            },
            None => Spawn { x: 0.0, y: 0.0 },
        }
    }
}

/// Per-tick view of the stage geometry.
///
/// Static geometry is shared through `stage`; dynamic elements are owned
/// copies that the kinematic updater replaces wholesale each tick.
#[derive(Debug, Clone, Serialize)]
pub struct GeometrySnapshot {
    #[serde(skip)]
    pub stage: Arc<StageData>,
    pub bounds: Bounds,
    pub moving_platforms: Vec<MovingPlatform>,
    /// Horizontal displacement of each moving platform during the last tick.
    pub platform_shift: Vec<f32>,
    pub moving_spikes: Vec<MovingSpike>,
    pub breakable_platforms: Vec<BreakablePlatform>,
    pub falling_ceilings: Vec<FallingCeiling>,
    /// Top edge each ceiling fell from during the last tick; `None` if it did
    /// not fall.
    pub ceiling_fall_from: Vec<Option<f32>>,
    pub gravity: GravityField,
}

impl GeometrySnapshot {
    pub fn from_stage(stage: Arc<StageData>, config: &PlatformerConfig) -> Self {
        let bounds = stage.bounds_or_derived(&config.rules, config.viewport.height);
        Self {
            bounds,
            moving_platforms: stage.moving_platforms.clone(),
            platform_shift: vec![0.0; stage.moving_platforms.len()],
            moving_spikes: stage.moving_spikes.clone(),
            breakable_platforms: stage.breakable_platforms.clone(),
            falling_ceilings: stage.falling_ceilings.clone(),
            ceiling_fall_from: vec![None; stage.falling_ceilings.len()],
            gravity: GravityField::default(),
            stage,
        }
    }

    pub fn breakable(&self, id: u32) -> Option<&BreakablePlatform> {
        self.breakable_platforms.iter().find(|b| b.id == id)
    }

    pub fn ceiling(&self, id: u32) -> Option<&FallingCeiling> {
        self.falling_ceilings.iter().find(|c| c.id == id)
    }

    /// Area each ceiling swept through during the last tick, for those that fell.
    pub fn ceiling_sweeps(&self) -> impl Iterator<Item = Rect> + '_ {
        self.falling_ceilings
            .iter()
            .zip(&self.ceiling_fall_from)
            .filter_map(|(c, from)| {
                let from = (*from)?;
                let top = from.min(c.y);
                Some(Rect {
                    x: c.x,
                    y: top,
                    width: c.width,
                    height: (c.y - top) + c.height,
                })
            })
    }
}

fn default_direction() -> f32 {
    1.0
}

fn default_max_hits() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGE_JSON: &str = r#"{
        "id": 2,
        "name": "Stage 2",
        "description": "Moving Platform Tutorial",
        "timeLimit": 45,
        "platforms": [{"x1": -500, "y1": 500, "x2": 300, "y2": 500}],
        "movingPlatforms": [
            {"x1": 350, "y1": 480, "x2": 430, "y2": 480,
             "startX": 350, "endX": 450, "speed": 0.8, "direction": 1}
        ],
        "holes": [{"x1": 300, "x2": 350}],
        "spikes": [{"x": 100, "y": 480, "width": 30, "height": 20}],
        "movingSpikes": [
            {"x": 200, "y": 400, "width": 20, "height": 20,
             "axis": "vertical", "start": 380, "end": 460, "speed": 1.0}
        ],
        "breakablePlatforms": [
            {"id": 7, "x1": 500, "y1": 450, "x2": 600, "y2": 450,
             "maxHits": 2, "regenerateAfter": 3}
        ],
        "fallingCeilings": [
            {"id": 1, "x": 700, "y": 100, "width": 80, "height": 30,
             "triggerX": 680, "triggerWidth": 40, "fallSpeed": 5, "stopY": 460}
        ],
        "goal": {"x": 2400, "y": 400, "width": 40, "height": 50},
        "startText": {"x": 50, "y": 450, "text": "STAGE 2"},
        "leftEdgeMessage": {"x": -400, "y": 450, "text": "ignored"}
    }"#;

    #[test]
    fn parses_stage_json() {
        let stage = StageData::from_json(STAGE_JSON).unwrap();
        assert_eq!(stage.id, 2);
        assert_eq!(stage.time_limit, Some(45.0));
        assert_eq!(stage.moving_platforms[0].start_x, 350.0);
        assert_eq!(stage.moving_spikes[0].axis, Axis::Vertical);
        assert_eq!(stage.moving_spikes[0].direction, 1.0);
        let b = &stage.breakable_platforms[0];
        assert_eq!((b.max_hits, b.current_hits, b.broken), (2, 0, false));
        assert!(!stage.falling_ceilings[0].activated);
        assert_eq!(stage.start_text.as_ref().map(|t| t.text.as_str()), Some("STAGE 2"));
    }

    #[test]
    fn malformed_stage_uses_fallback() {
        let stage = StageData::load_or_fallback("{\"platforms\": 12");
        assert_eq!(stage, StageData::fallback());
        assert!(matches!(
            StageData::from_json("{}"),
            Err(StageError::Parse(_))
        ));
    }

    #[test]
    fn missing_time_limit_uses_default() {
        let stage = StageData::fallback();
        assert_eq!(stage.time_limit_or(60.0), 60.0);
        let stage = StageData::from_json(STAGE_JSON).unwrap();
        assert_eq!(stage.time_limit_or(60.0), 45.0);
    }

    #[test]
    fn derived_bounds_cover_geometry() {
        let stage = StageData::from_json(STAGE_JSON).unwrap();
        let rules = RulesConfig::default();
        let bounds = stage.bounds_or_derived(&rules, 600.0);
        assert_eq!(bounds.left, -500.0 - rules.bounds_margin);
        assert_eq!(bounds.right, 2440.0 + rules.bounds_margin);
        assert_eq!(bounds.bottom, rules.fall_line_y);
        assert!(bounds.top < 0.0);
    }

    #[test]
    fn default_spawn_rests_on_first_platform() {
        let stage = StageData::fallback();
        let spawn = stage.spawn_or_default(10.0);
        assert_eq!(spawn.x, 50.0);
        assert_eq!(spawn.y, 490.0);
    }

    #[test]
    fn sloped_surface_interpolates() {
        let p = Platform {
            x1: 0.0,
            y1: 500.0,
            x2: 100.0,
            y2: 400.0,
        };
        assert_eq!(p.surface_y_at(50.0), 450.0);
        assert_eq!(p.surface_y_at(-20.0), 500.0);
        assert!(p.spans(100.0) && !p.spans(100.5));
    }

    #[test]
    fn circle_rect_overlap() {
        let r = Rect {
            x: 100.0,
            y: 100.0,
            width: 20.0,
            height: 20.0,
        };
        assert!(r.overlaps_circle(110.0, 110.0, 1.0));
        assert!(r.overlaps_circle(95.0, 110.0, 10.0));
        assert!(!r.overlaps_circle(85.0, 85.0, 10.0));
    }

    #[test]
    fn breakable_hits_saturate() {
        let mut b = StageData::from_json(STAGE_JSON).unwrap().breakable_platforms[0];
        assert!(!b.register_hit());
        assert!(b.register_hit());
        assert!(!b.register_hit());
        assert_eq!(b.current_hits, b.max_hits);
        assert!(b.broken);
        b.regenerate();
        assert_eq!((b.current_hits, b.broken), (0, false));
    }
}
