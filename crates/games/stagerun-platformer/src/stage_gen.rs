//! Seeded stage generation and jump clearability scoring.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::PlatformerPhysicsConfig;
use crate::stage::{BreakablePlatform, Hole, MovingPlatform, Platform, Rect, StageData};

/// Generated stages end around this x.
pub const STAGE_WIDTH: f32 = 2500.0;
/// Ground height of the start platform.
pub const BASE_Y: f32 = 500.0;
/// Highest ledge the generator places.
const MIN_LEDGE_Y: f32 = 300.0;
/// Max height change between consecutive ledges.
const MAX_STEP: f32 = 50.0;
const MIN_GAP: f32 = 40.0;
const START_LEFT: f32 = -500.0;
const START_RIGHT: f32 = 300.0;
const MOVING_WIDTH: f32 = 80.0;
const BREAKABLE_WIDTH: f32 = 100.0;
const FINISH_WIDTH: f32 = 300.0;

/// How far a jump carries with a given physics tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpReach {
    /// Apex height in px.
    pub max_height: f32,
    /// Horizontal distance covered landing at take-off height.
    pub max_distance: f32,
    /// Distance a player clears without precise timing.
    pub safe_distance: f32,
}

impl JumpReach {
    pub fn from_physics(cfg: &PlatformerPhysicsConfig) -> Self {
        let jump = cfg.jump_force.abs();
        let max_height = jump * jump / (2.0 * cfg.gravity);
        let max_distance = 2.0 * jump * cfg.move_speed * cfg.game_speed / cfg.gravity;
        Self {
            max_height,
            max_distance,
            safe_distance: 0.7 * max_distance,
        }
    }
}

impl Default for JumpReach {
    fn default() -> Self {
        Self::from_physics(&PlatformerPhysicsConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpGrade {
    Safe,
    Difficult,
    Impossible,
}

/// A horizontal stretch the player can stand on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ledge {
    left: f32,
    right: f32,
    y: f32,
}

/// Grade a jump across `gap` px that climbs `rise` px (negative = drop).
pub fn grade_jump(gap: f32, rise: f32, reach: &JumpReach) -> JumpGrade {
    if gap > reach.max_distance || rise > reach.max_height {
        JumpGrade::Impossible
    } else if gap > reach.safe_distance || rise > 0.7 * reach.max_height {
        JumpGrade::Difficult
    } else {
        JumpGrade::Safe
    }
}

/// Jump grades between consecutive ledges of a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearabilityReport {
    pub safe: usize,
    pub difficult: usize,
    pub impossible: usize,
}

impl ClearabilityReport {
    pub fn assess(stage: &StageData, reach: &JumpReach) -> Self {
        let mut ledges: Vec<Ledge> = Vec::new();
        for p in &stage.platforms {
            ledges.push(Ledge {
                left: p.left(),
                right: p.right(),
                y: p.y1.min(p.y2),
            });
        }
        for p in &stage.breakable_platforms {
            let seg = p.segment();
            ledges.push(Ledge {
                left: seg.left(),
                right: seg.right(),
                y: seg.y1.min(seg.y2),
            });
        }
        // A mover is reachable anywhere along its travel.
        for p in &stage.moving_platforms {
            ledges.push(Ledge {
                left: p.start_x,
                right: p.end_x + p.width().abs(),
                y: p.y1.min(p.y2),
            });
        }
        ledges.sort_by(|a, b| a.left.total_cmp(&b.left));

        let mut report = Self::default();
        for pair in ledges.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let gap = (to.left - from.right).max(0.0);
            let rise = from.y - to.y;
            match grade_jump(gap, rise, reach) {
                JumpGrade::Safe => report.safe += 1,
                JumpGrade::Difficult => report.difficult += 1,
                JumpGrade::Impossible => report.impossible += 1,
            }
        }
        report
    }

    pub fn is_clearable(&self) -> bool {
        self.impossible == 0
    }
}

/// Score `stage` against the default physics tuning.
pub fn clearability(stage: &StageData) -> ClearabilityReport {
    ClearabilityReport::assess(stage, &JumpReach::default())
}

/// Generate a deterministic stage from a seed.
pub fn generate_stage(seed: u64) -> StageData {
    let reach = JumpReach::default();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut stage = StageData {
        id: 0,
        name: format!("Generated {seed}"),
        description: "Procedurally generated stage".to_string(),
        time_limit: Some(60.0),
        platforms: vec![Platform {
            x1: START_LEFT,
            y1: BASE_Y,
            x2: START_RIGHT,
            y2: BASE_Y,
        }],
        ..StageData::fallback()
    };
    stage.spawn = None;

    let max_gap = (reach.safe_distance * 0.6).max(MIN_GAP);
    let mut cursor = START_RIGHT;
    let mut y = BASE_Y;
    let mut next_id = 1;

    while cursor < STAGE_WIDTH - FINISH_WIDTH {
        let gap = rng.random_range(MIN_GAP..=max_gap);
        let ledge_y = (y + rng.random_range(-MAX_STEP..=MAX_STEP)).clamp(MIN_LEDGE_Y, BASE_Y);
        let left = cursor + gap;

        let (right, pit_end) = match rng.random_range(0u8..4) {
            0 => {
                // Plain ledge
                let right = left + rng.random_range(100.0..=220.0);
                stage.platforms.push(flat(left, right, ledge_y));
                (right, left)
            },
            1 => {
                // Mover over a pit
                let travel = rng.random_range(120.0..=300.0);
                stage.moving_platforms.push(MovingPlatform {
                    x1: left,
                    y1: ledge_y,
                    x2: left + MOVING_WIDTH,
                    y2: ledge_y,
                    start_x: left,
                    end_x: left + travel,
                    speed: rng.random_range(0.6..=1.4),
                    direction: 1.0,
                });
                let right = left + travel + MOVING_WIDTH;
                (right, right)
            },
            2 => {
                // Crumbling ledge
                let right = left + BREAKABLE_WIDTH;
                stage.breakable_platforms.push(BreakablePlatform {
                    id: next_id,
                    x1: left,
                    y1: ledge_y,
                    x2: right,
                    y2: ledge_y,
                    max_hits: rng.random_range(2..=3),
                    regenerate_after: 3.0,
                    current_hits: 0,
                    broken: false,
                    broken_elapsed: 0.0,
                });
                next_id += 1;
                (right, left)
            },
            _ => {
                // Wide ledge with a spike to hop
                let right = left + 240.0;
                stage.platforms.push(flat(left, right, ledge_y));
                stage.spikes.push(Rect {
                    x: left + 105.0,
                    y: ledge_y - 20.0,
                    width: 30.0,
                    height: 20.0,
                });
                (right, left)
            },
        };

        stage.holes.push(Hole {
            x1: cursor,
            x2: pit_end,
        });
        cursor = right;
        y = ledge_y;
    }

    let gap = rng.random_range(MIN_GAP..=max_gap);
    let finish_left = cursor + gap;
    let finish_right = finish_left + FINISH_WIDTH;
    stage.holes.push(Hole {
        x1: cursor,
        x2: finish_left,
    });
    stage.platforms.push(flat(finish_left, finish_right, y));
    stage.goal = Rect {
        x: finish_right - 80.0,
        y: y - 50.0,
        width: 40.0,
        height: 50.0,
    };

    tracing::debug!(
        seed,
        platforms = stage.platforms.len(),
        movers = stage.moving_platforms.len(),
        breakables = stage.breakable_platforms.len(),
        "generated stage"
    );
    stage
}

fn flat(left: f32, right: f32, y: f32) -> Platform {
    Platform {
        x1: left,
        y1: y,
        x2: right,
        y2: y,
    }
}
