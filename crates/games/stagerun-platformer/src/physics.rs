use serde::{Deserialize, Serialize};
use stagerun_core::dt_factor;

use crate::config::PlatformerPhysicsConfig;

/// What the player is standing on, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    Static,
    /// Index into the snapshot's moving platforms.
    Moving(usize),
    /// Breakable platform id.
    Breakable(u32),
}

/// The player body. Position is the circle centre.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub grounded: bool,
    pub support: Option<Support>,
    /// Position before the last integration step, for swept landing checks.
    pub prev_x: f32,
    pub prev_y: f32,
    /// Set once any directional input has been given.
    pub has_moved: bool,
    /// Last horizontal input direction (-1 or +1).
    pub facing: f32,
}

impl Player {
    pub fn new(spawn_x: f32, spawn_y: f32, radius: f32) -> Self {
        Self {
            x: spawn_x,
            y: spawn_y,
            vx: 0.0,
            vy: 0.0,
            radius,
            grounded: false,
            support: None,
            prev_x: spawn_x,
            prev_y: spawn_y,
            has_moved: false,
            facing: 1.0,
        }
    }

    pub fn land(&mut self, feet_y: f32, gravity_dir: f32, support: Support) {
        self.y = feet_y - self.radius * gravity_dir;
        self.vy = 0.0;
        self.grounded = true;
        self.support = Some(support);
    }

    pub fn leave_ground(&mut self) {
        self.grounded = false;
        self.support = None;
    }
}

/// Control state for one tick.
///
/// `left`, `right` and `jump` are held flags; `start` and `restart` are
/// edges that the session consumes once.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformerInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub start: bool,
    pub restart: bool,
}

impl PlatformerInput {
    /// -1 (left), 0, +1 (right). Opposing keys cancel.
    pub fn move_dir(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Integrate player motion for one frame of `delta_ms`.
///
/// Acceleration is constant within a frame, so positions advance by the mean
/// of the old and new velocity. Horizontal speed approaches its target
/// exponentially. Both keep split frames close to a single frame of the same
/// total duration.
pub fn integrate_player(
    player: &mut Player,
    input: &PlatformerInput,
    gravity_dir: f32,
    delta_ms: f32,
    cfg: &PlatformerPhysicsConfig,
) {
    player.prev_x = player.x;
    player.prev_y = player.y;

    let f = dt_factor(delta_ms);
    if f == 0.0 {
        return;
    }
    let g = if gravity_dir < 0.0 { -1.0 } else { 1.0 };

    // Jump
    if input.jump && player.grounded {
        player.vy = cfg.jump_force * g;
        player.leave_ground();
    }

    let vx0 = player.vx;
    let vy0 = player.vy;

    // Gravity
    if !player.grounded {
        player.vy =
            (player.vy + cfg.gravity * g * f).clamp(-cfg.max_fall_speed, cfg.max_fall_speed);
    }

    // Horizontal
    let move_dir = input.move_dir();
    if move_dir != 0.0 {
        player.has_moved = true;
        player.facing = move_dir;
    }
    let target = move_dir * cfg.move_speed;
    let response = cfg.horizontal_response.clamp(0.0, 1.0);
    let blend = 1.0 - (1.0 - response).powf(f);
    player.vx =
        (player.vx + (target - player.vx) * blend).clamp(-cfg.move_speed, cfg.move_speed);
    if player.has_moved && player.vx.abs() < cfg.min_move_speed {
        let sign = if player.vx != 0.0 {
            player.vx.signum()
        } else {
            player.facing
        };
        player.vx = cfg.min_move_speed * sign;
    }

    let scale = f * cfg.game_speed;
    player.x += (vx0 + player.vx) * 0.5 * scale;
    player.y += (vy0 + player.vy) * 0.5 * scale;
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagerun_core::NOMINAL_FRAME_MS;

    fn cfg() -> PlatformerPhysicsConfig {
        PlatformerPhysicsConfig::default()
    }

    fn airborne(vx: f32, vy: f32) -> Player {
        let mut p = Player::new(0.0, 0.0, 10.0);
        p.vx = vx;
        p.vy = vy;
        p
    }

    #[test]
    fn gravity_pulls_down() {
        let mut p = airborne(0.0, 0.0);
        integrate_player(&mut p, &PlatformerInput::default(), 1.0, NOMINAL_FRAME_MS, &cfg());
        assert!(p.vy > 0.0);
        assert!(p.y > 0.0);
    }

    #[test]
    fn flipped_gravity_pulls_up() {
        let mut p = airborne(0.0, 0.0);
        integrate_player(&mut p, &PlatformerInput::default(), -1.0, NOMINAL_FRAME_MS, &cfg());
        assert!(p.vy < 0.0);
        assert!(p.y < 0.0);
    }

    #[test]
    fn jump_requires_ground() {
        let jump = PlatformerInput {
            jump: true,
            ..Default::default()
        };
        let mut p = airborne(0.0, 3.0);
        integrate_player(&mut p, &jump, 1.0, NOMINAL_FRAME_MS, &cfg());
        assert!(p.vy > 3.0, "airborne jump must be ignored");

        let mut p = airborne(0.0, 0.0);
        p.grounded = true;
        integrate_player(&mut p, &jump, 1.0, NOMINAL_FRAME_MS, &cfg());
        assert!(!p.grounded);
        assert!(p.vy < 0.0);
        assert!(p.y < 0.0, "jump moves against gravity");
    }

    #[test]
    fn jump_under_flipped_gravity_goes_down() {
        let mut p = airborne(0.0, 0.0);
        p.grounded = true;
        let jump = PlatformerInput {
            jump: true,
            ..Default::default()
        };
        integrate_player(&mut p, &jump, -1.0, NOMINAL_FRAME_MS, &cfg());
        assert!(p.vy > 0.0);
    }

    #[test]
    fn grounded_player_does_not_fall() {
        let mut p = airborne(0.0, 0.0);
        p.grounded = true;
        integrate_player(&mut p, &PlatformerInput::default(), 1.0, NOMINAL_FRAME_MS, &cfg());
        assert_eq!(p.y, 0.0);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn fall_speed_is_capped() {
        let mut p = airborne(0.0, 0.0);
        for _ in 0..200 {
            integrate_player(&mut p, &PlatformerInput::default(), 1.0, NOMINAL_FRAME_MS, &cfg());
        }
        assert_eq!(p.vy, cfg().max_fall_speed);
    }

    #[test]
    fn horizontal_speed_approaches_target() {
        let right = PlatformerInput {
            right: true,
            ..Default::default()
        };
        let mut p = airborne(0.0, 0.0);
        for _ in 0..60 {
            integrate_player(&mut p, &right, 1.0, NOMINAL_FRAME_MS, &cfg());
        }
        assert!((p.vx - cfg().move_speed).abs() < 0.01);
        assert!(p.vx <= cfg().move_speed);
    }

    #[test]
    fn min_speed_floor_after_release() {
        let right = PlatformerInput {
            right: true,
            ..Default::default()
        };
        let mut p = airborne(0.0, 0.0);
        integrate_player(&mut p, &right, 1.0, NOMINAL_FRAME_MS, &cfg());
        for _ in 0..120 {
            integrate_player(&mut p, &PlatformerInput::default(), 1.0, NOMINAL_FRAME_MS, &cfg());
        }
        assert_eq!(p.vx, cfg().min_move_speed);
    }

    #[test]
    fn no_floor_before_first_input() {
        let mut p = airborne(0.0, 0.0);
        integrate_player(&mut p, &PlatformerInput::default(), 1.0, NOMINAL_FRAME_MS, &cfg());
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.x, 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let both = PlatformerInput {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(both.move_dir(), 0.0);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut p = airborne(2.0, 3.0);
        let before = p.clone();
        integrate_player(&mut p, &PlatformerInput::default(), 1.0, 0.0, &cfg());
        assert_eq!(p, before);
    }

    #[test]
    fn split_frame_matches_single_frame() {
        let right = PlatformerInput {
            right: true,
            ..Default::default()
        };
        let mut once = airborne(0.0, 0.0);
        integrate_player(&mut once, &right, 1.0, 2.0 * NOMINAL_FRAME_MS, &cfg());

        let mut twice = airborne(0.0, 0.0);
        integrate_player(&mut twice, &right, 1.0, NOMINAL_FRAME_MS, &cfg());
        integrate_player(&mut twice, &right, 1.0, NOMINAL_FRAME_MS, &cfg());

        assert!((once.x - twice.x).abs() <= 1.0, "x: {} vs {}", once.x, twice.x);
        assert!((once.y - twice.y).abs() <= 1.0, "y: {} vs {}", once.y, twice.y);
    }

    // ================================================================
    // Property-based tests (proptest)
    // ================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn frame_rate_independent_within_a_pixel(
                vx in -4.0f32..=4.0,
                vy in -12.0f32..=12.0,
                dir in -1i8..=1,
            ) {
                let input = PlatformerInput {
                    left: dir < 0,
                    right: dir > 0,
                    ..Default::default()
                };
                let mut once = airborne(vx, vy);
                once.has_moved = true;
                let mut twice = once.clone();

                integrate_player(&mut once, &input, 1.0, 2.0 * NOMINAL_FRAME_MS, &cfg());
                integrate_player(&mut twice, &input, 1.0, NOMINAL_FRAME_MS, &cfg());
                integrate_player(&mut twice, &input, 1.0, NOMINAL_FRAME_MS, &cfg());

                prop_assert!(
                    (once.x - twice.x).abs() <= 1.0,
                    "x diverged: {} vs {}", once.x, twice.x
                );
                prop_assert!(
                    (once.y - twice.y).abs() <= 1.0,
                    "y diverged: {} vs {}", once.y, twice.y
                );
            }

            #[test]
            fn speeds_stay_bounded(
                moves in proptest::collection::vec(-1i8..=1, 10..80),
                delta in 1.0f32..50.0,
            ) {
                let mut p = airborne(0.0, 0.0);
                let c = cfg();
                for &m in &moves {
                    let input = PlatformerInput {
                        left: m < 0,
                        right: m > 0,
                        ..Default::default()
                    };
                    integrate_player(&mut p, &input, 1.0, delta, &c);
                    prop_assert!(p.vx.abs() <= c.move_speed);
                    prop_assert!(p.vy.abs() <= c.max_fall_speed);
                }
            }
        }
    }
}
