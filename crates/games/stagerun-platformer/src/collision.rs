use serde::{Deserialize, Serialize};

use crate::physics::{Player, Support};
use crate::stage::{GeometrySnapshot, Platform};

/// How far past a surface the feet may sink and still count as landing.
const LAND_TOLERANCE: f32 = 2.0;
/// Max height change a grounded player follows without leaving the ground.
const GROUND_SNAP: f32 = 6.0;

/// Raw per-category collision flags for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionResults {
    pub hole_collision: bool,
    pub boundary_collision: bool,
    pub spike_collision: bool,
    pub ceiling_collision: bool,
    pub goal_collision: bool,
}

/// The single collision that decides the tick, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    None,
    Hole,
    Boundary,
    Spike,
    Ceiling,
    Goal,
}

impl CollisionResults {
    /// Hole > Boundary > Spike > Ceiling > Goal > None.
    pub fn dominant(&self) -> CollisionOutcome {
        if self.hole_collision {
            CollisionOutcome::Hole
        } else if self.boundary_collision {
            CollisionOutcome::Boundary
        } else if self.spike_collision {
            CollisionOutcome::Spike
        } else if self.ceiling_collision {
            CollisionOutcome::Ceiling
        } else if self.goal_collision {
            CollisionOutcome::Goal
        } else {
            CollisionOutcome::None
        }
    }

    pub fn any_lethal(&self) -> bool {
        !matches!(self.dominant(), CollisionOutcome::None | CollisionOutcome::Goal)
    }
}

/// What collision resolution produced for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub results: CollisionResults,
    /// Breakable platforms landed on this tick.
    pub stomped: Vec<u32>,
}

/// Collision queries against a geometry snapshot.
///
/// Ground resolution mutates the player (position snap, grounding); the
/// category checks are pure.
pub trait CollisionChecker {
    fn resolve_ground(&self, player: &mut Player, geometry: &GeometrySnapshot) -> Vec<u32>;
    fn check_hole(&self, player: &Player, geometry: &GeometrySnapshot) -> bool;
    fn check_boundary(&self, player: &Player, geometry: &GeometrySnapshot) -> bool;
    fn check_spikes(&self, player: &Player, geometry: &GeometrySnapshot) -> bool;
    fn check_ceilings(&self, player: &Player, geometry: &GeometrySnapshot) -> bool;
    fn check_goal(&self, player: &Player, geometry: &GeometrySnapshot) -> bool;

    /// Ground the player, then evaluate every category at the final position.
    fn resolve(&self, player: &mut Player, geometry: &GeometrySnapshot) -> CollisionReport {
        let stomped = self.resolve_ground(player, geometry);
        let results = CollisionResults {
            hole_collision: self.check_hole(player, geometry),
            boundary_collision: self.check_boundary(player, geometry),
            spike_collision: self.check_spikes(player, geometry),
            ceiling_collision: self.check_ceilings(player, geometry),
            goal_collision: self.check_goal(player, geometry),
        };
        CollisionReport { results, stomped }
    }
}

/// Circle-vs-stage collision for the platformer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageCollider;

impl StageCollider {
    fn in_hole(player: &Player, geometry: &GeometrySnapshot) -> bool {
        geometry.stage.holes.iter().any(|h| h.contains(player.x))
    }
}

impl CollisionChecker for StageCollider {
    fn resolve_ground(&self, player: &mut Player, geometry: &GeometrySnapshot) -> Vec<u32> {
        let g = geometry.gravity.direction;
        let was_grounded = player.grounded;

        // Ride the platform we stood on last tick.
        if let (true, Some(Support::Moving(i))) = (was_grounded, player.support) {
            player.x += geometry.platform_shift.get(i).copied().unwrap_or(0.0);
        }

        // Moving against gravity (e.g. mid-jump) never lands.
        if player.vy * g < 0.0 {
            player.leave_ground();
            return Vec::new();
        }

        let feet_prev = player.prev_y + player.radius * g;
        let feet_now = player.y + player.radius * g;
        let x = player.x;

        let mut best: Option<(f32, f32, Support)> = None;
        let mut consider = |segment: Platform, support: Support| {
            if !segment.spans(x) {
                return;
            }
            let surface = segment.surface_y_at(x);
            let before = (surface - feet_prev) * g;
            let after = (surface - feet_now) * g;
            let reached = if was_grounded {
                before.abs() <= GROUND_SNAP
            } else {
                before >= -LAND_TOLERANCE && after <= LAND_TOLERANCE
            };
            if reached && best.is_none_or(|(b, _, _)| before < b) {
                best = Some((before, surface, support));
            }
        };

        for platform in &geometry.stage.platforms {
            consider(*platform, Support::Static);
        }
        for (i, platform) in geometry.moving_platforms.iter().enumerate() {
            consider(platform.segment(), Support::Moving(i));
        }
        for platform in geometry.breakable_platforms.iter().filter(|b| !b.broken) {
            consider(platform.segment(), Support::Breakable(platform.id));
        }

        match best {
            Some((_, surface, support)) => {
                let landing = !was_grounded && player.vy * g > 0.0;
                let stomped = match support {
                    Support::Breakable(id) if landing => vec![id],
                    _ => Vec::new(),
                };
                player.land(surface, g, support);
                stomped
            },
            None => {
                player.leave_ground();
                Vec::new()
            },
        }
    }

    fn check_hole(&self, player: &Player, geometry: &GeometrySnapshot) -> bool {
        player.y > geometry.bounds.bottom && Self::in_hole(player, geometry)
    }

    fn check_boundary(&self, player: &Player, geometry: &GeometrySnapshot) -> bool {
        let b = &geometry.bounds;
        player.x < b.left
            || player.x > b.right
            || player.y < b.top
            || (player.y > b.bottom && !Self::in_hole(player, geometry))
    }

    fn check_spikes(&self, player: &Player, geometry: &GeometrySnapshot) -> bool {
        let (x, y, r) = (player.x, player.y, player.radius);
        geometry.stage.spikes.iter().any(|s| s.overlaps_circle(x, y, r))
            || geometry
                .moving_spikes
                .iter()
                .any(|s| s.rect().overlaps_circle(x, y, r))
    }

    fn check_ceilings(&self, player: &Player, geometry: &GeometrySnapshot) -> bool {
        // Swept so a fast ceiling cannot pass through the player in one tick.
        geometry
            .ceiling_sweeps()
            .any(|r| r.overlaps_circle(player.x, player.y, player.radius))
    }

    fn check_goal(&self, player: &Player, geometry: &GeometrySnapshot) -> bool {
        geometry
            .stage
            .goal
            .overlaps_circle(player.x, player.y, player.radius)
    }
}
