//! Per-tick motion of the dynamic stage elements.
//!
//! Updates are pure: each takes the previous [`GeometrySnapshot`] and returns
//! the next one alongside the events it produced.

use serde::{Deserialize, Serialize};
use stagerun_core::dt_factor;
use stagerun_core::effect::{EffectKind, TimedEffect};
use stagerun_core::sim_trait::SimEvent;

use crate::physics::Player;
use crate::stage::{GeometrySnapshot, StageData};

/// A gravity override picked up from a flip zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityFlip {
    pub direction: f32,
    /// Seconds; 0 means the flip never wears off.
    pub linger_secs: f32,
}

impl EffectKind for GravityFlip {
    fn duration(&self) -> f32 {
        if self.linger_secs > 0.0 {
            self.linger_secs
        } else {
            f32::INFINITY
        }
    }
}

/// Current gravity direction and the flip effect holding it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityField {
    /// `+1` down, `-1` up.
    pub direction: f32,
    pub effect: Option<TimedEffect<GravityFlip>>,
}

impl Default for GravityField {
    fn default() -> Self {
        Self {
            direction: 1.0,
            effect: None,
        }
    }
}

/// Advance a coordinate bouncing between `start` and `end`.
///
/// Overshoot past an end is reflected back into the range rather than
/// clamped. Returns the new position and direction.
pub fn advance_oscillator(
    pos: f32,
    start: f32,
    end: f32,
    speed: f32,
    direction: f32,
    dt_factor: f32,
) -> (f32, f32) {
    debug_assert!(start <= end, "oscillator range inverted: {start} > {end}");
    debug_assert!(speed >= 0.0, "oscillator speed negative: {speed}");
    let mut dir = if direction < 0.0 { -1.0 } else { 1.0 };
    let span = end - start;
    if span <= 0.0 {
        return (start, -dir);
    }

    // A full round trip returns to the same position and direction.
    let travel = (speed * dt_factor) % (2.0 * span);
    let mut p = pos.clamp(start, end) + travel * dir;
    for _ in 0..3 {
        if dir > 0.0 && p > end {
            p = end - (p - end);
            dir = -1.0;
        } else if dir < 0.0 && p < start {
            p = start + (start - p);
            dir = 1.0;
        } else {
            break;
        }
    }
    let p = p.clamp(start, end);
    debug_assert!(p.is_finite(), "oscillator produced a non-finite position");
    (p, dir)
}

/// Advance every dynamic element by one frame.
pub fn advance_geometry(
    prev: &GeometrySnapshot,
    player: &Player,
    delta_ms: f32,
) -> (GeometrySnapshot, Vec<SimEvent>) {
    let f = dt_factor(delta_ms);
    let dt_secs = delta_ms.max(0.0) / 1000.0;
    let mut events = Vec::new();
    let mut next = prev.clone();

    for (platform, shift) in next
        .moving_platforms
        .iter_mut()
        .zip(next.platform_shift.iter_mut())
    {
        let width = platform.width();
        let (x1, dir) = advance_oscillator(
            platform.x1,
            platform.start_x,
            platform.end_x,
            platform.speed,
            platform.direction,
            f,
        );
        *shift = x1 - platform.x1;
        platform.x1 = x1;
        platform.x2 = x1 + width;
        platform.direction = dir;
    }

    for spike in &mut next.moving_spikes {
        let (pos, dir) = advance_oscillator(
            spike.position(),
            spike.start,
            spike.end,
            spike.speed,
            spike.direction,
            f,
        );
        spike.set_position(pos);
        spike.direction = dir;
    }

    for platform in &mut next.breakable_platforms {
        if !platform.broken {
            continue;
        }
        platform.broken_elapsed += dt_secs;
        if platform.regenerate_after > 0.0 && platform.broken_elapsed >= platform.regenerate_after
        {
            platform.regenerate();
            tracing::debug!(id = platform.id, "breakable platform regenerated");
            events.push(SimEvent::PlatformRegenerated { id: platform.id });
        }
    }

    for (ceiling, fall_from) in next
        .falling_ceilings
        .iter_mut()
        .zip(next.ceiling_fall_from.iter_mut())
    {
        if !ceiling.activated && ceiling.in_trigger_zone(player.x) {
            ceiling.activated = true;
            tracing::debug!(id = ceiling.id, "falling ceiling triggered");
            events.push(SimEvent::CeilingTriggered { id: ceiling.id });
        }
        *fall_from = None;
        if ceiling.is_falling() {
            *fall_from = Some(ceiling.y);
            ceiling.y = (ceiling.y + ceiling.fall_speed * f).min(ceiling.stop_y);
        }
    }

    next.gravity = advance_gravity(&prev.gravity, &prev.stage, player, dt_secs);

    (next, events)
}

/// Apply stomps reported by collision resolution.
pub fn register_stomps(prev: &GeometrySnapshot, ids: &[u32]) -> (GeometrySnapshot, Vec<SimEvent>) {
    let mut next = prev.clone();
    let mut events = Vec::new();
    for &id in ids {
        let Some(platform) = next.breakable_platforms.iter_mut().find(|b| b.id == id) else {
            continue;
        };
        if platform.register_hit() {
            tracing::debug!(id, "breakable platform broke");
            events.push(SimEvent::PlatformBroken { id });
        }
    }
    (next, events)
}

fn advance_gravity(
    prev: &GravityField,
    stage: &StageData,
    player: &Player,
    dt_secs: f32,
) -> GravityField {
    let mut field = prev.clone();
    let touching = stage
        .gravity_flip_platforms
        .iter()
        .find(|zone| zone.touches(player.x, player.y, player.radius));

    match touching {
        Some(zone) => {
            let kind = GravityFlip {
                direction: if zone.gravity_direction < 0.0 { -1.0 } else { 1.0 },
                linger_secs: zone.effect_duration,
            };
            match &mut field.effect {
                Some(fx) if fx.kind == kind => fx.restart(),
                _ => {
                    let fx = TimedEffect::new(kind);
                    tracing::debug!(
                        direction = kind.direction,
                        permanent = fx.is_permanent(),
                        "gravity flipped"
                    );
                    field.effect = Some(fx);
                },
            }
            field.direction = kind.direction;
        },
        None => {
            if let Some(fx) = &mut field.effect {
                fx.tick(dt_secs);
                if fx.is_expired() {
                    field = GravityField::default();
                }
            }
        },
    }
    field
}
