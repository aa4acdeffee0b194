use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Trait for kinds of timed effect a simulation can carry.
pub trait EffectKind: Clone + Copy + PartialEq + Serialize + DeserializeOwned {
    /// Duration in seconds. Use `f32::INFINITY` for permanent effects.
    fn duration(&self) -> f32;
}

/// A running effect, generic over its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TimedEffect<K: EffectKind> {
    pub kind: K,
    pub remaining: f32,
}

impl<K: EffectKind> TimedEffect<K> {
    pub fn new(kind: K) -> Self {
        Self {
            remaining: kind.duration(),
            kind,
        }
    }

    pub fn tick(&mut self, dt_secs: f32) {
        if self.remaining.is_finite() {
            self.remaining -= dt_secs;
        }
    }

    /// Refill the countdown to the kind's full duration.
    pub fn restart(&mut self) {
        self.remaining = self.kind.duration();
    }

    pub fn is_permanent(&self) -> bool {
        !self.remaining.is_finite()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}
