//! Time-based interpolation advanced once per frame
//!
//! A [`Tween`] reports eased progress in `[0, 1]` to its update callback
//! every time the group is advanced, and fires its completion callback once
//! when the duration has elapsed. Finished tweens leave the group.

use std::time::Duration;

/// Easing curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let f = 2.0 * t - 2.0;
                    0.5 * f * f * f + 1.0
                }
            }
        }
    }
}

type UpdateFn = Box<dyn FnMut(f32) + Send + Sync + 'static>;
type CompleteFn = Box<dyn FnOnce() + Send + Sync + 'static>;

pub struct Tween {
    duration: Duration,
    elapsed: Duration,
    delay: Duration,
    easing: Easing,
    on_update: UpdateFn,
    on_complete: Option<CompleteFn>,
}

impl Tween {
    pub fn new<F>(duration: Duration, on_update: F) -> Self
    where
        F: FnMut(f32) + Send + Sync + 'static,
    {
        Self {
            duration,
            elapsed: Duration::ZERO,
            delay: Duration::ZERO,
            easing: Easing::default(),
            on_update: Box::new(on_update),
            on_complete: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Wait before the first update
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn on_complete<F>(mut self, on_complete: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance by `delta`. Returns `true` while the tween is still running.
    fn advance(&mut self, delta: Duration) -> bool {
        let mut delta = delta;
        if !self.delay.is_zero() {
            if delta < self.delay {
                self.delay -= delta;
                return true;
            }
            delta -= self.delay;
            self.delay = Duration::ZERO;
        }

        self.elapsed = (self.elapsed + delta).min(self.duration);
        let eased = self.easing.apply(self.progress());
        (self.on_update)(eased);

        if self.is_finished() {
            if let Some(on_complete) = self.on_complete.take() {
                on_complete();
            }
            return false;
        }
        true
    }
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("easing", &self.easing)
            .finish()
    }
}

/// The set of running tweens
#[derive(Debug, Default)]
pub struct TweenGroup {
    tweens: Vec<Tween>,
}

impl TweenGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween) {
        self.tweens.push(tween);
    }

    /// Advance every tween by `delta`, dropping the ones that finished
    pub fn update(&mut self, delta: Duration) {
        self.tweens.retain_mut(|tween| tween.advance(delta));
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }
}
