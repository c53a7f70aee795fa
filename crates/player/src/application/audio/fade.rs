//! Cosine-eased volume fades driven by a 20 ms tokio interval.

use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::ports::outbound::AudioElementPort;

pub const FADE_TICK: Duration = Duration::from_millis(20);

pub fn clamp01(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Number of ticks for a fade; at least one.
pub fn fade_steps(duration_ms: u64) -> u64 {
    let tick_ms = FADE_TICK.as_millis() as f64;
    ((duration_ms as f64 / tick_ms).round() as u64).max(1)
}

/// Volume at `progress` (0..=1) along a cosine ease from `start` to `end`.
pub fn eased_volume(start: f64, end: f64, progress: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    let eased = 0.5 - 0.5 * (progress * PI).cos();
    clamp01(start + eased * (end - start))
}

/// Spawn a fade of `element` from its current volume to `target`.
///
/// `on_done` runs once the last tick has been applied. Aborting the returned
/// handle cancels the fade where it stands and skips `on_done`.
pub fn spawn_fade<F>(
    element: Arc<dyn AudioElementPort>,
    target: f64,
    duration_ms: u64,
    on_done: F,
) -> JoinHandle<()>
where
    F: FnOnce(&dyn AudioElementPort) + Send + 'static,
{
    let start = clamp01(element.volume());
    let end = clamp01(target);
    let steps = fade_steps(duration_ms);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + FADE_TICK, FADE_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        for tick in 1..=steps {
            ticker.tick().await;
            let progress = tick as f64 / steps as f64;
            element.set_volume(eased_volume(start, end, progress));
        }
        on_done(element.as_ref());
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_steps() {
        assert_eq!(fade_steps(0), 1);
        assert_eq!(fade_steps(9), 1);
        assert_eq!(fade_steps(350), 18);
        assert_eq!(fade_steps(100), 5);
    }

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert_eq!(eased_volume(0.0, 1.0, 0.0), 0.0);
        assert!((eased_volume(0.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((eased_volume(0.0, 1.0, 0.5) - 0.5).abs() < 1e-12);
        assert!((eased_volume(0.8, 0.0, 1.0)).abs() < 1e-12);
        // Eases in: the first quarter covers less than a quarter of the range
        assert!(eased_volume(0.0, 1.0, 0.25) < 0.25);
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(-0.1), 0.0);
        assert_eq!(clamp01(f64::NAN), 0.0);
    }
}
