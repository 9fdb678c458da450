// Copyright @yucwang 2026

use crate::math::constants::Float;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU32, Ordering};

const RESOLUTION: u64 = 1000;

/// Terminal progress bar fed with fractions in [0, 1].
pub struct ProgressReporter {
    bar: ProgressBar,
    fraction: AtomicU32,
}

impl ProgressReporter {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(RESOLUTION);
        bar.set_style(
            ProgressStyle::with_template("{msg}: [{elapsed_precise}] {bar:40.cyan/blue} {percent}% (ETA {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(label.to_string());
        Self::with_bar(bar)
    }

    /// Reporter that tracks the fraction without drawing anything.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self { bar, fraction: AtomicU32::new(0.0f32.to_bits()) }
    }

    pub fn update(&self, fraction: Float) {
        let fraction = fraction.max(0.0).min(1.0);
        self.fraction.store(fraction.to_bits(), Ordering::Relaxed);
        self.bar.set_position((fraction * RESOLUTION as Float).round() as u64);
    }

    pub fn fraction(&self) -> Float {
        f32::from_bits(self.fraction.load(Ordering::Relaxed))
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressReporter;

    #[test]
    fn test_progress_reporter_clamps() {
        let progress = ProgressReporter::hidden();
        assert_eq!(progress.fraction(), 0.0);
        progress.update(0.25);
        assert_eq!(progress.fraction(), 0.25);
        progress.update(1.5);
        assert_eq!(progress.fraction(), 1.0);
        progress.finish();
    }
}
