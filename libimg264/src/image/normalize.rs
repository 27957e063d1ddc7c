/// Smallest and largest sample seen by [`linear_normalize`]
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Extent {
    /// smallest sample
    pub min: u8,
    /// largest sample
    pub max: u8,
}

impl Extent {
    /// Scans `samples` once. An empty slice yields `min = 255, max = 0`.
    #[must_use]
    pub fn of(samples: &[u8]) -> Self {
        let (min, max) = samples
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        Self { min, max }
    }

    /// Returns `true` if there is nothing to stretch (all samples equal, or no samples)
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.max <= self.min
    }
}

/// Stretches `samples` in place so that the smallest maps to 0 and the largest to 255
///
/// Each sample `s` becomes `(s - min) * 255.0 / (max - min)`, truncated toward zero. A flat
/// input (`max == min`) is left unchanged.
pub fn linear_normalize(samples: &mut [u8]) -> Extent {
    let extent = Extent::of(samples);
    if extent.is_flat() {
        return extent;
    }
    let min = f64::from(extent.min);
    let range = f64::from(extent.max - extent.min);
    for s in samples.iter_mut() {
        // always within 0.0..=255.0
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let stretched = ((f64::from(*s) - min) * 255.0 / range) as u8;
        *s = stretched;
    }
    extent
}
