//! Scales mapping data values to plot coordinates
//!
//! Same semantics as the D3 scales the browser renderer uses, so pixel
//! geometry in a view model lines up with axes drawn from its descriptors.
//! A degenerate domain maps everything to the middle of the range.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        interpolate(self.domain, self.range, value)
    }
}

/// `x^exponent` over a linear scale. Exponent 3 stretches the gap between
/// 8.9 and 9.1 so top scores are distinguishable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowScale {
    exponent: f64,
    domain: (f64, f64),
    range: (f64, f64),
}

impl PowScale {
    pub fn new(exponent: f64, domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { exponent, domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let pow = |v: f64| v.signum() * v.abs().powf(self.exponent);
        interpolate((pow(self.domain.0), pow(self.domain.1)), self.range, pow(value))
    }
}

/// Base-10 log scale. The domain must be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LogScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        debug_assert!(domain.0 > 0.0 && domain.1 > 0.0, "log domain must be positive");
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        interpolate(
            (self.domain.0.log10(), self.domain.1.log10()),
            self.range,
            value.max(f64::MIN_POSITIVE).log10(),
        )
    }
}

/// Ordinal bands with equal inner and outer padding, centered in the range.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    keys: Vec<String>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    pub fn new(keys: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        let n = keys.len() as f64;
        let span = range.1 - range.0;
        let step = span / (n - padding + 2.0 * padding).max(1.0);
        let start = range.0 + (span - step * (n - padding)) * 0.5;
        Self {
            keys,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    /// Start offset of the band for `key`.
    pub fn position(&self, key: &str) -> Option<f64> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|i| self.start + self.step * i as f64)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

fn interpolate(domain: (f64, f64), range: (f64, f64), value: f64) -> f64 {
    let span = domain.1 - domain.0;
    if span == 0.0 || !span.is_finite() {
        return (range.0 + range.1) / 2.0;
    }
    let t = (value - domain.0) / span;
    range.0 + t * (range.1 - range.0)
}
