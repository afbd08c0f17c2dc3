use crate::foundation::error::{MorphError, MorphResult};

/// Absolute 0-based frame index in output order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Evenly spaced theta values `[from, ..., to]`, both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThetaSchedule {
    pub from: f64,
    pub to: f64,
    pub count: usize,
}

impl Default for ThetaSchedule {
    /// 100 frames from the start configuration (1.0) towards the end one, stopping at 0.8.
    fn default() -> Self {
        Self {
            from: 1.0,
            to: 0.8,
            count: 100,
        }
    }
}

impl ThetaSchedule {
    pub fn new(from: f64, to: f64, count: usize) -> MorphResult<Self> {
        let s = Self { from, to, count };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> MorphResult<()> {
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(MorphError::validation("theta bounds must be finite"));
        }
        if self.count == 0 {
            return Err(MorphError::validation("theta schedule needs at least one frame"));
        }
        Ok(())
    }

    pub fn thetas(&self) -> Vec<f64> {
        linspace(self.from, self.to, self.count)
    }
}

/// `count` evenly spaced samples over `[start, stop]`.
///
/// The last sample is exactly `stop`; a single sample is `start`.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}
