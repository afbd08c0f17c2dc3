//! Interpolation between scene configurations.
//!
//! A frame starts as a deep copy of the start configuration. Floats are blended towards the
//! end configuration two levels deep: a parameter itself, or the direct children of a
//! parameter that is a mapping or a sequence. Everything else is copied unchanged.

use std::collections::BTreeMap;

use crate::{
    config::SceneConfig,
    foundation::{
        core::FrameIndex,
        error::{MorphError, MorphResult},
    },
    naming::FrameNaming,
    param::Param,
};

/// `theta * start + (1 - theta) * end`.
pub fn combine(start: f64, end: f64, theta: f64) -> f64 {
    theta * start + (1.0 - theta) * end
}

/// One generated configuration, paired with its position in the output sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub index: FrameIndex,
    pub theta: f64,
    pub config: SceneConfig,
}

/// Blend `start` towards `end` at `theta`, leaving `image_settings.path` as in `start`.
pub fn interpolate(start: &SceneConfig, end: &SceneConfig, theta: f64) -> MorphResult<SceneConfig> {
    let mut out = start.clone();
    for (i, t) in out.transforms.iter_mut().enumerate() {
        let Some(end_t) = end.transforms.get(i) else {
            return Err(MorphError::mismatch(i, &t.name, "no transform at this index in end"));
        };
        for (key, value) in t.params.iter_mut() {
            let Some(end_value) = end_t.params.get(key) else {
                return Err(MorphError::mismatch(
                    i,
                    format!("{}.{key}", t.name),
                    "parameter missing from end",
                ));
            };
            *value = blend_param(value, end_value, theta)
                .map_err(|reason| MorphError::mismatch(i, format!("{}.{key}", t.name), reason))?;
        }
    }
    Ok(out)
}

fn blend_param(start: &Param, end: &Param, theta: f64) -> Result<Param, String> {
    match start {
        Param::Scalar(_) => blend_leaf(start, Some(end), theta),
        Param::Mapping(inner) => {
            let end_inner = end
                .as_mapping()
                .ok_or_else(|| format!("expected a mapping in end, found {}", end.kind()))?;
            inner
                .iter()
                .map(|(k, v)| {
                    blend_leaf(v, end_inner.get(k), theta)
                        .map(|p| (k.clone(), p))
                        .map_err(|e| format!("{k}: {e}"))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Param::Mapping)
        }
        Param::Sequence(items) => {
            let end_items = end
                .as_sequence()
                .ok_or_else(|| format!("expected a sequence in end, found {}", end.kind()))?;
            items
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    blend_leaf(v, end_items.get(j), theta).map_err(|e| format!("[{j}]: {e}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Param::Sequence)
        }
        Param::Opaque(_) => Ok(start.clone()),
    }
}

/// Innermost level: only floats move; nested containers are not descended into.
fn blend_leaf(start: &Param, end: Option<&Param>, theta: f64) -> Result<Param, String> {
    let Param::Scalar(a) = start else {
        return Ok(start.clone());
    };
    let end = end.ok_or_else(|| "missing from end".to_string())?;
    let b = end
        .as_number()
        .ok_or_else(|| format!("expected a number in end, found {}", end.kind()))?;
    let v = combine(*a, b, theta);
    if !v.is_finite() {
        return Err(format!("interpolated value is not finite ({a} -> {b} at theta {theta})"));
    }
    Ok(Param::Scalar(v))
}

/// Where global chain steps fall: pair `k` owns `step_counts[k]` consecutive steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainPlan {
    step_counts: Vec<usize>,
}

impl ChainPlan {
    pub fn new(step_counts: Vec<usize>) -> Self {
        Self { step_counts }
    }

    pub fn total_steps(&self) -> usize {
        self.step_counts.iter().sum()
    }

    /// Pair index owning global `step`, or `None` past the end.
    pub fn pair_index_for_step(&self, step: usize) -> Option<usize> {
        self.locate(step).map(|(pair, _)| pair)
    }

    /// Progress in `[0, 1)` of `step` within its pair.
    pub fn pair_progress(&self, step: usize) -> Option<f64> {
        self.locate(step).map(|(_, pct)| pct)
    }

    fn locate(&self, step: usize) -> Option<(usize, f64)> {
        let mut acc = 0usize;
        for (pair, &n) in self.step_counts.iter().enumerate() {
            if step < acc + n {
                return Some((pair, (step - acc) as f64 / n as f64));
            }
            acc += n;
        }
        None
    }

    /// `(pair, theta)` for every step, in order. Theta 1.0 is the pair's first keyframe.
    fn steps(&self) -> Vec<(usize, f64)> {
        (0..self.total_steps())
            .filter_map(|s| self.locate(s))
            .map(|(pair, pct)| (pair, 1.0 - pct))
            .collect()
    }
}

/// Lazy frame sequence over one or more keyframe pairs.
pub struct Morph<'a> {
    keyframes: Vec<&'a SceneConfig>,
    steps: std::iter::Enumerate<std::vec::IntoIter<(usize, f64)>>,
    naming: FrameNaming,
}

impl<'a> Morph<'a> {
    /// Frames from `start` towards `end`, one per theta.
    pub fn pair(
        start: &'a SceneConfig,
        end: &'a SceneConfig,
        thetas: &[f64],
        naming: FrameNaming,
    ) -> MorphResult<Self> {
        if let Some(t) = thetas.iter().find(|t| !t.is_finite()) {
            return Err(MorphError::validation(format!("theta must be finite, got {t}")));
        }
        start.check_correspondence(end)?;
        Ok(Self {
            keyframes: vec![start, end],
            steps: thetas
                .iter()
                .map(|&t| (0, t))
                .collect::<Vec<_>>()
                .into_iter()
                .enumerate(),
            naming,
        })
    }

    /// Frames through `keyframes[0] -> keyframes[1] -> ...`, `step_counts[k]` frames per pair.
    ///
    /// The final keyframe marks the target of the last pair and is not emitted itself.
    pub fn chain(
        keyframes: &'a [SceneConfig],
        step_counts: &[usize],
        naming: FrameNaming,
    ) -> MorphResult<Self> {
        if keyframes.len() < 2 {
            return Err(MorphError::validation(
                "a keyframe chain needs at least two configurations",
            ));
        }
        if step_counts.len() != keyframes.len() - 1 {
            return Err(MorphError::validation(format!(
                "{} keyframes need {} step counts, got {}",
                keyframes.len(),
                keyframes.len() - 1,
                step_counts.len()
            )));
        }
        for (k, pair) in keyframes.windows(2).enumerate() {
            if let Err(e) = pair[0].check_correspondence(&pair[1]) {
                tracing::error!(pair = k, error = %e, "keyframes do not line up");
                return Err(e);
            }
        }

        let plan = ChainPlan::new(step_counts.to_vec());
        Ok(Self {
            keyframes: keyframes.iter().collect(),
            steps: plan.steps().into_iter().enumerate(),
            naming,
        })
    }

    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }
}

impl Iterator for Morph<'_> {
    type Item = MorphResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let (i, (pair, theta)) = self.steps.next()?;
        let index = FrameIndex(i as u64);
        let start = self.keyframes[pair];
        let end = self.keyframes[pair + 1];

        Some(interpolate(start, end, theta).map(|mut config| {
            config.image_settings.path = self
                .naming
                .image_path(index)
                .to_string_lossy()
                .into_owned();
            Frame {
                index,
                theta,
                config,
            }
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}

/// [`Morph::pair`] with the default `morph_movie3/NNN` naming.
pub fn morph<'a>(
    start: &'a SceneConfig,
    end: &'a SceneConfig,
    thetas: &[f64],
) -> MorphResult<Morph<'a>> {
    Morph::pair(start, end, thetas, FrameNaming::default())
}
