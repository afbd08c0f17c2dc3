//! Morph between scene configurations and render the in-between frames.
//!
//! - Load a start and an end [`SceneConfig`]
//! - Walk a [`ThetaSchedule`] with [`Morph`] to get one interpolated config per frame
//! - [`run_morph`] writes each frame to disk and hands it to a [`FrameRenderer`]
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod morph;
pub mod naming;
pub mod param;
pub mod pipeline;
pub mod render;

pub use crate::foundation::core::{FrameIndex, ThetaSchedule, linspace};
pub use crate::foundation::error::{MorphError, MorphResult};

pub use crate::config::{ImageSettings, SceneConfig, TransformEntry};
pub use crate::morph::{ChainPlan, Frame, Morph, combine, interpolate, morph};
pub use crate::naming::FrameNaming;
pub use crate::param::Param;
pub use crate::pipeline::{MorphJob, RunStats, run_chain, run_morph};
pub use crate::render::{DryRun, ExternalRenderer, FailurePolicy, FrameRenderer, verify_image};
