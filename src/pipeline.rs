use crate::{
    config::SceneConfig,
    foundation::{
        core::{FrameIndex, ThetaSchedule},
        error::{MorphError, MorphResult},
    },
    morph::Morph,
    naming::FrameNaming,
    render::{FailurePolicy, FrameRenderer, verify_image},
};

/// Output and failure handling for one run.
#[derive(Clone, Debug, Default)]
pub struct MorphJob {
    pub naming: FrameNaming,
    pub policy: FailurePolicy,
    /// Create `naming.out_dir` up front instead of failing on the first write.
    pub create_out_dir: bool,
    /// Decode each rendered PNG and compare it with `image_settings` width/height.
    pub verify_output: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_written: usize,
    pub frames_rendered: usize,
    /// Frames whose render failed under [`FailurePolicy::Continue`].
    pub failed: Vec<FrameIndex>,
}

impl RunStats {
    /// Turn recorded render failures into an error.
    pub fn into_result(self) -> MorphResult<Self> {
        if self.failed.is_empty() {
            return Ok(self);
        }
        let list = self
            .failed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(MorphError::validation(format!(
            "{} of {} frames failed to render: {list}",
            self.failed.len(),
            self.frames_written
        )))
    }
}

/// Morph `start` towards `end` over `schedule`, writing and rendering each frame in order.
#[tracing::instrument(
    skip_all,
    fields(frames = schedule.count, out_dir = %job.naming.out_dir.display())
)]
pub fn run_morph(
    start: &SceneConfig,
    end: &SceneConfig,
    schedule: &ThetaSchedule,
    job: &MorphJob,
    renderer: &mut dyn FrameRenderer,
) -> MorphResult<RunStats> {
    schedule.validate()?;
    let frames = Morph::pair(start, end, &schedule.thetas(), job.naming.clone())?;
    run_frames(frames, job, renderer)
}

/// Like [`run_morph`], through a chain of keyframes with `step_counts[k]` frames per pair.
#[tracing::instrument(
    skip_all,
    fields(keyframes = keyframes.len(), out_dir = %job.naming.out_dir.display())
)]
pub fn run_chain(
    keyframes: &[SceneConfig],
    step_counts: &[usize],
    job: &MorphJob,
    renderer: &mut dyn FrameRenderer,
) -> MorphResult<RunStats> {
    let frames = Morph::chain(keyframes, step_counts, job.naming.clone())?;
    run_frames(frames, job, renderer)
}

fn run_frames(
    frames: Morph<'_>,
    job: &MorphJob,
    renderer: &mut dyn FrameRenderer,
) -> MorphResult<RunStats> {
    if job.create_out_dir {
        let dir = &job.naming.out_dir;
        std::fs::create_dir_all(dir).map_err(|e| MorphError::io(dir, e))?;
        // Image paths are relative to the renderer's root, which may differ from ours.
        if let Some(root) = renderer.output_root() {
            let dir = root.join(dir);
            std::fs::create_dir_all(&dir).map_err(|e| MorphError::io(&dir, e))?;
        }
    }

    let mut stats = RunStats::default();
    for frame in frames {
        let frame = frame?;
        let span = tracing::info_span!("frame", index = frame.index.0, theta = frame.theta);
        let _enter = span.enter();

        let config_path = job.naming.config_path(frame.index);
        frame.config.write_to(&config_path)?;
        stats.frames_written += 1;
        tracing::debug!(path = %config_path.display(), "wrote frame config");

        let outcome = renderer.render(frame.index, &config_path).and_then(|()| {
            if !job.verify_output {
                return Ok(());
            }
            let image = std::path::Path::new(&frame.config.image_settings.path);
            let image = match renderer.output_root() {
                Some(root) => root.join(image),
                None => image.to_path_buf(),
            };
            verify_image(frame.index, &image, frame.config.image_settings.dimensions())
        });

        match (outcome, job.policy) {
            (Ok(()), _) => {
                stats.frames_rendered += 1;
                tracing::info!("frame done");
            }
            (Err(e), FailurePolicy::Halt) => return Err(e),
            (Err(e), FailurePolicy::Continue) => {
                tracing::error!(error = %e, "frame failed, continuing");
                stats.failed.push(frame.index);
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    #[derive(Default)]
    struct Recording {
        seen: Vec<(FrameIndex, PathBuf)>,
        fail_on: Option<u64>,
    }

    impl FrameRenderer for Recording {
        fn render(&mut self, frame: FrameIndex, config_path: &Path) -> MorphResult<()> {
            assert!(config_path.is_file(), "config written before render");
            self.seen.push((frame, config_path.to_path_buf()));
            if self.fail_on == Some(frame.0) {
                return Err(MorphError::render(frame, "boom"));
            }
            Ok(())
        }
    }

    fn cfg(a: f64) -> SceneConfig {
        serde_json::from_value(serde_json::json!({
            "image_settings": {"width": 4, "height": 4, "path": "x.png"},
            "transforms": [{"LinearTransform": {"a": a}}]
        }))
        .unwrap()
    }

    fn job(dir: &str) -> MorphJob {
        let out = PathBuf::from("target").join(dir);
        let _ = std::fs::remove_dir_all(&out);
        MorphJob {
            naming: FrameNaming::new(out),
            create_out_dir: true,
            ..MorphJob::default()
        }
    }

    #[test]
    fn renders_every_frame_in_order() {
        let job = job("pipeline_in_order");
        let mut r = Recording::default();
        let schedule = ThetaSchedule::new(1.0, 0.0, 5).unwrap();

        let stats = run_morph(&cfg(0.0), &cfg(1.0), &schedule, &job, &mut r).unwrap();
        assert_eq!(stats.frames_written, 5);
        assert_eq!(stats.frames_rendered, 5);
        assert!(stats.failed.is_empty());

        let idx: Vec<u64> = r.seen.iter().map(|(f, _)| f.0).collect();
        assert_eq!(idx, vec![0, 1, 2, 3, 4]);
        assert!(r.seen[4].1.ends_with("004.json"));

        let last = SceneConfig::from_path(&r.seen[4].1).unwrap();
        assert_eq!(last.transforms[0].params["a"].as_scalar(), Some(1.0));
        assert!(last.image_settings.path.ends_with("004.png"));
    }

    #[test]
    fn halt_stops_at_first_failure() {
        let job = job("pipeline_halt");
        let mut r = Recording {
            fail_on: Some(1),
            ..Recording::default()
        };
        let schedule = ThetaSchedule::new(1.0, 0.0, 4).unwrap();

        let err = run_morph(&cfg(0.0), &cfg(1.0), &schedule, &job, &mut r).unwrap_err();
        assert!(matches!(err, MorphError::Render { frame: FrameIndex(1), .. }));
        assert_eq!(r.seen.len(), 2);
        assert!(!job.naming.config_path(FrameIndex(2)).exists());
    }

    #[test]
    fn continue_records_failures_and_still_reports_them() {
        let job = MorphJob {
            policy: FailurePolicy::Continue,
            ..job("pipeline_continue")
        };
        let mut r = Recording {
            fail_on: Some(2),
            ..Recording::default()
        };
        let schedule = ThetaSchedule::new(1.0, 0.0, 4).unwrap();

        let stats = run_morph(&cfg(0.0), &cfg(1.0), &schedule, &job, &mut r).unwrap();
        assert_eq!(stats.frames_written, 4);
        assert_eq!(stats.frames_rendered, 3);
        assert_eq!(stats.failed, vec![FrameIndex(2)]);

        let err = stats.into_result().unwrap_err();
        assert!(err.to_string().contains("1 of 4 frames failed to render: 2"));
    }

    #[test]
    fn missing_out_dir_fails_on_first_write() {
        let mut job = job("pipeline_missing_dir");
        job.create_out_dir = false;
        let mut r = Recording::default();

        let err = run_morph(
            &cfg(0.0),
            &cfg(1.0),
            &ThetaSchedule::default(),
            &job,
            &mut r,
        )
        .unwrap_err();
        assert!(matches!(err, MorphError::Io { .. }));
        assert!(r.seen.is_empty());
    }

    #[test]
    fn verify_output_flags_missing_images() {
        let job = MorphJob {
            verify_output: true,
            ..job("pipeline_verify")
        };
        let mut r = Recording::default();
        let schedule = ThetaSchedule::new(1.0, 0.0, 2).unwrap();

        let err = run_morph(&cfg(0.0), &cfg(1.0), &schedule, &job, &mut r).unwrap_err();
        assert!(err.to_string().contains("unreadable"));
    }

    struct Rooted(PathBuf);

    impl FrameRenderer for Rooted {
        fn render(&mut self, _frame: FrameIndex, _config_path: &Path) -> MorphResult<()> {
            Ok(())
        }

        fn output_root(&self) -> Option<&Path> {
            Some(&self.0)
        }
    }

    #[test]
    fn create_out_dir_also_prepares_renderer_root() {
        let job = job("pipeline_rooted");
        let root = PathBuf::from("target").join("pipeline_rooted_cwd");
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        let mut r = Rooted(root.clone());
        let schedule = ThetaSchedule::new(1.0, 0.0, 2).unwrap();

        run_morph(&cfg(0.0), &cfg(1.0), &schedule, &job, &mut r).unwrap();
        assert!(job.naming.out_dir.is_dir());
        assert!(root.join(&job.naming.out_dir).is_dir());
    }

    #[test]
    fn chain_runs_through_all_keyframes() {
        let job = job("pipeline_chain");
        let mut r = Recording::default();
        let keys = vec![cfg(0.0), cfg(1.0), cfg(3.0)];

        let stats = run_chain(&keys, &[2, 2], &job, &mut r).unwrap();
        assert_eq!(stats.frames_rendered, 4);

        let a: Vec<f64> = r
            .seen
            .iter()
            .map(|(_, p)| {
                SceneConfig::from_path(p).unwrap().transforms[0].params["a"]
                    .as_scalar()
                    .unwrap()
            })
            .collect();
        assert_eq!(a, vec![0.0, 0.5, 1.0, 2.0]);
    }
}
