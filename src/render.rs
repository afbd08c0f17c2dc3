use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::foundation::{
    core::FrameIndex,
    error::{MorphError, MorphResult},
};

/// Renderer contract: turn one written frame config into an image.
///
/// Ordering contract: `render` is called in strictly increasing `FrameIndex` order, and only
/// after the frame's config file has been fully written.
pub trait FrameRenderer {
    fn render(&mut self, frame: FrameIndex, config_path: &Path) -> MorphResult<()>;

    /// Directory the renderer resolves relative image paths against, if not ours.
    fn output_root(&self) -> Option<&Path> {
        None
    }
}

/// What to do when a frame fails to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run at the first failure.
    #[default]
    Halt,
    /// Log the failure, record it in the run stats and move on to the next frame.
    Continue,
}

/// Runs `<program> <args...> <config_path>` per frame and waits for it.
#[derive(Clone, Debug)]
pub struct ExternalRenderer {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child (e.g. the renderer's own crate).
    pub cwd: Option<PathBuf>,
}

impl Default for ExternalRenderer {
    /// `cargo run --release evaluate <config>`, run from the current directory.
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: ["run", "--release", "evaluate"]
                .into_iter()
                .map(String::from)
                .collect(),
            cwd: None,
        }
    }
}

impl ExternalRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn command(&self, config_path: &Path) -> MorphResult<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        match &self.cwd {
            Some(dir) => {
                // The child runs elsewhere, so hand it a path it can still open.
                let abs = std::path::absolute(config_path)
                    .map_err(|e| MorphError::io(config_path, e))?;
                cmd.current_dir(dir).arg(abs);
            }
            None => {
                cmd.arg(config_path);
            }
        }
        Ok(cmd)
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FrameRenderer for ExternalRenderer {
    #[tracing::instrument(skip(self), fields(cmd = %self.describe()))]
    fn render(&mut self, frame: FrameIndex, config_path: &Path) -> MorphResult<()> {
        let mut cmd = self.command(config_path)?;
        let status = cmd.status().map_err(|e| {
            MorphError::render(
                frame,
                format!("failed to spawn '{}' (is it on PATH?): {e}", self.program),
            )
        })?;

        if !status.success() {
            return Err(MorphError::render(
                frame,
                format!(
                    "'{} {}' exited with {status}",
                    self.describe(),
                    config_path.display()
                ),
            ));
        }
        tracing::debug!("render finished");
        Ok(())
    }

    fn output_root(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

/// Writes configs only; no renderer is invoked.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRun;

impl FrameRenderer for DryRun {
    fn render(&mut self, frame: FrameIndex, config_path: &Path) -> MorphResult<()> {
        tracing::info!(frame = frame.0, path = %config_path.display(), "dry run, not rendering");
        Ok(())
    }
}

/// Checks the image a renderer produced for `frame`.
///
/// The file must decode as an image; with `expected` set, its size must match too.
pub fn verify_image(
    frame: FrameIndex,
    path: &Path,
    expected: Option<(u32, u32)>,
) -> MorphResult<()> {
    let (w, h) = image::image_dimensions(path).map_err(|e| {
        MorphError::render(
            frame,
            format!("rendered image '{}' is unreadable: {e}", path.display()),
        )
    })?;
    if let Some((ew, eh)) = expected.filter(|&e| e != (w, h)) {
        return Err(MorphError::render(
            frame,
            format!(
                "rendered image '{}' is {w}x{h}, expected {ew}x{eh}",
                path.display()
            ),
        ));
    }
    Ok(())
}
