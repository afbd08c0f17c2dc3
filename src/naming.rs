use std::path::PathBuf;

use crate::foundation::core::FrameIndex;

/// Output file layout: `<out_dir>/<NNN>.json` next to `<out_dir>/<NNN>.png`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameNaming {
    pub out_dir: PathBuf,
    /// Minimum digits in the file stem; longer indices are written in full.
    pub pad: usize,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("morph_movie3"),
            pad: 3,
        }
    }
}

impl FrameNaming {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    pub fn stem(&self, idx: FrameIndex) -> String {
        format!("{:0width$}", idx.0, width = self.pad)
    }

    pub fn config_path(&self, idx: FrameIndex) -> PathBuf {
        self.out_dir.join(format!("{}.json", self.stem(idx)))
    }

    pub fn image_path(&self, idx: FrameIndex) -> PathBuf {
        self.out_dir.join(format!("{}.png", self.stem(idx)))
    }
}
