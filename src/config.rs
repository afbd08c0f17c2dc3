//! Scene configuration model: image settings plus an ordered list of named transforms.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::Path,
};

use serde_json::{Map, Value};

use crate::{
    foundation::error::{MorphError, MorphResult},
    param::Param,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneConfig {
    pub image_settings: ImageSettings,
    pub transforms: Vec<TransformEntry>,
    /// Other top-level sections (e.g. `evaluation_settings`), carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageSettings {
    /// Where the renderer saves the image.
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageSettings {
    /// `(width, height)` when both are present as non-negative integers.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let w = self.extra.get("width")?.as_u64()?;
        let h = self.extra.get("height")?.as_u64()?;
        Some((u32::try_from(w).ok()?, u32::try_from(h).ok()?))
    }
}

/// One element of `transforms`: a single-key mapping `{ name: { param: value, .. } }`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(
    try_from = "BTreeMap<String, BTreeMap<String, Param>>",
    into = "BTreeMap<String, BTreeMap<String, Param>>"
)]
pub struct TransformEntry {
    pub name: String,
    pub params: BTreeMap<String, Param>,
}

impl TryFrom<BTreeMap<String, BTreeMap<String, Param>>> for TransformEntry {
    type Error = String;

    fn try_from(map: BTreeMap<String, BTreeMap<String, Param>>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "transform entry must have exactly one key (the transform name), found {}",
                map.len()
            ));
        }
        let Some((name, params)) = map.into_iter().next() else {
            return Err("transform entry is empty".to_string());
        };
        Ok(Self { name, params })
    }
}

impl From<TransformEntry> for BTreeMap<String, BTreeMap<String, Param>> {
    fn from(t: TransformEntry) -> Self {
        BTreeMap::from([(t.name, t.params)])
    }
}

impl SceneConfig {
    pub fn from_path(path: &Path) -> MorphResult<Self> {
        let f = File::open(path).map_err(|e| MorphError::io(path, e))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| MorphError::parse(path, e))
    }

    pub fn write_to(&self, path: &Path) -> MorphResult<()> {
        let f = File::create(path).map_err(|e| MorphError::io(path, e))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self).map_err(|e| MorphError::io(path, e.into()))?;
        w.flush().map_err(|e| MorphError::io(path, e))
    }

    /// Check that `end` lines up with `self` everywhere a frame will look values up.
    ///
    /// Transforms correspond by position and must share names and parameter key sets. Every
    /// float in `self` reachable by interpolation needs a number at the same place in `end`.
    pub fn check_correspondence(&self, end: &SceneConfig) -> MorphResult<()> {
        if self.transforms.len() != end.transforms.len() {
            return Err(MorphError::mismatch(
                self.transforms.len().min(end.transforms.len()),
                "transforms",
                format!(
                    "start has {} transforms, end has {}",
                    self.transforms.len(),
                    end.transforms.len()
                ),
            ));
        }

        for (i, (s, e)) in self.transforms.iter().zip(&end.transforms).enumerate() {
            if s.name != e.name {
                return Err(MorphError::mismatch(
                    i,
                    &s.name,
                    format!("transform name differs (end has '{}')", e.name),
                ));
            }
            if let Some(k) = s.params.keys().find(|k| !e.params.contains_key(*k)) {
                return Err(MorphError::mismatch(
                    i,
                    format!("{}.{k}", s.name),
                    "parameter missing from end",
                ));
            }
            if let Some(k) = e.params.keys().find(|k| !s.params.contains_key(*k)) {
                return Err(MorphError::mismatch(
                    i,
                    format!("{}.{k}", s.name),
                    "parameter missing from start",
                ));
            }
            for (key, sv) in &s.params {
                check_param(i, &format!("{}.{key}", s.name), sv, &e.params[key])?;
            }
        }
        Ok(())
    }
}

fn check_param(transform: usize, path: &str, start: &Param, end: &Param) -> MorphResult<()> {
    let need_number = |p: Option<&Param>, at: String| match p {
        Some(p) if p.as_number().is_some() => Ok(()),
        Some(p) => Err(MorphError::mismatch(
            transform,
            at,
            format!("expected a number in end, found {}", p.kind()),
        )),
        None => Err(MorphError::mismatch(transform, at, "missing from end")),
    };

    match start {
        Param::Scalar(_) => need_number(Some(end), path.to_string()),
        Param::Mapping(inner) => {
            let Some(end_inner) = end.as_mapping() else {
                return Err(MorphError::mismatch(
                    transform,
                    path,
                    format!("expected a mapping in end, found {}", end.kind()),
                ));
            };
            for (k, v) in inner {
                if v.as_scalar().is_some() {
                    need_number(end_inner.get(k), format!("{path}.{k}"))?;
                }
            }
            Ok(())
        }
        Param::Sequence(items) => {
            let Some(end_items) = end.as_sequence() else {
                return Err(MorphError::mismatch(
                    transform,
                    path,
                    format!("expected a sequence in end, found {}", end.kind()),
                ));
            };
            for (j, v) in items.iter().enumerate() {
                if v.as_scalar().is_some() {
                    need_number(end_items.get(j), format!("{path}[{j}]"))?;
                }
            }
            Ok(())
        }
        Param::Opaque(_) => Ok(()),
    }
}
