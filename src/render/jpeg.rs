use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tracing::debug;

use super::{Blend, Representative, RepresentativeRenderer};
use crate::error::{Error, Result};
use crate::hierarchy::ClusterId;

impl Blend for RgbImage {
    fn blend(members: &[&Self]) -> Result<Self> {
        let first = members
            .first()
            .ok_or_else(|| Error::RenderFailure("no images to blend".into()))?;
        let (width, height) = first.dimensions();
        let mut acc = vec![0.0f32; first.as_raw().len()];
        for img in members {
            if img.dimensions() != (width, height) {
                let (w, h) = img.dimensions();
                return Err(Error::RenderFailure(format!(
                    "image is {w}x{h}, expected {width}x{height}"
                )));
            }
            for (a, &p) in acc.iter_mut().zip(img.as_raw().iter()) {
                *a += p as f32;
            }
        }
        let n = members.len() as f32;
        let pixels: Vec<u8> = acc
            .into_iter()
            .map(|v| (v / n).round().clamp(0.0, 255.0) as u8)
            .collect();
        RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| Error::RenderFailure("blended buffer has wrong length".into()))
    }
}

/// Renderer that blends `RgbImage`s and writes `<dir>/<prefix>-<id>.JPEG`.
#[derive(Debug, Clone)]
pub struct JpegRenderer {
    dir: PathBuf,
    prefix: String,
}

impl JpegRenderer {
    /// Create a renderer writing into `dir` with filename `prefix`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a given cluster id is written to.
    pub fn path_for(&self, id: ClusterId) -> PathBuf {
        self.dir
            .join(format!("{}.JPEG", id.file_stem(&self.prefix)))
    }
}

impl RepresentativeRenderer for JpegRenderer {
    type Image = RgbImage;

    fn render(&mut self, id: ClusterId, members: &[&RgbImage]) -> Result<Representative<RgbImage>> {
        let image = RgbImage::blend(members)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::RenderFailure(format!("{}: {e}", self.dir.display())))?;
        let path = self.path_for(id);
        image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|e| Error::RenderFailure(format!("{}: {e}", path.display())))?;
        debug!(id = id.get(), members = members.len(), path = %path.display(), "wrote representative");
        Ok(Representative {
            handle: path.to_string_lossy().into_owned(),
            image,
        })
    }
}
