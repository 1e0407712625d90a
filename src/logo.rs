use printpdf::image_crate::{self, DynamicImage};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, Result};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// A picked logo file held in memory. Bytes are shared so snapshots for
/// export threads don't copy the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub file_name: String,
    pub mime: String,
    bytes: Arc<Vec<u8>>,
}

impl Logo {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Logo {
            file_name,
            mime,
            bytes: Arc::new(bytes),
        }
    }

    /// Reads the file as-is. Size and format are not checked.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "logo".to_string());
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Same picked file, without comparing contents.
    pub fn same_source(&self, other: &Logo) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        image_crate::load_from_memory(&self.bytes).map_err(|e| AppError::Image(e.to_string()))
    }
}

/// Opens the native picker. `None` when the user cancels or the file can't be read.
pub fn pick_logo() -> Option<Logo> {
    let path = rfd::FileDialog::new()
        .set_title("Select Logo")
        .add_filter("Image", IMAGE_EXTENSIONS)
        .pick_file()?;

    match Logo::from_path(&path) {
        Ok(logo) => {
            log::info!(
                "Loaded logo {} ({}, {} bytes)",
                logo.file_name,
                logo.mime,
                logo.bytes().len()
            );
            Some(logo)
        }
        Err(e) => {
            log::warn!("Could not read logo {:?}: {}", path, e);
            None
        }
    }
}
