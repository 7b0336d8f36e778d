//! Asset store for generated media
//!
//! Image payloads are decoded and re-encoded as PNG to normalize whatever
//! format the provider returned; video payloads are written verbatim.
//! Filenames carry a 128-bit random hex suffix, so uniqueness is
//! probabilistic, not guaranteed.

use image::ImageFormat;
use rand::Rng;
use std::io::Cursor;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, Result};

/// Handler for asset storage operations
#[derive(Clone)]
pub struct AssetStore {
    base_path: PathBuf,
}

impl AssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Ensure the storage directory exists
    pub async fn ensure_dir(&self) -> Result<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).await?;
            debug!(path = ?self.base_path, "Created asset directory");
        }
        Ok(())
    }

    /// Decode, normalize to PNG, and store image bytes under
    /// `{prefix}_image_{hex}.png`
    pub async fn save_image(&self, data: &[u8], prefix: &str) -> Result<String> {
        self.ensure_dir().await?;

        let decoded = image::load_from_memory(data)
            .map_err(|e| AppError::Decode(format!("not a decodable image: {}", e)))?;

        let name = format!("{}_image_{}.png", prefix, random_hex());
        let mut buf = Vec::new();
        decoded
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| AppError::Decode(format!("failed to re-encode image: {}", e)))?;

        fs::write(self.base_path.join(&name), &buf).await?;

        debug!(name = %name, size = buf.len(), "Saved image asset");
        Ok(name)
    }

    /// Store video bytes verbatim under `video_{hex}.mp4`
    pub async fn save_video(&self, data: &[u8]) -> Result<String> {
        self.ensure_dir().await?;

        let name = format!("video_{}.mp4", random_hex());
        fs::write(self.base_path.join(&name), data).await?;

        debug!(name = %name, size = data.len(), "Saved video asset");
        Ok(name)
    }

    /// Read an asset by name
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        validate_name(name)?;

        match fs::read(self.base_path.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::AssetNotFound(name.to_string()))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Delete an asset by name
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        match fs::remove_file(self.base_path.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::AssetNotFound(name.to_string()))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

/// Asset names come from clients on some routes; keep them inside the
/// storage directory.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::AssetNotFound(name.to_string()));
    }
    Ok(())
}

fn random_hex() -> String {
    let mut rng = rand::thread_rng();
    format!("{:032x}", rng.gen::<u128>())
}

/// Build a PNG data URL for embedding a stored asset in a provider payload
pub fn png_data_url(data: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    format!("data:image/png;base64,{}", STANDARD.encode(data))
}
