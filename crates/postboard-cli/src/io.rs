use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::client::CliError;

const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

pub fn read_value(val: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    if let Some(path) = file {
        let data = fs::read_to_string(&path).map_err(|source| CliError::InputFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(data)
    } else if let Some(v) = val {
        Ok(v)
    } else {
        Err(CliError::InvalidInput("value required".into()))
    }
}

/// An image read from disk, with its mime type guessed from the extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

pub fn read_image(path: &Path) -> Result<ImageFile, CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "image file {} is empty",
            path.display()
        )));
    }

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("image")
        .to_string();
    let mime = mime_guess::from_path(path)
        .first()
        .map_or_else(|| FALLBACK_IMAGE_MIME.to_string(), |m| m.essence_str().to_string());

    Ok(ImageFile {
        file_name,
        mime,
        bytes,
    })
}
