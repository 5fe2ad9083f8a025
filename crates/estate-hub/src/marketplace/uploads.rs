use base64ct::{Base64, Encoding};
use rand::Rng;

use super::domain::ImageUpload;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported image type for '{filename}'")]
    UnsupportedFileType { filename: String },
    #[error("image content is not valid base64")]
    InvalidContent,
    #[error("image storage unavailable: {0}")]
    Storage(String),
}

/// File storage collaborator for listing images.
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under `filename`, returning the name to reference.
    /// Implementations must not replace an existing file.
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError>;
    fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError>;
    /// Removing a name that is not stored is not an error.
    fn remove(&self, filename: &str) -> Result<(), UploadError>;
}

pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| {
            ALLOWED_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| extension.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied name to a single safe path component.
pub fn secure_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Prefix a sanitized name with a random tag so each upload gets its own file.
pub fn unique_filename(filename: &str) -> String {
    let tag: u64 = rand::thread_rng().gen();
    format!("{tag:016x}_{filename}")
}

/// Validate, sanitize and decode an upload, then hand it to `store` under a fresh name.
pub fn store_upload<I>(store: &I, upload: &ImageUpload) -> Result<String, UploadError>
where
    I: ImageStore + ?Sized,
{
    let unsupported = || UploadError::UnsupportedFileType {
        filename: upload.filename.clone(),
    };

    if !allowed_file(&upload.filename) {
        return Err(unsupported());
    }
    let filename = secure_filename(&upload.filename)
        .filter(|name| allowed_file(name))
        .ok_or_else(unsupported)?;

    let bytes = Base64::decode_vec(upload.content.trim()).map_err(|_| UploadError::InvalidContent)?;
    store.store(&unique_filename(&filename), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_file_checks_extension_case_insensitively() {
        assert!(allowed_file("front.JPG"));
        assert!(allowed_file("plan.final.png"));
        assert!(!allowed_file("notes.pdf"));
        assert!(!allowed_file("gif"));
    }

    #[test]
    fn unique_filenames_stay_sanitized_and_distinct() {
        let first = unique_filename("front.png");
        let second = unique_filename("front.png");
        assert_ne!(first, second);
        assert!(first.ends_with("_front.png"));
        assert_eq!(secure_filename(&first), Some(first.clone()));
        assert!(allowed_file(&first));
    }

    #[test]
    fn secure_filename_strips_directories_and_odd_characters() {
        assert_eq!(
            secure_filename("../../etc/passwd"),
            Some("passwd".to_string())
        );
        assert_eq!(
            secure_filename("C:\\photos\\my house.jpg"),
            Some("my_house.jpg".to_string())
        );
        assert_eq!(secure_filename(".hidden.png"), Some("hidden.png".to_string()));
        assert_eq!(secure_filename("../"), None);
    }
}
