//! Type and size gate applied to every candidate file before it reaches the
//! image store. Only the declared metadata is inspected; file contents are
//! not sniffed.

use crate::error::ValidationError;

pub const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// 10 MiB.
pub const MAX_IMAGE_BYTES: u64 = 10_485_760;

#[derive(Debug, Clone, Copy)]
pub struct FileMeta<'a> {
    pub media_type: &'a str,
    pub size_bytes: u64,
}

pub fn validate(file: &FileMeta<'_>) -> Result<(), ValidationError> {
    if !ACCEPTED_MEDIA_TYPES.contains(&file.media_type) {
        return Err(ValidationError::UnsupportedType {
            media_type: file.media_type.to_string(),
        });
    }

    if file.size_bytes > MAX_IMAGE_BYTES {
        return Err(ValidationError::TooLarge {
            size_bytes: file.size_bytes,
            limit: MAX_IMAGE_BYTES,
        });
    }

    Ok(())
}
