//! Unit validation and file helpers

use crate::error::{Result, UploadError};
use crate::upload::types::UploadUnit;
use crate::validation::rules::ValidationRules;

/// Check a unit against a rule set
///
/// Rules run in order and stop at the first failure:
///
/// 1. byte length must not exceed the effective maximum size
/// 2. when an allowed-type set is present, the declared type must be in it
///
/// Image dimension bounds in `rules` are accepted but not checked.
pub fn validate_unit(unit: &UploadUnit, rules: &ValidationRules) -> Result<()> {
    let max_size = rules.effective_max_size();
    if unit.size() > max_size {
        return Err(UploadError::size_exceeded(unit.name(), unit.size(), max_size));
    }

    if let Some(allowed) = &rules.allowed_types {
        if !allowed.iter().any(|t| t == unit.content_type()) {
            return Err(UploadError::type_not_allowed(
                unit.name(),
                unit.content_type(),
            ));
        }
    }

    Ok(())
}

/// Reject a submission whose declared unit count exceeds `rules.max_files`
pub fn validate_count(count: usize, rules: &ValidationRules) -> Result<()> {
    match rules.max_files {
        Some(max_files) if max_files > 0 && count > max_files => {
            Err(UploadError::too_many_files(count, max_files))
        }
        _ => Ok(()),
    }
}

/// Human-readable byte count
pub fn format_file_size(bytes: u64) -> String {
    bytesize::ByteSize::b(bytes).to_string()
}

/// Lower-cased extension after the last dot, or an empty string
pub fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Content type for a file name, `application/octet-stream` when unknown
pub fn guess_content_type(file_name: &str) -> &'static str {
    match file_extension(file_name).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        _ => "application/octet-stream",
    }
}
