//! Pre-flight validation of upload units
//!
//! Validation is a pure function of a unit and a [`ValidationRules`] set. It
//! never touches the network and never publishes progress on its own; the
//! pipeline turns failures into error records.

pub mod operations;
pub mod rules;

pub use operations::{
    file_extension, format_file_size, guess_content_type, validate_count, validate_unit,
};
pub use rules::{is_document, is_image, UploadCategory, ValidationRules};
