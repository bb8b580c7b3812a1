//! File selection checks applied before anything is sent to the service.

use crate::types::SelectedFile;
use regex::Regex;
use std::sync::LazyLock;

/// Reason shown when the file is not a Word document
pub const NOT_A_WORD_DOCUMENT: &str = "Please select a Word document (.doc or .docx)";

#[allow(clippy::expect_used)]
pub(crate) static WORD_DOCUMENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(doc|docx)$").expect("valid Word suffix pattern"));

/// Outcome of validating a candidate file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    /// The file may be submitted
    Accepted,
    /// The file must not be submitted
    Rejected(String),
}

/// Accept `.doc` and `.docx` names, case-insensitively, anchored at the end of the name.
pub fn validate_file_name(file_name: &str) -> Validation {
    if WORD_DOCUMENT_SUFFIX.is_match(file_name) {
        Validation::Accepted
    } else {
        Validation::Rejected(NOT_A_WORD_DOCUMENT.to_string())
    }
}

/// Validate name, emptiness and size of a selected file.
///
/// The size ceiling mirrors the service's own upload limit so that an oversize
/// document is rejected locally instead of after a full upload.
pub fn validate_file(file: &SelectedFile, max_upload_bytes: u64) -> Validation {
    if let rejected @ Validation::Rejected(_) = validate_file_name(&file.name) {
        return rejected;
    }

    if file.content.is_empty() {
        return Validation::Rejected(format!("'{}' is empty", file.name));
    }

    if file.size() > max_upload_bytes {
        return Validation::Rejected(format!(
            "File size must be less than {}",
            describe_limit(max_upload_bytes)
        ));
    }

    Validation::Accepted
}

/// Whole megabytes when the limit is a multiple of one, bytes otherwise
fn describe_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
