//! Utility functions for artifact naming and path manipulation

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use crate::validation::WORD_DOCUMENT_SUFFIX;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Name used when neither the service nor the original file yields one
const FALLBACK_FILENAME: &str = "converted.pdf";

/// Extract the filename from a Content-Disposition header value
///
/// Supports both forms the header may carry:
/// - `attachment; filename="report.pdf"` (quotes optional), returned verbatim
/// - `attachment; filename*=UTF-8''report%20final.pdf` (RFC 5987), URL-decoded
///
/// The first usable parameter wins. A `;` inside a quoted value does not end the
/// parameter. Returns `None` when no filename parameter is present.
pub fn extract_filename_from_disposition(content_disposition: &str) -> Option<String> {
    for part in disposition_params(content_disposition) {
        let part = part.trim();
        if let Some(raw) = part.strip_prefix("filename=") {
            let filename = raw.trim_matches('"');
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        } else if let Some(encoded) = part.strip_prefix("filename*=") {
            // Format is: charset'lang'encoded-filename
            if let Some(idx) = encoded.rfind('\'')
                && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
                && !decoded.is_empty()
            {
                return Some(decoded.into_owned());
            }
        }
    }
    None
}

/// Split header parameters on `;`, ignoring separators inside double quotes
fn disposition_params(value: &str) -> impl Iterator<Item = &str> {
    let mut in_quotes = false;
    value.split(move |c: char| {
        if c == '"' {
            in_quotes = !in_quotes;
        }
        c == ';' && !in_quotes
    })
}

/// Derive the PDF name from the original document name
///
/// Replaces a trailing `.doc`/`.docx` (any case) with `.pdf`. A name without that
/// suffix gets `.pdf` appended.
///
/// # Examples
///
/// ```
/// use docconv::utils::derive_pdf_filename;
///
/// assert_eq!(derive_pdf_filename("report.docx"), "report.pdf");
/// assert_eq!(derive_pdf_filename("Notes.DOC"), "Notes.pdf");
/// ```
pub fn derive_pdf_filename(original_name: &str) -> String {
    if original_name.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }
    if WORD_DOCUMENT_SUFFIX.is_match(original_name) {
        WORD_DOCUMENT_SUFFIX
            .replace(original_name, ".pdf")
            .into_owned()
    } else {
        format!("{original_name}.pdf")
    }
}

/// Pick the artifact filename: the service's Content-Disposition filename when
/// present, otherwise the original name with its Word suffix swapped for `.pdf`.
pub fn resolve_artifact_filename(content_disposition: Option<&str>, original_name: &str) -> String {
    content_disposition
        .and_then(extract_filename_from_disposition)
        .unwrap_or_else(|| derive_pdf_filename(original_name))
}

/// Reduce a service-provided filename to a single path component
///
/// Keeps a hostile `filename="../../etc/passwd"` from escaping the output directory.
pub fn safe_file_name(filename: &str) -> String {
    let normalized = filename.replace('\\', "/");
    match Path::new(&normalized).file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => FALLBACK_FILENAME.to_string(),
    }
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// # Arguments
///
/// * `path` - The desired file path
/// * `action` - How to handle file collisions
///
/// # Returns
///
/// Returns the final path to use. For Rename action, this may have a suffix added.
/// For Skip action, returns an error if the file already exists.
/// For Overwrite action, returns the original path unchanged.
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: "File already exists and collision action is Skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: "Cannot extract file stem".to_string(),
                })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().ok_or_else(|| Error::FileCollision {
                path: path.to_path_buf(),
                reason: "Cannot extract parent directory".to_string(),
            })?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(Error::FileCollision {
                path: path.to_path_buf(),
                reason: format!(
                    "Could not find unique filename after {} attempts",
                    MAX_RENAME_ATTEMPTS
                ),
            })
        }
    }
}
