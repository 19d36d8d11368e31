//! Upload validation
//!
//! Metadata checks on a declared file (name, MIME type, size) plus an
//! optional byte-signature check on the content, see [`signature`].

pub mod signature;

pub use signature::{
    check_file_signature, check_path_signature, signature_matches, validate_file_with_contents,
    FileSignature,
};

use crate::sanitizers::{sanitize_text, truncate_chars};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const MB: u64 = 1024 * 1024;

/// Longest name kept after sanitization
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Name used when nothing usable is left
pub const FALLBACK_FILENAME: &str = "file";

/// Declared type that is accepted without a category
pub const OCTET_STREAM: &str = "application/octet-stream";

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp", "image/bmp"];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
];

const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/ogg", "video/quicktime", "video/x-msvideo"];

const AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/mp4", "audio/wav", "audio/ogg", "audio/webm", "audio/aac"];

const ARCHIVE_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/gzip",
    "application/x-tar",
];

/// Extensions rejected whatever the declared type
pub const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "vbe", "js", "jse", "wsf", "wsh", "msi",
    "msp", "dll", "jar", "ps1", "psm1", "sh", "bash", "app", "deb", "rpm", "dmg", "pkg", "apk",
    "hta", "cpl", "reg", "lnk", "inf", "gadget",
];

lazy_static! {
    static ref RESERVED_FILENAME_CHARS_REGEX: Regex = Regex::new(r#"[/\\:*?"<>|]"#).unwrap();

    static ref SUSPICIOUS_FILENAME_REGEXES: Vec<Regex> = vec![
        Regex::new(r"(?i)script|malware|virus|trojan|exploit|payload|hack|keylog|ransom|backdoor").unwrap(),
        // executable hidden behind a harmless final extension
        Regex::new(r"(?i)\.(?:exe|bat|cmd|scr|js|vbs|sh|msi)\.\w+$").unwrap(),
    ];
}

/// Upload as declared by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Outcome of validating a file. `errors` block the upload, `warnings` do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub sanitized_name: String,
}

impl FileValidationResult {
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Broad content class, used for the size ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Document,
    Video,
    Audio,
    Archive,
    Unknown,
}

impl FileCategory {
    /// Category of a whitelisted MIME type. `None` means the type is not
    /// accepted at all; `application/octet-stream` maps to `Unknown`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime_essence(mime);
        let essence = essence.as_str();

        let tables = [
            (FileCategory::Image, IMAGE_TYPES),
            (FileCategory::Document, DOCUMENT_TYPES),
            (FileCategory::Video, VIDEO_TYPES),
            (FileCategory::Audio, AUDIO_TYPES),
            (FileCategory::Archive, ARCHIVE_TYPES),
        ];

        tables
            .iter()
            .find(|(_, types)| types.contains(&essence))
            .map(|(category, _)| *category)
            .or_else(|| (essence == OCTET_STREAM).then_some(FileCategory::Unknown))
    }

    /// Size ceiling in bytes
    pub fn max_size(&self) -> u64 {
        match self {
            FileCategory::Image => 10 * MB,
            FileCategory::Document => 50 * MB,
            FileCategory::Video => 500 * MB,
            FileCategory::Audio => 100 * MB,
            FileCategory::Archive => 100 * MB,
            FileCategory::Unknown => 50 * MB,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Document => "document",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Archive => "archive",
            FileCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased type without parameters (`text/plain; charset=utf-8` -> `text/plain`)
pub(crate) fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_lowercase()
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / MB as f64)
}

/// Lowercased extension, if the name has one
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Make a client-supplied name safe to store: text sanitization, path
/// separators and reserved characters replaced, leading and trailing dots
/// dropped. Never returns an empty name.
pub fn sanitize_filename(name: &str) -> String {
    let text = sanitize_text(name).sanitized;
    let replaced = RESERVED_FILENAME_CHARS_REGEX.replace_all(&text, "_");
    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let capped = truncate_chars(trimmed, MAX_FILENAME_LENGTH);

    if capped.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        capped
    }
}

/// Check a declared upload against the extension blacklist, the MIME
/// whitelist and the per-category size ceiling
pub fn validate_file(file: &FileDescriptor) -> FileValidationResult {
    let sanitized_name = sanitize_filename(&file.name);
    let mut result = FileValidationResult {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        sanitized_name,
    };

    if result.sanitized_name != file.name {
        result.warn("File name was sanitized");
    }

    if let Some(ext) = file_extension(&result.sanitized_name) {
        if DANGEROUS_EXTENSIONS.contains(&ext.as_str()) {
            result.error(format!("File extension '.{}' is not allowed", ext));
        }
    }

    let category = match FileCategory::from_mime(&file.mime_type) {
        Some(category) => category,
        None => {
            result.error(format!("File type '{}' is not allowed", file.mime_type));
            FileCategory::Unknown
        }
    };

    if file.size > category.max_size() {
        result.error(format!(
            "File size {} exceeds the {} limit for {} files",
            format_size(file.size),
            format_size(category.max_size()),
            category
        ));
    }

    if SUSPICIOUS_FILENAME_REGEXES
        .iter()
        .any(|re| re.is_match(&result.sanitized_name))
    {
        result.warn("File name looks suspicious");
    }

    if result.is_valid {
        log::debug!("Accepted {} file '{}'", category, result.sanitized_name);
    } else {
        log::warn!(
            "Rejected file '{}': {}",
            result.sanitized_name,
            result.errors.join("; ")
        );
    }

    result
}
