//! Magic-number verification
//!
//! Reads the head of a file and checks it against the signature of the
//! declared type. Only a handful of formats are known; anything else passes.

use super::{mime_essence, validate_file, FileDescriptor, FileValidationResult};
use crate::config::{GuardConfig, SignaturePolicy, DEFAULT_SIGNATURE_PROBE_BYTES};
use crate::errors::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Formats whose leading bytes are verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSignature {
    Jpeg,
    Png,
    Gif,
    Pdf,
    Zip,
}

const ALL_SIGNATURES: [FileSignature; 5] = [
    FileSignature::Jpeg,
    FileSignature::Png,
    FileSignature::Gif,
    FileSignature::Pdf,
    FileSignature::Zip,
];

impl FileSignature {
    /// Accepted leading byte sequences
    pub fn magic(&self) -> &'static [&'static [u8]] {
        match self {
            FileSignature::Jpeg => &[b"\xFF\xD8\xFF"],
            FileSignature::Png => &[b"\x89PNG\r\n\x1A\n"],
            FileSignature::Gif => &[b"GIF87a", b"GIF89a"],
            FileSignature::Pdf => &[b"%PDF-"],
            FileSignature::Zip => &[b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"],
        }
    }

    /// Signature expected for a declared MIME type, if it is a known one
    pub fn for_mime(mime: &str) -> Option<Self> {
        match mime_essence(mime).as_str() {
            "image/jpeg" | "image/jpg" => Some(FileSignature::Jpeg),
            "image/png" => Some(FileSignature::Png),
            "image/gif" => Some(FileSignature::Gif),
            "application/pdf" => Some(FileSignature::Pdf),
            "application/zip" | "application/x-zip-compressed" => Some(FileSignature::Zip),
            _ => None,
        }
    }

    /// Format identified by the leading bytes
    pub fn detect(head: &[u8]) -> Option<Self> {
        ALL_SIGNATURES.into_iter().find(|sig| sig.matches(head))
    }

    pub fn matches(&self, head: &[u8]) -> bool {
        self.magic().iter().any(|magic| head.starts_with(magic))
    }
}

/// Whether `head` is consistent with `mime`. Unknown types pass.
pub fn signature_matches(head: &[u8], mime: &str) -> bool {
    match FileSignature::for_mime(mime) {
        Some(expected) => expected.matches(head),
        None => true,
    }
}

/// Read at most `limit` bytes from the start of `reader`
pub async fn read_head<R>(reader: &mut R, limit: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(limit);
    reader.take(limit as u64).read_to_end(&mut head).await?;
    Ok(head)
}

async fn probe<R>(reader: &mut R, mime: &str, limit: usize) -> bool
where
    R: AsyncRead + Unpin,
{
    let head = match read_head(reader, limit).await {
        Ok(head) => head,
        Err(e) => {
            log::error!("Could not read file for signature check: {}", e);
            return false;
        }
    };

    let matches = signature_matches(&head, mime);
    if !matches {
        log::error!(
            "File signature mismatch: declared {}, content looks like {:?}",
            mime,
            FileSignature::detect(&head)
        );
    }
    matches
}

/// Check the first 512 bytes of `reader` against `declared_mime`. A read
/// failure counts as a mismatch.
pub async fn check_file_signature<R>(reader: &mut R, declared_mime: &str) -> bool
where
    R: AsyncRead + Unpin,
{
    probe(reader, declared_mime, DEFAULT_SIGNATURE_PROBE_BYTES).await
}

/// Open `path` and check its signature
pub async fn check_path_signature(path: impl AsRef<Path>, declared_mime: &str) -> Result<bool> {
    let mut file = File::open(path.as_ref()).await?;
    Ok(check_file_signature(&mut file, declared_mime).await)
}

/// Metadata checks plus the signature check, with the mismatch enforced
/// according to `config.signature_policy`
pub async fn validate_file_with_contents<R>(
    file: &FileDescriptor,
    reader: &mut R,
    config: &GuardConfig,
) -> FileValidationResult
where
    R: AsyncRead + Unpin,
{
    let mut result = validate_file(file);

    if !probe(reader, &file.mime_type, config.signature_probe_bytes).await {
        let message = format!("File content does not match declared type '{}'", file.mime_type);
        match config.signature_policy {
            SignaturePolicy::LogOnly => result.warn(message),
            SignaturePolicy::Reject => result.error(message),
        }
    }

    result
}
