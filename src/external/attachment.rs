use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A file handed over by the upload control, already base64-encoded for
/// transport.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UploadedFile {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    /// Base64-encoded file content.
    pub data: String,
}

/// Size-validated transport record sent to the ticket proxy.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProcessedFile {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub data: String,
}

/// Converts uploaded files into transport records, dropping any file whose
/// decoded size exceeds `max_bytes` or whose payload is not valid base64.
/// A dropped file does not abort the remaining attachments.
pub fn to_transport(files: &[UploadedFile], max_bytes: usize) -> Vec<ProcessedFile> {
    let mut processed = Vec::with_capacity(files.len());
    for f in files {
        match BASE64.decode(f.data.as_bytes()) {
            Ok(bytes) if bytes.len() > max_bytes => {
                log::warn!(
                    "Attachment {} is {} bytes, over the {} byte limit, skipping",
                    &f.file_name,
                    bytes.len(),
                    max_bytes
                );
            }
            Ok(_) => processed.push(ProcessedFile {
                file_name: f.file_name.clone(),
                content_type: f.content_type.clone(),
                data: f.data.clone(),
            }),
            Err(e) => {
                log::warn!("Attachment {} is not valid base64 ({}), skipping", &f.file_name, e);
            }
        }
    }
    processed
}
