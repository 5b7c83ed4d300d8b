// Direct-to-storage transfers through backend-issued signed URLs

pub mod signed_url;

pub use signed_url::HttpSignedUrlStorage;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppResult;

/// Object storage reached through pre-authorised URLs. No bearer token is sent;
/// the signature in the URL is the credential.
#[async_trait]
pub trait SignedUrlStorage: Send + Sync {
    /// PUT `data` to a signed upload URL
    async fn put(&self, url: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// GET the object behind a signed download URL
    async fn get(&self, url: &str) -> AppResult<Bytes>;
}

/// MIME type guessed from a filename extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("front.JPG"), "image/jpeg");
        assert_eq!(content_type_for("bundle.zip"), "application/zip");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }
}
