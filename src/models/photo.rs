use serde::{Deserialize, Serialize};

/// Maximum individually uploaded photos per car.
pub const MAX_PHOTOS_PER_CAR: usize = 25;
/// Per-photo upload limit.
pub const MAX_PHOTO_BYTES: u64 = 4 * 1024 * 1024;
/// Upload limit for the ZIP bundle alternative.
pub const MAX_ZIP_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub key: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "fileName")]
    pub filename: Option<String>,
}

impl Photo {
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .unwrap_or_else(|| self.key.rsplit('/').next().unwrap_or(&self.key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub chassis_number: String,
    #[serde(default)]
    pub make_model: Option<String>,
    #[serde(default, alias = "photos")]
    pub images: Vec<Photo>,
    /// Storage key of the optional ZIP bundle.
    #[serde(default)]
    pub zip_file_key: Option<String>,
}

impl Car {
    pub fn photo_count(&self) -> usize {
        self.images.len()
    }

    pub fn has_zip(&self) -> bool {
        self.zip_file_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// One file the client intends to upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileSpec {
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub shipment_id: String,
    pub files: Vec<UploadFileSpec>,
}

/// Signed upload target issued for one filename.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    #[serde(alias = "filename")]
    pub file_name: String,
    #[serde(alias = "signedUrl", alias = "url")]
    pub upload_url: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedPhoto {
    pub key: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadRequest {
    pub shipment_id: String,
    pub photos: Vec<ConfirmedPhoto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePhotosRequest {
    pub shipment_id: String,
    pub photo_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlsRequest {
    pub shipment_id: String,
}

/// Time-limited download link for one stored photo.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedDownload {
    #[serde(alias = "signedUrl", alias = "downloadUrl")]
    pub url: String,
    #[serde(default, alias = "filename")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipUploadRequest {
    pub shipment_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmZipRequest {
    pub shipment_id: String,
    pub key: String,
}
