use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::http_client::ApiClient;
use crate::models::{
    Ack, Car, ConfirmUploadRequest, ConfirmZipRequest, ConfirmedPhoto, DataEnvelope,
    DeletePhotosRequest, DownloadUrlsRequest, SignedDownload, SignedUpload, UploadFileSpec,
    UploadUrlRequest, ZipUploadRequest,
};

/// Signed URL lists arrive bare or wrapped in a named field.
#[derive(Deserialize)]
#[serde(untagged)]
enum UrlList<T> {
    Bare(Vec<T>),
    Uploads {
        #[serde(alias = "uploadUrls", alias = "signedUrls")]
        urls: Vec<T>,
    },
    Downloads {
        #[serde(alias = "photos", alias = "downloadUrls")]
        files: Vec<T>,
    },
}

impl<T> UrlList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            UrlList::Bare(v) => v,
            UrlList::Uploads { urls } => urls,
            UrlList::Downloads { files } => files,
        }
    }
}

#[derive(Clone)]
pub struct PhotoService {
    api: ApiClient,
}

impl PhotoService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Phase one of an upload: one signed PUT target per file.
    pub async fn request_upload_urls(
        &self,
        shipment_id: &str,
        files: Vec<UploadFileSpec>,
    ) -> AppResult<Vec<SignedUpload>> {
        if files.is_empty() {
            return Err(AppError::Validation("No photos selected".to_string()));
        }
        tracing::info!(
            "Requesting {} upload URLs for shipment {}",
            files.len(),
            shipment_id
        );
        let body = UploadUrlRequest {
            shipment_id: shipment_id.to_string(),
            files,
        };
        let envelope: DataEnvelope<UrlList<SignedUpload>> =
            self.api.post("/photos/upload", &body).await?;
        Ok(envelope.data.into_vec())
    }

    /// Phase three: persists metadata for the files that reached storage.
    pub async fn confirm_upload(
        &self,
        shipment_id: &str,
        photos: Vec<ConfirmedPhoto>,
    ) -> AppResult<Option<Car>> {
        tracing::info!(
            "Confirming {} uploaded photos for shipment {}",
            photos.len(),
            shipment_id
        );
        let body = ConfirmUploadRequest {
            shipment_id: shipment_id.to_string(),
            photos,
        };
        let envelope: DataEnvelope<Option<Car>> = self.api.post("/photos/confirm", &body).await?;
        Ok(envelope.data)
    }

    pub async fn delete_photos(&self, shipment_id: &str, photo_keys: Vec<String>) -> AppResult<()> {
        if photo_keys.is_empty() {
            return Ok(());
        }
        tracing::info!(
            "Deleting {} photos from shipment {}",
            photo_keys.len(),
            shipment_id
        );
        let body = DeletePhotosRequest {
            shipment_id: shipment_id.to_string(),
            photo_keys,
        };
        let _: Ack = self.api.post("/photos/delete", &body).await?;
        Ok(())
    }

    pub async fn download_urls(&self, shipment_id: &str) -> AppResult<Vec<SignedDownload>> {
        let body = DownloadUrlsRequest {
            shipment_id: shipment_id.to_string(),
        };
        let envelope: DataEnvelope<UrlList<SignedDownload>> =
            self.api.post("/photos/download", &body).await?;
        Ok(envelope.data.into_vec())
    }

    pub async fn request_zip_upload(
        &self,
        shipment_id: &str,
        file_name: &str,
    ) -> AppResult<SignedUpload> {
        tracing::info!("Requesting ZIP upload URL for shipment {}", shipment_id);
        let body = ZipUploadRequest {
            shipment_id: shipment_id.to_string(),
            file_name: file_name.to_string(),
        };
        let envelope: DataEnvelope<SignedUpload> =
            self.api.post("/photos/upload-zip", &body).await?;
        Ok(envelope.data)
    }

    pub async fn confirm_zip_upload(&self, shipment_id: &str, key: &str) -> AppResult<()> {
        let body = ConfirmZipRequest {
            shipment_id: shipment_id.to_string(),
            key: key.to_string(),
        };
        let _: Ack = self.api.post("/photos/confirm-zip", &body).await?;
        Ok(())
    }
}
