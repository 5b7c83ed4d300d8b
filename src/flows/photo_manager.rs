//! Per-shipment photo editing: staged uploads and mark-then-commit deletion.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;

use crate::error::{AppError, AppResult};
use crate::models::{
    Car, ConfirmedPhoto, Photo, UploadFileSpec, MAX_PHOTOS_PER_CAR, MAX_PHOTO_BYTES, MAX_ZIP_BYTES,
};
use crate::notify::Notifier;
use crate::services::PhotoService;
use crate::storage::{content_type_for, SignedUrlStorage};

/// A local file waiting for the next save.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedPhoto {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl StagedPhoto {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveSummary {
    pub deleted: usize,
    pub uploaded: usize,
    pub failed_uploads: Vec<String>,
    /// Staged files held back because the car would exceed its photo limit.
    pub skipped_uploads: Vec<String>,
    pub errors: Vec<String>,
}

impl SaveSummary {
    pub fn is_clean(&self) -> bool {
        self.failed_uploads.is_empty()
            && self.skipped_uploads.is_empty()
            && self.errors.is_empty()
    }

    fn message(&self) -> String {
        let mut parts = Vec::new();
        if self.uploaded > 0 {
            parts.push(format!("{} photos uploaded", self.uploaded));
        }
        if self.deleted > 0 {
            parts.push(format!("{} photos deleted", self.deleted));
        }
        if !self.failed_uploads.is_empty() {
            parts.push(format!(
                "failed to upload: {}",
                self.failed_uploads.join(", ")
            ));
        }
        if !self.skipped_uploads.is_empty() {
            parts.push(format!(
                "not uploaded, photo limit reached: {}",
                self.skipped_uploads.join(", ")
            ));
        }
        parts.extend(self.errors.iter().cloned());
        if parts.is_empty() {
            "No changes saved".to_string()
        } else {
            parts.join("; ")
        }
    }
}

pub struct PhotoManager {
    photos: PhotoService,
    storage: Arc<dyn SignedUrlStorage>,
    notifier: Arc<dyn Notifier>,
    shipment_id: String,
    car: Car,
    staged: Vec<StagedPhoto>,
    marked: BTreeSet<String>,
}

impl PhotoManager {
    pub fn new(
        photos: PhotoService,
        storage: Arc<dyn SignedUrlStorage>,
        notifier: Arc<dyn Notifier>,
        shipment_id: impl Into<String>,
        car: Car,
    ) -> Self {
        Self {
            photos,
            storage,
            notifier,
            shipment_id: shipment_id.into(),
            car,
            staged: Vec::new(),
            marked: BTreeSet::new(),
        }
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn staged(&self) -> &[StagedPhoto] {
        &self.staged
    }

    pub fn marked(&self) -> impl Iterator<Item = &str> {
        self.marked.iter().map(String::as_str)
    }

    pub fn has_changes(&self) -> bool {
        !self.staged.is_empty() || !self.marked.is_empty()
    }

    /// Photos the car will hold once pending deletions are committed.
    fn remaining_count(&self) -> usize {
        self.car
            .images
            .iter()
            .filter(|p| !self.marked.contains(&p.key))
            .count()
    }

    /// Adds files to the next save. All limits are checked up front.
    pub fn stage_upload(&mut self, files: Vec<StagedPhoto>) -> AppResult<()> {
        let result = self.check_stage(&files);
        if let Err(e) = result {
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        tracing::debug!("Staged {} photos for shipment {}", files.len(), self.shipment_id);
        self.staged.extend(files);
        Ok(())
    }

    fn check_stage(&self, files: &[StagedPhoto]) -> AppResult<()> {
        if let Some(big) = files.iter().find(|f| f.data.len() as u64 > MAX_PHOTO_BYTES) {
            return Err(AppError::Validation(format!(
                "{} is larger than {} MB",
                big.file_name,
                MAX_PHOTO_BYTES / (1024 * 1024)
            )));
        }
        let total = self.remaining_count() + self.staged.len() + files.len();
        if total > MAX_PHOTOS_PER_CAR {
            return Err(AppError::Validation(format!(
                "A car can hold at most {} photos ({} requested)",
                MAX_PHOTOS_PER_CAR, total
            )));
        }
        let mut names: BTreeSet<&str> = self.staged.iter().map(|f| f.file_name.as_str()).collect();
        for file in files {
            if !names.insert(file.file_name.as_str()) {
                return Err(AppError::Validation(format!(
                    "{} is selected more than once",
                    file.file_name
                )));
            }
        }
        Ok(())
    }

    pub fn mark_for_deletion(&mut self, key: &str) -> AppResult<()> {
        if !self.car.images.iter().any(|p| p.key == key) {
            return Err(AppError::NotFound(format!("Photo {}", key)));
        }
        self.marked.insert(key.to_string());
        Ok(())
    }

    pub fn unmark(&mut self, key: &str) {
        self.marked.remove(key);
    }

    /// Commits pending deletions, then uploads staged files.
    pub async fn save(&mut self) -> SaveSummary {
        let mut summary = SaveSummary::default();
        if !self.has_changes() {
            self.notifier.info(&summary.message());
            return summary;
        }

        if !self.marked.is_empty() {
            let keys: Vec<String> = self.marked.iter().cloned().collect();
            match self.photos.delete_photos(&self.shipment_id, keys).await {
                Ok(()) => {
                    summary.deleted = self.marked.len();
                    let marked = std::mem::take(&mut self.marked);
                    self.car.images.retain(|p| !marked.contains(&p.key));
                }
                Err(e) => {
                    tracing::error!("Photo deletion failed for {}: {}", self.shipment_id, e);
                    summary.errors.push(format!("Delete failed: {}", e.user_message()));
                }
            }
        }

        if !self.staged.is_empty() {
            // staging counted marked photos as free; recheck against what is left
            if self.car.images.len() + self.staged.len() > MAX_PHOTOS_PER_CAR {
                tracing::warn!(
                    "Holding back {} uploads for {}: car already has {} photos",
                    self.staged.len(),
                    self.shipment_id,
                    self.car.images.len()
                );
                summary.skipped_uploads =
                    self.staged.iter().map(|f| f.file_name.clone()).collect();
            } else {
                self.upload_staged(&mut summary).await;
            }
        }

        tracing::info!(
            "Photo save for {}: uploaded={}, deleted={}, failed={}",
            self.shipment_id,
            summary.uploaded,
            summary.deleted,
            summary.failed_uploads.len()
        );
        if summary.is_clean() {
            self.notifier.success(&summary.message());
        } else {
            self.notifier.error(&summary.message());
        }
        summary
    }

    async fn upload_staged(&mut self, summary: &mut SaveSummary) {
        let specs = self
            .staged
            .iter()
            .map(|f| UploadFileSpec {
                file_name: f.file_name.clone(),
                content_type: f.content_type.clone(),
            })
            .collect();
        let targets = match self.photos.request_upload_urls(&self.shipment_id, specs).await {
            Ok(t) => t,
            Err(e) => {
                summary.errors.push(format!("Upload failed: {}", e.user_message()));
                return;
            }
        };

        let storage = &self.storage;
        let uploads = self.staged.iter().map(|file| {
            let target = targets.iter().find(|t| t.file_name == file.file_name);
            async move {
                let Some(target) = target else {
                    let missing = AppError::Storage("no upload URL issued".to_string());
                    return (file.file_name.clone(), Err(missing));
                };
                let result = storage
                    .put(&target.upload_url, file.data.clone(), &file.content_type)
                    .await
                    .map(|()| target.key.clone());
                (file.file_name.clone(), result)
            }
        });
        let results = join_all(uploads).await;

        let mut confirmed = Vec::new();
        for (file_name, result) in results {
            match result {
                Ok(key) => confirmed.push(ConfirmedPhoto { key, file_name }),
                Err(e) => {
                    tracing::warn!("Upload of {} failed: {}", file_name, e);
                    summary.failed_uploads.push(file_name);
                }
            }
        }
        if confirmed.is_empty() {
            return;
        }

        let uploaded_names: BTreeSet<String> =
            confirmed.iter().map(|c| c.file_name.clone()).collect();
        let fallback: Vec<Photo> = confirmed
            .iter()
            .map(|c| Photo {
                key: c.key.clone(),
                url: None,
                filename: Some(c.file_name.clone()),
            })
            .collect();
        let count = confirmed.len();

        match self.photos.confirm_upload(&self.shipment_id, confirmed).await {
            Ok(updated) => {
                summary.uploaded = count;
                match updated {
                    Some(car) if !car.images.is_empty() => self.car.images = car.images,
                    _ => self.car.images.extend(fallback),
                }
                // failed files stay staged for a manual retry
                self.staged.retain(|f| !uploaded_names.contains(&f.file_name));
            }
            Err(e) => {
                summary.errors.push(format!("Confirm failed: {}", e.user_message()));
            }
        }
    }

    /// Replaces the ZIP bundle; goes through the same signed-URL protocol.
    pub async fn upload_zip(&mut self, file_name: &str, data: Bytes) -> AppResult<()> {
        let result = self.try_upload_zip(file_name, data).await;
        match &result {
            Ok(()) => self.notifier.success("ZIP uploaded"),
            Err(e) => self.notifier.error(&e.user_message()),
        }
        result
    }

    async fn try_upload_zip(&mut self, file_name: &str, data: Bytes) -> AppResult<()> {
        if !file_name.to_ascii_lowercase().ends_with(".zip") {
            return Err(AppError::Validation(format!("{} is not a ZIP file", file_name)));
        }
        if data.len() as u64 > MAX_ZIP_BYTES {
            return Err(AppError::Validation(format!(
                "ZIP files must be {} MB or smaller",
                MAX_ZIP_BYTES / (1024 * 1024)
            )));
        }
        let target = self
            .photos
            .request_zip_upload(&self.shipment_id, file_name)
            .await?;
        self.storage
            .put(&target.upload_url, data, content_type_for(file_name))
            .await?;
        self.photos
            .confirm_zip_upload(&self.shipment_id, &target.key)
            .await?;
        self.car.zip_file_key = Some(target.key);
        Ok(())
    }
}
