//! Bundles the photos of several shipments into one ZIP archive.
//!
//! Shipments are processed one after another; the photos of a single shipment
//! are fetched concurrently. A shipment with any failed fetch is left out of
//! the archive and counted as failed.

use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthContext;
use crate::models::{Shipment, SignedDownload};
use crate::notify::Notifier;
use crate::services::PhotoService;
use crate::storage::SignedUrlStorage;
use crate::store::MASS_DOWNLOAD_CAP;

/// One shipment to include, with the folder name its photos go under.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTarget {
    pub shipment_id: String,
    pub folder: String,
}

impl DownloadTarget {
    pub fn new(shipment_id: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            shipment_id: shipment_id.into(),
            folder: folder.into(),
        }
    }
}

impl From<&Shipment> for DownloadTarget {
    fn from(shipment: &Shipment) -> Self {
        let folder = shipment
            .chassis_number()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(shipment.id.as_str());
        Self::new(shipment.id.clone(), folder)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub failed: Vec<String>,
    /// Serialised ZIP; `None` when no shipment succeeded.
    pub archive: Option<Vec<u8>>,
}

impl DownloadReport {
    /// Writes the archive under `dir` with a timestamped name.
    pub fn save_to(&self, dir: &Path) -> AppResult<Option<PathBuf>> {
        let Some(archive) = &self.archive else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;
        let name = format!(
            "shipment-photos-{}.zip",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        let path = dir.join(name);
        std::fs::write(&path, archive)?;
        tracing::info!("Saved photo archive: {} ({} bytes)", path.display(), archive.len());
        Ok(Some(path))
    }
}

pub struct MassDownloader {
    photos: PhotoService,
    storage: Arc<dyn SignedUrlStorage>,
    notifier: Arc<dyn Notifier>,
}

impl MassDownloader {
    pub fn new(
        photos: PhotoService,
        storage: Arc<dyn SignedUrlStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            photos,
            storage,
            notifier,
        }
    }

    pub async fn download(
        &self,
        auth: &AuthContext,
        targets: &[DownloadTarget],
    ) -> AppResult<DownloadReport> {
        if let Err(e) = check_request(auth, targets) {
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        tracing::info!("Mass download started: shipments={}", targets.len());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut report = DownloadReport::default();
        let mut used_folders = BTreeSet::new();

        for target in targets {
            match self.fetch_shipment(&target.shipment_id).await {
                Ok(files) => {
                    let folder = unique_name(&mut used_folders, &sanitize(&target.folder));
                    write_folder(&mut zip, options, &folder, files)?;
                    report.success_count += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping shipment {} in mass download: {}",
                        target.shipment_id,
                        e
                    );
                    report.fail_count += 1;
                    report.failed.push(target.shipment_id.clone());
                }
            }
        }

        let archive = zip.finish()?.into_inner();
        if report.success_count > 0 {
            report.archive = Some(archive);
        }

        tracing::info!(
            "Mass download finished: success={}, failed={}",
            report.success_count,
            report.fail_count
        );
        match (report.success_count, report.fail_count) {
            (0, _) => self.notifier.error("No photos could be downloaded"),
            (ok, 0) => self
                .notifier
                .success(&format!("Downloaded photos for {} shipments", ok)),
            (ok, failed) => self.notifier.warning(&format!(
                "Downloaded photos for {} shipments, {} failed",
                ok, failed
            )),
        }
        Ok(report)
    }

    /// All photos of one shipment, or the first error.
    async fn fetch_shipment(&self, shipment_id: &str) -> AppResult<Vec<(String, Bytes)>> {
        let links = self.photos.download_urls(shipment_id).await?;
        let storage = &self.storage;
        let fetches = links.iter().enumerate().map(|(i, link)| async move {
            let data = storage.get(&link.url).await?;
            Ok::<_, AppError>((file_name_for(link, i), data))
        });
        join_all(fetches).await.into_iter().collect()
    }
}

fn check_request(auth: &AuthContext, targets: &[DownloadTarget]) -> AppResult<()> {
    auth.ensure(auth.can_mass_download_photos(), "download photos in bulk")?;
    if targets.is_empty() {
        return Err(AppError::Validation(
            "Select at least one shipment to download".to_string(),
        ));
    }
    if targets.len() > MASS_DOWNLOAD_CAP {
        return Err(AppError::Validation(format!(
            "You can download photos for at most {} shipments at a time",
            MASS_DOWNLOAD_CAP
        )));
    }
    Ok(())
}

fn write_folder(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    folder: &str,
    files: Vec<(String, Bytes)>,
) -> AppResult<()> {
    zip.add_directory(format!("{}/", folder), options)?;
    let mut used = BTreeSet::new();
    for (name, data) in files {
        let name = unique_name(&mut used, &sanitize(&name));
        zip.start_file(format!("{}/{}", folder, name), options)?;
        zip.write_all(&data)?;
    }
    Ok(())
}

fn file_name_for(link: &SignedDownload, index: usize) -> String {
    link.file_name
        .clone()
        .or_else(|| {
            link.key
                .as_deref()
                .and_then(|k| k.rsplit('/').next())
                .map(str::to_string)
        })
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("photo_{}.jpg", index + 1))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Appends `_2`, `_3`, ... before the extension until `name` is unused.
fn unique_name(used: &mut BTreeSet<String>, name: &str) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
