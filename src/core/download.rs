use crate::domain::model::{DownloadReport, S3Location};
use crate::domain::ports::DatasetStore;
use crate::utils::error::Result;
use crate::utils::progress::Progress;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// What a download run has to do, given the listed keys and the local tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    pub directories: BTreeSet<PathBuf>,
    pub files: Vec<String>,
    pub skipped: usize,
}

/// Map an object key to a path under `root`. Keys that would escape `root` yield `None`.
pub fn local_path(root: &Path, key: &str) -> Option<PathBuf> {
    let relative = Path::new(key);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Directory markers (`.../`) and files already present locally are skipped,
/// which makes a rerun resume an interrupted download.
pub fn plan_downloads(keys: &[String], root: &Path) -> DownloadPlan {
    let mut plan = DownloadPlan::default();

    for key in keys {
        let Some(local) = local_path(root, key) else {
            tracing::warn!("Skipping object with unsafe key: {}", key);
            plan.skipped += 1;
            continue;
        };

        if key.ends_with('/') {
            plan.directories.insert(local);
            plan.skipped += 1;
            continue;
        }

        if let Some(parent) = local.parent() {
            plan.directories.insert(parent.to_path_buf());
        }

        if local.exists() {
            plan.skipped += 1;
        } else {
            plan.files.push(key.clone());
        }
    }

    plan
}

pub struct DatasetDownloader<S: DatasetStore> {
    store: S,
    workers: usize,
    show_progress: bool,
}

impl<S: DatasetStore> DatasetDownloader<S> {
    pub fn new(store: S, workers: usize) -> Self {
        Self {
            store,
            workers: workers.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Mirror every object under `location` into `root`.
    ///
    /// Individual failures are collected in the report instead of aborting the run.
    pub async fn download(
        &self,
        location: &S3Location,
        root: &Path,
    ) -> Result<DownloadReport> {
        let keys = self.store.list_keys(&location.bucket, &location.prefix).await?;
        tracing::info!(
            "Found {} objects under s3://{}/{}",
            keys.len(),
            location.bucket,
            location.prefix
        );

        let plan = plan_downloads(&keys, root);
        for dir in &plan.directories {
            tokio::fs::create_dir_all(dir).await?;
        }

        let store = &self.store;
        let bucket = location.bucket.as_str();
        let total = plan.files.len();
        let progress = &Progress::bar(total as u64, "files", self.show_progress);

        let failed: Vec<String> = stream::iter(plan.files)
            .map(move |key| async move {
                let destination = root.join(&key);
                let result = store.fetch(bucket, &key, &destination).await;
                (key, result)
            })
            .buffer_unordered(self.workers)
            .filter_map(move |(key, result)| async move {
                progress.inc(1);
                match result {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::warn!("Download of {} failed: {}", key, e);
                        Some(key)
                    }
                }
            })
            .collect()
            .await;

        if failed.is_empty() {
            progress.finish_ok("done");
        } else {
            progress.finish_err(&format!("{} failed", failed.len()));
        }

        let report = DownloadReport {
            listed: keys.len(),
            skipped: plan.skipped,
            downloaded: total - failed.len(),
            failed,
        };
        tracing::debug!("Download report: {:?}", report);
        Ok(report)
    }
}
