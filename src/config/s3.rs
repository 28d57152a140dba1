use crate::domain::model::DatasetGrant;
use crate::domain::ports::DatasetStore;
use crate::utils::error::{Result, SbxError};
use async_trait::async_trait;
use aws_config::environment::EnvironmentVariableRegionProvider;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};

const FALLBACK_REGION: &str = "us-east-1";

/// Suffix of the file an object is streamed into before it is renamed into place.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Dataset bucket access with the short-lived credentials handed out by the API.
#[derive(Debug, Clone)]
pub struct S3DatasetStore {
    client: S3Client,
}

impl S3DatasetStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Client for the grant's bucket. `endpoint_url` points it at an S3-compatible
    /// service with path-style addressing instead of AWS.
    pub async fn from_grant(grant: DatasetGrant, endpoint_url: Option<String>) -> Self {
        let credentials = Credentials::new(
            grant.access_key,
            grant.secret_key,
            None,
            None,
            "sbx-dataset-grant",
        );
        // Custom endpoints never need the instance metadata lookup of the default chain.
        let region = if endpoint_url.is_some() {
            RegionProviderChain::first_try(EnvironmentVariableRegionProvider::new())
                .or_else(FALLBACK_REGION)
        } else {
            RegionProviderChain::default_provider().or_else(FALLBACK_REGION)
        };

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = S3ConfigBuilder::from(&sdk_config);
        if let Some(url) = endpoint_url {
            tracing::debug!("Using S3 endpoint {}", url);
            builder = builder.endpoint_url(url).force_path_style(true);
        }

        Self::new(S3Client::from_conf(builder.build()))
    }
}

/// `<destination>.part`, next to the destination so the final rename stays on one filesystem.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// Stream `reader` into `destination`. The file only appears once the whole body has
/// been written; on failure the partial file is removed.
pub async fn write_atomically<R: AsyncRead>(reader: R, destination: &Path) -> Result<u64> {
    let partial = partial_path(destination);
    let mut reader = std::pin::pin!(reader);

    let written = async {
        let mut file = tokio::fs::File::create(&partial).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        tokio::fs::rename(&partial, destination).await?;
        Ok::<u64, std::io::Error>(written)
    }
    .await;

    match written {
        Ok(written) => Ok(written),
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::debug!("Could not remove {}: {}", partial.display(), cleanup);
            }
            Err(e.into())
        }
    }
}

#[async_trait]
impl DatasetStore for S3DatasetStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| SbxError::S3Error {
                message: format!("Failed to list s3://{}/{}: {}", bucket, prefix, DisplayErrorContext(e)),
            })?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        tracing::debug!("Listed {} objects under s3://{}/{}", keys.len(), bucket, prefix);
        Ok(keys)
    }

    async fn fetch(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| SbxError::S3Error {
                message: format!("Failed to read s3://{}/{}: {}", bucket, key, DisplayErrorContext(e)),
            })?;

        let written = write_atomically(resp.body.into_async_read(), destination)
            .await
            .map_err(|e| SbxError::S3Error {
                message: format!("Failed to download s3://{}/{}: {}", bucket, key, e),
            })?;
        tracing::trace!("Wrote {} bytes to {}", written, destination.display());
        Ok(())
    }
}
