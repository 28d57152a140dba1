use anyhow::Result;
use httpmock::prelude::*;
use sbx::config::credentials::StoredConfig;
use sbx::config::s3::{partial_path, S3DatasetStore};
use sbx::config::DownloadArgs;
use sbx::domain::model::DatasetGrant;
use sbx::domain::ports::{DatasetStore, Prompter};
use sbx::{Sbx, SbxError, Settings};
use serde_json::json;
use tempfile::TempDir;

const BUCKET: &str = "sbx-customer-data";
const KEY: &str = "0123456789abcdef0123456789abcdef01234567";
const DATASET_ID: &str = "60c8f7b1e4b0a1b2c3d4e5f6";

fn grant() -> DatasetGrant {
    serde_json::from_value(json!({
        "access_key": "AKIAEXAMPLE",
        "secret_key": "secret",
        "dataset_uri": "s3://sbx-customer-data/acme/boxes",
        "synth_full_dataset_uri": "s3://sbx-customer-data/acme/boxes/full",
        "synth_sample_dataset_uri": "s3://sbx-customer-data/acme/boxes/sample"
    }))
    .unwrap()
}

fn list_page(keys: &[&str], next_token: Option<&str>) -> String {
    let contents: String = keys
        .iter()
        .map(|key| format!("<Contents><Key>{}</Key><Size>8</Size></Contents>", key))
        .collect();
    let token = next_token
        .map(|t| format!("<NextContinuationToken>{}</NextContinuationToken>", t))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{BUCKET}</Name><Prefix>acme/boxes/full</Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>{}</IsTruncated>{}{}</ListBucketResult>"#,
        keys.len(),
        next_token.is_some(),
        contents,
        token
    )
}

fn without_continuation(req: &HttpMockRequest) -> bool {
    !req.query_params
        .iter()
        .flatten()
        .any(|(name, _)| name == "continuation-token")
}

/// Two listing pages; the second is only served for the continuation token.
fn mock_listing(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let bucket_path = Regex::new(&format!("^/{}/?$", BUCKET)).unwrap();
    let second = server.mock(|when, then| {
        when.method(GET)
            .path_matches(bucket_path.clone())
            .query_param("list-type", "2")
            .query_param("continuation-token", "page-2");
        then.status(200)
            .header("content-type", "application/xml")
            .body(list_page(&["acme/boxes/full/annotations/coco.json"], None));
    });
    let first = server.mock(|when, then| {
        when.method(GET)
            .path_matches(bucket_path)
            .query_param("list-type", "2")
            .query_param("prefix", "acme/boxes/full")
            .matches(without_continuation);
        then.status(200)
            .header("content-type", "application/xml")
            .body(list_page(
                &["acme/boxes/full/", "acme/boxes/full/images/0001.png"],
                Some("page-2"),
            ));
    });
    (first, second)
}

fn mock_object<'a>(server: &'a MockServer, key: &str, body: &str) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path(format!("/{}/{}", BUCKET, key));
        then.status(200)
            .header("content-type", "application/octet-stream")
            .body(body);
    })
}

#[tokio::test]
async fn test_listing_follows_continuation_tokens() -> Result<()> {
    let server = MockServer::start();
    let (first, second) = mock_listing(&server);

    let store = S3DatasetStore::from_grant(grant(), Some(server.base_url())).await;
    let keys = store.list_keys(BUCKET, "acme/boxes/full").await?;

    first.assert();
    second.assert();
    assert_eq!(
        keys,
        vec![
            "acme/boxes/full/".to_string(),
            "acme/boxes/full/images/0001.png".to_string(),
            "acme/boxes/full/annotations/coco.json".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_fetch_writes_the_object_body() -> Result<()> {
    let server = MockServer::start();
    let object = mock_object(&server, "acme/boxes/full/images/0001.png", "png-0001");
    let dir = TempDir::new()?;
    let destination = dir.path().join("0001.png");

    let store = S3DatasetStore::from_grant(grant(), Some(server.base_url())).await;
    store
        .fetch(BUCKET, "acme/boxes/full/images/0001.png", &destination)
        .await?;

    object.assert();
    assert_eq!(std::fs::read_to_string(&destination)?, "png-0001");
    assert!(!partial_path(&destination).exists());
    Ok(())
}

#[tokio::test]
async fn test_denied_fetch_leaves_no_file() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/{}/acme/boxes/full/images/0001.png", BUCKET));
        then.status(403)
            .header("content-type", "application/xml")
            .body(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>r1</RequestId></Error>"#,
            );
    });
    let dir = TempDir::new()?;
    let destination = dir.path().join("0001.png");

    let store = S3DatasetStore::from_grant(grant(), Some(server.base_url())).await;
    let err = store
        .fetch(BUCKET, "acme/boxes/full/images/0001.png", &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, SbxError::S3Error { .. }));
    assert!(err.to_string().contains("AccessDenied"));
    assert!(!destination.exists());
    assert!(!partial_path(&destination).exists());
    Ok(())
}

struct Silent;

impl Prompter for Silent {
    fn say(&self, _message: &str) {}

    fn prompt(&self, _message: &str) -> sbx::Result<String> {
        Ok(String::new())
    }
}

#[tokio::test]
async fn test_download_against_configured_endpoint() -> Result<()> {
    let server = MockServer::start();
    let grant_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/app-api/v0/user/get-aws-creds")
            .json_body(json!({ "id": DATASET_ID }));
        then.status(200).json_body(json!({
            "access_key": "AKIAEXAMPLE",
            "secret_key": "secret",
            "dataset_uri": "s3://sbx-customer-data/acme/boxes",
            "synth_full_dataset_uri": "s3://sbx-customer-data/acme/boxes/full",
            "synth_sample_dataset_uri": "s3://sbx-customer-data/acme/boxes/sample"
        }));
    });
    mock_listing(&server);
    let image = mock_object(&server, "acme/boxes/full/images/0001.png", "png-0001");
    let coco = mock_object(&server, "acme/boxes/full/annotations/coco.json", "{\"images\":[]}");

    let dir = TempDir::new()?;
    let config_path = dir.path().join("config.toml");
    StoredConfig::from_toml_str(&format!(
        "[api]\nkey = \"{KEY}\"\n[user]\nemail = \"a@b.c\"\nname = \"A\"\n[company]\nname = \"C\"\n"
    ))?
    .save(&config_path)?;
    let mut settings = Settings::for_endpoint(&server.base_url(), config_path);
    settings.s3_endpoint = Some(server.base_url());
    let sbx = Sbx::new(settings)?;

    let target = dir.path().join("datasets");
    std::fs::create_dir_all(&target)?;
    let args = DownloadArgs {
        dataset_id: DATASET_ID.to_string(),
        download_dir: target.to_string_lossy().into_owned(),
        sample: false,
    };
    let message = sbx.dataset_download(&args, &Silent).await?;

    grant_mock.assert();
    image.assert();
    coco.assert();
    assert!(message.contains("Dataset Ready!"));
    assert_eq!(
        std::fs::read_to_string(target.join("acme/boxes/full/images/0001.png"))?,
        "png-0001"
    );
    assert_eq!(
        std::fs::read_to_string(target.join("acme/boxes/full/annotations/coco.json"))?,
        "{\"images\":[]}"
    );
    Ok(())
}
