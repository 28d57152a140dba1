use crate::utils::error::{Result, SbxError};
use crate::utils::validation::{is_api_key, is_dataset_job_id, is_object_id};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use url::Url;

/// Lifecycle of a dataset generation job. Codes match the API's `DatasetJobState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    Gen,
    Merge,
    Coco,
    Ship,
    Error,
}

impl JobState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(JobState::Init),
            10 => Some(JobState::Gen),
            20 => Some(JobState::Merge),
            30 => Some(JobState::Coco),
            40 => Some(JobState::Ship),
            1000 => Some(JobState::Error),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            JobState::Init => 1,
            JobState::Gen => 10,
            JobState::Merge => 20,
            JobState::Coco => 30,
            JobState::Ship => 40,
            JobState::Error => 1000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JobState::Init => "INIT",
            JobState::Gen => "GEN",
            JobState::Merge => "MERGE",
            JobState::Coco => "COCO",
            JobState::Ship => "SHIP",
            JobState::Error => "ERROR",
        }
    }

    /// Display name for a raw state value; the API sends it as a number or a numeric string.
    pub fn describe(raw: &serde_json::Value) -> String {
        let code = match raw {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            serde_json::Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        };
        match code {
            Some(code) => match JobState::from_code(code) {
                Some(state) => state.name().to_string(),
                None => format!("UNKNOWN({})", code),
            },
            None => format!("UNKNOWN({})", crate::utils::table::cell(raw)),
        }
    }
}

/// `40.0` is state 40; `40.5` is no state at all.
fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn code(self) -> u8 {
        match self {
            SortOrder::Asc => 10,
            SortOrder::Desc => 20,
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn parse(value: &str) -> Result<Self> {
        if is_object_id(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SbxError::MalformedId {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DatasetJobId(String);

impl DatasetJobId {
    pub fn parse(value: &str) -> Result<Self> {
        if is_dataset_job_id(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SbxError::MalformedJobId {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if is_api_key(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SbxError::InvalidApiKey)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep the secret out of debug logs.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self.0.get(self.0.len().saturating_sub(4)..).unwrap_or("");
        write!(f, "ApiKey(****{})", tail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
}

/// Response of `/user/validate-api-key`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyValidation {
    pub user: UserInfo,
    pub company: CompanyInfo,
}

/// Temporary S3 credentials and locations for one dataset, from `/user/get-aws-creds`.
#[derive(Clone, Deserialize)]
pub struct DatasetGrant {
    pub access_key: String,
    pub secret_key: String,
    pub dataset_uri: String,
    pub synth_full_dataset_uri: String,
    pub synth_sample_dataset_uri: String,
}

impl fmt::Debug for DatasetGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetGrant")
            .field("dataset_uri", &self.dataset_uri)
            .field("synth_full_dataset_uri", &self.synth_full_dataset_uri)
            .field("synth_sample_dataset_uri", &self.synth_sample_dataset_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub prefix: String,
}

impl DatasetGrant {
    /// Bucket comes from `dataset_uri`; the prefix from the full or sample uri.
    pub fn location(&self, sample: bool) -> Result<S3Location> {
        let bucket = Url::parse(&self.dataset_uri)?
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| SbxError::UnexpectedResponse {
                message: format!("dataset_uri has no bucket: {}", self.dataset_uri),
            })?;

        let uri = if sample {
            &self.synth_sample_dataset_uri
        } else {
            &self.synth_full_dataset_uri
        };
        let parsed = Url::parse(uri)?;
        let prefix = parsed.path().trim_start_matches('/').to_string();

        Ok(S3Location { bucket, prefix })
    }
}

/// Outcome of a dataset download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub listed: usize,
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: Vec<String>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_state_names() {
        assert_eq!(JobState::describe(&json!(1)), "INIT");
        assert_eq!(JobState::describe(&json!("40")), "SHIP");
        assert_eq!(JobState::describe(&json!(1000)), "ERROR");
        assert_eq!(JobState::describe(&json!(7)), "UNKNOWN(7)");
        assert_eq!(JobState::describe(&json!(40.0)), "SHIP");
        assert_eq!(JobState::describe(&json!("30.0")), "COCO");
        assert_eq!(JobState::describe(&json!(40.5)), "UNKNOWN(40.5)");
        assert_eq!(JobState::from_code(30), Some(JobState::Coco));
        assert_eq!(JobState::Merge.code(), 20);
    }

    #[test]
    fn test_sort_order_serializes_as_code() {
        let body = json!({ "sort": SortOrder::Desc });
        assert_eq!(body, json!({ "sort": 20 }));
        assert_eq!(SortOrder::Asc.code(), 10);
    }

    #[test]
    fn test_ids() {
        assert!(ObjectId::parse("5f8d0d55b54764421b7156c9").is_ok());
        assert!(matches!(
            ObjectId::parse("nope"),
            Err(SbxError::MalformedId { .. })
        ));
        assert!(DatasetJobId::parse("boxes-gen-5f8d0d55b54764421b7156c9").is_ok());
        assert!(matches!(
            DatasetJobId::parse("5f8d0d55b54764421b7156c9"),
            Err(SbxError::MalformedJobId { .. })
        ));
    }

    #[test]
    fn test_api_key_debug_is_masked() {
        let key = ApiKey::parse("0123456789abcdef0123456789abcdef0123abcd").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(****abcd)");
        assert!(matches!(ApiKey::parse("short"), Err(SbxError::InvalidApiKey)));
    }

    #[test]
    fn test_grant_location() {
        let grant = DatasetGrant {
            access_key: "AKIA".to_string(),
            secret_key: "secret".to_string(),
            dataset_uri: "s3://sbx-datasets/acme/boxes".to_string(),
            synth_full_dataset_uri: "s3://sbx-datasets/acme/boxes/full".to_string(),
            synth_sample_dataset_uri: "s3://sbx-datasets/acme/boxes/sample".to_string(),
        };

        let full = grant.location(false).unwrap();
        assert_eq!(full.bucket, "sbx-datasets");
        assert_eq!(full.prefix, "acme/boxes/full");

        let sample = grant.location(true).unwrap();
        assert_eq!(sample.prefix, "acme/boxes/sample");
    }
}
