use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One mebibyte, for the upload size ceiling default.
const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the pipeline service, without the `/api/v1` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Connection establishment deadline in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-request deadline for poll fetches, in seconds. The submission
    /// request has its own, much larger ceiling in [`UploadConfig`].
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Job list poll cadence in seconds; runs unconditionally while a list
    /// subscription is held.
    #[serde(default = "default_list_interval")]
    pub list_interval_secs: u64,

    /// Job detail poll cadence in seconds; runs only while the job is
    /// processing.
    #[serde(default = "default_detail_interval")]
    pub detail_interval_secs: u64,
}

fn default_list_interval() -> u64 {
    5
}
fn default_detail_interval() -> u64 {
    3
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            list_interval_secs: default_list_interval(),
            detail_interval_secs: default_detail_interval(),
        }
    }
}

impl PollConfig {
    pub fn list_interval(&self) -> Duration {
        Duration::from_secs(self.list_interval_secs)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_secs(self.detail_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Hard ceiling on submitted file size, in bytes (default: 500 MB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Deadline for the whole submission request, upload transport plus
    /// server-side pipeline execution (default: 30 minutes).
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,

    /// Content types accepted at submission.
    #[serde(default = "default_accepted_types")]
    pub accepted_content_types: Vec<String>,
}

fn default_max_file_size() -> u64 {
    500 * MIB
}
fn default_upload_timeout() -> u64 {
    30 * 60
}
fn default_accepted_types() -> Vec<String> {
    [
        "video/mp4",
        "video/avi",
        "video/mov",
        "video/quicktime",
        "video/x-msvideo",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            timeout_secs: default_upload_timeout(),
            accepted_content_types: default_accepted_types(),
        }
    }
}

impl UploadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        self.accepted_content_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(content_type))
    }
}
