//! Update check against a JSON release manifest.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::errors::{ERR_UPDATE_MANIFEST, ERR_UPDATE_NETWORK, ERR_UPDATE_VERSION};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("E-OVD-0600: update check failed: {0}")]
    Network(String),
    #[error("E-OVD-0601: invalid update manifest: {0}")]
    Manifest(String),
    #[error("E-OVD-0602: invalid version '{0}'")]
    Version(String),
}

impl UpdateError {
    pub fn code(&self) -> &'static str {
        match self {
            UpdateError::Network(_) => ERR_UPDATE_NETWORK,
            UpdateError::Manifest(_) => ERR_UPDATE_MANIFEST,
            UpdateError::Version(_) => ERR_UPDATE_VERSION,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            UpdateError::Network(_) => "Could not reach the update server.",
            UpdateError::Manifest(_) | UpdateError::Version(_) => {
                "The update server returned an unexpected response."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pub_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "manifest", rename_all = "snake_case")]
pub enum UpdateStatus {
    UpToDate,
    Available(UpdateManifest),
}

/// Compare a manifest against the running version. A leading `v` is accepted.
pub fn compare(manifest: UpdateManifest, current: &str) -> Result<UpdateStatus, UpdateError> {
    let running = parse_version(current)?;
    let latest = parse_version(&manifest.version)?;
    if latest > running {
        Ok(UpdateStatus::Available(manifest))
    } else {
        Ok(UpdateStatus::UpToDate)
    }
}

fn parse_version(raw: &str) -> Result<semver::Version, UpdateError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(trimmed).map_err(|_| UpdateError::Version(raw.to_string()))
}

pub async fn check_for_update(
    client: &reqwest::Client,
    manifest_url: &str,
    current: &str,
) -> Result<UpdateStatus, UpdateError> {
    let _span = tracing::info_span!("update_check", url = manifest_url);
    let url = Url::parse(manifest_url).map_err(|e| UpdateError::Manifest(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UpdateError::Manifest(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| UpdateError::Network(e.to_string()))?;
    let body = response
        .text()
        .await
        .map_err(|e| UpdateError::Network(e.to_string()))?;
    let manifest: UpdateManifest =
        serde_json::from_str(&body).map_err(|e| UpdateError::Manifest(e.to_string()))?;

    if let Some(link) = manifest.url.as_deref() {
        if Url::parse(link).is_err() {
            return Err(UpdateError::Manifest(format!("invalid download url '{link}'")));
        }
    }

    let status = compare(manifest, current)?;
    match &status {
        UpdateStatus::Available(m) => {
            tracing::info!(target = "overdesk", current, latest = %m.version, "update available")
        }
        UpdateStatus::UpToDate => tracing::debug!(target = "overdesk", current, "up to date"),
    }
    Ok(status)
}
