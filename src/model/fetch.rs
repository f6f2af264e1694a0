//! Download of remote model bundles.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::model::ArtifactError;

const DEFAULT_BUNDLE_NAME: &str = "model_bundle.zip";

/// Timeout and retry budget for remote artifact downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 3,
        }
    }
}

/// Where a bundle fetched from `url` is cached.
pub fn cache_path(url: &str, cache_dir: &Path) -> PathBuf {
    let name = url
        .split(['?', '#'])
        .next()
        .and_then(|base| base.rsplit('/').next())
        .filter(|name| name.ends_with(".zip"))
        .unwrap_or(DEFAULT_BUNDLE_NAME);
    cache_dir.join(name)
}

/// Download `url` into the cache, reusing an earlier download unless `refresh`.
pub async fn fetch_bundle(
    url: &str,
    cache_dir: &Path,
    policy: FetchPolicy,
    refresh: bool,
) -> Result<PathBuf, ArtifactError> {
    let dest = cache_path(url, cache_dir);
    if dest.exists() && !refresh {
        info!(path = %dest.display(), "using cached model bundle");
        return Ok(dest);
    }
    let fetch_err = |reason: String| ArtifactError::Fetch {
        url: url.to_string(),
        reason,
    };
    std::fs::create_dir_all(cache_dir).map_err(|source| ArtifactError::Io {
        path: cache_dir.to_path_buf(),
        source,
    })?;

    let client = Client::builder()
        .user_agent(concat!("noshow-predictor/", env!("CARGO_PKG_VERSION")))
        .timeout(policy.timeout)
        .gzip(true)
        .build()
        .map_err(|err| fetch_err(err.to_string()))?;

    let attempts = policy.retries.max(1);
    let mut last_error = String::from("no attempt made");
    for attempt in 1..=attempts {
        info!(%url, attempt, "downloading model bundle");
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => {
                    write_atomically(&dest, &bytes)?;
                    info!(path = %dest.display(), size = bytes.len(), "downloaded model bundle");
                    return Ok(dest);
                }
                Err(err) => {
                    warn!(%err, attempt, "reading model bundle body failed");
                    last_error = err.to_string();
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), attempt, "model bundle request rejected");
                last_error = format!("HTTP {}", resp.status());
            }
            Err(err) => {
                warn!(%err, attempt, "model bundle request failed");
                last_error = err.to_string();
            }
        }
        if attempt < attempts {
            sleep(Duration::from_millis(500 * 2u64.pow(attempt - 1))).await;
        }
    }
    Err(fetch_err(format!(
        "gave up after {attempts} attempts: {last_error}"
    )))
}

// A partial download must never be mistaken for a cached bundle.
fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let partial = dest.with_extension("zip.part");
    std::fs::write(&partial, bytes).map_err(|source| ArtifactError::Io {
        path: partial.clone(),
        source,
    })?;
    std::fs::rename(&partial, dest).map_err(|source| ArtifactError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    Ok(())
}
