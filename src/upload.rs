/// Artifact upload collaborator.
///
/// The pipeline's only contract with this module is "these finished files
/// exist on disk and are ready to transfer". Endpoint, credentials, and
/// retry policy are configuration concerns; the transport here is a plain
/// HTTP PUT of each file's bytes to `{url}/{filename}`.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::UploadConfig;
use crate::logging::{self, Component};

/// Uploads each finished artifact in turn. Individual failures are logged
/// and the first one is returned after the remaining files were attempted,
/// so one bad transfer does not strand the others.
pub fn upload_artifacts(config: &UploadConfig, paths: &[&Path]) -> Result<(), Box<dyn Error>> {
    if !config.enabled {
        return Ok(());
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;

    let mut first_failure: Option<Box<dyn Error>> = None;
    for path in paths {
        match upload_one(&client, &config.url, path) {
            Ok(()) => {
                logging::info(
                    Component::Upload,
                    None,
                    &format!("uploaded {}", path.display()),
                );
            }
            Err(e) => {
                logging::error(
                    Component::Upload,
                    None,
                    &format!("upload of {} failed: {}", path.display(), e),
                );
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn upload_one(
    client: &reqwest::blocking::Client,
    base_url: &str,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("artifact path has no filename: {}", path.display()))?;
    let body = fs::read(path)?;

    let url = format!("{}/{}", base_url.trim_end_matches('/'), filename);
    let response = client.put(&url).body(body).send()?;

    if !response.status().is_success() {
        return Err(format!("upload endpoint returned {}", response.status()).into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_upload_is_a_noop() {
        let config = UploadConfig {
            enabled: false,
            url: String::new(),
        };
        assert!(upload_artifacts(&config, &[Path::new("/nonexistent")]).is_ok());
    }
}
