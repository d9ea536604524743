//! Asset downloads.
//!
//! Mirrors the batch generator's best-effort philosophy: a broken URL
//! loses one image, never the session.

use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::{PipelineError, PipelineResult};
use crate::images::ImageCandidate;
use crate::workspace::SessionWorkspace;
use reel_models::ImageAsset;

/// Download a single resource into `directory/filename`.
pub async fn download(
    client: &Client,
    url: &str,
    directory: impl AsRef<Path>,
    filename: &str,
) -> PipelineResult<PathBuf> {
    let directory = directory.as_ref();
    tokio::fs::create_dir_all(directory).await?;
    let path = directory.join(filename);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| PipelineError::download_failed(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(PipelineError::download_failed(format!(
            "{}: HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PipelineError::download_failed(format!("{}: {}", url, e)))?;

    tokio::fs::write(&path, &bytes).await?;
    debug!(path = %path.display(), "Downloaded asset");
    Ok(path)
}

/// Download all candidates concurrently, returning only the subset
/// that succeeded, ordered by original prompt index.
///
/// `on_progress` is invoked with the running count of successfully
/// downloaded images; failed downloads never advance it.
pub async fn download_many<F>(
    client: &Client,
    candidates: &[ImageCandidate],
    directory: impl AsRef<Path>,
    mut on_progress: F,
) -> Vec<ImageAsset>
where
    F: FnMut(usize),
{
    let directory = directory.as_ref().to_path_buf();
    let mut set = JoinSet::new();

    for candidate in candidates {
        let client = client.clone();
        let candidate = candidate.clone();
        let directory = directory.clone();
        set.spawn(async move {
            let filename = SessionWorkspace::image_filename(candidate.index);
            let result = download(&client, &candidate.url, &directory, &filename).await;
            (candidate.index, result)
        });
    }

    let mut assets = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, Ok(path))) => {
                assets.push(ImageAsset::new(index, path));
                on_progress(assets.len());
            }
            Ok((index, Err(e))) => error!("Error downloading image {}: {}", index, e),
            Err(e) => error!("Download task failed: {}", e),
        }
    }

    assets.sort_by_key(|a| a.index);
    info!(
        "Downloaded {} of {} images",
        assets.len(),
        candidates.len()
    );
    assets
}
