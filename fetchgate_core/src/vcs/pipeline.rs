use std::path::Path;

use crate::archive;
use crate::download::filename_from_url;
use crate::error::GatewayError;

use super::{CloneEngine, CloneEvent};

/// Clone `url` into a working copy under `work_dir`, archive the working
/// copy into `archive_dir`, and return the archive's bare file name.
///
/// A directory left at the destination by an earlier run is deleted before
/// the clone starts. That delete is cleanup, not a lock: two concurrent
/// clones of the same URL still race on the destination. Fetch progress is
/// consumed but not reported; `on_checkout` receives checkout percentages
/// below 100. After a successful archive the working copy is removed, and
/// a failure to remove it is only logged. A failed clone leaves whatever
/// partial destination the engine produced.
pub async fn clone_and_archive(
    engine: &dyn CloneEngine,
    url: &str,
    work_dir: &Path,
    archive_dir: &Path,
    on_checkout: impl Fn(u8) + Send,
) -> Result<String, GatewayError> {
    let dest = work_dir.join(filename_from_url(url));
    log::info!("[clone] url=\"{}\"  dest={:?}", url, dest);

    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    match tokio::fs::remove_dir_all(&dest).await {
        Ok(()) => log::warn!("[clone] destination existed, deleted: {:?}", dest),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(GatewayError::Internal(e.to_string())),
    }

    let mut events = engine.clone_into(url, &dest).await;
    let mut finished = false;
    while let Some(event) = events.recv().await {
        match event {
            CloneEvent::Fetch(_) => {}
            CloneEvent::Checkout(pct) if pct < 100 => on_checkout(pct),
            CloneEvent::Checkout(_) => {}
            CloneEvent::Done => {
                finished = true;
                break;
            }
            CloneEvent::Error(message) => {
                return Err(GatewayError::RepositoryUnavailable(message));
            }
        }
    }
    if !finished {
        return Err(GatewayError::Internal(
            "clone engine stopped without a result".into(),
        ));
    }

    let src = dest.clone();
    let out_dir = archive_dir.to_path_buf();
    let archive_name = tokio::task::spawn_blocking(move || archive::archive(&src, &out_dir))
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))??;

    if let Err(e) = tokio::fs::remove_dir_all(&dest).await {
        log::warn!("[clone] failed to remove working copy {:?}: {}", dest, e);
    }

    Ok(archive_name)
}
