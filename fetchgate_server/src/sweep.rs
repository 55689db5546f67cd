use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Archive files older than this are eligible for deletion.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// How often the archive directory is swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Sweep the archive directory until the token is cancelled at shutdown.
pub async fn run(archive_dir: PathBuf, cancel: CancellationToken) {
    let mut ticks = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("[sweep] stopped");
                return;
            }
            _ = ticks.tick() => {
                let removed = sweep_once(&archive_dir, RETENTION_WINDOW).await;
                if removed > 0 {
                    log::info!("[sweep] removed {} expired archive(s)", removed);
                }
            }
        }
    }
}

/// Delete every regular file in `dir` whose modification time is older than
/// `window`. Returns how many were removed. Unreadable entries are skipped
/// with a warning; the next pass will see them again.
pub async fn sweep_once(dir: &Path, window: Duration) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("[sweep] cannot read {:?}: {}", dir, e);
            return 0;
        }
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let age = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified.elapsed().unwrap_or(Duration::ZERO),
            Err(e) => {
                log::warn!("[sweep] no modification time for {:?}: {}", path, e);
                continue;
            }
        };
        if age <= window {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::debug!("[sweep] removed {:?}", path);
                removed += 1;
            }
            Err(e) => log::warn!("[sweep] failed to remove {:?}: {}", path, e),
        }
    }
    removed
}
