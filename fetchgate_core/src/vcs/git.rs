use std::path::Path;

use async_trait::async_trait;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, RemoteCallbacks};
use tokio::sync::mpsc;

use super::{CloneEngine, CloneEvent};

/// [`CloneEngine`] backed by libgit2.
///
/// The clone runs on the blocking pool; libgit2's transfer and checkout
/// callbacks are translated into deduplicated percentage events so a
/// many-thousand-object repository does not turn into a many-thousand-event
/// stream.
pub struct GitEngine;

#[async_trait]
impl CloneEngine for GitEngine {
    async fn clone_into(&self, url: &str, dest: &Path) -> mpsc::UnboundedReceiver<CloneEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let url = url.to_string();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || run_clone(&url, &dest, &tx));
        rx
    }
}

fn run_clone(url: &str, dest: &Path, tx: &mpsc::UnboundedSender<CloneEvent>) {
    let mut callbacks = RemoteCallbacks::new();
    let fetch_tx = tx.clone();
    let mut last_fetch = None;
    callbacks.transfer_progress(move |stats| {
        let total = stats.total_objects();
        if total > 0 {
            let pct = (stats.indexed_objects() * 100 / total).min(100) as u8;
            if last_fetch != Some(pct) {
                last_fetch = Some(pct);
                let _ = fetch_tx.send(CloneEvent::Fetch(pct));
            }
        }
        true
    });

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    let mut checkout = CheckoutBuilder::new();
    let checkout_tx = tx.clone();
    let mut last_checkout = None;
    checkout.progress(move |_path, completed, total| {
        if total > 0 {
            let pct = (completed * 100 / total).min(100) as u8;
            if last_checkout != Some(pct) {
                last_checkout = Some(pct);
                let _ = checkout_tx.send(CloneEvent::Checkout(pct));
            }
        }
    });

    let result = RepoBuilder::new()
        .fetch_options(fetch_options)
        .with_checkout(checkout)
        .clone(url, dest);

    match result {
        Ok(_) => {
            log::info!("[git] clone finished: {}", url);
            let _ = tx.send(CloneEvent::Done);
        }
        Err(e) => {
            log::warn!("[git] clone failed: {}: {}", url, e.message());
            let _ = tx.send(CloneEvent::Error(e.message().to_string()));
        }
    }
}
