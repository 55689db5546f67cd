use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::GatewayError;

/// Emit at most one progress tick per this many transferred bytes.
const TICK_INTERVAL_BYTES: u64 = 64 * 1024;

/// Connection-establish timeout for remote resources.
pub const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Build the HTTP client used for resource downloads.
pub fn download_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
}

/// Extract the last path segment from a URL as a filename fallback.
pub fn filename_from_url(url: &str) -> String {
    url.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}

/// Stream `url` into a file under `dest_dir`, reporting throttled progress.
///
/// The destination file name is the URL's final path segment. Every time
/// 64 KiB have been transferred since the last tick, `on_progress` receives
/// `floor(transferred / total * 100)`; when the server does not advertise a
/// positive total size, no ticks are emitted at all. Returns the bare file
/// name once the stream ends. Nothing is retried, and no tick follows an
/// error.
pub async fn download(
    client: &Client,
    url: &str,
    dest_dir: &Path,
    on_progress: impl Fn(u8) + Send,
) -> Result<String, GatewayError> {
    let file_name = filename_from_url(url);
    log::info!("[download] url=\"{}\"  file=\"{}\"", url, file_name);

    let response = client.get(url).send().await?.error_for_status()?;
    let total = response.content_length().filter(|len| *len > 0);
    log::debug!("[download] content length: {:?}", total);

    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    let dest = dest_dir.join(&file_name);
    let file = tokio::fs::File::create(&dest)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    let mut writer = tokio::io::BufWriter::new(file);

    let mut transferred: u64 = 0;
    let mut last_tick: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                // Close the output handle before surfacing the failure; the
                // loop is never re-entered, so no tick can follow an error.
                let _ = writer.flush().await;
                return Err(GatewayError::from(e));
            }
        };

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        transferred += chunk.len() as u64;

        if let Some(total) = total {
            if transferred - last_tick >= TICK_INTERVAL_BYTES {
                last_tick = transferred;
                on_progress(percentage(transferred, total));
            }
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    log::info!("[download] done, {} bytes -> {:?}", transferred, dest);
    Ok(file_name)
}

/// `floor(transferred / total * 100)`, clamped to 100 for servers that send
/// more bytes than they advertised.
fn percentage(transferred: u64, total: u64) -> u8 {
    (transferred.saturating_mul(100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_takes_the_final_segment() {
        assert_eq!(
            filename_from_url("https://example.com/a/b/archive.tar.gz"),
            "archive.tar.gz"
        );
        assert_eq!(filename_from_url("https://example.com/repo.git"), "repo.git");
    }

    #[test]
    fn filename_skips_trailing_slashes_and_falls_back() {
        assert_eq!(filename_from_url("https://example.com/dir/"), "dir");
        assert_eq!(filename_from_url("///"), "download");
    }

    #[test]
    fn percentage_is_floored_and_clamped() {
        assert_eq!(percentage(0, 100), 0);
        assert_eq!(percentage(199, 200), 99);
        assert_eq!(percentage(200, 200), 100);
        assert_eq!(percentage(300, 200), 100);
    }
}
