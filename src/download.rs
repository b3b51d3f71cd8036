//! Saving finished media to disk.

use std::path::Path;

use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::bigmodel::BigModelError;
use crate::error::MediaGenError;

/// Stream `url` into `path` chunk by chunk and return the number of bytes
/// written. A non-2xx response leaves no file behind.
pub async fn download_to(http: &Client, url: &str, path: &Path) -> Result<u64, MediaGenError> {
    let mut response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(BigModelError::ApiError {
            status: status.as_u16(),
            message,
        }
        .into());
    }

    let mut file = File::create(path).await?;
    let mut written = 0u64;
    let copied: Result<(), MediaGenError> = async {
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = copied {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(e);
    }

    tracing::info!(url = %url, path = %path.display(), bytes = written, "Download complete");
    Ok(written)
}
