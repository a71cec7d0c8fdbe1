use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::{part_path, DownloadReport, Downloader};
use crate::config::HubConfig;
use crate::error::DownloadError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams a URL to disk through a `.part` file.
///
/// Only the connection has a timeout; the body may take as long as the file
/// size requires.
pub struct HttpDownloader {
    client: Client,
    show_progress: bool,
}

impl HttpDownloader {
    pub fn new(config: &HubConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let Some(total) = total else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            return pb;
        };
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    /// Stream the body of `url` into `part`, returning the byte count.
    async fn fetch(&self, url: &str, part: &Path) -> Result<u64, DownloadError> {
        let io_err = |source| DownloadError::Io {
            url: url.to_string(),
            path: part.to_path_buf(),
            source,
        };
        let request_err = |source| DownloadError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let expected = response.content_length();
        let pb = self.progress_bar(expected);

        let mut file = File::create(part).await.map_err(io_err)?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    pb.abandon();
                    return Err(request_err(e));
                }
            };
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }
        file.flush().await.map_err(io_err)?;
        drop(file);

        if let Some(expected) = expected {
            if written < expected {
                pb.abandon();
                return Err(DownloadError::Incomplete {
                    url: url.to_string(),
                    written,
                    expected,
                });
            }
        }

        pb.finish();
        Ok(written)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadReport, DownloadError> {
        let started = Instant::now();

        if let Ok(meta) = fs::metadata(dest).await {
            if meta.is_file() {
                tracing::debug!(path = %dest.display(), "destination exists, skipping download");
                return Ok(DownloadReport {
                    bytes: meta.len(),
                    elapsed: started.elapsed(),
                    already_present: true,
                });
            }
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    url: url.to_string(),
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let part = part_path(dest);
        tracing::debug!(%url, part = %part.display(), "starting download");

        let result = match self.fetch(url, &part).await {
            Ok(bytes) => fs::rename(&part, dest)
                .await
                .map(|()| bytes)
                .map_err(|source| DownloadError::Io {
                    url: url.to_string(),
                    path: dest.to_path_buf(),
                    source,
                }),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                let elapsed = started.elapsed();
                tracing::info!(path = %dest.display(), bytes, ?elapsed, "download complete");
                Ok(DownloadReport {
                    bytes,
                    elapsed,
                    already_present: false,
                })
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(part = %part.display(), error = %cleanup, "failed to remove partial download");
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn downloader() -> HttpDownloader {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpDownloader::from_client(client).with_progress(false)
    }

    /// Accept one connection and answer it with `response` verbatim.
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/org/repo/resolve/main/model.gguf")
    }

    #[tokio::test]
    async fn test_download_full_body() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\nConnection: close\r\n\r\nhello world",
        )
        .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("files").join("model.gguf");

        let report = downloader().download(&url, &dest).await.unwrap();

        assert_eq!(report.bytes, 11);
        assert!(!report.already_present);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_nothing() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
        )
        .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("model.gguf");

        let err = downloader().download(&url, &dest).await.unwrap_err();

        assert_eq!(err.url(), url);
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_http_error_leaves_nothing() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("model.gguf");

        let err = downloader().download(&url, &dest).await.unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_existing_destination_skips_request() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("model.gguf");
        std::fs::write(&dest, b"already here").unwrap();

        // Nothing listens on the discard port; any request would fail.
        let report = downloader()
            .download("http://127.0.0.1:9/model.gguf", &dest)
            .await
            .unwrap();

        assert!(report.already_present);
        assert_eq!(report.bytes, 12);
        assert_eq!(std::fs::read(&dest).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn test_connection_refused_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("sub").join("model.gguf");

        let result = downloader()
            .download("http://127.0.0.1:9/model.gguf", &dest)
            .await;

        assert!(matches!(result, Err(DownloadError::Request { .. })));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/m/files/a-q4_k.gguf")),
            Path::new("/m/files/a-q4_k.gguf.part")
        );
    }
}
