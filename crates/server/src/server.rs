//! JSON-lines transport for the request layer.
//!
//! One request object per line in, one response object per line out, over
//! stdio or a Unix socket.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::UnixStream;
use tracing::{error, info};

use crate::api::{Api, ApiResponse};

/// Seven request server.
pub struct Server {
    api: Api,
}

impl Server {
    /// Create a server around a request layer.
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Serve requests from stdin until it closes.
    pub async fn start_with_stdio(&self) -> anyhow::Result<()> {
        info!(
            "Starting {} server v{} (stdio transport)",
            self.api.config().server_name,
            self.api.config().version
        );

        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = BufWriter::new(tokio::io::stdout());
        let result = serve_lines(&self.api, stdin, stdout).await;

        info!("Server stopped");
        result
    }

    /// Serve requests on a Unix socket until Ctrl-C.
    pub async fn start_with_socket(&self, socket_path: &Path) -> anyhow::Result<()> {
        info!(
            "Starting {} server v{} (socket transport at {})",
            self.api.config().server_name,
            self.api.config().version,
            socket_path.display()
        );

        // Remove stale socket file
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }

        let listener = tokio::net::UnixListener::bind(socket_path)?;

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let api = self.api.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(api, stream).await {
                                    error!("Connection failed: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    break;
                }
            }
        }

        std::fs::remove_file(socket_path).ok();
        info!("Server stopped");
        Ok(())
    }
}

async fn handle_connection(api: Api, stream: UnixStream) -> anyhow::Result<()> {
    let (reader, writer) = stream.into_split();
    serve_lines(&api, BufReader::new(reader), BufWriter::new(writer)).await
}

/// Answer every non-blank line from `reader` with one line on `writer`.
pub async fn serve_lines<R, W>(api: &Api, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = api.handle_line(&line).await;
        if let Err(e) = write_response(&mut writer, &response).await {
            error!("Failed to write response: {}", e);
            break;
        }
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &ApiResponse,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
