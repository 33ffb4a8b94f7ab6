use crate::errors::{CaptureError, CaptureResult, StreamError};
use crate::options::CaptureOptions;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use log::{debug, info};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Forward-only producer of container bytes
#[async_trait]
pub trait ByteSource: Send {
    /// Next chunk of the resource, or `None` at end of stream
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>>;
}

/// Streams a single GET response body
pub struct HttpSource {
    response: reqwest::Response,
    bytes_read: u64,
}

impl HttpSource {
    pub async fn open(url: &str, options: &CaptureOptions) -> CaptureResult<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| StreamError::new(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| StreamError::new(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CaptureError::Stream(StreamError::new(format!(
                "HTTP error: {}",
                response.status()
            ))));
        }

        info!(
            "Fetching {} ({} bytes announced)",
            url,
            response
                .content_length()
                .map_or_else(|| "unknown".to_string(), |len| len.to_string())
        );
        Ok(Self {
            response,
            bytes_read: 0,
        })
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|e| StreamError::new(format!("stream aborted: {}", e)))?;
        match chunk {
            Some(bytes) => {
                self.bytes_read += bytes.len() as u64;
                Ok(Some(bytes.to_vec()))
            }
            None => {
                debug!("HTTP body complete after {} bytes", self.bytes_read);
                Ok(None)
            }
        }
    }
}

pub struct FileSource {
    file: File,
    chunk_size: usize,
}

impl FileSource {
    pub async fn open(path: &str, options: &CaptureOptions) -> CaptureResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| StreamError::new(format!("cannot open {}: {}", path, e)))?;
        Ok(Self {
            file,
            chunk_size: options.read_chunk_size.max(1),
        })
    }
}

#[async_trait]
impl ByteSource for FileSource {
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let read = self
            .file
            .read(&mut buf)
            .await
            .map_err(|e| StreamError::new(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        buf.truncate(read);
        Ok(Some(buf))
    }
}

/// Bytes already in memory, handed out in fixed-size chunks
pub struct MemorySource {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
}

impl MemorySource {
    pub fn new(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            data,
            position: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Decode a base64 `data:` URI
    pub fn from_data_uri(uri: &str, options: &CaptureOptions) -> CaptureResult<Self> {
        let (meta, payload) = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| StreamError::new("invalid data URI"))?;
        if !meta.ends_with(";base64") {
            return Err(StreamError::new("only base64 data URIs are supported").into());
        }
        let data = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StreamError::new(format!("invalid base64 payload: {}", e)))?;
        Ok(Self::new(data, options.read_chunk_size))
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> CaptureResult<Option<Vec<u8>>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }
        let end = (self.position + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// Open the resource named by `uri`: http(s), `data:`, `file://` or a plain path
pub async fn open_source(
    uri: &str,
    options: &CaptureOptions,
) -> CaptureResult<Box<dyn ByteSource>> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Ok(Box::new(HttpSource::open(uri, options).await?))
    } else if uri.starts_with("data:") {
        Ok(Box::new(MemorySource::from_data_uri(uri, options)?))
    } else {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        Ok(Box::new(FileSource::open(path, options).await?))
    }
}
