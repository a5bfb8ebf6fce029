//! Responses handed back to the host's protocol handler.

use portcullis_core::HeaderSet;
use std::path::Path;
use tokio::io::AsyncReadExt;

pub const CONTENT_TYPE: &str = "Content-Type";

/// Response payload. Files are streamed by the host, never buffered here.
#[derive(Debug)]
pub enum ResponseBody {
    Empty,
    Bytes(Vec<u8>),
    File(tokio::fs::File),
}

#[derive(Debug)]
pub struct ProtocolResponse {
    pub status: u16,
    pub headers: HeaderSet,
    pub body: ResponseBody,
}

impl ProtocolResponse {
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HeaderSet::new(),
            body: ResponseBody::Empty,
        }
    }

    pub fn not_found() -> Self {
        Self::empty(404)
    }

    /// JSON body with the matching content type.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = HeaderSet::new();
        headers.set(CONTENT_TYPE, "application/json");
        Self {
            status,
            headers,
            body: ResponseBody::Bytes(value.to_string().into_bytes()),
        }
    }

    /// 200 streaming `file`, typed from `path`'s extension.
    pub fn file(path: &Path, file: tokio::fs::File) -> Self {
        let mut headers = HeaderSet::new();
        headers.set(CONTENT_TYPE, content_type_for(path));
        Self {
            status: 200,
            headers,
            body: ResponseBody::File(file),
        }
    }

    /// Merge `extra` over this response's headers.
    pub fn with_headers(mut self, extra: &HeaderSet) -> Self {
        for (name, values) in extra.iter() {
            self.headers.remove(name);
            for value in values {
                self.headers.append(name, value.clone());
            }
        }
        self
    }

    /// Drain the body into memory.
    pub async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self.body {
            ResponseBody::Empty => Ok(Vec::new()),
            ResponseBody::Bytes(bytes) => Ok(bytes),
            ResponseBody::File(mut file) => {
                let mut buf = Vec::new();
                file.read_to_end(&mut buf).await?;
                Ok(buf)
            }
        }
    }
}

/// Content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("a/B.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = ProtocolResponse::json(200, &serde_json::json!({}));
        assert_eq!(response.headers.first(CONTENT_TYPE), Some("application/json"));
        assert_eq!(response.into_bytes().await.unwrap(), b"{}");
    }

    #[test]
    fn test_with_headers_overrides() {
        let mut extra = HeaderSet::new();
        extra.set("content-type", "text/plain");
        extra.set("X-Extra", "1");
        let response = ProtocolResponse::json(200, &serde_json::json!({})).with_headers(&extra);
        assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), &["text/plain".to_string()]);
        assert_eq!(response.headers.first("x-extra"), Some("1"));
    }
}
