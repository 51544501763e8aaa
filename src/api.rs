// API client module: a small blocking HTTP client for the HSS file store.
// Every call is one synchronous request; the shell waits for it before
// showing the next prompt.
//
// URLs are composed literally as `{base}/{path}?{query}`. The server owns
// path semantics, so paths are forwarded exactly as the session holds them.

use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

const DIRECTORY_QUERY: &str = "type=directory";
const LIST_QUERY: &str = "type=directory&operation=list";
const FILE_QUERY: &str = "type=file";

/// Errors returned by [`ApiClient`]. Transport failures, rejected requests
/// and unreadable responses are kept apart so callers can match on them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("{method} {url} failed")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },

    #[error("unexpected response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of a rejected request, if that is what happened.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Kind of a directory entry as reported by the server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    #[serde(other)]
    Other,
}

impl EntryKind {
    /// One-character flag used by the long listing format.
    pub fn flag(self) -> char {
        match self {
            EntryKind::Directory => 'd',
            _ => '-',
        }
    }
}

/// One element of a directory listing. The server sends more fields
/// (key, size, modification time); only name and type are kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Decode a listing body. A JSON `null` (empty or absent directory) gives
/// `None`, which is not the same as an empty array.
pub fn parse_listing(body: &[u8]) -> Result<Option<Vec<DirEntry>>, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Blocking client bound to the base URL of the file store.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`. A trailing slash is dropped so that
    /// paths can always be appended with a single separator.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder().build().map_err(ApiError::Client)?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `path` with the given query string.
    pub fn url(&self, path: &str, query: &str) -> String {
        format!("{}/{}?{}", self.base_url, path, query)
    }

    /// URL of a directory resource, as used by `HEAD`/`DELETE`/`POST`.
    pub fn directory_url(&self, path: &str) -> String {
        self.url(path, DIRECTORY_QUERY)
    }

    /// URL of a file resource.
    pub fn file_url(&self, path: &str) -> String {
        self.url(path, FILE_QUERY)
    }

    /// List the entries of the directory at `path`; `None` when the server
    /// answers `null`.
    pub fn list_directory(&self, path: &str) -> Result<Option<Vec<DirEntry>>, ApiError> {
        let url = self.url(path, LIST_QUERY);
        let res = self.send_checked(Method::GET, &url, None)?;
        let body = read_body(Method::GET, &url, res)?;
        parse_listing(&body).map_err(|source| ApiError::Decode { url, source })
    }

    /// Whether the server confirms a directory at `path` (HEAD answers 200).
    /// Any other status means "no"; only transport failures are errors.
    pub fn directory_exists(&self, path: &str) -> Result<bool, ApiError> {
        let url = self.directory_url(path);
        let res = self.send(Method::HEAD, &url, None)?;
        debug!(%url, status = %res.status(), "directory probe");
        Ok(res.status() == StatusCode::OK)
    }

    pub fn create_directory(&self, path: &str) -> Result<(), ApiError> {
        let url = self.directory_url(path);
        self.send_checked(Method::POST, &url, None)?;
        Ok(())
    }

    pub fn delete_directory(&self, path: &str) -> Result<(), ApiError> {
        let url = self.directory_url(path);
        self.send_checked(Method::DELETE, &url, None)?;
        Ok(())
    }

    /// Upload `data` as the content of the file at `path`.
    pub fn upload_file(&self, path: &str, data: Vec<u8>) -> Result<(), ApiError> {
        let url = self.file_url(path);
        self.send_checked(Method::POST, &url, Some(data))?;
        Ok(())
    }

    /// Download the content of the file at `path`.
    pub fn download_file(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.file_url(path);
        let res = self.send_checked(Method::GET, &url, None)?;
        read_body(Method::GET, &url, res)
    }

    /// Metadata headers the server returns for the file at `path`, keyed
    /// by lowercase header name.
    pub fn file_metadata(&self, path: &str) -> Result<BTreeMap<String, String>, ApiError> {
        let url = self.file_url(path);
        let res = self.send_checked(Method::HEAD, &url, None)?;
        let headers = res
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Ok(headers)
    }

    pub fn delete_file(&self, path: &str) -> Result<(), ApiError> {
        let url = self.file_url(path);
        self.send_checked(Method::DELETE, &url, None)?;
        Ok(())
    }

    fn send(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<Response, ApiError> {
        debug!(%method, %url, "sending request");
        let mut req = self.client.request(method.clone(), url);
        if let Some(body) = body {
            req = req.body(body);
        }
        req.send().map_err(|source| ApiError::Transport {
            method,
            url: url.to_string(),
            source,
        })
    }

    /// Like `send`, but any non-2xx status becomes [`ApiError::Status`].
    fn send_checked(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response, ApiError> {
        let res = self.send(method.clone(), url, body)?;
        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status,
            });
        }
        Ok(res)
    }
}

fn read_body(method: Method, url: &str, res: Response) -> Result<Vec<u8>, ApiError> {
    res.bytes()
        .map(|bytes| bytes.to_vec())
        .map_err(|source| ApiError::Transport {
            method,
            url: url.to_string(),
            source,
        })
}
