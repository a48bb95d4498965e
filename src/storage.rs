//! Storage service client
//!
//! The storage service keeps ciphertext under a server-assigned access
//! code and hands it back together with the public envelope parameters.
//! It never sees plaintext or a usable key. `Storage` is the seam between
//! the encryption pipeline and the network; `HttpStorage` speaks the
//! deployed HTTP contract and `MemoryStorage` stands in for it in tests
//! and offline use.

use crate::config::StorageConfig;
use crate::content::ContentTag;
use crate::envelope::CipherEnvelope;
use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use crate::transport::{FIELD_FILE, ReceivedEnvelope, UploadForm, decode_binary};
use reqwest::Url;
use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Query parameter carrying the access code on retrieval
pub const QUERY_ACCESS_CODE: &str = "accessCode";

pub trait Storage {
    /// Stores an encrypted upload and returns the access code the service
    /// assigned to it.
    fn upload(&self, form: UploadForm) -> Result<String>;

    /// Fetches the envelope stored under `access_code`.
    fn retrieve(&self, access_code: &str) -> Result<ReceivedEnvelope>;
}

/// Body of a successful upload response
#[derive(Debug, Deserialize)]
struct UploadResponse {
    key: String,
}

/// Storage service reached over HTTP
pub struct HttpStorage {
    client: Client,
    upload_url: Url,
    retrieve_url: Url,
}

impl std::fmt::Debug for HttpStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStorage")
            .field("upload_url", &self.upload_url.as_str())
            .field("retrieve_url", &self.retrieve_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpStorage {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("invalid storage base_url {:?}", config.base_url),
                e,
            )
        })?;
        // Without the trailing slash, join() would replace the last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let upload_url = join(&base, "upload")?;
        let retrieve_url = join(&base, "retrieve")?;

        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| transport_error(ErrorCategory::Internal, "failed to create HTTP client", e))?;

        Ok(Self {
            client,
            upload_url,
            retrieve_url,
        })
    }

    /// Endpoint used for `access_code`.
    pub fn retrieve_url_for(&self, access_code: &str) -> Url {
        let mut url = self.retrieve_url.clone();
        url.query_pairs_mut().append_pair(QUERY_ACCESS_CODE, access_code);
        url
    }
}

impl Storage for HttpStorage {
    fn upload(&self, form: UploadForm) -> Result<String> {
        let fields = form.text_fields();
        let part = multipart::Part::bytes(form.ciphertext).file_name(form.file_name);
        let mut body = multipart::Form::new().part(FIELD_FILE, part);
        for (name, value) in fields {
            body = body.text(name, value);
        }

        tracing::debug!(url = %self.upload_url, "uploading envelope");
        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(body)
            .send()
            .map_err(|e| transport_error(ErrorCategory::Internal, "upload request failed", e))?;
        let response = check_status(response, "upload")?;

        let parsed: UploadResponse = response.json().map_err(|e| {
            transport_error(
                ErrorCategory::Internal,
                "upload response is not the expected JSON",
                e,
            )
        })?;
        if parsed.key.is_empty() {
            return Err(SealdropError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Transport,
                "storage service returned an empty access code",
            ));
        }
        Ok(parsed.key)
    }

    fn retrieve(&self, access_code: &str) -> Result<ReceivedEnvelope> {
        tracing::debug!(url = %self.retrieve_url, "retrieving envelope");
        let response = self
            .client
            .get(self.retrieve_url_for(access_code))
            .send()
            .map_err(|e| transport_error(ErrorCategory::Internal, "retrieve request failed", e))?;
        let response = check_status(response, "retrieve")?;

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .map_err(|e| transport_error(ErrorCategory::Internal, "failed to read response body", e))?;

        ReceivedEnvelope::from_response(body.to_vec(), |name| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
    }
}

fn join(base: &Url, endpoint: &str) -> Result<Url> {
    base.join(endpoint).map_err(|e| {
        SealdropError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Config,
            format!("cannot resolve {} endpoint under {}", endpoint, base),
            e,
        )
    })
}

fn check_status(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let category = if status.is_client_error() {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    let text = response.text().unwrap_or_default();
    Err(SealdropError::with_kind(
        category,
        ErrorKind::Transport,
        format!("{} failed with status {}: {}", operation, status, text.trim()),
    ))
}

fn transport_error(category: ErrorCategory, msg: &str, err: reqwest::Error) -> SealdropError {
    SealdropError::with_kind_and_source(
        category,
        ErrorKind::Transport,
        format!("{}: {}", msg, err),
        err,
    )
}

/// In-process stand-in for the storage service.
///
/// Mirrors what the deployed service does with an upload: the content tag
/// is derived from the `type` field, and retrieval replays the envelope
/// through the same response headers.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: u64,
    entries: HashMap<String, StoredEntry>,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    #[cfg(test)]
    form_fields: Vec<(&'static str, String)>,
    received: ReceivedEnvelope,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text fields the upload for `access_code` carried, as the service
    /// saw them.
    #[cfg(test)]
    pub fn form_fields(&self, access_code: &str) -> Option<Vec<(&'static str, String)>> {
        let inner = self.lock().ok()?;
        inner
            .entries
            .get(access_code)
            .map(|entry| entry.form_fields.clone())
    }

    /// Flips one ciphertext bit of a stored upload.
    #[cfg(test)]
    pub fn corrupt(&self, access_code: &str, index: usize) -> bool {
        let Ok(mut inner) = self.lock() else {
            return false;
        };
        match inner.entries.get_mut(access_code) {
            Some(entry) if index < entry.received.envelope.ciphertext.len() => {
                entry.received.envelope.ciphertext[index] ^= 0x01;
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner.lock().map_err(|_| {
            SealdropError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Transport,
                "memory storage lock poisoned",
            )
        })
    }
}

impl Storage for MemoryStorage {
    fn upload(&self, form: UploadForm) -> Result<String> {
        #[cfg(test)]
        let form_fields = form.text_fields();
        let salt = decode_binary(&form.salt)?;
        let iv = decode_binary(&form.iv)?;
        let envelope = CipherEnvelope::from_parts(form.ciphertext, &salt, &iv, form.scheme)?;
        let received = ReceivedEnvelope {
            envelope,
            tag: ContentTag::from_mime_type(&form.content_type),
        };

        let mut inner = self.lock()?;
        inner.next_id += 1;
        let access_code = format!("MEM{:06}", inner.next_id);
        inner.entries.insert(
            access_code.clone(),
            StoredEntry {
                #[cfg(test)]
                form_fields,
                received,
            },
        );
        Ok(access_code)
    }

    fn retrieve(&self, access_code: &str) -> Result<ReceivedEnvelope> {
        let entry = self
            .lock()?
            .entries
            .get(access_code)
            .cloned()
            .ok_or_else(|| {
                SealdropError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::Transport,
                    format!("retrieve failed with status 404 Not Found: no upload under {}", access_code),
                )
            })?;

        let headers: HashMap<String, String> = entry
            .received
            .response_headers()
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        ReceivedEnvelope::from_response(entry.received.envelope.ciphertext, |name| {
            headers.get(&name.to_ascii_lowercase()).cloned()
        })
    }
}
