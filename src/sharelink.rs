//! Share links
//!
//! A share link carries both the access code (`ac`) and the secret word
//! (`sw`) as query parameters, so anyone holding the link can fetch and
//! decrypt the content. That is the point of the link: one paste, no
//! second channel. Users who want the two halves separated should send
//! the access code and secret word on different channels instead.

use crate::error::{ErrorCategory, ErrorKind, Result, SealdropError};
use reqwest::Url;
use std::fmt;
use zeroize::Zeroizing;

pub const PARAM_ACCESS_CODE: &str = "ac";
pub const PARAM_SECRET_WORD: &str = "sw";

pub struct ShareLink {
    pub access_code: String,
    pub secret_word: Zeroizing<String>,
}

impl ShareLink {
    pub fn new(access_code: impl Into<String>, secret_word: impl Into<String>) -> Self {
        Self {
            access_code: access_code.into(),
            secret_word: Zeroizing::new(secret_word.into()),
        }
    }

    /// Renders the link under `origin`, e.g. `https://host/?ac=..&sw=..`.
    pub fn to_url(&self, origin: &str) -> Result<String> {
        let mut url = Url::parse(origin).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Config,
                format!("invalid share origin {:?}", origin),
                e,
            )
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair(PARAM_ACCESS_CODE, &self.access_code)
            .append_pair(PARAM_SECRET_WORD, &self.secret_word);
        Ok(url.into())
    }

    /// Extracts access code and secret word from a share link.
    pub fn parse(link: &str) -> Result<Self> {
        let url = Url::parse(link.trim()).map_err(|e| {
            SealdropError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidShareLink,
                "share link is not a valid URL",
                e,
            )
        })?;

        let mut access_code = None;
        let mut secret_word = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARAM_ACCESS_CODE => access_code = Some(value.into_owned()),
                PARAM_SECRET_WORD => secret_word = Some(Zeroizing::new(value.into_owned())),
                _ => {}
            }
        }

        match (access_code, secret_word) {
            (Some(access_code), Some(secret_word))
                if !access_code.is_empty() && !secret_word.is_empty() =>
            {
                Ok(Self {
                    access_code,
                    secret_word,
                })
            }
            _ => Err(SealdropError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidShareLink,
                "share link must carry both an access code and a secret word",
            )),
        }
    }
}

impl fmt::Debug for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareLink")
            .field("access_code", &self.access_code)
            .field("secret_word", &"[REDACTED]")
            .finish()
    }
}
