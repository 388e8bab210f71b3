//! Request body pre-processing.
//!
//! Runs before routing: measures the raw body and decodes it to text when its
//! content type is one the server accepts as a launch payload.

use bytes::Bytes;
use warp::http::header::{HeaderMap, CONTENT_TYPE};

/// Body as seen by the router.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedBody {
    /// Raw length in bytes, whatever the content type
    pub length: usize,
    /// UTF-8 text, present only for accepted content types
    pub text: Option<String>,
}

/// Content-type driven body decoder.
#[derive(Debug, Clone)]
pub struct BodyDecoder {
    content_types: Vec<String>,
}

impl BodyDecoder {
    pub fn new<I, S>(content_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            content_types: content_types
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether a `Content-Type` value names an accepted type; parameters are ignored.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.content_types.iter().any(|t| *t == essence)
    }

    pub fn decode(&self, headers: &HeaderMap, body: &Bytes) -> DecodedBody {
        let accepted = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|content_type| self.accepts(content_type));

        DecodedBody {
            length: body.len(),
            text: accepted.then(|| String::from_utf8_lossy(body).into_owned()),
        }
    }
}
