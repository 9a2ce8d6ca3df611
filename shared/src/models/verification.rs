//! Verification URL
//!
//! `{base}/card/{id}` is the payload of every printed code. It must stay
//! stable for a given id once a label has been issued.

use serde::{Deserialize, Serialize};
use std::fmt;

const CARD_PATH: &str = "/card/";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationUrl(String);

impl VerificationUrl {
    /// Build the URL for `record_id`; a trailing `/` on `base_url` is ignored
    pub fn for_record(base_url: &str, record_id: &str) -> Self {
        Self(format!(
            "{}{}{}",
            base_url.trim_end_matches('/'),
            CARD_PATH,
            record_id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id encoded in the last path segment
    pub fn record_id(&self) -> Option<&str> {
        self.0
            .rsplit_once(CARD_PATH)
            .map(|(_, id)| id)
            .filter(|id| !id.is_empty() && !id.contains('/'))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VerificationUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VerificationUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
