//! Artifact keys
//!
//! Every derived binary asset is stored under `{namespace}/{id}_{kind}`:
//!
//! | kind     | namespace  |
//! |----------|------------|
//! | front    | cards      |
//! | back     | cards      |
//! | qrCode   | qr_codes   |
//! | label    | labels     |

use crate::util::is_valid_record_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storage namespace of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Cards,
    QrCodes,
    Labels,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Cards, Namespace::QrCodes, Namespace::Labels];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Cards => "cards",
            Namespace::QrCodes => "qr_codes",
            Namespace::Labels => "labels",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ArtifactKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| ArtifactKeyError::UnknownNamespace(s.to_string()))
    }
}

/// What an artifact represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    #[serde(rename = "front")]
    Front,
    #[serde(rename = "back")]
    Back,
    #[serde(rename = "qrCode")]
    QrCode,
    #[serde(rename = "label")]
    Label,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Front,
        ArtifactKind::Back,
        ArtifactKind::QrCode,
        ArtifactKind::Label,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Front => "front",
            ArtifactKind::Back => "back",
            ArtifactKind::QrCode => "qrCode",
            ArtifactKind::Label => "label",
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            ArtifactKind::Front | ArtifactKind::Back => Namespace::Cards,
            ArtifactKind::QrCode => Namespace::QrCodes,
            ArtifactKind::Label => Namespace::Labels,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = ArtifactKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ArtifactKeyError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactKeyError {
    #[error("artifact key must look like namespace/id_kind: {0}")]
    Malformed(String),

    #[error("unknown artifact namespace: {0}")]
    UnknownNamespace(String),

    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),

    #[error("invalid record id in artifact key: {0}")]
    InvalidRecordId(String),

    #[error("{kind} artifacts do not live in {namespace}")]
    NamespaceMismatch { namespace: Namespace, kind: ArtifactKind },
}

/// Key of one artifact of one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    record_id: String,
    kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(record_id: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            record_id: record_id.into(),
            kind,
        }
    }

    pub fn label(record_id: impl Into<String>) -> Self {
        Self::new(record_id, ArtifactKind::Label)
    }

    pub fn qr_code(record_id: impl Into<String>) -> Self {
        Self::new(record_id, ArtifactKind::QrCode)
    }

    /// Every key a record can own, in deletion order
    pub fn all_for(record_id: &str) -> Vec<ArtifactKey> {
        ArtifactKind::ALL
            .into_iter()
            .map(|kind| Self::new(record_id, kind))
            .collect()
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn namespace(&self) -> Namespace {
        self.kind.namespace()
    }

    /// `{id}_{kind}`, the file name without extension
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.record_id, self.kind)
    }

    /// Parse a key from its namespace and file name, as they appear in a URL.
    /// A trailing extension on the file name is ignored.
    pub fn from_parts(namespace: &str, file: &str) -> Result<Self, ArtifactKeyError> {
        let namespace: Namespace = namespace.parse()?;
        let stem = file.split_once('.').map_or(file, |(stem, _)| stem);
        let (record_id, kind) = stem
            .rsplit_once('_')
            .filter(|(id, _)| !id.is_empty())
            .ok_or_else(|| ArtifactKeyError::Malformed(format!("{}/{}", namespace, file)))?;
        if !is_valid_record_id(record_id) {
            return Err(ArtifactKeyError::InvalidRecordId(record_id.to_string()));
        }
        let kind: ArtifactKind = kind.parse()?;
        if kind.namespace() != namespace {
            return Err(ArtifactKeyError::NamespaceMismatch { namespace, kind });
        }
        Ok(Self::new(record_id, kind))
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}_{}", self.namespace(), self.record_id, self.kind)
    }
}

impl FromStr for ArtifactKey {
    type Err = ArtifactKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, file) = s
            .split_once('/')
            .ok_or_else(|| ArtifactKeyError::Malformed(s.to_string()))?;
        Self::from_parts(namespace, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(ArtifactKey::label("abc").to_string(), "labels/abc_label");
        assert_eq!(ArtifactKey::qr_code("abc").to_string(), "qr_codes/abc_qrCode");
        assert_eq!(
            ArtifactKey::new("abc", ArtifactKind::Front).to_string(),
            "cards/abc_front"
        );
        assert_eq!(
            ArtifactKey::new("abc", ArtifactKind::Back).to_string(),
            "cards/abc_back"
        );
    }

    #[test]
    fn test_all_for_covers_every_kind() {
        let keys = ArtifactKey::all_for("r1");
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&ArtifactKey::label("r1")));
        assert!(keys.contains(&ArtifactKey::qr_code("r1")));
    }

    #[test]
    fn test_parse() {
        let key: ArtifactKey = "labels/abc_label".parse().unwrap();
        assert_eq!(key, ArtifactKey::label("abc"));

        let key = ArtifactKey::from_parts("qr_codes", "abc_qrCode.png").unwrap();
        assert_eq!(key, ArtifactKey::qr_code("abc"));
        assert_eq!(key.file_stem(), "abc_qrCode");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "labels".parse::<ArtifactKey>(),
            Err(ArtifactKeyError::Malformed(_))
        ));
        assert!(matches!(
            "photos/abc_front".parse::<ArtifactKey>(),
            Err(ArtifactKeyError::UnknownNamespace(_))
        ));
        assert!(matches!(
            "labels/abc_sticker".parse::<ArtifactKey>(),
            Err(ArtifactKeyError::UnknownKind(_))
        ));
        assert!(matches!(
            "labels/abc_front".parse::<ArtifactKey>(),
            Err(ArtifactKeyError::NamespaceMismatch { .. })
        ));
        assert!(matches!(
            "labels/_label".parse::<ArtifactKey>(),
            Err(ArtifactKeyError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_path_like_ids() {
        for file in ["/tmp/outside/secret_label.png", "a/b_label", "a b_label", "a\\b_label"] {
            assert!(
                matches!(
                    ArtifactKey::from_parts("labels", file),
                    Err(ArtifactKeyError::InvalidRecordId(_))
                ),
                "{file}"
            );
        }
        for file in ["../secret_label.png", "_label"] {
            assert!(ArtifactKey::from_parts("labels", file).is_err(), "{file}");
        }
    }

    #[test]
    fn test_kind_serde() {
        assert_eq!(
            serde_json::to_string(&ArtifactKind::QrCode).unwrap(),
            "\"qrCode\""
        );
        assert_eq!(
            serde_json::to_string(&Namespace::QrCodes).unwrap(),
            "\"qr_codes\""
        );
    }
}
