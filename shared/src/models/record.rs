//! Record Model
//!
//! A record identifies one graded item. Its id is minted by the record store
//! and never changes; the id prefixes every artifact key and is the last path
//! segment of the verification URL.

use serde::{Deserialize, Serialize};

/// Grade as entered by the grader ("10", "9", "8.5", ...)
///
/// Any string is accepted; only the values in [`Grade::KNOWN`] carry a
/// derived description and a dedicated badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(String);

impl Grade {
    /// Grades with a dedicated badge and description
    pub const KNOWN: [&'static str; 3] = ["10", "9", "8"];

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Default description for a known grade
    pub fn description(&self) -> Option<&'static str> {
        match self.0.trim() {
            "10" => Some("Gem Mint"),
            "9" => Some("Mint"),
            "8" => Some("Near Mint"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Grade {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Named attributes of a record, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    /// Sport or other item category
    #[serde(default, alias = "sport", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Sequence number printed on the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    /// Subject name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default)]
    pub grade: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_type: Option<String>,
}

impl RecordFields {
    /// Trim every value, drop empty optionals and fill in the grade
    /// description when the grade is known and no description was given.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let grade = Grade::new(self.grade.as_str().trim());
        let grade_description = clean(self.grade_description)
            .or_else(|| grade.description().map(str::to_string));

        Self {
            category: clean(self.category),
            year: clean(self.year),
            brand: clean(self.brand),
            card_number: clean(self.card_number),
            player: clean(self.player),
            grade,
            grade_description,
            label_type: clean(self.label_type),
        }
    }

    /// "year brand" line of the label, empty parts omitted
    pub fn year_brand(&self) -> String {
        [self.year.as_deref(), self.brand.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// "#card_number" line of the label
    pub fn number_line(&self) -> Option<String> {
        self.card_number.as_ref().map(|n| format!("#{}", n))
    }
}

/// Persisted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(rename = "imageFront", default, skip_serializing_if = "Option::is_none")]
    pub image_front: Option<String>,
    #[serde(rename = "imageBack", default, skip_serializing_if = "Option::is_none")]
    pub image_back: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record {
    /// Immutable copy of the data a label is rendered from
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            id: self.id.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Id and fields of a record at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: String,
    #[serde(flatten)]
    pub fields: RecordFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_description() {
        assert_eq!(Grade::from("10").description(), Some("Gem Mint"));
        assert_eq!(Grade::from("9").description(), Some("Mint"));
        assert_eq!(Grade::from(" 8 ").description(), Some("Near Mint"));
        assert_eq!(Grade::from("7").description(), None);
        assert_eq!(Grade::from("").description(), None);
    }

    #[test]
    fn test_normalized_derives_description() {
        let fields = RecordFields {
            player: Some("  J. Doe ".into()),
            brand: Some("   ".into()),
            grade: Grade::from("9"),
            ..Default::default()
        }
        .normalized();

        assert_eq!(fields.player.as_deref(), Some("J. Doe"));
        assert_eq!(fields.brand, None);
        assert_eq!(fields.grade_description.as_deref(), Some("Mint"));
    }

    #[test]
    fn test_normalized_keeps_supplied_description() {
        let fields = RecordFields {
            grade: Grade::from("10"),
            grade_description: Some("Pristine".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(fields.grade_description.as_deref(), Some("Pristine"));

        let fields = RecordFields {
            grade: Grade::from("6"),
            ..Default::default()
        }
        .normalized();
        assert_eq!(fields.grade_description, None);
    }

    #[test]
    fn test_label_lines() {
        let fields = RecordFields {
            year: Some("2024".into()),
            brand: Some("Acme".into()),
            card_number: Some("12".into()),
            ..Default::default()
        };
        assert_eq!(fields.year_brand(), "2024 Acme");
        assert_eq!(fields.number_line().as_deref(), Some("#12"));

        let fields = RecordFields {
            brand: Some("Acme".into()),
            ..Default::default()
        };
        assert_eq!(fields.year_brand(), "Acme");
        assert_eq!(fields.number_line(), None);
    }

    #[test]
    fn test_record_json_keys() {
        let record = Record {
            id: "abc".into(),
            fields: RecordFields {
                card_number: Some("12".into()),
                grade: Grade::from("10"),
                ..Default::default()
            },
            image_front: Some("http://x/cards/abc_front.png".into()),
            image_back: None,
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["card_number"], "12");
        assert_eq!(json["grade"], "10");
        assert_eq!(json["imageFront"], "http://x/cards/abc_front.png");
        assert!(json.get("imageBack").is_none());

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_sport_alias() {
        let fields: RecordFields =
            serde_json::from_str(r#"{"sport":"Baseball","grade":"8"}"#).unwrap();
        assert_eq!(fields.category.as_deref(), Some("Baseball"));
    }
}
