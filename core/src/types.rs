//! Read-side records for the Mochi API.
//!
//! # Design
//! The wire uses kebab-case keys, `?`-suffixed boolean flags and a one-key
//! `{"date": ...}` object for card timestamps. Each record declares its alias
//! table statically through `#[serde(rename = ...)]` so the internal field
//! names cannot drift from the wire names silently.
//!
//! Decoding is tolerant: optional keys that are missing or `null` fall back
//! to their documented defaults. Only the identifying fields of a record are
//! required; a body without them fails with `MalformedResponse` and no
//! partially populated record is ever returned.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MochiError, Result};

/// Field values keyed by template field id.
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// The `{"date": <timestamp>}` wrapper Mochi uses for card timestamps.
///
/// Only `created-at` and `updated-at` use this shape; other timestamps are
/// bare RFC 3339 strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWrapper {
    pub date: DateTime<Utc>,
}

/// A file attached to a card, referenced from markdown by file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "file-name")]
    pub file_name: String,
    #[serde(rename = "content-type")]
    pub content_type: String,
    #[serde(default)]
    pub data: String,
}

impl Attachment {
    pub fn new(file_name: &str, content_type: &str, data: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data: data.to_string(),
        }
    }
}

/// A flashcard as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub content: String,
    #[serde(rename = "deck-id")]
    pub deck_id: String,
    #[serde(rename = "template-id", default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: FieldMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "archived?", default, deserialize_with = "null_as_default")]
    pub archived: bool,
    #[serde(rename = "new?", default, deserialize_with = "null_as_default")]
    pub new: bool,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(rename = "created-at", default)]
    pub created_at: Option<DateWrapper>,
    #[serde(rename = "updated-at", default)]
    pub updated_at: Option<DateWrapper>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<String>,
}

/// A deck. Decks nest through `parent_id`; a present `trashed` marks a
/// soft-deleted deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(rename = "parent-id", default)]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sort: i64,
    #[serde(rename = "archived?", default, deserialize_with = "null_as_default")]
    pub archived: bool,
    #[serde(rename = "trashed?", default)]
    pub trashed: Option<DateTime<Utc>>,
}

impl Deck {
    pub fn is_trashed(&self) -> bool {
        self.trashed.is_some()
    }
}

/// A card template: markdown content plus the fields its cards may fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: FieldMap,
}

/// One page of a listing endpoint.
///
/// A present `bookmark` means more pages may follow; `None` ends the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub bookmark: Option<String>,
    pub docs: Vec<T>,
}

pub type PaginatedCards = Page<Card>;

/// A record kind that the service exposes under `{base}/{PATH}/`.
pub trait Resource: DeserializeOwned {
    const PATH: &'static str;
}

impl Resource for Card {
    const PATH: &'static str = "cards";
}

impl Resource for Deck {
    const PATH: &'static str = "decks";
}

impl Resource for Template {
    const PATH: &'static str = "templates";
}

/// Decode a response body into a record of kind `T`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| MochiError::MalformedResponse(e.to_string()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const CARD: &str = r#"{
        "updated-at": {"date": "2021-09-11T14:23:53.250Z"},
        "tags": [],
        "content": "Sample content",
        "name": "Sample Card",
        "deck-id": "deck_456",
        "pos": "00F",
        "references": [],
        "id": "card_456",
        "reviews": [],
        "created-at": {"date": "2021-09-10T01:29:49.879Z"},
        "new?": false,
        "archived?": false,
        "template-id": null
    }"#;

    #[test]
    fn decodes_card_through_alias_table() {
        let card: Card = decode(CARD).unwrap();
        assert_eq!(card.id, "card_456");
        assert_eq!(card.content, "Sample content");
        assert_eq!(card.deck_id, "deck_456");
        assert_eq!(card.name.as_deref(), Some("Sample Card"));
        assert_eq!(card.pos.as_deref(), Some("00F"));
        assert!(card.template_id.is_none());
        assert!(!card.archived);
        assert!(card.fields.is_empty());
    }

    #[test]
    fn card_timestamps_keep_date_wrapper() {
        let card: Card = decode(CARD).unwrap();
        let created = card.created_at.unwrap().date;
        assert_eq!((created.year(), created.month(), created.day()), (2021, 9, 10));
        assert_eq!(created.hour(), 1);

        let json = serde_json::to_value(&card).unwrap();
        assert!(json["updated-at"]["date"].is_string());
    }

    #[test]
    fn minimal_card_gets_defaults() {
        let card: Card = decode(r#"{"id":"c1","content":"x","deck-id":"d1"}"#).unwrap();
        assert!(card.tags.is_empty());
        assert!(card.attachments.is_empty());
        assert!(!card.archived);
        assert!(!card.new);
        assert!(card.created_at.is_none());
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let card: Card = decode(
            r#"{"id":"c1","content":"x","deck-id":"d1","tags":null,"fields":null,"archived?":null}"#,
        )
        .unwrap();
        assert!(card.tags.is_empty());
        assert!(card.fields.is_empty());
        assert!(!card.archived);
    }

    #[test]
    fn missing_id_is_malformed() {
        let err = decode::<Card>(r#"{"content":"x","deck-id":"d1"}"#).unwrap_err();
        assert!(matches!(err, MochiError::MalformedResponse(_)));
    }

    #[test]
    fn missing_deck_id_is_malformed() {
        let err = decode::<Card>(r#"{"id":"c1","content":"x"}"#).unwrap_err();
        assert!(matches!(err, MochiError::MalformedResponse(_)));
    }

    #[test]
    fn wrongly_typed_content_is_malformed() {
        let err = decode::<Card>(r#"{"id":"c1","content":42,"deck-id":"d1"}"#).unwrap_err();
        assert!(matches!(err, MochiError::MalformedResponse(_)));
    }

    #[test]
    fn decodes_attachments_and_fields() {
        let card: Card = decode(
            r#"{
                "id": "c1",
                "content": "![](cat.png)",
                "deck-id": "d1",
                "template-id": "t1",
                "fields": {"name": {"id": "name", "value": "Cat"}},
                "attachments": [{"file-name": "cat.png", "content-type": "image/png", "data": "aGk="}]
            }"#,
        )
        .unwrap();
        assert_eq!(card.template_id.as_deref(), Some("t1"));
        assert_eq!(card.fields["name"]["value"], "Cat");
        assert_eq!(card.attachments, vec![Attachment::new("cat.png", "image/png", "aGk=")]);
    }

    #[test]
    fn deck_trashed_is_a_bare_timestamp() {
        let deck: Deck = decode(
            r#"{"id":"d1","name":"Spanish","parent-id":"d0","sort":3,"trashed?":"2021-09-10T01:29:49.879Z"}"#,
        )
        .unwrap();
        assert_eq!(deck.parent_id.as_deref(), Some("d0"));
        assert_eq!(deck.sort, 3);
        assert!(deck.is_trashed());
        assert!(!deck.archived);
    }

    #[test]
    fn decodes_template() {
        let template: Template = decode(
            r#"{"id":"t1","name":"Vocab","content":"<< Word >>","fields":{"word":{"id":"word","name":"Word"}}}"#,
        )
        .unwrap();
        assert_eq!(template.name, "Vocab");
        assert!(template.fields.contains_key("word"));
    }

    #[test]
    fn page_without_bookmark_is_final() {
        let page: PaginatedCards = decode(r#"{"docs":[]}"#).unwrap();
        assert!(page.bookmark.is_none());
        assert!(page.docs.is_empty());
    }

    #[test]
    fn page_without_docs_is_malformed() {
        let err = decode::<PaginatedCards>(r#"{"bookmark":"b1"}"#).unwrap_err();
        assert!(matches!(err, MochiError::MalformedResponse(_)));
    }
}
