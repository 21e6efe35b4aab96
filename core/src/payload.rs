//! Write-side payloads.
//!
//! # Design
//! Every writable field is a `Field<T>` that records whether the caller set
//! it. Unset fields are left out of the JSON body entirely, so an update only
//! touches what the caller mentioned. Nullable fields use `Field<Option<T>>`,
//! where `Set(None)` is an explicit clear sent as `null`. A `false` flag is
//! sent like any other set value.

use serde::{Serialize, Serializer};

use crate::error::{MochiError, Result};
use crate::types::{Attachment, FieldMap};

/// Presence-tracking wrapper for a writable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Unset,
    Set(T),
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Field::Unset)
    }

    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Field::Set(value) => Some(value),
            Field::Unset => None,
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unset
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Set(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Field::Set(value) => value.serialize(serializer),
            Field::Unset => serializer.serialize_none(),
        }
    }
}

/// Payload for creating or updating a card.
///
/// Use [`CardData::new`] for creation, which sets the two required fields,
/// and [`CardData::default`] as the starting point for a partial update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardData {
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub content: Field<String>,
    #[serde(rename = "deck-id", skip_serializing_if = "Field::is_unset")]
    pub deck_id: Field<String>,
    #[serde(rename = "template-id", skip_serializing_if = "Field::is_unset")]
    pub template_id: Field<Option<String>>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub fields: Field<FieldMap>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub attachments: Field<Vec<Attachment>>,
    #[serde(rename = "archived?", skip_serializing_if = "Field::is_unset")]
    pub archived: Field<bool>,
    #[serde(skip_serializing_if = "Field::is_unset")]
    pub pos: Field<Option<String>>,
    #[serde(rename = "review-reverse?", skip_serializing_if = "Field::is_unset")]
    pub review_reverse: Field<bool>,
    #[serde(rename = "manual-tags", skip_serializing_if = "Field::is_unset")]
    pub manual_tags: Field<Vec<String>>,
}

impl CardData {
    pub fn new(content: &str, deck_id: &str) -> Self {
        Self {
            content: Field::Set(content.to_string()),
            deck_id: Field::Set(deck_id.to_string()),
            ..Self::default()
        }
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = Field::Set(content.to_string());
        self
    }

    /// Move the card to another deck.
    pub fn deck_id(mut self, deck_id: &str) -> Self {
        self.deck_id = Field::Set(deck_id.to_string());
        self
    }

    pub fn template_id(mut self, template_id: &str) -> Self {
        self.template_id = Field::Set(Some(template_id.to_string()));
        self
    }

    /// Detach the card from its template.
    pub fn clear_template_id(mut self) -> Self {
        self.template_id = Field::Set(None);
        self
    }

    pub fn fields(mut self, fields: FieldMap) -> Self {
        self.fields = Field::Set(fields);
        self
    }

    /// Set a single template field, in Mochi's `{"id", "value"}` shape.
    pub fn field(mut self, field_id: &str, value: &str) -> Self {
        let mut fields = match self.fields {
            Field::Set(fields) => fields,
            Field::Unset => FieldMap::new(),
        };
        fields.insert(
            field_id.to_string(),
            serde_json::json!({ "id": field_id, "value": value }),
        );
        self.fields = Field::Set(fields);
        self
    }

    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = Field::Set(attachments);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Field::Set(archived);
        self
    }

    pub fn pos(mut self, pos: &str) -> Self {
        self.pos = Field::Set(Some(pos.to_string()));
        self
    }

    pub fn clear_pos(mut self) -> Self {
        self.pos = Field::Set(None);
        self
    }

    pub fn review_reverse(mut self, review_reverse: bool) -> Self {
        self.review_reverse = Field::Set(review_reverse);
        self
    }

    pub fn manual_tags(mut self, tags: Vec<String>) -> Self {
        self.manual_tags = Field::Set(tags);
        self
    }

    /// Encode for `POST /cards/`. Content and deck are required.
    pub fn encode_create(&self) -> Result<serde_json::Value> {
        if self.content.is_unset() {
            return Err(MochiError::InvalidInput("content is required to create a card".to_string()));
        }
        if self.deck_id.is_unset() {
            return Err(MochiError::InvalidInput("deck-id is required to create a card".to_string()));
        }
        self.encode()
    }

    /// Encode for `POST /cards/{id}`: exactly the fields that were set.
    pub fn encode_update(&self) -> Result<serde_json::Value> {
        self.encode()
    }

    fn encode(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| MochiError::Serialization(e.to_string()))
    }
}
