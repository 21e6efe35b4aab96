//! In-memory stand-in for the Mochi REST API.
//!
//! Serves the card, deck and template endpoints with Mochi's wire shapes
//! (kebab-case keys, `?`-suffixed flags, `{"date": ...}` card timestamps)
//! behind bearer-token auth. Listings paginate with an offset bookmark: every
//! non-empty page carries a bookmark and the walk ends on an empty page.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWrapper {
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub content: String,
    #[serde(rename = "deck-id")]
    pub deck_id: String,
    #[serde(rename = "template-id")]
    pub template_id: Option<String>,
    pub name: Option<String>,
    pub fields: Map<String, Value>,
    pub attachments: Vec<Value>,
    #[serde(rename = "archived?")]
    pub archived: bool,
    #[serde(rename = "new?")]
    pub new: bool,
    pub pos: Option<String>,
    #[serde(rename = "created-at")]
    pub created_at: DateWrapper,
    #[serde(rename = "updated-at")]
    pub updated_at: DateWrapper,
    pub tags: Vec<String>,
    pub references: Vec<String>,
    pub reviews: Vec<String>,
    #[serde(rename = "trashed?", default, skip_serializing_if = "Option::is_none")]
    pub trashed: Option<DateWrapper>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(rename = "parent-id")]
    pub parent_id: Option<String>,
    pub sort: i64,
    #[serde(rename = "archived?")]
    pub archived: bool,
    #[serde(rename = "trashed?", skip_serializing_if = "Option::is_none")]
    pub trashed: Option<DateTime<Utc>>,
}

impl Deck {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: None,
            sort: 0,
            archived: false,
            trashed: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub bookmark: Option<String>,
    pub docs: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "deck-id")]
    pub deck_id: Option<String>,
    pub limit: Option<usize>,
    pub bookmark: Option<String>,
}

/// Everything the server knows, plus the one API key it accepts.
#[derive(Debug, Default)]
pub struct Store {
    pub api_key: String,
    pub cards: Vec<Card>,
    pub decks: Vec<Deck>,
    pub templates: Vec<Template>,
}

impl Store {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            ..Self::default()
        }
    }

    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.decks.push(deck);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

pub fn app(api_key: &str) -> Router {
    app_with_store(Store::new(api_key))
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/cards/", get(list_cards).post(create_card))
        .route("/cards/{id}", get(get_card).post(update_card).delete(delete_card))
        .route("/cards/{id}/trash", post(trash_card))
        .route("/decks/", get(list_decks))
        .route("/decks/{id}", get(get_deck))
        .route("/templates/", get(list_templates))
        .route("/templates/{id}", get(get_template))
        .layer(middleware::from_fn_with_state(db.clone(), auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(store)).await
}

/// Reject requests whose bearer token does not match the store's key.
async fn auth(State(db): State<Db>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let authorized = match token {
        Some(token) => token == db.read().await.api_key,
        None => false,
    };
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Invalid API key").into_response();
    }
    next.run(request).await
}

fn paginate<T: Clone>(items: Vec<T>, params: &ListParams) -> Result<Page<T>, ApiError> {
    let offset = match params.bookmark.as_deref() {
        Some(bookmark) => bookmark
            .parse::<usize>()
            .map_err(|_| error(StatusCode::BAD_REQUEST, "invalid bookmark"))?,
        None => 0,
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let docs: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
    let bookmark = (!docs.is_empty()).then(|| (offset + docs.len()).to_string());
    Ok(Page { bookmark, docs })
}

fn from_value<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ApiError> {
    serde_json::from_value(value.clone())
        .map_err(|e| error(StatusCode::BAD_REQUEST, &format!("invalid {key}: {e}")))
}

/// Apply the keys present in a write payload; absent keys are left alone.
fn apply_patch(card: &mut Card, patch: &Map<String, Value>) -> Result<(), ApiError> {
    for (key, value) in patch {
        match key.as_str() {
            "content" => card.content = from_value(key, value)?,
            "deck-id" => card.deck_id = from_value(key, value)?,
            "template-id" => card.template_id = from_value(key, value)?,
            "fields" => card.fields = from_value(key, value)?,
            "attachments" => card.attachments = from_value(key, value)?,
            "archived?" => card.archived = from_value(key, value)?,
            "pos" => card.pos = from_value(key, value)?,
            "manual-tags" => card.tags = from_value(key, value)?,
            _ => {}
        }
    }
    Ok(())
}

async fn list_cards(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Card>>, ApiError> {
    let store = db.read().await;
    let cards: Vec<Card> = store
        .cards
        .iter()
        .filter(|c| c.trashed.is_none())
        .filter(|c| params.deck_id.as_ref().map_or(true, |deck| &c.deck_id == deck))
        .cloned()
        .collect();
    paginate(cards, &params).map(Json)
}

async fn create_card(
    State(db): State<Db>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<Card>, ApiError> {
    let content: String = match payload.get("content") {
        Some(value) => from_value("content", value)?,
        None => return Err(error(StatusCode::BAD_REQUEST, "content is required")),
    };
    let deck_id: String = match payload.get("deck-id") {
        Some(value) => from_value("deck-id", value)?,
        None => return Err(error(StatusCode::BAD_REQUEST, "deck-id is required")),
    };

    let mut store = db.write().await;
    let now = DateWrapper { date: Utc::now() };
    let mut card = Card {
        id: Uuid::new_v4().simple().to_string()[..8].to_string(),
        content,
        deck_id,
        template_id: None,
        name: None,
        fields: Map::new(),
        attachments: Vec::new(),
        archived: false,
        new: true,
        pos: Some(format!("{:03}", store.cards.len())),
        created_at: now.clone(),
        updated_at: now,
        tags: Vec::new(),
        references: Vec::new(),
        reviews: Vec::new(),
        trashed: None,
    };
    apply_patch(&mut card, &payload)?;
    tracing::info!(card_id = %card.id, deck_id = %card.deck_id, "card created");
    store.cards.push(card.clone());
    Ok(Json(card))
}

async fn get_card(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Card>, ApiError> {
    let store = db.read().await;
    store
        .cards
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "card not found"))
}

async fn update_card(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<Card>, ApiError> {
    let mut store = db.write().await;
    let card = store
        .cards
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "card not found"))?;
    apply_patch(card, &patch)?;
    card.updated_at = DateWrapper { date: Utc::now() };
    Ok(Json(card.clone()))
}

async fn delete_card(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    let before = store.cards.len();
    store.cards.retain(|c| c.id != id);
    if store.cards.len() == before {
        return Err(error(StatusCode::NOT_FOUND, "card not found"));
    }
    tracing::info!(card_id = %id, "card deleted");
    Ok(StatusCode::OK)
}

async fn trash_card(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Card>, ApiError> {
    let mut store = db.write().await;
    let card = store
        .cards
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, &format!("Card with ID {id} not found.")))?;
    card.trashed = Some(DateWrapper { date: Utc::now() });
    Ok(Json(card.clone()))
}

async fn list_decks(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Deck>>, ApiError> {
    let store = db.read().await;
    paginate(store.decks.clone(), &params).map(Json)
}

async fn get_deck(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Deck>, ApiError> {
    let store = db.read().await;
    store
        .decks
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "deck not found"))
}

async fn list_templates(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Template>>, ApiError> {
    let store = db.read().await;
    paginate(store.templates.clone(), &params).map(Json)
}

async fn get_template(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    let store = db.read().await;
    store
        .templates
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "template not found"))
}
