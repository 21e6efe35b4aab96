//! Request builder and response parser for the Mochi API.
//!
//! # Design
//! `MochiClient` holds only the resolved API key and base URL and carries no
//! mutable state between calls, so one client can be shared read-only across
//! threads. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! unprefixed methods (`get_card`, `list_cards`, ...) run both halves through
//! a caller-supplied `HttpExecutor`.

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{MochiError, Result};
use crate::http::{check_status, HttpExecutor, HttpMethod, HttpRequest, HttpResponse};
use crate::pagination::{ListQuery, Pages};
use crate::payload::CardData;
use crate::types::{decode, Card, Deck, Page, PaginatedCards, Resource, Template};

/// Synchronous, stateless client for the Mochi API.
#[derive(Clone)]
pub struct MochiClient {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for MochiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MochiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MochiClient {
    /// Client for the hosted service. An empty `api_key` falls back to
    /// `MOCHI_API_KEY`.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::from_config(ClientConfig::default().with_api_key(api_key))
    }

    /// Client for the hosted service, keyed from `MOCHI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::default())
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::with_resolved_key(&config.base_url, api_key))
    }

    /// Like [`MochiClient::from_config`], reading variables through `lookup`.
    pub fn from_config_with<F>(config: ClientConfig, lookup: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let api_key = config.resolve_api_key_with(lookup)?;
        Ok(Self::with_resolved_key(&config.base_url, api_key))
    }

    fn with_resolved_key(base_url: &str, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of one record. The id is percent-encoded as a single path segment.
    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{}", self.base_url, urlencoding::encode(id))
    }

    fn request(&self, method: HttpMethod, url: String, query: Vec<(String, String)>, body: Option<String>) -> HttpRequest {
        tracing::debug!(method = ?method, url = %url, params = query.len(), "built Mochi request");
        HttpRequest {
            method,
            url,
            query,
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_create_card(&self, data: &CardData) -> Result<HttpRequest> {
        let body = data.encode_create()?.to_string();
        Ok(self.request(HttpMethod::Post, format!("{}/cards/", self.base_url), Vec::new(), Some(body)))
    }

    pub fn build_get_card(&self, card_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.record_url("cards", card_id), Vec::new(), None)
    }

    /// Request for a single page of cards.
    pub fn build_list_cards(&self, query: &ListQuery) -> HttpRequest {
        self.build_list_page::<Card>(query)
    }

    pub fn build_update_card(&self, card_id: &str, data: &CardData) -> Result<HttpRequest> {
        let body = data.encode_update()?.to_string();
        Ok(self.request(
            HttpMethod::Post,
            self.record_url("cards", card_id),
            Vec::new(),
            Some(body),
        ))
    }

    pub fn build_delete_card(&self, card_id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.record_url("cards", card_id), Vec::new(), None)
    }

    pub fn build_trash_card(&self, card_id: &str) -> HttpRequest {
        self.request(HttpMethod::Post, format!("{}/trash", self.record_url("cards", card_id)), Vec::new(), None)
    }

    pub fn build_get_deck(&self, deck_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.record_url("decks", deck_id), Vec::new(), None)
    }

    pub fn build_get_template(&self, template_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.record_url("templates", template_id), Vec::new(), None)
    }

    /// Request for one page of any listable resource.
    pub fn build_list_page<T: Resource>(&self, query: &ListQuery) -> HttpRequest {
        self.request(HttpMethod::Get, format!("{}/{}/", self.base_url, T::PATH), query.to_pairs(), None)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    pub fn parse_create_card(&self, response: HttpResponse) -> Result<Card> {
        parse_record(response)
    }

    pub fn parse_get_card(&self, response: HttpResponse) -> Result<Card> {
        parse_record(response)
    }

    pub fn parse_list_cards(&self, response: HttpResponse) -> Result<PaginatedCards> {
        self.parse_page(response)
    }

    pub fn parse_update_card(&self, response: HttpResponse) -> Result<Card> {
        parse_record(response)
    }

    pub fn parse_delete_card(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    /// The trash endpoint's body is returned as an untyped JSON object.
    pub fn parse_trash_card(&self, response: HttpResponse) -> Result<Map<String, Value>> {
        parse_record(response)
    }

    pub fn parse_get_deck(&self, response: HttpResponse) -> Result<Deck> {
        parse_record(response)
    }

    pub fn parse_get_template(&self, response: HttpResponse) -> Result<Template> {
        parse_record(response)
    }

    pub fn parse_page<T: Resource>(&self, response: HttpResponse) -> Result<Page<T>> {
        parse_record(response)
    }

    // -----------------------------------------------------------------------
    // Execute
    // -----------------------------------------------------------------------

    pub fn create_card<E: HttpExecutor>(&self, executor: &E, data: &CardData) -> Result<Card> {
        let request = self.build_create_card(data)?;
        self.parse_create_card(executor.execute(request)?)
    }

    pub fn get_card<E: HttpExecutor>(&self, executor: &E, card_id: &str) -> Result<Card> {
        self.parse_get_card(executor.execute(self.build_get_card(card_id))?)
    }

    /// Fetch a single page of cards without following the bookmark.
    pub fn list_cards_page<E: HttpExecutor>(&self, executor: &E, query: &ListQuery) -> Result<PaginatedCards> {
        self.parse_list_cards(executor.execute(self.build_list_cards(query))?)
    }

    /// Walk every page of cards matching `query`, lazily.
    pub fn list_cards<'a, E: HttpExecutor>(&'a self, executor: &'a E, query: ListQuery) -> Pages<'a, E, Card> {
        Pages::new(self, executor, query)
    }

    pub fn update_card<E: HttpExecutor>(&self, executor: &E, card_id: &str, data: &CardData) -> Result<Card> {
        let request = self.build_update_card(card_id, data)?;
        self.parse_update_card(executor.execute(request)?)
    }

    /// Permanently delete a card. Use [`MochiClient::trash_card`] for a
    /// recoverable delete.
    pub fn delete_card<E: HttpExecutor>(&self, executor: &E, card_id: &str) -> Result<()> {
        self.parse_delete_card(executor.execute(self.build_delete_card(card_id))?)
    }

    pub fn trash_card<E: HttpExecutor>(&self, executor: &E, card_id: &str) -> Result<Map<String, Value>> {
        self.parse_trash_card(executor.execute(self.build_trash_card(card_id))?)
    }

    pub fn get_deck<E: HttpExecutor>(&self, executor: &E, deck_id: &str) -> Result<Deck> {
        self.parse_get_deck(executor.execute(self.build_get_deck(deck_id))?)
    }

    /// Walk every deck. `query.deck_id` does not apply to decks and is dropped.
    pub fn list_decks<'a, E: HttpExecutor>(&'a self, executor: &'a E, query: ListQuery) -> Pages<'a, E, Deck> {
        Pages::new(self, executor, ListQuery { deck_id: None, ..query })
    }

    pub fn get_template<E: HttpExecutor>(&self, executor: &E, template_id: &str) -> Result<Template> {
        self.parse_get_template(executor.execute(self.build_get_template(template_id))?)
    }

    /// Walk every template. `query.deck_id` does not apply and is dropped.
    pub fn list_templates<'a, E: HttpExecutor>(
        &'a self,
        executor: &'a E,
        query: ListQuery,
    ) -> Pages<'a, E, Template> {
        Pages::new(self, executor, ListQuery { deck_id: None, ..query })
    }
}

fn parse_record<T: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<T> {
    check_status(&response)?;
    if response.body.trim().is_empty() {
        return Err(MochiError::MalformedResponse("empty response body".to_string()));
    }
    decode(&response.body)
}
