//! Synchronous client for the Mochi flashcard API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values for the card,
//! deck and template endpoints, translating between Mochi's wire schema and
//! plain Rust records. Requests are executed through the `HttpExecutor`
//! trait; `UreqExecutor` (feature `ureq`, on by default) is the stock
//! blocking implementation.
//!
//! # Design
//! - `MochiClient` holds only the API key and base URL.
//! - Each operation is split into `build_*` and `parse_*`, with a
//!   convenience method that runs both through an executor.
//! - Wire aliases are declared per record in `types` (reads) and `payload`
//!   (writes). Write fields track presence explicitly with `Field<T>`.
//! - Listings are walked lazily by the `Pages` cursor in `pagination`.
//!
//! ```no_run
//! use mochi_core::{CardData, ListQuery, MochiClient, UreqExecutor};
//!
//! # fn main() -> mochi_core::Result<()> {
//! let client = MochiClient::from_env()?;
//! let http = UreqExecutor::new();
//!
//! let card = client.create_card(&http, &CardData::new("# Hola", "deck_123"))?;
//! for card in client.list_cards(&http, ListQuery::new().deck_id(&card.deck_id)) {
//!     println!("{}", card?.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pagination;
pub mod payload;
pub mod types;

pub use client::MochiClient;
pub use config::{ClientConfig, API_KEY_ENV, DEFAULT_BASE_URL};
pub use error::{MochiError, Result};
#[cfg(feature = "ureq")]
pub use http::UreqExecutor;
pub use http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse};
pub use pagination::{ListQuery, Pages};
pub use payload::{CardData, Field};
pub use types::{
    decode, Attachment, Card, DateWrapper, Deck, FieldMap, Page, PaginatedCards, Resource, Template,
};
