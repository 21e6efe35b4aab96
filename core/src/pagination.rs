//! Bookmark-driven pagination over Mochi listing endpoints.
//!
//! # Design
//! `Pages` is an explicit cursor: it keeps the last-seen bookmark, the
//! unconsumed part of the current page and a `finished` flag. A page is only
//! requested once the previous page has been fully yielded, so network work
//! follows the consumer. The walk ends on the first page that is empty or
//! that carries no bookmark; the cards of a bookmark-less page are still
//! yielded.
//!
//! The cursor is single-pass. Any failure finishes it; cards already handed
//! out stay valid, but the walk cannot be resumed mid-page. Calling
//! `list_*` again starts a fresh walk.

use std::iter::FusedIterator;

use crate::client::MochiClient;
use crate::error::Result;
use crate::http::HttpExecutor;
use crate::types::Resource;

/// Filter for a listing walk. The same `deck-id` and `limit` are sent with
/// every page; only the bookmark advances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub deck_id: Option<String>,
    pub page_size: Option<u32>,
    pub bookmark: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deck_id(mut self, deck_id: &str) -> Self {
        self.deck_id = Some(deck_id.to_string());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Start the walk from a bookmark returned by an earlier listing.
    pub fn start_at(mut self, bookmark: &str) -> Self {
        self.bookmark = Some(bookmark.to_string());
        self
    }

    /// Query pairs for one page request; absent values are omitted.
    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(deck_id) = &self.deck_id {
            pairs.push(("deck-id".to_string(), deck_id.clone()));
        }
        if let Some(limit) = self.page_size {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(bookmark) = &self.bookmark {
            pairs.push(("bookmark".to_string(), bookmark.clone()));
        }
        pairs
    }
}

/// Lazy, single-pass sequence of records across all pages of a listing.
pub struct Pages<'a, E, T> {
    client: &'a MochiClient,
    executor: &'a E,
    query: ListQuery,
    buffer: std::vec::IntoIter<T>,
    finished: bool,
}

impl<'a, E: HttpExecutor, T: Resource> Pages<'a, E, T> {
    pub(crate) fn new(client: &'a MochiClient, executor: &'a E, query: ListQuery) -> Self {
        Self {
            client,
            executor,
            query,
            buffer: Vec::new().into_iter(),
            finished: false,
        }
    }

    /// The bookmark the next page request will carry; `None` once the walk
    /// is finished.
    pub fn bookmark(&self) -> Option<&str> {
        self.query.bookmark.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.query.bookmark = None;
    }

    /// Request the next page and advance the bookmark.
    ///
    /// Returns `Ok(None)` once the walk is over. Records of the current page
    /// that the iterator has not yielded yet are discarded.
    pub fn fetch_next_page(&mut self) -> Result<Option<Vec<T>>> {
        self.buffer = Vec::new().into_iter();
        if self.finished {
            return Ok(None);
        }

        let request = self.client.build_list_page::<T>(&self.query);
        let page = match self
            .executor
            .execute(request)
            .and_then(|response| self.client.parse_page::<T>(response))
        {
            Ok(page) => page,
            Err(err) => {
                self.finish();
                return Err(err);
            }
        };

        let next = page.bookmark.filter(|bookmark| !bookmark.is_empty());
        tracing::debug!(
            resource = T::PATH,
            records = page.docs.len(),
            has_more = next.is_some(),
            "fetched page"
        );

        if page.docs.is_empty() {
            self.finish();
            return Ok(None);
        }
        match next {
            Some(bookmark) => self.query.bookmark = Some(bookmark),
            None => self.finish(),
        }
        Ok(Some(page.docs))
    }
}

impl<E: HttpExecutor, T: Resource> Iterator for Pages<'_, E, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.next() {
                return Some(Ok(record));
            }
            match self.fetch_next_page() {
                Ok(Some(docs)) => self.buffer = docs.into_iter(),
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl<E: HttpExecutor, T: Resource> FusedIterator for Pages<'_, E, T> {}
