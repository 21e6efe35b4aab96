//! Pagination behaviour against a scripted executor.
//!
//! The executor replays canned responses in order and records every request
//! it receives, so each test can assert both what was yielded and exactly
//! which pages were requested.

use std::cell::RefCell;
use std::collections::VecDeque;

use mochi_core::{
    Card, ClientConfig, Deck, HttpExecutor, HttpRequest, HttpResponse, ListQuery, MochiClient, MochiError,
    Result,
};
use serde_json::json;

struct Scripted {
    responses: RefCell<VecDeque<Result<HttpResponse>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl Scripted {
    fn new(responses: Vec<Result<HttpResponse>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl HttpExecutor for Scripted {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected extra request"))
    }
}

fn client() -> MochiClient {
    MochiClient::from_config(
        ClientConfig::default()
            .with_api_key("k")
            .with_base_url("http://mochi.test/api"),
    )
    .unwrap()
}

fn card(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "content": format!("# {id}"),
        "deck-id": "deck_1",
        "created-at": {"date": "2021-09-09T02:49:58.535Z"},
        "updated-at": {"date": "2021-09-09T02:49:58.535Z"}
    })
}

fn page(bookmark: Option<&str>, ids: &[&str]) -> Result<HttpResponse> {
    let docs: Vec<_> = ids.iter().map(|id| card(id)).collect();
    Ok(HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: json!({ "bookmark": bookmark, "docs": docs }).to_string(),
    })
}

fn ids(cards: &[Card]) -> Vec<&str> {
    cards.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn walks_pages_until_empty_page() {
    let http = Scripted::new(vec![
        page(Some("T1"), &["c1", "c2"]),
        page(Some("T2"), &["c3", "c4"]),
        page(None, &[]),
    ]);
    let client = client();

    let cards: Vec<Card> = client
        .list_cards(&http, ListQuery::new())
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(ids(&cards), ["c1", "c2", "c3", "c4"]);
    let requests = http.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].query_param("bookmark"), None);
    assert_eq!(requests[1].query_param("bookmark"), Some("T1"));
    assert_eq!(requests[2].query_param("bookmark"), Some("T2"));
}

#[test]
fn stops_after_page_without_bookmark() {
    let http = Scripted::new(vec![page(Some("T1"), &["c1"]), page(None, &["c2", "c3"])]);
    let client = client();

    let cards: Vec<Card> = client
        .list_cards(&http, ListQuery::new())
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(ids(&cards), ["c1", "c2", "c3"]);
    assert_eq!(http.requests().len(), 2);
}

#[test]
fn finished_walk_has_no_bookmark() {
    let http = Scripted::new(vec![page(Some("T1"), &["c1"]), page(None, &["c2"])]);
    let client = client();

    let mut pages = client.list_cards(&http, ListQuery::new());
    assert_eq!(pages.next().unwrap().unwrap().id, "c1");
    assert_eq!(pages.bookmark(), Some("T1"));
    assert_eq!(pages.next().unwrap().unwrap().id, "c2");
    assert!(pages.is_finished());
    assert_eq!(pages.bookmark(), None);

    let http = Scripted::new(vec![page(Some("T1"), &[])]);
    let mut pages = client.list_cards(&http, ListQuery::new().start_at("T0"));
    assert!(pages.next().is_none());
    assert_eq!(pages.bookmark(), None);
}

#[test]
fn empty_page_with_bookmark_still_ends_walk() {
    let http = Scripted::new(vec![page(Some("T1"), &[])]);
    let client = client();

    let mut pages = client.list_cards(&http, ListQuery::new());
    assert!(pages.next().is_none());
    assert!(pages.is_finished());
    assert!(pages.next().is_none());
    assert_eq!(http.requests().len(), 1);
}

#[test]
fn empty_string_bookmark_counts_as_absent() {
    let http = Scripted::new(vec![page(Some(""), &["c1"])]);
    let client = client();

    let cards: Vec<Card> = client
        .list_cards(&http, ListQuery::new())
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(ids(&cards), ["c1"]);
    assert_eq!(http.requests().len(), 1);
}

#[test]
fn filters_are_forwarded_on_every_page() {
    let http = Scripted::new(vec![
        page(Some("T1"), &["c1"]),
        page(Some("T2"), &["c2"]),
        page(None, &[]),
    ]);
    let client = client();

    let query = ListQuery::new().deck_id("deck_1").page_size(1).start_at("T0");
    let count = client.list_cards(&http, query).count();
    assert_eq!(count, 2);

    let requests = http.requests();
    let bookmarks: Vec<_> = requests.iter().map(|r| r.query_param("bookmark")).collect();
    assert_eq!(bookmarks, [Some("T0"), Some("T1"), Some("T2")]);
    for request in &requests {
        assert_eq!(request.url, "http://mochi.test/api/cards/");
        assert_eq!(request.query_param("deck-id"), Some("deck_1"));
        assert_eq!(request.query_param("limit"), Some("1"));
        assert_eq!(request.header("authorization"), Some("Bearer k"));
    }
}

#[test]
fn pages_are_fetched_lazily() {
    let http = Scripted::new(vec![page(Some("T1"), &["c1", "c2"]), page(None, &["c3"])]);
    let client = client();

    let mut pages = client.list_cards(&http, ListQuery::new());
    assert!(http.requests().is_empty());

    assert_eq!(pages.next().unwrap().unwrap().id, "c1");
    assert_eq!(pages.next().unwrap().unwrap().id, "c2");
    assert_eq!(http.requests().len(), 1);
    assert_eq!(pages.bookmark(), Some("T1"));

    assert_eq!(pages.next().unwrap().unwrap().id, "c3");
    assert_eq!(http.requests().len(), 2);
    assert!(pages.next().is_none());
}

#[test]
fn duplicates_across_pages_pass_through() {
    let http = Scripted::new(vec![page(Some("T1"), &["c1", "c2"]), page(None, &["c2", "c3"])]);
    let client = client();

    let cards: Vec<Card> = client
        .list_cards(&http, ListQuery::new())
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(ids(&cards), ["c1", "c2", "c2", "c3"]);
}

#[test]
fn failure_mid_walk_keeps_earlier_cards_and_finishes() {
    let http = Scripted::new(vec![
        page(Some("T1"), &["c1"]),
        Ok(HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: r#"{"message":"boom"}"#.to_string(),
        }),
    ]);
    let client = client();

    let mut pages = client.list_cards(&http, ListQuery::new());
    let first = pages.next().unwrap().unwrap();
    assert_eq!(first.id, "c1");

    let err = pages.next().unwrap().unwrap_err();
    assert!(matches!(err, MochiError::Service { status: 500, .. }));
    assert!(pages.next().is_none());
    assert_eq!(http.requests().len(), 2);
}

#[test]
fn transport_failure_propagates() {
    let http = Scripted::new(vec![Err(MochiError::Transport("connection refused".to_string()))]);
    let client = client();

    let results: Vec<_> = client.list_cards(&http, ListQuery::new()).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(MochiError::Transport(_))));
}

#[test]
fn malformed_card_in_page_fails_the_page() {
    let http = Scripted::new(vec![Ok(HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: r#"{"bookmark":"T1","docs":[{"content":"no id","deck-id":"d"}]}"#.to_string(),
    })]);
    let client = client();

    let results: Vec<_> = client.list_cards(&http, ListQuery::new()).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(MochiError::MalformedResponse(_))));
}

#[test]
fn explicit_page_fetches_advance_the_cursor() {
    let http = Scripted::new(vec![page(Some("T1"), &["c1"]), page(None, &["c2"])]);
    let client = client();

    let mut pages = client.list_cards(&http, ListQuery::new());
    let first = pages.fetch_next_page().unwrap().unwrap();
    assert_eq!(ids(&first), ["c1"]);
    let second = pages.fetch_next_page().unwrap().unwrap();
    assert_eq!(ids(&second), ["c2"]);
    assert!(pages.fetch_next_page().unwrap().is_none());
    assert_eq!(http.requests().len(), 2);
}

#[test]
fn manual_page_fetch_drops_unyielded_records() {
    let http = Scripted::new(vec![
        page(Some("T1"), &["c1", "c2"]),
        page(Some("T2"), &["c3"]),
        page(None, &["c4"]),
    ]);
    let client = client();

    let mut pages = client.list_cards(&http, ListQuery::new());
    assert_eq!(pages.next().unwrap().unwrap().id, "c1");

    let second = pages.fetch_next_page().unwrap().unwrap();
    assert_eq!(ids(&second), ["c3"]);

    assert_eq!(pages.next().unwrap().unwrap().id, "c4");
    assert!(pages.next().is_none());
    assert_eq!(http.requests().len(), 3);
}

#[test]
fn list_decks_drops_deck_filter() {
    let http = Scripted::new(vec![Ok(HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: r#"{"bookmark":null,"docs":[{"id":"d1","name":"Spanish","sort":1}]}"#.to_string(),
    })]);
    let client = client();

    let decks: Vec<Deck> = client
        .list_decks(&http, ListQuery::new().deck_id("ignored").page_size(5))
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(decks[0].name, "Spanish");

    let requests = http.requests();
    assert_eq!(requests[0].url, "http://mochi.test/api/decks/");
    assert_eq!(requests[0].query_param("deck-id"), None);
    assert_eq!(requests[0].query_param("limit"), Some("5"));
}
