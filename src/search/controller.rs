//! Query and pagination state for the search screen.
//!
//! The controller owns the query (text, room, offset) and the screen state
//! (results plus loading flags). It never performs I/O: operations that need
//! the remote search return a [`SearchRequest`] for the caller to run, and the
//! outcome is fed back through [`SearchController::apply`].
//!
//! Only the most recent request is honored. Issuing a request cancels the
//! previous request's token and bumps the generation, so a response that was
//! already on its way is recognised as stale and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::types::RawMessage;
use crate::message::{Message, build_message};

/// Default number of results requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub room_id: String,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    pub results: Vec<Message>,
    pub searching: bool,
    pub loading_more: bool,
}

/// A remote search the caller must run.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub generation: u64,
    pub text: String,
    pub room_id: String,
    pub offset: u32,
    pub count: u32,
    /// Cancelled as soon as a newer request supersedes this one.
    pub cancel: CancellationToken,
}

/// How a search request ended.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Loaded(Vec<RawMessage>),
    /// Superseded by a newer request; not an error.
    Cancelled,
    Failed(Arc<String>),
}

/// The slice of results a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u32,
    pub count: u32,
}

struct InFlight {
    cancel: CancellationToken,
    window: PageWindow,
}

pub struct SearchController {
    query: SearchQuery,
    state: ScreenState,
    page_size: u32,
    generation: u64,
    in_flight: Option<InFlight>,
    /// Window of the latest request; decides replace versus merge.
    last_window: PageWindow,
    exhausted: bool,
}

impl SearchController {
    pub fn new(room_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            query: SearchQuery {
                room_id: room_id.into(),
                ..SearchQuery::default()
            },
            state: ScreenState::default(),
            page_size: page_size.max(1),
            generation: 0,
            in_flight: None,
            last_window: PageWindow {
                offset: 0,
                count: page_size.max(1),
            },
            exhausted: false,
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn results(&self) -> &[Message] {
        &self.state.results
    }

    /// Start a new search for `text` from the first page.
    pub fn trigger_search(&mut self, text: impl Into<String>) -> SearchRequest {
        self.query.text = text.into();
        self.query.offset = 0;
        self.exhausted = false;
        self.state.searching = true;
        // A pending page belongs to the old text and is about to be cancelled.
        self.state.loading_more = false;
        self.execute_search()
    }

    /// Request the next page, if there is one worth asking for.
    ///
    /// Returns `None` when the last response held fewer results than the
    /// current offset, when there is no search text, when a page is already
    /// loading, or when the previous page came back empty.
    pub fn request_more(&mut self) -> Option<SearchRequest> {
        let count = u32::try_from(self.state.results.len()).unwrap_or(u32::MAX);
        if count < self.query.offset {
            return None;
        }
        if self.query.text.is_empty() || self.state.loading_more || self.exhausted {
            return None;
        }

        self.state.loading_more = true;
        self.query.offset += self.page_size;
        Some(self.execute_search())
    }

    /// Reload every page loaded so far without moving the offset.
    ///
    /// The whole window is fetched from offset 0 so that a change to any
    /// visible message, not just the last page, is picked up.
    pub fn refresh(&mut self) -> Option<SearchRequest> {
        if self.query.text.is_empty() {
            return None;
        }
        let count = self.query.offset.saturating_add(self.page_size);
        Some(self.issue(PageWindow { offset: 0, count }))
    }

    /// Switch rooms. Re-runs the current text against the new room.
    pub fn set_room(&mut self, room_id: impl Into<String>) -> Option<SearchRequest> {
        self.query.room_id = room_id.into();
        self.state.results.clear();
        if self.query.text.is_empty() {
            self.cancel_in_flight();
            self.state.searching = false;
            self.state.loading_more = false;
            return None;
        }
        let text = self.query.text.clone();
        Some(self.trigger_search(text))
    }

    /// Supersede whatever is in flight and describe the request to run.
    pub fn execute_search(&mut self) -> SearchRequest {
        self.issue(PageWindow {
            offset: self.query.offset,
            count: self.page_size,
        })
    }

    /// The window of the request still awaiting a response, if any.
    pub fn pending_window(&self) -> Option<PageWindow> {
        self.in_flight.as_ref().map(|f| f.window)
    }

    fn issue(&mut self, window: PageWindow) -> SearchRequest {
        self.cancel_in_flight();
        self.generation += 1;

        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            cancel: cancel.clone(),
            window,
        });
        self.last_window = window;

        SearchRequest {
            generation: self.generation,
            text: self.query.text.clone(),
            room_id: self.query.room_id.clone(),
            offset: window.offset,
            count: window.count,
            cancel,
        }
    }

    /// Fold a finished request into the screen state.
    ///
    /// Returns `true` if the state changed.
    pub fn apply(&mut self, generation: u64, outcome: SearchOutcome) -> bool {
        if generation != self.generation {
            tracing::debug!(
                context = "search_view.search",
                generation,
                current = self.generation,
                "dropping superseded search response"
            );
            return false;
        }

        match outcome {
            SearchOutcome::Loaded(docs) => {
                self.in_flight = None;
                let page: Vec<Message> = docs.into_iter().map(build_message).collect();
                if self.last_window.offset == 0 {
                    self.state.results = page;
                } else {
                    self.exhausted = page.is_empty();
                    self.merge_page(page);
                }
                self.state.searching = false;
                self.state.loading_more = false;
                true
            }
            SearchOutcome::Cancelled => {
                tracing::debug!(context = "search_view.search", "search cancelled");
                false
            }
            SearchOutcome::Failed(error) => {
                self.in_flight = None;
                tracing::warn!(context = "search_view.search", %error, "search failed");
                if self.state.loading_more {
                    // The page never arrived; let the next scroll ask for it again.
                    self.query.offset = self.query.offset.saturating_sub(self.page_size);
                }
                self.state.searching = false;
                self.state.loading_more = false;
                true
            }
        }
    }

    /// Cancel any in-flight request; called when the screen is torn down.
    pub fn teardown(&mut self) {
        self.cancel_in_flight();
    }

    /// Known ids are updated in place; new ids are appended in page order.
    fn merge_page(&mut self, page: Vec<Message>) {
        let index: HashMap<String, usize> = self
            .state
            .results
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        for message in page {
            match index.get(&message.id) {
                Some(&i) => self.state.results[i] = message,
                None => self.state.results.push(message),
            }
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(ids: impl IntoIterator<Item = usize>) -> Vec<RawMessage> {
        ids.into_iter()
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "_id": format!("m{i}"),
                    "msg": format!("message {i}"),
                    "u": { "_id": "u1", "username": "alice" },
                }))
                .unwrap()
            })
            .collect()
    }

    fn controller() -> SearchController {
        SearchController::new("R1", DEFAULT_PAGE_SIZE)
    }

    #[test]
    fn trigger_search_issues_first_page() {
        let mut c = controller();
        let req = c.trigger_search("hello");

        assert_eq!(
            (req.text.as_str(), req.room_id.as_str(), req.offset),
            ("hello", "R1", 0)
        );
        assert!(c.state().searching);

        assert!(c.apply(req.generation, SearchOutcome::Loaded(docs(0..20))));
        assert_eq!(c.results().len(), 20);
        assert!(!c.state().searching);
        assert!(!c.state().loading_more);
        assert_eq!(c.query().offset, 0);
        assert_eq!(c.request_more().unwrap().offset, 20);
    }

    #[test]
    fn new_search_cancels_and_supersedes_previous() {
        let mut c = controller();
        let a = c.trigger_search("first");
        let b = c.trigger_search("second");

        assert!(a.cancel.is_cancelled());
        assert!(!b.cancel.is_cancelled());

        // A resolves late: must not touch the results.
        assert!(!c.apply(a.generation, SearchOutcome::Loaded(docs(0..5))));
        assert!(c.results().is_empty());
        assert!(c.state().searching);

        assert!(c.apply(b.generation, SearchOutcome::Loaded(docs(100..103))));
        let ids: Vec<&str> = c.results().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m100", "m101", "m102"]);
    }

    #[test]
    fn cancelled_outcome_leaves_state_alone() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        assert!(!c.apply(req.generation, SearchOutcome::Cancelled));
        assert!(c.state().searching);
    }

    #[test]
    fn failure_clears_flags_and_keeps_results() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));

        let more = c.request_more().unwrap();
        assert!(c.state().loading_more);
        assert!(c.apply(more.generation, SearchOutcome::Failed(Arc::new("boom".into()))));

        assert_eq!(c.results().len(), 20);
        assert!(!c.state().searching);
        assert!(!c.state().loading_more);
        assert_eq!(c.query().offset, 0);
        assert_eq!(c.request_more().unwrap().offset, 20);
    }

    #[test]
    fn request_more_is_noop_without_text() {
        let mut c = controller();
        assert!(c.request_more().is_none());

        let req = c.trigger_search("");
        c.apply(req.generation, SearchOutcome::Loaded(vec![]));
        assert!(c.request_more().is_none());
        assert_eq!(c.query().offset, 0);
    }

    #[test]
    fn request_more_is_noop_while_loading_more() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));

        assert!(c.request_more().is_some());
        assert!(c.request_more().is_none());
        assert_eq!(c.query().offset, 20);
    }

    #[test]
    fn request_more_is_noop_when_short_of_threshold() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));

        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(docs(20..40)));
        assert_eq!(c.query().offset, 20);

        // Force a threshold the result count cannot meet.
        let more = c.request_more().unwrap();
        assert_eq!(more.offset, 40);
        c.apply(more.generation, SearchOutcome::Failed(Arc::new("x".into())));
        c.state.results.truncate(10);
        assert!(c.request_more().is_none());
        assert_eq!(c.query().offset, 20);
    }

    #[test]
    fn request_more_advances_offset_with_same_text() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));

        let page2 = c.request_more().unwrap();
        assert_eq!(page2.offset, 20);
        // A backend returning the cumulative window yields the same 20 ids.
        c.apply(page2.generation, SearchOutcome::Loaded(docs(0..20)));
        assert_eq!(c.results().len(), 20);

        let page3 = c.request_more().unwrap();
        assert_eq!(page3.offset, 40);
        assert_eq!(page3.text, "hello");
        assert_eq!(page3.room_id, "R1");
    }

    #[test]
    fn pagination_appends_without_duplicates() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));

        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(docs(15..35)));

        assert_eq!(c.results().len(), 35);
        assert_eq!(c.results()[0].id, "m0");
        assert_eq!(c.results()[34].id, "m34");
    }

    #[test]
    fn empty_page_stops_pagination_until_next_search() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));

        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(vec![]));
        assert!(c.request_more().is_none());

        let req = c.trigger_search("hello again");
        assert_eq!(req.offset, 0);
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));
        assert!(c.request_more().is_some());
    }

    #[test]
    fn new_search_replaces_paged_results() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));
        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(docs(20..40)));
        assert_eq!(c.results().len(), 40);

        let req = c.trigger_search("other");
        assert_eq!(c.query().offset, 0);
        c.apply(req.generation, SearchOutcome::Loaded(docs(500..502)));
        assert_eq!(c.results().len(), 2);
    }

    #[test]
    fn refresh_reloads_whole_window_and_keeps_offset() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));
        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(docs(20..40)));

        let refreshed = c.refresh().unwrap();
        assert_eq!((refreshed.offset, refreshed.count), (0, 40));
        assert_eq!(refreshed.text, "hello");
        assert!(refreshed.generation > more.generation);
        assert_eq!(
            c.pending_window(),
            Some(PageWindow {
                offset: 0,
                count: 40
            })
        );

        c.apply(refreshed.generation, SearchOutcome::Loaded(docs(0..40)));
        assert_eq!(c.query().offset, 20);
        assert_eq!(c.pending_window(), None);
        assert_eq!(c.request_more().unwrap().offset, 40);
    }

    #[test]
    fn refreshed_page_updates_known_messages() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..20)));
        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(docs(20..40)));

        let mut page = docs(0..40);
        page[20].msg = "edited".into();
        let refreshed = c.refresh().unwrap();
        c.apply(refreshed.generation, SearchOutcome::Loaded(page));

        assert_eq!(c.results().len(), 40);
        assert_eq!(c.results()[20].text, "edited");
    }

    /// Serves `offset..offset + count` of `all`, the way `chat.search` slices.
    fn serve(all: &[RawMessage], req: &SearchRequest) -> Vec<RawMessage> {
        all.iter()
            .skip(req.offset as usize)
            .take(req.count as usize)
            .cloned()
            .collect()
    }

    #[test]
    fn reaction_on_first_page_shows_after_paging() {
        let mut server = docs(0..60);
        let mut c = controller();

        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(serve(&server, &req)));
        let more = c.request_more().unwrap();
        c.apply(more.generation, SearchOutcome::Loaded(serve(&server, &more)));
        assert_eq!(c.results().len(), 40);

        server[3] = serde_json::from_value(serde_json::json!({
            "_id": "m3",
            "msg": "message 3",
            "u": { "_id": "u1", "username": "alice" },
            "reactions": { ":tada:": { "usernames": ["alice"] } },
        }))
        .unwrap();

        let refreshed = c.refresh().unwrap();
        c.apply(
            refreshed.generation,
            SearchOutcome::Loaded(serve(&server, &refreshed)),
        );

        assert_eq!(c.results().len(), 40);
        assert_eq!(c.results()[3].reactions.len(), 1);
        assert_eq!(c.results()[3].reactions[0].emoji, ":tada:");
        assert_eq!(c.results()[39].id, "m39");
    }

    #[test]
    fn set_room_reissues_current_text() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.apply(req.generation, SearchOutcome::Loaded(docs(0..3)));

        let moved = c.set_room("R2").unwrap();
        assert_eq!(moved.room_id, "R2");
        assert_eq!(moved.offset, 0);
        assert!(c.results().is_empty());

        let mut idle = controller();
        assert!(idle.set_room("R2").is_none());
        assert_eq!(idle.query().room_id, "R2");
    }

    #[test]
    fn teardown_cancels_in_flight() {
        let mut c = controller();
        let req = c.trigger_search("hello");
        c.teardown();
        assert!(req.cancel.is_cancelled());
    }
}
