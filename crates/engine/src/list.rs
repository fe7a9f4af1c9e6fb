use std::{marker::PhantomData, time::Instant};

use api_types::{Sort, YearMonth, page::Page};
use uuid::Uuid;

use crate::{DismissOutcome, Entity, Notifier, Resource, SearchState};

/// Receives the pages of a list session.
pub trait PageSink<T> {
    /// `first_page` is `true` for page 0 of a session: previous content must
    /// be discarded.
    fn on_page_loaded(&mut self, page: Page<T>, first_page: bool);

    fn last_page_reached(&self) -> bool;
}

/// Growing list of the current session.
#[derive(Debug)]
pub struct ListAccumulator<T> {
    items: Option<Vec<T>>,
    last_page_reached: bool,
}

impl<T> Default for ListAccumulator<T> {
    fn default() -> Self {
        Self {
            items: None,
            last_page_reached: false,
        }
    }
}

impl<T> ListAccumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty until the first page arrived.
    pub fn items(&self) -> &[T] {
        self.items.as_deref().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.items.is_some()
    }
}

impl<T> PageSink<T> for ListAccumulator<T> {
    fn on_page_loaded(&mut self, page: Page<T>, first_page: bool) {
        match self.items.as_mut() {
            Some(items) if !first_page => items.extend(page.content),
            _ => self.items = Some(page.content),
        }
        self.last_page_reached = page.last;
    }

    fn last_page_reached(&self) -> bool {
        self.last_page_reached
    }
}

/// State of one list screen: criteria, loaded content and the `loading` flag.
///
/// Loads run one at a time; callers gate infinite-scroll and refresh
/// triggers on [`loading`](Listing::loading).
#[derive(Debug)]
pub struct Listing<T, S = ListAccumulator<T>> {
    search: SearchState,
    sink: S,
    loading: bool,
    /// Page 0 of the current criteria made it into the sink.
    session_loaded: bool,
    _item: PhantomData<T>,
}

impl<T, S> Listing<T, S>
where
    T: Entity,
    S: PageSink<T>,
{
    pub fn new(search: SearchState, sink: S) -> Self {
        Self {
            search,
            sink,
            loading: false,
            session_loaded: false,
            _item: PhantomData,
        }
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn content(&self) -> &S {
        &self.sink
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn last_page_reached(&self) -> bool {
        self.sink.last_page_reached()
    }

    /// Fetches the page the criteria point at and feeds it to the sink.
    /// Returns `false` when the request failed; the failure was notified.
    pub async fn load<R>(&mut self, resource: &R, notifier: &mut dyn Notifier) -> bool
    where
        R: Resource<Item = T>,
    {
        let first_page = self.search.is_first_page();
        tracing::debug!(
            what = T::PLURAL,
            page = self.search.criteria().page,
            "loading page"
        );

        if first_page {
            self.session_loaded = false;
        }
        self.loading = true;
        let result = resource.fetch_page(self.search.criteria()).await;
        self.loading = false;

        match result {
            Ok(page) => {
                self.sink.on_page_loaded(page, first_page);
                self.session_loaded = true;
                true
            }
            Err(err) => {
                tracing::warn!("failed to load {}: {err}", T::PLURAL);
                notifier.error(&format!("Could not load {}", T::PLURAL), &err);
                false
            }
        }
    }

    /// Loads the following page, unless a load is running or the session is
    /// exhausted. A failed load leaves the page index where it was.
    ///
    /// While page 0 of the current session has not arrived (it failed after a
    /// filter change), the sink still holds the previous session: page 0 is
    /// retried instead of appending a later page to foreign rows.
    pub async fn load_next_page<R>(&mut self, resource: &R, notifier: &mut dyn Notifier) -> bool
    where
        R: Resource<Item = T>,
    {
        if self.loading {
            return false;
        }
        if !self.session_loaded {
            self.search.restart();
            return self.load(resource, notifier).await;
        }
        if self.sink.last_page_reached() {
            return false;
        }
        self.search.next_page();
        if self.load(resource, notifier).await {
            return true;
        }
        self.search.rewind_page();
        false
    }

    /// Restarts the session from page 0 with unchanged filters.
    pub async fn reload<R>(&mut self, resource: &R, notifier: &mut dyn Notifier) -> bool
    where
        R: Resource<Item = T>,
    {
        if self.loading {
            return false;
        }
        self.search.restart();
        self.load(resource, notifier).await
    }

    /// Loads when a debounced filter change became due.
    pub async fn poll<R>(&mut self, now: Instant, resource: &R, notifier: &mut dyn Notifier) -> bool
    where
        R: Resource<Item = T>,
    {
        if self.search.poll(now) {
            return self.load(resource, notifier).await;
        }
        false
    }

    pub async fn set_name<R>(
        &mut self,
        name: &str,
        now: Instant,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> bool
    where
        R: Resource<Item = T>,
    {
        if self.search.set_name(name, now) {
            return self.load(resource, notifier).await;
        }
        false
    }

    pub async fn set_sort<R>(
        &mut self,
        sort: Sort,
        now: Instant,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> bool
    where
        R: Resource<Item = T>,
    {
        if self.search.set_sort(sort, now) {
            return self.load(resource, notifier).await;
        }
        false
    }

    pub async fn set_category_ids<R>(
        &mut self,
        ids: Vec<Uuid>,
        now: Instant,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> bool
    where
        R: Resource<Item = T>,
    {
        if self.search.set_category_ids(ids, now) {
            return self.load(resource, notifier).await;
        }
        false
    }

    pub async fn set_period<R>(
        &mut self,
        period: YearMonth,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> bool
    where
        R: Resource<Item = T>,
    {
        self.search.set_period(period);
        self.load(resource, notifier).await
    }

    /// Reacts to a closed editor: a `Refreshed` outcome restarts the session.
    pub async fn on_editor_dismissed<R>(
        &mut self,
        outcome: DismissOutcome,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> bool
    where
        R: Resource<Item = T>,
    {
        match outcome {
            DismissOutcome::Refreshed => self.reload(resource, notifier).await,
            DismissOutcome::Cancelled => false,
        }
    }

    pub fn teardown(&mut self) {
        self.search.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &[&'static str], last: bool) -> Page<&'static str> {
        Page {
            content: content.to_vec(),
            last,
        }
    }

    #[test]
    fn first_page_fills_empty_list() {
        let mut list = ListAccumulator::new();
        list.on_page_loaded(page(&["a", "b"], false), true);
        assert_eq!(list.items(), ["a", "b"]);
        assert!(!list.last_page_reached());
    }

    #[test]
    fn next_page_appends_and_tracks_last_flag() {
        let mut list = ListAccumulator::new();
        list.on_page_loaded(page(&["a", "b"], false), true);
        list.on_page_loaded(page(&["c"], true), false);
        assert_eq!(list.items(), ["a", "b", "c"]);
        assert!(list.last_page_reached());
    }

    #[test]
    fn first_page_replaces_previous_session() {
        let mut list = ListAccumulator::new();
        list.on_page_loaded(page(&["a", "b"], true), true);
        list.on_page_loaded(page(&["x"], false), true);
        assert_eq!(list.items(), ["x"]);
        assert!(!list.last_page_reached());
    }

    #[test]
    fn later_page_without_prior_list_replaces() {
        let mut list = ListAccumulator::new();
        assert!(!list.is_loaded());
        list.on_page_loaded(page(&["c"], true), false);
        assert_eq!(list.items(), ["c"]);
    }
}
