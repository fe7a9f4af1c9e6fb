use std::time::{Duration, Instant};

use api_types::{Sort, YearMonth, criteria::Criteria};
use uuid::Uuid;

use crate::Debouncer;

/// Delay applied to name filter keystrokes.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Current values of the filter form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
struct FilterForm {
    name: String,
    category_ids: Vec<Uuid>,
    sort: Sort,
}

/// Owns the criteria of one list screen and turns filter input into new
/// sessions.
///
/// Setters return `true` when the change propagated right away, meaning the
/// criteria now describe a new session (page 0) and the list must reload.
/// A non-empty name is held back until [`poll`](SearchState::poll) sees the
/// debounce delay elapse.
#[derive(Debug)]
pub struct SearchState {
    criteria: Criteria,
    form: FilterForm,
    debouncer: Debouncer<FilterForm>,
}

impl SearchState {
    pub fn new(criteria: Criteria, debounce: Duration) -> Self {
        let form = FilterForm {
            name: criteria.name.clone().unwrap_or_default(),
            category_ids: criteria.category_ids.clone(),
            sort: criteria.sort.clone(),
        };
        Self {
            criteria,
            form,
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Name as currently typed, possibly not yet propagated.
    pub fn name_input(&self) -> &str {
        &self.form.name
    }

    pub fn sort(&self) -> &Sort {
        &self.form.sort
    }

    pub fn category_ids(&self) -> &[Uuid] {
        &self.form.category_ids
    }

    pub fn set_name(&mut self, name: &str, now: Instant) -> bool {
        self.form.name = name.to_string();
        if self.form.name.trim().is_empty() {
            self.apply_now();
            return true;
        }
        self.debouncer.schedule(self.form.clone(), now);
        false
    }

    pub fn set_category_ids(&mut self, ids: Vec<Uuid>, _now: Instant) -> bool {
        self.form.category_ids = ids;
        self.apply_now();
        true
    }

    pub fn set_sort(&mut self, sort: Sort, _now: Instant) -> bool {
        self.form.sort = sort;
        self.apply_now();
        true
    }

    /// Propagates a pending name change once its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(form) => {
                self.apply(form);
                true
            }
            None => false,
        }
    }

    /// When the pending name change is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Scopes the criteria to another month and starts a new session.
    pub fn set_period(&mut self, period: YearMonth) {
        self.criteria.year_month = Some(period);
        self.criteria.page = 0;
        tracing::debug!(%period, "period changed");
    }

    pub fn period(&self) -> Option<YearMonth> {
        self.criteria.year_month
    }

    /// Advances to the next page of the current session.
    pub fn next_page(&mut self) -> u32 {
        self.criteria.page += 1;
        self.criteria.page
    }

    /// Undoes a [`next_page`](SearchState::next_page) whose load failed.
    pub fn rewind_page(&mut self) {
        self.criteria.page = self.criteria.page.saturating_sub(1);
    }

    /// Back to page 0 with unchanged filters.
    pub fn restart(&mut self) {
        self.criteria.page = 0;
    }

    pub fn is_first_page(&self) -> bool {
        self.criteria.page == 0
    }

    /// Releases the pending timer. Called when the screen goes away.
    /// The typed name falls back to the applied one, so a later sort or
    /// category change cannot pick up the dropped text.
    pub fn teardown(&mut self) {
        if self.debouncer.cancel().is_some() {
            self.form.name = self.criteria.name.clone().unwrap_or_default();
            tracing::debug!("pending filter change dropped");
        }
    }

    fn apply_now(&mut self) {
        self.debouncer.cancel();
        self.apply(self.form.clone());
    }

    fn apply(&mut self, form: FilterForm) {
        let name = form.name.trim();
        self.criteria.name = (!name.is_empty()).then(|| name.to_string());
        self.criteria.category_ids = form.category_ids;
        self.criteria.sort = form.sort;
        self.criteria.page = 0;
        tracing::debug!(
            name = ?self.criteria.name,
            sort = %self.criteria.sort,
            categories = self.criteria.category_ids.len(),
            "filter changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn on_page_two() -> SearchState {
        let mut search = SearchState::new(Criteria::default(), SEARCH_DEBOUNCE);
        search.next_page();
        search.next_page();
        search
    }

    #[test]
    fn rapid_name_changes_propagate_once_with_last_value() {
        let start = Instant::now();
        let mut search = on_page_two();

        assert!(!search.set_name("g", start));
        assert!(!search.set_name("gr", start + ms(50)));
        assert!(!search.set_name("gro", start + ms(100)));

        let mut updates = 0;
        for tick in (0..=1_000).step_by(10) {
            if search.poll(start + ms(tick)) {
                updates += 1;
            }
        }

        assert_eq!(updates, 1);
        assert_eq!(search.criteria().name.as_deref(), Some("gro"));
        assert_eq!(search.criteria().page, 0);
    }

    #[test]
    fn name_change_waits_for_debounce_delay() {
        let start = Instant::now();
        let mut search = on_page_two();
        search.set_name("rent", start);

        assert!(!search.poll(start + ms(399)));
        assert_eq!(search.criteria().page, 2);
        assert!(search.poll(start + ms(400)));
        assert_eq!(search.criteria().page, 0);
    }

    #[test]
    fn sort_change_propagates_immediately_with_pending_name() {
        let start = Instant::now();
        let mut search = on_page_two();
        search.set_name("food", start);

        assert!(search.set_sort(Sort::desc("createdAt"), start + ms(10)));
        assert_eq!(search.criteria().sort, Sort::desc("createdAt"));
        assert_eq!(search.criteria().name.as_deref(), Some("food"));
        assert_eq!(search.criteria().page, 0);
        // The superseded timer must not fire a second update.
        assert!(!search.poll(start + ms(1_000)));
    }

    #[test]
    fn clearing_name_propagates_immediately() {
        let start = Instant::now();
        let mut search = SearchState::new(
            Criteria {
                name: Some("old".to_string()),
                ..Criteria::default()
            },
            SEARCH_DEBOUNCE,
        );
        assert!(search.set_name("", start));
        assert_eq!(search.criteria().name, None);
    }

    #[test]
    fn category_selection_resets_page() {
        let mut search = on_page_two();
        let id = Uuid::from_u128(9);
        assert!(search.set_category_ids(vec![id], Instant::now()));
        assert_eq!(search.criteria().category_ids, vec![id]);
        assert!(search.is_first_page());
    }

    #[test]
    fn period_change_starts_new_session() {
        let mut search = on_page_two();
        let period = YearMonth::new(2024, 2).unwrap();
        search.set_period(period);
        assert_eq!(search.period(), Some(period));
        assert!(search.is_first_page());
    }

    #[test]
    fn teardown_drops_pending_change() {
        let start = Instant::now();
        let mut search = SearchState::new(Criteria::default(), SEARCH_DEBOUNCE);
        search.set_name("late", start);
        search.teardown();
        assert!(!search.poll(start + ms(1_000)));
        assert_eq!(search.criteria().name, None);
    }

    #[test]
    fn teardown_restores_applied_name_input() {
        let start = Instant::now();
        let mut search = SearchState::new(
            Criteria {
                name: Some("food".to_string()),
                ..Criteria::default()
            },
            SEARCH_DEBOUNCE,
        );
        search.set_name("rent", start);
        assert_eq!(search.name_input(), "rent");

        search.teardown();
        assert_eq!(search.name_input(), "food");

        assert!(search.set_sort(Sort::desc("name"), start + ms(10)));
        assert_eq!(search.criteria().name.as_deref(), Some("food"));
    }
}
