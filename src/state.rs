use crate::models::{SearchMeta, SearchResult};
use crate::query::{SearchQuery, Sorting};

/// Paging state for a sequence of searches over the same filters.
///
/// Owned by the caller; nothing in here is shared. Changing the query
/// resets paging and forgets the last response.
#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    query: SearchQuery,
    meta: Option<SearchMeta>,
    seed: Option<String>,
}

impl BrowseState {
    pub fn new(query: SearchQuery) -> Self {
        let mut state = Self::default();
        state.set_query(query);
        state
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn meta(&self) -> Option<&SearchMeta> {
        self.meta.as_ref()
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn set_query(&mut self, mut query: SearchQuery) {
        query.page = 1;
        self.seed = query.seed.take();
        self.query = query;
        self.meta = None;
    }

    /// Remember the pagination of a response for the current query.
    pub fn apply(&mut self, result: &SearchResult) {
        if let Some(seed) = result.meta.seed.as_ref().filter(|s| !s.is_empty()) {
            self.seed = Some(seed.clone());
        }
        self.meta = Some(result.meta.clone());
    }

    /// The query to send for the current page. The last seen seed rides
    /// along so that random ordering does not reshuffle between pages.
    pub fn request(&self) -> SearchQuery {
        let mut query = self.query.clone();
        if query.sorting == Sorting::Random {
            query.seed = self.seed.clone();
        }
        query
    }

    pub fn has_next(&self) -> bool {
        self.meta
            .as_ref()
            .is_some_and(|meta| self.query.page < meta.last_page)
    }

    pub fn has_previous(&self) -> bool {
        self.query.page > 1
    }

    /// Advance one page. Returns `None` at the last page, or before the
    /// first response has been applied.
    pub fn next_page(&mut self) -> Option<SearchQuery> {
        if !self.has_next() {
            return None;
        }
        self.query.page += 1;
        Some(self.request())
    }

    pub fn previous_page(&mut self) -> Option<SearchQuery> {
        if !self.has_previous() {
            return None;
        }
        self.query.page -= 1;
        Some(self.request())
    }

    /// Jump to `page`. Page 0, or a page past the last known one, is refused.
    pub fn go_to(&mut self, page: u32) -> Option<SearchQuery> {
        let in_range = self.meta.as_ref().map_or(true, |meta| page <= meta.last_page);
        if page == 0 || !in_range {
            return None;
        }
        self.query.page = page;
        Some(self.request())
    }

    pub fn page_label(&self) -> String {
        match &self.meta {
            Some(meta) => format!("Page {} of {}", self.query.page, meta.last_page),
            None => format!("Page {}", self.query.page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(current_page: u32, last_page: u32, seed: Option<&str>) -> SearchResult {
        SearchResult {
            data: Vec::new(),
            meta: SearchMeta {
                current_page,
                last_page,
                per_page: 24,
                total: u64::from(last_page) * 24,
                query: None,
                seed: seed.map(str::to_string),
            },
        }
    }

    #[test]
    fn new_query_starts_at_page_one() {
        let mut state = BrowseState::new(SearchQuery::new("sea").with_page(5));
        assert_eq!(state.page(), 1);

        state.apply(&result(1, 3, None));
        state.next_page();
        assert_eq!(state.page(), 2);

        state.set_query(SearchQuery::new("sky"));
        assert_eq!(state.page(), 1);
        assert!(state.meta().is_none());
        assert_eq!(state.request().query, "sky");
    }

    #[test]
    fn no_next_page_before_first_response() {
        let mut state = BrowseState::new(SearchQuery::default());
        assert!(state.next_page().is_none());
        assert_eq!(state.page_label(), "Page 1");
    }

    #[test]
    fn pages_stay_within_bounds() {
        let mut state = BrowseState::new(SearchQuery::default());
        assert!(state.previous_page().is_none());

        state.apply(&result(1, 2, None));
        assert_eq!(state.next_page().map(|q| q.page), Some(2));
        assert_eq!(state.page_label(), "Page 2 of 2");

        state.apply(&result(2, 2, None));
        assert!(state.next_page().is_none());
        assert_eq!(state.page(), 2);

        assert_eq!(state.previous_page().map(|q| q.page), Some(1));
        assert!(state.previous_page().is_none());
    }

    #[test]
    fn go_to_respects_known_last_page() {
        let mut state = BrowseState::new(SearchQuery::default());
        assert!(state.go_to(0).is_none());
        assert_eq!(state.go_to(7).map(|q| q.page), Some(7));

        state.apply(&result(7, 8, None));
        assert!(state.go_to(9).is_none());
        assert_eq!(state.page(), 7);
        assert_eq!(state.go_to(8).map(|q| q.page), Some(8));
        assert!(!state.has_next());
    }

    #[test]
    fn random_seed_is_carried_forward() {
        let query = SearchQuery {
            sorting: Sorting::Random,
            ..SearchQuery::default()
        };
        let mut state = BrowseState::new(query);
        assert_eq!(state.request().seed, None);

        state.apply(&result(1, 5, Some("tQ9kLm")));
        let next = state.next_page().unwrap();
        assert_eq!(next.seed.as_deref(), Some("tQ9kLm"));
        assert!(next.query_pairs().contains(&("seed", "tQ9kLm".to_string())));

        // a response without a seed keeps the one we have
        state.apply(&result(2, 5, None));
        assert_eq!(state.request().seed.as_deref(), Some("tQ9kLm"));
    }

    #[test]
    fn seed_ignored_for_other_sortings() {
        let mut state = BrowseState::new(SearchQuery::default());
        state.apply(&result(1, 5, Some("tQ9kLm")));
        assert_eq!(state.next_page().unwrap().seed, None);
    }
}
