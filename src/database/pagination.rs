use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RECIPES_LIMIT, MAX_PAGE, MAX_PAGE_SIZE};

/// `?page=&limit=` of list endpoints; pages are 1-based.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE)
    }

    pub fn page_size(&self, default: i64) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_PAGE_SIZE))
            .unwrap_or(default)
    }

    pub fn offset(&self, default: i64) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size(default))
    }

    /// Size of the recipe preview embedded in subscription cards.
    pub fn recipes_limit(&self) -> i64 {
        self.recipes_limit
            .filter(|l| *l >= 0)
            .map(|l| l.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_RECIPES_LIMIT)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    /// `base_url` is the absolute list URL; a query string already on it is
    /// kept in the page links.
    pub fn from_rows(
        rows: Vec<T>,
        total_rows: i64,
        page: i64,
        page_size: i64,
        base_url: &str,
    ) -> Self {
        if rows.is_empty() && page <= 1 {
            return Self::no_rows();
        }

        let page_count = (total_rows + page_size - 1) / page_size;
        let separator = if base_url.contains('?') { '&' } else { '?' };
        let link = |n: i64| format!("{base_url}{separator}page={n}&limit={page_size}");

        Self {
            count: total_rows,
            next: (page < page_count).then(|| link(page + 1)),
            previous: (page > 1).then(|| link((page - 1).min(page_count.max(1)))),
            results: rows,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost/recipes";

    #[test]
    fn first_of_several_pages() {
        let page = PageContext::from_rows(vec![1, 2], 5, 1, 2, URL);

        assert_eq!(page.count, 5);
        assert_eq!(page.next.as_deref(), Some("http://localhost/recipes?page=2&limit=2"));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PageContext::from_rows(vec![5], 5, 3, 2, URL);

        assert_eq!(page.next, None);
        assert_eq!(page.previous.as_deref(), Some("http://localhost/recipes?page=2&limit=2"));
    }

    #[test]
    fn empty_result() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 1, 6, URL);

        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn query_defaults_and_clamping() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.offset(6), 0);

        let query = PageQuery {
            page: Some(3),
            limit: Some(1000),
            recipes_limit: None,
        };
        assert_eq!(query.page_size(6), MAX_PAGE_SIZE);
        assert_eq!(query.offset(6), 2 * MAX_PAGE_SIZE);

        let query = PageQuery {
            page: Some(0),
            limit: Some(-4),
            recipes_limit: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(6), 6);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(6),
            recipes_limit: None,
        };

        assert_eq!(query.page(), MAX_PAGE);
        assert_eq!(query.offset(6), (MAX_PAGE - 1) * 6);

        let page: PageContext<i32> = PageContext::from_rows(vec![], 3, query.page(), 6, URL);
        assert_eq!(page.next, None);
        assert_eq!(page.previous.as_deref(), Some("http://localhost/recipes?page=1&limit=6"));
    }

    #[test]
    fn links_keep_existing_query() {
        let page = PageContext::from_rows(
            vec![1, 2],
            5,
            2,
            2,
            "http://localhost/users/subscriptions?recipes_limit=1",
        );

        assert_eq!(
            page.next.as_deref(),
            Some("http://localhost/users/subscriptions?recipes_limit=1&page=3&limit=2")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost/users/subscriptions?recipes_limit=1&page=1&limit=2")
        );
    }

    #[test]
    fn recipes_limit_defaults_to_three() {
        assert_eq!(PageQuery::default().recipes_limit(), DEFAULT_RECIPES_LIMIT);

        let query = PageQuery {
            recipes_limit: Some(0),
            ..Default::default()
        };
        assert_eq!(query.recipes_limit(), 0);

        let query = PageQuery {
            recipes_limit: Some(-1),
            ..Default::default()
        };
        assert_eq!(query.recipes_limit(), DEFAULT_RECIPES_LIMIT);
    }
}
