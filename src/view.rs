//! View state carried in the URL query string
//!
//! The filter and pagination state of a list or report screen round-trips
//! through `page`, `limit`, `query`, `category`, `branch`, `user`,
//! `dateFrom` and `dateTo`. Parsing is lenient; resolving the state into
//! [`FilterCriteria`] is strict.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{BranchId, CategoryId, UserId};
use crate::reports::FilterCriteria;
use crate::services::{BranchService, CatalogService};
use crate::storage::DataStore;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Filter and pagination state of one screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub page: usize,
    pub limit: usize,
    pub query: Option<String>,
    /// Category name or id
    pub category: Option<String>,
    /// Branch name or id
    pub branch: Option<String>,
    pub user: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Limit omitted from the canonical query string
    #[serde(skip, default = "default_limit")]
    default_limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_default_limit(DEFAULT_LIMIT)
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state whose page size defaults to `limit` (settings value)
    pub fn with_default_limit(limit: usize) -> Self {
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        Self {
            page: DEFAULT_PAGE,
            limit,
            query: None,
            category: None,
            branch: None,
            user: None,
            date_from: None,
            date_to: None,
            default_limit: limit,
        }
    }

    /// Parse a query string such as `page=2&branch=North&dateFrom=2025-01-01`.
    ///
    /// A leading `?` is allowed. Unknown keys are ignored, empty values
    /// clear the field, and a page or limit that is not a positive number
    /// falls back to the default.
    pub fn from_query(query: &str, default_limit: usize) -> Self {
        let mut state = Self::with_default_limit(default_limit);
        let query = query.trim().trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode(key);
            let value = decode(value);
            let text = Some(value.trim().to_string()).filter(|v| !v.is_empty());

            match key.as_str() {
                "page" => state.page = positive(&value).unwrap_or(DEFAULT_PAGE),
                "limit" => state.limit = positive(&value).unwrap_or(state.default_limit),
                "query" => state.query = text,
                "category" => state.category = text,
                "branch" => state.branch = text,
                "user" => state.user = text,
                "dateFrom" => state.date_from = text,
                "dateTo" => state.date_to = text,
                other => debug!(key = other, "Ignoring unknown view parameter"),
            }
        }

        state
    }

    /// Canonical query string: fixed key order, defaults omitted
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if self.page != DEFAULT_PAGE {
            pairs.push(("page", self.page.to_string()));
        }
        if self.limit != self.default_limit {
            pairs.push(("limit", self.limit.to_string()));
        }
        let text_fields = [
            ("query", &self.query),
            ("category", &self.category),
            ("branch", &self.branch),
            ("user", &self.user),
            ("dateFrom", &self.date_from),
            ("dateTo", &self.date_to),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn with_page(&self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: if limit == 0 { self.default_limit } else { limit },
            ..self.clone()
        }
    }

    pub fn with_query(&self, query: Option<&str>) -> Self {
        self.filtered(|s| s.query = clean(query))
    }

    pub fn with_category(&self, category: Option<&str>) -> Self {
        self.filtered(|s| s.category = clean(category))
    }

    pub fn with_branch(&self, branch: Option<&str>) -> Self {
        self.filtered(|s| s.branch = clean(branch))
    }

    pub fn with_user(&self, user: Option<&str>) -> Self {
        self.filtered(|s| s.user = clean(user))
    }

    pub fn with_dates(&self, date_from: Option<&str>, date_to: Option<&str>) -> Self {
        self.filtered(|s| {
            s.date_from = clean(date_from);
            s.date_to = clean(date_to);
        })
    }

    /// Copy with one filter changed; back to the first page
    fn filtered(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        change(&mut next);
        next.page = DEFAULT_PAGE;
        next
    }

    /// Resolve names and dates into report criteria
    pub fn criteria(&self, lookup: &dyn ViewLookup) -> BranchbookResult<FilterCriteria> {
        let mut criteria = FilterCriteria::new();

        criteria.date_from = self.date_from.as_deref().map(|d| parse_date("dateFrom", d)).transpose()?;
        criteria.date_to = self.date_to.as_deref().map(|d| parse_date("dateTo", d)).transpose()?;
        criteria.branch_id = self.branch.as_deref().map(|b| lookup.branch_id(b)).transpose()?;
        criteria.category_id = self
            .category
            .as_deref()
            .map(|c| lookup.category_id(c))
            .transpose()?;
        criteria.user_id = self
            .user
            .as_deref()
            .map(|u| {
                u.parse::<UserId>()
                    .map_err(|_| BranchbookError::Validation(format!("Invalid user id '{}'", u)))
            })
            .transpose()?;
        criteria.query = self.query.clone();

        Ok(criteria)
    }

    pub fn paginate<T: Clone>(&self, items: &[T]) -> Page<T> {
        paginate(items, self.page, self.limit)
    }
}

/// Resolves the names a user types into ids
pub trait ViewLookup {
    fn branch_id(&self, identifier: &str) -> BranchbookResult<BranchId>;

    fn category_id(&self, identifier: &str) -> BranchbookResult<CategoryId>;
}

/// Lookup backed by the branch and category tables
pub struct StoreLookup<'a> {
    store: &'a dyn DataStore,
}

impl<'a> StoreLookup<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }
}

impl ViewLookup for StoreLookup<'_> {
    fn branch_id(&self, identifier: &str) -> BranchbookResult<BranchId> {
        Ok(BranchService::new(self.store).resolve(identifier)?.id)
    }

    fn category_id(&self, identifier: &str) -> BranchbookResult<CategoryId> {
        Ok(CatalogService::new(self.store).resolve_category(identifier)?.id)
    }
}

/// One page of a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slice out page `page` (1-based) of `limit` items. A page past the end
/// is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(limit);

    let start = (page - 1).saturating_mul(limit);
    let page_items = if start >= total_items {
        Vec::new()
    } else {
        items[start..(start + limit).min(total_items)].to_vec()
    };

    Page {
        items: page_items,
        page,
        limit,
        total_items,
        total_pages,
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

fn positive(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn parse_date(key: &str, value: &str) -> BranchbookResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        BranchbookError::Validation(format!(
            "Invalid {} '{}': expected YYYY-MM-DD",
            key, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BranchbookPaths;
    use crate::storage::JsonStore;
    use tempfile::TempDir;

    struct NoLookup;

    impl ViewLookup for NoLookup {
        fn branch_id(&self, identifier: &str) -> BranchbookResult<BranchId> {
            Err(BranchbookError::branch_not_found(identifier))
        }

        fn category_id(&self, identifier: &str) -> BranchbookResult<CategoryId> {
            Err(BranchbookError::category_not_found(identifier))
        }
    }

    #[test]
    fn test_from_query_decodes() {
        let state = ViewState::from_query(
            "?page=3&limit=25&query=blue%20soap&branch=North+Side&dateFrom=2025-01-01",
            10,
        );
        assert_eq!(state.page, 3);
        assert_eq!(state.limit, 25);
        assert_eq!(state.query.as_deref(), Some("blue soap"));
        assert_eq!(state.branch.as_deref(), Some("North Side"));
        assert_eq!(state.date_from.as_deref(), Some("2025-01-01"));
        assert_eq!(state.date_to, None);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let state = ViewState::from_query("page=abc&limit=0&sort=name", 20);
        assert_eq!(state.page, 1);
        assert_eq!(state.limit, 20);

        let state = ViewState::from_query("page=-2&limit=x", 10);
        assert_eq!(state.page, 1);
        assert_eq!(state.limit, 10);
    }

    #[test]
    fn test_to_query_canonical() {
        let state = ViewState::from_query("dateTo=2025-01-31&branch=A%26B&page=2&limit=10", 10);
        assert_eq!(state.to_query(), "page=2&branch=A%26B&dateTo=2025-01-31");
        assert_eq!(ViewState::new().to_query(), "");

        let again = ViewState::from_query(&state.to_query(), 10);
        assert_eq!(again, state);
    }

    #[test]
    fn test_deserialized_state_keeps_default_limit() {
        let state = ViewState::new().with_page(3);
        let json = serde_json::to_string(&state).unwrap();
        let restored: ViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.to_query(), "page=3");

        let partial: ViewState = serde_json::from_str(r#"{"branch": "North"}"#).unwrap();
        assert_eq!(partial.page, DEFAULT_PAGE);
        assert_eq!(partial.to_query(), "branch=North");
    }

    #[test]
    fn test_filter_change_resets_page() {
        let state = ViewState::new().with_page(4);
        assert_eq!(state.page, 4);

        let next = state.with_branch(Some("North"));
        assert_eq!(next.page, 1);
        assert_eq!(next.branch.as_deref(), Some("North"));
        assert_eq!(state.branch, None);

        assert_eq!(state.with_query(Some("  ")).query, None);
        assert_eq!(state.with_limit(50).page, 1);
    }

    #[test]
    fn test_criteria_rejects_bad_date() {
        let state = ViewState::new().with_dates(Some("2025-13-01"), None);
        let err = state.criteria(&NoLookup).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("dateFrom"));
    }

    #[test]
    fn test_criteria_resolves_names() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = JsonStore::open(paths).unwrap();
        let north = BranchService::new(&store).create("North", None).unwrap();

        let state = ViewState::from_query("branch=north&dateFrom=2025-01-01&dateTo=2025-01-31&query=soap", 10);
        let criteria = state.criteria(&StoreLookup::new(&store)).unwrap();

        assert_eq!(criteria.branch_id, Some(north.id));
        assert_eq!(criteria.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(criteria.query.as_deref(), Some("soap"));

        let missing = ViewState::new().with_branch(Some("South"));
        assert!(missing.criteria(&StoreLookup::new(&store)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=23).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = paginate(&items, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23]);
        assert!(!last.has_next());

        let past = paginate(&items, 9, 10);
        assert!(past.items.is_empty());
        assert_eq!(past.total_items, 23);

        let empty = paginate::<u32>(&[], 1, 10);
        assert_eq!(empty.total_pages, 0);
    }
}
