//! Query parameters for OpenAPI calls
//!
//! VCD filters use FIQL (`name==foo;isPublished==true`). Values are
//! forwarded verbatim; the server does the matching.

use url::Url;

/// Default page size for list calls
pub const DEFAULT_PAGE_SIZE: u32 = 128;

/// A single FIQL filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter(String);

impl Filter {
    /// `field==value`
    pub fn eq(field: &str, value: impl AsRef<str>) -> Self {
        Self(format!("{field}=={}", value.as_ref()))
    }

    /// `field!=value`
    pub fn ne(field: &str, value: impl AsRef<str>) -> Self {
        Self(format!("{field}!={}", value.as_ref()))
    }

    /// Raw FIQL, passed through untouched
    pub fn raw(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// Logical AND of two filters
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        Self(format!("{};{}", self.0, other.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ordered set of query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    filter: Option<Filter>,
    sort_asc: Option<String>,
    sort_desc: Option<String>,
    page_size: Option<u32>,
    page: Option<u32>,
    extra: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter, AND-ing with any filter already present
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    #[must_use]
    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort_asc = Some(field.into());
        self
    }

    #[must_use]
    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort_desc = Some(field.into());
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn filter_expr(&self) -> Option<&str> {
        self.filter.as_ref().map(Filter::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.sort_asc.is_none()
            && self.sort_desc.is_none()
            && self.page_size.is_none()
            && self.page.is_none()
            && self.extra.is_empty()
    }

    /// Copy of these params positioned at `page`, with the default page size
    /// filled in when none was set
    pub(crate) fn for_page(&self, page: u32) -> Self {
        let mut params = self.clone();
        params.page = Some(page);
        params.page_size.get_or_insert(DEFAULT_PAGE_SIZE);
        params
    }

    pub(crate) fn append_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        if let Some(page) = self.page {
            pairs.append_pair("page", &page.to_string());
        }
        if let Some(size) = self.page_size {
            pairs.append_pair("pageSize", &size.to_string());
        }
        if let Some(filter) = &self.filter {
            pairs.append_pair("filter", filter.as_str());
        }
        if let Some(field) = &self.sort_asc {
            pairs.append_pair("sortAsc", field);
        }
        if let Some(field) = &self.sort_desc {
            pairs.append_pair("sortDesc", field);
        }
        for (key, value) in &self.extra {
            pairs.append_pair(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_combine_with_semicolon() {
        let params = QueryParams::new()
            .filter(Filter::eq("name", "catalog-A"))
            .filter(Filter::eq("isPublished", "true"));
        assert_eq!(params.filter_expr(), Some("name==catalog-A;isPublished==true"));
    }

    #[test]
    fn test_append_to_url_round_trips() {
        let mut url = Url::parse("https://vcd.example.com/cloudapi/1.0.0/catalogs/").unwrap();
        QueryParams::new()
            .filter(Filter::eq("name", "a b"))
            .sort_desc("name")
            .for_page(2)
            .append_to(&mut url);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("pageSize".to_string(), "128".to_string()),
                ("filter".to_string(), "name==a b".to_string()),
                ("sortDesc".to_string(), "name".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_params_leave_url_alone() {
        let mut url = Url::parse("https://vcd.example.com/cloudapi/1.0.0/roles/").unwrap();
        QueryParams::new().append_to(&mut url);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_explicit_page_size_is_kept() {
        let params = QueryParams::new().page_size(10).for_page(1);
        let mut url = Url::parse("https://vcd.example.com/x/").unwrap();
        params.append_to(&mut url);
        assert_eq!(url.query(), Some("page=1&pageSize=10"));
    }
}
