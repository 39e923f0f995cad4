//! Endpoint descriptors and URL building
//!
//! An [`Endpoint`] is a path template relative to `<host>/cloudapi/` plus the
//! minimum API version it exists in. `{}` segments are filled from the path
//! parameters in order; any parameters left over are appended as trailing
//! segments (this is how item URLs such as `1.0.0/roles/<id>` are formed).

use std::fmt;

use url::Url;

use crate::query::QueryParams;
use crate::version::ApiVersion;

/// A versioned OpenAPI path template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    template: &'static str,
    min_version: ApiVersion,
}

/// Why a URL could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint '{template}' needs a value for placeholder #{index}")]
    MissingParameter { template: String, index: usize },

    #[error("path parameter #{index} for endpoint '{template}' is empty")]
    EmptyParameter { template: String, index: usize },

    #[error("base URL '{0}' cannot carry a path")]
    CannotBeBase(String),
}

impl Endpoint {
    pub const fn new(template: &'static str, min_version: ApiVersion) -> Self {
        Self {
            template,
            min_version,
        }
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn min_version(&self) -> ApiVersion {
        self.min_version
    }

    /// Number of `{}` placeholders in the template
    pub fn placeholders(&self) -> usize {
        self.template.split('/').filter(|s| *s == "{}").count()
    }

    /// Render the full request URL under `base`
    pub fn url(
        &self,
        base: &Url,
        params: &[String],
        query: &QueryParams,
    ) -> Result<Url, EndpointError> {
        let mut remaining = params.iter().enumerate();
        let mut segments: Vec<&str> = Vec::new();
        let mut placeholder = 0;

        for segment in self.template.split('/') {
            if segment == "{}" {
                let (index, value) =
                    remaining
                        .next()
                        .ok_or_else(|| EndpointError::MissingParameter {
                            template: self.template.to_string(),
                            index: placeholder,
                        })?;
                segments.push(self.checked(index, value)?);
                placeholder += 1;
            } else {
                segments.push(segment);
            }
        }

        let extra: Vec<(usize, &String)> = remaining.collect();
        if !extra.is_empty() {
            if segments.last() == Some(&"") {
                segments.pop();
            }
            for (index, value) in extra {
                segments.push(self.checked(index, value)?);
            }
        }

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| EndpointError::CannotBeBase(base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        query.append_to(&mut url);
        Ok(url)
    }

    fn checked<'a>(&self, index: usize, value: &'a str) -> Result<&'a str, EndpointError> {
        if value.trim().is_empty() {
            return Err(EndpointError::EmptyParameter {
                template: self.template.to_string(),
                index,
            });
        }
        Ok(value)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;

    const CATALOGS: Endpoint = Endpoint::new("1.0.0/catalogs/", ApiVersion::new(37, 0));
    const BGP: Endpoint = Endpoint::new(
        "1.0.0/edgeGateways/{}/routing/bgp",
        ApiVersion::new(35, 0),
    );

    fn base() -> Url {
        Url::parse("https://vcd.example.com/cloudapi/").unwrap()
    }

    #[test]
    fn test_collection_url_keeps_trailing_slash() {
        let url = CATALOGS.url(&base(), &[], &QueryParams::new()).unwrap();
        assert_eq!(url.as_str(), "https://vcd.example.com/cloudapi/1.0.0/catalogs/");
    }

    #[test]
    fn test_item_url_appends_id() {
        let id = "urn:vcloud:catalog:1234".to_string();
        let url = CATALOGS.url(&base(), &[id], &QueryParams::new()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://vcd.example.com/cloudapi/1.0.0/catalogs/urn:vcloud:catalog:1234"
        );
    }

    #[test]
    fn test_placeholder_is_substituted() {
        let edge = "urn:vcloud:gateway:42".to_string();
        let url = BGP.url(&base(), &[edge], &QueryParams::new()).unwrap();
        assert_eq!(
            url.path(),
            "/cloudapi/1.0.0/edgeGateways/urn:vcloud:gateway:42/routing/bgp"
        );
    }

    #[test]
    fn test_missing_placeholder_value() {
        let err = BGP.url(&base(), &[], &QueryParams::new()).unwrap_err();
        assert!(matches!(err, EndpointError::MissingParameter { .. }));
    }

    #[test]
    fn test_empty_parameter_rejected() {
        let err = CATALOGS
            .url(&base(), &[String::new()], &QueryParams::new())
            .unwrap_err();
        assert!(matches!(err, EndpointError::EmptyParameter { index: 0, .. }));
    }

    #[test]
    fn test_slash_in_parameter_is_escaped() {
        let url = CATALOGS
            .url(&base(), &["a/b".to_string()], &QueryParams::new())
            .unwrap();
        assert_eq!(url.path(), "/cloudapi/1.0.0/catalogs/a%2Fb");
    }

    #[test]
    fn test_query_is_appended() {
        let query = QueryParams::new().filter(Filter::eq("name", "catalog-A"));
        let url = CATALOGS.url(&base(), &[], &query).unwrap();
        let filter: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "filter")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(filter, vec!["name==catalog-A".to_string()]);
    }
}
