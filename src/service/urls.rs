//! URLs for every call the extraction makes against the service

use crate::config::ExtractionConfig;
use crate::error::Result;
use url::Url;

/// Query parameter requesting a server-side snapshot cursor
const SNAPSHOT_PARAM: &str = "paging=snapshot";

/// Builds probe, metadata, count and data URLs from one configuration
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
    entity: String,
    associated: Option<String>,
    filter: Option<String>,
    select: Option<String>,
    expand: Option<String>,
}

impl UrlBuilder {
    /// Capture the normalised options of a config
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            base: config.connection.base_url.trim().trim_end_matches('/').to_string(),
            entity: config.entity_name().to_string(),
            associated: config.associated_entity().map(str::to_string),
            filter: config.filter_option(),
            select: config.select_option(),
            expand: config.expand_option(),
        }
    }

    /// Configured select list, if any
    pub fn select(&self) -> Option<&str> {
        self.select.as_deref()
    }

    /// Configured expand paths, if any
    pub fn expand(&self) -> Option<&str> {
        self.expand.as_deref()
    }

    /// `{base}/{entity}?$filter&$select&$expand&$top=1`
    pub fn probe_url(&self) -> Result<Url> {
        let mut params = self.option_params(self.select.as_deref());
        params.push("$top=1".to_string());
        self.build(&self.entity, &params)
    }

    /// `{base}/{entity}/$metadata`, or `{base}/{entity},{associated}/$metadata`
    pub fn metadata_url(&self) -> Result<Url> {
        let path = match &self.associated {
            Some(associated) => format!("{},{associated}/$metadata", self.entity),
            None => format!("{}/$metadata", self.entity),
        };
        self.build(&path, &[])
    }

    /// `{base}/{entity}/$count?$filter`
    pub fn count_url(&self) -> Result<Url> {
        let params: Vec<String> = self
            .filter
            .iter()
            .map(|f| query_param("$filter", f))
            .collect();
        self.build(&format!("{}/$count", self.entity), &params)
    }

    /// Data page URL.
    ///
    /// `default_select` is used when no select option is configured. A zero
    /// skip is omitted; with neither skip nor top the snapshot cursor is
    /// requested.
    pub fn data_url(
        &self,
        default_select: Option<&str>,
        skip: Option<u64>,
        top: Option<u64>,
    ) -> Result<Url> {
        let select = self.select.as_deref().or(default_select);
        let mut params = self.option_params(select);

        if let Some(skip) = skip.filter(|s| *s > 0) {
            params.push(format!("$skip={skip}"));
        }
        if let Some(top) = top {
            params.push(format!("$top={top}"));
        }
        if skip.is_none() && top.is_none() {
            params.push(SNAPSHOT_PARAM.to_string());
        }

        self.build(&self.entity, &params)
    }

    fn option_params(&self, select: Option<&str>) -> Vec<String> {
        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            params.push(query_param("$filter", filter));
        }
        if let Some(select) = select.filter(|s| !s.is_empty()) {
            params.push(query_param("$select", select));
        }
        if let Some(expand) = &self.expand {
            params.push(query_param("$expand", expand));
        }
        params
    }

    fn build(&self, path: &str, params: &[String]) -> Result<Url> {
        let mut url = format!("{}/{}", self.base, path);
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }
        Ok(Url::parse(&url)?)
    }
}

fn query_param(key: &str, value: &str) -> String {
    format!("{key}={}", urlencoding::encode(value))
}
