//! Extraction orchestration
//!
//! [`ExtractionService`] composes the transporter, metadata, schema
//! generation and partitioning into the calls an orchestrator and its
//! workers make.

use super::context::RunContext;
use super::response::{check_response, check_status};
use super::urls::UrlBuilder;
use crate::config::ExtractionConfig;
use crate::decode::{filter_expanded, ExpandTree, FeedPage};
use crate::error::{ConfigField, Error, Result};
use crate::http::{RetryPolicy, Transporter};
use crate::metadata::MetadataProvider;
use crate::pagination::{PageFetcher, PageRequest};
use crate::partition::{Partition, PartitionBuilder, MAX_BATCH_SIZE};
use crate::schema::{OutputSchema, SchemaGenerator};
use crate::types::{MediaType, PaginationType};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Service facade for one configured extraction
#[derive(Clone)]
pub struct ExtractionService {
    config: ExtractionConfig,
    transporter: Transporter,
    urls: UrlBuilder,
    expand: Option<ExpandTree>,
    metadata: Option<Arc<MetadataProvider>>,
}

impl ExtractionService {
    /// Create a service with a transporter built from the config
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let retry = RetryPolicy::from_config(&config.retry);
        let transporter = Transporter::new(&config.connection, retry)?;
        Ok(Self::with_transporter(config, transporter))
    }

    /// Create a service around an existing transporter
    pub fn with_transporter(config: ExtractionConfig, transporter: Transporter) -> Self {
        let urls = UrlBuilder::new(&config);
        let expand = urls.expand().map(ExpandTree::parse);
        Self {
            config,
            transporter,
            urls,
            expand,
            metadata: None,
        }
    }

    /// Attach metadata used to derive the default select list
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<MetadataProvider>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Configuration this service was built from
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// URL builder for this configuration
    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    // ========================================================================
    // Orchestrator calls
    // ========================================================================

    /// Probe the entity with `$top=1`.
    ///
    /// Fails unless the service answers successfully with the supported
    /// version header.
    pub async fn check_url(&self) -> Result<()> {
        let url = self.urls.probe_url()?;
        debug!("Probing {}", url);
        let response = self.transporter.fetch(&url, MediaType::Json).await?;
        check_response(&self.context("Failed to validate entity"), &response)
    }

    /// Number of rows matching the filter
    pub async fn total_row_count(&self) -> Result<u64> {
        let url = self.urls.count_url()?;
        let response = self.transporter.fetch(&url, MediaType::Text).await?;
        check_response(&self.context("Failed to count records"), &response)?;

        let text = response.body_text();
        let count = text.trim().parse::<u64>().map_err(|e| {
            Error::decode(format!("Invalid record count '{}': {e}", text.trim()))
        })?;

        info!("Entity '{}' has {} rows", self.config.entity_name(), count);
        Ok(count)
    }

    /// Fetch and parse the metadata document
    pub async fn fetch_metadata(&self) -> Result<MetadataProvider> {
        let url = self.urls.metadata_url()?;
        let response = self.transporter.fetch(&url, MediaType::Xml).await?;
        check_status(&self.context("Failed to read metadata"), &response)?;

        MetadataProvider::from_bytes(response.body())
    }

    /// Metadata document encoded for a worker
    pub async fn encoded_metadata(&self) -> Result<String> {
        Ok(self.fetch_metadata().await?.encode())
    }

    /// Rebuild metadata from [`encoded_metadata`](Self::encoded_metadata)
    pub fn decode_metadata(encoded: &str) -> Result<MetadataProvider> {
        MetadataProvider::decode(encoded)
    }

    /// Fetch metadata and derive the output schema
    pub async fn build_schema(&self) -> Result<OutputSchema> {
        let metadata = self.fetch_metadata().await?;
        self.schema_for(&metadata)
    }

    /// Derive the output schema from already loaded metadata
    pub fn schema_for(&self, metadata: &MetadataProvider) -> Result<OutputSchema> {
        SchemaGenerator::new(metadata).build(
            self.config.entity_name(),
            self.urls.select(),
            self.urls.expand(),
            self.config.associated_entity(),
        )
    }

    /// Partitions for a run over `total` rows.
    ///
    /// Server-side paging reads everything through one cursor, so a single
    /// partition stands in for the whole range.
    pub fn partitions(&self, total: u64) -> Vec<Partition> {
        match self.config.pagination {
            PaginationType::ClientOffset => PartitionBuilder::new().build_splits(total),
            PaginationType::ServerSide if total == 0 => Vec::new(),
            PaginationType::ServerSide => {
                vec![Partition::new(1, total, total.min(MAX_BATCH_SIZE))]
            }
        }
    }

    /// Validate, probe, count, load metadata and plan partitions.
    ///
    /// The returned context carries everything a worker needs.
    pub async fn prepare(&self) -> Result<RunContext> {
        self.config.validate()?;
        self.check_url().await?;

        let total = self.total_row_count().await?;
        let metadata = self.fetch_metadata().await?;
        let schema = self.schema_for(&metadata)?;
        let partitions = self.partitions(total);

        info!(
            "Planned {} partitions for {} rows of '{}'",
            partitions.len(),
            total,
            self.config.entity_name()
        );

        Ok(RunContext {
            config: self.config.clone(),
            partitions,
            encoded_metadata: metadata.encode(),
            schema,
        })
    }

    // ========================================================================
    // Data pages
    // ========================================================================

    /// Fetch one data page.
    ///
    /// With neither `skip` nor `top` the server snapshot cursor is
    /// requested.
    pub async fn fetch_page(&self, skip: Option<u64>, top: Option<u64>) -> Result<FeedPage> {
        let default_select = self.default_select()?;
        let url = self.urls.data_url(default_select.as_deref(), skip, top)?;
        self.fetch_url(&url).await
    }

    /// Fetch a page by URL, e.g. a server continuation link
    pub async fn fetch_url(&self, url: &Url) -> Result<FeedPage> {
        let response = self.transporter.fetch_with_retry(url).await?;
        check_response(&self.context("Failed to pull records"), &response)?;

        let mut page = FeedPage::parse(response.body())?;
        if let Some(expand) = &self.expand {
            filter_expanded(&mut page.entries, expand);
        }

        debug!("Fetched {} entries from {}", page.len(), url);
        Ok(page)
    }

    /// Visible structural properties plus expand paths, when metadata is
    /// attached and no select option is configured
    fn default_select(&self) -> Result<Option<String>> {
        let Some(metadata) = &self.metadata else {
            return Ok(None);
        };
        if self.urls.select().is_some() {
            return Ok(None);
        }

        let entity_name = self.config.entity_name();
        let entity = metadata.entity_type(entity_name).ok_or_else(|| {
            Error::schema(format!("entity '{entity_name}' not found in metadata"))
                .with_config_field(ConfigField::EntityName)
        })?;

        let mut columns = metadata.visible_property_names(entity).join(",");
        if let Some(expand) = self.urls.expand() {
            if !columns.is_empty() {
                columns.push(',');
            }
            columns.push_str(expand);
        }

        Ok(Some(columns).filter(|c| !c.is_empty()))
    }

    fn context(&self, action: &str) -> String {
        format!("{action} '{}'", self.config.entity_name())
    }
}

#[async_trait]
impl PageFetcher for ExtractionService {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage> {
        match request {
            PageRequest::Offset { skip, top } => {
                ExtractionService::fetch_page(self, Some(*skip), Some(*top)).await
            }
            PageRequest::FirstPage => ExtractionService::fetch_page(self, None, None).await,
            PageRequest::Continuation(link) => {
                let url = Url::parse(link)?;
                self.fetch_url(&url).await
            }
        }
    }
}

impl std::fmt::Debug for ExtractionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionService")
            .field("entity", &self.config.entity_name())
            .field("urls", &self.urls)
            .field("transporter", &self.transporter)
            .finish_non_exhaustive()
    }
}
