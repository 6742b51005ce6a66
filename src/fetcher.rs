//! Paginated fetch of rework records
//!
//! Pages are requested in ascending order and concatenated in arrival order.
//! The loop ends when [`should_fetch_next_page`] says so, when the configured
//! page cap is reached, or when the run is cancelled. Any failed page aborts
//! the whole fetch: no partial result is returned on error.

use crate::client::ApiClient;
use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::types::{Event, Page, Retrabalho, Stage, Urgency};
use crate::utils::{format_iso_datetime, query_bool};
use chrono::NaiveDateTime;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Path of the rework collection, relative to the host
pub const RETRABALHO_PATH: &str = "retrabalho";

/// Server-side filters of a rework fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrabalhoFilter {
    /// Records created after this instant
    pub created_from: NaiveDateTime,
    /// Records created before this instant
    pub created_to: NaiveDateTime,
    /// Urgency tri-state; [`Urgency::Any`] leaves the filter out
    pub urgency: Urgency,
    /// Value of the `inativo` filter (`false` requests active records)
    pub inactive: bool,
}

impl RetrabalhoFilter {
    /// Filter over a creation-date range, any urgency, active records only
    pub fn new(created_from: NaiveDateTime, created_to: NaiveDateTime) -> Self {
        Self {
            created_from,
            created_to,
            urgency: Urgency::Any,
            inactive: false,
        }
    }
}

/// Whether another page must be requested after `page` was received
///
/// Stops when nothing was fetched so far, when the server did not announce a
/// last page, when `page` reached `last_page`, or when the next index would
/// cross the `max_pages` cap.
pub fn should_fetch_next_page(
    page: u32,
    last_page: Option<i64>,
    fetched_so_far: usize,
    max_pages: u32,
) -> bool {
    if fetched_so_far == 0 {
        return false;
    }
    let Some(last_page) = last_page else {
        return false;
    };
    i64::from(page) < last_page && page.saturating_add(1) < max_pages
}

/// Render query pairs for notifications and logs
pub fn describe_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fetches every rework page matching a filter
pub struct RetrabalhoFetcher<'a> {
    client: &'a ApiClient,
    config: &'a FetchConfig,
}

impl<'a> RetrabalhoFetcher<'a> {
    /// Create a fetcher over an authenticated client
    pub fn new(client: &'a ApiClient, config: &'a FetchConfig) -> Self {
        Self { client, config }
    }

    /// Query parameters of one page request
    pub fn query(&self, filter: &RetrabalhoFilter, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("created_on_gt", format_iso_datetime(&filter.created_from)),
            ("created_on_lt", format_iso_datetime(&filter.created_to)),
        ];
        if let Some(urgent) = filter.urgency.as_filter() {
            params.push(("urgente", query_bool(urgent).to_string()));
        }
        params.extend([
            ("inativo", query_bool(filter.inactive).to_string()),
            ("tipo", self.config.record_type.as_str().to_string()),
            ("page", page.to_string()),
            ("page_size", self.config.page_size.to_string()),
        ]);
        params
    }

    /// Fetch all pages, in page order
    ///
    /// `cancel` is checked once before each page; a cancelled fetch keeps the
    /// pages already received. One [`Event::FetchingPage`] and one
    /// [`Event::PageFetched`] are sent per page.
    ///
    /// # Errors
    ///
    /// - [`Error::Fetch`] if any page request fails
    /// - [`Error::NotFound`] if no record was fetched
    pub async fn fetch_all(
        &self,
        filter: &RetrabalhoFilter,
        cancel: &CancellationToken,
        events: &broadcast::Sender<Event>,
    ) -> Result<Vec<Retrabalho>> {
        let mut records: Vec<Retrabalho> = Vec::new();
        let mut last_page = None;
        let mut params = self.query(filter, 0);

        for page in 0..self.config.max_pages {
            if cancel.is_cancelled() {
                info!(page, fetched = records.len(), "Fetch cancelled by the user");
                events
                    .send(Event::Cancelled {
                        stage: Stage::Fetching,
                    })
                    .ok();
                break;
            }

            params = self.query(filter, page);
            events.send(Event::FetchingPage { page, last_page }).ok();

            let response: Page<Retrabalho> = self
                .client
                .get_json(RETRABALHO_PATH, &params)
                .await
                .map_err(|e| {
                    error!(page, error = %e, "Failed to fetch rework page");
                    Error::Fetch {
                        params: describe_query(&params),
                        source: Box::new(e),
                    }
                })?;

            let received = response.retorno.len();
            records.extend(response.retorno);
            last_page = response.metadata.last_page;

            debug!(page, received, ?last_page, total = records.len(), "Rework page received");
            events
                .send(Event::PageFetched {
                    page,
                    records: received,
                    total: records.len(),
                })
                .ok();

            if !should_fetch_next_page(page, last_page, records.len(), self.config.max_pages) {
                break;
            }
        }

        if records.is_empty() {
            info!(params = %describe_query(&params), "No rework records found");
            return Err(Error::NotFound {
                params: describe_query(&params),
            });
        }

        info!(count = records.len(), "Rework records fetched");
        Ok(records)
    }
}
