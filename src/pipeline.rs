//! Report pipeline: login, paginated fetch, enrichment, projection, CSV output
//!
//! The run is strictly sequential: every page is fetched before enrichment
//! starts, and records are enriched one at a time, so no two requests are
//! ever in flight together. Progress and non-fatal failures are published as
//! [`Event`]s; fatal failures are returned as errors and no report is written.

use crate::client::ApiClient;
use crate::config::Config;
use crate::enrich::ApiResolver;
use crate::error::Result;
use crate::fetcher::{RetrabalhoFetcher, RetrabalhoFilter};
use crate::report::{OutputRow, project, write_report};
use crate::types::{Event, Retrabalho, Stage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Outcome of a successful run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSummary {
    /// Written CSV file
    pub path: PathBuf,
    /// Data rows in the file
    pub rows: usize,
    /// Whether the user cancelled the run (the report is partial)
    pub cancelled: bool,
}

/// Runs one rework report
pub struct ReportPipeline {
    config: Arc<Config>,
    client: ApiClient,
    event_tx: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl ReportPipeline {
    /// Validate the configuration and prepare the HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for invalid settings.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = ApiClient::new(&config.api)?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            client,
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to progress and warning events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Token that stops the run early when cancelled
    ///
    /// Checked once per page and once per record; a cancelled run still writes
    /// the records processed so far.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the report end to end
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Auth`] if the login fails
    /// - [`crate::Error::Fetch`] if any page of the rework fetch fails
    /// - [`crate::Error::NotFound`] if no record matches the filter
    /// - I/O and CSV errors while writing the report
    pub async fn run(&mut self, filter: &RetrabalhoFilter) -> Result<ReportSummary> {
        let config = Arc::clone(&self.config);
        let separator = config.output.separator_byte()?;

        info!(
            host = %config.api.host,
            from = %filter.created_from,
            to = %filter.created_to,
            urgency = ?filter.urgency,
            "Starting rework report"
        );

        self.client
            .login(&config.api.user, &config.api.password)
            .await?;

        let records = RetrabalhoFetcher::new(&self.client, &config.fetch)
            .fetch_all(filter, &self.cancel, &self.event_tx)
            .await?;

        let rows = self.process(records).await;

        write_report(&config.output.path, separator, &rows)?;

        let summary = ReportSummary {
            path: config.output.path.clone(),
            rows: rows.len(),
            cancelled: self.cancel.is_cancelled(),
        };
        self.event_tx
            .send(Event::Completed {
                path: summary.path.clone(),
                rows: summary.rows,
            })
            .ok();

        info!(
            path = %summary.path.display(),
            rows = summary.rows,
            cancelled = summary.cancelled,
            "Rework report finished"
        );
        Ok(summary)
    }

    async fn process(&self, records: Vec<Retrabalho>) -> Vec<OutputRow> {
        let resolver = ApiResolver::from_client(&self.client, self.event_tx.clone());
        let total = records.len();
        let mut rows = Vec::with_capacity(total);

        for (index, record) in records.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(processed = index, total, "Processing cancelled by the user");
                self.event_tx
                    .send(Event::Cancelled {
                        stage: Stage::Processing,
                    })
                    .ok();
                break;
            }

            self.event_tx
                .send(Event::ProcessingRecord { index, total })
                .ok();
            debug!(index, total, id = record.id, id_ordem = record.id_ordem, "Processing record");

            let resolved = resolver.resolve(record).await;
            rows.push(project(&resolved));
        }

        rows
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, OutputConfig};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(id_ordem: i64) -> Retrabalho {
        serde_json::from_value(json!({
            "id": id_ordem,
            "created_on": "2024-03-01T08:00:00",
            "modified_on": "2024-03-01T08:00:00",
            "tipo": "SUCATA",
            "id_ordem": id_ordem,
            "item_codigo": format!("PC-{id_ordem}"),
            "qtd": 1,
            "id_setor": 1,
            "descricao_setor": "CORTE",
            "id_recurso": 1,
            "apelido_recurso": "SECC01",
            "inativo": false,
            "urgente": false,
            "item_mascara": "BR",
            "motivo_retrabalho": "Lascado"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_cancel_during_processing_keeps_processed_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = ReportPipeline::new(Config::new(
            ApiConfig::new(server.uri(), "operador", "senha"),
            OutputConfig::new(dir.path().join("out.csv")),
        ))
        .unwrap();

        let mut events = pipeline.subscribe();
        let cancel = pipeline.cancellation_token();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if matches!(event, Event::ProcessingRecord { index: 0, .. }) {
                    cancel.cancel();
                    break;
                }
            }
        });

        let rows = pipeline
            .process(vec![record(1), record(2), record(3)])
            .await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cod_produto, "PC-1");
        assert_eq!(rows[0].desc_mp, "");
        assert!(pipeline.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_request() {
        let result = ReportPipeline::new(Config::new(
            ApiConfig::new("mes:6543", "operador", "senha"),
            OutputConfig::new("out.csv"),
        ));
        assert!(matches!(result, Err(crate::Error::Config { .. })));
    }
}
