//! Per-record enrichment from the auxiliary endpoints
//!
//! Each rework record gets three independent lookups keyed by its order:
//! material, routing and order info. A failed lookup never drops the record;
//! it is logged, announced as [`Event::LookupFailed`] and the value becomes
//! `None`, leaving the matching report columns empty.

mod routing;
mod sources;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use routing::{
    DRILLING_CODES, EdgeBand, LENGTH_EDGE_1, LENGTH_EDGE_2, WIDTH_EDGE_1, WIDTH_EDGE_2,
    edge_band_text, has_drilling,
};
pub use sources::{
    MaterialSource, ORDER_INFO_PATH, OrderInfoSource, ROUTING_PATH, RoutingSource, material_path,
};

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{Event, Lookup, MaterialInfo, OrderInfo, Retrabalho, RoutingStep};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

/// A source of supplementary data for a rework record
///
/// Implementations return the raw lookup result; the [`Resolver`] is the only
/// place where failures are absorbed.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Data produced by a successful lookup
    type Output: Send;

    /// Which lookup this source performs
    fn kind(&self) -> Lookup;

    /// Look up the data of one record
    ///
    /// # Errors
    ///
    /// Returns an error for any failed request; the resolver reports it and
    /// treats the data as absent.
    async fn fetch(&self, record: &Retrabalho) -> Result<Self::Output>;
}

/// A rework record with everything the report needs
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRecord {
    /// The record as fetched
    pub record: Retrabalho,
    /// Raw material, `None` when the lookup failed
    pub material: Option<MaterialInfo>,
    /// Whether the routing drills the piece (`false` without routing)
    pub has_drilling: bool,
    /// Edge-banding text (empty without routing)
    pub edge_band: String,
    /// Supplementary order data, `None` when the lookup failed
    pub order_info: Option<OrderInfo>,
}

impl ResolvedRecord {
    /// Derive the routing fields of a record; `None` means no routing data
    pub fn new(
        record: Retrabalho,
        material: Option<MaterialInfo>,
        routing: Option<&[RoutingStep]>,
        order_info: Option<OrderInfo>,
    ) -> Self {
        Self {
            record,
            material,
            has_drilling: routing.is_some_and(has_drilling),
            edge_band: routing.map(edge_band_text).unwrap_or_default(),
            order_info,
        }
    }
}

/// Resolves records against a material, a routing and an order-info source
pub struct Resolver<M, R, O> {
    material: M,
    routing: R,
    order_info: O,
    events: broadcast::Sender<Event>,
}

/// Resolver over the real API endpoints
pub type ApiResolver = Resolver<MaterialSource, RoutingSource, OrderInfoSource>;

impl ApiResolver {
    /// Build the three API sources over one authenticated client
    pub fn from_client(client: &ApiClient, events: broadcast::Sender<Event>) -> Self {
        Resolver::new(
            MaterialSource::new(client.clone()),
            RoutingSource::new(client.clone()),
            OrderInfoSource::new(client.clone()),
            events,
        )
    }
}

impl<M, R, O> Resolver<M, R, O>
where
    M: EnrichmentSource<Output = MaterialInfo>,
    R: EnrichmentSource<Output = Vec<RoutingStep>>,
    O: EnrichmentSource<Output = OrderInfo>,
{
    /// Create a resolver; lookup failures are announced on `events`
    pub fn new(material: M, routing: R, order_info: O, events: broadcast::Sender<Event>) -> Self {
        Self {
            material,
            routing,
            order_info,
            events,
        }
    }

    /// Run the three lookups of a record, one after the other
    ///
    /// Never fails: each lookup degrades independently to `None`.
    pub async fn resolve(&self, record: Retrabalho) -> ResolvedRecord {
        let material = self.lookup(&self.material, &record).await;
        let routing = self.lookup(&self.routing, &record).await;
        let order_info = self.lookup(&self.order_info, &record).await;

        ResolvedRecord::new(record, material, routing.as_deref(), order_info)
    }

    async fn lookup<S>(&self, source: &S, record: &Retrabalho) -> Option<S::Output>
    where
        S: EnrichmentSource,
    {
        let lookup = source.kind();
        match source.fetch(record).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    %lookup,
                    id_ordem = record.id_ordem,
                    item_codigo = %record.item_codigo,
                    error = %e,
                    "Lookup failed, record kept with missing columns"
                );
                self.events
                    .send(Event::LookupFailed {
                        lookup,
                        id_ordem: record.id_ordem,
                        item_codigo: record.item_codigo.clone(),
                        item_descricao: record.item_descricao.clone(),
                        missing_columns: lookup
                            .missing_columns()
                            .iter()
                            .map(|c| c.to_string())
                            .collect(),
                        error: e.to_string(),
                    })
                    .ok();
                None
            }
        }
    }
}
