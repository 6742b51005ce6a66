//! Enrichment sources backed by the MES and ERP endpoints

use super::EnrichmentSource;
use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{Envelope, Lookup, MaterialInfo, OrderInfo, Retrabalho, RoutingStep};
use async_trait::async_trait;

/// Path of the routing endpoint (order given as `id_ordem` query parameter)
pub const ROUTING_PATH: &str = "/cliente/roteiro";
/// Path of the order query endpoint (order given as `id_ordem` query parameter)
pub const ORDER_INFO_PATH: &str = "/focco/consulta_ordem";

/// Path of the material endpoint of an order
pub fn material_path(id_ordem: i64) -> String {
    format!("/focco/ordem/{id_ordem}/material")
}

/// Raw material of the record's order, from the ERP
#[derive(Clone, Debug)]
pub struct MaterialSource {
    client: ApiClient,
}

impl MaterialSource {
    /// Create the source over an authenticated client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnrichmentSource for MaterialSource {
    type Output = MaterialInfo;

    fn kind(&self) -> Lookup {
        Lookup::Material
    }

    async fn fetch(&self, record: &Retrabalho) -> Result<MaterialInfo> {
        let envelope: Envelope<MaterialInfo> = self
            .client
            .get_json(&material_path(record.id_ordem), &[])
            .await?;
        Ok(envelope.retorno)
    }
}

/// Routing of the record's order, from the MES
#[derive(Clone, Debug)]
pub struct RoutingSource {
    client: ApiClient,
}

impl RoutingSource {
    /// Create the source over an authenticated client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnrichmentSource for RoutingSource {
    type Output = Vec<RoutingStep>;

    fn kind(&self) -> Lookup {
        Lookup::Routing
    }

    async fn fetch(&self, record: &Retrabalho) -> Result<Vec<RoutingStep>> {
        // A null routing means the order has no operations.
        let envelope: Envelope<Option<Vec<RoutingStep>>> = self
            .client
            .get_json(ROUTING_PATH, &[("id_ordem", record.id_ordem.to_string())])
            .await?;
        Ok(envelope.retorno.unwrap_or_default())
    }
}

/// Supplementary order data, from the ERP
#[derive(Clone, Debug)]
pub struct OrderInfoSource {
    client: ApiClient,
}

impl OrderInfoSource {
    /// Create the source over an authenticated client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnrichmentSource for OrderInfoSource {
    type Output = OrderInfo;

    fn kind(&self) -> Lookup {
        Lookup::OrderInfo
    }

    async fn fetch(&self, record: &Retrabalho) -> Result<OrderInfo> {
        let envelope: Envelope<OrderInfo> = self
            .client
            .get_json(ORDER_INFO_PATH, &[("id_ordem", record.id_ordem.to_string())])
            .await?;
        Ok(envelope.retorno)
    }
}
