//! Core types for busca-retrabalho

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{deserialize_iso_datetime, deserialize_operation_code};

/// Rework category, as named by the MES API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoRetrabalho {
    /// Offcut reuse
    #[serde(rename = "APROVEITAMENTO")]
    Aproveitamento,
    /// Scrapped piece that must be produced again
    #[serde(rename = "SUCATA")]
    Sucata,
    /// Edge-banding rework
    #[serde(rename = "RETRABALHO DE BORDA")]
    RetrabalhoDeBorda,
    /// Generic rework
    #[serde(rename = "RETRABALHO")]
    Retrabalho,
    /// Record imported by hand
    #[serde(rename = "IMPORTACAO MANUAL")]
    ImportacaoManual,
}

impl TipoRetrabalho {
    /// Value used by the API in payloads and query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoRetrabalho::Aproveitamento => "APROVEITAMENTO",
            TipoRetrabalho::Sucata => "SUCATA",
            TipoRetrabalho::RetrabalhoDeBorda => "RETRABALHO DE BORDA",
            TipoRetrabalho::Retrabalho => "RETRABALHO",
            TipoRetrabalho::ImportacaoManual => "IMPORTACAO MANUAL",
        }
    }
}

impl std::fmt::Display for TipoRetrabalho {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rework entry from the MES
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Retrabalho {
    /// Record identifier
    pub id: i64,
    /// Creation timestamp
    #[serde(deserialize_with = "deserialize_iso_datetime")]
    pub created_on: NaiveDateTime,
    /// Last modification timestamp
    #[serde(deserialize_with = "deserialize_iso_datetime")]
    pub modified_on: NaiveDateTime,
    /// Rework category
    pub tipo: TipoRetrabalho,
    /// Lot (production plan) code
    #[serde(default)]
    pub codigo_lote: Option<i64>,
    /// Production order identifier, key of every auxiliary lookup
    pub id_ordem: i64,
    /// Unique piece identifier
    #[serde(default)]
    pub id_unico_peca: Option<i64>,
    /// Item code
    pub item_codigo: String,
    /// Item description
    #[serde(default)]
    pub item_descricao: Option<String>,
    /// Quantity to rework
    pub qtd: i64,
    /// Width in millimeters
    #[serde(default)]
    pub mm_largura: Option<i64>,
    /// Length in millimeters
    #[serde(default)]
    pub mm_comprimento: Option<i64>,
    /// Thickness in millimeters
    #[serde(default)]
    pub mm_espessura: Option<i64>,
    /// Sector that reported the rework
    pub id_setor: i64,
    /// Sector name
    pub descricao_setor: String,
    /// Resource (machine) that reported the rework
    pub id_recurso: i64,
    /// Resource nickname
    pub apelido_recurso: String,
    /// User that reported the rework
    #[serde(default)]
    pub id_usuario: Option<i64>,
    /// Name of the responsible user
    #[serde(default)]
    pub responsavel: Option<String>,
    /// Whether the record was deactivated
    pub inativo: bool,
    /// Whether the rework is urgent
    pub urgente: bool,
    /// Item mask
    pub item_mascara: String,
    /// Item mask description
    #[serde(default)]
    pub item_mascara_descricao: Option<String>,
    /// Reason given for the rework
    pub motivo_retrabalho: String,
    /// Shift identifier
    #[serde(default)]
    pub id_turno: Option<i64>,
    /// Shift name
    #[serde(default)]
    pub descricao_turno: Option<String>,
}

/// Raw material of a production order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialInfo {
    /// Raw material description
    #[serde(default)]
    pub desc_mp: Option<String>,
    /// Raw material code
    #[serde(default)]
    pub material_mp: Option<String>,
    /// Material mask label
    #[serde(default)]
    pub mascara_material: Option<String>,
}

/// One operation of an order routing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingStep {
    /// Operation code; the API sends it as a string, integers are accepted too
    #[serde(default, deserialize_with = "deserialize_operation_code")]
    pub codigo_operacao: Option<String>,
}

impl RoutingStep {
    /// Step with the given operation code
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            codigo_operacao: Some(code.into()),
        }
    }

    /// Operation code, if the step has one
    pub fn code(&self) -> Option<&str> {
        self.codigo_operacao.as_deref()
    }
}

/// Supplementary order data from the ERP
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    /// Order number shown to operators
    #[serde(rename = "Numero")]
    pub numero: i64,
}

/// Success body of every API endpoint: the payload lives under `retorno`
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope<T> {
    /// Payload
    pub retorno: T,
}

/// Pagination metadata of a collection response
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageMetadata {
    /// Index of the last page; `None` when the server omits it
    #[serde(default)]
    pub last_page: Option<i64>,
}

/// One page of a collection endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
    /// Records of this page, in server order
    pub retorno: Vec<T>,
    /// Pagination metadata
    #[serde(default)]
    pub metadata: PageMetadata,
}

/// Urgency filter of the rework fetch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Urgent and non-urgent records
    #[default]
    Any,
    /// Only urgent records
    Urgent,
    /// Only non-urgent records
    NotUrgent,
}

impl Urgency {
    /// Value of the `urgente` query parameter; `None` leaves it out
    pub fn as_filter(&self) -> Option<bool> {
        match self {
            Urgency::Any => None,
            Urgency::Urgent => Some(true),
            Urgency::NotUrgent => Some(false),
        }
    }
}

/// Auxiliary lookup made for every rework record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    /// Raw material of the order
    Material,
    /// Routing (operations) of the order
    Routing,
    /// Supplementary order data
    OrderInfo,
}

impl Lookup {
    /// Report columns left empty when this lookup fails
    pub fn missing_columns(&self) -> &'static [&'static str] {
        match self {
            Lookup::Material => &["DESC MP", "MATERIAL", "MATERIAL MP"],
            Lookup::Routing => &["BORDA", "FURACAO"],
            Lookup::OrderInfo => &["ORDEM"],
        }
    }

    /// Title of the warning shown when this lookup fails
    pub fn title(&self) -> &'static str {
        match self {
            Lookup::Material => "Erro ao buscar material",
            Lookup::Routing => "Erro ao buscar roteiro",
            Lookup::OrderInfo => "Erro ao buscar informações da ordem",
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Lookup::Material => "material",
            Lookup::Routing => "routing",
            Lookup::OrderInfo => "order_info",
        })
    }
}

/// Stage of a report run, used by cancellation events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Paginated fetch of rework records
    Fetching,
    /// Per-record enrichment
    Processing,
}

/// Events emitted during a report run
///
/// Progress is reported once per page and once per record; lookup failures
/// are the non-fatal notifications of the run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A page request is about to be sent
    FetchingPage {
        /// Zero-based page index
        page: u32,
        /// Last page announced by the server so far
        last_page: Option<i64>,
    },

    /// A page was received
    PageFetched {
        /// Zero-based page index
        page: u32,
        /// Records in this page
        records: usize,
        /// Records fetched so far, this page included
        total: usize,
    },

    /// A record is about to be enriched
    ProcessingRecord {
        /// Zero-based record index
        index: usize,
        /// Number of fetched records
        total: usize,
    },

    /// An auxiliary lookup failed; the record is kept with empty columns
    LookupFailed {
        /// Failing lookup
        lookup: Lookup,
        /// Order of the affected record
        id_ordem: i64,
        /// Item code of the affected record
        item_codigo: String,
        /// Item description of the affected record
        item_descricao: Option<String>,
        /// Columns that will be empty in the report
        missing_columns: Vec<String>,
        /// Error message
        error: String,
    },

    /// The user cancelled the run; the report holds a partial result
    Cancelled {
        /// Stage that noticed the cancellation
        stage: Stage,
    },

    /// The report was written
    Completed {
        /// Path of the CSV file
        path: PathBuf,
        /// Number of data rows
        rows: usize,
    },
}
