//! Report projection and CSV output
//!
//! [`project`] maps a resolved record onto the fixed 27-column layout the
//! planning spreadsheet expects. Columns without a source in the API
//! (REFERENCIA, VEIO, ...) are filled by hand later and always stay empty.

use crate::enrich::ResolvedRecord;
use crate::error::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Report header, in column order
pub const COLUMNS: [&str; 27] = [
    "PLANO",
    "DESC MP",
    "COD PRODUTO",
    "PRODUTO",
    "REFERENCIA",
    "MATERIAL",
    "MATERIAL MP",
    "LARGURA",
    "LARG",
    "COMPRIMENTO",
    "COMP",
    "QTDE PLC",
    "ORDEM",
    "COD BARRA",
    "ESPESSURA",
    "VEIO",
    "ID ORD PLANO",
    "DT LOTE",
    "NUM LOTE",
    "PAP PLAST",
    "COD MP",
    "MASC ID MP",
    "BORDA",
    "FURACAO",
    "COD BARRA ORD",
    "QTDE ORD",
    "G TOTAL GERAL",
];

/// Prefix of the order barcode
pub const BARCODE_PREFIX: &str = "ORD";

/// FURACAO value of drilled pieces
pub const DRILLING_MARK: &str = "SIM";

/// One report line; field order matches [`COLUMNS`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// PLANO
    pub plano: String,
    /// DESC MP
    pub desc_mp: String,
    /// COD PRODUTO
    pub cod_produto: String,
    /// PRODUTO
    pub produto: String,
    /// REFERENCIA (filled by hand)
    pub referencia: String,
    /// MATERIAL
    pub material: String,
    /// MATERIAL MP
    pub material_mp: String,
    /// LARGURA
    pub largura: String,
    /// LARG
    pub larg: String,
    /// COMPRIMENTO
    pub comprimento: String,
    /// COMP
    pub comp: String,
    /// QTDE PLC
    pub qtde_plc: String,
    /// ORDEM
    pub ordem: String,
    /// COD BARRA
    pub cod_barra: String,
    /// ESPESSURA
    pub espessura: String,
    /// VEIO (filled by hand)
    pub veio: String,
    /// ID ORD PLANO (filled by hand)
    pub id_ord_plano: String,
    /// DT LOTE (filled by hand)
    pub dt_lote: String,
    /// NUM LOTE
    pub num_lote: String,
    /// PAP PLAST (filled by hand)
    pub pap_plast: String,
    /// COD MP (filled by hand)
    pub cod_mp: String,
    /// MASC ID MP (filled by hand)
    pub masc_id_mp: String,
    /// BORDA
    pub borda: String,
    /// FURACAO
    pub furacao: String,
    /// COD BARRA ORD
    pub cod_barra_ord: String,
    /// QTDE ORD (filled by hand)
    pub qtde_ord: String,
    /// G TOTAL GERAL (filled by hand)
    pub g_total_geral: String,
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Lot and piece identifiers start at 1; zero means unset
fn id_cell(value: Option<i64>) -> String {
    cell(value.filter(|v| *v != 0))
}

/// Map a resolved record onto the report layout
pub fn project(resolved: &ResolvedRecord) -> OutputRow {
    let record = &resolved.record;
    let material = resolved.material.as_ref();

    OutputRow {
        plano: id_cell(record.codigo_lote),
        desc_mp: cell(material.and_then(|m| m.desc_mp.as_deref())),
        cod_produto: record.item_codigo.clone(),
        produto: cell(record.item_descricao.as_deref()),
        material: cell(material.and_then(|m| m.mascara_material.as_deref())),
        material_mp: cell(material.and_then(|m| m.material_mp.as_deref())),
        largura: cell(record.mm_largura),
        larg: cell(record.mm_largura),
        comprimento: cell(record.mm_comprimento),
        comp: cell(record.mm_comprimento),
        qtde_plc: record.qtd.to_string(),
        ordem: cell(resolved.order_info.as_ref().map(|o| o.numero)),
        cod_barra: format!("{BARCODE_PREFIX}{}", record.id_ordem),
        espessura: cell(record.mm_espessura),
        num_lote: id_cell(record.codigo_lote),
        borda: resolved.edge_band.clone(),
        furacao: if resolved.has_drilling {
            DRILLING_MARK.to_string()
        } else {
            String::new()
        },
        cod_barra_ord: id_cell(record.id_unico_peca),
        ..OutputRow::default()
    }
}

/// Write the header and every row as CSV
///
/// Rows end with `\n`; fields are quoted only when they need it.
pub fn write_csv<W: Write>(writer: W, separator: u8, rows: &[OutputRow]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(separator)
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(COLUMNS)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Create the report file and write every row to it
pub fn write_report(path: &Path, separator: u8, rows: &[OutputRow]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, separator, rows)?;
    info!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}
