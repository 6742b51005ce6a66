//! Mock MES API and record fixtures

use busca_retrabalho::utils::parse_iso_datetime;
use busca_retrabalho::{ApiConfig, Config, OutputConfig, RetrabalhoFilter};
use serde_json::{Value, json};
use std::path::Path;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token handed out by the mock login
pub const TOKEN: &str = "token-de-teste";

/// Rework record as the API sends it
pub fn retrabalho_json(id: i64, id_ordem: i64) -> Value {
    json!({
        "id": id,
        "created_on": "2024-03-04T10:15:00.250000",
        "modified_on": "2024-03-04T10:15:00",
        "tipo": "SUCATA",
        "codigo_lote": 4521,
        "id_ordem": id_ordem,
        "id_unico_peca": 880000 + id,
        "item_codigo": format!("PC-{id}"),
        "item_descricao": format!("LATERAL {id}"),
        "qtd": 2,
        "mm_largura": 550,
        "mm_comprimento": 1800,
        "mm_espessura": 18,
        "id_setor": 3,
        "descricao_setor": "CORTE",
        "id_recurso": 12,
        "apelido_recurso": "SECC01",
        "id_usuario": 7,
        "responsavel": "Operador",
        "inativo": false,
        "urgente": false,
        "item_mascara": "BRANCO",
        "item_mascara_descricao": null,
        "motivo_retrabalho": "Lascado",
        "id_turno": 1,
        "descricao_turno": "1º turno"
    })
}

/// One page of the rework collection
pub fn page_json(records: Vec<Value>, last_page: Option<i64>) -> Value {
    json!({
        "retorno": records,
        "metadata": { "last_page": last_page }
    })
}

/// Start a server that accepts the login of `operador`
pub async fn start_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "retorno": { "key": TOKEN } })),
        )
        .mount(&server)
        .await;
    server
}

/// Serve `body` for the given zero-based rework page
pub async fn mount_page(server: &MockServer, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path("/retrabalho"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer every auxiliary lookup successfully, with no drilling in the routing
pub async fn mount_lookups(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/focco/ordem/\d+/material$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retorno": {
                "desc_mp": "MDF BRANCO 18MM",
                "material_mp": "MP-018",
                "mascara_material": "BRANCO TX"
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cliente/roteiro"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retorno": [{ "codigo_operacao": "7" }, { "codigo_operacao": "5" }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/focco/consulta_ordem"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "retorno": { "Numero": 31337 }
        })))
        .mount(server)
        .await;
}

/// Configuration pointing at the mock server, writing to `output`
pub fn config_for(server: &MockServer, output: &Path) -> Config {
    Config::new(
        ApiConfig::new(format!("{}/", server.uri()), "operador", "senha"),
        OutputConfig::new(output),
    )
}

/// Filter over March 2024
pub fn march_filter() -> RetrabalhoFilter {
    RetrabalhoFilter::new(
        parse_iso_datetime("2024-03-01").unwrap(),
        parse_iso_datetime("2024-03-31T23:59:59").unwrap(),
    )
}
