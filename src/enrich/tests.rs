use super::*;
use crate::error::Error;
use crate::types::TipoRetrabalho;
use crate::utils::parse_iso_datetime;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source answering with a fixed value, or failing with HTTP 500
struct StubSource<T> {
    kind: Lookup,
    value: Option<T>,
    calls: AtomicUsize,
}

impl<T> StubSource<T> {
    fn ok(kind: Lookup, value: T) -> Self {
        Self {
            kind,
            value: Some(value),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(kind: Lookup) -> Self {
        Self {
            kind,
            value: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> EnrichmentSource for StubSource<T> {
    type Output = T;

    fn kind(&self) -> Lookup {
        self.kind
    }

    async fn fetch(&self, record: &Retrabalho) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.value.clone().ok_or_else(|| Error::Status {
            status: 500,
            url: format!("http://mes/ordem/{}", record.id_ordem),
            message: Some("falha interna".into()),
        })
    }
}

fn record(id_ordem: i64) -> Retrabalho {
    let now = parse_iso_datetime("2024-03-01T08:00:00").unwrap();
    Retrabalho {
        id: id_ordem * 10,
        created_on: now,
        modified_on: now,
        tipo: TipoRetrabalho::Sucata,
        codigo_lote: Some(4521),
        id_ordem,
        id_unico_peca: Some(77),
        item_codigo: "TMP-100".into(),
        item_descricao: Some("TAMPO 100".into()),
        qtd: 1,
        mm_largura: Some(450),
        mm_comprimento: Some(900),
        mm_espessura: Some(18),
        id_setor: 3,
        descricao_setor: "CORTE".into(),
        id_recurso: 7,
        apelido_recurso: "SECC-01".into(),
        id_usuario: None,
        responsavel: None,
        inativo: false,
        urgente: false,
        item_mascara: "BR".into(),
        item_mascara_descricao: None,
        motivo_retrabalho: "LASCADO".into(),
        id_turno: None,
        descricao_turno: None,
    }
}

fn material() -> MaterialInfo {
    MaterialInfo {
        desc_mp: Some("MDF BRANCO 18MM".into()),
        material_mp: Some("MP-18".into()),
        mascara_material: Some("BR".into()),
    }
}

fn routing(codes: &[&str]) -> Vec<RoutingStep> {
    codes.iter().map(|c| RoutingStep::with_code(*c)).collect()
}

#[tokio::test]
async fn test_resolve_all_lookups_succeed() {
    let (tx, mut rx) = broadcast::channel(16);
    let resolver = Resolver::new(
        StubSource::ok(Lookup::Material, material()),
        StubSource::ok(Lookup::Routing, routing(&["7", "33", "5", "11"])),
        StubSource::ok(Lookup::OrderInfo, OrderInfo { numero: 123456 }),
        tx,
    );

    let resolved = resolver.resolve(record(99001)).await;

    assert_eq!(resolved.material, Some(material()));
    assert!(resolved.has_drilling);
    assert_eq!(resolved.edge_band, "1,1,BORDA");
    assert_eq!(resolved.order_info, Some(OrderInfo { numero: 123456 }));
    assert!(rx.try_recv().is_err(), "no warning expected");
}

#[tokio::test]
async fn test_material_failure_leaves_other_lookups_intact() {
    let (tx, mut rx) = broadcast::channel(16);
    let resolver = Resolver::new(
        StubSource::<MaterialInfo>::failing(Lookup::Material),
        StubSource::ok(Lookup::Routing, routing(&["8"])),
        StubSource::ok(Lookup::OrderInfo, OrderInfo { numero: 5 }),
        tx,
    );

    let resolved = resolver.resolve(record(42)).await;

    assert_eq!(resolved.material, None);
    assert_eq!(resolved.edge_band, "1,0,BORDA");
    assert!(!resolved.has_drilling);
    assert_eq!(resolved.order_info, Some(OrderInfo { numero: 5 }));

    match rx.try_recv().unwrap() {
        Event::LookupFailed {
            lookup,
            id_ordem,
            item_codigo,
            item_descricao,
            missing_columns,
            error,
        } => {
            assert_eq!(lookup, Lookup::Material);
            assert_eq!(id_ordem, 42);
            assert_eq!(item_codigo, "TMP-100");
            assert_eq!(item_descricao.as_deref(), Some("TAMPO 100"));
            assert_eq!(missing_columns, vec!["DESC MP", "MATERIAL", "MATERIAL MP"]);
            assert!(error.contains("falha interna"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_routing_failure_degrades_derived_fields() {
    let (tx, mut rx) = broadcast::channel(16);
    let resolver = Resolver::new(
        StubSource::ok(Lookup::Material, material()),
        StubSource::<Vec<RoutingStep>>::failing(Lookup::Routing),
        StubSource::ok(Lookup::OrderInfo, OrderInfo { numero: 9 }),
        tx,
    );

    let resolved = resolver.resolve(record(1)).await;

    assert_eq!(resolved.material, Some(material()));
    assert!(!resolved.has_drilling);
    assert_eq!(resolved.edge_band, "");
    assert_eq!(resolved.order_info, Some(OrderInfo { numero: 9 }));
    assert!(matches!(
        rx.try_recv().unwrap(),
        Event::LookupFailed {
            lookup: Lookup::Routing,
            ..
        }
    ));
}

#[tokio::test]
async fn test_order_info_failure_only_empties_order() {
    let (tx, mut rx) = broadcast::channel(16);
    let resolver = Resolver::new(
        StubSource::ok(Lookup::Material, material()),
        StubSource::ok(Lookup::Routing, routing(&["9"])),
        StubSource::<OrderInfo>::failing(Lookup::OrderInfo),
        tx,
    );

    let resolved = resolver.resolve(record(1)).await;

    assert_eq!(resolved.material, Some(material()));
    assert!(resolved.has_drilling);
    assert_eq!(resolved.edge_band, "0,0,BORDA");
    assert_eq!(resolved.order_info, None);
    match rx.try_recv().unwrap() {
        Event::LookupFailed {
            missing_columns, ..
        } => assert_eq!(missing_columns, vec!["ORDEM"]),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_every_lookup_failing_still_resolves() {
    let (tx, mut rx) = broadcast::channel(16);
    let resolver = Resolver::new(
        StubSource::<MaterialInfo>::failing(Lookup::Material),
        StubSource::<Vec<RoutingStep>>::failing(Lookup::Routing),
        StubSource::<OrderInfo>::failing(Lookup::OrderInfo),
        tx,
    );

    let input = record(3);
    let resolved = resolver.resolve(input.clone()).await;

    assert_eq!(resolved.record, input);
    assert_eq!(resolved.material, None);
    assert_eq!(resolved.order_info, None);
    assert!(!resolved.has_drilling);
    assert!(resolved.edge_band.is_empty());

    let mut failed = Vec::new();
    while let Ok(Event::LookupFailed { lookup, .. }) = rx.try_recv() {
        failed.push(lookup);
    }
    assert_eq!(
        failed,
        vec![Lookup::Material, Lookup::Routing, Lookup::OrderInfo]
    );
}

#[tokio::test]
async fn test_each_source_called_once_per_record() {
    let (tx, _rx) = broadcast::channel(16);
    let resolver = Resolver::new(
        StubSource::ok(Lookup::Material, material()),
        StubSource::ok(Lookup::Routing, Vec::<RoutingStep>::new()),
        StubSource::ok(Lookup::OrderInfo, OrderInfo { numero: 1 }),
        tx,
    );

    let resolved = resolver.resolve(record(1)).await;
    resolver.resolve(record(2)).await;

    assert_eq!(resolved.edge_band, "");
    assert!(!resolved.has_drilling);
    assert_eq!(resolver.material.calls.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.routing.calls.load(Ordering::SeqCst), 2);
    assert_eq!(resolver.order_info.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_resolved_record_without_routing() {
    let resolved = ResolvedRecord::new(record(1), None, None, None);
    assert!(!resolved.has_drilling);
    assert_eq!(resolved.edge_band, "");
}
