use std::sync::Arc;

use safe_result::ErrorType;

use crate::{
    AddressInfo, Gateway, GatewayInfo, OverviewOptions, OverviewParams, OverviewRequest,
    ReferenceGateway, SafeKey, SafeOverview, SafeOverviews,
};

fn overview(chain_id: &str, address: &str) -> SafeOverview {
    SafeOverview {
        address: AddressInfo::new(address),
        chain_id: chain_id.to_string(),
        threshold: 1,
        owners: vec![AddressInfo::new("0xOWNER")],
        fiat_total: "0".to_string(),
        queued: 0,
        awaiting_confirmation: None,
    }
}

async fn reference_with(overviews: &[(&str, &str)]) -> (SafeOverviews, ReferenceGateway) {
    let gateway = ReferenceGateway::default();
    for (chain_id, address) in overviews {
        gateway.insert(overview(chain_id, address)).await;
    }

    (
        SafeOverviews::new(Gateway::Reference(gateway.clone()), OverviewOptions::default()),
        gateway,
    )
}

fn usd() -> OverviewParams {
    OverviewParams::new("usd")
}

#[tokio::test]
async fn duplicate_safes_share_one_gateway_call() {
    let (overviews, gateway) = reference_with(&[("1", "0xAAA"), ("137", "0xBBB")]).await;

    let (a, b, c) = tokio::join!(
        overviews.get(SafeKey::new("1", "0xAAA"), &usd()),
        overviews.get(SafeKey::new("1", "0xAAA"), &usd()),
        overviews.get(SafeKey::new("137", "0xBBB"), &usd()),
    );

    let a = a.unwrap().unwrap();
    let b = b.unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(c.unwrap().unwrap().chain_id, "137");

    assert_eq!(
        gateway.requests().await,
        vec![OverviewRequest {
            safes: vec!["1:0xAAA".to_string(), "137:0xBBB".to_string()],
            currency: "usd".to_string(),
            wallet_address: None,
            trusted: false,
            exclude_spam: true,
        }]
    );
}

#[tokio::test]
async fn matches_records_regardless_of_address_case() {
    let (overviews, _) = reference_with(&[("1", "0xabcdef")]).await;

    let found = overviews
        .get(SafeKey::new("1", "0xAbCdEf"), &usd())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.address.value, "0xabcdef");
}

#[tokio::test]
async fn different_params_use_different_calls() {
    let (overviews, gateway) = reference_with(&[("1", "0xAAA")]).await;
    let wallet = usd().with_wallet("0xWALLET");

    let (a, b, c) = tokio::join!(
        overviews.get(SafeKey::new("1", "0xAAA"), &usd()),
        overviews.get(SafeKey::new("1", "0xAAA"), &OverviewParams::new("eur")),
        overviews.get(SafeKey::new("1", "0xAAA"), &wallet),
    );
    assert!(a.unwrap().is_some());
    assert!(b.unwrap().is_some());
    assert!(c.unwrap().is_some());

    let requests = gateway.requests().await;
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|request| request.safes == vec!["1:0xAAA".to_string()]));
    assert!(requests.iter().any(|request| request.currency == "eur"));
    assert!(requests
        .iter()
        .any(|request| request.wallet_address.as_deref() == Some("0xWALLET")));
}

#[tokio::test]
async fn unknown_safes_resolve_to_none() {
    let (overviews, gateway) = reference_with(&[("1", "0xAAA")]).await;

    let (known, unknown) = tokio::join!(
        overviews.get(SafeKey::new("1", "0xAAA"), &usd()),
        overviews.get(SafeKey::new("1", "0xMISSING"), &usd()),
    );

    assert!(known.unwrap().is_some());
    assert_eq!(unknown, Ok(None));
    assert_eq!(gateway.requests().await.len(), 1);
}

#[tokio::test]
async fn failed_batch_fails_every_safe() {
    let (overviews, gateway) = reference_with(&[("1", "0xAAA")]).await;
    gateway
        .fail_with(Some(create_error!(GatewayError { status: 503 })))
        .await;

    let (a, b) = tokio::join!(
        overviews.get(SafeKey::new("1", "0xAAA"), &usd()),
        overviews.get(SafeKey::new("5", "0xBBB"), &usd()),
    );

    for result in [a, b] {
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "could not fetch overview");
        assert_eq!(err.cause(), Some(&ErrorType::GatewayError { status: 503 }));
    }
    assert_eq!(overviews.queue_count(), 0);

    // A new request starts over once the gateway recovers
    gateway.fail_with(None).await;
    let recovered = overviews.get(SafeKey::new("1", "0xAAA"), &usd()).await;
    assert!(recovered.unwrap().is_some());
    assert_eq!(gateway.requests().await.len(), 2);
}

#[tokio::test]
async fn get_many_keeps_resolved_in_input_order() {
    let (overviews, gateway) = reference_with(&[("1", "0xAAA"), ("137", "0xBBB")]).await;

    let found = overviews
        .get_many(
            vec![
                SafeKey::new("137", "0xBBB"),
                SafeKey::new("1", "0xMISSING"),
                SafeKey::new("1", "0xAAA"),
            ],
            &usd(),
        )
        .await;

    let keys: Vec<_> = found.iter().map(|overview| overview.key().tag()).collect();
    assert_eq!(keys, vec!["137:0xBBB", "1:0xAAA"]);
    assert_eq!(gateway.requests().await.len(), 1);
}

#[tokio::test]
async fn get_many_drops_failures() {
    let (overviews, gateway) = reference_with(&[("1", "0xAAA")]).await;
    gateway
        .fail_with(Some(create_error!(GatewayUnavailable {
            error: "connection refused".to_string()
        })))
        .await;

    let found = overviews
        .get_many(vec![SafeKey::new("1", "0xAAA")], &usd())
        .await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn rejects_empty_address_without_queueing() {
    let (overviews, gateway) = reference_with(&[]).await;

    let err = overviews
        .get(SafeKey::new("1", " "), &usd())
        .await
        .unwrap_err();

    assert!(matches!(err.error_type, ErrorType::InvalidSafeAddress));
    assert_eq!(overviews.queue_count(), 0);
    assert!(gateway.requests().await.is_empty());
}

#[tokio::test]
async fn joins_overview_already_in_flight() {
    let (gateway, gate) = ReferenceGateway::gated();
    gateway.insert(overview("1", "0xAAA")).await;
    let overviews = SafeOverviews::new(Gateway::Reference(gateway.clone()), Default::default());

    let first = tokio::spawn(overviews.get(SafeKey::new("1", "0xAAA"), &usd()));
    while gateway.requests().await.is_empty() {
        tokio::task::yield_now().await;
    }

    let second = overviews.get(SafeKey::new("1", "0xaaa"), &usd());
    assert_eq!(overviews.in_flight_count(&usd()), 1);
    assert_eq!(overviews.pending_count(&usd()), 0);

    gate.add_permits(1);
    let second = second.await.unwrap().unwrap();
    let first = first.await.unwrap().unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(gateway.requests().await.len(), 1);
}

#[tokio::test]
async fn one_shot_wallets_do_not_accumulate() {
    let (overviews, _) = reference_with(&[("1", "0xAAA")]).await;

    let requests: Vec<_> = (0..64)
        .map(|i| {
            overviews.get(
                SafeKey::new("1", "0xAAA"),
                &usd().with_wallet(format!("0xWALLET{i}")),
            )
        })
        .collect();
    assert_eq!(overviews.queue_count(), 64);

    for result in futures::future::join_all(requests).await {
        assert!(result.unwrap().is_some());
    }
    assert_eq!(overviews.queue_count(), 0);
}

#[tokio::test]
async fn connects_to_reference_gateway() {
    let gateway = GatewayInfo::Reference.connect().await.unwrap();
    assert!(matches!(gateway, Gateway::Reference(_)));

    let overviews = gateway
        .fetch_overview_batch(&["1:0xAAA".to_string()], "usd", None, false, true)
        .await
        .unwrap();
    assert!(overviews.is_empty());
}

#[tokio::test]
async fn falls_back_to_reference_gateway_without_url() {
    std::env::set_var("SAFE_GATEWAY__URL", "");

    let overviews = SafeOverviews::from_config().await.unwrap();
    assert!(matches!(overviews.gateway(), Gateway::Reference(_)));

    let unknown = overviews.get(SafeKey::new("1", "0xAAA"), &usd()).await;
    assert_eq!(unknown, Ok(None));
}
