/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use queue_bridge::RouteState;
use std::collections::BTreeSet;
use support::{init_logging, reader, TestBridgeBuilder};

fn labels(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn discovered_queues_are_advertised_and_activated_lazily() {
    init_logging();

    let harness =
        TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED", "OWNER.LRL_STATUS", "BADNAME"]).build();
    harness.bridge.start().await.unwrap();

    assert_eq!(
        harness.bridge.list_advertised_topics(None).await,
        labels(&[
            "BADNAME",
            "CDA.LRL.ALL",
            "CDA.LRL.STATUS",
            "CDA.SPK.ALL",
            "CDA.SPK.TS_STORED",
        ])
    );
    assert_eq!(harness.source.subscriptions().len(), 0);

    harness
        .broker
        .subscribe(&reader(), "CDA.SPK.ALL")
        .await
        .unwrap();
    assert_eq!(
        harness.route_state("OWNER.SPK_TS_STORED").await,
        RouteState::Started
    );
    assert_eq!(harness.route_state("OWNER.LRL_STATUS").await, RouteState::Stopped);
    assert_eq!(harness.route_state("BADNAME").await, RouteState::Stopped);

    harness.broker.subscribe(&reader(), "BADNAME").await.unwrap();
    assert_eq!(harness.route_state("BADNAME").await, RouteState::Started);
    assert_eq!(harness.route_state("OWNER.LRL_STATUS").await, RouteState::Stopped);

    let err = harness
        .broker
        .subscribe(&reader(), "CDA.LRL.TS_STORED")
        .await
        .unwrap_err();
    match err {
        in_memory_transport::SubscribeError::Activation(activation) => {
            assert!(activation.is_route_not_found())
        }
        other => panic!("unexpected subscribe failure: {other}"),
    }
    assert_eq!(harness.route_state("OWNER.LRL_STATUS").await, RouteState::Stopped);

    let connected: Vec<String> = harness
        .source
        .subscriptions()
        .into_iter()
        .map(|subscription| subscription.queue_name)
        .collect();
    assert_eq!(connected, vec!["OWNER.SPK_TS_STORED", "BADNAME"]);

    harness.bridge.stop().await;
}

#[tokio::test]
async fn scope_filter_only_returns_derived_topics_of_that_scope() {
    init_logging();

    let harness = TestBridgeBuilder::new(&[
        "OWNER.SPK_TS_STORED",
        "OWNER.SPK_STATUS",
        "OWNER.LRL_STATUS",
        "BADNAME",
        "OWNER.lowercase_queue",
    ])
    .build();
    harness.bridge.start().await.unwrap();

    assert_eq!(
        harness.bridge.list_advertised_topics(Some("spk")).await,
        labels(&["CDA.SPK.ALL", "CDA.SPK.STATUS", "CDA.SPK.TS_STORED"])
    );
    assert!(harness
        .bridge
        .list_advertised_topics(Some("BADNAME"))
        .await
        .is_empty());
    assert!(harness
        .bridge
        .list_advertised_topics(None)
        .await
        .contains("OWNER.lowercase_queue"));

    harness.bridge.stop().await;
}

#[tokio::test]
async fn repeated_catalog_rows_produce_a_single_route() {
    init_logging();

    let harness =
        TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED", "OWNER.SPK_TS_STORED", "OWNER.SPK_ALL"])
            .build();
    harness.bridge.start().await.unwrap();

    let registry = harness.bridge.registry().await.unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry
            .route("OWNER.SPK_ALL")
            .unwrap()
            .topics()
            .iter()
            .collect::<Vec<_>>(),
        vec!["CDA.SPK.ALL"]
    );
    assert_eq!(registry.routes_for_topic("CDA.SPK.ALL").len(), 2);

    harness.bridge.stop().await;
}

#[tokio::test]
async fn topic_document_lists_network_endpoints_only_while_running() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED", "BADNAME"]).build();

    let before = harness.bridge.describe_topics(None).await;
    assert!(before.endpoints.is_empty());
    assert!(before.topics.is_empty());

    harness.bridge.start().await.unwrap();
    let document = serde_json::to_value(harness.bridge.describe_topics(None).await).unwrap();

    assert_eq!(
        document,
        serde_json::json!({
            "endpoints": [{ "host": "0.0.0.0", "port": "61616" }],
            "protocols": ["CORE", "STOMP"],
            "topics": ["BADNAME", "CDA.SPK.ALL", "CDA.SPK.TS_STORED"],
        })
    );

    harness.bridge.stop().await;
    assert!(harness.bridge.describe_topics(None).await.endpoints.is_empty());
}
