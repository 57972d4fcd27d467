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

use in_memory_transport::SubscribeError;
use queue_bridge::{BridgeError, BrokerRuntime};
use std::error::Error;
use support::{init_logging, reader, TestBridgeBuilder};

#[tokio::test]
async fn start_and_stop_drive_collaborators_in_order() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();

    harness.bridge.start().await.unwrap();
    assert_eq!(
        harness.call_log.entries(),
        vec![
            "catalog.current_principal",
            "source.open",
            "sink.open",
            "catalog.list_queues",
            "broker.install_hooks",
            "broker.start",
        ]
    );
    assert!(harness.bridge.is_running().await);
    assert_eq!(
        harness.bridge.service_principal().await.as_deref(),
        Some("SVC")
    );

    harness.call_log.clear();
    harness.bridge.stop().await;
    assert_eq!(
        harness.call_log.entries(),
        vec!["broker.stop", "sink.close", "source.close"]
    );
    assert!(!harness.bridge.is_running().await);
    assert!(!harness.broker.is_started());
}

#[tokio::test]
async fn discovery_failure_aborts_startup_before_the_broker_starts() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();
    harness.catalog.set_unavailable(true);

    let err = harness.bridge.start().await.unwrap_err();

    assert!(matches!(err, BridgeError::Discovery(_)));
    let cause = err.source().and_then(|discovery| discovery.source()).unwrap();
    assert!(cause.to_string().contains("ORA-12541"));
    assert!(!harness.broker.has_hooks());
    assert!(!harness.broker.is_started());
    assert!(!harness.source.is_open());
    assert!(!harness.sink.is_open());
    assert!(!harness.bridge.is_running().await);
    assert!(harness.bridge.list_advertised_topics(None).await.is_empty());

    harness.catalog.set_unavailable(false);
    harness.bridge.start().await.unwrap();
    assert!(harness.broker.is_started());
    harness.bridge.stop().await;
}

#[tokio::test]
async fn unresolved_service_principal_aborts_startup() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"])
        .without_service_principal()
        .build();

    let err = harness.bridge.start().await.unwrap_err();

    assert!(matches!(err, BridgeError::ServicePrincipal(_)));
    assert_eq!(harness.call_log.entries(), vec!["catalog.current_principal"]);
}

#[tokio::test]
async fn downstream_connect_failure_releases_upstream_connection() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();
    harness.sink.set_fail_open(true);

    let err = harness.bridge.start().await.unwrap_err();

    assert!(matches!(err, BridgeError::SinkConnect(_)));
    assert!(!harness.source.is_open());
    assert_eq!(
        harness.call_log.entries(),
        vec![
            "catalog.current_principal",
            "source.open",
            "sink.open",
            "source.close",
        ]
    );
}

#[tokio::test]
async fn broker_start_failure_is_fatal() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();
    harness.broker.set_fail_start(true);

    let err = harness.bridge.start().await.unwrap_err();

    assert!(matches!(err, BridgeError::Broker(_)));
    assert!(!harness.source.is_open());
    assert!(!harness.sink.is_open());
}

#[tokio::test]
async fn second_start_is_rejected() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();
    harness.bridge.start().await.unwrap();

    assert!(matches!(
        harness.bridge.start().await,
        Err(BridgeError::AlreadyStarted)
    ));

    harness.bridge.stop().await;
}

#[tokio::test]
async fn stop_is_best_effort_and_repeatable() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();
    harness.bridge.stop().await;
    assert!(harness.call_log.entries().is_empty());

    harness.bridge.start().await.unwrap();
    harness
        .broker
        .subscribe(&reader(), "CDA.SPK.ALL")
        .await
        .unwrap();

    harness.bridge.stop().await;
    harness.bridge.stop().await;

    assert!(matches!(
        harness.broker.subscribe(&reader(), "CDA.SPK.ALL").await,
        Err(SubscribeError::NotStarted)
    ));
}

#[tokio::test]
async fn failing_shutdown_steps_do_not_skip_the_remaining_ones() {
    init_logging();

    let harness = TestBridgeBuilder::new(&["OWNER.SPK_TS_STORED"]).build();
    harness.bridge.start().await.unwrap();
    harness
        .broker
        .subscribe(&reader(), "CDA.SPK.ALL")
        .await
        .unwrap();
    harness.broker.set_fail_stop(true);
    harness.sink.set_fail_close(true);

    harness.call_log.clear();
    harness.bridge.stop().await;

    assert_eq!(
        harness.call_log.entries(),
        vec!["broker.stop", "sink.close", "source.close"]
    );
    assert!(!harness.bridge.is_running().await);
    assert!(!harness.source.is_open());
    assert!(harness.sink.open_producers().is_empty());

    harness.broker.set_fail_stop(false);
    harness.sink.set_fail_close(false);
    harness.bridge.start().await.unwrap();
    assert!(harness.bridge.is_running().await);
    harness.bridge.stop().await;
}
