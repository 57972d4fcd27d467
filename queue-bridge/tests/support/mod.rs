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

#![allow(dead_code)]

use async_trait::async_trait;
use in_memory_transport::{CallLog, InMemoryBroker, InMemoryQueueSource, InMemoryTopicSink};
use queue_bridge::{
    AcceptorDescriptor, BridgeSettings, CatalogError, CatalogQuery, Credential, QueueBridge,
};
use static_catalog::{CatalogDocument, PrincipalRow, StaticCatalog};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) const OWNER: &str = "OWNER";
pub(crate) const SERVICE_PRINCIPAL: &str = "SVC";
pub(crate) const CONSUME_ROLE: &str = "CWMS Users";

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Catalog that answers with a fixed list of raw queue names.
pub(crate) struct ScriptedCatalog {
    names: Vec<String>,
    principal: Option<String>,
    unavailable: AtomicBool,
    call_log: CallLog,
}

impl ScriptedCatalog {
    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogQuery for ScriptedCatalog {
    async fn list_queues(&self, owner: &str, kind: &str) -> Result<Vec<String>, CatalogError> {
        self.call_log.record("catalog.list_queues");
        assert_eq!(owner, OWNER);
        assert_eq!(kind, "NORMAL_QUEUE");
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::new("ORA-12541: no listener"));
        }
        Ok(self.names.clone())
    }

    async fn current_principal(&self) -> Result<String, CatalogError> {
        self.call_log.record("catalog.current_principal");
        self.principal
            .clone()
            .ok_or_else(|| CatalogError::new("session user unknown"))
    }
}

pub(crate) struct TestBridge {
    pub(crate) bridge: QueueBridge,
    pub(crate) catalog: Arc<ScriptedCatalog>,
    pub(crate) identities: Arc<StaticCatalog>,
    pub(crate) source: Arc<InMemoryQueueSource>,
    pub(crate) sink: Arc<InMemoryTopicSink>,
    pub(crate) broker: Arc<InMemoryBroker>,
    pub(crate) call_log: CallLog,
}

pub(crate) struct TestBridgeBuilder {
    queues: Vec<String>,
    principal: Option<String>,
    settings: BridgeSettings,
}

impl TestBridgeBuilder {
    pub(crate) fn new(queues: &[&str]) -> Self {
        Self {
            queues: queues.iter().map(|name| name.to_string()).collect(),
            principal: Some(SERVICE_PRINCIPAL.to_string()),
            settings: BridgeSettings::default()
                .with_queue_owner(OWNER)
                .with_consume_role(CONSUME_ROLE),
        }
    }

    pub(crate) fn without_service_principal(mut self) -> Self {
        self.principal = None;
        self
    }

    pub(crate) fn with_client_host(mut self, host: &str) -> Self {
        self.settings = self.settings.with_client_host(host);
        self
    }

    pub(crate) fn build(self) -> TestBridge {
        let call_log = CallLog::new();
        let catalog = Arc::new(ScriptedCatalog {
            names: self.queues,
            principal: self.principal,
            unavailable: AtomicBool::new(false),
            call_log: call_log.clone(),
        });
        let identities = Arc::new(StaticCatalog::from_document(CatalogDocument {
            service_principal: None,
            queues: Vec::new(),
            principals: vec![
                principal("reader", "reader-secret", &[CONSUME_ROLE]),
                principal("viewer", "viewer-secret", &["Viewers"]),
            ],
        }));
        let source = Arc::new(InMemoryQueueSource::with_call_log(call_log.clone()));
        let sink = Arc::new(InMemoryTopicSink::with_call_log(call_log.clone()));
        let broker = Arc::new(
            InMemoryBroker::new()
                .with_call_log(call_log.clone())
                .with_acceptor(AcceptorDescriptor::new("invm").with_param("serverId", "0"))
                .with_acceptor(
                    AcceptorDescriptor::new("artemis")
                        .with_param("host", "0.0.0.0")
                        .with_param("port", "61616"),
                )
                .with_protocol("CORE")
                .with_protocol("STOMP"),
        );

        let bridge = QueueBridge::new(
            self.settings,
            catalog.clone(),
            identities.clone(),
            source.clone(),
            sink.clone(),
            broker.clone(),
        );

        TestBridge {
            bridge,
            catalog,
            identities,
            source,
            sink,
            broker,
            call_log,
        }
    }
}

fn principal(name: &str, secret: &str, roles: &[&str]) -> PrincipalRow {
    PrincipalRow {
        name: name.to_string(),
        secret: secret.to_string(),
        roles: roles.iter().map(|role| role.to_string()).collect(),
    }
}

pub(crate) fn reader() -> Credential {
    Credential::new("reader", "reader-secret")
}

pub(crate) fn viewer() -> Credential {
    Credential::new("viewer", "viewer-secret")
}

impl TestBridge {
    /// Credential the bridge registered for itself during startup.
    pub(crate) fn service_credential(&self) -> Credential {
        let issued = self
            .sink
            .credential()
            .expect("bridge should have opened its downstream connection");
        Credential::new(issued.principal_name(), issued.secret())
    }

    pub(crate) async fn route_state(&self, route_id: &str) -> queue_bridge::RouteState {
        self.bridge
            .registry()
            .await
            .expect("bridge should be running")
            .route(route_id)
            .expect("route should exist")
            .state()
    }
}
