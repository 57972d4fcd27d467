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

//! Bridge startup and shutdown orchestration.

use crate::access::{AccessControlGate, IdentityStore, ServiceCredential};
use crate::broker::{BrokerHooks, BrokerRuntime};
use crate::catalog::{CatalogQuery, DiscoveryError, QueueCatalog};
use crate::control_plane::route_activation::LazyActivationController;
use crate::control_plane::route_registry::RouteRegistry;
use crate::data_plane::route_activator::RouteActivator;
use crate::error::{BrokerError, CatalogError, IdentityError, TransportError};
use crate::naming::{upstream_client_id, TopicNaming};
use crate::observability::events;
use crate::settings::BridgeSettings;
use crate::transport::{SinkConnector, SourceConnector};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "bridge";

/// Startup failure. The bridge is left stopped with its connectivity released.
#[derive(Debug)]
pub enum BridgeError {
    AlreadyStarted,
    ServicePrincipal(CatalogError),
    ServiceCredential(IdentityError),
    SourceConnect(TransportError),
    SinkConnect(TransportError),
    Discovery(DiscoveryError),
    Broker(BrokerError),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::AlreadyStarted => write!(f, "bridge is already started"),
            BridgeError::ServicePrincipal(_) => {
                write!(f, "unable to resolve the service principal")
            }
            BridgeError::ServiceCredential(_) => {
                write!(f, "unable to register the service credential")
            }
            BridgeError::SourceConnect(_) => write!(f, "unable to connect to the upstream source"),
            BridgeError::SinkConnect(_) => write!(f, "unable to connect to the downstream broker"),
            BridgeError::Discovery(_) => write!(f, "queue discovery failed"),
            BridgeError::Broker(_) => write!(f, "unable to start the downstream broker"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BridgeError::AlreadyStarted => None,
            BridgeError::ServicePrincipal(err) => Some(err),
            BridgeError::ServiceCredential(err) => Some(err),
            BridgeError::SourceConnect(err) | BridgeError::SinkConnect(err) => Some(err),
            BridgeError::Discovery(err) => Some(err),
            BridgeError::Broker(err) => Some(err),
        }
    }
}

/// Topic document served to clients looking for something to subscribe to.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BridgeTopics {
    /// Parameters of every network acceptor, present only while the broker runs.
    pub endpoints: Vec<BTreeMap<String, String>>,
    pub protocols: BTreeSet<String>,
    pub topics: BTreeSet<String>,
}

struct RunningBridge {
    service_principal: String,
    registry: Arc<RouteRegistry>,
    controller: Arc<LazyActivationController>,
}

/// Relays every upstream queue to its downstream topics once someone subscribes.
pub struct QueueBridge {
    settings: BridgeSettings,
    catalog_query: Arc<dyn CatalogQuery>,
    identity_store: Arc<dyn IdentityStore>,
    source_connector: Arc<dyn SourceConnector>,
    sink_connector: Arc<dyn SinkConnector>,
    broker: Arc<dyn BrokerRuntime>,
    running: Mutex<Option<RunningBridge>>,
}

impl QueueBridge {
    pub fn new(
        settings: BridgeSettings,
        catalog_query: Arc<dyn CatalogQuery>,
        identity_store: Arc<dyn IdentityStore>,
        source_connector: Arc<dyn SourceConnector>,
        sink_connector: Arc<dyn SinkConnector>,
        broker: Arc<dyn BrokerRuntime>,
    ) -> Self {
        Self {
            settings,
            catalog_query,
            identity_store,
            source_connector,
            sink_connector,
            broker,
            running: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Brings the bridge up in strict order: identity and connectivity,
    /// discovery, registry, broker hooks, then the broker itself.
    ///
    /// No subscriber can reach the broker before every route is resolvable.
    pub async fn start(&self) -> Result<(), BridgeError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(BridgeError::AlreadyStarted);
        }

        info!(
            event = events::BRIDGE_START,
            component = COMPONENT,
            owner = self.settings.queue_owner.as_str(),
            kind = self.settings.queue_kind.as_str(),
            "starting queue bridge"
        );

        match self.bring_up().await {
            Ok(bridge) => {
                info!(
                    event = events::BRIDGE_START_OK,
                    component = COMPONENT,
                    route_count = bridge.registry.len(),
                    service_principal = bridge.service_principal.as_str(),
                    "queue bridge started"
                );
                *running = Some(bridge);
                Ok(())
            }
            Err(err) => {
                error!(
                    event = events::BRIDGE_START_FAILED,
                    component = COMPONENT,
                    err = %err,
                    cause = err.source().map(ToString::to_string).unwrap_or_default(),
                    "queue bridge failed to start"
                );
                Err(err)
            }
        }
    }

    async fn bring_up(&self) -> Result<RunningBridge, BridgeError> {
        let service_principal = self
            .catalog_query
            .current_principal()
            .await
            .map_err(BridgeError::ServicePrincipal)?;
        info!(
            event = events::SERVICE_PRINCIPAL_RESOLVED,
            component = COMPONENT,
            principal = service_principal.as_str(),
            "service principal resolved"
        );

        let credential = ServiceCredential::issue(
            &service_principal,
            &self.settings.app_prefix,
            self.settings.service_key_validity_months,
            Utc::now(),
        );
        self.identity_store
            .register_service_key(&credential)
            .await
            .map_err(BridgeError::ServiceCredential)?;
        info!(
            event = events::SERVICE_KEY_ISSUED,
            component = COMPONENT,
            principal = service_principal.as_str(),
            key_name = credential.key_name(),
            expires_at = %credential.expires_at(),
            "service key registered"
        );

        self.source_connector
            .open(&upstream_client_id(&self.settings.client_host))
            .await
            .map_err(BridgeError::SourceConnect)?;

        if let Err(err) = self.sink_connector.open(&credential).await {
            log_stop_step("source", self.source_connector.close().await);
            return Err(BridgeError::SinkConnect(err));
        }

        match self.build_routes(&service_principal).await {
            Ok(bridge) => Ok(bridge),
            Err(err) => {
                self.release_connectivity().await;
                Err(err)
            }
        }
    }

    async fn build_routes(&self, service_principal: &str) -> Result<RunningBridge, BridgeError> {
        let naming = TopicNaming::new(&self.settings.app_prefix, &self.settings.queue_owner);
        let catalog = QueueCatalog::new(
            self.catalog_query.clone(),
            naming.clone(),
            &self.settings.queue_owner,
            &self.settings.queue_kind,
        );
        let queues = catalog.discover().await.map_err(BridgeError::Discovery)?;

        let registry = Arc::new(RouteRegistry::build(queues, &naming));
        let activator = Arc::new(RouteActivator::new(
            self.source_connector.clone(),
            self.sink_connector.clone(),
            &self.settings.application_title,
            &self.settings.client_host,
        ));
        let controller = Arc::new(LazyActivationController::new(registry.clone(), activator));
        let gate = Arc::new(AccessControlGate::new(
            self.identity_store.clone(),
            service_principal,
            &self.settings.consume_role,
        ));

        self.broker.install_hooks(BrokerHooks {
            security: gate,
            subscriber_attach: controller.clone(),
        });
        if let Err(err) = self.broker.start().await {
            controller.shutdown();
            return Err(BridgeError::Broker(err));
        }

        Ok(RunningBridge {
            service_principal: service_principal.to_string(),
            registry,
            controller,
        })
    }

    /// Best-effort shutdown. Failing steps are logged and the remaining steps still run.
    pub async fn stop(&self) {
        let Some(bridge) = self.running.lock().await.take() else {
            debug!(
                event = events::BRIDGE_STOP,
                component = COMPONENT,
                "queue bridge is not running"
            );
            return;
        };

        info!(
            event = events::BRIDGE_STOP,
            component = COMPONENT,
            "stopping queue bridge"
        );

        bridge.controller.shutdown();
        log_stop_step("broker", self.broker.stop().await);
        bridge.registry.stop_all().await;
        self.release_connectivity().await;

        info!(
            event = events::BRIDGE_STOP_OK,
            component = COMPONENT,
            "queue bridge stopped"
        );
    }

    async fn release_connectivity(&self) {
        log_stop_step("sink", self.sink_connector.close().await);
        log_stop_step("source", self.source_connector.close().await);
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Principal resolved at startup; `None` while stopped.
    pub async fn service_principal(&self) -> Option<String> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|bridge| bridge.service_principal.clone())
    }

    /// Route registry of the running bridge.
    pub async fn registry(&self) -> Option<Arc<RouteRegistry>> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|bridge| bridge.registry.clone())
    }

    /// Topics clients may subscribe to, optionally limited to one scope.
    pub async fn list_advertised_topics(&self, scope_filter: Option<&str>) -> BTreeSet<String> {
        self.registry()
            .await
            .map(|registry| registry.all_topics(scope_filter))
            .unwrap_or_default()
    }

    pub async fn describe_topics(&self, scope_filter: Option<&str>) -> BridgeTopics {
        let endpoints = if self.broker.is_started() {
            self.broker
                .acceptors()
                .into_iter()
                .filter(|acceptor| acceptor.is_network())
                .map(|acceptor| acceptor.params)
                .collect()
        } else {
            Vec::new()
        };

        BridgeTopics {
            endpoints,
            protocols: self.broker.protocols(),
            topics: self.list_advertised_topics(scope_filter).await,
        }
    }
}

fn log_stop_step<E: Display>(step: &'static str, result: Result<(), E>) {
    if let Err(err) = result {
        warn!(
            event = events::BRIDGE_STOP_STEP_FAILED,
            component = COMPONENT,
            step,
            err = %err,
            "unable to shut down bridge component cleanly"
        );
    }
}
