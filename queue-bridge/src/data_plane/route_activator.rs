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

//! Opens the transports of a route and hands them to a relay worker.

use crate::control_plane::route_registry::Route;
use crate::data_plane::relay_worker::RelayWorker;
use crate::error::TransportError;
use crate::naming::{durable_subscription_name, upstream_client_id};
use crate::transport::{SinkConnector, SinkHandle, SourceConnector, SourceSubscription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) struct RouteActivator {
    source_connector: Arc<dyn SourceConnector>,
    sink_connector: Arc<dyn SinkConnector>,
    application_title: String,
    client_id: String,
    accepting: AtomicBool,
}

impl RouteActivator {
    pub(crate) fn new(
        source_connector: Arc<dyn SourceConnector>,
        sink_connector: Arc<dyn SinkConnector>,
        application_title: &str,
        client_host: &str,
    ) -> Self {
        Self {
            source_connector,
            sink_connector,
            application_title: application_title.to_string(),
            client_id: upstream_client_id(client_host),
            accepting: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Refuses every activation that has not yet claimed its route.
    pub(crate) fn close(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    pub(crate) fn subscription_for(&self, route: &Route) -> SourceSubscription {
        SourceSubscription {
            queue_name: route.id().to_string(),
            durable_subscription_name: durable_subscription_name(
                &self.application_title,
                route.id(),
            ),
            client_id: self.client_id.clone(),
        }
    }

    /// Opens the upstream consumer and one producer per topic, then spawns the relay.
    ///
    /// Nothing is left open when any step fails.
    pub(crate) async fn activate(&self, route: &Route) -> Result<RelayWorker, TransportError> {
        let subscription = self.subscription_for(route);
        let mut source = self
            .source_connector
            .connect_source(&subscription)
            .await?;

        let mut sinks: Vec<Arc<dyn SinkHandle>> = Vec::with_capacity(route.topics().len());
        for topic in route.topics().iter() {
            match self.sink_connector.connect_sink(topic).await {
                Ok(sink) => sinks.push(sink),
                Err(err) => {
                    for sink in &sinks {
                        sink.close().await;
                    }
                    source.close().await;
                    return Err(err);
                }
            }
        }

        Ok(RelayWorker::spawn(route.id(), source, sinks))
    }
}
