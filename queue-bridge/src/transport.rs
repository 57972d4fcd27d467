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

//! Transport adapter seams for the upstream queue source and the downstream broker.
//!
//! Wire protocols stay behind these traits; the bridge only opens, consumes and
//! publishes through them.

use crate::access::ServiceCredential;
use crate::error::TransportError;
use crate::message::QueueMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// How a route consumes its upstream queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceSubscription {
    pub queue_name: String,
    pub durable_subscription_name: String,
    pub client_id: String,
}

/// Consumer opened on a single upstream queue.
#[async_trait]
pub trait SourceHandle: Send {
    /// Waits for the next message. `Ok(None)` means the source was closed.
    async fn receive(&mut self) -> Result<Option<QueueMessage>, TransportError>;

    async fn close(&mut self);
}

/// Upstream connectivity shared by every route.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn open(&self, client_id: &str) -> Result<(), TransportError>;

    async fn connect_source(
        &self,
        subscription: &SourceSubscription,
    ) -> Result<Box<dyn SourceHandle>, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Producer bound to a single downstream topic.
#[async_trait]
pub trait SinkHandle: Send + Sync {
    fn topic(&self) -> &str;

    async fn send(&self, payload: &str) -> Result<(), TransportError>;

    /// Releases the producer. Called once the route no longer publishes through it.
    async fn close(&self);
}

/// Downstream connectivity used by the bridge to publish relayed messages.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    /// Opens the bridge's own broker connection using the service credential.
    async fn open(&self, credential: &ServiceCredential) -> Result<(), TransportError>;

    async fn connect_sink(&self, topic_label: &str) -> Result<Arc<dyn SinkHandle>, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
