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

//! # queue-bridge
//!
//! `queue-bridge` relays messages from transactional upstream queues to a
//! publish/subscribe broker. Queues are discovered once at startup, each one is
//! advertised under one or two topic labels, and a queue is only consumed once
//! a downstream subscriber attaches to one of its topics.
//!
//! Typical usage is centered on [`QueueBridge`]: hand it the catalog, identity
//! store, transports and broker, call [`QueueBridge::start`], and serve
//! [`QueueBridge::describe_topics`] to clients looking for something to
//! subscribe to.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use in_memory_transport::{InMemoryBroker, InMemoryQueueSource, InMemoryTopicSink};
//! use queue_bridge::{BridgeSettings, Credential, QueueBridge, QueueMessage};
//! use static_catalog::StaticCatalog;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let catalog = Arc::new(
//!     StaticCatalog::from_file("../utils/static-catalog/static-configs/catalog.json").unwrap(),
//! );
//! let source = Arc::new(InMemoryQueueSource::new());
//! let sink = Arc::new(InMemoryTopicSink::new());
//! let broker = Arc::new(InMemoryBroker::new());
//!
//! let bridge = QueueBridge::new(
//!     BridgeSettings::default(),
//!     catalog.clone(),
//!     catalog,
//!     source.clone(),
//!     sink.clone(),
//!     broker.clone(),
//! );
//! bridge.start().await.unwrap();
//!
//! let topics = bridge.list_advertised_topics(Some("SPK")).await;
//! assert!(topics.contains("CDA.SPK.ALL"));
//!
//! let reader = Credential::new("reader", "reader-secret");
//! broker.subscribe(&reader, "CDA.SPK.TS_STORED").await.unwrap();
//!
//! source.publish("CWMS_20.SPK_TS_STORED", QueueMessage::text("{\"ts\":1}"));
//! let relayed = sink
//!     .wait_for_payloads("CDA.SPK.ALL", 1, Duration::from_secs(5))
//!     .await;
//! assert_eq!(relayed, vec!["{\"ts\":1}".to_string()]);
//!
//! bridge.stop().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Naming and discovery: catalog query and topic label derivation
//! - Control plane: route registry, topic index and lazy activation
//! - Data plane: transport activation and per-route relay tasks
//! - Access: broker security plugin and the bridge's own service credential
//! - Bridge: startup ordering and best-effort shutdown
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod access;
pub use access::{
    AccessControlGate, AuthFailure, BrokerAction, Credential, IdentityStore, Principal,
    SecurityHook, ServiceCredential,
};

mod bridge;
pub use bridge::{BridgeError, BridgeTopics, QueueBridge};

mod broker;
pub use broker::{AcceptorDescriptor, BrokerHooks, BrokerRuntime, ACCEPTOR_HOST_PARAM};

mod catalog;
pub use catalog::{CatalogQuery, DiscoveryError, QueueCatalog};

mod control_plane;
pub use control_plane::route_activation::{
    ActivationError, LazyActivationController, SubscriberAttachHook,
};
pub use control_plane::route_registry::{Route, RouteRegistry, RouteState};

mod data_plane;

mod error;
pub use error::{BrokerError, CatalogError, IdentityError, IdentityErrorKind, TransportError};

mod message;
pub use message::{QueueMessage, QueueMessageBody};

mod naming;
pub use naming::{durable_subscription_name, upstream_client_id, SourceQueue, TopicNaming, TopicSet};

#[doc(hidden)]
pub mod observability;

mod settings;
pub use settings::BridgeSettings;

mod transport;
pub use transport::{SinkConnector, SinkHandle, SourceConnector, SourceHandle, SourceSubscription};
