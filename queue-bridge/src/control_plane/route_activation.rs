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

use crate::control_plane::route_registry::{RouteRegistry, StartFailure, StartOutcome};
use crate::data_plane::route_activator::RouteActivator;
use crate::error::TransportError;
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "route_activation";

/// Why a subscriber attachment could not be served.
#[derive(Debug)]
pub enum ActivationError {
    /// No route advertises the requested topic label.
    RouteNotFound(String),
    /// The bridge is stopping and no longer starts routes.
    ShuttingDown,
    /// A matching route failed to open its transports and remains stopped.
    StartFailed {
        route_id: String,
        source: TransportError,
    },
}

impl ActivationError {
    /// True for the "queue does not exist" outcome reported back to the broker.
    pub fn is_route_not_found(&self) -> bool {
        matches!(self, ActivationError::RouteNotFound(_))
    }
}

impl Display for ActivationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationError::RouteNotFound(topic) => {
                write!(f, "queue does not exist: {topic}")
            }
            ActivationError::ShuttingDown => write!(f, "bridge is shutting down"),
            ActivationError::StartFailed { route_id, .. } => {
                write!(f, "unable to start route {route_id}")
            }
        }
    }
}

impl Error for ActivationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ActivationError::StartFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Broker plugin invoked whenever a downstream consumer attaches to a topic.
#[async_trait]
pub trait SubscriberAttachHook: Send + Sync {
    async fn on_subscriber_attached(&self, topic_label: &str) -> Result<(), ActivationError>;
}

/// Starts the routes behind a topic the first time anyone subscribes to it.
pub struct LazyActivationController {
    registry: Arc<RouteRegistry>,
    activator: Arc<RouteActivator>,
}

impl LazyActivationController {
    pub(crate) fn new(registry: Arc<RouteRegistry>, activator: Arc<RouteActivator>) -> Self {
        Self {
            registry,
            activator,
        }
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// Refuses further activations. Routes already started keep running.
    pub fn shutdown(&self) {
        self.activator.close();
    }

    /// Ensures every route publishing `topic_label` is started.
    ///
    /// Routes are attempted in registry order and the first failure is
    /// returned; routes started before it stay started.
    pub async fn activate_topic(&self, topic_label: &str) -> Result<(), ActivationError> {
        let routes = self.registry.routes_for_topic(topic_label);
        if routes.is_empty() {
            warn!(
                event = events::ROUTE_NOT_FOUND,
                component = COMPONENT,
                topic = topic_label,
                "no route advertises requested topic"
            );
            return Err(ActivationError::RouteNotFound(topic_label.to_string()));
        }

        for route in routes {
            debug!(
                event = events::ROUTE_ACTIVATE_START,
                component = COMPONENT,
                topic = topic_label,
                route_id = route.id(),
                "activating route"
            );

            match route.start_once(&self.activator).await {
                Ok(StartOutcome::Started) => info!(
                    event = events::ROUTE_ACTIVATE_OK,
                    component = COMPONENT,
                    topic = topic_label,
                    route_id = route.id(),
                    "route started"
                ),
                Ok(StartOutcome::AlreadyStarted) => debug!(
                    event = events::ROUTE_ACTIVATE_NOOP,
                    component = COMPONENT,
                    route_id = route.id(),
                    reason = fields::REASON_ALREADY_STARTED,
                    "route already started"
                ),
                Err(StartFailure::ActivationsClosed) => {
                    info!(
                        event = events::ROUTE_ACTIVATE_REJECTED_SHUTDOWN,
                        component = COMPONENT,
                        topic = topic_label,
                        route_id = route.id(),
                        "activation refused during shutdown"
                    );
                    return Err(ActivationError::ShuttingDown);
                }
                Err(StartFailure::Transport(err)) => {
                    warn!(
                        event = events::ROUTE_ACTIVATE_FAILED,
                        component = COMPONENT,
                        topic = topic_label,
                        route_id = route.id(),
                        err = %err,
                        "unable to start route"
                    );
                    return Err(ActivationError::StartFailed {
                        route_id: route.id().to_string(),
                        source: err,
                    });
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SubscriberAttachHook for LazyActivationController {
    async fn on_subscriber_attached(&self, topic_label: &str) -> Result<(), ActivationError> {
        self.activate_topic(topic_label).await
    }
}
