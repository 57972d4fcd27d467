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

//! Relay task that forwards one upstream queue to its downstream topics.

use crate::message::QueueMessage;
use crate::observability::{events, fields};
use crate::transport::{SinkHandle, SourceHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "relay_worker";

const RECEIVE_RETRY_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const RECEIVE_RETRY_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Owns the spawned relay task of a started route.
pub(crate) struct RelayWorker {
    route_id: String,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RelayWorker {
    pub(crate) fn spawn(
        route_id: &str,
        source: Box<dyn SourceHandle>,
        sinks: Vec<Arc<dyn SinkHandle>>,
    ) -> Self {
        let (shutdown, shutdown_signal) = watch::channel(false);
        let handle = tokio::spawn(Self::relay_loop(
            route_id.to_string(),
            source,
            sinks,
            shutdown_signal,
        ));

        Self {
            route_id: route_id.to_string(),
            shutdown,
            handle,
        }
    }

    /// Signals the relay task and waits for it to close its source and sinks.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            warn!(
                event = events::RELAY_STOPPED,
                component = COMPONENT,
                route_id = self.route_id.as_str(),
                err = %err,
                "relay task ended abnormally"
            );
        }
    }

    /// Consumes until shutdown or until the source reports it was closed.
    ///
    /// Receive errors are treated as transient: the loop waits with an
    /// exponential backoff and polls the source again.
    async fn relay_loop(
        route_id: String,
        mut source: Box<dyn SourceHandle>,
        sinks: Vec<Arc<dyn SinkHandle>>,
        mut shutdown_signal: watch::Receiver<bool>,
    ) {
        let mut backoff = RECEIVE_RETRY_INITIAL_BACKOFF;

        loop {
            tokio::select! {
                _ = shutdown_signal.changed() => {
                    Self::log_shutdown(&route_id);
                    break;
                }
                received = source.receive() => match received {
                    Ok(Some(message)) => {
                        backoff = RECEIVE_RETRY_INITIAL_BACKOFF;
                        Self::relay_message(&route_id, &message, &sinks).await;
                    }
                    Ok(None) => {
                        info!(
                            event = events::RELAY_SOURCE_CLOSED,
                            component = COMPONENT,
                            route_id = route_id.as_str(),
                            "upstream source closed; relay stopping"
                        );
                        break;
                    }
                    Err(err) => {
                        warn!(
                            event = events::RELAY_SOURCE_FAILED,
                            component = COMPONENT,
                            route_id = route_id.as_str(),
                            backoff_ms = backoff.as_millis() as u64,
                            err = %err,
                            "upstream receive failed; retrying"
                        );
                        tokio::select! {
                            _ = shutdown_signal.changed() => {
                                Self::log_shutdown(&route_id);
                                break;
                            }
                            _ = tokio::time::sleep(backoff) => {}
                        }
                        backoff = (backoff * 2).min(RECEIVE_RETRY_MAX_BACKOFF);
                    }
                }
            }
        }

        source.close().await;
        for sink in &sinks {
            sink.close().await;
        }
    }

    fn log_shutdown(route_id: &str) {
        info!(
            event = events::RELAY_STOPPED,
            component = COMPONENT,
            route_id,
            reason = fields::REASON_SHUTDOWN_SIGNAL,
            "relay stopping"
        );
    }

    async fn relay_message(route_id: &str, message: &QueueMessage, sinks: &[Arc<dyn SinkHandle>]) {
        let msg_id = fields::format_message_id(message);

        let payload = match message.to_json_payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    event = events::RELAY_CONVERT_FAILED,
                    component = COMPONENT,
                    route_id,
                    msg_id = msg_id.as_str(),
                    err = %err,
                    "unable to convert upstream message; dropping it"
                );
                return;
            }
        };

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::RELAY_RECEIVE,
                component = COMPONENT,
                route_id,
                msg_id = msg_id.as_str(),
                payload = payload.as_str(),
                "received upstream message"
            );
        }

        for sink in sinks {
            match sink.send(&payload).await {
                Ok(()) => debug!(
                    event = events::RELAY_SEND_OK,
                    component = COMPONENT,
                    route_id,
                    msg_id = msg_id.as_str(),
                    topic = sink.topic(),
                    "relayed message"
                ),
                Err(err) => warn!(
                    event = events::RELAY_SEND_FAILED,
                    component = COMPONENT,
                    route_id,
                    msg_id = msg_id.as_str(),
                    topic = sink.topic(),
                    err = %err,
                    "unable to relay message to topic"
                ),
            }
        }
    }
}
