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

use crate::{lock, CallLog};
use async_trait::async_trait;
use queue_bridge::{
    AcceptorDescriptor, ActivationError, BrokerAction, BrokerError, BrokerHooks, BrokerRuntime,
    Credential,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Why a client could not subscribe through the in-memory broker.
#[derive(Debug)]
pub enum SubscribeError {
    NotStarted,
    Unauthorized,
    Activation(ActivationError),
}

impl Display for SubscribeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeError::NotStarted => write!(f, "broker is not started"),
            SubscribeError::Unauthorized => write!(f, "not authorized to consume"),
            SubscribeError::Activation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubscribeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SubscribeError::Activation(err) => Some(err),
            _ => None,
        }
    }
}

/// Embedded broker stand-in that drives the installed hooks the way a real
/// broker would on client connections and consumer creation.
#[derive(Default)]
pub struct InMemoryBroker {
    hooks: Mutex<Option<BrokerHooks>>,
    acceptors: Vec<AcceptorDescriptor>,
    protocols: BTreeSet<String>,
    started: AtomicBool,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
    call_log: CallLog,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_log(mut self, call_log: CallLog) -> Self {
        self.call_log = call_log;
        self
    }

    pub fn with_acceptor(mut self, acceptor: AcceptorDescriptor) -> Self {
        self.acceptors.push(acceptor);
        self
    }

    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocols.insert(protocol.to_string());
        self
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Makes `stop` report an error after it has shut the acceptors down.
    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn has_hooks(&self) -> bool {
        lock(&self.hooks).is_some()
    }

    fn installed_hooks(&self) -> Option<BrokerHooks> {
        lock(&self.hooks).clone()
    }

    /// Runs the security hook for a client attempting `action`.
    pub async fn authorize_client(&self, credential: &Credential, action: BrokerAction) -> bool {
        match self.installed_hooks() {
            Some(hooks) => hooks.security.check(credential, action).await,
            None => false,
        }
    }

    /// Creates a consumer on `topic_label` after checking the client may consume.
    pub async fn subscribe(
        &self,
        credential: &Credential,
        topic_label: &str,
    ) -> Result<(), SubscribeError> {
        if !self.is_started() {
            return Err(SubscribeError::NotStarted);
        }
        if !self.authorize_client(credential, BrokerAction::Consume).await {
            return Err(SubscribeError::Unauthorized);
        }
        self.attach_subscriber(topic_label).await
    }

    /// Fires the subscriber-attach hook without an authorization check.
    pub async fn attach_subscriber(&self, topic_label: &str) -> Result<(), SubscribeError> {
        if !self.is_started() {
            return Err(SubscribeError::NotStarted);
        }
        let Some(hooks) = self.installed_hooks() else {
            return Err(SubscribeError::NotStarted);
        };

        debug!("consumer attaching to {topic_label}");
        hooks
            .subscriber_attach
            .on_subscriber_attached(topic_label)
            .await
            .map_err(SubscribeError::Activation)
    }
}

#[async_trait]
impl BrokerRuntime for InMemoryBroker {
    fn install_hooks(&self, hooks: BrokerHooks) {
        self.call_log.record("broker.install_hooks");
        *lock(&self.hooks) = Some(hooks);
    }

    async fn start(&self) -> Result<(), BrokerError> {
        self.call_log.record("broker.start");
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BrokerError::new("acceptor port already in use"));
        }
        if !self.has_hooks() {
            return Err(BrokerError::new("broker started without security hooks"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BrokerError> {
        self.call_log.record("broker.stop");
        self.started.store(false, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(BrokerError::new("acceptor artemis did not shut down cleanly"));
        }
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn acceptors(&self) -> Vec<AcceptorDescriptor> {
        self.acceptors.clone()
    }

    fn protocols(&self) -> BTreeSet<String> {
        self.protocols.clone()
    }
}
