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

//! Seam to the embedded downstream broker.

use crate::access::SecurityHook;
use crate::control_plane::route_activation::SubscriberAttachHook;
use crate::error::BrokerError;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Acceptor parameter holding the network host an external client connects to.
pub const ACCEPTOR_HOST_PARAM: &str = "host";

/// Plugins the bridge installs before the broker starts.
#[derive(Clone)]
pub struct BrokerHooks {
    pub security: Arc<dyn SecurityHook>,
    pub subscriber_attach: Arc<dyn SubscriberAttachHook>,
}

/// One listener of the downstream broker.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AcceptorDescriptor {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl AcceptorDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// In-VM acceptors carry no host and are not advertised to external clients.
    pub fn is_network(&self) -> bool {
        self.params.contains_key(ACCEPTOR_HOST_PARAM)
    }
}

/// Lifecycle and introspection of the embedded broker.
#[async_trait]
pub trait BrokerRuntime: Send + Sync {
    /// Installs the security and subscriber-attach plugins. Called once, before [`start`](Self::start).
    fn install_hooks(&self, hooks: BrokerHooks);

    async fn start(&self) -> Result<(), BrokerError>;

    async fn stop(&self) -> Result<(), BrokerError>;

    fn is_started(&self) -> bool;

    fn acceptors(&self) -> Vec<AcceptorDescriptor>;

    fn protocols(&self) -> BTreeSet<String>;
}

#[cfg(test)]
mod tests {
    use super::AcceptorDescriptor;

    #[test]
    fn only_acceptors_with_host_are_network_endpoints() {
        let invm = AcceptorDescriptor::new("invm").with_param("serverId", "0");
        let tcp = AcceptorDescriptor::new("artemis")
            .with_param("host", "0.0.0.0")
            .with_param("port", "61616");

        assert!(!invm.is_network());
        assert!(tcp.is_network());
    }
}
