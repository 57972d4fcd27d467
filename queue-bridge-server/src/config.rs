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

use queue_bridge::{AcceptorDescriptor, BridgeSettings, ACCEPTOR_HOST_PARAM};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) bridge: BridgeSettings,
    pub(crate) catalog: CatalogConfig,
    pub(crate) broker: BrokerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub(crate) file_path: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub(crate) acceptors: Vec<AcceptorConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct AcceptorConfig {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) host: Option<String>,
    #[serde(default)]
    pub(crate) port: Option<u16>,
    #[serde(default)]
    pub(crate) protocols: Vec<String>,
}

impl AcceptorConfig {
    pub(crate) fn descriptor(&self) -> AcceptorDescriptor {
        let mut descriptor = AcceptorDescriptor::new(&self.name);
        if let Some(host) = &self.host {
            descriptor = descriptor.with_param(ACCEPTOR_HOST_PARAM, host);
        }
        if let Some(port) = self.port {
            descriptor = descriptor.with_param("port", &port.to_string());
        }
        if !self.protocols.is_empty() {
            descriptor = descriptor.with_param("protocols", &self.protocols.join(","));
        }
        descriptor
    }
}
