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

use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_PREFIX: &str = "CDA";
pub const DEFAULT_APPLICATION_TITLE: &str = "CWMS Data API";
pub const DEFAULT_QUEUE_OWNER: &str = "CWMS_20";
pub const DEFAULT_QUEUE_KIND: &str = "NORMAL_QUEUE";
pub const DEFAULT_CONSUME_ROLE: &str = "CWMS Users";
pub const DEFAULT_CLIENT_HOST: &str = "localhost";
pub const DEFAULT_SERVICE_KEY_VALIDITY_MONTHS: u32 = 3;

/// Immutable bridge configuration resolved before [`QueueBridge::start`](crate::QueueBridge::start).
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct BridgeSettings {
    pub app_prefix: String,
    pub application_title: String,
    pub queue_owner: String,
    pub queue_kind: String,
    pub consume_role: String,
    pub client_host: String,
    pub service_key_validity_months: u32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            app_prefix: DEFAULT_APP_PREFIX.to_string(),
            application_title: DEFAULT_APPLICATION_TITLE.to_string(),
            queue_owner: DEFAULT_QUEUE_OWNER.to_string(),
            queue_kind: DEFAULT_QUEUE_KIND.to_string(),
            consume_role: DEFAULT_CONSUME_ROLE.to_string(),
            client_host: DEFAULT_CLIENT_HOST.to_string(),
            service_key_validity_months: DEFAULT_SERVICE_KEY_VALIDITY_MONTHS,
        }
    }
}

impl BridgeSettings {
    pub fn with_queue_owner(mut self, queue_owner: &str) -> Self {
        self.queue_owner = queue_owner.to_string();
        self
    }

    pub fn with_consume_role(mut self, consume_role: &str) -> Self {
        self.consume_role = consume_role.to_string();
        self
    }

    pub fn with_client_host(mut self, client_host: &str) -> Self {
        self.client_host = client_host.to_string();
        self
    }
}
