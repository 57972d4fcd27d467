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

use serde_json::{Map, Value};

/// Body of a message dequeued from an upstream queue.
#[derive(Clone, Debug, PartialEq)]
pub enum QueueMessageBody {
    /// Name/value message, relayed downstream as a JSON object.
    Map(Map<String, Value>),
    /// Text message, relayed downstream unchanged.
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueueMessage {
    id: Option<String>,
    body: QueueMessageBody,
}

impl QueueMessage {
    pub fn map(entries: Map<String, Value>) -> Self {
        Self {
            id: None,
            body: QueueMessageBody::Map(entries),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            id: None,
            body: QueueMessageBody::Text(body.into()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn body(&self) -> &QueueMessageBody {
        &self.body
    }

    /// Renders the payload published on downstream topics.
    pub fn to_json_payload(&self) -> Result<String, serde_json::Error> {
        match &self.body {
            QueueMessageBody::Map(entries) => serde_json::to_string(entries),
            QueueMessageBody::Text(text) => Ok(text.clone()),
        }
    }
}
