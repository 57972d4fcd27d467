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

//! Canonical structured field values and value-format helpers.

use crate::message::QueueMessage;
use crate::naming::TopicSet;

pub const NONE: &str = "none";
pub const REASON_NOT_SERVICE_PRINCIPAL: &str = "not_service_principal";
pub const REASON_NOT_AUTHENTICATED: &str = "not_authenticated";
pub const REASON_MISSING_ROLE: &str = "missing_role";
pub const REASON_ALREADY_STARTED: &str = "already_started";
pub const REASON_SHUTDOWN_SIGNAL: &str = "shutdown_signal";
pub const REASON_PATTERN_MISMATCH: &str = "pattern_mismatch";

/// Renders a topic set as a stable comma-separated list.
pub fn format_topics(topics: &TopicSet) -> String {
    topics.iter().collect::<Vec<_>>().join(",")
}

pub fn format_message_id(message: &QueueMessage) -> String {
    message
        .id()
        .map(str::to_string)
        .unwrap_or_else(|| NONE.to_string())
}

#[cfg(test)]
mod tests {
    use super::{format_message_id, format_topics, NONE};
    use crate::message::QueueMessage;
    use crate::naming::TopicNaming;

    #[test]
    fn format_topics_lists_broadcast_topic_first() {
        let naming = TopicNaming::new("CDA", "OWNER");
        let topics = naming.derive_topics("OWNER.SPK_TS_STORED");

        assert_eq!(format_topics(&topics), "CDA.SPK.ALL,CDA.SPK.TS_STORED");
    }

    #[test]
    fn format_message_id_falls_back_when_absent() {
        let message = QueueMessage::text("payload");

        assert_eq!(format_message_id(&message), NONE);
        assert_eq!(
            format_message_id(&QueueMessage::text("payload").with_id("id-1")),
            "id-1"
        );
    }
}
