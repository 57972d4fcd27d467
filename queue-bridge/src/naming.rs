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

//! Topic naming for upstream queues.
//!
//! A catalog queue name has the shape `<owner>.<SCOPE>_<group>`. Names that
//! match publish to a scope-wide broadcast topic and to a scope+group topic;
//! anything else is published verbatim under its raw name.

use crate::observability::{events, fields};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

const COMPONENT: &str = "naming";
const BROADCAST_GROUP: &str = "ALL";

lazy_static! {
    static ref QUEUE_NAME_PATTERN: Regex =
        Regex::new(r"^(?P<owner>[^.]+)\.(?P<scope>[A-Z]+)_(?P<group>.*)$")
            .expect("queue name pattern must compile");
}

/// An upstream queue as discovered in the catalog.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SourceQueue {
    raw_name: String,
    derived_scope: Option<String>,
    derived_group: Option<String>,
}

impl SourceQueue {
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn derived_scope(&self) -> Option<&str> {
        self.derived_scope.as_deref()
    }

    pub fn derived_group(&self) -> Option<&str> {
        self.derived_group.as_deref()
    }
}

/// The topic labels a single queue is published under.
///
/// Labels keep derivation order (broadcast topic first) and are unique.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TopicSet {
    labels: Vec<String>,
}

impl TopicSet {
    fn from_labels(labels: impl IntoIterator<Item = String>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        Self { labels: unique }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|candidate| candidate == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Derives [`SourceQueue`] descriptors and their [`TopicSet`]s.
///
/// # Examples
///
/// ```
/// use queue_bridge::TopicNaming;
///
/// let naming = TopicNaming::new("CDA", "CWMS_20");
///
/// let topics = naming.derive_topics("CWMS_20.SPK_TS_STORED");
/// assert_eq!(
///     topics.iter().collect::<Vec<_>>(),
///     vec!["CDA.SPK.ALL", "CDA.SPK.TS_STORED"]
/// );
///
/// let verbatim = naming.derive_topics("MYQUEUE");
/// assert_eq!(verbatim.iter().collect::<Vec<_>>(), vec!["MYQUEUE"]);
/// ```
#[derive(Clone, Debug)]
pub struct TopicNaming {
    app_prefix: String,
    queue_owner: String,
}

impl TopicNaming {
    pub fn new(app_prefix: &str, queue_owner: &str) -> Self {
        Self {
            app_prefix: app_prefix.to_string(),
            queue_owner: queue_owner.to_string(),
        }
    }

    /// Parses a raw catalog name. Never fails: non-conforming names keep no
    /// derived scope or group.
    pub fn source_queue(&self, raw_name: &str) -> SourceQueue {
        let captures = QUEUE_NAME_PATTERN
            .captures(raw_name)
            .filter(|captures| &captures["owner"] == self.queue_owner);

        match captures {
            Some(captures) => SourceQueue {
                raw_name: raw_name.to_string(),
                derived_scope: Some(captures["scope"].to_string()),
                derived_group: Some(captures["group"].to_string()),
            },
            None => {
                info!(
                    event = events::NAMING_FALLBACK_VERBATIM,
                    component = COMPONENT,
                    queue = raw_name,
                    reason = fields::REASON_PATTERN_MISMATCH,
                    "queue did not match '<owner>.<SCOPE>_<group>'; topic uses the queue name as-is"
                );
                SourceQueue {
                    raw_name: raw_name.to_string(),
                    derived_scope: None,
                    derived_group: None,
                }
            }
        }
    }

    pub fn topics_for(&self, queue: &SourceQueue) -> TopicSet {
        match (queue.derived_scope(), queue.derived_group()) {
            (Some(scope), Some(group)) => TopicSet::from_labels([
                format!("{}.{scope}.{BROADCAST_GROUP}", self.app_prefix),
                format!("{}.{scope}.{group}", self.app_prefix),
            ]),
            _ => TopicSet::from_labels([queue.raw_name().to_string()]),
        }
    }

    pub fn derive_topics(&self, raw_name: &str) -> TopicSet {
        self.topics_for(&self.source_queue(raw_name))
    }
}

/// Durable subscription name used when consuming `raw_name` upstream.
pub fn durable_subscription_name(application_title: &str, raw_name: &str) -> String {
    format!("{application_title}_{raw_name}")
        .replace(' ', "_")
        .replace('.', "_")
}

/// Upstream client id shared by every durable subscription of this host.
pub fn upstream_client_id(client_host: &str) -> String {
    format!("CDA_{}", client_host.replace(['.', ':', '/'], "_"))
}
