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
use queue_bridge::{ServiceCredential, SinkConnector, SinkHandle, TransportError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct PublishedTopics {
    payloads: Mutex<HashMap<String, Vec<String>>>,
    open_producers: Mutex<Vec<String>>,
}

/// Downstream producer side that records every published payload per topic.
#[derive(Default)]
pub struct InMemoryTopicSink {
    published: Arc<PublishedTopics>,
    connected_topics: Mutex<Vec<String>>,
    failing_topics: Mutex<HashSet<String>>,
    credential: Mutex<Option<ServiceCredential>>,
    fail_open: AtomicBool,
    fail_close: AtomicBool,
    open: AtomicBool,
    call_log: CallLog,
}

impl InMemoryTopicSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_log(call_log: CallLog) -> Self {
        Self {
            call_log,
            ..Self::default()
        }
    }

    pub fn fail_topic(&self, topic_label: &str) {
        lock(&self.failing_topics).insert(topic_label.to_string());
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Makes `close` report an error. The connection is still marked closed.
    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Credential the bridge opened its downstream connection with.
    pub fn credential(&self) -> Option<ServiceCredential> {
        lock(&self.credential).clone()
    }

    pub fn connected_topics(&self) -> Vec<String> {
        lock(&self.connected_topics).clone()
    }

    /// Topics whose producer has been created and not yet closed.
    pub fn open_producers(&self) -> Vec<String> {
        lock(&self.published.open_producers).clone()
    }

    pub fn payloads(&self, topic_label: &str) -> Vec<String> {
        lock(&self.published.payloads)
            .get(topic_label)
            .cloned()
            .unwrap_or_default()
    }

    /// Polls until `topic_label` holds at least `count` payloads or `timeout` elapses.
    pub async fn wait_for_payloads(
        &self,
        topic_label: &str,
        count: usize,
        timeout: Duration,
    ) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let payloads = self.payloads(topic_label);
            if payloads.len() >= count || Instant::now() >= deadline {
                return payloads;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl SinkConnector for InMemoryTopicSink {
    async fn open(&self, credential: &ServiceCredential) -> Result<(), TransportError> {
        self.call_log.record("sink.open");
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::new("downstream broker refused connection"));
        }
        *lock(&self.credential) = Some(credential.clone());
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn connect_sink(&self, topic_label: &str) -> Result<Arc<dyn SinkHandle>, TransportError> {
        if !self.is_open() {
            return Err(TransportError::new("downstream connection is not open"));
        }
        if lock(&self.failing_topics).contains(topic_label) {
            return Err(TransportError::new(format!(
                "unable to create producer for {topic_label}"
            )));
        }

        lock(&self.connected_topics).push(topic_label.to_string());
        lock(&self.published.open_producers).push(topic_label.to_string());
        Ok(Arc::new(InMemorySinkHandle {
            topic: topic_label.to_string(),
            published: self.published.clone(),
        }))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.call_log.record("sink.close");
        self.open.store(false, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::new("downstream connection did not close cleanly"));
        }
        Ok(())
    }
}

struct InMemorySinkHandle {
    topic: String,
    published: Arc<PublishedTopics>,
}

#[async_trait]
impl SinkHandle for InMemorySinkHandle {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&self, payload: &str) -> Result<(), TransportError> {
        lock(&self.published.payloads)
            .entry(self.topic.clone())
            .or_default()
            .push(payload.to_string());
        Ok(())
    }

    async fn close(&self) {
        let mut producers = lock(&self.published.open_producers);
        if let Some(position) = producers.iter().position(|topic| *topic == self.topic) {
            producers.remove(position);
        }
    }
}
