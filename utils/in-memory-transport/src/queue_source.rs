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
    QueueMessage, SourceConnector, SourceHandle, SourceSubscription, TransportError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

type Delivery = Result<QueueMessage, String>;

struct QueueChannel {
    sender: UnboundedSender<Delivery>,
    receiver: Option<UnboundedReceiver<Delivery>>,
}

impl QueueChannel {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }
}

/// Upstream queues held in memory. Messages published before a route
/// connects are kept, like a durable subscription would.
#[derive(Default)]
pub struct InMemoryQueueSource {
    channels: Mutex<HashMap<String, QueueChannel>>,
    subscriptions: Mutex<Vec<SourceSubscription>>,
    pending_failures: Mutex<HashMap<String, usize>>,
    connect_delay: Mutex<Option<Duration>>,
    client_id: Mutex<Option<String>>,
    fail_open: AtomicBool,
    fail_close: AtomicBool,
    open: AtomicBool,
    call_log: CallLog,
}

impl InMemoryQueueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_log(call_log: CallLog) -> Self {
        Self {
            call_log,
            ..Self::default()
        }
    }

    pub fn publish(&self, queue_name: &str, message: QueueMessage) {
        self.deliver(queue_name, Ok(message));
    }

    /// Queues a receive error on `queue_name`, delivered in order with published messages.
    pub fn fail_next_receive(&self, queue_name: &str, reason: &str) {
        self.deliver(queue_name, Err(reason.to_string()));
    }

    fn deliver(&self, queue_name: &str, delivery: Delivery) {
        let mut channels = lock(&self.channels);
        let channel = channels
            .entry(queue_name.to_string())
            .or_insert_with(QueueChannel::new);
        if channel.sender.send(delivery).is_err() {
            debug!("queue {queue_name} has no consumer; delivery dropped");
        }
    }

    /// Fails the next `count` connection attempts for `queue_name`.
    pub fn fail_next_connects(&self, queue_name: &str, count: usize) {
        lock(&self.pending_failures).insert(queue_name.to_string(), count);
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *lock(&self.connect_delay) = Some(delay);
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Makes `close` report an error. The connection is still marked closed.
    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn connect_count(&self, queue_name: &str) -> usize {
        lock(&self.subscriptions)
            .iter()
            .filter(|subscription| subscription.queue_name == queue_name)
            .count()
    }

    pub fn subscriptions(&self) -> Vec<SourceSubscription> {
        lock(&self.subscriptions).clone()
    }

    pub fn client_id(&self) -> Option<String> {
        lock(&self.client_id).clone()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn take_failure(&self, queue_name: &str) -> bool {
        let mut failures = lock(&self.pending_failures);
        match failures.get_mut(queue_name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl SourceConnector for InMemoryQueueSource {
    async fn open(&self, client_id: &str) -> Result<(), TransportError> {
        self.call_log.record("source.open");
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::new("upstream source refused connection"));
        }
        *lock(&self.client_id) = Some(client_id.to_string());
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn connect_source(
        &self,
        subscription: &SourceSubscription,
    ) -> Result<Box<dyn SourceHandle>, TransportError> {
        let delay = *lock(&self.connect_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.is_open() {
            return Err(TransportError::new("upstream source is not open"));
        }
        if self.take_failure(&subscription.queue_name) {
            return Err(TransportError::new(format!(
                "unable to consume {}",
                subscription.queue_name
            )));
        }

        let receiver = {
            let mut channels = lock(&self.channels);
            let channel = channels
                .entry(subscription.queue_name.clone())
                .or_insert_with(QueueChannel::new);
            match channel.receiver.take() {
                Some(receiver) => receiver,
                None => {
                    let (sender, receiver) = mpsc::unbounded_channel();
                    channel.sender = sender;
                    receiver
                }
            }
        };
        lock(&self.subscriptions).push(subscription.clone());

        Ok(Box::new(InMemorySourceHandle {
            queue_name: subscription.queue_name.clone(),
            receiver,
        }))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.call_log.record("source.close");
        self.open.store(false, Ordering::SeqCst);
        lock(&self.channels).clear();
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::new("upstream connection did not close cleanly"));
        }
        Ok(())
    }
}

struct InMemorySourceHandle {
    queue_name: String,
    receiver: UnboundedReceiver<Delivery>,
}

#[async_trait]
impl SourceHandle for InMemorySourceHandle {
    async fn receive(&mut self) -> Result<Option<QueueMessage>, TransportError> {
        match self.receiver.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(reason)) => Err(TransportError::new(reason)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        debug!("closing consumer on {}", self.queue_name);
        self.receiver.close();
    }
}
