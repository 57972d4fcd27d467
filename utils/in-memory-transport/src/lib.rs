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

//! In-process transports for running and testing the queue bridge.
//!
//! Every component can share a [`CallLog`] so tests can assert on the order in
//! which the bridge drives its collaborators.

mod broker;
mod call_log;
mod queue_source;
mod topic_sink;

pub use broker::{InMemoryBroker, SubscribeError};
pub use call_log::CallLog;
pub use queue_source::InMemoryQueueSource;
pub use topic_sink::InMemoryTopicSink;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
