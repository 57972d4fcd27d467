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

//! Upstream queue discovery.

use crate::error::CatalogError;
use crate::naming::{SourceQueue, TopicNaming};
use crate::observability::events;
use async_trait::async_trait;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{error, info, warn};

const COMPONENT: &str = "queue_catalog";

/// Read access to the upstream database catalog.
#[async_trait]
pub trait CatalogQuery: Send + Sync {
    /// Lists qualified queue names (`<owner>.<name>`) for one owner and queue kind.
    async fn list_queues(&self, owner: &str, kind: &str) -> Result<Vec<String>, CatalogError>;

    /// Name of the principal the catalog connection is operating as.
    async fn current_principal(&self) -> Result<String, CatalogError>;
}

/// Discovery failure. Always fatal to startup.
#[derive(Debug)]
pub enum DiscoveryError {
    QueryFailed {
        owner: String,
        kind: String,
        source: CatalogError,
    },
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::QueryFailed { owner, kind, .. } => {
                write!(f, "unable to discover {kind} queues owned by {owner}")
            }
        }
    }
}

impl Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiscoveryError::QueryFailed { source, .. } => Some(source),
        }
    }
}

/// Builds typed queue descriptors from one catalog query.
pub struct QueueCatalog {
    query: Arc<dyn CatalogQuery>,
    naming: TopicNaming,
    owner: String,
    kind: String,
}

impl QueueCatalog {
    pub fn new(query: Arc<dyn CatalogQuery>, naming: TopicNaming, owner: &str, kind: &str) -> Self {
        Self {
            query,
            naming,
            owner: owner.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Returns every distinct queue in first-seen order, or fails as a whole.
    pub async fn discover(&self) -> Result<Vec<SourceQueue>, DiscoveryError> {
        info!(
            event = events::DISCOVERY_START,
            component = COMPONENT,
            owner = self.owner.as_str(),
            kind = self.kind.as_str(),
            "discovering upstream queues"
        );

        let names = match self.query.list_queues(&self.owner, &self.kind).await {
            Ok(names) => names,
            Err(err) => {
                error!(
                    event = events::DISCOVERY_FAILED,
                    component = COMPONENT,
                    owner = self.owner.as_str(),
                    kind = self.kind.as_str(),
                    err = %err,
                    "queue discovery failed"
                );
                return Err(DiscoveryError::QueryFailed {
                    owner: self.owner.clone(),
                    kind: self.kind.clone(),
                    source: err,
                });
            }
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut queues = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.clone()) {
                warn!(
                    event = events::DISCOVERY_DUPLICATE_QUEUE,
                    component = COMPONENT,
                    queue = name.as_str(),
                    "catalog reported queue more than once"
                );
                continue;
            }
            queues.push(self.naming.source_queue(&name));
        }

        info!(
            event = events::DISCOVERY_OK,
            component = COMPONENT,
            owner = self.owner.as_str(),
            queue_count = queues.len(),
            "discovered upstream queues"
        );
        Ok(queues)
    }
}
