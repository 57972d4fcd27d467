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

//! Route data model and the topic-label index built from discovery.

use crate::data_plane::relay_worker::RelayWorker;
use crate::data_plane::route_activator::RouteActivator;
use crate::error::TransportError;
use crate::naming::{SourceQueue, TopicNaming, TopicSet};
use crate::observability::{events, fields};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const COMPONENT: &str = "route_registry";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteState {
    Stopped,
    Started,
}

/// Result of a start request that did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StartOutcome {
    Started,
    AlreadyStarted,
}

/// Failure of a start request. The route stays [`RouteState::Stopped`].
#[derive(Debug)]
pub(crate) enum StartFailure {
    ActivationsClosed,
    Transport(TransportError),
}

/// Binding of one upstream queue to its downstream topics.
///
/// Identity is the raw queue name. The relay slot doubles as the per-route
/// activation guard: whoever holds it is the only caller allowed to change
/// this route's state.
pub struct Route {
    id: String,
    source: SourceQueue,
    topics: TopicSet,
    started: AtomicBool,
    relay: Mutex<Option<RelayWorker>>,
}

impl Route {
    fn new(source: SourceQueue, topics: TopicSet) -> Self {
        Self {
            id: source.raw_name().to_string(),
            source,
            topics,
            started: AtomicBool::new(false),
            relay: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &SourceQueue {
        &self.source
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub fn state(&self) -> RouteState {
        if self.started.load(Ordering::Acquire) {
            RouteState::Started
        } else {
            RouteState::Stopped
        }
    }

    /// Starts the route unless it already runs.
    ///
    /// Concurrent callers serialize on this route only; the activation side
    /// effect happens at most once.
    pub(crate) async fn start_once(
        &self,
        activator: &RouteActivator,
    ) -> Result<StartOutcome, StartFailure> {
        let mut relay = self.relay.lock().await;
        if relay.is_some() {
            return Ok(StartOutcome::AlreadyStarted);
        }
        if !activator.is_accepting() {
            return Err(StartFailure::ActivationsClosed);
        }

        let worker = activator
            .activate(self)
            .await
            .map_err(StartFailure::Transport)?;
        *relay = Some(worker);
        self.started.store(true, Ordering::Release);
        Ok(StartOutcome::Started)
    }

    pub(crate) async fn stop(&self) {
        let worker = self.relay.lock().await.take();
        if let Some(worker) = worker {
            worker.stop().await;
            self.started.store(false, Ordering::Release);
            info!(
                event = events::ROUTE_STOP,
                component = COMPONENT,
                route_id = self.id.as_str(),
                "route stopped"
            );
        }
    }
}

/// Route arena indexed by topic label. Read-only after [`RouteRegistry::build`].
pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
    index: HashMap<String, Vec<usize>>,
}

impl RouteRegistry {
    /// Builds one dormant route per distinct queue, keeping input order.
    pub fn build(queues: Vec<SourceQueue>, naming: &TopicNaming) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut routes: Vec<Arc<Route>> = Vec::with_capacity(queues.len());
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for queue in queues {
            if !seen.insert(queue.raw_name().to_string()) {
                continue;
            }
            let topics = naming.topics_for(&queue);
            debug!(
                event = events::ROUTE_REGISTERED,
                component = COMPONENT,
                route_id = queue.raw_name(),
                topics = fields::format_topics(&topics).as_str(),
                "registered dormant route"
            );
            let position = routes.len();
            for label in topics.iter() {
                index.entry(label.to_string()).or_default().push(position);
            }
            routes.push(Arc::new(Route::new(queue, topics)));
        }

        info!(
            event = events::REGISTRY_BUILD_OK,
            component = COMPONENT,
            route_count = routes.len(),
            topic_count = index.len(),
            "route registry built"
        );

        Self { routes, index }
    }

    /// Routes publishing `label`; empty when nothing advertises it.
    pub fn routes_for_topic(&self, label: &str) -> Vec<Arc<Route>> {
        self.index
            .get(label)
            .map(|positions| {
                positions
                    .iter()
                    .map(|position| self.routes[*position].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Advertised topics, sorted. With a scope filter, only topics of queues
    /// whose derived scope matches case-insensitively are returned.
    pub fn all_topics(&self, scope_filter: Option<&str>) -> BTreeSet<String> {
        self.routes
            .iter()
            .filter(|route| match scope_filter {
                None => true,
                Some(scope) => route
                    .source()
                    .derived_scope()
                    .is_some_and(|derived| derived.eq_ignore_ascii_case(scope)),
            })
            .flat_map(|route| route.topics().iter().map(str::to_string))
            .collect()
    }

    pub fn route(&self, id: &str) -> Option<Arc<Route>> {
        self.routes.iter().find(|route| route.id() == id).cloned()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Stops every started route. Used only at bridge shutdown.
    pub(crate) async fn stop_all(&self) {
        for route in &self.routes {
            route.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RouteRegistry, RouteState};
    use crate::naming::TopicNaming;
    use std::collections::BTreeSet;

    fn registry(names: &[&str]) -> RouteRegistry {
        let naming = TopicNaming::new("CDA", "OWNER");
        let queues = names.iter().map(|name| naming.source_queue(name)).collect();
        RouteRegistry::build(queues, &naming)
    }

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn build_creates_one_dormant_route_per_queue() {
        let registry = registry(&["OWNER.SPK_TS_STORED", "OWNER.LRL_STATUS", "BADNAME"]);

        let ids: Vec<&str> = registry.routes().map(|route| route.id()).collect();
        assert_eq!(ids, vec!["OWNER.SPK_TS_STORED", "OWNER.LRL_STATUS", "BADNAME"]);
        assert!(registry
            .routes()
            .all(|route| route.state() == RouteState::Stopped));
    }

    #[test]
    fn build_ignores_repeated_queue_names() {
        let registry = registry(&["OWNER.SPK_TS_STORED", "OWNER.SPK_TS_STORED"]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.routes_for_topic("CDA.SPK.ALL").len(), 1);
    }

    #[test]
    fn all_topics_without_filter_lists_every_label() {
        let registry = registry(&["OWNER.SPK_TS_STORED", "OWNER.LRL_STATUS", "BADNAME"]);

        assert_eq!(
            registry.all_topics(None),
            set(&[
                "BADNAME",
                "CDA.LRL.ALL",
                "CDA.LRL.STATUS",
                "CDA.SPK.ALL",
                "CDA.SPK.TS_STORED",
            ])
        );
    }

    #[test]
    fn all_topics_scope_filter_is_case_insensitive_and_skips_verbatim_queues() {
        let registry = registry(&["OWNER.SPK_TS_STORED", "OWNER.LRL_STATUS", "BADNAME"]);

        assert_eq!(
            registry.all_topics(Some("spk")),
            set(&["CDA.SPK.ALL", "CDA.SPK.TS_STORED"])
        );
        assert!(registry.all_topics(Some("BADNAME")).is_empty());
    }

    #[test]
    fn broadcast_topic_resolves_to_every_route_of_the_scope() {
        let registry = registry(&[
            "OWNER.SPK_TS_STORED",
            "OWNER.SPK_STATUS",
            "OWNER.LRL_STATUS",
        ]);

        let ids: Vec<String> = registry
            .routes_for_topic("CDA.SPK.ALL")
            .iter()
            .map(|route| route.id().to_string())
            .collect();
        assert_eq!(ids, vec!["OWNER.SPK_TS_STORED", "OWNER.SPK_STATUS"]);
    }

    #[test]
    fn unknown_topic_resolves_to_no_routes() {
        let registry = registry(&["OWNER.SPK_TS_STORED"]);

        assert!(registry.routes_for_topic("CDA.LRL.TS_STORED").is_empty());
    }

    #[test]
    fn every_advertised_topic_resolves_to_a_route() {
        let registry = registry(&[
            "OWNER.SPK_TS_STORED",
            "OWNER.SPK_ALL",
            "OWNER.LRL_",
            "BADNAME",
            "OTHER.SPK_X",
        ]);

        for topic in registry.all_topics(None) {
            let routes = registry.routes_for_topic(&topic);
            assert!(!routes.is_empty(), "topic {topic} has no route");
            assert!(routes.iter().all(|route| route.topics().contains(&topic)));
        }
    }
}
