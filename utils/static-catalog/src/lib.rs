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

//! File-backed queue catalog and identity store.
//!
//! Stands in for the relational catalog and the authentication subsystem when
//! running the bridge without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use queue_bridge::{
    CatalogError, CatalogQuery, IdentityError, IdentityStore, Principal, ServiceCredential,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, canonicalize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    #[serde(default)]
    pub service_principal: Option<String>,
    #[serde(default)]
    pub queues: Vec<QueueRow>,
    #[serde(default)]
    pub principals: Vec<PrincipalRow>,
}

/// One row of the queue catalog view.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueRow {
    pub owner: String,
    pub name: String,
    pub queue_type: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalRow {
    pub name: String,
    pub secret: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

struct ServiceKey {
    principal_name: String,
    secret: String,
    expires_at: DateTime<Utc>,
}

pub struct StaticCatalog {
    document: CatalogDocument,
    service_keys: Mutex<HashMap<String, ServiceKey>>,
    unavailable: AtomicBool,
}

impl StaticCatalog {
    pub fn from_document(document: CatalogDocument) -> Self {
        Self {
            document,
            service_keys: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn from_json_str(data: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(data)
            .map_err(|e| CatalogError::with_cause("unable to parse catalog JSON", e))?;
        Ok(Self::from_document(document))
    }

    pub fn from_file(static_file: &str) -> Result<Self, CatalogError> {
        let catalog_json_file = PathBuf::from(static_file);
        debug!("catalog_json_file: {catalog_json_file:?}");

        let catalog_json_file = canonicalize(catalog_json_file)
            .map_err(|e| CatalogError::with_cause("static catalog file not found", e))?;
        let data = fs::read_to_string(catalog_json_file)
            .map_err(|e| CatalogError::with_cause("unable to read static catalog file", e))?;

        Self::from_json_str(&data)
    }

    /// Makes every catalog and identity call fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn registered_key_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .service_keys
            .lock()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn ensure_available(&self) -> Result<(), CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CatalogError::new("catalog connection unavailable"))
        } else {
            Ok(())
        }
    }

    fn roles_of(&self, principal_name: &str) -> Vec<String> {
        self.document
            .principals
            .iter()
            .find(|row| row.name == principal_name)
            .map(|row| row.roles.clone())
            .unwrap_or_default()
    }

    fn matches_service_key(&self, principal_name: &str, secret: &str) -> Result<bool, IdentityError> {
        let keys = self
            .service_keys
            .lock()
            .map_err(|_| IdentityError::unavailable("service key table poisoned"))?;
        let now = Utc::now();

        Ok(keys.values().any(|key| {
            key.principal_name == principal_name && key.secret == secret && key.expires_at > now
        }))
    }
}

#[async_trait]
impl CatalogQuery for StaticCatalog {
    async fn list_queues(&self, owner: &str, kind: &str) -> Result<Vec<String>, CatalogError> {
        self.ensure_available()?;

        let names: Vec<String> = self
            .document
            .queues
            .iter()
            .filter(|row| row.owner == owner && row.queue_type == kind)
            .map(|row| format!("{}.{}", row.owner, row.name))
            .collect();
        debug!("list_queues owner={owner} kind={kind} -> {names:?}");
        Ok(names)
    }

    async fn current_principal(&self) -> Result<String, CatalogError> {
        self.ensure_available()?;

        self.document
            .service_principal
            .clone()
            .ok_or_else(|| CatalogError::new("catalog document names no service principal"))
    }
}

#[async_trait]
impl IdentityStore for StaticCatalog {
    async fn validate(&self, principal_name: &str, secret: &str) -> Result<Principal, IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::unavailable("identity store unavailable"));
        }

        if self.matches_service_key(principal_name, secret)? {
            return Ok(Principal::new(principal_name, self.roles_of(principal_name)));
        }

        match self
            .document
            .principals
            .iter()
            .find(|row| row.name == principal_name)
        {
            Some(row) if row.secret == secret => {
                Ok(Principal::new(&row.name, row.roles.iter().cloned()))
            }
            Some(_) => Err(IdentityError::invalid_secret(principal_name)),
            None => Err(IdentityError::unknown_principal(principal_name)),
        }
    }

    async fn register_service_key(&self, credential: &ServiceCredential) -> Result<(), IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::unavailable("identity store unavailable"));
        }

        let mut keys = self
            .service_keys
            .lock()
            .map_err(|_| IdentityError::unavailable("service key table poisoned"))?;
        if keys.contains_key(credential.key_name()) {
            warn!("replacing existing service key {}", credential.key_name());
        }
        keys.insert(
            credential.key_name().to_string(),
            ServiceKey {
                principal_name: credential.principal_name().to_string(),
                secret: credential.secret().to_string(),
                expires_at: credential.expires_at(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StaticCatalog;
    use chrono::{Duration, Utc};
    use queue_bridge::{CatalogQuery, IdentityErrorKind, IdentityStore, ServiceCredential};

    const TESTDATA: &str = "static-configs/catalog.json";

    #[tokio::test]
    async fn lists_only_matching_owner_and_kind_with_duplicates() {
        let catalog = StaticCatalog::from_file(TESTDATA).unwrap();

        let queues = catalog
            .list_queues("CWMS_20", "NORMAL_QUEUE")
            .await
            .unwrap();

        assert_eq!(
            queues,
            vec![
                "CWMS_20.SPK_TS_STORED",
                "CWMS_20.SPK_STATUS",
                "CWMS_20.LRL_STATUS",
                "CWMS_20.LRL_STATUS",
                "CWMS_20.REALTIME_OPS",
            ]
        );
        assert_eq!(catalog.current_principal().await.unwrap(), "CWMS_SVC");
    }

    #[tokio::test]
    async fn missing_file_is_a_catalog_error() {
        assert!(StaticCatalog::from_file("static-configs/does-not-exist.json").is_err());
    }

    #[tokio::test]
    async fn validates_password_principals() {
        let catalog = StaticCatalog::from_file(TESTDATA).unwrap();

        let reader = catalog.validate("reader", "reader-secret").await.unwrap();
        assert!(reader.has_role("CWMS Users"));

        let wrong = catalog.validate("reader", "nope").await.unwrap_err();
        assert_eq!(wrong.kind(), IdentityErrorKind::InvalidSecret);
        let unknown = catalog.validate("ghost", "x").await.unwrap_err();
        assert_eq!(unknown.kind(), IdentityErrorKind::UnknownPrincipal);
    }

    #[tokio::test]
    async fn registered_service_key_validates_until_expiry() {
        let catalog = StaticCatalog::from_file(TESTDATA).unwrap();
        let live = ServiceCredential::issue("CWMS_SVC", "CDA", 3, Utc::now());
        let expired =
            ServiceCredential::issue("CWMS_SVC", "CDA", 1, Utc::now() - Duration::days(90));

        catalog.register_service_key(&live).await.unwrap();
        catalog.register_service_key(&expired).await.unwrap();

        assert!(catalog.validate("CWMS_SVC", live.secret()).await.is_ok());
        assert!(catalog.validate("CWMS_SVC", expired.secret()).await.is_err());
        assert_eq!(catalog.registered_key_names().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_catalog_fails_every_call() {
        let catalog = StaticCatalog::from_file(TESTDATA).unwrap();
        catalog.set_unavailable(true);

        assert!(catalog.list_queues("CWMS_20", "NORMAL_QUEUE").await.is_err());
        assert!(catalog.current_principal().await.is_err());
        assert_eq!(
            catalog
                .validate("reader", "reader-secret")
                .await
                .unwrap_err()
                .kind(),
            IdentityErrorKind::Unavailable
        );
    }
}
