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

use crate::access::ServiceCredential;
use crate::error::{IdentityError, IdentityErrorKind};
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "access_gate";

/// Operation a client attempts on the downstream broker.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BrokerAction {
    Consume,
    Send,
    Administer,
}

impl Display for BrokerAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerAction::Consume => write!(f, "consume"),
            BrokerAction::Send => write!(f, "send"),
            BrokerAction::Administer => write!(f, "administer"),
        }
    }
}

/// Name/secret pair presented by a connecting client.
#[derive(Clone, Eq, PartialEq)]
pub struct Credential {
    pub principal_name: String,
    pub secret: String,
}

impl Credential {
    pub fn new(principal_name: &str, secret: &str) -> Self {
        Self {
            principal_name: principal_name.to_string(),
            secret: secret.to_string(),
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("principal_name", &self.principal_name)
            .finish_non_exhaustive()
    }
}

/// Identity returned by the identity store for a valid credential.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    pub name: String,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(name: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// External authentication subsystem.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn validate(&self, principal_name: &str, secret: &str)
        -> Result<Principal, IdentityError>;

    /// Stores an API key so `credential` validates as its principal.
    async fn register_service_key(&self, credential: &ServiceCredential)
        -> Result<(), IdentityError>;
}

/// Authentication outcome when a credential is not accepted.
#[derive(Debug)]
pub enum AuthFailure {
    Rejected(IdentityError),
    StoreUnavailable(IdentityError),
}

impl Display for AuthFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::Rejected(_) => write!(f, "credential rejected"),
            AuthFailure::StoreUnavailable(_) => write!(f, "identity store unavailable"),
        }
    }
}

impl Error for AuthFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AuthFailure::Rejected(err) | AuthFailure::StoreUnavailable(err) => Some(err),
        }
    }
}

/// Security plugin installed on the downstream broker.
///
/// Implementations are invoked concurrently from broker threads and must
/// never fail in a way that escapes to the broker.
#[async_trait]
pub trait SecurityHook: Send + Sync {
    async fn authenticate(&self, credential: &Credential) -> Result<Principal, AuthFailure>;

    fn authorize(
        &self,
        principal_name: &str,
        principal: Option<&Principal>,
        action: BrokerAction,
    ) -> bool;

    /// Authenticates and authorizes in one step; every failure is a deny.
    async fn check(&self, credential: &Credential, action: BrokerAction) -> bool {
        match self.authenticate(credential).await {
            Ok(principal) => self.authorize(&credential.principal_name, Some(&principal), action),
            Err(_) => false,
        }
    }
}

/// Stateless publish/administer-vs-subscribe policy.
pub struct AccessControlGate {
    identity_store: Arc<dyn IdentityStore>,
    service_principal: String,
    consume_role: String,
}

impl AccessControlGate {
    pub fn new(
        identity_store: Arc<dyn IdentityStore>,
        service_principal: &str,
        consume_role: &str,
    ) -> Self {
        Self {
            identity_store,
            service_principal: service_principal.to_string(),
            consume_role: consume_role.to_string(),
        }
    }

    pub fn service_principal(&self) -> &str {
        &self.service_principal
    }

    fn is_service_principal(&self, principal_name: &str) -> bool {
        principal_name.eq_ignore_ascii_case(&self.service_principal)
    }

    fn deny(&self, principal_name: &str, action: BrokerAction, reason: &'static str) -> bool {
        info!(
            event = events::AUTHORIZE_DENIED,
            component = COMPONENT,
            principal = principal_name,
            action = %action,
            reason,
            "broker action denied"
        );
        false
    }
}

#[async_trait]
impl SecurityHook for AccessControlGate {
    async fn authenticate(&self, credential: &Credential) -> Result<Principal, AuthFailure> {
        let principal_name = credential.principal_name.as_str();

        match self
            .identity_store
            .validate(principal_name, &credential.secret)
            .await
        {
            Ok(principal) => {
                debug!(
                    event = events::AUTHENTICATE_OK,
                    component = COMPONENT,
                    principal = principal_name,
                    "credential validated"
                );
                Ok(principal)
            }
            Err(err) => {
                warn!(
                    event = events::AUTHENTICATE_FAILED,
                    component = COMPONENT,
                    principal = principal_name,
                    err = %err,
                    "unable to authenticate broker client"
                );
                match err.kind() {
                    IdentityErrorKind::Unavailable => Err(AuthFailure::StoreUnavailable(err)),
                    IdentityErrorKind::UnknownPrincipal | IdentityErrorKind::InvalidSecret => {
                        Err(AuthFailure::Rejected(err))
                    }
                }
            }
        }
    }

    fn authorize(
        &self,
        principal_name: &str,
        principal: Option<&Principal>,
        action: BrokerAction,
    ) -> bool {
        let Some(principal) = principal else {
            return self.deny(principal_name, action, fields::REASON_NOT_AUTHENTICATED);
        };

        match action {
            BrokerAction::Send | BrokerAction::Administer => {
                if self.is_service_principal(principal_name) {
                    true
                } else {
                    self.deny(principal_name, action, fields::REASON_NOT_SERVICE_PRINCIPAL)
                }
            }
            BrokerAction::Consume => {
                if principal.has_role(&self.consume_role) {
                    true
                } else {
                    self.deny(principal_name, action, fields::REASON_MISSING_ROLE)
                }
            }
        }
    }
}
