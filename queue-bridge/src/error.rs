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

//! Failures reported by the collaborators the bridge is wired to.
//!
//! The catalog, identity store, transports and broker runtime live outside this
//! crate. Their implementations report failures through these types so the
//! bridge can chain them into its own error taxonomy without knowing the
//! concrete driver underneath.

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

type BoxedCause = Box<dyn Error + Send + Sync + 'static>;

fn write_cause(f: &mut Formatter<'_>, cause: &Option<BoxedCause>) -> fmt::Result {
    match cause {
        Some(cause) => write!(f, ": {cause}"),
        None => Ok(()),
    }
}

/// Failure raised by a [`CatalogQuery`](crate::CatalogQuery) implementation.
#[derive(Debug)]
pub struct CatalogError {
    message: String,
    cause: Option<BoxedCause>,
}

impl CatalogError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "catalog query failed: {}", self.message)?;
        write_cause(f, &self.cause)
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

/// Failure raised by an [`IdentityStore`](crate::IdentityStore) implementation.
#[derive(Debug)]
pub struct IdentityError {
    kind: IdentityErrorKind,
    message: String,
}

/// Distinguishes a rejected credential from a store that could not answer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentityErrorKind {
    UnknownPrincipal,
    InvalidSecret,
    Unavailable,
}

impl IdentityError {
    pub fn unknown_principal(principal_name: &str) -> Self {
        Self {
            kind: IdentityErrorKind::UnknownPrincipal,
            message: format!("unknown principal '{principal_name}'"),
        }
    }

    pub fn invalid_secret(principal_name: &str) -> Self {
        Self {
            kind: IdentityErrorKind::InvalidSecret,
            message: format!("invalid secret presented for '{principal_name}'"),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: IdentityErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> IdentityErrorKind {
        self.kind
    }
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "identity store: {}", self.message)
    }
}

impl Error for IdentityError {}

/// Failure raised by a source or sink connector.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    cause: Option<BoxedCause>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "transport failure: {}", self.message)?;
        write_cause(f, &self.cause)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

/// Failure raised by a [`BrokerRuntime`](crate::BrokerRuntime) implementation.
pub struct BrokerError {
    message: String,
}

impl BrokerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Debug for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BrokerError({:?})", self.message)
    }
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "broker runtime failure: {}", self.message)
    }
}

impl Error for BrokerError {}
