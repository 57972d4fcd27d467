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

use chrono::{DateTime, Months, Utc};
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// API key the bridge registers for itself and uses on its own broker connection.
#[derive(Clone, Eq, PartialEq)]
pub struct ServiceCredential {
    principal_name: String,
    key_name: String,
    secret: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl ServiceCredential {
    /// Issues a fresh random key valid for `validity_months` from `now`.
    ///
    /// Key names embed the issue time so restarts never collide with keys left
    /// behind by earlier processes.
    pub fn issue(
        principal_name: &str,
        app_prefix: &str,
        validity_months: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = now
            .checked_add_months(Months::new(validity_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            principal_name: principal_name.to_string(),
            key_name: format!(
                "{}_bridge_invm_{}",
                app_prefix.to_lowercase(),
                now.timestamp_millis()
            ),
            secret: Uuid::new_v4().to_string(),
            issued_at: now,
            expires_at,
        }
    }

    pub fn principal_name(&self) -> &str {
        &self.principal_name
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Debug for ServiceCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredential")
            .field("principal_name", &self.principal_name)
            .field("key_name", &self.key_name)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
