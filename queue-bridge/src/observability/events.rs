//! Canonical structured event names used across `queue-bridge`.

// Discovery and naming events.
pub const DISCOVERY_START: &str = "discovery_start";
pub const DISCOVERY_OK: &str = "discovery_ok";
pub const DISCOVERY_FAILED: &str = "discovery_failed";
pub const DISCOVERY_DUPLICATE_QUEUE: &str = "discovery_duplicate_queue";
pub const NAMING_FALLBACK_VERBATIM: &str = "naming_fallback_verbatim";

// Route registry and activation events.
pub const ROUTE_REGISTERED: &str = "route_registered";
pub const REGISTRY_BUILD_OK: &str = "registry_build_ok";
pub const ROUTE_ACTIVATE_START: &str = "route_activate_start";
pub const ROUTE_ACTIVATE_OK: &str = "route_activate_ok";
pub const ROUTE_ACTIVATE_NOOP: &str = "route_activate_noop";
pub const ROUTE_ACTIVATE_FAILED: &str = "route_activate_failed";
pub const ROUTE_NOT_FOUND: &str = "route_not_found";
pub const ROUTE_ACTIVATE_REJECTED_SHUTDOWN: &str = "route_activate_rejected_shutdown";
pub const ROUTE_STOP: &str = "route_stop";

// Relay (data plane) events.
pub const RELAY_RECEIVE: &str = "relay_receive";
pub const RELAY_SEND_OK: &str = "relay_send_ok";
pub const RELAY_SEND_FAILED: &str = "relay_send_failed";
pub const RELAY_CONVERT_FAILED: &str = "relay_convert_failed";
pub const RELAY_SOURCE_FAILED: &str = "relay_source_failed";
pub const RELAY_SOURCE_CLOSED: &str = "relay_source_closed";
pub const RELAY_STOPPED: &str = "relay_stopped";

// Access control events.
pub const AUTHENTICATE_OK: &str = "authenticate_ok";
pub const AUTHENTICATE_FAILED: &str = "authenticate_failed";
pub const AUTHORIZE_DENIED: &str = "authorize_denied";

// Lifecycle events.
pub const BRIDGE_START: &str = "bridge_start";
pub const BRIDGE_START_OK: &str = "bridge_start_ok";
pub const BRIDGE_START_FAILED: &str = "bridge_start_failed";
pub const SERVICE_PRINCIPAL_RESOLVED: &str = "service_principal_resolved";
pub const SERVICE_KEY_ISSUED: &str = "service_key_issued";
pub const BRIDGE_STOP: &str = "bridge_stop";
pub const BRIDGE_STOP_STEP_FAILED: &str = "bridge_stop_step_failed";
pub const BRIDGE_STOP_OK: &str = "bridge_stop_ok";
