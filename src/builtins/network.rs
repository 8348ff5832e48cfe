//! Network I/O: open_portal, send_through_portal
//!
//! HTTP requests with a 30 second timeout. The whole interpreter blocks for
//! the duration of a request; DNS lookups in particular cannot be
//! interrupted. Failures surface as `PortalFailure`.

use super::{define_native, expect_scroll};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Value};
use std::rc::Rc;
use std::time::Duration;

const PORTAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs an HTTP GET and returns the response body as a scroll.
pub fn builtin_open_portal(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let url = expect_scroll("open_portal", args, 0)?;

    let response = ureq::get(url)
        .timeout(PORTAL_TIMEOUT)
        .call()
        .map_err(|e| HexError::portal(format!("Could not open portal to '{}': {}", url, e)))?;
    response
        .into_string()
        .map(Value::Str)
        .map_err(|e| HexError::portal(format!("Portal response unreadable: {}", e)))
}

/// Performs an HTTP POST with a text body and returns the response body.
pub fn builtin_send_through_portal(
    _realm: &mut Realm,
    args: &[Value],
) -> Result<Value, HexError> {
    let url = expect_scroll("send_through_portal", args, 0)?;
    let body = args[1].to_text();

    let response = ureq::post(url)
        .timeout(PORTAL_TIMEOUT)
        .send_string(&body)
        .map_err(|e| HexError::portal(format!("Could not send through portal to '{}': {}", url, e)))?;
    response
        .into_string()
        .map(Value::Str)
        .map_err(|e| HexError::portal(format!("Portal response unreadable: {}", e)))
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "open_portal", Arity::Exact(1), builtin_open_portal);
    define_native(
        env,
        "send_through_portal",
        Arity::Exact(2),
        builtin_send_through_portal,
    );
}
