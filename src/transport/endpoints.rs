//! # Service call builders and response decoders.
//!
//! ```text
//! subscribe  GET /v2/subscribe/{sub_key}/{channels|,}/0
//!            ?channel-group=..&tt=..&tr=..&filter-expr=..&heartbeat=..&state=..&uuid=..
//!            → {"t": {"t": "<timetoken>", "r": <region>}, "m": [envelope, ..]}
//! leave      GET /v2/presence/sub-key/{sub_key}/channel/{channels|,}/leave
//!            ?channel-group=..&uuid=..
//! heartbeat  GET /v2/presence/sub-key/{sub_key}/channel/{channels|,}/heartbeat
//!            ?channel-group=..&heartbeat=..&state=..&uuid=..
//!            → {"status": 200, ..}
//! ```
//!
//! Channel and group lists are comma-separated; an empty channel list is sent
//! as a single `,`.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::models::{Cursor, Envelope};
use crate::transport::{Operation, Request};

/// Per-client values attached to every service call.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceParams {
    pub subscribe_key: String,
    pub user_id: String,
    pub filter_expression: Option<String>,
    /// Presence timeout announced to the service, in seconds.
    pub presence_timeout: Option<u64>,
    /// Presence state per channel (`{"channel": {..}}`).
    pub state: Option<Value>,
}

/// Decoded subscribe response.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscribeResponse {
    pub cursor: Cursor,
    pub messages: Vec<Envelope>,
}

#[derive(Deserialize)]
struct SubscribeBody {
    t: Cursor,
    #[serde(default)]
    m: Vec<Envelope>,
}

#[derive(Deserialize)]
struct PresenceBody {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

fn csv(items: &BTreeSet<String>) -> String {
    if items.is_empty() {
        ",".to_string()
    } else {
        items.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }
}

fn groups_csv(groups: &BTreeSet<String>) -> Option<String> {
    (!groups.is_empty()).then(|| csv(groups))
}

fn state_json(params: &ServiceParams) -> Option<String> {
    params
        .state
        .as_ref()
        .filter(|state| !state.is_null())
        .map(Value::to_string)
}

/// Builds a subscribe call; `cursor = {0,0}` performs the handshake.
pub fn subscribe_request(
    params: &ServiceParams,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
    cursor: Cursor,
) -> Request {
    Request::get(
        Operation::Subscribe,
        vec![
            "v2".into(),
            "subscribe".into(),
            params.subscribe_key.clone(),
            csv(channels),
            "0".into(),
        ],
    )
    .query_opt("channel-group", groups_csv(groups))
    .query("tt", cursor.timetoken.to_string())
    .query_opt("tr", (cursor.region != 0).then(|| cursor.region.to_string()))
    .query_opt("filter-expr", params.filter_expression.clone())
    .query_opt("heartbeat", params.presence_timeout.map(|t| t.to_string()))
    .query_opt("state", state_json(params))
    .query("uuid", params.user_id.clone())
}

/// Decodes a subscribe response body.
pub fn decode_subscribe(body: Value) -> Result<SubscribeResponse, TransportError> {
    if body.is_null() {
        return Err(TransportError::malformed("empty subscribe response"));
    }
    let body: SubscribeBody =
        serde_json::from_value(body).map_err(|e| TransportError::malformed(e.to_string()))?;
    Ok(SubscribeResponse {
        cursor: body.t,
        messages: body.m,
    })
}

fn presence_path(params: &ServiceParams, channels: &BTreeSet<String>, action: &str) -> Vec<String> {
    vec![
        "v2".into(),
        "presence".into(),
        "sub-key".into(),
        params.subscribe_key.clone(),
        "channel".into(),
        csv(channels),
        action.into(),
    ]
}

/// Builds a presence leave call.
pub fn leave_request(
    params: &ServiceParams,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
) -> Request {
    Request::get(Operation::Leave, presence_path(params, channels, "leave"))
        .query_opt("channel-group", groups_csv(groups))
        .query("uuid", params.user_id.clone())
}

/// Builds a presence heartbeat call.
pub fn heartbeat_request(
    params: &ServiceParams,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
) -> Request {
    Request::get(Operation::Heartbeat, presence_path(params, channels, "heartbeat"))
        .query_opt("channel-group", groups_csv(groups))
        .query_opt("heartbeat", params.presence_timeout.map(|t| t.to_string()))
        .query_opt("state", state_json(params))
        .query("uuid", params.user_id.clone())
}

/// Checks a presence (leave / heartbeat) acknowledgement.
pub fn decode_presence_ack(body: Value) -> Result<(), TransportError> {
    if body.is_null() {
        return Err(TransportError::malformed("empty presence response"));
    }
    let body: PresenceBody =
        serde_json::from_value(body).map_err(|e| TransportError::malformed(e.to_string()))?;
    match body.status {
        Some(200) | None => Ok(()),
        Some(code) => Err(TransportError::Status {
            code,
            message: body.message.unwrap_or_default(),
        }),
    }
}
