use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::TargetId;

/// Requests exchanged between the three contexts.
///
/// The wire shape — an `action` tag plus camelCase fields — is the
/// compatibility contract with the surrounding UI collaborators and must
/// round-trip exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Panel → page script: run a scroll/extract pass.
    #[serde(rename_all = "camelCase")]
    CollectEmails {
        scroll_count: u32,
        scroll_speed: u64,
        exclude_keywords: Vec<String>,
        include_unique: bool,
    },
    /// Panel → page script: forget every address seen so far.
    ClearCache,
    /// Panel → page script: retype the page's search input.
    #[serde(rename_all = "camelCase")]
    UpdateSearchInput { keywords: String },
    /// Panel → background: surface the panel once this target is ready.
    #[serde(rename_all = "camelCase")]
    OpenPopupOnTabReady { tab_id: TargetId },
    /// Generic store proxy write.
    #[serde(rename_all = "camelCase")]
    UpdateState { data: Map<String, Value> },
    /// Generic store proxy read.
    #[serde(rename_all = "camelCase")]
    GetState { keys: Vec<String> },
}

/// Responses, shaped exactly as the requester expects them on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Emails { emails: Vec<String> },
    Ack { success: bool },
    State(Map<String, Value>),
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack { success: true }
    }

    pub fn failed() -> Self {
        Response::Ack { success: false }
    }
}
