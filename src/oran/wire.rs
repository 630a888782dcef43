//! O-RAN NEF policy wire model
//!
//! The RIC exposes QoS control as policies over (PLMN, gNB, UE) scopes.
//! Top-level fields are camelCase on the wire; scope and statement keys
//! stay snake_case, as the rApp defines them.

use serde::{Deserialize, Serialize};

/// Radio-side scope a policy applies to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyScope {
    pub mcc: String,
    pub mnc: String,
    pub gnb_length: u32,
    pub gnb_id: u64,
    pub ran_ue_id: String,
    pub flow_id: i64,
}

/// The enforced statement; PRB priority keyed by profile name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub qos_prio: String,
}

/// Policy document submitted to the RIC
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OranPolicy {
    pub policy_type: String,
    pub policy_scope: PolicyScope,
    pub policy_statement: PolicyStatement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_uri: Option<String>,
}

/// Pull the policy identifier out of a RIC response, tolerating the id
/// spellings different rApp versions use.
pub fn policy_id(value: &serde_json::Value) -> Option<String> {
    for key in ["policy_id", "policyId", "id"] {
        match value.get(key) {
            Some(serde_json::Value::String(id)) if !id.is_empty() => return Some(id.clone()),
            Some(serde_json::Value::Number(id)) => return Some(id.to_string()),
            _ => {}
        }
    }
    None
}
