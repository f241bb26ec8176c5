//! Synthetic payload construction for `/dispatch`'s raw text/markdown body
//! path, merging query and `X-EDI-*` header fallbacks.

use axum::http::HeaderMap;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const RAW_BODY_CONTENT_TYPES: &[&str] = &["text/plain", "text/markdown", "text/x-markdown"];

/// Build the synthetic `{message}` payload for a raw-body dispatch request.
#[must_use]
pub fn synthetic_message_payload(raw_body: &str) -> Value {
    json!({ "message": raw_body })
}

fn first_query_value<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Merge recognized query-string and `X-EDI-*` header parameters into
/// `payload` wherever the corresponding key is absent.
pub fn merge_dispatch_params(payload: &mut Value, query: &HashMap<String, String>, headers: &HeaderMap) {
    let Value::Object(map) = payload else { return };

    merge_agent(map, query, headers);
    merge_thread_id(map, query, headers);
    merge_timeout(map, query, headers);
    merge_workdir(map, query, headers);
    merge_callback(map, query, headers);
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty())
}

fn merge_agent(map: &mut Map<String, Value>, query: &HashMap<String, String>, headers: &HeaderMap) {
    let has_value = map.get("agent").and_then(Value::as_str).is_some_and(|v| !v.is_empty());
    if has_value {
        return;
    }
    if let Some(value) = first_query_value(query, "agent").or_else(|| header_str(headers, "X-EDI-Agent")) {
        let _ = map.insert("agent".to_string(), json!(value));
    }
}

fn merge_thread_id(map: &mut Map<String, Value>, query: &HashMap<String, String>, headers: &HeaderMap) {
    let has_value = map.get("threadId").and_then(Value::as_str).is_some_and(|v| !v.is_empty());
    if has_value {
        return;
    }
    let value = first_query_value(query, "threadId")
        .or_else(|| first_query_value(query, "thread"))
        .or_else(|| header_str(headers, "X-EDI-Thread"));
    if let Some(value) = value {
        let _ = map.insert("threadId".to_string(), json!(value));
    }
}

fn merge_timeout(map: &mut Map<String, Value>, query: &HashMap<String, String>, headers: &HeaderMap) {
    if map.contains_key("timeout") || map.contains_key("timeoutSeconds") {
        return;
    }
    let value = first_query_value(query, "timeout")
        .or_else(|| first_query_value(query, "timeoutSeconds"))
        .or_else(|| header_str(headers, "X-EDI-Timeout"));
    if let Some(value) = value {
        let _ = map.insert("timeout".to_string(), json!(value));
    }
}

fn merge_workdir(map: &mut Map<String, Value>, query: &HashMap<String, String>, headers: &HeaderMap) {
    if map.contains_key("workdir") {
        return;
    }
    let value = first_query_value(query, "workdir").or_else(|| header_str(headers, "X-EDI-Workdir"));
    if let Some(value) = value {
        let _ = map.insert("workdir".to_string(), json!(value));
    }
}

fn merge_callback(map: &mut Map<String, Value>, query: &HashMap<String, String>, headers: &HeaderMap) {
    if map.contains_key("callback") {
        return;
    }
    let value = first_query_value(query, "callbackSessionKey").or_else(|| header_str(headers, "X-EDI-Callback-Session"));
    if let Some(value) = value {
        let _ = map.insert("callback".to_string(), json!({ "sessionKey": value }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_agent_from_header_when_missing() {
        let mut payload = json!({"message": "hi"});
        let query = HashMap::new();
        let mut headers = HeaderMap::new();
        headers.insert("X-EDI-Agent", "codex".parse().unwrap());
        merge_dispatch_params(&mut payload, &query, &headers);
        assert_eq!(payload["agent"], "codex");
    }

    #[test]
    fn query_takes_priority_over_header() {
        let mut payload = json!({"message": "hi"});
        let mut query = HashMap::new();
        query.insert("agent".to_string(), "claude".to_string());
        let mut headers = HeaderMap::new();
        headers.insert("X-EDI-Agent", "codex".parse().unwrap());
        merge_dispatch_params(&mut payload, &query, &headers);
        assert_eq!(payload["agent"], "claude");
    }

    #[test]
    fn does_not_override_existing_value() {
        let mut payload = json!({"message": "hi", "agent": "gemini"});
        let mut query = HashMap::new();
        query.insert("agent".to_string(), "codex".to_string());
        let headers = HeaderMap::new();
        merge_dispatch_params(&mut payload, &query, &headers);
        assert_eq!(payload["agent"], "gemini");
    }

    #[test]
    fn merges_callback_session_key_into_nested_object() {
        let mut payload = json!({"message": "hi"});
        let mut query = HashMap::new();
        query.insert("callbackSessionKey".to_string(), "edi:abcd1234".to_string());
        let headers = HeaderMap::new();
        merge_dispatch_params(&mut payload, &query, &headers);
        assert_eq!(payload["callback"]["sessionKey"], "edi:abcd1234");
    }

    #[test]
    fn synthetic_message_payload_wraps_raw_body() {
        let payload = synthetic_message_payload("do the thing");
        assert_eq!(payload["message"], "do the thing");
    }
}
