use std::collections::HashMap;

use domain_types::errors::{CustomResult, GatewayError};
use error_stack::ResultExt;
use serde::Serialize;

/// Serialize an outbound request to `application/x-www-form-urlencoded`.
/// Unset optional fields are omitted by the request structs themselves.
pub fn encode_form<T: Serialize>(request: &T) -> CustomResult<String, GatewayError> {
    serde_urlencoded::to_string(request).change_context(GatewayError::RequestEncodingFailed)
}

/// A decoded processor payload with case-tolerant lookup.
///
/// Every field is stored under its original-case key and a lower-cased
/// key; keys using the nested bracket syntax additionally get a flattened
/// alias (`add_paydata[x]` -> `add_paydata_x`), and one level of JSON
/// object nesting flattens to `{parent}_{child}`.
#[derive(Debug, Clone, Default)]
pub struct ResponseMap {
    entries: Vec<(String, String)>,
    lookup: HashMap<String, String>,
}

impl ResponseMap {
    /// Accepts either a JSON object or a URL-encoded body. JSON is only
    /// attempted when the trimmed text looks like an object; any parse
    /// failure falls through to URL-decoding.
    pub fn decode(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.starts_with('{') {
            if let Ok(serde_json::Value::Object(object)) = serde_json::from_str(trimmed) {
                return Self::from_json_object(object);
            }
        }
        Self::from_urlencoded(body)
    }

    fn from_urlencoded(body: &str) -> Self {
        let mut map = Self::default();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            map.insert(&key, &value);
        }
        map
    }

    fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut map = Self::default();
        for (key, value) in object {
            match value {
                serde_json::Value::Object(nested) => {
                    for (child_key, child_value) in nested {
                        map.insert(&format!("{key}_{child_key}"), &stringify(&child_value));
                    }
                }
                other => map.insert(&key, &stringify(&other)),
            }
        }
        map
    }

    fn insert(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
        self.lookup.insert(key.to_string(), value.to_string());
        self.lookup.insert(key.to_lowercase(), value.to_string());
        if key.contains('[') {
            let flattened = key.replace('[', "_").replace(']', "");
            self.lookup.insert(flattened.to_lowercase(), value.to_string());
        }
    }

    /// Probe the exact key first, then its lower-cased form.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup
            .get(key)
            .or_else(|| self.lookup.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// First present value among the given key aliases.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The original-case key/value pairs as a plain map.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries.iter().cloned().collect()
    }
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        status: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        txid: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reference: Option<&'static str>,
    }

    #[test]
    fn unset_fields_are_omitted_from_the_body() {
        let body = encode_form(&Sample {
            status: "APPROVED",
            txid: Some("123"),
            reference: None,
        })
        .unwrap();
        assert_eq!(body, "status=APPROVED&txid=123");
    }

    #[test]
    fn round_trip_recovers_values_under_both_casings() {
        let body = "Status=REDIRECT&TxId=9876&RedirectUrl=https%3A%2F%2F3ds.example%2Fauth";
        let map = ResponseMap::decode(body);
        assert_eq!(map.get("Status"), Some("REDIRECT"));
        assert_eq!(map.get("status"), Some("REDIRECT"));
        assert_eq!(map.get("txid"), Some("9876"));
        assert_eq!(map.get("redirecturl"), Some("https://3ds.example/auth"));
    }

    #[test]
    fn json_object_bodies_are_decoded() {
        let map = ResponseMap::decode(r#"{"status": "ERROR", "ErrorCode": 909}"#);
        assert_eq!(map.get("status"), Some("ERROR"));
        assert_eq!(map.get("errorcode"), Some("909"));
    }

    #[test]
    fn nested_json_objects_flatten_one_level() {
        let map =
            ResponseMap::decode(r#"{"status": "ERROR", "error": {"code": "33", "message": "no"}}"#);
        assert_eq!(map.get("error_code"), Some("33"));
        assert_eq!(map.get("error_message"), Some("no"));
    }

    #[test]
    fn malformed_json_falls_through_to_url_decoding() {
        let map = ResponseMap::decode("{status=APPROVED&txid=42");
        assert_eq!(map.get("txid"), Some("42"));
    }

    #[test]
    fn bracket_keys_get_flattened_aliases() {
        let map = ResponseMap::decode("status=OK&add_paydata%5Bsession%5D=blob");
        assert_eq!(map.get("add_paydata[session]"), Some("blob"));
        assert_eq!(map.get("add_paydata_session"), Some("blob"));
    }
}
