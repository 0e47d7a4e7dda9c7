//! Merges path parameters, query string and JSON body into the canonical
//! payload of a route.

use crate::errors::GatewayError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Where a logical field may be read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSource {
    /// Captured from the gateway path pattern
    Path,
    /// Query string only, never the body
    QueryOnly,
    /// JSON body only
    BodyOnly,
    /// JSON body, falling back to the query string
    BodyPreferred,
}

impl FieldSource {
    fn reads_body(self) -> bool {
        matches!(self, FieldSource::BodyOnly | FieldSource::BodyPreferred)
    }
}

/// Where a normalized field goes in the downstream call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldTarget {
    /// Substituted into the downstream path template
    Identifier,
    /// Sent as a key of the downstream JSON body
    Body,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    /// Key in the incoming path, query string or body
    pub key: &'static str,
    /// Key in the downstream path template or body
    pub downstream_key: &'static str,
    pub source: FieldSource,
    pub target: FieldTarget,
    pub required: bool,
}

impl FieldSpec {
    const fn new(key: &'static str, source: FieldSource, target: FieldTarget) -> Self {
        FieldSpec {
            key,
            downstream_key: key,
            source,
            target,
            required: false,
        }
    }

    pub const fn path(key: &'static str) -> Self {
        Self::new(key, FieldSource::Path, FieldTarget::Identifier).required()
    }

    pub const fn query(key: &'static str) -> Self {
        Self::new(key, FieldSource::QueryOnly, FieldTarget::Identifier).required()
    }

    pub const fn body(key: &'static str) -> Self {
        Self::new(key, FieldSource::BodyOnly, FieldTarget::Body)
    }

    pub const fn body_preferred(key: &'static str) -> Self {
        Self::new(key, FieldSource::BodyPreferred, FieldTarget::Body)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn identifier(mut self) -> Self {
        self.target = FieldTarget::Identifier;
        self
    }

    pub const fn downstream(mut self, downstream_key: &'static str) -> Self {
        self.downstream_key = downstream_key;
        self
    }
}

/// Raw inputs of one incoming call.
#[derive(Clone, Copy, Debug)]
pub struct RawInput<'a> {
    pub path_params: &'a HashMap<String, String>,
    pub query: &'a HashMap<String, String>,
    pub body: &'a [u8],
}

/// Canonical per-route payload sent downstream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedPayload {
    /// Values substituted into the downstream path, keyed by downstream key
    pub identifiers: BTreeMap<&'static str, String>,
    /// Downstream JSON body, `None` for routes that only identify a resource
    pub body: Option<Map<String, Value>>,
}

/// Parses a URL query string. The first occurrence of a repeated key wins.
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    params
}

/// Parses the request body as a JSON object. An empty body or `null` is no body.
pub fn parse_body(raw: &[u8]) -> Result<Option<Map<String, Value>>, GatewayError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(Value::Null) => Ok(None),
        Ok(_) | Err(_) => Err(GatewayError::BadRequest("Invalid JSON body".to_string())),
    }
}

fn present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Produces the route's payload, or `BadRequest` naming every missing required field.
///
/// This is a pure function of its inputs; nothing is sent until it succeeds.
pub fn normalize(
    fields: &[FieldSpec],
    input: RawInput<'_>,
) -> Result<NormalizedPayload, GatewayError> {
    let reads_body = fields.iter().any(|f| f.source.reads_body());
    let body = if reads_body {
        parse_body(input.body)?
    } else {
        None
    };

    let from_query = |key: &str| {
        input
            .query
            .get(key)
            .filter(|v| !v.is_empty())
            .map(|v| Value::String(v.clone()))
    };
    let from_body = |key: &str| {
        body.as_ref()
            .and_then(|b| b.get(key))
            .filter(|v| present(v))
            .cloned()
    };

    let mut payload = NormalizedPayload::default();
    let mut downstream_body = Map::new();
    let mut missing = Vec::new();

    for field in fields {
        let value = match field.source {
            FieldSource::Path => input
                .path_params
                .get(field.key)
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.clone())),
            FieldSource::QueryOnly => from_query(field.key),
            FieldSource::BodyOnly => from_body(field.key),
            FieldSource::BodyPreferred => from_body(field.key).or_else(|| from_query(field.key)),
        };

        match (field.target, value) {
            (FieldTarget::Identifier, Some(value)) => match identifier_text(&value) {
                Some(text) => {
                    payload.identifiers.insert(field.downstream_key, text);
                }
                None => missing.push(field.key),
            },
            (FieldTarget::Body, Some(value)) => {
                downstream_body.insert(field.downstream_key.to_string(), value);
            }
            (_, None) if field.required => missing.push(field.key),
            (_, None) => {}
        }
    }

    if !missing.is_empty() {
        return Err(GatewayError::missing_parameters(&missing));
    }

    if fields.iter().any(|f| f.target == FieldTarget::Body) {
        payload.body = Some(downstream_body);
    }

    Ok(payload)
}
