//! Building blocks of the request pipeline: API name resolution, the
//! discovery catalog, parameter normalization and envelope decoding.

use crate::error::SynoError::{Api, InvalidResponse, Transport};
use crate::error::Subsystem;
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub const API_PREFIX: &str = "SYNO";
pub const INFO_API: &str = "SYNO.API.Info";
pub const INFO_PATH: &str = "query.cgi";

/// APIs requested together by the one-time discovery query
pub const QUERY_API_LIST: [&str; 5] = [
    "SYNO.API.Info",
    "SYNO.API.Auth",
    "SYNO.DownloadStation.Task",
    "SYNO.DownloadStation.Schedule",
    "SYNO.DownloadStation.Info",
];

/// Response envelope of every Synology API
#[derive(Deserialize, Debug)]
pub struct SynologyResponse<D = Value> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<D>,
    pub error: Option<ErrorBody>,
}

/// Error information from Synology API
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub code: i32,
    #[serde(default)]
    pub errors: Value,
}

/// Discovery metadata of one API
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    pub path: String,
    pub min_version: u32,
    pub max_version: u32,
    #[serde(default)]
    pub request_format: Option<String>,
}

/// Descriptors returned by `SYNO.API.Info`, keyed by fully qualified API name
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct ApiCatalog(HashMap<String, ApiDescriptor>);

impl ApiCatalog {
    #[must_use]
    pub fn get(&self, api_name: &str) -> Option<&ApiDescriptor> {
        self.0.get(api_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Resolves the fully qualified name of `sub_api` within a declared API.
///
/// Without a sub API the declared name itself is the target. Names that
/// already carry the `SYNO.` prefix are returned unchanged.
#[must_use]
pub fn qualify_api_name(declared: &str, sub_api: Option<&str>) -> String {
    match sub_api {
        Some(sub) if is_qualified(sub) => sub.to_string(),
        Some(sub) if !sub.is_empty() => format!("{}.{sub}", with_prefix(declared)),
        _ => with_prefix(declared),
    }
}

fn is_qualified(name: &str) -> bool {
    name.strip_prefix(API_PREFIX)
        .is_some_and(|rest| rest.starts_with('.'))
}

fn with_prefix(name: &str) -> String {
    if is_qualified(name) {
        name.to_string()
    } else {
        format!("{API_PREFIX}.{name}")
    }
}

/// Ordered request parameters; setting an existing key replaces its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter; `None` values are kept as null and dropped on normalization
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layers `self` over `base`: keys present in both take the value from `self`
    #[must_use]
    pub fn merged_over(self, mut base: Params) -> Params {
        for (key, value) in self.0 {
            base.insert(key, value);
        }
        base
    }

    /// Converts every value into its wire representation.
    ///
    /// Booleans become `true`/`false`, nulls are omitted, numbers are sent as
    /// decimal text and arrays or objects as compact JSON.
    #[must_use]
    pub fn normalize(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::Null => return None,
                    Value::Bool(flag) => flag.to_string(),
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    other => other.to_string(),
                };
                Some((key.clone(), value))
            })
            .collect()
    }
}

/// Decodes a raw response into its payload or the subsystem's error.
///
/// The payload is `data` when present, otherwise the `success` flag.
///
/// # Errors
///
/// Returns an error if:
/// - HTTP status is not 200
/// - Body is not a JSON envelope
/// - Envelope carries an error code, resolved through `subsystem`
pub fn decode_envelope(subsystem: Subsystem, status: u16, body: &str) -> Result<Value> {
    if status != 200 {
        return Err(Transport {
            status,
            body: body.to_string(),
        }
        .into());
    }

    let envelope: SynologyResponse = serde_json::from_str(body)
        .map_err(|e| InvalidResponse(format!("Failed to parse API response: {e}")))?;

    let payload = match envelope.data {
        Some(data) if !data.is_null() => data,
        _ => Value::Bool(envelope.success),
    };

    match envelope.error {
        Some(error) => Err(Api {
            code: error.code,
            kind: subsystem.resolve(error.code),
            payload,
        }
        .into()),
        None => Ok(payload),
    }
}
