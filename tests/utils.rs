use std::fs;
use wiremock::{Match, Request, ResponseTemplate};

/// # Panics
///
/// Will panic if a file can't be read or missing
#[must_use = "This function returns the body of the file as a string"]
pub fn body_from_file(path: &str) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}

/// JSON response with the body of a fixture file
#[must_use]
pub fn json_response(status: u16, path: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .append_header("content-type", "application/json")
        .set_body_string(body_from_file(path))
}

/// Matches a form encoded request body containing `key=value`
pub struct FormParamExactMatcher(String, String);

/// Shorthand for [`FormParamExactMatcher`]
pub fn form_param<K, V>(key: K, value: V) -> FormParamExactMatcher
where
    K: Into<String>,
    V: Into<String>,
{
    FormParamExactMatcher(key.into(), value.into())
}

impl Match for FormParamExactMatcher {
    fn matches(&self, request: &Request) -> bool {
        form_urlencoded::parse(&request.body)
            .any(|(key, value)| key == self.0.as_str() && value == self.1.as_str())
    }
}
