use std::fmt;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Url,
};

use crate::{NetworkError, Result};

/// HTTP method supported by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Outgoing request value.
///
/// Rewriting methods consume `self` and return the new value, so a copy
/// held by the caller is never altered. Header names are case-insensitive.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Builds a request without headers or body.
    ///
    /// Fails with [`NetworkError::InvalidUrl`] when `url` does not parse.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|err| NetworkError::InvalidUrl(format!("{url}: {err}")))?;
        Ok(Self {
            url,
            method,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &str, body: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self::new(Method::Post, url)?.with_body(body))
    }

    /// Sets a header, replacing any existing value under the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = encode_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets every header from `pairs`; later duplicates win.
    pub fn with_headers<I, K, V>(self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .try_fold(self, |request, (name, value)| {
                request.with_header(name.as_ref(), value.as_ref())
            })
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns a header value as text, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

fn encode_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| NetworkError::InvalidHeader(format!("name '{name}': {err}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|err| NetworkError::InvalidHeader(format!("value for '{name}': {err}")))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::{Method, Request};
    use crate::NetworkError;

    #[test]
    fn unparseable_url_is_rejected_before_dispatch() {
        let err = Request::get("not a url").expect_err("must reject");
        assert!(matches!(err, NetworkError::InvalidUrl(_)));
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let request = Request::get("https://api.example.com/items/1")
            .and_then(|r| r.with_headers([("X-Trace-Id", "a"), ("x-trace-id", "b")]))
            .expect("request must build");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("X-TRACE-ID"), Some("b"));
    }

    #[test]
    fn invalid_header_is_rejected() {
        let err = Request::get("https://api.example.com")
            .and_then(|r| r.with_header("bad header", "v"))
            .expect_err("must reject");
        assert!(matches!(err, NetworkError::InvalidHeader(_)));
    }

    #[test]
    fn rewriting_a_clone_leaves_original_untouched() {
        let original = Request::post("https://api.example.com/items", b"{}".to_vec())
            .expect("request must build");
        let rewritten = original
            .clone()
            .with_header("authorization", "Bearer t")
            .expect("header must encode")
            .with_body(b"[]".to_vec());

        assert!(original.headers.is_empty());
        assert_eq!(original.body.as_deref(), Some(&b"{}"[..]));
        assert_eq!(rewritten.body.as_deref(), Some(&b"[]"[..]));
        assert_eq!(rewritten.method, Method::Post);
    }
}
