use std::ops::RangeInclusive;

use reqwest::header::HeaderMap;

use crate::TransportError;

/// Response metadata reported by a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: HeaderMap,
}

impl ResponseMeta {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn is_success_in(&self, range: &RangeInclusive<u16>) -> bool {
        range.contains(&self.status)
    }
}

/// Raw result of one transport attempt.
///
/// Any combination of fields may be populated; `response` is absent for
/// pure transport-level failures.
#[derive(Debug, Default)]
pub struct TransportReply {
    pub body: Option<Vec<u8>>,
    pub response: Option<ResponseMeta>,
    pub error: Option<TransportError>,
}

impl TransportReply {
    /// A completed exchange with status and body.
    pub fn ok(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Some(body.into()),
            response: Some(ResponseMeta::new(status)),
            error: None,
        }
    }

    /// A completed exchange with status and no body.
    pub fn status(status: u16) -> Self {
        Self {
            body: None,
            response: Some(ResponseMeta::new(status)),
            error: None,
        }
    }

    /// A transport-level failure with no response.
    pub fn failed(error: impl Into<TransportError>) -> Self {
        Self {
            body: None,
            response: None,
            error: Some(error.into()),
        }
    }
}
