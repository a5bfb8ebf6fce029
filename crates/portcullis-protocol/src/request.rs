//! Parsed `app://` requests.

use crate::error::ProtocolError;
use percent_encoding::percent_decode_str;
use portcullis_core::predicates::APP_SCHEME;
use url::Url;

/// Decoded query parameters in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolRequest {
    pub scheme: String,
    /// Host and path joined, without the leading slash (`app://a/b.js` → `a/b.js`).
    pub pathname: String,
    pub query: QueryParams,
}

impl ProtocolRequest {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let url = Url::parse(raw.trim()).map_err(|_| ProtocolError::InvalidUrl(raw.to_string()))?;
        if url.scheme() != APP_SCHEME {
            return Err(ProtocolError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url.host_str().unwrap_or_default();
        let path = url.path().trim_start_matches('/');
        let encoded = match (host.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => host.to_string(),
            (false, false) => format!("{host}/{path}"),
        };
        let pathname = decode_pathname(&encoded)?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            pathname,
            query: QueryParams::from_pairs(url.query_pairs().into_owned()),
        })
    }
}

/// Percent-decode each segment of `encoded`.
///
/// A segment must decode to UTF-8 and may not smuggle in a path separator.
/// Dot segments survive decoding and are left to the containment check.
fn decode_pathname(encoded: &str) -> Result<String, ProtocolError> {
    let segments = encoded
        .split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| ProtocolError::InvalidUrl(encoded.to_string()))?;
            if decoded.contains(['/', '\\']) {
                return Err(ProtocolError::OutsideRoot(encoded.to_string()));
            }
            Ok(decoded.into_owned())
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(segments.join("/"))
}
