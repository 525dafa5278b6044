//! The request view handed to middleware and handlers.

use {
    super::params::Params,
    crate::{Result, utils::normalize_path},
    axum::{body::Bytes, extract::ConnectInfo},
    http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts},
    serde::de::DeserializeOwned,
    serde_json::Value,
    std::net::{IpAddr, SocketAddr},
};

/// An inbound request as seen by the dispatch layer.
///
/// Build one with [`Request::new`] (tests, embedding) or let the HTTP host
/// build it from an incoming `http::Request`. During dispatch the
/// dispatcher fills in the route parameters; middleware and handlers only
/// ever see it by shared reference.
///
/// ```
/// use kiwi_dispatch::Request;
///
/// let request = Request::new("POST", "/orders?page=2")
///     .with_header("content-type", "application/json")
///     .with_body(r#"{"name":"tea"}"#);
///
/// assert_eq!(request.path(), "/orders");
/// assert_eq!(request.query_param("page").as_deref(), Some("2"));
/// assert_eq!(request.json_body()["name"], "tea");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    path: String,
    query: Option<String>,
    scheme: Option<String>,
    authority: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: Params,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Creates a request from a method and a target. Anything after `?` in
    /// `target` becomes the raw query string; the rest is normalized.
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        Self {
            method: method.into(),
            path: normalize_path(path),
            query,
            scheme: None,
            authority: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: Params::new(),
            remote_addr: None,
        }
    }

    /// Creates a request from `http` request parts and an already collected body.
    ///
    /// The peer address is taken from axum's `ConnectInfo<SocketAddr>`
    /// extension when the server was started with connect info.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self {
            method: parts.method.as_str().to_string(),
            path: normalize_path(parts.uri.path()),
            query: parts.uri.query().map(str::to_string),
            scheme: parts.uri.scheme_str().map(str::to_string),
            authority: parts.uri.authority().map(|a| a.as_str().to_string()),
            headers: parts.headers.clone(),
            body,
            params: Params::new(),
            remote_addr: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        }
    }

    /// Adds a header. Invalid names or values are dropped with a warning.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::try_from(name),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(name, "Ignoring invalid request header"),
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The normalized request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All route parameters, as left by the last middleware stage.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// The raw query string, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Decoded query parameters in order of appearance.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first decoded value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query_params()
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value by case-insensitive name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH.as_str())
            .and_then(|value| value.trim().parse().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header(header::USER_AGENT.as_str())
    }

    /// True when `X-Requested-With` is `XMLHttpRequest` (any case).
    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with")
            .is_some_and(|value| value.eq_ignore_ascii_case("xmlhttprequest"))
    }

    pub fn referrer(&self) -> Option<&str> {
        self.header(header::REFERER.as_str())
    }

    /// The entries of `Accept-Language` in the order the client sent them,
    /// quality suffixes included.
    pub fn languages(&self) -> Vec<String> {
        self.header(header::ACCEPT_LANGUAGE.as_str())
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|lang| !lang.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The peer address of the connection, when the host knows it.
    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.remote_addr.map(|addr| addr.ip())
    }

    /// `Host` header, falling back to the authority of an absolute URI.
    pub fn host(&self) -> Option<&str> {
        self.header(header::HOST.as_str()).or(self.authority.as_deref())
    }

    /// The URI scheme, falling back to `X-Forwarded-Proto` behind a proxy.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme
            .as_deref()
            .or_else(|| self.header("x-forwarded-proto"))
    }

    /// True for `https` requests and for requests addressed to port 443.
    pub fn is_secure(&self) -> bool {
        self.scheme()
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https"))
            || self.host().is_some_and(|host| host.ends_with(":443"))
    }

    /// `scheme://host/path?query`, when both scheme and host are known.
    pub fn url(&self) -> Option<String> {
        let (scheme, host) = (self.scheme()?, self.host()?);
        Some(match &self.query {
            Some(query) => format!("{scheme}://{host}{}?{query}", self.path),
            None => format!("{scheme}://{host}{}", self.path),
        })
    }

    /// The raw request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as a JSON object or array.
    ///
    /// Absent, malformed, or scalar bodies yield an empty object instead
    /// of an error, so handlers can probe fields without a parse step.
    pub fn json_body(&self) -> Value {
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
            _ => Value::Object(Default::default()),
        }
    }

    /// The body deserialized into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// URL-encoded form fields of a POST request; `None` for other methods.
    pub fn form_data(&self) -> Option<Vec<(String, String)>> {
        if self.method != "POST" {
            return None;
        }
        Some(url::form_urlencoded::parse(&self.body).into_owned().collect())
    }

    pub fn form_value(&self, key: &str) -> Option<String> {
        self.form_data()?
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// The values of the required form fields `keys`, in that order.
    ///
    /// All or nothing: `None` when the request carries no form data or any
    /// of the keys is missing. Values are returned decoded but otherwise
    /// unmodified.
    pub fn validate_form(&self, keys: &[&str]) -> Option<Vec<(String, String)>> {
        let form = self.form_data().filter(|form| !form.is_empty())?;
        keys.iter()
            .map(|key| {
                form.iter()
                    .find(|(name, _)| name == key)
                    .map(|(name, value)| (name.clone(), value.clone()))
            })
            .collect()
    }
}
