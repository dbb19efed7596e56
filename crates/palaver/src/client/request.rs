//! Replayable request descriptions.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::auth::AccessToken;
use crate::error::{Error, InvalidInputError};

/// One logical call against the backend.
///
/// Requests are plain data so the client can send them again with a new
/// credential after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    body: RequestBody,
    headers: HeaderMap,
}

/// The payload of a request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a multipart body. The transport picks the content type.
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }

    /// Add an extra header. `Authorization` is always replaced by the stored credential.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Headers sent for this request, in application order: content type,
    /// caller headers, then the bearer credential.
    pub(crate) fn outgoing_headers(&self, token: Option<&AccessToken>) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if !matches!(self.body, RequestBody::Multipart(_)) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers.extend(self.headers.clone());

        if let Some(token) = token {
            let value = HeaderValue::from_str(&token.bearer()).map_err(|e| {
                InvalidInputError::Header {
                    name: AUTHORIZATION.to_string(),
                    reason: e.to_string(),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Build a transport request for `url`.
    pub(crate) fn build(
        &self,
        http: &reqwest::Client,
        url: &str,
        token: Option<&AccessToken>,
    ) -> Result<RequestBuilder, Error> {
        let builder = http
            .request(self.method.clone(), url)
            .headers(self.outgoing_headers(token)?);

        let builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(value)?),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };

        Ok(builder)
    }
}

/// A multipart form kept as plain parts so it can be sent more than once.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone)]
struct MultipartPart {
    name: String,
    content: PartContent,
    file_name: Option<String>,
    mime: Option<String>,
}

#[derive(Debug, Clone)]
enum PartContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: PartContent::Text(value.into()),
            file_name: None,
            mime: None,
        });
        self
    }

    /// Add a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            content: PartContent::Bytes(bytes),
            file_name: Some(file_name.into()),
            mime: mime.map(str::to_string),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn to_form(&self) -> Result<Form, Error> {
        let mut form = Form::new();
        for part in &self.parts {
            let mut built = match &part.content {
                PartContent::Text(value) => Part::text(value.clone()),
                PartContent::Bytes(bytes) => Part::bytes(bytes.clone()),
            };
            if let Some(file_name) = &part.file_name {
                built = built.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                built = built
                    .mime_str(mime)
                    .map_err(|e| InvalidInputError::Multipart {
                        name: part.name.clone(),
                        reason: e.to_string(),
                    })?;
            }
            form = form.part(part.name.clone(), built);
        }
        Ok(form)
    }
}
