//! Request builder and dispatcher for the photo service.
//!
//! # Design
//! `ApiClient` holds the configuration and a caller-supplied `Transport`
//! behind an `Arc`, so every domain object can keep a cheap handle to it for
//! lazy loads. Each kind of remote call is split into a `build_*` method that
//! produces an `HttpRequest` and a dispatching method that executes it and
//! validates the envelope through `Response::parse`.
//!
//! - read calls go out as GET with a query string;
//! - writes go out as authenticated multipart POSTs to the REST endpoint;
//! - uploads go out as authenticated multipart POSTs carrying the image.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::params::{FilePart, Multipart, Params};
use crate::response::Response;

const METHOD_PREFIX: &str = "flickr.";

/// Whether an upload creates a new photo or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Create,
    Update,
}

/// Clonable handle to the remote service.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("rest_endpoint", &self.inner.config.rest_endpoint)
            .field("authenticated", &self.inner.config.is_authenticated())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport: Box::new(transport),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn build_call(&self, method: &str, params: &Params) -> HttpRequest {
        let mut query = self.base_params(Some(method));
        query.merge(params);
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}?{}", self.inner.config.rest_endpoint, query.to_query()),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_write(&self, method: &str, params: &Params) -> Result<HttpRequest, ApiError> {
        self.require_token(method)?;
        let mut fields = self.base_params(Some(method));
        fields.merge(params);
        Ok(multipart_request(&self.inner.config.rest_endpoint, &fields, None))
    }

    pub fn build_upload(&self, file: &FilePart, kind: UploadKind, params: &Params) -> Result<HttpRequest, ApiError> {
        let endpoint = match kind {
            UploadKind::Create => &self.inner.config.upload_endpoint,
            UploadKind::Update => &self.inner.config.replace_endpoint,
        };
        self.require_token(endpoint)?;
        if kind == UploadKind::Update && !params.contains("photo_id") {
            return Err(ApiError::InvalidParameter("replacing a photo requires photo_id".to_string()));
        }
        let mut fields = self.base_params(None);
        fields.merge(params);
        Ok(multipart_request(endpoint, &fields, Some(file)))
    }

    /// Read-style remote procedure call.
    pub fn call(&self, method: &str, params: &Params) -> Result<Response, ApiError> {
        debug!(method, params = ?params.keys().collect::<Vec<_>>(), "remote call");
        self.dispatch(self.build_call(method, params))
    }

    /// Authenticated write call. The service returns no object state, only
    /// the envelope.
    pub fn write(&self, method: &str, params: &Params) -> Result<Response, ApiError> {
        debug!(method, params = ?params.keys().collect::<Vec<_>>(), "remote write");
        let request = self.build_write(method, params)?;
        self.dispatch(request)
    }

    /// Upload the file at `path`, creating or replacing a photo.
    pub fn upload(&self, path: &Path, kind: UploadKind, params: &Params) -> Result<Response, ApiError> {
        debug!(path = %path.display(), ?kind, "upload");
        let file = FilePart::from_path("photo", path)?;
        let request = self.build_upload(&file, kind, params)?;
        self.dispatch(request)
    }

    fn dispatch(&self, request: HttpRequest) -> Result<Response, ApiError> {
        let response: HttpResponse = self.inner.transport.execute(request)?;
        Response::parse(response)
    }

    fn base_params(&self, method: Option<&str>) -> Params {
        let mut params = Params::new();
        if let Some(method) = method {
            params.insert("method", qualified_method(method));
        }
        params.insert("api_key", self.inner.config.api_key.as_str());
        params.insert_opt("auth_token", self.inner.config.auth_token.as_deref());
        params
    }

    fn require_token(&self, target: &str) -> Result<(), ApiError> {
        if self.inner.config.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::InvalidParameter(format!("{target} requires an auth token")))
        }
    }
}

/// Prefix `method` with the service namespace exactly once.
pub fn qualified_method(method: &str) -> String {
    if method.starts_with(METHOD_PREFIX) {
        method.to_string()
    } else {
        format!("{METHOD_PREFIX}{method}")
    }
}

fn multipart_request(endpoint: &str, fields: &Params, file: Option<&FilePart>) -> HttpRequest {
    let multipart = Multipart::new();
    HttpRequest {
        method: HttpMethod::Post,
        url: endpoint.to_string(),
        headers: vec![("content-type".to_string(), multipart.content_type())],
        body: Some(multipart.encode(fields, file)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records requests and answers each with a fixed body.
    struct Recorder {
        body: String,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for Recorder {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: self.body.clone(),
            })
        }
    }

    fn recorder(body: &str) -> Arc<Recorder> {
        Arc::new(Recorder {
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn client() -> ApiClient {
        ApiClient::new(ClientConfig::new("key"), recorder(r#"<rsp stat="ok"/>"#))
    }

    fn authed_client() -> ApiClient {
        ApiClient::new(ClientConfig::new("key").with_auth_token("tok"), recorder(r#"<rsp stat="ok"/>"#))
    }

    #[test]
    fn build_call_produces_query_request() {
        let req = client().build_call("photos.getInfo", &Params::new().with("photo_id", "42"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://api.flickr.com/services/rest/?method=flickr.photos.getInfo&api_key=key&photo_id=42"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn qualified_method_adds_prefix_once() {
        assert_eq!(qualified_method("people.getInfo"), "flickr.people.getInfo");
        assert_eq!(qualified_method("flickr.people.getInfo"), "flickr.people.getInfo");
    }

    #[test]
    fn auth_token_is_sent_when_configured() {
        let req = authed_client().build_call("photos.getInfo", &Params::new());
        assert!(req.url.contains("auth_token=tok"));
    }

    #[test]
    fn write_requires_token() {
        let err = client().build_write("photos.setTags", &Params::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[test]
    fn build_write_is_multipart_post() {
        let req = authed_client()
            .build_write("photos.setTags", &Params::new().with("photo_id", "1"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.flickr.com/services/rest/");
        assert!(req.header("Content-Type").unwrap().starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains("name=\"method\"\r\n\r\nflickr.photos.setTags\r\n"));
        assert!(body.contains("name=\"photo_id\"\r\n\r\n1\r\n"));
    }

    #[test]
    fn build_upload_targets_endpoint_by_kind() {
        let file = FilePart {
            field: "photo".to_string(),
            file_name: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: b"jpeg".to_vec(),
        };
        let client = authed_client();
        let create = client.build_upload(&file, UploadKind::Create, &Params::new()).unwrap();
        assert_eq!(create.url, "https://api.flickr.com/services/upload/");
        let body = String::from_utf8(create.body.unwrap()).unwrap();
        assert!(!body.contains("name=\"method\""));
        assert!(body.contains("filename=\"a.jpg\""));

        let update = client
            .build_upload(&file, UploadKind::Update, &Params::new().with("photo_id", "7"))
            .unwrap();
        assert_eq!(update.url, "https://api.flickr.com/services/replace/");
    }

    #[test]
    fn replace_without_photo_id_is_rejected() {
        let file = FilePart {
            field: "photo".to_string(),
            file_name: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: Vec::new(),
        };
        let err = authed_client()
            .build_upload(&file, UploadKind::Update, &Params::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[test]
    fn call_dispatches_through_transport() {
        let transport = recorder(r#"<rsp stat="ok"><person nsid="1"/></rsp>"#);
        let client = ApiClient::new(ClientConfig::new("key"), transport.clone());
        let response = client.call("people.getInfo", &Params::new().with("user_id", "1")).unwrap();
        assert!(response.body().contains("person"));
        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn upload_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbour.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let transport = recorder(r#"<rsp stat="ok"><photoid>9</photoid></rsp>"#);
        let client = ApiClient::new(ClientConfig::new("key").with_auth_token("tok"), transport.clone());
        client.upload(&path, UploadKind::Create, &Params::new().with("title", "t")).unwrap();

        let requests = transport.requests.lock().unwrap();
        let body = String::from_utf8_lossy(requests[0].body.as_deref().unwrap()).to_string();
        assert!(body.contains("Content-Type: image/png"));
        assert!(body.contains("png-bytes"));
    }

    #[test]
    fn upload_of_missing_file_is_io_error() {
        let err = authed_client()
            .upload(Path::new("/nonexistent/photo.jpg"), UploadKind::Create, &Params::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
