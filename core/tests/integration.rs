//! End-to-end run against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives the domain types over
//! real HTTP through a ureq-backed `Transport`, so request building, the
//! multipart encoder and envelope parsing are checked against an actual
//! server rather than canned strings.

use photo_api::{
    ApiClient, ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, Photo, Place, Resource, ResourceUrl,
    Transport, UploadOptions,
};

/// Executes requests with ureq, returning non-2xx statuses as data so the
/// core interprets them itself.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match (req.method, req.body) {
            (HttpMethod::Get, _) => self.agent.get(&req.url).call(),
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&req.url);
                for (name, value) in &req.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(&body.unwrap_or_default()[..])
            }
        };
        let mut response = result.map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn photo_lifecycle() {
    let base_url = start_server();
    let config = ClientConfig::new("key").with_auth_token("token").with_base_url(&base_url);
    let client = ApiClient::new(config, UreqTransport::new());

    // Step 1: fetch the photo and read mapped attributes.
    let mut photo = Photo::find_by_id(&client, "2924549350").unwrap();
    assert_eq!(photo.title(), Some("Creels at dusk"));
    assert_eq!(photo.owner_id(), Some("43955217@N05"));

    // Step 2: tags load lazily from the server's tag store.
    assert_eq!(photo.tags().unwrap(), Some("harbour creels"));

    // Step 3: replacing tags goes out as a multipart write and invalidates
    // the cached value.
    photo.set_tags(&["dusk", "fishing boats"]).unwrap();
    assert_eq!(photo.tags().unwrap(), Some("dusk fishingboats"));

    // Step 4: associations.
    assert_eq!(photo.owner().unwrap().username(), Some("reagent"));
    assert_eq!(photo.images().unwrap().len(), 6);
    assert_eq!(photo.previous().unwrap().and_then(|p| p.id().map(str::to_string)).as_deref(), Some("2924549351"));

    // Step 5: upload a file and get the full record back.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("creels.jpg");
    std::fs::write(&path, b"jpeg-bytes").unwrap();
    let uploaded = Photo::upload(&client, &path, &UploadOptions::default()).unwrap();
    assert_eq!(uploaded.id(), Some("2924549350"));
}

#[test]
fn urls_and_places_resolve() {
    let base_url = start_server();
    let client = ApiClient::new(ClientConfig::new("key").with_base_url(&base_url), UreqTransport::new());

    let mut url = ResourceUrl::parse("https://www.flickr.com/photos/reagent/").unwrap();
    match url.resource(&client).unwrap() {
        Resource::Photos(photos) => assert_eq!(photos.len(), 3),
        other => panic!("unexpected resource: {other:?}"),
    }

    let mut places = Place::find_all_by_query(&client, "Wellington").unwrap();
    assert_eq!(places.len(), 2);
    assert_eq!(places[0].country().unwrap().and_then(Place::name), Some("New Zealand"));
}

#[test]
fn remote_failures_are_typed() {
    let base_url = start_server();
    let client = ApiClient::new(ClientConfig::new("key").with_base_url(&base_url), UreqTransport::new());

    let err = Photo::find_by_id(&client, "1").unwrap_err();
    assert!(matches!(err, ApiError::Remote { ref code, .. } if code == "1"));

    let anonymous = ApiClient::new(ClientConfig::new("").with_base_url(&base_url), UreqTransport::new());
    let err = Photo::find_by_id(&anonymous, "2924549350").unwrap_err();
    assert!(matches!(err, ApiError::Remote { ref code, .. } if code == "100"));
}
