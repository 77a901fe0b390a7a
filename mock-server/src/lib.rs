//! In-process imitation of the photo service's REST/XML API.
//!
//! Read methods answer from the XML fixtures shared with the core's tests.
//! Tags of the one known photo live in an in-memory store, so a write made
//! through `photos.setTags` shows up in a later `tags.getListPhoto`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

/// The only photo the server knows about.
pub const PHOTO_ID: &str = "2924549350";
pub const OWNER_ID: &str = "43955217@N05";

const FIXTURES: &[(&str, &str)] = &[
    ("flickr.photos.getInfo", include_str!("../../fixtures/photos.getInfo.xml")),
    ("flickr.photos.getSizes", include_str!("../../fixtures/photos.getSizes.xml")),
    ("flickr.photos.getContext", include_str!("../../fixtures/photos.getContext.xml")),
    ("flickr.photos.comments.getList", include_str!("../../fixtures/photos.comments.getList.xml")),
    ("flickr.people.getInfo", include_str!("../../fixtures/people.getInfo.xml")),
    ("flickr.people.getPublicPhotos", include_str!("../../fixtures/people.getPublicPhotos.xml")),
    ("flickr.urls.lookupUser", include_str!("../../fixtures/urls.lookupUser.xml")),
    ("flickr.photosets.getList", include_str!("../../fixtures/photosets.getList.xml")),
    ("flickr.photosets.getInfo", include_str!("../../fixtures/photosets.getInfo.xml")),
    ("flickr.photosets.getPhotos", include_str!("../../fixtures/photosets.getPhotos.xml")),
    ("flickr.places.getInfo", include_str!("../../fixtures/places.getInfo.xml")),
    ("flickr.places.find", include_str!("../../fixtures/places.find.xml")),
    ("flickr.places.getPlaceTypes", include_str!("../../fixtures/places.getPlaceTypes.xml")),
    ("flickr.places.tagsForPlace", include_str!("../../fixtures/places.tagsForPlace.xml")),
];
const OK_REPLY: &str = r#"<?xml version="1.0" encoding="utf-8" ?><rsp stat="ok"></rsp>"#;
const UPLOAD_REPLY: &str = include_str!("../../fixtures/upload.xml");
const REPLACE_REPLY: &str = include_str!("../../fixtures/replace.xml");

const WRITE_METHODS: &[&str] = &[
    "flickr.photos.setTags",
    "flickr.photos.addTags",
    "flickr.photos.setMeta",
    "flickr.photos.transform.rotate",
    "flickr.photosets.addPhoto",
];

#[derive(Debug)]
pub struct Store {
    tags: HashMap<String, Vec<String>>,
}

impl Default for Store {
    fn default() -> Self {
        let tags = vec!["harbour".to_string(), "creels".to_string()];
        Self {
            tags: HashMap::from([(PHOTO_ID.to_string(), tags)]),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/services/rest/", get(rest_query).post(rest_form))
        .route("/services/upload/", post(upload))
        .route("/services/replace/", post(replace))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock photo service listening");
    }
    axum::serve(listener, app()).await
}

async fn rest_query(State(db): State<Db>, Query(params): Query<HashMap<String, String>>) -> Response {
    dispatch(&db, &params).await
}

async fn rest_form(State(db): State<Db>, multipart: Multipart) -> Response {
    match form_fields(multipart).await {
        Ok((params, _)) => dispatch(&db, &params).await,
        Err(status) => status.into_response(),
    }
}

async fn upload(multipart: Multipart) -> Response {
    let (params, photo) = match form_fields(multipart).await {
        Ok(fields) => fields,
        Err(status) => return status.into_response(),
    };
    if let Some(failure) = check_credentials(&params, true) {
        return failure;
    }
    match photo {
        Some(bytes) if !bytes.is_empty() => xml(UPLOAD_REPLY.to_string()),
        _ => fail("2", "No photo specified"),
    }
}

async fn replace(multipart: Multipart) -> Response {
    let (params, photo) = match form_fields(multipart).await {
        Ok(fields) => fields,
        Err(status) => return status.into_response(),
    };
    if let Some(failure) = check_credentials(&params, true) {
        return failure;
    }
    if params.get("photo_id").map(String::as_str) != Some(PHOTO_ID) {
        return fail("1", "Photo not found");
    }
    match photo {
        Some(bytes) if !bytes.is_empty() => xml(REPLACE_REPLY.to_string()),
        _ => fail("2", "No photo specified"),
    }
}

/// Text fields of a multipart body, plus the bytes of the `photo` part.
async fn form_fields(mut multipart: Multipart) -> Result<(HashMap<String, String>, Option<Vec<u8>>), StatusCode> {
    let mut params = HashMap::new();
    let mut photo = None;
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            photo = Some(bytes.to_vec());
        } else {
            let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            params.insert(name, value);
        }
    }
    Ok((params, photo))
}

async fn dispatch(db: &Db, params: &HashMap<String, String>) -> Response {
    let method = params.get("method").map(String::as_str).unwrap_or_default();
    debug!(method, "request");
    if let Some(failure) = check_credentials(params, WRITE_METHODS.contains(&method)) {
        return failure;
    }
    let photo_id = params.get("photo_id").map(String::as_str);

    match method {
        "flickr.photos.getInfo" | "flickr.tags.getListPhoto" | "flickr.photos.getSizes" if photo_id != Some(PHOTO_ID) => {
            fail("1", "Photo not found")
        }
        "flickr.tags.getListPhoto" => {
            let store = db.read().await;
            let tags = store.tags.get(PHOTO_ID).map(Vec::as_slice).unwrap_or_default();
            xml(render_tags(tags))
        }
        "flickr.photos.setTags" | "flickr.photos.addTags" => {
            if photo_id != Some(PHOTO_ID) {
                return fail("1", "Photo not found");
            }
            let incoming = split_tags(params.get("tags").map(String::as_str).unwrap_or_default());
            let mut store = db.write().await;
            let tags = store.tags.entry(PHOTO_ID.to_string()).or_default();
            if method == "flickr.photos.setTags" {
                tags.clear();
            }
            tags.extend(incoming);
            xml(OK_REPLY.to_string())
        }
        method if WRITE_METHODS.contains(&method) => {
            xml(OK_REPLY.to_string())
        }
        method => match FIXTURES.iter().find(|(name, _)| *name == method) {
            Some((_, body)) => xml(body.to_string()),
            None => fail("112", &format!("Method \"{method}\" not found")),
        },
    }
}

/// `None` when the call may proceed; otherwise the failure reply.
fn check_credentials(params: &HashMap<String, String>, needs_token: bool) -> Option<Response> {
    if params.get("api_key").map_or(true, |key| key.is_empty()) {
        return Some(fail("100", "Invalid API Key (Key not found)"));
    }
    if needs_token && params.get("auth_token").map_or(true, |token| token.is_empty()) {
        return Some(fail("99", "Insufficient permissions. Method requires write privileges; none granted."));
    }
    None
}

/// Space separated tags; double quotes group multi-word tags.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split('"')
        .enumerate()
        .flat_map(|(i, chunk)| {
            if i % 2 == 1 {
                vec![chunk.trim().to_string()]
            } else {
                chunk.split_whitespace().map(str::to_string).collect()
            }
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn render_tags(tags: &[String]) -> String {
    let mut body = format!(r#"<?xml version="1.0" encoding="utf-8" ?><rsp stat="ok"><photo id="{PHOTO_ID}"><tags>"#);
    for (i, tag) in tags.iter().enumerate() {
        let raw = escape(tag.as_str());
        let normalised = normalise_tag(tag);
        let value = escape(normalised.as_str());
        body.push_str(&format!(
            r#"<tag id="{OWNER_ID}-{PHOTO_ID}-{i}" author="{OWNER_ID}" raw="{raw}" machine_tag="0">{value}</tag>"#
        ));
    }
    body.push_str("</tags></photo></rsp>");
    body
}

/// The service's display form: lower case, alphanumerics only.
fn normalise_tag(tag: &str) -> String {
    tag.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn fail(code: &str, message: &str) -> Response {
    let message = escape(message);
    xml(format!(
        r#"<?xml version="1.0" encoding="utf-8" ?><rsp stat="fail"><err code="{code}" msg="{message}" /></rsp>"#
    ))
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body).into_response()
}
