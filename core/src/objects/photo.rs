//! Photos: lookup, search, associations and uploads.
//!
//! A photo arrives in two shapes. Listing and search calls return a flat
//! `<photo id="…" title="…" owner="…"/>` element; `photos.getInfo` returns
//! the full record with nested `<owner>`, `<dates>`, `<urls>` and so on. The
//! attribute sources below cover both, and the detail-only fields load
//! lazily through `load_info`.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::client::{ApiClient, UploadKind};
use crate::error::ApiError;
use crate::mapping::{
    attribute_readers, entity::memoize, lazy_readers, EntitySchema, FinderDescriptor, Mapped, MappedEntity, NodePath,
};
use crate::objects::accuracy::Accuracy;
use crate::objects::comment::Comment;
use crate::objects::context::Context;
use crate::objects::image::{Image, Size};
use crate::objects::tag::Tag;
use crate::objects::user::User;
use crate::params::{join_tags, Params};

/// Extra fields requested from `photos.search` so results are close to full.
const SEARCH_EXTRAS: &str = "description,license,date_upload,date_taken,owner_name,icon_server,original_format,\
last_update,geo,tags,machine_tags,o_dims,views,media,path_alias,url_sq,url_t,url_s,url_m,url_o";

static FIND_BY_ID: FinderDescriptor = FinderDescriptor::new("by_id", "photos.getInfo", "photo").using("photo_id");
static FIND_ALL_BY_SET_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_set_id", "photosets.getPhotos", "photoset/photo").using("photoset_id");
static FIND_ALL_BY_USER_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_user_id", "people.getPublicPhotos", "photos/photo").using("user_id");
static FIND_ALL_BY_GROUP_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_group_id", "groups.pools.getPhotos", "photos/photo").using("group_id");
static SEARCH: FinderDescriptor =
    FinderDescriptor::new("search", "photos.search", "photos/photo").with_extra(&[("extras", SEARCH_EXTRAS)]);
static FIND_ALL_BY_LOCATION: FinderDescriptor =
    FinderDescriptor::new("all_by_location", "photos.geo.photosForLocation", "photos/photo");

static SCHEMA: LazyLock<EntitySchema<Photo>> = LazyLock::new(|| {
    EntitySchema::builder("Photo")
        .attribute("id", &["@id", "photoid"])
        .attributes(&["title", "description"])
        .attribute("secret", &["@secret", "photoid@secret"])
        .attribute("posted", &["dates@posted", "@dateupload"])
        .attribute("taken", &["dates@taken", "@datetaken"])
        .attribute("updated", &["dates@lastupdate", "@lastupdate"])
        .attribute("farm_id", &["@farm"])
        .attribute("server_id", &["@server"])
        .attribute("owner_id", &["@owner", "owner@nsid"])
        .attribute("comment_count", &["comments"])
        .attribute("original_secret", &["@originalsecret", "photoid@originalsecret"])
        .attribute("url", &["urls/url"])
        .attribute("tags", &["@tags"])
        .attribute("latitude", &["location@latitude", "@latitude"])
        .attribute("longitude", &["location@longitude", "@longitude"])
        .lazy(
            &["posted", "taken", "updated", "comment_count", "url", "description"],
            "load_info",
            Photo::load_info,
        )
        .lazy(&["tags"], "load_tags", Photo::load_tags)
        .finder(&FIND_BY_ID)
        .finder(&FIND_ALL_BY_SET_ID)
        .finder(&FIND_ALL_BY_USER_ID)
        .finder(&FIND_ALL_BY_GROUP_ID)
        .finder(&SEARCH)
        .finder(&FIND_ALL_BY_LOCATION)
        .build()
});

#[derive(Debug, Clone)]
pub struct Photo {
    client: ApiClient,
    entity: MappedEntity,
    owner: Option<User>,
    context: Option<Context>,
    images: Option<Vec<Image>>,
    comments: Option<Vec<Comment>>,
    tag_list: Option<Vec<Tag>>,
}

impl Mapped for Photo {
    fn schema() -> &'static EntitySchema<Self> {
        &SCHEMA
    }

    fn entity(&self) -> &MappedEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut MappedEntity {
        &mut self.entity
    }

    fn empty(client: &ApiClient) -> Self {
        Self::new(client)
    }
}

impl Photo {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            client: client.clone(),
            entity: MappedEntity::new(),
            owner: None,
            context: None,
            images: None,
            comments: None,
            tag_list: None,
        }
    }

    attribute_readers!(id, title, secret, farm_id, server_id, owner_id, original_secret, latitude, longitude);
    lazy_readers!(posted, taken, updated, comment_count, url, description, tags);

    pub fn find_by_id(client: &ApiClient, id: &str) -> Result<Photo, ApiError> {
        FIND_BY_ID.find_one(client, id)
    }

    pub fn find_all_by_set_id(client: &ApiClient, set_id: &str) -> Result<Vec<Photo>, ApiError> {
        FIND_ALL_BY_SET_ID.find_all(client, Some(set_id), &Params::new())
    }

    pub fn find_all_by_user_id(client: &ApiClient, user_id: &str) -> Result<Vec<Photo>, ApiError> {
        FIND_ALL_BY_USER_ID.find_all(client, Some(user_id), &Params::new())
    }

    pub fn find_all_by_group_id(client: &ApiClient, group_id: &str) -> Result<Vec<Photo>, ApiError> {
        FIND_ALL_BY_GROUP_ID.find_all(client, Some(group_id), &Params::new())
    }

    /// Free-form search; `criteria` are passed through as search parameters.
    pub fn search(client: &ApiClient, criteria: &Params) -> Result<Vec<Photo>, ApiError> {
        SEARCH.find_all(client, None, criteria)
    }

    pub fn find_all_by_location(
        client: &ApiClient,
        latitude: f64,
        longitude: f64,
        accuracy: Accuracy,
    ) -> Result<Vec<Photo>, ApiError> {
        let params = Params::new()
            .with("lat", latitude.to_string())
            .with("lon", longitude.to_string())
            .with("accuracy", accuracy.value().to_string());
        FIND_ALL_BY_LOCATION.find_all(client, None, &params)
    }

    /// Upload a new photo, then fetch its full record.
    pub fn upload(client: &ApiClient, path: &Path, options: &UploadOptions) -> Result<Photo, ApiError> {
        let response = client.upload(path, UploadKind::Create, &options.to_params())?;
        let document = response.document()?;
        let uploaded = Photo::from_node(client, document.root());
        let id = uploaded.id().ok_or_else(|| ApiError::Mapping {
            path: "photoid".to_string(),
        })?;
        Photo::find_by_id(client, id)
    }

    /// Replace this photo's image. The upload reply carries the new secrets,
    /// which are applied locally.
    pub fn replace_with(&mut self, path: &Path) -> Result<&mut Self, ApiError> {
        let params = Params::new().with("photo_id", self.require("id")?);
        let response = self.client.upload(path, UploadKind::Update, &params)?;
        let document = response.document()?;
        self.populate_from(document.root());
        self.images = None;
        Ok(self)
    }

    fn load_info(&mut self) -> Result<(), ApiError> {
        let params = Params::new().with("photo_id", self.require("id")?);
        let response = self.client.call("photos.getInfo", &params)?;
        let document = response.document()?;
        let node = NodePath::parse("photo")
            .first(document.root())
            .ok_or_else(|| ApiError::Mapping { path: "photo".to_string() })?;
        self.populate_from(node);
        Ok(())
    }

    fn load_tags(&mut self) -> Result<(), ApiError> {
        let tags = Tag::find_all_by_photo_id(&self.client, &self.require("id")?)?;
        let values: Vec<&str> = tags.iter().filter_map(Tag::value).collect();
        if !values.is_empty() {
            self.entity.set("tags", values.join(" "));
        }
        self.tag_list = Some(tags);
        Ok(())
    }

    /// Tag values as a list.
    pub fn tag_values(&mut self) -> Result<Vec<String>, ApiError> {
        Ok(self
            .tags()?
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Full tag objects, with author and raw form.
    pub fn tag_list(&mut self) -> Result<&[Tag], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.tag_list, || Tag::find_all_by_photo_id(client, &id)).map(Vec::as_slice)
    }

    /// The user who uploaded this photo.
    pub fn owner(&mut self) -> Result<&User, ApiError> {
        let owner_id = self.require("owner_id")?;
        let client = &self.client;
        memoize(&mut self.owner, || User::find_by_id(client, &owner_id))
    }

    /// Neighbouring photos in the owner's photostream.
    pub fn context(&mut self) -> Result<&Context, ApiError> {
        let params = Params::new().with("photo_id", self.require("id")?);
        let client = &self.client;
        memoize(&mut self.context, || {
            let response = client.call("photos.getContext", &params)?;
            let document = response.document()?;
            Ok(Context::from_node(client, document.root()))
        })
    }

    pub fn previous(&mut self) -> Result<Option<Photo>, ApiError> {
        Ok(self.context()?.previous())
    }

    pub fn next(&mut self) -> Result<Option<Photo>, ApiError> {
        Ok(self.context()?.next())
    }

    pub fn images(&mut self) -> Result<&[Image], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.images, || Image::find_all_by_photo_id(client, &id)).map(Vec::as_slice)
    }

    /// The rendition of the given size, if the service offers one.
    pub fn image(&mut self, size: Size) -> Result<Option<&Image>, ApiError> {
        Ok(self.images()?.iter().find(|image| image.size_kind() == Some(size)))
    }

    pub fn comments(&mut self) -> Result<&[Comment], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.comments, || Comment::find_all_by_photo_id(client, &id)).map(Vec::as_slice)
    }

    pub fn posted_at(&mut self) -> Result<Option<DateTime<Utc>>, ApiError> {
        let value = self.posted()?.map(str::to_string);
        value.map(|v| parse_timestamp("posted", &v)).transpose()
    }

    /// Capture time as recorded by the camera; it carries no time zone.
    pub fn taken_at(&mut self) -> Result<Option<NaiveDateTime>, ApiError> {
        let value = self.taken()?.map(str::to_string);
        value
            .map(|v| {
                NaiveDateTime::parse_from_str(&v, "%Y-%m-%d %H:%M:%S").map_err(|_| ApiError::InvalidValue {
                    attribute: "taken".to_string(),
                    value: v.clone(),
                })
            })
            .transpose()
    }

    pub fn updated_at(&mut self) -> Result<Option<DateTime<Utc>>, ApiError> {
        let value = self.updated()?.map(str::to_string);
        value.map(|v| parse_timestamp("updated", &v)).transpose()
    }

    /// Replace all tags. The cached tags are dropped so the next read
    /// fetches them again.
    pub fn set_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<(), ApiError> {
        let params = Params::new()
            .with("photo_id", self.require("id")?)
            .with("tags", join_tags(tags));
        self.client.write("photos.setTags", &params)?;
        self.forget_tags();
        Ok(())
    }

    pub fn add_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> Result<(), ApiError> {
        let params = Params::new()
            .with("photo_id", self.require("id")?)
            .with("tags", join_tags(tags));
        self.client.write("photos.addTags", &params)?;
        self.forget_tags();
        Ok(())
    }

    /// Set title and description, patching the local copy.
    pub fn set_meta(&mut self, title: &str, description: &str) -> Result<(), ApiError> {
        let params = Params::new()
            .with("photo_id", self.require("id")?)
            .with("title", title)
            .with("description", description);
        self.client.write("photos.setMeta", &params)?;
        self.entity.set("title", title);
        self.entity.set("description", description);
        Ok(())
    }

    pub fn rotate(&mut self, rotation: Rotation) -> Result<(), ApiError> {
        let params = Params::new()
            .with("photo_id", self.require("id")?)
            .with("degrees", rotation.degrees().to_string());
        self.client.write("photos.transform.rotate", &params)?;
        self.images = None;
        Ok(())
    }

    pub fn add_to_set(&self, set_id: &str) -> Result<(), ApiError> {
        let params = Params::new()
            .with("photoset_id", set_id)
            .with("photo_id", self.require("id")?);
        self.client.write("photosets.addPhoto", &params)?;
        Ok(())
    }

    fn forget_tags(&mut self) {
        self.invalidate("tags");
        self.tag_list = None;
    }
}

fn parse_timestamp(attribute: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| ApiError::InvalidValue {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Quarter,
    Half,
    ThreeQuarters,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarters => 270,
        }
    }
}

/// Who may see an uploaded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Everyone,
    Friends,
    Family,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyLevel {
    Safe,
    Moderate,
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Photo,
    Screenshot,
    Other,
}

/// Optional settings for `Photo::upload`. Unset fields are not sent and
/// the account defaults apply.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub viewable_by: Vec<Viewer>,
    pub safety_level: Option<SafetyLevel>,
    pub content_type: Option<ContentType>,
    pub hidden: Option<bool>,
}

impl UploadOptions {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert_opt("title", self.title.as_deref());
        params.insert_opt("description", self.description.as_deref());
        if !self.tags.is_empty() {
            params.insert("tags", join_tags(&self.tags));
        }
        if !self.viewable_by.is_empty() {
            let flag = |viewer: Viewer| if self.viewable_by.contains(&viewer) { "1" } else { "0" };
            params.insert("is_public", flag(Viewer::Everyone));
            params.insert("is_friend", flag(Viewer::Friends));
            params.insert("is_family", flag(Viewer::Family));
        }
        if let Some(level) = self.safety_level {
            let value = match level {
                SafetyLevel::Safe => "1",
                SafetyLevel::Moderate => "2",
                SafetyLevel::Restricted => "3",
            };
            params.insert("safety_level", value);
        }
        if let Some(kind) = self.content_type {
            let value = match kind {
                ContentType::Photo => "1",
                ContentType::Screenshot => "2",
                ContentType::Other => "3",
            };
            params.insert("content_type", value);
        }
        if let Some(hidden) = self.hidden {
            params.insert("hidden", if hidden { "2" } else { "1" });
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_options_map_to_service_flags() {
        let options = UploadOptions {
            title: Some("Creels".to_string()),
            tags: vec!["harbour".to_string(), "north sea".to_string()],
            viewable_by: vec![Viewer::Friends, Viewer::Family],
            safety_level: Some(SafetyLevel::Moderate),
            content_type: Some(ContentType::Screenshot),
            hidden: Some(true),
            ..UploadOptions::default()
        };
        let params = options.to_params();
        assert_eq!(params.get("title"), Some("Creels"));
        assert_eq!(params.get("description"), None);
        assert_eq!(params.get("tags"), Some("harbour \"north sea\""));
        assert_eq!(params.get("is_public"), Some("0"));
        assert_eq!(params.get("is_friend"), Some("1"));
        assert_eq!(params.get("is_family"), Some("1"));
        assert_eq!(params.get("safety_level"), Some("2"));
        assert_eq!(params.get("content_type"), Some("2"));
        assert_eq!(params.get("hidden"), Some("2"));
    }

    #[test]
    fn default_upload_options_send_nothing() {
        assert!(UploadOptions::default().to_params().is_empty());
    }

    #[test]
    fn timestamps_parse_unix_seconds() {
        let at = parse_timestamp("posted", "1252790891").unwrap();
        assert_eq!(at.to_rfc3339(), "2009-09-12T21:28:11+00:00");
        assert!(matches!(
            parse_timestamp("posted", "soon"),
            Err(ApiError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rotation_degrees() {
        assert_eq!(Rotation::Quarter.degrees(), 90);
        assert_eq!(Rotation::ThreeQuarters.degrees(), 270);
    }

    #[test]
    fn schema_declares_finders_and_lazy_groups() {
        let schema = Photo::schema();
        assert!(schema.finder("by_id").is_some());
        assert!(schema.finder("search").is_some());
        assert_eq!(schema.lazy_group_for("tags").unwrap().loader_name(), "load_tags");
        assert_eq!(schema.lazy_group_for("url").unwrap().loader_name(), "load_info");
    }
}
