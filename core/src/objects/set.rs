//! Photo sets (albums).

use std::sync::LazyLock;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{attribute_readers, entity::memoize, EntitySchema, FinderDescriptor, Mapped, MappedEntity, NodePath};
use crate::objects::comment::Comment;
use crate::objects::photo::Photo;
use crate::params::Params;

static FIND_BY_ID: FinderDescriptor =
    FinderDescriptor::new("by_id", "photosets.getInfo", "photoset").using("photoset_id");
static FIND_ALL_BY_USER_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_user_id", "photosets.getList", "photosets/photoset").using("user_id");

static SCHEMA: LazyLock<EntitySchema<Set>> = LazyLock::new(|| {
    EntitySchema::builder("Set")
        .attribute("id", &["@id"])
        .attributes(&["title", "description"])
        .attribute("count", &["@photos", "@count_photos"])
        .attribute("primary_photo_id", &["@primary"])
        .attribute("url", &["@url"])
        .finder(&FIND_BY_ID)
        .finder(&FIND_ALL_BY_USER_ID)
        .build()
});

#[derive(Debug, Clone)]
pub struct Set {
    client: ApiClient,
    entity: MappedEntity,
    photos: Option<Vec<Photo>>,
    comments: Option<Vec<Comment>>,
}

impl Mapped for Set {
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
        Self {
            client: client.clone(),
            entity: MappedEntity::new(),
            photos: None,
            comments: None,
        }
    }
}

impl Set {
    attribute_readers!(id, title, description, count, primary_photo_id, url);

    pub fn find_by_id(client: &ApiClient, id: &str) -> Result<Set, ApiError> {
        FIND_BY_ID.find_one(client, id)
    }

    pub fn find_all_by_user_id(client: &ApiClient, user_id: &str) -> Result<Vec<Set>, ApiError> {
        FIND_ALL_BY_USER_ID.find_all(client, Some(user_id), &Params::new())
    }

    /// Create a set around an existing photo. The reply only carries the new
    /// id and URL; title and description are applied locally.
    pub fn create(client: &ApiClient, title: &str, primary_photo_id: &str, description: Option<&str>) -> Result<Set, ApiError> {
        let mut params = Params::new().with("title", title).with("primary_photo_id", primary_photo_id);
        params.insert_opt("description", description);
        let response = client.write("photosets.create", &params)?;
        let document = response.document()?;
        let node = NodePath::parse("photoset")
            .first(document.root())
            .ok_or_else(|| ApiError::Mapping { path: "photoset".to_string() })?;
        let mut set = Set::from_node(client, node);
        let entity = set.entity_mut();
        entity.set("title", title);
        entity.set("primary_photo_id", primary_photo_id);
        entity.set("count", "1");
        if let Some(description) = description {
            entity.set("description", description);
        }
        Ok(set)
    }

    pub fn photo_count(&self) -> Option<u32> {
        self.count()?.parse().ok()
    }

    pub fn photos(&mut self) -> Result<&[Photo], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.photos, || Photo::find_all_by_set_id(client, &id)).map(Vec::as_slice)
    }

    pub fn comments(&mut self) -> Result<&[Comment], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.comments, || Comment::find_all_by_set_id(client, &id)).map(Vec::as_slice)
    }

    /// Add a photo, bumping the local count and dropping the cached photo
    /// list.
    pub fn add_photo(&mut self, photo_id: &str) -> Result<(), ApiError> {
        let params = Params::new()
            .with("photoset_id", self.require("id")?)
            .with("photo_id", photo_id);
        self.client.write("photosets.addPhoto", &params)?;
        if let Some(count) = self.photo_count() {
            self.entity.set("count", (count + 1).to_string());
        }
        self.photos = None;
        Ok(())
    }
}
