//! Comments on photos and sets.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{attribute_readers, entity::memoize, EntitySchema, FinderDescriptor, Mapped, MappedEntity};
use crate::objects::user::User;
use crate::params::Params;

static FIND_ALL_BY_PHOTO_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_photo_id", "photos.comments.getList", "comments/comment").using("photo_id");
static FIND_ALL_BY_SET_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_set_id", "photosets.comments.getList", "comments/comment").using("photoset_id");

static SCHEMA: LazyLock<EntitySchema<Comment>> = LazyLock::new(|| {
    EntitySchema::builder("Comment")
        .attribute("id", &["@id"])
        .attribute("author_id", &["@author"])
        .attribute("author_name", &["@authorname"])
        .attribute("created", &["@datecreate"])
        .attribute("permalink", &["@permalink"])
        .attribute("body", &["."])
        .finder(&FIND_ALL_BY_PHOTO_ID)
        .finder(&FIND_ALL_BY_SET_ID)
        .build()
});

#[derive(Debug, Clone)]
pub struct Comment {
    client: ApiClient,
    entity: MappedEntity,
    author: Option<User>,
}

impl Mapped for Comment {
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
            author: None,
        }
    }
}

impl Comment {
    attribute_readers!(id, author_id, author_name, created, permalink, body);

    pub fn find_all_by_photo_id(client: &ApiClient, photo_id: &str) -> Result<Vec<Comment>, ApiError> {
        FIND_ALL_BY_PHOTO_ID.find_all(client, Some(photo_id), &Params::new())
    }

    pub fn find_all_by_set_id(client: &ApiClient, set_id: &str) -> Result<Vec<Comment>, ApiError> {
        FIND_ALL_BY_SET_ID.find_all(client, Some(set_id), &Params::new())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created()?
            .parse::<i64>()
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    pub fn author(&mut self) -> Result<&User, ApiError> {
        let author_id = self.require("author_id")?;
        let client = &self.client;
        memoize(&mut self.author, || User::find_by_id(client, &author_id))
    }
}
