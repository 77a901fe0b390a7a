//! Tags attached to photos, users and places.

use std::fmt;
use std::sync::LazyLock;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{attribute_readers, entity::memoize, EntitySchema, FinderDescriptor, Mapped, MappedEntity};
use crate::objects::user::User;
use crate::params::Params;

static FIND_ALL_BY_PHOTO_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_photo_id", "tags.getListPhoto", "photo/tags/tag").using("photo_id");
static FIND_ALL_BY_USER_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_user_id", "tags.getListUser", "who/tags/tag").using("user_id");
static FIND_ALL_BY_WOE_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_woe_id", "places.tagsForPlace", "tags/tag").using("woe_id");
static FIND_RELATED: FinderDescriptor = FinderDescriptor::new("related", "tags.getRelated", "tags/tag").using("tag");

static SCHEMA: LazyLock<EntitySchema<Tag>> = LazyLock::new(|| {
    EntitySchema::builder("Tag")
        .attribute("id", &["@id"])
        .attribute("author_id", &["@author"])
        .attribute("raw", &["@raw"])
        .attribute("value", &["."])
        .attribute("machine_tag", &["@machine_tag"])
        .finder(&FIND_ALL_BY_PHOTO_ID)
        .finder(&FIND_ALL_BY_USER_ID)
        .finder(&FIND_ALL_BY_WOE_ID)
        .finder(&FIND_RELATED)
        .build()
});

#[derive(Debug, Clone)]
pub struct Tag {
    client: ApiClient,
    entity: MappedEntity,
    author: Option<User>,
    related: Option<Vec<Tag>>,
}

impl Mapped for Tag {
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

impl Tag {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            client: client.clone(),
            entity: MappedEntity::new(),
            author: None,
            related: None,
        }
    }

    attribute_readers!(id, author_id, raw, value);

    pub fn find_all_by_photo_id(client: &ApiClient, photo_id: &str) -> Result<Vec<Tag>, ApiError> {
        FIND_ALL_BY_PHOTO_ID.find_all(client, Some(photo_id), &Params::new())
    }

    pub fn find_all_by_user_id(client: &ApiClient, user_id: &str) -> Result<Vec<Tag>, ApiError> {
        FIND_ALL_BY_USER_ID.find_all(client, Some(user_id), &Params::new())
    }

    pub fn find_all_by_woe_id(client: &ApiClient, woe_id: &str) -> Result<Vec<Tag>, ApiError> {
        FIND_ALL_BY_WOE_ID.find_all(client, Some(woe_id), &Params::new())
    }

    /// `namespace:predicate=value` tags.
    pub fn is_machine(&self) -> bool {
        match self.entity.get("machine_tag") {
            Some(flag) => flag == "1",
            None => self
                .value()
                .and_then(|value| value.split_once(':'))
                .is_some_and(|(_, rest)| rest.contains('=')),
        }
    }

    pub fn author(&mut self) -> Result<&User, ApiError> {
        let author_id = self.require("author_id")?;
        let client = &self.client;
        memoize(&mut self.author, || User::find_by_id(client, &author_id))
    }

    pub fn related(&mut self) -> Result<&[Tag], ApiError> {
        let value = self.require("value")?;
        let client = &self.client;
        memoize(&mut self.related, || FIND_RELATED.find_all(client, Some(&value), &Params::new())).map(Vec::as_slice)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or_default())
    }
}
