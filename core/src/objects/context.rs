//! A photo's neighbours in its owner's photostream.

use std::sync::LazyLock;

use crate::client::ApiClient;
use crate::mapping::{attribute_readers, EntitySchema, Mapped, MappedEntity};
use crate::objects::photo::Photo;

static SCHEMA: LazyLock<EntitySchema<Context>> = LazyLock::new(|| {
    EntitySchema::builder("Context")
        .attribute("previous_id", &["prevphoto@id"])
        .attribute("previous_secret", &["prevphoto@secret"])
        .attribute("previous_title", &["prevphoto@title"])
        .attribute("next_id", &["nextphoto@id"])
        .attribute("next_secret", &["nextphoto@secret"])
        .attribute("next_title", &["nextphoto@title"])
        .build()
});

/// The service reports a missing neighbour with id `0`.
const NO_PHOTO: &str = "0";

#[derive(Debug, Clone)]
pub struct Context {
    client: ApiClient,
    entity: MappedEntity,
}

impl Mapped for Context {
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
        }
    }
}

impl Context {
    attribute_readers!(previous_id, next_id);

    pub fn previous(&self) -> Option<Photo> {
        self.neighbour("previous")
    }

    pub fn next(&self) -> Option<Photo> {
        self.neighbour("next")
    }

    /// A brief photo built from the context entry; its other fields load
    /// lazily.
    fn neighbour(&self, prefix: &str) -> Option<Photo> {
        let id = self.entity.get(&format!("{prefix}_id")).filter(|id| *id != NO_PHOTO)?;
        let mut photo = Photo::new(&self.client);
        let entity = photo.entity_mut();
        entity.set("id", id);
        for field in ["secret", "title"] {
            if let Some(value) = self.entity.get(&format!("{prefix}_{field}")) {
                entity.set(field, value);
            }
        }
        entity.set_brief(true);
        Some(photo)
    }
}
