//! The service's fixed list of place kinds (locality, region, …).

use std::sync::LazyLock;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{attribute_readers, EntitySchema, FinderDescriptor, Mapped, MappedEntity};
use crate::params::Params;

static FIND_ALL: FinderDescriptor = FinderDescriptor::new("all", "places.getPlaceTypes", "place_types/place_type");

static SCHEMA: LazyLock<EntitySchema<PlaceType>> = LazyLock::new(|| {
    EntitySchema::builder("PlaceType")
        .attribute("id", &["@id", "@place_type_id"])
        .attribute("name", &["."])
        .finder(&FIND_ALL)
        .build()
});

#[derive(Debug, Clone)]
pub struct PlaceType {
    entity: MappedEntity,
}

impl Mapped for PlaceType {
    fn schema() -> &'static EntitySchema<Self> {
        &SCHEMA
    }

    fn entity(&self) -> &MappedEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut MappedEntity {
        &mut self.entity
    }

    fn empty(_: &ApiClient) -> Self {
        Self {
            entity: MappedEntity::new(),
        }
    }
}

impl PlaceType {
    attribute_readers!(id, name);

    pub fn find_all(client: &ApiClient) -> Result<Vec<PlaceType>, ApiError> {
        FIND_ALL.find_all(client, None, &Params::new())
    }
}
