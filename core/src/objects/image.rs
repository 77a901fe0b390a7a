//! Renditions of a photo at fixed sizes.

use std::sync::LazyLock;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{attribute_readers, EntitySchema, FinderDescriptor, Mapped, MappedEntity};
use crate::params::Params;

static FIND_ALL_BY_PHOTO_ID: FinderDescriptor =
    FinderDescriptor::new("all_by_photo_id", "photos.getSizes", "sizes/size").using("photo_id");

static SCHEMA: LazyLock<EntitySchema<Image>> = LazyLock::new(|| {
    EntitySchema::builder("Image")
        .attribute("size", &["@label"])
        .attribute("width", &["@width"])
        .attribute("height", &["@height"])
        .attribute("url", &["@source"])
        .attribute("page", &["@url"])
        .finder(&FIND_ALL_BY_PHOTO_ID)
        .build()
});

/// Named renditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Square,
    Thumbnail,
    Small,
    Medium,
    Large,
    Original,
}

impl Size {
    pub const ALL: [Size; 6] = [
        Size::Square,
        Size::Thumbnail,
        Size::Small,
        Size::Medium,
        Size::Large,
        Size::Original,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Size::Square => "Square",
            Size::Thumbnail => "Thumbnail",
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
            Size::Original => "Original",
        }
    }

    pub fn from_label(label: &str) -> Option<Size> {
        Size::ALL
            .into_iter()
            .find(|size| size.label().eq_ignore_ascii_case(label.trim()))
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    entity: MappedEntity,
}

impl Mapped for Image {
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

impl Image {
    attribute_readers!(size, width, height, url, page);

    pub fn find_all_by_photo_id(client: &ApiClient, photo_id: &str) -> Result<Vec<Image>, ApiError> {
        FIND_ALL_BY_PHOTO_ID.find_all(client, Some(photo_id), &Params::new())
    }

    /// The label as a known size. Labels outside the classic six (such as
    /// "Large Square") yield `None`.
    pub fn size_kind(&self) -> Option<Size> {
        self.size().and_then(Size::from_label)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let width = self.width()?.parse().ok()?;
        let height = self.height()?.parse().ok()?;
        Some((width, height))
    }
}
