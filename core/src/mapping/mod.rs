//! Declarative mapping from XML responses onto domain objects.
//!
//! # Overview
//! - `locator` parses attribute sources (`.`, `@id`, `owner@nsid`, `a/b`)
//!   into typed locators and evaluates them against `roxmltree` nodes.
//! - `schema` holds the per-type tables: attributes, lazy groups, finders.
//! - `entity` holds per-instance values, population and the lazy loader.
//! - `finder` turns a declared finder into a remote call plus instantiation.

pub mod entity;
pub mod finder;
pub mod locator;
pub mod schema;

pub use entity::{Mapped, MappedEntity};
pub use finder::{instantiate_all, instantiate_one, FinderDescriptor};
pub use locator::{inner_text, Locator, NodePath};
pub use schema::{AttributeDescriptor, EntitySchema, LazyGroup, Loader, SchemaBuilder};

/// Plain readers for declared attributes. They never trigger a load.
macro_rules! attribute_readers {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Option<&str> {
                $crate::mapping::Mapped::attribute(self, stringify!($name))
            }
        )*
    };
}

/// Readers for lazy attributes. An unset value runs the attribute's loader
/// first.
macro_rules! lazy_readers {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<Option<&str>, $crate::error::ApiError> {
                $crate::mapping::Mapped::lazy_attribute(self, stringify!($name))
            }
        )*
    };
}

pub(crate) use attribute_readers;
pub(crate) use lazy_readers;
