//! Instance state shared by every domain type, and the lazy loader.
//!
//! # Design
//! A domain type holds a `MappedEntity` for its attribute values and
//! implements `Mapped` to tie it to the type's `EntitySchema`. Population
//! only ever assigns: an attribute with no match keeps whatever value it had,
//! so repeated population from different response shapes accumulates.
//!
//! Lazy reads take `&mut self`. The borrow checker therefore rules out two
//! callers racing the check-then-load sequence on one instance, which is
//! what keeps loader invocations at most once per group.

use std::collections::{HashMap, HashSet};

use roxmltree::Node;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::schema::{EntitySchema, LazyGroup};

/// Attribute values of one object. A missing key means "unset", which is
/// distinct from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedEntity {
    values: HashMap<String, String>,
    loaded: HashSet<&'static str>,
    brief: bool,
}

impl MappedEntity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Assign every declared attribute that resolves against `node`.
    /// Returns how many were assigned.
    pub fn populate<T>(&mut self, schema: &EntitySchema<T>, node: Node<'_, '_>) -> usize {
        let mut assigned = 0;
        for attribute in schema.attributes() {
            if let Some(value) = attribute.resolve(node) {
                self.values.insert(attribute.name().to_string(), value);
                assigned += 1;
            }
        }
        assigned
    }

    /// Summary-shaped objects are brief until a loader fills them in.
    pub fn is_brief(&self) -> bool {
        self.brief
    }

    pub fn set_brief(&mut self, brief: bool) {
        self.brief = brief;
    }

    pub fn is_loaded(&self, loader_name: &str) -> bool {
        self.loaded.contains(loader_name)
    }

    pub fn mark_loaded(&mut self, loader_name: &'static str) {
        self.loaded.insert(loader_name);
    }

    /// Unset `name` and re-arm every lazy group covering it, so the next
    /// read goes back to the service.
    pub fn invalidate<T>(&mut self, schema: &EntitySchema<T>, name: &str) {
        self.values.remove(name);
        for group in schema.lazy_groups().iter().filter(|group| group.covers(name)) {
            self.loaded.remove(group.loader_name());
        }
    }
}

/// Capability shared by all domain types.
pub trait Mapped: Sized + 'static {
    fn schema() -> &'static EntitySchema<Self>;

    fn entity(&self) -> &MappedEntity;

    fn entity_mut(&mut self) -> &mut MappedEntity;

    /// An instance with no attributes set.
    fn empty(client: &ApiClient) -> Self;

    /// Build an instance and populate it from `node`, best effort.
    fn from_node(client: &ApiClient, node: Node<'_, '_>) -> Self {
        let mut object = Self::empty(client);
        object.populate_from(node);
        object
    }

    fn populate_from(&mut self, node: Node<'_, '_>) -> usize {
        let schema = Self::schema();
        self.entity_mut().populate(schema, node)
    }

    /// Current value, never triggering a load.
    fn attribute(&self, name: &str) -> Option<&str> {
        self.entity().get(name)
    }

    /// Current value of a declared attribute, or `InvalidParameter` naming
    /// the missing attribute. Used where a remote call needs the value.
    fn require(&self, name: &str) -> Result<String, ApiError> {
        self.attribute(name).map(str::to_string).ok_or_else(|| {
            ApiError::InvalidParameter(format!("{} has no `{name}`", Self::schema().type_name()))
        })
    }

    /// Value of `name`, running its lazy group's loader first when the value
    /// is unset and the loader has not run yet.
    fn lazy_attribute(&mut self, name: &str) -> Result<Option<&str>, ApiError> {
        if !self.entity().is_set(name) {
            if let Some(group) = Self::schema().lazy_group_for(name) {
                if !self.entity().is_loaded(group.loader_name()) {
                    run_loader(self, group)?;
                }
            }
        }
        Ok(self.entity().get(name))
    }

    /// Run `loader_name` unless it already ran on this instance. Names no
    /// lazy group declares are rejected.
    fn ensure_loaded(&mut self, loader_name: &str) -> Result<(), ApiError> {
        match Self::schema().lazy_group(loader_name) {
            Some(group) if !self.entity().is_loaded(group.loader_name()) => run_loader(self, group),
            Some(_) => Ok(()),
            None => Err(ApiError::InvalidParameter(format!(
                "{} has no loader `{loader_name}`",
                Self::schema().type_name()
            ))),
        }
    }

    fn invalidate(&mut self, name: &str) {
        let schema = Self::schema();
        self.entity_mut().invalidate(schema, name);
    }

    fn is_brief(&self) -> bool {
        self.entity().is_brief()
    }
}

fn run_loader<T: Mapped>(target: &mut T, group: &LazyGroup<T>) -> Result<(), ApiError> {
    debug!(entity = T::schema().type_name(), loader = group.loader_name(), "lazy load");
    group.run(target)?;
    let entity = target.entity_mut();
    entity.mark_loaded(group.loader_name());
    entity.set_brief(false);
    Ok(())
}

/// Fill `slot` with `fetch` on first use and hand out the cached value.
pub(crate) fn memoize<T>(slot: &mut Option<T>, fetch: impl FnOnce() -> Result<T, ApiError>) -> Result<&T, ApiError> {
    let value = match slot.take() {
        Some(value) => value,
        None => fetch()?,
    };
    Ok(slot.insert(value))
}
