//! Per-type declaration tables.
//!
//! Each domain type builds one `EntitySchema` at first use (held in a
//! `LazyLock` static) listing its attributes, its lazy groups and its
//! finders. The tables are immutable afterwards and shared by every
//! instance of the type.

use roxmltree::Node;

use crate::error::ApiError;
use crate::mapping::finder::FinderDescriptor;
use crate::mapping::locator::Locator;

/// One named attribute and its candidate locators, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    name: &'static str,
    locators: Vec<Locator>,
}

impl AttributeDescriptor {
    /// With no sources the attribute is looked up as `@name`, then `name`.
    pub fn new(name: &'static str, sources: &[&str]) -> Self {
        let locators = if sources.is_empty() {
            vec![Locator::Attribute(name.to_string()), Locator::parse(name)]
        } else {
            sources.iter().map(|source| Locator::parse(source)).collect()
        };
        Self { name, locators }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    /// First locator that yields a value wins; later ones are not evaluated.
    pub fn resolve(&self, node: Node<'_, '_>) -> Option<String> {
        self.locators.iter().find_map(|locator| locator.extract(node))
    }
}

/// Instance method that fetches the data behind a lazy group.
pub type Loader<T> = fn(&mut T) -> Result<(), ApiError>;

/// Attributes filled together by one loader.
pub struct LazyGroup<T> {
    loader_name: &'static str,
    attributes: Vec<&'static str>,
    loader: Loader<T>,
}

impl<T> LazyGroup<T> {
    pub fn loader_name(&self) -> &'static str {
        self.loader_name
    }

    pub fn attributes(&self) -> &[&'static str] {
        &self.attributes
    }

    pub fn covers(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|name| *name == attribute)
    }

    pub fn run(&self, target: &mut T) -> Result<(), ApiError> {
        (self.loader)(target)
    }
}

pub struct EntitySchema<T> {
    type_name: &'static str,
    attributes: Vec<AttributeDescriptor>,
    lazy: Vec<LazyGroup<T>>,
    finders: Vec<&'static FinderDescriptor>,
}

impl<T> EntitySchema<T> {
    pub fn builder(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            schema: EntitySchema {
                type_name,
                attributes: Vec::new(),
                lazy: Vec::new(),
                finders: Vec::new(),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Attribute names in declaration order.
    pub fn attribute_names(&self) -> Vec<&'static str> {
        self.attributes.iter().map(|attribute| attribute.name).collect()
    }

    pub fn lazy_groups(&self) -> &[LazyGroup<T>] {
        &self.lazy
    }

    pub fn lazy_group_for(&self, attribute: &str) -> Option<&LazyGroup<T>> {
        self.lazy.iter().find(|group| group.covers(attribute))
    }

    pub fn lazy_group(&self, loader_name: &str) -> Option<&LazyGroup<T>> {
        self.lazy.iter().find(|group| group.loader_name == loader_name)
    }

    pub fn finders(&self) -> &[&'static FinderDescriptor] {
        &self.finders
    }

    pub fn finder(&self, name: &str) -> Option<&'static FinderDescriptor> {
        self.finders.iter().copied().find(|finder| finder.name == name)
    }
}

pub struct SchemaBuilder<T> {
    schema: EntitySchema<T>,
}

impl<T> SchemaBuilder<T> {
    /// Declare one attribute with explicit sources.
    pub fn attribute(mut self, name: &'static str, sources: &[&str]) -> Self {
        debug_assert!(
            self.schema.attribute(name).is_none(),
            "{} declares `{name}` twice",
            self.schema.type_name
        );
        self.schema.attributes.push(AttributeDescriptor::new(name, sources));
        self
    }

    /// Declare several attributes with default sources.
    pub fn attributes(mut self, names: &[&'static str]) -> Self {
        for &name in names {
            self = self.attribute(name, &[]);
        }
        self
    }

    /// Declare `attributes` as lazily filled by `loader`. A group may name no
    /// attributes when its loader only fills associations.
    pub fn lazy(mut self, attributes: &[&'static str], loader_name: &'static str, loader: Loader<T>) -> Self {
        debug_assert!(
            attributes.iter().all(|name| self.schema.attribute(name).is_some()),
            "{} declares a lazy attribute before the attribute itself",
            self.schema.type_name
        );
        self.schema.lazy.push(LazyGroup {
            loader_name,
            attributes: attributes.to_vec(),
            loader,
        });
        self
    }

    pub fn finder(mut self, finder: &'static FinderDescriptor) -> Self {
        self.schema.finders.push(finder);
        self
    }

    pub fn build(self) -> EntitySchema<T> {
        self.schema
    }
}
