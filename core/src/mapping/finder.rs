//! Declared finders.
//!
//! A `FinderDescriptor` is a `static` describing one remote query: the
//! method to call, where its result nodes live, which parameter carries the
//! caller's value and any fixed parameters. `find_one` builds exactly one
//! object from the first result node; `find_all` builds one per node in
//! document order, and an empty result is an empty `Vec`.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::entity::Mapped;
use crate::mapping::locator::NodePath;
use crate::params::Params;
use crate::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinderDescriptor {
    pub name: &'static str,
    pub call: &'static str,
    pub path: &'static str,
    /// Parameter that receives the caller's value.
    pub using: Option<&'static str>,
    pub extra: &'static [(&'static str, &'static str)],
}

impl FinderDescriptor {
    pub const fn new(name: &'static str, call: &'static str, path: &'static str) -> Self {
        Self {
            name,
            call,
            path,
            using: None,
            extra: &[],
        }
    }

    pub const fn using(self, key: &'static str) -> Self {
        Self {
            using: Some(key),
            ..self
        }
    }

    pub const fn with_extra(self, extra: &'static [(&'static str, &'static str)]) -> Self {
        Self { extra, ..self }
    }

    /// Fixed parameters first, then the caller's value, then `overrides`.
    pub fn params(&self, value: Option<&str>, overrides: &Params) -> Result<Params, ApiError> {
        let mut params: Params = self.extra.iter().copied().collect();
        match (self.using, value) {
            (Some(key), Some(value)) => params.insert(key, value),
            (Some(key), None) if !overrides.contains(key) => {
                return Err(ApiError::InvalidParameter(format!("{} requires `{key}`", self.name)));
            }
            (None, Some(_)) => {
                return Err(ApiError::InvalidParameter(format!("{} takes no identifying value", self.name)));
            }
            _ => {}
        }
        params.merge(overrides);
        Ok(params)
    }

    pub fn find_one<T: Mapped>(&self, client: &ApiClient, value: &str) -> Result<T, ApiError> {
        debug!(entity = T::schema().type_name(), finder = self.name, "find one");
        let params = self.params(Some(value), &Params::new())?;
        let response = client.call(self.call, &params)?;
        instantiate_one(client, &response, self.path)
    }

    pub fn find_all<T: Mapped>(&self, client: &ApiClient, value: Option<&str>, overrides: &Params) -> Result<Vec<T>, ApiError> {
        debug!(entity = T::schema().type_name(), finder = self.name, "find all");
        let params = self.params(value, overrides)?;
        let response = client.call(self.call, &params)?;
        instantiate_all(client, &response, self.path)
    }
}

/// Build one object from the first node at `path`.
pub fn instantiate_one<T: Mapped>(client: &ApiClient, response: &Response, path: &str) -> Result<T, ApiError> {
    let document = response.document()?;
    let node = NodePath::parse(path)
        .first(document.root())
        .ok_or_else(|| ApiError::Mapping { path: path.to_string() })?;
    Ok(T::from_node(client, node))
}

/// Build one object per node at `path`, in document order.
pub fn instantiate_all<T: Mapped>(client: &ApiClient, response: &Response, path: &str) -> Result<Vec<T>, ApiError> {
    let document = response.document()?;
    Ok(NodePath::parse(path)
        .select(document.root())
        .into_iter()
        .map(|node| T::from_node(client, node))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    static BY_ID: FinderDescriptor = FinderDescriptor::new("by_id", "photos.getInfo", "photo").using("photo_id");
    static SEARCH: FinderDescriptor =
        FinderDescriptor::new("search", "photos.search", "photos/photo").with_extra(&[("extras", "tags,geo")]);

    #[test]
    fn params_merge_value_and_fixed_extras() {
        let params = BY_ID.params(Some("42"), &Params::new()).unwrap();
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("photo_id", "42")]);

        let params = SEARCH.params(None, &Params::new().with("text", "harbour")).unwrap();
        assert_eq!(params.get("extras"), Some("tags,geo"));
        assert_eq!(params.get("text"), Some("harbour"));
    }

    #[test]
    fn params_require_the_identifying_value() {
        let err = BY_ID.params(None, &Params::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));

        let params = BY_ID.params(None, &Params::new().with("photo_id", "7")).unwrap();
        assert_eq!(params.get("photo_id"), Some("7"));
    }

    #[test]
    fn params_reject_value_without_key() {
        assert!(SEARCH.params(Some("x"), &Params::new()).is_err());
    }
}
