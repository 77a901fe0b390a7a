//! Resolve photo, set and profile URLs into typed resources.
//!
//! Classification is lexical and host independent:
//!
//! | path                        | kind  | single? |
//! |-----------------------------|-------|---------|
//! | `/photos/<user>/<id>/`      | Photo | yes     |
//! | `/photos/<user>/`           | Photo | no      |
//! | `/photos/<user>/sets/<id>/` | Set   | yes     |
//! | `/photos/<user>/sets/`      | Set   | no      |
//! | `/people/<user>/`           | User  | no      |
//! | `/p/<token>`                | Photo | yes     |
//!
//! Only `resource()` and `user()` touch the network. Collections are
//! fetched by the owner's numeric id, which costs one user lookup per
//! `ResourceUrl`.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::entity::memoize;
use crate::objects::{Photo, Set, User};

/// Alphabet of short photo links: base58 without `0`, `O`, `I` and `l`.
const SHORT_LINK_ALPHABET: &[u8] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Photo,
    Set,
    User,
}

/// What a URL resolves to.
#[derive(Debug, Clone)]
pub enum Resource {
    Photo(Photo),
    Photos(Vec<Photo>),
    Set(Set),
    Sets(Vec<Set>),
    User(User),
}

#[derive(Debug, Clone)]
pub struct ResourceUrl {
    raw: String,
    path: String,
    kind: ResourceKind,
    user_identifier: Option<String>,
    resource_identifier: Option<String>,
    short: bool,
    user: Option<User>,
}

impl ResourceUrl {
    /// Classify `raw`. A missing scheme is tolerated (`flickr.com/photos/…`).
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}"))
                .map_err(|_| ApiError::UnresolvableUrl(raw.to_string()))?,
            Err(_) => return Err(ApiError::UnresolvableUrl(raw.to_string())),
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        let (kind, user, id, short) = match segments.as_slice() {
            ["p", token] => (ResourceKind::Photo, None, Some(*token), true),
            ["photos", user] => (ResourceKind::Photo, Some(*user), None, false),
            ["photos", user, "sets"] => (ResourceKind::Set, Some(*user), None, false),
            ["photos", user, "sets", id] => (ResourceKind::Set, Some(*user), Some(*id), false),
            ["photos", user, id] => (ResourceKind::Photo, Some(*user), Some(*id), false),
            ["people", user] => (ResourceKind::User, Some(*user), None, false),
            _ => return Err(ApiError::UnresolvableUrl(raw.to_string())),
        };
        debug!(url = raw, ?kind, "classified resource url");

        Ok(Self {
            raw: raw.to_string(),
            path: url.path().to_string(),
            kind,
            user_identifier: user.map(str::to_string),
            resource_identifier: id.map(str::to_string),
            short,
            user: None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The path component, host stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Screen name or user id from the path. Short links carry none.
    pub fn user_identifier(&self) -> Option<&str> {
        self.user_identifier.as_deref()
    }

    /// Photo or set id, or the token of a short link.
    pub fn resource_identifier(&self) -> Option<&str> {
        self.resource_identifier.as_deref()
    }

    pub fn is_collection(&self) -> bool {
        self.resource_identifier.is_none()
    }

    pub fn is_short(&self) -> bool {
        self.short
    }

    /// The user named in the path, looked up once per instance.
    pub fn user(&mut self, client: &ApiClient) -> Result<&User, ApiError> {
        let identifier = self
            .user_identifier
            .clone()
            .ok_or_else(|| ApiError::UnresolvableUrl(format!("{} names no user", self.raw)))?;
        memoize(&mut self.user, || User::find_by_identifier(client, &identifier))
    }

    pub fn resource(&mut self, client: &ApiClient) -> Result<Resource, ApiError> {
        match (self.kind, self.resource_identifier.clone()) {
            (ResourceKind::Photo, Some(token)) if self.short => {
                let id = decode_short_id(&token)
                    .ok_or_else(|| ApiError::UnresolvableUrl(self.raw.clone()))?;
                Ok(Resource::Photo(Photo::find_by_id(client, &id.to_string())?))
            }
            (ResourceKind::Photo, Some(id)) => Ok(Resource::Photo(Photo::find_by_id(client, &id)?)),
            (ResourceKind::Set, Some(id)) => Ok(Resource::Set(Set::find_by_id(client, &id)?)),
            (ResourceKind::Photo, None) => {
                let user_id = self.user_id(client)?;
                Ok(Resource::Photos(Photo::find_all_by_user_id(client, &user_id)?))
            }
            (ResourceKind::Set, None) => {
                let user_id = self.user_id(client)?;
                Ok(Resource::Sets(Set::find_all_by_user_id(client, &user_id)?))
            }
            (ResourceKind::User, _) => Ok(Resource::User(self.user(client)?.clone())),
        }
    }

    fn user_id(&mut self, client: &ApiClient) -> Result<String, ApiError> {
        let user = self.user(client)?;
        user.id()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Mapping { path: "user@id".to_string() })
    }
}

/// Decode a short link token to the numeric photo id. `None` for tokens
/// outside the alphabet or too large for a `u64`.
pub fn decode_short_id(token: &str) -> Option<u64> {
    if token.is_empty() {
        return None;
    }
    token.bytes().try_fold(0u64, |acc, byte| {
        let digit = SHORT_LINK_ALPHABET.iter().position(|&c| c == byte)? as u64;
        acc.checked_mul(58)?.checked_add(digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_photo_url() {
        let url = ResourceUrl::parse("https://site/photos/alice/12345/").unwrap();
        assert_eq!(url.kind(), ResourceKind::Photo);
        assert_eq!(url.user_identifier(), Some("alice"));
        assert_eq!(url.resource_identifier(), Some("12345"));
        assert!(!url.is_collection());
        assert_eq!(url.path(), "/photos/alice/12345/");
    }

    #[test]
    fn photostream_url_is_a_collection() {
        let url = ResourceUrl::parse("https://site/photos/alice/").unwrap();
        assert_eq!(url.kind(), ResourceKind::Photo);
        assert_eq!(url.resource_identifier(), None);
        assert!(url.is_collection());
    }

    #[test]
    fn set_urls() {
        let single = ResourceUrl::parse("https://site/photos/alice/sets/999/").unwrap();
        assert_eq!(single.kind(), ResourceKind::Set);
        assert_eq!(single.resource_identifier(), Some("999"));

        let listing = ResourceUrl::parse("http://www.flickr.com/photos/reagent/sets/").unwrap();
        assert_eq!(listing.kind(), ResourceKind::Set);
        assert!(listing.is_collection());
    }

    #[test]
    fn profile_url_keeps_user_id() {
        let url = ResourceUrl::parse("http://www.flickr.com/people/43955217@N05/").unwrap();
        assert_eq!(url.kind(), ResourceKind::User);
        assert_eq!(url.user_identifier(), Some("43955217@N05"));
        assert!(url.is_collection());
    }

    #[test]
    fn short_link() {
        let url = ResourceUrl::parse("https://short/p/abc123").unwrap();
        assert_eq!(url.kind(), ResourceKind::Photo);
        assert_eq!(url.resource_identifier(), Some("abc123"));
        assert_eq!(url.user_identifier(), None);
        assert!(url.is_short());
        assert_eq!(url.path(), "/p/abc123");
    }

    #[test]
    fn missing_scheme_is_tolerated() {
        let url = ResourceUrl::parse("flickr.com/photos/reagent/4041660453/").unwrap();
        assert_eq!(url.path(), "/photos/reagent/4041660453/");
    }

    #[test]
    fn unrecognised_paths_fail() {
        for raw in ["https://site/groups/x/", "https://site/", "https://site/photos/a/b/c/d/e/"] {
            assert!(matches!(ResourceUrl::parse(raw), Err(ApiError::UnresolvableUrl(_))), "{raw}");
        }
    }

    #[test]
    fn short_ids_decode_from_base58() {
        assert_eq!(decode_short_id("2"), Some(1));
        assert_eq!(decode_short_id("21"), Some(58));
        assert_eq!(decode_short_id("0"), None);
        assert_eq!(decode_short_id(""), None);
        assert_eq!(decode_short_id("ZZZZZZZZZZZZZZZ"), None);
    }
}
