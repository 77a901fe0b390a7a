//! Users (people) and their public collections.

use std::sync::LazyLock;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{
    attribute_readers, entity::memoize, lazy_readers, EntitySchema, FinderDescriptor, Mapped, MappedEntity, NodePath,
};
use crate::objects::photo::Photo;
use crate::objects::set::Set;
use crate::objects::tag::Tag;
use crate::params::Params;

const PROFILE_BASE_URL: &str = "https://www.flickr.com/photos";
const DEFAULT_ICON_URL: &str = "https://www.flickr.com/images/buddyicon.gif";

static FIND_BY_ID: FinderDescriptor = FinderDescriptor::new("by_id", "people.getInfo", "person").using("user_id");
static FIND_BY_USERNAME: FinderDescriptor =
    FinderDescriptor::new("by_username", "people.findByUsername", "user").using("username");
static FIND_BY_EMAIL: FinderDescriptor =
    FinderDescriptor::new("by_email", "people.findByEmail", "user").using("find_email");
static FIND_BY_URL: FinderDescriptor = FinderDescriptor::new("by_url", "urls.lookupUser", "user").using("url");
static FIND_CONTACTS: FinderDescriptor =
    FinderDescriptor::new("contacts", "contacts.getPublicList", "contacts/contact").using("user_id");

static SCHEMA: LazyLock<EntitySchema<User>> = LazyLock::new(|| {
    EntitySchema::builder("User")
        .attribute("id", &["@id", "@nsid"])
        .attribute("username", &["username", "@username"])
        .attribute("name", &["realname", "@realname"])
        .attribute("location", &["location"])
        .attribute("photos_url", &["photosurl"])
        .attribute("profile_url", &["profileurl"])
        .attribute("photos_count", &["photos/count"])
        .attribute("icon_server", &["@iconserver"])
        .attribute("icon_farm", &["@iconfarm"])
        .attribute("pro", &["@ispro"])
        .attribute("admin", &["@isadmin"])
        .lazy(
            &[
                "name",
                "location",
                "photos_url",
                "profile_url",
                "photos_count",
                "icon_server",
                "icon_farm",
                "pro",
                "admin",
            ],
            "load_info",
            User::load_info,
        )
        .finder(&FIND_BY_ID)
        .finder(&FIND_BY_USERNAME)
        .finder(&FIND_BY_EMAIL)
        .finder(&FIND_BY_URL)
        .finder(&FIND_CONTACTS)
        .build()
});

#[derive(Debug, Clone)]
pub struct User {
    client: ApiClient,
    entity: MappedEntity,
    photos: Option<Vec<Photo>>,
    sets: Option<Vec<Set>>,
    contacts: Option<Vec<User>>,
    tags: Option<Vec<Tag>>,
}

impl Mapped for User {
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

impl User {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            client: client.clone(),
            entity: MappedEntity::new(),
            photos: None,
            sets: None,
            contacts: None,
            tags: None,
        }
    }

    attribute_readers!(id, username);
    lazy_readers!(name, location, photos_url, profile_url, photos_count, icon_server, icon_farm, pro, admin);

    pub fn find_by_id(client: &ApiClient, id: &str) -> Result<User, ApiError> {
        FIND_BY_ID.find_one(client, id)
    }

    pub fn find_by_username(client: &ApiClient, username: &str) -> Result<User, ApiError> {
        FIND_BY_USERNAME.find_one(client, username)
    }

    pub fn find_by_email(client: &ApiClient, email: &str) -> Result<User, ApiError> {
        FIND_BY_EMAIL.find_one(client, email)
    }

    pub fn find_by_url(client: &ApiClient, url: &str) -> Result<User, ApiError> {
        FIND_BY_URL.find_one(client, url)
    }

    /// Resolve the identifier used in profile URLs: either a user id
    /// (`43955217@N05`) or a custom path alias.
    pub fn find_by_identifier(client: &ApiClient, identifier: &str) -> Result<User, ApiError> {
        if is_user_id(identifier) {
            User::find_by_id(client, identifier)
        } else {
            User::find_by_url(client, &format!("{PROFILE_BASE_URL}/{identifier}/"))
        }
    }

    fn load_info(&mut self) -> Result<(), ApiError> {
        let params = Params::new().with("user_id", self.require("id")?);
        let response = self.client.call("people.getInfo", &params)?;
        let document = response.document()?;
        let node = NodePath::parse("person")
            .first(document.root())
            .ok_or_else(|| ApiError::Mapping { path: "person".to_string() })?;
        self.populate_from(node);
        Ok(())
    }

    pub fn is_pro(&mut self) -> Result<bool, ApiError> {
        Ok(self.pro()? == Some("1"))
    }

    pub fn is_admin(&mut self) -> Result<bool, ApiError> {
        Ok(self.admin()? == Some("1"))
    }

    /// Buddy icon, falling back to the service default when none is set.
    pub fn icon_url(&mut self) -> Result<String, ApiError> {
        let server = self.icon_server()?.map(str::to_string);
        let farm = self.icon_farm()?.map(str::to_string);
        match (server, farm, self.id()) {
            (Some(server), Some(farm), Some(id)) if server != "0" => {
                Ok(format!("https://farm{farm}.staticflickr.com/{server}/buddyicons/{id}.jpg"))
            }
            _ => Ok(DEFAULT_ICON_URL.to_string()),
        }
    }

    pub fn photos(&mut self) -> Result<&[Photo], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.photos, || Photo::find_all_by_user_id(client, &id)).map(Vec::as_slice)
    }

    pub fn sets(&mut self) -> Result<&[Set], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.sets, || Set::find_all_by_user_id(client, &id)).map(Vec::as_slice)
    }

    pub fn contacts(&mut self) -> Result<&[User], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.contacts, || FIND_CONTACTS.find_all(client, Some(&id), &Params::new())).map(Vec::as_slice)
    }

    pub fn tags(&mut self) -> Result<&[Tag], ApiError> {
        let id = self.require("id")?;
        let client = &self.client;
        memoize(&mut self.tags, || Tag::find_all_by_user_id(client, &id)).map(Vec::as_slice)
    }
}

/// User ids look like `12345678@N01`.
pub fn is_user_id(identifier: &str) -> bool {
    match identifier.split_once("@N") {
        Some((number, suffix)) => {
            !number.is_empty()
                && number.bytes().all(|b| b.is_ascii_digit())
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
