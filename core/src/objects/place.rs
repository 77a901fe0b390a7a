//! Places: named geographic areas identified by a WOE id.
//!
//! Search calls return a place as `<place woeid="…">Wellington, NZ</place>`
//! with the display name as node text; `places.getInfo` carries it as
//! `@name` together with shape data and the enclosing locality, county,
//! region and country. A place built from the short shape is brief until
//! `load_info` runs.

use std::sync::LazyLock;

use roxmltree::Node;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::mapping::{
    attribute_readers, entity::memoize, inner_text, lazy_readers, EntitySchema, FinderDescriptor, Locator, Mapped,
    MappedEntity, NodePath,
};
use crate::objects::accuracy::Accuracy;
use crate::objects::photo::Photo;
use crate::objects::tag::Tag;
use crate::params::Params;

/// Place type id for localities; the service default for scoped queries.
pub const LOCALITY_PLACE_TYPE: u32 = 8;

static FIND_BY_WOE_ID: FinderDescriptor = FinderDescriptor::new("by_woe_id", "places.getInfo", "place").using("woe_id");
static FIND_BY_URL: FinderDescriptor = FinderDescriptor::new("by_url", "places.getInfoByUrl", "place").using("url");
static FIND_ALL_BY_QUERY: FinderDescriptor =
    FinderDescriptor::new("all_by_query", "places.find", "places/place").using("query");
static CHILDREN_WITH_PUBLIC_PHOTOS: FinderDescriptor =
    FinderDescriptor::new("children_with_public_photos", "places.getChildrenWithPhotosPublic", "places/place")
        .using("woe_id");
static FIND_ALL_BY_TAGS: FinderDescriptor =
    FinderDescriptor::new("all_by_tags", "places.placesForTags", "places/place").using("tags");
static FOR_AUTHENTICATED_USER: FinderDescriptor =
    FinderDescriptor::new("for_authenticated_user", "places.placesForUser", "places/place");
static FOR_CONTACTS: FinderDescriptor =
    FinderDescriptor::new("for_contacts", "places.placesForContacts", "places/place");
static TOP_PLACES: FinderDescriptor = FinderDescriptor::new("top_places", "places.getTopPlacesList", "places/place");
static FIND_BY_LAT_LON: FinderDescriptor =
    FinderDescriptor::new("by_lat_lon", "places.findByLatLon", "places/place");
static FIND_ALL_BY_BOUNDING_BOX: FinderDescriptor =
    FinderDescriptor::new("all_by_bounding_box", "places.placesForBoundingBox", "places/place").using("bbox");

static NAME_ATTRIBUTE: LazyLock<Locator> = LazyLock::new(|| Locator::parse("@name"));

static SCHEMA: LazyLock<EntitySchema<Place>> = LazyLock::new(|| {
    EntitySchema::builder("Place")
        .attribute("place_id", &["@place_id"])
        .attribute("woe_id", &["@woeid", "@woe_id"])
        .attribute("name", &["@name", "."])
        .attributes(&["latitude", "longitude", "place_type", "place_type_id", "timezone", "place_url"])
        .attribute("photo_count", &["@photo_count"])
        .attribute("has_shapedata", &["@has_shapedata"])
        .attribute("shapefile_url", &["shapedata/urls/shapefile"])
        .lazy(&["has_shapedata", "shapefile_url"], "load_info", Place::load_info)
        .finder(&FIND_BY_WOE_ID)
        .finder(&FIND_BY_URL)
        .finder(&FIND_ALL_BY_QUERY)
        .finder(&CHILDREN_WITH_PUBLIC_PHOTOS)
        .finder(&FIND_ALL_BY_TAGS)
        .finder(&FOR_AUTHENTICATED_USER)
        .finder(&FOR_CONTACTS)
        .finder(&TOP_PLACES)
        .finder(&FIND_BY_LAT_LON)
        .finder(&FIND_ALL_BY_BOUNDING_BOX)
        .build()
});

#[derive(Debug, Clone)]
pub struct Place {
    client: ApiClient,
    entity: MappedEntity,
    locality: Option<Box<Place>>,
    county: Option<Box<Place>>,
    region: Option<Box<Place>>,
    country: Option<Box<Place>>,
    tags: Option<Vec<Tag>>,
}

impl Mapped for Place {
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

    /// Only the detail shape names the place in `@name`; anything else is
    /// brief. A detail node already holds what `load_info` would fetch.
    fn from_node(client: &ApiClient, node: Node<'_, '_>) -> Self {
        let mut place = Self::new(client);
        place.populate_from(node);
        if NAME_ATTRIBUTE.extract(node).is_some() {
            place.adopt_children(node);
            place.entity.mark_loaded("load_info");
            place.entity.set_brief(false);
        }
        place
    }
}

impl Place {
    pub fn new(client: &ApiClient) -> Self {
        let mut entity = MappedEntity::new();
        entity.set_brief(true);
        Self {
            client: client.clone(),
            entity,
            locality: None,
            county: None,
            region: None,
            country: None,
            tags: None,
        }
    }

    attribute_readers!(
        place_id,
        woe_id,
        name,
        latitude,
        longitude,
        place_type,
        place_type_id,
        timezone,
        place_url,
        photo_count
    );
    lazy_readers!(has_shapedata, shapefile_url);

    pub fn find_by_woe_id(client: &ApiClient, woe_id: &str) -> Result<Place, ApiError> {
        FIND_BY_WOE_ID.find_one(client, woe_id)
    }

    pub fn find_by_url(client: &ApiClient, url: &str) -> Result<Place, ApiError> {
        FIND_BY_URL.find_one(client, url)
    }

    pub fn find_all_by_query(client: &ApiClient, query: &str) -> Result<Vec<Place>, ApiError> {
        FIND_ALL_BY_QUERY.find_all(client, Some(query), &Params::new())
    }

    pub fn find_children_with_public_photos(client: &ApiClient, woe_id: &str) -> Result<Vec<Place>, ApiError> {
        CHILDREN_WITH_PUBLIC_PHOTOS.find_all(client, Some(woe_id), &Params::new())
    }

    /// Places whose photos carry all of `tags`, optionally inside `woe_id`.
    pub fn find_all_by_tags<S: AsRef<str>>(
        client: &ApiClient,
        tags: &[S],
        place_type_id: Option<u32>,
        woe_id: Option<&str>,
    ) -> Result<Vec<Place>, ApiError> {
        let tags = tags.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
        FIND_ALL_BY_TAGS.find_all(client, Some(&tags), &scope(place_type_id, woe_id))
    }

    /// Places where the authenticated user has geotagged photos.
    pub fn find_all_for_authenticated_user(
        client: &ApiClient,
        place_type_id: Option<u32>,
        woe_id: Option<&str>,
    ) -> Result<Vec<Place>, ApiError> {
        FOR_AUTHENTICATED_USER.find_all(client, None, &scope(place_type_id, woe_id))
    }

    pub fn find_all_for_contacts(
        client: &ApiClient,
        place_type_id: Option<u32>,
        woe_id: Option<&str>,
    ) -> Result<Vec<Place>, ApiError> {
        FOR_CONTACTS.find_all(client, None, &scope(place_type_id, woe_id))
    }

    /// Most geotagged places of the previous day.
    pub fn find_top_places(
        client: &ApiClient,
        place_type_id: Option<u32>,
        woe_id: Option<&str>,
    ) -> Result<Vec<Place>, ApiError> {
        TOP_PLACES.find_all(client, None, &scope(place_type_id, woe_id))
    }

    /// The place containing a point. The service answers with at most one
    /// place; anything after the first is ignored.
    pub fn find_by_lat_lon(
        client: &ApiClient,
        latitude: f64,
        longitude: f64,
        accuracy: Option<Accuracy>,
    ) -> Result<Option<Place>, ApiError> {
        let params = Params::new()
            .with("lat", latitude.to_string())
            .with("lon", longitude.to_string())
            .with("accuracy", accuracy.unwrap_or_default().value().to_string());
        let places: Vec<Place> = FIND_BY_LAT_LON.find_all(client, None, &params)?;
        Ok(places.into_iter().next())
    }

    pub fn find_all_by_bounding_box(
        client: &ApiClient,
        min_longitude: f64,
        min_latitude: f64,
        max_longitude: f64,
        max_latitude: f64,
        place_type_id: Option<u32>,
    ) -> Result<Vec<Place>, ApiError> {
        let bbox = format!("{min_longitude},{min_latitude},{max_longitude},{max_latitude}");
        FIND_ALL_BY_BOUNDING_BOX.find_all(client, Some(&bbox), &scope(place_type_id, None))
    }

    fn load_info(&mut self) -> Result<(), ApiError> {
        let params = Params::new().with("woe_id", self.require("woe_id")?);
        let response = self.client.call("places.getInfo", &params)?;
        let document = response.document()?;
        let node = NodePath::parse("place")
            .first(document.root())
            .ok_or_else(|| ApiError::Mapping { path: "place".to_string() })?;
        self.populate_from(node);
        self.adopt_children(node);
        Ok(())
    }

    fn adopt_children(&mut self, node: Node<'_, '_>) {
        self.locality = child_place(&self.client, node, "locality");
        self.county = child_place(&self.client, node, "county");
        self.region = child_place(&self.client, node, "region");
        self.country = child_place(&self.client, node, "country");
    }

    pub fn locality(&mut self) -> Result<Option<&Place>, ApiError> {
        self.ensure_loaded("load_info")?;
        Ok(self.locality.as_deref())
    }

    pub fn county(&mut self) -> Result<Option<&Place>, ApiError> {
        self.ensure_loaded("load_info")?;
        Ok(self.county.as_deref())
    }

    pub fn region(&mut self) -> Result<Option<&Place>, ApiError> {
        self.ensure_loaded("load_info")?;
        Ok(self.region.as_deref())
    }

    pub fn country(&mut self) -> Result<Option<&Place>, ApiError> {
        self.ensure_loaded("load_info")?;
        Ok(self.country.as_deref())
    }

    pub fn has_shape(&mut self) -> Result<bool, ApiError> {
        Ok(self.has_shapedata()? == Some("1"))
    }

    /// Public photos taken in this place. Not cached.
    pub fn photos(&self) -> Result<Vec<Photo>, ApiError> {
        let criteria = Params::new().with("woe_id", self.require("woe_id")?);
        Photo::search(&self.client, &criteria)
    }

    /// Public photos within `radius_km` of the place's centre. Not cached.
    pub fn photos_within_radius(&self, radius_km: f64) -> Result<Vec<Photo>, ApiError> {
        let criteria = Params::new()
            .with("lat", self.require("latitude")?)
            .with("lon", self.require("longitude")?)
            .with("radius", radius_km.to_string());
        Photo::search(&self.client, &criteria)
    }

    /// Most used tags in this place.
    pub fn tags(&mut self) -> Result<&[Tag], ApiError> {
        let woe_id = self.require("woe_id")?;
        let client = &self.client;
        memoize(&mut self.tags, || Tag::find_all_by_woe_id(client, &woe_id)).map(Vec::as_slice)
    }
}

fn scope(place_type_id: Option<u32>, woe_id: Option<&str>) -> Params {
    let mut params = Params::new().with(
        "place_type_id",
        place_type_id.unwrap_or(LOCALITY_PLACE_TYPE).to_string(),
    );
    params.insert_opt("woe_id", woe_id.filter(|id| !id.is_empty()));
    params
}

/// Enclosing place named by a child element of a `places.getInfo` node;
/// empty elements count as absent.
fn child_place(client: &ApiClient, node: Node<'_, '_>, tag: &str) -> Option<Box<Place>> {
    node.children()
        .find(|child| child.is_element() && child.has_tag_name(tag))
        .filter(|child| !inner_text(*child).is_empty())
        .map(|child| Box::new(Place::from_node(client, child)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::{HttpRequest, HttpResponse, Transport};

    struct Offline;

    impl Transport for Offline {
        fn execute(&self, _: HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("offline".to_string()))
        }
    }

    fn place(xml: &str) -> Place {
        let client = ApiClient::new(ClientConfig::new("key"), Offline);
        let document = roxmltree::Document::parse(xml).unwrap();
        Place::from_node(&client, document.root())
    }

    #[test]
    fn search_shape_is_brief_and_named_by_text() {
        let place = place(r#"<place place_id="kH8dLOubBZRvX_YZ" woeid="2487956" place_type="locality">San Francisco, California</place>"#);
        assert!(place.is_brief());
        assert_eq!(place.name(), Some("San Francisco, California"));
        assert_eq!(place.woe_id(), Some("2487956"));
    }

    #[test]
    fn detail_shape_is_full_and_named_by_attribute() {
        let place = place(
            r#"<place woe_id="2487956" name="San Francisco, CA, US" has_shapedata="1">
                <locality woeid="2487956">San Francisco</locality>
            </place>"#,
        );
        assert!(!place.is_brief());
        assert_eq!(place.name(), Some("San Francisco, CA, US"));
        assert_eq!(place.woe_id(), Some("2487956"));
    }

    #[test]
    fn scope_defaults_to_localities() {
        let params = scope(None, Some(""));
        assert_eq!(params.get("place_type_id"), Some("8"));
        assert!(!params.contains("woe_id"));
        assert_eq!(scope(Some(12), Some("23424916")).get("woe_id"), Some("23424916"));
    }
}
