//! Client binding for a photo-sharing service's REST/XML API.
//!
//! # Overview
//! Remote calls and their XML replies are mapped onto typed domain objects
//! (`Photo`, `Place`, `User`, `Tag`, …). The core never touches the network:
//! `ApiClient` builds `HttpRequest` values and a caller-supplied `Transport`
//! executes them (host-does-IO pattern).
//!
//! # Design
//! - `mapping` is the declarative runtime: per-type attribute tables with
//!   ordered locators, lazily loaded attribute groups and declared finders.
//! - `objects` holds the domain types built on it. Objects keep a handle to
//!   the client so associations and lazy fields can fetch on first use;
//!   every instance caches independently.
//! - `resource_url` classifies photo, set and profile URLs and resolves them
//!   through the finders.
//! - `testing` provides a fixture-backed transport.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mapping;
pub mod objects;
pub mod params;
pub mod resource_url;
pub mod response;
pub mod testing;

pub use client::{ApiClient, UploadKind};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use mapping::{Mapped, MappedEntity};
pub use objects::{
    Accuracy, Comment, ContentType, Context, Image, Photo, Place, PlaceType, Rotation, SafetyLevel, Set, Size, Tag,
    UploadOptions, User, Viewer,
};
pub use params::Params;
pub use resource_url::{Resource, ResourceKind, ResourceUrl};
pub use response::Response;
