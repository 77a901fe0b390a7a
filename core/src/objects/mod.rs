//! Domain types of the photo service, each a `Mapped` type with its own
//! attribute table, finders and associations.

pub mod accuracy;
pub mod comment;
pub mod context;
pub mod image;
pub mod photo;
pub mod place;
pub mod place_type;
pub mod set;
pub mod tag;
pub mod user;

pub use accuracy::Accuracy;
pub use comment::Comment;
pub use context::Context;
pub use image::{Image, Size};
pub use photo::{ContentType, Photo, Rotation, SafetyLevel, UploadOptions, Viewer};
pub use place::Place;
pub use place_type::PlaceType;
pub use set::Set;
pub use tag::Tag;
pub use user::User;
