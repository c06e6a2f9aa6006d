use serde::Serialize;

use crate::validation::Validator;

/// A stored photo: the object key and the public URL composed from it.
///
/// The key is persisted next to the URL so cleanup never has to parse URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    pub key: String,
    pub url: String,
}

/// An entity row that references exactly one photo in object storage.
pub trait PhotoRecord: Clone + Send + Sync + 'static {
    /// Envelope key used in responses, e.g. `"category"`.
    const RESOURCE: &'static str;
    /// Collection path, e.g. `"/categories"`.
    const COLLECTION_PATH: &'static str;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);

    /// Column value that must be unique across rows.
    fn unique_value(&self) -> &str;

    fn media(&self) -> MediaRef;
    fn set_media(&mut self, media: MediaRef);

    fn validate(&self, v: &mut Validator);
}
