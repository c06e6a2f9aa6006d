use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::media::{MediaRef, PhotoRecord};
use super::patch_field;
use crate::validation::{validate_service, Validator};

/// A bookable service with a link to its booking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub photo_url: String,
    #[serde(skip)]
    pub photo_key: String,
}

impl Service {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            url: url.into(),
            photo_url: String::new(),
            photo_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl ServicePatch {
    pub fn apply(self, service: &mut Service) {
        patch_field(&mut service.title, self.title);
        patch_field(&mut service.description, self.description);
        patch_field(&mut service.url, self.url);
    }
}

impl PhotoRecord for Service {
    const RESOURCE: &'static str = "service";
    const COLLECTION_PATH: &'static str = "/services";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn unique_value(&self) -> &str {
        &self.title
    }

    fn media(&self) -> MediaRef {
        MediaRef {
            key: self.photo_key.clone(),
            url: self.photo_url.clone(),
        }
    }

    fn set_media(&mut self, media: MediaRef) {
        self.photo_key = media.key;
        self.photo_url = media.url;
    }

    fn validate(&self, v: &mut Validator) {
        validate_service(v, self)
    }
}
