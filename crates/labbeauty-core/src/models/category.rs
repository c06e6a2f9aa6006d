use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::media::{MediaRef, PhotoRecord};
use super::patch_field;
use crate::validation::{validate_category, Validator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub photo_url: String,
    #[serde(skip)]
    pub photo_key: String,
}

impl Category {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            photo_url: String::new(),
            photo_key: String::new(),
        }
    }
}

/// Partial update; absent or empty values leave the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CategoryPatch {
    pub fn apply(self, category: &mut Category) {
        patch_field(&mut category.title, self.title);
        patch_field(&mut category.description, self.description);
    }
}

impl PhotoRecord for Category {
    const RESOURCE: &'static str = "category";
    const COLLECTION_PATH: &'static str = "/categories";

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
        validate_category(v, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_ignores_empty_values() {
        let mut category = Category::new("Manicure", "Classic and hardware manicure");
        CategoryPatch {
            title: Some(String::new()),
            description: Some("Classic, hardware and combined manicure".to_string()),
        }
        .apply(&mut category);

        assert_eq!(category.title, "Manicure");
        assert_eq!(category.description, "Classic, hardware and combined manicure");
    }

    #[test]
    fn photo_key_is_not_serialized() {
        let mut category = Category::new("Manicure", "Classic and hardware manicure");
        category.set_media(MediaRef {
            key: "abc.png".to_string(),
            url: "https://blob/photos/abc.png".to_string(),
        });
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["photo_url"], "https://blob/photos/abc.png");
        assert!(json.get("photo_key").is_none());
    }
}
