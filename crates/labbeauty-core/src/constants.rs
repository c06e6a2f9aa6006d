//! Limits and fixed values shared across crates.

use std::time::Duration;

/// Image extensions accepted for catalog photos (lowercase, with the leading dot).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Maximum multipart body size for photo uploads.
pub const MAX_MULTIPART_BYTES: usize = 10 * 1024 * 1024;

/// Maximum JSON body size.
pub const MAX_JSON_BYTES: usize = 1_048_576;

/// Deadline applied to every relational operation.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE_NAME: &str = "cookie-auth";

pub const TITLE_MAX_CHARS: usize = 55;
pub const DESCRIPTION_MIN_CHARS: usize = 20;
pub const SUBCATEGORY_NAME_MIN_CHARS: usize = 8;
