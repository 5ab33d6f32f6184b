//! Ordered registry of aggregate type definitions

use serde::{Deserialize, Serialize};

/// Reserved aggregate type for files matching no definition
pub const TYPE_OTHER: &str = "other";

/// A named family of files recognized by MIME type and extension
///
/// MIME types and extensions are lower-cased, de-duplicated and kept in
/// insertion order. Extensions never carry a leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTypeDefinition {
    /// Type name (e.g. `image`)
    pub name: String,

    /// Recognized MIME types
    #[serde(default)]
    pub mime_types: Vec<String>,

    /// Recognized extensions
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl AggregateTypeDefinition {
    /// Creates a normalized definition
    ///
    /// # Examples
    ///
    /// ```rust
    /// use upload_file::aggregate::AggregateTypeDefinition;
    ///
    /// let def = AggregateTypeDefinition::new("image", ["IMAGE/PNG", "image/png"], [".PNG"]);
    /// assert_eq!(def.mime_types, vec!["image/png"]);
    /// assert_eq!(def.extensions, vec!["png"]);
    /// ```
    #[must_use]
    pub fn new<M, E>(
        name: impl Into<String>,
        mime_types: impl IntoIterator<Item = M>,
        extensions: impl IntoIterator<Item = E>,
    ) -> Self
    where
        M: AsRef<str>,
        E: AsRef<str>,
    {
        Self {
            name: name.into(),
            mime_types: normalize_all(mime_types.into_iter().map(|m| normalize_mime(m.as_ref()))),
            extensions: normalize_all(
                extensions
                    .into_iter()
                    .map(|e| normalize_extension(e.as_ref())),
            ),
        }
    }

    /// Returns a copy with normalized MIME types and extensions
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self::new(self.name.clone(), &self.mime_types, &self.extensions)
    }

    /// Whether `mime_type` (already lower-cased) belongs to this type
    #[must_use]
    pub fn matches_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|m| m == mime_type)
    }

    /// Whether `extension` (already normalized) belongs to this type
    #[must_use]
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// Lower-cases and trims a MIME type
#[must_use]
pub fn normalize_mime(mime_type: &str) -> String {
    mime_type.trim().to_lowercase()
}

/// Lower-cases an extension and strips its leading dot
#[must_use]
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

fn normalize_all(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Ordered set of aggregate type definitions
///
/// Order matters: when several types match, the one registered first wins.
///
/// # Examples
///
/// ```rust
/// use upload_file::aggregate::{AggregateTypeDefinition, TypeRegistry};
///
/// let mut registry = TypeRegistry::with_defaults();
/// registry.set(AggregateTypeDefinition::new("model", ["model/gltf-binary"], ["glb"]));
///
/// assert_eq!(registry.types_for_extension("GLB"), vec!["model"]);
/// assert_eq!(registry.types_for_mime_type("image/png"), vec!["image"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: Vec<AggregateTypeDefinition>,
}

impl TypeRegistry {
    /// Builds a registry from definitions, normalizing each one
    ///
    /// A later definition with an already registered name replaces the earlier one.
    #[must_use]
    pub fn new(definitions: impl IntoIterator<Item = AggregateTypeDefinition>) -> Self {
        let mut registry = Self::default();
        for definition in definitions {
            registry.set(definition);
        }
        registry
    }

    /// Registry holding [`default_definitions`]
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(default_definitions())
    }

    /// Adds a definition, or replaces an existing one in place
    ///
    /// Replacement is wholesale: the previous MIME types and extensions are
    /// discarded, and the type keeps its original position.
    pub fn set(&mut self, definition: AggregateTypeDefinition) -> &mut Self {
        let definition = definition.normalized();
        if let Some(existing) = self.types.iter_mut().find(|t| t.name == definition.name) {
            *existing = definition;
        } else {
            self.types.push(definition);
        }
        self
    }

    /// Looks up a definition by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AggregateTypeDefinition> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Definitions in registry order
    pub fn iter(&self) -> impl Iterator<Item = &AggregateTypeDefinition> {
        self.types.iter()
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of the types recognizing `mime_type`, in registry order
    #[must_use]
    pub fn types_for_mime_type(&self, mime_type: &str) -> Vec<&str> {
        let mime_type = normalize_mime(mime_type);
        self.types
            .iter()
            .filter(|t| t.matches_mime_type(&mime_type))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Names of the types recognizing `extension`, in registry order
    #[must_use]
    pub fn types_for_extension(&self, extension: &str) -> Vec<&str> {
        let extension = normalize_extension(extension);
        self.types
            .iter()
            .filter(|t| t.matches_extension(&extension))
            .map(|t| t.name.as_str())
            .collect()
    }
}

/// Built-in aggregate types
///
/// `image_vector` comes before `image` so SVG files are classified as vector
/// images even though both types accept them.
#[must_use]
pub fn default_definitions() -> Vec<AggregateTypeDefinition> {
    vec![
        AggregateTypeDefinition::new("image_vector", ["image/svg+xml"], ["svg"]),
        AggregateTypeDefinition::new(
            "image",
            [
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/bmp",
                "image/tiff",
                "image/avif",
                "image/svg+xml",
            ],
            ["jpg", "jpeg", "jpe", "png", "gif", "webp", "bmp", "tif", "tiff", "avif", "svg"],
        ),
        AggregateTypeDefinition::new("pdf", ["application/pdf", "application/x-pdf"], ["pdf"]),
        AggregateTypeDefinition::new(
            "audio",
            [
                "audio/aac",
                "audio/ogg",
                "audio/mpeg",
                "audio/mp3",
                "audio/wav",
                "audio/x-wav",
                "audio/flac",
                "audio/x-flac",
                "audio/webm",
            ],
            ["aac", "ogg", "oga", "mp3", "wav", "flac", "weba"],
        ),
        AggregateTypeDefinition::new(
            "video",
            [
                "video/mp4",
                "video/mpeg",
                "video/ogg",
                "video/webm",
                "video/quicktime",
                "video/x-msvideo",
                "video/x-matroska",
            ],
            ["mp4", "m4v", "mpeg", "mpg", "ogv", "webm", "mov", "avi", "mkv"],
        ),
        AggregateTypeDefinition::new(
            "archive",
            [
                "application/zip",
                "application/x-zip-compressed",
                "application/x-compressed-zip",
                "application/x-tar",
                "application/gzip",
                "application/x-gzip",
                "application/x-7z-compressed",
                "application/vnd.rar",
                "application/x-rar-compressed",
            ],
            ["zip", "tar", "gz", "tgz", "7z", "rar"],
        ),
        AggregateTypeDefinition::new(
            "document",
            [
                "text/plain",
                "application/plain",
                "text/xml",
                "text/json",
                "application/json",
                "application/msword",
                "application/rtf",
                "application/vnd.oasis.opendocument.text",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ],
            ["doc", "docx", "txt", "text", "xml", "json", "rtf", "odt"],
        ),
        AggregateTypeDefinition::new(
            "spreadsheet",
            [
                "text/csv",
                "application/vnd.ms-excel",
                "application/vnd.oasis.opendocument.spreadsheet",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ],
            ["csv", "xls", "xlsx", "ods"],
        ),
        AggregateTypeDefinition::new(
            "presentation",
            [
                "application/vnd.ms-powerpoint",
                "application/vnd.oasis.opendocument.presentation",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            ],
            ["ppt", "pptx", "odp"],
        ),
    ]
}
