use std::fmt;

/// Coarse classification of a response by its `Content-Type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    Html,
    Script,
    Stylesheet,
    Image,
    Font,
    Document,
    Json,
    Other,
}

impl ContentType {
    /// Classifies a `Content-Type` header value
    ///
    /// Rules are checked in priority order and the first substring match
    /// wins: html, script, stylesheet, image, font, json, document.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::state::ContentType;
    ///
    /// assert_eq!(ContentType::from_header("text/html; charset=utf-8"), ContentType::Html);
    /// assert_eq!(ContentType::from_header("font/woff2"), ContentType::Font);
    /// assert_eq!(ContentType::from_header(""), ContentType::Other);
    /// ```
    pub fn from_header(value: &str) -> Self {
        let value = value.to_ascii_lowercase();

        if value.contains("text/html") {
            Self::Html
        } else if value.contains("javascript") {
            Self::Script
        } else if value.contains("text/css") {
            Self::Stylesheet
        } else if value.contains("image/") {
            Self::Image
        } else if value.contains("font/") {
            Self::Font
        } else if value.contains("application/json") {
            Self::Json
        } else if [
            "application/pdf",
            "application/msword",
            "application/vnd.ms-excel",
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument",
        ]
        .iter()
        .any(|needle| value.contains(needle))
        {
            Self::Document
        } else {
            Self::Other
        }
    }

    /// Stable numeric id used in output rows
    pub fn id(&self) -> u8 {
        match self {
            Self::Html => 1,
            Self::Script => 2,
            Self::Stylesheet => 3,
            Self::Image => 4,
            Self::Font => 5,
            Self::Document => 6,
            Self::Json => 7,
            Self::Other => 9,
        }
    }

    /// Returns true for anything that is not an HTML document
    pub fn is_static_file(&self) -> bool {
        !matches!(self, Self::Html | Self::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Script => "JS",
            Self::Stylesheet => "CSS",
            Self::Image => "Image",
            Self::Font => "Font",
            Self::Document => "Document",
            Self::Json => "JSON",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
