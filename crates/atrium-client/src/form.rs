//! Multipart form assembly
//!
//! Resource forms describe their fields as tagged [`FieldValue`]s; each tag
//! has one encoding rule, applied by [`encode_fields`].

use crate::error::{ClientError, ClientResult};
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// An in-memory file upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name sent to the server
    pub file_name: String,
    /// MIME type
    pub mime: String,
    /// Contents
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// File from raw parts
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    ///
    /// # Errors
    ///
    /// Returns a validation error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ClientError::validation("file", format!("cannot read {}: {err}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self::new(file_name, mime_for(path), bytes))
    }
}

/// MIME type for an upload, by file extension
#[must_use]
pub fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// A form field value and how it is encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Always sent, even when empty
    Text(String),
    /// Omitted when absent or blank
    OptionalText(Option<String>),
    /// Sent as `"true"` or `"false"`
    Bool(bool),
    /// Comma-joined into one part; omitted when empty
    List(Vec<String>),
    /// One part per entry under the same name
    Repeated(Vec<String>),
    /// Single optional upload
    File(Option<FilePart>),
    /// One part per upload under the same name
    Files(Vec<FilePart>),
}

/// A named form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Part name
    pub name: &'static str,
    /// Value and encoding
    pub value: FieldValue,
}

impl FormField {
    /// Field with the given name and value
    #[must_use]
    pub const fn new(name: &'static str, value: FieldValue) -> Self {
        Self { name, value }
    }
}

/// A single encoded multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedPart {
    /// Text part
    Text {
        /// Part name
        name: &'static str,
        /// Value
        value: String,
    },
    /// File part
    File {
        /// Part name
        name: &'static str,
        /// Upload
        file: FilePart,
    },
}

/// Apply each field's encoding rule, in field order
#[must_use]
pub fn encode_fields(fields: Vec<FormField>) -> Vec<EncodedPart> {
    let mut parts = Vec::new();
    for FormField { name, value } in fields {
        match value {
            FieldValue::Text(value) => parts.push(EncodedPart::Text { name, value }),
            FieldValue::OptionalText(value) => {
                if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                    parts.push(EncodedPart::Text { name, value });
                }
            }
            FieldValue::Bool(flag) => parts.push(EncodedPart::Text {
                name,
                value: flag.to_string(),
            }),
            FieldValue::List(items) => {
                let items: Vec<String> = items
                    .into_iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                if !items.is_empty() {
                    parts.push(EncodedPart::Text {
                        name,
                        value: items.join(","),
                    });
                }
            }
            FieldValue::Repeated(items) => {
                parts.extend(items.into_iter().map(|value| EncodedPart::Text { name, value }));
            }
            FieldValue::File(file) => {
                parts.extend(file.map(|file| EncodedPart::File { name, file }));
            }
            FieldValue::Files(files) => {
                parts.extend(files.into_iter().map(|file| EncodedPart::File { name, file }));
            }
        }
    }
    parts
}

/// Build a `reqwest` form from encoded parts
///
/// # Errors
///
/// Returns a validation error if a file carries an unparsable MIME type.
pub fn into_form(parts: Vec<EncodedPart>) -> ClientResult<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            EncodedPart::Text { name, value } => form.text(name, value),
            EncodedPart::File { name, file } => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime)
                    .map_err(|_| {
                        ClientError::validation(name, format!("invalid MIME type '{}'", file.mime))
                    })?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

/// A value that can be sent as a multipart body
pub trait MultipartBody {
    /// Fields in send order
    fn fields(&self) -> Vec<FormField>;

    /// Encoded parts, useful for inspection
    fn parts(&self) -> Vec<EncodedPart> {
        encode_fields(self.fields())
    }

    /// The `reqwest` form
    ///
    /// # Errors
    ///
    /// Returns a validation error if a file part is malformed.
    fn to_form(&self) -> ClientResult<Form> {
        into_form(self.parts())
    }
}

/// Part value by name, for tests and logging
#[must_use]
pub fn text_values<'a>(parts: &'a [EncodedPart], wanted: &str) -> Vec<&'a str> {
    parts
        .iter()
        .filter_map(|part| match part {
            EncodedPart::Text { name, value } if *name == wanted => Some(value.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn field(name: &'static str, value: FieldValue) -> Vec<EncodedPart> {
        encode_fields(vec![FormField::new(name, value)])
    }

    #[test]
    fn test_text_is_always_sent() {
        assert_eq!(
            field("title", FieldValue::Text(String::new())),
            vec![EncodedPart::Text {
                name: "title",
                value: String::new()
            }]
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("   ".to_string()))]
    fn test_blank_optional_text_is_omitted(#[case] value: Option<String>) {
        assert!(field("location", FieldValue::OptionalText(value)).is_empty());
    }

    #[test]
    fn test_bool_and_list_encoding() {
        let parts = encode_fields(vec![
            FormField::new("isFeatured", FieldValue::Bool(false)),
            FormField::new(
                "tags",
                FieldValue::List(vec!["rust".into(), " web ".into(), String::new()]),
            ),
            FormField::new("empty", FieldValue::List(Vec::new())),
        ]);

        assert_eq!(text_values(&parts, "isFeatured"), vec!["false"]);
        assert_eq!(text_values(&parts, "tags"), vec!["rust,web"]);
        assert!(text_values(&parts, "empty").is_empty());
    }

    #[test]
    fn test_repeated_and_files_are_one_part_each() {
        let files = vec![
            FilePart::new("a.png", "image/png", vec![1]),
            FilePart::new("b.png", "image/png", vec![2]),
        ];
        let parts = encode_fields(vec![
            FormField::new("existingImages", FieldValue::Repeated(vec!["x".into(), "y".into()])),
            FormField::new("images", FieldValue::Files(files)),
            FormField::new("coverImage", FieldValue::File(None)),
        ]);

        assert_eq!(text_values(&parts, "existingImages"), vec!["x", "y"]);
        let file_parts = parts
            .iter()
            .filter(|p| matches!(p, EncodedPart::File { name: "images", .. }))
            .count();
        assert_eq!(file_parts, 2);
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let parts = field(
            "coverImage",
            FieldValue::File(Some(FilePart::new("x", "not a mime", vec![]))),
        );
        assert!(into_form(parts).is_err());
    }

    #[test]
    fn test_mime_guessing() {
        assert_eq!(mime_for(Path::new("cover.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("banner.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("README")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_file_part_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let file = FilePart::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "cover.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.bytes.len(), 4);

        assert!(FilePart::from_path(dir.path().join("missing.png")).await.is_err());
    }
}
