//! View models produced by the detection client and the inputs it accepts.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

/// One bounding-box record as reported by the backend. Passed through untouched.
pub type BoxRecord = Value;

pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

pub fn jpeg_data_uri(image_base64: &str) -> String {
    format!("{}{}", JPEG_DATA_URI_PREFIX, image_base64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub file_name: String,
    pub detections: usize,
    pub boxes: Vec<BoxRecord>,
    pub processed_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledImage {
    pub id: Value,
    pub url: Option<String>,
    pub date: String,
    pub detections: usize,
    pub boxes: Vec<BoxRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Offline,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Online => "online",
            Status::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triton: Option<String>,
}

impl ConnectionStatus {
    pub fn online(triton: Option<String>) -> Self {
        Self {
            status: Status::Online,
            message: "Backend server available".into(),
            triton,
        }
    }

    pub fn offline() -> Self {
        Self {
            status: Status::Offline,
            message: "Backend server not responding".into(),
            triton: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == Status::Online
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A file picked in the upload form. An empty file input still produces a
/// selection, just without a file behind it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectedImage {
    pub file: Option<ImageFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    File(ImageFile),
    Selection(SelectedImage),
}

impl ImageSource {
    pub fn file(&self) -> Option<&ImageFile> {
        match self {
            ImageSource::File(file) => Some(file),
            ImageSource::Selection(selection) => selection.file.as_ref(),
        }
    }
}

impl From<ImageFile> for ImageSource {
    fn from(file: ImageFile) -> Self {
        ImageSource::File(file)
    }
}

/// Caller-supplied part of a save request. The receipt date is added by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub filename: String,
    pub image_base64: String,
    pub detections: Vec<BoxRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detection_result_serializes_camel_case() {
        let result = DetectionResult {
            file_name: "a.jpg".into(),
            detections: 1,
            boxes: vec![json!({"x": 1, "y": 1, "w": 2, "h": 2})],
            processed_image: Some(jpeg_data_uri("QQ==")),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "fileName": "a.jpg",
                "detections": 1,
                "boxes": [{"x": 1, "y": 1, "w": 2, "h": 2}],
                "processedImage": "data:image/jpeg;base64,QQ=="
            })
        );
    }

    #[test]
    fn test_offline_status_has_no_triton() {
        let value = serde_json::to_value(ConnectionStatus::offline()).unwrap();
        assert_eq!(
            value,
            json!({"status": "offline", "message": "Backend server not responding"})
        );
    }

    #[test]
    fn test_image_source_resolves_file() {
        let file = ImageFile::new("a.jpg", vec![1u8, 2, 3]);

        assert_eq!(ImageSource::from(file.clone()).file(), Some(&file));
        assert_eq!(
            ImageSource::Selection(SelectedImage {
                file: Some(file.clone())
            })
            .file(),
            Some(&file)
        );
        assert_eq!(ImageSource::Selection(SelectedImage::default()).file(), None);
    }
}
