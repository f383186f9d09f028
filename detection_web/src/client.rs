use crate::backend::{DetectionBackend, DetectionError};
use crate::config::BackendConfig;
use crate::models::{
    jpeg_data_uri, BoxRecord, ConnectionStatus, DetectionResult, ImageSource, LabeledImage,
    LabeledRecord,
};
use async_trait::async_trait;
use chrono::{Local, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing::instrument;

const DETECT_PATH: &str = "/api/detect";
const IMAGES_PATH: &str = "/api/images";
const SAVE_PATH: &str = "/api/images/save";
const HEALTH_PATH: &str = "/health";

/// HTTP client for the detection REST API.
///
/// Holds one `reqwest::Client` configured once with the base URL and the
/// request timeout. Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DetectionClient {
    http: reqwest::Client,
    base_url: String,
}

impl DetectionClient {
    pub fn new(config: &BackendConfig) -> Result<Self, DetectionError> {
        let http = reqwest::Client::builder()
            .timeout(config.get_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.get_base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_images(&self, images: &[ImageSource]) -> Result<Value, reqwest::Error> {
        let mut form = Form::new();
        for file in images.iter().filter_map(ImageSource::file) {
            let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part("files", part);
        }

        let response = self
            .http
            .post(self.url(DETECT_PATH))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(parse_body(&response.bytes().await?))
    }

    async fn get_json(&self, path: &str) -> Result<Value, reqwest::Error> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?;

        Ok(parse_body(&response.bytes().await?))
    }

    async fn post_record(&self, record: &LabeledRecord) -> Result<Value, reqwest::Error> {
        let payload = json!({
            "filename": record.filename,
            "image_base64": record.image_base64,
            "detections": record.detections,
            "date": receipt_timestamp(),
        });

        let response = self
            .http
            .post(self.url(SAVE_PATH))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    }
}

#[async_trait]
impl DetectionBackend for DetectionClient {
    #[instrument(skip(self, images), fields(images = images.len()))]
    async fn submit_images(
        &self,
        images: &[ImageSource],
    ) -> Result<Vec<DetectionResult>, DetectionError> {
        match self.post_images(images).await {
            Ok(body) => {
                let results = map_detection_results(&body);
                tracing::debug!("Received {} detection results", results.len());
                Ok(results)
            }
            Err(err) => {
                tracing::error!("Error processing images: {:?}", err);
                Err(DetectionError::classify(&err))
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_labeled_images(&self) -> Result<Vec<LabeledImage>, DetectionError> {
        let body = self.get_json(IMAGES_PATH).await.map_err(|err| {
            tracing::error!("Error loading labeled images: {:?}", err);
            err
        })?;

        Ok(map_labeled_images(&body, &today_short_date()))
    }

    #[instrument(skip(self, record), fields(filename = %record.filename))]
    async fn save_result(&self, record: &LabeledRecord) -> Result<Value, DetectionError> {
        let saved = self.post_record(record).await.map_err(|err| {
            tracing::error!("Error saving result: {:?}", err);
            err
        })?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> ConnectionStatus {
        match self.get_json(HEALTH_PATH).await {
            Ok(body) => ConnectionStatus::online(
                body.get("triton_status")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            ),
            Err(err) => {
                tracing::warn!("Health check against {} failed: {:?}", self.base_url, err);
                ConnectionStatus::offline()
            }
        }
    }
}

/// A body that is not JSON is treated like one carrying none of the expected fields.
fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn detections_of(entry: &Value) -> Vec<BoxRecord> {
    entry
        .get("detections")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn non_empty_str<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub fn map_detection_results(body: &Value) -> Vec<DetectionResult> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().map(map_detection_result).collect())
        .unwrap_or_default()
}

fn map_detection_result(result: &Value) -> DetectionResult {
    let boxes = detections_of(result);

    DetectionResult {
        file_name: result
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        detections: boxes.len(),
        boxes,
        processed_image: non_empty_str(result, "image_base64").map(jpeg_data_uri),
    }
}

pub fn map_labeled_images(body: &Value, today: &str) -> Vec<LabeledImage> {
    body.get("images")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .map(|image| map_labeled_image(image, today))
                .collect()
        })
        .unwrap_or_default()
}

fn map_labeled_image(image: &Value, today: &str) -> LabeledImage {
    let boxes = detections_of(image);
    let url = match non_empty_str(image, "image_base64") {
        Some(image_base64) => Some(jpeg_data_uri(image_base64)),
        None => non_empty_str(image, "url").map(str::to_string),
    };

    LabeledImage {
        id: image.get("id").cloned().unwrap_or(Value::Null),
        url,
        date: non_empty_str(image, "date").unwrap_or(today).to_string(),
        detections: boxes.len(),
        boxes,
    }
}

/// Today's date in the short `M/D/YYYY` form shown next to undated images.
pub fn today_short_date() -> String {
    Local::now().format("%-m/%-d/%Y").to_string()
}

fn receipt_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_detection_results() {
        let body = json!({
            "results": [
                {
                    "filename": "a.jpg",
                    "detections": [{"x": 1, "y": 1, "w": 2, "h": 2}],
                    "image_base64": "QQ=="
                },
                {
                    "filename": "b.jpg",
                    "detections": [],
                }
            ]
        });

        let results = map_detection_results(&body);

        assert_eq!(
            results,
            vec![
                DetectionResult {
                    file_name: "a.jpg".into(),
                    detections: 1,
                    boxes: vec![json!({"x": 1, "y": 1, "w": 2, "h": 2})],
                    processed_image: Some("data:image/jpeg;base64,QQ==".into()),
                },
                DetectionResult {
                    file_name: "b.jpg".into(),
                    detections: 0,
                    boxes: vec![],
                    processed_image: None,
                },
            ]
        );
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(map_detection_results(&json!({})).is_empty());
        assert!(map_detection_results(&json!({"results": "nope"})).is_empty());
        assert!(map_detection_results(&Value::Null).is_empty());
    }

    #[test]
    fn test_malformed_result_entry_gets_defaults() {
        let results = map_detection_results(&json!({
            "results": [{"filename": 7, "detections": {"box": [1, 2, 3, 4]}, "image_base64": ""}]
        }));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_name, "");
        assert_eq!(results[0].detections, 0);
        assert!(results[0].boxes.is_empty());
        assert_eq!(results[0].processed_image, None);
    }

    #[test]
    fn test_map_labeled_images_defaults() {
        let images = map_labeled_images(&json!({"images": [{"id": 1}]}), "10/19/2026");

        assert_eq!(
            images,
            vec![LabeledImage {
                id: json!(1),
                url: None,
                date: "10/19/2026".into(),
                detections: 0,
                boxes: vec![],
            }]
        );
    }

    #[test]
    fn test_map_labeled_images_prefers_embedded_image() {
        let body = json!({
            "images": [
                {
                    "id": "x1",
                    "image_base64": "QUJD",
                    "url": "http://cdn/x1.jpg",
                    "date": "2026-10-01",
                    "detections": [{"box": [0, 0, 5, 5], "confidence": 0.9, "class_id": 2}]
                },
                {"id": "x2", "url": "http://cdn/x2.jpg"}
            ]
        });

        let images = map_labeled_images(&body, "today");

        assert_eq!(images[0].url.as_deref(), Some("data:image/jpeg;base64,QUJD"));
        assert_eq!(images[0].date, "2026-10-01");
        assert_eq!(images[0].detections, 1);
        assert_eq!(images[1].url.as_deref(), Some("http://cdn/x2.jpg"));
        assert_eq!(images[1].date, "today");
    }

    #[test]
    fn test_missing_images_is_empty() {
        assert!(map_labeled_images(&json!({"status": "ok"}), "today").is_empty());
    }

    #[test]
    fn test_parse_body_tolerates_non_json() {
        assert_eq!(parse_body(b"<html>oops</html>"), Value::Null);
        assert_eq!(parse_body(b"{\"a\":1}"), json!({"a": 1}));
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = DetectionClient::new(&BackendConfig {
            api_url: "http://localhost:8000/".into(),
            timeout_secs: 30,
        })
        .unwrap();

        assert_eq!(client.url(DETECT_PATH), "http://localhost:8000/api/detect");
    }
}
