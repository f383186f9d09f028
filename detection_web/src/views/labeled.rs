use super::{box_list, error_banner, escape, page};
use crate::{
    models::{LabeledImage, LabeledRecord, JPEG_DATA_URI_PREFIX},
    router::RouteTable,
    server::SharedState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::fmt::Write;
use tracing::instrument;

const TITLE: &str = "Labeled images";

#[derive(Debug, Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub filename: String,
    /// Data URI or bare base64.
    #[serde(default)]
    pub image: String,
    /// JSON array of box records.
    #[serde(default)]
    pub detections: String,
}

impl SaveForm {
    fn into_record(self) -> LabeledRecord {
        let image_base64 = self
            .image
            .strip_prefix(JPEG_DATA_URI_PREFIX)
            .unwrap_or(&self.image)
            .to_string();
        let detections = serde_json::from_str(&self.detections).unwrap_or_default();

        LabeledRecord {
            filename: self.filename,
            image_base64,
            detections,
        }
    }
}

#[instrument(skip(state))]
pub async fn show(State(state): State<SharedState>) -> Response {
    state.metrics.record_view("labeled");
    gallery(&state, None).await
}

#[instrument(skip(state, form), fields(filename = %form.filename))]
pub async fn save(State(state): State<SharedState>, Form(form): Form<SaveForm>) -> Response {
    state.metrics.record_view("labeled");

    let record = form.into_record();
    match state.backend.save_result(&record).await {
        Ok(saved) => {
            tracing::info!("Saved {}: {}", record.filename, saved);
            let target = state.routes.href("labeled").unwrap_or_else(|| "/".into());
            Redirect::to(&target).into_response()
        }
        Err(e) => gallery(&state, Some(format!("Could not save {}: {}", record.filename, e))).await,
    }
}

async fn gallery(state: &SharedState, error: Option<String>) -> Response {
    match state.backend.get_labeled_images().await {
        Ok(images) => {
            let status = if error.is_some() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::OK
            };
            (status, render(&state.routes, &images, error.as_deref())).into_response()
        }
        Err(e) => {
            let message = match error {
                Some(error) => format!("{}. {}", error, e),
                None => e.to_string(),
            };
            (
                StatusCode::BAD_GATEWAY,
                render(&state.routes, &[], Some(&message)),
            )
                .into_response()
        }
    }
}

fn render(routes: &RouteTable, images: &[LabeledImage], error: Option<&str>) -> Html<String> {
    let mut body = String::new();

    if let Some(error) = error {
        body.push_str(&error_banner(error));
    }

    if images.is_empty() && error.is_none() {
        body.push_str("<p>No labeled images yet.</p>\n");
    }

    for image in images {
        let id = match &image.id {
            serde_json::Value::String(id) => id.clone(),
            other => other.to_string(),
        };
        let _ = write!(
            body,
            "<figure class=\"labeled\" id=\"image-{}\">",
            escape(&id)
        );
        if let Some(url) = &image.url {
            let _ = write!(body, "<img src=\"{}\" alt=\"{}\">", escape(url), escape(&id));
        }
        let _ = write!(
            body,
            "<figcaption>{} &middot; {} detections</figcaption>{}</figure>\n",
            escape(&image.date),
            image.detections,
            box_list(&image.boxes)
        );
    }

    page(routes, TITLE, &body)
}
