use super::{box_list, error_banner, escape, page};
use crate::{
    models::{ConnectionStatus, DetectionResult, ImageFile, ImageSource, SelectedImage},
    router::RouteTable,
    server::SharedState,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::{fmt::Write, time::Instant};
use tracing::instrument;

const TITLE: &str = "Object detection";

#[instrument(skip(state))]
pub async fn show(State(state): State<SharedState>) -> Html<String> {
    state.metrics.record_view("home");

    let status = state.backend.test_connection().await;
    state.metrics.record_backend_online(status.is_online());

    render(&state.routes, Some(&status), &[], None)
}

#[instrument(skip(state, multipart))]
pub async fn detect(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    state.metrics.record_view("home");

    let images = match read_selections(&mut multipart).await {
        Ok(images) => images,
        Err(e) => {
            tracing::warn!("Rejected upload: {:?}", e);
            return (
                e.status(),
                render(&state.routes, None, &[], Some(&e.body_text())),
            )
                .into_response();
        }
    };

    let started = Instant::now();
    let outcome = state.backend.submit_images(&images).await;
    state
        .metrics
        .record_detection_duration(started.elapsed().as_millis() as u64, images.len());

    match outcome {
        Ok(results) => {
            tracing::info!(
                "Detection finished for {} of {} uploads",
                results.len(),
                images.len()
            );
            render(&state.routes, None, &results, None).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            render(&state.routes, None, &[], Some(&e.to_string())),
        )
            .into_response(),
    }
}

/// Every `files` part becomes a selection; parts without a name or content carry no file.
async fn read_selections(multipart: &mut Multipart) -> Result<Vec<ImageSource>, MultipartError> {
    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("files") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let file = (!name.is_empty() && !bytes.is_empty()).then(|| ImageFile {
            name,
            content_type,
            bytes,
        });
        images.push(ImageSource::Selection(SelectedImage { file }));
    }
    Ok(images)
}

fn render(
    routes: &RouteTable,
    status: Option<&ConnectionStatus>,
    results: &[DetectionResult],
    error: Option<&str>,
) -> Html<String> {
    let mut body = String::new();

    if let Some(status) = status {
        let _ = write!(
            body,
            "<p class=\"status {}\">{}",
            status.status.as_str(),
            escape(&status.message)
        );
        if let Some(triton) = &status.triton {
            let _ = write!(body, " (triton: {})", escape(triton));
        }
        body.push_str("</p>\n");
    }

    if let Some(error) = error {
        body.push_str(&error_banner(error));
    }

    let home = routes.href("home").unwrap_or_else(|| "/".into());
    let _ = write!(
        body,
        "<form method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"files\" accept=\"image/*\" multiple> \
         <button type=\"submit\">Detect</button></form>\n",
        escape(&home)
    );

    let save_action = routes.href("labeled").unwrap_or_default();
    for result in results {
        body.push_str(&result_card(result, &save_action));
    }

    page(routes, TITLE, &body)
}

fn result_card(result: &DetectionResult, save_action: &str) -> String {
    let mut card = String::from("<section class=\"result\">");
    let _ = write!(
        card,
        "<h2>{}</h2><p>{} detections</p>",
        escape(&result.file_name),
        result.detections
    );

    if let Some(image) = &result.processed_image {
        let _ = write!(
            card,
            "<img src=\"{}\" alt=\"{}\">",
            escape(image),
            escape(&result.file_name)
        );
    }
    card.push_str(&box_list(&result.boxes));

    let detections = serde_json::to_string(&result.boxes).unwrap_or_else(|_| "[]".into());
    let _ = write!(
        card,
        "<form method=\"post\" action=\"{}\">\
         <input type=\"hidden\" name=\"filename\" value=\"{}\">\
         <input type=\"hidden\" name=\"image\" value=\"{}\">\
         <input type=\"hidden\" name=\"detections\" value=\"{}\">\
         <button type=\"submit\">Save</button></form>",
        escape(save_action),
        escape(&result.file_name),
        escape(result.processed_image.as_deref().unwrap_or_default()),
        escape(&detections)
    );

    card.push_str("</section>\n");
    card
}
