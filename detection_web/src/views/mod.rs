//! Server-rendered pages mounted by the route table.

pub mod home;
pub mod labeled;

use crate::models::BoxRecord;
use crate::router::RouteTable;
use axum::response::Html;
use std::fmt::Write;

pub(crate) fn page(routes: &RouteTable, title: &str, body: &str) -> Html<String> {
    let mut nav = String::new();
    for route in routes.routes() {
        if let Some(href) = routes.href(route.name) {
            let _ = write!(
                nav,
                r#"<a href="{}">{}</a> "#,
                escape(&href),
                escape(route.name)
            );
        }
    }

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<nav>{nav}</nav>\n<main>\n<h1>{title}</h1>\n{body}</main>\n</body>\n</html>\n",
        title = escape(title),
        nav = nav.trim_end(),
        body = body,
    ))
}

pub(crate) fn error_banner(message: &str) -> String {
    format!("<p class=\"error\">{}</p>\n", escape(message))
}

pub(crate) fn box_list(boxes: &[BoxRecord]) -> String {
    if boxes.is_empty() {
        return String::new();
    }
    let mut list = String::from("<ul>");
    for record in boxes {
        let _ = write!(list, "<li>{}</li>", escape(&describe_box(record)));
    }
    list.push_str("</ul>");
    list
}

/// `class 2 (0.91) at [x, y, w, h]` for backend-shaped records, raw JSON otherwise.
fn describe_box(record: &BoxRecord) -> String {
    let class_id = record.get("class_id").and_then(|v| v.as_i64());
    let confidence = record.get("confidence").and_then(|v| v.as_f64());
    let coords = record.get("box").and_then(|v| v.as_array());

    match (class_id, confidence, coords) {
        (Some(class_id), Some(confidence), Some(coords)) => {
            let coords: Vec<String> = coords
                .iter()
                .map(|c| c.as_f64().map_or_else(|| c.to_string(), |c| format!("{:.0}", c)))
                .collect();
            format!(
                "class {} ({:.2}) at [{}]",
                class_id,
                confidence,
                coords.join(", ")
            )
        }
        _ => record.to_string(),
    }
}

pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<img src="x" onerror='a&b'>"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;a&amp;b&#39;&gt;"
        );
    }

    #[test]
    fn test_describe_box() {
        let record = json!({"box": [10.4, 20.0, 30.0, 40.0], "confidence": 0.912, "class_id": 2});
        assert_eq!(describe_box(&record), "class 2 (0.91) at [10, 20, 30, 40]");

        let other = json!({"x": 1});
        assert_eq!(describe_box(&other), r#"{"x":1}"#);
    }

    #[test]
    fn test_page_has_navigation() {
        let Html(body) = page(&RouteTable::new("/ui"), "Labeled <images>", "");

        assert!(body.contains(r#"<a href="/ui/">home</a> <a href="/ui/labeled">labeled</a>"#));
        assert!(body.contains("<title>Labeled &lt;images&gt;</title>"));
    }
}
