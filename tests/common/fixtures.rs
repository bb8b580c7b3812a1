//! Mock service endpoints and document fixtures

use docconv::SelectedFile;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Stand-in for a .docx body (zip magic followed by filler)
pub const DOCX_BYTES: &[u8] = b"PK\x03\x04\x14\x00\x06\x00word/document.xml";

/// Stand-in for a converted PDF body
pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

/// A selected Word document named `name`
pub fn word_document(name: &str) -> SelectedFile {
    SelectedFile::new(name, DOCX_BYTES.to_vec())
}

/// Status body as the service renders it
pub fn status_body(task_id: &str, status: &str, progress: u32, message: &str) -> Value {
    json!({
        "task_id": task_id,
        "status": status,
        "progress": progress,
        "message": message,
        "output_filename": ""
    })
}

/// Accept uploads and answer with `task_id`
pub async fn mount_upload(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/upload/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": task_id,
            "status": "processing",
            "message": "Conversion started"
        })))
        .mount(server)
        .await;
}

/// Answer status queries for `task_id` with `bodies` in order; the last one repeats
pub async fn mount_status_sequence(server: &MockServer, task_id: &str, bodies: Vec<Value>) {
    let status_path = format!("/api/task/{}/", task_id);
    let last = bodies.len().saturating_sub(1);

    for (i, body) in bodies.into_iter().enumerate() {
        let mock = Mock::given(method("GET"))
            .and(path(status_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body));
        let mock = if i < last { mock.up_to_n_times(1) } else { mock };
        mock.mount(server).await;
    }
}

/// Serve `body` as the artifact of `task_id`, optionally with a Content-Disposition header
pub async fn mount_download(
    server: &MockServer,
    task_id: &str,
    body: &[u8],
    content_disposition: Option<&str>,
) {
    let mut response = ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/pdf");
    if let Some(value) = content_disposition {
        response = response.insert_header("Content-Disposition", value);
    }
    Mock::given(method("GET"))
        .and(path(format!("/api/download/{}/", task_id).as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Accept cleanup requests
pub async fn mount_cleanup(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/cleanup/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Cleanup completed"
        })))
        .mount(server)
        .await;
}
