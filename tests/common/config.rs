//! Test configuration helpers for pointing a session at a mock conversion service

use docconv::{
    Config, ConversionSession, CookieStore, EventSink, FileCollisionAction, SaveConfig,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

/// CSRF token the test cookie jar carries
pub const TEST_CSRF_TOKEN: &str = "test-token/42";

/// Configuration for `server` with a short poll interval and output into `output_dir`
pub fn test_config(server: &MockServer, output_dir: &Path) -> Config {
    Config {
        base_url: server.uri(),
        poll_interval: Duration::from_millis(20),
        poll_timeout: Some(Duration::from_secs(10)),
        request_timeout: Duration::from_secs(5),
        save: SaveConfig {
            output_dir: output_dir.to_path_buf(),
            file_collision: FileCollisionAction::Rename,
        },
        ..Default::default()
    }
}

/// Session wired to `server` over HTTP, publishing to a fresh [`EventSink`]
pub fn create_test_session(
    server: &MockServer,
    output_dir: &Path,
) -> (ConversionSession, Arc<EventSink>) {
    let sink = Arc::new(EventSink::new(1024));
    let cookies = format!(
        "sessionid=abc; csrftoken={}",
        urlencoding::encode(TEST_CSRF_TOKEN)
    );
    let session = ConversionSession::from_config(
        &test_config(server, output_dir),
        Arc::new(CookieStore::new(cookies)),
        sink.clone(),
    )
    .expect("test config must be valid");
    (session, sink)
}
