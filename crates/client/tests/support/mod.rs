//! Shared helpers for integration tests

use chrono::Utc;
use url::Url;

use common::record::{FileRecord, NewFileRecord};

/// Serve an axum router on an ephemeral loopback port, returning its base
/// URL. The server task is abandoned when the test ends.
#[allow(dead_code)]
pub async fn serve(router: axum::Router) -> Url {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve stub");
    });
    Url::parse(&format!("http://{}", addr)).expect("stub base url")
}

#[allow(dead_code)]
pub fn new_record(title: &str, password_hash: &str) -> NewFileRecord {
    NewFileRecord {
        title: title.to_string(),
        description: String::new(),
        filename: format!("{}.txt", title),
        url: None,
        public_id: None,
        format: Some("txt".to_string()),
        resource_type: Some("raw".to_string()),
        version: None,
        password_hash: password_hash.to_string(),
        download_count: 0,
    }
}

#[allow(dead_code)]
pub fn record_with_url(id: &str, url: Url) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        title: id.to_string(),
        description: String::new(),
        filename: format!("{}.txt", id),
        url: Some(url),
        public_id: None,
        format: None,
        resource_type: None,
        version: None,
        password_hash: String::new(),
        download_count: 0,
        created_at: Utc::now(),
    }
}
