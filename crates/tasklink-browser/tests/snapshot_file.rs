use std::io::Write;
use tasklink_browser::{BrowserError, BrowserSession, SnapshotSession};

#[tokio::test]
async fn test_page_loaded_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        "<html><body><a href='/profile'>Profile</a></body></html>"
    )
    .expect("write html");

    let session = SnapshotSession::new()
        .with_page_file("https://market.test/", file.path())
        .expect("load snapshot");
    session.navigate("https://market.test/").await.expect("navigate");

    let profile = session
        .find_element("a[href='/profile']")
        .await
        .expect("lookup");
    assert!(profile.is_some());

    session.close().await.expect("close");
    assert!(matches!(
        session.find_element("a").await,
        Err(BrowserError::NavigationError(_))
    ));
}

#[test]
fn test_missing_snapshot_file() {
    let result = SnapshotSession::new()
        .with_page_file("https://market.test/", std::path::Path::new("/nonexistent/page.html"));
    assert!(matches!(result, Err(BrowserError::SnapshotError(_))));
}
