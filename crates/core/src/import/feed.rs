//! Bulk feed location and download.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::ImportError;
use crate::scryfall::{CardSource, ScryfallError};

/// File name of the local payload copy.
pub const FEED_FILE_NAME: &str = "default-cards.json";

/// Find the download URL of the bulk feed whose type is `feed_type`.
pub async fn locate_feed(source: &dyn CardSource, feed_type: &str) -> Result<String, ScryfallError> {
    let feeds = source.list_bulk_feeds().await.map_err(|e| match e {
        ScryfallError::CatalogUnavailable(_) => e,
        other => ScryfallError::CatalogUnavailable(other.to_string()),
    })?;

    debug!("Bulk catalog lists {} feed(s)", feeds.len());

    feeds
        .into_iter()
        .find(|feed| feed.feed_type == feed_type)
        .map(|feed| feed.download_uri)
        .ok_or_else(|| ScryfallError::FeedNotFound(feed_type.to_string()))
}

/// Download the payload at `url` into `dest_dir`, replacing any previous copy.
///
/// Nothing is written until the whole payload has been received.
pub async fn fetch_feed(
    source: &dyn CardSource,
    url: &str,
    dest_dir: &Path,
) -> Result<PathBuf, ImportError> {
    info!("Downloading bulk feed from {}", url);
    let bytes = source.download(url).await?;

    tokio::fs::create_dir_all(dest_dir).await.map_err(|e| {
        ImportError::Io(format!(
            "Failed to create {}: {}",
            dest_dir.display(),
            e
        ))
    })?;

    let path = dest_dir.join(FEED_FILE_NAME);
    let partial = dest_dir.join(format!("{}.partial", FEED_FILE_NAME));

    if let Err(e) = write_and_replace(&partial, &path, &bytes).await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            debug!("Could not remove {}: {}", partial.display(), cleanup);
        }
        return Err(e);
    }

    info!(
        "Downloaded bulk feed: {:.1} MB to {}",
        bytes.len() as f64 / 1024.0 / 1024.0,
        path.display()
    );

    Ok(path)
}

async fn write_and_replace(partial: &Path, path: &Path, bytes: &[u8]) -> Result<(), ImportError> {
    tokio::fs::write(partial, bytes)
        .await
        .map_err(|e| ImportError::Io(format!("Failed to write {}: {}", partial.display(), e)))?;
    tokio::fs::rename(partial, path)
        .await
        .map_err(|e| ImportError::Io(format!("Failed to replace {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockCardSource};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_locate_feed_picks_matching_type() {
        let source = MockCardSource::new();
        source
            .add_feed(fixtures::bulk_feed("oracle_cards", "https://x/oracle.json"))
            .await;
        source
            .add_feed(fixtures::bulk_feed("default_cards", "https://x/default.json"))
            .await;

        let url = locate_feed(&source, "default_cards").await.unwrap();
        assert_eq!(url, "https://x/default.json");
    }

    #[tokio::test]
    async fn test_locate_feed_not_found() {
        let source = MockCardSource::new();
        source
            .add_feed(fixtures::bulk_feed("oracle_cards", "https://x/oracle.json"))
            .await;

        let err = locate_feed(&source, "default_cards").await.unwrap_err();
        assert!(matches!(err, ScryfallError::FeedNotFound(t) if t == "default_cards"));
    }

    #[tokio::test]
    async fn test_locate_feed_catalog_failure() {
        let source = MockCardSource::new();
        source
            .set_next_error(ScryfallError::ApiError {
                status: 503,
                message: "maintenance".to_string(),
            })
            .await;

        let err = locate_feed(&source, "default_cards").await.unwrap_err();
        assert!(matches!(err, ScryfallError::CatalogUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_feed_writes_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("bulk");
        let source = MockCardSource::new();

        source.set_payload("https://x/a.json", b"[1]".to_vec()).await;
        let path = fetch_feed(&source, "https://x/a.json", &dest).await.unwrap();
        assert_eq!(path, dest.join(FEED_FILE_NAME));
        assert_eq!(std::fs::read(&path).unwrap(), b"[1]");

        source.set_payload("https://x/b.json", b"[2, 3]".to_vec()).await;
        fetch_feed(&source, "https://x/b.json", &dest).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"[2, 3]");
        assert!(!dest.join("default-cards.json.partial").exists());
    }

    #[tokio::test]
    async fn test_failed_replace_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        // A directory in the payload's place makes the rename fail
        std::fs::create_dir_all(dir.path().join(FEED_FILE_NAME).join("occupied")).unwrap();
        let source = MockCardSource::new();
        source.set_payload("https://x/a.json", b"[1]".to_vec()).await;

        let err = fetch_feed(&source, "https://x/a.json", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Io(_)));
        assert!(!dir
            .path()
            .join(format!("{}.partial", FEED_FILE_NAME))
            .exists());
    }

    #[tokio::test]
    async fn test_fetch_feed_failure_keeps_previous_copy() {
        let dir = TempDir::new().unwrap();
        let source = MockCardSource::new();
        source.set_payload("https://x/a.json", b"[1]".to_vec()).await;
        let path = fetch_feed(&source, "https://x/a.json", dir.path())
            .await
            .unwrap();

        let err = fetch_feed(&source, "https://x/missing.json", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Source(ScryfallError::DownloadFailed { status: 404 })
        ));
        assert_eq!(std::fs::read(&path).unwrap(), b"[1]");
    }
}
