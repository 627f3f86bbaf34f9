use std::path::Path;
use tracing::info;

/// Creates the local asset root used for request-scoped staging files.
pub async fn ensure_assets_dir(assets_root: &Path) -> anyhow::Result<()> {
    if tokio::fs::try_exists(assets_root).await? {
        return Ok(());
    }

    tokio::fs::create_dir_all(assets_root).await?;
    info!("📁 Created assets root at {}", assets_root.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("assets");

        ensure_assets_dir(&root).await.unwrap();
        assert!(root.is_dir());

        // Idempotent
        ensure_assets_dir(&root).await.unwrap();
    }
}
