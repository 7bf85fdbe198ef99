use std::path::{Path, PathBuf};

use tokio::fs;

use super::error::StorageError;
use super::paths::WorkPaths;

/// Manages the on-disk tree backing works and their backup chains.
///
/// All version transitions are directory renames, never copies, so a backup
/// or restore is O(1) regardless of content size. The uploads root also
/// hosts a `.tmp` area for staging inbound multipart content; staging dirs
/// live on the same filesystem so the final move into the active slot is a
/// rename as well.
pub struct WorkStore {
    paths: WorkPaths,
}

impl WorkStore {
    /// Create a store, ensuring both roots and the staging area exist.
    pub async fn new(
        uploads_root: impl Into<PathBuf>,
        backups_root: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        let paths = WorkPaths::new(uploads_root, backups_root);
        create_dir_all(paths.uploads_root()).await?;
        create_dir_all(paths.backups_root()).await?;
        create_dir_all(&paths.uploads_root().join(".tmp")).await?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &WorkPaths {
        &self.paths
    }

    /// A fresh, unique staging directory path. Not created here.
    pub fn staging_dir(&self) -> PathBuf {
        self.paths
            .uploads_root()
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    pub async fn active_exists(&self, creator_id: &str, work_id: &str) -> Result<bool, StorageError> {
        let dir = self.paths.work_dir(creator_id, work_id);
        fs::try_exists(&dir).await.map_err(|e| StorageError::io(dir, e))
    }

    pub async fn backup_exists(
        &self,
        creator_id: &str,
        work_id: &str,
        name: &str,
    ) -> Result<bool, StorageError> {
        let dir = self.paths.backup_dir(creator_id, work_id, name);
        fs::try_exists(&dir).await.map_err(|e| StorageError::io(dir, e))
    }

    /// Names of backup directories currently on disk, sorted numerically.
    pub async fn list_backup_names(
        &self,
        creator_id: &str,
        work_id: &str,
    ) -> Result<Vec<String>, StorageError> {
        let root = self.paths.backup_root(creator_id, work_id);
        if !fs::try_exists(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?
        {
            return Ok(Vec::new());
        }

        let mut names: Vec<(u64, String)> = Vec::new();
        let mut entries = fs::read_dir(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&root, e))?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            // Non-numeric entries are not backups; ignore them.
            if let Ok(n) = name.parse::<u64>() {
                names.push((n, name.to_string()));
            }
        }

        names.sort();
        Ok(names.into_iter().map(|(_, s)| s).collect())
    }

    /// Next backup name for a work: max existing directory name + 1.
    ///
    /// Derived from the directory listing rather than a counter on the work
    /// record, so a record that lost track of a backup entry can never cause
    /// a name to be reused. Costs one O(n) listing per overwrite.
    pub async fn next_backup_name(
        &self,
        creator_id: &str,
        work_id: &str,
    ) -> Result<String, StorageError> {
        let max = self
            .list_backup_names(creator_id, work_id)
            .await?
            .iter()
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok((max + 1).to_string())
    }

    /// Move the active content of a work into a new numbered backup slot,
    /// returning the slot name. The active directory must exist.
    pub async fn backup_active(
        &self,
        creator_id: &str,
        work_id: &str,
    ) -> Result<String, StorageError> {
        let name = self.next_backup_name(creator_id, work_id).await?;
        let active = self.paths.work_dir(creator_id, work_id);
        let slot = self.paths.backup_dir(creator_id, work_id, &name);
        rename(&active, &slot).await?;
        Ok(name)
    }

    /// Move a named backup back into the active slot.
    ///
    /// The caller is responsible for vacating the active slot first (via
    /// [`backup_active`](Self::backup_active)).
    pub async fn promote_backup(
        &self,
        creator_id: &str,
        work_id: &str,
        name: &str,
    ) -> Result<(), StorageError> {
        let slot = self.paths.backup_dir(creator_id, work_id, name);
        if !fs::try_exists(&slot)
            .await
            .map_err(|e| StorageError::io(&slot, e))?
        {
            return Err(StorageError::BackupMissing {
                creator_id: creator_id.to_string(),
                work_id: work_id.to_string(),
                name: name.to_string(),
            });
        }
        let active = self.paths.work_dir(creator_id, work_id);
        rename(&slot, &active).await
    }

    /// Permanently remove a named backup directory.
    pub async fn remove_backup(
        &self,
        creator_id: &str,
        work_id: &str,
        name: &str,
    ) -> Result<(), StorageError> {
        remove_dir_all_if_exists(&self.paths.backup_dir(creator_id, work_id, name)).await
    }

    /// Remove only the active tree, leaving any backup chain in place.
    pub async fn remove_active(&self, creator_id: &str, work_id: &str) -> Result<(), StorageError> {
        remove_dir_all_if_exists(&self.paths.work_dir(creator_id, work_id)).await
    }

    /// Remove a work's active tree and its entire backup chain.
    pub async fn remove_work(&self, creator_id: &str, work_id: &str) -> Result<(), StorageError> {
        remove_dir_all_if_exists(&self.paths.work_dir(creator_id, work_id)).await?;
        remove_dir_all_if_exists(&self.paths.backup_root(creator_id, work_id)).await
    }

    /// Move a work (active tree + backup chain) to a new identity.
    ///
    /// Two independent renames; the backup tree goes first so that a failure
    /// between the moves leaves the active content still at the old key,
    /// where the record continues to point at it.
    pub async fn move_work(
        &self,
        creator_id: &str,
        work_id: &str,
        new_creator_id: &str,
        new_work_id: &str,
    ) -> Result<(), StorageError> {
        let old_backups = self.paths.backup_root(creator_id, work_id);
        if fs::try_exists(&old_backups)
            .await
            .map_err(|e| StorageError::io(&old_backups, e))?
        {
            rename(&old_backups, &self.paths.backup_root(new_creator_id, new_work_id)).await?;
        }

        let old_active = self.paths.work_dir(creator_id, work_id);
        if fs::try_exists(&old_active)
            .await
            .map_err(|e| StorageError::io(&old_active, e))?
        {
            rename(&old_active, &self.paths.work_dir(new_creator_id, new_work_id)).await?;
        }

        Ok(())
    }

    /// Total bytes under a directory, recursively. Missing directories count
    /// as zero.
    pub async fn dir_size(path: &Path) -> Result<u64, StorageError> {
        if !fs::try_exists(path)
            .await
            .map_err(|e| StorageError::io(path, e))?
        {
            return Ok(0);
        }

        let mut total = 0u64;
        let mut stack = vec![path.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| StorageError::io(&dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(&dir, e))?
            {
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| StorageError::io(entry.path(), e))?;
                if meta.is_dir() {
                    stack.push(entry.path());
                } else {
                    total += meta.len();
                }
            }
        }
        Ok(total)
    }
}

async fn create_dir_all(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| StorageError::io(path, e))
}

/// Rename `from` to `to`, creating `to`'s parent directories first.
async fn rename(from: &Path, to: &Path) -> Result<(), StorageError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent).await?;
    }
    fs::rename(from, to)
        .await
        .map_err(|e| StorageError::io(from, e))
}

async fn remove_dir_all_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (WorkStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkStore::new(dir.path().join("uploads"), dir.path().join("backups"))
            .await
            .unwrap();
        (store, dir)
    }

    async fn write_file(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, content).await.unwrap();
    }

    async fn seed_active(store: &WorkStore, creator: &str, work: &str, content: &[u8]) {
        let dir = store.paths().work_dir(creator, work);
        write_file(&dir.join("content/main.bin"), content).await;
    }

    #[tokio::test]
    async fn constructor_creates_roots_and_staging() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("deep/uploads");
        let backups = dir.path().join("deep/backups");
        let _store = WorkStore::new(&uploads, &backups).await.unwrap();
        assert!(uploads.join(".tmp").exists());
        assert!(backups.exists());
    }

    #[tokio::test]
    async fn next_backup_name_starts_at_one() {
        let (store, _dir) = temp_store().await;
        assert_eq!(store.next_backup_name("acme", "demo").await.unwrap(), "1");
    }

    #[tokio::test]
    async fn next_backup_name_is_numeric_max_plus_one() {
        let (store, _dir) = temp_store().await;
        for name in ["1", "2", "10"] {
            fs::create_dir_all(store.paths().backup_dir("acme", "demo", name))
                .await
                .unwrap();
        }
        // "10" must win over "2" despite lexicographic order.
        assert_eq!(store.next_backup_name("acme", "demo").await.unwrap(), "11");
    }

    #[tokio::test]
    async fn next_backup_name_ignores_non_numeric_entries() {
        let (store, _dir) = temp_store().await;
        let root = store.paths().backup_root("acme", "demo");
        fs::create_dir_all(root.join("3")).await.unwrap();
        fs::create_dir_all(root.join("stray")).await.unwrap();
        assert_eq!(store.next_backup_name("acme", "demo").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn backup_active_moves_content() {
        let (store, _dir) = temp_store().await;
        seed_active(&store, "acme", "demo", b"version-a").await;

        let name = store.backup_active("acme", "demo").await.unwrap();
        assert_eq!(name, "1");
        assert!(!store.active_exists("acme", "demo").await.unwrap());

        let backed = store
            .paths()
            .backup_dir("acme", "demo", "1")
            .join("content/main.bin");
        assert_eq!(fs::read(&backed).await.unwrap(), b"version-a");
    }

    #[tokio::test]
    async fn backup_names_are_monotonic_across_overwrites() {
        let (store, _dir) = temp_store().await;
        for i in 0..3 {
            seed_active(&store, "acme", "demo", format!("v{i}").as_bytes()).await;
            let name = store.backup_active("acme", "demo").await.unwrap();
            assert_eq!(name, (i + 1).to_string());
        }
        assert_eq!(
            store.list_backup_names("acme", "demo").await.unwrap(),
            vec!["1", "2", "3"]
        );
    }

    #[tokio::test]
    async fn promote_backup_restores_bytes() {
        let (store, _dir) = temp_store().await;
        seed_active(&store, "acme", "demo", b"version-a").await;
        store.backup_active("acme", "demo").await.unwrap();

        store.promote_backup("acme", "demo", "1").await.unwrap();
        let active = store
            .paths()
            .work_dir("acme", "demo")
            .join("content/main.bin");
        assert_eq!(fs::read(&active).await.unwrap(), b"version-a");
        assert!(!store.backup_exists("acme", "demo", "1").await.unwrap());
    }

    #[tokio::test]
    async fn promote_missing_backup_fails() {
        let (store, _dir) = temp_store().await;
        let err = store.promote_backup("acme", "demo", "7").await.unwrap_err();
        assert!(matches!(err, StorageError::BackupMissing { .. }));
    }

    #[tokio::test]
    async fn remove_work_deletes_both_trees() {
        let (store, _dir) = temp_store().await;
        seed_active(&store, "acme", "demo", b"v1").await;
        store.backup_active("acme", "demo").await.unwrap();
        seed_active(&store, "acme", "demo", b"v2").await;

        store.remove_work("acme", "demo").await.unwrap();
        assert!(!store.active_exists("acme", "demo").await.unwrap());
        assert!(
            !fs::try_exists(store.paths().backup_root("acme", "demo"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn remove_work_tolerates_missing_trees() {
        let (store, _dir) = temp_store().await;
        store.remove_work("ghost", "none").await.unwrap();
    }

    #[tokio::test]
    async fn move_work_carries_backups_unchanged() {
        let (store, _dir) = temp_store().await;
        seed_active(&store, "acme", "demo", b"v1").await;
        store.backup_active("acme", "demo").await.unwrap();
        seed_active(&store, "acme", "demo", b"v2").await;

        store.move_work("acme", "demo", "umbrella", "demo-2").await.unwrap();

        assert!(!store.active_exists("acme", "demo").await.unwrap());
        assert!(store.active_exists("umbrella", "demo-2").await.unwrap());
        assert_eq!(
            store.list_backup_names("umbrella", "demo-2").await.unwrap(),
            vec!["1"]
        );
        let moved = store
            .paths()
            .backup_dir("umbrella", "demo-2", "1")
            .join("content/main.bin");
        assert_eq!(fs::read(&moved).await.unwrap(), b"v1");
    }

    #[tokio::test]
    async fn move_work_without_backups() {
        let (store, _dir) = temp_store().await;
        seed_active(&store, "acme", "solo", b"only").await;
        store.move_work("acme", "solo", "acme", "renamed").await.unwrap();
        assert!(store.active_exists("acme", "renamed").await.unwrap());
    }

    #[tokio::test]
    async fn dir_size_sums_recursively() {
        let (store, _dir) = temp_store().await;
        let work = store.paths().work_dir("acme", "demo");
        write_file(&work.join("content/a.bin"), &[0u8; 100]).await;
        write_file(&work.join("content/sub/b.bin"), &[0u8; 50]).await;
        write_file(&work.join("thumbnail/t.png"), &[0u8; 7]).await;
        assert_eq!(WorkStore::dir_size(&work).await.unwrap(), 157);
    }

    #[tokio::test]
    async fn dir_size_of_missing_dir_is_zero() {
        let (store, _dir) = temp_store().await;
        let missing = store.paths().work_dir("no", "where");
        assert_eq!(WorkStore::dir_size(&missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn staging_dirs_are_unique() {
        let (store, _dir) = temp_store().await;
        assert_ne!(store.staging_dir(), store.staging_dir());
    }
}
