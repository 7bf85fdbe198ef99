use std::path::{Path, PathBuf};

use super::ids::{is_valid_backup_name, is_valid_id};

/// Maps `(creator_id, work_id)` identities onto the on-disk layout.
///
/// Active content lives at `<uploads_root>/<creator_id>/<work_id>/` and
/// retained versions at `<backups_root>/<creator_id>/<work_id>/<name>/`.
/// Pure and stateless; callers must validate ids before handing them in.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    uploads_root: PathBuf,
    backups_root: PathBuf,
}

impl WorkPaths {
    pub fn new(uploads_root: impl Into<PathBuf>, backups_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            backups_root: backups_root.into(),
        }
    }

    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    pub fn backups_root(&self) -> &Path {
        &self.backups_root
    }

    /// Directory holding a work's active content.
    pub fn work_dir(&self, creator_id: &str, work_id: &str) -> PathBuf {
        debug_assert!(is_valid_id(creator_id), "unvalidated creator id");
        debug_assert!(is_valid_id(work_id), "unvalidated work id");
        self.uploads_root.join(creator_id).join(work_id)
    }

    /// Directory holding all retained backups of a work.
    pub fn backup_root(&self, creator_id: &str, work_id: &str) -> PathBuf {
        debug_assert!(is_valid_id(creator_id), "unvalidated creator id");
        debug_assert!(is_valid_id(work_id), "unvalidated work id");
        self.backups_root.join(creator_id).join(work_id)
    }

    /// Directory of one named backup.
    pub fn backup_dir(&self, creator_id: &str, work_id: &str, name: &str) -> PathBuf {
        debug_assert!(is_valid_backup_name(name), "unvalidated backup name");
        self.backup_root(creator_id, work_id).join(name)
    }
}
