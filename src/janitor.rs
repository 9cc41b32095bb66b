//! Working-directory and delivery-copy lifecycle
//!
//! Every job writes into its own temporary directory. When the artifact is
//! delivered, it is copied into a second temporary directory whose lifetime is
//! tied to the response body: the copy is removed when the stream is dropped,
//! whether the client read it all or disconnected early. Cleanup failures are
//! logged and never surface to the caller.

use crate::error::{Error, Result};
use crate::registry::CompletedTask;
use crate::types::TaskId;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::io::ReaderStream;

const WORK_DIR_PREFIX: &str = "media-dl-job-";
const DELIVERY_DIR_PREFIX: &str = "media-dl-delivery-";

/// Create a fresh, uniquely named job directory under `root`
///
/// `root` must already exist; the downloader creates it at startup.
pub async fn create_work_dir(root: &Path) -> Result<TempDir> {
    temp_dir_in(root, WORK_DIR_PREFIX).await
}

async fn temp_dir_in(root: &Path, prefix: &'static str) -> Result<TempDir> {
    let root = root.to_path_buf();
    let dir = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new().prefix(prefix).tempdir_in(root)
    })
    .await
    .map_err(|e| Error::Other(format!("temp dir task panicked: {e}")))??;
    Ok(dir)
}

/// Remove a job directory, swallowing errors
pub fn release_work_dir(id: TaskId, dir: TempDir) {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => tracing::debug!(task_id = %id, path = %path.display(), "released work dir"),
        Err(e) => tracing::warn!(
            task_id = %id,
            path = %path.display(),
            error = %e,
            "failed to remove work dir"
        ),
    }
}

/// A delivery copy of an artifact, removed on drop
#[derive(Debug)]
pub struct DeliveryCopy {
    id: TaskId,
    dir: Option<TempDir>,
    path: PathBuf,
    filename: String,
    len: u64,
}

impl DeliveryCopy {
    /// Path of the copied file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename presented to the client
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size of the copy in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the copy is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Open the copy as a byte stream that owns this guard
    ///
    /// The copy's directory is removed once the returned stream is dropped.
    pub async fn into_stream(
        self,
    ) -> Result<impl Stream<Item = std::io::Result<axum::body::Bytes>> + Send + 'static> {
        let file = tokio::fs::File::open(&self.path).await?;
        let guard = self;
        Ok(ReaderStream::new(file).map(move |chunk| {
            let _held = &guard;
            chunk
        }))
    }
}

impl Drop for DeliveryCopy {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(
                    task_id = %self.id,
                    path = %path.display(),
                    error = %e,
                    "failed to remove delivery copy"
                );
            } else {
                tracing::debug!(task_id = %self.id, "removed delivery copy");
            }
        }
    }
}

/// Copy a completed task's artifact into a fresh delivery directory
///
/// The task keeps its work dir; once the copy is in hand, pass the task to
/// [`finish_delivery`].
pub async fn prepare_delivery(task: &CompletedTask, delivery_root: &Path) -> Result<DeliveryCopy> {
    copy_artifact(
        task.id,
        &task.artifact.path,
        &task.artifact.filename,
        delivery_root,
    )
    .await
}

/// Release the work dir of a task whose artifact has been copied out
pub fn finish_delivery(task: CompletedTask) {
    if let Some(dir) = task.work_dir {
        release_work_dir(task.id, dir);
    }
}

async fn copy_artifact(
    id: TaskId,
    source: &Path,
    filename: &str,
    delivery_root: &Path,
) -> Result<DeliveryCopy> {
    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        return Err(Error::ArtifactMissing {
            path: source.to_path_buf(),
        });
    }

    tokio::fs::create_dir_all(delivery_root).await?;
    let dir = temp_dir_in(delivery_root, DELIVERY_DIR_PREFIX).await?;
    let path = dir.path().join(filename);

    // On failure `dir` drops here and takes the partial copy with it
    let len = tokio::fs::copy(source, &path).await?;
    tracing::debug!(task_id = %id, bytes = len, "prepared delivery copy");

    Ok(DeliveryCopy {
        id,
        dir: Some(dir),
        path,
        filename: filename.to_string(),
        len,
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Artifact;

    async fn completed(root: &Path, name: &str, contents: &[u8]) -> (CompletedTask, PathBuf) {
        let work_dir = create_work_dir(root).await.unwrap();
        let work_path = work_dir.path().to_path_buf();
        let file = work_path.join(name);
        std::fs::write(&file, contents).unwrap();
        (
            CompletedTask {
                id: TaskId::new(),
                artifact: Artifact::from_path(file),
                work_dir: Some(work_dir),
            },
            work_path,
        )
    }

    #[tokio::test]
    async fn work_dirs_are_unique_and_prefixed() {
        let root = tempfile::tempdir().unwrap();
        let a = create_work_dir(root.path()).await.unwrap();
        let b = create_work_dir(root.path()).await.unwrap();

        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(WORK_DIR_PREFIX));
    }

    #[tokio::test]
    async fn work_dir_requires_existing_root() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("not-created");

        let result = create_work_dir(&missing).await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn release_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_work_dir(root.path()).await.unwrap();
        let path = dir.path().to_path_buf();
        std::fs::write(path.join("partial.part"), b"x").unwrap();

        release_work_dir(TaskId::new(), dir);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn delivery_copies_file_and_releases_work_dir() {
        let root = tempfile::tempdir().unwrap();
        let (task, work_path) = completed(root.path(), "Clip_720p.mp4", b"video-bytes").await;

        let copy = prepare_delivery(&task, root.path()).await.unwrap();
        assert!(work_path.exists(), "work dir kept until the handoff finishes");

        finish_delivery(task);
        assert!(!work_path.exists(), "work dir should be released");
        assert_eq!(copy.filename(), "Clip_720p.mp4");
        assert_eq!(copy.len(), 11);
        assert_eq!(std::fs::read(copy.path()).unwrap(), b"video-bytes");
    }

    #[tokio::test]
    async fn dropping_the_copy_removes_it() {
        let root = tempfile::tempdir().unwrap();
        let (task, _) = completed(root.path(), "song.mp3", b"mp3").await;

        let copy = prepare_delivery(&task, root.path()).await.unwrap();
        let copy_dir = copy.path().parent().unwrap().to_path_buf();
        assert!(copy_dir.exists());

        drop(copy);
        assert!(!copy_dir.exists());
    }

    #[tokio::test]
    async fn stream_holds_copy_until_dropped() {
        let root = tempfile::tempdir().unwrap();
        let (task, _) = completed(root.path(), "song.mp3", b"0123456789").await;

        let copy = prepare_delivery(&task, root.path()).await.unwrap();
        let copy_dir = copy.path().parent().unwrap().to_path_buf();
        let stream = copy.into_stream().await.unwrap();

        assert!(copy_dir.exists(), "copy must outlive the guard handoff");
        let chunks: Vec<_> = stream.collect().await;
        let body: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(body, b"0123456789");
        assert!(!copy_dir.exists(), "copy removed once stream is consumed");
    }

    #[tokio::test]
    async fn missing_artifact_leaves_work_dir_alone() {
        let root = tempfile::tempdir().unwrap();
        let (task, work_path) = completed(root.path(), "gone.mp4", b"x").await;
        std::fs::remove_file(work_path.join("gone.mp4")).unwrap();

        let result = prepare_delivery(&task, root.path()).await;

        assert!(matches!(result, Err(Error::ArtifactMissing { .. })));
        assert!(work_path.exists());
    }

    #[tokio::test]
    async fn cleanup_errors_are_swallowed() {
        let root = tempfile::tempdir().unwrap();
        let (task, _) = completed(root.path(), "song.mp3", b"mp3").await;
        let copy = prepare_delivery(&task, root.path()).await.unwrap();

        // Someone else already removed the copy; dropping must not panic
        std::fs::remove_dir_all(copy.path().parent().unwrap()).unwrap();
        drop(copy);
    }
}
