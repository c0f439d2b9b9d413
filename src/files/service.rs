/// High-level file operations: the validated create path, access
/// resolution, listing, and publication toggling. This is the surface
/// the HTTP layer outside this crate calls into.
use crate::error::{Error, Result};
use crate::files::model::{FileBody, FileKind, FileRecord, FileView, UserId};
use crate::files::store::FileStore;
use crate::jobs::thumbnail::ThumbnailJob;
use crate::jobs::JobQueue;
use crate::storage::DiskStorage;
use base64::Engine;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

/// Upload request as supplied by the transport layer. `kind` arrives as
/// an untrusted string and `data` as base64, both validated here.
#[derive(Debug, Clone)]
pub struct CreateFileRequest {
    pub owner_id: UserId,
    pub name: String,
    pub kind: String,
    pub parent_id: Option<String>,
    pub is_public: bool,
    pub data: Option<String>,
}

#[derive(Clone)]
pub struct FileService {
    store: FileStore,
    storage: DiskStorage,
    thumbnails: JobQueue<ThumbnailJob>,
}

impl FileService {
    pub fn new(store: FileStore, storage: DiskStorage, thumbnails: JobQueue<ThumbnailJob>) -> Self {
        Self {
            store,
            storage,
            thumbnails,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Create a folder, file, or image record.
    ///
    /// Validation failures carry the specific reason ("Missing name",
    /// "Missing type", "Missing data", "Parent not found", "Parent is
    /// not a folder"). For non-folder kinds the decoded payload is
    /// written to disk first and the metadata record second; the two
    /// writes are not transactional, so a metadata failure can orphan
    /// the blob. That is logged, not hidden.
    pub async fn create_file(&self, request: CreateFileRequest) -> Result<FileView> {
        if request.name.is_empty() {
            return Err(Error::validation("Missing name"));
        }
        let kind = FileKind::parse(&request.kind)
            .ok_or_else(|| Error::validation("Missing type"))?;

        let payload = match kind {
            FileKind::Folder => None,
            FileKind::File | FileKind::Image => {
                let data = request
                    .data
                    .as_deref()
                    .ok_or_else(|| Error::validation("Missing data"))?;
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(data)
                    .map_err(|_| Error::validation("Invalid data"))?;
                Some(decoded)
            }
        };

        let parent_id = match request.parent_id.as_deref() {
            None => None,
            Some(raw) => {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| Error::validation("Parent not found"))?;
                let parent = self
                    .store
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| Error::validation("Parent not found"))?;
                if parent.kind() != FileKind::Folder {
                    return Err(Error::validation("Parent is not a folder"));
                }
                Some(id)
            }
        };

        let body = match payload {
            None => FileBody::Folder,
            Some(data) => {
                let local_path = self.storage.write_new(&data).await?;
                match kind {
                    FileKind::File => FileBody::File { local_path },
                    FileKind::Image => FileBody::Image { local_path },
                    FileKind::Folder => unreachable!("folders carry no payload"),
                }
            }
        };

        let blob_path = body.local_path().map(Path::to_path_buf);
        let record = match self
            .store
            .insert(
                request.owner_id,
                &request.name,
                parent_id,
                request.is_public,
                body,
            )
            .await
        {
            Ok(record) => record,
            Err(e) => {
                if let Some(path) = blob_path {
                    warn!(
                        "Metadata insert failed after blob write; orphaned blob at {}",
                        path.display()
                    );
                }
                return Err(e);
            }
        };

        // Fire-and-forget: the upload response never waits on the job
        if record.kind() != FileKind::Folder {
            self.thumbnails.enqueue(ThumbnailJob {
                user_id: Some(record.owner_id.to_string()),
                file_id: Some(record.id.to_string()),
            });
        }

        Ok(record.to_view(false))
    }

    /// Owner-scoped metadata read. `omit_local_path` strips the
    /// server-side blob path from the projection.
    pub async fn find_user_file(
        &self,
        owner_id: UserId,
        raw_id: &str,
        omit_local_path: bool,
    ) -> Result<Option<FileView>> {
        let record = self.store.find_user_file_by_id(owner_id, raw_id).await?;
        Ok(record.map(|r| r.to_view(!omit_local_path)))
    }

    /// Resolve a record for a direct read: accessible when public or
    /// when the requester is the owner. Denial, absence, and a
    /// malformed id are indistinguishable (`None`), so callers cannot
    /// probe for existence. Non-folder records whose blob is missing
    /// from disk are treated as absent too.
    pub async fn find_public_or_own(
        &self,
        requester: Option<UserId>,
        raw_id: &str,
    ) -> Result<Option<FileRecord>> {
        let Ok(id) = Uuid::parse_str(raw_id) else {
            return Ok(None);
        };

        let Some(record) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        if !record.is_public && requester != Some(record.owner_id) {
            return Ok(None);
        }

        if let Some(path) = record.local_path() {
            if !self.storage.exists(path).await {
                return Ok(None);
            }
        }

        Ok(Some(record))
    }

    /// Read a record's blob content for download
    pub async fn read_blob(&self, record: &FileRecord) -> Result<Vec<u8>> {
        let path = record
            .local_path()
            .ok_or_else(|| Error::validation("A folder doesn't have content"))?;
        self.storage
            .read(path)
            .await?
            .ok_or_else(|| Error::NotFound("file".to_string()))
    }

    /// List one page of an owner's children under `parent`. A parent
    /// that is malformed, absent, or not a folder is defined as having
    /// no children, so the result is an empty list rather than an
    /// error. Projections omit the blob location.
    pub async fn list_children(
        &self,
        owner_id: UserId,
        parent: Option<&str>,
        page: u32,
    ) -> Result<Vec<FileView>> {
        let parent_id = match parent {
            None => None,
            Some(raw) => {
                let Ok(id) = Uuid::parse_str(raw) else {
                    return Ok(Vec::new());
                };
                match self.store.find_by_id(id).await? {
                    Some(record) if record.kind() == FileKind::Folder => Some(id),
                    _ => return Ok(Vec::new()),
                }
            }
        };

        let records = self.store.list_by_parent(owner_id, parent_id, page).await?;
        Ok(records.iter().map(|r| r.to_view(false)).collect())
    }

    /// Owner-only visibility toggle; `None` when the record does not
    /// exist or is not owned by the caller.
    pub async fn update_publication(
        &self,
        owner_id: UserId,
        raw_id: &str,
        is_public: bool,
    ) -> Result<Option<FileView>> {
        let record = self
            .store
            .update_publication(owner_id, raw_id, is_public)
            .await?;
        Ok(record.map(|r| r.to_view(false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::memory_pool;
    use tempfile::TempDir;

    async fn service() -> (FileService, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(memory_pool().await);
        let storage = DiskStorage::new(dir.path());
        let (queue, _rx) = JobQueue::new("image-thumbnail-worker");
        (FileService::new(store, storage, queue), dir)
    }

    fn upload(owner: UserId, name: &str, kind: &str, data: Option<&str>) -> CreateFileRequest {
        CreateFileRequest {
            owner_id: owner,
            name: name.to_string(),
            kind: kind.to_string(),
            parent_id: None,
            is_public: false,
            data: data.map(String::from),
        }
    }

    fn encode(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    #[tokio::test]
    async fn test_create_folder_has_no_blob() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        let view = service
            .create_file(upload(owner, "images", "folder", None))
            .await
            .unwrap();

        assert_eq!(view.kind, FileKind::Folder);
        assert_eq!(view.local_path, None);
        assert!(!view.is_public);

        let record = service
            .store
            .find_user_file_by_id(owner, &view.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.local_path(), None);
    }

    #[tokio::test]
    async fn test_create_file_persists_payload() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();
        let payload = b"Hello Webstack!\n";

        let view = service
            .create_file(upload(owner, "hello.txt", "file", Some(&encode(payload))))
            .await
            .unwrap();

        // Client projection hides the path; the record still carries it
        assert_eq!(view.local_path, None);
        let record = service
            .store
            .find_user_file_by_id(owner, &view.id)
            .await
            .unwrap()
            .unwrap();
        let path = record.local_path().unwrap();
        let stored = service.storage.read(path).await.unwrap().unwrap();
        assert_eq!(stored, payload);
    }

    #[tokio::test]
    async fn test_validation_reasons() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        let err = service
            .create_file(upload(owner, "", "file", Some("aGk=")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing name");

        let err = service
            .create_file(upload(owner, "x", "symlink", Some("aGk=")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing type");

        let err = service
            .create_file(upload(owner, "x", "file", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing data");

        let err = service
            .create_file(upload(owner, "x", "file", Some("%%%not-base64%%%")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid data");
    }

    #[tokio::test]
    async fn test_parent_must_exist_and_be_a_folder() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        let mut request = upload(owner, "x", "folder", None);
        request.parent_id = Some(Uuid::new_v4().to_string());
        let err = service.create_file(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Parent not found");

        let mut request = upload(owner, "x", "folder", None);
        request.parent_id = Some("garbage".to_string());
        let err = service.create_file(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Parent not found");

        let file = service
            .create_file(upload(owner, "a.txt", "file", Some("aGk=")))
            .await
            .unwrap();
        let mut request = upload(owner, "x", "folder", None);
        request.parent_id = Some(file.id);
        let err = service.create_file(request).await.unwrap_err();
        assert_eq!(err.to_string(), "Parent is not a folder");
    }

    #[tokio::test]
    async fn test_create_enqueues_thumbnail_job_for_non_folders() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(memory_pool().await);
        let storage = DiskStorage::new(dir.path());
        let (queue, mut rx) = JobQueue::new("image-thumbnail-worker");
        let service = FileService::new(store, storage, queue);
        let owner = Uuid::new_v4();

        service
            .create_file(upload(owner, "d", "folder", None))
            .await
            .unwrap();
        let view = service
            .create_file(upload(owner, "p.png", "image", Some("aGk=")))
            .await
            .unwrap();

        // Only the image upload produced a job
        let job = rx.try_recv().unwrap();
        assert_eq!(job.file_id, Some(view.id));
        assert_eq!(job.user_id, Some(owner.to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_public_or_own_access_matrix() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let view = service
            .create_file(upload(owner, "secret.txt", "file", Some("aGk=")))
            .await
            .unwrap();

        // Private: only the owner resolves it
        assert!(service
            .find_public_or_own(Some(owner), &view.id)
            .await
            .unwrap()
            .is_some());
        assert!(service
            .find_public_or_own(Some(stranger), &view.id)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .find_public_or_own(None, &view.id)
            .await
            .unwrap()
            .is_none());

        // Published: anyone resolves it, including unauthenticated
        service
            .update_publication(owner, &view.id, true)
            .await
            .unwrap()
            .unwrap();
        assert!(service
            .find_public_or_own(Some(stranger), &view.id)
            .await
            .unwrap()
            .is_some());
        assert!(service
            .find_public_or_own(None, &view.id)
            .await
            .unwrap()
            .is_some());

        // Malformed id resolves to nothing
        assert!(service
            .find_public_or_own(Some(owner), "bogus")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_public_record_with_missing_blob_is_absent() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        let view = service
            .create_file(upload(owner, "gone.txt", "file", Some("aGk=")))
            .await
            .unwrap();
        service
            .update_publication(owner, &view.id, true)
            .await
            .unwrap();

        let record = service
            .find_public_or_own(Some(owner), &view.id)
            .await
            .unwrap()
            .unwrap();
        tokio::fs::remove_file(record.local_path().unwrap())
            .await
            .unwrap();

        assert!(service
            .find_public_or_own(Some(owner), &view.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_children_of_folder() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        let folder = service
            .create_file(upload(owner, "docs", "folder", None))
            .await
            .unwrap();
        let mut request = upload(owner, "child.txt", "file", Some("aGk="));
        request.parent_id = Some(folder.id.clone());
        let child = service.create_file(request).await.unwrap();

        let listed = service
            .list_children(owner, Some(&folder.id), 0)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, child.id);
        assert_eq!(listed[0].local_path, None);
    }

    #[tokio::test]
    async fn test_list_children_of_bad_parent_is_empty() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        // Nonexistent parent
        assert!(service
            .list_children(owner, Some(&Uuid::new_v4().to_string()), 0)
            .await
            .unwrap()
            .is_empty());
        // Malformed parent
        assert!(service
            .list_children(owner, Some("oops"), 0)
            .await
            .unwrap()
            .is_empty());

        // Non-folder parent
        let file = service
            .create_file(upload(owner, "a.txt", "file", Some("aGk=")))
            .await
            .unwrap();
        assert!(service
            .list_children(owner, Some(&file.id), 0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_find_user_file_projection_control() {
        let (service, _dir) = service().await;
        let owner = Uuid::new_v4();

        let view = service
            .create_file(upload(owner, "a.txt", "file", Some("aGk=")))
            .await
            .unwrap();

        let stripped = service
            .find_user_file(owner, &view.id, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stripped.local_path, None);

        let full = service
            .find_user_file(owner, &view.id, false)
            .await
            .unwrap()
            .unwrap();
        assert!(full.local_path.is_some());
    }
}
