/// Application context and dependency injection
use crate::{
    cache::CacheClient,
    config::Config,
    db,
    db::users::UserStore,
    error::Result,
    files::{FileService, FileStore},
    jobs::{JobFailure, JobQueue, ThumbnailJob, WelcomeJob},
    notify::Notifier,
    storage::DiskStorage,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub db: SqlitePool,
    pub users: UserStore,
    pub file_store: FileStore,
    pub storage: DiskStorage,
    pub files: FileService,
    // Cache is optional; None when disabled or Redis is unreachable
    pub cache: Option<CacheClient>,
    pub notifier: Notifier,
    pub thumbnail_queue: JobQueue<ThumbnailJob>,
    pub welcome_queue: JobQueue<WelcomeJob>,
}

/// Receiving halves of the job channels, handed to the worker loops.
pub struct JobReceivers {
    pub thumbnails: mpsc::UnboundedReceiver<ThumbnailJob>,
    pub welcomes: mpsc::UnboundedReceiver<WelcomeJob>,
    pub failures: mpsc::UnboundedReceiver<JobFailure>,
    pub failure_tx: mpsc::UnboundedSender<JobFailure>,
}

/// Liveness of the context's backing services
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceStatus {
    pub db: bool,
    pub redis: bool,
}

/// Document counts across the store
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceStats {
    pub users: u64,
    pub files: u64,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: Config) -> Result<(Self, JobReceivers)> {
        config.validate()?;

        // Create data directories if they don't exist
        if !config.storage.root.exists() {
            tokio::fs::create_dir_all(&config.storage.root).await?;
        }

        let db = db::create_pool(
            &config.database.path,
            db::DatabaseOptions {
                max_connections: config.database.max_connections,
                ..Default::default()
            },
        )
        .await?;
        db::run_migrations(&db).await?;

        let users = UserStore::new(db.clone());
        let file_store = FileStore::new(db.clone());
        let storage = DiskStorage::new(config.storage.root.clone());

        let (thumbnail_queue, thumbnails) = JobQueue::new(crate::jobs::thumbnail::QUEUE_NAME);
        let (welcome_queue, welcomes) = JobQueue::new(crate::jobs::welcome::QUEUE_NAME);
        let (failure_tx, failures) = mpsc::unbounded_channel();

        let files = FileService::new(file_store.clone(), storage.clone(), thumbnail_queue.clone());

        let cache = match CacheClient::new(config.cache.clone()).await {
            Ok(client) => Some(client),
            Err(e) => {
                if config.cache.enabled {
                    tracing::warn!("Cache unavailable, continuing without it: {}", e);
                }
                None
            }
        };

        let notifier = Notifier::new(config.email.clone())?;

        let context = Self {
            config: Arc::new(config),
            db,
            users,
            file_store,
            storage,
            files,
            cache,
            notifier,
            thumbnail_queue,
            welcome_queue,
        };

        let receivers = JobReceivers {
            thumbnails,
            welcomes,
            failures,
            failure_tx,
        };

        Ok((context, receivers))
    }

    /// Probe the backing services. Never fails; unreachable services
    /// report as false.
    pub async fn status(&self) -> ServiceStatus {
        let db = db::is_alive(&self.db).await;
        let redis = match &self.cache {
            Some(cache) => cache.ping().await.is_ok(),
            None => false,
        };
        ServiceStatus { db, redis }
    }

    /// Count documents across both collections.
    pub async fn stats(&self) -> Result<ServiceStats> {
        Ok(ServiceStats {
            users: self.users.count().await?,
            files: self.file_store.count().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_context() -> (AppContext, JobReceivers, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            storage: crate::config::StorageConfig {
                root: dir.path().join("blobs"),
            },
            database: crate::config::DatabaseConfig {
                path: dir.path().join("manila.db"),
                max_connections: 2,
            },
            cache: crate::config::CacheConfig::default(),
            email: None,
            logging: crate::config::LoggingConfig {
                level: "debug".to_string(),
            },
        };
        let (context, receivers) = AppContext::new(config).await.unwrap();
        (context, receivers, dir)
    }

    #[tokio::test]
    async fn test_context_creates_storage_root() {
        let (context, _receivers, _dir) = test_context().await;
        assert!(context.config.storage.root.exists());
    }

    #[tokio::test]
    async fn test_status_reports_db_alive_and_cache_down() {
        let (context, _receivers, _dir) = test_context().await;
        let status = context.status().await;
        assert!(status.db);
        assert!(!status.redis);
    }

    #[tokio::test]
    async fn test_stats_counts_documents() {
        let (context, _receivers, _dir) = test_context().await;

        let stats = context.stats().await.unwrap();
        assert_eq!(stats.users, 0);
        assert_eq!(stats.files, 0);

        context.users.create("bob@dylan.com", "hash").await.unwrap();
        let stats = context.stats().await.unwrap();
        assert_eq!(stats.users, 1);
    }
}
