use crate::config::StorageConfig;
use crate::error::app_error::AppError;
use async_trait::async_trait;
use rocket::fairing::AdHoc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Object storage holding per-user uploads under `users/{id}/`.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Deletes every object belonging to the user; returns the count.
    async fn delete_user_files(&self, user_id: &Uuid) -> Result<usize, AppError>;
}

pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub async fn from_env(bucket: String) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket,
        }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn delete_user_files(&self, user_id: &Uuid) -> Result<usize, AppError> {
        let prefix = format!("users/{user_id}/");

        let listing = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .send()
            .await
            .map_err(|err| AppError::object_storage(format!("failed to list objects under {prefix}: {err}")))?;

        let keys: Vec<String> = listing
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect();

        for key in &keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| AppError::object_storage(format!("failed to delete {key}: {err}")))?;
        }

        Ok(keys.len())
    }
}

pub fn stage_object_storage(config: StorageConfig) -> AdHoc {
    AdHoc::on_ignite("Object storage (S3)", |rocket| async move {
        let store = S3FileStore::from_env(config.bucket.clone()).await;
        info!(bucket = %config.bucket, "Object storage client initialized");
        rocket.manage(Arc::new(store) as Arc<dyn FileStore>)
    })
}
