use std::path::PathBuf;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use inkpad_shared::snapshot_format::{
    decode_snapshot_file, encode_snapshot_file, SnapshotFileData,
};

#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_snapshot(&self, drawing_id: &str) -> Result<SnapshotFileData, String>;
    async fn save_snapshot(&self, drawing_id: &str, data: &SnapshotFileData)
        -> Result<(), String>;
}

pub struct FileStorage {
    snapshot_dir: PathBuf,
}

impl FileStorage {
    pub fn new(snapshot_dir: PathBuf) -> Self {
        Self { snapshot_dir }
    }

    fn snapshot_path(&self, drawing_id: &str) -> PathBuf {
        self.snapshot_dir.join(format!("{drawing_id}.snap"))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load_snapshot(&self, drawing_id: &str) -> Result<SnapshotFileData, String> {
        let path = self.snapshot_path(drawing_id);
        let payload = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Failed to read snapshot file for {drawing_id}: {e}"))?;
        decode_snapshot_file(&payload)
            .map_err(|e| format!("Failed to decode snapshot {drawing_id}: {e:?}"))
    }

    async fn save_snapshot(
        &self,
        drawing_id: &str,
        data: &SnapshotFileData,
    ) -> Result<(), String> {
        let path = self.snapshot_path(drawing_id);
        let payload = encode_snapshot_file(data);
        tokio::fs::write(path, payload)
            .await
            .map_err(|e| format!("Failed to save snapshot {drawing_id}: {e}"))
    }
}

#[derive(Clone, Debug)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            region: None,
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

pub struct S3Storage {
    bucket: String,
    prefix: String,
    client: Client,
}

impl S3Storage {
    pub async fn new(config: S3StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let (Some(access_key_id), Some(secret_access_key)) = (
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
        ) {
            let creds = Credentials::new(access_key_id, secret_access_key, None, None, "static");
            loader = loader.credentials_provider(creds);
        }
        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint_url) = config.endpoint_url.as_ref() {
            builder = builder.endpoint_url(endpoint_url);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());
        let prefix = config
            .prefix
            .unwrap_or_default()
            .trim_matches('/')
            .to_string();
        Self {
            bucket: config.bucket,
            prefix,
            client,
        }
    }

    fn object_key(&self, drawing_id: &str) -> String {
        if self.prefix.is_empty() {
            format!("{drawing_id}.snap")
        } else {
            format!("{}/{drawing_id}.snap", self.prefix)
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn load_snapshot(&self, drawing_id: &str) -> Result<SnapshotFileData, String> {
        let key = self.object_key(drawing_id);
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;
        let output = match response {
            Ok(output) => output,
            Err(error) => {
                if let Some(service_error) = error.as_service_error() {
                    if service_error.is_no_such_key() {
                        return Err(format!("Snapshot {drawing_id} not found"));
                    }
                }
                return Err(format!(
                    "Failed to load snapshot {drawing_id} from s3: {error:?}"
                ));
            }
        };
        let bytes = match output.body.collect().await {
            Ok(collected) => collected.into_bytes(),
            Err(error) => {
                return Err(format!(
                    "Failed to read snapshot {drawing_id} from s3 response: {error:?}"
                ));
            }
        };
        decode_snapshot_file(&bytes)
            .map_err(|e| format!("Failed to decode snapshot {drawing_id}: {e:?}"))
    }

    async fn save_snapshot(
        &self,
        drawing_id: &str,
        data: &SnapshotFileData,
    ) -> Result<(), String> {
        let key = self.object_key(drawing_id);
        let payload = encode_snapshot_file(data);
        let body = ByteStream::from(payload);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|error| format!("Failed to save snapshot {drawing_id} to s3: {error:?}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_snapshot_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("inkpad-storage-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn file_storage_persists_and_reloads() {
        let dir = temp_snapshot_dir();
        let storage = FileStorage::new(dir.clone());
        let data = SnapshotFileData {
            image: "data:image/png;base64,iVBORw0KGgo=".into(),
        };
        storage.save_snapshot("abc", &data).await.unwrap();
        let loaded = storage.load_snapshot("abc").await.unwrap();
        assert_eq!(loaded.image, data.image);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn file_storage_reports_missing_snapshot() {
        let dir = temp_snapshot_dir();
        let storage = FileStorage::new(dir.clone());
        let error = storage.load_snapshot("missing").await.unwrap_err();
        assert!(error.contains("missing"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn file_storage_rejects_corrupt_payload() {
        let dir = temp_snapshot_dir();
        std::fs::write(dir.join("bad.snap"), b"not a snapshot").unwrap();
        let storage = FileStorage::new(dir.clone());
        let error = storage.load_snapshot("bad").await.unwrap_err();
        assert!(error.contains("decode"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
