use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutMultipartOptions, PutOptions,
    PutPayload, Result as ObjectResult, WriteMultipart,
};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Files up to this size are sent with a single PUT.
const SINGLE_PUT_MAX_BYTES: u64 = 64 * 1024 * 1024;
/// Part size for larger files. S3 only materializes the object once the
/// multipart upload is completed.
const MULTIPART_CHUNK_BYTES: usize = 16 * 1024 * 1024;
const MULTIPART_MAX_CONCURRENCY: usize = 4;
const READ_BUFFER_BYTES: usize = 1024 * 1024;
const ACCESS_CHECK_KEY: &str = ".tubely-access-check";

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        Self::from_builder(builder, bucket)
    }

    /// Build from a preconfigured builder (explicit credentials, tests).
    pub fn from_builder(builder: AmazonS3Builder, bucket: String) -> StorageResult<Self> {
        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }

    fn content_type_attributes(content_type: &str) -> Attributes {
        let mut attributes = Attributes::new();
        if !content_type.is_empty() {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        attributes
    }

    async fn put_single(
        &self,
        location: &ObjectPath,
        data: Bytes,
        content_type: &str,
    ) -> ObjectResult<()> {
        let options = PutOptions {
            attributes: Self::content_type_attributes(content_type),
            ..Default::default()
        };
        self.store
            .put_opts(location, PutPayload::from(data), options)
            .await
            .map(|_| ())
    }

    async fn put_multipart_from_file(
        &self,
        location: &ObjectPath,
        file: &mut tokio::fs::File,
        content_type: &str,
    ) -> StorageResult<()> {
        let options = PutMultipartOptions {
            attributes: Self::content_type_attributes(content_type),
            ..Default::default()
        };
        let upload = self
            .store
            .put_multipart_opts(location, options)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let mut writer = WriteMultipart::new_with_chunk_size(upload, MULTIPART_CHUNK_BYTES);
        let mut buffer = vec![0u8; READ_BUFFER_BYTES];

        let streamed: StorageResult<()> = async {
            loop {
                let read = file.read(&mut buffer).await?;
                if read == 0 {
                    break;
                }
                writer
                    .wait_for_capacity(MULTIPART_MAX_CONCURRENCY)
                    .await
                    .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
                writer.write(&buffer[..read]);
            }
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(
                    error = %abort_err,
                    bucket = %self.bucket,
                    location = %location,
                    "Failed to abort S3 multipart upload"
                );
            }
            return Err(e);
        }

        writer
            .finish()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::UploadFailed(e.to_string()))
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    async fn upload_file(
        &self,
        storage_key: &str,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        let location = ObjectPath::from(storage_key);
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(source).await?;
        let size = file.metadata().await?.len();

        let result = if size <= SINGLE_PUT_MAX_BYTES {
            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data).await?;
            self.put_single(&location, Bytes::from(data), content_type)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))
        } else {
            self.put_multipart_from_file(&location, &mut file, content_type)
                .await
        };

        if let Err(e) = result {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 file upload failed"
            );
            return Err(e);
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            multipart = size > SINGLE_PUT_MAX_BYTES,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 file upload successful"
        );

        Ok(size)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = ObjectPath::from(storage_key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let location = ObjectPath::from(storage_key);
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn check_access(&self) -> StorageResult<()> {
        // A missing object still proves the bucket is reachable and readable.
        match self.exists(ACCESS_CHECK_KEY).await {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, "S3 bucket is accessible");
                Ok(())
            }
            Err(e) => Err(StorageError::ConfigError(format!(
                "Unable to access S3 bucket {}: {}",
                self.bucket, e
            ))),
        }
    }
}
