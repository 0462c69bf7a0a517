//! Upload/preview glue between callers, the [`Pipeline`] and an [`ObjectStore`].
//!
//! Transformable images are replaced at rest by the pipeline's PNG under a
//! `.png` key; anything else is stored byte-for-byte. The store is written
//! exactly once per upload, after the transform has fully succeeded, so a
//! failed run never leaves a partial object behind.

use crate::imaging::{Pipeline, PipelineError, ProcessedImage, ProcessingOptions};
use crate::media::{
    OCTET_STREAM, content_type_for, is_image_content_type, is_transformable, png_object_key,
};
use crate::store::{ObjectInfo, ObjectStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// What ended up in the store for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub key: String,
    pub size: u64,
    pub media_type: String,
}

pub struct FileService<S> {
    store: S,
    pipeline: Pipeline,
}

impl<S: ObjectStore> FileService<S> {
    pub fn new(store: S, pipeline: Pipeline) -> Self {
        Self { store, pipeline }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Store an upload, transforming it first when it is a supported image.
    ///
    /// `options` arrive already validated.
    pub fn upload(
        &self,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
        options: &ProcessingOptions,
    ) -> Result<UploadReceipt, ServiceError> {
        let (key, bytes, stored_type) = if is_transformable(media_type) {
            let ProcessedImage {
                bytes,
                media_type: out_type,
                width,
                height,
            } = self.pipeline.process(&bytes, media_type, options)?;
            debug!(file_name, width, height, "upload transformed");
            (png_object_key(file_name), bytes, out_type.as_str().to_string())
        } else {
            (file_name.to_string(), bytes, media_type.to_string())
        };

        let info = self.store.put(&key, bytes, &stored_type)?;
        info!(key = %info.key, size = info.size, media_type = %info.content_type, "stored");
        Ok(UploadReceipt {
            key: info.key,
            size: info.size,
            media_type: info.content_type,
        })
    }

    /// 200×200 JPEG preview of a stored image.
    pub fn thumbnail(&self, key: &str) -> Result<ProcessedImage, ServiceError> {
        let info = self.stat(key)?;
        if !is_image_content_type(&info.content_type) {
            return Err(PipelineError::UnsupportedFormat(format!(
                "{key} is {}",
                info.content_type
            ))
            .into());
        }
        let bytes = self.store.get(key)?;
        Ok(self.pipeline.thumbnail(&bytes, &info.content_type)?)
    }

    /// Object metadata. A missing or generic content type is replaced by
    /// the one implied by the key's extension.
    pub fn stat(&self, key: &str) -> Result<ObjectInfo, ServiceError> {
        let mut info = self.store.stat(key)?;
        if info.content_type.is_empty() || info.content_type == OCTET_STREAM {
            info.content_type = content_type_for(key).to_string();
        }
        Ok(info)
    }

    pub fn download(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        Ok(self.store.get(key)?)
    }

    pub fn delete(&self, key: &str) -> Result<(), ServiceError> {
        self.store.delete(key)?;
        info!(key, "deleted");
        Ok(())
    }

    /// Objects under `prefix`, newest first.
    pub fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, ServiceError> {
        Ok(self.store.list(prefix)?)
    }
}
