//! Archives original CV uploads to S3.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::cv::parser::CvUpload;
use crate::errors::AppError;

#[derive(Clone)]
pub struct UploadArchive {
    client: S3Client,
    bucket: String,
}

impl UploadArchive {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Stores the upload and returns its object key.
    pub async fn archive(&self, user_id: &str, upload: &CvUpload) -> Result<String, AppError> {
        let key = object_key(user_id, &upload.file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.data.clone()))
            .content_type(upload.format.content_type())
            .send()
            .await
            .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;

        info!("Archived CV upload to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

/// `uploads/{user}/{date}-{uuid}-{sanitized file name}`
fn object_key(user_id: &str, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    let safe_name = if safe_name.trim_matches('_').is_empty() {
        "cv".to_string()
    } else {
        safe_name
    };
    format!(
        "uploads/{}/{}-{}-{}",
        user_id,
        Utc::now().format("%Y%m%d"),
        Uuid::new_v4(),
        safe_name
    )
}
