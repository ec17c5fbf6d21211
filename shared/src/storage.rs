use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};

/// What the upload step hands back to the pipeline: the S3 key, the URL
/// buyers will load, and the stored content type.
#[derive(Debug, Clone)]
pub struct ImageUploadResult {
    pub path: String,
    pub public_url: String,
    pub content_type: String,
}

/// Folder labels come from user-entered brand names; reduce them to a
/// safe, stable S3 path segment.
pub fn sanitize_folder(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_dash = true; // suppress leading dashes
    for c in label.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "produtos".to_string()
    } else {
        out
    }
}

/// Deterministic object key: owner partition, brand folder, timestamped
/// file name. Re-running the pipeline for the same product produces a new
/// key; colliding keys are simply overwritten.
pub fn object_key(
    user_id: &str,
    brand_label: Option<&str>,
    now: DateTime<Utc>,
    unique: &str,
) -> String {
    let folder = sanitize_folder(brand_label.unwrap_or(""));
    format!(
        "{}/{}/{}-{}.jpg",
        user_id,
        folder,
        now.format("%Y%m%d%H%M%S"),
        unique
    )
}

/// Upload one optimized image. Overwrite-on-conflict is allowed, so no
/// conditional put.
pub async fn upload_image(
    s3_client: &S3Client,
    bucket_name: &str,
    public_base_url: &str,
    key: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<ImageUploadResult, String> {
    s3_client
        .put_object()
        .bucket(bucket_name)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .cache_control("public, max-age=31536000, immutable")
        .send()
        .await
        .map_err(|e| format!("S3 put_object error: {}", e))?;

    Ok(ImageUploadResult {
        path: key.to_string(),
        public_url: format!("{}/{}", public_base_url.trim_end_matches('/'), key),
        content_type: content_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn folder_labels_are_reduced_to_safe_segments() {
        assert_eq!(sanitize_folder("Calçados & Acessórios"), "cal-ados-acess-rios");
        assert_eq!(sanitize_folder("  Nike Air  "), "nike-air");
        assert_eq!(sanitize_folder("---"), "produtos");
        assert_eq!(sanitize_folder(""), "produtos");
    }

    #[test]
    fn object_keys_are_namespaced_by_owner_and_brand() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
        let key = object_key("user-1", Some("Nike Air"), now, "abc123");
        assert_eq!(key, "user-1/nike-air/20240305123000-abc123.jpg");
    }

    #[test]
    fn missing_brand_falls_back_to_the_default_folder() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap();
        let key = object_key("user-1", None, now, "abc123");
        assert!(key.starts_with("user-1/produtos/"));
    }
}
