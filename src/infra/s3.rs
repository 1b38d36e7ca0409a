use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use tracing::info;

/// Gzip-compresses `body`.
pub fn gzip_bytes(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

/// Uploads `body` to `bucket/key`, gzip-compressed under `key.gz` when
/// `gzip` is set. Returns the key written.
#[tracing::instrument(skip(client, body), fields(bytes = body.len()))]
pub async fn upload(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    body: Vec<u8>,
    gzip: bool,
) -> Result<String> {
    let (body, key) = if gzip {
        (gzip_bytes(&body)?, format!("{key}.gz"))
    } else {
        (body, key.to_string())
    };

    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .content_type(content_type)
        .body(ByteStream::from(body));
    if gzip {
        req = req.content_encoding("gzip");
    }
    req.send().await?;

    info!(bucket, key = %key, "Uploaded to S3");
    Ok(key)
}
