use axum::body::{Body, BodyDataStream, Bytes, HttpBody};
use axum::http::{HeaderMap, header};
use futures_util::{StreamExt, stream};
use pillow_domain::{CapturedBody, UploadMetadata};
use serde_json::Value;
use tracing::warn;

const UPLOAD_NOTE: &str = "file content omitted from audit log";
const OVER_LIMIT: &str = "body exceeds capture limit";
const READ_FAILED: &str = "body read failed";

/// Reads the request body up to `limit` bytes and returns a replacement body
/// that yields exactly what the original would have.
///
/// Bodies that grow past `limit` are handed on as the buffered prefix chained
/// with the unread remainder. A read error is recorded and replayed to the
/// handler after the bytes that preceded it.
pub(super) async fn capture_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> (Body, Option<CapturedBody>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let upload_boundary = content_type.as_deref().and_then(multipart_boundary);
    let is_upload = content_type.as_deref().is_some_and(is_multipart);
    let declared_size = body.size_hint().exact();

    match declared_size {
        Some(0) => return (body, None),
        Some(size) if !usize::try_from(size).is_ok_and(|size| size <= limit) => {
            let captured = if is_upload {
                CapturedBody::Upload(upload_metadata(content_type, declared_size, Vec::new()))
            } else {
                omitted(OVER_LIMIT, declared_size)
            };
            return (body, Some(captured));
        }
        _ => {}
    }

    let mut remainder = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut buffered = 0usize;

    while let Some(chunk) = remainder.next().await {
        match chunk {
            Ok(chunk) => {
                buffered = buffered.saturating_add(chunk.len());
                chunks.push(chunk);
                if buffered > limit {
                    let captured = if is_upload {
                        CapturedBody::Upload(upload_metadata(
                            content_type,
                            declared_size,
                            Vec::new(),
                        ))
                    } else {
                        omitted(OVER_LIMIT, declared_size)
                    };
                    return (resume_body(chunks, remainder), Some(captured));
                }
            }
            Err(error) => {
                warn!(%error, "failed to read request body for audit capture");
                let replay = stream::iter(chunks.into_iter().map(Ok))
                    .chain(stream::once(async move { Err(error) }));
                return (
                    Body::from_stream(replay),
                    Some(omitted(READ_FAILED, declared_size)),
                );
            }
        }
    }

    let bytes = Bytes::from(chunks.concat());
    let captured = if is_upload {
        let file_names = upload_boundary
            .map(|boundary| multipart_file_names(&bytes, boundary.as_str()))
            .unwrap_or_default();
        let size_bytes = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        Some(CapturedBody::Upload(upload_metadata(
            content_type,
            Some(size_bytes),
            file_names,
        )))
    } else {
        describe_body(&bytes)
    };

    (Body::from(bytes), captured)
}

fn resume_body(chunks: Vec<Bytes>, remainder: BodyDataStream) -> Body {
    Body::from_stream(stream::iter(chunks.into_iter().map(Ok)).chain(remainder))
}

fn omitted(reason: &str, size_bytes: Option<u64>) -> CapturedBody {
    CapturedBody::Omitted {
        reason: reason.to_owned(),
        size_bytes,
    }
}

fn describe_body(bytes: &Bytes) -> Option<CapturedBody> {
    if bytes.is_empty() {
        return None;
    }

    Some(match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => CapturedBody::Json { value },
        Err(_) => CapturedBody::Text {
            value: String::from_utf8_lossy(bytes).into_owned(),
        },
    })
}

fn upload_metadata(
    content_type: Option<String>,
    size_bytes: Option<u64>,
    file_names: Vec<String>,
) -> UploadMetadata {
    UploadMetadata {
        content_type: content_type.unwrap_or_default(),
        size_bytes,
        file_names,
        note: UPLOAD_NOTE.to_owned(),
    }
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .find_map(|parameter| {
            let (name, value) = parameter.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("boundary")
                .then(|| value.trim().trim_matches('"').to_owned())
        })
        .filter(|boundary| !boundary.is_empty())
}

/// Reads `filename` parameters from part headers only; part content is skipped.
fn multipart_file_names(body: &[u8], boundary: &str) -> Vec<String> {
    let delimiter = format!("--{boundary}");
    let mut file_names = Vec::new();
    let mut in_part_headers = false;

    for line in body.split(|byte| *byte == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.starts_with(delimiter.as_bytes()) {
            in_part_headers = true;
            continue;
        }
        if !in_part_headers {
            continue;
        }
        if line.is_empty() {
            in_part_headers = false;
            continue;
        }

        let Ok(line) = std::str::from_utf8(line) else {
            continue;
        };
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-disposition")
            && let Some(file_name) = disposition_file_name(value)
        {
            file_names.push(file_name);
        }
    }

    file_names
}

fn disposition_file_name(value: &str) -> Option<String> {
    value
        .split(';')
        .find_map(|parameter| {
            let (name, value) = parameter.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| value.trim().trim_matches('"').to_owned())
        })
        .filter(|file_name| !file_name.is_empty())
}
