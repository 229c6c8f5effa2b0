use axum::{
    body::Body,
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::Response,
};

/// Raw render output with its content type; `attachment` adds a download
/// filename.
pub(super) fn binary_response(
    bytes: Vec<u8>,
    content_type: &'static str,
    attachment: Option<&'static str>,
) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    if let Some(value) = attachment
        .and_then(|filename| HeaderValue::from_str(&format!("attachment; filename={filename}")).ok())
    {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}
