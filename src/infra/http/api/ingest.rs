//! Request body ingestion: JSON and multipart submissions normalized into one `PostInput`.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use postboard_api_types::PostPayload;
use mime_guess::mime::Mime;
use tracing::warn;

use crate::application::posts::{ImageInput, PostInput};
use crate::domain::posts::FALLBACK_IMAGE_MIME;

use super::error::{ApiError, ErrorCode};

const SOURCE: &str = "infra::http::api::ingest";
const MULTIPART_FORM: &str = "multipart/form-data";
const OCTET_STREAM: &str = "application/octet-stream";

/// A post submission from either a JSON body or a multipart form.
#[derive(Debug)]
pub struct PostSubmission(pub PostInput);

impl<S> FromRequest<S> for PostSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(req.headers()) {
            let multipart = Multipart::from_request(req, state).await.map_err(|err| {
                ApiError::new(ErrorCode::BadRequest, "invalid multipart payload")
                    .with_hint(err.body_text())
            })?;
            return read_multipart(multipart).await.map(Self);
        }

        let Json(payload) = Json::<PostPayload>::from_request(req, state)
            .await
            .map_err(json_rejection_to_api)?;
        Ok(Self(payload.into()))
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with(MULTIPART_FORM)
        })
}

fn json_rejection_to_api(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(rejection.body_text());
    }
    ApiError::new(ErrorCode::BadRequest, "invalid JSON payload").with_hint(rejection.body_text())
}

fn too_large(hint: String) -> ApiError {
    ApiError::new(ErrorCode::PayloadTooLarge, "Payload too large").with_hint(hint)
}

fn multipart_error(err: MultipartError, message: &'static str) -> ApiError {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => too_large(err.body_text()),
        _ => ApiError::new(ErrorCode::BadRequest, message).with_hint(err.body_text()),
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostInput, ApiError> {
    let mut input = PostInput::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                warn!(
                    target: SOURCE,
                    status = status.as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                return Err(multipart_error(err, "invalid multipart payload"));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") if input.title.is_none() => {
                input.title = Some(field.text().await.map_err(field_error)?);
            }
            Some("description") if input.description.is_none() => {
                input.description = Some(field.text().await.map_err(field_error)?);
            }
            Some("image") if input.image.is_none() => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                if file_name.is_none() && content_type.is_none() {
                    input.image = Some(ImageInput::DataUri(
                        field.text().await.map_err(field_error)?,
                    ));
                } else {
                    let bytes = field.bytes().await.map_err(field_error)?;
                    input.image = Some(ImageInput::Upload {
                        content_type: upload_mime(content_type.as_deref(), file_name.as_deref()),
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

fn field_error(err: MultipartError) -> ApiError {
    multipart_error(err, "failed to read form field")
}

/// Declared media type without parameters, else a guess from the file name, else JPEG.
fn upload_mime(content_type: Option<&str>, file_name: Option<&str>) -> String {
    if let Some(declared) = content_type
        .and_then(|value| value.parse::<Mime>().ok())
        .map(|mime| mime.essence_str().to_string())
        .filter(|essence| essence != OCTET_STREAM)
    {
        return declared;
    }

    file_name
        .and_then(|name| mime_guess::from_path(name).first())
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string())
}
