use axum::{
    extract::{Extension, Multipart, State},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path as StdPath;

use crate::dto::activity_dto::CvPayload;
use crate::dto::analysis_dto::AnalyzeResponse;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::services::lifecycle_service::{LifecycleCommand, LifecycleOutcome, ScanIntent};
use crate::AppState;

/// Whitelists the upload by extension, sniffs the magic bytes and hands back
/// the base64 payload the analysis model and the activity record both carry.
fn encode_cv_file(filename: &str, data: &bytes::Bytes) -> Result<CvPayload> {
    let ext = StdPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    let mime_type = match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => {
            return Err(Error::BadRequest(format!(
                "File type .{} is not allowed",
                ext
            )))
        }
    };

    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::BadRequest("Invalid JPEG file content".into()));
    }
    if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::BadRequest("Invalid PNG file content".into()));
    }

    Ok(CvPayload {
        file_data: BASE64.encode(data),
        mime_type: mime_type.to_string(),
    })
}

pub async fn analyze_cv(
    State(state): State<AppState>,
    identity: Option<Extension<User>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut cv: Option<CvPayload> = None;
    let mut target_job = String::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "cv" => {
                let filename = field.file_name().unwrap_or("cv.bin").to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read CV bytes: {}", e);
                    Error::BadRequest("Failed to read file upload".into())
                })?;
                if !data.is_empty() {
                    cv = Some(encode_cv_file(&filename, &data)?);
                }
            }
            "target_job" => target_job = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }

    let cv = cv.ok_or_else(|| Error::BadRequest("CV file is required".into()))?;

    let analysis = state
        .analysis_service
        .analyze(&cv.file_data, &cv.mime_type, &target_job)
        .await?;

    let user = identity.map(|Extension(user)| user);
    let outcome = state
        .lifecycle_service
        .dispatch(LifecycleCommand::RecordScan(ScanIntent {
            target_job,
            cv_file_content: cv.file_data,
            cv_mime_type: cv.mime_type,
            owner_username: user.as_ref().map(|u| u.username.clone()),
            candidate_name: user.map(|u| u.name),
        }))
        .await;
    let activity = match outcome {
        LifecycleOutcome::Created(record) => record,
        _ => return Err(Error::Internal("Scan was not recorded".into())),
    };

    Ok(Json(AnalyzeResponse { analysis, activity }))
}
