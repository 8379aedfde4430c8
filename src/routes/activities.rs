use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::activity_dto::{
    ActivitiesResponse, ApplyRequest, ContactRequest, ContactResponse, LetterResponse,
    RemoveResponse, StatusUpdateRequest, StatusUpdateResponse,
};
use crate::error::{Error, Result};
use crate::models::activity::ApplicationStatus;
use crate::models::user::User;
use crate::services::lifecycle_service::{ApplicationIntent, LifecycleCommand, LifecycleOutcome};
use crate::AppState;

const LETTER_REVIEWER: &str = "HR Agent | Phạm Tuyết Nhi";
const LETTER_ORGANIZATION: &str = "Voltria Group 2025 | Đội ngũ HR Voltria";

#[utoipa::path(
    get,
    path = "/api/activities",
    responses(
        (status = 200, description = "Activities visible to the caller, most recent first", body = Json<ActivitiesResponse>),
    ),
)]
#[axum::debug_handler]
pub async fn list_activities(
    State(state): State<AppState>,
    identity: Option<Extension<User>>,
) -> Result<impl IntoResponse> {
    let viewer = identity.as_ref().map(|Extension(user)| user);
    let activities = state.activity_service.visible_to(viewer);
    let total = activities.len();
    Ok(Json(ActivitiesResponse { activities, total }))
}

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application recorded, review pending", body = Json<crate::models::activity::ActivityRecord>),
        (status = 400, description = "Invalid job offer payload"),
        (status = 401, description = "Login required"),
        (status = 403, description = "Not a candidate session"),
    ),
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ApplyRequest>,
) -> Result<impl IntoResponse> {
    payload.job.validate()?;

    let cv_file_content = payload.cv.as_ref().map(|cv| cv.file_data.clone());
    let cv_mime_type = payload.cv.map(|cv| cv.mime_type);
    let outcome = state
        .lifecycle_service
        .dispatch(LifecycleCommand::SubmitApplication(ApplicationIntent {
            job_title: payload.job.title,
            job_provider: payload.job.provider,
            job_description: payload.job.description,
            cv_file_content,
            cv_mime_type,
            owner_username: user.username,
            candidate_name: user.name,
        }))
        .await;
    let record = match outcome {
        LifecycleOutcome::Created(record) => record,
        _ => return Err(Error::Internal("Application was not recorded".into())),
    };
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    post,
    path = "/api/activities/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Activity ID")
    ),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Override applied; `updated` is false for unknown ids", body = Json<StatusUpdateResponse>),
        (status = 400, description = "Verdict other than approved or rejected"),
        (status = 403, description = "Caller is not HR"),
    ),
)]
#[axum::debug_handler]
pub async fn override_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .lifecycle_service
        .dispatch(LifecycleCommand::Decide {
            id,
            verdict: payload.status,
        })
        .await;
    let LifecycleOutcome::StatusChanged { id, status, updated } = outcome else {
        return Err(Error::Internal("Status change was not applied".into()));
    };
    Ok(Json(StatusUpdateResponse { id, status, updated }))
}

#[axum::debug_handler]
pub async fn remove_activity(
    State(state): State<AppState>,
    identity: Option<Extension<User>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    // Out-of-scope ids get the same ack as unknown ones; the response never
    // reveals whether the record exists for somebody else.
    let viewer = identity.as_ref().map(|Extension(user)| user);
    if state.activity_service.find_visible(viewer, id).is_none() {
        return Ok(Json(RemoveResponse { id, removed: false }));
    }

    let outcome = state
        .lifecycle_service
        .dispatch(LifecycleCommand::Remove { id })
        .await;
    let LifecycleOutcome::Removed { id, removed } = outcome else {
        return Err(Error::Internal("Removal was not applied".into()));
    };
    Ok(Json(RemoveResponse { id, removed }))
}

#[axum::debug_handler]
pub async fn leave_contact(
    State(state): State<AppState>,
    identity: Option<Extension<User>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let viewer = identity.as_ref().map(|Extension(user)| user);
    let record = state
        .activity_service
        .find_visible(viewer, id)
        .ok_or_else(|| Error::NotFound("Activity not found".into()))?;
    if record.status != ApplicationStatus::Approved {
        return Err(Error::BadRequest(
            "Contact is only available for approved applications".into(),
        ));
    }

    // Acknowledged and discarded; no mail is sent in the demo product.
    tracing::info!(%id, "contact email acknowledged");
    Ok(Json(ContactResponse {
        message: format!(
            "Voltria đã ghi nhận email: {}. HR Phạm Tuyết Nhi sẽ sớm liên hệ bạn!",
            payload.email
        ),
    }))
}

#[axum::debug_handler]
pub async fn rejection_letter(
    State(state): State<AppState>,
    identity: Option<Extension<User>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let viewer = identity.as_ref().map(|Extension(user)| user);
    let record = state
        .activity_service
        .find_visible(viewer, id)
        .ok_or_else(|| Error::NotFound("Activity not found".into()))?;
    if record.status != ApplicationStatus::Rejected {
        return Err(Error::BadRequest(
            "The feedback letter is only available for rejected applications".into(),
        ));
    }

    let name = record.candidate_name.as_deref().unwrap_or("Bạn");
    Ok(Json(LetterResponse {
        greeting: format!("Hi {},", name),
        body: vec![
            "Hiện tại nhà tuyển dụng đã xem qua CV bạn và rất hài lòng về những thành tựu, kinh nghiệm mà bạn đã cố gắng gặt hái được, tuy nhiên HR Voltria rất tiếc khi giữa bạn và JD nhà tuyển dụng đưa ra chưa thực sự đồng điệu như nhà tuyển dụng mong muốn, HR Voltria xin mong bạn thông cảm và tiếp tục hoạt động tại Voltria để HRs có thể tìm bạn trong talent pool của chúng tôi - nếu có bất kỳ khả năng ăn khớp nào với CV bạn - chúng tôi sẽ thông báo bạn ngay trong thời gian sớm nhất!".to_string(),
            "Một lần nữa cảm ơn bạn và mong bạn thông cảm,".to_string(),
        ],
        reviewer: LETTER_REVIEWER.to_string(),
        organization: LETTER_ORGANIZATION.to_string(),
    }))
}
