//! HTTP inbound adapter: job submission and polling.
//!
//! Submission returns a task id immediately; all later outcomes, including
//! pipeline failure, are read by polling the task record. A Failed task is
//! a normal 200 poll response, not an HTTP error.

use crate::application::service::TaskService;
use crate::domain::clip::{ClipSpec, MergeSpec, ValidationError};
use crate::domain::time::TimeOffset;
use crate::media::cmd::MediaExecutor;
use crate::ports::storage::StoragePort;
use axum::async_trait;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ClipRequest {
    pub source_video: String,
    pub start_time: TimeOffset,
    pub end_time: TimeOffset,
    pub output_name: String,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub message: String,
    pub status_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

impl ErrorBody {
    fn validation(e: &ValidationError) -> Self {
        Self {
            error: e.code().to_string(),
            detail: e.to_string(),
        }
    }
}

/// `Json` extractor whose rejection speaks the same `{error, detail}`
/// contract as validation failures. A body axum cannot deserialize (bad
/// JSON, or a negative/non-finite time rejected by the time model) would
/// otherwise surface as a plain-text rejection.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "invalid_body".to_string(),
                    detail: rejection.body_text(),
                }),
            )),
        }
    }
}

pub fn router<S, M>(service: Arc<TaskService<S, M>>) -> Router
where
    S: StoragePort + 'static,
    M: MediaExecutor + 'static,
{
    Router::new()
        .route("/api/health", get(health))
        .route("/api/videos/clip", post(submit_clip::<S, M>))
        .route("/api/videos/merge", post(submit_merge::<S, M>))
        .route("/api/tasks/:task_id", get(task_status::<S, M>))
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn submit_clip<S, M>(
    State(service): State<Arc<TaskService<S, M>>>,
    ApiJson(request): ApiJson<ClipRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), (StatusCode, Json<ErrorBody>)>
where
    S: StoragePort + 'static,
    M: MediaExecutor + 'static,
{
    let spec = ClipSpec {
        source_video: request.source_video,
        start_time: request.start_time,
        end_time: request.end_time,
    };
    match service.submit_clip(spec, request.output_name).await {
        Ok(task_id) => Ok((
            StatusCode::ACCEPTED,
            Json(TaskResponse {
                status_url: format!("/api/tasks/{}", task_id),
                message: "Clip task started".to_string(),
                task_id,
            }),
        )),
        Err(e) => Err((StatusCode::BAD_REQUEST, Json(ErrorBody::validation(&e)))),
    }
}

async fn submit_merge<S, M>(
    State(service): State<Arc<TaskService<S, M>>>,
    ApiJson(request): ApiJson<MergeSpec>,
) -> Result<(StatusCode, Json<TaskResponse>), (StatusCode, Json<ErrorBody>)>
where
    S: StoragePort + 'static,
    M: MediaExecutor + 'static,
{
    let clips = request.clips.len();
    match service.submit_merge(request).await {
        Ok(task_id) => Ok((
            StatusCode::ACCEPTED,
            Json(TaskResponse {
                status_url: format!("/api/tasks/{}", task_id),
                message: format!("Merge task started with {} clips", clips),
                task_id,
            }),
        )),
        Err(e) => Err((StatusCode::BAD_REQUEST, Json(ErrorBody::validation(&e)))),
    }
}

async fn task_status<S, M>(
    State(service): State<Arc<TaskService<S, M>>>,
    Path(task_id): Path<String>,
) -> Result<Json<crate::domain::task::Task>, (StatusCode, Json<ErrorBody>)>
where
    S: StoragePort + 'static,
    M: MediaExecutor + 'static,
{
    match service.status(&task_id).await {
        Some(task) => Ok(Json(task)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "task_not_found".to_string(),
                detail: format!("no task with id {}", task_id),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_request_deserializes_at_millisecond_precision() {
        let request: ClipRequest = serde_json::from_str(
            r#"{
                "source_video": "videos/a.mp4",
                "start_time": 1.234,
                "end_time": 2.567,
                "output_name": "cut.mp4"
            }"#,
        )
        .unwrap();
        assert_eq!(request.start_time, TimeOffset::from_millis(1234));
        assert_eq!(request.end_time, TimeOffset::from_millis(2567));
    }

    #[test]
    fn negative_times_are_rejected_at_the_boundary() {
        let result = serde_json::from_str::<ClipRequest>(
            r#"{
                "source_video": "videos/a.mp4",
                "start_time": -1.0,
                "end_time": 2.0,
                "output_name": "cut.mp4"
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn validation_error_body_is_machine_readable() {
        let e = ValidationError::EmptyMerge;
        let body = ErrorBody::validation(&e);
        assert_eq!(body.error, "empty_merge");
        assert_eq!(body.detail, "at least one clip is required");
    }

    async fn extract_clip(body: &'static str) -> Result<ClipRequest, (StatusCode, ErrorBody)> {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        match ApiJson::<ClipRequest>::from_request(request, &()).await {
            Ok(ApiJson(value)) => Ok(value),
            Err((status, Json(error))) => Err((status, error)),
        }
    }

    #[tokio::test]
    async fn malformed_body_rejection_keeps_the_error_contract() {
        let (status, body) = extract_clip("{not json").await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid_body");
        assert!(!body.detail.is_empty());
    }

    #[tokio::test]
    async fn negative_time_in_a_body_yields_a_machine_readable_400() {
        let (status, body) = extract_clip(
            r#"{
                "source_video": "videos/a.mp4",
                "start_time": -1.0,
                "end_time": 2.0,
                "output_name": "cut.mp4"
            }"#,
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid_body");
        assert!(body.detail.contains("negative seconds"), "detail: {}", body.detail);
    }

    #[tokio::test]
    async fn well_formed_body_passes_through_the_wrapper() {
        let request = extract_clip(
            r#"{
                "source_video": "videos/a.mp4",
                "start_time": 1.234,
                "end_time": 2.567,
                "output_name": "cut.mp4"
            }"#,
        )
        .await
        .unwrap();
        assert_eq!(request.start_time, TimeOffset::from_millis(1234));
    }
}
