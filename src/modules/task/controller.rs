use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bson::oid::ObjectId;
use tracing::error;
use validator::Validate;

use crate::modules::task::{
    crud::TaskCrud,
    model::Task,
    schema::{CreateTaskRequest, MessageResponse, TaskResponse, UpdateTaskRequest},
};
use crate::AppState;

type ApiError = (StatusCode, Json<MessageResponse>);

fn to_response(t: &Task) -> TaskResponse {
    TaskResponse {
        id: t.id.to_hex(),
        text: t.text.clone(),
        completed: t.completed,
        created_at: t.created_at.to_rfc3339(),
        updated_at: t.updated_at.to_rfc3339(),
    }
}

fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message: "Invalid ID format".to_string() }),
        )
    })
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse { message: "Task not found".to_string() }),
    )
}

fn internal(e: mongodb::error::Error) -> ApiError {
    error!("Task storage error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse { message: e.to_string() }),
    )
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message: e.to_string() }),
        ));
    }

    let crud = TaskCrud::new(&state.connection);
    let task = Task::new(payload.text.trim().to_string(), payload.completed.unwrap_or(false));

    crud.create(task.clone()).await.map_err(internal)?;

    Ok((StatusCode::CREATED, Json(to_response(&task))))
}

pub async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let crud = TaskCrud::new(&state.connection);

    let tasks = crud.find_all().await.map_err(internal)?;

    Ok(Json(tasks.iter().map(to_response).collect()))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let oid = parse_id(&id)?;
    let crud = TaskCrud::new(&state.connection);

    match crud.find_by_id(&oid).await {
        Ok(Some(t)) => Ok(Json(to_response(&t))),
        Ok(None) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse { message: e.to_string() }),
        ));
    }

    let oid = parse_id(&id)?;
    let crud = TaskCrud::new(&state.connection);

    match crud
        .update(&oid, payload.text.trim().to_string(), payload.completed)
        .await
    {
        Ok(Some(t)) => Ok(Json(to_response(&t))),
        Ok(None) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let oid = parse_id(&id)?;
    let crud = TaskCrud::new(&state.connection);

    match crud.delete(&oid).await {
        Ok(true) => Ok(Json(MessageResponse { message: "Deleted successfully".to_string() })),
        Ok(false) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}
