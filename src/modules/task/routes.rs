use axum::{routing::get, Router};

use crate::modules::task::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(controller::list_tasks).post(controller::create_task))
        .route(
            "/todos/{id}",
            get(controller::get_task)
                .put(controller::update_task)
                .delete(controller::delete_task),
        )
}
