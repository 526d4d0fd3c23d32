use crate::api::handlers;
use crate::auth::policy::{require_role, RouteClass};
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

/// Routes grouped by the role table.
///
/// Each protected group carries its role check as a route layer. The
/// authentication layer is added around the whole router by
/// [`crate::build_app`], so identity is always established first.
pub fn create_router() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/registration", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/health", get(handlers::health));

    let member_routes = Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/tasks/{id}/status", put(handlers::tasks::update_status))
        .route("/tasks/{id}/priority", put(handlers::tasks::update_priority))
        .route("/tasks/{id}/comments", post(handlers::tasks::add_comment))
        .route(
            "/tasks/author/{author_id}",
            get(handlers::tasks::tasks_by_author),
        )
        .route(
            "/tasks/executor/{executor_id}",
            get(handlers::tasks::tasks_by_executor),
        )
        .route(
            "/comments/tasks/{task_id}",
            get(handlers::comments::list_for_task),
        )
        .route(
            "/comments/task/{task_id}",
            get(handlers::comments::page_for_task),
        )
        .route("/comments/{id}", delete(handlers::comments::delete_comment))
        .route("/users/{email}", get(handlers::users::get_user_by_email))
        .route_layer(middleware::from_fn_with_state(
            RouteClass::Member,
            require_role,
        ));

    let admin_routes = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route_layer(middleware::from_fn_with_state(
            RouteClass::Admin,
            require_role,
        ));

    public_routes.merge(member_routes).merge(admin_routes)
}
