//! services/api/src/web/routes.rs
//!
//! Assembles the REST router. Everything except health, registration and login sits
//! behind `require_auth`.

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::web::{
    auth, canvas, chat, folders, lists, middleware::require_auth, notes, projects, rest,
    settings, state::AppState, tasks,
};

pub fn api_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        // --- Projects ---
        .route(
            "/api/projects",
            get(projects::list_projects_handler).post(projects::create_project_handler),
        )
        .route(
            "/api/projects/{project_uid}",
            get(projects::get_project_handler)
                .put(projects::update_project_handler)
                .patch(projects::patch_project_handler)
                .delete(projects::delete_project_handler),
        )
        .route(
            "/api/projects/{project_uid}/progress",
            get(projects::project_progress_handler),
        )
        .route(
            "/api/projects/{project_uid}/with-lists",
            get(projects::project_with_lists_handler),
        )
        .route(
            "/api/projects/{project_uid}/members",
            get(projects::list_members_handler).post(projects::add_member_handler),
        )
        // --- Lists ---
        .route(
            "/api/projects/{project_uid}/lists",
            get(lists::project_lists_handler),
        )
        .route("/api/lists", post(lists::create_list_handler))
        .route(
            "/api/lists/{list_uid}",
            get(lists::get_list_handler)
                .put(lists::update_list_handler)
                .patch(lists::patch_list_handler)
                .delete(lists::delete_list_handler),
        )
        .route(
            "/api/lists/{list_uid}/position",
            put(lists::update_list_position_handler),
        )
        .route("/api/lists/{list_uid}/tasks", get(lists::list_tasks_handler))
        // --- Tasks ---
        .route("/api/tasks", post(tasks::create_task_handler))
        .route(
            "/api/tasks/{task_uid}",
            get(tasks::get_task_handler)
                .put(tasks::update_task_handler)
                .patch(tasks::patch_task_handler)
                .delete(tasks::delete_task_handler),
        )
        .route("/api/tasks/{task_uid}/move", put(tasks::move_task_handler))
        // --- Canvas ---
        .route(
            "/api/projects/{project_uid}/canvas",
            get(canvas::get_canvas_handler)
                .put(canvas::update_canvas_handler)
                .delete(canvas::delete_canvas_handler),
        )
        // --- Notes and folders ---
        .route(
            "/api/projects/{project_uid}/notes",
            get(notes::project_notes_handler),
        )
        .route("/api/notes", post(notes::create_note_handler))
        .route(
            "/api/notes/{note_uid}",
            get(notes::get_note_handler)
                .put(notes::update_note_handler)
                .patch(notes::patch_note_handler)
                .delete(notes::delete_note_handler),
        )
        .route("/api/notes/{note_uid}/move", put(notes::move_note_handler))
        .route(
            "/api/projects/{project_uid}/folders",
            get(folders::project_folders_handler),
        )
        .route("/api/folders", post(folders::create_folder_handler))
        .route(
            "/api/folders/{folder_uid}",
            get(folders::get_folder_handler)
                .put(folders::update_folder_handler)
                .patch(folders::patch_folder_handler)
                .delete(folders::delete_folder_handler),
        )
        // --- Chat ---
        .route(
            "/api/projects/{project_uid}/conversations",
            get(chat::list_conversations_handler).post(chat::create_conversation_handler),
        )
        .route(
            "/api/conversations/{conversation_uid}",
            get(chat::get_conversation_handler)
                .patch(chat::rename_conversation_handler)
                .delete(chat::delete_conversation_handler),
        )
        .route(
            "/api/conversations/{conversation_uid}/messages",
            post(chat::create_message_handler),
        )
        // --- Settings ---
        .route(
            "/api/settings",
            get(settings::get_settings_handler)
                .put(settings::update_settings_handler)
                .patch(settings::update_settings_handler),
        )
        .route("/api/settings/reset", post(settings::reset_settings_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
