use crate::error::{ApiError, ApiResult, IntoApiResult};
use crate::http::{parse_id, Admin, ApiResponse, AppState, PageQuery};
use crate::model::{Category, CategoryUpdates, NewCategory, Page};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

/// `GET /v1/categories?page=N`
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Category>>> {
    let page = state.db.list_categories(query.request()).await.api_result()?;
    Ok(Json(page))
}

/// `GET /v1/categories/all`
pub(super) async fn all(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state.db.all_categories().await.api_result()?;
    Ok(Json(categories))
}

/// `GET /v1/categories/:id`
pub(super) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    state
        .db
        .get_category(id)
        .await
        .api_result()?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `POST /v1/categories`
pub(super) async fn create(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(new): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<ApiResponse<i64>>)> {
    let id = state.db.insert_category(&new).await.api_result()?;
    info!("{} created category {id}", admin.name);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(id))))
}

/// `PUT /v1/categories/:id`
pub(super) async fn update(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(updates): Json<CategoryUpdates>,
) -> ApiResult<Json<ApiResponse<i64>>> {
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    state
        .db
        .update_category(id, &updates)
        .await
        .api_result()?
        .ok_or(ApiError::NotFound)?;
    info!("{} updated category {id}", admin.name);
    Ok(Json(ApiResponse::ok(id)))
}

/// `DELETE /v1/categories/:id`
pub(super) async fn delete(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if let Some(id) = parse_id(&id) {
        if state.db.delete_category(id).await.api_result()? {
            info!("{} deleted category {id}", admin.name);
        }
    }
    Ok(Json(ApiResponse::done()))
}
