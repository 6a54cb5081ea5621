use crate::aggregate::{self, Summary};
use crate::error::{ApiError, ApiResult, IntoApiResult};
use crate::http::{parse_id, Admin, ApiResponse, AppState, PageQuery};
use crate::model::{Bill, BillUpdates, NewBill, Page};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;

/// `GET /v1/bills?page=N`
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Bill>>> {
    let page = state.db.list_bills(query.request()).await.api_result()?;
    Ok(Json(page))
}

/// `GET /v1/bills/summary`
///
/// Month and week are taken from the server's current UTC date.
pub(super) async fn summary(State(state): State<AppState>) -> ApiResult<Json<Summary>> {
    let today = Utc::now().date_naive();
    let entries = state.db.bill_entries(None).await.api_result()?;
    let summary = aggregate::summarize(&entries, today).api_result()?;
    Ok(Json(summary))
}

/// `GET /v1/bills/:id`
pub(super) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Bill>> {
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    state
        .db
        .get_bill(id)
        .await
        .api_result()?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `POST /v1/bills`
pub(super) async fn create(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(new): Json<NewBill>,
) -> ApiResult<(StatusCode, Json<ApiResponse<i64>>)> {
    let id = state.db.insert_bill(&new).await.api_result()?;
    info!("{} created bill {id}", admin.name);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(id))))
}

/// `PUT /v1/bills/:id`
pub(super) async fn update(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(updates): Json<BillUpdates>,
) -> ApiResult<Json<ApiResponse<i64>>> {
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    state
        .db
        .update_bill(id, &updates)
        .await
        .api_result()?
        .ok_or(ApiError::NotFound)?;
    info!("{} updated bill {id}", admin.name);
    Ok(Json(ApiResponse::ok(id)))
}

/// `DELETE /v1/bills/:id`
pub(super) async fn delete(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if let Some(id) = parse_id(&id) {
        if state.db.delete_bill(id).await.api_result()? {
            info!("{} deleted bill {id}", admin.name);
        }
    }
    Ok(Json(ApiResponse::done()))
}

#[cfg(test)]
mod tests {
    use crate::test::{TestEnv, ADMIN_TOKEN, USER_TOKEN};
    use axum::http::{Method, StatusCode};
    use chrono::{Datelike, Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_bill_lifecycle() {
        let env = TestEnv::new().await;
        let created = env
            .send(
                Method::POST,
                "/v1/bills",
                Some(ADMIN_TOKEN),
                Some(json!({
                    "amount": "12.50",
                    "type": "EXPENSE",
                    "category_id": 999,
                    "title": "Lunch",
                    "date": "2024-03-05"
                })),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let id = created.body["data"].as_i64().unwrap();

        let uri = format!("/v1/bills/{id}");
        let fetched = env.send(Method::GET, &uri, Some(USER_TOKEN), None).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body["id"], id);
        assert_eq!(fetched.body["amount"].as_f64(), Some(12.5));
        assert_eq!(fetched.body["type"], "EXPENSE");
        assert_eq!(fetched.body["category_id"], 999);
        assert_eq!(fetched.body["title"], "Lunch");
        assert_eq!(fetched.body["description"], serde_json::Value::Null);
        assert_eq!(fetched.body["date"], "2024-03-05T00:00:00Z");

        let updated = env
            .send(
                Method::PUT,
                &uri,
                Some(ADMIN_TOKEN),
                Some(json!({"amount": 13, "title": "", "description": "with tip"})),
            )
            .await;
        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body, json!({"success": true, "data": id}));

        let fetched = env.send(Method::GET, &uri, Some(USER_TOKEN), None).await;
        assert_eq!(fetched.body["amount"], 13);
        assert_eq!(fetched.body["title"], "");
        assert_eq!(fetched.body["description"], "with tip");
        assert_eq!(fetched.body["date"], "2024-03-05T00:00:00Z");

        for _ in 0..2 {
            let deleted = env.send(Method::DELETE, &uri, Some(ADMIN_TOKEN), None).await;
            assert_eq!(deleted.status, StatusCode::OK);
            assert_eq!(deleted.body, json!({"success": true}));
        }
        let gone = env.send(Method::GET, &uri, Some(USER_TOKEN), None).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_without_amount_is_500() {
        let env = TestEnv::new().await;
        let response = env
            .send(
                Method::POST,
                "/v1/bills",
                Some(ADMIN_TOKEN),
                Some(json!({"title": "nothing"})),
            )
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("NOT NULL"));
    }

    #[tokio::test]
    async fn test_update_missing_is_404() {
        let env = TestEnv::new().await;
        let response = env
            .send(
                Method::PUT,
                "/v1/bills/4040",
                Some(ADMIN_TOKEN),
                Some(json!({"amount": 1})),
            )
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let env = TestEnv::new().await;
        let old = env.create_bill(json!({"amount": 1, "date": "2020-01-01"})).await;
        let new = env.create_bill(json!({"amount": 2, "date": "2024-01-01"})).await;
        let mid = env.create_bill(json!({"amount": 3, "date": "2022-01-01"})).await;

        let response = env.send(Method::GET, "/v1/bills", Some(USER_TOKEN), None).await;
        assert_eq!(response.status, StatusCode::OK);
        let ids: Vec<i64> = response.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![new, mid, old]);
        assert_eq!(response.body["total_count"], 3);
    }

    #[tokio::test]
    async fn test_summary() {
        let env = TestEnv::new().await;
        let long_ago = Utc::now() - Duration::days(800);

        env.create_bill(json!({"amount": 10, "type": "EXPENSE"})).await;
        env.create_bill(json!({"amount": "2.5", "type": "INCOME"})).await;
        env.create_bill(json!({
            "amount": 100,
            "type": "EXPENSE",
            "date": long_ago.to_rfc3339()
        }))
        .await;

        let response = env
            .send(Method::GET, "/v1/bills/summary", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let expense = &response.body["expense"];
        assert_eq!(expense["month"], 10);
        assert_eq!(expense["week"], 10);
        assert_eq!(expense["total"], 110);
        let income = &response.body["income"];
        assert_eq!(income["month"].as_f64(), Some(2.5));
        assert_eq!(income["week"].as_f64(), Some(2.5));
        assert_eq!(income["total"].as_f64(), Some(2.5));
    }

    #[tokio::test]
    async fn test_overflowing_summary_is_500() {
        let env = TestEnv::new().await;
        env.create_bill(json!({"amount": "79228162514264337593543950335"}))
            .await;
        env.create_bill(json!({"amount": "1"})).await;

        let response = env
            .send(Method::GET, "/v1/bills/summary", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("overflows"));

        // The stored bills are still readable one by one
        let response = env.send(Method::GET, "/v1/bills", Some(USER_TOKEN), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["total_count"], 2);
    }

    #[tokio::test]
    async fn test_summary_outside_current_periods() {
        let env = TestEnv::new().await;
        let last_year = Utc::now().year() - 1;
        env.create_bill(json!({"amount": 7, "date": format!("{last_year}-01-15")}))
            .await;

        let response = env
            .send(Method::GET, "/v1/bills/summary", Some(USER_TOKEN), None)
            .await;
        assert_eq!(
            response.body,
            json!({
                "income": {"month": 0, "week": 0, "total": 0},
                "expense": {"month": 0, "week": 0, "total": 7}
            })
        );
    }
}
