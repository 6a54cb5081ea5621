use crate::aggregate::{self, Chart, DateRange};
use crate::error::{ApiResult, IntoApiResult};
use crate::http::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ChartQuery {
    year: Option<String>,
}

impl ChartQuery {
    /// A missing or blank `year` means the current UTC year. Otherwise the leading integer is
    /// used, so `2024abc` is 2024 and a value without any digits is 0.
    fn year(&self) -> i64 {
        match self.year.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Utc::now().year().into(),
            Some(raw) => leading_integer(raw),
        }
    }
}

/// An optional sign followed by as many digits as there are. Saturates instead of overflowing.
fn leading_integer(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let magnitude = digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0i64, |n, d| n.saturating_mul(10).saturating_add(d.into()));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// `GET /v1/charts/line?year=YYYY`
pub(super) async fn line(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<Chart>> {
    let year = query.year();
    // No bill can be dated in a year the calendar cannot represent.
    let Some((year, range)) = i32::try_from(year)
        .ok()
        .and_then(|y| DateRange::year(y).ok().map(|range| (y, range)))
    else {
        return Ok(Json(Chart::empty(year)));
    };
    let entries = state.db.bill_entries(Some(&range)).await.api_result()?;
    let chart = aggregate::monthly_chart(&entries, year).api_result()?;
    Ok(Json(chart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{TestEnv, USER_TOKEN};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn query(year: Option<&str>) -> ChartQuery {
        ChartQuery {
            year: year.map(String::from),
        }
    }

    #[test]
    fn test_year_param() {
        let this_year = i64::from(Utc::now().year());
        assert_eq!(query(None).year(), this_year);
        assert_eq!(query(Some("")).year(), this_year);
        assert_eq!(query(Some("  ")).year(), this_year);
        assert_eq!(query(Some("2021")).year(), 2021);
        assert_eq!(query(Some(" 2021 ")).year(), 2021);
        assert_eq!(query(Some("2024abc")).year(), 2024);
        assert_eq!(query(Some("+2019")).year(), 2019);
        assert_eq!(query(Some("-44")).year(), -44);
        assert_eq!(query(Some("twenty")).year(), 0);
        assert_eq!(query(Some("-")).year(), 0);
        assert_eq!(query(Some("99999999999999999999999")).year(), i64::MAX);
    }

    #[tokio::test]
    async fn test_chart() {
        let env = TestEnv::new().await;
        env.create_bill(json!({"amount": 10, "type": "EXPENSE", "date": "2023-03-02"}))
            .await;
        env.create_bill(json!({"amount": 20, "type": "EXPENSE", "date": "2023-03-28T18:00:00Z"}))
            .await;
        env.create_bill(json!({"amount": 5, "type": "INCOME", "date": "2023-12-31"}))
            .await;

        let response = env
            .send(Method::GET, "/v1/charts/line?year=2023", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!({
                "year": 2023,
                "expense": [{"month": 2, "amount": 30}],
                "income": [{"month": 11, "amount": 5}]
            })
        );

        let response = env
            .send(Method::GET, "/v1/charts/line?year=2024", Some(USER_TOKEN), None)
            .await;
        assert_eq!(
            response.body,
            json!({"year": 2024, "expense": [], "income": []})
        );
    }

    #[tokio::test]
    async fn test_chart_defaults_to_current_year() {
        let env = TestEnv::new().await;
        env.create_bill(json!({"amount": 3})).await;

        let response = env
            .send(Method::GET, "/v1/charts/line", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["year"], Utc::now().year());
        assert_eq!(response.body["expense"][0]["amount"], 3);
    }

    #[tokio::test]
    async fn test_year_with_trailing_garbage() {
        let env = TestEnv::new().await;
        env.create_bill(json!({"amount": 4, "type": "INCOME", "date": "2024-07-04"}))
            .await;

        let response = env
            .send(Method::GET, "/v1/charts/line?year=2024abc", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!({"year": 2024, "expense": [], "income": [{"month": 6, "amount": 4}]})
        );

        let response = env
            .send(Method::GET, "/v1/charts/line?year=abc", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"year": 0, "expense": [], "income": []}));
    }

    #[tokio::test]
    async fn test_year_beyond_calendar_is_empty() {
        let env = TestEnv::new().await;
        for year in ["99999999999", "-99999999999", "2147483647"] {
            let uri = format!("/v1/charts/line?year={year}");
            let response = env.send(Method::GET, &uri, Some(USER_TOKEN), None).await;
            assert_eq!(response.status, StatusCode::OK, "{year}");
            assert_eq!(response.body["year"].as_i64(), year.parse().ok());
            assert_eq!(response.body["expense"], json!([]));
            assert_eq!(response.body["income"], json!([]));
        }
    }

    #[tokio::test]
    async fn test_overflowing_month_is_500() {
        let env = TestEnv::new().await;
        env.create_bill(json!({"amount": "79228162514264337593543950335", "date": "2024-03-01"}))
            .await;
        env.create_bill(json!({"amount": "1", "date": "2024-03-02"}))
            .await;

        let response = env
            .send(Method::GET, "/v1/charts/line?year=2024", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("overflows"));

        let response = env
            .send(Method::GET, "/v1/charts/line?year=2023", Some(USER_TOKEN), None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
}
