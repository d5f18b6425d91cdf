use crate::routes::error::map_error;
use crate::{AppState, build_aggregator};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use cw_core::error::CallwatchError;
use cw_core::types::io::WindowQuery;
use cw_core::types::stats::{DailySummary, PeriodStats, WindowCounts};
use cw_core::stats::{daily_summary, monthly_summary};
use cw_provider::{CallDirection, TimeWindow};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct DailyQuery {
    date: NaiveDate,
    direction: Option<CallDirection>,
}

#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct MonthlyQuery {
    year: i32,
    month: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(window_counts))
        .route("/stats/daily", get(daily))
        .route("/stats/monthly", get(monthly))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/stats",
    params(WindowQuery),
    responses((status = 200, body = WindowCounts))
)]
pub(crate) async fn window_counts(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Response {
    let aggregator = match build_aggregator(&state) {
        Ok(aggregator) => aggregator,
        Err(err) => return map_error(&err, None).into_response(),
    };
    match aggregator.stats().window(query) {
        Ok(counts) => Json(counts).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/stats/daily",
    params(DailyQuery),
    responses((status = 200, body = DailySummary))
)]
pub(crate) async fn daily(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Response {
    let window = day_window(query.date);
    match state
        .provider
        .list_call_records(window, query.direction)
        .await
    {
        Ok(records) => Json(daily_summary(&records, query.date, query.direction)).into_response(),
        Err(err) => map_error(&CallwatchError::Provider(err), None).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/stats/monthly",
    params(MonthlyQuery),
    responses((status = 200, body = PeriodStats))
)]
pub(crate) async fn monthly(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Response {
    let Some(window) = month_window(query.year, query.month) else {
        let err = CallwatchError::Internal {
            message: format!("invalid calendar month: {}-{}", query.year, query.month),
        };
        return map_error(&err, None).into_response();
    };
    match state.provider.list_call_records(window, None).await {
        Ok(records) => {
            Json(monthly_summary(&records, query.year, query.month)).into_response()
        }
        Err(err) => map_error(&CallwatchError::Provider(err), None).into_response(),
    }
}

fn day_window(date: NaiveDate) -> TimeWindow {
    let since = date.and_time(NaiveTime::MIN).and_utc();
    let until = (date + chrono::Days::new(1)).and_time(NaiveTime::MIN).and_utc();
    TimeWindow { since, until }
}

fn month_window(year: i32, month: u32) -> Option<TimeWindow> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(TimeWindow {
        since: first.and_time(NaiveTime::MIN).and_utc(),
        until: next.and_time(NaiveTime::MIN).and_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_spans_one_utc_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let window = day_window(date);
        assert_eq!(window.since.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(window.until.to_rfc3339(), "2026-03-02T00:00:00+00:00");
    }

    #[test]
    fn month_window_wraps_december() {
        let window = month_window(2026, 12).unwrap();
        assert_eq!(window.until.to_rfc3339(), "2027-01-01T00:00:00+00:00");
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(month_window(2026, 13).is_none());
        assert!(month_window(2026, 0).is_none());
    }
}
