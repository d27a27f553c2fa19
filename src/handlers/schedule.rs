use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{self, Professional, Room, Slot, Specialty, Unit};
use crate::AppState;

use super::AppError;

pub const ROUTE: &str = "/v2/appoints/available-schedule";

const DEFAULT_PROFESSIONAL_ID: u32 = 2684;
const DEFAULT_UNIT_ID: u32 = 901;
/// The agenda never returns fewer days than this.
const MIN_DAYS_WINDOW: u32 = 15;
const MAX_DAYS_WINDOW: u32 = 120;

// ─── Request / response types ────────────────────────────────────

/// Raw query string. Parsed by hand so bad values produce a JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub professional_id: Option<String>,
    pub unit_id: Option<String>,
    pub days: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailableScheduleResponse {
    pub success: bool,
    pub filters: Filters,
    pub response: Vec<DaySchedule>,
}

#[derive(Debug, Serialize)]
pub struct Filters {
    pub professional_id: u32,
    pub unit_id: u32,
    pub start_date_applied: NaiveDate,
    pub days_requested: u32,
    pub days_returned: u32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DaySchedule {
    pub professional: Professional,
    pub unit: Unit,
    pub room: Room,
    pub specialty: Specialty,
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

// ─── GET /v2/appoints/available-schedule ─────────────────────────

pub async fn available_schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<AvailableScheduleResponse>, AppError> {
    if !state.extra_delay.is_zero() {
        tokio::time::sleep(state.extra_delay).await;
    }

    let now = Utc::now();
    build_response(&query, now).map(Json)
}

/// Pure part of the handler: validate the query and lay out the agenda.
pub fn build_response(
    query: &ScheduleQuery,
    now: DateTime<Utc>,
) -> Result<AvailableScheduleResponse, AppError> {
    let professional_id = parse_id(query.professional_id.as_deref(), "professional_id")?
        .unwrap_or(DEFAULT_PROFESSIONAL_ID);
    let unit_id = parse_id(query.unit_id.as_deref(), "unit_id")?.unwrap_or(DEFAULT_UNIT_ID);
    let days_requested = parse_days(query.days.as_deref())?;
    let requested_start = parse_date(query.start_date.as_deref())?;

    let start = normalize_start_date(requested_start, now.date_naive());
    let days_returned = days_requested.max(MIN_DAYS_WINDOW);

    let professional = catalog::professional(professional_id);
    let unit = catalog::unit(unit_id);
    let room = catalog::room(&professional, &unit);

    let mut response = Vec::with_capacity(days_returned as usize);
    for offset in 0..days_returned {
        let date = start
            .checked_add_days(Days::new(offset as u64))
            .ok_or_else(|| AppError::Internal(format!("date out of range: {start} + {offset}d")))?;

        response.push(DaySchedule {
            professional,
            unit,
            room: room.clone(),
            specialty: professional.specialty,
            date,
            slots: catalog::slots(professional_id, unit_id, date),
        });
    }

    Ok(AvailableScheduleResponse {
        success: true,
        filters: Filters {
            professional_id,
            unit_id,
            start_date_applied: start,
            days_requested,
            days_returned,
            generated_at: now,
        },
        response,
    })
}

/// Past (or missing) start dates snap to today, UTC.
pub fn normalize_start_date(requested: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    match requested {
        Some(date) if date > today => date,
        _ => today,
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

fn parse_id(raw: Option<&str>, field: &str) -> Result<Option<u32>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{field} must be a positive integer"))),
    }
}

fn parse_days(raw: Option<&str>) -> Result<u32, AppError> {
    let days = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => return Ok(MIN_DAYS_WINDOW),
        Some(s) => s.parse::<u32>().ok(),
    };
    match days {
        Some(d) if (1..=MAX_DAYS_WINDOW).contains(&d) => Ok(d),
        _ => Err(AppError::BadRequest(format!(
            "days must be between 1 and {MAX_DAYS_WINDOW}"
        ))),
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest("start_date must be YYYY-MM-DD".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 23, 10, 0, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn past_start_becomes_today() {
        let today = now().date_naive();
        assert_eq!(normalize_start_date(Some(ymd(2020, 1, 1)), today), ymd(2025, 12, 23));
        assert_eq!(normalize_start_date(None, today), today);
        assert_eq!(normalize_start_date(Some(ymd(2026, 1, 5)), today), ymd(2026, 1, 5));
    }

    #[test]
    fn defaults_fill_minimum_window() {
        let res = build_response(&ScheduleQuery::default(), now()).unwrap();

        assert!(res.success);
        assert_eq!(res.filters.professional_id, DEFAULT_PROFESSIONAL_ID);
        assert_eq!(res.filters.unit_id, DEFAULT_UNIT_ID);
        assert_eq!(res.filters.days_returned, 15);
        assert_eq!(res.response.len(), 15);
        assert_eq!(res.response[0].date, ymd(2025, 12, 23));
        assert_eq!(res.response[14].date, ymd(2026, 1, 6));
    }

    #[test]
    fn short_windows_are_widened() {
        let query = ScheduleQuery {
            days: Some("3".into()),
            ..Default::default()
        };
        let res = build_response(&query, now()).unwrap();
        assert_eq!(res.filters.days_requested, 3);
        assert_eq!(res.response.len(), 15);
    }

    #[test]
    fn future_start_and_explicit_ids_are_honoured() {
        let query = ScheduleQuery {
            professional_id: Some("512".into()),
            unit_id: Some("910".into()),
            days: Some("30".into()),
            start_date: Some("2026-02-01".into()),
        };
        let res = build_response(&query, now()).unwrap();

        assert_eq!(res.filters.start_date_applied, ymd(2026, 2, 1));
        assert_eq!(res.response.len(), 30);
        assert_eq!(res.response[0].professional.name, "Dr. Ícaro Menezes");
        assert_eq!(res.response[0].specialty.name, "Dermatologia");
        assert_eq!(res.response[0].unit.name, "Centro Norte");
    }

    #[test]
    fn rejects_bad_parameters() {
        for query in [
            ScheduleQuery {
                days: Some("0".into()),
                ..Default::default()
            },
            ScheduleQuery {
                days: Some("121".into()),
                ..Default::default()
            },
            ScheduleQuery {
                days: Some("abc".into()),
                ..Default::default()
            },
            ScheduleQuery {
                unit_id: Some("-1".into()),
                ..Default::default()
            },
            ScheduleQuery {
                start_date: Some("23/12/2025".into()),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                build_response(&query, now()),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn serializes_expected_shape() {
        let res = build_response(&ScheduleQuery::default(), now()).unwrap();
        let json = serde_json::to_value(&res).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["filters"]["start_date_applied"], "2025-12-23");
        assert_eq!(json["response"][0]["date"], "2025-12-23");
        assert_eq!(json["response"][0]["professional"]["id"], 2684);
        assert!(json["response"][0]["professional"].get("specialty").is_none());
        assert_eq!(json["response"][0]["slots"][0]["start"], "08:00");
    }
}
