use crate::types::stats::{
    CallStats, DailySummary, DayRow, InboundStats, OutboundStats, OverallStats, PeriodStats,
};
use chrono::{Datelike, NaiveDate};
use cw_provider::{CallDirection, CallRecord};
use std::collections::BTreeMap;

const ANSWERED_STATUSES: &[&str] = &["completed", "answered"];
const FAILED_STATUSES: &[&str] = &["failed", "busy", "no-answer", "canceled"];

pub fn summarize(records: &[CallRecord]) -> CallStats {
    let inbound: Vec<&CallRecord> = records
        .iter()
        .filter(|record| record.direction == CallDirection::Inbound)
        .collect();
    let outbound: Vec<&CallRecord> = records
        .iter()
        .filter(|record| record.direction == CallDirection::Outbound)
        .collect();

    let inbound = inbound_stats(&inbound);
    let outbound = outbound_stats(&outbound);
    let overall = OverallStats {
        total_calls: inbound.total + outbound.total,
        total_duration: inbound.total_duration + outbound.total_duration,
    };

    CallStats {
        inbound,
        outbound,
        overall,
    }
}

pub fn daily_summary(
    records: &[CallRecord],
    date: NaiveDate,
    direction: Option<CallDirection>,
) -> DailySummary {
    let filtered: Vec<CallRecord> = records
        .iter()
        .filter(|record| record_date(record) == Some(date))
        .filter(|record| direction.is_none_or(|wanted| record.direction == wanted))
        .cloned()
        .collect();
    DailySummary {
        date,
        stats: summarize(&filtered),
    }
}

pub fn monthly_summary(records: &[CallRecord], year: i32, month: u32) -> PeriodStats {
    let filtered: Vec<CallRecord> = records
        .iter()
        .filter(|record| {
            record_date(record)
                .is_some_and(|date| date.year() == year && date.month() == month)
        })
        .cloned()
        .collect();

    let mut by_day: BTreeMap<NaiveDate, (u64, i64)> = BTreeMap::new();
    for record in &filtered {
        let Some(date) = record_date(record) else {
            continue;
        };
        let entry = by_day.entry(date).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.duration.max(0);
    }

    PeriodStats {
        year,
        month,
        stats: summarize(&filtered),
        days: by_day
            .into_iter()
            .map(|(date, (total_calls, total_duration))| DayRow {
                date,
                total_calls,
                total_duration,
            })
            .collect(),
    }
}

fn record_date(record: &CallRecord) -> Option<NaiveDate> {
    record.start_time.map(|start| start.date_naive())
}

fn inbound_stats(records: &[&CallRecord]) -> InboundStats {
    let total = records.len() as u64;
    let answered = records
        .iter()
        .filter(|record| ANSWERED_STATUSES.contains(&record.status.as_str()))
        .count() as u64;
    let missed = total - answered;
    let (total_duration, max_duration) = durations(records);

    InboundStats {
        total,
        answered,
        missed,
        missed_ratio: ratio(missed, total),
        total_duration,
        avg_duration: average(total_duration, answered),
        max_duration,
    }
}

fn outbound_stats(records: &[&CallRecord]) -> OutboundStats {
    let total = records.len() as u64;
    let completed = records
        .iter()
        .filter(|record| record.status == "completed")
        .count() as u64;
    let failed = records
        .iter()
        .filter(|record| FAILED_STATUSES.contains(&record.status.as_str()))
        .count() as u64;
    let (total_duration, max_duration) = durations(records);

    OutboundStats {
        total,
        completed,
        failed,
        total_duration,
        avg_duration: average(total_duration, completed),
        max_duration,
    }
}

fn durations(records: &[&CallRecord]) -> (i64, i64) {
    let total = records.iter().map(|record| record.duration.max(0)).sum();
    let max = records
        .iter()
        .map(|record| record.duration.max(0))
        .max()
        .unwrap_or(0);
    (total, max)
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn average(total: i64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(
        sid: &str,
        direction: CallDirection,
        status: &str,
        duration: i64,
        day: u32,
    ) -> CallRecord {
        CallRecord {
            sid: sid.to_string(),
            to_number: Some("+15550100".to_string()),
            from_number: Some("+15550199".to_string()),
            status: status.to_string(),
            duration,
            start_time: Some(Utc.with_ymd_and_hms(2026, 3, day, 10, 30, 0).unwrap()),
            end_time: None,
            direction,
        }
    }

    #[test]
    fn empty_input_yields_zeroes_not_nan() {
        let stats = summarize(&[]);
        assert_eq!(stats.inbound.total, 0);
        assert_eq!(stats.inbound.missed_ratio, 0.0);
        assert_eq!(stats.inbound.avg_duration, 0.0);
        assert_eq!(stats.outbound.avg_duration, 0.0);
        assert_eq!(stats.overall.total_calls, 0);
    }

    #[test]
    fn splits_directions_and_counts_outcomes() {
        let records = vec![
            record("a", CallDirection::Inbound, "completed", 60, 1),
            record("b", CallDirection::Inbound, "no-answer", 0, 1),
            record("c", CallDirection::Inbound, "answered", 30, 2),
            record("d", CallDirection::Outbound, "completed", 120, 1),
            record("e", CallDirection::Outbound, "busy", 0, 2),
        ];
        let stats = summarize(&records);

        assert_eq!(stats.inbound.total, 3);
        assert_eq!(stats.inbound.answered, 2);
        assert_eq!(stats.inbound.missed, 1);
        assert!((stats.inbound.missed_ratio - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.inbound.total_duration, 90);
        assert_eq!(stats.inbound.avg_duration, 45.0);
        assert_eq!(stats.inbound.max_duration, 60);

        assert_eq!(stats.outbound.total, 2);
        assert_eq!(stats.outbound.completed, 1);
        assert_eq!(stats.outbound.failed, 1);
        assert_eq!(stats.outbound.avg_duration, 120.0);

        assert_eq!(stats.overall.total_calls, 5);
        assert_eq!(stats.overall.total_duration, 210);
    }

    #[test]
    fn output_is_independent_of_record_order() {
        let mut records = vec![
            record("a", CallDirection::Inbound, "completed", 60, 1),
            record("b", CallDirection::Outbound, "failed", 0, 1),
            record("c", CallDirection::Inbound, "no-answer", 0, 2),
        ];
        let forward = summarize(&records);
        records.reverse();
        let backward = summarize(&records);
        assert_eq!(forward, backward);
    }

    #[test]
    fn daily_summary_filters_to_the_requested_day() {
        let records = vec![
            record("a", CallDirection::Inbound, "completed", 60, 1),
            record("b", CallDirection::Inbound, "completed", 30, 2),
        ];
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let summary = daily_summary(&records, date, None);
        assert_eq!(summary.stats.inbound.total, 1);
        assert_eq!(summary.stats.inbound.total_duration, 60);
    }

    #[test]
    fn daily_summary_applies_direction_filter() {
        let records = vec![
            record("a", CallDirection::Inbound, "completed", 60, 1),
            record("b", CallDirection::Outbound, "completed", 30, 1),
        ];
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let summary = daily_summary(&records, date, Some(CallDirection::Outbound));
        assert_eq!(summary.stats.inbound.total, 0);
        assert_eq!(summary.stats.outbound.total, 1);
    }

    #[test]
    fn monthly_summary_buckets_by_utc_day() {
        let records = vec![
            record("a", CallDirection::Inbound, "completed", 60, 1),
            record("b", CallDirection::Inbound, "completed", 30, 1),
            record("c", CallDirection::Outbound, "completed", 10, 5),
        ];
        let period = monthly_summary(&records, 2026, 3);
        assert_eq!(period.stats.overall.total_calls, 3);
        assert_eq!(period.days.len(), 2);
        assert_eq!(period.days[0].total_calls, 2);
        assert_eq!(period.days[0].total_duration, 90);
        assert_eq!(period.days[1].total_calls, 1);
    }

    #[test]
    fn monthly_summary_excludes_other_months() {
        let in_month = record("a", CallDirection::Inbound, "completed", 60, 1);
        let mut other = record("b", CallDirection::Inbound, "completed", 60, 1);
        other.start_time = Some(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
        let period = monthly_summary(&[in_month, other], 2026, 3);
        assert_eq!(period.stats.overall.total_calls, 1);
    }

    #[test]
    fn records_without_start_time_are_skipped_in_buckets() {
        let mut record = record("a", CallDirection::Inbound, "completed", 60, 1);
        record.start_time = None;
        let period = monthly_summary(&[record], 2026, 3);
        assert_eq!(period.stats.overall.total_calls, 0);
        assert!(period.days.is_empty());
    }
}
