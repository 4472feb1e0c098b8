//! Pure reshaping of provider results. Nothing in here talks to the network
//! or the database, and nothing recomputes raster values.

use super::models::{
    AnalysisSnapshot, ChangeAnalysis, ChangeStats, ChangeType, IndexStatistics, ProductivityLevel,
    TaskOutcome, WeatherDayAggregate, WeatherSnapshot, Zone,
};
use crate::common::error::ApiError;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Changes beyond ±5 % are reported as positive or negative.
pub const CHANGE_DIRECTION_THRESHOLD: f64 = 5.0;
/// Changes beyond ±10 % are significant and may raise an alert.
pub const SIGNIFICANT_CHANGE_THRESHOLD: f64 = 10.0;

#[derive(Default)]
struct MetricSum {
    total: f64,
    count: u32,
}

impl MetricSum {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.total += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / f64::from(self.count))
    }
}

#[derive(Default)]
struct DayBucket {
    temperature: MetricSum,
    humidity: MetricSum,
    wind_speed: MetricSum,
    precipitation: MetricSum,
    condition: Option<String>,
    snapshots: Vec<WeatherSnapshot>,
}

/// UTC day of an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` timestamp
/// (read as UTC) or a plain date.
fn snapshot_day(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Folds hourly snapshots into one aggregate per UTC calendar day. Snapshots
/// with an unreadable timestamp count towards `now`. Output is sorted by
/// date; snapshots keep their arrival order within a day.
pub fn aggregate_weather(
    snapshots: Vec<WeatherSnapshot>,
    farm_id: Uuid,
    now: DateTime<Utc>,
) -> Vec<WeatherDayAggregate> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for snapshot in snapshots {
        let day = snapshot_day(snapshot.datetime.as_deref()).unwrap_or_else(|| now.date_naive());
        let bucket = days.entry(day).or_default();
        bucket.temperature.add(snapshot.temp);
        bucket.humidity.add(snapshot.humidity);
        bucket.wind_speed.add(snapshot.wind_speed);
        bucket.precipitation.add(snapshot.precipitation);
        if let Some(condition) = snapshot.condition.as_deref().filter(|c| !c.trim().is_empty()) {
            bucket.condition = Some(condition.to_string());
        }
        bucket.snapshots.push(snapshot);
    }

    days.into_iter()
        .map(|(date, bucket)| WeatherDayAggregate {
            farm_id,
            date,
            temperature: bucket.temperature.mean(),
            humidity: bucket.humidity.mean(),
            wind_speed: bucket.wind_speed.mean(),
            precipitation: bucket.precipitation.mean(),
            condition: bucket.condition,
            snapshots: bucket.snapshots,
        })
        .collect()
}

/// Builds the snapshot row for one (field, scene, index). Zoning outcomes
/// carry no statistics; statistics outcomes carry no zones.
pub fn aggregate_snapshot(
    field_id: Uuid,
    scene_id: &str,
    outcome: TaskOutcome,
    index: &str,
    captured_at: DateTime<Utc>,
    cloud_coverage: Option<f64>,
) -> AnalysisSnapshot {
    let (statistics, zones) = match outcome {
        TaskOutcome::Statistics(stats) => (stats, None),
        TaskOutcome::Zones(zones) => (IndexStatistics::default(), Some(zones)),
    };
    AnalysisSnapshot {
        field_id,
        scene_id: scene_id.to_string(),
        index_type: index.to_ascii_uppercase(),
        statistics,
        cloud_coverage,
        captured_at,
        zones,
    }
}

/// Parses the provider's `[{"zone_1": {...}}, {"zone_2": {...}}]` layout.
/// Returns `None` when there is nothing usable.
pub fn parse_zones(raw: &Value) -> Option<Vec<Zone>> {
    let zones: Vec<Zone> = raw
        .as_array()?
        .iter()
        .filter_map(|entry| {
            let (key, data) = entry.as_object()?.iter().next()?;
            if !data.is_object() {
                return None;
            }
            let number = key
                .strip_prefix("zone_")
                .and_then(|n| n.parse::<u32>().ok())
                .unwrap_or(0);
            Some(Zone {
                zone_id: key.clone(),
                area: data.get("area").and_then(Value::as_f64).unwrap_or(0.0),
                area_percent: data.get("area_percent").and_then(Value::as_f64).unwrap_or(0.0),
                productivity_level: ProductivityLevel::from_zone_number(number),
                fertilizer_recommendation: data.get("fertilizer").filter(|v| !v.is_null()).cloned(),
                geometry: data.get("geometry").filter(|v| !v.is_null()).cloned(),
            })
        })
        .collect();
    (!zones.is_empty()).then_some(zones)
}

/// Zones from a zoning status payload, which uses either `zones` or `result`.
pub fn zones_from_payload(payload: &Value) -> Option<Vec<Zone>> {
    payload
        .get("zones")
        .filter(|v| !v.is_null())
        .or_else(|| payload.get("result"))
        .and_then(parse_zones)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Relative change of the mean between two readings.
pub fn compare_statistics(
    baseline: &IndexStatistics,
    comparison: &IndexStatistics,
) -> Result<ChangeAnalysis, ApiError> {
    let base = baseline.mean.unwrap_or(0.0);
    if base == 0.0 || !base.is_finite() {
        return Err(ApiError::NotFound("no valid data for baseline date".to_string()));
    }
    let current = comparison.mean.unwrap_or(0.0);
    let change = (current - base) / base * 100.0;

    let change_type = if change > CHANGE_DIRECTION_THRESHOLD {
        ChangeType::Positive
    } else if change < -CHANGE_DIRECTION_THRESHOLD {
        ChangeType::Negative
    } else {
        ChangeType::Neutral
    };

    Ok(ChangeAnalysis {
        change_percentage: round2(change),
        baseline_stats: ChangeStats::from(baseline),
        comparison_stats: ChangeStats::from(comparison),
        change_type,
        is_significant: change.abs() > SIGNIFICANT_CHANGE_THRESHOLD,
    })
}
