// Provider payloads and geometries shared by the tests

use serde_json::{Value, json};

pub const TASK_ID: &str = "task-123";
pub const ZMAP_ID: &str = "zmap-42";
pub const RESULT_BYTES: &[u8] = b"\x89PNG rendered scene";
pub const TILE_BYTES: &[u8] = b"\x89PNG upstream tile";

/// Small parcel near Luxor, lon/lat.
pub fn field_boundary() -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [32.50, 25.20],
            [32.60, 25.20],
            [32.60, 25.30],
            [32.50, 25.30],
            [32.50, 25.20]
        ]]
    })
}

fn scene(id: &str, date: &str, cloud: Option<f64>) -> Value {
    json!({
        "sceneID": id,
        "view_id": format!("S2/36/R/VU/{date}/0"),
        "date": date,
        "cloudCoverage": cloud,
        "platform": "Sentinel-2A",
        "thumbnail": format!("https://thumbs.example.com/{id}.png"),
        "dataGeometry": field_boundary()
    })
}

/// Unordered provider answer: one scene above the default 20 % ceiling, one
/// without cloud coverage and one with an unreadable date.
pub fn search_results() -> Value {
    json!({
        "results": [
            scene("S2A_CLOUDY", "2025-06-01", Some(35.0)),
            scene("S2A_HAZY", "2025-06-02", Some(12.5)),
            scene("S2B_CLEAR", "2025-06-04", Some(1.5)),
            scene("S2A_NO_CLOUD", "2025-06-05", None),
            scene("S2B_BAD_DATE", "June 6th", Some(3.0)),
            scene("S2B_THIN", "2025-06-03", Some(4.0))
        ]
    })
}

/// Scenes for change analysis: two captures on 2025-05-01 (the clearer one
/// on tile VV) and one on 2025-06-01.
pub fn change_scenes() -> Value {
    let mut hazy = scene("S2A_MAY_HAZY", "2025-05-01", Some(45.0));
    hazy["view_id"] = json!("S2/36/R/VU/2025-05-01/0");
    let mut clear = scene("S2B_MAY_CLEAR", "2025-05-01", Some(8.0));
    clear["view_id"] = json!("S2/36/R/VV/2025-05-01/0");
    json!({
        "results": [
            hazy,
            scene("S2A_JUNE", "2025-06-01", Some(10.0)),
            clear
        ]
    })
}

/// Recent scenes for the scheduled refresh.
pub fn recent_scenes() -> Value {
    json!({
        "results": [
            scene("S2A_RECENT_1", "2025-06-10", Some(2.0)),
            scene("S2B_RECENT_2", "2025-06-08", Some(6.0))
        ]
    })
}

/// Point reading as the render endpoint reports it.
pub fn point_value() -> Value {
    json!({ "band": "NDVI", "value": 0.62 })
}

/// Two days of hourly observations, the second day sparse.
pub fn hourly_weather() -> Value {
    json!({
        "data": [
            { "datetime": "2025-06-10T00:00:00Z", "temp": 18.0, "humidity": 70.0, "wind_speed": 2.0, "precipitation": 0.0, "condition": "Clear" },
            { "datetime": "2025-06-10T12:00:00Z", "temp": 30.0, "humidity": 40.0, "wind_speed": 4.0, "precipitation": 0.0, "condition": "Sunny" },
            { "datetime": "2025-06-10T18:00:00Z", "temp": 24.0, "humidity": 55.0, "precipitation": 1.5 },
            { "datetime": "2025-06-11T00:00:00Z", "temp": 16.0, "condition": "Cloudy" }
        ]
    })
}

pub fn zoning_finished() -> Value {
    json!({
        "status": "finished",
        "shapefile_download_url": "https://files.example.com/zmap-42.zip",
        "zones": [
            { "zone_1": { "area": 1200.5, "area_percent": 40.0, "fertilizer": { "n": 120 } } },
            { "zone_2": { "area": 900.0, "area_percent": 30.0 } },
            { "zone_3": { "area": 900.0, "area_percent": 30.0 } }
        ]
    })
}
