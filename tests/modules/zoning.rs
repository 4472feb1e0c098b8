// Productivity zoning: creation, polling, persistence

use crate::common::db::seed_farm_with_field;
use crate::common::fixtures::{ZMAP_ID, zoning_finished};
use crate::common::{TestApp, spawn_app};
use agri_imagery_api::routes::analysis::snapshots::db as snapshot;
use agri_imagery_api::routes::zoning::db as productivity_map;
use axum::http::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

/// Creates a map for a freshly seeded field; returns (field id, map id).
async fn create_map(app: &TestApp) -> (Uuid, String) {
    let (_, field) = seed_farm_with_field(&app.db).await;
    let response = app
        .client
        .post(
            "/api/imagery/zoning/create",
            &json!({ "fieldId": field.id, "zoneQuantity": 3 }),
        )
        .await;
    response.assert_status(StatusCode::OK);
    let map_id = response.json()["productivityMapId"].as_str().unwrap().to_string();
    (field.id, map_id)
}

#[tokio::test]
async fn test_create_records_map() {
    let app = spawn_app().await;
    let (field_id, map_id) = create_map(&app).await;

    let request = &app.provider.hits_to("/v1/zoning/vegetation-map")[0];
    let body = request.body.as_ref().unwrap();
    assert_eq!(body["field_id"], field_id.to_string());
    assert_eq!(body["zone_quantity"], 3);
    assert_eq!(body["vegetation_index"], "NDVI");
    assert_eq!(body["min_zone_area"], 1000.0);

    let row = productivity_map::Entity::find_by_id(Uuid::parse_str(&map_id).unwrap())
        .one(&app.db)
        .await
        .unwrap()
        .expect("map row stored");
    assert_eq!(row.field_id, field_id);
    assert_eq!(row.zmap_id, ZMAP_ID);
    assert_eq!(row.task_id, "ztask-7");
    assert_eq!(row.zone_quantity, 3);
    assert_eq!(row.status, "processing");
}

#[tokio::test]
async fn test_create_validation() {
    let app = spawn_app().await;
    let (_, field) = seed_farm_with_field(&app.db).await;

    let cases = [
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({ "fieldId": field.id, "zoneQuantity": 4 }), StatusCode::BAD_REQUEST),
        (json!({ "fieldId": "not-a-uuid" }), StatusCode::BAD_REQUEST),
        (json!({ "fieldId": Uuid::new_v4() }), StatusCode::NOT_FOUND),
    ];
    for (body, expected) in cases {
        let response = app.client.post("/api/imagery/zoning/create", &body).await;
        response.assert_status(expected);
    }
    assert!(app.provider.hits().is_empty());
    assert_eq!(productivity_map::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_status_follows_provider_until_completed() {
    let app = spawn_app().await;
    let (field_id, map_id) = create_map(&app).await;
    let status_uri = format!("/api/imagery/zoning/status/{map_id}");

    let response = app.client.get(&status_uri).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["status"], "processing");
    assert!(response.json()["zones"].is_null());

    let polls = app.provider.hits_to("/v1/zoning/maps");
    assert_eq!(polls.len(), 1);
    assert_eq!(polls[0].path, format!("/v1/zoning/maps/{field_id}/{ZMAP_ID}"));

    app.provider.configure(|b| b.zoning_status = zoning_finished());
    let response = app.client.get(&status_uri).await;
    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["shapefileUrl"], "https://files.example.com/zmap-42.zip");
    let zones = body["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 3);
    assert_eq!(zones[0]["zone_id"], "zone_1");
    assert_eq!(zones[0]["productivity_level"], "low");
    assert_eq!(zones[0]["fertilizer_recommendation"]["n"], 120);
    assert_eq!(zones[1]["productivity_level"], "medium");

    let snapshots = snapshot::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].field_id, field_id);
    assert_eq!(snapshots[0].scene_id, ZMAP_ID);
    assert_eq!(snapshots[0].index_type, "NDVI");
    assert!(snapshots[0].mean.is_none());
    assert!(snapshots[0].zones.is_some());

    // Completed maps are served from storage
    let response = app.client.get(&status_uri).await;
    assert_eq!(response.json()["status"], "completed");
    assert_eq!(response.json()["zones"].as_array().unwrap().len(), 3);
    assert_eq!(app.provider.hits_to("/v1/zoning/maps").len(), 2);
}

#[tokio::test]
async fn test_completed_map_without_zones_is_polled_again() {
    let app = spawn_app().await;
    let (_, map_id) = create_map(&app).await;
    let status_uri = format!("/api/imagery/zoning/status/{map_id}");

    app.provider
        .configure(|b| b.zoning_status = json!({ "status": "finished" }));
    let response = app.client.get(&status_uri).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["status"], "completed");
    assert!(response.json()["zones"].is_null());

    let row = productivity_map::Entity::find().one(&app.db).await.unwrap().unwrap();
    assert_eq!(row.status, "completed");
    assert!(row.zones.is_none());

    app.provider.configure(|b| b.zoning_status = zoning_finished());
    let response = app.client.get(&status_uri).await;
    assert_eq!(response.json()["zones"].as_array().unwrap().len(), 3);
    assert_eq!(app.provider.hits_to("/v1/zoning/maps").len(), 2);

    // Settled once zones are stored
    app.client.get(&status_uri).await.assert_status(StatusCode::OK);
    assert_eq!(app.provider.hits_to("/v1/zoning/maps").len(), 2);
}

#[tokio::test]
async fn test_failed_map_keeps_error() {
    let app = spawn_app().await;
    let (_, map_id) = create_map(&app).await;
    let status_uri = format!("/api/imagery/zoning/status/{map_id}");

    app.provider.configure(|b| {
        b.zoning_status = json!({ "status": "failed", "errors": [{ "message": "field too small" }] })
    });
    let response = app.client.get(&status_uri).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["status"], "failed");
    assert_eq!(response.json()["error"], "field too small");

    let response = app.client.get(&status_uri).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["success"], false);
    assert_eq!(response.json()["error"], "field too small");
    assert_eq!(app.provider.hits_to("/v1/zoning/maps").len(), 1);
}

#[tokio::test]
async fn test_status_of_unknown_map() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("/api/imagery/zoning/status/{}", Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app.client.get("/api/imagery/zoning/status/zmap-42").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
