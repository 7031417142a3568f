use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{AppState, build_router, upload::UploadStore};
use drone_persistence::InMemoryDroneRepository;

const BOUNDARY: &str = "drone-dispatch-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

fn setup_app() -> (Router, TempDir) {
    let uploads = tempfile::tempdir().expect("upload dir");
    let state = AppState::new(
        Arc::new(InMemoryDroneRepository::new()),
        UploadStore::new(uploads.path()),
    );
    (build_router(state, 1024 * 1024), uploads)
}

async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_request(serial: &str, parts: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, content) in parts {
        let disposition = if *name == "picture" {
            format!("form-data; name=\"{name}\"; filename=\"picture.png\"")
        } else {
            format!("form-data; name=\"{name}\"")
        };
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/drone/{serial}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn load_request(serial: &str, picture: &[u8], data: &Value) -> Request<Body> {
    let data = data.to_string();
    multipart_request(serial, &[("picture", picture), ("data", data.as_bytes())])
}

async fn register(app: &Router, serial: &str, weight_limit: u32, battery: u8) -> Response {
    let body = json!({
        "serial": serial,
        "model": "HEAVYWEIGHT",
        "weight_limit": weight_limit,
        "battery": battery,
    });
    app.clone()
        .oneshot(json_request("POST", "/api/v1/drone", &body))
        .await
        .unwrap()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _uploads) = setup_app();

    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_read_battery() {
    let (app, _uploads) = setup_app();

    let res = register(&app, "DRN-001", 500, 80).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = read_json(res).await;
    assert_eq!(body["serial"], "DRN-001");
    assert_eq!(body["state"], "IDLE");
    assert_eq!(body["consumed_weight"], 0);
    assert_eq!(body["remaining_capacity"], 500);

    let res = app
        .oneshot(get("/api/v1/drone/DRN-001/battery"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await, json!({ "battery_level": 80 }));
}

#[tokio::test]
async fn register_rejects_weight_limit_above_maximum() {
    let (app, _uploads) = setup_app();

    let res = register(&app, "DRN-001", 501, 80).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = read_json(res).await;
    assert_eq!(body["error"]["code"], "INVALID_WEIGHT_LIMIT");

    let res = app
        .oneshot(get("/api/v1/drone/DRN-001/battery"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_rejects_malformed_body() {
    let (app, _uploads) = setup_app();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/drone")
        .header("content-type", "application/json")
        .body(Body::from("{\"serial\": "))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "INVALID_INPUT");

    let body = json!({ "serial": "X", "model": "JUMBO", "weight_limit": 1, "battery": 1 });
    let res = app
        .oneshot(json_request("POST", "/api/v1/drone", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn load_medication_stores_picture_and_manifest() {
    let (app, uploads) = setup_app();
    register(&app, "DRN-001", 500, 80).await;

    let data = json!({ "name": "Omeprazol-250g", "weight": 250, "code": "OM_250" });
    let res = app
        .clone()
        .oneshot(load_request("DRN-001", PNG, &data))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let loaded = read_json(res).await;
    assert_eq!(loaded["name"], "Omeprazol-250g");
    let picture_path = loaded["picture_path"].as_str().unwrap().to_string();
    assert!(picture_path.starts_with("/static/"));
    assert!(picture_path.ends_with(".png"));
    assert_eq!(file_count(uploads.path()), 1);

    let res = app
        .clone()
        .oneshot(get("/api/v1/drone/DRN-001/medications"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let manifest = read_json(res).await;
    assert_eq!(manifest.as_array().unwrap().len(), 1);
    assert_eq!(manifest[0]["code"], "OM_250");
    assert_eq!(manifest[0]["picture_path"], picture_path.as_str());

    let res = app.oneshot(get(&picture_path)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], PNG);
}

#[tokio::test]
async fn overweight_load_leaves_drone_and_uploads_untouched() {
    let (app, uploads) = setup_app();
    register(&app, "DRN-001", 100, 80).await;

    let data = json!({ "name": "Aspirin", "weight": 150, "code": "ASP_1" });
    let res = app
        .clone()
        .oneshot(load_request("DRN-001", PNG, &data))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "OVERWEIGHT");
    assert_eq!(file_count(uploads.path()), 0);

    let res = app
        .oneshot(get("/api/v1/drone/DRN-001/medications"))
        .await
        .unwrap();
    assert_eq!(read_json(res).await, json!([]));
}

#[tokio::test]
async fn load_rejects_non_image_picture() {
    let (app, uploads) = setup_app();
    register(&app, "DRN-001", 500, 80).await;

    let data = json!({ "name": "Aspirin", "weight": 10, "code": "ASP_1" });
    let res = app
        .oneshot(load_request("DRN-001", b"GIF89a not allowed", &data))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "INVALID_UPLOAD");
    assert_eq!(file_count(uploads.path()), 0);
}

#[tokio::test]
async fn load_rejects_missing_or_malformed_data() {
    let (app, uploads) = setup_app();
    register(&app, "DRN-001", 500, 80).await;

    let cases: [&[(&str, &[u8])]; 3] = [
        &[("picture", PNG)],
        &[("picture", PNG), ("data", &b"{\"name\": \"Aspirin\""[..])],
        &[("picture", PNG), ("data", &b"{\"name\": \"Aspirin\", \"code\": \"ASP_1\"}"[..])],
    ];
    for parts in cases {
        let res = app
            .clone()
            .oneshot(multipart_request("DRN-001", parts))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(res).await["error"]["code"], "INVALID_INPUT");
    }

    let data = json!({ "name": "Aspirin", "weight": 10, "code": "ASP_1" }).to_string();
    let res = app
        .clone()
        .oneshot(multipart_request("DRN-001", &[("data", data.as_bytes())]))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "INVALID_UPLOAD");

    assert_eq!(file_count(uploads.path()), 0);
    let res = app
        .oneshot(get("/api/v1/drone/DRN-001/medications"))
        .await
        .unwrap();
    assert_eq!(read_json(res).await, json!([]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_loads_on_one_drone_all_land() {
    const LOADS: usize = 12;
    let (app, uploads) = setup_app();
    register(&app, "DRN-001", 500, 80).await;

    let mut handles = Vec::with_capacity(LOADS);
    for i in 0..LOADS {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let data = json!({ "name": format!("Med-{i}"), "weight": 10, "code": "MED" });
            app.oneshot(load_request("DRN-001", PNG, &data))
                .await
                .unwrap()
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let res = app
        .oneshot(get("/api/v1/drone/DRN-001/medications"))
        .await
        .unwrap();
    let manifest = read_json(res).await;
    assert_eq!(manifest.as_array().unwrap().len(), LOADS);
    assert_eq!(file_count(uploads.path()), LOADS);
}

#[tokio::test]
async fn load_rejects_invalid_medication_code() {
    let (app, _uploads) = setup_app();
    register(&app, "DRN-001", 500, 80).await;

    let data = json!({ "name": "Aspirin", "weight": 10, "code": "asp-1" });
    let res = app
        .oneshot(load_request("DRN-001", PNG, &data))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "INVALID_CODE");
}

#[tokio::test]
async fn unknown_drone_is_not_found() {
    let (app, uploads) = setup_app();

    for uri in [
        "/api/v1/drone/GHOST/battery",
        "/api/v1/drone/GHOST/medications",
    ] {
        let res = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(read_json(res).await["error"]["code"], "NOT_FOUND");
    }

    let data = json!({ "name": "Aspirin", "weight": 10, "code": "ASP_1" });
    let res = app
        .oneshot(load_request("GHOST", PNG, &data))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(file_count(uploads.path()), 0);
}

#[tokio::test]
async fn available_drones_filters_and_sorts() {
    let (app, _uploads) = setup_app();
    register(&app, "C-3", 300, 90).await;
    register(&app, "A-1", 500, 100).await;
    register(&app, "B-2", 500, 25).await;
    register(&app, "D-4", 0, 100).await;
    register(&app, "E-5", 200, 70).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/v1/drone/E-5",
            &json!({ "state": "DELIVERED" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await["state"], "DELIVERED");

    let res = app.oneshot(get("/api/v1/drones")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let serials: Vec<String> = read_json(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["serial"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(serials, vec!["A-1", "C-3"]);
}

#[tokio::test]
async fn telemetry_validates_battery() {
    let (app, _uploads) = setup_app();
    register(&app, "DRN-001", 500, 80).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/v1/drone/DRN-001",
            &json!({ "battery": 150 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(res).await["error"]["code"],
        "INVALID_BATTERY_CAPACITY"
    );

    let res = app
        .clone()
        .oneshot(json_request("PATCH", "/api/v1/drone/DRN-001", &json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "INVALID_INPUT");

    let res = app
        .oneshot(get("/api/v1/drone/DRN-001/battery"))
        .await
        .unwrap();
    assert_eq!(read_json(res).await, json!({ "battery_level": 80 }));
}

#[tokio::test]
async fn low_battery_drone_refuses_cargo() {
    let (app, _uploads) = setup_app();
    register(&app, "DRN-001", 500, 20).await;

    let data = json!({ "name": "Aspirin", "weight": 10, "code": "ASP_1" });
    let res = app
        .oneshot(load_request("DRN-001", PNG, &data))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(res).await["error"]["code"], "LOW_BATTERY");
}
