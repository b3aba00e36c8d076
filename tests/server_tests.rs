use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

use burn_texture_cvae::config::ServerConfig;
use burn_texture_cvae::{
    AppState, Cvae, GeneratorHandle, TextureGenerator, TextureMetadata, decode_png_base64, router,
};

type InferBackend = NdArray<f32>;

async fn app(classes: &[&str]) -> Router {
    let metadata = TextureMetadata::new(
        classes.iter().map(|name| name.to_string()).collect(),
        4,
        8,
    );
    let generator = GeneratorHandle::spawn_with(4, move || {
        let device = <InferBackend as Backend>::Device::default();
        let model = Cvae::<InferBackend>::new(&metadata.model_config(), &device);
        TextureGenerator::new(model, metadata, device)
    })
    .await
    .expect("spawn generator");

    router(AppState::new(generator, &ServerConfig::default()))
}

async fn get<T: DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

async fn send<T: DeserializeOwned>(app: Router, request: Request<Body>) -> (StatusCode, T) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn assert_png(value: &Value) {
    let encoded = value.as_str().expect("base64 string");
    let image = decode_png_base64(encoded).expect("png");
    assert_eq!(image.dimensions(), (8, 8));
}

#[tokio::test]
async fn tex_returns_a_png_of_training_size() {
    let (status, body): (_, Value) = get(app(&["dirt", "stone"]).await, "/tex/stone").await;
    assert_eq!(status, StatusCode::OK);
    assert_png(&body);
}

#[tokio::test]
async fn tex_reports_unknown_names() {
    let (status, body): (_, Value) = get(app(&["dirt"]).await, "/tex/lava").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Unknown texture"}));
}

#[tokio::test]
async fn generate_adds_transitions_after_classes() {
    let (status, textures): (_, IndexMap<String, Value>) =
        get(app(&["dirt", "grass_top", "stone"]).await, "/generate").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = textures.keys().map(String::as_str).collect();
    assert_eq!(names, ["dirt", "grass_top", "stone", "grass_side"]);
    textures.values().for_each(assert_png);
}

#[tokio::test]
async fn mix_echoes_its_parameters() {
    let app = app(&["dirt", "grass_top"]).await;
    let (status, body) = post_json(
        app.clone(),
        "/mix",
        json!({"texture1": "dirt", "texture2": "grass_top"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["texture1"], "dirt");
    assert_eq!(body["texture2"], "grass_top");
    assert_eq!(body["ratio"], 0.5);
    assert_eq!(body["result_name"], Value::Null);
    assert_png(&body["texture"]);

    let (_, body) = post_json(
        app,
        "/mix",
        json!({"texture1": "dirt", "texture2": "grass_top", "ratio": 0.25, "result_name": "path"}),
    )
    .await;
    assert_eq!(body["ratio"], 0.25);
    assert_eq!(body["result_name"], "path");
}

#[tokio::test]
async fn mix_reports_missing_or_unknown_names() {
    let app = app(&["dirt", "stone"]).await;

    let (status, body) = post_json(app.clone(), "/mix", json!({"texture1": "dirt"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Unknown texture"}));

    let (status, body) = post_json(
        app,
        "/mix",
        json!({"texture1": "dirt", "texture2": "lava"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Unknown texture"}));
}

#[tokio::test]
async fn classes_and_health_describe_the_model() {
    let app = app(&["dirt", "stone"]).await;

    let (status, body): (_, Value) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body): (_, Value) = get(app, "/classes").await;
    assert_eq!(body["classes"], json!(["dirt", "stone"]));
    assert_eq!(body["num_classes"], 2);
    assert_eq!(body["img"], 8);
}

#[tokio::test]
async fn startup_failure_is_reported() {
    let result = GeneratorHandle::spawn_with::<InferBackend, _>(4, || {
        Err(anyhow::anyhow!("no checkpoint"))
    })
    .await;
    let err = result.err().expect("spawn should fail");
    assert!(format!("{err:#}").contains("no checkpoint"));
}

#[tokio::test]
async fn responses_allow_any_origin() {
    let app = app(&["dirt"]).await;

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/mix")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(preflight).await.expect("response");
    assert!(response.status().is_success());
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn mix_reports_malformed_bodies() {
    let app = app(&["dirt", "stone"]).await;

    let request = Request::builder()
        .method("POST")
        .uri("/mix")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"texture1\": "))
        .expect("request");
    let (status, body): (_, Value) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/mix")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("dirt stone"))
        .expect("request");
    let (status, body): (_, Value) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_string());
}
