//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use house_price_service::{
    config::FeatureConfig, create_router, AppState, FeatureRow, FeatureSchema, InferenceEngine,
    Regressor,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Price = 1000 per m² plus 50000 for the north region
struct FakeModel;

impl Regressor for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    fn predict(&self, row: &FeatureRow) -> anyhow::Result<f64> {
        let area = row.get("area").and_then(|v| v.as_number()).unwrap_or(0.0);
        let norte = row
            .get("regiao_norte")
            .and_then(|v| v.as_number())
            .unwrap_or(0.0);
        Ok(area * 1000.0 + norte * 50000.0)
    }
}

struct BrokenModel;

impl Regressor for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    fn predict(&self, _row: &FeatureRow) -> anyhow::Result<f64> {
        anyhow::bail!("internal tensor error")
    }
}

fn schema() -> FeatureSchema {
    FeatureSchema::new(
        ["area", "quartos", "banheiros", "piscina", "regiao_norte", "regiao_sul"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
    .expect("test")
}

fn ready_app(model: Box<dyn Regressor>) -> Router {
    let engine = InferenceEngine::with_model(model, schema(), &FeatureConfig::default());
    create_router(AppState::new(engine))
}

fn unready_app() -> Router {
    create_router(AppState::new(InferenceEngine::unloaded(
        &FeatureConfig::default(),
    )))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("test");

    let response = app.oneshot(request).await.expect("test");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_root_reports_readiness() {
    let (status, body) = send(ready_app(Box::new(FakeModel)), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modelo_carregado"], true);
    assert_eq!(body["modelo"], "fake");
    assert_eq!(body["endpoints"]["prever"], "/prever");

    let (_, body) = send(unready_app(), "GET", "/", None).await;
    assert_eq!(body["modelo_carregado"], false);
}

#[tokio::test]
async fn test_health_healthy() {
    let (status, body) = send(ready_app(Box::new(FakeModel)), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "healthy",
            "modelo_carregado": true,
            "colunas_carregadas": true,
            "total_colunas": 6
        })
    );
}

#[tokio::test]
async fn test_health_unhealthy() {
    let (status, body) = send(unready_app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["modelo_carregado"], false);
    assert_eq!(body["colunas_carregadas"], false);
    assert_eq!(body["total_colunas"], 0);
}

#[tokio::test]
async fn test_regions() {
    let (status, body) = send(ready_app(Box::new(FakeModel)), "GET", "/regioes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["regioes_disponiveis"], json!(["norte", "sul"]));
    assert_eq!(body["total"], 2);

    let (status, _) = send(unready_app(), "GET", "/regioes", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_predict_success_echoes_input() {
    let input = json!({"area": 100, "quartos": 5, "banheiros": 3, "regiao": "norte", "piscina": "sim"});
    let (status, body) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever",
        Some(input.clone()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preco_previsto"], 150000.0);
    assert_eq!(body["dados_entrada"], input);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_predict_invalid_region_is_400() {
    let (status, body) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever",
        Some(json!({"area": 100, "regiao": "leste"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valores_validos"], json!(["norte", "sul"]));
    assert!(body["detail"].as_str().expect("test").contains("leste"));
}

#[tokio::test]
async fn test_predict_without_model_is_500() {
    let (status, body) = send(
        unready_app(),
        "POST",
        "/prever",
        Some(json!({"area": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .expect("test")
        .contains("Modelo não carregado"));
}

#[tokio::test]
async fn test_predict_model_failure_is_generic_500() {
    let (status, body) = send(
        ready_app(Box::new(BrokenModel)),
        "POST",
        "/prever",
        Some(json!({"area": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Erro ao fazer previsão");
}

#[tokio::test]
async fn test_predict_nested_value_is_422() {
    let (status, _) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever",
        Some(json!({"area": {"valor": 100}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let casas = json!([
        {"area": 100, "regiao": "norte"},
        {"area": 90, "regiao": "leste"},
        {"area": 80, "regiao": "sul"}
    ]);
    let (status, body) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever/batch",
        Some(casas.clone()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_casas"], 3);

    let previsoes = body["previsoes"].as_array().expect("test");
    assert_eq!(previsoes.len(), 3);

    assert_eq!(previsoes[0]["index"], 0);
    assert_eq!(previsoes[0]["status"], "success");
    assert_eq!(previsoes[0]["preco_previsto"], 150000.0);

    assert_eq!(previsoes[1]["index"], 1);
    assert_eq!(previsoes[1]["status"], "error");
    assert!(previsoes[1]["erro"].as_str().expect("test").contains("leste"));
    assert_eq!(previsoes[1]["dados"], casas[1]);

    assert_eq!(previsoes[2]["index"], 2);
    assert_eq!(previsoes[2]["status"], "success");
    assert_eq!(previsoes[2]["preco_previsto"], 80000.0);
}

#[tokio::test]
async fn test_batch_without_model_is_500() {
    let (status, _) = send(
        unready_app(),
        "POST",
        "/prever/batch",
        Some(json!([{"area": 100}])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_empty_batch() {
    let (status, body) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever/batch",
        Some(json!([])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_casas"], 0);
    assert_eq!(body["previsoes"], json!([]));
}

async fn send_raw(app: Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("test");

    let response = app.oneshot(request).await.expect("test");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test");
    (status, serde_json::from_slice(&bytes).expect("test"))
}

#[tokio::test]
async fn test_predict_numeric_field_as_text() {
    let (status, body) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever",
        Some(json!({"quartos": "cinco", "area": 100, "regiao": "norte"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().expect("test").contains("quartos"));

    let (status, _) = send(
        ready_app(Box::new(FakeModel)),
        "POST",
        "/prever",
        Some(json!({"quartos": "5", "area": 100, "regiao": "norte"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_json_body_uses_error_shape() {
    let (status, body) = send_raw(ready_app(Box::new(FakeModel)), "/prever", "{not json").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"]
        .as_str()
        .expect("test")
        .starts_with("Entrada inválida"));
}

#[tokio::test]
async fn test_batch_body_must_be_array() {
    let (status, body) = send_raw(
        ready_app(Box::new(FakeModel)),
        "/prever/batch",
        r#"{"area": 1}"#,
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
    assert!(body.get("valores_validos").is_none());
}
