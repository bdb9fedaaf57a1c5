use axum::{Json, Router, routing::post};
use serde::Deserialize;

use crate::catalog::{CatalogSnapshot, InMemoryCatalog};
use crate::data::Section;
use crate::error::EngineError;
use crate::fitness::{self, FitnessBreakdown};
use crate::hybrid::{GenerateRequest, ScheduleEngine};
use crate::solution::ScheduleSolution;

/// Stateless planning request: the catalog snapshot travels with the
/// generate arguments, so the service holds no state between calls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest {
    pub catalog: CatalogSnapshot,
    #[serde(flatten)]
    pub request: GenerateRequest,
}

async fn generate_handler(
    Json(body): Json<GenerateScheduleRequest>,
) -> Result<Json<ScheduleSolution>, (axum::http::StatusCode, String)> {
    let catalog = InMemoryCatalog::new(body.catalog);
    let engine = ScheduleEngine::new(&catalog, &catalog);
    match engine.generate(&body.request) {
        Ok(solution) => Ok(Json(solution)),
        Err(e @ EngineError::StudentNotFound(_)) => {
            Err((axum::http::StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => Err((axum::http::StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
    }
}

/// Analysis request: score an explicit set of sections as one schedule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessBreakdownRequest {
    pub sections: Vec<Section>,
}

async fn fitness_handler(Json(body): Json<FitnessBreakdownRequest>) -> Json<FitnessBreakdown> {
    Json(fitness::breakdown(&body.sections))
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/schedules/generate", post(generate_handler))
        .route("/v1/schedules/fitness", post(fitness_handler))
}

pub async fn run_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, router()).await.unwrap();
}
