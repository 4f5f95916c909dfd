// src/web/handlers.rs - JSON API handlers
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

use super::{error::ApiError, AppState};
use crate::device::{self, DeviceRegistry, DeviceStatus};
use crate::error::TopoError;
use crate::scenario::{Scenario, ScenarioResult};

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
    })
}

// ============================================================================
// DEVICES
// ============================================================================

/// Every row of the device table with its cells as raw strings
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let rows = device::read_rows(state.config.device_csv())?;
    Ok(Json(rows))
}

/// Current status of every device, keyed by id
pub async fn device_status(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, DeviceStatus>>, ApiError> {
    let registry = DeviceRegistry::load(state.config.device_csv())?;
    Ok(Json(registry.statuses()))
}

// ============================================================================
// TOPOLOGY FILES
// ============================================================================

pub async fn topology_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::topology::TopologyFile>>, ApiError> {
    Ok(Json(state.topologies.list().await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveTopologyResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Always answers 200; failures are reported in the body
pub async fn save_topology(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Json<SaveTopologyResponse> {
    match state.topologies.save(&document).await {
        Ok(path) => Json(SaveTopologyResponse {
            success: true,
            message: "拓扑图保存成功".to_string(),
            file: Some(path.display().to_string()),
        }),
        Err(e) => {
            warn!("Saving topology failed: {}", e);
            Json(SaveTopologyResponse {
                success: false,
                message: format!("保存失败: {}", e),
                file: None,
            })
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteTopologyRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

pub async fn delete_topology(
    State(state): State<AppState>,
    Json(req): Json<DeleteTopologyRequest>,
) -> Result<Json<ScenarioResult>, ApiError> {
    let name = match req.filename {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(ApiError::BadRequest("文件名不能为空".into())),
    };

    match state.topologies.delete(&name).await {
        Ok(()) => Ok(Json(ScenarioResult::success(format!(
            "文件 {} 已成功删除",
            name
        )))),
        Err(TopoError::NotFound(_)) => Err(ApiError::Message(
            StatusCode::NOT_FOUND,
            "文件不存在".into(),
        )),
        Err(TopoError::InvalidRequest(reason)) => Err(ApiError::BadRequest(reason)),
        Err(e) => Err(ApiError::Message(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("删除文件失败: {}", e),
        )),
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// Blocks until the whole power-off run has finished
pub async fn power_off(State(state): State<AppState>) -> Json<ScenarioResult> {
    info!("Power-off scenario requested");
    Json(state.runner.run(Scenario::PowerOff).await)
}

/// Blocks until the whole playback run has finished
pub async fn alarm_playback(State(state): State<AppState>) -> Json<ScenarioResult> {
    info!("Alarm playback requested");
    Json(state.runner.run(Scenario::Playback).await)
}

pub async fn cancel_scenario(State(state): State<AppState>) -> Json<ScenarioResult> {
    state.runner.cancel();
    Json(ScenarioResult::success("已请求取消"))
}
