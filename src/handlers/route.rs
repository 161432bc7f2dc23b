//! Route optimization handlers

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::orchestrator::{OptimizeError, RouteOptimizer};
use crate::types::{
    ErrorResponse, OptimizeMultiDayRequest, OptimizeRouteRequest, Request, SuccessResponse,
};

fn error_response(request_id: Uuid, err: &OptimizeError) -> ErrorResponse {
    let response = ErrorResponse::new(request_id, err.code(), err.to_string());
    match err {
        OptimizeError::Day { day, .. } => {
            response.with_details(serde_json::json!({ "day": day }))
        }
        _ => response,
    }
}

/// Handle tradeflow.route.optimize requests
pub async fn handle_optimize(
    client: Client,
    mut subscriber: Subscriber,
    optimizer: Arc<RouteOptimizer>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<OptimizeRouteRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse route optimize request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        match optimizer.optimize_single_day(request.payload).await {
            Ok(response) => {
                info!(
                    "Optimized single-day route: {} jobs on {}",
                    response.jobs.len(),
                    response.date
                );
                let success = SuccessResponse::new(request.id, response);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Failed to optimize route: {}", e);
                let error = error_response(request.id, &e);
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}

/// Handle tradeflow.route.optimize_multi_day requests
pub async fn handle_optimize_multi_day(
    client: Client,
    mut subscriber: Subscriber,
    optimizer: Arc<RouteOptimizer>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<OptimizeMultiDayRequest> =
            match serde_json::from_slice(&msg.payload) {
                Ok(req) => req,
                Err(e) => {
                    error!("Failed to parse multi-day optimize request: {}", e);
                    let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                    let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                    continue;
                }
            };

        match optimizer.optimize_multi_day(request.payload).await {
            Ok(response) => {
                info!(
                    "Optimized multi-day schedule: {} jobs over {} days",
                    response.total_jobs, response.total_days
                );
                let success = SuccessResponse::new(request.id, response);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Failed to optimize multi-day schedule: {}", e);
                let error = error_response(request.id, &e);
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}
