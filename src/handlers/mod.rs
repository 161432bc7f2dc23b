//! NATS message handlers

pub mod chat;
pub mod ping;
pub mod route;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tracing::{error, info};

use crate::config::Config;
use crate::services::completion::{CompletionService, OpenAiClient, OpenAiConfig};
use crate::services::orchestrator::RouteOptimizer;
use crate::services::travel_time::{create_travel_time_service, TravelTimeService};

/// Start all message handlers
pub async fn start_handlers(client: Client, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    // Shared collaborators
    let completion: Arc<dyn CompletionService> = Arc::new(OpenAiClient::new(OpenAiConfig::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    )));
    info!("Completion service initialized: {}", completion.name());

    let travel_time: Arc<dyn TravelTimeService> = Arc::from(create_travel_time_service(
        config.google_maps_api_key.clone(),
        &config.google_maps_url,
    ));
    info!("Travel-time service initialized: {}", travel_time.name());

    let optimizer = Arc::new(RouteOptimizer::new(
        Arc::clone(&completion),
        Arc::clone(&travel_time),
    ));

    // Subscribe to all subjects
    let ping_sub = client.subscribe("tradeflow.ping").await?;
    let optimize_sub = client.subscribe("tradeflow.route.optimize").await?;
    let optimize_multi_day_sub = client
        .subscribe("tradeflow.route.optimize_multi_day")
        .await?;
    let chat_sub = client.subscribe("tradeflow.chat.message").await?;

    info!("Subscribed to NATS subjects");

    // Clone for each handler
    let client_ping = client.clone();
    let client_optimize = client.clone();
    let client_optimize_multi_day = client.clone();
    let client_chat = client.clone();

    let optimizer_single = Arc::clone(&optimizer);
    let optimizer_multi = Arc::clone(&optimizer);
    let completion_chat = Arc::clone(&completion);

    // Spawn handlers
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub).await
    });

    let optimize_handle = tokio::spawn(async move {
        route::handle_optimize(client_optimize, optimize_sub, optimizer_single).await
    });

    let optimize_multi_day_handle = tokio::spawn(async move {
        route::handle_optimize_multi_day(
            client_optimize_multi_day,
            optimize_multi_day_sub,
            optimizer_multi,
        )
        .await
    });

    let chat_handle = tokio::spawn(async move {
        chat::handle_chat(client_chat, chat_sub, completion_chat).await
    });

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which means an error occurred)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = optimize_handle => {
            error!("Route optimize handler finished: {:?}", result);
        }
        result = optimize_multi_day_handle => {
            error!("Multi-day optimize handler finished: {:?}", result);
        }
        result = chat_handle => {
            error!("Chat handler finished: {:?}", result);
        }
    }

    Ok(())
}
