//! Schedule chat handler
//!
//! Forwards the conversation to the completion service with the current
//! schedule embedded in the system prompt. The assistant's reply goes back
//! verbatim; no schedule mutation happens here.

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error};
use uuid::Uuid;

use crate::services::completion::CompletionService;
use crate::services::prompts::schedule_assistant_prompt;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ErrorResponse, Request, SuccessResponse};

const CHAT_MAX_TOKENS: u32 = 800;
const CHAT_TEMPERATURE: f32 = 0.7;

/// Handle tradeflow.chat.message requests
pub async fn handle_chat(
    client: Client,
    mut subscriber: Subscriber,
    completion: Arc<dyn CompletionService>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        let reply = match msg.reply {
            Some(ref r) => r.clone(),
            None => continue,
        };

        let request: Request<ChatRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse chat request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let payload = request.payload;
        if payload.messages.is_empty() {
            let error = ErrorResponse::new(
                request.id,
                "VALIDATION_ERROR",
                "At least one message is required",
            );
            let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            continue;
        }

        let mut messages =
            vec![ChatMessage::system(schedule_assistant_prompt(&payload.schedule))];
        messages.extend(payload.messages);

        debug!(
            "Chat request: {} messages, {} jobs in schedule context",
            messages.len() - 1,
            payload.schedule.len()
        );

        match completion
            .complete(&messages, CHAT_MAX_TOKENS, CHAT_TEMPERATURE)
            .await
        {
            Ok(content) => {
                let success =
                    SuccessResponse::new(request.id, ChatResponse { reply: content });
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Chat completion failed: {:#}", e);
                let error =
                    ErrorResponse::new(request.id, "CHAT_ERROR", format!("{:#}", e));
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}
