//! Echo Bot Example
//!
//! A small bot on top of Ranni showing the two ways to write a handler:
//!
//! - a struct implementing [`EventHandler`] (`Help`, `Info`)
//! - closures assembled with [`handler_fn`] (`/echo`, `/ping`, `/recall`)
//!
//! plus a cron job and the help notice built from every registration.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot -- --config ranni.toml
//! RANNI_GATEWAY__WS_URL=127.0.0.1:6700 cargo run --package echo-bot
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use ranni::prelude::*;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "A simple echo bot built on Ranni")]
struct Args {
    /// Configuration file; searched in the usual places when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile (development, production, ...).
    #[arg(short, long)]
    profile: Option<String>,

    /// Group that receives the morning greeting.
    #[arg(long)]
    greet_group: Option<i64>,
}

// ============================================================================
// Struct handlers
// ============================================================================

/// `/help`: replies with the help notice.
struct Help {
    notice: String,
}

#[async_trait]
impl EventHandler for Help {
    fn filter(&self, ctx: &EventContext) -> bool {
        ctx.plain_text() == "/help"
    }

    async fn handle(&self, ctx: Arc<EventContext>) {
        if let Err(e) = ctx.send_text(self.notice.as_str()).await {
            error!("Failed to send help notice: {e}");
        }
    }

    fn help(&self) -> &str {
        "/help - 显示本指南"
    }
}

/// `/info`: describes the message it was sent in.
struct Info;

#[async_trait]
impl EventHandler for Info {
    fn filter(&self, ctx: &EventContext) -> bool {
        ctx.plain_text() == "/info"
    }

    async fn handle(&self, ctx: Arc<EventContext>) {
        let sender = ctx.sender();
        let mut chain = MessageChain::new();
        chain
            .add(Message::image(avatar_url(ctx.user_id())))
            .add_text(format!(
                "类型: {}\n发送者: {} ({})\n会话: {}",
                ctx.event_type(),
                sender.nickname,
                ctx.user_id(),
                ctx.subject_id(),
            ));

        if let Err(e) = ctx.send(&chain).await {
            error!("Failed to send info: {e}");
        }
    }

    fn help(&self) -> &str {
        "/info - 查看消息信息"
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;
    logging::init_from_config(&config.logging);

    let mut engine = RobotEngine::new(config)?;

    engine
        .register(handler_fn(
            "/echo <内容> - 复读",
            filters::starts_with("/echo "),
            |ctx| async move {
                let mut reply = MessageChain::new();
                for message in ctx.chain().iter() {
                    match message.as_text() {
                        Some(text) => {
                            reply.add_text(text.trim_start().trim_start_matches("/echo "));
                        }
                        None => {
                            reply.add(message.clone());
                        }
                    }
                }
                if let Err(e) = ctx.send(&reply).await {
                    error!("Failed to send echo reply: {e}");
                }
            },
        ))
        .register(handler_fn(
            "/ping - Pong!",
            |ctx| ctx.plain_text() == "/ping",
            |ctx| async move {
                if let Err(e) = ctx.send_text("Pong! 🏓").await {
                    error!("Failed to send ping reply: {e}");
                }
            },
        ))
        .register(handler_fn(
            "/recall - 发送一条五秒后撤回的消息",
            |ctx| ctx.plain_text() == "/recall",
            |ctx| async move {
                match ctx.send_text("这条消息会在五秒后撤回").await {
                    Ok(receipt) => {
                        receipt.recall_after(Duration::from_secs(5));
                    }
                    Err(e) => error!("Failed to send recall demo: {e}"),
                }
            },
        ))
        .register(Info);

    // Registered last so its notice lists every handler above.
    let notice = format!("{}\n/help - 显示本指南", engine.help_notice());
    engine.register(Help { notice });

    if let Some(group_id) = args.greet_group {
        engine.register_cron("0 0 8 * * *", move |gateway| async move {
            let chain = MessageChain::from("早上好！");
            match gateway.send_to_group(group_id, &chain).await {
                Ok(receipt) if receipt.is_failed() => error!(group_id, "Greeting rejected"),
                Ok(_) => info!(group_id, "Greeting sent"),
                Err(e) => error!(group_id, "Failed to send greeting: {e}"),
            }
        })?;
    }

    engine.run().await?;
    Ok(())
}
