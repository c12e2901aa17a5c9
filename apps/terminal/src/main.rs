use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use client_core::{
    CatalogQueryBridge, ConfirmationPrompt, OrderFeed, OrderFeedEvent, SessionManager,
};
use gateway::HttpGateway;
use storage::SqliteSessionStore;
use tracing::info;

/// Manual smoke run against a live backend: sign in (or restore the
/// persisted session), list the catalog, then tail the order feed.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "COMANDA_SERVER_URL")]
    server_url: String,
    #[arg(long, env = "COMANDA_DATABASE_URL", default_value = "sqlite://comanda.db")]
    database_url: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Catalog search term to run once after sign-in (empty lists everything).
    #[arg(long, default_value = "")]
    search: String,
}

/// Terminal runs are unattended; deliveries are confirmed without a dialog.
struct AssumeYes;

#[async_trait]
impl ConfirmationPrompt for AssumeYes {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let gateway = Arc::new(HttpGateway::new(args.server_url));
    let store = Arc::new(SqliteSessionStore::new(&args.database_url).await?);
    let sessions = SessionManager::new(gateway.clone(), store);

    let session = match sessions.restore().await {
        Some(session) => session,
        None => {
            let (Some(email), Some(password)) = (args.email, args.password) else {
                anyhow::bail!("no persisted session; pass --email and --password");
            };
            match sessions.sign_in(&email, &password).await {
                Ok(session) => session,
                Err(err) => anyhow::bail!("{}", err.user_message()),
            }
        }
    };
    println!(
        "Signed in as {} (admin: {})",
        session.display_name, session.is_admin
    );

    let catalog = CatalogQueryBridge::new(gateway.clone());
    match catalog.query(&args.search).await {
        Ok(entries) => {
            println!("Catalog ({} entries):", entries.len());
            for entry in entries {
                println!(
                    "  {}: P {} / M {} / G {}",
                    entry.name,
                    entry.price_by_size.p,
                    entry.price_by_size.m,
                    entry.price_by_size.g
                );
            }
        }
        Err(err) => println!("{}", err.user_message()),
    }

    let feed = OrderFeed::new(gateway, Arc::new(AssumeYes));
    let mut events = feed.subscribe_events();
    feed.start(&session).await.map_err(|err| {
        anyhow::anyhow!("order feed failed to start: {}", err.user_message())
    })?;
    info!(user_id = %session.user_id, "tailing order feed; ctrl-c to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(OrderFeedEvent::Snapshot(orders)) => {
                    println!("Orders ({}):", orders.len());
                    for order in orders {
                        println!(
                            "  [{}] table {}: {} x{} ({})",
                            order.status.as_wire(),
                            order.table_number,
                            order.product_name,
                            order.quantity,
                            order.amount
                        );
                    }
                }
                Ok(OrderFeedEvent::WriteFailed { order_id, message }) => {
                    println!("write failed for {order_id}: {message}");
                }
                Err(_) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    feed.stop().await;
    Ok(())
}
