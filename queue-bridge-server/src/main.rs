/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Parser;
use in_memory_transport::{InMemoryBroker, InMemoryQueueSource, InMemoryTopicSink};
use queue_bridge::QueueBridge;
use static_catalog::StaticCatalog;
use std::fs;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command()]
struct BridgeArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started queue-bridge-server");

    let args = BridgeArgs::parse();
    let contents = fs::read_to_string(&args.config)
        .with_context(|| format!("Unable to read config file {}", args.config))?;
    let config: Config = json5::from_str(&contents).context("Unable to parse config file")?;

    let catalog = Arc::new(
        StaticCatalog::from_file(&config.catalog.file_path)
            .context("Unable to load static catalog")?,
    );

    let mut broker = InMemoryBroker::new();
    for acceptor in &config.broker.acceptors {
        broker = broker.with_acceptor(acceptor.descriptor());
        for protocol in &acceptor.protocols {
            broker = broker.with_protocol(protocol);
        }
    }

    let bridge = QueueBridge::new(
        config.bridge,
        catalog.clone(),
        catalog,
        Arc::new(InMemoryQueueSource::new()),
        Arc::new(InMemoryTopicSink::new()),
        Arc::new(broker),
    );

    bridge.start().await.context("Unable to start queue bridge")?;

    let topics = bridge.describe_topics(None).await;
    println!("{}", serde_json::to_string_pretty(&topics)?);

    tokio::signal::ctrl_c()
        .await
        .context("Unable to listen for shutdown signal")?;
    info!("Shutdown requested");
    bridge.stop().await;

    Ok(())
}
