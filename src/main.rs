mod app;
mod config;
mod error;
mod gate;
mod history;
mod identity;
mod logging;
mod lookup;
mod markdown;
mod openai;
mod prompt;
mod recent;
mod session;
mod store;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::{Cli, Command, Config};
use error::DefineError;
use openai::OpenAIClient;
use std::io::{self, Read};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);
    logging::init(&config.log_file)?;

    if let Some(Command::Define { word, stdin }) = cli.command {
        return define(&config, word, stdin).await;
    }

    info!(model = %config.openai.model, data_dir = ?config.data_dir, "Starting jrdict");
    let mut app = App::new(&config)?;

    if let Some(word) = cli.word {
        app.search(&word, true).await?;
    }

    app.run().await?;

    Ok(())
}

async fn define(config: &Config, word: Option<String>, stdin: bool) -> Result<()> {
    let request = if stdin {
        let mut body = String::new();
        io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read request from stdin")?;
        lookup::word_from_request(&body)
    } else {
        word.ok_or_else(|| {
            DefineError::Validation("Word is required and must be a string".to_string())
        })
    };

    let client = OpenAIClient::new(config.openai.clone())?;
    let response = lookup::run(&client, request).await;
    println!("{}", serde_json::to_string(&response)?);

    if !response.is_success() {
        error!("define failed: {:?}", response);
        std::process::exit(1);
    }
    Ok(())
}
