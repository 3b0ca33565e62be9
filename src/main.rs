use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ecolens::identify::IdentifyService;
use ecolens::vision::{sniff_media_type, VisionClient};
use ecolens::AppConfig;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Engine {
    /// Image-classification endpoint + encyclopedia enrichment
    Classifier,
    /// Multimodal LLM answering the full profile in one round trip
    Vision,
}

#[derive(Parser, Debug)]
#[command(name = "ecolens")]
#[command(about = "Identify a species from a photo and print the enriched profile")]
struct Cli {
    /// Path to the image file
    #[arg(long)]
    image: String,
    #[arg(long, value_enum, default_value_t = Engine::Classifier)]
    engine: Engine,
    /// Content type of the image; sniffed from magic bytes when omitted
    #[arg(long, default_value = "")]
    content_type: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let image = tokio::fs::read(&cli.image)
        .await
        .with_context(|| format!("failed to read {}", cli.image))?;
    let content_type = if cli.content_type.trim().is_empty() {
        sniff_media_type(&image).to_string()
    } else {
        cli.content_type.clone()
    };

    let profile = match cli.engine {
        Engine::Classifier => {
            let service = IdentifyService::new(&config)?;
            service.identify(&image, &content_type).await?
        }
        Engine::Vision => {
            let client = VisionClient::new(config.vision.clone())?;
            client.identify(&image, &content_type).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
