use std::io::BufRead;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::info;

use waav_phonemizer::{PhonemeFormat, PhonemizationService, PhonemizerConfig};

/// WaaV Phonemizer - multilingual text-to-phoneme conversion
#[derive(Parser, Debug)]
#[command(name = "waav-phonemizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert text to phonemes (reads stdin line by line when TEXT is omitted)
    Phonemize {
        /// Text to convert
        text: Option<String>,

        /// Language tag (detected when omitted; "mixed" forces segmentation)
        #[arg(short = 'l', long = "language")]
        language: Option<String>,

        /// Emit stress values
        #[arg(long)]
        stress: bool,

        /// Emit duration estimates
        #[arg(long)]
        durations: bool,

        /// Emit IPA instead of the backend's native symbols
        #[arg(long)]
        ipa: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect the language of a text
    Detect {
        text: String,
    },

    /// List supported languages and their preferred backends
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PhonemizerConfig::from_file(path)
            .map_err(|e| anyhow!("Failed to load config from {}: {}", path.display(), e))?,
        None => PhonemizerConfig::from_env()?,
    };
    info!(data_path = ?config.data_path, "Starting phonemizer");

    let service = PhonemizationService::new(config).await?;

    match cli.command {
        Commands::Phonemize {
            text,
            language,
            stress,
            durations,
            ipa,
            json,
        } => {
            let mut options = service.config().phoneme_options();
            options.include_stress |= stress;
            options.include_durations |= durations;
            if ipa {
                options.format = PhonemeFormat::Ipa;
            }

            let lines = match text {
                Some(text) => vec![text],
                None => std::io::stdin()
                    .lock()
                    .lines()
                    .collect::<Result<Vec<_>, _>>()?,
            };

            for line in lines {
                let result = service
                    .phonemize_with(&line, language.as_deref(), &options)
                    .await;
                if json {
                    println!("{}", serde_json::to_string(&result)?);
                } else if result.success {
                    println!("{}", result.to_phoneme_string());
                } else {
                    eprintln!(
                        "error: {}",
                        result.error.as_deref().unwrap_or("unknown failure")
                    );
                }
            }
        }
        Commands::Detect { text } => {
            let detection = service.detect(&text);
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        Commands::Languages => {
            for language in service.supported_languages() {
                match service.language_capabilities(&language) {
                    Some(caps) => println!(
                        "{language}\t{}\t{:.2}",
                        caps.preferred_backend, caps.quality_score
                    ),
                    None => println!("{language}"),
                }
            }
        }
    }

    Ok(())
}
