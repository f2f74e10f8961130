//! Studio Shot CLI - AI background treatment for product photos

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use studio_shot::config::StudioConfig;
use studio_shot::error::{FixSuggestion, StudioError};
use studio_shot::{
    build_instruction, create_transformer, mask_api_key, BackgroundOption, UploadedFile,
    WorkflowController,
};

#[derive(Parser)]
#[command(name = "studio-shot")]
#[command(about = "Studio Shot - AI-enhanced product photos with a clean background")]
#[command(version)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance a photo
    Enhance {
        /// Path to a PNG, JPEG, WebP, HEIC or HEIF image
        file: PathBuf,

        /// Background treatment (white, original)
        #[arg(short, long)]
        background: Option<BackgroundOption>,

        /// Where to save the result (default: <name>-enhanced.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the transformer (gemini, mock)
        #[arg(short, long)]
        transformer: Option<String>,

        /// Override the image model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the instruction sent for a background option
    Instruction {
        /// Background treatment (white, original)
        #[arg(short, long, default_value = "white")]
        background: BackgroundOption,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Store the Gemini API key
    SetKey {
        /// API key
        key: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(StudioConfig::config_path);

    let result = match cli.command {
        Commands::Enhance {
            file,
            background,
            output,
            transformer,
            model,
        } => enhance(&config_path, &file, background, output, transformer, model).await,
        Commands::Instruction { background } => {
            println!("{}", build_instruction(background));
            Ok(())
        }
        Commands::Config { action } => handle_config_command(&config_path, action),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn enhance(
    config_path: &Path,
    file: &Path,
    background: Option<BackgroundOption>,
    output: Option<PathBuf>,
    transformer_override: Option<String>,
    model_override: Option<String>,
) -> Result<(), StudioError> {
    let mut config = StudioConfig::load_from(config_path)?.with_env();
    if let Some(m) = model_override {
        config.defaults.model = Some(m);
    }
    // The mock only runs when asked for by name
    let name = transformer_override
        .or_else(|| config.transformer().map(str::to_string))
        .ok_or_else(|| StudioError::MissingApiKey {
            provider: "gemini".to_string(),
        })?;
    let transformer = create_transformer(&name, &config)?;

    let controller = WorkflowController::with_option(transformer, config.background());
    if let Some(option) = background {
        controller.select_option(option);
    }

    let upload = UploadedFile::from_path(file)?;
    controller.upload(upload);

    let option = controller.state().selected_option;
    println!(
        "{} {} ({}, via {})",
        "Enhancing".cyan().bold(),
        file.display(),
        option.label(),
        controller.transformer_name()
    );

    let result = match controller.trigger_process().await.into_result() {
        Ok(result) => result,
        Err(error) => {
            controller.teardown();
            return Err(error);
        }
    };

    let output = output.unwrap_or_else(|| default_output_path(file));
    result.write_to(&output).await?;
    controller.teardown();

    println!("{} {}", "✓ Saved".green().bold(), output.display());
    Ok(())
}

/// `<dir>/<stem>-enhanced.png` next to the source
fn default_output_path(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    file.with_file_name(format!("{}-enhanced.png", stem))
}

fn handle_config_command(config_path: &Path, action: ConfigAction) -> Result<(), StudioError> {
    match action {
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Show => {
            let config = StudioConfig::load_from(config_path)?.with_env();
            let key = config
                .gemini_key()
                .map(|k| mask_api_key(k, 6))
                .unwrap_or_else(|| "(not set)".to_string());

            println!("{}", "Configuration".cyan().bold());
            println!("  file:        {}", config_path.display());
            println!(
                "  transformer: {}",
                config.transformer().unwrap_or("(none, set a key)")
            );
            println!("  model:       {}", config.model());
            println!("  endpoint:    {}", config.endpoint());
            println!("  background:  {}", config.background());
            println!("  gemini key:  {}", key);
        }
        ConfigAction::SetKey { key } => {
            let mut config = StudioConfig::load_from(config_path)?;
            config.api_keys.gemini = Some(key);
            config.save_to(config_path)?;
            println!("{} {}", "✓ Key saved to".green(), config_path.display());
        }
    }
    Ok(())
}
