use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

use voice_quality::report::{self, QualityRecord};
use voice_quality::{
    AdminLevel, AppConfig, AudioProcessor, RegionFilter, RegionTable, VoiceQualityClassifier,
};

#[derive(Parser)]
#[command(name = "voice-quality")]
#[command(about = "Voice quality rating and regional hearing-impairment data tools")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate the quality of a recorded voice (.wav)
    Voice {
        /// Audio file to analyse
        file: PathBuf,

        /// Write the one-row result CSV here
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Filter and summarise regional hearing-impairment counts
    Region {
        /// Semicolon-delimited CSV file
        file: PathBuf,

        #[arg(long)]
        province: Option<String>,

        #[arg(long)]
        regency: Option<String>,

        #[arg(long)]
        district: Option<String>,

        #[arg(long)]
        village: Option<String>,

        /// Print the available values for a level and exit
        #[arg(long, value_name = "LEVEL")]
        list: Option<AdminLevel>,

        /// Write the filtered rows here
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Voice { file, export, json } => {
            process_voice(&config, &file, export.as_deref(), json)
        }
        Commands::Region {
            file,
            province,
            regency,
            district,
            village,
            list,
            export,
        } => {
            let filter = RegionFilter {
                province,
                regency,
                district,
                village,
            };
            process_region(&config, &file, &filter, list, export.as_deref())
        }
    }
}

fn process_voice(config: &AppConfig, file: &Path, export: Option<&Path>, json: bool) -> Result<()> {
    info!("Processing audio file: {}", file.display());

    let audio_processor = AudioProcessor::new(config.audio.target_sample_rate);
    let classifier =
        VoiceQualityClassifier::with_config(config.audio.target_sample_rate, &config.features)?;

    let audio = audio_processor
        .load_audio_file(file)
        .with_context(|| format!("Failed to decode {}", file.display()))?;
    info!(
        "Loaded audio with {} samples ({:.2} seconds)",
        audio.values.len(),
        audio.duration_secs()
    );

    let result = classifier.classify(&audio)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    if json {
        println!("{}", report::to_json(&result)?);
    } else {
        println!("{}", report::render_summary(&file_name, &result));
        println!();
        print!("{}", report::render_coefficient_chart(result.chart_values()));
    }

    if let Some(path) = export {
        let out = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        report::write_quality_csv(out, &QualityRecord::new(&file_name, &result))?;
        info!("Exported result to {}", path.display());
    }

    Ok(())
}

fn process_region(
    config: &AppConfig,
    file: &Path,
    filter: &RegionFilter,
    list: Option<AdminLevel>,
    export: Option<&Path>,
) -> Result<()> {
    let delimiter = config.region.delimiter_byte()?;
    let table = RegionTable::from_path(file, delimiter)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if let Some(level) = list {
        for value in table.options(level) {
            println!("{}", value);
        }
        return Ok(());
    }

    let filtered = table.filter(filter);
    println!("{}", filtered.headers().join(" | "));
    for row in filtered.rows() {
        println!("{}", row.fields().join(" | "));
    }

    if !filtered.is_empty() {
        println!("\nImpairment count per village");
        print!("{}", filtered.render_bar_chart());
    }

    println!("\nFiltered rows: {}", filtered.len());
    println!("Total hearing impaired: {} people", filtered.total_count());

    if let Some(path) = export {
        let out = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        filtered.write_csv(out, delimiter)?;
        info!("Exported {} rows to {}", filtered.len(), path.display());
    }

    Ok(())
}
