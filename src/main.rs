use clap::Parser;
use moodle_grab::utils::{logger, validation::Validate};
use moodle_grab::{CliConfig, LocalStorage, MoodlePipeline, ProfileConfig, ScrapeEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting moodle-grab");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Some(profile_path) = config.config.clone() {
        match ProfileConfig::from_file(&profile_path) {
            Ok(profile) => {
                tracing::info!("📄 Applying profile from {}", profile_path);
                config.apply_profile(profile);
            }
            Err(e) => {
                tracing::error!("❌ Failed to load profile {}: {}", profile_path, e);
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let file_storage = LocalStorage::new(config.download_root.clone());
    let pipeline = match MoodlePipeline::new(storage, file_storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ Failed to set up the scraper: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let engine = ScrapeEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Scrape completed successfully!");
            println!("✅ Scrape completed successfully!");
            println!("📁 Dump saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Scrape failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                moodle_grab::utils::error::ErrorSeverity::Low => 0,
                moodle_grab::utils::error::ErrorSeverity::Medium => 2,
                moodle_grab::utils::error::ErrorSeverity::High => 1,
                moodle_grab::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
