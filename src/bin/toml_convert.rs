use clap::Parser;
use uniconv::utils::error::ErrorSeverity;
use uniconv::utils::{logger, validation::Validate};
use uniconv::{convert, ConversionJob, Format, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-convert")]
#[command(about = "Batch conversions described in a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "uniconv.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the output directory from the job file
    #[arg(long)]
    output_path: Option<String>,

    /// Dry run - show what would be converted without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置（日誌格式取決於配置，先載入再初始化）
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    // --verbose 優先於配置中的 level
    match (config.json_logging(), config.log_level()) {
        (true, level) => logger::init_json_logger(level),
        (false, Some(level)) if !args.verbose => logger::init_cli_logger_with_level(level),
        (false, _) => logger::init_cli_logger(args.verbose),
    }

    tracing::info!("🚀 Starting TOML-based converter");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(output_path) = &args.output_path {
        config.defaults.output_path = Some(output_path.clone());
        tracing::info!("🔧 Output path overridden to: {}", output_path);
    }

    // 驗證配置
    let jobs = match config.validate().and_then(|_| config.jobs()) {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &jobs, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        perform_dry_run(&jobs);
        return Ok(());
    }

    let storage = LocalStorage::default();
    let mut failed = 0;
    let mut worst: Option<ErrorSeverity> = None;

    for (index, job) in jobs.into_iter().enumerate() {
        let input = job.input_path.clone();
        tracing::info!("▶️  Job {}: {} -> {}", index + 1, input, job.target);

        match convert(storage.clone(), job).await {
            Ok(report) => {
                for warning in &report.warnings {
                    println!("⚠️  {}", warning);
                }
                println!(
                    "✅ {} -> {} ({} table(s), {:.2?})",
                    input,
                    report.output_path,
                    report.table_names.len(),
                    report.elapsed
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    "❌ Job {} failed: {} (Category: {:?}, Severity: {:?})",
                    index + 1,
                    e,
                    e.category(),
                    e.severity()
                );
                eprintln!("❌ {}: {}", input, e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());
                worst = worst.max(Some(e.severity()));
            }
        }
    }

    if failed > 0 {
        tracing::warn!("{} job(s) failed", failed);
    }

    if let Some(severity) = worst {
        let exit_code = severity.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, jobs: &[ConversionJob], args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Converter: {} v{}",
        config.converter.name,
        config.converter.version.as_deref().unwrap_or("0.0.0")
    );
    if let Some(description) = &config.converter.description {
        println!("  Description: {}", description);
    }
    println!("  Output: {}", config.output_path());
    println!("  Jobs: {}", jobs.len());

    if let Some(max_pages) = config.max_pdf_pages() {
        println!("  PDF page limit: {}", max_pages);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(jobs: &[ConversionJob]) {
    println!("🔍 Dry Run Analysis:");
    println!();

    for (index, job) in jobs.iter().enumerate() {
        let source = match job.source {
            Some(format) => format.to_string(),
            None => Format::from_path(&job.input_path)
                .map(|f| format!("{} (detected)", f))
                .unwrap_or_else(|_| "unknown".to_string()),
        };

        println!("📄 Job {}: {}", index + 1, job.input_path);
        println!("  Source: {}", source);
        println!("  Target: {}", job.target);
        if let Some(name) = &job.output_name {
            println!("  Output name: {}", name);
        }
        if job.archive {
            println!("  Packaging: ZIP");
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
