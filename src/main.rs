use clap::Parser;
use uniconv::utils::error::ErrorSeverity;
use uniconv::utils::{logger, validation::Validate};
use uniconv::{convert, CliConfig, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting uniconv CLI");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    let jobs = match config.validate().and_then(|_| config.jobs()) {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.severity().exit_code().max(1));
        }
    };

    let storage = LocalStorage::default();
    let mut worst: Option<ErrorSeverity> = None;

    // 每個輸入檔各自轉換，失敗不影響下一個
    for job in jobs {
        let input = job.input_path.clone();
        match convert(storage.clone(), job).await {
            Ok(report) => {
                if let Some(preview) = &report.preview {
                    println!("{}", preview);
                }
                for warning in &report.warnings {
                    println!("⚠️  {}", warning);
                }
                println!("✅ {} converted ({} table(s))", input, report.table_names.len());
                println!("📁 Output saved to: {}", report.output_path);
            }
            Err(e) => {
                tracing::error!(
                    "❌ Conversion of {} failed: {} (Category: {:?}, Severity: {:?})",
                    input,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

                eprintln!("❌ {}: {}", input, e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());

                worst = worst.max(Some(e.severity()));
            }
        }
    }

    if let Some(severity) = worst {
        let exit_code = severity.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
