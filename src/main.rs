use clap::Parser;
use closings_finder::config::Command;
use closings_finder::core::export::render_table;
use closings_finder::core::links::address_map_link;
use closings_finder::domain::model::{FilterOutcome, SearchQuery, SearchReport};
use closings_finder::domain::ports::ConfigProvider;
use closings_finder::utils::error::ErrorSeverity;
use closings_finder::utils::{logger, validation::Validate};
use closings_finder::{
    CliConfig, Dataset, LocalStorage, LookupError, NominatimGeocoder, SearchEngine, TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting closings-finder");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    // 載入資料集 (整個程序只載入一次)
    let options = match config.dataset_options() {
        Ok(options) => options,
        Err(e) => fail(&e),
    };
    let dataset =
        match Dataset::load(&LocalStorage::new(".".to_string()), config.dataset_path(), &options).await {
            Ok(dataset) => Arc::new(dataset),
            Err(e) => fail(&e),
        };

    match &cli.command {
        Command::Streets { prefix } => {
            let streets = match prefix {
                Some(prefix) => dataset.streets_matching(prefix),
                None => dataset.streets(),
            };
            for street in streets {
                println!("{}", street);
            }
        }
        Command::Search(args) => {
            let query = args.to_query(&config.search);
            run_search(dataset, config, query).await;
        }
    }

    Ok(())
}

async fn run_search(dataset: Arc<Dataset>, config: TomlConfig, query: SearchQuery) {
    let geocoder = match NominatimGeocoder::new(
        config.geocoder_endpoint(),
        config.user_agent(),
        config.geocoder_timeout(),
    ) {
        Ok(geocoder) => geocoder,
        Err(e) => fail(&e),
    };
    let storage = LocalStorage::new(config.output_path().to_string());
    let export_enabled = config.export.enabled;
    let listing_site = config.listing_site().to_string();
    let limits = config.search.clone();

    let mut engine = SearchEngine::new(dataset, geocoder, storage, config, limits);

    if let Err(e) = engine.search(query).await {
        fail(&e);
    }
    let Some(report) = engine.last_report() else {
        return;
    };

    print_report(report, &listing_site);

    if export_enabled {
        match engine.export(report).await {
            Ok(path) => {
                tracing::info!("📁 Export saved to: {}", path);
                println!("📁 Export saved to: {}", path);
            }
            Err(e) => fail(&e),
        }
    }
}

fn print_report(report: &SearchReport, listing_site: &str) {
    println!(
        "Highest Closings within {} meters of {}",
        report.query.radius_m, report.address
    );
    println!("Input Address Street View: {}", report.street_view_link);
    println!("Map: {}", address_map_link(&report.address));
    println!();
    print_outcome(&report.radius_results, listing_site);

    println!();
    println!("Highest Closings on {}", report.query.street);
    println!();
    print_outcome(&report.street_results, listing_site);
}

fn print_outcome(outcome: &FilterOutcome, listing_site: &str) {
    println!("{}", render_table(&outcome.rows, listing_site));
    if outcome.zero_size_excluded > 0 {
        println!(
            "⚠️ {} matching closings have no size and were left out",
            outcome.zero_size_excluded
        );
    }
}

fn fail(e: &LookupError) -> ! {
    tracing::error!(
        "❌ Search failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
