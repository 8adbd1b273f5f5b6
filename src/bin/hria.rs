use clap::Parser;
use log::LevelFilter;

use hria::advisor::Advisor;
use hria::analysis::policy::OrderedFallback;
use hria::app::App;
use hria::cli::Cli;
use hria::editor::SystemEditor;
use hria::features::FeatureFlags;
use hria::llm::LlmConfig;
use hria::report::PdfOptions;
use hria::store::FilePersistence;

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags
    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    // Initialize feature flags from environment, then apply CLI overrides
    let features = FeatureFlags::from_env().with_cli(cli.features.as_deref());

    // Build LLM config from environment, then apply CLI overrides
    let llm_config = LlmConfig::from_env().with_overrides(
        cli.llm.provider,
        cli.llm.model.clone(),
        cli.llm.timeout,
        cli.llm.opencode_backend.clone(),
    );
    let policy = OrderedFallback::from_config(&llm_config);

    let provider = features.analysis_provider(policy.clone());

    let store = match features.open_store(FilePersistence::new(&cli.data_dir)) {
        Ok(store) => store,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    let mut app = App::new(store, SystemEditor::new(), provider, Advisor::new(policy))
        .with_pdf_options(PdfOptions::from_env());

    if let Err(err) = app.run(cli.command) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
