use clap::Parser;
use lims_admin::admin::ChangeListRequest;
use lims_admin::config::Command;
use lims_admin::core::{DispatchMode, MessageLevel, MessageSink};
use lims_admin::utils::error::ErrorSeverity;
use lims_admin::utils::{logger, validation::Validate};
use lims_admin::{
    select_dispatcher, CliConfig, ConsoleMessages, FileRecordStore, LimsConfig, LimsEngine,
    LimsError, LocalStorage,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match LimsConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
    for binding in config.short_bindings() {
        tracing::warn!(
            "Binding {} lists fewer fields than its template needs; its labels will be skipped",
            binding.id
        );
    }

    if let Err(e) = run(cli, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig, config: LimsConfig) -> Result<(), LimsError> {
    // One dispatcher for the whole process.
    let dispatcher = select_dispatcher(&config.printing)?;
    let store = FileRecordStore::new(LocalStorage::new(config.data_dir().to_string()));
    let engine = LimsEngine::new(store, config.catalog(), dispatcher);

    match cli.command {
        Command::Check => {
            display_config_summary(&config, &engine);
            println!("✅ Configuration is valid");
        }
        Command::Describe { model } => {
            let admin = engine.site().get(model).ok_or_else(|| {
                LimsError::UnknownRecordTypeError {
                    name: model.key().to_string(),
                }
            })?;
            println!("📋 {} ({})", model.verbose_name(), model.key());
            println!("  Columns: {}", admin.list_display.join(", "));
            let filters: Vec<String> = admin
                .list_filter
                .iter()
                .map(|spec| spec.build(model).parameter_name().to_string())
                .collect();
            println!("  Filters: {}", filters.join(", "));
            println!("  Read-only: {}", admin.readonly_fields.join(", "));
            println!("  Raw id fields: {}", admin.raw_id_fields.join(", "));
            println!("  Editable (with --edit): {}", admin.editable_fields.join(", "));
            println!("  Horizontal pickers: {}", admin.filter_horizontal.join(", "));
            println!("  Per page: {}", admin.list_per_page);
            if admin.redirect_after_change {
                println!("  Saving returns to the change list");
            }
        }
        Command::Actions { model } => {
            let actions = engine.actions(model)?;
            if actions.is_empty() {
                ConsoleMessages.message_user(
                    MessageLevel::Info,
                    &format!("No barcode actions for {}", model),
                );
            }
            for action in actions {
                println!("{}\t{}", action.name(), action.description());
            }
        }
        Command::Print { model, action, ids } => {
            let report = engine
                .run_action(model, &action, &ids, &ConsoleMessages)
                .await?;
            for skipped in &report.skipped {
                ConsoleMessages.message_user(
                    MessageLevel::Warning,
                    &format!("Record {} skipped: {}", skipped.id, skipped.reason),
                );
            }
        }
        Command::Changelist {
            model,
            filters,
            page,
            edit,
        } => {
            let mut request: ChangeListRequest = filters.into_iter().collect();
            request = request.page(page);
            if edit {
                request = request.editable();
            }

            let list = engine.changelist(model, &request).await?;
            println!("{}", list.to_tsv());
            println!();
            println!(
                "📄 Page {} of {} ({} {} record(s))",
                list.page + 1,
                list.num_pages,
                list.total,
                model
            );
            if !list.editable.is_empty() {
                println!("✏️ Editable: {}", list.editable.join(", "));
            }
            for (name, description) in &list.actions {
                println!("🏷️ {}: {}", name, description);
            }
        }
    }

    Ok(())
}

fn display_config_summary<R: lims_admin::core::RecordStore>(
    config: &LimsConfig,
    engine: &LimsEngine<R>,
) {
    println!("📋 Configuration Summary:");
    println!("  Site: {}", config.site.name);
    println!("  Data: {}", config.data_dir());
    let mode = match engine.dispatcher().mode() {
        DispatchMode::Spooler => format!("spooler ({})", config.printing.command),
        DispatchMode::Diagnostic => "diagnostic (stderr)".to_string(),
    };
    println!("  Printing: {}", mode);
    println!("  Printers: {}", config.printers.len());
    println!("  Templates: {}", config.templates.len());
    for template in &config.templates {
        match template.placeholder_count() {
            Ok(slots) => println!(
                "    {}: {} slot(s) over {} field(s)",
                template.name, slots, template.nr_fields
            ),
            Err(e) => println!("    {}: {}", template.name, e),
        }
    }
    println!("  Bindings: {}", config.bindings.len());
    println!("  Admin registrations: {}", engine.site().registered().count());
    println!();
}
