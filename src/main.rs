use colored::Colorize;
use pantrybot::{
    AppResult,
    bot::BotRuntime,
    cli::{Cli, Commands},
    config::Config,
    init_logging,
};

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse_args();

    // Config subcommands print and exit without touching the network
    if let Commands::Config { action } = cli.command() {
        Config::handle_command(&action, &cli.config_file)?;
        return Ok(());
    }

    // Load configuration
    let config = Config::load_or_default(&cli.config_file);

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = init_logging(&cli.effective_log_level(), &config.log.file_path)?;

    tracing::info!("PantryBot starting...");
    tracing::debug!("CLI arguments: {:?}", cli);

    if cli.is_dry_run_mode() {
        print_dry_run_summary(&cli, &config);
        return Ok(());
    }

    config.validate_credentials()?;

    let mut runtime = BotRuntime::new(config).await?;
    runtime.run().await?;

    Ok(())
}

fn print_dry_run_summary(cli: &Cli, config: &Config) {
    let status = |ok: bool| {
        if ok {
            "set".green()
        } else {
            "missing".red()
        }
    };

    println!();
    println!("{}", "PantryBot dry run".bold());
    println!("Config file:     {}", cli.config_file);
    println!("Log level:       {}", cli.effective_log_level());
    println!("Log file:        {}", config.log.file_path);
    println!("Database file:   {}", config.store.db_file);
    println!("Gemini model:    {}", config.gemini.model.cyan());
    println!("Command prefix:  {}", config.discord.command_prefix.cyan());
    println!("Slider expiry:   {}s", config.slider.expiry_secs);
    println!("Discord token:   {}", status(!config.discord.token.is_empty()));
    println!("Gemini API key:  {}", status(!config.gemini.api_key.is_empty()));

    match config.validate_credentials() {
        Ok(()) => println!("{}", "Ready to connect".green()),
        Err(e) => println!("{} {}", "Not ready:".yellow(), e),
    }
}
