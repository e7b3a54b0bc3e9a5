use clap::CommandFactory;
use eyre::Result;
use taskpilot::cli::{Command, handlers};
use taskpilot::config::{Configuration, init_logger, verbose};

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    Configuration::init(config.clone())?;
    verbose!("[+] Logger initialized");

    let Some(action) = cmd.action() else {
        Command::command().print_help()?;
        return Ok(());
    };

    if let Err(err) = handlers::run(action, &config).await {
        log::error!("{:#}", err);
        return Err(err);
    }
    Ok(())
}
