use anyhow::Result;
use clap::Parser;
use console::{Term, style};
use log::{info, warn};
use photo_organize::cli::Cli;
use photo_organize::component::PhotoOrganizer;
use photo_organize::component::photo_organizer::RunOptions;
use photo_organize::config::Config;
use photo_organize::init;
use photo_organize::menu::show_main_menu;
use photo_organize::signal::setup_shutdown_signal;
use rust_i18n::t;

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en-US");

fn main() -> Result<()> {
    init::init();
    let cli = Cli::parse();
    let shutdown_signal = setup_shutdown_signal()?;

    // Load config and set locale
    let mut config = Config::new();
    rust_i18n::set_locale(config.settings.language.as_str());

    if let Some(request) = cli.request() {
        let options = cli.apply_to(RunOptions::from_settings(&config.settings));
        let organizer = PhotoOrganizer::new(options, shutdown_signal);
        organizer.execute(&request)?;
        return Ok(());
    }

    let term = Term::stdout();
    loop {
        let options = cli.apply_to(RunOptions::from_settings(&config.settings));
        match show_main_menu(&term, &shutdown_signal, &mut config, options) {
            Ok(true) => {}
            Ok(false) => {
                println!("\n{}", style(t!("main_menu.goodbye")).green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style(t!("main_menu.error_prefix")).red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
