use crate::component::PhotoOrganizer;
use crate::component::photo_organizer::{OrganizeMode, RunOptions};
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_photo_organizer(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
    options: RunOptions,
    mode: OrganizeMode,
) -> Result<()> {
    let organizer = PhotoOrganizer::new(options, Arc::clone(shutdown_signal));

    if let Err(e) = organizer.run_interactive(mode, &mut config.settings) {
        eprintln!("{} {:#}", style(t!("main_menu.error_prefix")).red().bold(), e);
    }

    pause(term)?;
    Ok(())
}
