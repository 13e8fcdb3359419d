use std::process::ExitCode;

use blemish::cli::CliArgs;
use blemish::session::RetouchSession;
use blemish::settings::AppSettings;
use blemish::{app, log_err, log_info, logger};
use clap::Parser;

fn main() -> ExitCode {
    // -h and bad flags are handled here: clap prints usage and exits.
    let args = CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init(args.verbose);

    // Defaults < settings file < command line
    let mut settings = AppSettings::load_or_init();
    args.apply_overrides(&mut settings);

    let (input, output) = args.resolve_paths();
    let session = match RetouchSession::load(&input, output, &settings) {
        Ok(session) => {
            println!("\nSuccessfully read image '{}'", input.display());
            session
        }
        Err(e) => {
            println!("\n{}", e);
            log_err!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if session.scale().is_downscaled() {
        println!("Image scaled for display at {:.3}x", session.scale().value());
    }
    println!(
        "\nInstructions: Click on the blemish you want to remove. \
         Then click on the area to clone from."
    );
    for line in settings.keybindings.help_lines() {
        println!("{}", line);
    }
    println!("Or move the brush size slider.");

    match app::run(session, settings.keybindings) {
        Ok(()) => {
            log_info!("Session closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            log_err!("{}", e);
            ExitCode::FAILURE
        }
    }
}
