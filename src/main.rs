use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

mod cli;
mod controller;
mod domain;
mod inputter;
mod loader;
mod logging;
mod model;
mod resize;
mod table;
mod terminal;
mod ui;
mod view;

use cli::Args;
use controller::Controller;
use domain::TableError;
use model::{Model, Status};
use terminal::TerminalGuard;
use ui::TableUI;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("Exiting with error: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), TableError> {
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_file);
    logging::init_tracing(&log_file, args.verbose)?;
    info!("Starting datatable with {:?}", args);

    let cfg = args.to_config();
    let (data, columns) = match &args.file {
        Some(path) => loader::load_data_file(path)?,
        None => (loader::users_fixture(), loader::user_columns()),
    };

    let mut guard = TerminalGuard::new()?;
    let size = guard.terminal().size()?;
    let mut model = Model::init(&cfg, data, columns, size.width, size.height);
    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        guard.terminal().draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    info!("Bye!");
    Ok(())
}
