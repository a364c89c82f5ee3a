use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use rovsim::as_graph_generators::CaidaCollector;

fn main() -> ExitCode {
    pretty_env_logger::init();

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("fetching latest CAIDA as-rel2 snapshot...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    match CaidaCollector::new().run() {
        Ok(path) => {
            spinner.finish_and_clear();
            println!("{}", path.display());
            println!("Pass this file to rovsim --relationships.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("fetch-caida: {}", e);
            ExitCode::from(1)
        }
    }
}
