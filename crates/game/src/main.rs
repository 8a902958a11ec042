use std::process::ExitCode;

use tracing::error;

mod app;

use app::{bootstrap, loop_runner};

fn main() -> ExitCode {
    bootstrap::init_tracing();

    match bootstrap::build_app(std::env::args().skip(1).collect()) {
        Ok(Some(app)) => loop_runner::run(app),
        Ok(None) => {
            println!("{}", bootstrap::USAGE);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
