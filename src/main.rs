use forecast_launch::cli;
use forecast_launch::error::Error;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("Error: {err:#}");

        // A model-run failure mirrors the child's exit code; everything else
        // is a plain error exit.
        let code = match err.downcast_ref::<Error>() {
            Some(Error::ChildFailed(code)) => *code,
            _ => 1,
        };
        std::process::exit(code);
    }
}
