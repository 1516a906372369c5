// src/main.rs

use buildgraph::{cli, logging, run};

/// Exit code for configuration and other runner errors.
const ERROR_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("buildgraph error: {err:?}");
            std::process::exit(ERROR_EXIT_CODE);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
