mod args;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Decrypt, Encrypt, Export, Init, Keygen, Version};
use state::AppState;

command_enum! {
    (Init, Init),
    (Keygen, Keygen),
    (Export, Export),
    (Encrypt, Encrypt),
    (Decrypt, Decrypt),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging settings come from the state directory when there is one
    let config = AppState::load(args.config_path.clone())
        .map(|state| state.config)
        .unwrap_or_default();
    let log_level = config.log_level().unwrap_or(tracing::Level::INFO);
    let guards = logging::init_logging(log_level, config.log_dir.as_deref());

    let ctx = op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    drop(guards);
    std::process::exit(code);
}
