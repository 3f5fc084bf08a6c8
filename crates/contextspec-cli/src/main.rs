use contextspec_cli::{run, Environment};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut env = Environment::process();
    if let Err(err) = run(std::env::args_os(), &mut env) {
        eprintln!("contextspec: {err}");
        std::process::exit(1);
    }
}
