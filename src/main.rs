use arsh::Interpreter;
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so they never mix with command output;
    // RUST_LOG controls verbosity.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Interpreter::default().repl() {
        eprintln!("arsh: {}", e);
        std::process::exit(1);
    }
}
