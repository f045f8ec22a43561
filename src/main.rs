use std::io::Write;

fn main() {
    // stdout carries the UCI protocol only; logs go to stderr.
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );
    builder
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .write_style(env_logger::WriteStyle::Never)
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(err) = plum_search::uci::uci_top::run_stdio_loop() {
        log::error!("fatal error: {err}");
        std::process::exit(1);
    }
}
