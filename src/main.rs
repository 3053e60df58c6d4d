use std::process;

use rustgrep::{app, cli};

fn main() {
    env_logger::init();
    let cfg = cli::parse_args();
    process::exit(app::run(cfg));
}
