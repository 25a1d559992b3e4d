use ets::EtsError;
use ets::runner::{self, Command};
use std::env;
use std::time::Instant;

fn exename() -> String {
    env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "ets".to_string())
}

fn dothings(exename: &str) -> Result<(), EtsError> {
    match Command::parse(env::args().skip(1), exename)? {
        Command::Version => println!("{} version {}", exename, env!("CARGO_PKG_VERSION")),
        Command::Help => println!("{}", runner::usage(exename)),
        Command::Run(script) => {
            let config = runner::load_config()?;
            let cwd = env::current_dir()?;
            let startup = runner::startup_script(&cwd, exename);
            runner::run(&script, startup.as_deref(), config)?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start = Instant::now();
    let exename = exename();
    if let Err(err) = dothings(&exename) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
    log::info!("Finished in {:.2?}", start.elapsed());
}
