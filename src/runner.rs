//! The command line front end: argument handling, configuration and the
//! optional startup script.

use crate::EtsError;
use ets_core::EtsConfig;
use ets_lua::Runtime;
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "ETS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(PathBuf),
    Version,
    Help,
}

impl Command {
    /// Parses the arguments after the program name. `--help` and `-h` are
    /// accepted as spellings of `help`.
    pub fn parse<I, S>(args: I, exename: &str) -> Result<Self, EtsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        let Some(first) = args.next() else {
            return Err(EtsError::Usage(format!(
                "Please specify a command or file to run. See {} --help",
                exename
            )));
        };
        Ok(match first.as_ref() {
            "version" | "--version" => Command::Version,
            "help" | "--help" | "-h" => Command::Help,
            file => Command::Run(PathBuf::from(file)),
        })
    }
}

pub fn usage(exename: &str) -> String {
    format!(
        "experimental typesetting system\n\
         run: {exe} somefile.lua\n\n\
         Commands:\n\
         \x20 version   Show version information\n\
         \x20 help      Show usage help\n\n\
         Environment:\n\
         \x20 {env}  path to a JSON configuration file\n\
         \x20 RUST_LOG    log filter (default: info)",
        exe = exename,
        env = CONFIG_ENV,
    )
}

/// Reads the configuration named by `ETS_CONFIG`, or the defaults.
pub fn load_config() -> Result<EtsConfig, EtsError> {
    let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    load_config_from(path.as_deref())
}

pub fn load_config_from(path: Option<&Path>) -> Result<EtsConfig, EtsError> {
    match path {
        Some(path) => {
            log::debug!("Reading configuration from {}", path.display());
            Ok(EtsConfig::from_file(path)?)
        }
        None => Ok(EtsConfig::default()),
    }
}

/// `<exename without extension>.lua` in `dir`, if such a file exists.
pub fn startup_script(dir: &Path, exename: &str) -> Option<PathBuf> {
    let stem = Path::new(exename).file_stem()?;
    let path = dir.join(stem).with_extension("lua");
    path.is_file().then_some(path)
}

/// Runs the startup script (when present) and then `script` in one
/// runtime.
pub fn run(script: &Path, startup: Option<&Path>, config: EtsConfig) -> Result<(), EtsError> {
    let runtime = Runtime::new(config)?;
    if let Some(startup) = startup {
        log::debug!("Running startup script {}", startup.display());
        runtime.exec_file(startup)?;
    }
    runtime.exec_file(script)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_commands() {
        assert_eq!(Command::parse(["version"], "ets").unwrap(), Command::Version);
        assert_eq!(Command::parse(["--help"], "ets").unwrap(), Command::Help);
        assert_eq!(
            Command::parse(["layout.lua"], "ets").unwrap(),
            Command::Run(PathBuf::from("layout.lua"))
        );
        let err = Command::parse(Vec::<String>::new(), "ets").unwrap_err();
        assert!(err.to_string().contains("See ets --help"));
    }

    #[test]
    fn test_finds_startup_script_by_executable_stem() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(startup_script(dir.path(), "ets.exe"), None);
        std::fs::write(dir.path().join("ets.lua"), "").unwrap();
        assert_eq!(startup_script(dir.path(), "ets.exe"), Some(dir.path().join("ets.lua")));
        assert_eq!(startup_script(dir.path(), "ets"), Some(dir.path().join("ets.lua")));
    }

    #[test]
    fn test_usage_names_the_commands() {
        let text = usage("ets");
        assert!(text.contains("run: ets somefile.lua"));
        assert!(text.contains("version"));
        assert!(text.contains(CONFIG_ENV));
    }

    #[test]
    fn test_config_errors_come_from_the_document_layer() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config_from(None).unwrap(), EtsConfig::default());

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"title": "Report"}"#).unwrap();
        assert_eq!(load_config_from(Some(&good)).unwrap().title.as_deref(), Some("Report"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let err = load_config_from(Some(&bad)).unwrap_err();
        assert!(matches!(err, EtsError::Document(ets_core::DocumentError::Json(_))), "{err}");
    }
}
