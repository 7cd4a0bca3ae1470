/// Headless session replay for native builds.
///
/// Usage: `coralseg <script.json> [--config <config.json>] [--write-config <path>]`
///
/// Prints the resulting editor state, including the COCO annotations, as JSON.
/// `--write-config` saves the effective settings (defaults merged with the
/// loaded file) so they can be edited.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use coralseg::AppConfig;
    use coralseg::constants::LOG_ENV_VAR;
    use coralseg::script::Script;

    let mut script_path = None;
    let mut config_path = None;
    let mut write_config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next(),
            "--write-config" => write_config = args.next(),
            _ => script_path = Some(arg),
        }
    }

    let config = match config_path {
        Some(path) => match AppConfig::load_from_path(std::path::Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level)
        .parse_env(LOG_ENV_VAR)
        .init();

    if let Some(path) = &write_config {
        if let Err(e) = config.save_to_path(std::path::Path::new(path)) {
            eprintln!("Failed to write config {}: {}", path, e);
            std::process::exit(1);
        }
    }

    let Some(script_path) = script_path else {
        if write_config.is_some() {
            return;
        }
        eprintln!(
            "Usage: coralseg <script.json> [--config <config.json>] [--write-config <path>]"
        );
        std::process::exit(2);
    };

    let report = Script::load(std::path::Path::new(&script_path))
        .and_then(|script| script.replay(&config))
        .and_then(|report| Ok(serde_json::to_string_pretty(&report)?));

    match report {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Replay error: {}", e);
            std::process::exit(1);
        }
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
