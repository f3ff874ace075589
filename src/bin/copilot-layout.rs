use copilot_common::{CopilotConfig, CopilotError, Normalized, SkipReason, UnrecognizedNode};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let (config_path, files) = match split_args(args.get(1..).unwrap_or_default()) {
        Some(parts) => parts,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    let config = match config_path.map(load_config).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("✗ failed to load config:");
            eprintln!("  {}", e);
            process::exit(1);
        }
    };

    let mut exit_code = 0;

    for file_path in files {
        match layout_file(&config, &file_path) {
            Ok(normalized) => {
                print_warnings(&file_path, &normalized.warnings);
                match serde_json::to_string_pretty(&normalized.tree) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("✗ {}: {}", file_path, e);
                        exit_code = 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                eprintln!("  {}", e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn print_usage() {
    eprintln!("Usage: copilot-layout [--config <config.yaml|config.json>] <file>...");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  copilot-layout reply.html");
    eprintln!("  copilot-layout --config copilot.yaml reply.json");
}

/// `--config <path>` may appear anywhere; everything else is a file.
fn split_args(args: &[String]) -> Option<(Option<String>, Vec<String>)> {
    let mut config = None;
    let mut files = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config = Some(iter.next()?.clone());
        } else {
            files.push(arg.clone());
        }
    }
    if files.is_empty() {
        None
    } else {
        Some((config, files))
    }
}

fn load_config(path: String) -> Result<CopilotConfig, CopilotError> {
    let content = fs::read_to_string(&path)?;
    match Path::new(&path).extension().and_then(|e| e.to_str()) {
        Some("json") => CopilotConfig::from_json_str(&content),
        _ => CopilotConfig::from_yaml_str(&content),
    }
}

fn layout_file(config: &CopilotConfig, path: &str) -> Result<Normalized, CopilotError> {
    let content = fs::read_to_string(path)?;
    let normalizer = config.normalizer();

    // JSON trees start with an object or array; anything else is treated as HTML.
    let trimmed = content.trim_start();
    let tree: Value = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        copilot_common::parse_html(&content)
    };

    log::debug!("normalizing {}", path);
    Ok(normalizer.normalize(&tree))
}

fn print_warnings(path: &str, warnings: &[UnrecognizedNode]) {
    for warning in warnings {
        let what = match warning.reason {
            SkipReason::UnknownShape => "unrecognized node",
            SkipReason::TooDeep => "nesting too deep",
        };
        eprintln!(
            "warning: {}: {} at {}: {}",
            path,
            what,
            if warning.path.is_empty() { "/" } else { warning.path.as_str() },
            warning.node
        );
    }
}
