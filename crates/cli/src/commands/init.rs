//! `compass init` - write a default .compass.toml

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = r#"# Compass analysis configuration

# include_test_files = false
# include_vendored_dependencies = false
# max_file_size = 10485760
# max_files = 50000
# parallel_parsing = true
# max_concurrency = 10
# cross_stack_enabled = true
"#;

pub fn run(path: PathBuf) -> Result<i32> {
    let config_path = path.join(".compass.toml");
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("{} {}", "created".green().bold(), config_path.display());
    Ok(0)
}
