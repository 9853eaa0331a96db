//! cmake-wheel configuration CLI
//!
//! Entry point for the `cmake-wheel-config` command-line tool: resolves a
//! project's build configuration and prints it, so users can see exactly
//! what the backend would build with.

use clap::{Parser, Subcommand};
use cmake_wheel_config::{load_component_config, load_config, Config, OverrideFiles};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "cmake-wheel-config")]
#[command(about = "Resolve cmake-wheel build backend configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the full configuration and print it
    Resolve {
        /// Path to pyproject.toml
        #[arg(long, short = 'p', default_value = "pyproject.toml")]
        pyproject: PathBuf,

        /// Additional override file for the backend options
        #[arg(long)]
        local: Vec<PathBuf>,

        /// Additional override file for the cross-compilation options
        #[arg(long)]
        cross: Vec<PathBuf>,

        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,
    },

    /// Validate the configuration and print a summary
    Verify {
        /// Path to pyproject.toml
        #[arg(long, short = 'p', default_value = "pyproject.toml")]
        pyproject: PathBuf,

        /// Additional override file for the backend options
        #[arg(long)]
        local: Vec<PathBuf>,

        /// Additional override file for the cross-compilation options
        #[arg(long)]
        cross: Vec<PathBuf>,
    },

    /// Resolve a component package configuration and print it
    Component {
        /// Path to the component's pyproject.toml
        #[arg(long, short = 'p', default_value = "pyproject.toml")]
        pyproject: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            pyproject,
            local,
            cross,
            human,
        } => run_resolve(&pyproject, local, cross, human),
        Commands::Verify {
            pyproject,
            local,
            cross,
        } => run_verify(&pyproject, local, cross),
        Commands::Component { pyproject } => run_component(&pyproject),
    }
}

fn run_resolve(pyproject: &PathBuf, local: Vec<PathBuf>, cross: Vec<PathBuf>, human: bool) {
    let flags = OverrideFiles { local, cross };
    let config = match load_config(pyproject, &flags) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if human {
        print_summary(&config);
    } else {
        match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    }
}

fn run_verify(pyproject: &PathBuf, local: Vec<PathBuf>, cross: Vec<PathBuf>) {
    let flags = OverrideFiles { local, cross };
    match load_config(pyproject, &flags) {
        Ok(config) => {
            println!("Configuration valid: {}", pyproject.display());
            println!();
            print_summary(&config);
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

fn run_component(pyproject: &PathBuf) {
    match load_component_config(pyproject) {
        Ok(config) => match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

fn print_summary(config: &Config) {
    println!("  Package: {}", config.metadata.name);
    if let Some(ref version) = config.metadata.version {
        println!("  Version: {}", version);
    }
    println!(
        "  Module: {} ({})",
        config.module.name,
        config.module.directory.display()
    );
    if !config.editable.is_empty() {
        let keys: Vec<&str> = config.editable.keys().map(String::as_str).collect();
        println!("  Editable profiles: {}", keys.join(", "));
    }
    if let Some(ref cmake) = config.cmake {
        for (os, settings) in cmake {
            let generator = settings.generator.as_deref().unwrap_or("default generator");
            println!(
                "  CMake [{}]: {} ({})",
                os,
                settings
                    .build_type
                    .as_deref()
                    .unwrap_or("default build type"),
                generator
            );
        }
    }
    if let Some(ref cross) = config.cross {
        if let Some(ref arch) = cross.arch {
            println!("  Cross target: {}", arch);
        }
        if let Some(ref toolchain) = cross.toolchain_file {
            println!("  Toolchain: {}", toolchain.display());
        }
    }
    if config.stubgen.is_some() {
        println!("  Stub generation: enabled");
    }
    println!("  Sources: {}", config.sources.len());
}
