//! Ferry CLI - A guided Go to Rust migration tracker.

use clap::Parser;
use ferry::cli::{Cli, Commands, ConfigCommands, ReqCommands};
use ferry::commands::{self, Output, Workflow};
use ferry::config::{ConfigOverrides, ConfigPaths, OutputFormat, ResolvedConfig, resolve_config};
use ferry::libraries::LibraryIndex;
use ferry::models::Prompt;
use ferry::storage::Storage;
use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "FERRY_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Until config is resolved only the flag can ask for JSON.
    let mut human = !cli.json;

    let repo_path = resolve_repo_path(cli.repo_path.clone(), human);
    let storage = Storage::new(&repo_path);

    let mut overrides = ConfigOverrides::new();
    if cli.json {
        overrides = overrides.with_output_format(OutputFormat::Json);
    }
    if let Some(ref path) = cli.prompt {
        overrides = overrides.with_prompt(path);
    }
    if let Some(ref path) = cli.library_data {
        overrides = overrides.with_library_data(path);
    }
    if let Some(lang) = cli.command.target_language() {
        overrides = overrides.with_target_language(lang);
    }
    if cli.command.include_unsafe() {
        overrides = overrides.with_include_unsafe(true);
    }

    let result = resolve_config(&ConfigPaths::for_storage(&storage), &repo_path, &overrides)
        .and_then(|resolved| {
            human = resolved.output_format() == OutputFormat::Human;
            run_command(cli.command, &storage, &resolved, human)
        });

    if let Err(e) = result {
        fail(&e.to_string(), human);
    }
}

/// Log to stderr so stdout stays parseable.
///
/// `FERRY_LOG` wins over `--verbose`; the default only shows warnings.
fn init_logging(verbose: bool) {
    let filter = match env::var(LOG_ENV) {
        Ok(directive) if !directive.is_empty() => EnvFilter::new(directive),
        _ if verbose => EnvFilter::new("debug"),
        _ => EnvFilter::new("warn"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

fn fail(message: &str, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", message);
    } else {
        eprintln!("{}", serde_json::json!({ "error": message }));
    }
    process::exit(1);
}

/// Resolve the project root: --repo flag > FERRY_REPO env var > current directory.
///
/// An explicit path must exist. Relative paths are made absolute before
/// they reach storage.
fn resolve_repo_path(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    let path = match explicit_path {
        Some(path) => {
            if !path.is_dir() {
                fail(
                    &format!("Specified repo path does not exist: {}", path.display()),
                    human,
                );
            }
            path
        }
        None => match env::current_dir() {
            Ok(cwd) => return cwd,
            Err(source) => fail(
                &ferry::Error::Storage {
                    path: PathBuf::from("."),
                    source,
                }
                .to_string(),
                human,
            ),
        },
    };

    match std::path::absolute(&path) {
        Ok(abs) => abs,
        Err(source) => fail(&ferry::Error::Storage { path, source }.to_string(), human),
    }
}

fn load_prompt(config: &ResolvedConfig) -> Result<Prompt, ferry::Error> {
    match config.prompt() {
        Some(path) => Prompt::parse_file(path),
        None => Prompt::migration(),
    }
}

fn load_index(config: &ResolvedConfig) -> Result<LibraryIndex, ferry::Error> {
    let index = match config.library_data() {
        Some(path) => LibraryIndex::from_file(path)?,
        None => LibraryIndex::embedded()?,
    };
    tracing::debug!(
        libraries = index.library_count(),
        mappings = index.mapping_count(),
        unsafe_libraries = index.unsafe_count(),
        "loaded library index"
    );
    Ok(index)
}

fn run_command(
    command: Commands,
    storage: &Storage,
    config: &ResolvedConfig,
    human: bool,
) -> Result<(), ferry::Error> {
    match command {
        Commands::Migrate {
            step,
            start,
            finish,
            note,
            status,
            reset,
            bootstrap,
        } => {
            let prompt = load_prompt(config)?;
            let workflow = Workflow::new(storage, &prompt);

            if reset {
                output(&workflow.reset()?, human);
            } else if bootstrap {
                output(&workflow.bootstrap(), human);
            } else if status {
                output(&workflow.status()?, human);
            } else if let Some(id) = start {
                output(&workflow.start(&id)?, human);
            } else if let Some(id) = finish {
                output(&workflow.finish(&id, note.as_deref().unwrap_or(""))?, human);
            } else {
                output(&workflow.show(step.as_deref())?, human);
            }
        }

        Commands::Req { command } => match command {
            ReqCommands::Set { path, content } => {
                let content = match content {
                    Some(content) => content,
                    None => read_stdin()?,
                };
                output(&commands::req_set(storage, &path, &content)?, human);
            }
            ReqCommands::Get { path } => output(&commands::req_get(storage, &path)?, human),
            ReqCommands::List { filter } => output(&commands::req_list(storage, &filter)?, human),
            ReqCommands::Done { path } => output(&commands::req_done(storage, &path)?, human),
            ReqCommands::Delete { path } => {
                output(&commands::req_delete(storage, &path)?, human)
            }
        },

        Commands::Lookup { url, .. } => {
            let index = load_index(config)?;
            let result = commands::lookup(
                &index,
                &url,
                config.target_language(),
                config.include_unsafe(),
            )?;
            output(&result, human);
        }

        Commands::Scan { go_mod, .. } => {
            let index = load_index(config)?;
            let result = commands::scan(
                &index,
                &go_mod,
                config.target_language(),
                config.include_unsafe(),
            )?;
            output(&result, human);
        }

        Commands::Convert {
            go_mod,
            output: out,
            ..
        } => {
            let index = load_index(config)?;
            let cwd = env::current_dir()?;
            let result = commands::convert(
                &index,
                &go_mod,
                out.as_deref(),
                &cwd,
                config.include_unsafe(),
            )?;
            output(&result, human);
        }

        Commands::Analyze { go_mod } => {
            let index = load_index(config)?;
            output(&commands::analyze(&index, &go_mod)?, human);
        }

        Commands::Verify { manifest } => {
            let index = load_index(config)?;
            output(&commands::verify(storage, &index, manifest.as_deref())?, human);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(config), human),
            ConfigCommands::Set { key, value } => {
                output(&commands::config_set(storage, &key, &value)?, human)
            }
        },
    }
    Ok(())
}

/// Requirement content piped on stdin, trimmed.
fn read_stdin() -> Result<String, ferry::Error> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
