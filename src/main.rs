//! Babele command line

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use babele::env::{self as babele_env, EnvVar};
use babele::translation::config::ConfigManager;
use babele::translation::core::{Babele, CompendiumHost, MemoryHost};
use babele::translation::model::{ExportFormat, Provider};

#[derive(Parser)]
#[command(name = "babele", version, about = "Compendium translation overlay")]
struct Cli {
    /// Configuration file (defaults to the standard search paths)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate the documents of one or more pack files
    Translate {
        /// Pack file `{ metadata, documents, folders }`; may be repeated
        #[arg(short, long, required = true)]
        pack: Vec<PathBuf>,
        /// Directory holding translation files
        #[arg(short, long)]
        translations: PathBuf,
        /// Active language (overrides configuration)
        #[arg(short, long)]
        lang: Option<String>,
        /// Do not read or write the translation cache
        #[arg(long)]
        no_cache: bool,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a translation skeleton for a pack file
    Export {
        #[arg(short, long)]
        pack: PathBuf,
        /// `object` or `legacy` (overrides configuration)
        #[arg(short, long)]
        format: Option<ExportFormat>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete every cached provider translation
    ClearCache,
    /// Write a configuration file holding the defaults
    InitConfig {
        #[arg(default_value = "babele.toml")]
        path: PathBuf,
    },
    /// List the environment variables
    EnvDocs,
}

fn init_tracing() {
    let level = babele_env::core::LogLevel::get().unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(format!("babele={}", level)).unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = !babele_env::core::NoColor::get_or_default(false);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .init();
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            tracing::info!("wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::EnvDocs => {
            print!("{}", babele_env::generate_env_docs());
            return Ok(());
        }
        Command::InitConfig { path } => {
            ConfigManager::generate_example_config(&path)?;
            println!("wrote {}", path.display());
            return Ok(());
        }
        _ => {}
    }

    let mut config = ConfigManager::load(cli.config.as_deref())?.into_config();

    match cli.command {
        Command::Translate {
            pack,
            translations,
            lang,
            no_cache,
            output,
        } => {
            if let Some(lang) = lang {
                config.lang = lang;
            }
            if no_cache {
                config.cache_enabled = false;
            }
            config.data_dir = translations.display().to_string();
            config.directory = Some(".".to_string());
            config.remote_base_url = None;

            let mut host = MemoryHost::new();
            let mut collections = Vec::new();
            for path in &pack {
                collections.push(host.load_pack_file(path)?);
            }

            let mut babele = Babele::new(config)?;
            // Provider files laid out as `modules/<id>/<dir>` under the same root
            for (id, lang) in discover_providers(&translations, &babele.config().lang) {
                babele.register(Provider::new(&id, &lang).with_directory(&lang));
            }

            if !babele.init(&mut host).await {
                eprintln!("no translation found for language '{}'", babele.config().lang);
            }

            let mut result = Map::new();
            for collection in collections {
                let documents = host
                    .documents(&collection)?
                    .iter()
                    .map(|document| babele.translate_document(&host, &collection, document))
                    .collect();
                result.insert(collection, Value::Array(documents));
            }

            let content = serde_json::to_string_pretty(&Value::Object(result))?;
            write_output(output.as_deref(), &format!("{}\n", content))?;
        }
        Command::Export { pack, format, output } => {
            config.cache_enabled = false;
            let format = format.unwrap_or(config.export_format);

            let mut host = MemoryHost::new();
            let collection = host.load_pack_file(&pack)?;
            let babele = Babele::new(config)?;

            let content = babele.export_translations_file(&host, &collection, format)?;
            write_output(output.as_deref(), &content)?;
        }
        Command::ClearCache => {
            config.cache_enabled = true;
            let babele = Babele::new(config)?;
            let removed = babele.clear_cache()?;
            println!("removed {} cached providers", removed);
        }
        Command::EnvDocs | Command::InitConfig { .. } => {}
    }

    Ok(())
}

/// Providers found as `modules/<id>/<lang>` directories
fn discover_providers(root: &Path, lang: &str) -> Vec<(String, String)> {
    let Ok(entries) = fs::read_dir(root.join("modules")) else {
        return Vec::new();
    };

    let mut providers: Vec<(String, String)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().join(lang).is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(|id| (id.to_string(), lang.to_string())))
        .collect();
    providers.sort();
    providers
}
