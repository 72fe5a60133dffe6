//! Block Composer CLI
//!
//! Usage:
//!   block-composer [OPTIONS] --template <ID> <MANIFEST>
//!
//! Options:
//!   -t, --template <ID>      Template to render (most-derived template of the chain)
//!   -d, --data <FILE>        Page data file (TOML format)
//!   -k, --hook <NAME=MARKUP> Static markup for a hook, may be repeated
//!   --chain                  Print the resolved override chain instead of rendering
//!   --strict-hooks           Fail on hooks without markup
//!   --max-depth <N>          Maximum block nesting
//!   -h, --help               Print help

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use block_composer::data::{load_page_data, EmptyData, PageData};
use block_composer::loader::Manifest;
use block_composer::template::{build_chain, template_chain, OverrideChain};
use block_composer::{Engine, HookRegistry, RenderConfig};

#[derive(Parser)]
#[command(name = "block-composer")]
#[command(about = "Render block-inheritance templates from a pre-lexed manifest")]
struct Cli {
    /// Template manifest (TOML format)
    manifest: PathBuf,

    /// Template to render
    #[arg(short, long)]
    template: String,

    /// Page data file (TOML format)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Static hook markup as NAME=MARKUP
    #[arg(short = 'k', long = "hook", value_parser = parse_hook)]
    hooks: Vec<(String, String)>,

    /// Print the resolved override chain instead of rendering
    #[arg(long)]
    chain: bool,

    /// Fail on hooks without markup
    #[arg(long)]
    strict_hooks: bool,

    /// Maximum block nesting
    #[arg(long, default_value_t = RenderConfig::default().max_depth)]
    max_depth: usize,
}

fn parse_hook(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, markup)| (name.to_string(), markup.to_string()))
        .ok_or_else(|| format!("expected NAME=MARKUP, got '{}'", raw))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,block_composer=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.manifest) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading manifest '{}': {}", cli.manifest.display(), e);
            process::exit(1);
        }
    };

    let filename = cli.manifest.display().to_string();
    let registry = match Manifest::from_str(&source).and_then(Manifest::into_registry) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("{}", e.format(&source, &filename));
            process::exit(1);
        }
    };
    info!(templates = registry.len(), "loaded manifest");

    if cli.chain {
        let chain = template_chain(&registry, &cli.template)
            .and_then(|templates| build_chain(&registry, &templates));
        match chain {
            Ok(chain) => print_chain(&chain),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let data: Box<dyn PageData> = match &cli.data {
        Some(path) => match load_page_data(path) {
            Ok(table) => Box::new(table),
            Err(e) => {
                eprintln!("Error loading page data '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Box::new(EmptyData),
    };

    let mut hooks = HookRegistry::new();
    for (name, markup) in &cli.hooks {
        hooks.on_static(name.clone(), markup.clone());
    }

    let config = RenderConfig::new()
        .with_max_depth(cli.max_depth)
        .with_strict_hooks(cli.strict_hooks);
    let engine = Engine::new(registry).with_hooks(hooks).with_config(config);

    match engine.render(&cli.template, data.as_ref()) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            debug!(template = %cli.template, "render failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn print_chain(chain: &OverrideChain) {
    println!("chain: {}", chain.templates());
    for slot in chain.slots() {
        println!("  {}: {}", slot, chain.owners_at(slot).join(" -> "));
    }
    for skip in chain.skipped() {
        println!(
            "  skipped: '{}' from {} (enclosing '{}' is replaced)",
            skip.name, skip.owner, skip.enclosing
        );
    }
}
