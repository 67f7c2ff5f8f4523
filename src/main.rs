use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dep_lookup::config::{self, LookupConfig};
use dep_lookup::logging::{self, LogOptions};
use dep_lookup::lookup::registries::NpmRegistry;
use dep_lookup::lookup::{DependencyResolver, MetadataCache, PackageQuery};
use dep_lookup::output::render_tree;

#[derive(Parser)]
#[command(name = "dep-lookup")]
#[command(version, about = "Print the resolved dependency tree of an npm package")]
struct Cli {
    /// Package to look up, e.g. `react` or `express@1.0.0`
    package: PackageQuery,

    /// JSON config file (`registryUrl`, `maxDepth`, `timeoutMs`, `cache.expiry`)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    registry_url: Option<String>,

    /// Dependencies this many levels below the root are not expanded
    #[arg(long)]
    max_depth: Option<usize>,

    /// Stop expanding the tree after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the tree as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    log_stderr: bool,

    /// Write log lines as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn lookup_config(&self) -> anyhow::Result<LookupConfig> {
        let mut config = match &self.config {
            Some(path) => LookupConfig::load(path)?,
            None => LookupConfig::default(),
        };

        if let Some(registry_url) = &self.registry_url {
            config.registry_url = registry_url.clone();
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(
        LogOptions {
            verbose: cli.verbose,
            stderr: cli.log_stderr,
            json: cli.log_json,
        },
        &config::log_path(),
    )?;

    let config = cli.lookup_config()?;
    let resolver = DependencyResolver::new(
        Arc::new(NpmRegistry::new(&config.registry_url)),
        Arc::new(MetadataCache::new(config.cache.expiry)),
        config.resolve_options(),
    );

    let root = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(resolver.resolve(&cli.package.name, cli.package.range.as_deref()));

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        print!("{}", render_tree(&root));
    }

    Ok(())
}
