use clap::{Parser, Subcommand};
use folio::collections::Collections;
use folio::config::{self, BuildMode};
use folio::generate::{self, Renderer};
use folio::{output, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Static site builder for a writings/works/vignettes portfolio")]
#[command(long_about = "\
Static site builder for a writings/works/vignettes portfolio

Content is markdown, HTML, or Tera (.njk, .tera) files with YAML front
matter. Pages are rendered through layouts and written to the output
directory; passthrough files are copied unchanged.

Project structure:

  .
  ├── config.toml                  # Build policy (optional, merged over defaults)
  ├── index.html                   # Passthrough: copied as-is
  ├── assets/                      # Passthrough: copied as-is
  ├── _includes/                   # Partials for {% include %}
  │   ├── layouts/                 # Page layouts (may chain via `layout:`)
  │   └── styles/                  # Passthrough: copied as-is
  ├── _data/                       # Global data: *.json, *.yaml
  ├── writings/                    # Writings collection (newest first)
  │   ├── index.njk                # Listing page
  │   └── first-light.md
  ├── works/                       # Works collection (featured, then year)
  ├── docs/, components/           # Ignored
  └── vignettes/                   # Vignettes collection (newest first)

Production mode (--production or FOLIO_ENV=production) hides works marked
`draft: true`.

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Build in production mode (also set by FOLIO_ENV=production)
    #[arg(long, global = true)]
    production: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List discovered documents, collections, and passthrough files
    Scan,
    /// Render and write the full site
    Build,
    /// Render everything without writing output
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let mode = resolve_mode(cli.production);
    let root = &cli.config;

    match cli.command {
        Command::Scan => {
            let site_config = config::load_config(root)?;
            let manifest = scan::scan(root, &site_config)?;
            let collections =
                Collections::build(&manifest.documents, &site_config.collections, mode)?;
            output::print_scan_output(&manifest, &collections);
        }
        Command::Build => {
            let site_config = config::load_config(root)?;
            let input = root.join(&site_config.dirs.input);
            let output_dir = root.join(&site_config.dirs.output);

            println!("==> Stage 1: Scanning {} ({})", input.display(), mode.as_str());
            let manifest = scan::scan(root, &site_config)?;
            let collections =
                Collections::build(&manifest.documents, &site_config.collections, mode)?;
            output::print_scan_output(&manifest, &collections);

            println!("==> Stage 2: Rendering {} documents", manifest.documents.len());
            let renderer = Renderer::new(root, &site_config, &manifest.documents, mode)?;
            let pages = renderer.render_site(&manifest, &collections)?;

            println!("==> Stage 3: Writing → {}", output_dir.display());
            let report = generate::write_site(&input, &output_dir, &pages, &manifest.passthrough)?;
            output::print_build_output(&report);

            println!("==> Build complete: {}", output_dir.display());
        }
        Command::Check => {
            let site_config = config::load_config(root)?;
            println!("==> Checking {}", root.display());
            let manifest = scan::scan(root, &site_config)?;
            let collections =
                Collections::build(&manifest.documents, &site_config.collections, mode)?;
            let renderer = Renderer::new(root, &site_config, &manifest.documents, mode)?;
            let pages = renderer.render_site(&manifest, &collections)?;
            println!("==> {} pages render cleanly", pages.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// The CLI flag wins; otherwise the environment decides.
fn resolve_mode(flag: bool) -> BuildMode {
    if flag {
        return BuildMode::Production;
    }
    let env = std::env::var(BuildMode::ENV_VAR).ok();
    let mode = BuildMode::from_env_value(env.as_deref());
    log::debug!("build mode: {}", mode.as_str());
    mode
}
