use clap::{Parser, Subcommand};
use recipe_press::{config, output, pipeline, scan};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("RECIPE_PRESS_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("RECIPE_PRESS_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "recipe-press")]
#[command(about = "Extract recipe notes into JSON for a static recipe site")]
#[command(long_about = "\
Extract recipe notes into JSON for a static recipe site

Your filesystem is the data source. Every .recipe file becomes a recipe,
its first '# ' heading becomes the title and every #word becomes a tag.
Photo bundles are copied next to the JSON so the site can link to them.

Recipe structure:

  recipes/
  ├── config.toml                  # Build config (optional)
  ├── All Tags.recipe              # Tag sentinel: skipped
  ├── Chicken Soup.recipe          # Recipe → slug chicken-soup
  ├── Chicken Soup.recipepackage/  # Photos for chicken-soup (matched by slug)
  │   └── Photos/bowl.webp
  └── Breakfast/                   # Directories are recursed into
      ├── Shakshuka.recipe
      └── IMG_2041.recipepackage/  # Only bundle here → Shakshuka's photos
          └── Photos/pan.jpg

Output:

  public/
  ├── recipes.json                 # [{ title, slug, tags, content, packageFolder? }]
  ├── tags.json                    # Sorted unique tags
  ├── build-info.json              # Version, time, counts
  └── recipes/                     # Staged bundles

Run 'recipe-press gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Recipe root directory
    #[arg(long, default_value = "recipes", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "public", global = true)]
    output: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan, stage bundles and write recipes.json and tags.json
    Build,
    /// Print the recipe inventory without writing anything
    Scan,
    /// Validate the recipe tree and report missing photos
    Check {
        /// Fail on missing photos and orphan bundles too
        #[arg(long)]
        strict: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            let config = config::load_config(&cli.source)?;
            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let version = env!("CARGO_PKG_VERSION");
            let report = pipeline::build(&cli.source, &cli.output, &config, version)?;
            output::print_build_output(&report, &cli.output, &config);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Scan => {
            let config = config::load_config(&cli.source)?;
            let options = pipeline::scan_options(&cli.source, &cli.output);
            let catalog = scan::scan_with(&cli.source, &config, &options)?;
            output::print_scan_output(&catalog, &cli.source);
        }
        Command::Check { strict } => {
            let config = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let report = pipeline::check(&cli.source, &cli.output, &config)?;
            output::print_check_output(&report, &cli.source, &config);
            if strict && !report.is_clean() {
                return Err("check failed: missing photos or orphan bundles".into());
            }
            println!("==> Recipes are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` flags pick the level.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
