use clap::Parser;
use dirmirror::config::{self, IndexSource, MirrorConfig, MirrorOptions};
use dirmirror::{output, pipeline};
use env_logger::{Builder, Env};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dirmirror")]
#[command(about = "Mirror a directory tree and generate browsable index pages")]
#[command(long_about = "\
Mirror a directory tree and generate browsable index pages

Copies every file under the source directory into the output directory and
writes an index.html into each directory, listing its entries as links.
The output directory is deleted and rebuilt from scratch on every run.

  site/                      dist/
  ├── a.txt                  ├── index.html      (a.txt, sub/)
  ├── .secret                ├── a.txt
  └── sub/           →       └── sub/
      └── b.txt                  ├── index.html  (.., b.txt)
                                 └── b.txt

Never published:
  Names starting with '.'
  This program's own file name, and any --exclude name
  The output directory itself, and any --aux directory

Set RUST_LOG=debug to see every copied file and written page.")]
#[command(version)]
struct Cli {
    /// Source directory to mirror
    #[arg(long, default_value = ".")]
    source: PathBuf,

    /// Output directory, relative to the source directory (deleted on every run)
    #[arg(long, default_value = "dist")]
    output: PathBuf,

    /// Auxiliary directory, relative to the source, never copied or indexed (repeatable)
    #[arg(long = "aux", value_name = "DIR")]
    aux_dirs: Vec<PathBuf>,

    /// Extra entry name excluded at every level (repeatable)
    #[arg(long, value_name = "NAME")]
    exclude: Vec<String>,

    /// TOML file with `exclude`, `aux_dirs` and `index_from` keys
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tree to build index pages from
    #[arg(long, value_enum)]
    index_from: Option<IndexSource>,

    /// Only write index pages, without copying files (implies --index-from source)
    #[arg(long)]
    no_copy: bool,

    /// Print a summary of copied files and written pages
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger() {
    // Silent on success unless RUST_LOG asks for more.
    Builder::from_env(Env::default().default_filter_or("warn")).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let mut options = MirrorOptions {
        source: cli.source,
        output: cli.output,
        program_name: config::current_program_name(),
        copy_files: !cli.no_copy,
        ..MirrorOptions::default()
    };
    if let Some(path) = &cli.config {
        options.apply_file(config::load_config_file(path)?);
    }
    options.exclude.extend(cli.exclude);
    options.aux_dirs.extend(cli.aux_dirs);
    // --no-copy implies the source index unless --index-from says otherwise,
    // whatever the config file asked for.
    match cli.index_from {
        Some(index_from) => options.index_from = index_from,
        None if cli.no_copy => options.index_from = IndexSource::Source,
        None => {}
    }

    let config = MirrorConfig::resolve(options)?;
    let report = pipeline::build(&config)?;

    if cli.verbose {
        output::print_build_output(&report);
    }

    Ok(())
}
