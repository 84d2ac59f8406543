use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asngen_core::loader::parse_specification;
use asngen_core::{CompilationArtifact, EncodingRule, compile, compile_file};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_NAMESPACE: &str = "asn1";

/// Generate C encoders and decoders from a compiled ASN.1 type tree.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Type tree JSON file or directory (reads stdin when omitted)"
    )]
    input: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    codec: Codec,

    #[arg(
        short,
        long,
        help = "Prefix of generated C identifiers and file names (defaults to the input file stem)"
    )]
    namespace: Option<String>,

    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Codec {
    Oer,
    Uper,
}

impl From<Codec> for EncodingRule {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::Oer => EncodingRule::Oer,
            Codec::Uper => EncodingRule::Uper,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let rule = EncodingRule::from(cli.codec);
    let namespace = cli
        .namespace
        .clone()
        .or_else(|| cli.input.as_deref().and_then(file_stem))
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    let artifact = match &cli.input {
        Some(path) => compile_file(path, &namespace, rule)
            .with_context(|| format!("failed to generate code from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read type tree from stdin")?;
            let spec = parse_specification(&buffer)?;
            compile(&spec, &namespace, rule)?
        }
    };

    write_artifact(&cli.output_dir, &namespace, &artifact)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn write_artifact(dir: &Path, namespace: &str, artifact: &CompilationArtifact) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {dir:?}"))?;
    write_output(&dir.join(format!("{namespace}.h")), &artifact.header)?;
    write_output(&dir.join(format!("{namespace}.c")), &artifact.source)?;
    info!(namespace, dir = %dir.display(), "wrote generated sources");
    Ok(())
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write output file {}", path.display()))
}
