use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use nistdb19::{
    AlwaysConfirm, Checksum, Confirm, DataType, Dataset, NistDb19Dataset, SourceInfo,
    TerminalPrompt,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding by_class.zip and the extracted by_class folder
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Class block to load: digits, cap_letters or low_letters
    #[arg(short, long, required_unless_present = "load")]
    data_type: Option<DataType>,

    /// Read the test partition instead of the training partitions
    #[arg(long)]
    test: bool,

    /// Download the archive if it is missing
    #[arg(long)]
    download: bool,

    /// Sample limit
    #[arg(short, long, default_value_t = 1000)]
    size_limit: usize,

    /// Split the size limit evenly across classes instead of applying it to each class
    #[arg(long)]
    split_limit: bool,

    /// Delete and re-download a corrupted archive without asking
    #[arg(short, long)]
    yes: bool,

    /// Mirror URL for the archive (requires --md5 or --sha256)
    #[arg(long)]
    url: Option<String>,

    /// Expected MD5 of the mirrored archive
    #[arg(long, conflicts_with = "sha256")]
    md5: Option<String>,

    /// Expected SHA-256 of the mirrored archive
    #[arg(long)]
    sha256: Option<String>,

    /// Write the loaded dataset to this snapshot file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Overwrite an existing snapshot file
    #[arg(long, requires = "save")]
    force: bool,

    /// Restore a snapshot instead of scanning the source tree
    #[arg(long, conflicts_with_all = ["data_type", "save"])]
    load: Option<PathBuf>,
}

fn source_from_args(args: &Args) -> anyhow::Result<SourceInfo> {
    let mut source = SourceInfo::nist();
    if let Some(url) = &args.url {
        source.url = url.clone();
        source.checksum = match (&args.md5, &args.sha256) {
            (Some(md5), None) => Checksum::Md5(md5.clone()),
            (None, Some(sha256)) => Checksum::Sha256(sha256.clone()),
            _ => bail!("--url requires exactly one of --md5 or --sha256"),
        };
    }
    Ok(source)
}

fn build_dataset(args: &Args) -> anyhow::Result<NistDb19Dataset> {
    let data_type = args.data_type.context("--data-type is required")?;
    let confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(TerminalPrompt)
    };

    let mut builder = NistDb19Dataset::builder()
        .with_data_type(data_type)
        .train(!args.test)
        .download(args.download)
        .size_limit(args.size_limit)
        .size_limit_per_class(!args.split_limit)
        .with_source(source_from_args(args)?)
        .with_confirm(confirm);
    if let Some(root) = &args.root {
        builder = builder.with_root_dir(root);
    }

    Ok(builder.build()?)
}

fn print_summary(dataset: &NistDb19Dataset) {
    println!("\nDataset: {} ({})", dataset.data_type(), if dataset.is_train() { "train" } else { "test" });
    println!("  Samples: {}", dataset.len());
    println!("  Per-class cap: {}", dataset.per_class_cap());
    println!("  Samples per class:");
    for (label, count) in dataset.class_counts() {
        println!("    {}: {}", label, count);
    }
    if let Some(first) = dataset.images().first() {
        let (height, width, channels) = first.dim();
        println!("  Image shape: {}x{}x{}", height, width, channels);
    }
}

fn main() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let start_time = Instant::now();
    let dataset = match &args.load {
        Some(path) => {
            info!("Restoring snapshot {:?}", path);
            nistdb19::load_from_file(path)?
        }
        None => build_dataset(&args)?,
    };
    info!("Dataset ready (took {:.2?})", start_time.elapsed());

    print_summary(&dataset);

    if let Some(path) = &args.save {
        if nistdb19::save_to_file(&dataset, path, args.force)? {
            println!("\nSaved snapshot to {}", path.display());
        }
    }

    Ok(())
}
