//! clustree - build a cluster tree over a directory of images.
//!
//! ```text
//! clustree kmeans  --images ./example-data/images --out ./example-data/kmeans.json
//! clustree linkage --images ./example-data/images --out ./example-data/hamming.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use clustree::{
    validate_tree, EmptyGroupPolicy, FeatureKind, HierarchicalClustering, JpegRenderer, Kmeans,
    Linkage, LinkageMatrix, LinkageTreeBuilder, Metric, PartitionConfig, PartitionalTreeBuilder,
    PcaProjector, Strategy, TreeSerializer,
};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Parser, Debug)]
#[command(name = "clustree")]
#[command(version)]
#[command(about = "Nested cluster trees over image collections", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Recursive k-means tree
    Kmeans {
        #[command(flatten)]
        common: Common,
        /// Groups per split
        #[arg(short, long, default_value_t = 7)]
        k: usize,
        /// Nodes smaller than this are not split
        #[arg(long, default_value_t = 10)]
        split_threshold: usize,
        /// Maximum number of splits along any path
        #[arg(long, default_value_t = 10)]
        max_depth: usize,
        /// k-means seed
        #[arg(long)]
        seed: Option<u64>,
        /// Record 2-D coordinate trails (PCA per node)
        #[arg(long)]
        project: bool,
        /// Fail instead of skipping splits that leave a group empty
        #[arg(long)]
        strict_empty: bool,
    },
    /// Binary tree from agglomerative linkage
    Linkage {
        #[command(flatten)]
        common: Common,
        /// Precomputed linkage matrix (savetxt layout); computed when absent
        #[arg(long)]
        linkage: Option<PathBuf>,
        /// Linkage method
        #[arg(long, value_enum, default_value_t = MethodArg::Complete)]
        method: MethodArg,
        /// Distance metric
        #[arg(long, value_enum, default_value_t = MetricArg::Hamming)]
        metric: MetricArg,
    },
}

#[derive(clap::Args, Debug)]
struct Common {
    /// Directory searched recursively for .jpg/.jpeg/.png files
    #[arg(long)]
    images: PathBuf,
    /// Directory for representative images
    #[arg(long, default_value = "centroids")]
    centroids: PathBuf,
    /// Output document path
    #[arg(long)]
    out: PathBuf,
    /// Feature vector per image
    #[arg(long, value_enum, default_value_t = FeaturesArg::Hash)]
    features: FeaturesArg,
    /// Thumbnail side for pixel features
    #[arg(long, default_value_t = 32)]
    pixel_side: u32,
    /// Resize every image to SIDE x SIDE before blending
    #[arg(long, value_name = "SIDE")]
    resize: Option<u32>,
    /// Write a single-line document
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeaturesArg {
    Hash,
    Pixels,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Single,
    Complete,
    Average,
    Ward,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Euclidean,
    Hamming,
}

impl From<MethodArg> for Linkage {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Single => Linkage::Single,
            MethodArg::Complete => Linkage::Complete,
            MethodArg::Average => Linkage::Average,
            MethodArg::Ward => Linkage::Ward,
        }
    }
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Euclidean => Metric::Euclidean,
            MetricArg::Hamming => Metric::Hamming,
        }
    }
}

/// Images loaded from disk with their identifiers and feature rows.
struct Collection {
    identifiers: Vec<String>,
    images: Vec<RgbImage>,
    features: Vec<Vec<f32>>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Kmeans {
            common,
            k,
            split_threshold,
            max_depth,
            seed,
            project,
            strict_empty,
        } => {
            let data = load_collection(&common)?;
            let config = PartitionConfig::new()
                .with_branching_factor(k)
                .with_split_threshold(split_threshold)
                .with_max_depth(max_depth)
                .with_empty_groups(if strict_empty {
                    EmptyGroupPolicy::Error
                } else {
                    EmptyGroupPolicy::Skip
                });
            let mut kmeans = Kmeans::new();
            if let Some(seed) = seed {
                kmeans = kmeans.with_seed(seed);
            }
            let mut builder = PartitionalTreeBuilder::new(config, kmeans);
            if project {
                builder = builder.with_projector(PcaProjector::new());
            }

            let mut renderer = JpegRenderer::new(common.centroids.clone(), "kmeans-centroid");
            let root = builder
                .build(&mut renderer, &data.features, &data.images, &data.identifiers)
                .context("building k-means tree")?;
            finish(&common, &root, Strategy::Partitional)
        }
        Command::Linkage {
            common,
            linkage,
            method,
            metric,
        } => {
            let data = load_collection(&common)?;
            let z = match linkage {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    LinkageMatrix::parse_text(&text)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => HierarchicalClustering::new()
                    .with_linkage(method.into())
                    .with_metric(metric.into())
                    .fit_linkage(&data.features)
                    .context("computing linkage")?,
            };
            info!(items = z.n_items(), merges = z.n_merges(), "linkage ready");

            let mut renderer = JpegRenderer::new(common.centroids.clone(), "hamming-average");
            let root = LinkageTreeBuilder::new()
                .build(&mut renderer, &z, &data.images, &data.identifiers)
                .context("building linkage tree")?;
            finish(&common, &root, Strategy::Linkage)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "clustree=debug,info"
    } else {
        "clustree=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Sorted image paths under `dir`.
fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if is_image {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_collection(common: &Common) -> Result<Collection> {
    let paths = discover_images(&common.images)?;
    if paths.is_empty() {
        bail!("no images found under {}", common.images.display());
    }
    let kind = match common.features {
        FeaturesArg::Hash => FeatureKind::AverageHash,
        FeaturesArg::Pixels => FeatureKind::Pixels {
            side: common.pixel_side,
        },
    };

    let mut data = Collection {
        identifiers: Vec::with_capacity(paths.len()),
        images: Vec::with_capacity(paths.len()),
        features: Vec::with_capacity(paths.len()),
    };
    for path in paths {
        let mut image = image::open(&path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();
        if let Some(side) = common.resize {
            image = imageops::resize(&image, side, side, FilterType::Triangle);
        }
        data.features.push(kind.extract(&image));
        data.images.push(image);
        data.identifiers.push(path.to_string_lossy().into_owned());
    }
    info!(
        images = data.images.len(),
        dim = kind.dim(),
        dir = %common.images.display(),
        "loaded images"
    );
    Ok(data)
}

fn finish(common: &Common, root: &clustree::ClusterNode, strategy: Strategy) -> Result<()> {
    let report = validate_tree(root, strategy);
    for issue in &report.issues {
        warn!("{issue}");
    }
    if !report.is_healthy() {
        bail!("tree failed validation:\n{report}");
    }
    info!(
        nodes = report.stats.node_count,
        leaves = report.stats.leaf_count,
        depth = report.stats.max_depth,
        "tree validated"
    );

    TreeSerializer::new()
        .compact(common.compact)
        .write_to(root, &common.out)
        .with_context(|| format!("writing {}", common.out.display()))
}
