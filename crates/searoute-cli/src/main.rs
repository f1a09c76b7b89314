//! Command-line frontend for building, inspecting, and querying sea-route
//! graphs.

#![deny(warnings)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use searoute_lib::{
    apply_passages, builtin_passages, connect_antimeridian_default, ensure_augmented, load_graph,
    passages_from_json, plan_route, save_graph, BuildParameters, Coordinate, GridBuilder, Port,
    RouteQuery, SearchAlgorithm, WaterGeometry,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sea-route graph utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the routing graph from water geometry and persist it.
    Build {
        /// GeoJSON file with ocean polygons.
        #[arg(long)]
        ocean: PathBuf,
        /// Optional GeoJSON file with shipping-lane lines.
        #[arg(long)]
        lanes: Option<PathBuf>,
        /// Optional JSON file with ports to anchor into the graph.
        #[arg(long)]
        ports: Option<PathBuf>,
        /// Optional JSON file with passage definitions; defaults to the
        /// built-in passage table.
        #[arg(long)]
        passages: Option<PathBuf>,
        /// Skip passage augmentation entirely.
        #[arg(long)]
        no_passages: bool,
        /// Skip the antimeridian connection pass.
        #[arg(long)]
        no_antimeridian: bool,
        /// Lattice spacing in degrees.
        #[arg(long, default_value_t = 1.0)]
        spacing: f64,
        /// Chunk size in degrees.
        #[arg(long, default_value_t = 20.0)]
        chunk_size: f64,
        /// Directory for chunk checkpoints, enabling crash-resumable builds.
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,
        /// Output path for the graph file.
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Print a summary of a persisted graph.
    Info {
        /// Path to the graph file.
        graph: PathBuf,
    },
    /// Compute a route between two coordinates using a persisted graph.
    Route {
        /// Path to the graph file.
        #[arg(long)]
        graph: PathBuf,
        /// Source as "lon,lat".
        #[arg(long = "from", allow_hyphen_values = true)]
        from: String,
        /// Destination as "lon,lat".
        #[arg(long = "to", allow_hyphen_values = true)]
        to: String,
        #[arg(long, value_enum, default_value_t = Algorithm::AStar)]
        algorithm: Algorithm,
        /// Vessel speed in km/h for the time estimate.
        #[arg(long, default_value_t = 20.0)]
        speed: f64,
        /// Vessel fuel consumption per km for the fuel estimate.
        #[arg(long, default_value_t = 1.0)]
        consumption: f64,
        /// Emit the full route as JSON instead of a text summary.
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Algorithm {
    Dijkstra,
    AStar,
}

impl From<Algorithm> for SearchAlgorithm {
    fn from(value: Algorithm) -> Self {
        match value {
            Algorithm::Dijkstra => SearchAlgorithm::Dijkstra,
            Algorithm::AStar => SearchAlgorithm::AStar,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            ocean,
            lanes,
            ports,
            passages,
            no_passages,
            no_antimeridian,
            spacing,
            chunk_size,
            checkpoint_dir,
            output,
        } => handle_build(BuildArgs {
            ocean,
            lanes,
            ports,
            passages,
            no_passages,
            no_antimeridian,
            spacing,
            chunk_size,
            checkpoint_dir,
            output,
        }),
        Command::Info { graph } => handle_info(&graph),
        Command::Route {
            graph,
            from,
            to,
            algorithm,
            speed,
            consumption,
            json,
        } => handle_route(&graph, &from, &to, algorithm, speed, consumption, json),
    }
}

struct BuildArgs {
    ocean: PathBuf,
    lanes: Option<PathBuf>,
    ports: Option<PathBuf>,
    passages: Option<PathBuf>,
    no_passages: bool,
    no_antimeridian: bool,
    spacing: f64,
    chunk_size: f64,
    checkpoint_dir: Option<PathBuf>,
    output: PathBuf,
}

fn handle_build(args: BuildArgs) -> Result<()> {
    if args.spacing <= 0.0 {
        bail!("--spacing must be positive");
    }

    let ocean = std::fs::read_to_string(&args.ocean)
        .with_context(|| format!("failed to read ocean geometry {}", args.ocean.display()))?;
    let lanes = match &args.lanes {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read lanes {}", path.display()))?,
        ),
        None => None,
    };
    let water = WaterGeometry::from_geojson_str(&ocean, lanes.as_deref())
        .context("failed to parse water geometry")?;

    let ports: Vec<Port> = match &args.ports {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read ports {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse ports {}", path.display()))?
        }
        None => Vec::new(),
    };

    let parameters = BuildParameters {
        spacing_deg: args.spacing,
        chunk_size_deg: args.chunk_size,
        ..BuildParameters::default()
    };
    let mut builder = GridBuilder::new(parameters);
    if let Some(dir) = args.checkpoint_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create checkpoint dir {}", dir.display()))?;
        builder = builder.with_checkpoint_dir(dir);
    }

    let (mut graph, report) = builder
        .build(&water, &ports)
        .context("graph build failed")?;

    if !args.no_passages {
        let passages = match &args.passages {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read passages {}", path.display()))?;
                passages_from_json(&text)
                    .with_context(|| format!("failed to parse passages {}", path.display()))?
            }
            None => builtin_passages(),
        };
        let augment = apply_passages(&mut graph, &passages);
        println!(
            "Passages: {} added, {} skipped",
            augment.added,
            augment.skipped.len()
        );
        for skipped in &augment.skipped {
            println!("  skipped: {skipped}");
        }
    }

    if !args.no_antimeridian {
        let crossings = connect_antimeridian_default(&mut graph);
        println!("Antimeridian crossings: {crossings}");
    }

    save_graph(&graph, &args.output)
        .with_context(|| format!("failed to write graph {}", args.output.display()))?;

    println!(
        "Built {} nodes / {} edges in {:.1}s ({} chunks, {} boundary edges)",
        graph.node_count(),
        graph.edge_count(),
        report.duration_seconds,
        report.chunks,
        report.boundary_edges
    );
    println!("Graph written to {}", args.output.display());
    Ok(())
}

fn handle_info(path: &Path) -> Result<()> {
    let graph =
        load_graph(path).with_context(|| format!("failed to load graph {}", path.display()))?;
    let stats = graph.stats();

    println!("Graph {}", path.display());
    println!("  nodes: {}", stats.node_count);
    println!("  edges: {}", stats.edge_count);
    println!("  built at: {}", stats.built_at.to_rfc3339());
    println!("  build time: {:.1}s", stats.build_seconds);
    println!("  spacing: {} deg", stats.parameters.spacing_deg);
    println!(
        "  bounds: lon [{}, {}], lat [{}, {}]",
        stats.parameters.lon_min,
        stats.parameters.lon_max,
        stats.parameters.lat_min,
        stats.parameters.lat_max
    );
    println!("  passages applied: {}", stats.passages_applied);
    println!("  antimeridian connected: {}", stats.antimeridian_connected);
    Ok(())
}

fn handle_route(
    path: &Path,
    from: &str,
    to: &str,
    algorithm: Algorithm,
    speed: f64,
    consumption: f64,
    json: bool,
) -> Result<()> {
    let mut graph =
        load_graph(path).with_context(|| format!("failed to load graph {}", path.display()))?;
    // Older graph files may predate passage or antimeridian augmentation;
    // run the missing passes once and persist the result.
    ensure_augmented(&mut graph, &builtin_passages(), path)
        .with_context(|| format!("failed to augment graph {}", path.display()))?;

    let mut query = RouteQuery::new(parse_coordinate(from)?, parse_coordinate(to)?);
    query.algorithm = algorithm.into();
    query.vessel.speed_km_per_hour = speed;
    query.vessel.fuel_consumption_per_km = consumption;

    let summary = plan_route(&graph, &query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Route: {} waypoints", summary.coordinates.len());
    println!("Total distance: {:.1} km", summary.total_distance_km);
    println!("Estimated time: {:.1} h", summary.estimated_time_hours);
    println!("Fuel consumption: {:.1}", summary.fuel_consumption);
    if !summary.passages_used.is_empty() {
        println!("Passages: {}", summary.passages_used.join(", "));
    }
    if summary.crosses_antimeridian {
        println!("Route crosses the antimeridian");
    }
    Ok(())
}

/// Parse a "lon,lat" pair.
fn parse_coordinate(text: &str) -> Result<Coordinate> {
    let (lon, lat) = text
        .split_once(',')
        .with_context(|| format!("expected \"lon,lat\", got {text:?}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("invalid longitude in {text:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("invalid latitude in {text:?}"))?;
    Ok(Coordinate::new(lon, lat))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
