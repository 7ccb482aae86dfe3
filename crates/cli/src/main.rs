//! Fluvia CLI - River connectivity and sediment transport indices

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fluvia_core::io::{
    read_barriers, read_benchmarks, read_lakes, read_reaches, write_records, BenchmarkEntry,
};
use fluvia_core::{Barrier, Reach, ReachId, RiverNetwork, RunSettings, Scenario};
use fluvia_indices::basin::compute_by_basin;
use fluvia_indices::csi::{compute_csi, CsiResult, PressureInputs};
use fluvia_indices::sed::{compute_sed, pool_barrier_volumes, prepare_lakes, LakeBudget, SedResult};
use fluvia_indices::stats::{benchmark_matches, dominance_counts, global_stats};
use fluvia_indices::status::compute_status;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "fluvia")]
#[command(author, version, about = "River connectivity and sediment indices", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Degree of Fragmentation per reach
    Dof {
        /// Reach table (CSV)
        reaches: PathBuf,
        /// Barrier table (CSV)
        barriers: PathBuf,
        /// Output table (CSV)
        output: PathBuf,
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Degree of Regulation per reach
    Dor {
        /// Reach table (CSV)
        reaches: PathBuf,
        /// Barrier table (CSV)
        barriers: PathBuf,
        /// Output table (CSV)
        output: PathBuf,
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Sediment Trapping Index per reach
    Sed {
        /// Reach table (CSV)
        reaches: PathBuf,
        /// Barrier table (CSV)
        barriers: PathBuf,
        /// Output table (CSV)
        output: PathBuf,
        /// Lake table (CSV)
        #[arg(short, long)]
        lakes: Option<PathBuf>,
    },
    /// Full scenario pipeline: CSI, status and summary statistics
    Csi {
        /// Reach table (CSV)
        reaches: PathBuf,
        /// Barrier table (CSV)
        barriers: PathBuf,
        /// Output directory for per-scenario and summary tables
        output: PathBuf,
        /// Lake table (CSV)
        #[arg(short, long)]
        lakes: Option<PathBuf>,
        /// Benchmark river table (CSV)
        #[arg(short, long)]
        benchmarks: Option<PathBuf>,
        /// Run configuration with scenarios (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ─── Configuration ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct RunConfig {
    #[serde(default)]
    settings: RunSettings,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        None => Ok(RunConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: RunConfig = toml::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            config.settings.validate()?;
            for scenario in &config.scenarios {
                scenario.validate()?;
            }
            Ok(config)
        }
    }
}

// ─── Output rows ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DofRow {
    #[serde(rename = "GOID")]
    goid: u64,
    #[serde(rename = "BAS_ID")]
    bas_id: u32,
    #[serde(rename = "DOF")]
    dof: f64,
}

#[derive(Serialize)]
struct DorRow {
    #[serde(rename = "GOID")]
    goid: u64,
    #[serde(rename = "BAS_ID")]
    bas_id: u32,
    #[serde(rename = "DOR")]
    dor: f64,
}

#[derive(Serialize)]
struct SedRow {
    #[serde(rename = "GOID")]
    goid: u64,
    #[serde(rename = "SED_NAT")]
    sed_nat: f64,
    #[serde(rename = "SED_ANT")]
    sed_ant: f64,
    #[serde(rename = "SED_LSS_LKS_OT")]
    loss_lakes_outside: f64,
    #[serde(rename = "SED_LSS_LKS_IN_NAT")]
    loss_lakes_natural: f64,
    #[serde(rename = "SED_LSS_LKS_IN_ANT")]
    loss_lakes_anthropogenic: f64,
    #[serde(rename = "SED_LSS_DMS")]
    loss_dams: f64,
    #[serde(rename = "SED_LSS_TOT")]
    loss_total: f64,
    #[serde(rename = "SED")]
    sed: f64,
}

#[derive(Serialize)]
struct CsiRow {
    #[serde(rename = "GOID")]
    goid: u64,
    #[serde(rename = "CSI")]
    csi: f64,
    #[serde(rename = "DOM")]
    dom: &'static str,
    #[serde(rename = "FF")]
    ff: u8,
    #[serde(rename = "CSI_FF1")]
    status_two: u8,
    #[serde(rename = "CSI_FF2")]
    status: u8,
    #[serde(rename = "FFR_DIS_ID")]
    stretch_id: u32,
}

#[derive(Serialize)]
struct SummaryRow {
    #[serde(rename = "SCE_NAME")]
    scenario: String,
    #[serde(rename = "REACH_COUNT")]
    reach_count: usize,
    #[serde(rename = "IMP_COUNT")]
    impacted_count: usize,
    #[serde(rename = "PCT_IMP")]
    impacted_pct: f64,
    #[serde(rename = "MEAN_CSI_IMP")]
    impacted_mean_csi: f64,
    #[serde(rename = "NFF_COUNT")]
    below_threshold_count: usize,
    #[serde(rename = "PCT_NFF")]
    below_threshold_pct: f64,
    #[serde(rename = "BENCH_FF")]
    bench_matches: Option<usize>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_network_tables(
    reach_path: &Path,
    barrier_path: &Path,
) -> Result<(Vec<Reach>, Vec<Barrier>)> {
    let pb = spinner("Reading input tables...");
    let reaches = read_reaches(reach_path)
        .with_context(|| format!("Failed to read reach table {}", reach_path.display()))?;
    let barriers = read_barriers(barrier_path)
        .with_context(|| format!("Failed to read barrier table {}", barrier_path.display()))?;
    pb.finish_and_clear();
    info!(
        "Input: {} reaches, {} barriers",
        reaches.len(),
        barriers.len()
    );
    Ok((reaches, barriers))
}

fn read_lake_budget(path: Option<&PathBuf>, network: &RiverNetwork) -> Result<LakeBudget> {
    match path {
        None => Ok(LakeBudget::default()),
        Some(path) => {
            let lakes = read_lakes(path)
                .with_context(|| format!("Failed to read lake table {}", path.display()))?;
            info!("Input: {} lakes", lakes.len());
            Ok(prepare_lakes(&network.locate_lakes(&lakes)))
        }
    }
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Rekey input-order fragmentation values into network order.
fn align_to_network(values: &[f64], reaches: &[Reach], network: &RiverNetwork) -> Vec<f64> {
    let by_id: HashMap<ReachId, f64> = reaches
        .iter()
        .zip(values)
        .map(|(r, &v)| (r.reach_id, v))
        .collect();
    network
        .reaches()
        .iter()
        .map(|r| by_id.get(&r.reach_id).copied().unwrap_or(0.0))
        .collect()
}

fn pressure_inputs(network: &RiverNetwork, dof: &[f64], dor: &[f64], sed: &SedResult) -> Vec<PressureInputs> {
    network
        .reaches()
        .iter()
        .enumerate()
        .map(|(i, r)| PressureInputs {
            dof: dof[i],
            dor: dor[i],
            sed: sed.sed[i],
            land_use: r.land_use,
            road: r.road_density,
            urban: r.urban_extent,
            floodplain_pct: r.floodplain_pct,
        })
        .collect()
}

fn compute_sed_for(
    network: &RiverNetwork,
    barriers: &[Barrier],
    lakes: &LakeBudget,
) -> SedResult {
    let located = network.locate_barriers(barriers);
    compute_sed(network, &pool_barrier_volumes(&located), lakes)
}

// ─── Scenario pipeline ──────────────────────────────────────────────────

fn run_scenario(
    network: &RiverNetwork,
    inputs: &[PressureInputs],
    scenario: &Scenario,
    benchmarks: Option<&[BenchmarkEntry]>,
    output_dir: &Path,
) -> Result<(SummaryRow, CsiResult)> {
    info!("Processing scenario: {}", scenario.name);

    let csi = compute_csi(inputs, scenario);
    let status = compute_status(network, &csi.above_threshold, scenario);

    if scenario.to_export {
        let rows: Vec<CsiRow> = network
            .reaches()
            .iter()
            .enumerate()
            .map(|(i, r)| CsiRow {
                goid: r.reach_id.0,
                csi: csi.csi[i],
                dom: csi.dominant[i].label(),
                ff: csi.above_threshold[i] as u8,
                status_two: status.status[i].code_two(),
                status: status.status[i].code(),
                stretch_id: status.stretch_id[i],
            })
            .collect();
        let path = output_dir.join(format!("csi_{}.csv", scenario.name));
        write_records(&path, &rows)?;
        info!("Exported reach table: {}", path.display());
    }

    let stats = global_stats(network, &csi, &scenario.name);
    let bench_matches = benchmarks.map(|entries| {
        let matches = benchmark_matches(network, &csi, entries, scenario.csi_threshold);
        info!(
            "Scenario {}: {} benchmark rivers free-flowing",
            scenario.name, matches
        );
        matches
    });

    let summary = SummaryRow {
        scenario: stats.scenario,
        reach_count: stats.reach_count,
        impacted_count: stats.impacted_count,
        impacted_pct: stats.impacted_pct,
        impacted_mean_csi: stats.impacted_mean_csi,
        below_threshold_count: stats.below_threshold_count,
        below_threshold_pct: stats.below_threshold_pct,
        bench_matches,
    };
    Ok((summary, csi))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── DOF ──────────────────────────────────────────────────────
        Commands::Dof {
            reaches,
            barriers,
            output,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let (reach_table, barrier_table) = read_network_tables(&reaches, &barriers)?;

            let start = Instant::now();
            let result = compute_by_basin(&reach_table, &barrier_table, &config.settings)?;
            let elapsed = start.elapsed();

            let rows: Vec<DofRow> = reach_table
                .iter()
                .zip(&result.dof)
                .map(|(r, &dof)| DofRow {
                    goid: r.reach_id.0,
                    bas_id: r.basin_id,
                    dof,
                })
                .collect();
            write_records(&output, &rows)?;
            done("DOF", &output, elapsed);
        }

        // ── DOR ──────────────────────────────────────────────────────
        Commands::Dor {
            reaches,
            barriers,
            output,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let (reach_table, barrier_table) = read_network_tables(&reaches, &barriers)?;

            let start = Instant::now();
            let result = compute_by_basin(&reach_table, &barrier_table, &config.settings)?;
            let elapsed = start.elapsed();

            let rows: Vec<DorRow> = reach_table
                .iter()
                .zip(&result.dor)
                .map(|(r, &dor)| DorRow {
                    goid: r.reach_id.0,
                    bas_id: r.basin_id,
                    dor,
                })
                .collect();
            write_records(&output, &rows)?;
            done("DOR", &output, elapsed);
        }

        // ── SED ──────────────────────────────────────────────────────
        Commands::Sed {
            reaches,
            barriers,
            output,
            lakes,
        } => {
            let (reach_table, barrier_table) = read_network_tables(&reaches, &barriers)?;

            let start = Instant::now();
            let network = RiverNetwork::build(reach_table)?;
            let budget = read_lake_budget(lakes.as_ref(), &network)?;
            let result = compute_sed_for(&network, &barrier_table, &budget);
            let elapsed = start.elapsed();

            let rows: Vec<SedRow> = network
                .reaches()
                .iter()
                .enumerate()
                .map(|(i, r)| SedRow {
                    goid: r.reach_id.0,
                    sed_nat: result.sed_nat[i],
                    sed_ant: result.sed_ant[i],
                    loss_lakes_outside: result.loss_lakes_outside[i],
                    loss_lakes_natural: result.loss_lakes_natural[i],
                    loss_lakes_anthropogenic: result.loss_lakes_anthropogenic[i],
                    loss_dams: result.loss_dams[i],
                    loss_total: result.loss_total[i],
                    sed: result.sed[i],
                })
                .collect();
            write_records(&output, &rows)?;
            done("SED", &output, elapsed);
        }

        // ── CSI pipeline ─────────────────────────────────────────────
        Commands::Csi {
            reaches,
            barriers,
            output,
            lakes,
            benchmarks,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let scenarios = if config.scenarios.is_empty() {
                vec![Scenario::default()]
            } else {
                config.scenarios
            };

            let (reach_table, barrier_table) = read_network_tables(&reaches, &barriers)?;
            let bench_table = benchmarks
                .map(|path| {
                    read_benchmarks(&path).with_context(|| {
                        format!("Failed to read benchmark table {}", path.display())
                    })
                })
                .transpose()?;

            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            let start = Instant::now();

            let frag = compute_by_basin(&reach_table, &barrier_table, &config.settings)?;
            let network = RiverNetwork::build(reach_table.clone())?;
            let dof = align_to_network(&frag.dof, &reach_table, &network);
            let dor = align_to_network(&frag.dor, &reach_table, &network);

            let budget = read_lake_budget(lakes.as_ref(), &network)?;
            let sed = compute_sed_for(&network, &barrier_table, &budget);

            let inputs = pressure_inputs(&network, &dof, &dor, &sed);

            let mut summaries = Vec::new();
            let mut dominance_rows = Vec::new();
            for scenario in &scenarios {
                scenario.validate()?;
                if !scenario.to_process {
                    info!("Skipped scenario: {}", scenario.name);
                    continue;
                }
                let (summary, csi) = run_scenario(
                    &network,
                    &inputs,
                    scenario,
                    bench_table.as_deref(),
                    &output,
                )?;
                dominance_rows.extend(dominance_counts(&network, &csi, &scenario.name));
                summaries.push(summary);
            }

            let elapsed = start.elapsed();

            let summary_path = output.join("global_stats.csv");
            write_records(&summary_path, &summaries)?;
            let dom_path = output.join("global_dom.csv");
            write_records(&dom_path, &dominance_rows)?;

            done("CSI pipeline", &output, elapsed);
        }
    }

    Ok(())
}
