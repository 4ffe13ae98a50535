use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use gridflow::error::Result;
use gridflow::flow::compute_flows;
use gridflow::io;
use gridflow::model::{DEFAULT_S_BASE_MVA, Network};
use gridflow::report;
use gridflow::solver::{
    Acceleration, GaussSeidelOptions, NewtonOptions, Solution, gauss_seidel, newton_raphson,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    Newton,
    GaussSeidel,
}

/// Classical power-flow solver: computes bus voltages, branch flows and
/// losses for one network snapshot.
#[derive(Parser, Debug)]
#[command(name = "gridflow", version, about)]
struct Cli {
    /// JSON network file (bus/branch tables, optional explicit Y-bus).
    #[arg(long, conflicts_with_all = ["ybus", "buses", "branches"])]
    network: Option<PathBuf>,

    /// Admittance matrix CSV; used together with --buses and --branches.
    #[arg(long, requires = "buses")]
    ybus: Option<PathBuf>,

    /// Bus table CSV.
    #[arg(long, requires = "branches")]
    buses: Option<PathBuf>,

    /// Branch (impedance) table CSV.
    #[arg(long, requires = "ybus")]
    branches: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Method::Newton)]
    method: Method,

    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Iteration cap; defaults to 30 for Newton and 1000 for Gauss-Seidel.
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Newton update scale in (0, 1].
    #[arg(long, default_value_t = 1.0)]
    damping: f64,

    /// Gauss-Seidel acceleration factor for PQ buses.
    #[arg(long, default_value_t = 1.0)]
    accel_pq: f64,

    /// Gauss-Seidel acceleration factor for PV buses.
    #[arg(long, default_value_t = 1.0)]
    accel_pv: f64,

    /// Directory to export bus_results.csv and branch_results.csv into.
    #[arg(long)]
    csv_out: Option<PathBuf>,
}

fn load_network(cli: &Cli) -> Result<Network> {
    if let Some(path) = &cli.network {
        return io::network_from_json(path);
    }
    match (&cli.ybus, &cli.buses, &cli.branches) {
        (Some(y), Some(b), Some(br)) => {
            let net = Network {
                s_base_mva: DEFAULT_S_BASE_MVA,
                y_bus: io::admittance_from_csv(y)?,
                buses: io::buses_from_csv(b)?,
                branches: io::branches_from_csv(br)?,
            };
            net.validate()?;
            Ok(net)
        }
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "provide --network <file.json> or the --ybus/--buses/--branches CSV triple",
        )
        .into()),
    }
}

fn solve(cli: &Cli, net: &Network) -> Result<Solution> {
    match cli.method {
        Method::Newton => {
            let opts = NewtonOptions {
                tolerance: cli.tolerance,
                max_iterations: cli.max_iterations.unwrap_or(30),
                damping: cli.damping,
            };
            newton_raphson(net, &opts)
        }
        Method::GaussSeidel => {
            let opts = GaussSeidelOptions {
                tolerance: cli.tolerance,
                max_iterations: cli.max_iterations.unwrap_or(1000),
                acceleration: Acceleration {
                    pq: cli.accel_pq,
                    pv: cli.accel_pv,
                },
            };
            gauss_seidel(net, &opts)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let net = load_network(cli)?;
    info!(buses = net.n_buses(), branches = net.branches.len(), "network loaded");

    let started = Instant::now();
    let sol = solve(cli, &net)?;
    let elapsed = started.elapsed();

    if sol.converged(cli.tolerance) {
        println!(
            "Converged after {} iterations, error {:.3e} ({:.2?})",
            sol.iterations, sol.error, elapsed
        );
    } else {
        warn!(
            iterations = sol.iterations,
            error = sol.error,
            "iteration cap reached without convergence"
        );
        println!(
            "Did not converge: {} iterations, error {:.3e} ({:.2?})",
            sol.iterations, sol.error, elapsed
        );
    }

    let flows = compute_flows(&sol.v, &net)?;

    println!("\nBus results:");
    println!("{}", report::bus_table(&net, &sol.v, &flows));
    println!("\nBranch flows:");
    println!("{}", report::branch_table(&net, &flows));
    println!(
        "\nTotal losses: {:.2} MW, {:.2} MVAr",
        flows.total_p_loss() * net.s_base_mva,
        flows.total_q_loss() * net.s_base_mva
    );

    if let Some(dir) = &cli.csv_out {
        std::fs::create_dir_all(dir)?;
        report::write_bus_csv(File::create(dir.join("bus_results.csv"))?, &net, &sol.v, &flows)?;
        report::write_branch_csv(File::create(dir.join("branch_results.csv"))?, &net, &flows)?;
        info!(dir = %dir.display(), "results exported");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
