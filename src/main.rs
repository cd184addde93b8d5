//! isst runner
//!
//! Loads an analysis configuration, syncs the design system with its risk
//! tables, and prints the posterior risk summary.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use isst::config::AnalysisConfig;
use isst::launch_vehicle::size_vehicle;
use isst::IsstResult;

const USAGE: &str = "Usage: isst <config.yaml> [--generate] [--json <posterior.json>]";

#[derive(Debug, Default)]
struct Args {
    config: PathBuf,
    generate: bool,
    json: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut config = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--generate" => parsed.generate = true,
                "--json" => {
                    let path = args.next().ok_or("--json needs a path")?;
                    parsed.json = Some(PathBuf::from(path));
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
                path if config.is_none() => config = Some(PathBuf::from(path)),
                extra => return Err(format!("unexpected argument {extra}")),
            }
        }
        parsed.config = config.ok_or("missing configuration file")?;
        Ok(parsed)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> IsstResult<()> {
    let config = AnalysisConfig::load(&args.config)?;
    let mut system = config.design_system()?;
    let root = &config.storage.root;

    if args.generate || !system.table_directory(root).is_dir() {
        let directory = system.generate_system_specification(root)?;
        println!("Risk tables written to {}", directory.display());
        if args.generate {
            return Ok(());
        }
    } else {
        system.read_system_specification(root)?;
    }

    if let Some(vehicle) = &config.vehicle {
        let sizing = size_vehicle(vehicle)?;
        println!("Launch vehicle");
        for (index, stage) in sizing.stages.iter().enumerate() {
            println!(
                "  stage {}: propellant {:.0} kg, structure {:.0} kg, ignition mass {:.0} kg",
                index + 1,
                stage.propellant_mass,
                stage.structural_mass,
                stage.initial_mass
            );
        }
        println!(
            "  gross lift-off mass {:.0} kg, payload fraction {:.4}",
            sizing.gross_lift_off_mass,
            sizing.payload_fraction(vehicle.payload_mass)
        );
        println!();
    }

    let counts = system.risk_level_counts();
    println!("{} risk levels", system.name());
    println!("  Schedule: {:?}", counts.schedule);
    println!("  Cost:     {:?}", counts.cost);
    for (table, levels) in system.technical_risk_tables().iter().zip(&counts.technical) {
        println!("  {}: {levels:?}", table.name());
    }
    println!();

    let mut sampler = config.sampler()?;
    let posterior = system.analyze_system(&mut sampler)?;

    println!(
        "{:<40} {:>12} {:>12} {:>12} {:>12}",
        "", "mean", "sd", "q03", "q97"
    );
    for row in posterior.summary() {
        println!(
            "{:<40} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            row.label, row.mean, row.sd, row.q03, row.q97
        );
    }
    println!();

    for report in system.dimension_reports(&posterior)? {
        println!(
            "{}: expected total {:.4}, utility {:.4}, level {}",
            report.dimension, report.total.mean, report.utility, report.level
        );
    }

    if let Some(path) = &args.json {
        posterior.write_json(path)?;
        println!("Posterior draws written to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    init_tracing();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
