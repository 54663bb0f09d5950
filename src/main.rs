use anyhow::Result;
use clap::Parser;
use simseries::{
    cli::Cli,
    config::Config,
    output,
    pipeline::{Pipeline, Report},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &Cli) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_toml(path)?,
        None => Config::default(),
    };
    args.apply_overrides(&mut config);
    Ok(config)
}

/// Print extraction warnings to stderr
fn report_warnings(report: &Report) {
    let warnings: Vec<String> = match report {
        Report::Run(run) => run.warnings.iter().map(ToString::to_string).collect(),
        Report::Comparison(cmp) => cmp
            .warnings
            .iter()
            .cloned()
            .chain(cmp.comparison.warnings.iter().map(ToString::to_string))
            .collect(),
    };
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let pipeline = Pipeline::new(load_config(&args)?)?;
    let selection = args.selection();

    let source = pipeline.ingest_path(&args.stats)?;
    let report = match &args.compare {
        Some(path_b) => {
            let source_b = pipeline.ingest_path(path_b)?;
            Report::Comparison(pipeline.compare(&source, &source_b, &selection)?)
        }
        None => Report::Run(pipeline.analyze(&source, &selection)?),
    };

    report_warnings(&report);
    print!("{}", output::render(&report, args.format.into())?);

    Ok(())
}
