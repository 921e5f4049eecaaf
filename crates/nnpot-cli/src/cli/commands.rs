use super::CliError;
use super::helpers::*;
use nnpot_core::NnPotential;
use nnpot_core::data::{TargetKind, load_dataset, save_dataset};
use nnpot_core::domain::Structure;
use nnpot_core::modules::configs::{INPUT_DATA_FILE, read_cfgs, write_cfgs};
use nnpot_core::modules::input::{INPUT_NN_FILE, load_settings, write_input};
use nnpot_core::potential::DEFAULT_NAME;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct WriteDataArgs {
    /// JSON dataset (array of structure/num_atoms/outputs documents)
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// Output path
    #[arg(short, long, default_value = INPUT_DATA_FILE)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct WriteInputArgs {
    /// Element the potential is fitted for
    #[arg(long)]
    element: String,

    /// JSON settings merged over the defaults
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Output path
    #[arg(short, long, default_value = INPUT_NN_FILE)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ReadDataArgs {
    /// n2p2 configuration file
    #[arg(value_name = "FILE")]
    data: PathBuf,

    /// Also write the documents as a JSON dataset
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct TrainArgs {
    /// JSON dataset used for fitting
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// JSON settings merged over the defaults
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Directory receiving the parameter bundle
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Potential name reported by `inspect`
    #[arg(long, default_value = DEFAULT_NAME)]
    name: String,
}

#[derive(clap::Args)]
pub(super) struct EvaluateArgs {
    /// Parameter bundle directory
    #[arg(long, value_name = "DIR")]
    params: PathBuf,

    /// JSON dataset with reference properties
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// JSON report with metrics and both target tables
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct PredictArgs {
    /// Parameter bundle directory
    #[arg(long, value_name = "DIR")]
    params: PathBuf,

    /// Structure JSON
    #[arg(value_name = "STRUCTURE")]
    structure: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Parameter bundle directory
    #[arg(long, value_name = "DIR")]
    params: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

pub(super) fn run_write_data_command(args: WriteDataArgs) -> Result<i32, CliError> {
    let pool = load_dataset(&args.dataset).map_err(CliError::Compute)?;
    let element = write_cfgs(&args.output, &pool).map_err(CliError::Compute)?;

    println!(
        "Wrote {} {} structures to {}",
        pool.len(),
        element,
        args.output.display()
    );
    Ok(0)
}

pub(super) fn run_write_input_command(args: WriteInputArgs) -> Result<i32, CliError> {
    let element = parse_element(&args.element)?;
    let settings = load_settings(args.settings.as_deref()).map_err(CliError::Compute)?;
    write_input(&args.output, &settings, element).map_err(CliError::Compute)?;

    println!(
        "Wrote {} with {} symmetry functions to {}",
        INPUT_NN_FILE,
        settings.num_symm_functions(),
        args.output.display()
    );
    Ok(0)
}

pub(super) fn run_read_data_command(args: ReadDataArgs) -> Result<i32, CliError> {
    let (docs, table) = read_cfgs(&args.data).map_err(CliError::Compute)?;
    let atoms = docs.iter().map(|doc| doc.num_atoms).sum::<usize>();

    println!("Structures: {}", docs.len());
    println!("Atoms:      {}", atoms);
    println!("Energies:   {}", table.values(TargetKind::Energy).len());
    println!("Forces:     {}", table.values(TargetKind::Force).len());

    if let Some(path) = &args.json {
        save_dataset(path, &docs).map_err(CliError::Compute)?;
        println!("JSON dataset: {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_train_command(args: TrainArgs) -> Result<i32, CliError> {
    let pool = load_dataset(&args.dataset).map_err(CliError::Compute)?;
    let settings = load_settings(args.settings.as_deref()).map_err(CliError::Compute)?;
    tracing::info!(
        dataset = %args.dataset.display(),
        structures = pool.len(),
        output_dir = %args.output_dir.display(),
        "loaded training dataset"
    );

    let mut potential = NnPotential::new(args.name);
    let code = potential
        .train(&pool, settings)
        .map_err(CliError::Compute)?;
    let ff_settings = potential
        .save(&args.output_dir)
        .map_err(CliError::Compute)?;
    let summary = potential.summary().map_err(CliError::Compute)?;

    println!("{}", render_summary(&summary));
    println!("Parameters: {}", args.output_dir.display());
    for line in ff_settings {
        println!("{}", line);
    }
    Ok(code)
}

pub(super) fn run_evaluate_command(args: EvaluateArgs) -> Result<i32, CliError> {
    let potential = NnPotential::load(&args.params).map_err(CliError::Compute)?;
    let pool = load_dataset(&args.dataset).map_err(CliError::Compute)?;
    tracing::info!(
        params = %args.params.display(),
        structures = pool.len(),
        "evaluating parameter bundle"
    );
    let (reference, predicted) = potential.evaluate(&pool).map_err(CliError::Compute)?;

    let report = EvaluationReport::new(reference, predicted);
    println!("{}", render_evaluation(&report));
    if let Some(path) = &args.report {
        write_json(path, &report)?;
        println!("JSON report: {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_predict_command(args: PredictArgs) -> Result<i32, CliError> {
    let potential = NnPotential::load(&args.params).map_err(CliError::Compute)?;
    let structure: Structure = read_json(&args.structure)?;
    let prediction = potential.predict(&structure).map_err(CliError::Compute)?;

    print_json(&prediction)?;
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let potential = NnPotential::load(&args.params).map_err(CliError::Compute)?;
    let summary = potential.summary().map_err(CliError::Compute)?;

    if args.json {
        print_json(&summary)?;
    } else {
        println!("{}", render_summary(&summary));
    }
    Ok(0)
}
