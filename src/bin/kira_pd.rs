use std::fs;
use std::process::ExitCode;
use std::str::FromStr;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_portal_data::app::App;
use kira_portal_data::config::{ConfigLoader, ResolvedConfig};
use kira_portal_data::counts::{AltCountInput, COUNT_TYPE};
use kira_portal_data::domain::{CohortId, GeneRef, ProfileId, SampleId, StudyId};
use kira_portal_data::error::KiraError;
use kira_portal_data::output::JsonOutput;
use kira_portal_data::store::SnapshotStore;

#[derive(Parser)]
#[command(name = "kira-pd")]
#[command(about = "Resolve genetic profile data from a portal data snapshot")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    snapshot: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve per-sample data for profiles and genes")]
    ProfileData(ProfileDataArgs),
    #[command(about = "Count mutated samples per gene and protein range")]
    MutationCounts(CountArgs),
    #[command(about = "List genetic profiles")]
    Profiles(ProfilesArgs),
    #[command(about = "List cohorts with their member samples")]
    Cohorts(CohortsArgs),
    #[command(about = "List or look up genes")]
    Genes(GenesArgs),
}

#[derive(Args)]
struct ProfileDataArgs {
    #[arg(long = "profile", required = true, value_delimiter = ',')]
    profiles: Vec<String>,

    #[arg(long = "gene", required = true, value_delimiter = ',')]
    genes: Vec<String>,

    #[arg(long = "sample", value_delimiter = ',')]
    samples: Option<Vec<String>>,

    #[arg(long)]
    cohort: Option<String>,
}

#[derive(Args)]
struct CountArgs {
    /// JSON request body; replaces the list flags below.
    #[arg(long)]
    input: Option<String>,

    #[arg(long)]
    per_study: bool,

    #[arg(long = "id", value_delimiter = ',')]
    ids: Vec<String>,

    #[arg(long = "gene", value_delimiter = ',')]
    genes: Vec<String>,

    #[arg(long = "start", value_delimiter = ',')]
    starts: Vec<i64>,

    #[arg(long = "end", value_delimiter = ',')]
    ends: Vec<i64>,

    #[arg(long = "echo", value_delimiter = ',')]
    echo: Option<Vec<String>>,
}

#[derive(Args)]
struct ProfilesArgs {
    #[arg(long)]
    study: Option<String>,

    #[arg(long = "id", value_delimiter = ',')]
    ids: Option<Vec<String>>,
}

#[derive(Args)]
struct CohortsArgs {
    #[arg(long)]
    study: Option<String>,

    #[arg(long = "id", value_delimiter = ',')]
    ids: Option<Vec<String>>,
}

#[derive(Args)]
struct GenesArgs {
    #[arg(long = "gene", value_delimiter = ',')]
    genes: Option<Vec<String>>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        error if error.is_not_found() => 2,
        KiraError::MissingConfig => 2,
        KiraError::SnapshotRead(_) | KiraError::SnapshotParse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.snapshot.is_some())?;
    let snapshot = cli
        .snapshot
        .map(Utf8PathBuf::from)
        .or_else(|| config.snapshot.clone())
        .ok_or_else(|| miette::Report::msg("no snapshot configured (use --snapshot)"))?;
    let store = SnapshotStore::load(&snapshot)?;
    let app = App::new(store, config.engine_options());

    match cli.command {
        Commands::ProfileData(args) => run_profile_data(args, &app),
        Commands::MutationCounts(args) => run_counts(args, &app),
        Commands::Profiles(args) => {
            let profiles = match args.ids {
                Some(ids) => app.profiles_by_id(&parse_all::<ProfileId>(&ids)?)?,
                None => app.profiles(parse_opt::<StudyId>(args.study.as_deref())?.as_ref())?,
            };
            JsonOutput::print_profiles(&profiles).into_diagnostic()
        }
        Commands::Cohorts(args) => {
            let cohorts = match args.ids {
                Some(ids) => app.cohorts_by_id(&parse_all::<CohortId>(&ids)?)?,
                None => app.cohorts(parse_opt::<StudyId>(args.study.as_deref())?.as_ref())?,
            };
            JsonOutput::print_cohorts(&cohorts).into_diagnostic()
        }
        Commands::Genes(args) => {
            let genes = args
                .genes
                .map(|genes| parse_all::<GeneRef>(&genes))
                .transpose()?;
            let genes = app.genes(genes.as_deref())?;
            JsonOutput::print_genes(&genes).into_diagnostic()
        }
    }
}

/// A missing default config is fine when the snapshot comes from the
/// command line.
fn load_config(path: Option<&str>, has_snapshot: bool) -> Result<ResolvedConfig, KiraError> {
    match ConfigLoader::resolve(path) {
        Err(KiraError::MissingConfig) if path.is_none() && has_snapshot => {
            Ok(ResolvedConfig::default())
        }
        other => other,
    }
}

fn run_profile_data(args: ProfileDataArgs, app: &App<SnapshotStore>) -> miette::Result<()> {
    let profiles = parse_all::<ProfileId>(&args.profiles)?;
    let genes = parse_all::<GeneRef>(&args.genes)?;
    let samples = args
        .samples
        .map(|samples| parse_all::<SampleId>(&samples))
        .transpose()?;
    let cohort = parse_opt::<CohortId>(args.cohort.as_deref())?;

    let result =
        app.resolve_profile_data(&profiles, &genes, samples.as_deref(), cohort.as_ref())?;
    JsonOutput::print_profile_data(&result).into_diagnostic()
}

fn run_counts(args: CountArgs, app: &App<SnapshotStore>) -> miette::Result<()> {
    let input = match args.input {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
            serde_json::from_str::<AltCountInput>(&content)
                .map_err(|err| KiraError::InvalidArgument(err.to_string()))?
        }
        None => AltCountInput::from_lists(
            COUNT_TYPE,
            args.per_study,
            args.ids,
            args.genes,
            args.starts,
            args.ends,
            args.echo,
        )?,
    };
    let counts = app.mutation_counts(&input)?;
    JsonOutput::print_counts(&counts).into_diagnostic()
}

fn parse_all<T>(values: &[String]) -> Result<Vec<T>, KiraError>
where
    T: FromStr<Err = KiraError>,
{
    values.iter().map(|value| value.parse()).collect()
}

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, KiraError>
where
    T: FromStr<Err = KiraError>,
{
    value.map(str::parse).transpose()
}
