use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use fmriprep_bashgen::app::{App, DEFAULT_GROUP_SIZE, GenerationMode, GenerationReport, PlanReport};
use fmriprep_bashgen::config::{ConfigLoader, Overrides};
use fmriprep_bashgen::error::BashGenError;
use fmriprep_bashgen::generator::ScriptGenerator;
use fmriprep_bashgen::output::{FsScriptWriter, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "fmriprep-bashgen")]
#[command(
    about = "A tool for automating the creation of bash scripts tailored for preprocessing fMRI data."
)]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Write one run_fmriprep.sh covering every subject")]
    Single(CommonArgs),
    #[command(about = "Write one run_fmriprep_<subject>.sh per subject")]
    Sequence(CommonArgs),
    #[command(about = "Write one script per group of subjects")]
    Groups(GroupsArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Subjects to include (e.g. sub-01 sub-02 sub-03 or sub-01:03)
    #[arg(value_name = "SUBJECT", required = true, num_args = 1..)]
    subjects: Vec<String>,

    /// Subjects to exclude (e.g. sub-01 sub-02 sub-03 or sub-01:03)
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,

    /// Sessions to process [default: ses-01 ses-02]
    #[arg(long, num_args = 1..)]
    sessions: Option<Vec<String>>,

    /// Project directory path [default: /data/pt_02703/fMRIprep]
    #[arg(long)]
    project_dir: Option<String>,

    /// JSON config file (fieldmap groups, sessions, container settings)
    #[arg(long)]
    config: Option<String>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    loglevel: LogLevel,

    /// Print the planned sidecar changes and scripts without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print a JSON report instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GroupsArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// How many participants per bash script
    #[arg(short = 'g', long = "groupsize", default_value_t = DEFAULT_GROUP_SIZE)]
    group_size: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Info,
    Debug,
    Error,
    Critical,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<BashGenError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BashGenError) -> u8 {
    match error {
        BashGenError::Format(_)
        | BashGenError::NotFound { .. }
        | BashGenError::InvalidGroupSize(_)
        | BashGenError::InvalidPattern { .. }
        | BashGenError::ConfigRead(_)
        | BashGenError::ConfigParse(_) => 2,
        BashGenError::MissingData { .. }
        | BashGenError::Lookup { .. }
        | BashGenError::Sidecar { .. } => 3,
        BashGenError::Filesystem(_) => 1,
    }
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let (args, mode) = match cli.command {
        Commands::Single(args) => (args, GenerationMode::Single),
        Commands::Sequence(args) => (args, GenerationMode::Sequence),
        Commands::Groups(args) => (
            args.common,
            GenerationMode::Groups {
                group_size: args.group_size,
            },
        ),
    };
    init_logging(args.loglevel);

    let output_mode = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let overrides = Overrides {
        subjects: args.subjects,
        exclude: args.exclude,
        sessions: args.sessions,
        project_dir: args.project_dir,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides)?;
    if config.subjects.is_empty() {
        return Err(miette::Report::msg(
            "no subjects left after applying --exclude",
        ));
    }
    tracing::debug!("project directory: {}", config.project_dir);

    let mut app = App::new(ScriptGenerator::new(&config), FsScriptWriter);
    if args.dry_run {
        let report = app.plan(mode)?;
        match output_mode {
            OutputMode::Json => JsonOutput::print_plan(&report).into_diagnostic()?,
            OutputMode::Human => print_plan_summary(&report),
        }
        return Ok(());
    }

    let report = app.generate(mode)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_generation(&report).into_diagnostic()?,
        OutputMode::Human => print_generation_summary(&report),
    }
    Ok(())
}

fn print_generation_summary(report: &GenerationReport) {
    println!(
        "fmriprep-bashgen ({} mode): {} script(s) in {}",
        report.mode,
        report.scripts.len(),
        report.project_dir
    );
    for script in &report.scripts {
        println!("  {} ({} subject(s))", script.path, script.subjects.len());
    }
}

fn print_plan_summary(report: &PlanReport) {
    println!(
        "fmriprep-bashgen ({} mode, dry run): nothing written",
        report.mode
    );
    for plan in &report.subjects {
        println!("{}", plan.subject);
        for patch in &plan.sidecars.patches {
            println!("  {} = {}  {}", patch.field.key(), patch.value, patch.path);
        }
    }
    for script in &report.scripts {
        println!("would write {}", script.path);
    }
}
