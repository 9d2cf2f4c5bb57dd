mod plan;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use exam_core::model::UnitId;
use services::{ApiConfig, ExamApiClient, WizardService};
use ui::{UiApp, build_app_context};

use crate::plan::{GenerationPlan, fill_wizard, print_summary, save_artifact};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUnitId { raw: String },
    MissingUnitId,
    MissingPlan,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUnitId { raw } => write!(f, "invalid --unit value: {raw}"),
            ArgsError::MissingUnitId => write!(f, "no unit given (--unit or EXAM_UNIT_ID)"),
            ArgsError::MissingPlan => write!(f, "generate requires --plan <file>"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_unit(raw: String) -> Result<UnitId, ArgsError> {
    raw.parse::<UnitId>()
        .map_err(|_| ArgsError::InvalidUnitId { raw })
}

struct CliApp {
    unit_id: UnitId,
    wizard: Arc<WizardService>,
}

impl UiApp for CliApp {
    fn current_unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn wizard_service(&self) -> Arc<WizardService> {
        Arc::clone(&self.wizard)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    api: Option<String>,
    unit_id: UnitId,
    plan: Option<PathBuf>,
    out: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- topics   [--api <url>] [--unit <id>]");
    eprintln!("  cargo run -p app -- generate [--api <url>] [--unit <id>] --plan <file> [--out <file>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api {}", ApiConfig::DEFAULT_BASE_URL);
    eprintln!("  --out <file name sent by the server>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_BASE_URL, EXAM_API_TOKEN, EXAM_UNIT_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Topics,
    Generate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "topics" => Some(Self::Topics),
            "generate" => Some(Self::Generate),
            _ => None,
        }
    }
}

impl Args {
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
        env_unit: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut api = None;
        let mut unit_id = env_unit.map(parse_unit).transpose()?;
        let mut plan = None;
        let mut out = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api = Some(require_value(args, "--api")?),
                "--unit" => unit_id = Some(parse_unit(require_value(args, "--unit")?)?),
                "--plan" => plan = Some(PathBuf::from(require_value(args, "--plan")?)),
                "--out" => out = Some(PathBuf::from(require_value(args, "--out")?)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let unit_id = unit_id.ok_or(ArgsError::MissingUnitId)?;
        if command == Command::Generate && plan.is_none() {
            return Err(ArgsError::MissingPlan);
        }
        Ok(Self {
            api,
            unit_id,
            plan,
            out,
        })
    }

    fn api_config(&self) -> Result<ApiConfig, services::ConfigError> {
        let config = ApiConfig::from_env()?;
        match &self.api {
            Some(url) => {
                let explicit = ApiConfig::new(url)?;
                Ok(match config.token {
                    Some(token) => explicit.with_token(token),
                    None => explicit,
                })
            }
            None => Ok(config),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(cmd, &mut iter, std::env::var("EXAM_UNIT_ID").ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let client = ExamApiClient::new(parsed.api_config()?);
    tracing::info!(api = %client.config().base_url, unit = %parsed.unit_id, "exam API configured");
    let app = CliApp {
        unit_id: parsed.unit_id,
        wizard: Arc::new(WizardService::from_backend(client)),
    };
    let app: Arc<dyn UiApp> = Arc::new(app);
    let context = build_app_context(&app);

    match cmd {
        Command::Topics => {
            let view = context.open_wizard().await;
            if view.table().is_empty() {
                println!("no topics for unit {}", context.current_unit_id());
            }
            for topic in view.table().rows() {
                println!("{:>6}  {:<32} {:>5}", topic.id(), topic.name(), topic.max_questions());
            }
            Ok(())
        }
        Command::Generate => {
            let path = parsed.plan.as_deref().ok_or(ArgsError::MissingPlan)?;
            let plan = GenerationPlan::from_path(path)?;
            let mut view = context.open_wizard().await;
            fill_wizard(&mut view, &plan)?;
            print_summary(&view);

            let service = context.wizard_service();
            let ticket = view.begin_submit()?;
            let outcome = service.submit_ticket(&ticket).await;
            let artifact = view.finish_submit(&ticket, outcome)?;
            let saved = save_artifact(&artifact, parsed.out.as_deref())?;
            println!("saved {saved}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(command: Command, args: &[&str], env_unit: Option<&str>) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_owned());
        Args::parse(command, &mut iter, env_unit.map(str::to_owned))
    }

    #[test]
    fn generate_requires_plan() {
        assert_eq!(
            parse(Command::Generate, &["--unit", "4"], None),
            Err(ArgsError::MissingPlan)
        );
    }

    #[test]
    fn unit_falls_back_to_environment() {
        let args = parse(Command::Topics, &[], Some("12")).unwrap();
        assert_eq!(args.unit_id, UnitId::new(12));

        let args = parse(Command::Topics, &["--unit", "3"], Some("12")).unwrap();
        assert_eq!(args.unit_id, UnitId::new(3));
    }

    #[test]
    fn bad_values_are_reported() {
        assert_eq!(
            parse(Command::Topics, &["--unit", "abc"], None),
            Err(ArgsError::InvalidUnitId { raw: "abc".into() })
        );
        assert_eq!(
            parse(Command::Topics, &["--api"], Some("1")),
            Err(ArgsError::MissingValue { flag: "--api" })
        );
        assert_eq!(
            parse(Command::Topics, &["--verbose"], Some("1")),
            Err(ArgsError::UnknownArg("--verbose".into()))
        );
        assert_eq!(parse(Command::Topics, &[], None), Err(ArgsError::MissingUnitId));
    }

    #[test]
    fn full_generate_invocation() {
        let args = parse(
            Command::Generate,
            &[
                "--api",
                "http://exams.local/api",
                "--unit",
                "7",
                "--plan",
                "plan.json",
                "--out",
                "exam.zip",
            ],
            None,
        )
        .unwrap();
        assert_eq!(args.api.as_deref(), Some("http://exams.local/api"));
        assert_eq!(args.plan, Some(PathBuf::from("plan.json")));
        assert_eq!(args.out, Some(PathBuf::from("exam.zip")));
    }
}
