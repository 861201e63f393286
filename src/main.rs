use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use pddl_aml::dataset::DatasetReader;
use pddl_aml::learning::{ground_action_space, ground_literal_space, Learner};
use pddl_aml::pddl::{Domain, Problem};

/// Inspects PDDL domains and learns action models from execution logs.
#[derive(Parser, Debug)]
#[clap(about = "PDDL action model learning")]
struct App {
    /// Logging level to use: one of "error", "warn", "info", "debug", "trace"
    #[clap(short, long, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the domain and, if given, the problem
    Describe(DescribeArgs),
    /// Print every grounded literal of a problem
    LiteralSpace(ProblemArgs),
    /// Print the symbolic literal space of an action
    ActionSpace(ActionArgs),
    /// Learn preconditions and effects of an action from a log
    Learn(LearnArgs),
}

#[derive(Debug, Args)]
struct DomainArgs {
    /// PDDL domain file
    #[clap(short, long, default_value = "pddl-problems/blocksworld/domain.pddl")]
    domain: String,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    #[clap(flatten)]
    domain: DomainArgs,

    /// PDDL problem file
    #[clap(short, long)]
    problem: Option<String>,
}

#[derive(Debug, Args)]
struct ProblemArgs {
    #[clap(flatten)]
    domain: DomainArgs,

    /// PDDL problem file
    #[clap(short, long, default_value = "pddl-problems/blocksworld/problem.pddl")]
    problem: String,
}

#[derive(Debug, Args)]
struct ActionArgs {
    #[clap(flatten)]
    domain: DomainArgs,

    /// Action whose parameters the literals are grounded over
    #[clap(short, long)]
    action: String,
}

#[derive(Debug, Args)]
struct LearnArgs {
    #[clap(flatten)]
    domain: DomainArgs,

    /// `;`-delimited execution log
    #[clap(long, default_value = "pddl-problems/blocksworld/dataset.csv")]
    dataset: String,

    /// Action to learn
    #[clap(short, long)]
    action: String,
}

impl DomainArgs {
    fn load(&self) -> Result<Domain> {
        Domain::from_file(&self.domain).with_context(|| format!("while loading domain {}", self.domain))
    }
}

fn load_problem(path: &str, domain: &Domain) -> Result<Problem> {
    Problem::from_file(path, domain).with_context(|| format!("while loading problem {}", path))
}

fn main() -> Result<()> {
    let args = App::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &args.command {
        Command::Describe(describe) => {
            let domain = describe.domain.load()?;
            println!("{}", domain);
            if let Some(path) = &describe.problem {
                println!("{}", load_problem(path, &domain)?);
            }
        }
        Command::LiteralSpace(problem_args) => {
            let domain = problem_args.domain.load()?;
            let problem = load_problem(&problem_args.problem, &domain)?;
            let space = ground_literal_space(&domain, &problem);
            tracing::info!(literals = space.len(), "literal space of {}", problem.name);
            print!("{}", space);
        }
        Command::ActionSpace(action_args) => {
            let domain = action_args.domain.load()?;
            let space = ground_action_space(&domain, &action_args.action)?;
            tracing::info!(literals = space.len(), "action space of {}", action_args.action);
            print!("{}", space);
        }
        Command::Learn(learn) => {
            let domain = learn.domain.load()?;
            let examples = DatasetReader::new(&domain)
                .load(&learn.dataset)
                .with_context(|| format!("while reading dataset {}", learn.dataset))?;
            tracing::info!(examples = examples.len(), "loaded {}", learn.dataset);
            let mut learner = Learner::new(&domain, &learn.action)?;
            learner.observe_all(&examples)?;
            print!("{}", learner.model());
        }
    }
    Ok(())
}
