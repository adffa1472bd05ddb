mod cmd;
mod ctx;
mod output;

use clap::{Parser, Subcommand};
use cmd::{account::PasswordSubcommand, admin::AdminSubcommand, payments::PaymentsSubcommand};
use ctx::Ctx;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "academy",
    about = "Sales academy dashboard from the terminal: curriculum, assignments, payments, admin",
    version,
    propagate_version = true
)]
struct Cli {
    /// API root, e.g. https://academy.example.com/api
    #[arg(long, global = true, env = "ACADEMY_API_URL")]
    api_url: Option<String>,

    /// State directory holding config.yaml and the session (default: ~/.academy)
    #[arg(long, global = true, env = "ACADEMY_HOME")]
    home: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ACADEMY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ACADEMY_PASSWORD", hide_env_values = true)]
        password: String,
        /// Cohort to join
        #[arg(long)]
        cohort: Option<u64>,
    },

    /// Sign out and forget the local session
    Logout,

    /// Show the signed-in user's profile
    Whoami,

    /// GET any endpoint and print the JSON body
    Get {
        /// Path relative to the API root, e.g. /cohorts
        endpoint: String,
    },

    /// List curriculum modules
    Curriculum,

    /// List assignments
    Assignments,

    /// Submit work for an assignment
    Submit {
        assignment_id: u64,
        /// Submission text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        /// Read the submission from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List attendance records
    Attendance,

    /// List earned certificates
    Certificates,

    /// Payments and checkout
    Payments {
        #[command(subcommand)]
        subcommand: PaymentsSubcommand,
    },

    /// Completion, grade average, and attendance at a glance
    Progress,

    /// Password reset
    Password {
        #[command(subcommand)]
        subcommand: PasswordSubcommand,
    },

    /// Back-office commands (admin accounts only)
    Admin {
        #[command(subcommand)]
        subcommand: AdminSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = Ctx::open(cli.home.as_deref(), cli.api_url, cli.json)
        .and_then(|ctx| dispatch(&ctx, cli.command));

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn dispatch(ctx: &Ctx, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => cmd::account::login(ctx, email, password),
        Commands::Register {
            name,
            email,
            password,
            cohort,
        } => cmd::account::register(ctx, name, email, password, cohort),
        Commands::Logout => cmd::account::logout(ctx),
        Commands::Whoami => cmd::account::whoami(ctx),
        Commands::Get { endpoint } => cmd::raw::get(ctx, &endpoint),
        Commands::Curriculum => cmd::learning::curriculum(ctx),
        Commands::Assignments => cmd::learning::assignments(ctx),
        Commands::Submit {
            assignment_id,
            content,
            file,
        } => cmd::learning::submit(ctx, assignment_id, content, file),
        Commands::Attendance => cmd::learning::attendance(ctx),
        Commands::Certificates => cmd::learning::certificates(ctx),
        Commands::Payments { subcommand } => cmd::payments::run(ctx, subcommand),
        Commands::Progress => cmd::learning::progress(ctx),
        Commands::Password { subcommand } => cmd::account::password(ctx, subcommand),
        Commands::Admin { subcommand } => cmd::admin::run(ctx, subcommand),
    }
}
