use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use coalition_builder::coalition::constraints::{Constraints, Exclusion, Inclusion};
use coalition_builder::coalition::enumerate::SearchBounds;
use coalition_builder::coalition::summary::{CoalitionSummary, RankBy};
use coalition_builder::config::{Config, ConfigOverrides};
use coalition_builder::output::csv::{coalitions_to_csv, parties_to_csv, polls_to_csv};
use coalition_builder::output::table::{
    render_coalitions_table, render_parties_table, render_polls_table,
};
use coalition_builder::output::{render_json, OutputFormat};
use coalition_builder::party::Party;
use coalition_builder::polls::{PollListing, AVERAGE_LABEL};
use coalition_builder::server::run_server;
use coalition_builder::session::Session;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "coalition-builder",
    about = "Explore majority coalitions from current seat polls"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long = "source-url")]
    source_url: Option<String>,
    #[arg(long)]
    positions: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Poll label, or `average` for the average of all polls.
    #[arg(short, long)]
    poll: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Polls,
    Parties,
    Coalitions {
        /// `NAME` bars a party, `A,B` bars a pair. Repeatable.
        #[arg(long)]
        exclude: Vec<Exclusion>,
        /// `A,B`: both or neither. Repeatable.
        #[arg(long)]
        include: Vec<Inclusion>,
        #[arg(long)]
        min: Option<usize>,
        #[arg(long)]
        max: Option<usize>,
        #[arg(long, default_value_t = RankBy::Compatibility)]
        sort: RankBy,
        #[arg(long)]
        top: Option<usize>,
    },
    Score {
        #[arg(value_delimiter = ',', required = true)]
        parties: Vec<String>,
    },
    Average,
    Position {
        name: String,
        #[arg(allow_negative_numbers = true)]
        economic: f64,
        #[arg(allow_negative_numbers = true)]
        social: f64,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &cli, &config_path);
    }
    let config = load_config(&cli, &config_path)?;

    if let Commands::Serve { host, port } = &cli.command {
        let host = host.as_deref().unwrap_or(&config.server.host);
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let mut session = Session::from_config(&config)?;
    let poll = cli.poll.as_deref();

    match &cli.command {
        Commands::Polls => {
            let listing = session.polls().await?.listing();
            print_polls(&listing, cli.output)?;
        }
        Commands::Parties => {
            let context = session.initialize(poll).await?;
            print_parties(context.parties(), cli.output)?;
        }
        Commands::Coalitions {
            exclude,
            include,
            min,
            max,
            sort,
            top,
        } => {
            let bounds = SearchBounds::new(
                min.unwrap_or(config.search.min_parties),
                max.unwrap_or(config.search.max_parties),
            )?;
            let constraints = build_constraints(exclude, include);
            let context = session.initialize(poll).await?;
            let mut coalitions = context.ranked_coalitions(&constraints, bounds, *sort)?;
            info!(
                "{} coalitions reach {} seats",
                coalitions.len(),
                context.majority_threshold()
            );
            if let Some(top) = top {
                coalitions.truncate(*top);
            }
            print_coalitions(&coalitions, context.majority_threshold(), cli.output)?;
        }
        Commands::Score { parties } => {
            let context = session.initialize(poll).await?;
            let summary = context.summary_of(parties)?;
            print_coalitions(&[summary], context.majority_threshold(), cli.output)?;
        }
        Commands::Average => {
            let context = session.initialize(Some(AVERAGE_LABEL)).await?;
            print_parties(context.parties(), cli.output)?;
        }
        Commands::Position {
            name,
            economic,
            social,
        } => {
            let context = session.initialize(poll).await?;
            if !context.update_party_position(name, *economic, *social)? {
                bail!("unknown party in the selected poll: {name}");
            }
            let updated = context
                .party(name)
                .cloned()
                .with_context(|| format!("party vanished after update: {name}"))?;
            print_parties(&[updated], cli.output)?;
        }
        Commands::Serve { .. } | Commands::Config { .. } => {}
    }
    Ok(())
}

fn overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        source_url: cli.source_url.clone(),
        positions_path: cli.positions.clone(),
    }
}

fn load_config(cli: &Cli, config_path: &Path) -> Result<Config> {
    let mut config = Config::load(Some(config_path))?;
    config.apply_overrides(overrides(cli));
    Ok(config)
}

fn handle_config_command(init: bool, show: bool, cli: &Cli, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        let config = load_config(cli, config_path)?;
        println!("{}", render_json(&config)?);
    }
    Ok(())
}

fn build_constraints(exclude: &[Exclusion], include: &[Inclusion]) -> Constraints {
    let constraints = exclude
        .iter()
        .cloned()
        .fold(Constraints::new(), Constraints::exclude);
    include.iter().cloned().fold(constraints, Constraints::include)
}

fn print_polls(polls: &[PollListing], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_polls_table(polls)),
        OutputFormat::Json => println!("{}", render_json(polls)?),
        OutputFormat::Csv => print!("{}", polls_to_csv(polls)?),
    }
    Ok(())
}

fn print_parties(parties: &[Party], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_parties_table(parties)),
        OutputFormat::Json => println!("{}", render_json(parties)?),
        OutputFormat::Csv => print!("{}", parties_to_csv(parties)?),
    }
    Ok(())
}

fn print_coalitions(
    coalitions: &[CoalitionSummary],
    majority_threshold: u32,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!(
            "{}",
            render_coalitions_table(coalitions, majority_threshold)
        ),
        OutputFormat::Json => println!("{}", render_json(coalitions)?),
        OutputFormat::Csv => print!("{}", coalitions_to_csv(coalitions)?),
    }
    Ok(())
}
