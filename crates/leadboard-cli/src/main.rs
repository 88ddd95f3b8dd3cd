mod config;
mod display;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use leadboard_core::{
    Lead, LeadEdit, LeadId, LeadQuery, Milestone, PipelineFlag, PipelineSummary, SortField,
    SortSpec, TextField, TypeFilter,
};
use leadboard_core::store::selector;
use leadboard_sync::link::{customer_from_link, share_link};
use leadboard_sync::{Dashboard, SheetClient};
use serde::Serialize;
use tracing::Level;

use config::{CONFIG_ENV, ENDPOINT_ENV, FileConfig, Settings};

#[derive(Parser)]
#[command(name = "leadboard", version, about = "Customer pipeline dashboard over a shared sheet")]
struct Cli {
    /// Config file (default: ./leadboard.toml if present)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Sheet web-app endpoint URL
    #[arg(long, global = true, env = ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List leads matching the filters
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show one lead as a card
    Show {
        /// Lead id from `list`
        #[arg(required_unless_present = "customer")]
        id: Option<LeadId>,
        /// Select by customer name instead of id
        #[arg(long, conflicts_with = "id")]
        customer: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Change a text field and save the lead
    Set {
        id: LeadId,
        /// customer, contact, manager, strategic, delivery, origin, notes, logo, linkedin, slides
        field: TextField,
        value: String,
    },
    /// Flip a pipeline flag and save the lead
    Toggle {
        id: LeadId,
        /// ppts, verbal, nda, loi-issued, loi-signed, contract, parts
        flag: PipelineFlag,
    },
    /// Milestone counts over the filtered leads
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print a share link that opens the dashboard on a lead
    Link {
        id: LeadId,
        /// Dashboard base URL
        #[arg(long)]
        base: String,
    },
    /// Show the lead a share link points at
    Open {
        url: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive text over customer, contact and manager
    #[arg(short, long, default_value = "")]
    search: String,
    /// Also search notes
    #[arg(long)]
    notes: bool,
    #[arg(long, default_value = "all")]
    origin: String,
    #[arg(long, default_value = "all")]
    manager: String,
    /// all, pim, cm or both
    #[arg(long = "type", default_value = "all")]
    lead_type: TypeFilter,
    /// Only leads that reached this milestone (intro, ppts, ..., parts)
    #[arg(long)]
    stage: Option<Milestone>,
    /// customer, origin, manager or score
    #[arg(long)]
    sort: Option<SortField>,
    #[arg(long, requires = "sort")]
    desc: bool,
}

impl FilterArgs {
    fn query(&self, search_notes: bool) -> LeadQuery {
        LeadQuery {
            search: self.search.clone(),
            search_notes: search_notes || self.notes,
            origin: selector(&self.origin),
            manager: selector(&self.manager),
            lead_type: self.lead_type,
            stage: self.stage,
            sort: self.sort.map(|field| {
                if self.desc {
                    SortSpec::descending(field)
                } else {
                    SortSpec::ascending(field)
                }
            }),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("leadboard v{}", env!("CARGO_PKG_VERSION"));

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.endpoint, file)?;
    let mut dashboard = connect(&settings)?;

    match cli.command {
        Command::List { filter, json } => {
            dashboard
                .store_mut()
                .set_query(filter.query(settings.search_notes));
            dashboard.reload().await?;
            let view = dashboard.view();
            if json {
                print_json(&view)?;
            } else {
                display::print_lead_table(&view)?;
            }
        }

        Command::Show { id, customer, json } => {
            dashboard.reload().await?;
            let lead = match (id, customer) {
                (_, Some(name)) => dashboard
                    .select_customer(&name)
                    .with_context(|| format!("no lead for customer {name:?}"))?,
                (Some(id), None) => dashboard
                    .select(id)
                    .with_context(|| format!("no lead with id {id}"))?,
                (None, None) => bail!("give a lead id or --customer"),
            };
            show(lead, json)?;
        }

        Command::Set { id, field, value } => {
            dashboard.reload().await?;
            dashboard
                .edit_and_save(id, LeadEdit::Text(field, value))
                .await?;
            show(lead_by_id(&dashboard, id)?, false)?;
        }

        Command::Toggle { id, flag } => {
            dashboard.reload().await?;
            dashboard.toggle(id, flag)?;
            dashboard.save(id).await?;
            show(lead_by_id(&dashboard, id)?, false)?;
        }

        Command::Summary { filter, json } => {
            dashboard
                .store_mut()
                .set_query(filter.query(settings.search_notes));
            dashboard.reload().await?;
            let summary = PipelineSummary::from_leads(dashboard.view());
            if json {
                print_json(&summary)?;
            } else {
                display::print_summary(&summary);
            }
        }

        Command::Link { id, base } => {
            dashboard.reload().await?;
            let lead = lead_by_id(&dashboard, id)?;
            println!("{}", share_link(&base, &lead.customer)?);
        }

        Command::Open { url, json } => {
            let name = customer_from_link(&url)?
                .with_context(|| format!("{url} does not name a customer"))?;
            dashboard.reload().await?;
            let lead = dashboard
                .select_customer(&name)
                .with_context(|| format!("no lead for customer {name:?}"))?;
            show(lead, json)?;
        }
    }

    Ok(())
}

fn connect(settings: &Settings) -> anyhow::Result<Dashboard<SheetClient>> {
    let client = match settings.timeout {
        Some(timeout) => SheetClient::with_timeout(settings.endpoint.clone(), timeout)?,
        None => SheetClient::new(settings.endpoint.clone()),
    };
    Ok(Dashboard::new(client)
        .with_save_policy(settings.save_policy)
        .with_score_policy(settings.score_policy))
}

fn lead_by_id(dashboard: &Dashboard<SheetClient>, id: LeadId) -> anyhow::Result<&Lead> {
    dashboard
        .store()
        .get(id)
        .with_context(|| format!("no lead with id {id}"))
}

fn show(lead: &Lead, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(lead)
    } else {
        display::print_lead_card(lead)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
