//! `shelf season` command - Selling seasons

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, print_confirmed, print_structured, settle, truncate_str, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{CollectionKind, EntityId};
use crate::core::query::QueryKey;
use crate::entities::season::{Season, SeasonChanges, SeasonDraft};

#[derive(Subcommand, Debug)]
pub enum SeasonCommands {
    /// List seasons
    List,

    /// Create a new season
    New(NewArgs),

    /// Change a season's name, dates or visibility
    Update(UpdateArgs),

    /// Delete a season
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Season name
    pub name: String,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub starts: NaiveDate,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub ends: NaiveDate,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Season ID
    pub id: EntityId,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New first day (YYYY-MM-DD)
    #[arg(long)]
    pub starts: Option<NaiveDate>,

    /// New last day (YYYY-MM-DD)
    #[arg(long)]
    pub ends: Option<NaiveDate>,

    /// Show or hide the season in the storefront
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Season ID
    pub id: EntityId,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: SeasonCommands, global: &GlobalOpts) -> Result<()> {
    let key = QueryKey::of(CollectionKind::Season);
    match cmd {
        SeasonCommands::List => run_list(&key, global),
        SeasonCommands::New(args) => {
            let draft = SeasonDraft::Create {
                name: args.name,
                starts_on: args.starts,
                ends_on: args.ends,
            };
            run_draft(&key, draft, "Created", global)
        }
        SeasonCommands::Update(args) => {
            let changes = SeasonChanges {
                name: args.name,
                starts_on: args.starts,
                ends_on: args.ends,
                active: args.active,
            };
            let draft = SeasonDraft::Update {
                id: args.id,
                changes,
            };
            run_draft(&key, draft, "Updated", global)
        }
        SeasonCommands::Delete(args) => {
            if !confirm(&format!("Delete season {}?", args.id), args.yes)? {
                println!("Aborted.");
                return Ok(());
            }
            run_draft(&key, SeasonDraft::Delete { id: args.id }, "Deleted", global)
        }
    }
}

fn run_list(key: &QueryKey, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut seasons = ws.collection::<Season>();
    let loaded = seasons.refresh(key);
    settle(seasons.drain_notices(), loaded, global.quiet)?;
    let items = seasons.items(key);

    if print_structured(items, format)? {
        return Ok(());
    }

    let today = Utc::now().date_naive();
    match format {
        OutputFormat::Id => {
            for season in items {
                println!("{}", season.id);
            }
        }
        OutputFormat::Tsv => {
            for season in items {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    season.id, season.name, season.starts_on, season.ends_on, season.active
                );
            }
        }
        _ => {
            if items.is_empty() {
                println!("No seasons found.");
                return Ok(());
            }
            println!(
                "{:<8} {:<24} {:<10} {:<10} {}",
                style("ID").bold(),
                style("NAME").bold(),
                style("STARTS").bold(),
                style("ENDS").bold(),
                style("SHOWN").bold()
            );
            println!("{}", "-".repeat(64));
            for season in items {
                let shown = match (season.active, season.contains(today)) {
                    (true, true) => style("yes (running)").green(),
                    (true, false) => style("yes").green(),
                    (false, _) => style("no").dim(),
                };
                println!(
                    "{:<8} {:<24} {:<10} {:<10} {}",
                    style(&season.id).cyan(),
                    truncate_str(&season.name, 22),
                    season.starts_on.to_string(),
                    season.ends_on.to_string(),
                    shown
                );
            }
        }
    }
    Ok(())
}

fn run_draft(key: &QueryKey, draft: SeasonDraft, verb: &str, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut seasons = ws.collection::<Season>();
    let loaded = seasons.refresh(key);
    settle(seasons.drain_notices(), loaded, global.quiet)?;

    let result = seasons.submit_draft(key, draft);
    let confirmed = settle(seasons.drain_notices(), result, global.quiet)?;
    print_confirmed(&confirmed, verb, format, global.quiet)
}
