//! `shelf category` command - Storefront category management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::ordering::{self, MoveArgs};
use crate::cli::helpers::{confirm, print_confirmed, print_structured, settle, truncate_str, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{CollectionKind, EntityId};
use crate::core::query::QueryKey;
use crate::entities::category::{Category, CategoryDraft};

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories in menu order
    List,

    /// Create a new category
    New(NewArgs),

    /// Rename a category
    Rename(RenameArgs),

    /// Delete a category
    Delete(DeleteArgs),

    /// Move a category (or a run of them) to another row and save the order
    Move(MoveArgs),

    /// Re-send the displayed menu order
    SaveOrder,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Category name
    pub name: String,

    /// Season the category belongs to
    #[arg(long)]
    pub season: Option<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct RenameArgs {
    /// Category ID
    pub id: EntityId,

    /// New name
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Category ID
    pub id: EntityId,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: CategoryCommands, global: &GlobalOpts) -> Result<()> {
    let key = QueryKey::of(CollectionKind::Category);
    match cmd {
        CategoryCommands::List => run_list(&key, global),
        CategoryCommands::New(args) => {
            let draft = CategoryDraft::Create {
                name: args.name,
                season_id: args.season,
            };
            run_draft(&key, draft, "Created", global)
        }
        CategoryCommands::Rename(args) => {
            let draft = CategoryDraft::Rename {
                id: args.id,
                name: args.name,
            };
            run_draft(&key, draft, "Renamed", global)
        }
        CategoryCommands::Delete(args) => {
            if !confirm(&format!("Delete category {}?", args.id), args.yes)? {
                println!("Aborted.");
                return Ok(());
            }
            run_draft(&key, CategoryDraft::Delete { id: args.id }, "Deleted", global)
        }
        CategoryCommands::Move(args) => ordering::run_move::<Category>(&key, args, global),
        CategoryCommands::SaveOrder => ordering::run_save_order::<Category>(&key, global),
    }
}

fn run_list(key: &QueryKey, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut categories = ws.collection::<Category>();
    let loaded = categories.refresh(key);
    settle(categories.drain_notices(), loaded, global.quiet)?;
    let items = categories.items(key);

    if print_structured(items, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Id => {
            for category in items {
                println!("{}", category.id);
            }
        }
        OutputFormat::Tsv => {
            for (row, category) in items.iter().enumerate() {
                println!(
                    "{}\t{}\t{}\t{}",
                    row + 1,
                    category.id,
                    category.name,
                    category.season_id.as_ref().map(EntityId::as_str).unwrap_or("")
                );
            }
        }
        _ => {
            if items.is_empty() {
                println!("No categories found.");
                return Ok(());
            }
            println!(
                "{:<4} {:<8} {:<30} {:<8} {}",
                style("#").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("SEASON").bold(),
                style("CREATED").bold()
            );
            println!("{}", "-".repeat(64));
            for (row, category) in items.iter().enumerate() {
                println!(
                    "{:<4} {:<8} {:<30} {:<8} {}",
                    style(row + 1).dim(),
                    style(&category.id).cyan(),
                    truncate_str(&category.name, 28),
                    category.season_id.as_ref().map(EntityId::as_str).unwrap_or("-"),
                    category
                        .created
                        .map(|c| c.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            if !global.quiet {
                println!();
                println!("{} category(s) found.", style(items.len()).cyan());
            }
        }
    }
    Ok(())
}

fn run_draft(key: &QueryKey, draft: CategoryDraft, verb: &str, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut categories = ws.collection::<Category>();
    let loaded = categories.refresh(key);
    settle(categories.drain_notices(), loaded, global.quiet)?;

    let result = categories.submit_draft(key, draft);
    let confirmed = settle(categories.drain_notices(), result, global.quiet)?;
    print_confirmed(&confirmed, verb, format, global.quiet)
}
