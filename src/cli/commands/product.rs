//! `shelf product` command - Products, their listing order and bulk status changes

use std::borrow::Cow;

use clap::Subcommand;
use console::style;
use miette::Result;
use tracing::debug;

use crate::cli::commands::ordering::{self, MoveArgs};
use crate::cli::helpers::{
    confirm, parse_clicks, parse_price, print_confirmed, print_structured, settle, truncate_str,
    Workspace,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Status;
use crate::core::identity::{CollectionKind, EntityId};
use crate::core::query::QueryKey;
use crate::entities::product::{Product, ProductChanges, ProductDraft};

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products in listing order
    List(ListArgs),

    /// Create a new product
    New(NewArgs),

    /// Change fields of a product
    Update(UpdateArgs),

    /// Delete a product
    Delete(DeleteArgs),

    /// Move a product (or a run of them) to another row and save the order
    Move(MoveArgs),

    /// Re-send the displayed listing order
    SaveOrder,

    /// Set the status of the selected products in one batch
    SetStatus(SetStatusArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show one page (size from `page_size` in config)
    #[arg(long)]
    pub page: Option<u32>,

    /// Fetch every page and show them as one list
    #[arg(long, conflicts_with = "page")]
    pub all_pages: bool,

    /// Only show products with this status
    #[arg(long)]
    pub status: Option<Status>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Product name
    pub name: String,

    /// Stock keeping unit, unique when set
    #[arg(long, default_value = "")]
    pub sku: String,

    /// Price, e.g. 39.90
    #[arg(long, value_parser = parse_price, default_value = "0")]
    pub price: u64,

    /// Category the product is listed under
    #[arg(long)]
    pub category: Option<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Product ID
    pub id: EntityId,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New SKU
    #[arg(long)]
    pub sku: Option<String>,

    /// New price, e.g. 39.90
    #[arg(long, value_parser = parse_price)]
    pub price: Option<u64>,

    /// New status (draft, active, archived)
    #[arg(long)]
    pub status: Option<Status>,

    /// New category
    #[arg(long)]
    pub category: Option<EntityId>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Product ID
    pub id: EntityId,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetStatusArgs {
    /// Status to set (draft, active, archived)
    pub status: Status,

    /// Rows to click, 1-based; `+N` extends from the previous click, e.g. "2,+5"
    #[arg(long, required_unless_present = "all")]
    pub clicks: Option<String>,

    /// Select every product
    #[arg(long, conflicts_with = "clicks")]
    pub all: bool,
}

pub fn run(cmd: ProductCommands, global: &GlobalOpts) -> Result<()> {
    let key = QueryKey::of(CollectionKind::Product);
    match cmd {
        ProductCommands::List(args) => run_list(args, global),
        ProductCommands::New(args) => {
            let draft = ProductDraft::Create {
                name: args.name,
                sku: args.sku,
                price_cents: args.price,
                category_id: args.category,
            };
            run_draft(&key, draft, "Created", global)
        }
        ProductCommands::Update(args) => {
            let changes = ProductChanges {
                name: args.name,
                sku: args.sku,
                price_cents: args.price,
                status: args.status,
                category_id: args.category,
            };
            let draft = ProductDraft::Update {
                id: args.id,
                changes,
            };
            run_draft(&key, draft, "Updated", global)
        }
        ProductCommands::Delete(args) => {
            if !confirm(&format!("Delete product {}?", args.id), args.yes)? {
                println!("Aborted.");
                return Ok(());
            }
            run_draft(&key, ProductDraft::Delete { id: args.id }, "Deleted", global)
        }
        ProductCommands::Move(args) => ordering::run_move::<Product>(&key, args, global),
        ProductCommands::SaveOrder => ordering::run_save_order::<Product>(&key, global),
        ProductCommands::SetStatus(args) => run_set_status(&key, args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut products = ws.collection::<Product>();
    let key = match (args.page, args.all_pages) {
        (Some(page), _) => QueryKey::page(CollectionKind::Product, page.max(1)),
        (None, true) => QueryKey::page(CollectionKind::Product, 1),
        (None, false) => QueryKey::of(CollectionKind::Product),
    };
    let loaded = if args.all_pages {
        products.refresh_pages(&key).map(|pages| {
            debug!(pages, "page chain loaded");
        })
    } else {
        products.refresh(&key).map(|_| ())
    };
    settle(products.drain_notices(), loaded, global.quiet)?;

    let shown_page = if args.all_pages { None } else { key.page_number() };
    let next_page = products.store().read(&key).and_then(|e| e.next_page);
    // Row numbers are positions in the full listing so they can feed `move`
    let offset = match shown_page {
        Some(page) => (page as usize - 1)
            .checked_mul(ws.config.page_size())
            .ok_or_else(|| miette::miette!("page {} is out of range", page))?,
        None => 0,
    };
    let listing: Cow<'_, [Product]> = if args.all_pages {
        Cow::Owned(products.items_flattened(&key))
    } else {
        Cow::Borrowed(products.items(&key))
    };
    let rows: Vec<(usize, &Product)> = listing
        .iter()
        .enumerate()
        .map(|(i, p)| (offset + i + 1, p))
        .filter(|(_, p)| args.status.map_or(true, |s| p.status == s))
        .collect();

    let items: Vec<&Product> = rows.iter().map(|(_, p)| *p).collect();
    if print_structured(&items, format)? {
        return Ok(());
    }

    match format {
        OutputFormat::Id => {
            for product in &items {
                println!("{}", product.id);
            }
        }
        OutputFormat::Tsv => {
            for (row, product) in &rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    row,
                    product.id,
                    product.name,
                    product.sku,
                    product.price_display(),
                    product.status
                );
            }
        }
        _ => {
            if rows.is_empty() {
                println!("No products found.");
                return Ok(());
            }
            println!(
                "{:<4} {:<8} {:<28} {:<12} {:>10} {:<9} {}",
                style("#").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("SKU").bold(),
                style("PRICE").bold(),
                style("STATUS").bold(),
                style("CATEGORY").bold()
            );
            println!("{}", "-".repeat(84));
            for (row, product) in &rows {
                println!(
                    "{:<4} {:<8} {:<28} {:<12} {:>10} {:<9} {}",
                    style(row).dim(),
                    style(&product.id).cyan(),
                    truncate_str(&product.name, 26),
                    truncate_str(&product.sku, 12),
                    product.price_display(),
                    product.status.to_string(),
                    product.category_id.as_ref().map(EntityId::as_str).unwrap_or("-")
                );
            }
            if !global.quiet {
                println!();
                match (shown_page, next_page) {
                    (Some(page), Some(next)) => println!(
                        "Page {}. Use {} for more.",
                        style(page).cyan(),
                        style(format!("--page {}", next)).yellow()
                    ),
                    (Some(page), None) => println!("Page {} (last).", style(page).cyan()),
                    _ => println!("{} product(s) found.", style(rows.len()).cyan()),
                }
            }
        }
    }
    Ok(())
}

fn run_draft(key: &QueryKey, draft: ProductDraft, verb: &str, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut products = ws.collection::<Product>();
    let loaded = products.refresh(key);
    settle(products.drain_notices(), loaded, global.quiet)?;

    let result = products.submit_draft(key, draft);
    let confirmed = settle(products.drain_notices(), result, global.quiet)?;
    print_confirmed(&confirmed, verb, format, global.quiet)
}

fn run_set_status(key: &QueryKey, args: SetStatusArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut products = ws.collection::<Product>();
    let loaded = products.refresh(key);
    settle(products.drain_notices(), loaded, global.quiet)?;

    if args.all {
        products.select_all(key);
    } else {
        let clicks = parse_clicks(args.clicks.as_deref().unwrap_or_default())
            .map_err(|e| miette::miette!("{}", e))?;
        for click in clicks {
            products
                .toggle_selection_at(key, click.index, click.range)
                .map_err(|e| miette::miette!("{}", e))?;
        }
    }
    debug!(selected = ?products.selected_ids(key), "selection replayed");

    let status = args.status;
    let result = products.bulk_update(key, |p| p.status = status);
    let confirmed = settle(products.drain_notices(), result, global.quiet)?;
    print_confirmed(&confirmed, "Updated", format, global.quiet)
}
