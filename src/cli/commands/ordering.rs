//! Move and save-order, shared by every orderable list

use console::style;
use miette::Result;

use crate::cli::helpers::{print_structured, settle, to_index, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Entity, Ordered};
use crate::core::query::QueryKey;
use crate::core::reorder::ReorderError;

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Current row (1-based, as shown by list)
    pub from: usize,

    /// Row the item should end up at (1-based)
    pub to: usize,

    /// Move this many consecutive rows starting at FROM
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,

    /// Show the positions that would be sent without saving
    #[arg(long)]
    pub dry_run: bool,
}

/// Apply a drag and persist the resulting order
pub fn run_move<T: Ordered + 'static>(
    key: &QueryKey,
    args: MoveArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut list = ws.collection::<T>();
    let loaded = list.refresh(key);
    settle(list.drain_notices(), loaded, global.quiet)?;

    let from = to_index(args.from)?;
    let to = to_index(args.to)?;
    let moved = if args.count > 1 {
        match from.checked_add(args.count - 1) {
            Some(hi) => list.move_block(key, from, hi, to),
            None => Err(ReorderError::OutOfBounds {
                index: from,
                len: list.items(key).len(),
            }),
        }
    } else {
        list.move_item(key, from, to)
    };
    settle(list.drain_notices(), moved, global.quiet)?;

    if args.dry_run {
        let batch = list.pending_order(key);
        let batch = settle(list.drain_notices(), batch, global.quiet)?;
        if !print_structured(&batch, format)? {
            for update in &batch {
                println!("{}\t{}", update.id, update.position);
            }
        }
        return Ok(());
    }

    let saved = list.save_order(key);
    let sent = settle(list.drain_notices(), saved, global.quiet)?;
    report_saved::<T>(sent, format, global.quiet);
    Ok(())
}

/// Re-send the displayed order of a list
pub fn run_save_order<T: Ordered + 'static>(key: &QueryKey, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let format = ws.format(global);
    let mut list = ws.collection::<T>();
    let loaded = list.refresh(key);
    settle(list.drain_notices(), loaded, global.quiet)?;

    let saved = list.save_order(key);
    let sent = settle(list.drain_notices(), saved, global.quiet)?;
    report_saved::<T>(sent, format, global.quiet);
    Ok(())
}

fn report_saved<T: Entity>(sent: usize, format: OutputFormat, quiet: bool) {
    if quiet || format == OutputFormat::Id {
        return;
    }
    if sent == 0 {
        println!("{} Order already saved", style("✓").green());
    } else {
        println!(
            "{} Saved {} order ({} position(s) sent)",
            style("✓").green(),
            T::KIND.noun(),
            style(sent).cyan()
        );
    }
}
