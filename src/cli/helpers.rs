//! Shared helper functions for CLI commands

use std::rc::Rc;

use clap::ValueEnum;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::Collection;
use crate::core::config::Config;
use crate::core::entity::Entity;
use crate::core::identity::CollectionKind;
use crate::core::mutation::Confirmed;
use crate::core::notice::{Notice, NoticeAction, NoticeKind};
use crate::core::project::Project;
use crate::service::FileService;

/// An opened project with its merged configuration
pub struct Workspace {
    pub project: Project,
    pub config: Config,
}

impl Workspace {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = match &global.project {
            Some(path) => Project::discover_from(path),
            None => Project::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;
        let config = Config::load(Some(&project));
        Ok(Self { project, config })
    }

    /// A collection facade over the project's data files
    pub fn collection<T: Entity + 'static>(&self) -> Collection<T, FileService<T>> {
        let api = FileService::new(&self.project.data_dir()).with_page_size(self.config.page_size());
        Collection::new(Rc::new(api))
            .with_stale_after(self.config.stale_after())
            .with_policy(self.config.reorder_policy())
            .with_refresh_on_commit(self.config.refresh_on_commit())
    }

    /// `--format`, falling back to `default_format` from config when left on auto
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        if global.format != OutputFormat::Auto {
            return global.format;
        }
        self.config
            .default_format
            .as_deref()
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }
}

/// Print pending notices to stderr
pub fn print_notices(notices: Vec<Notice>, quiet: bool) {
    for notice in notices {
        if quiet && notice.kind != NoticeKind::Error {
            continue;
        }
        let marker = match notice.kind {
            NoticeKind::Info => style("i").cyan(),
            NoticeKind::Warn => style("!").yellow(),
            NoticeKind::Error => style("✗").red(),
        };
        match &notice.body {
            Some(body) => eprintln!("{} {}: {}", marker, notice.title, style(body).dim()),
            None => eprintln!("{} {}", marker, notice.title),
        }
        print_hint(&notice);
    }
}

/// Print the follow-up a notice offers, if any
fn print_hint(notice: &Notice) {
    if let Some(NoticeAction::SaveOrder(key)) = &notice.action {
        let noun = key
            .collection()
            .parse::<CollectionKind>()
            .map(|k| k.noun())
            .unwrap_or("category");
        eprintln!(
            "  Run {} to try again",
            style(format!("shelf {} save-order", noun)).yellow()
        );
    }
}

/// Print the notices a command raised and turn its error into a diagnostic
///
/// On failure the error already carries the message, so only follow-up hints are shown.
pub fn settle<V, E: std::fmt::Display>(
    notices: Vec<Notice>,
    result: Result<V, E>,
    quiet: bool,
) -> Result<V> {
    match result {
        Ok(value) => {
            print_notices(notices, quiet);
            Ok(value)
        }
        Err(e) => {
            notices.iter().for_each(print_hint);
            Err(miette::miette!("{}", e))
        }
    }
}

/// Print a JSON or YAML rendering; returns false for the line formats
pub fn print_structured<S: Serialize + ?Sized>(value: &S, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Report a confirmed change in the requested format
pub fn print_confirmed<T: Entity>(
    confirmed: &Confirmed<T>,
    verb: &str,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let entities: Vec<&T> = match confirmed {
        Confirmed::Entity(entity) => vec![entity],
        Confirmed::Entities(entities) => entities.iter().collect(),
        Confirmed::Removed(id) => {
            match format {
                OutputFormat::Id => println!("{}", id),
                _ if quiet => {}
                _ => println!("{} {} {} {}", style("✓").green(), verb, T::KIND.noun(), style(id).cyan()),
            }
            return Ok(());
        }
        Confirmed::Accepted => return Ok(()),
    };

    if print_structured(&entities, format)? {
        return Ok(());
    }
    for entity in entities {
        match format {
            OutputFormat::Id => println!("{}", entity.id()),
            _ if quiet => {}
            _ => println!(
                "{} {} {} {} ({})",
                style("✓").green(),
                verb,
                T::KIND.noun(),
                style(entity.id()).cyan(),
                entity.label()
            ),
        }
    }
    Ok(())
}

/// Ask before a destructive step unless `assume_yes`
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Convert a 1-based list position from the command line
pub fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| miette::miette!("positions start at 1"))
}

/// Parse a price such as `12`, `12.5` or `12.50` into cents
pub fn parse_price(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() || frac.len() > 2 {
        return Err(format!("invalid price '{}': use units with up to two decimals", s));
    }
    let units: u64 = whole
        .parse()
        .map_err(|_| format!("invalid price '{}'", s))?;
    let cents: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().map_err(|_| format!("invalid price '{}'", s))? * 10,
        _ => frac.parse().map_err(|_| format!("invalid price '{}'", s))?,
    };
    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(cents))
        .ok_or_else(|| format!("price '{}' is too large", s))
}

/// One replayed list click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Click {
    /// 0-based display index
    pub index: usize,
    /// Range modifier held
    pub range: bool,
}

/// Parse `--clicks "2,+5"`: a number toggles one row, `+N` toggles a range
pub fn parse_clicks(s: &str) -> Result<Vec<Click>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (range, digits) = match part.strip_prefix('+') {
                Some(rest) => (true, rest),
                None => (false, part),
            };
            let position: usize = digits
                .parse()
                .map_err(|_| format!("invalid click '{}'", part))?;
            if position == 0 {
                return Err(format!("invalid click '{}': rows start at 1", part));
            }
            Ok(Click {
                index: position - 1,
                range,
            })
        })
        .collect()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
