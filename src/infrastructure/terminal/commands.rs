use crate::application::dashboard::Dashboard;
use crate::application::services::selection::SelectAllScope;
use crate::application::snapshot::NavSelection;
use crate::domain::entities::{ListKind, TimeRange};
use thiserror::Error;
use tracing::warn;

pub const HELP: &str = "\
commands:
  page <valid|invalid> <n>        jump to page n
  next <kind> | prev <kind>       move one page
  search <kind> [term]            type into the search box (empty clears)
  select <kind> <key>             toggle one key
  select-all <kind> [page|all]    toggle every key on the page or matching the search
  delete <key>                    delete one key
  delete-selected <kind>          delete the selection of a list
  verify <key>                    re-validate one key
  copy <key>                      copy a key to the clipboard
  range <1h|8h|24h>               trend chart range
  attention <status code>         filter the noteworthy list
  refresh                         refresh everything
  nav <config|logs>               leave the dashboard
  quit";

/// One line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Page(ListKind, u32),
    Next(ListKind),
    Prev(ListKind),
    Search(ListKind, String),
    Select(ListKind, String),
    SelectAll(ListKind, SelectAllScope),
    Delete(String),
    DeleteSelected(ListKind),
    Verify(String),
    Copy(String),
    Range(TimeRange),
    Attention(u16),
    Refresh,
    Nav(NavSelection),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

/// What the input loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim_start();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest),
        None => (line.trim_end(), ""),
    };
    if name.is_empty() {
        return Ok(None);
    }

    let mut args = rest.split_whitespace();
    let command = match name {
        "page" => {
            let kind = kind_arg(args.next())?;
            let page = args
                .next()
                .ok_or(CommandError::MissingArgument("page number"))?
                .parse()
                .map_err(|_| CommandError::InvalidArgument("page must be a positive number".to_string()))?;
            Command::Page(kind, page)
        }
        "next" => Command::Next(kind_arg(args.next())?),
        "prev" => Command::Prev(kind_arg(args.next())?),
        "search" => {
            let rest = rest.trim_start();
            let (kind, term) = match rest.split_once(char::is_whitespace) {
                Some((kind, term)) => (kind, term.trim()),
                None => (rest.trim_end(), ""),
            };
            Command::Search(kind_arg(Some(kind).filter(|k| !k.is_empty()))?, term.to_string())
        }
        "select" => {
            let kind = kind_arg(args.next())?;
            Command::Select(kind, key_arg(args.next())?)
        }
        "select-all" => {
            let kind = kind_arg(args.next())?;
            let scope = match args.next() {
                None | Some("page") => SelectAllScope::Page,
                Some("all") => SelectAllScope::AllMatching,
                Some(other) => {
                    return Err(CommandError::InvalidArgument(format!("unknown scope: {}", other)))
                }
            };
            Command::SelectAll(kind, scope)
        }
        "delete" => Command::Delete(key_arg(args.next())?),
        "delete-selected" => Command::DeleteSelected(kind_arg(args.next())?),
        "verify" => Command::Verify(key_arg(args.next())?),
        "copy" => Command::Copy(key_arg(args.next())?),
        "range" => Command::Range(
            args.next()
                .ok_or(CommandError::MissingArgument("range"))?
                .parse()
                .map_err(CommandError::InvalidArgument)?,
        ),
        "attention" => Command::Attention(
            args.next()
                .ok_or(CommandError::MissingArgument("status code"))?
                .parse()
                .map_err(|_| CommandError::InvalidArgument("status code must be a number".to_string()))?,
        ),
        "refresh" => Command::Refresh,
        "nav" => Command::Nav(
            args.next()
                .ok_or(CommandError::MissingArgument("destination"))?
                .parse()
                .map_err(CommandError::InvalidArgument)?,
        ),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn kind_arg(arg: Option<&str>) -> Result<ListKind, CommandError> {
    arg.ok_or(CommandError::MissingArgument("list (valid|invalid)"))?
        .parse()
        .map_err(CommandError::InvalidArgument)
}

fn key_arg(arg: Option<&str>) -> Result<String, CommandError> {
    arg.map(str::to_string).ok_or(CommandError::MissingArgument("key"))
}

/// Apply one command. Failures are already reflected in the snapshot notice;
/// they are only logged here.
pub async fn execute(dashboard: &Dashboard, command: Command) -> Flow {
    match command {
        Command::Page(kind, page) => {
            dashboard.set_page(kind, page);
        }
        Command::Next(kind) => {
            dashboard.next_page(kind);
        }
        Command::Prev(kind) => {
            dashboard.prev_page(kind);
        }
        Command::Search(kind, term) => dashboard.set_search(kind, &term),
        Command::Select(kind, key) => {
            dashboard.toggle_selection(kind, &key);
        }
        Command::SelectAll(kind, scope) => {
            if let Err(e) = dashboard.toggle_select_all(kind, scope).await {
                warn!("Select all {} keys failed: {}", kind, e);
            }
        }
        Command::Delete(key) => {
            if let Err(e) = dashboard.remove(&key).await {
                warn!("Delete failed: {}", e);
            }
        }
        Command::DeleteSelected(kind) => {
            if let Err(e) = dashboard.remove_selected(kind).await {
                warn!("Batch delete failed: {}", e);
            }
        }
        Command::Verify(key) => {
            if let Err(e) = dashboard.verify(&key).await {
                warn!("Verify failed: {}", e);
            }
        }
        Command::Copy(key) => {
            let _ = dashboard.copy(&key).await;
        }
        Command::Range(range) => {
            dashboard.set_time_range(range);
        }
        Command::Attention(code) => {
            dashboard.set_noteworthy_status(code);
        }
        Command::Refresh => dashboard.refresh(),
        Command::Nav(selection) => {
            dashboard.navigate(selection);
            if selection != NavSelection::Dashboard {
                return Flow::Quit;
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}
