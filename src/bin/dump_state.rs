//! Print the folder universe, variables and aggregated messages as JSON.
//!
//! Usage: dump_state [--prefix DIR] [--limit PATTERN] [--index-limit PATTERN] [FOLDER...]
//!
//! Named folders (paths, or names under the prefix) are multi-selected; with
//! none given every visible folder is selected.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mailnav::app::{FolderRecord, MessageRecord};
use mailnav::{Config, Navigator};

#[derive(Serialize)]
struct Dump {
    variables: BTreeMap<String, String>,
    universe: usize,
    maildirs: Vec<FolderRecord>,
    selected: Vec<PathBuf>,
    messages: Vec<MessageRecord>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("MAILNAV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut nav = Navigator::new(Config::load());
    let mut folders = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--prefix" => {
                let prefix = args.next().context("--prefix needs a directory")?;
                nav.set_maildir_prefix(&prefix)?;
            }
            "--limit" => {
                let limit = args.next().context("--limit needs a pattern")?;
                nav.set_folder_filter(&limit);
            }
            "--index-limit" => {
                let limit = args.next().context("--index-limit needs a pattern")?;
                nav.set_index_limit(&limit);
            }
            flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
            other => folders.push(other.to_string()),
        }
    }

    if folders.is_empty() {
        let visible: Vec<PathBuf> = nav.visible_folders().map(|f| f.path().to_path_buf()).collect();
        for path in visible {
            nav.add_selected_folder(Some(path.as_path()))?;
        }
    } else {
        let prefix = nav.config().prefix_path();
        for name in folders {
            let path = PathBuf::from(&name);
            let path = if path.is_absolute() { path } else { prefix.join(path) };
            nav.add_selected_folder(Some(path.as_path()))
                .with_context(|| format!("cannot select {}", name))?;
        }
    }

    let dump = Dump {
        variables: nav.variables(),
        universe: nav.universe_len(),
        maildirs: nav.folder_records(),
        selected: nav.current_maildirs().to_vec(),
        messages: nav.message_records(),
    };
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
