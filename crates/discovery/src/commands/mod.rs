pub mod init;
pub mod search;
pub mod seed;
pub mod stats;
pub mod suggest;
pub mod topics;
pub mod users;
pub mod version;

use discovery::{Discovery, Paths};
use serde::Serialize;
use std::path::Path;

/// Engine over the resolved data directory
pub(crate) fn open(config: Option<&Path>) -> anyhow::Result<Discovery> {
    let paths = Paths::new()?;
    let config = paths.load_config(config)?;
    Discovery::open(&paths, config)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
