mod migrate;
mod migrations;
mod store;

pub use migrate::upgrade_snapshot_value;
pub use store::{HelmStore, SNAPSHOT_KEY, StoreError};
