//! Opens the checkpointer for chat/support threads.
//!
//! With feature `sqlite` threads live in `config.db_path`; without it they live
//! in process memory and end with the process.

use std::fmt::Debug;
use std::sync::Arc;

use flowgraph::Checkpointer;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RunConfig;

use super::Error;

#[cfg(feature = "sqlite")]
pub fn open_checkpointer<S>(config: &RunConfig) -> Result<Arc<dyn Checkpointer<S>>, Error>
where
    S: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static,
{
    let saver = flowgraph::SqliteSaver::new(&config.db_path, Arc::new(flowgraph::JsonSerializer))?;
    tracing::debug!(db_path = %config.db_path, "opened sqlite checkpointer");
    Ok(Arc::new(saver))
}

#[cfg(not(feature = "sqlite"))]
pub fn open_checkpointer<S>(config: &RunConfig) -> Result<Arc<dyn Checkpointer<S>>, Error>
where
    S: Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static,
{
    tracing::warn!(
        db_path = %config.db_path,
        "built without sqlite; threads are kept in memory only"
    );
    Ok(Arc::new(flowgraph::MemorySaver::new()))
}
