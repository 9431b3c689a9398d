use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::warn;

use super::{Session, SessionOptions};
use crate::error::Result;
use crate::runtime::EngineLoader;

/// Holds the single [`Session`] of a composition root.
///
/// The first successful [`SessionCell::get_instance`] call constructs the
/// session; later calls return the same instance. Concurrent first calls
/// construct at most once. A failed construction leaves the cell empty, so
/// the next call tries again.
#[derive(Default)]
pub struct SessionCell {
    cell: OnceCell<Arc<Session>>,
}

impl SessionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_instance(
        &self,
        options: &SessionOptions,
        loader: &dyn EngineLoader,
    ) -> Result<Arc<Session>> {
        let session = self
            .cell
            .get_or_try_init(|| async {
                Session::open(options.clone(), loader)
                    .await
                    .map(Arc::new)
                    .map_err(|err| {
                        warn!("Session construction failed: {}", err);
                        err
                    })
            })
            .await?;
        Ok(session.clone())
    }

    /// The session, if one has been constructed.
    pub fn get(&self) -> Option<Arc<Session>> {
        self.cell.get().cloned()
    }
}
