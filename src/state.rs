use crate::blockchain::IncrementalIndexer;
use crate::traits::CursorStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub store: Arc<dyn CursorStore>,
    pub indexer: Arc<IncrementalIndexer>,
    pub shutdown: CancellationToken,
}
