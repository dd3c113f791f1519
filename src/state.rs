use std::sync::Arc;

use crate::pool::Pool;
use crate::upload::UploadStore;

pub type AppState = Arc<State>;

/// Shared by every request: the connection pool and where uploads go.
pub struct State {
    pub pool: Arc<Pool>,
    pub uploads: UploadStore,
}

impl State {
    pub fn new(pool: Arc<Pool>, uploads: UploadStore) -> AppState {
        Arc::new(State { pool, uploads })
    }
}
