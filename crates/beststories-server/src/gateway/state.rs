use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use beststories::{BestStoriesAggregator, ItemSource};

pub struct HandlerState<S: ItemSource + 'static> {
    pub aggregator: Arc<BestStoriesAggregator<S>>,

    /// Process shutdown token; each request runs under a child of it.
    pub shutdown: CancellationToken,
}

impl<S: ItemSource + 'static> HandlerState<S> {
    pub fn new(aggregator: Arc<BestStoriesAggregator<S>>, shutdown: CancellationToken) -> Self {
        Self {
            aggregator,
            shutdown,
        }
    }
}

impl<S: ItemSource + 'static> Clone for HandlerState<S> {
    fn clone(&self) -> Self {
        Self {
            aggregator: Arc::clone(&self.aggregator),
            shutdown: self.shutdown.clone(),
        }
    }
}
