use crate::destination::DestinationResolver;
use std::sync::Arc;

pub struct AppState {
    pub resolver: Arc<DestinationResolver>,
}
