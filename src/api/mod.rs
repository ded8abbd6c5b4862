pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::{filter::QueryResolver, store::TicketStore};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TicketStore>,
    pub resolver: Arc<QueryResolver>,
}

impl AppState {
    pub fn new(store: Arc<TicketStore>, resolver: Arc<QueryResolver>) -> Self {
        Self { store, resolver }
    }
}
