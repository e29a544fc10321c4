use axum::{Router, routing::get};

use super::controller::{
    create_communication, delete_communication, get_communication, list_communications,
    update_communication,
};
use crate::state::AppState;

pub fn init_communications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_communications).post(create_communication))
        .route(
            "/{id}",
            get(get_communication)
                .patch(update_communication)
                .delete(delete_communication),
        )
}
