pub mod layouts;
pub mod selections;

pub use layouts::CachedSeatInventory;
pub use selections::RedisSelectionStore;

pub(crate) fn room_layout_key(room_id: i64) -> String {
    format!("room:{}:seats", room_id)
}

pub(crate) fn selection_key(session_id: uuid::Uuid, room_id: i64) -> String {
    format!("selection:{}:{}", session_id, room_id)
}
