//! selection.rs
//!
//! Выбор мест в рамках сессии бронирования. Каждый клик по месту проходит
//! через проверку одиночных мест до того, как выбор будет сохранён.
//! Блокировка мест на стороне сервера бронирования сюда не входит.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SelectionConfig;
use crate::models::{Seat, SelectionView, ValidationOutcome};
use crate::services::inventory::{InventoryError, SeatInventory};
use crate::services::seat_validator::{validate_selection_localized, MessageLocale};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("corrupted selection payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Хранилище текущего выбора: какие места держит сессия в зале.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn get(&self, session_id: Uuid, room_id: i64) -> Result<Vec<String>, StoreError>;

    /// Пустой список равносилен `clear`.
    async fn replace(&self, session_id: Uuid, room_id: i64, seat_ids: &[String]) -> Result<(), StoreError>;

    async fn clear(&self, session_id: Uuid, room_id: i64) -> Result<(), StoreError>;

    async fn health_check(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct InMemorySelectionStore {
    selections: RwLock<HashMap<(Uuid, i64), Vec<String>>>,
}

impl InMemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SelectionStore for InMemorySelectionStore {
    async fn get(&self, session_id: Uuid, room_id: i64) -> Result<Vec<String>, StoreError> {
        Ok(self
            .selections
            .read()
            .await
            .get(&(session_id, room_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn replace(&self, session_id: Uuid, room_id: i64, seat_ids: &[String]) -> Result<(), StoreError> {
        let mut selections = self.selections.write().await;
        if seat_ids.is_empty() {
            selections.remove(&(session_id, room_id));
        } else {
            selections.insert((session_id, room_id), seat_ids.to_vec());
        }
        Ok(())
    }

    async fn clear(&self, session_id: Uuid, room_id: i64) -> Result<(), StoreError> {
        self.selections.write().await.remove(&(session_id, room_id));
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("seat {seat_id} not found in room {room_id}")]
    SeatNotFound { room_id: i64, seat_id: String },
    #[error("seat {0} is not available")]
    SeatUnavailable(String),
    #[error("at most {0} seats can be selected in one booking")]
    LimitReached(usize),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

const SELECTION_LOCK_STRIPES: usize = 64;

#[derive(Clone)]
pub struct SelectionService {
    inventory: Arc<dyn SeatInventory>,
    store: Arc<dyn SelectionStore>,
    /// Чтение-изменение-запись выбора одной пары (сессия, зал) идёт строго
    /// по очереди. Блокировки общие для всех копий сервиса в процессе.
    locks: Arc<[Mutex<()>]>,
    max_seats: usize,
    locale: MessageLocale,
}

impl SelectionService {
    pub fn new(
        inventory: Arc<dyn SeatInventory>,
        store: Arc<dyn SelectionStore>,
        settings: &SelectionConfig,
    ) -> Self {
        Self {
            inventory,
            store,
            locks: (0..SELECTION_LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            max_seats: settings.max_seats,
            locale: settings.locale,
        }
    }

    pub fn inventory(&self) -> &Arc<dyn SeatInventory> {
        &self.inventory
    }

    pub fn store(&self) -> &Arc<dyn SelectionStore> {
        &self.store
    }

    pub fn validate(&self, seats: &[Seat], selected_seat_ids: &[String]) -> ValidationOutcome {
        validate_selection_localized(seats, selected_seat_ids, self.locale)
    }

    /// Проверка произвольного выбора по актуальной схеме зала, без сохранения.
    pub async fn validate_room(
        &self,
        room_id: i64,
        selected_seat_ids: &[String],
    ) -> Result<ValidationOutcome, InventoryError> {
        let seats = self.inventory.room_layout(room_id).await?;
        Ok(self.validate(&seats, selected_seat_ids))
    }

    /// Текущий выбор сессии. Места, которых больше нет в схеме зала,
    /// выбрасываются из выбора.
    pub async fn current(&self, session_id: Uuid, room_id: i64) -> Result<SelectionView, SelectionError> {
        let seats = self.inventory.room_layout(room_id).await?;
        let _guard = self.lock_selection(session_id, room_id).await;
        let kept = self.held_in_layout(session_id, room_id, &seats).await?;

        let outcome = self.validate(&seats, &kept);
        Ok(self.view(session_id, room_id, kept, outcome))
    }

    /// Добавляет место в выбор, если после этого в ряду не остаётся
    /// одиночных мест. Отказ по правилу: обычный ответ с
    /// `is_valid == false`, выбор при этом не меняется.
    pub async fn select_seat(
        &self,
        session_id: Uuid,
        room_id: i64,
        seat_id: &str,
    ) -> Result<SelectionView, SelectionError> {
        let seats = self.inventory.room_layout(room_id).await?;
        let _guard = self.lock_selection(session_id, room_id).await;
        let mut selected = self.held_in_layout(session_id, room_id, &seats).await?;

        if selected.iter().any(|id| id == seat_id) {
            let outcome = self.validate(&seats, &selected);
            return Ok(self.view(session_id, room_id, selected, outcome));
        }

        let seat = seats
            .iter()
            .find(|seat| seat.id == seat_id)
            .ok_or_else(|| SelectionError::SeatNotFound {
                room_id,
                seat_id: seat_id.to_string(),
            })?;

        if !seat.is_available {
            return Err(SelectionError::SeatUnavailable(seat_id.to_string()));
        }
        if selected.len() >= self.max_seats {
            return Err(SelectionError::LimitReached(self.max_seats));
        }

        selected.push(seat_id.to_string());
        let outcome = self.validate(&seats, &selected);

        if !outcome.is_valid {
            selected.pop();
            info!(%session_id, room_id, seat_id, code = ?outcome.code, "Seat selection rejected");
            return Ok(self.view(session_id, room_id, selected, outcome));
        }

        self.store.replace(session_id, room_id, &selected).await?;
        info!(%session_id, room_id, seat_id, total = selected.len(), "Seat selected");
        Ok(self.view(session_id, room_id, selected, outcome))
    }

    /// Убирает место из выбора. Снятие выбора не запрещается: итог проверки
    /// оставшихся мест возвращается, чтобы UI мог предупредить пользователя.
    pub async fn release_seat(
        &self,
        session_id: Uuid,
        room_id: i64,
        seat_id: &str,
    ) -> Result<SelectionView, SelectionError> {
        let seats = self.inventory.room_layout(room_id).await?;
        let _guard = self.lock_selection(session_id, room_id).await;
        let mut selected = self.held_in_layout(session_id, room_id, &seats).await?;

        let before = selected.len();
        selected.retain(|id| id != seat_id);
        if selected.len() != before {
            self.store.replace(session_id, room_id, &selected).await?;
            info!(%session_id, room_id, seat_id, total = selected.len(), "Seat released");
        }

        let outcome = self.validate(&seats, &selected);
        Ok(self.view(session_id, room_id, selected, outcome))
    }

    pub async fn clear(&self, session_id: Uuid, room_id: i64) -> Result<(), SelectionError> {
        let _guard = self.lock_selection(session_id, room_id).await;
        self.store.clear(session_id, room_id).await?;
        info!(%session_id, room_id, "Selection cleared");
        Ok(())
    }

    async fn lock_selection(&self, session_id: Uuid, room_id: i64) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        (session_id, room_id).hash(&mut hasher);
        let stripe = (hasher.finish() % self.locks.len() as u64) as usize;
        self.locks[stripe].lock().await
    }

    /// Сохранённый выбор без мест, которых больше нет в схеме зала.
    /// Вызывается под `lock_selection`.
    async fn held_in_layout(
        &self,
        session_id: Uuid,
        room_id: i64,
        seats: &[Seat],
    ) -> Result<Vec<String>, SelectionError> {
        let held = self.store.get(session_id, room_id).await?;
        let before = held.len();
        let kept: Vec<String> = held
            .into_iter()
            .filter(|id| seats.iter().any(|seat| seat.id == *id))
            .collect();

        if kept.len() != before {
            debug!(%session_id, room_id, dropped = before - kept.len(), "Dropping seats missing from layout");
            self.store.replace(session_id, room_id, &kept).await?;
        }
        Ok(kept)
    }

    fn view(
        &self,
        session_id: Uuid,
        room_id: i64,
        selected_seat_ids: Vec<String>,
        outcome: ValidationOutcome,
    ) -> SelectionView {
        SelectionView {
            session_id,
            room_id,
            selected_seat_ids,
            outcome,
        }
    }
}
