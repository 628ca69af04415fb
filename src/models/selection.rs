use serde::Serialize;
use uuid::Uuid;

use crate::services::seat_validator::{MessageLocale, SeatViolation};

/// Результат проверки выбора мест в том виде, в котором его получает UI.
///
/// Отрицательный результат: обычный ответ, а не ошибка: UI просто не
/// добавляет место и показывает `message` пользователю.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self { is_valid: true, message: None, code: None }
    }

    pub fn rejected(violation: &SeatViolation, locale: MessageLocale) -> Self {
        Self {
            is_valid: false,
            message: Some(violation.localized(locale)),
            code: Some(violation.code()),
        }
    }

    pub fn from_check(result: Result<(), SeatViolation>, locale: MessageLocale) -> Self {
        match result {
            Ok(()) => Self::valid(),
            Err(violation) => Self::rejected(&violation, locale),
        }
    }
}

/// Текущий выбор сессии в зале вместе с его проверкой.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub session_id: Uuid,
    pub room_id: i64,
    pub selected_seat_ids: Vec<String>,
    pub outcome: ValidationOutcome,
}
