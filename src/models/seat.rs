use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Одно место в зале. `number` задаёт порядок слева направо внутри ряда.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub row: String,
    pub number: i32,
    pub is_available: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub seat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Seat {
    pub fn new(row: &str, number: i32, is_available: bool) -> Self {
        Self {
            id: format!("{}{}", row, number),
            row: row.to_string(),
            number,
            is_available,
            seat_type: None,
            price: None,
        }
    }
}
