//! seat_validator.rs
//!
//! Проверка выбора мест по правилу «без одиночных пустых мест».
//!
//! Зал разбивается на ряды, и проверяются только ряды, в которых пользователь
//! выбрал хотя бы одно место. Для каждого выбранного места смотрим на соседей
//! на расстоянии 1 и 2 с обеих сторон:
//!
//! - `ВЫБРАНО-СВОБОДНО-ВЫБРАНО` запрещено всегда;
//! - `ВЫБРАНО-СВОБОДНО-ЗАНЯТО` допускается один раз на ряд;
//! - `ВЫБРАНО-СВОБОДНО-СВОБОДНО` означает, что в ряду было место сдвинуть выбор,
//!   и тогда даже одно одиночное место уже не допускается.
//!
//! Позиции за пределами ряда считаются занятыми. Функция чистая: без I/O и
//! без общего состояния, её можно вызывать на каждый клик.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::models::{Seat, ValidationOutcome};

/// Язык сообщений, которые UI показывает пользователю.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLocale {
    #[default]
    En,
    Vi,
}

/// Причина отказа, привязанная к конкретному ряду.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatViolation {
    /// Одно пустое место между двумя выбранными.
    #[error("a single empty seat cannot be left between two selected seats in row {row}")]
    GapBetweenSelections { row: String },
    /// Два и больше одиночных мест между выбранным и занятым.
    #[error("this selection creates multiple isolated seats in row {row}")]
    MultipleOrphans { row: String },
    /// Одиночное место там, где рядом был промежуток хотя бы в два места.
    #[error("this selection leaves an isolated seat in row {row} while a larger gap was available")]
    AvoidableOrphan { row: String },
}

impl SeatViolation {
    /// Машиночитаемый код для клиента.
    pub fn code(&self) -> &'static str {
        match self {
            SeatViolation::GapBetweenSelections { .. } => "GAP_BETWEEN_SELECTIONS",
            SeatViolation::MultipleOrphans { .. } => "MULTIPLE_ORPHANS",
            SeatViolation::AvoidableOrphan { .. } => "AVOIDABLE_ORPHAN",
        }
    }

    pub fn localized(&self, locale: MessageLocale) -> String {
        match locale {
            MessageLocale::En => self.to_string(),
            MessageLocale::Vi => match self {
                SeatViolation::GapBetweenSelections { row } => {
                    format!("Không được để trống một ghế ở giữa hai ghế đã chọn tại hàng {}", row)
                }
                SeatViolation::MultipleOrphans { row } => {
                    format!("Lựa chọn này tạo ra nhiều ghế trống lẻ tại hàng {}", row)
                }
                SeatViolation::AvoidableOrphan { row } => {
                    format!("Không được để trống một ghế lẻ tại hàng {} khi vẫn còn khoảng trống lớn hơn", row)
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeatStatus {
    Available,
    Blocked,
    Selected,
}

impl SeatStatus {
    // Выбор пользователя важнее флага доступности: после блокировки на сервере
    // свои места приходят в снимке зала как недоступные.
    fn of(seat: &Seat, selected: &HashSet<&str>) -> Self {
        if selected.contains(seat.id.as_str()) {
            SeatStatus::Selected
        } else if seat.is_available {
            SeatStatus::Available
        } else {
            SeatStatus::Blocked
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn offset(self, index: usize, distance: usize) -> Option<usize> {
        match self {
            Side::Left => index.checked_sub(distance),
            Side::Right => index.checked_add(distance),
        }
    }
}

#[derive(Debug, Default)]
struct RowTally {
    left_sandwiches: u32,
    right_sandwiches: u32,
    safe_gaps: u32,
}

impl RowTally {
    fn record_sandwich(&mut self, side: Side) {
        match side {
            Side::Left => self.left_sandwiches += 1,
            Side::Right => self.right_sandwiches += 1,
        }
    }

    fn sandwiches(&self) -> u32 {
        self.left_sandwiches + self.right_sandwiches
    }

    fn verdict(&self, row: &str) -> Result<(), SeatViolation> {
        if self.sandwiches() >= 2 {
            return Err(SeatViolation::MultipleOrphans { row: row.to_string() });
        }
        if self.safe_gaps > 0 && (self.left_sandwiches > 0 || self.right_sandwiches > 0) {
            return Err(SeatViolation::AvoidableOrphan { row: row.to_string() });
        }
        Ok(())
    }
}

fn status_at(statuses: &[SeatStatus], index: Option<usize>) -> SeatStatus {
    index
        .and_then(|i| statuses.get(i))
        .copied()
        .unwrap_or(SeatStatus::Blocked)
}

fn check_row(row: &str, statuses: &[SeatStatus]) -> Result<(), SeatViolation> {
    let mut tally = RowTally::default();

    for (index, status) in statuses.iter().enumerate() {
        if *status != SeatStatus::Selected {
            continue;
        }

        for side in [Side::Left, Side::Right] {
            if status_at(statuses, side.offset(index, 1)) != SeatStatus::Available {
                continue;
            }
            match status_at(statuses, side.offset(index, 2)) {
                SeatStatus::Selected => {
                    return Err(SeatViolation::GapBetweenSelections { row: row.to_string() });
                }
                SeatStatus::Blocked => tally.record_sandwich(side),
                SeatStatus::Available => tally.safe_gaps += 1,
            }
        }
    }

    tally.verdict(row)
}

/// Проверяет выбор мест `selected_seat_ids` в зале `seats`.
///
/// Ряды проверяются в порядке их меток, и возвращается первое нарушение.
/// Неизвестные id игнорируются: они не попадают ни в один ряд. При повторе
/// id в схеме зала учитывается первое вхождение.
pub fn check_selection<S: AsRef<str>>(
    seats: &[Seat],
    selected_seat_ids: &[S],
) -> Result<(), SeatViolation> {
    if selected_seat_ids.is_empty() {
        return Ok(());
    }

    let selected: HashSet<&str> = selected_seat_ids.iter().map(|id| id.as_ref()).collect();

    let mut seen = HashSet::with_capacity(seats.len());
    let mut rows: BTreeMap<&str, Vec<&Seat>> = BTreeMap::new();
    for seat in seats {
        if seen.insert(seat.id.as_str()) {
            rows.entry(seat.row.as_str()).or_default().push(seat);
        }
    }

    for (row, mut row_seats) in rows {
        if !row_seats.iter().any(|seat| selected.contains(seat.id.as_str())) {
            continue;
        }

        row_seats.sort_by_key(|seat| seat.number);
        let statuses: Vec<SeatStatus> = row_seats
            .iter()
            .map(|seat| SeatStatus::of(seat, &selected))
            .collect();

        check_row(row, &statuses)?;
    }

    Ok(())
}

pub fn validate_selection<S: AsRef<str>>(seats: &[Seat], selected_seat_ids: &[S]) -> ValidationOutcome {
    validate_selection_localized(seats, selected_seat_ids, MessageLocale::default())
}

pub fn validate_selection_localized<S: AsRef<str>>(
    seats: &[Seat],
    selected_seat_ids: &[S],
    locale: MessageLocale,
) -> ValidationOutcome {
    ValidationOutcome::from_check(check_selection(seats, selected_seat_ids), locale)
}
