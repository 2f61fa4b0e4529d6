//! Order planning for a survey's active questions.
//!
//! Planners are pure: they read the current slots and return the
//! reassignments to commit. Nothing is applied when planning fails.

use thiserror::Error;

use survey_spec::{Question, QuestionId};

/// Position of one active question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: QuestionId,
    pub order: u32,
}

impl Slot {
    pub fn new(id: impl Into<QuestionId>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }

    pub fn of(question: &Question) -> Self {
        Self::new(question.id.clone(), question.order)
    }
}

/// One question moving from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub id: QuestionId,
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order {position} is out of range {min}..={max}")]
    OutOfRange { position: i64, min: u32, max: u32 },
    #[error("question '{0}' is not an active question of this survey")]
    UnknownQuestion(QuestionId),
}

/// One past the highest active order, or `base` for an empty survey.
pub fn next_slot(slots: &[Slot], base: u32) -> u32 {
    slots
        .iter()
        .map(|slot| slot.order.saturating_add(1))
        .max()
        .unwrap_or(base)
        .max(base)
}

fn check_range(position: i64, min: u32, max: u32) -> Result<u32, OrderError> {
    u32::try_from(position)
        .ok()
        .filter(|position| (min..=max).contains(position))
        .ok_or(OrderError::OutOfRange { position, min, max })
}

/// Makes room at `position`: every slot at or after it moves up by one.
/// Returns the position for the new question and the shifts to apply, or
/// `OutOfRange` when a shifted slot would pass `u32::MAX`.
pub fn plan_insert(
    slots: &[Slot],
    base: u32,
    position: i64,
) -> Result<(u32, Vec<Shift>), OrderError> {
    let position = check_range(position, base, next_slot(slots, base))?;
    let shifts = slots
        .iter()
        .filter(|slot| slot.order >= position)
        .map(|slot| {
            let Some(to) = slot.order.checked_add(1) else {
                return Err(OrderError::OutOfRange {
                    position: i64::from(slot.order) + 1,
                    min: base,
                    max: u32::MAX,
                });
            };
            Ok(Shift {
                id: slot.id.clone(),
                from: slot.order,
                to,
            })
        })
        .collect::<Result<Vec<_>, OrderError>>()?;
    Ok((position, shifts))
}

/// Moves `id` to `target`, shifting the questions in between towards the
/// vacated slot. The moved question's own shift is included.
pub fn plan_move(
    slots: &[Slot],
    base: u32,
    id: &str,
    target: i64,
) -> Result<Vec<Shift>, OrderError> {
    let origin = slots
        .iter()
        .find(|slot| slot.id == id)
        .map(|slot| slot.order)
        .ok_or_else(|| OrderError::UnknownQuestion(id.to_string()))?;
    let highest = slots.iter().map(|slot| slot.order).max().unwrap_or(base);
    let target = check_range(target, base, highest.max(base))?;
    if target == origin {
        return Ok(Vec::new());
    }

    let mut shifts: Vec<Shift> = slots
        .iter()
        .filter(|slot| slot.id != id)
        .filter_map(|slot| {
            let to = if target > origin && slot.order > origin && slot.order <= target {
                slot.order - 1
            } else if target < origin && slot.order >= target && slot.order < origin {
                slot.order + 1
            } else {
                return None;
            };
            Some(Shift {
                id: slot.id.clone(),
                from: slot.order,
                to,
            })
        })
        .collect();
    shifts.push(Shift {
        id: id.to_string(),
        from: origin,
        to: target,
    });
    Ok(shifts)
}

/// Compacts the slots to `base..base + n`, keeping their relative order.
/// Only slots whose order changes are returned.
pub fn plan_normalize(slots: &[Slot], base: u32) -> Vec<Shift> {
    let mut sorted: Vec<&Slot> = slots.iter().collect();
    sorted.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    sorted
        .into_iter()
        .zip(base..)
        .filter(|(slot, to)| slot.order != *to)
        .map(|(slot, to)| Shift {
            id: slot.id.clone(),
            from: slot.order,
            to,
        })
        .collect()
}
