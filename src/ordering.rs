//! Dense ordering of sibling records.
//!
//! Sections within a quiz, questions within a section: every sibling
//! group keeps contiguous order numbers starting at 1. The engine is
//! pure; it computes the position assignments and repositories apply
//! them as UPDATEs inside the caller's transaction. Callers are expected
//! not to pass conflicting positions, and no isolation beyond the
//! enclosing transaction is provided.

/// One sibling of an ordered group. Items freshly created have no
/// position yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sibling {
    pub id: i64,
    pub order_number: Option<i32>,
}

/// A position to persist for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub id: i64,
    pub order_number: i32,
}

/// Position for the next appended sibling: `max(existing) + 1`.
pub fn next_order_number(siblings: &[Sibling]) -> i32 {
    siblings
        .iter()
        .filter_map(|s| s.order_number)
        .max()
        .unwrap_or(0)
        + 1
}

/// Move `item_id` to `new`, shifting the siblings in between.
///
/// With `new` omitted the item is appended after the current maximum.
/// An item without a current position takes `new` while every other
/// sibling at `new` or above is pulled down by one; this pushes the tail
/// down instead of opening a gap, which is the specified behavior even
/// though it reads inverted from conventional insert semantics.
/// Moving to the current position is a no-op.
pub fn set_order(siblings: &[Sibling], item_id: i64, new: Option<i32>) -> Vec<Assignment> {
    let original = siblings
        .iter()
        .find(|s| s.id == item_id)
        .and_then(|s| s.order_number);

    let mut updates = Vec::new();

    let Some(new) = new else {
        updates.push(Assignment {
            id: item_id,
            order_number: next_order_number(siblings),
        });
        return updates;
    };

    match original {
        None => {
            shift(&mut updates, siblings, item_id, |n| n >= new, -1);
            updates.push(Assignment {
                id: item_id,
                order_number: new,
            });
        }
        Some(original) if original < new => {
            shift(&mut updates, siblings, item_id, |n| n > original && n <= new, -1);
            updates.push(Assignment {
                id: item_id,
                order_number: new,
            });
        }
        Some(original) if original > new => {
            shift(&mut updates, siblings, item_id, |n| n >= new && n < original, 1);
            updates.push(Assignment {
                id: item_id,
                order_number: new,
            });
        }
        Some(_) => {}
    }

    updates
}

fn shift(
    updates: &mut Vec<Assignment>,
    siblings: &[Sibling],
    item_id: i64,
    keep: impl Fn(i32) -> bool,
    delta: i32,
) {
    for sibling in siblings.iter().filter(|s| s.id != item_id) {
        if let Some(n) = sibling.order_number {
            if keep(n) {
                updates.push(Assignment {
                    id: sibling.id,
                    order_number: n + delta,
                });
            }
        }
    }
}

/// Close the gap left by a deleted sibling: every position above the
/// removed one moves down by one.
pub fn close_gap(siblings: &[Sibling], removed: i32) -> Vec<Assignment> {
    siblings
        .iter()
        .filter_map(|s| {
            s.order_number.filter(|n| *n > removed).map(|n| Assignment {
                id: s.id,
                order_number: n - 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(positions: &[(i64, Option<i32>)]) -> Vec<Sibling> {
        positions
            .iter()
            .map(|&(id, order_number)| Sibling { id, order_number })
            .collect()
    }

    fn apply(siblings: &mut Vec<Sibling>, updates: &[Assignment]) {
        for update in updates {
            let sibling = siblings
                .iter_mut()
                .find(|s| s.id == update.id)
                .expect("assignment for unknown sibling");
            sibling.order_number = Some(update.order_number);
        }
    }

    fn positions(siblings: &[Sibling]) -> Vec<i32> {
        let mut numbers: Vec<i32> = siblings.iter().filter_map(|s| s.order_number).collect();
        numbers.sort_unstable();
        numbers
    }

    #[test]
    fn next_order_number_starts_at_one() {
        assert_eq!(next_order_number(&[]), 1);
        assert_eq!(next_order_number(&group(&[(1, Some(1)), (2, Some(2))])), 3);
        assert_eq!(next_order_number(&group(&[(1, None)])), 1);
    }

    #[test]
    fn append_goes_after_the_maximum() {
        let siblings = group(&[(1, Some(1)), (2, Some(2)), (3, None)]);
        let updates = set_order(&siblings, 3, None);
        assert_eq!(
            updates,
            vec![Assignment {
                id: 3,
                order_number: 3
            }]
        );
    }

    #[test]
    fn move_down_pulls_the_range_between() {
        let mut siblings = group(&[
            (1, Some(1)),
            (2, Some(2)),
            (3, Some(3)),
            (4, Some(4)),
            (5, Some(5)),
        ]);
        let updates = set_order(&siblings, 1, Some(3));
        apply(&mut siblings, &updates);

        assert_eq!(positions(&siblings), vec![1, 2, 3, 4, 5]);
        assert_eq!(siblings[0].order_number, Some(3));
        assert_eq!(siblings[1].order_number, Some(1));
        assert_eq!(siblings[2].order_number, Some(2));
        assert_eq!(siblings[3].order_number, Some(4));
    }

    #[test]
    fn move_up_pushes_the_range_between() {
        let mut siblings = group(&[(1, Some(1)), (2, Some(2)), (3, Some(3)), (4, Some(4))]);
        let updates = set_order(&siblings, 4, Some(2));
        apply(&mut siblings, &updates);

        assert_eq!(positions(&siblings), vec![1, 2, 3, 4]);
        assert_eq!(siblings[3].order_number, Some(2));
        assert_eq!(siblings[1].order_number, Some(3));
        assert_eq!(siblings[2].order_number, Some(4));
        assert_eq!(siblings[0].order_number, Some(1));
    }

    #[test]
    fn move_to_own_position_is_a_noop() {
        let siblings = group(&[(1, Some(1)), (2, Some(2)), (3, Some(3))]);
        assert!(set_order(&siblings, 2, Some(2)).is_empty());
    }

    #[test]
    fn insert_pushes_the_tail_down() {
        let siblings = group(&[(1, Some(1)), (2, Some(2)), (3, Some(3)), (9, None)]);
        let mut updates = set_order(&siblings, 9, Some(2));
        updates.sort_by_key(|u| u.id);

        assert_eq!(
            updates,
            vec![
                Assignment {
                    id: 2,
                    order_number: 1
                },
                Assignment {
                    id: 3,
                    order_number: 2
                },
                Assignment {
                    id: 9,
                    order_number: 2
                },
            ]
        );
    }

    #[test]
    fn close_gap_shifts_everything_above() {
        let mut siblings = group(&[(1, Some(1)), (3, Some(3)), (4, Some(4))]);
        let updates = close_gap(&siblings, 2);
        apply(&mut siblings, &updates);

        assert_eq!(positions(&siblings), vec![1, 2, 3]);
    }

    #[test]
    fn append_move_delete_sequence_keeps_positions_dense() {
        let mut siblings: Vec<Sibling> = Vec::new();

        for id in 1..=6 {
            siblings.push(Sibling {
                id,
                order_number: None,
            });
            let updates = set_order(&siblings, id, None);
            apply(&mut siblings, &updates);
        }
        assert_eq!(positions(&siblings), vec![1, 2, 3, 4, 5, 6]);

        for (id, target) in [(1, 4), (6, 1), (3, 3), (2, 6)] {
            let updates = set_order(&siblings, id, Some(target));
            apply(&mut siblings, &updates);
            assert_eq!(positions(&siblings), vec![1, 2, 3, 4, 5, 6]);
        }

        let removed = siblings.remove(3);
        let updates = close_gap(&siblings, removed.order_number.unwrap());
        apply(&mut siblings, &updates);
        assert_eq!(positions(&siblings), vec![1, 2, 3, 4, 5]);
    }
}
