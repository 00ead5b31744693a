//! Structural invariants that must survive any sequence of actions:
//! manual marks stay inside the selection, the order stays a permutation of
//! the selection, and the cursor stays inside the playable range.

use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use std::collections::BTreeSet;
use tsukuyomi_game::{AlwaysConfirm, DrillController, MemoryStore, Session};

fn assert_invariants(session: &Session) {
    assert!(
        session.manual().is_subset(session.selected()),
        "manual additions must be a subset of the selection"
    );

    let order_set: BTreeSet<u8> = session.order().iter().copied().collect();
    assert_eq!(
        order_set.len(),
        session.order().len(),
        "order must not contain duplicates"
    );
    assert_eq!(
        &order_set,
        session.selected(),
        "order must be a permutation of the selection"
    );

    assert_eq!(session.playable_count(), session.order().len() + 3);
    assert!(session.current_index() <= session.last_playable_index());
    assert!(!session.selected().is_empty());
}

#[test]
fn invariants_hold_under_random_action_sequences() {
    let mut driver = SmallRng::seed_from_u64(0x5E55_10);
    let mut ctl = DrillController::with_seed(MemoryStore::new(), 0x5E55_11);
    assert_invariants(ctl.session());

    for _ in 0..500 {
        match driver.gen_range(0..6) {
            0 | 1 => {
                ctl.advance();
            }
            2 => {
                ctl.retreat();
            }
            3 => {
                ctl.reshuffle(&AlwaysConfirm);
            }
            4 => {
                // edit: drop one card, add one via top-up
                ctl.open_editor();
                let victim = driver.gen_range(1..=100);
                ctl.toggle_card(victim).unwrap();
                let _ = ctl.top_up(1);
                if ctl.draft().is_some_and(|d| !d.selected().is_empty()) {
                    ctl.commit_draft(&AlwaysConfirm).unwrap();
                } else {
                    ctl.cancel_draft();
                }
            }
            _ => {
                ctl.open_editor();
                ctl.cancel_draft();
            }
        }
        assert_invariants(ctl.session());
    }
}

#[test]
fn cursor_never_escapes_bounds_at_the_edges() {
    let mut ctl = DrillController::with_seed(MemoryStore::new(), 9);
    ctl.open_editor();
    ctl.select_none().unwrap();
    ctl.toggle_card(1).unwrap();
    ctl.toggle_card(2).unwrap();
    ctl.commit_draft(&AlwaysConfirm).unwrap();

    for _ in 0..20 {
        ctl.retreat();
    }
    assert_eq!(ctl.session().current_index(), 0);
    for _ in 0..20 {
        ctl.advance();
    }
    assert_eq!(
        ctl.session().current_index(),
        ctl.session().last_playable_index()
    );
    ctl.reshuffle(&AlwaysConfirm);
    assert_eq!(ctl.session().current_index(), 0);
    assert_invariants(ctl.session());
}

#[test]
fn reshuffle_preserves_the_selection_multiset() {
    let mut ctl = DrillController::with_seed(MemoryStore::new(), 0xCAFE);
    let before: BTreeSet<u8> = ctl.session().order().iter().copied().collect();
    for _ in 0..10 {
        ctl.reshuffle(&AlwaysConfirm);
        let after: BTreeSet<u8> = ctl.session().order().iter().copied().collect();
        assert_eq!(before, after);
        assert_invariants(ctl.session());
    }
}
