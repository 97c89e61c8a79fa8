//! Property-based invariant tests for the edit-buffer view-model.
//!
//! These drive random interleavings of local edits, external model writes,
//! commits and rollbacks against a plain oracle, and verify invariants that
//! must hold after **every** step:
//!
//! 1. A field never edited locally always reads the live model value
//!    (Clean liveness).
//! 2. A locally edited field reads its last assigned value, regardless of
//!    concurrent model writes (Dirty pinning).
//! 3. The model only ever changes through its own writes or through
//!    `submit`, and `submit` writes exactly the overlay values.
//! 4. `is_dirty` is true iff at least one field is dirty; `is_field_dirty`
//!    matches the per-field oracle state.
//! 5. Reactive projections (`watch`, `watch_dirty`) always agree with their
//!    direct reads, across every Clean/Dirty flip.
//! 6. Model-cell subscribers fire exactly once per actual value change
//!    (no double-fire from commits, no fire from rollbacks or equal writes).
//! 7. `submit` and `reset` are idempotent.

use formbuffer::{Computed, Model, Subscription, ViewModel};
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

const FIELDS: [&str; 3] = ["alpha", "beta", "gamma"];

#[derive(Debug, Clone)]
enum Op {
    /// Local edit through the view-model.
    Edit(usize, i64),
    /// External write straight into the model.
    Upstream(usize, i64),
    Submit,
    Reset,
    ResetField(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..FIELDS.len(), -100i64..100).prop_map(|(i, v)| Op::Edit(i, v)),
        (0usize..FIELDS.len(), -100i64..100).prop_map(|(i, v)| Op::Upstream(i, v)),
        Just(Op::Submit),
        Just(Op::Reset),
        (0usize..FIELDS.len()).prop_map(Op::ResetField),
    ]
}

/// Plain state-machine oracle for the buffer semantics.
struct Oracle {
    model: [i64; 3],
    overlay: [Option<i64>; 3],
    /// Expected notification count per model cell.
    fires: [u32; 3],
}

impl Oracle {
    fn new(initial: [i64; 3]) -> Self {
        Self {
            model: initial,
            overlay: [None; 3],
            fires: [0; 3],
        }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Edit(i, v) => self.overlay[i] = Some(v),
            Op::Upstream(i, v) => {
                if self.model[i] != v {
                    self.model[i] = v;
                    self.fires[i] += 1;
                }
            }
            Op::Submit => {
                for i in 0..FIELDS.len() {
                    if let Some(v) = self.overlay[i].take() {
                        if self.model[i] != v {
                            self.model[i] = v;
                            self.fires[i] += 1;
                        }
                    }
                }
            }
            Op::Reset => self.overlay = [None; 3],
            Op::ResetField(i) => self.overlay[i] = None,
        }
    }

    fn visible(&self, i: usize) -> i64 {
        self.overlay[i].unwrap_or(self.model[i])
    }

    fn dirty(&self, i: usize) -> bool {
        self.overlay[i].is_some()
    }

    fn any_dirty(&self) -> bool {
        self.overlay.iter().any(Option::is_some)
    }
}

struct Harness {
    model: Model<i64>,
    vm: ViewModel<i64>,
    projections: Vec<Computed<i64>>,
    dirty_projection: Computed<bool>,
    fires: [Rc<Cell<u32>>; 3],
    _subs: Vec<Subscription>,
}

fn harness(initial: [i64; 3]) -> Harness {
    let mut model = Model::new();
    for (name, value) in FIELDS.iter().zip(initial) {
        model.insert(*name, value);
    }
    let vm = ViewModel::new(&model).expect("no reserved names in the fixture");

    let projections = FIELDS
        .iter()
        .map(|name| vm.watch(name).expect("field captured"))
        .collect();
    let dirty_projection = vm.watch_dirty();

    let fires: [Rc<Cell<u32>>; 3] = std::array::from_fn(|_| Rc::new(Cell::new(0)));
    let mut subs = Vec::new();
    for (name, counter) in FIELDS.iter().zip(&fires) {
        let cell = model.cell(name).expect("field present").clone();
        let counter = Rc::clone(counter);
        subs.push(cell.subscribe(move |_| counter.set(counter.get() + 1)));
    }

    Harness {
        model,
        vm,
        projections,
        dirty_projection,
        fires,
        _subs: subs,
    }
}

fn apply(h: &Harness, op: &Op) {
    match op {
        Op::Edit(i, v) => h.vm.set(FIELDS[*i], *v).expect("field captured"),
        Op::Upstream(i, v) => {
            assert!(h.model.set(FIELDS[*i], *v));
        }
        Op::Submit => h.vm.submit(),
        Op::Reset => h.vm.reset(),
        Op::ResetField(i) => h.vm.reset_field(FIELDS[*i]).expect("field captured"),
    }
}

fn check(h: &Harness, oracle: &Oracle) {
    for (i, name) in FIELDS.iter().enumerate() {
        assert_eq!(h.vm.get(name), Ok(oracle.visible(i)), "buffered read of {name}");
        assert_eq!(h.model.get(name), Some(oracle.model[i]), "model value of {name}");
        assert_eq!(
            h.vm.is_field_dirty(name),
            Ok(oracle.dirty(i)),
            "dirty flag of {name}"
        );
        assert_eq!(
            h.projections[i].get(),
            oracle.visible(i),
            "projection of {name}"
        );
        assert_eq!(h.fires[i].get(), oracle.fires[i], "notifications for {name}");
    }
    assert_eq!(h.vm.is_dirty(), oracle.any_dirty());
    assert_eq!(h.dirty_projection.get(), oracle.any_dirty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn buffer_matches_oracle(
        initial in proptest::array::uniform3(-100i64..100),
        ops in proptest::collection::vec(op_strategy(), 1..64),
    ) {
        let h = harness(initial);
        let mut oracle = Oracle::new(initial);

        check(&h, &oracle);
        for op in &ops {
            apply(&h, op);
            oracle.apply(op);
            check(&h, &oracle);
        }
    }

    #[test]
    fn submit_then_reset_leave_no_pending_state(
        initial in proptest::array::uniform3(-100i64..100),
        ops in proptest::collection::vec(op_strategy(), 1..32),
    ) {
        let h = harness(initial);
        let mut oracle = Oracle::new(initial);
        for op in &ops {
            apply(&h, op);
            oracle.apply(op);
        }

        h.vm.submit();
        oracle.apply(&Op::Submit);
        check(&h, &oracle);

        // Idempotence: a second submit and any number of resets change
        // nothing further.
        h.vm.submit();
        check(&h, &oracle);
        h.vm.reset();
        h.vm.reset();
        check(&h, &oracle);
        prop_assert!(!h.vm.is_dirty());
    }

    #[test]
    fn reset_restores_model_agreement(
        initial in proptest::array::uniform3(-100i64..100),
        edits in proptest::collection::vec(
            (0usize..FIELDS.len(), -100i64..100),
            1..16,
        ),
    ) {
        let h = harness(initial);
        for (i, v) in &edits {
            h.vm.set(FIELDS[*i], *v).expect("field captured");
        }

        h.vm.reset();
        for (i, name) in FIELDS.iter().enumerate() {
            prop_assert_eq!(h.vm.get(name), Ok(initial[i]));
            prop_assert_eq!(h.model.get(name), Some(initial[i]));
        }
        prop_assert!(!h.vm.is_dirty());
        // Rollback never notified the model cells.
        for counter in &h.fires {
            prop_assert_eq!(counter.get(), 0);
        }
    }
}
