use super::common::*;
use crate::ranking::{ConstantScorer, RankingError, ScorerError};

#[test]
fn handles_track_scorers_through_moves() {
    let engine = engine();
    let a = engine.add_scorer(ConstantScorer::new("a", 1.0));
    let b = engine.add_scorer(ConstantScorer::new("b", 1.0));
    let c = engine.add_scorer(ConstantScorer::new("c", 1.0));

    engine.move_scorer_to(c, 0).expect("move to front");
    assert_eq!(engine.scorer_handles(), vec![c, a, b]);

    engine.move_scorer_to(c, 2).expect("move to back");
    assert_eq!(engine.scorer_handles(), vec![a, b, c]);

    engine.move_scorer_to(b, 1).expect("move in place");
    assert_eq!(engine.scorer_at(1), Some(b));
    assert_eq!(engine.scorer_at(3), None);
    assert_eq!(engine.scorer_name(c).as_deref(), Some("c"));
}

#[test]
fn move_rejects_unknown_handles_and_out_of_range_indices() {
    let engine = engine();
    let a = engine.add_scorer(ConstantScorer::new("a", 1.0));
    engine.add_scorer(ConstantScorer::new("b", 1.0));

    let err = engine.move_scorer_to(a, 2).expect_err("index past the end");
    assert!(matches!(
        err,
        RankingError::IndexOutOfRange { index: 2, len: 2 }
    ));

    engine.remove_scorer(a).expect("remove succeeds");
    let err = engine.move_scorer_to(a, 0).expect_err("removed handle");
    assert!(matches!(err, RankingError::ScorerNotFound(handle) if handle == a));
}

#[test]
fn remove_by_index_and_by_handle() {
    let engine = engine();
    let a = engine.add_scorer(ConstantScorer::new("a", 1.0));
    let b = engine.add_scorer(ConstantScorer::new("b", 1.0));
    let c = engine.add_scorer(ConstantScorer::new("c", 1.0));

    engine.remove_scorer_at(1).expect("remove middle");
    assert_eq!(engine.scorer_handles(), vec![a, c]);
    assert!(matches!(
        engine.remove_scorer(b),
        Err(RankingError::ScorerNotFound(_))
    ));
    assert!(matches!(
        engine.remove_scorer_at(2),
        Err(RankingError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(
        engine.set_scorer_enabled(b, false),
        Err(RankingError::ScorerNotFound(_))
    ));
    assert!(engine.is_scorer_enabled(b).is_err());
}

#[test]
fn enabled_snapshot_skips_disabled_scorers_in_list_order() {
    let engine = engine();
    let a = engine.add_scorer(ConstantScorer::new("a", 1.0));
    let b = engine.add_scorer(ConstantScorer::new("b", 1.0));
    let c = engine.add_scorer(ConstantScorer::new("c", 1.0));

    engine.set_scorer_enabled(b, false).expect("disable succeeds");
    engine.move_scorer_to(a, 2).expect("move succeeds");

    assert_eq!(engine.enabled_scorers(), vec![c, a]);
    assert_eq!(engine.scorer_count(), 3);
}

#[test]
fn typed_lookup_finds_the_first_scorer_of_a_type() {
    let engine = engine();
    let flat = engine.add_scorer(ConstantScorer::new("flat", 0.5));
    let table = engine.add_scorer(TableScorer::new("table", &[]));
    engine.add_scorer(TableScorer::new("second-table", &[]));

    assert_eq!(engine.find_scorer::<TableScorer>(), Some(table));
    assert_eq!(engine.find_scorer::<ConstantScorer>(), Some(flat));
    assert_eq!(engine.find_scorer::<RecordingScorer>(), None);

    let constant = engine.scorer::<ConstantScorer>(flat).expect("typed access");
    assert_eq!(constant.value(), 0.5);
    assert!(engine.scorer::<TableScorer>(flat).is_none());
}

#[test]
fn factories_may_refuse_to_build_a_scorer() {
    let engine = engine();

    let handle = engine
        .add_scorer_with(|| Ok(ConstantScorer::new("built", 1.0)))
        .expect("factory succeeds");
    assert_eq!(engine.scorer_name(handle).as_deref(), Some("built"));

    let err = engine
        .add_scorer_with(|| Err::<ConstantScorer, _>(ScorerError::failed("missing config")))
        .expect_err("factory fails");
    assert!(matches!(err, RankingError::InvalidFactory(_)));
    assert_eq!(engine.scorer_count(), 1);
}
