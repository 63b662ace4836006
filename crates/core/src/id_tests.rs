// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{IdGen, SequentialIdGen, ShortId, TaskId, UuidIdGen, WorkerName};

#[test]
fn short_truncates_long_strings() {
    assert_eq!("abcdef".short(4), "abcd");
    assert_eq!("ab".short(4), "ab");
}

#[test]
fn uuid_gen_produces_unique_ids() {
    let idgen = UuidIdGen;
    assert_ne!(idgen.next(), idgen.next());
}

#[test]
fn sequential_gen_counts_up() {
    let idgen = SequentialIdGen::new("msg");
    assert_eq!(idgen.next(), "msg-1");
    assert_eq!(idgen.next(), "msg-2");
}

#[test]
fn sequential_gen_clones_share_counter() {
    let idgen = SequentialIdGen::new("t");
    let other = idgen.clone();
    assert_eq!(idgen.next(), "t-1");
    assert_eq!(other.next(), "t-2");
}

#[test]
fn task_id_numeric_value() {
    assert_eq!(TaskId::new("42").as_u64(), Some(42));
    assert_eq!(TaskId::new("not-a-number").as_u64(), None);
}

#[yare::parameterized(
    zero  = { 0, "worker-0" },
    three = { 3, "worker-3" },
    big   = { 17, "worker-17" },
)]
fn worker_name_round_trips_index(index: u32, expected: &str) {
    let name = WorkerName::for_index(index);
    assert_eq!(name.as_str(), expected);
    assert_eq!(name.index(), Some(index));
}

#[test]
fn worker_name_index_rejects_foreign_names() {
    assert_eq!(WorkerName::new("leader").index(), None);
    assert_eq!(WorkerName::new("worker-x").index(), None);
}

#[test]
fn ids_compare_with_str() {
    let id = TaskId::new("7");
    assert_eq!(id, "7");
    assert_eq!(id.to_string(), "7");
}
