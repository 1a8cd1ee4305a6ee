//! End-to-end nest analyses: classification, stream synthesis through the
//! full pipeline, indirect detection, memo isolation, and report
//! serialization.

use stridescope::{
    AccessKind, AnalyzerOptions, Bound, Function, LoopLevel, LoopNest, NestAnalyzer, NestReport,
    Opcode, Operand, Operation,
};

fn analyzer() -> NestAnalyzer {
    NestAnalyzer::new(AnalyzerOptions {
        workers: 2,
        ..Default::default()
    })
}

/// for (i = 0; i < n; i++) for (j = 0; j < m; j++) v = A[i][j];
fn matrix_read(n: i64, m: i64) -> (Function, LoopNest) {
    let mut f = Function::new("kernel");
    f.push(Operation::named("A", Opcode::Alloca, vec![]));
    let i = f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
    let j = f.push(Operation::named("j", Opcode::Phi, vec![Operand::Const(0)]));
    let p = f.push(
        Operation::named(
            "p",
            Opcode::Index,
            vec![
                Operand::Name("A".into()),
                Operand::Name("i".into()),
                Operand::Name("j".into()),
            ],
        )
        .with_dims(vec![n, m]),
    );
    let v = f.push(Operation::named(
        "v",
        Opcode::Load,
        vec![Operand::Name("p".into())],
    ));
    let nest = LoopNest::new(
        vec![
            LoopLevel::rectangular("i", n),
            LoopLevel::rectangular("j", m),
        ],
        vec![i, j, p, v],
    );
    (f, nest)
}

// ====================
// direct accesses
// ====================

#[test]
fn test_matrix_read_is_direct_and_contiguous() {
    let (f, nest) = matrix_read(3, 4);
    let report = analyzer().analyze(&f, &nest).unwrap();

    assert_eq!(report.accesses.len(), 1);
    let access = &report.accesses[0];
    assert_eq!(access.kind, AccessKind::Direct);
    assert_eq!(access.allocation.as_deref(), Some("A"));
    assert_eq!(access.stream_name, "kernel;A;direct");
    // row-major 3x4 walk touches 0..12 contiguously
    assert_eq!(access.stream_len, Some(12));
    let stride = access.stride.as_ref().unwrap();
    assert_eq!(stride.runs.get(&11), Some(&1));
    assert!(stride.jumps.is_empty());
}

#[test]
fn test_scaled_access_strides_by_two() {
    // for (i = 0; i < 8; i++) v = B[i*2];
    let mut f = Function::new("kernel");
    f.push(Operation::named("B", Opcode::Alloca, vec![]));
    let i = f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
    let mul = f.push(Operation::named(
        "mul",
        Opcode::Mul,
        vec![Operand::Name("i".into()), Operand::Const(2)],
    ));
    let p = f.push(
        Operation::named(
            "p",
            Opcode::Index,
            vec![Operand::Name("B".into()), Operand::Name("mul".into())],
        )
        .with_dims(vec![16]),
    );
    let v = f.push(Operation::named(
        "v",
        Opcode::Load,
        vec![Operand::Name("p".into())],
    ));
    let nest = LoopNest::new(vec![LoopLevel::rectangular("i", 8)], vec![i, mul, p, v]);

    let report = analyzer().analyze(&f, &nest).unwrap();
    let access = &report.accesses[0];
    assert_eq!(access.kind, AccessKind::Direct);
    assert_eq!(access.stream_len, Some(8));
    // every step is a jump of 2; no unit-stride run ever forms
    let stride = access.stride.as_ref().unwrap();
    assert!(stride.runs.is_empty());
    assert_eq!(stride.jumps.get(&2).map(Vec::len), Some(7));
}

#[test]
fn test_read_write_same_array_reported_as_overlap() {
    // v = A[i][j]; A[i][j] = v  -> two direct streams with the same
    // composite name, grouped by the cross-stream matcher
    let (mut f, mut nest) = matrix_read(3, 4);
    let store = f.push(Operation::new(
        Opcode::Store,
        vec![Operand::Name("v".into()), Operand::Name("p".into())],
    ));
    nest.body.push(store);

    let report = analyzer().analyze(&f, &nest).unwrap();
    assert_eq!(report.accesses.len(), 2);
    assert_eq!(report.accesses[0].kind, AccessKind::Direct);
    assert_eq!(report.accesses[1].kind, AccessKind::Direct);
    assert_eq!(report.overlaps.len(), 1);
    assert_eq!(report.overlaps[0].name, "kernel;A;direct");
    assert_eq!(report.overlaps[0].span, (0, 11));
    assert_eq!(report.overlaps[0].members.len(), 2);
}

// ====================
// indirect detection
// ====================

#[test]
fn test_gather_through_index_array_is_indirect() {
    // idx = A[i]; v = B[idx];
    let mut f = Function::new("gather");
    f.push(Operation::named("A", Opcode::Alloca, vec![]));
    f.push(Operation::named("B", Opcode::Alloca, vec![]));
    let i = f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
    let pa = f.push(
        Operation::named(
            "pa",
            Opcode::Index,
            vec![Operand::Name("A".into()), Operand::Name("i".into())],
        )
        .with_dims(vec![8]),
    );
    let idx = f.push(Operation::named(
        "idx",
        Opcode::Load,
        vec![Operand::Name("pa".into())],
    ));
    let pb = f.push(
        Operation::named(
            "pb",
            Opcode::Index,
            vec![Operand::Name("B".into()), Operand::Name("idx".into())],
        )
        .with_dims(vec![8]),
    );
    let v = f.push(Operation::named(
        "v",
        Opcode::Load,
        vec![Operand::Name("pb".into())],
    ));
    let nest = LoopNest::new(
        vec![LoopLevel::rectangular("i", 8)],
        vec![i, pa, idx, pb, v],
    );

    let report = analyzer().analyze(&f, &nest).unwrap();
    assert_eq!(report.accesses.len(), 2);
    assert_eq!(report.accesses[0].kind, AccessKind::Direct);
    assert_eq!(report.accesses[1].kind, AccessKind::Indirect);
    // indirect accesses synthesize no stream
    assert_eq!(report.accesses[1].stream_len, None);
}

#[test]
fn test_memo_does_not_leak_across_nests() {
    // analyzing the same nest twice must classify identically both times
    let mut f = Function::new("gather");
    f.push(Operation::named("A", Opcode::Alloca, vec![]));
    let i = f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
    let p = f.push(
        Operation::named(
            "p",
            Opcode::Index,
            vec![Operand::Name("A".into()), Operand::Name("i".into())],
        )
        .with_dims(vec![8]),
    );
    let v = f.push(Operation::named(
        "v",
        Opcode::Load,
        vec![Operand::Name("p".into())],
    ));
    let nest = LoopNest::new(vec![LoopLevel::rectangular("i", 8)], vec![i, p, v]);

    let analyzer = analyzer();
    let first = analyzer.analyze(&f, &nest).unwrap();
    let second = analyzer.analyze(&f, &nest).unwrap();
    assert_eq!(first.accesses[0].kind, AccessKind::Direct);
    // a leaked memo entry for "v" or "i" would flip this to indirect
    assert_eq!(second.accesses[0].kind, AccessKind::Direct);
}

// ====================
// constant and skipped accesses
// ====================

#[test]
fn test_loop_invariant_address_is_constant() {
    let mut f = Function::new("kernel");
    f.push(Operation::named("s", Opcode::Alloca, vec![]));
    f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
    let v = f.push(Operation::named(
        "v",
        Opcode::Load,
        vec![Operand::Name("s".into())],
    ));
    let nest = LoopNest::new(vec![LoopLevel::rectangular("i", 4)], vec![v]);

    let report = analyzer().analyze(&f, &nest).unwrap();
    assert_eq!(report.accesses[0].kind, AccessKind::Constant);
    assert_eq!(report.accesses[0].stream_len, None);
}

#[test]
fn test_unknown_address_skipped_with_warning() {
    let mut f = Function::new("kernel");
    let v = f.push(Operation::named(
        "v",
        Opcode::Load,
        vec![Operand::Name("arg".into())],
    ));
    let nest = LoopNest::new(vec![LoopLevel::rectangular("i", 4)], vec![v]);

    let report = analyzer().analyze(&f, &nest).unwrap();
    assert!(report.accesses.is_empty());
    assert_eq!(report.warnings.len(), 1);
}

// ====================
// function-level driving
// ====================

#[test]
fn test_inadmissible_nest_skipped_at_function_level() {
    let (f, good) = matrix_read(2, 2);
    let mut bad_level = LoopLevel::rectangular("k", 4);
    bad_level.step = Bound::Const(0);
    let bad = LoopNest::new(vec![bad_level], vec![]);

    let report = analyzer().analyze_function(&f, &[bad, good]).unwrap();
    assert_eq!(report.nests.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.census.loads, 1);
}

#[test]
fn test_symbolic_inner_bound_triangular_nest() {
    // for i in 0..4: for j in 0..i  (composed as a 4x4 rectangle)
    let (f, mut nest) = matrix_read(4, 4);
    nest.levels[1].limit = Bound::Symbolic("i".into());

    let report = analyzer().analyze(&f, &nest).unwrap();
    assert_eq!(report.accesses[0].stream_len, Some(16));
}

// ====================
// serialization
// ====================

#[test]
fn test_report_serde_round_trip() {
    let (f, nest) = matrix_read(3, 4);
    let report = analyzer().analyze(&f, &nest).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: NestReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.function, report.function);
    assert_eq!(back.accesses.len(), report.accesses.len());
    assert_eq!(back.accesses[0].stream_len, report.accesses[0].stream_len);
    assert_eq!(back.overlaps, report.overlaps);
}
