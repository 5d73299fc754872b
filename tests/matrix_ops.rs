//! Add, multiply, matvec and view behavior across storage kinds

mod common;

use common::{assert_allclose_f64, csc_from_dense, dense_values};
use mxr::prelude::*;

fn dense_2x2(vals: [f64; 4]) -> Matrix {
    Matrix::dense_from(2, 2, &vals).unwrap()
}

/// 3x3 fixture shared by the cross-kind tests:
/// [1 3 0]
/// [2 4 0]
/// [0 0 5]
fn fixture_values() -> Vec<f64> {
    vec![1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 5.0]
}

fn fixture_bd() -> Matrix {
    Matrix::block_diag_from(&[2, 1], &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap()
}

#[test]
fn dense_add_with_transpose() {
    let a = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    let b = dense_2x2([5.0, 6.0, 7.0, 8.0]);
    let c = add(2.0, a.t(), 1.0, b.view()).unwrap();
    assert_eq!(c.kind(), Kind::Dense);
    assert_allclose_f64(
        &dense_values(&c),
        &[7.0, 12.0, 11.0, 16.0],
        1e-14,
        1e-14,
        "2 A^T + B",
    );
}

#[test]
fn transpose_is_single_use() {
    let a = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    assert!(matches!(a.t().t(), Err(Error::InvalidTranspose { .. })));

    // Materializing resets the budget: (A^T)^T == A
    let at = a.t().materialize().unwrap();
    assert_eq!(at.get(0, 1), a.get(1, 0));
    let diff = add(1.0, at.t(), -1.0, a.view()).unwrap();
    assert_allclose_f64(&dense_values(&diff), &[0.0; 4], 0.0, 1e-14, "A^TT - A");
}

#[test]
fn double_transpose_round_trips_every_kind() {
    let vals = fixture_values();
    let kinds = [
        Matrix::dense_from(3, 3, &vals).unwrap(),
        fixture_bd(),
        csc_from_dense(3, 3, &vals),
    ];
    for a in &kinds {
        let once = a.t().materialize().unwrap();
        assert_eq!(once.kind(), a.kind());
        let back = once.t().materialize().unwrap();
        assert_allclose_f64(
            &dense_values(&back),
            &dense_values(a),
            0.0,
            1e-14,
            &format!("{:?} transpose round trip", a.kind()),
        );
    }
}

#[test]
fn add_agrees_across_kind_pairs() {
    let vals = fixture_values();
    let d = Matrix::dense_from(3, 3, &vals).unwrap();
    let b = fixture_bd();
    let s = csc_from_dense(3, 3, &vals);

    let reference = dense_values(&add(2.0, d.view(), 1.0, d.view()).unwrap());
    let reference_t = dense_values(&add(1.0, d.t(), 2.0, d.view()).unwrap());

    let operands = [&d, &b, &s];
    for x in operands {
        for y in operands {
            let c = add(2.0, x.view(), 1.0, y.view()).unwrap();
            assert_allclose_f64(
                &dense_values(&c),
                &reference,
                1e-13,
                1e-13,
                &format!("{:?} + {:?}", x.kind(), y.kind()),
            );

            let ct = add(1.0, x.t(), 2.0, y.view()).unwrap();
            assert_allclose_f64(
                &dense_values(&ct),
                &reference_t,
                1e-13,
                1e-13,
                &format!("{:?}^T + {:?}", x.kind(), y.kind()),
            );
        }
    }
}

#[test]
fn matmat_agrees_across_kind_pairs() {
    let vals = fixture_values();
    let d = Matrix::dense_from(3, 3, &vals).unwrap();
    let b = fixture_bd();
    let s = csc_from_dense(3, 3, &vals);

    let reference = dense_values(&matmat(1.0, d.view(), d.view()).unwrap());

    let operands = [&d, &b, &s];
    for x in operands {
        for y in operands {
            let c = matmat(1.0, x.view(), y.view()).unwrap();
            assert_allclose_f64(
                &dense_values(&c),
                &reference,
                1e-13,
                1e-13,
                &format!("{:?} * {:?}", x.kind(), y.kind()),
            );
        }
    }
}

#[test]
fn same_kind_multiply_keeps_kind_mixed_goes_dense() {
    let vals = fixture_values();
    let d = Matrix::dense_from(3, 3, &vals).unwrap();
    let b = fixture_bd();
    let s = csc_from_dense(3, 3, &vals);

    assert_eq!(matmat(1.0, b.view(), b.view()).unwrap().kind(), Kind::BlockDiag);
    assert_eq!(matmat(1.0, s.view(), s.view()).unwrap().kind(), Kind::Csc);
    assert_eq!(matmat(1.0, b.view(), s.view()).unwrap().kind(), Kind::Dense);
    assert_eq!(matmat(1.0, d.view(), b.view()).unwrap().kind(), Kind::Dense);
}

#[test]
fn sparse_add_merges_patterns() {
    let a = Matrix::csc_from(3, 2, vec![0, 1, 2], vec![0, 2], vec![1.0, 2.0]).unwrap();
    let b = Matrix::csc_from(3, 2, vec![0, 1, 1], vec![1], vec![4.0]).unwrap();
    let c = add(1.0, a.view(), 1.0, b.view()).unwrap();
    assert_eq!(c.kind(), Kind::Csc);
    assert_eq!(c.nnz(), 3);
    assert_eq!(c.get(0, 0), 1.0);
    assert_eq!(c.get(1, 0), 4.0);
    assert_eq!(c.get(2, 1), 2.0);
}

#[test]
fn block_diag_add_requires_identical_structure() {
    let a = Matrix::block_diag(&[2, 1]).unwrap();
    let b = Matrix::block_diag(&[1, 2]).unwrap();
    assert!(!a.same_structure(&b));
    assert!(matches!(
        add(1.0, a.view(), 1.0, b.view()),
        Err(Error::StructureMismatch { op: "add" })
    ));
}

#[test]
fn matvec_matches_single_column_multiply() {
    let b = fixture_bd();
    let x = [1.0, -1.0, 2.0];
    let mut y = [0.0; 3];
    matvec(1.0, b.view(), &x, 0.0, &mut y).unwrap();

    let xc = Matrix::dense_from(3, 1, &x).unwrap();
    let expect = matmat(1.0, b.view(), xc.view()).unwrap();
    assert_allclose_f64(&y, &dense_values(&expect), 1e-14, 1e-14, "matvec");

    // Transposed flavor
    let mut yt = [0.0; 3];
    matvec(1.0, b.t(), &x, 0.0, &mut yt).unwrap();
    let expect_t = matmat(1.0, b.t(), xc.view()).unwrap();
    assert_allclose_f64(&yt, &dense_values(&expect_t), 1e-14, 1e-14, "matvec^T");
}

#[test]
fn trimat_is_a_double_multiply() {
    let a = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    let b = dense_2x2([5.0, 6.0, 7.0, 8.0]);
    let c = dense_2x2([1.0, 0.0, -1.0, 2.0]);

    let abc = trimat(a.view(), b.view(), c.view()).unwrap();
    let bc = matmat(1.0, b.view(), c.view()).unwrap();
    let expect = matmat(1.0, a.view(), bc.view()).unwrap();
    assert_allclose_f64(
        &dense_values(&abc),
        &dense_values(&expect),
        1e-14,
        1e-14,
        "A B C",
    );
}

#[test]
fn diag_block_view_selects_a_range() {
    let b = fixture_bd();
    let tail = b.diag_block(1, 1).unwrap().materialize().unwrap();
    assert_eq!(tail.kind(), Kind::BlockDiag);
    assert_eq!(tail.rows(), 1);
    assert_eq!(tail.get(0, 0), 5.0);

    let head = b.diag_block(0, 0).unwrap().materialize().unwrap();
    assert_eq!(head.rows(), 2);
    assert_eq!(dense_values(&head), vec![1.0, 2.0, 3.0, 4.0]);

    // Out of range and wrong kind are rejected
    assert!(b.diag_block(1, 2).is_err());
    let d = dense_2x2([1.0, 0.0, 0.0, 1.0]);
    assert!(matches!(
        d.diag_block(0, 0),
        Err(Error::Unsupported { op: "diag_block", .. })
    ));
}

#[test]
fn sub_block_view_multiplies_like_its_materialization() {
    let b = Matrix::block_diag_from(&[1, 2], &[2.0, 1.0, 3.0, 0.0, 4.0]).unwrap();
    let sub = b.diag_block(1, 1).unwrap().materialize().unwrap();
    let rhs = dense_2x2([1.0, 1.0, 0.0, 1.0]);

    let via_view = matmat(1.0, b.diag_block(1, 1).unwrap(), rhs.view()).unwrap();
    let via_copy = matmat(1.0, sub.view(), rhs.view()).unwrap();
    assert_allclose_f64(
        &dense_values(&via_view),
        &dense_values(&via_copy),
        1e-14,
        1e-14,
        "sub-block multiply",
    );
}

#[test]
fn matmat_into_accumulates_with_beta() {
    let a = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    let b = dense_2x2([5.0, 6.0, 7.0, 8.0]);
    let mut c = dense_2x2([1.0, 1.0, 1.0, 1.0]);
    matmat_into(1.0, a.view(), b.view(), 1.0, &mut c).unwrap();
    assert_allclose_f64(
        &dense_values(&c),
        &[24.0, 35.0, 32.0, 47.0],
        1e-14,
        1e-14,
        "A B + C",
    );
}

#[test]
fn add_into_reshapes_a_dense_buffer() {
    let a = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    let b = dense_2x2([5.0, 6.0, 7.0, 8.0]);
    let mut c = Matrix::dense(1, 1).unwrap();
    add_into(1.0, a.view(), 1.0, b.view(), &mut c).unwrap();
    assert_eq!((c.rows(), c.cols()), (2, 2));
    assert_allclose_f64(&dense_values(&c), &[6.0, 8.0, 10.0, 12.0], 1e-14, 1e-14, "A + B");

    // A buffer of the wrong kind is rejected
    let mut wrong = Matrix::block_diag(&[2]).unwrap();
    assert!(matches!(
        add_into(1.0, a.view(), 1.0, b.view(), &mut wrong),
        Err(Error::StructureMismatch { .. })
    ));
}

#[test]
fn shape_mismatch_is_reported() {
    let a = Matrix::dense(2, 3).unwrap();
    let b = Matrix::dense(2, 3).unwrap();
    assert!(matches!(
        matmat(1.0, a.view(), b.view()),
        Err(Error::ShapeMismatch { .. })
    ));

    // The error carries both operands' effective shapes
    let big = Matrix::dense(4, 5).unwrap();
    match matmat(1.0, a.view(), big.view()) {
        Err(Error::ShapeMismatch { expected, got }) => {
            assert_eq!(expected, [2, 3]);
            assert_eq!(got, [4, 5]);
        }
        other => panic!("expected a shape mismatch, got {:?}", other),
    }
    // Transposing one side fixes the inner dimension
    assert!(matmat(1.0, a.view(), b.t()).is_ok());

    let x = [0.0; 2];
    let mut y = [0.0; 2];
    assert!(matches!(
        matvec(1.0, a.view(), &x, 0.0, &mut y),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn zero_and_scale_lifecycle() {
    let mut d = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    d.scale(2.0).unwrap();
    assert_eq!(dense_values(&d), vec![2.0, 4.0, 6.0, 8.0]);
    d.zero();
    assert_eq!(dense_values(&d), vec![0.0; 4]);

    let vals = fixture_values();
    let mut s = csc_from_dense(3, 3, &vals);
    s.invert_in_place().unwrap();
    assert!(s.is_factored_inverse());
    assert!(matches!(s.scale(2.0), Err(Error::FactoredOperand { op: "scale" })));

    // Zeroing a factored inverse reverts it to an explicit zero matrix
    s.zero();
    assert!(!s.is_factored_inverse());
    assert_eq!(dense_values(&s), vec![0.0; 9]);
}

#[test]
fn copy_into_respects_kind_and_structure() {
    let d = dense_2x2([1.0, 2.0, 3.0, 4.0]);
    let mut bd = Matrix::block_diag(&[2]).unwrap();
    assert!(matches!(
        d.copy_into(&mut bd),
        Err(Error::StructureMismatch { op: "copy_into" })
    ));

    let src = Matrix::block_diag_from(&[2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
    src.copy_into(&mut bd).unwrap();
    assert_eq!(dense_values(&bd), dense_values(&src));

    let mut other = Matrix::block_diag(&[1, 1]).unwrap();
    assert!(matches!(
        src.copy_into(&mut other),
        Err(Error::StructureMismatch { op: "copy_into" })
    ));
}

#[test]
fn factored_operand_is_rejected_in_add() {
    let vals = fixture_values();
    let mut s = csc_from_dense(3, 3, &vals);
    s.invert_in_place().unwrap();
    let d = Matrix::dense(3, 3).unwrap();
    assert!(matches!(
        add(1.0, s.view(), 1.0, d.view()),
        Err(Error::FactoredOperand { op: "add" })
    ));
}

#[test]
fn csc_structure_validation() {
    // Descending column pointers
    assert!(Matrix::csc(2, 2, vec![0, 2, 1], vec![0, 1]).is_err());
    // Row index out of range
    assert!(Matrix::csc_from(2, 1, vec![0, 1], vec![5], vec![1.0]).is_err());
    // Value count disagrees with the pointers
    assert!(Matrix::csc_from(2, 1, vec![0, 1], vec![0], vec![1.0, 2.0]).is_err());
}
