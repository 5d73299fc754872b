//! Symmetric eigendecomposition via the cyclic Jacobi algorithm
//!
//! Operates on caller-provided column-major buffers so block-diagonal
//! callers can size one workspace by their largest block and reuse it.

use crate::error::{Error, Result};

/// Sweep cap; convergence is quadratic once rotations get small.
pub const MAX_SWEEPS: usize = 30;

/// Full symmetric eigendecomposition of the `n x n` matrix in `a`.
///
/// `a` is destroyed. On success `vals` holds all eigenvalues in ascending
/// order and the columns of `v` the matching orthonormal eigenvectors.
/// Only the value of the symmetric part of `a` matters: the lower
/// triangle is mirrored up before iterating.
pub fn sym_eigen(n: usize, a: &mut [f64], vals: &mut [f64], v: &mut [f64]) -> Result<()> {
    debug_assert!(a.len() >= n * n && v.len() >= n * n && vals.len() >= n);

    // Symmetrize from the lower triangle
    for j in 0..n {
        for i in (j + 1)..n {
            a[j + i * n] = a[i + j * n];
        }
    }

    // V starts as the identity
    for x in v[..n * n].iter_mut() {
        *x = 0.0;
    }
    for i in 0..n {
        v[i + i * n] = 1.0;
    }

    if n < 2 {
        if n == 1 {
            vals[0] = a[0];
        }
        return Ok(());
    }

    let mut anorm = 0.0f64;
    for j in 0..n {
        for i in 0..=j {
            anorm = anorm.max(a[i + j * n].abs());
        }
    }
    let tol = (n as f64) * f64::EPSILON * anorm.max(f64::MIN_POSITIVE);

    let mut converged = false;
    for _sweep in 0..MAX_SWEEPS {
        let mut max_off = 0.0f64;
        for j in 0..n {
            for i in 0..j {
                max_off = max_off.max(a[i + j * n].abs());
            }
        }
        if max_off < tol {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p + q * n];
                if apq.abs() < tol / (n as f64) {
                    continue;
                }

                let theta = (a[q + q * n] - a[p + p * n]) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (1.0 + theta * theta).sqrt())
                } else {
                    -1.0 / (-theta + (1.0 + theta * theta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                // A <- A J, columns p and q
                for i in 0..n {
                    let aip = a[i + p * n];
                    let aiq = a[i + q * n];
                    a[i + p * n] = c * aip - s * aiq;
                    a[i + q * n] = s * aip + c * aiq;
                }
                // A <- J^T A, rows p and q
                for i in 0..n {
                    let api = a[p + i * n];
                    let aqi = a[q + i * n];
                    a[p + i * n] = c * api - s * aqi;
                    a[q + i * n] = s * api + c * aqi;
                }
                a[p + q * n] = 0.0;
                a[q + p * n] = 0.0;

                // V <- V J
                for i in 0..n {
                    let vip = v[i + p * n];
                    let viq = v[i + q * n];
                    v[i + p * n] = c * vip - s * viq;
                    v[i + q * n] = s * vip + c * viq;
                }
            }
        }
    }

    if !converged {
        // One more check: the final sweep may have finished the job
        let mut max_off = 0.0f64;
        for j in 0..n {
            for i in 0..j {
                max_off = max_off.max(a[i + j * n].abs());
            }
        }
        if max_off >= tol {
            return Err(Error::EigenFailure { sweeps: MAX_SWEEPS });
        }
    }

    // Sort eigenvalues ascending and reorder eigenvector columns to match
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        a[i + i * n]
            .partial_cmp(&a[j + j * n])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let vecs: Vec<f64> = v[..n * n].to_vec();
    for (dst, &src) in order.iter().enumerate() {
        vals[dst] = a[src + src * n];
        v[dst * n..(dst + 1) * n].copy_from_slice(&vecs[src * n..(src + 1) * n]);
    }

    Ok(())
}
