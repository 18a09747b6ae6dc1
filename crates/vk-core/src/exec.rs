use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ImageViewMut;

/// Whether per-row work runs on the calling thread or on the rayon pool.
///
/// Both strategies run the same per-row closure and give identical output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    #[default]
    Sequential,
    Parallel,
}

impl Execution {
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Parallel)
    }
}

/// Calls `op(y, row)` for every row of `dst`.
pub fn for_each_row<T, F>(dst: &mut ImageViewMut<'_, T>, exec: Execution, op: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    match exec {
        Execution::Sequential => {
            for (y, row) in dst.rows_mut() {
                op(y, row);
            }
        }
        Execution::Parallel => dst.par_rows_mut().for_each(|(y, row)| op(y, row)),
    }
}

/// Like [`for_each_row`], restricted to rows `y0..y1`.
pub fn for_each_row_in<T, F>(
    dst: &mut ImageViewMut<'_, T>,
    rows: core::ops::Range<usize>,
    exec: Execution,
    op: F,
) where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    let y0 = rows.start.min(dst.height());
    let y1 = rows.end.min(dst.height());
    if y0 >= y1 {
        return;
    }
    let width = dst.width();
    let Ok(mut band) = dst.subview_mut(0, y0, width, y1 - y0) else {
        return;
    };
    for_each_row(&mut band, exec, |y, row| op(y0 + y, row));
}

/// Like [`for_each_row`], with per-worker scratch state built by `init`.
///
/// Sequential runs build one state; parallel runs build one per rayon split,
/// so `op` must not rely on what an earlier row left behind.
pub fn for_each_row_init<T, S, I, F>(
    dst: &mut ImageViewMut<'_, T>,
    exec: Execution,
    init: I,
    op: F,
) where
    T: Send,
    I: Fn() -> S + Send + Sync,
    F: Fn(&mut S, usize, &mut [T]) + Send + Sync,
{
    match exec {
        Execution::Sequential => {
            let mut state = init();
            for (y, row) in dst.rows_mut() {
                op(&mut state, y, row);
            }
        }
        Execution::Parallel => dst
            .par_rows_mut()
            .for_each_init(init, |state, (y, row)| op(state, y, row)),
    }
}

/// [`for_each_row_init`] restricted to rows `y0..y1`.
pub fn for_each_row_in_init<T, S, I, F>(
    dst: &mut ImageViewMut<'_, T>,
    rows: core::ops::Range<usize>,
    exec: Execution,
    init: I,
    op: F,
) where
    T: Send,
    I: Fn() -> S + Send + Sync,
    F: Fn(&mut S, usize, &mut [T]) + Send + Sync,
{
    let y0 = rows.start.min(dst.height());
    let y1 = rows.end.min(dst.height());
    if y0 >= y1 {
        return;
    }
    let width = dst.width();
    let Ok(mut band) = dst.subview_mut(0, y0, width, y1 - y0) else {
        return;
    };
    for_each_row_init(&mut band, exec, init, |state, y, row| {
        op(state, y0 + y, row)
    });
}
