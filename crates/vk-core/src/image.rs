use rayon::prelude::*;

use crate::Error;

/// Rows handed to one parallel task at minimum.
const MIN_ROWS_PER_TASK: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            start: 0,
            data: &self.data,
        }
    }

    pub fn as_view_mut(&mut self) -> ImageViewMut<'_, T> {
        ImageViewMut {
            width: self.width,
            height: self.height,
            stride: self.width,
            start: 0,
            data: &mut self.data,
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }

    /// Resizes the buffer to `width x height`, keeping the allocation.
    ///
    /// Pixel contents are unspecified afterwards unless the shape is unchanged.
    pub fn reshape(&mut self, width: usize, height: usize)
    where
        T: Default,
    {
        if self.width == width && self.height == height {
            return;
        }
        let len = width.checked_mul(height).expect("image size overflow");
        self.data.resize(len, T::default());
        self.width = width;
        self.height = height;
    }
}

/// Read-only window into a flat row-major array.
///
/// Pixel `(x, y)` lives at `start_index + y * stride + x` of the backing slice.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    start: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn from_slice(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        Self::from_parts(width, height, stride, 0, data)
    }

    pub fn from_parts(
        width: usize,
        height: usize,
        stride: usize,
        start_index: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        check_layout(width, height, stride, start_index, data.len())?;
        Ok(Self {
            width,
            height,
            stride,
            start: start_index,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn start_index(&self) -> usize {
        self.start
    }

    /// Whole backing slice, including pixels outside the window.
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        self.start + y * self.stride + x
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = self.index(0, y);
        &self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(self.index(x, y))
    }

    /// Returns a pixel reference without bounds checks.
    ///
    /// # Safety
    /// Caller must guarantee `x < self.width()` and `y < self.height()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, x: usize, y: usize) -> &'a T {
        // SAFETY: Caller guarantees `x < width` and `y < height`. With view
        // invariants this implies `idx` is in bounds of `data`.
        unsafe { self.data.get_unchecked(self.start + y * self.stride + x) }
    }

    pub fn subview(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ImageView<'a, T>, Error> {
        if x > self.width
            || y > self.height
            || width > (self.width - x)
            || height > (self.height - y)
        {
            return Err(Error::OutOfBounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .and_then(|v| v.checked_add(self.start))
            .ok_or(Error::OutOfBounds)?;
        check_layout(width, height, self.stride, start, self.data.len())
            .map_err(|_| Error::OutOfBounds)?;

        Ok(ImageView {
            width,
            height,
            stride: self.stride,
            start,
            data: self.data,
        })
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.width
    }

    pub fn as_contiguous_slice(&self) -> Option<&'a [T]> {
        if !self.is_contiguous() {
            return None;
        }
        let len = self.width * self.height;
        self.data.get(self.start..self.start + len)
    }
}

/// Mutable window into a flat row-major array, same addressing as [`ImageView`].
#[derive(Debug)]
pub struct ImageViewMut<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    start: usize,
    data: &'a mut [T],
}

impl<'a, T> ImageViewMut<'a, T> {
    pub fn from_slice_mut(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a mut [T],
    ) -> Result<Self, Error> {
        Self::from_parts_mut(width, height, stride, 0, data)
    }

    pub fn from_parts_mut(
        width: usize,
        height: usize,
        stride: usize,
        start_index: usize,
        data: &'a mut [T],
    ) -> Result<Self, Error> {
        check_layout(width, height, stride, start_index, data.len())?;
        Ok(Self {
            width,
            height,
            stride,
            start: start_index,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn start_index(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        self.start + y * self.stride + x
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = self.index(0, y);
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = self.index(0, y);
        &mut self.data[start..start + self.width]
    }

    /// Rows in order as `(y, row)`; each row is exactly `width` long.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut [T])> + '_ {
        let (width, height, stride) = (self.width, self.height, self.stride.max(1));
        self.data[self.start..]
            .chunks_mut(stride)
            .take(height)
            .map(move |row| &mut row[..width])
            .enumerate()
    }

    /// Parallel counterpart of [`ImageViewMut::rows_mut`]; rows are disjoint.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, &mut [T])> + '_
    where
        T: Send,
    {
        let (width, height, stride) = (self.width, self.height, self.stride.max(1));
        self.data[self.start..]
            .par_chunks_mut(stride)
            .take(height)
            .map(move |row| &mut row[..width])
            .enumerate()
            .with_min_len(MIN_ROWS_PER_TASK)
    }

    pub fn subview(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ImageView<'_, T>, Error> {
        self.as_view().subview(x, y, width, height)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(self.index(x, y))
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        self.data.get_mut(idx)
    }

    /// Returns a pixel reference without bounds checks.
    ///
    /// # Safety
    /// Caller must guarantee `x < self.width()` and `y < self.height()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, x: usize, y: usize) -> &T {
        // SAFETY: Caller guarantees `x < width` and `y < height`. With view
        // invariants this implies `idx` is in bounds of `data`.
        unsafe { self.data.get_unchecked(self.start + y * self.stride + x) }
    }

    /// Returns a mutable pixel reference without bounds checks.
    ///
    /// # Safety
    /// Caller must guarantee `x < self.width()` and `y < self.height()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, x: usize, y: usize) -> &mut T {
        // SAFETY: Caller guarantees `x < width` and `y < height`. With view
        // invariants this implies `idx` is in bounds of `data`.
        unsafe { self.data.get_unchecked_mut(self.start + y * self.stride + x) }
    }

    pub fn subview_mut(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ImageViewMut<'_, T>, Error> {
        if x > self.width
            || y > self.height
            || width > (self.width - x)
            || height > (self.height - y)
        {
            return Err(Error::OutOfBounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .and_then(|v| v.checked_add(self.start))
            .ok_or(Error::OutOfBounds)?;
        check_layout(width, height, self.stride, start, self.data.len())
            .map_err(|_| Error::OutOfBounds)?;

        Ok(ImageViewMut {
            width,
            height,
            stride: self.stride,
            start,
            data: &mut *self.data,
        })
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.stride,
            start: self.start,
            data: self.data,
        }
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.width
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        for (_, row) in self.rows_mut() {
            row.fill(value.clone());
        }
    }
}

fn check_layout(
    width: usize,
    height: usize,
    stride: usize,
    start: usize,
    len: usize,
) -> Result<(), Error> {
    if stride < width {
        return Err(Error::InvalidStride);
    }

    let min_len = min_required_len(width, height, stride)
        .and_then(|n| n.checked_add(start))
        .ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: len,
        })?;

    if len < min_len {
        return Err(Error::SizeMismatch {
            expected: min_len,
            actual: len,
        });
    }
    Ok(())
}

fn min_required_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    if width == 0 || height == 0 {
        return Some(0);
    }

    let rows_before_last = height.checked_sub(1)?;
    let base = rows_before_last.checked_mul(stride)?;
    base.checked_add(width)
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::{Image, ImageView, ImageViewMut};

    #[test]
    fn view_indexing_with_stride() {
        let data = vec![1u8, 2, 3, 99, 4, 5, 6, 88];
        let view = ImageView::from_slice(3, 2, 4, &data).expect("valid view");

        assert_eq!(view.row(0), &[1, 2, 3]);
        assert_eq!(view.row(1), &[4, 5, 6]);
        assert_eq!(view.get(0, 1), Some(&4));
        assert_eq!(view.get(2, 1), Some(&6));
        assert_eq!(view.get(3, 1), None);
        assert!(!view.is_contiguous());
        assert!(view.as_contiguous_slice().is_none());
    }

    #[test]
    fn start_index_offsets_every_access() {
        let data = vec![0u8, 0, 1, 2, 9, 3, 4, 9];
        let view = ImageView::from_parts(2, 2, 3, 2, &data).expect("valid view");
        assert_eq!(view.index(1, 1), 6);
        assert_eq!(view.row(0), &[1, 2]);
        assert_eq!(view.row(1), &[3, 4]);

        let too_far = ImageView::from_parts(2, 2, 3, 4, &data);
        assert!(too_far.is_err());
    }

    #[test]
    fn subview_non_contiguous_parent() {
        let data = vec![
            10u8, 11, 12, 13, 99, // row 0
            20, 21, 22, 23, 98, // row 1
            30, 31, 32, 33, 97, // row 2
        ];
        let parent = ImageView::from_slice(4, 3, 5, &data).expect("valid parent");
        let sub = parent.subview(1, 1, 3, 2).expect("valid subview");

        assert_eq!(sub.width(), 3);
        assert_eq!(sub.height(), 2);
        assert_eq!(sub.stride(), 5);
        assert_eq!(sub.start_index(), 6);
        assert_eq!(sub.row(0), &[21, 22, 23]);
        assert_eq!(sub.row(1), &[31, 32, 33]);
        assert_eq!(sub.get(2, 1), Some(&33));
    }

    #[test]
    fn subview_mut_non_contiguous_parent() {
        let mut data = vec![
            1u8, 2, 3, 4, 0, // row 0
            5, 6, 7, 8, 0, // row 1
            9, 10, 11, 12, 0, // row 2
        ];

        let mut parent = ImageViewMut::from_slice_mut(4, 3, 5, &mut data).expect("valid parent");
        let mut sub = parent.subview_mut(1, 0, 2, 3).expect("valid subview");
        *sub.get_mut(0, 2).expect("in bounds") = 42;

        assert_eq!(sub.row(0), &[2, 3]);
        assert_eq!(sub.row(2), &[42, 11]);
        assert_eq!(sub.get(0, 2), Some(&42));
    }

    #[test]
    fn rows_mut_skip_padding() {
        let mut data = vec![0u8; 4 * 3];
        let mut view = ImageViewMut::from_parts_mut(2, 2, 4, 1, &mut data).expect("valid view");
        for (y, row) in view.rows_mut() {
            row.fill(y as u8 + 1);
        }
        assert_eq!(data, vec![0, 1, 1, 0, 0, 2, 2, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn par_rows_mut_matches_sequential() {
        let mut a = Image::new_fill(7, 40, 0i32);
        let mut b = Image::new_fill(7, 40, 0i32);
        for (y, row) in a.as_view_mut().rows_mut() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = (x * 100 + y) as i32;
            }
        }
        b.as_view_mut().par_rows_mut().for_each(|(y, row)| {
            for (x, v) in row.iter_mut().enumerate() {
                *v = (x * 100 + y) as i32;
            }
        });
        assert_eq!(a, b);
    }

    #[test]
    fn reshape_keeps_requested_dims() {
        let mut img = Image::new_fill(2, 2, 1.0f32);
        img.reshape(3, 5);
        assert_eq!((img.width(), img.height()), (3, 5));
        assert_eq!(img.data().len(), 15);
    }
}
