use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    OutOfBounds,
    InvalidStride,
    EmptyKernel,
    InvalidKernelOffset { offset: usize, width: usize },
    KernelShape { expected: usize, actual: usize },
    UnsupportedArcLength(usize),
    InvalidParameter(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::InvalidStride => write!(f, "invalid stride"),
            Self::EmptyKernel => write!(f, "kernel has no taps"),
            Self::InvalidKernelOffset { offset, width } => {
                write!(f, "kernel offset {offset} outside width {width}")
            }
            Self::KernelShape { expected, actual } => {
                write!(f, "kernel data length: expected {expected}, got {actual}")
            }
            Self::UnsupportedArcLength(n) => {
                write!(f, "unsupported FAST arc length {n}, expected 9..=12")
            }
            Self::InvalidParameter(what) => write!(f, "invalid parameter: {what}"),
        }
    }
}

impl std::error::Error for Error {}
