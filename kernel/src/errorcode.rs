// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Standard error enum for invoking operations

/// Standard errors of the serial stack.
///
/// Operations that can fail synchronously return `Result<T, ErrorCode>`.
/// Conditions that cannot be reported from interrupt context (receive
/// overruns) are counted by the driver instead.
///
/// The discriminants match the Tock error numbering so that values can be
/// passed across a system call boundary unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// The state requested is already set
    ALREADY = 3,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Parameter passed was too large
    SIZE = 7,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;

    #[test]
    fn numbering_matches_tock() {
        assert_eq!(usize::from(ErrorCode::ALREADY), 3);
        assert_eq!(usize::from(ErrorCode::INVAL), 6);
        assert_eq!(usize::from(ErrorCode::SIZE), 7);
    }
}
