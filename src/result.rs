//
// Copyright 2025 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Error types and results for the safe long arrays.

use std::time::Duration;
use thiserror::Error;

/// A specialized Result type for safe long array operations.
pub type SafeArrayResult<T> = Result<T, SafeArrayError>;

/// Errors that can occur during safe long array operations.
///
/// Absent indices are not errors; lookups report them as `None`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SafeArrayError {
    /// An iterator mutation was attempted without a current element, either before the first
    /// call to `next` or after the current element was already removed.
    #[error("Iterator has no current element")]
    IllegalState,
    /// The operation is not supported by this array's iterators.
    #[error("Operation is not supported by this iterator")]
    Unsupported,
    /// A bounded lock acquisition did not succeed within the given timeout.
    #[error("Lock could not be acquired within {0:?}")]
    LockTimeout(Duration),
}
