// Copyright 2022, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::tlv::tlv_ber::{MAX_LENGTH_OCTETS, MAX_NESTING_DEPTH, MAX_TAG_SUBSEQUENT_BYTES};

/// The error code for the BER-TLV codec.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum TlvError {
    #[error("The input is empty")]
    EmptyInput,
    #[error("The input ends inside the tag field")]
    TruncatedTag,
    #[error("The long-form tag exceeds {} subsequent bytes", MAX_TAG_SUBSEQUENT_BYTES)]
    TagTooLong,
    #[error("The tag bytes don't form exactly one tag")]
    InvalidTag,
    #[error("The tag is not set")]
    MissingTag,
    #[error("The input ends inside the length field")]
    TruncatedLength,
    #[error("The length field uses {0} octets, the maximum is {}", MAX_LENGTH_OCTETS)]
    LengthOctetsExceeded(usize),
    #[error("The value needs {expected} bytes but only {available} remain")]
    TruncatedValue { expected: usize, available: usize },
    #[error("{0} bytes remain after the TLV")]
    TrailingBytes(usize),
    #[error("Constructed TLVs are nested deeper than {}", MAX_NESTING_DEPTH)]
    NestingTooDeep,
    #[error("The length {0} can't be encoded")]
    LengthOutOfRange(usize),
    #[error("Nested TLVs are added but the tag is not constructed")]
    InvalidTagForConstructedContent,
}
