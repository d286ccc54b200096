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

//! This module provides the BER-TLV (ISO/IEC 8825-1) codec used by the FiRa data objects.

mod builder;
mod error;
mod tlv_ber;

// Re-export the public elements.
pub use builder::TlvBerBuilder;
pub use error::TlvError;
pub use tlv_ber::{
    encode_length, parse_length, parse_tag, parse_value, ParsedTag, TagClass, TagType, TlvBer,
    TlvValue, MAX_LENGTH_OCTETS, MAX_NESTING_DEPTH, MAX_TAG_SUBSEQUENT_BYTES,
};
