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

use std::convert::TryInto;

use log::error;

// The FiRa data objects carry the integers in big-endian order.

pub fn u16_to_bytes(value: u16) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn u32_to_bytes(value: u32) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn bytes_to_u8(value: &[u8]) -> Option<u8> {
    Some(u8::from_be_bytes(value.try_into().ok()?))
}

pub fn bytes_to_u16(value: &[u8]) -> Option<u16> {
    Some(u16::from_be_bytes(value.try_into().ok()?))
}

pub fn bytes_to_u32(value: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(value.try_into().ok()?))
}

pub fn validate(value: bool, err_msg: &str) -> Option<()> {
    match value {
        true => Some(()),
        false => {
            error!("{}", err_msg);
            None
        }
    }
}
