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

#![no_main]

use libfuzzer_sys::fuzz_target;
use uwb_fira::params::UwbConfiguration;
use uwb_fira::tlv::TlvBer;

fuzz_target!(|data: &[u8]| {
    let tlv = match TlvBer::parse(data) {
        Ok(tlv) => tlv,
        Err(_) => return,
    };

    // A parsed TLV is re-encoded into the bytes it was parsed from, except that the length
    // field may be shortened.
    let encoded = tlv.encode().expect("a parsed TLV must be encodable");
    assert_eq!(TlvBer::parse(&encoded), Ok(tlv.clone()));

    if let Ok(config) = UwbConfiguration::from_data_object(&tlv) {
        let data_object = config.to_data_object().expect("a decoded configuration must encode");
        assert_eq!(UwbConfiguration::from_data_object(&data_object), Ok(config));
    }
});
