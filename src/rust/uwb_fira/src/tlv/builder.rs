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

use crate::tlv::error::TlvError;
use crate::tlv::tlv_ber::{
    decode_children, encode_length, parse_single_tag, ParsedTag, TagType, TlvBer, TlvValue,
};

/// The builder of TlvBer. It accumulates the value bytes or the nested TLVs, and freezes them into
/// an immutable TlvBer when build() is called.
///
/// Multi-byte integers are always written in big-endian order.
#[derive(Debug, Default)]
pub struct TlvBerBuilder {
    tag: Option<ParsedTag>,
    data: Vec<u8>,
    has_nested_tlv: bool,
}

impl TlvBerBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the one-byte tag.
    pub fn set_tag(&mut self, tag: u8) -> Result<&mut Self, TlvError> {
        self.set_tag_bytes(&[tag])
    }

    /// Set the complete tag bytes. The bytes must form exactly one tag.
    pub fn set_tag_bytes(&mut self, tag: &[u8]) -> Result<&mut Self, TlvError> {
        self.tag = Some(parse_single_tag(tag)?);
        Ok(self)
    }

    /// Append raw bytes to the value.
    pub fn write_data(&mut self, data: &[u8]) -> &mut Self {
        self.data.extend_from_slice(data);
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.write_data(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write_data(&value.to_be_bytes())
    }

    /// Append the BER length of |value| followed by |value|.
    pub fn write_value(&mut self, value: &[u8]) -> Result<&mut Self, TlvError> {
        let length = encode_length(value.len())?;
        self.data.extend(length);
        Ok(self.write_data(value))
    }

    /// Append the encoding of a nested TLV. The built TLV must then have a constructed tag.
    pub fn add_tlv(&mut self, tlv: &TlvBer) -> Result<&mut Self, TlvError> {
        let bytes = tlv.encode()?;
        self.has_nested_tlv = true;
        Ok(self.write_data(&bytes))
    }

    /// Build the TlvBer.
    ///
    /// The value of a constructed tag is decoded into the nested TLVs, so it must consist of
    /// complete TLVs.
    pub fn build(&self) -> Result<TlvBer, TlvError> {
        let tag = self.tag.clone().ok_or(TlvError::MissingTag)?;
        let value = match tag.tag_type {
            TagType::Primitive if self.has_nested_tlv => {
                return Err(TlvError::InvalidTagForConstructedContent);
            }
            TagType::Primitive => TlvValue::Primitive(self.data.clone()),
            TagType::Constructed => TlvValue::Constructed(decode_children(&self.data, 1)?),
        };
        Ok(TlvBer::from_parts(tag, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_primitive() {
        let tlv = TlvBerBuilder::new()
            .set_tag(0x99)
            .unwrap()
            .write_u16(0x0960)
            .write_u32(0x01020304)
            .write_u8(0xFF)
            .build()
            .unwrap();

        assert!(tlv.is_primitive());
        assert_eq!(tlv.data(), &[0x09, 0x60, 0x01, 0x02, 0x03, 0x04, 0xFF]);
        assert_eq!(
            tlv.encode().unwrap(),
            vec![0x99, 0x07, 0x09, 0x60, 0x01, 0x02, 0x03, 0x04, 0xFF]
        );
    }

    #[test]
    fn test_build_constructed() {
        let child1 = TlvBer::new_primitive(0x82, vec![0x01]).unwrap();
        let child2 = TlvBer::new_primitive(0x8B, vec![0x09]).unwrap();
        let tlv = TlvBerBuilder::new()
            .set_tag(0xA3)
            .unwrap()
            .add_tlv(&child1)
            .unwrap()
            .add_tlv(&child2)
            .unwrap()
            .build()
            .unwrap();

        assert!(tlv.is_constructed());
        assert_eq!(tlv.values(), &[child1, child2]);
        assert_eq!(tlv.encode().unwrap(), vec![0xA3, 0x06, 0x82, 0x01, 0x01, 0x8B, 0x01, 0x09]);
    }

    #[test]
    fn test_build_constructed_from_raw_data() {
        let mut builder = TlvBerBuilder::new();
        builder.set_tag(0xA3).unwrap().write_data(&[0x82]).write_value(&[0x00]).unwrap();
        let tlv = builder.build().unwrap();
        assert_eq!(tlv.values(), &[TlvBer::new_primitive(0x82, vec![0x00]).unwrap()]);

        // Incomplete nested TLV.
        builder.write_data(&[0x8B]);
        assert_eq!(builder.build(), Err(TlvError::TruncatedLength));
    }

    #[test]
    fn test_build_nested_tlv_with_primitive_tag() {
        let child = TlvBer::new_primitive(0x82, vec![0x01]).unwrap();
        let result = TlvBerBuilder::new().set_tag(0x83).unwrap().add_tlv(&child).unwrap().build();
        assert_eq!(result, Err(TlvError::InvalidTagForConstructedContent));
    }

    #[test]
    fn test_build_without_tag() {
        assert_eq!(TlvBerBuilder::new().write_u8(1).build(), Err(TlvError::MissingTag));
    }

    #[test]
    fn test_write_value_long_form() {
        let value = vec![0xAB; 130];
        let tlv = TlvBerBuilder::new().set_tag(0x80).unwrap().write_value(&value).unwrap().build();
        let data = tlv.unwrap().data().to_vec();
        assert_eq!(&data[..2], &[0x81, 130]);
        assert_eq!(&data[2..], value.as_slice());
    }
}
