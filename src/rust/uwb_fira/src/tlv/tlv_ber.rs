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

use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::tlv::error::TlvError;

/// The maximum number of bytes following the first byte of a long-form tag.
pub const MAX_TAG_SUBSEQUENT_BYTES: usize = 3;
/// The maximum number of octets of a long-form length.
pub const MAX_LENGTH_OCTETS: usize = 4;
/// The maximum nesting depth of the constructed TLVs accepted by the decoder.
pub const MAX_NESTING_DEPTH: usize = 16;

const BITMASK_CLASS: u8 = 0xC0;
const BITMASK_TYPE: u8 = 0x20;
const BITMASK_TAG_SHORT: u8 = 0x1F;
const BITMASK_TAG_LONG: u8 = 0x7F;
const BITMASK_TAG_MORE_BYTES: u8 = 0x80;
const TAG_VALUE_LONG_FIELD: u8 = 0x1F;
const BITMASK_LENGTH_LONG_FORM: u8 = 0x80;
const BITMASK_LENGTH_SHORT: u8 = 0x7F;

/// The class of a tag, encoded in bits 7-6 of the first tag byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum TagClass {
    Universal = 0,
    Application = 1,
    ContextSpecific = 2,
    Private = 3,
}

impl TagClass {
    fn from_tag_byte(tag: u8) -> Self {
        // The shifted value is always in 0..=3.
        TagClass::from_u8((tag & BITMASK_CLASS) >> 6).unwrap_or(TagClass::Private)
    }
}

/// Whether the value of a TLV is raw data or a sequence of nested TLVs, encoded in bit 5 of the
/// first tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Primitive,
    Constructed,
}

impl TagType {
    fn from_tag_byte(tag: u8) -> Self {
        match tag & BITMASK_TYPE {
            0 => TagType::Primitive,
            _ => TagType::Constructed,
        }
    }
}

/// The result of parsing the tag field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub tag_class: TagClass,
    pub tag_type: TagType,
    pub tag_number: Vec<u8>,
    pub tag_raw: Vec<u8>,
    pub bytes_consumed: usize,
}

/// Parse the tag field at the beginning of |data|.
pub fn parse_tag(data: &[u8]) -> Result<ParsedTag, TlvError> {
    let first = *data.first().ok_or(TlvError::EmptyInput)?;
    let tag_class = TagClass::from_tag_byte(first);
    let tag_type = TagType::from_tag_byte(first);

    if first & BITMASK_TAG_SHORT != TAG_VALUE_LONG_FIELD {
        return Ok(ParsedTag {
            tag_class,
            tag_type,
            tag_number: vec![first & BITMASK_TAG_SHORT],
            tag_raw: vec![first],
            bytes_consumed: 1,
        });
    }

    let mut tag_number = vec![];
    let mut index = 1;
    loop {
        if index > MAX_TAG_SUBSEQUENT_BYTES {
            return Err(TlvError::TagTooLong);
        }
        let byte = *data.get(index).ok_or(TlvError::TruncatedTag)?;
        tag_number.push(byte & BITMASK_TAG_LONG);
        index += 1;
        if byte & BITMASK_TAG_MORE_BYTES == 0 {
            break;
        }
    }

    Ok(ParsedTag {
        tag_class,
        tag_type,
        tag_number,
        tag_raw: data[..index].to_vec(),
        bytes_consumed: index,
    })
}

/// Parse the length field at the beginning of |data|. Returns the length and the number of bytes
/// consumed.
pub fn parse_length(data: &[u8]) -> Result<(usize, usize), TlvError> {
    let first = *data.first().ok_or(TlvError::TruncatedLength)?;
    if first & BITMASK_LENGTH_LONG_FORM == 0 {
        return Ok(((first & BITMASK_LENGTH_SHORT) as usize, 1));
    }

    let num_octets = (first & BITMASK_LENGTH_SHORT) as usize;
    if num_octets > MAX_LENGTH_OCTETS {
        return Err(TlvError::LengthOctetsExceeded(num_octets));
    }
    let octets = data.get(1..1 + num_octets).ok_or(TlvError::TruncatedLength)?;
    let length = octets.iter().fold(0_usize, |length, octet| (length << 8) | *octet as usize);
    Ok((length, 1 + num_octets))
}

/// Take |length| bytes of value from the beginning of |data|. Returns the value and the number of
/// bytes consumed.
pub fn parse_value(data: &[u8], length: usize) -> Result<(&[u8], usize), TlvError> {
    match data.get(..length) {
        Some(value) => Ok((value, length)),
        None => Err(TlvError::TruncatedValue { expected: length, available: data.len() }),
    }
}

/// Encode |length| in the BER length form: a single byte up to 127, otherwise a marker byte
/// `0x80 | n` followed by the n big-endian length bytes.
pub fn encode_length(length: usize) -> Result<Vec<u8>, TlvError> {
    if length <= BITMASK_LENGTH_SHORT as usize {
        return Ok(vec![length as u8]);
    }
    let length = u32::try_from(length).map_err(|_| TlvError::LengthOutOfRange(length))?;
    let bytes = length.to_be_bytes();
    // length > 127, so at least one byte is non-zero.
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let mut encoding = vec![BITMASK_LENGTH_LONG_FORM | (bytes.len() - skip) as u8];
    encoding.extend_from_slice(&bytes[skip..]);
    Ok(encoding)
}

/// The value of a TLV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    /// The raw data of a primitive TLV.
    Primitive(Vec<u8>),
    /// The nested TLVs of a constructed TLV.
    Constructed(Vec<TlvBer>),
}

/// A BER-TLV element.
///
/// The tag type always matches the variant of the value: a constructed TLV holds its nested TLVs
/// and a primitive TLV holds raw data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvBer {
    tag_class: TagClass,
    tag_type: TagType,
    tag_number: Vec<u8>,
    tag_raw: Vec<u8>,
    value: TlvValue,
}

impl TlvBer {
    /// Create a primitive TLV with the one-byte |tag|.
    pub fn new_primitive(tag: u8, value: Vec<u8>) -> Result<Self, TlvError> {
        let parsed = parse_single_tag(&[tag])?;
        if parsed.tag_type != TagType::Primitive {
            return Err(TlvError::InvalidTag);
        }
        Ok(Self::from_parts(parsed, TlvValue::Primitive(value)))
    }

    /// Create a constructed TLV with the one-byte |tag|.
    pub fn new_constructed(tag: u8, values: Vec<TlvBer>) -> Result<Self, TlvError> {
        let parsed = parse_single_tag(&[tag])?;
        if parsed.tag_type != TagType::Constructed {
            return Err(TlvError::InvalidTagForConstructedContent);
        }
        Ok(Self::from_parts(parsed, TlvValue::Constructed(values)))
    }

    pub(super) fn from_parts(tag: ParsedTag, value: TlvValue) -> Self {
        Self {
            tag_class: tag.tag_class,
            tag_type: tag.tag_type,
            tag_number: tag.tag_number,
            tag_raw: tag.tag_raw,
            value,
        }
    }

    /// Decode one TLV at the beginning of |data|. Returns the TLV and the number of bytes
    /// consumed; the remaining bytes are left untouched.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), TlvError> {
        Self::decode_nested(data, 0)
    }

    /// Decode |data| that contains exactly one TLV.
    pub fn parse(data: &[u8]) -> Result<Self, TlvError> {
        let (tlv, consumed) = Self::decode(data)?;
        match data.len() - consumed {
            0 => Ok(tlv),
            remaining => Err(TlvError::TrailingBytes(remaining)),
        }
    }

    fn decode_nested(data: &[u8], depth: usize) -> Result<(Self, usize), TlvError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(TlvError::NestingTooDeep);
        }

        let tag = parse_tag(data)?;
        let mut offset = tag.bytes_consumed;
        let (length, consumed) = parse_length(&data[offset..])?;
        offset += consumed;
        let (value, consumed) = parse_value(&data[offset..], length)?;
        offset += consumed;

        let value = match tag.tag_type {
            TagType::Primitive => TlvValue::Primitive(value.to_vec()),
            TagType::Constructed => TlvValue::Constructed(decode_children(value, depth + 1)?),
        };
        Ok((Self::from_parts(tag, value), offset))
    }

    /// Encode the TLV into bytes.
    pub fn encode(&self) -> Result<Vec<u8>, TlvError> {
        let value = self.encode_value()?;
        let mut bytes = self.tag_raw.clone();
        bytes.extend(encode_length(value.len())?);
        bytes.extend(value);
        Ok(bytes)
    }

    fn encode_value(&self) -> Result<Vec<u8>, TlvError> {
        match &self.value {
            TlvValue::Primitive(data) => Ok(data.clone()),
            TlvValue::Constructed(values) => {
                let mut bytes = vec![];
                for value in values.iter() {
                    bytes.extend(value.encode()?);
                }
                Ok(bytes)
            }
        }
    }

    pub fn tag_class(&self) -> TagClass {
        self.tag_class
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    pub fn tag_number(&self) -> &[u8] {
        &self.tag_number
    }

    /// The complete tag bytes, as they appear on the wire.
    pub fn tag_raw(&self) -> &[u8] {
        &self.tag_raw
    }

    pub fn value(&self) -> &TlvValue {
        &self.value
    }

    pub fn is_constructed(&self) -> bool {
        self.tag_type == TagType::Constructed
    }

    pub fn is_primitive(&self) -> bool {
        self.tag_type == TagType::Primitive
    }

    /// The raw data of a primitive TLV. Empty for a constructed TLV.
    pub fn data(&self) -> &[u8] {
        match &self.value {
            TlvValue::Primitive(data) => data,
            TlvValue::Constructed(_) => &[],
        }
    }

    /// The nested TLVs of a constructed TLV. Empty for a primitive TLV.
    pub fn values(&self) -> &[TlvBer] {
        match &self.value {
            TlvValue::Primitive(_) => &[],
            TlvValue::Constructed(values) => values,
        }
    }
}

impl fmt::Display for TlvBer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X?} ", self.tag_raw)?;
        match &self.value {
            TlvValue::Primitive(data) => write!(f, "{:02X?}", data),
            TlvValue::Constructed(values) => {
                write!(f, "{{ ")?;
                for value in values.iter() {
                    write!(f, "{} ", value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Decode the value region of a constructed TLV. The region must be consumed completely.
pub(super) fn decode_children(mut data: &[u8], depth: usize) -> Result<Vec<TlvBer>, TlvError> {
    let mut values = vec![];
    while !data.is_empty() {
        let (value, consumed) = TlvBer::decode_nested(data, depth)?;
        values.push(value);
        data = &data[consumed..];
    }
    Ok(values)
}

pub(super) fn parse_single_tag(tag: &[u8]) -> Result<ParsedTag, TlvError> {
    let parsed = parse_tag(tag)?;
    if parsed.bytes_consumed != tag.len() {
        return Err(TlvError::InvalidTag);
    }
    Ok(parsed)
}
