// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! A minimal reader for the Matter TLV encoding.
//!
//! Every element starts with a control octet: the top three bits select the
//! tag form, the bottom five bits the element type.  Tag, length and value
//! fields follow, all little-endian.  Containers are flat in the encoding and
//! are closed by an anonymous end-of-container element, so the reader hands
//! them out as ordinary elements and leaves nesting to the caller.

use super::errors::Error;

const TAG_CONTROL_MASK: u8 = 0xE0;
const ELEMENT_TYPE_MASK: u8 = 0x1F;

const TAG_ANONYMOUS: u8 = 0x00;
const TAG_CONTEXT: u8 = 0x20;
const TAG_COMMON_PROFILE_2: u8 = 0x40;
const TAG_COMMON_PROFILE_4: u8 = 0x60;
const TAG_IMPLICIT_PROFILE_2: u8 = 0x80;
const TAG_IMPLICIT_PROFILE_4: u8 = 0xA0;
const TAG_FULLY_QUALIFIED_6: u8 = 0xC0;
const TAG_FULLY_QUALIFIED_8: u8 = 0xE0;

const TYPE_SIGNED_INT: u8 = 0x00; // ..=0x03
const TYPE_UNSIGNED_INT: u8 = 0x04; // ..=0x07
const TYPE_FALSE: u8 = 0x08;
const TYPE_TRUE: u8 = 0x09;
const TYPE_FLOAT: u8 = 0x0A;
const TYPE_DOUBLE: u8 = 0x0B;
const TYPE_UTF8_STRING: u8 = 0x0C; // ..=0x0F
const TYPE_BYTE_STRING: u8 = 0x10; // ..=0x13
const TYPE_NULL: u8 = 0x14;
const TYPE_STRUCTURE: u8 = 0x15;
const TYPE_ARRAY: u8 = 0x16;
const TYPE_LIST: u8 = 0x17;
const TYPE_END_OF_CONTAINER: u8 = 0x18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Anonymous,
    Context(u8),
    CommonProfile(u32),
    ImplicitProfile(u32),
    FullyQualified {
        vendor_id: u16,
        profile_num: u16,
        tag_num: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Signed(i64),
    Unsigned(u64),
    Bool(bool),
    Float(f32),
    Double(f64),
    Utf8(&'a str),
    Bytes(&'a [u8]),
    Null,
    Structure,
    Array,
    List,
    EndOfContainer,
}

impl Value<'_> {
    pub fn is_container_start(&self) -> bool {
        matches!(self, Value::Structure | Value::Array | Value::List)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Signed(_) => "signed integer",
            Value::Unsigned(_) => "unsigned integer",
            Value::Bool(_) => "boolean",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Utf8(_) => "utf8 string",
            Value::Bytes(_) => "byte string",
            Value::Null => "null",
            Value::Structure => "structure",
            Value::Array => "array",
            Value::List => "list",
            Value::EndOfContainer => "end of container",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element<'a> {
    pub tag: Tag,
    pub value: Value<'a>,
}

/// Sequential reader over a TLV encoded buffer.  Returned string and byte
/// values borrow from the input.
pub struct TlvReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TlvReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Read the next element, or `None` once the input is exhausted
    pub fn next_element(&mut self) -> Result<Option<Element<'a>>, Error> {
        if self.is_at_end() {
            return Ok(None);
        }

        let control = self.take(1, "control octet")?[0];

        let tag = self.read_tag(control & TAG_CONTROL_MASK)?;
        let value = self.read_value(control & ELEMENT_TYPE_MASK)?;

        if value == Value::EndOfContainer && tag != Tag::Anonymous {
            return Err(Error::Syntax("end of container must be anonymous".to_string()));
        }

        Ok(Some(Element { tag, value }))
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], Error> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                Error::UnexpectedEnd(format!("{what}: need {n} bytes at offset {}", self.pos))
            })?;

        let s = &self.buf[self.pos..end];
        self.pos = end;

        Ok(s)
    }

    fn read_le(&mut self, n: usize, what: &str) -> Result<u64, Error> {
        let s = self.take(n, what)?;

        Ok(s.iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn read_tag(&mut self, control: u8) -> Result<Tag, Error> {
        let tag = match control {
            TAG_ANONYMOUS => Tag::Anonymous,
            TAG_CONTEXT => Tag::Context(self.read_le(1, "context tag")? as u8),
            TAG_COMMON_PROFILE_2 => Tag::CommonProfile(self.read_le(2, "profile tag")? as u32),
            TAG_COMMON_PROFILE_4 => Tag::CommonProfile(self.read_le(4, "profile tag")? as u32),
            TAG_IMPLICIT_PROFILE_2 => {
                Tag::ImplicitProfile(self.read_le(2, "profile tag")? as u32)
            }
            TAG_IMPLICIT_PROFILE_4 => {
                Tag::ImplicitProfile(self.read_le(4, "profile tag")? as u32)
            }
            TAG_FULLY_QUALIFIED_6 | TAG_FULLY_QUALIFIED_8 => {
                let vendor_id = self.read_le(2, "vendor id")? as u16;
                let profile_num = self.read_le(2, "profile number")? as u16;
                let tag_len = if control == TAG_FULLY_QUALIFIED_6 { 2 } else { 4 };
                let tag_num = self.read_le(tag_len, "tag number")? as u32;

                Tag::FullyQualified {
                    vendor_id,
                    profile_num,
                    tag_num,
                }
            }
            _ => unreachable!("tag control is a 3-bit field"),
        };

        Ok(tag)
    }

    fn read_value(&mut self, element_type: u8) -> Result<Value<'a>, Error> {
        let value = match element_type {
            0x00..=0x03 => {
                let n = 1usize << (element_type - TYPE_SIGNED_INT);
                let raw = self.read_le(n, "signed integer")?;
                // sign-extend from n bytes
                let shift = 64 - 8 * n as u32;
                Value::Signed(((raw << shift) as i64) >> shift)
            }
            0x04..=0x07 => {
                let n = 1usize << (element_type - TYPE_UNSIGNED_INT);
                Value::Unsigned(self.read_le(n, "unsigned integer")?)
            }
            TYPE_FALSE => Value::Bool(false),
            TYPE_TRUE => Value::Bool(true),
            TYPE_FLOAT => Value::Float(f32::from_bits(self.read_le(4, "float")? as u32)),
            TYPE_DOUBLE => Value::Double(f64::from_bits(self.read_le(8, "double")?)),
            0x0C..=0x0F => {
                let s = self.read_string(element_type - TYPE_UTF8_STRING, "utf8 string")?;
                let s = std::str::from_utf8(s).map_err(|e| Error::Syntax(e.to_string()))?;
                Value::Utf8(s)
            }
            0x10..=0x13 => {
                Value::Bytes(self.read_string(element_type - TYPE_BYTE_STRING, "byte string")?)
            }
            TYPE_NULL => Value::Null,
            TYPE_STRUCTURE => Value::Structure,
            TYPE_ARRAY => Value::Array,
            TYPE_LIST => Value::List,
            TYPE_END_OF_CONTAINER => Value::EndOfContainer,
            reserved => {
                return Err(Error::Syntax(format!("reserved element type {reserved:#04x}")))
            }
        };

        Ok(value)
    }

    fn read_string(&mut self, len_selector: u8, what: &str) -> Result<&'a [u8], Error> {
        let len = self.read_le(1usize << len_selector, what)?;
        let len = usize::try_from(len).map_err(|e| Error::Syntax(format!("{what}: {e}")))?;

        self.take(len, what)
    }
}

/// Encoder used by tests to build attestation payloads
#[cfg(test)]
#[derive(Default)]
pub(crate) struct TlvWriter {
    buf: Vec<u8>,
}

#[cfg(test)]
impl TlvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_tag(&mut self, tag: Tag, element_type: u8) {
        match tag {
            Tag::Anonymous => self.buf.push(TAG_ANONYMOUS | element_type),
            Tag::Context(n) => {
                self.buf.push(TAG_CONTEXT | element_type);
                self.buf.push(n);
            }
            Tag::CommonProfile(n) => {
                self.buf.push(TAG_COMMON_PROFILE_4 | element_type);
                self.buf.extend_from_slice(&n.to_le_bytes());
            }
            Tag::ImplicitProfile(n) => {
                self.buf.push(TAG_IMPLICIT_PROFILE_4 | element_type);
                self.buf.extend_from_slice(&n.to_le_bytes());
            }
            Tag::FullyQualified {
                vendor_id,
                profile_num,
                tag_num,
            } => {
                if let Ok(short) = u16::try_from(tag_num) {
                    self.buf.push(TAG_FULLY_QUALIFIED_6 | element_type);
                    self.buf.extend_from_slice(&vendor_id.to_le_bytes());
                    self.buf.extend_from_slice(&profile_num.to_le_bytes());
                    self.buf.extend_from_slice(&short.to_le_bytes());
                } else {
                    self.buf.push(TAG_FULLY_QUALIFIED_8 | element_type);
                    self.buf.extend_from_slice(&vendor_id.to_le_bytes());
                    self.buf.extend_from_slice(&profile_num.to_le_bytes());
                    self.buf.extend_from_slice(&tag_num.to_le_bytes());
                }
            }
        }
    }

    pub fn start_structure(&mut self, tag: Tag) -> &mut Self {
        self.put_tag(tag, TYPE_STRUCTURE);
        self
    }

    pub fn start_array(&mut self, tag: Tag) -> &mut Self {
        self.put_tag(tag, TYPE_ARRAY);
        self
    }

    pub fn end_container(&mut self) -> &mut Self {
        self.put_tag(Tag::Anonymous, TYPE_END_OF_CONTAINER);
        self
    }

    pub fn put_u32(&mut self, tag: Tag, v: u32) -> &mut Self {
        self.put_tag(tag, TYPE_UNSIGNED_INT + 2);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_u64(&mut self, tag: Tag, v: u64) -> &mut Self {
        self.put_tag(tag, TYPE_UNSIGNED_INT + 3);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_i8(&mut self, tag: Tag, v: i8) -> &mut Self {
        self.put_tag(tag, TYPE_SIGNED_INT);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_bytes(&mut self, tag: Tag, v: &[u8]) -> &mut Self {
        if let Ok(len) = u8::try_from(v.len()) {
            self.put_tag(tag, TYPE_BYTE_STRING);
            self.buf.push(len);
        } else {
            self.put_tag(tag, TYPE_BYTE_STRING + 1);
            self.buf.extend_from_slice(&(v.len() as u16).to_le_bytes());
        }
        self.buf.extend_from_slice(v);
        self
    }

    pub fn put_str(&mut self, tag: Tag, v: &str) -> &mut Self {
        self.put_tag(tag, TYPE_UTF8_STRING);
        self.buf.push(v.len() as u8);
        self.buf.extend_from_slice(v.as_bytes());
        self
    }

    pub fn put_raw(&mut self, raw: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(raw);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        self.buf.clone()
    }
}
