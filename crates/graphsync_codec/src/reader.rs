//! Wire value reader.

use crate::error::{CodecError, CodecResult};
use crate::value::{self, Value};

/// Maximum accepted length for text and byte strings.
/// Caps allocation from untrusted input before it happens.
const MAX_BYTES_LEN: u64 = 64 * 1024 * 1024;

/// Maximum accepted entry count for maps.
const MAX_MAP_ENTRIES: u64 = 1024 * 1024;

/// Deserializes wire values from a byte buffer.
///
/// Getters must be called in the same order as the writer's putters;
/// a kind-tag mismatch means the two ends have drifted out of
/// lock-step and decoding fails.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns true if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads a null.
    pub fn get_null(&mut self) -> CodecResult<()> {
        self.expect_tag(value::TAG_NULL, "null")?;
        Ok(())
    }

    /// Reads a boolean.
    pub fn get_bool(&mut self) -> CodecResult<bool> {
        self.expect_tag(value::TAG_BOOL, "bool")?;
        Ok(self.read_byte()? != 0)
    }

    /// Reads a 32-bit integer.
    pub fn get_i32(&mut self) -> CodecResult<i32> {
        self.expect_tag(value::TAG_INT, "int")?;
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a 64-bit integer.
    pub fn get_long(&mut self) -> CodecResult<i64> {
        self.expect_tag(value::TAG_LONG, "long")?;
        let bytes = self.read_bytes(8)?;
        Ok(i64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Reads a text string.
    pub fn get_str(&mut self) -> CodecResult<String> {
        self.expect_tag(value::TAG_TEXT, "text")?;
        self.read_text()
    }

    /// Reads a text string or null.
    pub fn get_opt_str(&mut self) -> CodecResult<Option<String>> {
        match self.peek_tag()? {
            value::TAG_NULL => {
                self.pos += 1;
                Ok(None)
            }
            value::TAG_TEXT => {
                self.pos += 1;
                self.read_text().map(Some)
            }
            tag => Err(CodecError::kind_mismatch(
                "text or null",
                Value::kind_of_tag(tag).unwrap_or("unknown"),
            )),
        }
    }

    /// Reads a byte string.
    pub fn get_bytes(&mut self) -> CodecResult<Vec<u8>> {
        self.expect_tag(value::TAG_BYTES, "bytes")?;
        let len = self.read_len("bytes", MAX_BYTES_LEN)?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Reads a string-keyed map in wire order.
    pub fn get_map(&mut self) -> CodecResult<Vec<(String, Value)>> {
        self.expect_tag(value::TAG_MAP, "map")?;
        self.read_map_body()
    }

    /// Reads any value by its kind tag.
    pub fn get_value(&mut self) -> CodecResult<Value> {
        let tag = self.read_byte()?;
        match tag {
            value::TAG_NULL => Ok(Value::Null),
            value::TAG_BOOL => Ok(Value::Bool(self.read_byte()? != 0)),
            value::TAG_INT => {
                let bytes = self.read_bytes(4)?;
                Ok(Value::Int(i32::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ])))
            }
            value::TAG_LONG => {
                let bytes = self.read_bytes(8)?;
                Ok(Value::Long(i64::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ])))
            }
            value::TAG_TEXT => self.read_text().map(Value::Text),
            value::TAG_BYTES => {
                let len = self.read_len("bytes", MAX_BYTES_LEN)?;
                Ok(Value::Bytes(self.read_bytes(len)?.to_vec()))
            }
            value::TAG_MAP => self.read_map_body().map(Value::Map),
            tag => Err(CodecError::InvalidTag(tag)),
        }
    }

    fn read_map_body(&mut self) -> CodecResult<Vec<(String, Value)>> {
        let count = self.read_len("map", MAX_MAP_ENTRIES)?;
        let mut pairs = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let key = self.read_text()?;
            let val = self.get_value()?;
            pairs.push((key, val));
        }
        Ok(pairs)
    }

    fn read_text(&mut self) -> CodecResult<String> {
        let len = self.read_len("text", MAX_BYTES_LEN)?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    fn expect_tag(&mut self, expected: u8, kind: &'static str) -> CodecResult<()> {
        let tag = self.read_byte()?;
        if tag == expected {
            Ok(())
        } else {
            match Value::kind_of_tag(tag) {
                Some(found) => Err(CodecError::kind_mismatch(kind, found)),
                None => Err(CodecError::InvalidTag(tag)),
            }
        }
    }

    fn peek_tag(&self) -> CodecResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(CodecError::UnexpectedEof)
    }

    fn read_len(&mut self, kind: &'static str, max: u64) -> CodecResult<usize> {
        let bytes = self.read_bytes(4)?;
        let len = u64::from(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        if len > max {
            return Err(CodecError::LengthExceeded { kind, len, max });
        }
        Ok(len as usize)
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;
    use proptest::prelude::*;

    #[test]
    fn kind_mismatch_is_detected() {
        let mut w = Writer::new();
        w.put_i32(7);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let err = r.get_str().unwrap_err();
        assert_eq!(err, CodecError::kind_mismatch("text", "int"));
    }

    #[test]
    fn truncated_input_fails() {
        let mut w = Writer::new();
        w.put_long(42);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes[..5]);
        assert_eq!(r.get_long().unwrap_err(), CodecError::UnexpectedEof);
    }

    #[test]
    fn oversized_length_is_rejected_before_allocation() {
        // text tag + 4 GiB-ish declared length, no payload
        let bytes = [0x04, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.get_str().unwrap_err(),
            CodecError::LengthExceeded { kind: "text", .. }
        ));
    }

    #[test]
    fn oversized_map_count_is_rejected() {
        let bytes = [0x06, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.get_map().unwrap_err(),
            CodecError::LengthExceeded { kind: "map", .. }
        ));
    }

    #[test]
    fn unknown_tag_fails() {
        let bytes = [0x7F];
        let mut r = Reader::new(&bytes);
        assert_eq!(r.get_value().unwrap_err(), CodecError::InvalidTag(0x7F));
    }

    #[test]
    fn opt_str_roundtrip() {
        let mut w = Writer::new();
        w.put_opt_str(Some("salt"));
        w.put_opt_str(None);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.get_opt_str().unwrap(), Some("salt".to_string()));
        assert_eq!(r.get_opt_str().unwrap(), None);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::Int),
            any::<i64>().prop_map(Value::Long),
            "\\PC{0,16}".prop_map(Value::Text),
            prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        ];
        leaf.prop_recursive(3, 48, 6, |inner| {
            prop::collection::vec(("\\PC{0,8}", inner), 0..6).prop_map(Value::Map)
        })
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_value_and_order(value in value_strategy()) {
            let mut w = Writer::new();
            w.put_value(&value);
            let bytes = w.into_bytes();

            let mut r = Reader::new(&bytes);
            let decoded = r.get_value().unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert!(r.is_empty());
        }
    }
}
