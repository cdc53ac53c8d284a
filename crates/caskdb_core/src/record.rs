//! Record codec.
//!
//! Every entry in a segment file is one self-delimiting record:
//!
//! ```text
//! | total_size (4) | key_len (4) | key (K) | type_len (4) | type (T) | value_len (4) | value (V) |
//! ```
//!
//! All integers are little-endian. `total_size` covers the whole record,
//! including itself, so `total_size == 16 + K + T + V`. The framing lives
//! inside each record: recovery can scan a segment without any external
//! table of contents, and point reads parse just enough header to reach the
//! value without materializing the full record.

use crate::error::{CoreError, CoreResult};
use crate::value::Value;
use std::io::{BufRead, Seek};

/// Bytes occupied by the four length fields of a record.
pub const LENGTH_FIELDS: usize = 16;

/// A single `(key, type, value)` entry.
///
/// The value is kept in its on-disk form (type tag plus text) so that
/// re-encoding a decoded record is byte-exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The key, unique within a segment's index.
    pub key: String,
    /// The on-disk value type tag (`string` or `int64`).
    pub tag: String,
    /// The textual form of the value.
    pub value: String,
}

impl Record {
    /// Creates a record from a key and a typed value.
    #[must_use]
    pub fn from_value(key: impl Into<String>, value: &Value) -> Self {
        Self {
            key: key.into(),
            tag: value.type_tag().to_string(),
            value: value.to_text(),
        }
    }

    /// Returns the typed view of this record's value.
    #[must_use]
    pub fn value(&self) -> Value {
        Value::from_tagged(&self.tag, self.value.clone())
    }

    /// Returns the encoded size of this record in bytes.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        LENGTH_FIELDS + self.key.len() + self.tag.len() + self.value.len()
    }

    /// Encodes the record into its framed byte form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let total = self.encoded_size();
        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(&(total as u32).to_le_bytes());
        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        buf.extend_from_slice(&(self.tag.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.tag.as_bytes());
        buf.extend_from_slice(&(self.value.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.value.as_bytes());
        buf
    }

    /// Decodes a record from a buffer holding exactly one record.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if any length field would index past the buffer,
    /// the lengths disagree with `total_size`, or a field is not valid UTF-8.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < LENGTH_FIELDS {
            return Err(CoreError::corrupt("record shorter than its framing"));
        }

        let total = read_u32(data, 0) as usize;
        if total != data.len() {
            return Err(CoreError::corrupt(format!(
                "record length field {} disagrees with buffer of {} bytes",
                total,
                data.len()
            )));
        }

        let mut pos = 4;
        let key_len = take_u32(data, &mut pos)? as usize;
        let key = take_str(data, &mut pos, key_len, "key")?;
        let tag_len = take_u32(data, &mut pos)? as usize;
        let tag = take_str(data, &mut pos, tag_len, "type")?;
        let value_len = take_u32(data, &mut pos)? as usize;
        let value = take_str(data, &mut pos, value_len, "value")?;

        if pos != total {
            return Err(CoreError::corrupt("record contains trailing bytes"));
        }

        Ok(Self { key, tag, value })
    }
}

/// Reads the value of the record the reader is positioned at.
///
/// Parses just enough framing to skip the key and type fields, then reads
/// exactly the value bytes. The reader must be positioned at a record start.
///
/// # Errors
///
/// Returns `Corrupt` on a short read inside the record and `Io` if the
/// underlying reader fails.
pub fn read_value<R: BufRead + Seek>(reader: &mut R) -> CoreResult<String> {
    let mut header = [0u8; 8];
    read_framed(reader, &mut header)?;
    let key_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    reader.seek_relative(i64::from(key_len))?;

    let mut len = [0u8; 4];
    read_framed(reader, &mut len)?;
    let type_len = u32::from_le_bytes(len);
    reader.seek_relative(i64::from(type_len))?;

    read_framed(reader, &mut len)?;
    let value_len = u32::from_le_bytes(len) as usize;

    let mut value = vec![0u8; value_len];
    read_framed(reader, &mut value)?;
    String::from_utf8(value).map_err(|_| CoreError::corrupt("record value is not valid UTF-8"))
}

/// Reads exactly `buf.len()` bytes, mapping a short read to `Corrupt`.
fn read_framed<R: BufRead>(reader: &mut R, buf: &mut [u8]) -> CoreResult<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            CoreError::corrupt("record truncated mid-frame")
        } else {
            CoreError::Io(err)
        }
    })
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn take_u32(data: &[u8], pos: &mut usize) -> CoreResult<u32> {
    if *pos + 4 > data.len() {
        return Err(CoreError::corrupt("record length field past end of buffer"));
    }
    let v = read_u32(data, *pos);
    *pos += 4;
    Ok(v)
}

fn take_str(data: &[u8], pos: &mut usize, len: usize, field: &str) -> CoreResult<String> {
    if *pos + len > data.len() {
        return Err(CoreError::corrupt(format!(
            "record {field} field points past end of buffer"
        )));
    }
    let bytes = &data[*pos..*pos + len];
    *pos += len;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CoreError::corrupt(format!("record {field} is not valid UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{BufReader, Cursor};

    fn text_record(key: &str, value: &str) -> Record {
        Record::from_value(key, &Value::from(value))
    }

    #[test]
    fn encode_layout() {
        let record = text_record("key", "val");
        let encoded = record.encode();

        // 16 framing bytes + 3 key + 6 tag + 3 value
        assert_eq!(encoded.len(), 28);
        assert_eq!(&encoded[0..4], &28u32.to_le_bytes());
        assert_eq!(&encoded[4..8], &3u32.to_le_bytes());
        assert_eq!(&encoded[8..11], b"key");
        assert_eq!(&encoded[11..15], &6u32.to_le_bytes());
        assert_eq!(&encoded[15..21], b"string");
        assert_eq!(&encoded[21..25], &3u32.to_le_bytes());
        assert_eq!(&encoded[25..28], b"val");
    }

    #[test]
    fn round_trip() {
        let record = Record::from_value("answer", &Value::Int64(42));
        let decoded = Record::decode(&record.encode()).unwrap();
        assert_eq!(record, decoded);
        assert_eq!(decoded.value(), Value::Int64(42));
    }

    #[test]
    fn decode_rejects_bad_total() {
        let mut encoded = text_record("k", "v").encode();
        encoded[0] = 0xFF;
        assert!(matches!(
            Record::decode(&encoded),
            Err(CoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn decode_rejects_field_past_end() {
        let mut encoded = text_record("k", "v").encode();
        // Claim a key longer than the record.
        encoded[4..8].copy_from_slice(&100u32.to_le_bytes());
        assert!(matches!(
            Record::decode(&encoded),
            Err(CoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn decode_rejects_short_buffer() {
        assert!(matches!(
            Record::decode(&[0u8; 7]),
            Err(CoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn read_value_at_record_start() {
        let record = text_record("some-key", "some-value");
        let mut reader = BufReader::new(Cursor::new(record.encode()));
        assert_eq!(read_value(&mut reader).unwrap(), "some-value");
    }

    #[test]
    fn read_value_skips_to_second_record() {
        let first = text_record("a", "first");
        let second = text_record("b", "second");
        let mut bytes = first.encode();
        let offset = bytes.len() as u64;
        bytes.extend_from_slice(&second.encode());

        let mut reader = BufReader::new(Cursor::new(bytes));
        reader.seek_relative(offset as i64).unwrap();
        assert_eq!(read_value(&mut reader).unwrap(), "second");
    }

    #[test]
    fn read_value_truncated_record() {
        let mut encoded = text_record("key", "value").encode();
        encoded.truncate(encoded.len() - 2);
        let mut reader = BufReader::new(Cursor::new(encoded));
        assert!(matches!(
            read_value(&mut reader),
            Err(CoreError::Corrupt { .. })
        ));
    }

    proptest! {
        #[test]
        fn codec_round_trip(key in "[a-zA-Z0-9_./-]{0,64}", tag in "[a-z0-9]{0,16}", value in ".{0,256}") {
            let record = Record { key, tag, value };
            let encoded = record.encode();
            prop_assert_eq!(encoded.len(), record.encoded_size());

            let decoded = Record::decode(&encoded).unwrap();
            prop_assert_eq!(&decoded, &record);

            let mut reader = BufReader::new(Cursor::new(encoded));
            prop_assert_eq!(read_value(&mut reader).unwrap(), record.value);
        }
    }
}
