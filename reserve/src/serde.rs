//! Key and value encoding for content storage.
//!
//! ```text
//! Record key:     | version (u8) | 0x10 | id (u64 BE) |
//! Sequence key:   | version (u8) | 0x20 |
//!
//! Record value:   | status (u8) | comments_open (u8) | kind | title | slug | body |
//!                   each string is | len (u32 BE) | utf-8 bytes |
//! Sequence value: | next_id (u64 BE) |
//! ```
//!
//! Big-endian identifiers make key order match numeric order, so the highest
//! identifier is the last key under the record tag.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use common::BytesRange;

use crate::error::{Error, Result};
use crate::model::{RecordFields, RecordId, RecordStatus};

/// Key format version.
pub const KEY_VERSION: u8 = 0x01;

/// Record tag for content records.
pub const RECORD_TAG: u8 = 0x10;

/// Record tag for the singleton sequence record.
pub const SEQUENCE_TAG: u8 = 0x20;

const RECORD_KEY_LEN: usize = 10;

pub fn encode_record_key(id: RecordId) -> Bytes {
    let mut buf = BytesMut::with_capacity(RECORD_KEY_LEN);
    buf.put_u8(KEY_VERSION);
    buf.put_u8(RECORD_TAG);
    buf.put_u64(id.get());
    buf.freeze()
}

pub fn decode_record_key(key: &[u8]) -> Result<RecordId> {
    if key.len() != RECORD_KEY_LEN {
        return Err(Error::Encoding(format!(
            "record key must be {} bytes, got {}",
            RECORD_KEY_LEN,
            key.len()
        )));
    }
    if key[0] != KEY_VERSION {
        return Err(Error::Encoding(format!(
            "invalid key version: expected 0x{:02x}, got 0x{:02x}",
            KEY_VERSION, key[0]
        )));
    }
    if key[1] != RECORD_TAG {
        return Err(Error::Encoding(format!(
            "invalid record tag: expected 0x{:02x}, got 0x{:02x}",
            RECORD_TAG, key[1]
        )));
    }
    let mut id = &key[2..];
    Ok(RecordId::new(id.get_u64()))
}

/// Range covering every content record key.
pub fn record_key_range() -> BytesRange {
    BytesRange::prefix(Bytes::from_static(&[KEY_VERSION, RECORD_TAG]))
}

pub fn sequence_key() -> Bytes {
    Bytes::from_static(&[KEY_VERSION, SEQUENCE_TAG])
}

pub fn encode_sequence_value(next: RecordId) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_u64(next.get());
    buf.freeze()
}

pub fn decode_sequence_value(data: &[u8]) -> Result<RecordId> {
    if data.len() != 8 {
        return Err(Error::Encoding(format!(
            "sequence value must be 8 bytes, got {}",
            data.len()
        )));
    }
    let mut buf = data;
    Ok(RecordId::new(buf.get_u64()))
}

pub fn encode_record_value(fields: &RecordFields) -> Result<Bytes> {
    let strings = [
        ("kind", &fields.kind),
        ("title", &fields.title),
        ("slug", &fields.slug),
        ("body", &fields.body),
    ];
    let len = 2 + strings.iter().map(|(_, s)| 4 + s.len()).sum::<usize>();
    let mut buf = BytesMut::with_capacity(len);
    buf.put_u8(fields.status.as_u8());
    buf.put_u8(u8::from(fields.comments_open));
    for (field, s) in strings {
        buf.put_u32(string_len(field, s.len())?);
        buf.put_slice(s.as_bytes());
    }
    Ok(buf.freeze())
}

/// Length prefix of a string field; fails for strings longer than `u32::MAX`.
fn string_len(field: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        Error::InvalidInput(format!(
            "{} is {} bytes, longer than the {} byte limit",
            field,
            len,
            u32::MAX
        ))
    })
}

pub fn decode_record_value(data: &[u8]) -> Result<RecordFields> {
    let mut buf = data;
    let status_byte = take_u8(&mut buf, "status")?;
    let status = RecordStatus::from_u8(status_byte)
        .ok_or_else(|| Error::Encoding(format!("unknown record status {}", status_byte)))?;
    let comments_open = match take_u8(&mut buf, "comments_open")? {
        0 => false,
        1 => true,
        other => {
            return Err(Error::Encoding(format!(
                "invalid comments_open flag {}",
                other
            )));
        }
    };
    let kind = take_string(&mut buf, "kind")?;
    let title = take_string(&mut buf, "title")?;
    let slug = take_string(&mut buf, "slug")?;
    let body = take_string(&mut buf, "body")?;
    if buf.has_remaining() {
        return Err(Error::Encoding(format!(
            "{} trailing bytes after record value",
            buf.remaining()
        )));
    }
    Ok(RecordFields {
        title,
        body,
        slug,
        status,
        kind,
        comments_open,
    })
}

fn take_u8(buf: &mut &[u8], field: &str) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(Error::Encoding(format!("missing {} byte", field)));
    }
    Ok(buf.get_u8())
}

fn take_string(buf: &mut &[u8], field: &str) -> Result<String> {
    if buf.remaining() < 4 {
        return Err(Error::Encoding(format!("missing {} length", field)));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(Error::Encoding(format!(
            "{} needs {} bytes, {} remaining",
            field,
            len,
            buf.remaining()
        )));
    }
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec())
        .map_err(|e| Error::Encoding(format!("{} is not valid utf-8: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_order_record_keys_numerically() {
        // given
        let low = encode_record_key(RecordId::new(255));
        let high = encode_record_key(RecordId::new(256));

        // then
        assert!(low < high);
    }

    #[test]
    fn should_decode_encoded_record_key() {
        let key = encode_record_key(RecordId::new(42));

        assert_eq!(key.len(), RECORD_KEY_LEN);
        assert_eq!(decode_record_key(&key).unwrap(), RecordId::new(42));
    }

    #[test]
    fn should_reject_key_with_wrong_tag() {
        // given
        let mut key = encode_record_key(RecordId::new(7)).to_vec();
        key[1] = SEQUENCE_TAG;

        // when
        let result = decode_record_key(&key);

        // then
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn should_keep_sequence_key_outside_record_range() {
        let range = record_key_range();

        assert!(range.contains(&encode_record_key(RecordId::new(u64::MAX))));
        assert!(!range.contains(&sequence_key()));
    }

    #[test]
    fn should_preserve_placeholder_fields() {
        // given
        let fields = RecordFields::placeholder();

        // when
        let decoded = decode_record_value(&encode_record_value(&fields).unwrap()).unwrap();

        // then
        assert_eq!(decoded, fields);
        assert!(decoded.is_placeholder());
    }

    #[test]
    fn should_reject_truncated_record_value() {
        // given
        let encoded = encode_record_value(&RecordFields::post("Hello", "World")).unwrap();

        // when
        let result = decode_record_value(&encoded[..encoded.len() - 1]);

        // then
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn should_reject_unknown_status() {
        let mut encoded = encode_record_value(&RecordFields::post("a", "b"))
            .unwrap()
            .to_vec();
        encoded[0] = 9;

        assert!(matches!(
            decode_record_value(&encoded),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn should_refuse_string_longer_than_length_prefix() {
        assert_eq!(string_len("body", 5).unwrap(), 5);
        assert_eq!(string_len("body", u32::MAX as usize).unwrap(), u32::MAX);
        assert!(matches!(
            string_len("body", u32::MAX as usize + 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn should_reject_short_sequence_value() {
        assert!(decode_sequence_value(&[0, 1, 2]).is_err());
        assert_eq!(
            decode_sequence_value(&encode_sequence_value(RecordId::new(11))).unwrap(),
            RecordId::new(11)
        );
    }
}
