//! Minimal binary property list writer.
//!
//! Only the value kinds needed for keyed-archiver envelopes are supported.
//! Output is byte-compatible with the reference `bplist00` writers the host
//! application used to name its cache entries: dictionaries keep insertion
//! order, scalars are uniqued, containers and UIDs are not.

use std::collections::HashMap;

const MAGIC: &[u8] = b"bplist00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(u64),
    String(String),
    Uid(u64),
    Array(Vec<Value>),
    Dictionary(Vec<(String, Value)>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ScalarKey<'a> {
    Str(&'a str),
    Int(u64),
}

#[derive(Debug)]
enum Object<'a> {
    Pending,
    Str(&'a str),
    Int(u64),
    Uid(u64),
    Array(Vec<usize>),
    Dictionary { keys: Vec<usize>, values: Vec<usize> },
}

#[derive(Default)]
struct Flattener<'a> {
    objects: Vec<Object<'a>>,
    scalars: HashMap<ScalarKey<'a>, usize>,
}

impl<'a> Flattener<'a> {
    fn scalar(&mut self, key: ScalarKey<'a>, object: Object<'a>) -> usize {
        if let Some(&index) = self.scalars.get(&key) {
            return index;
        }
        let index = self.objects.len();
        self.objects.push(object);
        self.scalars.insert(key, index);
        index
    }

    fn flatten(&mut self, value: &'a Value) -> usize {
        match value {
            Value::Integer(number) => self.scalar(ScalarKey::Int(*number), Object::Int(*number)),
            Value::String(text) => self.scalar(ScalarKey::Str(text), Object::Str(text)),
            Value::Uid(uid) => {
                self.objects.push(Object::Uid(*uid));
                self.objects.len() - 1
            }
            Value::Array(items) => {
                let index = self.reserve();
                let refs = items.iter().map(|item| self.flatten(item)).collect();
                self.objects[index] = Object::Array(refs);
                index
            }
            Value::Dictionary(entries) => {
                let index = self.reserve();
                let keys = entries
                    .iter()
                    .map(|(key, _)| self.scalar(ScalarKey::Str(key), Object::Str(key)))
                    .collect();
                let values = entries.iter().map(|(_, value)| self.flatten(value)).collect();
                self.objects[index] = Object::Dictionary { keys, values };
                index
            }
        }
    }

    fn reserve(&mut self) -> usize {
        self.objects.push(Object::Pending);
        self.objects.len() - 1
    }
}

/// Serializes `root` as a binary property list.
#[must_use]
pub fn to_bytes(root: &Value) -> Vec<u8> {
    let mut flattener = Flattener::default();
    let top = flattener.flatten(root);
    let objects = flattener.objects;

    let ref_size = width_for(objects.len() as u64);
    let mut out = MAGIC.to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for object in &objects {
        offsets.push(out.len() as u64);
        write_object(&mut out, object, ref_size);
    }

    let table_offset = out.len() as u64;
    let offset_size = width_for(table_offset);
    for offset in &offsets {
        write_uint(&mut out, *offset, offset_size);
    }

    out.extend_from_slice(&[0; 6]);
    out.push(offset_size as u8);
    out.push(ref_size as u8);
    out.extend_from_slice(&(objects.len() as u64).to_be_bytes());
    out.extend_from_slice(&(top as u64).to_be_bytes());
    out.extend_from_slice(&table_offset.to_be_bytes());
    out
}

fn write_object(out: &mut Vec<u8>, object: &Object<'_>, ref_size: usize) {
    match object {
        Object::Pending => unreachable!("every reserved slot is filled during flattening"),
        Object::Int(number) => write_integer(out, *number),
        Object::Str(text) => {
            if text.is_ascii() {
                write_marker(out, 0x50, text.len() as u64);
                out.extend_from_slice(text.as_bytes());
            } else {
                let units: Vec<u16> = text.encode_utf16().collect();
                write_marker(out, 0x60, units.len() as u64);
                for unit in units {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
        Object::Uid(uid) => {
            let size = width_for(*uid);
            out.push(0x80 | (size as u8 - 1));
            write_uint(out, *uid, size);
        }
        Object::Array(refs) => {
            write_marker(out, 0xA0, refs.len() as u64);
            for reference in refs {
                write_uint(out, *reference as u64, ref_size);
            }
        }
        Object::Dictionary { keys, values } => {
            write_marker(out, 0xD0, keys.len() as u64);
            for reference in keys.iter().chain(values) {
                write_uint(out, *reference as u64, ref_size);
            }
        }
    }
}

fn write_marker(out: &mut Vec<u8>, token: u8, len: u64) {
    if len < 15 {
        out.push(token | len as u8);
    } else {
        out.push(token | 0x0F);
        write_integer(out, len);
    }
}

fn write_integer(out: &mut Vec<u8>, number: u64) {
    if number >= 1 << 63 {
        out.push(0x14);
        out.extend_from_slice(&u128::from(number).to_be_bytes());
        return;
    }
    let size = width_for(number);
    out.push(0x10 | size.trailing_zeros() as u8);
    write_uint(out, number, size);
}

fn write_uint(out: &mut Vec<u8>, number: u64, size: usize) {
    out.extend_from_slice(&number.to_be_bytes()[8 - size..]);
}

/// Smallest of 1/2/4/8 bytes able to hold `value`.
fn width_for(value: u64) -> usize {
    if value < 1 << 8 {
        1
    } else if value < 1 << 16 {
        2
    } else if value < 1 << 32 {
        4
    } else {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_small_dictionary_with_keys_before_values() {
        let value = Value::Dictionary(vec![("root".into(), Value::Uid(1))]);
        let bytes = to_bytes(&value);
        assert_eq!(&bytes[..8], b"bplist00");
        // dict marker, key ref 1, value ref 2
        assert_eq!(&bytes[8..11], &[0xD1, 0x01, 0x02]);
        // "root" as ascii string, then UID(1)
        assert_eq!(&bytes[11..16], b"\x54root");
        assert_eq!(&bytes[16..18], &[0x80, 0x01]);
    }

    #[test]
    fn uniques_repeated_strings() {
        let value = Value::Array(vec![Value::string("a"), Value::string("a")]);
        let bytes = to_bytes(&value);
        assert_eq!(&bytes[8..11], &[0xA2, 0x01, 0x01]);
        let trailer = &bytes[bytes.len() - 32..];
        assert_eq!(u64::from_be_bytes(trailer[8..16].try_into().unwrap()), 2);
    }

    #[test]
    fn long_strings_carry_an_integer_length() {
        let text = "x".repeat(17);
        let bytes = to_bytes(&Value::string(text.clone()));
        assert_eq!(&bytes[8..11], &[0x5F, 0x10, 17]);
        assert_eq!(&bytes[11..28], text.as_bytes());
    }

    #[test]
    fn non_ascii_strings_are_utf16() {
        let bytes = to_bytes(&Value::string("é"));
        assert_eq!(&bytes[8..11], &[0x61, 0x00, 0xE9]);
    }

    #[test]
    fn integers_use_the_narrowest_width() {
        let bytes = to_bytes(&Value::Integer(100_000));
        assert_eq!(&bytes[8..13], &[0x12, 0x00, 0x01, 0x86, 0xA0]);
        let bytes = to_bytes(&Value::Integer(255));
        assert_eq!(&bytes[8..10], &[0x10, 0xFF]);
        let bytes = to_bytes(&Value::Integer(256));
        assert_eq!(&bytes[8..11], &[0x11, 0x01, 0x00]);
    }
}
