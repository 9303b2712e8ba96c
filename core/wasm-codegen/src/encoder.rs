//! Low-level WebAssembly binary encoding.
//!
//! Every integer in the binary format is LEB128 (unsigned for counts and
//! indices, signed for `i32.const` operands); floats are 8 little-endian
//! bytes; names are length-prefixed UTF-8. Writes go into an in-memory
//! buffer and cannot fail.

/// An append-only byte buffer with the format's primitive encodings.
#[derive(Default)]
pub(crate) struct Encoder {
    bytes: Vec<u8>,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub(crate) fn byte(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Unsigned LEB128.
    pub(crate) fn u32(&mut self, value: u32) {
        leb128::write::unsigned(&mut self.bytes, u64::from(value))
            .expect("write to Vec cannot fail");
    }

    /// Signed LEB128, as used by `i32.const`.
    pub(crate) fn i32(&mut self, value: i32) {
        leb128::write::signed(&mut self.bytes, i64::from(value))
            .expect("write to Vec cannot fail");
    }

    /// IEEE-754 bits, little-endian, as used by `f64.const`.
    pub(crate) fn f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Length-prefixed UTF-8 name.
    pub(crate) fn name(&mut self, text: &str) {
        self.u32(u32::try_from(text.len()).expect("name length fits in u32"));
        self.raw(text.as_bytes());
    }

    /// A numbered section: id byte, payload size, payload.
    pub(crate) fn section(&mut self, id: u8, payload: &Encoder) {
        self.byte(id);
        self.u32(u32::try_from(payload.bytes.len()).expect("section size fits in u32"));
        self.raw(&payload.bytes);
    }
}
