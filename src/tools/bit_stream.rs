//! Append-only bit stream used for the Huffman payload.
//!
//! Bits are packed most significant first, in the order they are appended.
//! This is also the byte mapping used by `bit_vec`, so the backing `BitVec`
//! converts to and from the stored payload bytes directly.

use bit_vec::BitVec;
use crate::Error;
use crate::tools::ledger::{self,Kind};

/// Read position within a `BitStream`.
/// `bit_index` counts from the most significant bit and is always less than 8.
#[derive(Clone,Copy,Debug,Default,PartialEq,Eq)]
pub struct Cursor {
    pub byte_index: usize,
    pub bit_index: usize
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }
    fn from_bit_count(count: usize) -> Self {
        Self {
            byte_index: count / 8,
            bit_index: count % 8
        }
    }
    /// absolute position in bits
    pub fn bit_count(&self) -> usize {
        self.byte_index * 8 + self.bit_index
    }
}

pub struct BitStream {
    bits: BitVec
}

impl BitStream {
    /// Create an empty stream
    pub fn new() -> Self {
        ledger::acquire(Kind::BitStream);
        Self {
            bits: BitVec::new()
        }
    }
    /// Create an empty stream with room for `nbits` bits.
    /// The caller is responsible for checking that `nbits` is sensible.
    pub fn with_capacity(nbits: usize) -> Self {
        ledger::acquire(Kind::BitStream);
        Self {
            bits: BitVec::with_capacity(nbits)
        }
    }
    /// Rebuild a stream from its packed bytes and the count of valid bits in the last byte.
    pub fn from_bytes(bytes: &[u8],bits_in_last_byte: u8) -> Result<Self,Error> {
        let consistent = match bytes.len() {
            0 => bits_in_last_byte == 0,
            _ => bits_in_last_byte >= 1 && bits_in_last_byte <= 8
        };
        if !consistent {
            log::error!("{} valid bits in last byte is inconsistent with {} bytes",bits_in_last_byte,bytes.len());
            return Err(Error::CorruptedStream);
        }
        let mut bits = BitVec::from_bytes(bytes);
        if bytes.len() > 0 {
            bits.truncate(bytes.len()*8 - 8 + bits_in_last_byte as usize);
        }
        ledger::acquire(Kind::BitStream);
        Ok(Self { bits })
    }
    /// Append one bit
    pub fn push(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// Append the `num_bits` low bits of `code`, most significant first
    pub fn push_code(&mut self,num_bits: u8,code: u128) {
        for i in (0..num_bits).rev() {
            self.bits.push((code >> i) & 1 > 0);
        }
    }
    /// length in bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    /// length in bytes, counting a partial last byte
    pub fn byte_len(&self) -> usize {
        (self.bits.len() + 7) / 8
    }
    /// number of valid bits in the last byte, 0 only if the stream is empty
    pub fn bits_in_last_byte(&self) -> u8 {
        match (self.bits.len(),self.bits.len() % 8) {
            (0,_) => 0,
            (_,0) => 8,
            (_,rem) => rem as u8
        }
    }
    /// packed bytes, unused bits of the last byte are 0
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }
    /// cursor positioned just past the last valid bit
    pub fn end(&self) -> Cursor {
        Cursor::from_bit_count(self.bits.len())
    }
    pub fn is_end(&self,curs: &Cursor) -> bool {
        curs.bit_count() >= self.bits.len()
    }
    /// Read the bit under the cursor and advance the cursor, `None` at end of stream.
    pub fn read_bit(&self,curs: &mut Cursor) -> Option<bool> {
        let bit = self.bits.get(curs.bit_count())?;
        *curs = Cursor::from_bit_count(curs.bit_count() + 1);
        Some(bit)
    }
    /// Explicitly give the stream back, equivalent to dropping it
    pub fn release(self) {}
}

impl Drop for BitStream {
    fn drop(&mut self) {
        ledger::release(Kind::BitStream);
    }
}

impl std::fmt::Debug for BitStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f,"BitStream({} bits: {})",self.len(),hex::encode(self.to_bytes()))
    }
}

#[test]
fn packing_is_msb_first() {
    let mut stream = BitStream::new();
    for bit in [true,true,true,false] {
        stream.push(bit);
    }
    assert_eq!(stream.to_bytes(),vec![0xe0]);
    assert_eq!(stream.bits_in_last_byte(),4);
    assert_eq!(stream.byte_len(),1);
}

#[test]
fn last_byte_count() {
    let mut stream = BitStream::new();
    assert_eq!(stream.bits_in_last_byte(),0);
    for i in 0..20 {
        stream.push(i % 3 == 0);
        assert!(stream.bits_in_last_byte() >= 1 && stream.bits_in_last_byte() <= 8);
    }
    assert_eq!(stream.bits_in_last_byte(),4);
    for _i in 0..4 {
        stream.push(false);
    }
    assert_eq!(stream.bits_in_last_byte(),8);
    stream.push(true);
    assert_eq!(stream.bits_in_last_byte(),1);
    assert_eq!(stream.byte_len(),4);
}

#[test]
fn push_code_order() {
    let mut stream = BitStream::new();
    stream.push_code(3,0b101);
    stream.push_code(6,0b000111);
    stream.push_code(4,0xf);
    assert_eq!(hex::encode(stream.to_bytes()),"a3f8");
    assert_eq!(stream.len(),13);
}

#[test]
fn cursor_reads_to_end() {
    let stream = BitStream::from_bytes(&[0xa5,0x80],1).expect("bad stream");
    assert_eq!(stream.len(),9);
    assert_eq!(stream.end(),Cursor { byte_index: 1, bit_index: 1 });
    let mut curs = Cursor::new();
    let mut read = Vec::new();
    while !stream.is_end(&curs) {
        read.push(stream.read_bit(&mut curs).unwrap() as u8);
    }
    assert_eq!(read,vec![1,0,1,0,0,1,0,1,1]);
    assert_eq!(curs,stream.end());
    assert_eq!(stream.read_bit(&mut curs),None);
    assert_eq!(stream.len(),9);
}

#[test]
fn inconsistent_trailing_count() {
    assert_eq!(BitStream::from_bytes(&[],3).unwrap_err(),Error::CorruptedStream);
    assert_eq!(BitStream::from_bytes(&[0xff],0).unwrap_err(),Error::CorruptedStream);
    assert_eq!(BitStream::from_bytes(&[0xff],9).unwrap_err(),Error::CorruptedStream);
    assert!(BitStream::from_bytes(&[],0).expect("empty stream").is_empty());
}

#[test]
fn streams_are_counted() {
    let before = ledger::live(Kind::BitStream);
    let stream = BitStream::new();
    let other = BitStream::from_bytes(&[1],8).expect("bad stream");
    assert_eq!(ledger::live(Kind::BitStream),before+2);
    stream.release();
    other.release();
    assert_eq!(ledger::live(Kind::BitStream),before);
    let _ = BitStream::from_bytes(&[1],0);
    assert_eq!(ledger::live(Kind::BitStream),before);
}
