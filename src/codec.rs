//! Static Huffman coding of byte buffers
//!
//! The whole buffer is tallied first, a code table is built from the tally, and
//! then every byte is replaced by its code.  The code table has to travel with the
//! bit stream, see the `container` module for a way to store both.
//!
//! ```rust
//! use huffpack::{codec,STD_OPTIONS};
//! let (table,stream) = codec::encode("AAAB".as_bytes(),&STD_OPTIONS)?;
//! assert_eq!(stream.to_bytes(),vec![0xe0]);
//! let expanded = codec::decode(&table,&stream,&STD_OPTIONS)?;
//! assert_eq!(expanded,"AAAB".as_bytes());
//! table.release();
//! stream.release();
//! # Ok::<(),huffpack::Error>(())
//! ```

use crate::{Error,Options,GuardBound};
use crate::symbols::{FrequencyTable,CodeTable,TableOrder};
use crate::tools::bit_stream::{BitStream,Cursor};
use crate::tools::huff_tree;

/// width of the alphabet, the legacy decoding bound
const BYTE_WIDTH: u8 = 8;

/// Build a code table for `dat` and encode it.
/// Returns the table and the bit stream, the table is sorted by frequency
/// if `opt.compact_table` is set, otherwise by value.
pub fn encode(dat: &[u8],opt: &Options) -> Result<(CodeTable,BitStream),Error> {
    let tally = FrequencyTable::build(dat)?;
    let mut table = huff_tree::build_code_table(&tally,opt)?;
    tally.release();
    let nbits = table.encoded_bits().ok_or(Error::AllocationFailure)?;
    log::debug!("{} bytes will encode as {} bits",dat.len(),nbits);
    table.sort_by_value();
    let mut stream = BitStream::with_capacity(nbits);
    pack(dat,&table,&mut stream)?;
    if opt.compact_table {
        table.sort_by_frequency();
    }
    Ok((table,stream))
}

/// Encode `dat` with a table built elsewhere, e.g., from a representative sample.
/// Fails with `SymbolMissing` if `dat` contains a byte that has no code.
pub fn encode_with_table(dat: &[u8],table: &mut CodeTable) -> Result<BitStream,Error> {
    if dat.is_empty() {
        return Err(Error::EmptyInput);
    }
    let order = table.order();
    table.sort_by_value();
    let mut stream = BitStream::new();
    let result = pack(dat,table,&mut stream);
    if order == TableOrder::ByFrequency {
        table.sort_by_frequency();
    }
    result.map(|_| stream)
}

/// Append codes for `dat` to `stream`, `table` has to be sorted by value
fn pack(dat: &[u8],table: &CodeTable,stream: &mut BitStream) -> Result<(),Error> {
    for &c in dat {
        match table.lookup(c) {
            Some(symb) => stream.push_code(symb.code_len,symb.code_bits),
            None => {
                log::error!("no code for symbol {:02X}",c);
                return Err(Error::SymbolMissing);
            }
        }
    }
    log::debug!("packed {} bits",stream.len());
    Ok(())
}

/// Decode the entire `stream` using `table`, the table can be in any order.
/// The stream has to end exactly on a code boundary.
pub fn decode(table: &CodeTable,stream: &BitStream,opt: &Options) -> Result<Vec<u8>,Error> {
    if table.is_empty() {
        return Err(Error::EmptyInput);
    }
    let max_len = table.max_code_len();
    let guard = match opt.guard {
        GuardBound::ByteWidth => {
            if max_len > BYTE_WIDTH {
                log::warn!("table has {} bit codes, decoding will stop at {} bits",max_len,BYTE_WIDTH);
            }
            BYTE_WIDTH
        },
        GuardBound::MaxCodeLength => max_len
    };
    let min_len = table.symbols().iter().map(|s| s.code_len).min().unwrap_or(1).max(1);
    let mut ans: Vec<u8> = Vec::new();
    ans.try_reserve(stream.len() / min_len as usize).map_err(|_| Error::AllocationFailure)?;
    let mut curs = Cursor::new();
    let mut k: u128 = 0;
    let mut j: u8 = 0;
    while !stream.is_end(&curs) {
        let bit = stream.read_bit(&mut curs).ok_or(Error::CorruptedStream)?;
        k = (k << 1) | bit as u128;
        j += 1;
        match table.find_code(j,k) {
            Some(symb) => {
                ans.push(symb.value);
                k = 0;
                j = 0;
            },
            None if j >= guard => {
                log::error!("no code matched after {} bits at byte {}",j,curs.byte_index);
                return Err(Error::CorruptedStream);
            },
            None => {}
        }
    }
    if j > 0 {
        log::error!("stream ends inside a code, {} bits pending",j);
        return Err(Error::CorruptedStream);
    }
    log::debug!("decoded {} bytes from {} bits",ans.len(),stream.len());
    Ok(ans)
}

#[cfg(test)]
use crate::STD_OPTIONS;
#[cfg(test)]
use crate::tools::ledger::{self,Kind};

#[test]
fn aaab_scenario() {
    let (table,stream) = encode("AAAB".as_bytes(),&STD_OPTIONS).expect("encode failed");
    assert_eq!(table.len(),2);
    let a = table.lookup(b'A').unwrap();
    let b = table.lookup(b'B').unwrap();
    assert_eq!((a.code_len,a.code_bits,a.freq),(1,1,3));
    assert_eq!((b.code_len,b.code_bits,b.freq),(1,0,1));
    assert_eq!(table.symbols()[0].value,b'A');
    assert_eq!(stream.len(),4);
    assert_eq!(stream.bits_in_last_byte(),4);
    assert_eq!(stream.to_bytes(),hex::decode("e0").unwrap());
    let expanded = decode(&table,&stream,&STD_OPTIONS).expect("decode failed");
    assert_eq!(expanded,"AAAB".as_bytes());
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let (table,stream) = encode(test_data,&STD_OPTIONS).expect("encode failed");
    assert!(table.is_prefix_free());
    let expanded = decode(&table,&stream,&STD_OPTIONS).expect("decode failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data: Vec<u8> = (0..4096).map(|i: u32| (i*i % 251) as u8).collect();
    let (table,stream) = encode(&test_data,&STD_OPTIONS).expect("encode failed");
    let expanded = decode(&table,&stream,&STD_OPTIONS).expect("decode failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn invertibility_by_value_ties() {
    let mut opt = STD_OPTIONS;
    opt.tie_break = crate::TieBreak::ByteValue;
    opt.compact_table = false;
    let test_data = "zyxwvutsrqponmlkjihgfedcba".as_bytes();
    let (table,stream) = encode(test_data,&opt).expect("encode failed");
    assert_eq!(table.order(),TableOrder::ByValue);
    // 26 equal weights: 6 symbols get 4 bits, 20 get 5 bits
    assert_eq!(stream.len(),6*4 + 20*5);
    let expanded = decode(&table,&stream,&opt).expect("decode failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn single_symbol_input() {
    let test_data = [0x55;13];
    let (table,stream) = encode(&test_data,&STD_OPTIONS).expect("encode failed");
    assert_eq!(table.len(),1);
    assert_eq!(table.symbols()[0].code_len,1);
    assert_eq!(stream.len(),13);
    assert_eq!(stream.to_bytes(),vec![0,0]);
    assert_eq!(stream.bits_in_last_byte(),5);
    let expanded = decode(&table,&stream,&STD_OPTIONS).expect("decode failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn determinism() {
    let test_data = "the quick brown fox jumps over the lazy dog".as_bytes();
    let (t1,s1) = encode(test_data,&STD_OPTIONS).expect("encode failed");
    let (t2,s2) = encode(test_data,&STD_OPTIONS).expect("encode failed");
    assert_eq!(t1.symbols(),t2.symbols());
    assert_eq!(s1.to_bytes(),s2.to_bytes());
    assert_eq!(s1.len(),s2.len());
}

#[test]
fn empty_input() {
    assert_eq!(encode(&[],&STD_OPTIONS).err(),Some(Error::EmptyInput));
}

#[test]
fn unmatched_pattern_rejected() {
    let table = CodeTable::from_codes(&[(b'x',2,0b00),(b'y',2,0b01)]).expect("bad table");
    let stream = BitStream::from_bytes(&[0b0001_1100],6).expect("bad stream");
    assert_eq!(decode(&table,&stream,&STD_OPTIONS).err(),Some(Error::CorruptedStream));
}

#[test]
fn misaligned_end_rejected() {
    let (table,_stream) = encode("abracadabra".as_bytes(),&STD_OPTIONS).expect("encode failed");
    // 'b' has a 3 bit code, keep only 2 of them
    let b = table.lookup(b'b').unwrap();
    assert_eq!(b.code_len,3);
    let mut stream = BitStream::new();
    stream.push_code(2,b.code_bits >> 1);
    assert_eq!(decode(&table,&stream,&STD_OPTIONS).err(),Some(Error::CorruptedStream));
}

#[test]
fn byte_width_guard() {
    // fibonacci weights give a tree deeper than 8
    let mut test_data = Vec::new();
    let fib = [1,1,2,3,5,8,13,21,34,55,89,144];
    for (i,f) in fib.iter().enumerate() {
        test_data.extend(std::iter::repeat(b'a' + i as u8).take(*f));
    }
    let (table,stream) = encode(&test_data,&STD_OPTIONS).expect("encode failed");
    assert_eq!(table.max_code_len(),11);
    let expanded = decode(&table,&stream,&STD_OPTIONS).expect("decode failed");
    assert_eq!(test_data,expanded);
    let mut legacy = STD_OPTIONS;
    legacy.guard = GuardBound::ByteWidth;
    assert_eq!(decode(&table,&stream,&legacy).err(),Some(Error::CorruptedStream));
}

#[test]
fn foreign_table() {
    let (mut table,stream) = encode("banana".as_bytes(),&STD_OPTIONS).expect("encode failed");
    let again = encode_with_table("nab".as_bytes(),&mut table).expect("encode failed");
    assert_eq!(table.order(),TableOrder::ByFrequency);
    assert_eq!(decode(&table,&again,&STD_OPTIONS).expect("decode failed"),"nab".as_bytes());
    assert_eq!(encode_with_table("bandana".as_bytes(),&mut table).err(),Some(Error::SymbolMissing));
    stream.release();
}

#[test]
fn everything_is_released() {
    let tables = ledger::live(Kind::CodeTable);
    let streams = ledger::live(Kind::BitStream);
    let tallies = ledger::live(Kind::FrequencyTable);
    let (table,stream) = encode("mississippi".as_bytes(),&STD_OPTIONS).expect("encode failed");
    assert_eq!(ledger::live(Kind::CodeTable),tables+1);
    assert_eq!(ledger::live(Kind::BitStream),streams+1);
    assert_eq!(ledger::live(Kind::FrequencyTable),tallies);
    table.release();
    stream.release();
    assert_eq!(ledger::live(Kind::CodeTable),tables);
    assert_eq!(ledger::live(Kind::BitStream),streams);
    // failure paths leave nothing behind
    assert!(encode(&[],&STD_OPTIONS).is_err());
    let (mut table,stream) = encode("abc".as_bytes(),&STD_OPTIONS).expect("encode failed");
    assert!(encode_with_table("abd".as_bytes(),&mut table).is_err());
    assert_eq!(ledger::live(Kind::BitStream),streams+1);
    table.release();
    stream.release();
    assert_eq!(ledger::live(Kind::CodeTable),tables);
    assert_eq!(ledger::live(Kind::BitStream),streams);
    assert_eq!(ledger::live(Kind::Tree),0);
}
