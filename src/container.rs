//! Huffman Container
//!
//! Stores the code table and the packed bit stream together.  The layout is
//!
//! * 4 byte magic `HFPK`
//! * 1 byte word width of the writing platform
//! * 1 byte number of symbols minus one
//! * for each symbol: value, code length, code bits in `ceil(len/8)` bytes, big endian
//! * payload length in bytes, little endian, word width bytes
//! * 1 byte count of valid bits in the last payload byte
//! * payload
//!
//! Length fields use the native word width, so a file can only be expanded on a
//! platform with the same word width.  This is checked and reported as `PlatformMismatch`.

use std::io::{Cursor,Read,Write,Seek,SeekFrom,BufReader,BufWriter,ErrorKind};
use crate::{DYNERR,Error,Options};
use crate::codec;
use crate::symbols::CodeTable;
use crate::tools::bit_stream::BitStream;

pub const MAGIC: [u8;4] = *b"HFPK";
pub const WORD_WIDTH: usize = std::mem::size_of::<usize>();

/// Everything preceding the payload
struct Header {
    table: CodeTable,
    payload_len: usize,
    bits_in_last_byte: u8
}

/// Read exactly `buf.len()` bytes, running out of data is reported as `short`
fn read_or<R: Read>(reader: &mut R,buf: &mut [u8],short: Error) -> Result<(),DYNERR> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            log::error!("file ended early: {}",short);
            Err(Box::new(short))
        },
        Err(e) => Err(Box::new(e))
    }
}

fn write_header<W: Write>(table: &CodeTable,stream: &BitStream,writer: &mut W) -> Result<u64,DYNERR> {
    let mut header: Vec<u8> = Vec::new();
    header.extend_from_slice(&MAGIC);
    header.push(WORD_WIDTH as u8);
    header.push((table.len() - 1) as u8);
    for symb in table.symbols() {
        header.push(symb.value);
        header.push(symb.code_len);
        let code_bytes = (symb.code_len as usize + 7) / 8;
        for i in (0..code_bytes).rev() {
            header.push((symb.code_bits >> (8*i)) as u8);
        }
    }
    header.extend_from_slice(&usize::to_le_bytes(stream.byte_len()));
    header.push(stream.bits_in_last_byte());
    writer.write_all(&header)?;
    Ok(header.len() as u64)
}

fn read_header<R: Read>(reader: &mut R) -> Result<Header,DYNERR> {
    let mut magic: [u8;4] = [0;4];
    read_or(reader,&mut magic,Error::FileTypeMismatch)?;
    if magic != MAGIC {
        log::error!("magic was {}",hex::encode(magic));
        return Err(Box::new(Error::FileTypeMismatch));
    }
    let mut by: [u8;2] = [0;2];
    read_or(reader,&mut by,Error::CorruptedStream)?;
    if by[0] as usize != WORD_WIDTH {
        log::error!("file has {} byte words, this platform has {}",by[0],WORD_WIDTH);
        return Err(Box::new(Error::PlatformMismatch));
    }
    let num_symbols = by[1] as usize + 1;
    let mut codes: Vec<(u8,u8,u128)> = Vec::new();
    for _i in 0..num_symbols {
        read_or(reader,&mut by,Error::CorruptedStream)?;
        let (value,code_len) = (by[0],by[1]);
        let mut code_bytes = vec![0;(code_len as usize + 7) / 8];
        if code_bytes.len() > 16 {
            log::error!("code length {} is too long",code_len);
            return Err(Box::new(Error::CorruptedStream));
        }
        read_or(reader,&mut code_bytes,Error::CorruptedStream)?;
        let code_bits = code_bytes.iter().fold(0u128,|acc,b| (acc << 8) | *b as u128);
        codes.push((value,code_len,code_bits));
    }
    let table = CodeTable::from_codes(&codes)?;
    let mut word: [u8;WORD_WIDTH] = [0;WORD_WIDTH];
    read_or(reader,&mut word,Error::CorruptedStream)?;
    let payload_len = usize::from_le_bytes(word);
    read_or(reader,&mut by[0..1],Error::CorruptedStream)?;
    log::debug!("header has {} symbols, payload is {} bytes",table.len(),payload_len);
    Ok(Header {
        table,
        payload_len,
        bits_in_last_byte: by[0]
    })
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BufWriter::new(compressed_out);
    reader.seek(SeekFrom::Start(0))?;
    let mut dat: Vec<u8> = Vec::new();
    reader.read_to_end(&mut dat)?;
    let (table,stream) = codec::encode(&dat,opt)?;
    let header_len = write_header(&table,&stream,&mut writer)?;
    let payload = stream.to_bytes();
    writer.write_all(&payload)?;
    writer.flush()?;
    log::debug!("wrote {} byte header and {} byte payload",header_len,payload.len());
    table.release();
    stream.release();
    Ok((dat.len() as u64,header_len + payload.len() as u64))
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(compressed_in);
    let mut writer = BufWriter::new(expanded_out);
    let compressed_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    let header = read_header(&mut reader)?;
    // read through `take` so a bogus length cannot trigger a huge allocation
    let mut payload: Vec<u8> = Vec::new();
    reader.by_ref().take(header.payload_len as u64).read_to_end(&mut payload)?;
    if payload.len() < header.payload_len {
        log::error!("payload has {} of {} bytes",payload.len(),header.payload_len);
        return Err(Box::new(Error::CorruptedStream));
    }
    if reader.stream_position()? < compressed_size {
        log::warn!("ignoring {} bytes after payload",compressed_size - reader.stream_position()?);
    }
    let stream = BitStream::from_bytes(&payload,header.bits_in_last_byte)?;
    let dat = codec::decode(&header.table,&stream,opt)?;
    writer.write_all(&dat)?;
    writer.flush()?;
    stream.release();
    header.table.release();
    Ok((compressed_size,dat.len() as u64))
}

/// Read only the header of a container and return the stored code table
pub fn read_table<R: Read>(compressed_in: &mut R) -> Result<CodeTable,DYNERR> {
    let header = read_header(compressed_in)?;
    Ok(header.table)
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[cfg(test)]
use crate::STD_OPTIONS;

#[cfg(test)]
fn error_of(result: Result<Vec<u8>,DYNERR>) -> Error {
    match result {
        Ok(_) => panic!("expected an error"),
        Err(e) => *e.downcast_ref::<Error>().expect("not a codec error")
    }
}

#[test]
fn compression_works() {
    let compressed = compress_slice("AAAB".as_bytes(),&STD_OPTIONS).expect("compression failed");
    let expected = [
        hex::decode("4846504b").unwrap(),
        vec![WORD_WIDTH as u8,1],
        hex::decode("410101420100").unwrap(),
        usize::to_le_bytes(1).to_vec(),
        vec![4,0xe0]
    ].concat();
    assert_eq!(compressed,expected);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data: Vec<u8> = (0..=255).chain((0..2000).map(|i: u32| (i % 7) as u8 * 30)).collect();
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn stored_table() {
    let compressed = compress_slice("abracadabra".as_bytes(),&STD_OPTIONS).expect("compression failed");
    let table = read_table(&mut Cursor::new(&compressed)).expect("bad header");
    assert_eq!(table.len(),5);
    assert_eq!(table.symbols()[0].value,b'a');
    assert_eq!(table.symbols()[0].code_len,1);
    assert!(table.is_prefix_free());
}

#[test]
fn empty_input() {
    assert_eq!(error_of(compress_slice(&[],&STD_OPTIONS)),Error::EmptyInput);
}

#[test]
fn wrong_magic() {
    let mut compressed = compress_slice("hello".as_bytes(),&STD_OPTIONS).expect("compression failed");
    compressed[0] = b'X';
    assert_eq!(error_of(expand_slice(&compressed,&STD_OPTIONS)),Error::FileTypeMismatch);
    assert_eq!(error_of(expand_slice("HF".as_bytes(),&STD_OPTIONS)),Error::FileTypeMismatch);
}

#[test]
fn wrong_word_width() {
    let mut compressed = compress_slice("hello".as_bytes(),&STD_OPTIONS).expect("compression failed");
    compressed[4] = match WORD_WIDTH {
        8 => 4,
        _ => 8
    };
    assert_eq!(error_of(expand_slice(&compressed,&STD_OPTIONS)),Error::PlatformMismatch);
}

#[test]
fn truncated_payload() {
    let compressed = compress_slice("hello world".as_bytes(),&STD_OPTIONS).expect("compression failed");
    let short = &compressed[0..compressed.len()-1];
    assert_eq!(error_of(expand_slice(short,&STD_OPTIONS)),Error::CorruptedStream);
    let shorter = &compressed[0..8];
    assert_eq!(error_of(expand_slice(shorter,&STD_OPTIONS)),Error::CorruptedStream);
}

#[test]
fn bad_trailing_count() {
    let mut compressed = compress_slice("AAAB".as_bytes(),&STD_OPTIONS).expect("compression failed");
    let n = compressed.len();
    compressed[n-2] = 9;
    assert_eq!(error_of(expand_slice(&compressed,&STD_OPTIONS)),Error::CorruptedStream);
    // claiming 5 valid bits leaves a dangling 0 that is a complete code for B
    compressed[n-2] = 5;
    assert_eq!(expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed"),"AAABB".as_bytes());
    // claiming 3 bits drops B
    compressed[n-2] = 3;
    assert_eq!(expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed"),"AAA".as_bytes());
}

#[test]
fn ambiguous_table() {
    let mut compressed = compress_slice("AAAB".as_bytes(),&STD_OPTIONS).expect("compression failed");
    // give B the same code as A
    compressed[11] = 1;
    assert_eq!(error_of(expand_slice(&compressed,&STD_OPTIONS)),Error::CorruptedStream);
}
