//! Symbol statistics and code tables.
//!
//! A `FrequencyTable` is the raw tally of an input buffer.  A `CodeTable` holds
//! the same symbols once codes have been assigned, and is re-sorted in place
//! depending on whether it is used for encoding (by value) or storage (by frequency).

use crate::Error;
use crate::tools::ledger::{self,Kind};

/// Longest code that can be represented in `Symbol::code_bits`.
/// A Huffman leaf at depth d needs a total weight of at least Fib(d+2),
/// so no buffer addressable by `usize` gets anywhere close.
pub const MAX_CODE_LEN: u8 = 128;

/// One distinct byte value and its code
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Symbol {
    pub value: u8,
    pub freq: usize,
    pub code_len: u8,
    /// code is in the `code_len` low bits, first bit to be sent is the most significant
    pub code_bits: u128
}

impl Symbol {
    fn tally(value: u8) -> Self {
        Self {
            value,
            freq: 1,
            code_len: 0,
            code_bits: 0
        }
    }
    /// true if this code is a bit-prefix of the other code, or equal to it
    pub fn is_prefix_of(&self,other: &Symbol) -> bool {
        if self.code_len > other.code_len {
            return false;
        }
        other.code_bits >> (other.code_len - self.code_len) == self.code_bits
    }
    /// code as a string of 0 and 1
    pub fn code_string(&self) -> String {
        (0..self.code_len).rev().map(|i| match (self.code_bits >> i) & 1 {
            0 => '0',
            _ => '1'
        }).collect()
    }
}

/// Count of each distinct byte, in order of first appearance
pub struct FrequencyTable {
    symbols: Vec<Symbol>
}

impl FrequencyTable {
    /// Tally the input buffer.  Symbols are listed in the order they are first seen.
    pub fn build(dat: &[u8]) -> Result<Self,Error> {
        if dat.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut symbols: Vec<Symbol> = Vec::new();
        symbols.try_reserve_exact(256).map_err(|_| Error::AllocationFailure)?;
        // position of each byte value in `symbols`, saves searching the list
        let mut slot: [Option<u8>;256] = [None;256];
        for &c in dat {
            match slot[c as usize] {
                Some(i) => symbols[i as usize].freq += 1,
                None => {
                    slot[c as usize] = Some(symbols.len() as u8);
                    symbols.push(Symbol::tally(c));
                }
            }
        }
        log::debug!("{} distinct symbols in {} bytes",symbols.len(),dat.len());
        ledger::acquire(Kind::FrequencyTable);
        Ok(Self { symbols })
    }
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    /// sum of all frequencies, equals the length of the tallied buffer
    pub fn total(&self) -> usize {
        self.symbols.iter().map(|s| s.freq).sum()
    }
    /// Explicitly give the table back, equivalent to dropping it
    pub fn release(self) {}
}

impl Drop for FrequencyTable {
    fn drop(&mut self) {
        ledger::release(Kind::FrequencyTable);
    }
}

/// The order a `CodeTable` is currently in
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum TableOrder {
    /// as produced, or as read from storage
    Unsorted,
    /// ascending byte value, allows binary search during encoding
    ByValue,
    /// descending frequency, ties in ascending byte value
    ByFrequency
}

/// Symbols with their assigned codes
#[derive(Debug)]
pub struct CodeTable {
    symbols: Vec<Symbol>,
    order: TableOrder
}

impl CodeTable {
    pub(crate) fn from_symbols(symbols: Vec<Symbol>) -> Self {
        ledger::acquire(Kind::CodeTable);
        Self {
            symbols,
            order: TableOrder::Unsorted
        }
    }
    /// Build a table from `(value,code_len,code_bits)` triples, e.g., as read from storage.
    /// Frequencies are not known and are set to 0.
    /// The codes are checked, anything that could not have come out of a Huffman tree is
    /// rejected as `CorruptedStream`.
    pub fn from_codes(codes: &[(u8,u8,u128)]) -> Result<Self,Error> {
        if codes.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut symbols: Vec<Symbol> = Vec::new();
        symbols.try_reserve_exact(codes.len()).map_err(|_| Error::AllocationFailure)?;
        let mut seen = [false;256];
        for &(value,code_len,code_bits) in codes {
            if code_len == 0 || code_len > MAX_CODE_LEN {
                log::error!("code length {} for symbol {} is out of range",code_len,value);
                return Err(Error::CorruptedStream);
            }
            if code_len < MAX_CODE_LEN && code_bits >> code_len > 0 {
                log::error!("code for symbol {} overflows its length",value);
                return Err(Error::CorruptedStream);
            }
            if seen[value as usize] {
                log::error!("symbol {} appears twice",value);
                return Err(Error::CorruptedStream);
            }
            seen[value as usize] = true;
            symbols.push(Symbol { value, freq: 0, code_len, code_bits });
        }
        let ans = Self::from_symbols(symbols);
        if !ans.is_prefix_free() {
            log::error!("codes are ambiguous");
            return Err(Error::CorruptedStream);
        }
        Ok(ans)
    }
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    pub fn order(&self) -> TableOrder {
        self.order
    }
    pub fn sort_by_value(&mut self) {
        self.symbols.sort_by_key(|s| s.value);
        self.order = TableOrder::ByValue;
    }
    pub fn sort_by_frequency(&mut self) {
        self.symbols.sort_by(|a,b| b.freq.cmp(&a.freq).then(a.value.cmp(&b.value)));
        self.order = TableOrder::ByFrequency;
    }
    /// Find the entry for a byte value, binary search if sorted by value, linear otherwise.
    pub fn lookup(&self,value: u8) -> Option<&Symbol> {
        match self.order {
            TableOrder::ByValue => match self.symbols.binary_search_by_key(&value,|s| s.value) {
                Ok(i) => Some(&self.symbols[i]),
                Err(_) => None
            },
            _ => self.symbols.iter().find(|s| s.value == value)
        }
    }
    /// Find the entry with exactly this code, linear search
    pub fn find_code(&self,code_len: u8,code_bits: u128) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.code_len == code_len && s.code_bits == code_bits)
    }
    pub fn max_code_len(&self) -> u8 {
        self.symbols.iter().map(|s| s.code_len).max().unwrap_or(0)
    }
    /// true if no code is a prefix of another
    pub fn is_prefix_free(&self) -> bool {
        for (i,a) in self.symbols.iter().enumerate() {
            for b in &self.symbols[i+1..] {
                if a.is_prefix_of(b) || b.is_prefix_of(a) {
                    return false;
                }
            }
        }
        true
    }
    /// total bits needed to encode the tallied input, `None` on overflow
    pub fn encoded_bits(&self) -> Option<usize> {
        self.symbols.iter().try_fold(0usize,|acc,s| acc.checked_add(s.freq.checked_mul(s.code_len as usize)?))
    }
    /// Explicitly give the table back, equivalent to dropping it
    pub fn release(self) {}
}

impl Drop for CodeTable {
    fn drop(&mut self) {
        ledger::release(Kind::CodeTable);
    }
}

#[test]
fn frequency_conservation() {
    let dat = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let table = FrequencyTable::build(dat).expect("tally failed");
    assert_eq!(table.total(),dat.len());
    let values: Vec<u8> = table.symbols().iter().map(|s| s.value).collect();
    assert_eq!(&values[0..4],"I am".as_bytes());
    let m = table.symbols().iter().find(|s| s.value == b'm').unwrap();
    assert_eq!(m.freq,6);
}

#[test]
fn empty_tally() {
    assert_eq!(FrequencyTable::build(&[]).err(),Some(Error::EmptyInput));
}

#[test]
fn full_alphabet_tally() {
    let dat: Vec<u8> = (0..=255).rev().chain(0..=255).collect();
    let table = FrequencyTable::build(&dat).expect("tally failed");
    assert_eq!(table.len(),256);
    assert_eq!(table.symbols()[0].value,255);
    assert!(table.symbols().iter().all(|s| s.freq == 2));
}

#[test]
fn prefix_relation() {
    let a = Symbol { value: 0, freq: 0, code_len: 2, code_bits: 0b10 };
    let b = Symbol { value: 1, freq: 0, code_len: 4, code_bits: 0b1011 };
    let c = Symbol { value: 2, freq: 0, code_len: 3, code_bits: 0b011 };
    assert!(a.is_prefix_of(&b));
    assert!(!b.is_prefix_of(&a));
    assert!(!a.is_prefix_of(&c));
    assert_eq!(b.code_string(),"1011");
    assert_eq!(c.code_string(),"011");
}

#[test]
fn table_from_codes() {
    let mut table = CodeTable::from_codes(&[(b'z',1,1),(b'a',2,0),(b'q',2,1)]).expect("bad table");
    assert_eq!(table.max_code_len(),2);
    assert_eq!(table.lookup(b'q').unwrap().code_bits,1);
    table.sort_by_value();
    assert_eq!(table.order(),TableOrder::ByValue);
    assert_eq!(table.symbols()[0].value,b'a');
    assert_eq!(table.lookup(b'z').unwrap().code_len,1);
    assert!(table.lookup(b'b').is_none());
    assert_eq!(table.find_code(2,0).unwrap().value,b'a');
    assert!(table.find_code(1,0).is_none());
}

#[test]
fn bad_codes_rejected() {
    assert_eq!(CodeTable::from_codes(&[]).err(),Some(Error::EmptyInput));
    assert_eq!(CodeTable::from_codes(&[(1,0,0)]).err(),Some(Error::CorruptedStream));
    assert_eq!(CodeTable::from_codes(&[(1,2,4)]).err(),Some(Error::CorruptedStream));
    assert_eq!(CodeTable::from_codes(&[(1,1,0),(1,1,1)]).err(),Some(Error::CorruptedStream));
    assert_eq!(CodeTable::from_codes(&[(1,1,0),(2,2,1)]).err(),Some(Error::CorruptedStream));
}

#[test]
fn frequency_order() {
    let mut table = CodeTable::from_symbols(vec![
        Symbol { value: 9, freq: 1, code_len: 2, code_bits: 0 },
        Symbol { value: 3, freq: 5, code_len: 1, code_bits: 1 },
        Symbol { value: 4, freq: 1, code_len: 2, code_bits: 1 }
    ]);
    table.sort_by_frequency();
    let values: Vec<u8> = table.symbols().iter().map(|s| s.value).collect();
    assert_eq!(values,vec![3,4,9]);
    assert_eq!(table.encoded_bits(),Some(9));
}
