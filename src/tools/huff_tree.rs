//! Static Huffman tree, used by `codec` to assign codes.
//!
//! Nodes are kept in an arena and refer to each other by index.  Leaves come
//! first, one for each symbol slot, followed by the branches in the order they
//! were merged.  The parent index is only used to walk from a leaf to the root
//! when the codes are assigned, after which the tree is dropped.

use crate::{Error,Options,TieBreak};
use crate::symbols::{Symbol,FrequencyTable,CodeTable};
use crate::tools::ledger::{self,Kind};

struct Node {
    freq: usize,
    /// index of the parent node, `None` for the root
    parent: Option<usize>,
    /// left son (merged first) and right son (merged second), `None` for a leaf
    son: Option<[usize;2]>
}

pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize
}

impl HuffmanTree {
    /// Build the tree by repeatedly merging the two lightest nodes.
    /// Leaf `i` of the tree corresponds to `symbols[i]`.
    pub fn build(symbols: &[Symbol]) -> Result<Self,Error> {
        if symbols.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut nodes: Vec<Node> = Vec::new();
        nodes.try_reserve_exact(2*symbols.len() - 1).map_err(|_| Error::AllocationFailure)?;
        let mut working: Vec<usize> = Vec::new();
        working.try_reserve_exact(symbols.len()).map_err(|_| Error::AllocationFailure)?;
        for (i,symb) in symbols.iter().enumerate() {
            nodes.push(Node { freq: symb.freq, parent: None, son: None });
            working.push(i);
        }
        // stable, so ties keep the order of the symbol slots
        working.sort_by_key(|i| nodes[*i].freq);
        while working.len() > 1 {
            let lson = working.remove(0);
            let rson = working.remove(0);
            let freq = nodes[lson].freq + nodes[rson].freq;
            let branch = nodes.len();
            nodes.push(Node { freq, parent: None, son: Some([lson,rson]) });
            nodes[lson].parent = Some(branch);
            nodes[rson].parent = Some(branch);
            // new branch goes after every node that is not heavier
            let pos = working.partition_point(|i| nodes[*i].freq <= freq);
            working.insert(pos,branch);
            log::trace!("merge {} + {} into {} with weight {}",lson,rson,branch,freq);
        }
        let root = working[0];
        log::debug!("tree has {} nodes",nodes.len());
        ledger::acquire(Kind::Tree);
        Ok(Self { nodes, root })
    }
    /// Walk from leaf to root and return `(code_len,code_bits)`.
    /// The first bit to be sent is the most significant bit of `code_bits`.
    fn code(&self,leaf: usize) -> (u8,u128) {
        if self.nodes.len() == 1 {
            // lone symbol still needs one bit per occurrence
            return (1,0);
        }
        let mut acc: u128 = 0;
        let mut len: u8 = 0;
        let mut curr = leaf;
        while let Some(parent) = self.nodes[curr].parent {
            let bit = match self.nodes[parent].son {
                Some([_,rson]) if rson == curr => 1,
                _ => 0
            };
            acc = (acc << 1) | bit;
            len += 1;
            curr = parent;
        }
        // acc has the root side in the LSB, reverse so the root side comes first
        let mut code_bits: u128 = 0;
        for i in 0..len {
            code_bits |= ((acc >> (len - 1 - i)) & 1) << i;
        }
        (len,code_bits)
    }
    /// Store the code of leaf `i` in `symbols[i]`
    pub fn assign_codes(&self,symbols: &mut [Symbol]) {
        for (i,symb) in symbols.iter_mut().enumerate() {
            let (code_len,code_bits) = self.code(i);
            symb.code_len = code_len;
            symb.code_bits = code_bits;
            log::trace!("symbol {:02X} weight {} code {}",symb.value,symb.freq,symb.code_string());
        }
    }
    pub fn root_weight(&self) -> usize {
        self.nodes[self.root].freq
    }
}

impl Drop for HuffmanTree {
    fn drop(&mut self) {
        ledger::release(Kind::Tree);
    }
}

/// Build the code table for a tally.  The tree only lives inside this function.
pub fn build_code_table(tally: &FrequencyTable,opt: &Options) -> Result<CodeTable,Error> {
    let mut symbols: Vec<Symbol> = Vec::new();
    symbols.try_reserve_exact(tally.len()).map_err(|_| Error::AllocationFailure)?;
    symbols.extend_from_slice(tally.symbols());
    if opt.tie_break == TieBreak::ByteValue {
        symbols.sort_by_key(|s| s.value);
    }
    let tree = HuffmanTree::build(&symbols)?;
    tree.assign_codes(&mut symbols);
    log::debug!("assigned codes for total weight {}",tree.root_weight());
    drop(tree);
    Ok(CodeTable::from_symbols(symbols))
}

#[cfg(test)]
fn symbols_of(freqs: &[(u8,usize)]) -> Vec<Symbol> {
    freqs.iter().map(|(value,freq)| Symbol { value: *value, freq: *freq, code_len: 0, code_bits: 0 }).collect()
}

#[test]
fn two_symbols() {
    let mut symbols = symbols_of(&[(b'A',3),(b'B',1)]);
    let tree = HuffmanTree::build(&symbols).expect("build failed");
    assert_eq!(tree.nodes.len(),3);
    assert_eq!(tree.nodes[tree.root].son,Some([1,0]));
    tree.assign_codes(&mut symbols);
    assert_eq!((symbols[0].code_len,symbols[0].code_bits),(1,1));
    assert_eq!((symbols[1].code_len,symbols[1].code_bits),(1,0));
}

#[test]
fn single_symbol() {
    let mut symbols = symbols_of(&[(7,10)]);
    let tree = HuffmanTree::build(&symbols).expect("build failed");
    assert_eq!(tree.nodes.len(),1);
    assert_eq!(tree.nodes[tree.root].parent,None);
    tree.assign_codes(&mut symbols);
    assert_eq!((symbols[0].code_len,symbols[0].code_bits),(1,0));
}

#[test]
fn ties_follow_slot_order() {
    // B and C tie, B was seen first so it is the left son of their branch
    let mut symbols = symbols_of(&[(b'A',3),(b'B',1),(b'C',1)]);
    let tree = HuffmanTree::build(&symbols).expect("build failed");
    tree.assign_codes(&mut symbols);
    let codes: Vec<String> = symbols.iter().map(|s| s.code_string()).collect();
    assert_eq!(codes,vec!["1","00","01"]);
}

#[test]
fn merged_branch_goes_behind_equal_weight() {
    // the first branch (weight 2) ties with D and is inserted after it
    let mut symbols = symbols_of(&[(b'A',1),(b'B',1),(b'D',2)]);
    let tree = HuffmanTree::build(&symbols).expect("build failed");
    tree.assign_codes(&mut symbols);
    let codes: Vec<String> = symbols.iter().map(|s| s.code_string()).collect();
    assert_eq!(codes,vec!["10","11","0"]);
}

#[test]
fn skewed_weights_go_deep() {
    let fib = [1,1,2,3,5,8,13,21,34,55,89,144];
    let freqs: Vec<(u8,usize)> = fib.iter().enumerate().map(|(i,f)| (i as u8,*f)).collect();
    let mut symbols = symbols_of(&freqs);
    let tree = HuffmanTree::build(&symbols).expect("build failed");
    tree.assign_codes(&mut symbols);
    assert_eq!(tree.root_weight(),fib.iter().sum::<usize>());
    assert_eq!(symbols.iter().map(|s| s.code_len).max(),Some(11));
    let table = CodeTable::from_symbols(symbols);
    assert!(table.is_prefix_free());
}

#[test]
fn tree_does_not_escape() {
    let tally = FrequencyTable::build("abracadabra".as_bytes()).expect("tally failed");
    let trees = ledger::live(Kind::Tree);
    let table = build_code_table(&tally,&crate::STD_OPTIONS).expect("build failed");
    assert_eq!(ledger::live(Kind::Tree),trees);
    assert_eq!(table.len(),5);
    assert!(table.is_prefix_free());
    assert_eq!(table.encoded_bits(),Some(23));
}

#[test]
fn empty_symbols() {
    assert_eq!(HuffmanTree::build(&[]).err(),Some(Error::EmptyInput));
}
