//! Accounting of live codec objects.
//!
//! Frequency tables, code tables, bit streams, and Huffman trees register here
//! when they are constructed and deregister when they are released.  A caller
//! can therefore check that every successful construction was released exactly
//! once, and that a failing call left nothing behind.
//! The counters are per thread.

use std::cell::Cell;

/// Kinds of objects that are counted
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Kind {
    FrequencyTable,
    CodeTable,
    Tree,
    BitStream
}

thread_local! {
    static LIVE: [Cell<usize>;4] = [Cell::new(0),Cell::new(0),Cell::new(0),Cell::new(0)];
}

pub(crate) fn acquire(kind: Kind) {
    LIVE.with(|live| {
        let slot = &live[kind as usize];
        slot.set(slot.get() + 1);
        log::trace!("acquire {:?}, {} live",kind,slot.get());
    });
}

pub(crate) fn release(kind: Kind) {
    LIVE.with(|live| {
        let slot = &live[kind as usize];
        if slot.get() == 0 {
            log::error!("{:?} released more often than acquired",kind);
            return;
        }
        slot.set(slot.get() - 1);
        log::trace!("release {:?}, {} live",kind,slot.get());
    });
}

/// Number of objects of this kind that were acquired on this thread and not yet released
pub fn live(kind: Kind) -> usize {
    LIVE.with(|live| live[kind as usize].get())
}

#[test]
fn counts_are_symmetric() {
    let before = live(Kind::Tree);
    acquire(Kind::Tree);
    acquire(Kind::Tree);
    assert_eq!(live(Kind::Tree),before+2);
    release(Kind::Tree);
    release(Kind::Tree);
    assert_eq!(live(Kind::Tree),before);
}

#[test]
fn kinds_are_independent() {
    let streams = live(Kind::BitStream);
    acquire(Kind::CodeTable);
    assert_eq!(live(Kind::BitStream),streams);
    release(Kind::CodeTable);
}
