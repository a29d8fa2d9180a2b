//! K-way merge over independently sorted child iterators.
//!
//! The merged stream is the stable union in comparator order; equal keys
//! across children are all surfaced (first child in scan order wins the
//! tie), never deduplicated. Multi-version reads rely on this: the same
//! user key legitimately appears in several sources.

use std::cmp::Ordering;
use std::sync::Arc;

use common::{Comparator, Iter, Result};

use crate::iter::IterWrapper;

#[derive(PartialEq, Eq, Clone, Copy)]
enum Direction {
    Forward,
    Reverse,
}

pub struct MergingIter {
    cmp: Arc<dyn Comparator>,
    children: Vec<IterWrapper>,
    current: Option<usize>,
    direction: Direction,
}

impl MergingIter {
    #[must_use]
    pub fn new(cmp: Arc<dyn Comparator>, children: Vec<Box<dyn Iter>>) -> MergingIter {
        MergingIter {
            cmp,
            children: children
                .into_iter()
                .map(|child| IterWrapper::new(Some(child)))
                .collect(),
            current: None,
            direction: Direction::Forward,
        }
    }

    fn find_smallest(&mut self) {
        let mut smallest: Option<usize> = None;
        for (i, child) in self.children.iter().enumerate() {
            if !child.valid() {
                continue;
            }
            match smallest {
                Some(s)
                    if self.cmp.compare(child.key(), self.children[s].key())
                        != Ordering::Less => {}
                _ => smallest = Some(i),
            }
        }
        self.current = smallest;
    }

    fn find_largest(&mut self) {
        let mut largest: Option<usize> = None;
        // Reverse scan order so ties resolve the same child a reverse
        // iteration would visit first.
        for (i, child) in self.children.iter().enumerate().rev() {
            if !child.valid() {
                continue;
            }
            match largest {
                Some(l)
                    if self.cmp.compare(child.key(), self.children[l].key())
                        != Ordering::Greater => {}
                _ => largest = Some(i),
            }
        }
        self.current = largest;
    }

    fn current_index(&self) -> usize {
        match self.current {
            Some(i) => i,
            None => panic!("merging iterator is not valid"),
        }
    }
}

impl Iter for MergingIter {
    fn valid(&self) -> bool {
        matches!(self.current, Some(i) if self.children[i].valid())
    }

    fn seek_to_first(&mut self) {
        for child in &mut self.children {
            child.seek_to_first();
        }
        self.find_smallest();
        self.direction = Direction::Forward;
    }

    fn seek_to_last(&mut self) {
        for child in &mut self.children {
            child.seek_to_last();
        }
        self.find_largest();
        self.direction = Direction::Reverse;
    }

    fn seek(&mut self, target: &[u8]) {
        for child in &mut self.children {
            child.seek(target);
        }
        self.find_smallest();
        self.direction = Direction::Forward;
    }

    fn next(&mut self) {
        debug_assert!(self.valid());
        let current = self.current_index();

        // After a reverse step only `current` is guaranteed positioned;
        // every other child sits at the entry *before* key(). Move them
        // all to the first entry after key() before advancing.
        if self.direction != Direction::Forward {
            let key = self.children[current].key().to_vec();
            for (i, child) in self.children.iter_mut().enumerate() {
                if i == current {
                    continue;
                }
                child.seek(&key);
                if child.valid() && self.cmp.compare(&key, child.key()) == Ordering::Equal {
                    child.next();
                }
            }
            self.direction = Direction::Forward;
        }

        self.children[current].next();
        self.find_smallest();
    }

    fn prev(&mut self) {
        debug_assert!(self.valid());
        let current = self.current_index();

        // Mirror image of next(): park every other child at the last
        // entry strictly before key().
        if self.direction != Direction::Reverse {
            let key = self.children[current].key().to_vec();
            for (i, child) in self.children.iter_mut().enumerate() {
                if i == current {
                    continue;
                }
                child.seek(&key);
                if child.valid() {
                    // Child is at the first entry >= key(); step back.
                    child.prev();
                } else {
                    // Child has nothing >= key(); its whole stream is
                    // before us.
                    child.seek_to_last();
                }
            }
            self.direction = Direction::Reverse;
        }

        self.children[current].prev();
        self.find_largest();
    }

    fn key(&self) -> &[u8] {
        debug_assert!(self.valid());
        self.children[self.current_index()].key()
    }

    fn value(&self) -> &[u8] {
        debug_assert!(self.valid());
        self.children[self.current_index()].value()
    }

    fn status(&self) -> Result<()> {
        for child in &self.children {
            child.status()?;
        }
        Ok(())
    }
}
