//! Pointer-chase lists laid out in one flat buffer.
//!
//! Element `i` occupies `stride` words starting at `i * stride`: the index of
//! the next element, the index of the previous one, then `pad` filler words.
//! Every walk is a dependent load chain, so its speed is the memory latency of
//! the level the working set fits in.

use anyhow::bail;
use rand::Rng;
use rand::seq::SliceRandom;

const WORD: usize = std::mem::size_of::<usize>();
const NEXT: usize = 0;
const PREV: usize = 1;
const LINKS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct ChaseList {
    cells: Vec<usize>,
    stride: usize,
    len: usize,
}

impl ChaseList {
    /// Elements of `pad` filler words that fit in `size` bytes.
    pub fn capacity(size: usize, pad: usize) -> usize {
        size / ((LINKS + pad) * WORD)
    }

    /// Elements linked in memory order, last one back to the first.
    pub fn sequential(size: usize, pad: usize) -> anyhow::Result<Self> {
        let len = Self::capacity(size, pad);
        let order: Vec<usize> = (0..len).collect();
        Self::linked(order, pad, size)
    }

    /// Elements linked in a random order forming a single cycle through all of them.
    pub fn random<R: Rng + ?Sized>(size: usize, pad: usize, rng: &mut R) -> anyhow::Result<Self> {
        let len = Self::capacity(size, pad);
        let mut order: Vec<usize> = (0..len).collect();
        // Element 0 stays the entry point.
        if len > 1 {
            order[1..].shuffle(rng);
        }
        Self::linked(order, pad, size)
    }

    fn linked(order: Vec<usize>, pad: usize, size: usize) -> anyhow::Result<Self> {
        let len = order.len();
        if len == 0 {
            bail!("working set of {} bytes holds no list element", size);
        }
        let stride = LINKS + pad;
        let mut cells = vec![0usize; len * stride];
        for (k, &cur) in order.iter().enumerate() {
            let next = order[(k + 1) % len];
            cells[cur * stride + NEXT] = next;
            cells[next * stride + PREV] = cur;
        }
        Ok(Self { cells, stride, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn next(&self, i: usize) -> usize {
        self.cells[i * self.stride + NEXT]
    }

    pub fn prev(&self, i: usize) -> usize {
        self.cells[i * self.stride + PREV]
    }

    /// Follow `steps` links from `start`; returns where the walk ends.
    pub fn walk(&self, start: usize, steps: usize, direction: Direction) -> usize {
        let mut cur = start;
        match direction {
            Direction::Forward => {
                for _ in 0..steps {
                    cur = self.next(cur);
                }
            }
            Direction::Backward => {
                for _ in 0..steps {
                    cur = self.prev(cur);
                }
            }
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn cycle_from_zero(list: &ChaseList) -> Vec<usize> {
        let mut seen = vec![0];
        let mut cur = list.next(0);
        while cur != 0 {
            seen.push(cur);
            cur = list.next(cur);
            assert!(seen.len() <= list.len(), "cycle does not return to 0");
        }
        seen
    }

    #[test]
    fn capacity_accounts_for_links_and_padding() {
        assert_eq!(ChaseList::capacity(1024, 0), 1024 / (2 * WORD));
        assert_eq!(ChaseList::capacity(1024, 6), 1024 / (8 * WORD));
        assert_eq!(ChaseList::capacity(WORD, 0), 0);
    }

    #[test]
    fn sequential_list_follows_memory_order() {
        let list = ChaseList::sequential(64 * 2 * WORD, 0).unwrap();
        assert_eq!(list.len(), 64);
        assert_eq!(cycle_from_zero(&list), (0..64).collect::<Vec<_>>());
        assert_eq!(list.prev(0), 63);
    }

    #[test]
    fn random_list_is_one_cycle_over_every_element() {
        let mut rng = StdRng::seed_from_u64(7);
        let list = ChaseList::random(4096, 1, &mut rng).unwrap();
        let cycle = cycle_from_zero(&list);

        assert_eq!(cycle.len(), list.len());
        let distinct: BTreeSet<usize> = cycle.iter().copied().collect();
        assert_eq!(distinct.len(), list.len());
    }

    #[test]
    fn backward_walk_undoes_forward_walk() {
        let mut rng = StdRng::seed_from_u64(1);
        let list = ChaseList::random(2048, 0, &mut rng).unwrap();
        let end = list.walk(0, 37, Direction::Forward);
        assert_eq!(list.walk(end, 37, Direction::Backward), 0);
    }

    #[test]
    fn full_lap_returns_to_start() {
        let list = ChaseList::sequential(1024, 3).unwrap();
        assert_eq!(list.walk(0, list.len(), Direction::Forward), 0);
        assert_eq!(list.walk(0, list.len(), Direction::Backward), 0);
    }

    #[test]
    fn single_element_points_to_itself() {
        let list = ChaseList::sequential(2 * WORD, 0).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.walk(0, 5, Direction::Forward), 0);
    }

    #[test]
    fn too_small_working_set_fails() {
        assert!(ChaseList::sequential(WORD, 0).is_err());
    }
}
