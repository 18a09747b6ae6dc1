//! Decision DAG answering "is there a contiguous arc of `min_run` passing samples".
//!
//! The ring has 16 samples. A state is the set of samples tested so far and
//! which of them passed; each state maps to one node, so equal states reached
//! along different paths share a subtree.

use std::collections::HashMap;

use log::trace;
use vk_core::Error;

/// Number of samples on the Bresenham ring.
pub const RING_LEN: usize = 16;

const LEAF_FALSE: u32 = 0;
const LEAF_TRUE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Test { sample: u8, pass: u32, fail: u32 },
    Leaf(bool),
}

#[derive(Debug, Clone)]
pub struct FastDecisionTree {
    min_run: usize,
    nodes: Vec<Node>,
    root: u32,
}

impl FastDecisionTree {
    pub fn new(min_run: usize) -> Result<Self, Error> {
        if !(9..=12).contains(&min_run) {
            return Err(Error::UnsupportedArcLength(min_run));
        }

        let mut builder = Builder {
            arcs: arc_masks(min_run),
            nodes: vec![Node::Leaf(false), Node::Leaf(true)],
            memo: HashMap::new(),
        };
        let root = builder.build(0, 0);
        trace!(
            "fast tree min_run={min_run}: {} nodes, {} states",
            builder.nodes.len(),
            builder.memo.len()
        );

        Ok(Self {
            min_run,
            nodes: builder.nodes,
            root,
        })
    }

    pub fn min_run(&self) -> usize {
        self.min_run
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    /// Walks the tree, calling `passes(sample)` only for the samples it needs.
    #[inline]
    pub fn evaluate(&self, mut passes: impl FnMut(usize) -> bool) -> bool {
        let mut id = self.root;
        loop {
            match self.nodes[id as usize] {
                Node::Leaf(result) => return result,
                Node::Test { sample, pass, fail } => {
                    id = if passes(usize::from(sample)) { pass } else { fail };
                }
            }
        }
    }

    /// Longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut memo = vec![None; self.nodes.len()];
        depth_of(&self.nodes, self.root, &mut memo)
    }
}

fn depth_of(nodes: &[Node], id: u32, memo: &mut [Option<usize>]) -> usize {
    if let Some(d) = memo[id as usize] {
        return d;
    }
    let d = match nodes[id as usize] {
        Node::Leaf(_) => 0,
        Node::Test { pass, fail, .. } => {
            1 + depth_of(nodes, pass, memo).max(depth_of(nodes, fail, memo))
        }
    };
    memo[id as usize] = Some(d);
    d
}

/// Bit masks of the 16 arcs of `len` consecutive samples.
fn arc_masks(len: usize) -> Vec<u16> {
    let base = ((1u32 << len) - 1) as u16;
    (0..RING_LEN as u32).map(|k| base.rotate_left(k)).collect()
}

fn ring_distance(a: usize, b: usize) -> usize {
    let d = a.abs_diff(b);
    d.min(RING_LEN - d)
}

struct Builder {
    arcs: Vec<u16>,
    nodes: Vec<Node>,
    memo: HashMap<u32, u32>,
}

impl Builder {
    fn build(&mut self, known: u16, pass: u16) -> u32 {
        let key = u32::from(known) | (u32::from(pass) << 16);
        if let Some(&id) = self.memo.get(&key) {
            return id;
        }

        let fail = known & !pass;
        let feasible: Vec<u16> = self.arcs.iter().copied().filter(|&a| a & fail == 0).collect();

        let id = if feasible.is_empty() {
            LEAF_FALSE
        } else if feasible.iter().any(|&a| a & pass == a) {
            LEAF_TRUE
        } else {
            let sample = self.pick(known, &feasible);
            let bit = 1u16 << sample;
            let on_pass = self.build(known | bit, pass | bit);
            let on_fail = self.build(known | bit, pass);
            self.nodes.push(Node::Test {
                sample: sample as u8,
                pass: on_pass,
                fail: on_fail,
            });
            (self.nodes.len() - 1) as u32
        };

        self.memo.insert(key, id);
        id
    }

    /// Untested sample farthest from every tested one, then the one in the
    /// most feasible arcs, then the lowest index.
    fn pick(&self, known: u16, feasible: &[u16]) -> usize {
        let open = feasible.iter().fold(0u16, |acc, &a| acc | a) & !known;
        let tested: Vec<usize> = (0..RING_LEN).filter(|&i| known & (1 << i) != 0).collect();

        let mut best = None;
        let mut best_key = (0usize, 0usize);
        for s in (0..RING_LEN).filter(|&i| open & (1 << i) != 0) {
            let spread = tested
                .iter()
                .map(|&t| ring_distance(s, t))
                .min()
                .unwrap_or(RING_LEN);
            let cover = feasible.iter().filter(|&&a| a & (1 << s) != 0).count();
            let key = (spread, cover);
            if best.is_none() || key > best_key {
                best = Some(s);
                best_key = key;
            }
        }
        // A feasible arc that is not all-pass still has an untested sample.
        best.unwrap_or(0)
    }
}
