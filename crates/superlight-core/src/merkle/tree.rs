use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::hashing::sha256_pair;
use crate::merkle::proof::MerkleProof;
use crate::utils::{concat_bytes, short_hex};

/// A node hash.
pub type Hash = [u8; 32];

/// Position of a node inside its tree's node arena.
pub type NodeId = usize;

/// Errors from building or querying a [`MerkleTree`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Tree needs at least one leaf")]
    EmptyLeaves,

    #[error("Branching factor must be at least 2, got {0}")]
    InvalidBranchingFactor(usize),

    #[error("Leaf count {leaves} is not an exact power of the branching factor {branching}")]
    UnbalancedLeafCount { leaves: usize, branching: usize },

    #[error("Leaf index {index} out of range for a tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    #[error("Depth {depth} is below the leaves of a tree of depth {tree_depth}")]
    DepthOutOfRange { depth: usize, tree_depth: usize },
}

impl TreeError {
    /// True for errors caused by the shape of the leaf set or branching factor.
    pub fn is_input_shape(&self) -> bool {
        matches!(
            self,
            TreeError::EmptyLeaves
                | TreeError::InvalidBranchingFactor(_)
                | TreeError::UnbalancedLeafCount { .. }
        )
    }
}

/// Role of a node, fixed by its position in the tree.
///
/// The single node of a one-leaf tree is the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Interior,
    Root,
}

/// A tree node. Children are owned by the arena; `parent` is a plain index.
#[derive(Clone, Debug)]
pub struct Node {
    hash: Hash,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in their original left-to-right order. Empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A balanced n-ary hash commitment over an ordered leaf sequence.
///
/// Built once by [`MerkleTree::build`]; there is no way to insert or update
/// leaves afterwards. Leaves occupy ids `0..len()`, followed by each upper
/// level in turn, with the root last.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    nodes: Vec<Node>,
    leaf_count: usize,
    branching: usize,
    depth: usize,
    lookup: HashMap<Hash, NodeId>,
}

impl MerkleTree {
    /// Build the tree bottom-up over `leaves`.
    ///
    /// `leaves.len()` must be `branching^k` for some `k >= 0`, so every leaf
    /// sits at the same depth. Each parent hashes the concatenation of its
    /// `branching` children, in order.
    pub fn build<H>(leaves: &[Hash], branching: usize, hash_fn: H) -> Result<Self, TreeError>
    where
        H: Fn(&[u8]) -> Hash,
    {
        if branching < 2 {
            return Err(TreeError::InvalidBranchingFactor(branching));
        }
        if leaves.is_empty() {
            return Err(TreeError::EmptyLeaves);
        }
        let depth = exact_log(leaves.len(), branching).ok_or(TreeError::UnbalancedLeafCount {
            leaves: leaves.len(),
            branching,
        })?;

        // n^0 + n^1 + ... + n^depth nodes in total
        let mut nodes: Vec<Node> = Vec::with_capacity(leaves.len() * branching / (branching - 1));
        let mut lookup = HashMap::with_capacity(nodes.capacity());

        for leaf in leaves {
            lookup.insert(*leaf, nodes.len());
            nodes.push(Node {
                hash: *leaf,
                kind: NodeKind::Leaf,
                parent: None,
                children: Vec::new(),
            });
        }

        let mut level_start = 0;
        let mut level_len = leaves.len();
        while level_len > 1 {
            let next_start = nodes.len();
            for chunk_start in (level_start..level_start + level_len).step_by(branching) {
                let parent_id = nodes.len();
                let children: Vec<NodeId> = (chunk_start..chunk_start + branching).collect();
                let hash = hash_fn(&concat_bytes(
                    &children.iter().map(|&c| nodes[c].hash).collect::<Vec<_>>(),
                ));
                for &child in &children {
                    nodes[child].parent = Some(parent_id);
                }
                lookup.insert(hash, parent_id);
                nodes.push(Node {
                    hash,
                    kind: NodeKind::Interior,
                    parent: None,
                    children,
                });
            }
            level_start = next_start;
            level_len /= branching;
        }

        // The last node pushed is the root; for one leaf that is the leaf itself
        let root_id = nodes.len() - 1;
        nodes[root_id].kind = NodeKind::Root;

        debug!(
            leaves = leaves.len(),
            branching,
            depth,
            root = %short_hex(&nodes[root_id].hash),
            "built merkle tree"
        );

        Ok(Self {
            nodes,
            leaf_count: leaves.len(),
            branching,
            depth,
            lookup,
        })
    }

    /// Root hash of the tree.
    pub fn root(&self) -> Hash {
        self.root_node().hash
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[self.root_id()]
    }

    fn root_id(&self) -> NodeId {
        self.nodes.len() - 1
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Always false: a tree cannot be built without leaves.
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn branching_factor(&self) -> usize {
        self.branching
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look a node up by its hash.
    pub fn get_node(&self, hash: &Hash) -> Option<&Node> {
        self.lookup.get(hash).map(|&id| &self.nodes[id])
    }

    /// Leaves in their original order.
    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.nodes[..self.leaf_count].iter()
    }

    /// Leftmost node `depth` levels below the root.
    pub fn node_at_depth(&self, depth: usize) -> Result<&Node, TreeError> {
        if depth > self.depth {
            return Err(TreeError::DepthOutOfRange {
                depth,
                tree_depth: self.depth,
            });
        }
        let mut node = self.root_node();
        for _ in 0..depth {
            node = &self.nodes[node.children[0]];
        }
        Ok(node)
    }

    /// Sibling hashes for the leaf at `index`, bottom level first.
    ///
    /// Each level holds the `branching - 1` siblings of the ancestor on the
    /// path, left to right as they appear under the parent. Siblings are
    /// picked by position, so equal leaf values do not confuse the proof.
    pub fn generate_proof(&self, index: usize) -> Result<MerkleProof, TreeError> {
        if index >= self.leaf_count {
            return Err(TreeError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count,
            });
        }

        let mut levels = Vec::with_capacity(self.depth);
        let mut current = index;
        while let Some(parent) = self.nodes[current].parent {
            let siblings = self.nodes[parent]
                .children
                .iter()
                .filter(|&&child| child != current)
                .map(|&child| self.nodes[child].hash)
                .collect();
            levels.push(siblings);
            current = parent;
        }

        Ok(MerkleProof { levels })
    }
}

/// `Some(k)` when `len == base^k`.
fn exact_log(len: usize, base: usize) -> Option<usize> {
    let mut size = 1usize;
    let mut k = 0;
    while size < len {
        size = size.checked_mul(base)?;
        k += 1;
    }
    (size == len).then_some(k)
}

/// SSZ-style `merkleize`: binary SHA-256 root over `chunks`, zero-padded to the
/// next power of two.
pub fn merkleize_chunks(chunks: &[Hash]) -> Hash {
    let width = chunks.len().max(1).next_power_of_two();
    let mut level = chunks.to_vec();
    level.resize(width, [0u8; 32]);
    while level.len() > 1 {
        level = level
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }
    level[0]
}
