// Merkle tree with inclusion proofs
//
// Nodes live in a flat arena and reference each other by index, so walking
// a proof path is plain index-chasing.

use crate::core::{sha256, Hash256};
use crate::error::{Error, Result};

/// Which side of the parent a proof sibling sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug)]
struct MerkleNode {
    hash: Hash256,
    parent: Option<usize>,
    /// `(left, right)` arena indices; `None` for leaves
    children: Option<(usize, usize)>,
}

/// Inclusion proof: sibling hashes from leaf to root, each tagged with the
/// side the sibling occupies under its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub siblings: Vec<Hash256>,
    pub sides: Vec<Side>,
}

/// Merkle tree over arbitrary byte strings.
/// Leaves are `SHA-256(datum)`; parents are `SHA-256(left ‖ right)`.
#[derive(Debug)]
pub struct MerkleTree {
    nodes: Vec<MerkleNode>,
    leaves: Vec<usize>,
    root: usize,
}

impl MerkleTree {
    /// Build a tree from a non-empty sequence of data items.
    /// A level of odd width (above one) pairs its last node with itself.
    ///
    /// # Panics
    /// Panics when `data` is empty.
    pub fn new<D: AsRef<[u8]>>(data: &[D]) -> MerkleTree {
        assert!(!data.is_empty(), "merkle tree needs at least one leaf");

        let mut nodes: Vec<MerkleNode> = data
            .iter()
            .map(|datum| MerkleNode {
                hash: sha256(datum.as_ref()),
                parent: None,
                children: None,
            })
            .collect();
        let leaves: Vec<usize> = (0..nodes.len()).collect();

        let mut level = leaves.clone();
        while level.len() > 1 {
            if level.len() % 2 != 0 {
                level.push(*level.last().unwrap());
            }
            let mut parents = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks(2) {
                let (left, right) = (pair[0], pair[1]);
                let mut buf = Vec::with_capacity(64);
                buf.extend_from_slice(nodes[left].hash.as_bytes());
                buf.extend_from_slice(nodes[right].hash.as_bytes());
                let parent = nodes.len();
                nodes.push(MerkleNode {
                    hash: sha256(&buf),
                    parent: None,
                    children: Some((left, right)),
                });
                nodes[left].parent = Some(parent);
                nodes[right].parent = Some(parent);
                parents.push(parent);
            }
            level = parents;
        }

        let root = level[0];
        MerkleTree {
            nodes,
            leaves,
            root,
        }
    }

    /// Digest of the root node
    pub fn root_hash(&self) -> Hash256 {
        self.nodes[self.root].hash
    }

    /// Build an inclusion proof for the leaf carrying `leaf_hash`.
    /// Fails with `LeafNotFound` when no leaf matches.
    pub fn make_merkle_proof(&self, leaf_hash: &Hash256) -> Result<MerkleProof> {
        let mut current = *self
            .leaves
            .iter()
            .find(|&&leaf| self.nodes[leaf].hash == *leaf_hash)
            .ok_or(Error::LeafNotFound)?;

        let mut siblings = Vec::new();
        let mut sides = Vec::new();
        while let Some(parent) = self.nodes[current].parent {
            let (left, right) = self.nodes[parent]
                .children
                .expect("parent node always has two children");
            if current == left {
                siblings.push(self.nodes[right].hash);
                sides.push(Side::Right);
            } else {
                siblings.push(self.nodes[left].hash);
                sides.push(Side::Left);
            }
            current = parent;
        }
        Ok(MerkleProof { siblings, sides })
    }
}

/// Recompute the root from a leaf hash and its proof; true iff it matches
/// `root_hash`
pub fn verify_proof(root_hash: &Hash256, leaf_hash: &Hash256, proof: &MerkleProof) -> bool {
    let mut acc = *leaf_hash;
    for (sibling, side) in proof.siblings.iter().zip(&proof.sides) {
        let mut buf = Vec::with_capacity(64);
        match side {
            Side::Left => {
                buf.extend_from_slice(sibling.as_bytes());
                buf.extend_from_slice(acc.as_bytes());
            }
            Side::Right => {
                buf.extend_from_slice(acc.as_bytes());
                buf.extend_from_slice(sibling.as_bytes());
            }
        }
        acc = sha256(&buf);
    }
    acc == *root_hash
}
