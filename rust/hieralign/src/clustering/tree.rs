use serde::{
    Deserialize,
    Serialize,
};

/// A child of a merge node: an original row or an earlier merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Leaf(usize),
    Node(usize),
}

impl NodeRef {
    /// Signed encoding shared with dendrogram tools:
    /// leaves are non-negative, node `k` is `-k - 1`.
    ///
    /// ```
    /// use hieralign::clustering::NodeRef;
    ///
    /// assert_eq!(NodeRef::Leaf(3).to_signed(), 3);
    /// assert_eq!(NodeRef::Node(0).to_signed(), -1);
    /// assert_eq!(NodeRef::from_signed(-5), NodeRef::Node(4));
    /// ```
    pub fn to_signed(self) -> i64 {
        match self {
            NodeRef::Leaf(i) => i as i64,
            NodeRef::Node(k) => -(k as i64) - 1,
        }
    }

    pub fn from_signed(x: i64) -> Self {
        if x >= 0 {
            NodeRef::Leaf(x as usize)
        } else {
            NodeRef::Node((-(x + 1)) as usize)
        }
    }
}

/// One merge of the agglomerative clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeNode {
    pub left: NodeRef,
    pub right: NodeRef,
    /// Linkage distance at which the children were joined.
    pub distance: f64,
    /// Number of leaves below this node.
    pub size: usize,
}

/// Binary merge tree (dendrogram) over `leaf_count` leaves.
///
/// Holds exactly `leaf_count - 1` nodes (none for 0 or 1 leaves), children
/// always precede their parent and the last node is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeTree {
    leaf_count: usize,
    nodes: Vec<MergeNode>,
}

impl MergeTree {
    /// Wraps nodes produced elsewhere (e.g. parsed from a file).
    ///
    /// Returns `None` if the node count does not match the leaf count or a
    /// child refers to a leaf/node that does not exist yet.
    pub fn from_nodes(leaf_count: usize, nodes: Vec<MergeNode>) -> Option<Self> {
        if nodes.len() != leaf_count.saturating_sub(1) {
            return None;
        }
        let mut used_leaves = vec![false; leaf_count];
        let mut used_nodes = vec![false; nodes.len()];
        for (k, node) in nodes.iter().enumerate() {
            let mut size = 0;
            for child in [node.left, node.right] {
                match child {
                    NodeRef::Leaf(i) if i < leaf_count && !used_leaves[i] => {
                        used_leaves[i] = true;
                        size += 1;
                    }
                    NodeRef::Node(c) if c < k && !used_nodes[c] => {
                        used_nodes[c] = true;
                        size += nodes[c].size;
                    }
                    _ => return None,
                }
            }
            if size != node.size {
                return None;
            }
        }
        Some(Self { leaf_count, nodes })
    }

    pub(crate) fn new_unchecked(leaf_count: usize, nodes: Vec<MergeNode>) -> Self {
        debug_assert_eq!(nodes.len(), leaf_count.saturating_sub(1));
        Self { leaf_count, nodes }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn nodes(&self) -> &[MergeNode] {
        &self.nodes
    }

    pub fn node(&self, k: usize) -> &MergeNode {
        &self.nodes[k]
    }

    /// The last merge, `None` for trees with fewer than two leaves.
    pub fn root(&self) -> Option<NodeRef> {
        match self.nodes.len() {
            0 if self.leaf_count == 1 => Some(NodeRef::Leaf(0)),
            0 => None,
            k => Some(NodeRef::Node(k - 1)),
        }
    }

    /// All leaves below `node`, left to right.
    pub fn leaves(&self, node: NodeRef) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match current {
                NodeRef::Leaf(i) => out.push(i),
                NodeRef::Node(k) => {
                    let n = &self.nodes[k];
                    stack.push(n.right);
                    stack.push(n.left);
                }
            }
        }
        out
    }

    pub fn size_of(&self, node: NodeRef) -> usize {
        match node {
            NodeRef::Leaf(_) => 1,
            NodeRef::Node(k) => self.nodes[k].size,
        }
    }
}

/// Leaves (global row indices) accepted as one aligned cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafSet(pub Vec<usize>);

impl LeafSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}
