//! Transform hierarchy.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node but
//! the root has exactly one parent; re-parenting checks for cycles so ownership
//! stays a tree. World matrices are cached and refreshed by
//! [`SceneGraph::update_world_transforms`], which walks the tree top-down so a
//! child always sees its parent's fresh world matrix.

use std::collections::VecDeque;

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{data_structures::transform::Transform, error::SceneError};

/// Handle of a node inside a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
struct Node {
    name: String,
    local: Transform,
    world: Matrix4<f32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct SceneGraph {
    // Removed slots stay `None` so existing ids never get reused.
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Node {
            name: "root".to_string(),
            local: Transform::default(),
            world: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// A graph always holds its root, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode(id))
    }

    /// Adds a node with an identity local transform below `parent`.
    pub fn add_node(&mut self, name: impl Into<String>, parent: NodeId) -> Result<NodeId, SceneError> {
        self.add_node_with(name, parent, Transform::default())
    }

    pub fn add_node_with(
        &mut self,
        name: impl Into<String>,
        parent: NodeId,
        local: Transform,
    ) -> Result<NodeId, SceneError> {
        let parent_world = self.node(parent)?.world;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            name: name.into(),
            world: parent_world * local.to_matrix(),
            local,
            parent: Some(parent),
            children: Vec::new(),
        }));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn name(&self, id: NodeId) -> Result<&str, SceneError> {
        Ok(self.node(id)?.name.as_str())
    }

    /// First live node called `name`, in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.as_ref().is_some_and(|n| n.name == name))
            .map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.node(id)?.children)
    }

    pub fn local(&self, id: NodeId) -> Result<&Transform, SceneError> {
        Ok(&self.node(id)?.local)
    }

    pub fn local_mut(&mut self, id: NodeId) -> Result<&mut Transform, SceneError> {
        Ok(&mut self.node_mut(id)?.local)
    }

    pub fn set_local(&mut self, id: NodeId, local: Transform) -> Result<(), SceneError> {
        self.node_mut(id)?.local = local;
        Ok(())
    }

    /// Whether `ancestor` lies on the parent chain of `id` (or is `id`).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> Result<bool, SceneError> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(true);
            }
            cursor = self.node(current)?.parent;
        }
        Ok(false)
    }

    /// Moves `id` below `new_parent`, keeping its local transform.
    pub fn set_parent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        self.node(new_parent)?;
        if self.is_ancestor(id, new_parent)? {
            return Err(SceneError::Cycle {
                node: id,
                parent: new_parent,
            });
        }
        let old_parent = self.node(id)?.parent;
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        if let Some(old) = old_parent {
            self.node_mut(old)?.children.retain(|child| *child != id);
        }
        self.node_mut(new_parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(new_parent);
        Ok(())
    }

    /// Moves `id` below `new_parent` and rewrites its local transform so the
    /// node stays where it is in world space.
    ///
    /// Fails with [`SceneError::NotDecomposable`] and leaves the graph
    /// untouched when the required local matrix is not a plain TRS, e.g. a
    /// rotated child under a non-uniformly scaled parent.
    pub fn set_parent_keep_world(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        if self.is_ancestor(id, new_parent)? {
            return Err(SceneError::Cycle {
                node: id,
                parent: new_parent,
            });
        }
        let world = self.compute_world_matrix(id)?;
        let parent_world = self.compute_world_matrix(new_parent)?;
        let not_decomposable = SceneError::NotDecomposable {
            node: id,
            parent: new_parent,
        };
        let local = parent_world.invert().ok_or_else(|| not_decomposable.clone())? * world;
        let decomposed = Transform::from_matrix(&local);
        if !matrices_close(&decomposed.to_matrix(), &local) {
            return Err(not_decomposable);
        }
        self.set_parent(id, new_parent)?;
        self.node_mut(id)?.local = decomposed;
        Ok(())
    }

    /// Removes `id` and everything below it. Returns the removed ids.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|child| *child != id);
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
                removed.push(current);
            }
        }
        Ok(removed)
    }

    /// Recomputes every cached world matrix, parents before children.
    pub fn update_world_transforms(&mut self) {
        let mut queue = VecDeque::from([(self.root, Matrix4::identity())]);
        while let Some((id, parent_world)) = queue.pop_front() {
            let Some(Some(node)) = self.nodes.get_mut(id.0) else {
                log::warn!("dangling child {:?} skipped during world update", id);
                continue;
            };
            node.world = parent_world * node.local.to_matrix();
            let world = node.world;
            queue.extend(node.children.iter().map(|child| (*child, world)));
        }
    }

    /// Cached world matrix as of the last [`update_world_transforms`](Self::update_world_transforms).
    pub fn world_matrix(&self, id: NodeId) -> Result<Matrix4<f32>, SceneError> {
        Ok(self.node(id)?.world)
    }

    /// World matrix from the current local transforms, ignoring the cache.
    pub fn compute_world_matrix(&self, id: NodeId) -> Result<Matrix4<f32>, SceneError> {
        let mut matrix = Matrix4::identity();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            matrix = node.local.to_matrix() * matrix;
            cursor = node.parent;
        }
        Ok(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vector3<f32>, SceneError> {
        Ok(self.world_matrix(id)?.w.truncate())
    }

    /// Live node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i))
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn matrices_close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
    let a: &[f32; 16] = a.as_ref();
    let b: &[f32; 16] = b.as_ref();
    let magnitude = b.iter().fold(1.0f32, |m, v| m.max(v.abs()));
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-4 * magnitude)
}
