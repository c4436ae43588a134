//! Error types for the scene graph and picking.
//!
//! GPU setup and the application loop report failures through `anyhow`; the
//! enums below cover the cases callers are expected to match on.

use thiserror::Error;

use crate::data_structures::scene_graph::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} does not exist in this scene graph")]
    UnknownNode(NodeId),
    #[error("making {parent:?} the parent of {node:?} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },
    #[error("the root node cannot be re-parented or removed")]
    RootImmutable,
    #[error("no node is named {0:?}")]
    UnknownName(String),
    #[error("{node:?} cannot keep its world transform below {parent:?} without shear")]
    NotDecomposable { node: NodeId, parent: NodeId },
}

#[derive(Debug, Error)]
pub enum PickError {
    #[error("cursor ({x}, {y}) lies outside the {width}x{height} pick target")]
    OutOfBounds { x: f64, y: f64, width: u32, height: u32 },
    #[error("mapping the pick buffer failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("waiting for the GPU failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("the pick readback channel closed before the buffer was mapped")]
    ChannelClosed,
}
