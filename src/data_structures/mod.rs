//! Engine data structures: transforms, scene graphs, meshes and materials.
//!
//! - `transform` holds local TRS transforms and their GPU instance layout
//! - `scene_graph` enables hierarchical scene organization
//! - `mesh` contains CPU geometry and the GPU buffers built from it
//! - `material` holds Blinn-Phong surface parameters and their uniform
//! - `object` ties a mesh, a scene graph node and a material together
//! - `texture` contains depth and off-screen render targets

pub mod material;
pub mod mesh;
pub mod object;
pub mod scene_graph;
pub mod texture;
pub mod transform;
