//! Render composition and pipeline batching.
//!
//! Flows describe what to draw with a [`Render`] tree. The runtime flattens the
//! tree into one batch per pipeline (lit, unlit, textured) and replays it once
//! for the frame and once, with only the pickable entries, for the pick buffer.

use std::collections::{HashMap, HashSet};

use wgpu::RenderPass;

use crate::{context::Context, data_structures::mesh::Mesh};

/// One mesh drawn with an instance buffer of world transforms and a material.
pub struct Drawable<'a> {
    pub mesh: &'a Mesh,
    pub instance: &'a wgpu::Buffer,
    pub amount: u32,
    /// Bound at group 2: the material uniform, or the texture for
    /// `Render::Textured`.
    pub material: &'a wgpu::BindGroup,
    /// Pick id; `0` is never reported as a hit.
    pub id: u32,
}

/// Specifies how a flow's objects are rendered.
///
/// - `None` renders nothing
/// - `Lit` / `Lits` go through the Blinn-Phong pipeline
/// - `Unlit` / `Unlits` output vertex colour times material diffuse
/// - `Textured` outputs the sampled texture, see [`crate::render_texture`]
/// - `Composed` nests further renders
/// - `Custom` runs a closure on the main pass; it takes no part in picking
pub enum Render<'a, 'pass>
where
    'pass: 'a,
{
    None,
    Lit(Drawable<'a>),
    Lits(Vec<Drawable<'a>>),
    Unlit(Drawable<'a>),
    Unlits(Vec<Drawable<'a>>),
    Textured(Vec<Drawable<'a>>),
    Composed(Vec<Render<'a, 'pass>>),
    Custom(Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'pass>)>),
}

/// Drawables of one frame grouped by pipeline.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub lits: Vec<Drawable<'a>>,
    pub unlits: Vec<Drawable<'a>>,
    pub textured: Vec<Drawable<'a>>,
}

fn register(map: &mut HashMap<u32, HashSet<usize>>, id: u32, flow_id: usize) {
    if id != 0 {
        map.entry(id).or_default().insert(flow_id);
    }
}

impl<'a, 'pass> Render<'a, 'pass> {
    /// Records which flow owns which pick ids.
    ///
    /// Several flows may claim the same id; each of them receives the click.
    pub(crate) fn map_ids(&self, flow_id: usize, map: &mut HashMap<u32, HashSet<usize>>) {
        match self {
            Render::Lit(d) | Render::Unlit(d) => register(map, d.id, flow_id),
            Render::Lits(vec) | Render::Unlits(vec) | Render::Textured(vec) => {
                vec.iter().for_each(|d| register(map, d.id, flow_id))
            }
            Render::Composed(renders) => renders.iter().for_each(|r| r.map_ids(flow_id, map)),
            Render::None | Render::Custom(_) => (),
        }
    }

    pub(crate) fn set_pipelines(
        self,
        ctx: &Context,
        render_pass: &mut RenderPass<'pass>,
        batches: &mut Batches<'a>,
    ) {
        match self {
            Render::Lit(d) => batches.lits.push(d),
            Render::Lits(mut vec) => batches.lits.append(&mut vec),
            Render::Unlit(d) => batches.unlits.push(d),
            Render::Unlits(mut vec) => batches.unlits.append(&mut vec),
            Render::Textured(mut vec) => batches.textured.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|r| r.set_pipelines(ctx, render_pass, batches)),
            Render::Custom(f) => f(ctx, render_pass),
            Render::None => (),
        }
    }

    /// Collects every entry with a non-zero id, regardless of pipeline.
    pub(crate) fn set_pick_pipelines(self, pickables: &mut Vec<Drawable<'a>>) {
        match self {
            Render::Lit(d) | Render::Unlit(d) => {
                if d.id != 0 {
                    pickables.push(d);
                }
            }
            Render::Lits(vec) | Render::Unlits(vec) | Render::Textured(vec) => {
                pickables.extend(vec.into_iter().filter(|d| d.id != 0))
            }
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|r| r.set_pick_pipelines(pickables)),
            Render::Custom(_) | Render::None => (),
        }
    }

    /// Number of drawables in the tree, custom closures excluded.
    pub fn len(&self) -> usize {
        match self {
            Render::Lit(_) | Render::Unlit(_) => 1,
            Render::Lits(vec) | Render::Unlits(vec) | Render::Textured(vec) => vec.len(),
            Render::Composed(renders) => renders.iter().map(Render::len).sum(),
            Render::None | Render::Custom(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
