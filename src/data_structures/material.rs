use wgpu::util::DeviceExt;

/// Surface response used by the Blinn-Phong shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    /// Quantise diffuse and specular terms into bands.
    pub toon: bool,
}

impl Material {
    /// Uses `color` for all three terms, like a plain `mainColor`.
    pub fn from_color(color: [f32; 3]) -> Self {
        Self {
            ambient: color,
            diffuse: color,
            specular: color,
            shininess: 100.0,
            toon: false,
        }
    }

    pub fn with_toon(mut self, toon: bool) -> Self {
        self.toon = toon;
        self
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            ambient: self.ambient,
            shininess: self.shininess,
            diffuse: self.diffuse,
            toon: u32::from(self.toon),
            specular: self.specular,
            _padding: 0.0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::from_color([1.0; 3])
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    ambient: [f32; 3],
    shininess: f32,
    diffuse: [f32; 3],
    toon: u32,
    specular: [f32; 3],
    _padding: f32,
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("material_bind_group_layout"),
    })
}

/// Material uniform buffer plus its bind group.
#[derive(Debug)]
pub struct MaterialResources {
    pub material: Material,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MaterialResources {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, material: Material) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Buffer"),
            contents: bytemuck::cast_slice(&[material.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("material_bind_group"),
        });
        Self {
            material,
            buffer,
            bind_group,
        }
    }

    pub fn set(&mut self, queue: &wgpu::Queue, material: Material) {
        self.material = material;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[material.to_uniform()]));
    }
}
