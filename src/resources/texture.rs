use std::{collections::HashMap, path::Path, rc::Rc};

use log::{debug, info};

use crate::data_structures::texture::{self, Texture};

/// Layout shared by every sprite and terrain texture: a filterable 2D view at
/// binding 0 and its sampler at binding 1.
pub fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("texture_bind_group_layout"),
    })
}

pub fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    // Depth textures carry no sampler; color textures always do.
    let fallback;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback = texture::create_default_sampler(device);
            &fallback
        }
    };
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some(label),
    })
}

/// Texture views of a terrain texture pack, in binding order: base, red,
/// green and blue detail textures, then the blend map.
pub const TERRAIN_TEXTURE_SLOTS: u32 = 5;

/// Layout of a terrain texture pack: [`TERRAIN_TEXTURE_SLOTS`] filterable 2D
/// views followed by one shared sampler.
pub fn terrain_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..TERRAIN_TEXTURE_SLOTS)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: TERRAIN_TEXTURE_SLOTS,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("terrain_texture_bind_group_layout"),
    })
}

/// Binds `textures` in slot order with one repeating sampler.
pub fn terrain_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    textures: [&Texture; TERRAIN_TEXTURE_SLOTS as usize],
    label: &str,
) -> wgpu::BindGroup {
    let sampler = texture::create_default_sampler(device);
    let mut entries: Vec<wgpu::BindGroupEntry> = textures
        .iter()
        .zip(0..)
        .map(|(texture, binding)| wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::TextureView(&texture.view),
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: TERRAIN_TEXTURE_SLOTS,
        resource: wgpu::BindingResource::Sampler(&sampler),
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &entries,
        label: Some(label),
    })
}

/// Reads and uploads an image file.
pub fn load_texture(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = super::load_binary(path)?;
    let texture = Texture::from_bytes(device, queue, &data, &path.to_string_lossy())?;
    info!(
        "Texture loaded: {} ({}x{})",
        path.display(),
        texture.size[0],
        texture.size[1]
    );
    Ok(texture)
}

/// Textures keyed by tag, shared between the states that use them.
///
/// A texture is loaded the first time its tag is requested; later requests
/// hand out another reference to the same upload. The cache holds one
/// reference itself, so a texture no state refers to any more is dropped by
/// [`release_unused`](Self::release_unused).
///
/// The cache is generic so the loading policy can be exercised without a GPU.
pub struct TextureCache<T> {
    entries: HashMap<String, Rc<T>>,
    uploads: usize,
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            uploads: 0,
        }
    }

    /// Returns the texture cached for `tag`, running `load` only on a miss.
    /// A failed load caches nothing.
    pub fn get_or_load<F>(&mut self, tag: &str, load: F) -> anyhow::Result<Rc<T>>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        if let Some(texture) = self.entries.get(tag) {
            debug!("Texture cache hit: {}", tag);
            return Ok(Rc::clone(texture));
        }

        let texture = Rc::new(load()?);
        self.uploads += 1;
        self.entries.insert(tag.to_string(), Rc::clone(&texture));
        debug!("Texture cached: {}", tag);
        Ok(texture)
    }

    pub fn get(&self, tag: &str) -> Option<Rc<T>> {
        self.entries.get(tag).map(Rc::clone)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of references held outside the cache.
    pub fn references(&self, tag: &str) -> usize {
        self.entries
            .get(tag)
            .map(|texture| Rc::strong_count(texture) - 1)
            .unwrap_or(0)
    }

    /// How many times a loader actually ran.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every texture only the cache still refers to. Returns how many
    /// were released.
    pub fn release_unused(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|tag, texture| {
            let used = Rc::strong_count(texture) > 1;
            if !used {
                debug!("Texture released: {}", tag);
            }
            used
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
