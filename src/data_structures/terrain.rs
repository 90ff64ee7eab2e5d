//! Heightmap terrain: mesh generation, bounds, grid and height queries.
//!
//! The pipeline is heightmap -> levelling -> finite-difference normals ->
//! triangle-strip mesh. The finished [`Terrain`] answers ground-height queries
//! for any world (x, z) position by barycentric interpolation over the same
//! triangles the GPU draws, so objects placed with [`Terrain::height_at`] sit
//! exactly on the rendered surface.
//!
//! # Layout
//!
//! Column `c` and row `r` of the heightmap map to world position
//! `origin + (c * horizontal_scale, sample * vertical_scale, r * horizontal_scale)`.
//! Each pair of rows forms one strip; consecutive strips are separated by
//! [`PRIMITIVE_RESTART`]. Inside a cell the strip splits the quad along the
//! diagonal from (c, r + 1) to (c + 1, r).

use std::{path::Path, rc::Rc};

use anyhow::Context;
use cgmath::{InnerSpace, Vector2, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        heightmap::{HeightMap, RASTER_MAX},
        texture::Texture,
    },
    render::{Flat, Render},
    resources::{
        tags::TagBlock,
        texture::{TERRAIN_TEXTURE_SLOTS, terrain_texture_bind_group},
    },
};

/// Index that restarts the triangle strip.
pub const PRIMITIVE_RESTART: u32 = u32::MAX;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    /// Position across the whole terrain in `[0, 1]`, used for the blend map.
    pub blend_coords: [f32; 2],
}

impl TerrainVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Construction parameters of a terrain.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSettings {
    /// Samples darker than this raster intensity (0..=255) are flattened to it.
    pub level: f32,
    /// World distance between neighbouring samples along x and z.
    pub horizontal_scale: f32,
    /// World height of a full-intensity sample.
    pub vertical_scale: f32,
    /// World position of sample (0, 0) at height zero.
    pub origin: Vector3<f32>,
    /// How often the ground texture repeats across the whole terrain.
    pub texture_repeat: f32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            level: 15.0,
            horizontal_scale: 1.0,
            vertical_scale: 25.0,
            origin: Vector3::new(0.0, 0.0, 0.0),
            texture_repeat: 1.0,
        }
    }
}

impl TerrainSettings {
    /// Reads `level`, `scale.horizontal`, `scale.vertical`, `transform.x/y/z`
    /// and `texture.repeat`; every key is optional.
    pub fn from_block(block: &TagBlock) -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            level: block.get_f32_or("level", defaults.level)?,
            horizontal_scale: block.get_f32_or("scale.horizontal", defaults.horizontal_scale)?,
            vertical_scale: block.get_f32_or("scale.vertical", defaults.vertical_scale)?,
            origin: Vector3::new(
                block.get_f32_or("transform.x", 0.0)?,
                block.get_f32_or("transform.y", 0.0)?,
                block.get_f32_or("transform.z", 0.0)?,
            ),
            texture_repeat: block.get_f32_or("texture.repeat", defaults.texture_repeat)?,
        })
    }
}

/// Axis-aligned box around every terrain vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldBounds {
    pub minimum: Vector3<f32>,
    pub maximum: Vector3<f32>,
}

impl WorldBounds {
    pub fn size(&self) -> Vector3<f32> {
        self.maximum - self.minimum
    }

    /// Whether (x, z) lies over the terrain, ignoring height.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.minimum.x && x <= self.maximum.x && z >= self.minimum.z && z <= self.maximum.z
    }
}

/// Regular 2D grid over the terrain's x/z extent; one cell per heightmap quad.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TerrainGrid {
    pub columns: u32,
    pub rows: u32,
    pub cell_size: f32,
    /// World (x, z) of the corner of cell (0, 0).
    pub origin: Vector2<f32>,
}

impl TerrainGrid {
    /// World length covered along x and z.
    pub fn extent(&self) -> Vector2<f32> {
        Vector2::new(
            self.columns as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }

    /// Cell containing (x, z). Positions off the grid snap to the nearest cell.
    pub fn cell_at(&self, x: f32, z: f32) -> (u32, u32) {
        let (column, row, _, _) = self.locate(x, z);
        (column, row)
    }

    /// World (x, z) corners of a cell, minimum first.
    pub fn cell_bounds(&self, column: u32, row: u32) -> (Vector2<f32>, Vector2<f32>) {
        let min = self.origin
            + Vector2::new(column as f32 * self.cell_size, row as f32 * self.cell_size);
        (min, min + Vector2::new(self.cell_size, self.cell_size))
    }

    /// Clamped cell and the position's fraction inside it, both in `[0, 1]`.
    fn locate(&self, x: f32, z: f32) -> (u32, u32, f32, f32) {
        let local_x = snap_to_vertex((x - self.origin.x) / self.cell_size);
        let local_z = snap_to_vertex((z - self.origin.y) / self.cell_size);
        let column = local_x.floor().clamp(0.0, (self.columns - 1) as f32);
        let row = local_z.floor().clamp(0.0, (self.rows - 1) as f32);
        let fx = (local_x - column).clamp(0.0, 1.0);
        let fz = (local_z - row).clamp(0.0, 1.0);
        (column as u32, row as u32, fx, fz)
    }
}

/// Grid coordinates this close (in cells) to a vertex are moved onto it, so
/// rounding in the world-to-grid conversion cannot push a vertex position into
/// the neighbouring cell.
const VERTEX_SNAP: f32 = 1e-4;

fn snap_to_vertex(local: f32) -> f32 {
    let nearest = local.round();
    if (local - nearest).abs() <= VERTEX_SNAP * nearest.abs().max(1.0) {
        nearest
    } else {
        local
    }
}

pub struct Terrain {
    heights: HeightMap,
    settings: TerrainSettings,
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
    grid: TerrainGrid,
    bounds: WorldBounds,
}

impl Terrain {
    pub fn new(mut heights: HeightMap, settings: TerrainSettings) -> anyhow::Result<Self> {
        if !(settings.horizontal_scale > 0.0) {
            anyhow::bail!(
                "Terrain horizontal scale must be positive, got {}",
                settings.horizontal_scale
            );
        }

        let threshold = settings.level / RASTER_MAX;
        heights.level(threshold, threshold);

        let vertices = build_vertices(&heights, &settings);
        let indices = build_strip_indices(heights.width(), heights.height());
        let bounds = compute_bounds(&vertices);
        let grid = TerrainGrid {
            columns: heights.width() - 1,
            rows: heights.height() - 1,
            cell_size: settings.horizontal_scale,
            origin: Vector2::new(settings.origin.x, settings.origin.z),
        };

        log::info!(
            "Terrain generated: {}x{} samples, {} vertices, {} indices",
            heights.width(),
            heights.height(),
            vertices.len(),
            indices.len()
        );

        Ok(Self {
            heights,
            settings,
            vertices,
            indices,
            grid,
            bounds,
        })
    }

    pub fn open(path: impl AsRef<Path>, settings: TerrainSettings) -> anyhow::Result<Self> {
        let heights = HeightMap::open(path)?;
        Self::new(heights, settings)
    }

    /// Builds a terrain from a config block; `heightmap` is resolved against
    /// `asset_root`.
    pub fn from_block(block: &TagBlock, asset_root: &Path) -> anyhow::Result<Self> {
        let heightmap = block.get("heightmap")?;
        let settings = TerrainSettings::from_block(block)?;
        Self::open(asset_root.join(heightmap), settings)
            .with_context(|| format!("Failed to create terrain {}", block.name()))
    }

    /// Ground height below world (x, z).
    ///
    /// The containing cell is found on the grid (positions off the terrain
    /// clamp to the nearest edge cell) and the height is interpolated inside
    /// the triangle of that cell holding the position.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let (column, row, fx, fz) = self.grid.locate(x, z);
        let h00 = self.vertex_height(column, row);
        let h10 = self.vertex_height(column + 1, row);
        let h01 = self.vertex_height(column, row + 1);
        let h11 = self.vertex_height(column + 1, row + 1);

        let position = Vector2::new(fx, fz);
        if fx + fz <= 1.0 {
            barycentric(
                Vector3::new(0.0, h00, 0.0),
                Vector3::new(1.0, h10, 0.0),
                Vector3::new(0.0, h01, 1.0),
                position,
            )
        } else {
            barycentric(
                Vector3::new(1.0, h10, 0.0),
                Vector3::new(1.0, h11, 1.0),
                Vector3::new(0.0, h01, 1.0),
                position,
            )
        }
    }

    /// [`height_at`](Self::height_at) raised by `offset`, e.g. an eye height.
    pub fn height_at_offset(&self, x: f32, z: f32, offset: f32) -> f32 {
        self.height_at(x, z) + offset
    }

    /// World height stored at a grid vertex.
    pub fn vertex_height(&self, column: u32, row: u32) -> f32 {
        self.settings.origin.y + self.heights.sample(column, row) * self.settings.vertical_scale
    }

    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Levelled, normalized samples the mesh was built from.
    pub fn heightmap(&self) -> &HeightMap {
        &self.heights
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }
}

/// Image files of a terrain texture pack.
///
/// The base texture covers the ground wherever the blend map is black. The
/// red, green and blue channels of the blend map fade in the matching detail
/// texture. Detail textures and the blend map are optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureFiles {
    pub base: String,
    pub red: Option<String>,
    pub green: Option<String>,
    pub blue: Option<String>,
    pub blend_map: Option<String>,
}

impl TextureFiles {
    /// Reads `texture` and the optional `texture.red`, `texture.green`,
    /// `texture.blue` and `texture.blendmap`.
    pub fn from_block(block: &TagBlock) -> anyhow::Result<Self> {
        let optional = |key: &str| -> anyhow::Result<Option<String>> {
            if block.contains(key) {
                Ok(Some(block.get(key)?.to_string()))
            } else {
                Ok(None)
            }
        };
        let files = Self {
            base: block.get("texture")?.to_string(),
            red: optional("texture.red")?,
            green: optional("texture.green")?,
            blue: optional("texture.blue")?,
            blend_map: optional("texture.blendmap")?,
        };
        if files.blend_map.is_none() && files.detail().any(|file| file.is_some()) {
            log::warn!(
                "Terrain {} has detail textures but no blend map; only the base texture shows",
                block.name()
            );
        }
        Ok(files)
    }

    /// Red, green and blue detail textures, in that order.
    pub fn detail(&self) -> impl Iterator<Item = Option<&str>> {
        [&self.red, &self.green, &self.blue]
            .into_iter()
            .map(|file| file.as_deref())
    }
}

/// Uploaded textures of a terrain, one per binding slot. Missing detail
/// textures repeat the base texture and a missing blend map is black.
#[derive(Clone, Debug)]
pub struct TexturePack {
    pub base: Rc<Texture>,
    pub red: Rc<Texture>,
    pub green: Rc<Texture>,
    pub blue: Rc<Texture>,
    pub blend_map: Rc<Texture>,
}

impl TexturePack {
    /// Loads every file of `files` through `load`, filling the gaps with the
    /// base texture and `blank`.
    pub fn load<F>(files: &TextureFiles, blank: Rc<Texture>, mut load: F) -> anyhow::Result<Self>
    where
        F: FnMut(&str) -> anyhow::Result<Rc<Texture>>,
    {
        let base = load(&files.base)?;
        let mut detail = |file: &Option<String>| -> anyhow::Result<Rc<Texture>> {
            match file {
                Some(file) => load(file),
                None => Ok(Rc::clone(&base)),
            }
        };
        let red = detail(&files.red)?;
        let green = detail(&files.green)?;
        let blue = detail(&files.blue)?;
        let blend_map = match &files.blend_map {
            Some(file) => load(file)?,
            None => blank,
        };
        Ok(Self {
            base,
            red,
            green,
            blue,
            blend_map,
        })
    }

    fn slots(&self) -> [&Texture; TERRAIN_TEXTURE_SLOTS as usize] {
        [
            &*self.base,
            &*self.red,
            &*self.green,
            &*self.blue,
            &*self.blend_map,
        ]
    }
}

/// GPU buffers of a [`Terrain`] and its texture pack.
#[derive(Debug)]
pub struct TerrainMesh {
    textures: TexturePack,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    amount: u32,
}

impl TerrainMesh {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        terrain: &Terrain,
        textures: TexturePack,
    ) -> Self {
        let bind_group =
            terrain_texture_bind_group(device, layout, textures.slots(), "terrain_bind_group");
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Vertex Buffer"),
            contents: bytemuck::cast_slice(terrain.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Index Buffer"),
            contents: bytemuck::cast_slice(terrain.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            textures,
            bind_group,
            vertex_buffer,
            index_buffer,
            amount: terrain.indices().len() as u32,
        }
    }

    pub fn textures(&self) -> &TexturePack {
        &self.textures
    }

    pub fn render(&self) -> Render {
        Render::Terrain(Flat {
            vertex: self.vertex_buffer.clone(),
            index: self.index_buffer.clone(),
            group: self.bind_group.clone(),
            amount: self.amount,
        })
    }
}

fn build_vertices(heights: &HeightMap, settings: &TerrainSettings) -> Vec<TerrainVertex> {
    let (width, depth) = (heights.width(), heights.height());
    let spacing = settings.horizontal_scale;
    let mut vertices = Vec::with_capacity((width * depth) as usize);

    for row in 0..depth {
        for column in 0..width {
            let height = heights.sample(column, row) * settings.vertical_scale;
            let position = settings.origin
                + Vector3::new(column as f32 * spacing, height, row as f32 * spacing);
            let blend_coords = [
                column as f32 / (width - 1) as f32,
                row as f32 / (depth - 1) as f32,
            ];
            vertices.push(TerrainVertex {
                position: position.into(),
                tex_coords: blend_coords.map(|c| c * settings.texture_repeat),
                normal: compute_normal(heights, column, row, settings).into(),
                blend_coords,
            });
        }
    }
    vertices
}

/// Finite-difference normal from the four direct neighbours.
fn compute_normal(
    heights: &HeightMap,
    column: u32,
    row: u32,
    settings: &TerrainSettings,
) -> Vector3<f32> {
    let scale = settings.vertical_scale;
    let left = heights.neighbour(column, row, -1, 0) * scale;
    let right = heights.neighbour(column, row, 1, 0) * scale;
    let down = heights.neighbour(column, row, 0, -1) * scale;
    let up = heights.neighbour(column, row, 0, 1) * scale;

    let span = 2.0 * settings.horizontal_scale;
    let tangent_x = Vector3::new(span, right - left, 0.0);
    let tangent_z = Vector3::new(0.0, up - down, span);

    tangent_z.cross(tangent_x).normalize()
}

fn build_strip_indices(width: u32, depth: u32) -> Vec<u32> {
    let strips = depth - 1;
    let mut indices = Vec::with_capacity((strips * (2 * width + 1)) as usize);
    for row in 0..strips {
        for column in 0..width {
            indices.push(row * width + column);
            indices.push((row + 1) * width + column);
        }
        if row + 1 < strips {
            indices.push(PRIMITIVE_RESTART);
        }
    }
    indices
}

fn compute_bounds(vertices: &[TerrainVertex]) -> WorldBounds {
    let first: Vector3<f32> = vertices
        .first()
        .map(|v| v.position.into())
        .unwrap_or(Vector3::new(0.0, 0.0, 0.0));
    vertices.iter().fold(
        WorldBounds {
            minimum: first,
            maximum: first,
        },
        |bounds, vertex| {
            let p: Vector3<f32> = vertex.position.into();
            WorldBounds {
                minimum: Vector3::new(
                    bounds.minimum.x.min(p.x),
                    bounds.minimum.y.min(p.y),
                    bounds.minimum.z.min(p.z),
                ),
                maximum: Vector3::new(
                    bounds.maximum.x.max(p.x),
                    bounds.maximum.y.max(p.y),
                    bounds.maximum.z.max(p.z),
                ),
            }
        },
    )
}

/// Interpolates the y of triangle (p1, p2, p3) at `position`, given as (x, z).
pub fn barycentric(
    p1: Vector3<f32>,
    p2: Vector3<f32>,
    p3: Vector3<f32>,
    position: Vector2<f32>,
) -> f32 {
    let det = (p2.z - p3.z) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.z - p3.z);
    let l1 = ((p2.z - p3.z) * (position.x - p3.x) + (p3.x - p2.x) * (position.y - p3.z)) / det;
    let l2 = ((p3.z - p1.z) * (position.x - p3.x) + (p1.x - p3.x) * (position.y - p3.z)) / det;
    let l3 = 1.0 - l1 - l2;
    l1 * p1.y + l2 * p2.y + l3 * p3.y
}
