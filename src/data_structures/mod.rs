//! Engine data structures: heightmaps, terrain, textures, sprites and the
//! player.
//!
//! - `heightmap` decodes raster heightmaps into normalized samples
//! - `terrain` turns a heightmap into a mesh and answers height queries
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `sprite` holds textured quads and the widgets built on them
//! - `player` walks a camera over the terrain

pub mod heightmap;
pub mod player;
pub mod sprite;
pub mod terrain;
pub mod texture;
