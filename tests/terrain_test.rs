use cgmath::{InnerSpace, Vector2, Vector3};
use flashlight::{
    data_structures::{
        heightmap::HeightMap,
        player::{Player, PlayerSettings},
        terrain::{PRIMITIVE_RESTART, Terrain, TerrainSettings, TextureFiles, barycentric},
    },
    resources::tags::object_data,
};

use crate::common::test_utils::{heightmap_from_raster, hills, png_bytes};

mod common;

const EPSILON: f32 = 1e-3;

fn flat_settings() -> TerrainSettings {
    TerrainSettings {
        level: 0.0,
        ..Default::default()
    }
}

#[test]
fn every_normal_is_unit_length() {
    let terrain = Terrain::new(hills(17, 13), TerrainSettings::default()).unwrap();

    for vertex in terrain.vertices() {
        let normal: Vector3<f32> = vertex.normal.into();
        assert!(
            (normal.magnitude() - 1.0).abs() < EPSILON,
            "normal {:?} is not unit length",
            normal
        );
        assert!(normal.y > 0.0, "normal {:?} points down", normal);
    }
}

#[test]
fn flat_terrain_normals_point_straight_up() {
    let terrain = Terrain::new(heightmap_from_raster(3, 3, &[90; 9]), flat_settings()).unwrap();
    for vertex in terrain.vertices() {
        assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
    }
}

#[test]
fn slope_normal_leans_away_from_the_rise() {
    // Height rises along +x.
    let raster = [0, 100, 200, 0, 100, 200, 0, 100, 200];
    let terrain = Terrain::new(heightmap_from_raster(3, 3, &raster), flat_settings()).unwrap();
    let centre: Vector3<f32> = terrain.vertices()[4].normal.into();
    assert!(centre.x < 0.0);
    assert!(centre.z.abs() < EPSILON);
}

#[test]
fn height_at_a_vertex_is_the_stored_height() {
    let layouts = [
        (2.5, Vector3::new(-10.0, 3.0, 7.0)),
        (0.1, Vector3::new(0.3, 0.0, 0.7)),
        (0.3, Vector3::new(-1.7, 2.0, 11.9)),
    ];
    for (horizontal_scale, origin) in layouts {
        let settings = TerrainSettings {
            horizontal_scale,
            vertical_scale: 40.0,
            origin,
            ..Default::default()
        };
        let terrain = Terrain::new(hills(33, 33), settings).unwrap();

        for vertex in terrain.vertices() {
            let [x, y, z] = vertex.position;
            assert_eq!(
                terrain.height_at(x, z),
                y,
                "height at ({}, {}) with cells of {}",
                x,
                z,
                horizontal_scale
            );
        }
    }
}

#[test]
fn height_at_a_cell_midpoint_averages_the_diagonal() {
    let raster = [10, 50, 90, 130];
    let terrain = Terrain::new(heightmap_from_raster(2, 2, &raster), flat_settings()).unwrap();

    let diagonal = (terrain.vertex_height(0, 1) + terrain.vertex_height(1, 0)) / 2.0;
    assert!((terrain.height_at(0.5, 0.5) - diagonal).abs() < EPSILON);
}

#[test]
fn height_between_vertices_is_interpolated_on_the_drawn_triangle() {
    let raster = [0, 255, 0, 0];
    let terrain = Terrain::new(heightmap_from_raster(2, 2, &raster), flat_settings()).unwrap();
    let peak = terrain.vertex_height(1, 0);

    // Halfway along the first triangle's x edge.
    assert!((terrain.height_at(0.5, 0.0) - peak / 2.0).abs() < EPSILON);
    // The far triangle has the peak at one corner too.
    assert!((terrain.height_at(1.0, 0.5) - peak / 2.0).abs() < EPSILON);
    assert!(terrain.height_at(0.9, 0.9) < peak);
}

#[test]
fn height_outside_the_terrain_clamps_to_the_edge() {
    let terrain = Terrain::new(hills(5, 5), flat_settings()).unwrap();
    let edge = terrain.height_at(0.0, 2.0);
    assert!((terrain.height_at(-50.0, 2.0) - edge).abs() < EPSILON);
    let corner = terrain.vertex_height(4, 4);
    assert!((terrain.height_at(99.0, 99.0) - corner).abs() < EPSILON);
}

#[test]
fn barycentric_returns_corner_heights() {
    let p1 = Vector3::new(0.0, 1.0, 0.0);
    let p2 = Vector3::new(1.0, 2.0, 0.0);
    let p3 = Vector3::new(0.0, 4.0, 1.0);
    assert!((barycentric(p1, p2, p3, Vector2::new(0.0, 0.0)) - 1.0).abs() < EPSILON);
    assert!((barycentric(p1, p2, p3, Vector2::new(1.0, 0.0)) - 2.0).abs() < EPSILON);
    assert!((barycentric(p1, p2, p3, Vector2::new(0.0, 1.0)) - 4.0).abs() < EPSILON);
}

#[test]
fn levelling_flattens_low_samples_only() {
    let raster = [0, 5, 14, 15, 16, 200];
    let mut heights = heightmap_from_raster(3, 2, &raster);
    let threshold = 15.0 / 255.0;
    heights.level(threshold, threshold);

    let samples = heights.samples();
    assert_eq!(&samples[..3], &[threshold; 3]);
    assert_eq!(samples[3], 15.0 / 255.0);
    assert_eq!(samples[4], 16.0 / 255.0);
    assert_eq!(samples[5], 200.0 / 255.0);
}

#[test]
fn terrain_levels_with_its_configured_threshold() {
    let raster = [0, 0, 30, 255];
    let terrain = Terrain::new(heightmap_from_raster(2, 2, &raster), TerrainSettings::default()).unwrap();
    let level = 15.0 / 255.0 * 25.0;
    assert!((terrain.vertex_height(0, 0) - level).abs() < EPSILON);
    assert!((terrain.vertex_height(1, 0) - level).abs() < EPSILON);
    assert!((terrain.vertex_height(0, 1) - 30.0 / 255.0 * 25.0).abs() < EPSILON);
}

#[test]
fn strip_indices_cover_every_row_pair() {
    let terrain = Terrain::new(hills(4, 3), flat_settings()).unwrap();
    let indices = terrain.indices();

    // Two strips of 2 * 4 indices with one restart between them.
    assert_eq!(indices.len(), 2 * 8 + 1);
    assert_eq!(&indices[..8], &[0, 4, 1, 5, 2, 6, 3, 7]);
    assert_eq!(indices[8], PRIMITIVE_RESTART);
    assert_eq!(&indices[9..], &[4, 8, 5, 9, 6, 10, 7, 11]);
    assert!(
        indices
            .iter()
            .filter(|i| **i != PRIMITIVE_RESTART)
            .all(|i| (*i as usize) < terrain.vertices().len())
    );
}

#[test]
fn grid_partitions_the_bounds() {
    let settings = TerrainSettings {
        horizontal_scale: 3.0,
        origin: Vector3::new(5.0, 0.0, -4.0),
        ..Default::default()
    };
    let terrain = Terrain::new(hills(11, 6), settings).unwrap();
    let grid = terrain.grid();
    let bounds = terrain.bounds();

    assert_eq!(grid.columns, 10);
    assert_eq!(grid.rows, 5);
    let size = bounds.size();
    assert!((grid.extent().x - size.x).abs() < EPSILON);
    assert!((grid.extent().y - size.z).abs() < EPSILON);
    assert_eq!(grid.origin, Vector2::new(bounds.minimum.x, bounds.minimum.z));

    let (min, max) = grid.cell_bounds(0, 0);
    assert_eq!(min, Vector2::new(5.0, -4.0));
    assert_eq!(max, Vector2::new(8.0, -1.0));
    let (_, last) = grid.cell_bounds(grid.columns - 1, grid.rows - 1);
    assert!((last.x - bounds.maximum.x).abs() < EPSILON);
    assert!((last.y - bounds.maximum.z).abs() < EPSILON);

    assert_eq!(grid.cell_at(6.0, -3.0), (0, 0));
    assert_eq!(grid.cell_at(bounds.maximum.x, bounds.maximum.z), (9, 4));
    assert_eq!(grid.cell_at(-100.0, 100.0), (0, 4));
}

#[test]
fn bounds_follow_the_scales() {
    let settings = TerrainSettings {
        level: 0.0,
        horizontal_scale: 2.0,
        vertical_scale: 10.0,
        ..Default::default()
    };
    let raster = [0, 51, 102, 255];
    let terrain = Terrain::new(heightmap_from_raster(2, 2, &raster), settings).unwrap();
    let bounds = terrain.bounds();
    assert_eq!(bounds.minimum, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(bounds.maximum, Vector3::new(2.0, 10.0, 2.0));
    assert!(bounds.contains_xz(1.0, 1.0));
    assert!(!bounds.contains_xz(2.5, 1.0));
}

#[test]
fn heightmap_is_decoded_from_image_bytes() {
    let raster = [0, 64, 128, 255, 32, 16];
    let heights = HeightMap::from_bytes(&png_bytes(3, 2, &raster), "inline").unwrap();
    assert_eq!(heights.width(), 3);
    assert_eq!(heights.height(), 2);
    assert_eq!(heights.sample(2, 0), 128.0 / 255.0);
    assert_eq!(heights.sample(0, 1), 1.0);
}

#[test]
fn undecodable_heightmap_is_an_error() {
    let error = HeightMap::from_bytes(b"definitely not an image", "broken.png").unwrap_err();
    assert!(format!("{:#}", error).contains("broken.png"));
    assert!(HeightMap::open("does/not/exist.png").is_err());
}

#[test]
fn degenerate_heightmaps_are_rejected() {
    assert!(HeightMap::from_samples(1, 5, vec![0.0; 5]).is_err());
    assert!(HeightMap::from_samples(3, 3, vec![0.0; 8]).is_err());
    let settings = TerrainSettings {
        horizontal_scale: 0.0,
        ..Default::default()
    };
    assert!(Terrain::new(hills(3, 3), settings).is_err());
}

#[test]
fn settings_are_read_from_a_config_block() {
    let text = "TYPE >> Terrain\nheightmap:maps/hills.png\nlevel:20\nscale.horizontal:\t2\ntransform.y:-5\n----------END----------\n";
    let block = object_data(text, "Terrain").unwrap();
    let settings = TerrainSettings::from_block(&block).unwrap();
    assert_eq!(settings.level, 20.0);
    assert_eq!(settings.horizontal_scale, 2.0);
    assert_eq!(settings.vertical_scale, 25.0);
    assert_eq!(settings.origin, Vector3::new(0.0, -5.0, 0.0));
}

#[test]
fn texture_pack_reads_optional_detail_textures() {
    let text = "TYPE >> Terrain\ntexture:\ttextures/ground.png\ntexture.green:textures/sand.png\ntexture.blendmap:textures/blendmap.png\n----------END----------\n";
    let files = TextureFiles::from_block(&object_data(text, "Terrain").unwrap()).unwrap();
    assert_eq!(files.base, "textures/ground.png");
    assert_eq!(files.red, None);
    assert_eq!(files.green.as_deref(), Some("textures/sand.png"));
    assert_eq!(files.blue, None);
    assert_eq!(files.blend_map.as_deref(), Some("textures/blendmap.png"));
    assert_eq!(
        files.detail().collect::<Vec<_>>(),
        vec![None, Some("textures/sand.png"), None]
    );
}

#[test]
fn texture_pack_needs_a_base_texture() {
    let text = "TYPE >> Terrain\ntexture.red:textures/rock.png\n----------END----------\n";
    assert!(TextureFiles::from_block(&object_data(text, "Terrain").unwrap()).is_err());
}

#[test]
fn blend_coordinates_span_the_terrain_once() {
    let settings = TerrainSettings {
        texture_repeat: 8.0,
        ..Default::default()
    };
    let terrain = Terrain::new(hills(5, 9), settings).unwrap();
    let vertices = terrain.vertices();

    assert_eq!(vertices[0].blend_coords, [0.0, 0.0]);
    assert_eq!(vertices[vertices.len() - 1].blend_coords, [1.0, 1.0]);
    for vertex in vertices {
        assert!(vertex.blend_coords.iter().all(|c| (0.0..=1.0).contains(c)));
        assert_eq!(vertex.tex_coords, vertex.blend_coords.map(|c| c * 8.0));
    }
}

#[test]
fn player_walks_on_the_surface() {
    let terrain = Terrain::new(hills(33, 33), TerrainSettings::default()).unwrap();
    let settings = PlayerSettings::default();
    let eye = settings.eye_height;
    let mut player = Player::new(settings, &terrain);

    for _ in 0..200 {
        player.walk(&terrain, 1.0, 0.3, 0.05);
        let p = player.position();
        assert!(terrain.bounds().contains_xz(p.x, p.z));
        assert!((p.y - terrain.height_at(p.x, p.z) - eye).abs() < EPSILON);
    }
}

#[test]
fn player_reaches_the_far_corner() {
    let terrain = Terrain::new(hills(20, 20), TerrainSettings::default()).unwrap();
    let mut player = Player::new(PlayerSettings::default(), &terrain);
    assert!(!player.reached_goal());

    // The player starts facing the goal.
    for _ in 0..400 {
        if player.reached_goal() {
            break;
        }
        player.walk(&terrain, 1.0, 0.0, 0.05);
    }
    assert!(player.reached_goal());
}
