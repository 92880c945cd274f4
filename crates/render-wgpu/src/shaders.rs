/// WGSL shader for instanced field tiles.
///
/// Each instance is a flattened unit cube placed by its model matrix; the
/// instance colour's alpha carries the edge fade.
pub const FIELD_SHADER: &str = r#"
struct Scene {
    view_proj: mat4x4<f32>,
    sun: vec4<f32>,
    // x: ambient, y: diffuse, z: shadow strength
    lighting: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: Scene;

struct Corner {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct Tile {
    @location(2) col0: vec4<f32>,
    @location(3) col1: vec4<f32>,
    @location(4) col2: vec4<f32>,
    @location(5) col3: vec4<f32>,
    @location(6) tint: vec4<f32>,
};

struct Shaded {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) tint: vec4<f32>,
    @location(2) lift: f32,
};

// tile footprint relative to its grid cell
const TILE_SHAPE = vec3<f32>(0.35, 0.1, 0.35);

@vertex
fn vs_main(corner: Corner, tile: Tile) -> Shaded {
    let model = mat4x4<f32>(tile.col0, tile.col1, tile.col2, tile.col3);
    let world = model * vec4<f32>(corner.position * TILE_SHAPE, 1.0);

    var out: Shaded;
    out.clip = scene.view_proj * world;
    out.normal = normalize((model * vec4<f32>(corner.normal, 0.0)).xyz);
    out.tint = tile.tint;
    out.lift = tile.col3.y;
    return out;
}

@fragment
fn fs_main(in: Shaded) -> @location(0) vec4<f32> {
    if in.tint.a <= 0.004 {
        discard;
    }
    // sky above, ground bounce below
    let hemi = mix(0.6, 1.0, in.normal.y * 0.5 + 0.5);
    let sun = max(dot(in.normal, normalize(scene.sun.xyz)), 0.0);
    // tiles sunk below the rest plane sit in shadow
    let shade = 1.0 - scene.lighting.z * clamp(-in.lift * 2.0, 0.0, 0.5);
    let light = (scene.lighting.x * hemi + sun * scene.lighting.y) * shade;
    return vec4<f32>(in.tint.rgb * light, in.tint.a);
}
"#;
