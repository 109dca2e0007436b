#[cfg(feature = "integration-tests")]
mod common;

/// A quad covering the whole clip space, textured with a solid red image.
#[cfg(feature = "integration-tests")]
fn red_quad_fixture() -> common::test_utils::Fixture {
    let fx = common::test_utils::Fixture::new("wgpu-quad");
    fx.write_png("red.png", 4, 4, [255, 0, 0, 255]);
    fx.write("quad.mtl", "newmtl red\nmap_Kd red.png\n");
    fx.write(
        "quad.obj",
        "mtllib quad.mtl\no quad\n\
         v -1 -1 0.5\nv 1 -1 0.5\nv 1 1 0.5\nv -1 1 0.5\n\
         vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nvn 0 0 1\n\
         usemtl red\nf 1/1/1 2/2/1 3/3/1 4/4/1\n",
    );
    fx
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour_without_draws() {
    use flow_mesh::WgpuContext;

    common::test_utils::init_logger();
    let mut ctx = WgpuContext::headless().unwrap();

    let img = ctx.render_offscreen(8, 8, wgpu::Color::WHITE).unwrap();

    assert!(img.pixels().all(|p| *p == image::Rgba([255, 255, 255, 255])));
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_textured_model() {
    use flow_mesh::{Model, WgpuContext, context::OFFSCREEN_FORMAT};

    common::test_utils::init_logger();
    let fx = red_quad_fixture();
    let mut ctx = WgpuContext::headless().unwrap();
    let model = Model::load(&mut ctx, fx.path("quad.obj")).unwrap();
    let shader = ctx.create_model_program(OFFSCREEN_FORMAT).unwrap();

    shader.use_program(&mut ctx);
    model.draw(&mut ctx, &shader).unwrap();
    assert_eq!(ctx.pending_draws(), 1);
    let img = ctx.render_offscreen(16, 16, wgpu::Color::BLACK).unwrap();

    assert_eq!(ctx.pending_draws(), 0);
    let centre = img.get_pixel(8, 8);
    assert!(centre[0] > 200, "centre pixel {centre:?}");
    assert!(centre[1] < 100 && centre[2] < 100, "centre pixel {centre:?}");
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_sample_fallback_for_mesh_drawn_after_textured_one() {
    use flow_mesh::{Model, WgpuContext, context::OFFSCREEN_FORMAT};

    common::test_utils::init_logger();
    let fx = common::test_utils::Fixture::new("wgpu-halves");
    fx.write_png("red.png", 4, 4, [255, 0, 0, 255]);
    fx.write(
        "halves.mtl",
        "newmtl red\nmap_Kd red.png\nnewmtl lost\nmap_Kd missing.png\n",
    );
    // left half textured red, right half with a texture that fails to load
    fx.write(
        "halves.obj",
        "mtllib halves.mtl\n\
         v -1 -1 0.5\nv 0 -1 0.5\nv 0 1 0.5\nv -1 1 0.5\n\
         v 0 -1 0.5\nv 1 -1 0.5\nv 1 1 0.5\nv 0 1 0.5\n\
         vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nvn 0 0 1\n\
         o left\nusemtl red\nf 1/1/1 2/2/1 3/3/1 4/4/1\n\
         o right\nusemtl lost\nf 5/1/1 6/2/1 7/3/1 8/4/1\n",
    );
    let mut ctx = WgpuContext::headless().unwrap();
    let model = Model::load(&mut ctx, fx.path("halves.obj")).unwrap();
    assert_eq!(model.meshes().len(), 2);
    assert!(model.meshes()[1].textures().is_empty());
    let shader = ctx.create_model_program(OFFSCREEN_FORMAT).unwrap();

    shader.use_program(&mut ctx);
    model.draw(&mut ctx, &shader).unwrap();
    assert_eq!(ctx.pending_draws(), 2);
    let img = ctx.render_offscreen(16, 16, wgpu::Color::BLACK).unwrap();

    let left = img.get_pixel(4, 8);
    assert!(left[0] > 200 && left[1] < 100 && left[2] < 100, "left pixel {left:?}");
    let right = img.get_pixel(12, 8);
    assert!(right.0[..3].iter().all(|&c| c > 200), "right pixel {right:?}");
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_reject_textures_beyond_device_limits() {
    use flow_mesh::{Gpu, GpuError, WgpuContext, resources::image::DecodedImage};

    common::test_utils::init_logger();
    let mut ctx = WgpuContext::headless().unwrap();
    let max = ctx.device.limits().max_texture_dimension_2d;
    let empty = DecodedImage {
        width: 0,
        height: 4,
        channels: 4,
        pixels: Vec::new(),
    };
    let huge = DecodedImage {
        width: max + 1,
        height: 1,
        channels: 4,
        pixels: Vec::new(),
    };

    assert!(matches!(
        ctx.create_texture(&empty, "empty"),
        Err(GpuError::EmptyTexture(_))
    ));
    assert!(matches!(
        ctx.create_texture(&huge, "huge"),
        Err(GpuError::TextureTooLarge { .. })
    ));
}
