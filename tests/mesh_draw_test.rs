use flow_mesh::{
    GpuError, LoadError, Mesh, Model, ModelLoader, TextureCache, TextureKind, TraceGpu, Vertex,
    gpu::trace::GpuCall,
    resources::import::Scene,
};

mod common;

use common::test_utils::{Fixture, StubImporter, init_logger, material, node, triangle};

/// Two triangles: `textured` with two diffuse maps and one specular map,
/// `plain` with only the first diffuse map.
fn textured_fixture(name: &str) -> (Fixture, ModelLoader) {
    let fx = Fixture::new(name);
    fx.write_png("a.png", 1, 1, [255, 0, 0, 255]);
    fx.write_png("b.png", 1, 1, [0, 255, 0, 255]);
    fx.write_png("s.png", 1, 1, [255, 255, 255, 255]);
    let scene = Scene {
        nodes: vec![node("root", &[0, 1], &[])],
        root: Some(0),
        meshes: vec![triangle("textured", Some(0)), triangle("plain", Some(1))],
        materials: vec![
            material(
                "layered",
                vec![
                    (TextureKind::Specular, "s.png"),
                    (TextureKind::Diffuse, "a.png"),
                    (TextureKind::Diffuse, "b.png"),
                ],
            ),
            material("simple", vec![(TextureKind::Diffuse, "a.png")]),
        ],
    };
    let loader = ModelLoader::default().with_importer(StubImporter { scene });
    (fx, loader)
}

fn texture_id(model: &Model<TraceGpu>, mesh: usize, slot: usize) -> u32 {
    let handle = model.meshes()[mesh].textures()[slot].handle;
    model.textures().resolve(handle).unwrap().id()
}

fn sampler(program: u32, name: &str, value: i32) -> GpuCall {
    GpuCall::SetUniformI32 {
        program,
        name: name.to_string(),
        value,
    }
}

/// Every created resource id has been deleted exactly once.
fn assert_all_released(calls: &[GpuCall]) {
    let mut created: Vec<u32> = calls
        .iter()
        .filter_map(|call| match call {
            GpuCall::CreateBuffer { id, .. }
            | GpuCall::CreateVertexArray { id, .. }
            | GpuCall::CreateTexture { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    let mut deleted: Vec<u32> = calls
        .iter()
        .filter_map(|call| match call {
            GpuCall::DeleteBuffer(id)
            | GpuCall::DeleteVertexArray(id)
            | GpuCall::DeleteTexture(id) => Some(*id),
            _ => None,
        })
        .collect();
    created.sort_unstable();
    deleted.sort_unstable();
    assert_eq!(created, deleted);
}

#[test]
fn draw_binds_units_and_names_samplers_per_kind() {
    init_logger();
    let (fx, loader) = textured_fixture("draw-samplers");
    let mut gpu = TraceGpu::new();
    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();
    let shader = gpu.create_program();
    let program = shader.program().id();
    let textured = &model.meshes()[0];
    gpu.clear();

    textured.draw(&mut gpu, &shader, model.textures()).unwrap();

    assert_eq!(
        gpu.calls(),
        vec![
            GpuCall::ActiveTexture(0),
            GpuCall::BindTexture(texture_id(&model, 0, 0)),
            sampler(program, "diffuse_1", 0),
            GpuCall::ActiveTexture(1),
            GpuCall::BindTexture(texture_id(&model, 0, 1)),
            sampler(program, "diffuse_2", 1),
            GpuCall::ActiveTexture(2),
            GpuCall::BindTexture(texture_id(&model, 0, 2)),
            sampler(program, "specular_1", 2),
            GpuCall::ActiveTexture(0),
            GpuCall::BindVertexArray(textured.vertex_array().id()),
            GpuCall::DrawElements(3),
        ]
    );
}

#[test]
fn untextured_mesh_only_binds_and_draws() {
    init_logger();
    let mut gpu = TraceGpu::new();
    let mesh = Mesh::new(
        &mut gpu,
        "bare",
        vec![Vertex::default(); 3],
        vec![0, 1, 2],
        Vec::new(),
    )
    .unwrap();
    let cache = TextureCache::new();
    let shader = gpu.create_program();
    gpu.clear();

    mesh.draw(&mut gpu, &shader, &cache).unwrap();

    assert_eq!(
        gpu.calls(),
        vec![
            GpuCall::ActiveTexture(0),
            GpuCall::BindVertexArray(mesh.vertex_array().id()),
            GpuCall::DrawElements(3),
        ]
    );
}

#[test]
fn model_draws_meshes_in_load_order() {
    init_logger();
    let (fx, loader) = textured_fixture("draw-order");
    let mut gpu = TraceGpu::new();
    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();
    let shader = gpu.create_program();
    gpu.clear();

    model.draw(&mut gpu, &shader).unwrap();

    let bound: Vec<u32> = gpu
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GpuCall::BindVertexArray(id) => Some(id),
            _ => None,
        })
        .collect();
    let expected: Vec<u32> = model.meshes().iter().map(|m| m.vertex_array().id()).collect();
    assert_eq!(bound, expected);
    assert_eq!(
        gpu.count(|call| matches!(call, GpuCall::DrawElements(3))),
        2
    );
}

#[test]
fn shared_texture_records_point_at_one_upload() {
    init_logger();
    let (fx, loader) = textured_fixture("draw-shared");
    let mut gpu = TraceGpu::new();

    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();

    assert_eq!(model.textures().len(), 3);
    assert_eq!(
        gpu.count(|call| matches!(call, GpuCall::CreateTexture { .. })),
        3
    );
    assert_eq!(texture_id(&model, 0, 0), texture_id(&model, 1, 0));
}

#[test]
fn one_image_under_two_kinds_is_uploaded_once() {
    init_logger();
    let fx = Fixture::new("draw-two-kinds");
    fx.write_png("a.png", 1, 1, [255, 0, 0, 255]);
    let scene = Scene {
        nodes: vec![node("root", &[0], &[])],
        root: Some(0),
        meshes: vec![triangle("both", Some(0))],
        materials: vec![material(
            "both",
            vec![(TextureKind::Diffuse, "a.png"), (TextureKind::Specular, "a.png")],
        )],
    };
    let loader = ModelLoader::default().with_importer(StubImporter { scene });
    let mut gpu = TraceGpu::new();
    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();

    assert_eq!(
        gpu.count(|call| matches!(call, GpuCall::CreateTexture { .. })),
        1
    );
    let mesh = &model.meshes()[0];
    let records: Vec<_> = mesh.textures().iter().map(|t| (t.kind, t.handle)).collect();
    let handle = mesh.textures()[0].handle;
    assert_eq!(
        records,
        vec![(TextureKind::Diffuse, handle), (TextureKind::Specular, handle)]
    );

    let shader = gpu.create_program();
    let program = shader.program().id();
    let id = texture_id(&model, 0, 0);
    gpu.clear();
    mesh.draw(&mut gpu, &shader, model.textures()).unwrap();

    assert_eq!(
        gpu.calls(),
        vec![
            GpuCall::ActiveTexture(0),
            GpuCall::BindTexture(id),
            sampler(program, "diffuse_1", 0),
            GpuCall::ActiveTexture(1),
            GpuCall::BindTexture(id),
            sampler(program, "specular_1", 1),
            GpuCall::ActiveTexture(0),
            GpuCall::BindVertexArray(mesh.vertex_array().id()),
            GpuCall::DrawElements(3),
        ]
    );
}

#[test]
fn vertex_array_references_the_mesh_buffers() {
    init_logger();
    let mut gpu = TraceGpu::new();
    let mesh = Mesh::new(
        &mut gpu,
        "bare",
        vec![Vertex::default(); 3],
        vec![0, 1, 2],
        Vec::new(),
    )
    .unwrap();

    assert_ne!(mesh.vertex_buffer().id(), mesh.index_buffer().id());
    assert!(gpu.calls().contains(&GpuCall::CreateVertexArray {
        id: mesh.vertex_array().id(),
        vertex_buffer: mesh.vertex_buffer().id(),
        index_buffer: mesh.index_buffer().id(),
        layout: Vertex::LAYOUT,
    }));
}

#[test]
fn too_many_textures_fail_the_load_and_release_everything() {
    init_logger();
    let (fx, loader) = textured_fixture("draw-units");
    let mut gpu = TraceGpu::new().with_texture_units(2);

    let err = loader.load(&mut gpu, fx.path("scene.stub")).err().unwrap();

    assert!(matches!(
        err,
        LoadError::Gpu(GpuError::TextureUnitsExceeded {
            requested: 3,
            available: 2,
            ..
        })
    ));
    assert_all_released(&gpu.calls());
}

#[test]
fn drawing_against_a_foreign_cache_is_rejected() {
    init_logger();
    let (fx, loader) = textured_fixture("draw-dangling");
    let mut gpu = TraceGpu::new();
    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();
    let shader = gpu.create_program();
    let empty = TextureCache::new();

    let err = model.meshes()[0].draw(&mut gpu, &shader, &empty).unwrap_err();

    assert!(matches!(err, GpuError::DanglingTexture { index: 0, .. }));
}

#[test]
fn meshes_are_released_before_textures() {
    init_logger();
    let (fx, loader) = textured_fixture("drop-order");
    let mut gpu = TraceGpu::new();
    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();
    gpu.clear();

    drop(model);

    let calls = gpu.calls();
    assert_eq!(calls.len(), 3 * 2 + 3);
    let first_texture = calls
        .iter()
        .position(|call| matches!(call, GpuCall::DeleteTexture(_)))
        .unwrap();
    assert_eq!(first_texture, 6);
    assert!(calls[..6].iter().all(|call| matches!(
        call,
        GpuCall::DeleteVertexArray(_) | GpuCall::DeleteBuffer(_)
    )));
    // each vertex array goes before its buffers
    assert!(matches!(calls[0], GpuCall::DeleteVertexArray(_)));
    assert!(matches!(calls[3], GpuCall::DeleteVertexArray(_)));
}

#[test]
fn allocation_failure_at_any_point_releases_everything() {
    init_logger();
    let (fx, loader) = textured_fixture("abort");
    // 3 texture uploads plus a vertex buffer, index buffer and vertex array per mesh
    let total = 3 + 2 * 3;

    for limit in 0..total {
        let mut gpu = TraceGpu::new().with_allocation_limit(limit);
        let err = loader.load(&mut gpu, fx.path("scene.stub")).err().unwrap();
        assert!(
            matches!(err, LoadError::Gpu(GpuError::OutOfMemory(_))),
            "limit {limit}: {err}"
        );
        assert_all_released(&gpu.calls());
    }

    let mut gpu = TraceGpu::new().with_allocation_limit(total);
    let model = loader.load(&mut gpu, fx.path("scene.stub")).unwrap();
    drop(model);
    assert_all_released(&gpu.calls());
}
