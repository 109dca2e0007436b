//! Load an asset and report what would reach the GPU.
//!
//! ```text
//! flow-mesh-inspect <asset> [--config options.toml] [--render out.png] [--size WxH]
//! ```
//!
//! Without `--render` the asset is loaded against a recording device, so no
//! graphics adapter is needed.

use std::path::PathBuf;

use anyhow::{Context as _, anyhow, bail};
use flow_mesh::{
    Gpu, LoadOptions, Model, ModelLoader, TraceGpu, WgpuContext,
    context::OFFSCREEN_FORMAT,
    gpu::trace::GpuCall,
};

struct Args {
    asset: PathBuf,
    config: Option<PathBuf>,
    render: Option<PathBuf>,
    size: (u32, u32),
}

const USAGE: &str =
    "usage: flow-mesh-inspect <asset> [--config options.toml] [--render out.png] [--size WxH]";

fn parse_args() -> anyhow::Result<Args> {
    let mut asset = None;
    let mut config = None;
    let mut render = None;
    let mut size = (512, 512);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next().context(USAGE)?.into()),
            "--render" => render = Some(args.next().context(USAGE)?.into()),
            "--size" => {
                let value = args.next().context(USAGE)?;
                let (w, h) = value
                    .split_once('x')
                    .ok_or_else(|| anyhow!("size must look like 640x480, got {value}"))?;
                size = (w.parse()?, h.parse()?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ if asset.is_none() => asset = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}\n{USAGE}"),
        }
    }

    Ok(Args {
        asset: asset.context(USAGE)?,
        config,
        render,
        size,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args()?;

    let options = match &args.config {
        Some(path) => LoadOptions::from_toml_file(path)?,
        None => LoadOptions::default(),
    };
    let loader = ModelLoader::new(options);

    let mut gpu = TraceGpu::new();
    let model = loader
        .load(&mut gpu, &args.asset)
        .with_context(|| format!("failed to load {}", args.asset.display()))?;
    report(&mut gpu, &model)?;

    if let Some(out) = &args.render {
        let (width, height) = args.size;
        let mut ctx = WgpuContext::headless()?;
        let model = loader.load(&mut ctx, &args.asset)?;
        let shader = ctx.create_model_program(OFFSCREEN_FORMAT)?;
        shader.use_program(&mut ctx);
        model.draw(&mut ctx, &shader)?;
        let img = ctx.render_offscreen(width, height, wgpu::Color::BLACK)?;
        img.save(out)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("rendered {width}x{height} to {}", out.display());
    }
    Ok(())
}

fn report(gpu: &mut TraceGpu, model: &Model<TraceGpu>) -> anyhow::Result<()> {
    let uploads = gpu.count(|call| matches!(call, GpuCall::CreateTexture { .. }));
    println!(
        "{} meshes, {} triangles, {} textures ({uploads} uploads), max {} texture units",
        model.meshes().len(),
        model.triangle_count(),
        model.textures().len(),
        gpu.max_texture_units(),
    );
    for path in model.textures().paths() {
        println!("  texture {}", path.display());
    }

    // Dry-run a draw to list the sampler uniforms each mesh sets.
    let shader = gpu.create_program();
    shader.use_program(gpu);
    for mesh in model.meshes() {
        gpu.clear();
        mesh.draw(gpu, &shader, model.textures())?;
        let samplers: Vec<String> = gpu
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                GpuCall::SetUniformI32 { name, value, .. } => Some(format!("{name}={value}")),
                _ => None,
            })
            .collect();
        println!(
            "  mesh {}: {} vertices, {} triangles, samplers [{}]",
            mesh.name(),
            mesh.vertices().len(),
            mesh.triangle_count(),
            samplers.join(", ")
        );
    }
    Ok(())
}
