use anyhow::{Context, Result};
use aseprite_sheet::{
    pack_spritesheet, pack_tileset, Color, Document, LayerKind, SheetOptions, Size,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pack Aseprite animations into spritesheets
#[derive(Debug, Parser)]
#[command(name = "asesheet", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Flatten every frame and pack them into one PNG
    Sheet(SheetArgs),
    /// Write each flattened frame as its own PNG
    Frames {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        layers: LayerArgs,
    },
    /// Write one PNG per tileset
    Tilesets {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a summary of the file
    Info { input: PathBuf },
}

#[derive(Debug, Args)]
struct SheetArgs {
    input: PathBuf,
    /// PNG to write
    #[arg(short, long)]
    output: PathBuf,
    /// Frame, tag and slice metadata as JSON
    #[arg(long)]
    json: Option<PathBuf>,
    /// TOML file with packing options, flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    layers: LayerArgs,
    #[arg(long)]
    no_merge_duplicates: bool,
    #[arg(long)]
    border_padding: Option<u32>,
    #[arg(long)]
    spacing: Option<u32>,
    #[arg(long)]
    inner_padding: Option<u32>,
}

#[derive(Debug, Args)]
struct LayerArgs {
    /// Draw hidden layers too
    #[arg(long)]
    all_layers: bool,
    #[arg(long)]
    include_background: bool,
    #[arg(long)]
    no_tilemaps: bool,
}

impl LayerArgs {
    fn apply(&self, options: &mut SheetOptions) {
        if self.all_layers {
            options.layers.only_visible_layers = false;
        }
        if self.include_background {
            options.layers.include_background_layer = true;
        }
        if self.no_tilemaps {
            options.layers.include_tilemap_cels = false;
        }
    }
}

impl SheetArgs {
    fn options(&self) -> Result<SheetOptions> {
        let mut options = match &self.config {
            Some(path) => SheetOptions::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => SheetOptions::default(),
        };
        self.layers.apply(&mut options);
        if self.no_merge_duplicates {
            options.merge_duplicates = false;
        }
        if let Some(v) = self.border_padding {
            options.border_padding = v;
        }
        if let Some(v) = self.spacing {
            options.spacing = v;
        }
        if let Some(v) = self.inner_padding {
            options.inner_padding = v;
        }
        options.validate().context("Invalid packing options")?;
        Ok(options)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Sheet(args) => sheet(&args),
        Command::Frames {
            input,
            output,
            layers,
        } => frames(&input, &output, &layers),
        Command::Tilesets { input, output } => tilesets(&input, &output),
        Command::Info { input } => print_info(&input),
    }
}

fn load(path: &Path) -> Result<Document> {
    let doc = Document::read_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    for warning in doc.warnings() {
        info!("{}: {warning}", path.display());
    }
    Ok(doc)
}

fn write_png(path: &Path, size: Size, pixels: &[Color]) -> Result<()> {
    let bytes: &[u8] = bytemuck::cast_slice(pixels);
    let image = image::RgbaImage::from_raw(size.width, size.height, bytes.to_vec())
        .context("Pixel buffer does not match image size")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn sheet(args: &SheetArgs) -> Result<()> {
    let options = args.options()?;
    let doc = load(&args.input)?;
    let sheet = pack_spritesheet(&doc, &options);
    write_png(&args.output, sheet.size, &sheet.pixels)?;
    info!(
        "wrote {} ({}x{}, {} frames)",
        args.output.display(),
        sheet.size.width,
        sheet.size.height,
        sheet.frames.len()
    );

    if let Some(json) = &args.json {
        let text = serde_json::to_string_pretty(&sheet)?;
        fs::write(json, text).with_context(|| format!("Failed to write {}", json.display()))?;
    }
    Ok(())
}

fn frames(input: &Path, output: &Path, layers: &LayerArgs) -> Result<()> {
    let mut options = SheetOptions::default();
    layers.apply(&mut options);
    let doc = load(input)?;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    for index in 0..doc.frames().len() {
        let pixels = doc.flatten_frame(index, &options.layers);
        write_png(&output.join(format!("{index}.png")), doc.size(), &pixels)?;
    }
    info!("wrote {} frames to {}", doc.frames().len(), output.display());
    Ok(())
}

fn tilesets(input: &Path, output: &Path) -> Result<()> {
    let doc = load(input)?;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let options = SheetOptions {
        merge_duplicates: false,
        ..SheetOptions::default()
    };
    for tileset in doc.tilesets() {
        let sheet = pack_tileset(tileset, &options);
        if sheet.tiles.is_empty() {
            continue;
        }
        let name = format!("tileset-{}.png", tileset.id);
        write_png(&output.join(name), sheet.size, &sheet.pixels)?;
    }
    Ok(())
}

fn print_info(input: &Path) -> Result<()> {
    let doc = load(input)?;
    let header = doc.header();
    println!("{}", input.display());
    println!(
        "  size:      {}x{} ({:?})",
        header.size.width, header.size.height, header.color_depth
    );
    println!("  frames:    {}", doc.frames().len());
    println!("  palette:   {} colors", doc.palette().len());

    println!("  layers:");
    for layer in doc.layers() {
        let kind = match &layer.kind {
            LayerKind::Image => "image",
            LayerKind::Group { .. } => "group",
            LayerKind::Tilemap { .. } => "tilemap",
        };
        let indent = "  ".repeat(layer.child_level as usize);
        println!(
            "    {indent}{} [{kind}]{}",
            layer.name,
            if layer.is_visible() { "" } else { " (hidden)" }
        );
    }

    if !doc.tags().is_empty() {
        println!("  tags:");
        for tag in doc.tags() {
            println!(
                "    {} {}..={} {:?}",
                tag.name, tag.from, tag.to, tag.direction
            );
        }
    }
    for slice in doc.slices() {
        println!("  slice {} ({} keys)", slice.name, slice.keys.len());
    }
    for tileset in doc.tilesets() {
        println!(
            "  tileset {} \"{}\": {} tiles of {}x{}",
            tileset.id,
            tileset.name,
            tileset.tile_count,
            tileset.tile_size.width,
            tileset.tile_size.height
        );
    }
    println!("  warnings:  {}", doc.warnings().len());
    Ok(())
}
