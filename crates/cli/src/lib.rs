use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marginalia_core::annotation::Annotation;
use marginalia_core::renderer::{rasterize, scene_for_page};
use marginalia_pdf::{
    collate_pages, export_with_annotations, merge_documents, move_page, page_sizes, rotate_page,
    split_pages,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "marginalia")]
#[command(about = "Marginalia PDF annotation and page tools")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Bake a JSON annotation sidecar into the PDF.
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON file holding the annotations to flatten
        #[arg(long)]
        annotations: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Render one page's annotations to a transparent PNG overlay.
    Preview {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON file holding the annotations to render
        #[arg(long)]
        annotations: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Set a page's rotation (multiples of 90 degrees).
    Rotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        page: u32,
        #[arg(long)]
        degrees: i64,
        #[arg(long)]
        output: PathBuf,
    },
    /// Move a page to a new position.
    MovePage {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
        #[arg(long)]
        output: PathBuf,
    },
    /// Extract an inclusive page range into a new PDF.
    Collate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
        #[arg(long)]
        output: PathBuf,
    },
    /// Split a page range into single-page PDFs.
    Split {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        from: Option<u32>,
        #[arg(long)]
        to: Option<u32>,
        /// Directory for the output files (defaults to the input's)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Concatenate PDFs in order.
    Merge {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    page_sizes_pt: Vec<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Export { file, annotations, output } => run_export(&file, &annotations, &output),
        Commands::Preview { file, annotations, page, scale, output } => {
            run_preview(&file, &annotations, page, scale, output.as_deref())
        }
        Commands::Rotate { file, page, degrees, output } => {
            run_rotate(&file, page, degrees, &output)
        }
        Commands::MovePage { file, from, to, output } => run_move_page(&file, from, to, &output),
        Commands::Collate { file, from, to, output } => run_collate(&file, from, to, &output),
        Commands::Split { file, from, to, output_dir } => {
            run_split(&file, from, to, output_dir.as_deref())
        }
        Commands::Merge { files, output } => run_merge(&files, &output),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    let bytes = read_pdf(file)?;
    let sizes = page_sizes(&bytes).context("failed to read PDF")?;

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: sizes.len() as u32,
        page_sizes_pt: sizes
            .iter()
            .map(|size| PageSizeOutput { width: size.width_pt, height: size.height_pt })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_export(file: &Path, annotations: &Path, output: &Path) -> Result<()> {
    let bytes = read_pdf(file)?;
    let annotations = load_annotations(annotations)?;

    let exported =
        export_with_annotations(&bytes, &annotations).context("failed to export annotations")?;
    write_output(output, &exported)
}

fn run_preview(
    file: &Path,
    annotations: &Path,
    page: u32,
    scale: f32,
    output: Option<&Path>,
) -> Result<()> {
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }
    if scale <= 0.0 {
        anyhow::bail!("--scale must be positive");
    }

    let bytes = read_pdf(file)?;
    let sizes = page_sizes(&bytes).context("failed to read PDF")?;
    let size = sizes
        .get(page as usize - 1)
        .with_context(|| format!("page {page} out of range (page_count={})", sizes.len()))?;

    let annotations = load_annotations(annotations)?;
    let on_page = annotations.iter().filter(|a| u32::from(a.page_number()) == page);
    let scene = scene_for_page(on_page, scale);

    let width = (size.width_pt * scale).round().max(1.0) as u32;
    let height = (size.height_pt * scale).round().max(1.0) as u32;
    let overlay = rasterize(&scene, width, height);

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_preview_output(file, page));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    overlay
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_rotate(file: &Path, page: u32, degrees: i64, output: &Path) -> Result<()> {
    let bytes = read_pdf(file)?;
    let rotated = rotate_page(&bytes, page, degrees).context("failed to rotate page")?;
    write_output(output, &rotated)
}

fn run_move_page(file: &Path, from: u32, to: u32, output: &Path) -> Result<()> {
    let bytes = read_pdf(file)?;
    let moved = move_page(&bytes, from, to).context("failed to move page")?;
    write_output(output, &moved)
}

fn run_collate(file: &Path, from: u32, to: u32, output: &Path) -> Result<()> {
    let bytes = read_pdf(file)?;
    let collated = collate_pages(&bytes, from, to).context("failed to collate pages")?;
    write_output(output, &collated)
}

fn run_split(
    file: &Path,
    from: Option<u32>,
    to: Option<u32>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let bytes = read_pdf(file)?;
    let parts = split_pages(&bytes, from, to).context("failed to split pages")?;

    let dir = output_dir
        .map(ToOwned::to_owned)
        .or_else(|| file.parent().map(ToOwned::to_owned))
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;

    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("split");
    for (page, part) in parts {
        let path = dir.join(format!("{stem}-page-{page}.pdf"));
        fs::write(&path, part).with_context(|| format!("failed to write {}", path.display()))?;
        println!("{}", path.display());
    }

    Ok(())
}

fn run_merge(files: &[PathBuf], output: &Path) -> Result<()> {
    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        inputs.push(read_pdf(file)?);
    }

    let merged = merge_documents(&inputs).context("failed to merge documents")?;
    write_output(output, &merged)
}

fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("invalid annotation file {}", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

fn default_preview_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("preview");
    file.with_file_name(format!("{stem}-page-{page}.png"))
}
