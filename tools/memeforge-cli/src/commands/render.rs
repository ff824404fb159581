//! Caption an image and export it.

use std::path::PathBuf;

use memeforge_common::config::AppConfig;
use memeforge_common::error::{MemeError, MemeResult};
use memeforge_document_model::{Color, LayerSlot};
use memeforge_editor_session::{EditorSession, SelectionOutcome};
use memeforge_render_engine::{DirectorySink, ImageSource, PreviewUpdate};

pub struct RenderArgs {
    pub image: PathBuf,
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub top_y: Option<f32>,
    pub bottom_y: Option<f32>,
    pub scale: Option<u32>,
    pub output: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

pub async fn run(mut config: AppConfig, args: RenderArgs) -> MemeResult<()> {
    if args.font.is_some() {
        config.font.path = args.font.clone();
    }
    let mut session = EditorSession::from_config(&config)?;
    session.on_diagnostic(|d| eprintln!("{d}"));

    println!("Loading image: {}", args.image.display());
    match session.load_image(ImageSource::File(args.image.clone())).await {
        SelectionOutcome::Applied { width, height, .. } => {
            println!("  Size: {width}x{height}");
        }
        SelectionOutcome::Failed { error, .. } => return Err(error.into()),
        SelectionOutcome::Superseded { token } => {
            return Err(MemeError::decode(format!(
                "image selection {token} was superseded"
            )));
        }
    }

    let fill = parse_color(args.color.as_deref())?;
    let outline = parse_color(args.stroke.as_deref())?;

    for slot in LayerSlot::ALL {
        let text = match slot {
            LayerSlot::Top => &args.top,
            LayerSlot::Bottom => &args.bottom,
        };
        if let Some(text) = text {
            session.set_content(slot, text.as_str());
        }
        if let Some(size) = args.font_size {
            session.set_font_size(slot, size).map_err(caption_error)?;
        }
        if let Some(color) = fill {
            session.set_color(slot, color);
        }
        if let Some(color) = outline {
            session.set_stroke_color(slot, color);
        }
        if let Some(width) = args.stroke_width {
            session.set_stroke_width(slot, width).map_err(caption_error)?;
        }
    }
    if let Some(position) = args.top_y {
        session
            .set_vertical_position(LayerSlot::Top, position)
            .map_err(caption_error)?;
    }
    if let Some(position) = args.bottom_y {
        session
            .set_vertical_position(LayerSlot::Bottom, position)
            .map_err(caption_error)?;
    }

    // Lays out the captions once so overflow is reported before exporting.
    if let PreviewUpdate::Failed(err) = session.refresh_preview() {
        return Err(err.into());
    }

    let dir = args
        .output
        .unwrap_or_else(|| session.output_dir().to_path_buf());
    let mut sink = DirectorySink::new(dir);
    let saved = session.export_to(&mut sink, args.scale)?;
    println!("  Export: {}x{}", saved.width, saved.height);
    println!("Saved: {}", saved.path.display());

    Ok(())
}

fn parse_color(raw: Option<&str>) -> MemeResult<Option<Color>> {
    raw.map(|raw| raw.parse::<Color>().map_err(caption_error))
        .transpose()
}

fn caption_error(err: impl std::fmt::Display) -> MemeError {
    MemeError::caption(err.to_string())
}
