//! Show image and layout information.

use std::path::PathBuf;

use memeforge_common::config::AppConfig;
use memeforge_common::error::MemeResult;
use memeforge_document_model::{LayerSlot, TextLayer};
use memeforge_render_engine::{
    decode, Compositor, DisplayBounds, ExportController, ExportSettings, ImageSource,
};

pub async fn run(config: AppConfig, image: PathBuf, caption: String) -> MemeResult<()> {
    let handle = decode(ImageSource::File(image.clone())).await?;
    let compositor = Compositor::from_config(&config.font)?;
    let (width, height) = handle.dimensions();

    println!("Image: {}", image.display());
    println!("  Size: {width}x{height}");
    println!();

    let (shown_w, shown_h) = DisplayBounds::from(&config.preview).fit(width, height);
    println!("Preview:");
    println!("  Surface: {width}x{height}");
    println!("  Display: {shown_w}x{shown_h}");
    println!();

    let export = ExportController::new(
        std::sync::Arc::new(compositor.clone()),
        ExportSettings::from(&config.export),
    );
    let (export_w, export_h) = export.export_size(&handle, config.export.scale)?;
    println!("Export:");
    println!("  Scale: {}", config.export.scale);
    println!("  Size: {export_w}x{export_h}");
    println!("  Directory: {}", config.export.output_dir.display());
    println!();

    println!("Caption layout ({:?}, face {}):", caption, compositor.face_name());
    for slot in LayerSlot::ALL {
        let layer = match slot {
            LayerSlot::Top => TextLayer::top(),
            LayerSlot::Bottom => TextLayer::bottom(),
        }
        .with_content(caption.as_str());

        match compositor.layout((width, height), &handle, &layer)? {
            Some(layout) => println!(
                "  {slot}: centre {:.1}, baseline {:.1}, {:.1}px, outline {}px, width {:.0}{}",
                layout.center_x,
                layout.baseline_y,
                layout.font_px,
                layout.stroke_radius,
                layout.advance,
                if layout.overflows { " (overflows)" } else { "" }
            ),
            None => println!("  {slot}: nothing to draw"),
        }
    }

    Ok(())
}
