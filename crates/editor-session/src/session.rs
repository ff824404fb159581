//! The editing session.

use std::path::PathBuf;
use std::sync::Arc;

use memeforge_common::clock::{Clock, SystemClock};
use memeforge_common::config::AppConfig;
use memeforge_document_model::{Color, ImageHandle, LayerError, LayerSlot, MemeDocument};
use memeforge_render_engine::{
    Compositor, DecodeError, DisplayBounds, ExportController, ExportError, ExportSettings,
    ExportSink, ExportedImage, FontError, ImageSource, PreviewController, PreviewUpdate,
};

use crate::diagnostics::{Diagnostic, DiagnosticCallback, DiagnosticSource, Severity};
use crate::selection::{DecodeCompletion, ImageSelection, PendingDecode, SelectionToken};

/// What happened to a finished decode.
#[derive(Debug)]
pub enum SelectionOutcome {
    /// The image became the document's image.
    Applied {
        token: SelectionToken,
        width: u32,
        height: u32,
    },
    /// A newer selection exists; the result was dropped.
    Superseded { token: SelectionToken },
    /// The latest selection could not be decoded; the document has no image.
    Failed {
        token: SelectionToken,
        error: DecodeError,
    },
}

impl SelectionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SelectionOutcome::Applied { .. })
    }
}

/// Where an export went and how large it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedExport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Owns the meme document and drives preview and export from it.
///
/// Not shared across threads: the host calls into it from its single
/// event-processing thread and runs [`PendingDecode`]s on its runtime.
pub struct EditorSession {
    document: MemeDocument,
    selection: ImageSelection,
    preview: PreviewController,
    export: ExportController,
    compositor: Arc<Compositor>,
    output_dir: PathBuf,
    overflowing: [bool; 2],
    on_diagnostic: Option<DiagnosticCallback>,
}

impl EditorSession {
    pub fn new(compositor: Arc<Compositor>, config: &AppConfig) -> Self {
        Self::with_clock(compositor, config, Arc::new(SystemClock))
    }

    /// A session whose exports are named from `clock`.
    pub fn with_clock(
        compositor: Arc<Compositor>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let preview =
            PreviewController::new(compositor.clone(), DisplayBounds::from(&config.preview));
        let export = ExportController::with_clock(
            compositor.clone(),
            ExportSettings::from(&config.export),
            clock,
        );
        Self {
            document: MemeDocument::new(),
            selection: ImageSelection::new(),
            preview,
            export,
            compositor,
            output_dir: config.export.output_dir.clone(),
            overflowing: [false; 2],
            on_diagnostic: None,
        }
    }

    /// Build a session with the compositor described by `config.font`.
    pub fn from_config(config: &AppConfig) -> Result<Self, FontError> {
        let compositor = Compositor::from_config(&config.font)?;
        tracing::info!(face = compositor.face_name(), "Editor session created");
        Ok(Self::new(Arc::new(compositor), config))
    }

    /// Register the host's diagnostic callback, replacing any previous one.
    pub fn on_diagnostic(&mut self, callback: impl Fn(&Diagnostic) + Send + 'static) {
        self.on_diagnostic = Some(Box::new(callback));
    }

    pub fn document(&self) -> &MemeDocument {
        &self.document
    }

    pub fn preview(&self) -> &PreviewController {
        &self.preview
    }

    pub fn export_controller(&self) -> &ExportController {
        &self.export
    }

    /// Directory exports are saved into by default.
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Whether the latest image selection is still decoding.
    pub fn is_loading(&self) -> bool {
        self.selection.is_loading()
    }

    // ========================================================================
    // Image selection
    // ========================================================================

    /// Start a new selection. Any decode still in flight is superseded.
    pub fn select_image(&mut self, source: ImageSource) -> PendingDecode {
        let token = self.selection.begin();
        tracing::debug!(token = %token, source = %source.describe(), "Image selected");
        PendingDecode { token, source }
    }

    /// Apply a finished decode if it belongs to the latest selection.
    pub fn complete_decode(&mut self, completion: DecodeCompletion) -> SelectionOutcome {
        let DecodeCompletion { token, result } = completion;
        if !self.selection.settle(token) {
            tracing::debug!(
                token = %token,
                current = ?self.selection.current(),
                "Dropping superseded decode"
            );
            return SelectionOutcome::Superseded { token };
        }

        match result {
            Ok(image) => {
                let (width, height) = image.dimensions();
                self.set_image(Some(image));
                tracing::info!(token = %token, width, height, "Image loaded");
                SelectionOutcome::Applied {
                    token,
                    width,
                    height,
                }
            }
            Err(error) => {
                self.set_image(None);
                tracing::warn!(token = %token, error = %error, "Image decode failed");
                self.emit(
                    Severity::Error,
                    DiagnosticSource::Decode,
                    format!("Could not load image: {error}"),
                );
                SelectionOutcome::Failed { token, error }
            }
        }
    }

    /// Select, decode, and apply `source` in one step.
    pub async fn load_image(&mut self, source: ImageSource) -> SelectionOutcome {
        let pending = self.select_image(source);
        let completion = pending.run().await;
        self.complete_decode(completion)
    }

    /// Take a generated meme: start selecting its image and replace the
    /// captions that were actually provided.
    pub fn apply_generated(
        &mut self,
        source: ImageSource,
        top: Option<&str>,
        bottom: Option<&str>,
    ) -> PendingDecode {
        let pending = self.select_image(source);
        for (slot, text) in [(LayerSlot::Top, top), (LayerSlot::Bottom, bottom)] {
            if let Some(text) = text.filter(|text| !text.is_empty()) {
                self.set_content(slot, text);
            }
        }
        pending
    }

    fn set_image(&mut self, image: Option<ImageHandle>) {
        self.document.replace_image(image);
        self.overflowing = [false; 2];
        self.preview.invalidate();
    }

    // ========================================================================
    // Caption setters
    // ========================================================================

    pub fn set_content(&mut self, slot: LayerSlot, content: impl Into<String>) {
        self.document.layer_mut(slot).set_content(content);
        self.preview.invalidate();
    }

    pub fn set_font_size(&mut self, slot: LayerSlot, font_size: f32) -> Result<(), LayerError> {
        let result = self.document.layer_mut(slot).set_font_size(font_size);
        self.after_edit(slot, result)
    }

    pub fn set_color(&mut self, slot: LayerSlot, color: Color) {
        self.document.layer_mut(slot).set_color(color);
        self.preview.invalidate();
    }

    pub fn set_stroke_color(&mut self, slot: LayerSlot, color: Color) {
        self.document.layer_mut(slot).set_stroke_color(color);
        self.preview.invalidate();
    }

    pub fn set_stroke_width(&mut self, slot: LayerSlot, stroke_width: f32) -> Result<(), LayerError> {
        let result = self.document.layer_mut(slot).set_stroke_width(stroke_width);
        self.after_edit(slot, result)
    }

    /// Set the baseline position; values outside 0–100 are clamped.
    pub fn set_vertical_position(&mut self, slot: LayerSlot, position: f32) -> Result<(), LayerError> {
        let result = self.document.layer_mut(slot).set_vertical_position(position);
        self.after_edit(slot, result)
    }

    fn after_edit(
        &mut self,
        slot: LayerSlot,
        result: Result<(), LayerError>,
    ) -> Result<(), LayerError> {
        match &result {
            Ok(()) => self.preview.invalidate(),
            Err(err) => {
                tracing::warn!(slot = %slot, error = %err, "Rejected caption edit");
                self.emit(
                    Severity::Warning,
                    DiagnosticSource::Caption,
                    format!("{slot} caption: {err}"),
                );
            }
        }
        result
    }

    // ========================================================================
    // Preview and export
    // ========================================================================

    /// Bring the preview up to date. Call once per event-loop turn; all
    /// edits since the previous call produce at most one render.
    pub fn refresh_preview(&mut self) -> PreviewUpdate {
        let update = self.preview.refresh(&self.document);
        match &update {
            PreviewUpdate::Failed(err) => self.emit(
                Severity::Error,
                DiagnosticSource::Preview,
                format!("Preview unavailable: {err}"),
            ),
            PreviewUpdate::Rendered => self.check_overflow(),
            PreviewUpdate::Unchanged | PreviewUpdate::Cleared => {}
        }
        update
    }

    /// Warn once each time a caption starts running past the image edges.
    fn check_overflow(&mut self) {
        let Some(image) = &self.document.image else {
            return;
        };
        let size = image.dimensions();
        for (index, slot) in LayerSlot::ALL.into_iter().enumerate() {
            let overflows = self
                .compositor
                .layout(size, image, self.document.layer(slot))
                .ok()
                .flatten()
                .is_some_and(|layout| layout.overflows);
            let newly = overflows && !self.overflowing[index];
            self.overflowing[index] = overflows;
            if newly {
                tracing::warn!(slot = %slot, "Caption wider than image");
                self.emit(
                    Severity::Warning,
                    DiagnosticSource::Preview,
                    format!("{slot} caption is wider than the image and will be clipped"),
                );
            }
        }
    }

    /// Render and encode the document at the configured export scale.
    pub fn export(&self) -> Result<ExportedImage, ExportError> {
        self.export.export(&self.document)
    }

    /// Export at an explicit scale factor.
    pub fn export_scaled(&self, scale: u32) -> Result<ExportedImage, ExportError> {
        self.export.export_scaled(&self.document, scale)
    }

    /// Export and hand the result to `sink`. `scale` overrides the
    /// configured export scale.
    pub fn export_to(
        &self,
        sink: &mut dyn ExportSink,
        scale: Option<u32>,
    ) -> Result<SavedExport, ExportError> {
        let scale = scale.unwrap_or(self.export.settings().scale);
        let exported = self.export_scaled(scale).map_err(|err| {
            tracing::error!(error = %err, scale, "Export failed");
            err
        })?;
        let path = sink.save(&exported)?;
        tracing::info!(sink = sink.name(), path = %path.display(), "Export saved");
        Ok(SavedExport {
            path,
            width: exported.width,
            height: exported.height,
        })
    }

    fn emit(&self, severity: Severity, source: DiagnosticSource, message: String) {
        if let Some(callback) = &self.on_diagnostic {
            callback(&Diagnostic::new(severity, source, message));
        }
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("preview", &self.preview.status())
            .field("face", &self.compositor.face_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use memeforge_common::clock::FixedClock;
    use memeforge_render_engine::{
        encode_png, DirectorySink, PreviewStatus, RenderError, Surface,
    };

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let surface = Surface::new(width, height).unwrap();
        encode_png(&surface).unwrap()
    }

    fn session() -> EditorSession {
        EditorSession::with_clock(
            Arc::new(Compositor::with_builtin_face()),
            &AppConfig::default(),
            Arc::new(FixedClock::from_millis(1_700_000_000_000)),
        )
    }

    fn collect(session: &mut EditorSession) -> Arc<Mutex<Vec<Diagnostic>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.on_diagnostic(move |d| sink.lock().unwrap().push(d.clone()));
        seen
    }

    #[tokio::test]
    async fn test_second_selection_wins_when_first_finishes_last() {
        let mut session = session();
        let first = session.select_image(ImageSource::Bytes(png_bytes(10, 10)));
        let second = session.select_image(ImageSource::Bytes(png_bytes(20, 12)));

        let second_done = second.run().await;
        let first_done = first.run().await;

        assert!(session.complete_decode(second_done).is_applied());
        assert!(matches!(
            session.complete_decode(first_done),
            SelectionOutcome::Superseded { .. }
        ));
        assert_eq!(session.document().image.as_ref().unwrap().dimensions(), (20, 12));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_second_selection_wins_when_first_finishes_first() {
        let mut session = session();
        let first = session.select_image(ImageSource::Bytes(png_bytes(10, 10)));
        let second = session.select_image(ImageSource::Bytes(png_bytes(20, 12)));

        let first_done = first.run().await;
        assert!(matches!(
            session.complete_decode(first_done),
            SelectionOutcome::Superseded { .. }
        ));
        assert!(session.document().image.is_none());
        assert!(session.is_loading());

        let second_done = second.run().await;
        assert!(session.complete_decode(second_done).is_applied());
        assert_eq!(session.document().image.as_ref().unwrap().dimensions(), (20, 12));
    }

    #[tokio::test]
    async fn test_failed_decode_clears_preview() {
        let mut session = session();
        let seen = collect(&mut session);

        session
            .load_image(ImageSource::Bytes(png_bytes(8, 8)))
            .await;
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Rendered));

        let outcome = session
            .load_image(ImageSource::Bytes(b"garbage".to_vec()))
            .await;
        assert!(matches!(outcome, SelectionOutcome::Failed { .. }));
        assert!(session.document().image.is_none());
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Cleared));
        assert_eq!(session.preview().status(), &PreviewStatus::Empty);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].severity, Severity::Error);
        assert_eq!(seen[0].source, DiagnosticSource::Decode);
    }

    #[test]
    fn test_export_without_image() {
        let session = session();
        assert!(matches!(session.export(), Err(ExportError::NoImage)));
    }

    #[tokio::test]
    async fn test_export_doubles_dimensions() {
        let mut session = session();
        session
            .load_image(ImageSource::Bytes(png_bytes(30, 20)))
            .await;
        session.set_content(LayerSlot::Top, "HI");

        let exported = session.export().unwrap();
        assert_eq!((exported.width, exported.height), (60, 40));
        assert_eq!(exported.file_name, "meme-1700000000000.png");
    }

    #[tokio::test]
    async fn test_edits_coalesce_into_one_render() {
        let mut session = session();
        session
            .load_image(ImageSource::Bytes(png_bytes(64, 64)))
            .await;
        session.set_content(LayerSlot::Top, "A");
        session.set_content(LayerSlot::Top, "AB");
        session.set_font_size(LayerSlot::Top, 12.0).unwrap();

        assert!(matches!(session.refresh_preview(), PreviewUpdate::Rendered));
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Unchanged));
        assert_eq!(session.preview().render_count(), 1);
    }

    #[tokio::test]
    async fn test_no_op_edit_rerenders_identically() {
        let mut session = session();
        session
            .load_image(ImageSource::Bytes(png_bytes(64, 64)))
            .await;
        session.set_content(LayerSlot::Bottom, "SAME");
        session.refresh_preview();
        let before = session.preview().surface().unwrap().pixels().clone();

        let size = session.document().bottom.font_size;
        session.set_font_size(LayerSlot::Bottom, size).unwrap();
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Rendered));
        assert_eq!(session.preview().surface().unwrap().pixels(), &before);
    }

    #[test]
    fn test_rejected_edit_reports_warning() {
        let mut session = session();
        let seen = collect(&mut session);

        let err = session.set_font_size(LayerSlot::Top, -4.0).unwrap_err();
        assert_eq!(err, LayerError::InvalidFontSize(-4.0));
        assert_eq!(session.document().top.font_size, 48.0);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].severity, Severity::Warning);
        assert_eq!(seen[0].source, DiagnosticSource::Caption);
    }

    #[tokio::test]
    async fn test_overflow_warns_once() {
        let mut session = session();
        let seen = collect(&mut session);
        session
            .load_image(ImageSource::Bytes(png_bytes(40, 40)))
            .await;
        session.set_content(LayerSlot::Top, "WAY TOO LONG FOR THIS");
        session.refresh_preview();
        session.set_color(LayerSlot::Top, Color::BLACK);
        session.refresh_preview();

        let warnings = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_apply_generated_skips_missing_captions() {
        let mut session = session();
        session.set_content(LayerSlot::Bottom, "keep me");

        let pending = session.apply_generated(
            ImageSource::Bytes(png_bytes(4, 4)),
            Some("GENERATED"),
            Some(""),
        );
        assert_eq!(session.selection.current(), Some(pending.token));
        assert_eq!(session.document().top.content, "GENERATED");
        assert_eq!(session.document().bottom.content, "keep me");
    }

    #[tokio::test]
    async fn test_export_to_directory_sink() {
        let dir = std::env::temp_dir().join("memeforge_test_session_export");
        let _ = std::fs::remove_dir_all(&dir);

        let mut session = session();
        session
            .load_image(ImageSource::Bytes(png_bytes(12, 10)))
            .await;
        session.set_content(LayerSlot::Bottom, "SAVED");

        let mut sink = DirectorySink::new(&dir);
        let saved = session.export_to(&mut sink, None).unwrap();
        assert_eq!(saved.path, dir.join("meme-1700000000000.png"));
        assert_eq!((saved.width, saved.height), (24, 20));

        let saved = session.export_to(&mut sink, Some(3)).unwrap();
        assert_eq!((saved.width, saved.height), (36, 30));
        let written = image::load_from_memory(&std::fs::read(&saved.path).unwrap()).unwrap();
        assert_eq!((written.width(), written.height()), (36, 30));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_failed_export_only_reaches_caller() {
        let mut config = AppConfig::default();
        config.export.max_dimension = 50;
        let mut session = EditorSession::new(Arc::new(Compositor::with_builtin_face()), &config);
        let seen = collect(&mut session);

        session
            .load_image(ImageSource::Bytes(png_bytes(40, 40)))
            .await;
        session.set_content(LayerSlot::Top, "OK");
        session.set_font_size(LayerSlot::Top, 8.0).unwrap();
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Rendered));
        let document = session.document().clone();
        let preview = session.preview().surface().unwrap().pixels().clone();

        let dir = std::env::temp_dir().join("memeforge_test_session_export_fail");
        let _ = std::fs::remove_dir_all(&dir);
        let mut sink = DirectorySink::new(&dir);
        let err = session.export_to(&mut sink, None).unwrap_err();
        assert!(matches!(
            err,
            ExportError::SurfaceTooLarge { width: 80, height: 80, max: 50 }
        ));
        assert!(!dir.exists());

        assert_eq!(session.document(), &document);
        assert_eq!(session.preview().status(), &PreviewStatus::Ready);
        assert_eq!(session.preview().render_count(), 1);
        assert_eq!(session.preview().surface().unwrap().pixels(), &preview);
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Unchanged));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_huge_font_fails_preview_and_export_without_aborting() {
        let mut session = session();
        let seen = collect(&mut session);
        session
            .load_image(ImageSource::Bytes(png_bytes(80, 80)))
            .await;
        session.set_content(LayerSlot::Top, "HELLO");
        session.set_font_size(LayerSlot::Top, 1.0e12).unwrap();

        assert!(matches!(
            session.refresh_preview(),
            PreviewUpdate::Failed(RenderError::CaptionTooLarge { .. })
        ));
        assert!(matches!(
            session.preview().status(),
            PreviewStatus::Unavailable { .. }
        ));
        assert!(matches!(
            session.export(),
            Err(ExportError::Render(RenderError::CaptionTooLarge { .. }))
        ));

        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].severity, Severity::Error);
            assert_eq!(seen[0].source, DiagnosticSource::Preview);
        }

        // A sane size brings the preview back.
        session.set_font_size(LayerSlot::Top, 24.0).unwrap();
        assert!(matches!(session.refresh_preview(), PreviewUpdate::Rendered));
        assert!(session.export().is_ok());
    }
}
