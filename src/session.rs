//! Compression session: the public entry point of the engine.
//!
//! A [`CompressionSession`] owns one decoded source image at a time and runs
//! compressions against it. Its lifecycle is an explicit state machine:
//!
//! ```text
//!          load            compress                 ok
//!  Idle ─────────▶ Loaded ──────────▶ Compressing ──────▶ Completed
//!    ▲                ▲                    │                  │
//!    │                │                    │ error            │ compress
//!    │                │                    ▼                  ▼
//!    │                │                  Failed ─────────▶ Compressing
//!    │                └── load (replaces the asset)
//!    └── reset (from any state; drops the asset)
//! ```
//!
//! Requests are validated before the state changes, so a bad parameter never
//! moves the session to `Failed`. `Failed` means an encode was attempted and
//! the backend reported an error; no partial result is kept.
//!
//! ## Mode dispatch
//!
//! | Mode | [`plan_dimensions`] constraint | Encoder |
//! |---|---|---|
//! | `Quality` | `Original` | once, caller's quality |
//! | `Dimensions` | `Bounded` | once, `defaults.dimensions_quality` |
//! | `TargetSize` | `Original` | [`find_quality_for_target_size`] |
//! | `FormatConversion` | `Original` | once, caller's or `defaults.conversion_quality` |
//!
//! Target-size mode varies quality only; it never shrinks dimensions to reach
//! a small target.

use crate::config::Settings;
use crate::imaging::{
    BackendError, DimensionConstraint, Dimensions, EncodeParams, ImageAsset, ImageBackend,
    OutputFormat, Quality, UnsupportedFormat, find_quality_for_target_size, plan_dimensions,
};
use crate::request::{CompressionRequest, CompressionResult, Fit, Mode, ParameterError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompressError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error(transparent)]
    UnsupportedOutputFormat(#[from] UnsupportedFormat),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("Encoder unavailable: {0}")]
    EncoderUnavailable(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("A compression is already running for this image")]
    Busy,
    #[error("No image loaded")]
    NoImageLoaded,
}

impl From<BackendError> for CompressError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Decode(msg) => CompressError::Decode(msg),
            BackendError::Unavailable(msg) => CompressError::EncoderUnavailable(msg),
            BackendError::EncodeFailed(msg) => CompressError::Encode(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loaded,
    Compressing,
    Completed,
    Failed,
}

/// How quality is chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
enum QualityPlan {
    Fixed(Quality),
    TargetBytes(usize),
}

/// Fully resolved work for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EncodePlan {
    dims: Dimensions,
    format: OutputFormat,
    quality: QualityPlan,
}

/// Owns one source image and runs compressions against it.
pub struct CompressionSession<B: ImageBackend> {
    backend: B,
    settings: Settings,
    asset: Option<ImageAsset>,
    state: SessionState,
    last_result: Option<CompressionResult>,
}

impl<B: ImageBackend> CompressionSession<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self {
            backend,
            settings,
            asset: None,
            state: SessionState::Idle,
            last_result: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The loaded source image, if any.
    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    /// Result of the most recent successful compression.
    pub fn last_result(&self) -> Option<&CompressionResult> {
        self.last_result.as_ref()
    }

    /// Decode `bytes` and make it the session's source image.
    ///
    /// Replaces (and drops) any previously loaded image. On failure the
    /// session is left exactly as it was.
    pub fn load(
        &mut self,
        bytes: &[u8],
        mime_hint: Option<&str>,
    ) -> Result<&ImageAsset, CompressError> {
        if self.state == SessionState::Compressing {
            return Err(CompressError::Busy);
        }
        let asset = self.backend.decode(bytes, mime_hint)?;
        log::debug!(
            "loaded {:?} source {} ({} bytes)",
            asset.source_format(),
            asset.dimensions(),
            asset.source_byte_size()
        );

        self.last_result = None;
        self.state = SessionState::Loaded;
        Ok(self.asset.insert(asset))
    }

    /// Drop the source image and any result, back to `Idle`.
    pub fn reset(&mut self) {
        self.asset = None;
        self.last_result = None;
        self.state = SessionState::Idle;
    }

    /// Run one compression against the loaded image.
    pub fn compress(
        &mut self,
        request: &CompressionRequest,
    ) -> Result<&CompressionResult, CompressError> {
        match self.state {
            SessionState::Compressing => return Err(CompressError::Busy),
            SessionState::Idle => return Err(CompressError::NoImageLoaded),
            SessionState::Loaded | SessionState::Completed | SessionState::Failed => {}
        }
        let asset = self.asset.as_ref().ok_or(CompressError::NoImageLoaded)?;

        request.validate(self.settings.limits.max_dimension)?;
        let plan = plan_request(request, asset, &self.settings)?;

        log::debug!(
            "compressing in {} mode: {} → {} {}",
            request.mode.name(),
            asset.dimensions(),
            plan.format,
            plan.dims
        );
        self.state = SessionState::Compressing;

        match execute(&self.backend, asset, &plan, &self.settings) {
            Ok(result) => {
                log::info!(
                    "{} {}: {} → {} bytes ({} encode{})",
                    result.format(),
                    result.dimensions(),
                    result.source_byte_size(),
                    result.byte_size(),
                    result.iterations(),
                    if result.iterations() == 1 { "" } else { "s" }
                );
                self.state = SessionState::Completed;
                Ok(self.last_result.insert(result))
            }
            Err(e) => {
                log::debug!("compression failed: {e}");
                self.last_result = None;
                self.state = SessionState::Failed;
                Err(e.into())
            }
        }
    }
}

/// Resolve a validated request into concrete dimensions, format and quality.
fn plan_request(
    request: &CompressionRequest,
    asset: &ImageAsset,
    settings: &Settings,
) -> Result<EncodePlan, ParameterError> {
    let defaults = &settings.defaults;

    let (constraint, quality) = match request.mode {
        Mode::Quality { quality } => (
            DimensionConstraint::Original,
            QualityPlan::Fixed(Quality::new(quality)),
        ),
        Mode::Dimensions {
            max_width,
            max_height,
            preserve_aspect_ratio,
        } => (
            DimensionConstraint::Bounded {
                max_width,
                max_height,
                preserve_aspect_ratio,
            },
            QualityPlan::Fixed(Quality::new(defaults.dimensions_quality)),
        ),
        Mode::TargetSize { target_bytes } => (
            DimensionConstraint::Original,
            QualityPlan::TargetBytes(target_bytes),
        ),
        Mode::FormatConversion { quality } => {
            if asset.output_format() == Some(request.format) {
                return Err(ParameterError::SameFormat(request.format));
            }
            let quality = Quality::new(quality.unwrap_or(defaults.conversion_quality));
            (DimensionConstraint::Original, QualityPlan::Fixed(quality))
        }
    };

    let dims = plan_dimensions(asset.dimensions(), constraint).map_err(|_| {
        ParameterError::DimensionOutOfRange {
            name: "max width/height",
            value: 0,
            max: settings.limits.max_dimension,
        }
    })?;

    Ok(EncodePlan {
        dims,
        format: request.format,
        quality,
    })
}

fn execute(
    backend: &impl ImageBackend,
    asset: &ImageAsset,
    plan: &EncodePlan,
    settings: &Settings,
) -> Result<CompressionResult, BackendError> {
    match plan.quality {
        QualityPlan::Fixed(quality) => {
            let params = EncodeParams::new(plan.dims, plan.format, quality.fraction());
            let bytes = backend.encode(asset, &params)?;
            Ok(CompressionResult::new(
                bytes,
                plan.dims,
                plan.format,
                quality.value(),
                asset.source_byte_size(),
                Fit::Exact,
                1,
            ))
        }
        QualityPlan::TargetBytes(target_bytes) => {
            let outcome = find_quality_for_target_size(
                backend,
                asset,
                plan.dims,
                plan.format,
                target_bytes,
                &settings.search,
            )?;
            let fit = if outcome.converged {
                Fit::Exact
            } else {
                log::warn!(
                    "target of {target_bytes} bytes not reached after {} encodes; \
                     closest result is {} bytes",
                    outcome.iterations,
                    outcome.bytes.len()
                );
                Fit::BestEffort
            };
            Ok(CompressionResult::new(
                outcome.bytes,
                plan.dims,
                plan.format,
                outcome.quality.value(),
                asset.source_byte_size(),
                fit,
                outcome.iterations,
            ))
        }
    }
}

#[cfg(test)]
impl<B: ImageBackend> CompressionSession<B> {
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn force_state(&mut self, state: SessionState) {
        self.state = state;
    }
}
