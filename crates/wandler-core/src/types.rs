// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Wandler conversion engine.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationKind, WandlerError};
use crate::mime::MimeRegistry;

/// A caller-supplied file: immutable bytes plus the declared MIME type and
/// original name. The engine only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = MimeRegistry::from_file_name(&name);
        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte length of the file.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File name with its last extension stripped (`a.b.png` → `a.b`).
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() && !ext.contains('/') => base,
            _ => &self.name,
        }
    }

    /// Derive the output file name for a target format.
    pub fn renamed(&self, target_format: &str) -> String {
        format!("{}.{}", self.base_name(), target_format)
    }
}

/// Policy for reconciling a source image's aspect ratio with explicit target
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale to fit inside the target and letterbox the rest in white.
    Fit,
    /// Stretch to the target, ignoring the source ratio.
    Fill,
    /// Scale to cover the target and crop the overflow.
    Cover,
    /// Scale to fit inside the target without enlarging; no canvas.
    Inside,
}

impl FromStr for FitMode {
    type Err = WandlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" | "contain" => Ok(Self::Fit),
            "fill" => Ok(Self::Fill),
            "cover" => Ok(Self::Cover),
            "inside" => Ok(Self::Inside),
            other => Err(WandlerError::invalid(
                ValidationKind::Other,
                format!("unknown fit mode '{other}'"),
            )),
        }
    }
}

/// Per-call conversion parameters. Fields not applicable to the chosen
/// conversion category are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Target format identifier, e.g. `png` or `pdf`.
    pub target_format: String,
    /// Encoder quality, 1–100. Out-of-range values are clamped.
    pub quality: u8,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Derive a missing dimension from the source ratio.
    pub maintain_aspect_ratio: bool,
    /// Explicit fit mode; when absent the mode follows `maintain_aspect_ratio`.
    pub fit_mode: Option<FitMode>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            target_format: String::new(),
            quality: 90,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
            fit_mode: None,
        }
    }
}

impl ConversionOptions {
    /// Options targeting `format` with every other field at its default.
    pub fn to_format(format: impl Into<String>) -> Self {
        Self {
            target_format: format.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fit_mode(mut self, fit_mode: FitMode) -> Self {
        self.fit_mode = Some(fit_mode);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Lower-cased, trimmed target format.
    pub fn target(&self) -> String {
        self.target_format.trim().to_ascii_lowercase()
    }

    /// Quality clamped into 1..=100.
    pub fn clamped_quality(&self) -> u8 {
        self.quality.clamp(1, 100)
    }

    /// The effective fit mode: explicit if given, `inside` when the aspect
    /// ratio is maintained, `fill` otherwise.
    pub fn effective_fit_mode(&self) -> FitMode {
        match (self.fit_mode, self.maintain_aspect_ratio) {
            (Some(mode), _) => mode,
            (None, true) => FitMode::Inside,
            (None, false) => FitMode::Fill,
        }
    }
}

/// The outcome of a single conversion. Ownership passes to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Original base name plus the new extension.
    pub filename: String,
    /// MIME type for the target format.
    pub mime_type: String,
    pub original_size: usize,
    pub converted_size: usize,
    /// Lowercase hex SHA-256 of `data`.
    pub sha256: String,
}

/// Which pages of a document an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "SelectionRepr", into = "SelectionRepr")]
pub enum PageSelection {
    #[default]
    All,
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Resolve to 1-based page numbers, validating each against `total`.
    /// Order and duplicates of an explicit list are preserved.
    pub fn resolve(&self, total: u32) -> Result<Vec<u32>> {
        match self {
            Self::All => Ok((1..=total).collect()),
            Self::Pages(pages) => {
                validate_pages(pages, total)?;
                Ok(pages.clone())
            }
        }
    }
}

impl FromStr for PageSelection {
    type Err = WandlerError;

    /// Parse the boundary's page parameter: the word `all` or a JSON array.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let pages: Vec<u32> = serde_json::from_str(trimmed).map_err(|_| {
            WandlerError::invalid(ValidationKind::PagesJson, "invalid JSON format for pages")
        })?;
        if pages.is_empty() {
            return Err(WandlerError::invalid(
                ValidationKind::Pages,
                "pages must be a non-empty array",
            ));
        }
        Ok(Self::Pages(pages))
    }
}

/// Wire form of [`PageSelection`]: the word `all` or an array of pages.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    Keyword(String),
    Pages(Vec<u32>),
}

impl TryFrom<SelectionRepr> for PageSelection {
    type Error = WandlerError;

    fn try_from(repr: SelectionRepr) -> Result<Self> {
        match repr {
            SelectionRepr::Keyword(word) => word.parse(),
            SelectionRepr::Pages(pages) => Ok(Self::Pages(pages)),
        }
    }
}

impl From<PageSelection> for SelectionRepr {
    fn from(selection: PageSelection) -> Self {
        match selection {
            PageSelection::All => Self::Keyword("all".into()),
            PageSelection::Pages(pages) => Self::Pages(pages),
        }
    }
}

/// Check every page number lies in `[1, total]`.
pub fn validate_pages(pages: &[u32], total: u32) -> Result<()> {
    match pages.iter().find(|&&page| page == 0 || page > total) {
        Some(&page) => Err(WandlerError::PageIndex { page, total }),
        None => Ok(()),
    }
}

/// Absolute page rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Accept only 90, 180, or 270; other values are rejected.
    pub fn from_requested(degrees: i64) -> Result<Self> {
        match degrees {
            90 => Ok(Self::Quarter),
            180 => Ok(Self::Half),
            270 => Ok(Self::ThreeQuarter),
            other => Err(WandlerError::InvalidRotation(other)),
        }
    }

    /// Normalise any stored `/Rotate` value (which may be negative or exceed
    /// 360) onto a quarter turn, truncating non-multiples of 90.
    pub fn normalized(degrees: i64) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Self::Quarter,
            2 => Self::Half,
            3 => Self::ThreeQuarter,
            _ => Self::None,
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }

    /// Add another rotation, modulo a full turn.
    pub fn turned(self, by: Rotation) -> Self {
        Self::normalized(self.degrees() + by.degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_only_last_extension() {
        let file = InputFile::new("archive.tar.gz", "application/gzip", vec![1]);
        assert_eq!(file.base_name(), "archive.tar");
        assert_eq!(file.renamed("zip"), "archive.tar.zip");

        let bare = InputFile::new("Makefile", "text/plain", Vec::new());
        assert_eq!(bare.renamed("txt"), "Makefile.txt");
        assert!(bare.is_empty());
    }

    #[test]
    fn dotfiles_keep_their_name() {
        let file = InputFile::new(".env", "text/plain", Vec::new());
        assert_eq!(file.base_name(), ".env");
    }

    #[test]
    fn from_path_infers_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let file = InputFile::from_path(&path).unwrap();
        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.mime_type(), "text/plain");
        assert_eq!(file.len(), 5);
    }

    #[test]
    fn default_options_maintain_ratio_inside() {
        let opts = ConversionOptions::to_format("PNG");
        assert_eq!(opts.target(), "png");
        assert_eq!(opts.quality, 90);
        assert_eq!(opts.effective_fit_mode(), FitMode::Inside);

        let stretched = ConversionOptions {
            maintain_aspect_ratio: false,
            ..ConversionOptions::default()
        };
        assert_eq!(stretched.effective_fit_mode(), FitMode::Fill);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(ConversionOptions::default().with_quality(0).clamped_quality(), 1);
        assert_eq!(ConversionOptions::default().with_quality(250).clamped_quality(), 100);
    }

    #[test]
    fn options_deserialise_from_camel_case() {
        let opts: ConversionOptions = serde_json::from_str(
            r#"{"targetFormat":"webp","width":320,"maintainAspectRatio":false,"fitMode":"cover"}"#,
        )
        .unwrap();
        assert_eq!(opts.width, Some(320));
        assert_eq!(opts.height, None);
        assert_eq!(opts.quality, 90);
        assert_eq!(opts.effective_fit_mode(), FitMode::Cover);
    }

    #[test]
    fn fit_mode_parses() {
        assert_eq!("Cover".parse::<FitMode>().unwrap(), FitMode::Cover);
        assert!("stretch".parse::<FitMode>().is_err());
    }

    #[test]
    fn page_selection_parses_all_and_json() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!(
            "[3, 1]".parse::<PageSelection>().unwrap(),
            PageSelection::Pages(vec![3, 1])
        );
        assert!("1,2".parse::<PageSelection>().is_err());
        assert!("[]".parse::<PageSelection>().is_err());
    }

    #[test]
    fn page_selection_round_trips_through_json() {
        let all: PageSelection = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(all, PageSelection::All);
        assert_eq!(serde_json::to_string(&all).unwrap(), r#""all""#);

        let some: PageSelection = serde_json::from_str("[2,5]").unwrap();
        assert_eq!(some, PageSelection::Pages(vec![2, 5]));
    }

    #[test]
    fn page_selection_rejects_out_of_range() {
        let selection = PageSelection::Pages(vec![1, 4]);
        match selection.resolve(3) {
            Err(WandlerError::PageIndex { page, total }) => {
                assert_eq!((page, total), (4, 3));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(PageSelection::All.resolve(3).unwrap(), vec![1, 2, 3]);
        assert!(PageSelection::Pages(vec![0]).resolve(3).is_err());
    }

    #[test]
    fn rotation_accepts_only_quarter_turns() {
        assert_eq!(Rotation::from_requested(180).unwrap(), Rotation::Half);
        for bad in [0, -90, 45, 360] {
            assert!(matches!(
                Rotation::from_requested(bad),
                Err(WandlerError::InvalidRotation(d)) if d == bad
            ));
        }
    }

    #[test]
    fn four_quarter_turns_restore_rotation() {
        let start = Rotation::normalized(-90);
        assert_eq!(start, Rotation::ThreeQuarter);
        let mut current = start;
        for _ in 0..4 {
            current = current.turned(Rotation::Quarter);
        }
        assert_eq!(current, start);
    }
}
