//! Figure extraction.
//!
//! Extraction runs in two phases. [`extract_figures`] plans one job per
//! image artifact (sequentially, so numbering and captions are stable),
//! decodes and transcodes all jobs in parallel with rayon, and collects the
//! results in job order. [`write_figures`] then writes the files under
//! `figures/`. A figure that fails in either phase is omitted and reported;
//! [`number_figures`] numbers whatever survived.

use crate::classify::{Classification, Label};
use crate::error::{Result, Warning};
use crate::model::{
    ArtifactRef, Cell, CellKind, Figure, FigureFormat, ImageArtifact, ImageData, ImageMime,
    FIGURES_DIR,
};
use crate::text::{last_sentence, lines_with_ranges, normalize_whitespace};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

static CAPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#+\s*caption\s*:\s*(.+?)\s*$").unwrap());

static ATTACHMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(attachment:([^)\s]+)\)").unwrap());

/// A figure decoded in memory, ready to be written.
#[derive(Debug, Clone)]
pub struct ExtractedFigure {
    /// Figure description
    pub figure: Figure,

    /// File content
    pub bytes: Vec<u8>,
}

/// Output of [`extract_figures`].
#[derive(Debug, Clone, Default)]
pub struct FigureExtraction {
    /// Successfully decoded figures in notebook order
    pub figures: Vec<ExtractedFigure>,

    /// Recoverable problems
    pub warnings: Vec<Warning>,

    /// Number of figures that were omitted
    pub failed: usize,
}

/// Output of [`write_figures`].
#[derive(Debug, Clone, Default)]
pub struct WrittenFigures {
    /// Figures whose files exist on disk
    pub figures: Vec<Figure>,

    /// Absolute or output-relative paths of the written files
    pub paths: Vec<PathBuf>,

    /// Extraction and write warnings
    pub warnings: Vec<Warning>,

    /// Number of figures that were omitted
    pub failed: usize,
}

struct FigureJob<'a> {
    cell_index: usize,
    sub_index: usize,
    output_index: usize,
    image: &'a ImageArtifact,
    caption: Option<String>,
}

struct Converted {
    source: ImageMime,
    written_as: ImageMime,
    bytes: Vec<u8>,
    fallback: Option<String>,
}

/// Decode every image of the figure-producing cells into the target format.
pub fn extract_figures(
    cells: &[Cell],
    classification: &Classification,
    format: FigureFormat,
) -> FigureExtraction {
    let jobs = plan_jobs(cells, classification);
    log::debug!("Converting {} figure(s) to {}", jobs.len(), format);

    let outcomes: Vec<std::result::Result<Converted, String>> = jobs
        .par_iter()
        .map(|job| convert_image(job.image, format))
        .collect();

    let mut extraction = FigureExtraction::default();
    for (job, outcome) in jobs.into_iter().zip(outcomes) {
        match outcome {
            Ok(converted) => {
                if let Some(reason) = converted.fallback {
                    log::warn!(
                        "Figure from cell {} (output {}): {}",
                        job.cell_index,
                        job.sub_index,
                        reason
                    );
                    extraction.warnings.push(Warning::FigureFormatFallback {
                        cell_index: job.cell_index,
                        sub_index: job.sub_index,
                        reason,
                    });
                }

                let figure = Figure {
                    cell_index: job.cell_index,
                    sub_index: job.sub_index,
                    number: 0,
                    source: ArtifactRef {
                        output_index: job.output_index,
                        mime: converted.source,
                    },
                    file_name: Figure::file_name_for(
                        job.cell_index,
                        job.sub_index,
                        converted.written_as.extension(),
                    ),
                    format: if converted.written_as.is_vector() {
                        FigureFormat::Vector
                    } else {
                        FigureFormat::Raster
                    },
                    written_as: converted.written_as,
                    caption_generated: job.caption.is_none(),
                    caption: job.caption.unwrap_or_default(),
                };
                extraction.figures.push(ExtractedFigure {
                    figure,
                    bytes: converted.bytes,
                });
            }
            Err(reason) => {
                log::warn!(
                    "Figure from cell {} (output {}) omitted: {}",
                    job.cell_index,
                    job.sub_index,
                    reason
                );
                extraction.warnings.push(Warning::FigureExtractionFailed {
                    cell_index: job.cell_index,
                    sub_index: job.sub_index,
                    reason,
                });
                extraction.failed += 1;
            }
        }
    }

    extraction
}

/// Write decoded figures to `<output_dir>/figures/`.
///
/// Failing to create the directory is fatal; a single failed write only
/// omits that figure.
pub fn write_figures(extraction: FigureExtraction, output_dir: &Path) -> Result<WrittenFigures> {
    let dir = output_dir.join(FIGURES_DIR);
    fs::create_dir_all(&dir)?;

    let mut written = WrittenFigures {
        warnings: extraction.warnings,
        failed: extraction.failed,
        ..Default::default()
    };

    for extracted in extraction.figures {
        let path = dir.join(&extracted.figure.file_name);
        match fs::write(&path, &extracted.bytes) {
            Ok(()) => {
                written.paths.push(path);
                written.figures.push(extracted.figure);
            }
            Err(e) => {
                let figure = &extracted.figure;
                log::warn!("Could not write {}: {}", path.display(), e);
                written.warnings.push(Warning::FigureExtractionFailed {
                    cell_index: figure.cell_index,
                    sub_index: figure.sub_index,
                    reason: format!("write failed: {}", e),
                });
                written.failed += 1;
            }
        }
    }

    Ok(written)
}

/// Number the surviving figures in order and fill in placeholder captions.
///
/// Runs after the write phase so that omitted figures leave no gaps.
pub fn number_figures(figures: &mut [Figure]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for (i, figure) in figures.iter_mut().enumerate() {
        figure.number = i + 1;
        if figure.caption_generated {
            figure.caption = format!("Figure {}", figure.number);
            log::warn!(
                "Figure from cell {} has no caption, using '{}'",
                figure.cell_index,
                figure.caption
            );
            warnings.push(Warning::MissingCaption {
                cell_index: figure.cell_index,
                placeholder: figure.caption.clone(),
            });
        }
    }
    warnings
}

fn plan_jobs<'a>(cells: &'a [Cell], classification: &Classification) -> Vec<FigureJob<'a>> {
    let mut jobs = Vec::new();

    for position in classification.positions_with(Label::FigureProducing) {
        let cell = &cells[position];
        let captions = CellCaptions::from_cell(cell);

        for (sub_index, (output_index, image)) in cell.images().enumerate() {
            jobs.push(FigureJob {
                cell_index: cell.index,
                sub_index,
                output_index,
                image,
                caption: captions.caption_for(sub_index, image),
            });
        }
    }
    jobs
}

/// Caption sources of one cell.
struct CellCaptions {
    explicit: Vec<String>,
    comment: Option<String>,
    alt_text: HashMap<String, String>,
}

impl CellCaptions {
    fn from_cell(cell: &Cell) -> Self {
        match cell.kind {
            CellKind::Code => Self {
                explicit: cell
                    .source
                    .lines()
                    .filter_map(|line| CAPTION_RE.captures(line))
                    .map(|caps| clean_caption(&caps[1]))
                    .filter(|c| !c.is_empty())
                    .collect(),
                comment: last_comment_sentence(&cell.source),
                alt_text: HashMap::new(),
            },
            _ => Self {
                explicit: Vec::new(),
                comment: None,
                alt_text: ATTACHMENT_RE
                    .captures_iter(&cell.source)
                    .map(|caps| (caps[2].to_string(), clean_caption(&caps[1])))
                    .filter(|(_, alt)| !alt.is_empty())
                    .collect(),
            },
        }
    }

    fn caption_for(&self, sub_index: usize, image: &ImageArtifact) -> Option<String> {
        if let Some(alt) = image.name.as_ref().and_then(|n| self.alt_text.get(n)) {
            return Some(alt.clone());
        }
        self.explicit
            .get(sub_index)
            .cloned()
            .or_else(|| self.comment.clone())
    }
}

fn clean_caption(text: &str) -> String {
    normalize_whitespace(text).trim_end_matches(':').trim().to_string()
}

/// Last sentence of the last comment block of a code cell. Caption markers,
/// shebangs and cell separators (`# %%`) are not comment prose.
fn last_comment_sentence(source: &str) -> Option<String> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut in_block = false;

    for (_, line) in lines_with_ranges(source) {
        let trimmed = line.trim_start();
        let is_prose = trimmed.starts_with('#')
            && !trimmed.starts_with("#!")
            && !trimmed.starts_with("# %%")
            && !CAPTION_RE.is_match(line);

        if is_prose {
            let text = trimmed.trim_start_matches('#').trim();
            if text.is_empty() {
                continue;
            }
            if !in_block {
                blocks.push(Vec::new());
                in_block = true;
            }
            if let Some(block) = blocks.last_mut() {
                block.push(text);
            }
        } else {
            in_block = false;
        }
    }

    let block = blocks.pop()?;
    last_sentence(&block.join(" ")).map(|s| clean_caption(&s))
}

fn convert_image(
    image: &ImageArtifact,
    format: FigureFormat,
) -> std::result::Result<Converted, String> {
    let candidates: Vec<&ImageData> = match format {
        FigureFormat::Vector => image.representations.iter().collect(),
        FigureFormat::Raster => image
            .representations
            .iter()
            .filter(|r| !r.mime.is_vector())
            .collect(),
    };

    if candidates.is_empty() {
        return Err(if image.representations.is_empty() {
            "no image data".to_string()
        } else {
            "only vector data available, cannot rasterize".to_string()
        });
    }

    let mut first_error = None;
    for representation in candidates {
        match encode(representation, format) {
            Ok(converted) => return Ok(converted),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| "no image data".to_string()))
}

fn encode(
    representation: &ImageData,
    format: FigureFormat,
) -> std::result::Result<Converted, String> {
    let source = representation.mime;
    let bytes = decode_payload(representation)?;

    let converted = match (source, format) {
        (ImageMime::Pdf | ImageMime::Svg, _) | (ImageMime::Png | ImageMime::Jpeg, FigureFormat::Raster) => {
            Converted {
                source,
                written_as: source,
                bytes,
                fallback: None,
            }
        }
        (ImageMime::Gif, FigureFormat::Raster) => Converted {
            source,
            written_as: ImageMime::Png,
            bytes: transcode_to_png(&bytes)?,
            fallback: None,
        },
        (ImageMime::Png, FigureFormat::Vector) => Converted {
            source,
            written_as: ImageMime::Png,
            bytes,
            fallback: Some("no vector representation, written as PNG".to_string()),
        },
        (ImageMime::Jpeg | ImageMime::Gif, FigureFormat::Vector) => Converted {
            source,
            written_as: ImageMime::Png,
            bytes: transcode_to_png(&bytes)?,
            fallback: Some(format!(
                "no vector representation, {} converted to PNG",
                source
            )),
        },
    };
    Ok(converted)
}

/// Decode a payload and check that the bytes match the declared format.
fn decode_payload(representation: &ImageData) -> std::result::Result<Vec<u8>, String> {
    let mime = representation.mime;

    if !mime.is_base64() {
        if !representation.payload.contains("<svg") {
            return Err(format!("payload is not valid {}", mime));
        }
        return Ok(representation.payload.as_bytes().to_vec());
    }

    let compact: String = representation
        .payload
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64 in {} payload: {}", mime, e))?;

    if ImageMime::detect(&bytes) != Some(mime) {
        return Err(format!("payload is not valid {}", mime));
    }
    Ok(bytes)
}

fn transcode_to_png(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("cannot decode image: {}", e))?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| format!("cannot encode PNG: {}", e))?;
    Ok(out)
}
