/*!
 * Document reassembly.
 *
 * Concatenates translated segments in position order. Segments may arrive in
 * any order; positions must cover `0..n` exactly once and every segment must
 * carry its output content.
 */

use std::io::Write;

use crate::errors::PipelineError;
use crate::translation::segmenter::Segment;

/// Segments sorted by position, checked for gaps, duplicates and missing output
fn ordered(segments: &[Segment]) -> Result<Vec<&str>, PipelineError> {
    let mut sorted: Vec<&Segment> = segments.iter().collect();
    sorted.sort_by_key(|s| s.position);

    sorted
        .into_iter()
        .enumerate()
        .map(|(expected, segment)| {
            if segment.position != expected {
                return Err(PipelineError::Internal(format!(
                    "segment positions are not contiguous: expected {}, found {}",
                    expected, segment.position
                )));
            }
            segment.translated.as_deref().ok_or_else(|| {
                PipelineError::Internal(format!("segment {} has no output", segment.position))
            })
        })
        .collect()
}

/// Build the output document in memory
pub fn reassemble(segments: &[Segment]) -> Result<String, PipelineError> {
    let ordered = ordered(segments)?;
    let capacity = ordered.iter().map(|out| out.len()).sum();

    let mut document = String::with_capacity(capacity);
    for output in ordered {
        document.push_str(output);
    }
    Ok(document)
}

/// Stream the output document into `writer`
///
/// `destination` names the target in error messages.
pub fn write_to<W: Write>(segments: &[Segment], writer: &mut W, destination: &str) -> Result<(), PipelineError> {
    let to_write_error = |e: std::io::Error| PipelineError::DestinationWrite {
        path: destination.to_string(),
        message: e.to_string(),
    };

    for output in ordered(segments)? {
        writer.write_all(output.as_bytes()).map_err(to_write_error)?;
    }
    writer.flush().map_err(to_write_error)
}
