//! Whole-file conflict markers.
//!
//! ```text
//! <<<<<<< HEAD
//! current branch content
//! =======
//! given branch content
//! >>>>>>>
//! ```
//!
//! A side that deleted the file contributes nothing between its markers.
//! Contents are inserted verbatim, so a side without a trailing newline runs
//! straight into the next marker.

/// Opening marker, followed by the current branch's content.
pub const MARKER_START: &[u8] = b"<<<<<<< HEAD\n";
/// Separator between the two sides.
pub const MARKER_SEPARATOR: &[u8] = b"=======\n";
/// Closing marker after the given branch's content.
pub const MARKER_END: &[u8] = b">>>>>>>\n";

/// Render the conflicted file for `ours` (current) and `theirs` (given).
pub fn conflict_content(ours: Option<&[u8]>, theirs: Option<&[u8]>) -> Vec<u8> {
    let ours = ours.unwrap_or_default();
    let theirs = theirs.unwrap_or_default();
    let mut out = Vec::with_capacity(
        MARKER_START.len() + ours.len() + MARKER_SEPARATOR.len() + theirs.len() + MARKER_END.len(),
    );
    out.extend_from_slice(MARKER_START);
    out.extend_from_slice(ours);
    out.extend_from_slice(MARKER_SEPARATOR);
    out.extend_from_slice(theirs);
    out.extend_from_slice(MARKER_END);
    out
}
