/*!
 * Timeline repair for oracle-aligned lyrics.
 *
 * - `reconciler`: restores authoritative text and removes overlaps
 */

pub mod reconciler;

pub use reconciler::{TimelineReconciler, DEFAULT_PADDING_SECONDS};
