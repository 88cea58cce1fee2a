/*!
 * Prompt construction for lyric translation.
 *
 * One prompt carries the whole lyric block so the oracle sees the song as a
 * unit. The expected output layout follows the configured `ResponseFormat`.
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptTemplate, TranslationPromptBuilder};
