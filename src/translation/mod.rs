/*!
 * Line-count exact lyric translation.
 *
 * This module contains:
 * - `oracle`: the text-generation seam and its provider-backed implementation
 * - `prompts`: prompt templates for the supported response formats
 * - `response`: parsing of free-text oracle output into per-line translations
 * - `reconciler`: the temperature escalation loop
 */

pub mod oracle;
pub mod prompts;
pub mod reconciler;
pub mod response;

pub use oracle::{OracleRequest, ProviderOracle, TranslationOracle};
pub use reconciler::TranslationReconciler;
