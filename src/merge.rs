/*!
 * Export-time selection between a caption's original text and its translations.
 */

use serde::{Deserialize, Serialize};

use crate::database::CaptionWithTranslations;
use crate::srt::TimedText;

/// How untranslated captions are treated on export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPolicy {
    /// Leave captions without a translation out of the exported file
    #[serde(default)]
    pub skip_untranslated: bool,
}

impl ExportPolicy {
    pub fn new(skip_untranslated: bool) -> Self {
        Self { skip_untranslated }
    }
}

/// One caption as it will be written to the exported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub caption_id: i64,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
    pub text: String,
}

impl TimedText for ExportRecord {
    fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    fn end_time_ms(&self) -> u64 {
        self.end_time_ms
    }

    fn text(&self) -> &str {
        &self.text
    }
}

fn record(item: &CaptionWithTranslations, text: &str) -> ExportRecord {
    ExportRecord {
        caption_id: item.caption.id,
        start_time_ms: item.caption.start_time_ms(),
        end_time_ms: item.caption.end_time_ms(),
        text: text.to_string(),
    }
}

/// Pick the text to export for one caption.
///
/// The first translation wins whatever the policy says. Without a
/// translation the original text is used, unless the policy skips
/// untranslated captions, in which case nothing is returned.
pub fn select(item: &CaptionWithTranslations, policy: ExportPolicy) -> Option<ExportRecord> {
    match item.current_translation() {
        Some(translation) => Some(record(item, &translation.text)),
        None if policy.skip_untranslated => None,
        None => Some(record(item, &item.caption.text)),
    }
}

/// Apply [`select`] to every caption in order, dropping omitted ones
pub fn merge_all(items: &[CaptionWithTranslations], policy: ExportPolicy) -> Vec<ExportRecord> {
    items.iter().filter_map(|item| select(item, policy)).collect()
}

/// Export records carrying each caption's own text, ignoring translations
pub fn originals(items: &[CaptionWithTranslations]) -> Vec<ExportRecord> {
    items
        .iter()
        .map(|item| record(item, &item.caption.text))
        .collect()
}
