//! Markdown rendering for blog content.

use comrak::{Options, markdown_to_html};

/// Average reading speed used for estimates.
const WORDS_PER_MINUTE: usize = 200;

/// Render Markdown to HTML with GitHub-flavoured extensions.
///
/// Raw HTML in the source is replaced with a comment, and `javascript:`
/// links are dropped, so the output is safe to embed.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.header_ids = Some(String::new());

    options.render.r#unsafe = false;

    markdown_to_html(content, &options)
}

/// Estimated reading time in whole minutes, never less than one.
#[must_use]
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
