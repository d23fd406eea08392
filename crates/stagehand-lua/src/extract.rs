//! Pulling a script out of a model response.

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";
const FENCE: &str = "```";

/// Extracts the script from a model response.
///
/// `<think>...</think>` blocks are dropped first. Then the first fenced
/// block wins, with any language tag on its opening line removed. Without
/// a fence the whole trimmed response is taken. Returns `None` when nothing
/// is left.
///
/// ```
/// use stagehand_lua::extract_script;
///
/// let response = "<think>plan</think>Sure:\n```lua\nstage.mood.set('calm')\n```";
/// assert_eq!(extract_script(response).as_deref(), Some("stage.mood.set('calm')"));
/// ```
#[must_use]
pub fn extract_script(response: &str) -> Option<String> {
    let clean = strip_think(response);

    let code = match clean.find(FENCE) {
        Some(start) => {
            let rest = &clean[start + FENCE.len()..];
            let end = rest.find(FENCE)?;
            let block = &rest[..end];
            match block.find('\n') {
                Some(newline) if !block[..newline].trim().contains(' ') => &block[newline + 1..],
                _ => block,
            }
        }
        None => clean.as_str(),
    };

    let code = code.trim();
    (!code.is_empty()).then(|| code.to_string())
}

fn strip_think(response: &str) -> String {
    let mut clean = response.to_string();
    while let Some(start) = clean.find(THINK_OPEN) {
        match clean[start..].find(THINK_CLOSE) {
            Some(end) => clean.replace_range(start..start + end + THINK_CLOSE.len(), ""),
            None => break,
        }
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_with_language() {
        let response = "Here you go:\n```lua\nprint('hi')\n```\nEnjoy.";
        assert_eq!(extract_script(response).as_deref(), Some("print('hi')"));
    }

    #[test]
    fn fenced_without_language() {
        assert_eq!(
            extract_script("```\nprint('hi')\n```").as_deref(),
            Some("print('hi')")
        );
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(extract_script("```print(1)```").as_deref(), Some("print(1)"));
    }

    #[test]
    fn think_blocks_removed() {
        let response = "<think>```lua\nos.exit()\n```</think>\n```lua\nprint('ok')\n```";
        assert_eq!(extract_script(response).as_deref(), Some("print('ok')"));
    }

    #[test]
    fn unterminated_think_is_kept() {
        assert_eq!(
            extract_script("<think>still thinking").as_deref(),
            Some("<think>still thinking")
        );
    }

    #[test]
    fn raw_text_fallback() {
        assert_eq!(
            extract_script("  stage.mood.set('calm')  \n").as_deref(),
            Some("stage.mood.set('calm')")
        );
    }

    #[test]
    fn first_block_wins() {
        let response = "```lua\nprint(1)\n```\n```lua\nprint(2)\n```";
        assert_eq!(extract_script(response).as_deref(), Some("print(1)"));
    }

    #[test]
    fn nothing_to_run() {
        assert_eq!(extract_script(""), None);
        assert_eq!(extract_script("<think>only thoughts</think>  "), None);
        assert_eq!(extract_script("```lua\n```"), None);
        assert_eq!(extract_script("```lua\nprint(1)"), None);
    }
}
